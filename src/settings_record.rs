//! Byte layout of the persisted [`ClockSettings`].
//!
//! One record fills (at most) one flash sector:
//!
//! | bytes            | content                                   |
//! |------------------|-------------------------------------------|
//! | 0..4             | magic `0x434C_4B53` ('CLKS'), little endian |
//! | 4..6             | format version                            |
//! | 6..8             | payload length                            |
//! | 8..8+len         | postcard-serialized [`ClockSettings`]     |
//! | 8+len..12+len    | CRC32 of everything before it             |
//!
//! Kept free of flash types so the format can be tested on the host; the device side is
//! [`SettingsStore`](crate::settings_store::SettingsStore).

use crc32fast::Hasher;

use crate::settings::ClockSettings;
use crate::{Error, Result};

/// Size of one record slot (one flash erase sector).
pub const RECORD_SIZE: usize = 4096;

const MAGIC: u32 = 0x434C_4B53; // 'CLKS'
const VERSION: u16 = 1;
const MAGIC_END: usize = 4;
const VERSION_END: usize = 6;
const HEADER_SIZE: usize = 8;
const CRC_SIZE: usize = 4;
/// Largest payload a record slot can hold.
pub const MAX_PAYLOAD_SIZE: usize = RECORD_SIZE - HEADER_SIZE - CRC_SIZE;

/// Write `settings` as a record at the start of `buffer`, returning the bytes used.
///
/// Bytes after the record are left untouched; pass an erased (`0xFF`) buffer when the whole
/// slot is written back.
///
/// # Errors
///
/// [`Error::SettingsTooLarge`] if the record does not fit `buffer` (or a record slot).
#[expect(
    clippy::arithmetic_side_effects,
    reason = "Lengths are bounded by MAX_PAYLOAD_SIZE"
)]
pub fn encode(settings: &ClockSettings, buffer: &mut [u8]) -> Result<usize> {
    let slot_len = buffer.len().min(RECORD_SIZE);
    let payload_area = buffer
        .get_mut(HEADER_SIZE..slot_len.saturating_sub(CRC_SIZE))
        .ok_or(Error::SettingsTooLarge)?;
    let payload_len = postcard::to_slice(settings, payload_area)
        .map_err(|_| Error::SettingsTooLarge)?
        .len();
    let payload_len_u16 = u16::try_from(payload_len).map_err(|_| Error::SettingsTooLarge)?;

    let crc_offset = HEADER_SIZE + payload_len;
    write_bytes(buffer, 0, &MAGIC.to_le_bytes()).ok_or(Error::SettingsTooLarge)?;
    write_bytes(buffer, MAGIC_END, &VERSION.to_le_bytes()).ok_or(Error::SettingsTooLarge)?;
    write_bytes(buffer, VERSION_END, &payload_len_u16.to_le_bytes())
        .ok_or(Error::SettingsTooLarge)?;

    let crc = compute_crc(buffer.get(..crc_offset).ok_or(Error::SettingsTooLarge)?);
    write_bytes(buffer, crc_offset, &crc.to_le_bytes()).ok_or(Error::SettingsTooLarge)?;

    Ok(crc_offset + CRC_SIZE)
}

/// Read a record from the start of `buffer`.
///
/// Returns `Ok(None)` when no record is present (erased storage, or some other magic).
///
/// # Errors
///
/// [`Error::SettingsCorrupted`] if a record is present but its version, length, CRC, or
/// payload is bad, or the decoded settings are out of range.
#[expect(
    clippy::arithmetic_side_effects,
    reason = "payload_len is checked against MAX_PAYLOAD_SIZE first"
)]
pub fn decode(buffer: &[u8]) -> Result<Option<ClockSettings>> {
    let Some(magic) = read_u32(buffer, 0) else {
        return Ok(None);
    };
    if magic != MAGIC {
        #[cfg(feature = "defmt")]
        defmt::info!("SettingsRecord: no record (magic {:#x})", magic);
        return Ok(None);
    }

    let version = read_u16(buffer, MAGIC_END).ok_or(Error::SettingsCorrupted)?;
    if version != VERSION {
        #[cfg(feature = "defmt")]
        defmt::error!("SettingsRecord: unsupported version {}", version);
        return Err(Error::SettingsCorrupted);
    }

    let payload_len = usize::from(read_u16(buffer, VERSION_END).ok_or(Error::SettingsCorrupted)?);
    if payload_len > MAX_PAYLOAD_SIZE {
        #[cfg(feature = "defmt")]
        defmt::error!("SettingsRecord: invalid payload length {}", payload_len);
        return Err(Error::SettingsCorrupted);
    }

    let crc_offset = HEADER_SIZE + payload_len;
    let stored_crc = read_u32(buffer, crc_offset).ok_or(Error::SettingsCorrupted)?;
    let computed_crc = compute_crc(buffer.get(..crc_offset).ok_or(Error::SettingsCorrupted)?);
    if stored_crc != computed_crc {
        #[cfg(feature = "defmt")]
        defmt::error!(
            "SettingsRecord: CRC mismatch (expected {}, found {})",
            computed_crc,
            stored_crc
        );
        return Err(Error::SettingsCorrupted);
    }

    let payload = buffer
        .get(HEADER_SIZE..crc_offset)
        .ok_or(Error::SettingsCorrupted)?;
    let settings: ClockSettings =
        postcard::from_bytes(payload).map_err(|_| Error::SettingsCorrupted)?;
    settings.validate().map_err(|_| Error::SettingsCorrupted)?;
    Ok(Some(settings))
}

fn read_u16(buffer: &[u8], at: usize) -> Option<u16> {
    let bytes = buffer.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u32(buffer: &[u8], at: usize) -> Option<u32> {
    let bytes = buffer.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn write_bytes(buffer: &mut [u8], at: usize, bytes: &[u8]) -> Option<()> {
    buffer
        .get_mut(at..at.checked_add(bytes.len())?)?
        .copy_from_slice(bytes);
    Some(())
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
