//! [`ClockSettings`] persisted in the last sector of internal flash.

use embassy_rp::Peri;
use embassy_rp::flash::{Blocking, ERASE_SIZE, Flash};
use embassy_rp::peripherals::FLASH;

use crate::settings::ClockSettings;
use crate::settings_record::{self, RECORD_SIZE};
use crate::{Error, Result};

/// Internal flash size for Raspberry Pi Pico 2 (4 MB).
#[cfg(feature = "pico2")]
pub const INTERNAL_FLASH_SIZE: usize = 4 * 1024 * 1024;

/// Internal flash size for Raspberry Pi Pico 1 W (2 MB).
#[cfg(not(feature = "pico2"))]
pub const INTERNAL_FLASH_SIZE: usize = 2 * 1024 * 1024;

const _: () = assert!(RECORD_SIZE == ERASE_SIZE, "one record per erase sector");

#[expect(
    clippy::cast_possible_truncation,
    reason = "Flash sizes fit in u32"
)]
const SECTOR_OFFSET: u32 = (INTERNAL_FLASH_SIZE - ERASE_SIZE) as u32;
#[expect(clippy::cast_possible_truncation, reason = "Flash sizes fit in u32")]
const SECTOR_END: u32 = INTERNAL_FLASH_SIZE as u32;

/// Blocking access to the settings sector.
pub struct SettingsStore {
    flash: Flash<'static, FLASH, Blocking, INTERNAL_FLASH_SIZE>,
}

impl SettingsStore {
    #[must_use]
    pub fn new(flash: Peri<'static, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }

    /// Read the stored settings.
    ///
    /// # Errors
    ///
    /// [`Error::Flash`] if the read fails; [`Error::SettingsCorrupted`] for a damaged record.
    pub fn load(&mut self) -> Result<Option<ClockSettings>> {
        let mut buffer = [0u8; RECORD_SIZE];
        self.flash
            .blocking_read(SECTOR_OFFSET, &mut buffer)
            .map_err(Error::Flash)?;
        settings_record::decode(&buffer)
    }

    /// Erase the sector and write `settings`.
    ///
    /// # Errors
    ///
    /// [`Error::SettingsTooLarge`] or [`Error::Flash`].
    pub fn save(&mut self, settings: &ClockSettings) -> Result<()> {
        let mut buffer = [0xFFu8; RECORD_SIZE];
        let used = settings_record::encode(settings, &mut buffer)?;
        self.clear()?;
        self.flash
            .blocking_write(SECTOR_OFFSET, &buffer)
            .map_err(Error::Flash)?;
        defmt::info!("SettingsStore: saved {} bytes", used);
        Ok(())
    }

    /// Load the settings, writing the defaults first when none (or only garbage) are stored.
    ///
    /// # Errors
    ///
    /// [`Error::Flash`] if flash cannot be read or written.
    pub fn load_or_init(&mut self) -> Result<ClockSettings> {
        match self.load() {
            Ok(Some(settings)) => {
                defmt::info!("SettingsStore: loaded {:?}", settings);
                Ok(settings)
            }
            Ok(None) | Err(Error::SettingsCorrupted) => {
                defmt::warn!("SettingsStore: no valid settings stored, writing defaults");
                let settings = ClockSettings::default();
                self.save(&settings)?;
                Ok(settings)
            }
            Err(err) => Err(err),
        }
    }

    /// Erase the settings sector. The next [`load`](Self::load) returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`Error::Flash`] if the erase fails.
    pub fn clear(&mut self) -> Result<()> {
        self.flash
            .blocking_erase(SECTOR_OFFSET, SECTOR_END)
            .map_err(Error::Flash)?;
        defmt::info!("SettingsStore: cleared");
        Ok(())
    }
}
