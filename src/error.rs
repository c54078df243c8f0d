use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[derive(Debug, Display, Error)]
pub enum Error {
    // `#[error(not(source))]` below tells `derive_more` that `embassy_executor::SpawnError` does
    // not implement `core::error::Error`.
    /// An embassy task could not be spawned (its pool is already in use).
    #[cfg(feature = "device")]
    #[display("{_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    /// The timezone offset is outside of `-12..=14` hours.
    #[display("Timezone offset {_0} is outside of -12..=14 hours")]
    TimezoneOffsetOutOfRange(#[error(not(source))] i8),

    /// The NTP server name is empty or does not fit the bounded string.
    #[display("NTP server name is empty or longer than 128 bytes")]
    NtpServerNameInvalid,

    /// The serialized settings do not fit the record buffer.
    #[display("Settings do not fit the storage record")]
    SettingsTooLarge,

    /// The stored settings record failed its version, length, CRC, or payload check.
    #[display("Settings storage is corrupted")]
    SettingsCorrupted,

    /// A pin or digit index was outside of its array.
    #[display("Index out of bounds")]
    IndexOutOfBounds,

    #[cfg(any(feature = "pico1", feature = "pico2"))]
    #[display("Flash operation failed: {_0:?}")]
    Flash(#[error(not(source))] embassy_rp::flash::Error),
}

#[cfg(feature = "device")]
impl From<embassy_executor::SpawnError> for Error {
    fn from(err: embassy_executor::SpawnError) -> Self {
        Self::TaskSpawn(err)
    }
}
