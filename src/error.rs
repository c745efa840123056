use std::path::PathBuf;

use thiserror::Error;

use crate::driver_type::DriverType;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Driver binary not found for {driver}: {path}")]
    DriverBinaryNotFound { driver: DriverType, path: PathBuf },

    #[error("No driver binary configured or discoverable for {0}")]
    DriverBinaryUnconfigured(DriverType),

    #[error("Driver type {0} is not supported by this factory")]
    UnsupportedDriver(DriverType),

    #[error("Browser option arguments are not supported for {0}")]
    OptionArgsUnsupported(DriverType),

    #[error("Failed to spawn driver server for {driver}: {source}")]
    ServerSpawnFailed {
        driver: DriverType,
        source: std::io::Error,
    },

    #[error("Could not connect to the {driver} driver server after {attempts} attempts")]
    SessionConnect { driver: DriverType, attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Factory has not been initialized with a config path yet")]
    FactoryNotInitialized,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}
