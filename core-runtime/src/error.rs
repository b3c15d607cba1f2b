//! Errors raised while assembling runtime configuration

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration or logging setting is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable {0} is required")]
    MissingVariable(&'static str),

    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidVariable {
        name: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
