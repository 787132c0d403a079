//! Carousel error types

use thiserror::Error;

/// Carousel configuration errors
///
/// Runtime navigation never fails: unmeasurable targets, missing sections
/// and out-of-range indices are silent no-ops. Only configuration parsing
/// and validation surface errors.
#[derive(Error, Debug)]
pub enum CarouselError {
    /// Alignment string is not one of `start`, `center`, `end`
    #[error("Invalid alignment '{0}': expected one of start, center, end")]
    InvalidAlignment(String),

    /// Visibility threshold outside `(0, 1]`
    #[error("Invalid visibility threshold {0}: must be within (0, 1]")]
    InvalidThreshold(f32),

    /// Autoplay flip time of zero
    #[error("Invalid flip time: must be greater than zero")]
    InvalidFlipTime,

    /// Malformed configuration document
    #[error("Config parse error: {0}")]
    Config(String),

    /// Failed to read a configuration file
    #[error("Config read error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CarouselError {
    fn from(err: toml::de::Error) -> Self {
        CarouselError::Config(err.to_string())
    }
}

/// Result type for carousel operations
pub type Result<T> = std::result::Result<T, CarouselError>;
