//! Carousel configuration
//!
//! Configuration can be built in code or loaded from a TOML document:
//!
//! ```toml
//! alignment = "center"
//! threshold = 1.0
//! flip_time_ms = 3000
//! autoplay = true
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CarouselError, Result};

/// Smallest accepted over-render margin for recycled lists
pub const MIN_MARGIN: f32 = 1.5;

// =============================================================================
// Alignment
// =============================================================================

/// Where a section is placed inside the scroll container
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Alignment {
    /// Leading edges aligned
    Start,
    /// Centers aligned
    #[default]
    Center,
    /// Trailing edges aligned
    End,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Start => "start",
            Alignment::Center => "center",
            Alignment::End => "end",
        }
    }
}

impl FromStr for Alignment {
    type Err = CarouselError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Alignment::Start),
            "center" => Ok(Alignment::Center),
            "end" => Ok(Alignment::End),
            _ => Err(CarouselError::InvalidAlignment(s.to_string())),
        }
    }
}

impl TryFrom<String> for Alignment {
    type Error = CarouselError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Alignment> for String {
    fn from(value: Alignment) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CarouselConfig
// =============================================================================

/// Carousel behaviour settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Section placement policy
    pub alignment: Alignment,
    /// Minimum effective intersection ratio for an element to count as visible
    pub threshold: f32,
    /// Autoplay period in milliseconds
    pub flip_time_ms: u64,
    /// Start playing as soon as the carousel is created
    pub autoplay: bool,
    /// Recycled lists grow snap targets without bound
    pub infinite: bool,
    /// Over-render factor for recycled lists
    pub margin: f32,
    /// Quiet window after the last wheel event before playback resumes
    pub wheel_quiet_ms: u64,
    /// Quiet window before a burst of element set changes is applied
    pub settle_debounce_ms: u64,
    /// Scroll stability correction budget
    pub correction_attempts: u32,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            alignment: Alignment::Center,
            threshold: 1.0,
            flip_time_ms: 3000,
            autoplay: false,
            infinite: false,
            margin: 8.0,
            wheel_quiet_ms: 500,
            settle_debounce_ms: 200,
            correction_attempts: 10,
        }
    }
}

impl CarouselConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_flip_time(mut self, flip_time: Duration) -> Self {
        self.flip_time_ms = flip_time.as_millis() as u64;
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn with_infinite(mut self, infinite: bool) -> Self {
        self.infinite = infinite;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn flip_time(&self) -> Duration {
        Duration::from_millis(self.flip_time_ms)
    }

    pub fn wheel_quiet(&self) -> Duration {
        Duration::from_millis(self.wheel_quiet_ms)
    }

    pub fn settle_debounce(&self) -> Duration {
        Duration::from_millis(self.settle_debounce_ms)
    }

    /// Check ranges and normalize the margin
    pub fn validate(mut self) -> Result<Self> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(CarouselError::InvalidThreshold(self.threshold));
        }
        if self.flip_time_ms == 0 {
            return Err(CarouselError::InvalidFlipTime);
        }
        if !(self.margin >= MIN_MARGIN) {
            self.margin = MIN_MARGIN;
        }
        Ok(self)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: CarouselConfig = toml::from_str(source)?;
        config.validate()
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
