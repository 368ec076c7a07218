//! Demodulator pipeline configuration.
//!
//! # Example
//!
//! ```
//! use radiochain::config::DemodConfig;
//!
//! let config = DemodConfig {
//!     transition_width: 500.0,
//!     ..DemodConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Error, Result};

/// Tunables shared by the demodulator pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemodConfig {
    /// AGC level decay in dB per second
    pub agc_fall_rate: f32,
    /// Channel filter transition width in Hz
    pub transition_width: f32,
    /// Capacity, in batches, of the streams between pipeline stages
    pub stream_capacity: usize,
}

impl Default for DemodConfig {
    fn default() -> Self {
        Self {
            agc_fall_rate: 20.0,
            transition_width: 1_000.0,
            stream_capacity: 8,
        }
    }
}

impl DemodConfig {
    /// Check every field is usable.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("AGC fall rate", self.agc_fall_rate)?;
        ensure_positive("transition width", self.transition_width)?;
        if self.stream_capacity == 0 {
            return Err(Error::invalid("stream capacity must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DemodConfig::default();
        assert_eq!(config.agc_fall_rate, 20.0);
        assert_eq!(config.transition_width, 1_000.0);
        assert_eq!(config.stream_capacity, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_fields() {
        let config = DemodConfig {
            transition_width: 0.0,
            ..DemodConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DemodConfig {
            stream_capacity: 0,
            ..DemodConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));
    }
}
