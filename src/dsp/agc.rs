//! Automatic Gain Control (AGC)
//!
//! Peak-tracking gain normaliser for demodulated audio.
//!
//! # Overview
//!
//! The AGC keeps a running level estimate. At the start of every batch the
//! level decays by `fall_rate` decibels per second of audio in the batch,
//! is floored at [`MIN_LEVEL`], and is then raised to the largest absolute
//! sample in the batch. Every sample is divided by the resulting level, so
//! the output never exceeds unit amplitude and quiet passages are brought
//! back up at the configured fall rate.
//!
//! # Example
//!
//! ```
//! use radiochain::dsp::agc::Agc;
//!
//! let mut agc = Agc::new(20.0, 24_000.0)?;
//! let out = agc.process(&[0.1, -0.4, 0.2]);
//! assert_eq!(out[1], -1.0);
//! # Ok::<(), radiochain::Error>(())
//! ```

use tracing::trace;

use crate::dsp::DspBlock;
use crate::error::{ensure_positive, Result};

/// Lowest level the estimate may decay to.
pub const MIN_LEVEL: f32 = 1e-13;

/// Peak-tracking gain normaliser for real samples.
#[derive(Debug, Clone)]
pub struct Agc {
    /// Level decay in dB per second
    fall_rate: f32,

    /// Sample rate of the audio in Hz
    sample_rate: f32,

    /// Current level estimate (linear amplitude)
    level: f32,
}

impl Agc {
    /// Create a new AGC.
    ///
    /// # Arguments
    ///
    /// * `fall_rate` - Level decay in dB per second
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(fall_rate: f32, sample_rate: f32) -> Result<Self> {
        ensure_positive("AGC fall rate", fall_rate)?;
        ensure_positive("AGC sample rate", sample_rate)?;
        Ok(Self {
            fall_rate,
            sample_rate,
            level: 0.0,
        })
    }

    /// Set the level decay in dB per second.
    pub fn set_fall_rate(&mut self, fall_rate: f32) -> Result<()> {
        ensure_positive("AGC fall rate", fall_rate)?;
        self.fall_rate = fall_rate;
        Ok(())
    }

    /// Get the level decay in dB per second.
    pub fn get_fall_rate(&self) -> f32 {
        self.fall_rate
    }

    /// Set the audio sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        ensure_positive("AGC sample rate", sample_rate)?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    /// Get the audio sample rate.
    pub fn get_sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Get the current level estimate.
    pub fn get_level(&self) -> f32 {
        self.level
    }

    /// Forget the level estimate.
    pub fn reset(&mut self) {
        self.level = 0.0;
    }

    /// Normalise a batch of samples.
    pub fn process(&mut self, data: &[f32]) -> Vec<f32> {
        if data.is_empty() {
            return Vec::new();
        }

        let fall = self.fall_rate / self.sample_rate * data.len() as f32;
        let mut level = 10f32.powf((10.0 * self.level.log10() - fall) / 10.0);
        if !(level >= MIN_LEVEL) {
            level = MIN_LEVEL;
        }

        for &x in data {
            let amp = x.abs();
            if amp > level {
                level = amp;
            }
        }
        self.level = level;

        let gain = 1.0 / level;
        data.iter().map(|&x| x * gain).collect()
    }
}

/// Reconfiguration commands for a running [`Agc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgcCommand {
    SetFallRate(f32),
    SetSampleRate(f32),
    Reset,
}

impl DspBlock for Agc {
    type Input = f32;
    type Output = f32;
    type Command = AgcCommand;

    fn process(&mut self, data: &[f32]) -> Vec<f32> {
        Agc::process(self, data)
    }

    fn handle(&mut self, command: AgcCommand) {
        let applied = match command {
            AgcCommand::SetFallRate(rate) => self.set_fall_rate(rate),
            AgcCommand::SetSampleRate(rate) => self.set_sample_rate(rate),
            AgcCommand::Reset => {
                self.reset();
                Ok(())
            }
        };
        if let Err(e) = applied {
            trace!("AGC command ignored: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_agc_creation() {
        let agc = Agc::new(20.0, 24_000.0).unwrap();
        assert_eq!(agc.get_fall_rate(), 20.0);
        assert_eq!(agc.get_sample_rate(), 24_000.0);
        assert_eq!(agc.get_level(), 0.0);
    }

    #[test]
    fn test_agc_rejects_bad_parameters() {
        assert!(Agc::new(0.0, 24_000.0).is_err());
        assert!(Agc::new(20.0, -1.0).is_err());
        let mut agc = Agc::new(20.0, 24_000.0).unwrap();
        assert!(agc.set_fall_rate(f32::NAN).is_err());
        assert_eq!(agc.get_fall_rate(), 20.0);
    }

    #[test]
    fn test_agc_normalizes_to_peak() {
        let mut agc = Agc::new(20.0, 24_000.0).unwrap();
        let input: Vec<f32> = (0..480).map(|n| 0.05 * (n as f32 * 0.1).sin()).collect();
        let peak = input.iter().fold(0.0f32, |m, x| m.max(x.abs()));

        let output = agc.process(&input);
        let out_peak = output.iter().fold(0.0f32, |m, x| m.max(x.abs()));

        assert_relative_eq!(agc.get_level(), peak, epsilon = 1e-7);
        assert_relative_eq!(out_peak, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_agc_silence_hits_floor() {
        let mut agc = Agc::new(20.0, 24_000.0).unwrap();
        let output = agc.process(&[0.0; 64]);
        assert_eq!(agc.get_level(), MIN_LEVEL);
        assert!(output.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_agc_level_falls_at_fall_rate() {
        let mut agc = Agc::new(20.0, 24_000.0).unwrap();
        agc.process(&[1.0]);
        assert_relative_eq!(agc.get_level(), 1.0);

        // One second of near-silence: 20 dB (power) of decay is a factor of 100
        agc.process(&vec![1e-9; 24_000]);
        assert_relative_eq!(agc.get_level(), 0.01, max_relative = 1e-3);
    }

    #[test]
    fn test_agc_quiet_signal_recovers_gain() {
        let mut agc = Agc::new(20.0, 24_000.0).unwrap();
        agc.process(&[1.0]);

        let quiet = vec![0.001f32; 1000];
        let first = agc.process(&quiet);
        let mut last = first.clone();
        for _ in 0..100 {
            last = agc.process(&quiet);
        }

        assert!(last[0] > first[0]);
        assert_relative_eq!(last[0], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_agc_empty_batch_keeps_level() {
        let mut agc = Agc::new(20.0, 24_000.0).unwrap();
        agc.process(&[0.5]);
        assert!(agc.process(&[]).is_empty());
        assert_eq!(agc.get_level(), 0.5);
    }

    #[test]
    fn test_agc_commands() {
        let mut agc = Agc::new(20.0, 24_000.0).unwrap();
        agc.process(&[0.5]);
        agc.handle(AgcCommand::SetFallRate(40.0));
        agc.handle(AgcCommand::SetSampleRate(-1.0));
        assert_eq!(agc.get_fall_rate(), 40.0);
        assert_eq!(agc.get_sample_rate(), 24_000.0);
        agc.handle(AgcCommand::Reset);
        assert_eq!(agc.get_level(), 0.0);
    }
}
