//! IF demodulator for the sideband family.
//!
//! [`SsbDemod`] runs a channel filter over the complex IF signal and keeps
//! the real part:
//! - DSB: low-pass at half the bandwidth, both sidebands are kept
//! - USB: complex band-pass over `[0, bandwidth]`
//! - LSB: complex band-pass over `[-bandwidth, 0]`
//!
//! The filter taps are designed outside the processing thread with
//! [`SsbDemod::design_taps`] and handed over with
//! [`SsbCommand::SetTaps`], so a running block only ever swaps a finished
//! buffer in between two batches.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use num_complex::Complex;
use tracing::{debug, trace};

use crate::dsp::filters::{ChannelTaps, FirFilter};
use crate::dsp::taps::{BandPass, LowPass, TapGenerator};
use crate::dsp::DspBlock;
use crate::error::{ensure_positive, Error, Result};

/// Sideband selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SsbMode {
    /// Double sideband, suppressed carrier
    Dsb,
    /// Upper sideband
    Usb,
    /// Lower sideband
    Lsb,
}

impl fmt::Display for SsbMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SsbMode::Dsb => write!(f, "DSB"),
            SsbMode::Usb => write!(f, "USB"),
            SsbMode::Lsb => write!(f, "LSB"),
        }
    }
}

/// Reconfiguration commands for a running [`SsbDemod`].
#[derive(Debug, Clone, PartialEq)]
pub enum SsbCommand {
    /// Install a new channel filter designed for `bandwidth`
    SetTaps { bandwidth: f32, taps: ChannelTaps },
}

/// Channel filter plus real-part extraction.
pub struct SsbDemod {
    mode: SsbMode,
    sample_rate: f32,
    bandwidth: f32,
    filter: FirFilter,
    /// Number of tap buffers installed after construction
    generation: Arc<AtomicU64>,
}

impl SsbDemod {
    /// Create a demodulator with its channel filter designed for `bandwidth`.
    ///
    /// # Arguments
    ///
    /// * `mode` - Sideband selection
    /// * `bandwidth` - Channel bandwidth in Hz
    /// * `transition_width` - Channel filter transition width in Hz
    /// * `sample_rate` - IF sample rate in Hz
    pub fn new(mode: SsbMode, bandwidth: f32, transition_width: f32, sample_rate: f32) -> Result<Self> {
        let taps = Self::design_taps(mode, bandwidth, transition_width, sample_rate)?;
        debug!(
            "{} demodulator: {} taps for {} Hz at {} Hz",
            mode,
            taps.len(),
            bandwidth,
            sample_rate
        );
        Ok(Self {
            mode,
            sample_rate,
            bandwidth,
            filter: FirFilter::new(taps),
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Design the channel filter for a mode and bandwidth.
    pub fn design_taps(
        mode: SsbMode,
        bandwidth: f32,
        transition_width: f32,
        sample_rate: f32,
    ) -> Result<ChannelTaps> {
        ensure_positive("bandwidth", bandwidth)?;
        let taps = match mode {
            SsbMode::Dsb => {
                let design = LowPass::new(bandwidth / 2.0, transition_width, sample_rate)?;
                design.generate(1.0).map(ChannelTaps::Real)
            }
            SsbMode::Usb => {
                let design = BandPass::new(0.0, bandwidth, transition_width, sample_rate)?;
                design.generate(1.0).map(ChannelTaps::Complex)
            }
            SsbMode::Lsb => {
                let design = BandPass::new(-bandwidth, 0.0, transition_width, sample_rate)?;
                design.generate(1.0).map(ChannelTaps::Complex)
            }
        };
        taps.ok_or_else(|| Error::invalid(format!("no taps for {} at {} Hz", mode, bandwidth)))
    }

    pub fn mode(&self) -> SsbMode {
        self.mode
    }

    pub fn bandwidth(&self) -> f32 {
        self.bandwidth
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current channel filter.
    pub fn taps(&self) -> &ChannelTaps {
        self.filter.taps()
    }

    /// Shared counter of tap buffers installed since construction.
    ///
    /// The handle stays valid while the block is moved to and from a worker
    /// thread, so callers can observe reconfiguration taking effect.
    pub fn generation(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.generation)
    }

    /// Swap in a new channel filter.
    pub fn set_taps(&mut self, bandwidth: f32, taps: ChannelTaps) {
        let retired = self.filter.set_taps(taps);
        self.bandwidth = bandwidth;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(
            "{} demodulator: bandwidth {} Hz, {} -> {} taps (generation {})",
            self.mode,
            bandwidth,
            retired.len(),
            self.filter.tap_count(),
            generation
        );
    }

    /// Filter a batch of IF samples and keep the real part.
    pub fn process(&mut self, data: &[Complex<f32>]) -> Vec<f32> {
        self.filter.process(data).into_iter().map(|s| s.re).collect()
    }
}

impl DspBlock for SsbDemod {
    type Input = Complex<f32>;
    type Output = f32;
    type Command = SsbCommand;

    fn process(&mut self, data: &[Complex<f32>]) -> Vec<f32> {
        SsbDemod::process(self, data)
    }

    fn handle(&mut self, command: SsbCommand) {
        match command {
            SsbCommand::SetTaps { bandwidth, taps } => self.set_taps(bandwidth, taps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    const IF_RATE: f32 = 24_000.0;

    fn tone(freq: f32, len: usize) -> Vec<Complex<f32>> {
        (0..len)
            .map(|n| Complex::new(0.0, 2.0 * PI * freq * n as f32 / IF_RATE).exp())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn demod(mode: SsbMode, bandwidth: f32) -> SsbDemod {
        SsbDemod::new(mode, bandwidth, 1_000.0, IF_RATE).unwrap()
    }

    #[test]
    fn test_design_taps_shape() {
        let dsb = SsbDemod::design_taps(SsbMode::Dsb, 4_600.0, 1_000.0, IF_RATE).unwrap();
        assert!(matches!(dsb, ChannelTaps::Real(_)));
        assert_eq!(dsb.len(), 97);

        let usb = SsbDemod::design_taps(SsbMode::Usb, 2_800.0, 1_000.0, IF_RATE).unwrap();
        assert!(matches!(usb, ChannelTaps::Complex(_)));
    }

    #[test]
    fn test_design_taps_rejects_bad_bandwidth() {
        assert!(SsbDemod::design_taps(SsbMode::Dsb, 0.0, 1_000.0, IF_RATE).is_err());
        assert!(SsbDemod::design_taps(SsbMode::Lsb, f32::NAN, 1_000.0, IF_RATE).is_err());
        assert!(SsbMode::Usb.to_string() == "USB");
    }

    #[test]
    fn test_dsb_keeps_both_sidebands() {
        let mut block = demod(SsbMode::Dsb, 4_600.0);
        let upper = block.process(&tone(1_000.0, 4_000));
        block.filter.reset();
        let lower = block.process(&tone(-1_000.0, 4_000));

        // Real part of a unit complex tone has rms 1/sqrt(2)
        assert_relative_eq!(rms(&upper[500..]), 0.5f32.sqrt(), epsilon = 0.02);
        assert_relative_eq!(rms(&lower[500..]), 0.5f32.sqrt(), epsilon = 0.02);
    }

    #[test]
    fn test_dsb_rejects_out_of_band() {
        let mut block = demod(SsbMode::Dsb, 4_600.0);
        let out = block.process(&tone(6_000.0, 4_000));
        assert!(rms(&out[500..]) < 0.01);
    }

    #[test]
    fn test_usb_selects_upper_sideband() {
        let mut block = demod(SsbMode::Usb, 2_800.0);
        let upper = block.process(&tone(1_400.0, 4_000));
        block.filter.reset();
        let lower = block.process(&tone(-1_400.0, 4_000));

        assert!(rms(&upper[500..]) > 0.65);
        assert!(rms(&lower[500..]) < 0.01);
    }

    #[test]
    fn test_lsb_selects_lower_sideband() {
        let mut block = demod(SsbMode::Lsb, 2_800.0);
        let upper = block.process(&tone(1_400.0, 4_000));
        block.filter.reset();
        let lower = block.process(&tone(-1_400.0, 4_000));

        assert!(rms(&lower[500..]) > 0.65);
        assert!(rms(&upper[500..]) < 0.01);
    }

    #[test]
    fn test_set_taps_command_bumps_generation() {
        let mut block = demod(SsbMode::Dsb, 4_600.0);
        let generation = block.generation();
        assert_eq!(generation.load(Ordering::Acquire), 0);

        let taps = SsbDemod::design_taps(SsbMode::Dsb, 2_000.0, 1_000.0, IF_RATE).unwrap();
        block.handle(SsbCommand::SetTaps {
            bandwidth: 2_000.0,
            taps: taps.clone(),
        });

        assert_eq!(generation.load(Ordering::Acquire), 1);
        assert_eq!(block.bandwidth(), 2_000.0);
        assert_eq!(block.taps(), &taps);
    }

    #[test]
    fn test_output_length_matches_input() {
        let mut block = demod(SsbMode::Usb, 2_800.0);
        for len in [0, 1, 17, 1024] {
            assert_eq!(block.process(&tone(500.0, len)).len(), len);
        }
    }
}
