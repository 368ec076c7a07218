/// Digital Signal Processing (DSP) module.
///
/// This module provides the tap designs and the processing blocks that the
/// demodulator pipelines are built from.
///
/// # Overview
///
/// A sideband demodulator chain looks like:
///
/// ```text
/// I/Q Samples → SsbDemod (channel FIR + real part) → Agc → MonoToStereo → Audio
///                  ↑
///             taps from LowPass / BandPass designs
/// ```
///
/// # Modules
///
/// ## Filter design
/// - [`window`]: sinc and Blackman window kernels
/// - [`rotate`]: accumulating complex rotator used to frequency-shift taps
/// - [`taps`]: low-pass, band-pass, root-raised-cosine and notch designs
///
/// ## Processing blocks
/// - [`filters`]: stateful FIR filter with swappable taps
/// - [`ssb`]: IF demodulator for DSB, USB and LSB
/// - [`agc`]: peak-tracking gain normaliser
/// - [`stereo`]: mono to stereo expansion
///
/// # Traits
///
/// - [`DspBlock`]: a processing block that turns a batch of input samples
///   into a batch of output samples and accepts control commands between
///   batches.
///
/// # Thread Safety
///
/// Blocks keep internal state and are not shared. A [`crate::worker::Worker`]
/// moves a block onto its own thread and delivers commands to it through a
/// queue, so a block never sees concurrent access.
use std::convert::Infallible;

pub mod agc;
pub mod filters;
pub mod rotate;
pub mod ssb;
pub mod stereo;
pub mod taps;
pub mod window;

/// Trait for DSP blocks that process batches of samples.
///
/// # Examples
///
/// ```
/// use radiochain::dsp::{DspBlock, stereo::MonoToStereo};
///
/// let mut m2s = MonoToStereo::new();
/// let output = m2s.process(&[0.5, -0.25]);
/// assert_eq!(output.len(), 2);
/// assert_eq!(output[1].r, -0.25);
/// ```
pub trait DspBlock {
    /// Input sample type
    type Input;
    /// Output sample type
    type Output;
    /// Reconfiguration message applied between batches
    type Command;

    /// Process a block of samples.
    ///
    /// The output length may differ from the input length.
    fn process(&mut self, data: &[Self::Input]) -> Vec<Self::Output>;

    /// Apply a reconfiguration command.
    fn handle(&mut self, command: Self::Command);
}

/// Command type for blocks that take no commands.
pub type NoCommand = Infallible;

/// One stereo audio frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stereo {
    pub l: f32,
    pub r: f32,
}

impl Stereo {
    pub fn new(l: f32, r: f32) -> Self {
        Self { l, r }
    }

    /// Both channels carrying the same sample.
    pub fn mono(sample: f32) -> Self {
        Self {
            l: sample,
            r: sample,
        }
    }
}
