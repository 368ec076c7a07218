//! Double-sideband demodulator.

use num_complex::Complex;

use crate::config::DemodConfig;
use crate::demod::{Capabilities, DeemphasisMode, Demodulator, Pipeline, VfoReference};
use crate::dsp::ssb::SsbMode;
use crate::error::Result;
use crate::stream::Stream;

/// IF and AF sample rate of the sideband family, in Hz.
pub const SIDEBAND_SAMPLE_RATE: f32 = 24_000.0;

/// DSB capability values. The single-sideband tables start from these.
pub const DSB_CAPABILITIES: Capabilities = Capabilities {
    name: "DSB",
    if_sample_rate: SIDEBAND_SAMPLE_RATE,
    af_sample_rate: SIDEBAND_SAMPLE_RATE,
    default_bandwidth: 4_600.0,
    min_bandwidth: 1_000.0,
    max_bandwidth: SIDEBAND_SAMPLE_RATE / 2.0,
    bandwidth_locked: false,
    max_af_bandwidth: SIDEBAND_SAMPLE_RATE / 2.0,
    default_snap_interval: 100.0,
    vfo_reference: VfoReference::Center,
    deemphasis_allowed: false,
    post_processing_enabled: true,
    default_deemphasis_mode: DeemphasisMode::None,
    af_bandwidth_ratio: 0.5,
    dynamic_af_bandwidth: true,
    fm_if_nr_allowed: false,
    nb_allowed: true,
};

/// Double-sideband suppressed-carrier demodulator.
///
/// The channel filter is a low-pass at half the bandwidth centred on the
/// tuned frequency, so both sidebands reach the audio output.
///
/// # Example
///
/// ```
/// use radiochain::demod::{Demodulator, Dsb, PipelineState, VfoReference};
///
/// let dsb = Dsb::new();
/// assert_eq!(dsb.state(), PipelineState::Uninitialized);
/// assert_eq!(dsb.name(), "DSB");
/// assert_eq!(dsb.default_bandwidth(), 4_600.0);
/// assert_eq!(dsb.af_bandwidth(4_600.0), 2_300.0);
/// assert_eq!(dsb.vfo_reference(), VfoReference::Center);
/// ```
pub struct Dsb {
    pipeline: Pipeline,
}

impl Dsb {
    /// An uninitialised demodulator.
    pub fn new() -> Self {
        Self {
            pipeline: Pipeline::new(SsbMode::Dsb, SIDEBAND_SAMPLE_RATE, SIDEBAND_SAMPLE_RATE),
        }
    }

    /// Create and initialise in one step.
    pub fn with_input(
        name: &str,
        config: &DemodConfig,
        input: &Stream<Complex<f32>>,
        bandwidth: f32,
    ) -> Result<Self> {
        let mut dsb = Self::new();
        dsb.init(name, config, input, bandwidth)?;
        Ok(dsb)
    }

    /// Tap buffers installed by the running demodulator since `init`.
    pub fn taps_generation(&self) -> u64 {
        self.pipeline.taps_generation()
    }
}

impl Default for Dsb {
    fn default() -> Self {
        Self::new()
    }
}

impl Demodulator for Dsb {
    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    fn capabilities(&self) -> &'static Capabilities {
        &DSB_CAPABILITIES
    }
}
