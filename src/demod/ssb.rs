//! Single-sideband demodulators.
//!
//! Both share the DSB chain and differ only in their channel filter, a
//! complex band-pass over one side of the tuned frequency, and in where
//! the tuned frequency sits in the channel.

use num_complex::Complex;

use crate::config::DemodConfig;
use crate::demod::dsb::{DSB_CAPABILITIES, SIDEBAND_SAMPLE_RATE};
use crate::demod::{Capabilities, Demodulator, Pipeline, VfoReference};
use crate::dsp::ssb::SsbMode;
use crate::error::Result;
use crate::stream::Stream;

/// USB capability values: tuned frequency at the lower channel edge.
pub const USB_CAPABILITIES: Capabilities = Capabilities {
    name: "USB",
    default_bandwidth: 2_800.0,
    min_bandwidth: 500.0,
    vfo_reference: VfoReference::Lower,
    af_bandwidth_ratio: 1.0,
    ..DSB_CAPABILITIES
};

/// LSB capability values: tuned frequency at the upper channel edge.
pub const LSB_CAPABILITIES: Capabilities = Capabilities {
    name: "LSB",
    vfo_reference: VfoReference::Upper,
    ..USB_CAPABILITIES
};

/// Upper-sideband demodulator.
pub struct Usb {
    pipeline: Pipeline,
}

/// Lower-sideband demodulator.
pub struct Lsb {
    pipeline: Pipeline,
}

impl Usb {
    pub fn new() -> Self {
        Self {
            pipeline: Pipeline::new(SsbMode::Usb, SIDEBAND_SAMPLE_RATE, SIDEBAND_SAMPLE_RATE),
        }
    }

    /// Create and initialise in one step.
    pub fn with_input(
        name: &str,
        config: &DemodConfig,
        input: &Stream<Complex<f32>>,
        bandwidth: f32,
    ) -> Result<Self> {
        let mut usb = Self::new();
        usb.init(name, config, input, bandwidth)?;
        Ok(usb)
    }

    pub fn taps_generation(&self) -> u64 {
        self.pipeline.taps_generation()
    }
}

impl Lsb {
    pub fn new() -> Self {
        Self {
            pipeline: Pipeline::new(SsbMode::Lsb, SIDEBAND_SAMPLE_RATE, SIDEBAND_SAMPLE_RATE),
        }
    }

    /// Create and initialise in one step.
    pub fn with_input(
        name: &str,
        config: &DemodConfig,
        input: &Stream<Complex<f32>>,
        bandwidth: f32,
    ) -> Result<Self> {
        let mut lsb = Self::new();
        lsb.init(name, config, input, bandwidth)?;
        Ok(lsb)
    }

    pub fn taps_generation(&self) -> u64 {
        self.pipeline.taps_generation()
    }
}

impl Default for Usb {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Lsb {
    fn default() -> Self {
        Self::new()
    }
}

impl Demodulator for Usb {
    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    fn capabilities(&self) -> &'static Capabilities {
        &USB_CAPABILITIES
    }
}

impl Demodulator for Lsb {
    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    fn capabilities(&self) -> &'static Capabilities {
        &LSB_CAPABILITIES
    }
}
