//! Demodulator pipelines.
//!
//! A demodulator turns a stream of complex IF samples into stereo audio by
//! running three blocks, each on its own worker thread:
//!
//! ```text
//! input ─→ SsbDemod ─→ Agc ─→ MonoToStereo ─→ output
//! ```
//!
//! [`Pipeline`] owns the blocks, the streams between them and the output
//! stream, and implements the lifecycle shared by every variant:
//!
//! ```text
//! Uninitialized ──init──→ Stopped ──start──→ Running
//!                            ↑                  │
//!                            └──────stop────────┘
//! ```
//!
//! The [`Demodulator`] trait adds the capability queries an orchestration
//! layer reads to lay out its controls. [`Dsb`] is the canonical variant;
//! [`Usb`] and [`Lsb`] share the same chain with a one-sided channel filter.
//!
//! # Example
//!
//! ```no_run
//! use num_complex::Complex;
//! use radiochain::config::DemodConfig;
//! use radiochain::demod::{Demodulator, Dsb};
//! use radiochain::stream::Stream;
//!
//! let input: Stream<Complex<f32>> = Stream::bounded(8);
//! let mut dsb = Dsb::with_input("radio", &DemodConfig::default(), &input, 4_600.0)?;
//! let audio = dsb.output()?;
//!
//! dsb.start()?;
//! input.push(vec![Complex::new(0.5, 0.0); 1024])?;
//! let frames = audio.pull()?;
//! dsb.set_bandwidth(3_000.0)?;
//! dsb.stop()?;
//! # Ok::<(), radiochain::Error>(())
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use num_complex::Complex;
use tracing::{debug, info, warn};

use crate::config::DemodConfig;
use crate::dsp::agc::Agc;
use crate::dsp::ssb::{SsbCommand, SsbDemod, SsbMode};
use crate::dsp::stereo::MonoToStereo;
use crate::dsp::Stereo;
use crate::error::{Error, Result};
use crate::stream::Stream;
use crate::worker::Worker;

pub mod dsb;
pub mod ssb;

pub use dsb::Dsb;
pub use ssb::{Lsb, Usb};

/// Lifecycle state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Stopped,
    Running,
}

/// Which point of the channel the tuned frequency refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfoReference {
    Center,
    Lower,
    Upper,
}

/// Audio de-emphasis time constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeemphasisMode {
    None,
    Us22,
    Us50,
    Us75,
}

impl DeemphasisMode {
    pub const ALL: [DeemphasisMode; 4] = [
        DeemphasisMode::Us22,
        DeemphasisMode::Us50,
        DeemphasisMode::Us75,
        DeemphasisMode::None,
    ];
}

/// Fixed capability values of a demodulator variant.
///
/// Variants declare one `const` table; the [`Demodulator`] queries read
/// from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    /// Mode name, e.g. `"DSB"`
    pub name: &'static str,
    pub if_sample_rate: f32,
    pub af_sample_rate: f32,
    pub default_bandwidth: f32,
    pub min_bandwidth: f32,
    pub max_bandwidth: f32,
    pub bandwidth_locked: bool,
    pub max_af_bandwidth: f32,
    pub default_snap_interval: f32,
    pub vfo_reference: VfoReference,
    pub deemphasis_allowed: bool,
    pub post_processing_enabled: bool,
    pub default_deemphasis_mode: DeemphasisMode,
    /// Audio filter bandwidth as a fraction of the channel bandwidth
    pub af_bandwidth_ratio: f32,
    pub dynamic_af_bandwidth: bool,
    pub fm_if_nr_allowed: bool,
    pub nb_allowed: bool,
}

/// Uniform lifecycle and capability contract of a demodulator.
///
/// Lifecycle methods have default implementations forwarding to the
/// variant's [`Pipeline`]. Capability queries read the variant's
/// [`Capabilities`] table.
pub trait Demodulator {
    /// The pipeline running this demodulator.
    fn pipeline(&self) -> &Pipeline;

    fn pipeline_mut(&mut self) -> &mut Pipeline;

    /// Wire the chain to `input` with an initial `bandwidth` in Hz.
    ///
    /// Re-initialising stops the previous chain; the output stream is kept.
    fn init(
        &mut self,
        name: &str,
        config: &DemodConfig,
        input: &Stream<Complex<f32>>,
        bandwidth: f32,
    ) -> Result<()> {
        self.pipeline_mut().init(name, config, input, bandwidth)
    }

    fn state(&self) -> PipelineState {
        self.pipeline().state()
    }

    fn start(&mut self) -> Result<()> {
        self.pipeline_mut().start()
    }

    fn stop(&mut self) -> Result<()> {
        self.pipeline_mut().stop()
    }

    fn set_bandwidth(&mut self, bandwidth: f32) -> Result<()> {
        self.pipeline_mut().set_bandwidth(bandwidth)
    }

    fn set_input(&mut self, input: &Stream<Complex<f32>>) -> Result<()> {
        self.pipeline_mut().set_input(input)
    }

    /// The pipeline's audio output; the same stream for the pipeline's lifetime.
    fn output(&self) -> Result<Arc<Stream<Stereo>>> {
        self.pipeline().output()
    }

    /// Notification that the audio sink changed its sample rate.
    fn af_sample_rate_changed(&mut self, _sample_rate: f32) {}

    /// Capability table of the variant.
    fn capabilities(&self) -> &'static Capabilities;

    /// Mode name, e.g. `"DSB"`.
    fn name(&self) -> &'static str {
        self.capabilities().name
    }

    fn if_sample_rate(&self) -> f32 {
        self.capabilities().if_sample_rate
    }

    fn af_sample_rate(&self) -> f32 {
        self.capabilities().af_sample_rate
    }

    fn default_bandwidth(&self) -> f32 {
        self.capabilities().default_bandwidth
    }

    fn min_bandwidth(&self) -> f32 {
        self.capabilities().min_bandwidth
    }

    fn max_bandwidth(&self) -> f32 {
        self.capabilities().max_bandwidth
    }

    /// Whether the bandwidth is fixed.
    fn bandwidth_locked(&self) -> bool {
        self.capabilities().bandwidth_locked
    }

    fn max_af_bandwidth(&self) -> f32 {
        self.capabilities().max_af_bandwidth
    }

    fn default_snap_interval(&self) -> f32 {
        self.capabilities().default_snap_interval
    }

    fn vfo_reference(&self) -> VfoReference {
        self.capabilities().vfo_reference
    }

    fn deemphasis_allowed(&self) -> bool {
        self.capabilities().deemphasis_allowed
    }

    fn post_processing_enabled(&self) -> bool {
        self.capabilities().post_processing_enabled
    }

    fn default_deemphasis_mode(&self) -> DeemphasisMode {
        self.capabilities().default_deemphasis_mode
    }

    /// De-emphasis modes a user may pick.
    fn deemphasis_modes(&self) -> &'static [DeemphasisMode] {
        if self.deemphasis_allowed() {
            &DeemphasisMode::ALL
        } else {
            &[DeemphasisMode::None]
        }
    }

    /// Audio filter bandwidth for a demodulator bandwidth.
    fn af_bandwidth(&self, bandwidth: f32) -> f32 {
        bandwidth * self.capabilities().af_bandwidth_ratio
    }

    /// Whether the audio filter follows bandwidth changes.
    fn dynamic_af_bandwidth(&self) -> bool {
        self.capabilities().dynamic_af_bandwidth
    }

    fn fm_if_nr_allowed(&self) -> bool {
        self.capabilities().fm_if_nr_allowed
    }

    fn nb_allowed(&self) -> bool {
        self.capabilities().nb_allowed
    }
}

/// Blocks, workers and streams of an initialised pipeline.
struct Chain {
    config: DemodConfig,
    bandwidth: f32,
    running: bool,
    demod: Worker<SsbDemod>,
    agc: Worker<Agc>,
    m2s: Worker<MonoToStereo>,
    generation: Arc<AtomicU64>,
}

/// Three-stage sideband demodulation pipeline.
pub struct Pipeline {
    mode: SsbMode,
    if_sample_rate: f32,
    af_sample_rate: f32,
    name: String,
    output: Option<Arc<Stream<Stereo>>>,
    chain: Option<Chain>,
}

impl Pipeline {
    /// An uninitialised pipeline for `mode`.
    pub fn new(mode: SsbMode, if_sample_rate: f32, af_sample_rate: f32) -> Self {
        Self {
            mode,
            if_sample_rate,
            af_sample_rate,
            name: String::new(),
            output: None,
            chain: None,
        }
    }

    pub fn mode(&self) -> SsbMode {
        self.mode
    }

    /// Instance name given at initialisation.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PipelineState {
        match &self.chain {
            None => PipelineState::Uninitialized,
            Some(chain) if chain.running => PipelineState::Running,
            Some(_) => PipelineState::Stopped,
        }
    }

    /// Current channel bandwidth, once initialised.
    pub fn bandwidth(&self) -> Option<f32> {
        self.chain.as_ref().map(|chain| chain.bandwidth)
    }

    /// Number of tap buffers the demodulator block has installed since `init`.
    pub fn taps_generation(&self) -> u64 {
        self.chain
            .as_ref()
            .map_or(0, |chain| chain.generation.load(Ordering::Acquire))
    }

    /// Build the chain and move to [`PipelineState::Stopped`].
    pub fn init(
        &mut self,
        name: &str,
        config: &DemodConfig,
        input: &Stream<Complex<f32>>,
        bandwidth: f32,
    ) -> Result<()> {
        config.validate()?;

        let demod = SsbDemod::new(self.mode, bandwidth, config.transition_width, self.if_sample_rate)?;
        let agc = Agc::new(config.agc_fall_rate, self.af_sample_rate)?;
        let generation = demod.generation();

        if self.chain.is_some() {
            self.stop()?;
            self.chain = None;
        }

        let output = self
            .output
            .get_or_insert_with(|| Arc::new(Stream::bounded(config.stream_capacity)))
            .clone();
        let demod_out = Stream::bounded(config.stream_capacity);
        let agc_out = Stream::bounded(config.stream_capacity);

        self.name = name.to_string();
        self.chain = Some(Chain {
            config: config.clone(),
            bandwidth,
            running: false,
            demod: Worker::new(format!("{}.demod", name), demod, input, &demod_out),
            agc: Worker::new(format!("{}.agc", name), agc, &demod_out, &agc_out),
            m2s: Worker::new(format!("{}.m2s", name), MonoToStereo::new(), &agc_out, &output),
            generation,
        });

        info!(
            "{} pipeline '{}' initialized: bandwidth {} Hz, IF {} Hz, AF {} Hz",
            self.mode, self.name, bandwidth, self.if_sample_rate, self.af_sample_rate
        );
        Ok(())
    }

    /// Start the workers, sink first. Does nothing if already running.
    pub fn start(&mut self) -> Result<()> {
        let chain = self.chain.as_mut().ok_or(Error::NotInitialized)?;
        if chain.running {
            return Ok(());
        }

        let started = chain
            .m2s
            .start()
            .and_then(|_| chain.agc.start())
            .and_then(|_| chain.demod.start());
        if let Err(e) = started {
            warn!("{} pipeline '{}' failed to start: {}", self.mode, self.name, e);
            chain.demod.stop().ok();
            chain.agc.stop().ok();
            chain.m2s.stop().ok();
            return Err(e);
        }

        chain.running = true;
        info!("{} pipeline '{}' started", self.mode, self.name);
        Ok(())
    }

    /// Stop the workers, source first. Does nothing unless running.
    ///
    /// Every worker is stopped even if an earlier one reports a panic; the
    /// first failure is returned.
    pub fn stop(&mut self) -> Result<()> {
        let Some(chain) = self.chain.as_mut() else {
            return Ok(());
        };
        if !chain.running {
            return Ok(());
        }

        let demod = chain.demod.stop();
        let agc = chain.agc.stop();
        let m2s = chain.m2s.stop();
        chain.running = false;
        info!("{} pipeline '{}' stopped", self.mode, self.name);

        demod.and(agc).and(m2s)
    }

    /// Redesign the channel filter for `bandwidth` and hand it to the
    /// demodulator block, running or not.
    pub fn set_bandwidth(&mut self, bandwidth: f32) -> Result<()> {
        let chain = self.chain.as_mut().ok_or(Error::NotInitialized)?;
        let taps = SsbDemod::design_taps(
            self.mode,
            bandwidth,
            chain.config.transition_width,
            self.if_sample_rate,
        )?;
        let count = taps.len();
        chain.demod.send(SsbCommand::SetTaps { bandwidth, taps })?;
        chain.bandwidth = bandwidth;
        debug!(
            "{} pipeline '{}': bandwidth {} Hz ({} taps)",
            self.mode, self.name, bandwidth, count
        );
        Ok(())
    }

    /// Read IF samples from `input` from the next batch on.
    pub fn set_input(&mut self, input: &Stream<Complex<f32>>) -> Result<()> {
        let chain = self.chain.as_mut().ok_or(Error::NotInitialized)?;
        chain.demod.set_input(input)?;
        debug!("{} pipeline '{}': input replaced", self.mode, self.name);
        Ok(())
    }

    /// The audio output stream.
    pub fn output(&self) -> Result<Arc<Stream<Stereo>>> {
        self.output.clone().ok_or(Error::NotInitialized)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{} pipeline '{}': {}", self.mode, self.name, e);
        }
    }
}
