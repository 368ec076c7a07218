//! FIR tap generation.
//!
//! This module designs filter coefficients ("taps") for the filter shapes used
//! by the demodulators:
//! - [`LowPass`]: Blackman-windowed sinc low-pass (real taps)
//! - [`BandPass`]: windowed-sinc low-pass shifted to the band centre (complex taps)
//! - [`RootRaisedCosine`]: root-raised-cosine pulse shaping (real taps)
//! - [`Notch`]: decaying Blackman pulse shifted to a target frequency (complex taps)
//!
//! Every design implements [`TapGenerator`]. Designs only store their scalar
//! parameters; the tap count and the taps themselves are derived on demand,
//! so setters are cheap and may be called freely between generations.
//!
//! The shape enums [`RealDesign`] and [`ComplexDesign`] give a closed set of
//! variants with an explicit `Unconfigured` state, which reports no tap count
//! and leaves output buffers untouched.
//!
//! # Example
//!
//! ```
//! use radiochain::dsp::taps::{LowPass, TapGenerator};
//!
//! let design = LowPass::new(3_000.0, 1_000.0, 48_000.0)?;
//! assert_eq!(design.tap_count(), Some(193));
//!
//! let taps = design.generate(1.0).unwrap();
//! let sum: f32 = taps.iter().sum();
//! assert!((sum - 1.0).abs() < 1e-4);
//! # Ok::<(), radiochain::Error>(())
//! ```

use std::f32::consts::PI;

use num_complex::Complex;

use crate::dsp::rotate::{phase_increment, rotate};
use crate::dsp::window::{blackman, sinc};
use crate::error::{ensure_finite, ensure_positive, Error, Result};

/// Smallest tap count the windowed-sinc designs will derive.
pub const MIN_WINDOWED_SINC_TAPS: usize = 4;

/// Smallest tap count for designs with an explicit count (RRC, notch).
pub const MIN_EXPLICIT_TAPS: usize = 1;

/// Largest tap count any design may call for.
///
/// Odd, so forcing a count odd never pushes it past the bound. Designs whose
/// parameters would exceed it are rejected with [`Error::InvalidParameter`].
pub const MAX_TAPS: usize = (1 << 20) - 1;

/// Common contract of all filter designs.
pub trait TapGenerator {
    /// Coefficient type (`f32` or `Complex<f32>`).
    type Tap: Copy + Default;

    /// Number of taps the current parameters call for, always odd.
    ///
    /// `None` means the design is not configured yet.
    fn tap_count(&self) -> Option<usize>;

    /// Fill `taps` with coefficients; the buffer length is the tap count.
    ///
    /// `factor` sets the DC gain of the result.
    fn create_taps(&self, taps: &mut [Self::Tap], factor: f32);

    /// Allocate a buffer of [`tap_count`](Self::tap_count) taps and fill it.
    fn generate(&self, factor: f32) -> Option<Vec<Self::Tap>> {
        let count = self.tap_count()?;
        let mut taps = vec![Self::Tap::default(); count];
        self.create_taps(&mut taps, factor);
        Some(taps)
    }
}

/// Tap count of a windowed-sinc design: `4 / (transition_width / sample_rate)`,
/// truncated, at least [`MIN_WINDOWED_SINC_TAPS`], bumped to the next odd value.
fn windowed_sinc_tap_count(transition_width: f32, sample_rate: f32) -> usize {
    let m = 4.0f32 / (transition_width / sample_rate);
    let mut m = (m as usize).max(MIN_WINDOWED_SINC_TAPS);
    if m % 2 == 0 {
        m += 1;
    }
    m
}

/// Reject a transition width too narrow for [`MAX_TAPS`] at this rate.
fn check_transition_width(transition_width: f32, sample_rate: f32) -> Result<()> {
    let m = 4.0f32 / (transition_width / sample_rate);
    if m <= MAX_TAPS as f32 {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "transition width {} Hz at {} Hz needs more than {} taps",
            transition_width, sample_rate, MAX_TAPS
        )))
    }
}

fn check_tap_count(count: usize) -> Result<()> {
    if count > MAX_TAPS {
        return Err(Error::invalid(format!("tap count {} exceeds {}", count, MAX_TAPS)));
    }
    Ok(())
}

/// Clamp an explicit tap count to the minimum and force it odd.
fn odd_tap_count(count: usize) -> usize {
    count.max(MIN_EXPLICIT_TAPS) | 1
}

/// Blackman coefficient for tap `i` of an `n`-tap window; a single tap is 1.
fn window_at(i: usize, n: usize) -> f64 {
    if n < 2 {
        1.0
    } else {
        blackman(i as f64, (n - 1) as f64)
    }
}

/// Write the unnormalised windowed-sinc envelope through `store` and return its sum.
fn windowed_sinc(cutoff: f32, sample_rate: f32, n: usize, mut store: impl FnMut(usize, f32)) -> f32 {
    let omega = (2.0 * PI * (cutoff / sample_rate)).min(PI);
    let tc = n as f32;
    let mut sum = 0.0f32;
    for i in 0..n {
        let val = (sinc(omega, i as f32 - tc / 2.0, PI) as f64 * window_at(i, n)) as f32;
        store(i, val);
        sum += val;
    }
    sum
}

/// Blackman-windowed sinc low-pass design.
#[derive(Debug, Clone, PartialEq)]
pub struct LowPass {
    cutoff: f32,
    transition_width: f32,
    sample_rate: f32,
}

impl LowPass {
    /// Create a low-pass design.
    ///
    /// # Arguments
    ///
    /// * `cutoff` - Cutoff frequency in Hz, clamped to Nyquist when generating
    /// * `transition_width` - Width of the transition band in Hz
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(cutoff: f32, transition_width: f32, sample_rate: f32) -> Result<Self> {
        ensure_positive("cutoff", cutoff)?;
        ensure_positive("transition width", transition_width)?;
        ensure_positive("sample rate", sample_rate)?;
        check_transition_width(transition_width, sample_rate)?;
        Ok(Self {
            cutoff,
            transition_width,
            sample_rate,
        })
    }

    /// Replace all parameters at once.
    pub fn init(&mut self, cutoff: f32, transition_width: f32, sample_rate: f32) -> Result<()> {
        *self = Self::new(cutoff, transition_width, sample_rate)?;
        Ok(())
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        ensure_positive("sample rate", sample_rate)?;
        check_transition_width(self.transition_width, sample_rate)?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    pub fn set_cutoff(&mut self, cutoff: f32) -> Result<()> {
        ensure_positive("cutoff", cutoff)?;
        self.cutoff = cutoff;
        Ok(())
    }

    pub fn set_transition_width(&mut self, transition_width: f32) -> Result<()> {
        ensure_positive("transition width", transition_width)?;
        check_transition_width(transition_width, self.sample_rate)?;
        self.transition_width = transition_width;
        Ok(())
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn transition_width(&self) -> f32 {
        self.transition_width
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl TapGenerator for LowPass {
    type Tap = f32;

    fn tap_count(&self) -> Option<usize> {
        Some(windowed_sinc_tap_count(self.transition_width, self.sample_rate))
    }

    /// The taps sum to `factor`. A degenerate all-zero envelope is left as is.
    fn create_taps(&self, taps: &mut [f32], factor: f32) {
        let sum = windowed_sinc(self.cutoff, self.sample_rate, taps.len(), |i, v| taps[i] = v);
        if sum != 0.0 {
            for tap in taps.iter_mut() {
                *tap *= factor;
                *tap /= sum;
            }
        }
    }
}

/// Complex band-pass design: a low-pass of half the bandwidth moved to the
/// centre of `[low_cutoff, high_cutoff]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandPass {
    low_cutoff: f32,
    high_cutoff: f32,
    transition_width: f32,
    sample_rate: f32,
}

impl BandPass {
    /// Create a band-pass design.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCutoffs`] if `low_cutoff > high_cutoff`.
    pub fn new(
        low_cutoff: f32,
        high_cutoff: f32,
        transition_width: f32,
        sample_rate: f32,
    ) -> Result<Self> {
        check_cutoffs(low_cutoff, high_cutoff)?;
        ensure_positive("transition width", transition_width)?;
        ensure_positive("sample rate", sample_rate)?;
        check_transition_width(transition_width, sample_rate)?;
        Ok(Self {
            low_cutoff,
            high_cutoff,
            transition_width,
            sample_rate,
        })
    }

    /// Replace all parameters at once.
    pub fn init(
        &mut self,
        low_cutoff: f32,
        high_cutoff: f32,
        transition_width: f32,
        sample_rate: f32,
    ) -> Result<()> {
        *self = Self::new(low_cutoff, high_cutoff, transition_width, sample_rate)?;
        Ok(())
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        ensure_positive("sample rate", sample_rate)?;
        check_transition_width(self.transition_width, sample_rate)?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    /// Set both cutoffs. On error the design is left unchanged.
    pub fn set_cutoffs(&mut self, low_cutoff: f32, high_cutoff: f32) -> Result<()> {
        check_cutoffs(low_cutoff, high_cutoff)?;
        self.low_cutoff = low_cutoff;
        self.high_cutoff = high_cutoff;
        Ok(())
    }

    pub fn set_low_cutoff(&mut self, low_cutoff: f32) -> Result<()> {
        self.set_cutoffs(low_cutoff, self.high_cutoff)
    }

    pub fn set_high_cutoff(&mut self, high_cutoff: f32) -> Result<()> {
        self.set_cutoffs(self.low_cutoff, high_cutoff)
    }

    pub fn set_transition_width(&mut self, transition_width: f32) -> Result<()> {
        ensure_positive("transition width", transition_width)?;
        check_transition_width(transition_width, self.sample_rate)?;
        self.transition_width = transition_width;
        Ok(())
    }

    pub fn low_cutoff(&self) -> f32 {
        self.low_cutoff
    }

    pub fn high_cutoff(&self) -> f32 {
        self.high_cutoff
    }

    pub fn transition_width(&self) -> f32 {
        self.transition_width
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Centre of the pass band in Hz.
    pub fn offset(&self) -> f32 {
        (self.low_cutoff + self.high_cutoff) / 2.0
    }

    /// Half the pass band width in Hz, the cutoff of the underlying low-pass.
    pub fn cutoff(&self) -> f32 {
        ((self.high_cutoff - self.low_cutoff) / 2.0).abs()
    }
}

fn check_cutoffs(low: f32, high: f32) -> Result<()> {
    ensure_finite("low cutoff", low)?;
    ensure_finite("high cutoff", high)?;
    if low > high {
        return Err(Error::InvalidCutoffs { low, high });
    }
    Ok(())
}

impl TapGenerator for BandPass {
    type Tap = Complex<f32>;

    fn tap_count(&self) -> Option<usize> {
        Some(windowed_sinc_tap_count(self.transition_width, self.sample_rate))
    }

    /// The real parts sum to `factor` before the frequency shift.
    fn create_taps(&self, taps: &mut [Complex<f32>], factor: f32) {
        let sum = windowed_sinc(self.cutoff(), self.sample_rate, taps.len(), |i, v| {
            taps[i] = Complex::new(v, 0.0)
        });
        if sum != 0.0 {
            for tap in taps.iter_mut() {
                *tap = *tap * factor;
                *tap = *tap / sum;
            }
        }

        let mut phase = Complex::new(1.0, 0.0);
        rotate(taps, phase_increment(self.offset(), self.sample_rate), &mut phase);
    }
}

/// Root-raised-cosine pulse shaping design.
#[derive(Debug, Clone, PartialEq)]
pub struct RootRaisedCosine {
    tap_count: usize,
    sample_rate: f32,
    baud_rate: f32,
    alpha: f32,
}

impl RootRaisedCosine {
    /// Create an RRC design.
    ///
    /// # Arguments
    ///
    /// * `tap_count` - Requested length, raised to the next odd value (min 1, max [`MAX_TAPS`])
    /// * `sample_rate` - Sample rate in Hz
    /// * `baud_rate` - Symbol rate in Hz
    /// * `alpha` - Roll-off factor in `[0, 1]`
    pub fn new(tap_count: usize, sample_rate: f32, baud_rate: f32, alpha: f32) -> Result<Self> {
        ensure_positive("sample rate", sample_rate)?;
        ensure_positive("baud rate", baud_rate)?;
        check_alpha(alpha)?;
        check_tap_count(tap_count)?;
        Ok(Self {
            tap_count,
            sample_rate,
            baud_rate,
            alpha,
        })
    }

    /// Replace all parameters at once.
    pub fn init(&mut self, tap_count: usize, sample_rate: f32, baud_rate: f32, alpha: f32) -> Result<()> {
        *self = Self::new(tap_count, sample_rate, baud_rate, alpha)?;
        Ok(())
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        ensure_positive("sample rate", sample_rate)?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    pub fn set_baud_rate(&mut self, baud_rate: f32) -> Result<()> {
        ensure_positive("baud rate", baud_rate)?;
        self.baud_rate = baud_rate;
        Ok(())
    }

    pub fn set_tap_count(&mut self, tap_count: usize) -> Result<()> {
        check_tap_count(tap_count)?;
        self.tap_count = tap_count;
        Ok(())
    }

    pub fn set_alpha(&mut self, alpha: f32) -> Result<()> {
        check_alpha(alpha)?;
        self.alpha = alpha;
        Ok(())
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn baud_rate(&self) -> f32 {
        self.baud_rate
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Samples per symbol.
    pub fn samples_per_symbol(&self) -> f32 {
        self.sample_rate / self.baud_rate
    }

    /// Impulse response value at integer offset `xindx` from the centre.
    ///
    /// Both removable singularities of the closed form are replaced by their
    /// limits: the centre sample, and `|4·α·x/spb| = 1`. With `alpha == 0`
    /// the first-branch expressions are taken in their α→0 limit as well.
    fn tap_at(&self, xindx: f64, spb: f64) -> f64 {
        let pi = PI as f64;
        let alpha = self.alpha;
        let four_alpha = (4.0 * alpha) as f64;
        let one_plus = (1.0 + alpha) as f64;
        let one_minus = (1.0 - alpha) as f64;

        let x1 = pi * xindx / spb;
        let x2 = four_alpha * xindx / spb;
        let x3 = x2 * x2 - 1.0;

        if x3.abs() >= 0.000001 {
            let den = x3 * pi;
            if alpha == 0.0 {
                let scaled_num = if xindx != 0.0 {
                    (one_minus * x1).sin() * spb / xindx
                } else {
                    ((1.0 - alpha) * PI) as f64
                };
                return scaled_num / den;
            }
            let num = if xindx != 0.0 {
                (one_plus * x1).cos() + (one_minus * x1).sin() / (four_alpha * xindx / spb)
            } else {
                (one_plus * x1).cos() + ((1.0 - alpha) * PI / (4.0 * alpha)) as f64
            };
            four_alpha * num / den
        } else {
            if alpha == 1.0 {
                return -1.0;
            }
            let x3 = one_minus * x1;
            let x2 = one_plus * x1;
            let num = x2.sin() * one_plus * pi
                - x3.cos() * ((1.0 - alpha) * PI) as f64 * spb / (four_alpha * xindx)
                + x3.sin() * spb * spb / (four_alpha * xindx * xindx);
            let den = ((-32.0 * PI * alpha * alpha) as f64) * xindx / spb;
            four_alpha * num / den
        }
    }
}

fn check_alpha(alpha: f32) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(Error::invalid(format!("alpha must be in [0, 1], got {}", alpha)))
    }
}

impl TapGenerator for RootRaisedCosine {
    type Tap = f32;

    fn tap_count(&self) -> Option<usize> {
        Some(odd_tap_count(self.tap_count))
    }

    /// The taps sum to `factor` (unity DC gain by default).
    ///
    /// The response needs an odd length; given an even buffer the design
    /// fills one tap fewer and zeroes the last slot.
    fn create_taps(&self, taps: &mut [f32], factor: f32) {
        let n = if taps.len() % 2 == 0 {
            taps.len().saturating_sub(1)
        } else {
            taps.len()
        };
        if let Some(last) = taps.get_mut(n) {
            *last = 0.0;
        }

        let spb = (self.sample_rate / self.baud_rate) as f64;
        let center = (n / 2) as i64;
        let mut scale = 0.0f64;
        for (i, tap) in taps[..n].iter_mut().enumerate() {
            *tap = self.tap_at((i as i64 - center) as f64, spb) as f32;
            scale += *tap as f64;
        }

        if scale != 0.0 {
            for tap in taps[..n].iter_mut() {
                *tap = (*tap as f64 / scale) as f32 * factor;
            }
        }
    }
}

/// Decaying-pulse "notch" design.
///
/// The taps are a time-reversed, exponentially decaying Blackman pulse
/// moved to `frequency`. The `width` parameter is stored but does not take
/// part in the design.
#[derive(Debug, Clone, PartialEq)]
pub struct Notch {
    frequency: f32,
    width: f32,
    sample_rate: f32,
    tap_count: usize,
}

impl Notch {
    /// Create a notch design.
    ///
    /// # Arguments
    ///
    /// * `frequency` - Target frequency in Hz, may be negative
    /// * `width` - Notch width in Hz (currently unused by the design)
    /// * `sample_rate` - Sample rate in Hz
    /// * `tap_count` - Requested length, raised to the next odd value (min 1, max [`MAX_TAPS`])
    pub fn new(frequency: f32, width: f32, sample_rate: f32, tap_count: usize) -> Result<Self> {
        ensure_finite("frequency", frequency)?;
        ensure_finite("width", width)?;
        ensure_positive("sample rate", sample_rate)?;
        check_tap_count(tap_count)?;
        Ok(Self {
            frequency,
            width,
            sample_rate,
            tap_count,
        })
    }

    /// Replace all parameters at once.
    pub fn init(&mut self, frequency: f32, width: f32, sample_rate: f32, tap_count: usize) -> Result<()> {
        *self = Self::new(frequency, width, sample_rate, tap_count)?;
        Ok(())
    }

    pub fn set_frequency(&mut self, frequency: f32) -> Result<()> {
        ensure_finite("frequency", frequency)?;
        self.frequency = frequency;
        Ok(())
    }

    /// Accepted for interface parity; has no effect on the taps.
    pub fn set_width(&mut self, width: f32) -> Result<()> {
        ensure_finite("width", width)?;
        self.width = width;
        Ok(())
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        ensure_positive("sample rate", sample_rate)?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    pub fn set_tap_count(&mut self, tap_count: usize) -> Result<()> {
        check_tap_count(tap_count)?;
        self.tap_count = tap_count;
        Ok(())
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl TapGenerator for Notch {
    type Tap = Complex<f32>;

    fn tap_count(&self) -> Option<usize> {
        Some(odd_tap_count(self.tap_count))
    }

    /// Taps are scaled by `factor`; the pulse itself is not normalised.
    fn create_taps(&self, taps: &mut [Complex<f32>], factor: f32) {
        let n = taps.len();
        let fact = 1.0f32 / n as f32;
        for i in 0..n {
            let decay = (-fact * i as f32).exp();
            taps[n - i - 1] = Complex::new(decay * window_at(i, n) as f32, 0.0);
        }

        let mut phase = Complex::new(1.0, 0.0);
        rotate(taps, phase_increment(self.frequency, self.sample_rate), &mut phase);

        if factor != 1.0 {
            for tap in taps.iter_mut() {
                *tap = *tap * factor;
            }
        }
    }
}

/// Real-valued design variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RealDesign {
    /// No parameters yet: no tap count, generation is a no-op.
    #[default]
    Unconfigured,
    LowPass(LowPass),
    RootRaisedCosine(RootRaisedCosine),
}

impl TapGenerator for RealDesign {
    type Tap = f32;

    fn tap_count(&self) -> Option<usize> {
        match self {
            RealDesign::Unconfigured => None,
            RealDesign::LowPass(d) => d.tap_count(),
            RealDesign::RootRaisedCosine(d) => d.tap_count(),
        }
    }

    fn create_taps(&self, taps: &mut [f32], factor: f32) {
        match self {
            RealDesign::Unconfigured => {}
            RealDesign::LowPass(d) => d.create_taps(taps, factor),
            RealDesign::RootRaisedCosine(d) => d.create_taps(taps, factor),
        }
    }
}

impl From<LowPass> for RealDesign {
    fn from(design: LowPass) -> Self {
        RealDesign::LowPass(design)
    }
}

impl From<RootRaisedCosine> for RealDesign {
    fn from(design: RootRaisedCosine) -> Self {
        RealDesign::RootRaisedCosine(design)
    }
}

/// Complex-valued design variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ComplexDesign {
    /// No parameters yet: no tap count, generation is a no-op.
    #[default]
    Unconfigured,
    BandPass(BandPass),
    Notch(Notch),
}

impl TapGenerator for ComplexDesign {
    type Tap = Complex<f32>;

    fn tap_count(&self) -> Option<usize> {
        match self {
            ComplexDesign::Unconfigured => None,
            ComplexDesign::BandPass(d) => d.tap_count(),
            ComplexDesign::Notch(d) => d.tap_count(),
        }
    }

    fn create_taps(&self, taps: &mut [Complex<f32>], factor: f32) {
        match self {
            ComplexDesign::Unconfigured => {}
            ComplexDesign::BandPass(d) => d.create_taps(taps, factor),
            ComplexDesign::Notch(d) => d.create_taps(taps, factor),
        }
    }
}

impl From<BandPass> for ComplexDesign {
    fn from(design: BandPass) -> Self {
        ComplexDesign::BandPass(design)
    }
}

impl From<Notch> for ComplexDesign {
    fn from(design: Notch) -> Self {
        ComplexDesign::Notch(design)
    }
}
