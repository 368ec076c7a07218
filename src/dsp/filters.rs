//! Runtime FIR filtering.
//!
//! This module provides the filter block the demodulators run their channel
//! filter with:
//! - [`FirFilter`]: stateful FIR filter over complex samples, with real or
//!   complex taps that can be replaced between batches
//!
//! # Example
//!
//! ```
//! use num_complex::Complex;
//! use radiochain::dsp::filters::{ChannelTaps, FirFilter};
//! use radiochain::dsp::taps::{LowPass, TapGenerator};
//!
//! let design = LowPass::new(3_000.0, 1_000.0, 24_000.0)?;
//! let mut filter = FirFilter::new(ChannelTaps::Real(design.generate(1.0).unwrap()));
//!
//! let input = vec![Complex::new(1.0, 0.0); 100];
//! let output = filter.process(&input);
//! assert_eq!(output.len(), 100);
//! # Ok::<(), radiochain::Error>(())
//! ```

use num_complex::Complex;

/// Coefficients of a channel filter.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelTaps {
    /// Real taps, applied to both I and Q
    Real(Vec<f32>),
    /// Complex taps, for asymmetric (shifted) pass bands
    Complex(Vec<Complex<f32>>),
}

impl ChannelTaps {
    /// Number of coefficients.
    pub fn len(&self) -> usize {
        match self {
            ChannelTaps::Real(taps) => taps.len(),
            ChannelTaps::Complex(taps) => taps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<f32>> for ChannelTaps {
    fn from(taps: Vec<f32>) -> Self {
        ChannelTaps::Real(taps)
    }
}

impl From<Vec<Complex<f32>>> for ChannelTaps {
    fn from(taps: Vec<Complex<f32>>) -> Self {
        ChannelTaps::Complex(taps)
    }
}

/// Finite Impulse Response (FIR) filter over complex samples.
///
/// The filter keeps the last `taps - 1` input samples between calls to
/// [`process`](Self::process), so a stream split into batches is filtered
/// exactly as if it were processed in one piece. Tap `0` multiplies the
/// oldest sample in the window and the last tap the newest one.
///
/// Taps are owned by the filter. [`set_taps`](Self::set_taps) installs a
/// new buffer and hands back the old one; the history is kept so the output
/// stays continuous across the swap.
pub struct FirFilter {
    /// Filter coefficients (impulse response)
    taps: ChannelTaps,
    /// Last `taps - 1` input samples, oldest first
    history: Vec<Complex<f32>>,
}

impl FirFilter {
    /// Create a new FIR filter with zeroed history.
    ///
    /// An empty tap set passes samples through unchanged.
    pub fn new(taps: ChannelTaps) -> Self {
        let history = vec![Complex::new(0.0, 0.0); taps.len().saturating_sub(1)];
        Self { taps, history }
    }

    /// Replace the coefficients, returning the retired buffer.
    pub fn set_taps(&mut self, taps: ChannelTaps) -> ChannelTaps {
        let keep = taps.len().saturating_sub(1);
        let have = self.history.len();
        if keep < have {
            self.history.drain(0..have - keep);
        } else if keep > have {
            let mut history = vec![Complex::new(0.0, 0.0); keep - have];
            history.append(&mut self.history);
            self.history = history;
        }
        std::mem::replace(&mut self.taps, taps)
    }

    /// Current coefficients.
    pub fn taps(&self) -> &ChannelTaps {
        &self.taps
    }

    /// Number of filter taps.
    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    /// Clear the sample history.
    pub fn reset(&mut self) {
        for s in self.history.iter_mut() {
            *s = Complex::new(0.0, 0.0);
        }
    }

    /// Process a block of samples through the filter.
    ///
    /// # Returns
    ///
    /// A vector of filtered samples with the same length as the input.
    pub fn process(&mut self, samples: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let taps = self.taps.len();
        if taps == 0 {
            return samples.to_vec();
        }

        self.history.extend_from_slice(samples);
        let mut out = Vec::with_capacity(samples.len());

        match &self.taps {
            ChannelTaps::Real(fir) => {
                for window in self.history.windows(taps) {
                    let mut acc = Complex::new(0.0f32, 0.0);
                    for (s, t) in window.iter().zip(fir.iter()) {
                        acc += s * t;
                    }
                    out.push(acc);
                }
            }
            ChannelTaps::Complex(fir) => {
                for window in self.history.windows(taps) {
                    let mut acc = Complex::new(0.0f32, 0.0);
                    for (s, t) in window.iter().zip(fir.iter()) {
                        acc += s * t;
                    }
                    out.push(acc);
                }
            }
        }

        // Keep only the samples needed for the next batch
        let drop = self.history.len() - (taps - 1);
        self.history.drain(0..drop);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::taps::{BandPass, LowPass, TapGenerator};
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn lowpass(cutoff: f32, sample_rate: f32) -> FirFilter {
        let design = LowPass::new(cutoff, 1_000.0, sample_rate).unwrap();
        FirFilter::new(ChannelTaps::Real(design.generate(1.0).unwrap()))
    }

    fn tone(freq: f32, sample_rate: f32, len: usize) -> Vec<Complex<f32>> {
        (0..len)
            .map(|n| Complex::new(0.0, 2.0 * PI * freq * n as f32 / sample_rate).exp())
            .collect()
    }

    fn rms(samples: &[Complex<f32>]) -> f32 {
        (samples.iter().map(|s| s.norm_sqr()).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_fir_creation() {
        let filter = lowpass(3_000.0, 24_000.0);
        assert_eq!(filter.tap_count(), 97);
        assert_eq!(filter.history.len(), 96);
    }

    #[test]
    fn test_fir_dc_gain() {
        let mut filter = lowpass(3_000.0, 24_000.0);

        // DC signal (constant value) should pass through with unity gain
        let input = vec![Complex::new(1.0, -0.5); 1000];
        let output = filter.process(&input);

        // Skip the filter's start-up transient
        for sample in output.iter().skip(200) {
            assert_relative_eq!(sample.re, 1.0, epsilon = 1e-3);
            assert_relative_eq!(sample.im, -0.5, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_fir_impulse_response_is_reversed_taps() {
        let taps: Vec<f32> = vec![0.1, 0.2, 0.3, 0.4];
        let mut filter = FirFilter::new(ChannelTaps::Real(taps.clone()));

        let mut input = vec![Complex::new(0.0, 0.0); 8];
        input[0] = Complex::new(1.0, 0.0);
        let output = filter.process(&input);

        // Tap 0 meets the oldest sample, so the impulse comes out last tap first
        for k in 0..4 {
            assert_relative_eq!(output[k].re, taps[3 - k], epsilon = 1e-7);
        }
        for sample in &output[4..] {
            assert_eq!(sample.re, 0.0);
        }
    }

    #[test]
    fn test_fir_batches_match_single_pass() {
        let input = tone(1_234.0, 24_000.0, 600);

        let mut whole = lowpass(3_000.0, 24_000.0);
        let expected = whole.process(&input);

        let mut split = lowpass(3_000.0, 24_000.0);
        let mut actual = Vec::new();
        for chunk in input.chunks(37) {
            actual.extend(split.process(chunk));
        }

        assert_eq!(expected.len(), actual.len());
        for (a, b) in expected.iter().zip(actual.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-6);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fir_rejects_stopband() {
        let mut filter = lowpass(2_000.0, 24_000.0);
        let passed = filter.process(&tone(500.0, 24_000.0, 2000));
        filter.reset();
        let rejected = filter.process(&tone(6_000.0, 24_000.0, 2000));

        assert!(rms(&passed[200..]) > 0.95);
        assert!(rms(&rejected[200..]) < 0.01);
    }

    #[test]
    fn test_fir_complex_taps_select_one_side() {
        let design = BandPass::new(0.0, 3_000.0, 1_000.0, 24_000.0).unwrap();
        let mut filter = FirFilter::new(ChannelTaps::Complex(design.generate(1.0).unwrap()));

        let upper = filter.process(&tone(1_500.0, 24_000.0, 2000));
        filter.reset();
        let lower = filter.process(&tone(-1_500.0, 24_000.0, 2000));

        assert!(rms(&upper[200..]) > 0.95);
        assert!(rms(&lower[200..]) < 0.01);
    }

    #[test]
    fn test_fir_set_taps_returns_old_and_resizes_history() {
        let mut filter = lowpass(3_000.0, 24_000.0);
        let _ = filter.process(&tone(100.0, 24_000.0, 300));

        let old = filter.set_taps(ChannelTaps::Real(vec![1.0]));
        assert_eq!(old.len(), 97);
        assert_eq!(filter.tap_count(), 1);
        assert!(filter.history.is_empty());

        // A single unit tap is the identity
        let input = tone(100.0, 24_000.0, 10);
        assert_eq!(filter.process(&input), input);

        filter.set_taps(ChannelTaps::Real(vec![0.25; 4]));
        assert_eq!(filter.history.len(), 3);
    }

    #[test]
    fn test_fir_empty_taps_pass_through() {
        let mut filter = FirFilter::new(ChannelTaps::Real(Vec::new()));
        let input = tone(100.0, 24_000.0, 10);
        assert_eq!(filter.process(&input), input);
    }

    #[test]
    fn test_fir_empty_input() {
        let mut filter = lowpass(3_000.0, 24_000.0);
        let output = filter.process(&[]);
        assert_eq!(output.len(), 0);
        assert_eq!(filter.history.len(), 96);
    }

    #[test]
    fn test_fir_output_length() {
        let mut filter = lowpass(3_000.0, 24_000.0);
        for len in [1, 10, 100, 1000] {
            let input = vec![Complex::new(0.5, 0.0); len];
            assert_eq!(filter.process(&input).len(), len);
        }
    }
}
