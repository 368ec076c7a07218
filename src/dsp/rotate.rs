/// Whole-buffer complex rotation used to frequency-shift filter taps.
///
/// The rotation is accumulated: a unit phasor starts at the caller's phase and
/// is multiplied by a fixed per-sample increment after every sample. The
/// phasor is pulled back onto the unit circle once every [`ROTATOR_RELOAD`]
/// samples, and once more after a trailing partial block, so long buffers
/// keep a bounded magnitude error while needing only one `cos`/`sin` pair.
///
/// # Example
/// ```
/// use num_complex::Complex;
/// use radiochain::dsp::rotate::{phase_increment, rotate};
///
/// let mut taps = vec![Complex::new(1.0f32, 0.0); 4];
/// let mut phase = Complex::new(1.0, 0.0);
/// rotate(&mut taps, phase_increment(12_000.0, 48_000.0), &mut phase);
/// assert!((taps[1].im + 1.0).abs() < 1e-6); // -90 degrees per sample
/// ```
use num_complex::Complex;
use std::f32::consts::PI;

/// Number of samples rotated between phasor re-normalisations.
pub const ROTATOR_RELOAD: usize = 512;

/// Per-sample rotation increment `exp(-j·2π·frequency/sample_rate)`.
///
/// A positive `frequency` moves content down in frequency when applied to a
/// signal, and moves a filter's passband accordingly when applied to taps.
pub fn phase_increment(frequency: f32, sample_rate: f32) -> Complex<f32> {
    let angle = (-frequency / sample_rate) * 2.0 * PI;
    Complex::new(angle.cos(), angle.sin())
}

/// Rotate `data` in place, starting from `phase` and advancing it by
/// `increment` after each sample. `phase` is left at the value the next
/// sample would use.
pub fn rotate(data: &mut [Complex<f32>], increment: Complex<f32>, phase: &mut Complex<f32>) {
    let mut blocks = data.chunks_exact_mut(ROTATOR_RELOAD);
    for block in blocks.by_ref() {
        for s in block.iter_mut() {
            *s *= *phase;
            *phase *= increment;
        }
        renormalize(phase);
    }

    let tail = blocks.into_remainder();
    if !tail.is_empty() {
        for s in tail.iter_mut() {
            *s *= *phase;
            *phase *= increment;
        }
        renormalize(phase);
    }
}

fn renormalize(phase: &mut Complex<f32>) {
    let mag = phase.re.hypot(phase.im);
    if mag > 0.0 {
        *phase /= mag;
    }
}
