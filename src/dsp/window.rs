//! Window and interpolation kernels shared by the tap designs.
//!
//! - [`sinc`]: scaled sinc kernel used by the windowed-sinc designs
//! - [`blackman`]: Blackman window coefficient (alpha = 0.16)
//!
//! # Example
//!
//! ```
//! use radiochain::dsp::window::{blackman, sinc};
//! use std::f32::consts::PI;
//!
//! assert_eq!(sinc(0.5, 0.0, PI), 1.0);
//! assert!(blackman(0.0, 10.0).abs() < 1e-12);
//! ```

use std::f64::consts::PI;

/// Default alpha of the classic Blackman window.
pub const BLACKMAN_ALPHA: f64 = 0.16;

/// Sinc kernel `sin(omega * x) / (norm * x)`, defined as exactly 1 at `x == 0`.
///
/// With `norm = π` and `omega` the angular cutoff this gives the ideal
/// low-pass impulse response up to a constant scale, which the designs
/// remove when normalising their taps.
pub fn sinc(omega: f32, x: f32, norm: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        (omega * x).sin() / (norm * x)
    }
}

/// Blackman window coefficient for sample `n` of a window spanning `0..=big_n`.
pub fn blackman(n: f64, big_n: f64) -> f64 {
    blackman_with_alpha(n, big_n, BLACKMAN_ALPHA)
}

/// Generalised Blackman window coefficient.
///
/// `w(n) = a0 - a1*cos(2πn/N) + a2*cos(4πn/N)` with `a0 = (1-α)/2`,
/// `a1 = 1/2` and `a2 = α/2`.
pub fn blackman_with_alpha(n: f64, big_n: f64, alpha: f64) -> f64 {
    let a0 = (1.0 - alpha) / 2.0;
    let a1 = 0.5;
    let a2 = alpha / 2.0;
    a0 - a1 * (2.0 * PI * (n / big_n)).cos() + a2 * (4.0 * PI * (n / big_n)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sinc_center_is_one() {
        assert_eq!(sinc(1.234, 0.0, std::f32::consts::PI), 1.0);
    }

    #[test]
    fn test_sinc_matches_formula() {
        let omega = 0.3f32;
        let x = 2.5f32;
        let expected = (omega * x).sin() / (std::f32::consts::PI * x);
        assert_abs_diff_eq!(sinc(omega, x, std::f32::consts::PI), expected, epsilon = 1e-7);
    }

    #[test]
    fn test_sinc_is_even() {
        let pi = std::f32::consts::PI;
        for x in [0.5f32, 1.0, 3.5, 10.0] {
            assert_abs_diff_eq!(sinc(0.7, x, pi), sinc(0.7, -x, pi), epsilon = 1e-7);
        }
    }

    #[test]
    fn test_blackman_edges_and_center() {
        let n = 100.0;
        assert_abs_diff_eq!(blackman(0.0, n), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(blackman(n, n), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(blackman(n / 2.0, n), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_blackman_symmetric() {
        let big_n = 64.0;
        for i in 0..=64 {
            let n = i as f64;
            assert_abs_diff_eq!(blackman(n, big_n), blackman(big_n - n, big_n), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_blackman_alpha_zero_is_hann() {
        let big_n = 32.0;
        for i in 0..=32 {
            let n = i as f64;
            let hann = 0.5 - 0.5 * (2.0 * PI * n / big_n).cos();
            assert_abs_diff_eq!(blackman_with_alpha(n, big_n, 0.0), hann, epsilon = 1e-12);
        }
    }
}
