//! Test helper utilities for generating synthetic I/Q and audio signals

#![allow(dead_code)]

use std::f32::consts::PI;
use std::time::Duration;

use num_complex::Complex;
use radiochain::dsp::Stereo;
use radiochain::Stream;

/// How long a test waits for a pipeline to deliver audio
pub const PULL_TIMEOUT: Duration = Duration::from_secs(5);

/// Generate a complex exponential at a specific frequency
///
/// # Arguments
/// * `frequency` - Frequency in Hz, negative for the lower sideband
/// * `sample_rate` - Sample rate in Hz
/// * `num_samples` - Number of samples to generate
/// * `amplitude` - Peak magnitude of the tone
pub fn complex_tone(
    frequency: f32,
    sample_rate: f32,
    num_samples: usize,
    amplitude: f32,
) -> Vec<Complex<f32>> {
    let angular_freq = 2.0 * PI * frequency / sample_rate;
    (0..num_samples)
        .map(|n| Complex::from_polar(amplitude, angular_freq * n as f32))
        .collect()
}

/// Root mean square of a real signal
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Left channel of a batch of stereo frames
pub fn left(frames: &[Stereo]) -> Vec<f32> {
    frames.iter().map(|f| f.l).collect()
}

/// Pull batches until at least `count` frames arrived
///
/// Panics if the stream stays silent for [`PULL_TIMEOUT`].
pub fn collect_frames(stream: &Stream<Stereo>, count: usize) -> Vec<Stereo> {
    let mut frames = Vec::with_capacity(count);
    while frames.len() < count {
        match stream.pull_timeout(PULL_TIMEOUT) {
            Some(batch) => frames.extend(batch),
            None => panic!("no audio after {:?} ({} frames so far)", PULL_TIMEOUT, frames.len()),
        }
    }
    frames
}

/// Route test logs through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
