//! Mono to stereo expansion.

use crate::dsp::{DspBlock, NoCommand, Stereo};

/// Copies each mono sample to both channels of a stereo frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoToStereo;

impl MonoToStereo {
    pub fn new() -> Self {
        Self
    }
}

impl DspBlock for MonoToStereo {
    type Input = f32;
    type Output = Stereo;
    type Command = NoCommand;

    fn process(&mut self, data: &[f32]) -> Vec<Stereo> {
        data.iter().map(|&s| Stereo::mono(s)).collect()
    }

    fn handle(&mut self, command: NoCommand) {
        match command {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_channels() {
        let mut m2s = MonoToStereo::new();
        let out = m2s.process(&[0.25, -1.0, 0.0]);
        assert_eq!(
            out,
            vec![
                Stereo::new(0.25, 0.25),
                Stereo::new(-1.0, -1.0),
                Stereo::new(0.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_empty_batch() {
        let mut m2s = MonoToStereo::new();
        assert!(m2s.process(&[]).is_empty());
    }
}
