#![doc = include_str!("../readme.md")]

pub mod config;
pub mod demod;
pub mod dsp;
pub mod error;
pub mod stream;
pub mod worker;

pub use error::{Error, Result};
pub use num_complex::Complex;

pub use config::DemodConfig;
pub use demod::{Demodulator, Dsb, Lsb, PipelineState, Usb};
pub use dsp::taps::{BandPass, ComplexDesign, LowPass, Notch, RealDesign, RootRaisedCosine, TapGenerator};
pub use stream::Stream;
