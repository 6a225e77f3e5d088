//! Sample rate conversion using rubato.
//!
//! # Example
//!
//! ```rust
//! use vocalis_audio::resampler::resample;
//!
//! let input = vec![0.0f32; 22050];
//! let output = resample(&input, 22050, 16000).unwrap();
//! assert_eq!(output.len(), 16000);
//! ```

mod rubato_impl;

pub use rubato_impl::*;
