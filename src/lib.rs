//! Multipath fading channel simulator
//!
//! Applies time-varying Rayleigh/Rician multipath to a complex baseband
//! stream. Each path has its own delay and average power; all paths share a
//! Doppler spectrum shape and maximum Doppler shift. One path may carry a
//! line-of-sight component with its own Doppler offset.
//!
//! ```no_run
//! use fading_channel::{ChannelConfig, FadingChannel};
//! use num_complex::Complex64;
//!
//! let config = ChannelConfig::from_vectors(5e6, &[0.0, 2e-7, 8e-7], &[0.0, -3.0, -8.0])?
//!     .with_max_doppler(200.0)
//!     .with_normalization(true);
//! let mut channel = FadingChannel::new(config, Some(1))?;
//! let faded = channel.process(&vec![Complex64::new(1.0, 0.0); 1024])?;
//! # Ok::<(), fading_channel::ChannelError>(())
//! ```
//!
//! With the `nif` feature the crate also builds as an Erlang NIF library.

pub mod channel;
pub mod characterize;
pub mod config;
pub mod delay_line;
pub mod doppler;
pub mod error;
pub mod fading;
pub mod noise;
pub mod path_gain;
pub mod registry;
pub mod shared;
pub mod spectrum;

#[cfg(feature = "nif")]
mod nif;


pub use channel::{ChannelState, FadingChannel};
pub use characterize::{frequency_axis, frequency_response, DopplerSpectrumEstimate, PathTap};
pub use config::{ChannelConfig, ConfigUpdate, DelayPolicy, Path, RicianParams, SynthesisMethod};
pub use error::{ChannelError, NumericalError, Result, StateError, ValidationError};
pub use registry::ChannelRegistry;
pub use shared::SharedChannel;
pub use spectrum::DopplerSpectrum;
