//! Error taxonomy for the channel engine
//!
//! - `ValidationError`: malformed configuration or input, rejected before
//!   any state is touched. Recoverable.
//! - `StateError`: the channel cannot serve the request right now
//!   (reconfiguration in flight, faulted instance, unknown handle). Recoverable.
//! - `NumericalError`: a non-finite value escaped filter design or
//!   processing. Fatal to the channel instance that produced it.

use thiserror::Error;

/// Configuration or argument rejected before any state mutation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("sample rate must be finite and > 0, got {0}")]
    InvalidSampleRate(f64),

    #[error("channel needs at least one path")]
    NoPaths,

    #[error("path {index}: delay must be finite and >= 0, got {delay_s} s")]
    InvalidDelay { index: usize, delay_s: f64 },

    #[error("path {index}: average gain must be finite, got {gain_db} dB")]
    InvalidGain { index: usize, gain_db: f64 },

    #[error("path {index}: {gain_db} dB has no finite nonzero linear power")]
    GainOutOfRange { index: usize, gain_db: f64 },

    #[error("normalization needs a finite total path power, got {0}")]
    InvalidTotalPower(f64),

    #[error("delay vector has {delays} entries but gain vector has {gains}")]
    LengthMismatch { delays: usize, gains: usize },

    #[error("path {index}: delay of {delay_samples:.1} samples exceeds the limit of {max}")]
    DelayTooLong {
        index: usize,
        delay_samples: f64,
        max: usize,
    },

    #[error("maximum Doppler shift must be finite and >= 0, got {0} Hz")]
    InvalidDopplerShift(f64),

    #[error("maximum Doppler shift {doppler_hz} Hz exceeds sample_rate/2 = {limit_hz} Hz")]
    DopplerTooHigh { doppler_hz: f64, limit_hz: f64 },

    #[error("invalid Doppler spectrum: {0}")]
    InvalidSpectrum(String),

    #[error("K-factor must be >= 0 and not NaN, got {0}")]
    InvalidKFactor(f64),

    #[error("line-of-sight Doppler shift must be finite, got {0} Hz")]
    InvalidLosDoppler(f64),

    #[error("line-of-sight initial phase must be finite, got {0}")]
    InvalidLosPhase(f64),

    #[error("K-factor supplied for path {index}, which is not the Rician path")]
    KFactorOnDiffusePath { index: usize },

    #[error("K-factor supplied but no path is designated Rician")]
    NoRicianPath,

    #[error("Rician path index {index} out of range for {num_paths} paths")]
    RicianPathOutOfRange { index: usize, num_paths: usize },

    #[error("path index {index} out of range for {num_paths} paths")]
    PathIndexOutOfRange { index: usize, num_paths: usize },

    #[error("input sample {index} is not finite")]
    NonFiniteInput { index: usize },

    #[error("frequency response needs at least one point")]
    ZeroPoints,
}

/// The channel cannot serve the request in its current state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("a reconfiguration is in flight")]
    ReconfigurationInFlight,

    #[error("channel is faulted after a numerical error and must be rebuilt")]
    Faulted,

    #[error("no channel with id {0}")]
    UnknownChannel(u64),

    #[error("channel registry is full")]
    RegistryFull,

    #[error("channel lock poisoned by a panicking thread")]
    LockPoisoned,
}

/// Non-finite value from filter design or sample processing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericalError {
    #[error("non-finite output at sample {sample_index}")]
    NonFiniteOutput { sample_index: u64 },

    #[error("non-finite or zero-energy {what} filter")]
    DegenerateFilter { what: &'static str },
}

/// Top-level error returned by every fallible channel operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("numerical error: {0}")]
    Numerical(#[from] NumericalError),
}

impl ChannelError {
    /// Whether the caller may retry with corrected input or later.
    ///
    /// Numerical errors reproduce deterministically from identical state,
    /// so they are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ChannelError::Numerical(_))
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
