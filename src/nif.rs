//! Erlang NIF surface
//!
//! Channels live in a global registry and are addressed by integer handle.
//! Samples cross the boundary as native-endian f32 binaries with I and Q
//! interleaved.

use num_complex::Complex64;
use rustler::{Atom, Binary, Env, NifResult, NifStruct, OwnedBinary};

use crate::channel::ChannelState;
use crate::characterize::frequency_axis;
use crate::config::{ChannelConfig, ConfigUpdate, RicianParams};
use crate::error::{ChannelError, ValidationError};
use crate::registry::{ChannelRegistry, DEFAULT_CAPACITY};
use crate::spectrum::DopplerSpectrum;

lazy_static::lazy_static! {
    static ref CHANNELS: ChannelRegistry = ChannelRegistry::new(DEFAULT_CAPACITY);
}

mod atoms {
    rustler::atoms! {
        ok,
    }
}

rustler::init!("Elixir.FadingChannel.Nif");

/// Channel parameters from Elixir
#[derive(NifStruct, Debug, Clone)]
#[module = "FadingChannel.ChannelParams"]
pub struct NifChannelParams {
    pub sample_rate: f64,
    pub path_delays: Vec<f64>,
    pub path_gains_db: Vec<f64>,
    pub max_doppler_hz: f64,
    pub doppler_spectrum: String,
    /// Rician K-factor of the first path, 0 for Rayleigh
    pub k_factor: f64,
    pub los_doppler_hz: f64,
    pub normalize_path_gains: bool,
}

impl NifChannelParams {
    fn spectrum(&self) -> Result<DopplerSpectrum, ValidationError> {
        DopplerSpectrum::from_name(&self.doppler_spectrum).ok_or_else(|| {
            ValidationError::InvalidSpectrum(format!("unknown spectrum {:?}", self.doppler_spectrum))
        })
    }

    fn rician(&self) -> Option<RicianParams> {
        (self.k_factor != 0.0).then(|| RicianParams::new(self.k_factor, self.los_doppler_hz))
    }

    fn to_config(&self) -> Result<ChannelConfig, ValidationError> {
        let mut cfg = ChannelConfig::from_vectors(self.sample_rate, &self.path_delays, &self.path_gains_db)?
            .with_max_doppler(self.max_doppler_hz)
            .with_spectrum(self.spectrum()?)
            .with_normalization(self.normalize_path_gains);
        cfg.rician = self.rician();
        Ok(cfg)
    }

    fn to_update(&self) -> Result<ConfigUpdate, ValidationError> {
        Ok(ConfigUpdate::new()
            .sample_rate(self.sample_rate)
            .path_delays(self.path_delays.clone())
            .path_gains(self.path_gains_db.clone())
            .max_doppler(self.max_doppler_hz)
            .spectrum(self.spectrum()?)
            .rician(self.rician())
            .normalize(self.normalize_path_gains))
    }
}

/// Channel state for telemetry
#[derive(NifStruct, Debug, Clone)]
#[module = "FadingChannel.ChannelState"]
pub struct NifChannelState {
    pub samples_processed: u64,
    pub filter_delay: u64,
    /// `{re, im}` per path
    pub path_gains: Vec<(f64, f64)>,
}

impl From<ChannelState> for NifChannelState {
    fn from(state: ChannelState) -> Self {
        Self {
            samples_processed: state.samples_processed,
            filter_delay: state.filter_delay as u64,
            path_gains: state.path_gains.iter().map(|g| (g.re, g.im)).collect(),
        }
    }
}

fn term_error<E: Into<ChannelError>>(err: E) -> rustler::Error {
    let err: ChannelError = err.into();
    rustler::Error::Term(Box::new(err.to_string()))
}

fn decode_iq(bytes: &[u8]) -> NifResult<Vec<Complex64>> {
    if bytes.len() % 8 != 0 {
        return Err(rustler::Error::Term(Box::new("invalid_sample_size")));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|c| {
            let i = f32::from_ne_bytes([c[0], c[1], c[2], c[3]]);
            let q = f32::from_ne_bytes([c[4], c[5], c[6], c[7]]);
            Complex64::new(i as f64, q as f64)
        })
        .collect())
}

fn encode_iq<'a>(env: Env<'a>, samples: &[Complex64]) -> NifResult<Binary<'a>> {
    let mut owned = OwnedBinary::new(samples.len() * 8)
        .ok_or_else(|| rustler::Error::Term(Box::new("binary_alloc_failed")))?;

    let out = owned.as_mut_slice();
    for (chunk, s) in out.chunks_exact_mut(8).zip(samples) {
        chunk[..4].copy_from_slice(&(s.re as f32).to_ne_bytes());
        chunk[4..].copy_from_slice(&(s.im as f32).to_ne_bytes());
    }

    Ok(owned.release(env))
}

/// Creates a channel and returns its registry handle.
#[rustler::nif]
fn create_channel(params: NifChannelParams, seed: Option<u64>) -> NifResult<(Atom, u64)> {
    let config = params.to_config().map_err(term_error)?;
    let id = CHANNELS.create(config, seed).map_err(term_error)?;
    Ok((atoms::ok(), id))
}

/// Processes a block of interleaved f32 I/Q samples through the channel.
#[rustler::nif]
fn process_block<'a>(env: Env<'a>, channel_id: u64, input: Binary) -> NifResult<(Atom, Binary<'a>)> {
    let samples = decode_iq(input.as_slice())?;

    let output = CHANNELS
        .get(channel_id)
        .and_then(|ch| ch.process(&samples))
        .map_err(term_error)?;

    Ok((atoms::ok(), encode_iq(env, &output)?))
}

/// Applies a full parameter set to a live channel.
#[rustler::nif]
fn reconfigure(channel_id: u64, params: NifChannelParams) -> NifResult<Atom> {
    let update = params.to_update().map_err(term_error)?;
    CHANNELS
        .get(channel_id)
        .and_then(|ch| ch.reconfigure(&update))
        .map_err(term_error)?;
    Ok(atoms::ok())
}

/// Advances channel state by N samples of silence.
#[rustler::nif]
fn advance(channel_id: u64, num_samples: u64) -> NifResult<Atom> {
    CHANNELS
        .get(channel_id)
        .and_then(|ch| ch.advance(num_samples as usize))
        .map_err(term_error)?;
    Ok(atoms::ok())
}

#[rustler::nif]
fn reset(channel_id: u64) -> NifResult<Atom> {
    CHANNELS
        .get(channel_id)
        .and_then(|ch| ch.reset())
        .map_err(term_error)?;
    Ok(atoms::ok())
}

/// Destroys a channel and frees its registry slot.
#[rustler::nif]
fn destroy_channel(channel_id: u64) -> NifResult<Atom> {
    let _ = CHANNELS.remove(channel_id);
    Ok(atoms::ok())
}

#[rustler::nif]
fn get_state(channel_id: u64) -> NifResult<(Atom, NifChannelState)> {
    let state = CHANNELS
        .get(channel_id)
        .and_then(|ch| ch.state())
        .map_err(term_error)?;
    Ok((atoms::ok(), state.into()))
}

/// Returns `[{delay_samples, re, im}]`, one entry per path.
#[rustler::nif]
fn impulse_response(channel_id: u64) -> NifResult<(Atom, Vec<(f64, f64, f64)>)> {
    let taps = CHANNELS
        .get(channel_id)
        .and_then(|ch| ch.snapshot_impulse_response())
        .map_err(term_error)?;
    let taps = taps
        .iter()
        .map(|t| (t.delay_samples, t.gain.re, t.gain.im))
        .collect();
    Ok((atoms::ok(), taps))
}

/// Returns `[{freq_hz, re, im}]` in FFT bin order.
#[rustler::nif]
fn frequency_response(channel_id: u64, num_points: u64) -> NifResult<(Atom, Vec<(f64, f64, f64)>)> {
    let ch = CHANNELS.get(channel_id).map_err(term_error)?;
    let n = num_points as usize;
    let h = ch.snapshot_frequency_response(n).map_err(term_error)?;
    let sample_rate = ch.config().map_err(term_error)?.sample_rate;

    let points = frequency_axis(n, sample_rate)
        .into_iter()
        .zip(&h)
        .map(|(f, x)| (f, x.re, x.im))
        .collect();
    Ok((atoms::ok(), points))
}

/// Returns `{empirical, theoretical, segments}` for one path.
#[rustler::nif]
#[allow(clippy::type_complexity)]
fn doppler_spectrum(
    channel_id: u64,
    path: u64,
) -> NifResult<(Atom, Vec<(f64, f64)>, Vec<(f64, f64)>, u64)> {
    let est = CHANNELS
        .get(channel_id)
        .and_then(|ch| ch.doppler_spectrum_estimate(path as usize))
        .map_err(term_error)?;
    Ok((atoms::ok(), est.empirical, est.theoretical, est.segments))
}

/// Returns the number of active channels.
#[rustler::nif]
fn channel_count() -> NifResult<u64> {
    Ok(CHANNELS.count() as u64)
}
