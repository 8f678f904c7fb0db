//! Channel configuration
//!
//! `ChannelConfig` is the full description of a channel. It is plain data:
//! build it with the builder methods, then hand it to `FadingChannel::new`.
//! Live changes go through `ConfigUpdate`, which merges into a copy of the
//! current config and is validated as a whole before anything is touched.

use crate::doppler::{doppler_rate, DOPPLER_FILTER_LEN};
use crate::error::ValidationError;
use crate::fading::ProcessParams;
use crate::spectrum::DopplerSpectrum;

/// Longest supported path delay in samples
pub const MAX_DELAY_SAMPLES: usize = 1 << 20;

/// Maximum Doppler shift as a fraction of the sample rate (Nyquist)
pub const MAX_DOPPLER_FRACTION: f64 = 0.5;

/// One discrete multipath component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Path {
    /// Delay in seconds
    pub delay_s: f64,
    /// Average power gain in dB
    pub gain_db: f64,
}

impl Path {
    pub fn new(delay_s: f64, gain_db: f64) -> Self {
        Self { delay_s, gain_db }
    }

    pub fn linear_power(&self) -> f64 {
        10.0_f64.powf(self.gain_db / 10.0)
    }
}

/// Line-of-sight component on one path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RicianParams {
    pub path_index: usize,
    /// Specular-to-diffuse power ratio, linear. `f64::INFINITY` is pure LOS.
    pub k_factor: f64,
    pub los_doppler_hz: f64,
    /// Radians
    pub los_initial_phase: f64,
}

impl RicianParams {
    /// Rician component on the first path with zero initial phase
    pub fn new(k_factor: f64, los_doppler_hz: f64) -> Self {
        Self {
            path_index: 0,
            k_factor,
            los_doppler_hz,
            los_initial_phase: 0.0,
        }
    }

    pub fn on_path(mut self, path_index: usize) -> Self {
        self.path_index = path_index;
        self
    }

    pub fn with_initial_phase(mut self, phase: f64) -> Self {
        self.los_initial_phase = phase;
        self
    }
}

/// How non-integer delays are realized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayPolicy {
    /// Round every delay to the nearest sample
    Round,
    /// Band-limited fractional delay
    #[default]
    Interpolate,
}

/// How each path's Doppler process is synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisMethod {
    /// White Gaussian noise through a spectrum-shaping FIR
    #[default]
    FilteredNoise,
    /// Gaussian-weighted sum of sinusoids
    SumOfSinusoids,
}

/// Complete channel description
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub sample_rate: f64,
    pub paths: Vec<Path>,
    pub max_doppler_hz: f64,
    pub doppler_spectrum: DopplerSpectrum,
    pub synthesis: SynthesisMethod,
    pub rician: Option<RicianParams>,
    pub normalize_path_gains: bool,
    pub delay_policy: DelayPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            paths: vec![Path::new(0.0, 0.0)],
            max_doppler_hz: 0.0,
            doppler_spectrum: DopplerSpectrum::default(),
            synthesis: SynthesisMethod::default(),
            rician: None,
            normalize_path_gains: false,
            delay_policy: DelayPolicy::default(),
        }
    }
}

impl ChannelConfig {
    /// Empty channel at `sample_rate`; add paths with `with_path`
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            paths: Vec::new(),
            ..Self::default()
        }
    }

    /// Build from parallel delay (s) and gain (dB) vectors
    pub fn from_vectors(
        sample_rate: f64,
        delays_s: &[f64],
        gains_db: &[f64],
    ) -> Result<Self, ValidationError> {
        if delays_s.len() != gains_db.len() {
            return Err(ValidationError::LengthMismatch {
                delays: delays_s.len(),
                gains: gains_db.len(),
            });
        }
        Ok(Self {
            sample_rate,
            paths: zip_paths(delays_s, gains_db),
            ..Self::default()
        })
    }

    pub fn with_path(mut self, delay_s: f64, gain_db: f64) -> Self {
        self.paths.push(Path::new(delay_s, gain_db));
        self
    }

    pub fn with_max_doppler(mut self, max_doppler_hz: f64) -> Self {
        self.max_doppler_hz = max_doppler_hz;
        self
    }

    pub fn with_spectrum(mut self, spectrum: DopplerSpectrum) -> Self {
        self.doppler_spectrum = spectrum;
        self
    }

    pub fn with_synthesis(mut self, synthesis: SynthesisMethod) -> Self {
        self.synthesis = synthesis;
        self
    }

    pub fn with_rician(mut self, rician: RicianParams) -> Self {
        self.rician = Some(rician);
        self
    }

    /// Per-path K-factor vector. Only the first path may be Rician, so
    /// every later entry must be zero. A zero first entry means Rayleigh.
    pub fn with_k_factors(mut self, k_factors: &[f64], los_doppler_hz: f64) -> Result<Self, ValidationError> {
        if k_factors.len() > self.paths.len() {
            return Err(ValidationError::PathIndexOutOfRange {
                index: k_factors.len() - 1,
                num_paths: self.paths.len(),
            });
        }
        for (index, &k) in k_factors.iter().enumerate() {
            if k.is_nan() || k < 0.0 {
                return Err(ValidationError::InvalidKFactor(k));
            }
            if index > 0 && k != 0.0 {
                return Err(ValidationError::KFactorOnDiffusePath { index });
            }
        }

        self.rician = match k_factors.first() {
            Some(&k) if k > 0.0 => Some(RicianParams::new(k, los_doppler_hz)),
            _ => None,
        };
        Ok(self)
    }

    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize_path_gains = normalize;
        self
    }

    pub fn with_delay_policy(mut self, policy: DelayPolicy) -> Self {
        self.delay_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ValidationError::InvalidSampleRate(self.sample_rate));
        }
        if self.paths.is_empty() {
            return Err(ValidationError::NoPaths);
        }

        for (index, path) in self.paths.iter().enumerate() {
            if !path.delay_s.is_finite() || path.delay_s < 0.0 {
                return Err(ValidationError::InvalidDelay { index, delay_s: path.delay_s });
            }
            if !path.gain_db.is_finite() {
                return Err(ValidationError::InvalidGain { index, gain_db: path.gain_db });
            }
            let power = path.linear_power();
            if !power.is_finite() || power <= 0.0 {
                return Err(ValidationError::GainOutOfRange { index, gain_db: path.gain_db });
            }
            let delay_samples = path.delay_s * self.sample_rate;
            if delay_samples > MAX_DELAY_SAMPLES as f64 {
                return Err(ValidationError::DelayTooLong {
                    index,
                    delay_samples,
                    max: MAX_DELAY_SAMPLES,
                });
            }
        }

        if self.normalize_path_gains {
            let total: f64 = self.paths.iter().map(Path::linear_power).sum();
            if !total.is_finite() {
                return Err(ValidationError::InvalidTotalPower(total));
            }
        }

        let fd = self.max_doppler_hz;
        if !fd.is_finite() || fd < 0.0 {
            return Err(ValidationError::InvalidDopplerShift(fd));
        }
        let limit_hz = self.sample_rate * MAX_DOPPLER_FRACTION;
        if fd > limit_hz {
            return Err(ValidationError::DopplerTooHigh { doppler_hz: fd, limit_hz });
        }
        self.doppler_spectrum.validate()?;
        if fd > 0.0 {
            let rate = doppler_rate(self.sample_rate, fd);
            let power = self.doppler_spectrum.resolved_power(fd, rate, DOPPLER_FILTER_LEN);
            if !power.is_finite() || power <= 0.0 {
                return Err(ValidationError::InvalidSpectrum(format!(
                    "{:?} at {} Hz has no power on a {}-point grid at {} Hz",
                    self.doppler_spectrum, fd, DOPPLER_FILTER_LEN, rate
                )));
            }
        }

        if let Some(r) = &self.rician {
            if r.path_index >= self.paths.len() {
                return Err(ValidationError::RicianPathOutOfRange {
                    index: r.path_index,
                    num_paths: self.paths.len(),
                });
            }
            if r.k_factor.is_nan() || r.k_factor < 0.0 {
                return Err(ValidationError::InvalidKFactor(r.k_factor));
            }
            if !r.los_doppler_hz.is_finite() {
                return Err(ValidationError::InvalidLosDoppler(r.los_doppler_hz));
            }
            if !r.los_initial_phase.is_finite() {
                return Err(ValidationError::InvalidLosPhase(r.los_initial_phase));
            }
        }

        Ok(())
    }

    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    /// Path delays converted to samples
    pub fn delays_samples(&self) -> Vec<f64> {
        self.paths.iter().map(|p| p.delay_s * self.sample_rate).collect()
    }

    /// Linear path powers, divided by their sum when normalization is on
    pub fn path_powers(&self) -> Vec<f64> {
        let powers: Vec<f64> = self.paths.iter().map(Path::linear_power).collect();
        if !self.normalize_path_gains {
            return powers;
        }
        let total: f64 = powers.iter().sum();
        powers.iter().map(|p| p / total).collect()
    }

    /// Parameters that define every path's fading process
    pub fn process_params(&self) -> ProcessParams {
        ProcessParams {
            sample_rate: self.sample_rate,
            max_doppler_hz: self.max_doppler_hz,
            spectrum: self.doppler_spectrum,
            synthesis: self.synthesis,
        }
    }
}

fn zip_paths(delays_s: &[f64], gains_db: &[f64]) -> Vec<Path> {
    delays_s
        .iter()
        .zip(gains_db)
        .map(|(&d, &g)| Path::new(d, g))
        .collect()
}

/// Partial update applied by `FadingChannel::reconfigure`.
///
/// `None` leaves a field as it is. `rician: Some(None)` removes the LOS
/// component. `k_factor` and `los_doppler_hz` edit the existing Rician
/// path and are rejected when there is none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    pub sample_rate: Option<f64>,
    pub path_delays_s: Option<Vec<f64>>,
    pub path_gains_db: Option<Vec<f64>>,
    pub max_doppler_hz: Option<f64>,
    pub doppler_spectrum: Option<DopplerSpectrum>,
    pub synthesis: Option<SynthesisMethod>,
    pub rician: Option<Option<RicianParams>>,
    pub k_factor: Option<f64>,
    pub los_doppler_hz: Option<f64>,
    pub normalize_path_gains: Option<bool>,
    pub delay_policy: Option<DelayPolicy>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, fs: f64) -> Self {
        self.sample_rate = Some(fs);
        self
    }

    pub fn path_delays(mut self, delays_s: Vec<f64>) -> Self {
        self.path_delays_s = Some(delays_s);
        self
    }

    pub fn path_gains(mut self, gains_db: Vec<f64>) -> Self {
        self.path_gains_db = Some(gains_db);
        self
    }

    pub fn max_doppler(mut self, fd: f64) -> Self {
        self.max_doppler_hz = Some(fd);
        self
    }

    pub fn spectrum(mut self, spectrum: DopplerSpectrum) -> Self {
        self.doppler_spectrum = Some(spectrum);
        self
    }

    pub fn synthesis(mut self, synthesis: SynthesisMethod) -> Self {
        self.synthesis = Some(synthesis);
        self
    }

    pub fn rician(mut self, rician: Option<RicianParams>) -> Self {
        self.rician = Some(rician);
        self
    }

    pub fn k_factor(mut self, k: f64) -> Self {
        self.k_factor = Some(k);
        self
    }

    pub fn los_doppler(mut self, hz: f64) -> Self {
        self.los_doppler_hz = Some(hz);
        self
    }

    pub fn normalize(mut self, on: bool) -> Self {
        self.normalize_path_gains = Some(on);
        self
    }

    pub fn delay_policy(mut self, policy: DelayPolicy) -> Self {
        self.delay_policy = Some(policy);
        self
    }

    /// Merge into a copy of `base` and validate the result
    pub fn apply_to(&self, base: &ChannelConfig) -> Result<ChannelConfig, ValidationError> {
        let mut cfg = base.clone();

        if let Some(fs) = self.sample_rate {
            cfg.sample_rate = fs;
        }

        match (&self.path_delays_s, &self.path_gains_db) {
            (Some(delays), Some(gains)) => {
                if delays.len() != gains.len() {
                    return Err(ValidationError::LengthMismatch {
                        delays: delays.len(),
                        gains: gains.len(),
                    });
                }
                cfg.paths = zip_paths(delays, gains);
            }
            (Some(delays), None) => {
                if delays.len() != cfg.paths.len() {
                    return Err(ValidationError::LengthMismatch {
                        delays: delays.len(),
                        gains: cfg.paths.len(),
                    });
                }
                for (p, &d) in cfg.paths.iter_mut().zip(delays) {
                    p.delay_s = d;
                }
            }
            (None, Some(gains)) => {
                if gains.len() != cfg.paths.len() {
                    return Err(ValidationError::LengthMismatch {
                        delays: cfg.paths.len(),
                        gains: gains.len(),
                    });
                }
                for (p, &g) in cfg.paths.iter_mut().zip(gains) {
                    p.gain_db = g;
                }
            }
            (None, None) => {}
        }

        if let Some(fd) = self.max_doppler_hz {
            cfg.max_doppler_hz = fd;
        }
        if let Some(spectrum) = self.doppler_spectrum {
            cfg.doppler_spectrum = spectrum;
        }
        if let Some(synthesis) = self.synthesis {
            cfg.synthesis = synthesis;
        }
        if let Some(rician) = self.rician {
            cfg.rician = rician;
        }

        if self.k_factor.is_some() || self.los_doppler_hz.is_some() {
            let r = cfg.rician.as_mut().ok_or(ValidationError::NoRicianPath)?;
            if let Some(k) = self.k_factor {
                r.k_factor = k;
            }
            if let Some(hz) = self.los_doppler_hz {
                r.los_doppler_hz = hz;
            }
        }

        if let Some(on) = self.normalize_path_gains {
            cfg.normalize_path_gains = on;
        }
        if let Some(policy) = self.delay_policy {
            cfg.delay_policy = policy;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
