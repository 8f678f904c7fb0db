//! Per-path fading process
//!
//! Wraps a Doppler-rate source and linearly interpolates it to the channel
//! sample rate. A path with zero Doppler is static: its gain is exactly
//! `1 + 0j` forever and it owns no source at all.
//!
//! Every Doppler-rate sample the source emits also feeds the path's running
//! periodogram, so spectrum estimates come for free and never disturb the
//! random stream.

use num_complex::Complex64;

use crate::characterize::{DopplerPeriodogram, DopplerSpectrumEstimate};
use crate::config::SynthesisMethod;
use crate::doppler::{doppler_rate, DopplerSource, FilteredNoiseSource, SumOfSinusoidsSource};
use crate::error::NumericalError;
use crate::spectrum::DopplerSpectrum;

/// Parameters that define a fading process. Changing any of them means a
/// new process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessParams {
    pub sample_rate: f64,
    pub max_doppler_hz: f64,
    pub spectrum: DopplerSpectrum,
    pub synthesis: SynthesisMethod,
}

struct Interpolator {
    source: Box<dyn DopplerSource>,
    prev: Complex64,
    next: Complex64,
    // Position between prev and next, in Doppler-rate samples
    mu: f64,
    step: f64,
    periodogram: DopplerPeriodogram,
}

impl Interpolator {
    fn new(params: &ProcessParams, seed: u64) -> Result<Self, NumericalError> {
        let rate = doppler_rate(params.sample_rate, params.max_doppler_hz);
        let mut source: Box<dyn DopplerSource> = match params.synthesis {
            SynthesisMethod::FilteredNoise => Box::new(FilteredNoiseSource::new(
                &params.spectrum,
                params.max_doppler_hz,
                rate,
                seed,
            )?),
            SynthesisMethod::SumOfSinusoids => Box::new(SumOfSinusoidsSource::new(
                &params.spectrum,
                params.max_doppler_hz,
                rate,
                seed,
            )),
        };

        let mut periodogram = DopplerPeriodogram::new(source.rate());
        let prev = source.next_sample();
        let next = source.next_sample();
        periodogram.push(prev);
        periodogram.push(next);

        Ok(Self {
            source,
            prev,
            next,
            mu: 0.0,
            step: rate / params.sample_rate,
            periodogram,
        })
    }

    fn next_gain(&mut self) -> Complex64 {
        let g = self.prev + (self.next - self.prev) * self.mu;

        self.mu += self.step;
        while self.mu >= 1.0 {
            self.mu -= 1.0;
            self.prev = self.next;
            self.next = self.source.next_sample();
            self.periodogram.push(self.next);
        }

        g
    }
}

/// Time-correlated, unit-power complex gain of one path
pub struct FadingProcess {
    params: ProcessParams,
    seed: u64,
    interp: Option<Interpolator>,
    current: Complex64,
    samples: u64,
}

impl FadingProcess {
    pub fn new(params: ProcessParams, seed: u64) -> Result<Self, NumericalError> {
        let interp = Self::build(&params, seed)?;
        let current = interp.as_ref().map_or(Complex64::new(1.0, 0.0), |i| i.prev);
        Ok(Self {
            params,
            seed,
            interp,
            current,
            samples: 0,
        })
    }

    fn build(params: &ProcessParams, seed: u64) -> Result<Option<Interpolator>, NumericalError> {
        if params.max_doppler_hz == 0.0 {
            Ok(None)
        } else {
            Interpolator::new(params, seed).map(Some)
        }
    }

    /// Gain for the next channel sample
    pub fn next_gain(&mut self) -> Complex64 {
        if let Some(interp) = self.interp.as_mut() {
            self.current = interp.next_gain();
        }
        self.samples += 1;
        self.current
    }

    /// Gain applied to the most recent sample
    pub fn current(&self) -> Complex64 {
        self.current
    }

    pub fn is_static(&self) -> bool {
        self.interp.is_none()
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn params(&self) -> &ProcessParams {
        &self.params
    }

    /// Doppler rate of the underlying source, or the sample rate when static
    pub fn doppler_rate(&self) -> f64 {
        self.interp
            .as_ref()
            .map_or(self.params.sample_rate, |i| i.source.rate())
    }

    /// Return to the state right after construction
    pub fn reset(&mut self) -> Result<(), NumericalError> {
        *self = Self::new(self.params, self.seed)?;
        Ok(())
    }

    pub fn spectrum_estimate(&self) -> DopplerSpectrumEstimate {
        match &self.interp {
            Some(interp) => interp
                .periodogram
                .estimate(&self.params.spectrum, self.params.max_doppler_hz),
            None => DopplerSpectrumEstimate::static_line(),
        }
    }
}
