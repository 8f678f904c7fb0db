//! Channel characterization
//!
//! Read-only views of a running channel: impulse response taps, frequency
//! response, and empirical vs theoretical Doppler spectra. Nothing here
//! touches the random streams.

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::spectrum::{fft_bin_frequency, DopplerSpectrum};

/// Segment length of the running Doppler periodogram
pub const PERIODOGRAM_LEN: usize = 256;

/// One path of the impulse response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathTap {
    /// Path delay in samples, before the interpolation filter latency
    pub delay_samples: f64,
    /// Complex gain applied to the most recent sample
    pub gain: Complex64,
}

/// Measured and target Doppler PSD on a common frequency grid
#[derive(Debug, Clone, PartialEq)]
pub struct DopplerSpectrumEstimate {
    /// `(freq_hz, psd)` pairs from the running periodogram
    pub empirical: Vec<(f64, f64)>,
    /// `(freq_hz, psd)` pairs of the configured shape
    pub theoretical: Vec<(f64, f64)>,
    /// Number of segments averaged into `empirical`
    pub segments: u64,
}

impl DopplerSpectrumEstimate {
    /// Estimate for a path without Doppler spread: a unit line at DC
    pub fn static_line() -> Self {
        Self {
            empirical: vec![(0.0, 1.0)],
            theoretical: vec![(0.0, 1.0)],
            segments: 0,
        }
    }
}

/// DFT of `taps` on `n` points, natural FFT order.
///
/// Taps beyond `n` are time-aliased onto the grid.
pub fn frequency_response(taps: &[Complex64], n: usize) -> Result<Vec<Complex64>, ValidationError> {
    if n == 0 {
        return Err(ValidationError::ZeroPoints);
    }

    let mut buf = vec![Complex64::new(0.0, 0.0); n];
    for (i, &t) in taps.iter().enumerate() {
        buf[i % n] += t;
    }

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buf);
    Ok(buf)
}

/// Bin frequencies in Hz matching `frequency_response` ordering
pub fn frequency_axis(n: usize, sample_rate: f64) -> Vec<f64> {
    (0..n).map(|k| fft_bin_frequency(k, n, sample_rate)).collect()
}

/// Averaged periodogram over non-overlapping Hann-windowed segments
pub struct DopplerPeriodogram {
    rate: f64,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    window_energy: f64,
    segment: Vec<Complex64>,
    accum: Vec<f64>,
    segments: u64,
}

impl DopplerPeriodogram {
    pub fn new(rate: f64) -> Self {
        let len = PERIODOGRAM_LEN;
        let window: Vec<f64> = (0..len)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / len as f64).cos())
            .collect();
        let window_energy = window.iter().map(|w| w * w).sum();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(len);

        Self {
            rate,
            fft,
            window,
            window_energy,
            segment: Vec::with_capacity(len),
            accum: vec![0.0; len],
            segments: 0,
        }
    }

    pub fn push(&mut self, sample: Complex64) {
        self.segment.push(sample);
        if self.segment.len() < PERIODOGRAM_LEN {
            return;
        }

        for (s, w) in self.segment.iter_mut().zip(&self.window) {
            *s *= *w;
        }
        self.fft.process(&mut self.segment);

        let scale = 1.0 / (self.rate * self.window_energy);
        for (a, x) in self.accum.iter_mut().zip(&self.segment) {
            *a += x.norm_sqr() * scale;
        }
        self.segments += 1;
        self.segment.clear();
    }

    pub fn segments(&self) -> u64 {
        self.segments
    }

    pub fn clear(&mut self) {
        self.segment.clear();
        self.accum.iter_mut().for_each(|a| *a = 0.0);
        self.segments = 0;
    }

    /// Averaged PSD and the target density, ordered from -rate/2 upward
    pub fn estimate(&self, spectrum: &DopplerSpectrum, max_doppler_hz: f64) -> DopplerSpectrumEstimate {
        let n = PERIODOGRAM_LEN;
        let target = spectrum.bin_densities(max_doppler_hz, self.rate, n);
        let count = self.segments.max(1) as f64;

        let order = (n / 2..n).chain(0..n / 2);
        let mut empirical = Vec::with_capacity(n);
        let mut theoretical = Vec::with_capacity(n);
        for k in order {
            let f = fft_bin_frequency(k, n, self.rate);
            empirical.push((f, self.accum[k] / count));
            theoretical.push((f, target[k]));
        }

        DopplerSpectrumEstimate {
            empirical,
            theoretical,
            segments: self.segments,
        }
    }
}
