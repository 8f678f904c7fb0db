//! Doppler-rate fading sources
//!
//! A source emits a unit-power complex Gaussian process whose PSD follows a
//! `DopplerSpectrum`, sampled at a low "Doppler rate" a fixed multiple of the
//! maximum Doppler shift. `FadingProcess` interpolates it up to the channel
//! sample rate.
//!
//! ## Filtered noise
//!
//! Complex white Gaussian noise through a FIR whose magnitude response is
//! sqrt(S(f)). The FIR is designed by frequency sampling:
//!
//!   h = window · shift(IFFT(sqrt(S_k)))
//!
//! and scaled to unit energy, so unit-power noise in gives unit power out.
//!
//! ## Sum of sinusoids
//!
//! Gaussian-weighted sum of sinusoids:
//!
//!   h(t) = (1/√(2N)) Σ A_n · exp(j(2π f_n t + φ_n))
//!
//! with A_n = a_n + j·b_n, a_n, b_n ~ N(0, 1), f_n drawn from S(f) and φ_n
//! uniform. Gaussian weights give true Rayleigh statistics rather than the
//! deterministic-amplitude Clarke sum.

use num_complex::Complex64;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::error::NumericalError;
use crate::noise::ComplexGaussian;
use crate::spectrum::{DopplerSpectrum, FrequencySampler};

/// Doppler rate as a multiple of the maximum Doppler shift
pub const DOPPLER_OVERSAMPLING: f64 = 16.0;

/// Length of the Doppler shaping FIR
pub const DOPPLER_FILTER_LEN: usize = 256;

/// Oscillators per sum-of-sinusoids source
pub const NUM_SINUSOIDS: usize = 64;

/// Rate at which a source for `max_doppler_hz` runs, never above the sample rate
pub fn doppler_rate(sample_rate: f64, max_doppler_hz: f64) -> f64 {
    (DOPPLER_OVERSAMPLING * max_doppler_hz).min(sample_rate)
}

/// Generator of a unit-power Doppler-shaped process on its own sample grid
pub trait DopplerSource: Send + Sync {
    /// Produce the next sample and advance
    fn next_sample(&mut self) -> Complex64;

    /// Sample rate of this source in Hz
    fn rate(&self) -> f64;
}

/// Design the Doppler shaping FIR for `spectrum` at `rate`.
///
/// Returns real, symmetric, unit-energy taps.
pub fn design_doppler_filter(
    spectrum: &DopplerSpectrum,
    max_doppler_hz: f64,
    rate: f64,
    len: usize,
) -> Result<Vec<f64>, NumericalError> {
    let densities = spectrum.bin_densities(max_doppler_hz, rate, len);

    let mut buf: Vec<Complex64> = densities
        .iter()
        .map(|&d| Complex64::new(d.sqrt(), 0.0))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(len);
    ifft.process(&mut buf);

    // Circular shift so lag 0 lands on tap len/2, then a Hamming window
    // symmetric about that tap
    let mut taps: Vec<f64> = (0..len).map(|i| buf[(i + len / 2) % len].re).collect();
    for (i, t) in taps.iter_mut().enumerate() {
        let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / len as f64).cos();
        *t *= window;
    }

    let energy: f64 = taps.iter().map(|t| t * t).sum();
    if !energy.is_finite() || energy <= 0.0 {
        return Err(NumericalError::DegenerateFilter { what: "doppler" });
    }
    let norm = energy.sqrt();
    for t in &mut taps {
        *t /= norm;
    }

    Ok(taps)
}

/// White Gaussian noise shaped by the Doppler FIR
pub struct FilteredNoiseSource {
    rate: f64,
    taps: Vec<f64>,
    history: Vec<Complex64>,
    write_idx: usize,
    noise: ComplexGaussian,
}

impl FilteredNoiseSource {
    pub fn new(
        spectrum: &DopplerSpectrum,
        max_doppler_hz: f64,
        rate: f64,
        seed: u64,
    ) -> Result<Self, NumericalError> {
        let taps = design_doppler_filter(spectrum, max_doppler_hz, rate, DOPPLER_FILTER_LEN)?;
        let len = taps.len();

        let mut source = Self {
            rate,
            taps,
            history: vec![Complex64::new(0.0, 0.0); len],
            write_idx: 0,
            noise: ComplexGaussian::new(1.0, seed),
        };

        // Fill the filter memory so the output is stationary from the start
        for _ in 0..len {
            source.next_sample();
        }

        Ok(source)
    }
}

impl DopplerSource for FilteredNoiseSource {
    fn next_sample(&mut self) -> Complex64 {
        self.history[self.write_idx] = self.noise.next_sample();

        let len = self.taps.len();
        let mut sum = Complex64::new(0.0, 0.0);
        for i in 0..len {
            let hist_idx = (self.write_idx + len - i) % len;
            sum += self.history[hist_idx] * self.taps[i];
        }

        self.write_idx = (self.write_idx + 1) % len;
        sum
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

/// Gaussian-weighted sum of sinusoids with spectrum-distributed frequencies
pub struct SumOfSinusoidsSource {
    rate: f64,

    // Per-oscillator complex Gaussian amplitudes
    amp: [Complex64; NUM_SINUSOIDS],

    // Per-oscillator phase and phase increment per Doppler-rate sample
    phase: [f64; NUM_SINUSOIDS],
    phase_inc: [f64; NUM_SINUSOIDS],

    scale: f64,
}

impl SumOfSinusoidsSource {
    pub fn new(spectrum: &DopplerSpectrum, max_doppler_hz: f64, rate: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sampler = FrequencySampler::new(*spectrum, max_doppler_hz, rate / 2.0);

        let mut amp = [Complex64::new(0.0, 0.0); NUM_SINUSOIDS];
        let mut phase = [0.0; NUM_SINUSOIDS];
        let mut phase_inc = [0.0; NUM_SINUSOIDS];

        for n in 0..NUM_SINUSOIDS {
            // Gaussian amplitudes: a_n, b_n ~ N(0, 1) via Box-Muller
            let u1: f64 = rng.gen::<f64>().max(1e-10);
            let u2: f64 = rng.gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * PI * u2;
            amp[n] = Complex64::new(r * theta.cos(), r * theta.sin());

            let freq = sampler.sample(rng.gen::<f64>());
            phase_inc[n] = 2.0 * PI * freq / rate;

            phase[n] = rng.gen::<f64>() * 2.0 * PI;
        }

        // E[|A_n|²] = 2, so N terms need 1/√(2N) for unit power
        let scale = (1.0 / (2.0 * NUM_SINUSOIDS as f64)).sqrt();

        Self {
            rate,
            amp,
            phase,
            phase_inc,
            scale,
        }
    }
}

impl DopplerSource for SumOfSinusoidsSource {
    fn next_sample(&mut self) -> Complex64 {
        let mut sum = Complex64::new(0.0, 0.0);
        for n in 0..NUM_SINUSOIDS {
            sum += self.amp[n] * Complex64::from_polar(1.0, self.phase[n]);

            self.phase[n] += self.phase_inc[n];
            if self.phase[n] >= 2.0 * PI {
                self.phase[n] -= 2.0 * PI;
            } else if self.phase[n] < 0.0 {
                self.phase[n] += 2.0 * PI;
            }
        }
        sum * self.scale
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bessel_j0(x: f64) -> f64 {
        let ax = x.abs();
        if ax < 3.0 {
            let mut sum = 1.0;
            let mut term = 1.0;
            let x2 = x * x / 4.0;
            for k in 1..25 {
                term *= -x2 / (k * k) as f64;
                sum += term;
                if term.abs() < 1e-15 { break; }
            }
            sum
        } else {
            let z = 8.0 / ax;
            let z2 = z * z;
            let p0 = 1.0 - 0.1098628627e-2 * z2 + 0.2734510407e-4 * z2 * z2;
            let q0 = -0.1562499995e-1 * z + 0.1430488765e-3 * z * z2;
            let xx = ax - PI / 4.0;
            (2.0 / (PI * ax)).sqrt() * (xx.cos() * p0 - xx.sin() * q0 * z)
        }
    }

    fn normalized_autocorr(samples: &[Complex64], lag: usize) -> f64 {
        let n = samples.len() - lag;
        let power = samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64;
        let sum: Complex64 = (0..n).map(|i| samples[i + lag] * samples[i].conj()).sum();
        sum.re / (n as f64 * power)
    }

    #[test]
    fn test_doppler_rate() {
        assert_eq!(doppler_rate(5e6, 200.0), 3200.0);
        assert_eq!(doppler_rate(1000.0, 100.0), 1000.0);
    }

    #[test]
    fn test_filter_unit_energy_and_symmetry() {
        let taps = design_doppler_filter(&DopplerSpectrum::Jakes, 10.0, 160.0, DOPPLER_FILTER_LEN).unwrap();
        let energy: f64 = taps.iter().map(|t| t * t).sum();
        assert!((energy - 1.0).abs() < 1e-10, "energy {}", energy);

        // Real, even frequency response → symmetric about len/2
        let len = taps.len();
        for k in 1..len / 2 {
            let diff = (taps[len / 2 + k] - taps[len / 2 - k]).abs();
            assert!(diff < 1e-10, "tap {} asymmetric by {}", k, diff);
        }
    }

    #[test]
    fn test_filter_design_every_shape() {
        for shape in [
            DopplerSpectrum::Jakes,
            DopplerSpectrum::Flat,
            DopplerSpectrum::gaussian(),
            DopplerSpectrum::rounded(),
            DopplerSpectrum::bell(),
            DopplerSpectrum::RestrictedJakes { f_min: 0.3, f_max: 0.9 },
        ] {
            let taps = design_doppler_filter(&shape, 50.0, 800.0, DOPPLER_FILTER_LEN);
            assert!(taps.is_ok(), "{:?} failed to design", shape);
        }
    }

    #[test]
    fn test_filtered_noise_unit_power() {
        let mut src = FilteredNoiseSource::new(&DopplerSpectrum::Jakes, 10.0, 160.0, 7).unwrap();
        let n = 200_000;
        let power = (0..n).map(|_| src.next_sample().norm_sqr()).sum::<f64>() / n as f64;
        assert!((power - 1.0).abs() < 0.1, "power {}", power);
    }

    #[test]
    fn test_filtered_noise_deterministic() {
        let mut a = FilteredNoiseSource::new(&DopplerSpectrum::Flat, 5.0, 80.0, 99).unwrap();
        let mut b = FilteredNoiseSource::new(&DopplerSpectrum::Flat, 5.0, 80.0, 99).unwrap();
        for _ in 0..1000 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }

    #[test]
    fn test_filtered_noise_autocorrelation_bessel() {
        let fd = 10.0;
        let rate = DOPPLER_OVERSAMPLING * fd;
        let mut src = FilteredNoiseSource::new(&DopplerSpectrum::Jakes, fd, rate, 42).unwrap();
        let samples: Vec<Complex64> = (0..400_000).map(|_| src.next_sample()).collect();

        for &lag in &[0usize, 2, 4, 8, 16] {
            let tau = lag as f64 / rate;
            let measured = normalized_autocorr(&samples, lag);
            let theoretical = bessel_j0(2.0 * PI * fd * tau);
            let error = (measured - theoretical).abs();
            assert!(error < 0.1, "lag {}: measured {:.3}, J0 {:.3}", lag, measured, theoretical);
        }
    }

    #[test]
    fn test_sum_of_sinusoids_power() {
        // Independent sources for i.i.d. samples
        let num = 20_000u64;
        let power = (0..num)
            .map(|seed| {
                let mut src = SumOfSinusoidsSource::new(&DopplerSpectrum::Jakes, 10.0, 160.0, seed);
                for _ in 0..10 { src.next_sample(); }
                src.next_sample().norm_sqr()
            })
            .sum::<f64>()
            / num as f64;
        assert!(power > 0.9 && power < 1.1, "Mean fading power {} should be ~1.0", power);
    }

    #[test]
    fn test_sum_of_sinusoids_rayleigh_envelope() {
        let num = 20_000u64;
        let magnitudes: Vec<f64> = (0..num)
            .map(|seed| {
                let mut src = SumOfSinusoidsSource::new(&DopplerSpectrum::Jakes, 10.0, 160.0, 1_000_000 + seed);
                src.next_sample().norm()
            })
            .collect();
        let mean = magnitudes.iter().sum::<f64>() / num as f64;
        let variance = magnitudes.iter().map(|&m| (m - mean).powi(2)).sum::<f64>() / num as f64;
        let cv = variance.sqrt() / mean;
        let expected_cv = ((4.0 - PI) / PI).sqrt();
        assert!((cv - expected_cv).abs() < 0.05, "CV {} vs expected {}", cv, expected_cv);
    }

    #[test]
    fn test_sum_of_sinusoids_numerical_stability() {
        let mut src = SumOfSinusoidsSource::new(&DopplerSpectrum::gaussian(), 1.0, 16.0, 42);
        for _ in 0..1_000_000 {
            let s = src.next_sample();
            assert!(s.re.is_finite() && s.im.is_finite());
        }
    }
}
