//! Tap delay line
//!
//! Each path reads the shared input history through its own short kernel.
//! Integer delays are a single unit tap. Fractional delays use a windowed
//! sinc spanning `INTERP_HALF_LEN` samples on each side; to keep that kernel
//! causal the whole channel is delayed by `INTERP_LATENCY` samples whenever
//! any path needs it.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::config::DelayPolicy;

/// Taps per side of the fractional-delay kernel
pub const INTERP_HALF_LEN: usize = 8;

/// Channel latency added when any delay is fractional
pub const INTERP_LATENCY: usize = INTERP_HALF_LEN - 1;

/// Distance from an integer below which a delay counts as integral
const INTEGER_TOLERANCE: f64 = 1e-6;

fn is_integral(delay: f64) -> bool {
    (delay - delay.round()).abs() < INTEGER_TOLERANCE
}

/// Kernel that realizes one path delay on the sample grid
#[derive(Debug, Clone, PartialEq)]
pub struct FractionalDelay {
    delay_samples: f64,
    first_lag: usize,
    weights: Vec<f64>,
}

impl FractionalDelay {
    /// Kernel for `delay_samples`, shifted by the channel's `latency`.
    /// Fractional delays need `latency >= INTERP_LATENCY`.
    pub(crate) fn new(delay_samples: f64, latency: usize, policy: DelayPolicy) -> Self {
        if policy == DelayPolicy::Round || is_integral(delay_samples) {
            return Self {
                delay_samples,
                first_lag: delay_samples.round() as usize + latency,
                weights: vec![1.0],
            };
        }

        let target = delay_samples + latency as f64;
        let first_lag = delay_samples.floor() as usize + latency + 1 - INTERP_HALF_LEN;
        let len = 2 * INTERP_HALF_LEN;
        let half = INTERP_HALF_LEN as f64;

        let mut weights: Vec<f64> = (0..len)
            .map(|k| {
                let t = (first_lag + k) as f64 - target;
                let sinc = if t.abs() < 1e-12 { 1.0 } else { (PI * t).sin() / (PI * t) };
                // Hamming window centered on the target delay
                let window = 0.54 + 0.46 * (PI * t / half).cos();
                sinc * window
            })
            .collect();

        // Normalize for unity DC gain
        let sum: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Self {
            delay_samples,
            first_lag,
            weights,
        }
    }

    pub fn delay_samples(&self) -> f64 {
        self.delay_samples
    }

    pub fn first_lag(&self) -> usize {
        self.first_lag
    }

    pub fn last_lag(&self) -> usize {
        self.first_lag + self.weights.len() - 1
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Multi-path convolution over a ring buffer of input history
#[derive(Debug, Clone)]
pub struct TapDelayLine {
    kernels: Vec<FractionalDelay>,
    history: Vec<Complex64>,
    write_idx: usize,
    filter_delay: usize,
}

impl TapDelayLine {
    pub fn new(delays_samples: &[f64], policy: DelayPolicy) -> Self {
        let (kernels, filter_delay) = Self::design(delays_samples, policy);
        let len = Self::ring_len(&kernels);
        Self {
            kernels,
            history: vec![Complex64::new(0.0, 0.0); len],
            write_idx: 0,
            filter_delay,
        }
    }

    fn design(delays_samples: &[f64], policy: DelayPolicy) -> (Vec<FractionalDelay>, usize) {
        let fractional = policy == DelayPolicy::Interpolate
            && delays_samples.iter().any(|&d| !is_integral(d));
        let latency = if fractional { INTERP_LATENCY } else { 0 };

        let kernels = delays_samples
            .iter()
            .map(|&d| FractionalDelay::new(d, latency, policy))
            .collect();
        (kernels, latency)
    }

    fn ring_len(kernels: &[FractionalDelay]) -> usize {
        kernels.iter().map(FractionalDelay::last_lag).max().unwrap_or(0) + 1
    }

    /// Push one input sample and return `Σ_p gains[p] · (kernel_p * x)[n]`
    pub fn process(&mut self, x: Complex64, gains: &[Complex64]) -> Complex64 {
        let len = self.history.len();
        self.history[self.write_idx] = x;

        let mut y = Complex64::new(0.0, 0.0);
        for (kernel, &g) in self.kernels.iter().zip(gains) {
            let mut acc = Complex64::new(0.0, 0.0);
            for (k, &w) in kernel.weights.iter().enumerate() {
                let lag = kernel.first_lag + k;
                acc += self.history[(self.write_idx + len - lag) % len] * w;
            }
            y += acc * g;
        }

        self.write_idx = (self.write_idx + 1) % len;
        y
    }

    /// Rebuild kernels for new delays, keeping the most recent input history
    pub fn retune(&mut self, delays_samples: &[f64], policy: DelayPolicy) {
        let (kernels, filter_delay) = Self::design(delays_samples, policy);
        let new_len = Self::ring_len(&kernels);
        let old_len = self.history.len();

        let mut history = vec![Complex64::new(0.0, 0.0); new_len];
        for i in 0..old_len.min(new_len) {
            // i = 0 is the newest sample
            history[new_len - 1 - i] = self.history[(self.write_idx + old_len - 1 - i) % old_len];
        }

        self.kernels = kernels;
        self.history = history;
        self.write_idx = 0;
        self.filter_delay = filter_delay;
    }

    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|x| *x = Complex64::new(0.0, 0.0));
        self.write_idx = 0;
    }

    /// Per-lag taps the line currently convolves with for the given path gains
    pub fn bandlimited_taps(&self, gains: &[Complex64]) -> Vec<Complex64> {
        let mut taps = vec![Complex64::new(0.0, 0.0); self.history.len()];
        for (kernel, &g) in self.kernels.iter().zip(gains) {
            for (k, &w) in kernel.weights.iter().enumerate() {
                taps[kernel.first_lag + k] += g * w;
            }
        }
        taps
    }

    /// Latency added by the interpolation kernels, in samples
    pub fn filter_delay(&self) -> usize {
        self.filter_delay
    }

    pub fn max_lag(&self) -> usize {
        self.history.len() - 1
    }

    pub fn kernels(&self) -> &[FractionalDelay] {
        &self.kernels
    }
}
