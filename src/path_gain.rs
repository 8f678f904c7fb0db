//! Path gain generator
//!
//! Turns unit-power diffuse processes into path gains:
//!
//!   diffuse path:  g = √P · d
//!   Rician path:   g = √P · (√(K/(K+1)) · e^{jθ(n)} + √(1/(K+1)) · d)
//!
//! where θ(n) = φ0 + 2π f_LOS n / fs is kept as a wrapped phase accumulator.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::config::ChannelConfig;

#[derive(Debug, Clone)]
struct LosComponent {
    path_index: usize,
    los_weight: f64,
    diffuse_weight: f64,
    // Phase of the next specular sample
    phase: f64,
    phase_inc: f64,
}

impl LosComponent {
    fn specular(&self) -> Complex64 {
        Complex64::from_polar(self.los_weight, self.phase)
    }

    fn advance(&mut self) {
        self.phase += self.phase_inc;
        if self.phase >= PI {
            self.phase -= 2.0 * PI;
        } else if self.phase < -PI {
            self.phase += 2.0 * PI;
        }
    }
}

/// Scales diffuse processes by path amplitude and adds the LOS term
#[derive(Debug, Clone)]
pub struct PathGainGenerator {
    amplitudes: Vec<f64>,
    los: Option<LosComponent>,
}

impl PathGainGenerator {
    pub fn new(config: &ChannelConfig) -> Self {
        let mut gen = Self {
            amplitudes: Vec::new(),
            los: None,
        };
        gen.update(config);
        gen
    }

    /// Apply new amplitudes and Rician settings, keeping the specular phase
    pub fn update(&mut self, config: &ChannelConfig) {
        self.amplitudes = config.path_powers().iter().map(|p| p.sqrt()).collect();

        let previous_phase = self.los.as_ref().map(|l| l.phase);
        self.los = config.rician.map(|r| {
            let (los_weight, diffuse_weight) = if r.k_factor.is_infinite() {
                (1.0, 0.0)
            } else {
                let k = r.k_factor;
                ((k / (k + 1.0)).sqrt(), (1.0 / (k + 1.0)).sqrt())
            };
            LosComponent {
                path_index: r.path_index,
                los_weight,
                diffuse_weight,
                phase: previous_phase.unwrap_or(r.los_initial_phase),
                phase_inc: 2.0 * PI * r.los_doppler_hz / config.sample_rate,
            }
        });
    }

    pub fn num_paths(&self) -> usize {
        self.amplitudes.len()
    }

    /// Amplitude `√P` of path `index`, `None` past the last path
    pub fn amplitude(&self, index: usize) -> Option<f64> {
        self.amplitudes.get(index).copied()
    }

    /// Gain of path `index` for the next sample. Advances the LOS rotator
    /// when `index` is the Rician path.
    pub(crate) fn gain(&mut self, index: usize, diffuse: Complex64) -> Complex64 {
        let g = self.peek(index, diffuse);
        if let Some(los) = self.los.as_mut() {
            if los.path_index == index {
                los.advance();
            }
        }
        g
    }

    /// Gain of path `index` for the next sample, without advancing
    pub(crate) fn peek(&self, index: usize, diffuse: Complex64) -> Complex64 {
        let amp = self.amplitudes[index];
        match &self.los {
            Some(los) if los.path_index == index => {
                (los.specular() + diffuse * los.diffuse_weight) * amp
            }
            _ => diffuse * amp,
        }
    }

    /// Restart the specular rotator at the configured initial phase
    pub fn reset(&mut self, config: &ChannelConfig) {
        self.los = None;
        self.update(config);
    }
}
