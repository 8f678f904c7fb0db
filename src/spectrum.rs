//! Doppler power spectral density shapes
//!
//! All shapes are parameterized relative to the maximum Doppler shift `fd`
//! and integrate to unit power. The same bin-averaged densities feed the
//! Doppler filter design and the theoretical curve reported by the
//! characterization module, so the two can be compared bin for bin.

use std::f64::consts::PI;

use crate::error::ValidationError;

/// Midpoints used to average a density over one frequency bin
const SUBBINS: usize = 16;

/// Resolution of the inverse-CDF table used by oscillator banks
const CDF_TABLE_LEN: usize = 4096;

/// Doppler spectrum shape
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DopplerSpectrum {
    /// Clarke/Jakes U-shaped spectrum (isotropic scattering)
    #[default]
    Jakes,
    /// Uniform power over [-fd, fd]
    Flat,
    /// Gaussian with standard deviation `sigma * fd`
    Gaussian { sigma: f64 },
    /// Polynomial `a0 + a2 x^2 + a4 x^4` over |x| <= 1 (x = f/fd)
    Rounded { a0: f64, a2: f64, a4: f64 },
    /// `1 / (1 + A x^2)`
    Bell { coefficient: f64 },
    /// Jakes restricted to `f_min <= |x| <= f_max`
    RestrictedJakes { f_min: f64, f_max: f64 },
}

impl DopplerSpectrum {
    /// Gaussian shape with the half-power point at `fd`
    pub fn gaussian() -> Self {
        DopplerSpectrum::Gaussian {
            sigma: 1.0 / (2.0 * 2.0_f64.ln()).sqrt(),
        }
    }

    /// Rounded shape with the coefficients of the COST 207 approximation
    pub fn rounded() -> Self {
        DopplerSpectrum::Rounded {
            a0: 1.0,
            a2: -1.72,
            a4: 0.785,
        }
    }

    pub fn bell() -> Self {
        DopplerSpectrum::Bell { coefficient: 9.0 }
    }

    /// Parse a shape from its short name, with default parameters
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "jakes" | "clarke" | "classical" => Some(DopplerSpectrum::Jakes),
            "flat" | "uniform" => Some(DopplerSpectrum::Flat),
            "gaussian" | "gauss" => Some(DopplerSpectrum::gaussian()),
            "rounded" => Some(DopplerSpectrum::rounded()),
            "bell" => Some(DopplerSpectrum::bell()),
            "rjakes" | "restricted_jakes" => Some(DopplerSpectrum::RestrictedJakes {
                f_min: 0.0,
                f_max: 1.0,
            }),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |msg: String| Err(ValidationError::InvalidSpectrum(msg));
        match *self {
            DopplerSpectrum::Jakes | DopplerSpectrum::Flat => Ok(()),
            DopplerSpectrum::Gaussian { sigma } => {
                if sigma.is_finite() && sigma > 0.0 {
                    Ok(())
                } else {
                    invalid(format!("gaussian sigma must be > 0, got {}", sigma))
                }
            }
            DopplerSpectrum::Rounded { a0, a2, a4 } => {
                if !(a0.is_finite() && a2.is_finite() && a4.is_finite()) {
                    return invalid("rounded coefficients must be finite".into());
                }
                if a0 + a2 / 3.0 + a4 / 5.0 <= 0.0 {
                    return invalid("rounded spectrum has no power".into());
                }
                let negative = (0..=20).any(|i| {
                    let x = i as f64 / 20.0;
                    a0 + a2 * x * x + a4 * x.powi(4) < 0.0
                });
                if negative {
                    return invalid("rounded spectrum goes negative inside [-fd, fd]".into());
                }
                Ok(())
            }
            DopplerSpectrum::Bell { coefficient } => {
                if coefficient.is_finite() && coefficient > 0.0 {
                    Ok(())
                } else {
                    invalid(format!("bell coefficient must be > 0, got {}", coefficient))
                }
            }
            DopplerSpectrum::RestrictedJakes { f_min, f_max } => {
                if f_min.is_finite() && f_max.is_finite() && 0.0 <= f_min && f_min < f_max && f_max <= 1.0 {
                    Ok(())
                } else {
                    invalid(format!(
                        "restricted jakes needs 0 <= f_min < f_max <= 1, got [{}, {}]",
                        f_min, f_max
                    ))
                }
            }
        }
    }

    /// Power spectral density at `f` Hz for maximum Doppler shift `fd` (> 0)
    pub fn density(&self, f: f64, fd: f64) -> f64 {
        let x = f / fd;
        match *self {
            DopplerSpectrum::Jakes => jakes(x, fd),
            DopplerSpectrum::Flat => {
                if x.abs() <= 1.0 {
                    1.0 / (2.0 * fd)
                } else {
                    0.0
                }
            }
            DopplerSpectrum::Gaussian { sigma } => {
                let s = sigma * fd;
                (-f * f / (2.0 * s * s)).exp() / ((2.0 * PI).sqrt() * s)
            }
            DopplerSpectrum::Rounded { a0, a2, a4 } => {
                if x.abs() <= 1.0 {
                    let norm = 2.0 * fd * (a0 + a2 / 3.0 + a4 / 5.0);
                    (a0 + a2 * x * x + a4 * x.powi(4)).max(0.0) / norm
                } else {
                    0.0
                }
            }
            DopplerSpectrum::Bell { coefficient } => {
                coefficient.sqrt() / (PI * fd * (1.0 + coefficient * x * x))
            }
            DopplerSpectrum::RestrictedJakes { f_min, f_max } => {
                let ax = x.abs();
                if ax < f_min || ax > f_max {
                    return 0.0;
                }
                let mass = (2.0 / PI) * (f_max.asin() - f_min.asin());
                jakes(x, fd) / mass
            }
        }
    }

    /// Half-width in Hz outside which the density is treated as zero
    pub fn support(&self, fd: f64, limit_hz: f64) -> f64 {
        match *self {
            DopplerSpectrum::Gaussian { sigma } => (5.0 * sigma * fd).min(limit_hz),
            DopplerSpectrum::Bell { .. } => limit_hz,
            _ => fd.min(limit_hz),
        }
    }

    /// Bin-averaged densities on an `n`-point grid at `rate` Hz, in FFT order.
    ///
    /// Bin `k` covers `k * rate / n` for `k < n/2` and `(k - n) * rate / n`
    /// above. The result is rescaled so that `sum(d) * rate / n == 1`.
    pub fn bin_densities(&self, fd: f64, rate: f64, n: usize) -> Vec<f64> {
        let mut bins = self.raw_bin_densities(fd, rate, n);
        let total: f64 = bins.iter().sum::<f64>() * rate / n as f64;
        if total > 0.0 {
            for b in &mut bins {
                *b /= total;
            }
        }
        bins
    }

    /// Power the `n`-point grid at `rate` Hz captures before rescaling.
    ///
    /// Zero or non-finite when the shape is too narrow for the grid to
    /// resolve, or when `fd` is so small that the density itself underflows.
    pub fn resolved_power(&self, fd: f64, rate: f64, n: usize) -> f64 {
        self.raw_bin_densities(fd, rate, n).iter().sum::<f64>() * rate / n as f64
    }

    fn raw_bin_densities(&self, fd: f64, rate: f64, n: usize) -> Vec<f64> {
        let df = rate / n as f64;
        (0..n)
            .map(|k| {
                let center = fft_bin_frequency(k, n, rate);
                (0..SUBBINS)
                    .map(|j| {
                        let f = center - df / 2.0 + (j as f64 + 0.5) * df / SUBBINS as f64;
                        self.density(f, fd)
                    })
                    .sum::<f64>()
                    / SUBBINS as f64
            })
            .collect()
    }
}

/// Frequency of FFT bin `k` out of `n` at `rate` Hz (negative upper half)
pub fn fft_bin_frequency(k: usize, n: usize, rate: f64) -> f64 {
    let signed = if k < n / 2 { k as f64 } else { k as f64 - n as f64 };
    signed * rate / n as f64
}

fn jakes(x: f64, fd: f64) -> f64 {
    if x.abs() >= 1.0 {
        0.0
    } else {
        1.0 / (PI * fd * (1.0 - x * x).sqrt())
    }
}

/// Draws Doppler frequencies distributed according to a spectrum shape
pub struct FrequencySampler {
    spectrum: DopplerSpectrum,
    fd: f64,
    lo: f64,
    step: f64,
    cdf: Vec<f64>,
}

impl FrequencySampler {
    pub fn new(spectrum: DopplerSpectrum, fd: f64, limit_hz: f64) -> Self {
        let half = spectrum.support(fd, limit_hz);
        let lo = -half;
        let step = 2.0 * half / CDF_TABLE_LEN as f64;

        // Jakes has a closed-form sampler and needs no table
        let mut cdf = Vec::new();
        if spectrum != DopplerSpectrum::Jakes {
            cdf.reserve(CDF_TABLE_LEN + 1);
            let mut acc = 0.0;
            cdf.push(0.0);
            for i in 0..CDF_TABLE_LEN {
                let f = lo + (i as f64 + 0.5) * step;
                acc += spectrum.density(f, fd) * step;
                cdf.push(acc);
            }
        }

        Self {
            spectrum,
            fd,
            lo,
            step,
            cdf,
        }
    }

    /// Map a uniform variate in [0, 1) to a Doppler frequency in Hz
    pub fn sample(&self, u: f64) -> f64 {
        if self.spectrum == DopplerSpectrum::Jakes {
            // Angle of arrival uniform on (-pi, pi]
            return self.fd * (2.0 * PI * u - PI).cos();
        }

        let total = self.cdf[CDF_TABLE_LEN];
        let target = u * total;
        let idx = self.cdf.partition_point(|&c| c < target).clamp(1, CDF_TABLE_LEN);
        let (c0, c1) = (self.cdf[idx - 1], self.cdf[idx]);
        let frac = if c1 > c0 { (target - c0) / (c1 - c0) } else { 0.5 };
        self.lo + (idx as f64 - 1.0 + frac) * self.step
    }
}
