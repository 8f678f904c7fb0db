//! Multipath fading channel
//!
//! `FadingChannel` ties the pieces together for one sequential stream:
//!
//! 1. One `FadingProcess` per path produces a unit-power Doppler-shaped gain
//! 2. `PathGainGenerator` scales it by the path amplitude and adds the
//!    line-of-sight term on the Rician path
//! 3. `TapDelayLine` convolves the input with the delayed, weighted taps
//!
//! All per-path seeds come from one master ChaCha8 stream, so a channel
//! built with an explicit seed is fully reproducible.

use num_complex::Complex64;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, warn};

use crate::characterize::{self, DopplerSpectrumEstimate, PathTap};
use crate::config::{ChannelConfig, ConfigUpdate};
use crate::delay_line::TapDelayLine;
use crate::error::{NumericalError, Result, StateError, ValidationError};
use crate::fading::{FadingProcess, ProcessParams};
use crate::path_gain::PathGainGenerator;

/// Channel state for telemetry
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    pub samples_processed: u64,
    /// Latency of the interpolation filter in samples
    pub filter_delay: usize,
    /// Gains applied to the most recent sample, one per path
    pub path_gains: Vec<Complex64>,
}

pub struct FadingChannel {
    config: ChannelConfig,

    // Master seed stream; one draw per fading process
    rng: ChaCha8Rng,

    processes: Vec<FadingProcess>,
    path_gains: PathGainGenerator,
    delay_line: TapDelayLine,
    current_gains: Vec<Complex64>,

    samples_processed: u64,
    faulted: bool,
}

fn build_processes(
    params: ProcessParams,
    count: usize,
    rng: &mut ChaCha8Rng,
) -> std::result::Result<Vec<FadingProcess>, NumericalError> {
    (0..count)
        .map(|_| FadingProcess::new(params, rng.gen()))
        .collect()
}

fn warn_on_ignored(config: &ChannelConfig) {
    if let Some(r) = &config.rician {
        if r.k_factor == 0.0 {
            warn!(path = r.path_index, "Rician path has K = 0, LOS component has no power");
        }
    }
}

impl FadingChannel {
    /// Build a channel. Without a seed the master stream is seeded from OS entropy.
    pub fn new(config: ChannelConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        warn_on_ignored(&config);

        let mut rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };

        let processes = build_processes(config.process_params(), config.num_paths(), &mut rng)?;
        let path_gains = PathGainGenerator::new(&config);
        let delay_line = TapDelayLine::new(&config.delays_samples(), config.delay_policy);

        debug!(
            paths = config.num_paths(),
            sample_rate = config.sample_rate,
            max_doppler_hz = config.max_doppler_hz,
            filter_delay = delay_line.filter_delay(),
            "channel created"
        );

        let mut channel = Self {
            config,
            rng,
            processes,
            path_gains,
            delay_line,
            current_gains: Vec::new(),
            samples_processed: 0,
            faulted: false,
        };
        channel.refresh_current_gains();
        Ok(channel)
    }

    fn refresh_current_gains(&mut self) {
        self.current_gains = self
            .processes
            .iter()
            .enumerate()
            .map(|(i, p)| self.path_gains.peek(i, p.current()))
            .collect();
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.faulted {
            return Err(StateError::Faulted.into());
        }
        Ok(())
    }

    fn validate_input(input: &[Complex64]) -> Result<()> {
        match input.iter().position(|x| !x.re.is_finite() || !x.im.is_finite()) {
            Some(index) => Err(ValidationError::NonFiniteInput { index }.into()),
            None => Ok(()),
        }
    }

    /// Advance every path by one sample and push `x` through the delay line
    fn step(&mut self, x: Complex64) -> Result<Complex64> {
        for (i, process) in self.processes.iter_mut().enumerate() {
            self.current_gains[i] = self.path_gains.gain(i, process.next_gain());
        }
        let y = self.delay_line.process(x, &self.current_gains);

        let sample_index = self.samples_processed;
        self.samples_processed += 1;

        if !y.re.is_finite() || !y.im.is_finite() {
            self.faulted = true;
            error!(sample_index, "non-finite channel output, channel faulted");
            return Err(NumericalError::NonFiniteOutput { sample_index }.into());
        }
        Ok(y)
    }

    /// Process a block of samples through the channel
    pub fn process(&mut self, input: &[Complex64]) -> Result<Vec<Complex64>> {
        self.ensure_usable()?;
        Self::validate_input(input)?;

        let mut output = Vec::with_capacity(input.len());
        for &x in input {
            output.push(self.step(x)?);
        }
        Ok(output)
    }

    /// Process a block and also return each path's gain series.
    ///
    /// The second value is indexed `[path][sample]`.
    pub fn process_with_path_gains(
        &mut self,
        input: &[Complex64],
    ) -> Result<(Vec<Complex64>, Vec<Vec<Complex64>>)> {
        self.ensure_usable()?;
        Self::validate_input(input)?;

        let mut output = Vec::with_capacity(input.len());
        let mut gains = vec![Vec::with_capacity(input.len()); self.processes.len()];
        for &x in input {
            output.push(self.step(x)?);
            for (series, &g) in gains.iter_mut().zip(&self.current_gains) {
                series.push(g);
            }
        }
        Ok((output, gains))
    }

    /// Advance channel state by feeding `num_samples` zeros.
    /// Used for time alignment between channels.
    pub fn advance(&mut self, num_samples: usize) -> Result<()> {
        self.ensure_usable()?;
        for _ in 0..num_samples {
            self.step(Complex64::new(0.0, 0.0))?;
        }
        Ok(())
    }

    /// Return every process to its initial seeded state and clear history
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_usable()?;
        for process in &mut self.processes {
            process.reset()?;
        }
        self.path_gains.reset(&self.config);
        self.delay_line.reset();
        self.samples_processed = 0;
        self.refresh_current_gains();
        debug!("channel reset");
        Ok(())
    }

    /// Apply a partial configuration change.
    ///
    /// Everything is validated and built on the side first; on any error
    /// the channel is left exactly as it was.
    pub fn reconfigure(&mut self, update: &ConfigUpdate) -> Result<()> {
        self.ensure_usable()?;

        let candidate = update.apply_to(&self.config).map_err(|e| {
            warn!(error = %e, "reconfiguration rejected");
            e
        })?;

        let mut rng = self.rng.clone();
        let params = candidate.process_params();
        let regenerate_all = params != self.config.process_params();
        let old_count = self.processes.len();
        let new_count = candidate.num_paths();

        let fresh = if regenerate_all {
            build_processes(params, new_count, &mut rng)?
        } else {
            build_processes(params, new_count.saturating_sub(old_count), &mut rng)?
        };

        let mut path_gains = self.path_gains.clone();
        path_gains.update(&candidate);

        let retune = candidate.delays_samples() != self.config.delays_samples()
            || candidate.delay_policy != self.config.delay_policy;

        // Commit
        if regenerate_all {
            self.processes = fresh;
        } else {
            self.processes.truncate(new_count);
            self.processes.extend(fresh);
        }
        if retune {
            self.delay_line
                .retune(&candidate.delays_samples(), candidate.delay_policy);
        }
        self.path_gains = path_gains;
        self.rng = rng;
        self.config = candidate;
        self.refresh_current_gains();

        warn_on_ignored(&self.config);
        debug!(
            regenerated = regenerate_all,
            paths = new_count,
            added = new_count.saturating_sub(old_count),
            filter_delay = self.delay_line.filter_delay(),
            "channel reconfigured"
        );
        Ok(())
    }

    pub fn state(&self) -> ChannelState {
        ChannelState {
            samples_processed: self.samples_processed,
            filter_delay: self.delay_line.filter_delay(),
            path_gains: self.current_gains.clone(),
        }
    }

    /// Path delays and the gains applied to the latest sample
    pub fn snapshot_impulse_response(&self) -> Vec<PathTap> {
        self.config
            .delays_samples()
            .into_iter()
            .zip(&self.current_gains)
            .map(|(delay_samples, &gain)| PathTap { delay_samples, gain })
            .collect()
    }

    /// The per-lag taps the delay line applies right now, latency included
    pub fn bandlimited_impulse_response(&self) -> Vec<Complex64> {
        self.delay_line.bandlimited_taps(&self.current_gains)
    }

    /// `n`-point frequency response of the current taps, natural FFT order
    pub fn snapshot_frequency_response(&self, n: usize) -> Result<Vec<Complex64>> {
        let taps = self.bandlimited_impulse_response();
        Ok(characterize::frequency_response(&taps, n)?)
    }

    pub fn doppler_spectrum_estimate(&self, path: usize) -> Result<DopplerSpectrumEstimate> {
        let process = self.processes.get(path).ok_or(ValidationError::PathIndexOutOfRange {
            index: path,
            num_paths: self.processes.len(),
        })?;
        Ok(process.spectrum_estimate())
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn num_paths(&self) -> usize {
        self.processes.len()
    }

    pub fn filter_delay(&self) -> usize {
        self.delay_line.filter_delay()
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RicianParams, SynthesisMethod};
    use crate::error::ChannelError;
    use crate::spectrum::DopplerSpectrum;

    fn tone(n: usize) -> Vec<Complex64> {
        (0..n)
            .map(|i| Complex64::from_polar(1.0, 0.05 * i as f64))
            .collect()
    }

    fn fading_config() -> ChannelConfig {
        ChannelConfig::new(10_000.0)
            .with_path(0.0, 0.0)
            .with_path(3e-4, -3.0)
            .with_max_doppler(50.0)
    }

    // ========================================================================
    // PROCESSING
    // ========================================================================

    #[test]
    fn test_empty_block() {
        let mut ch = FadingChannel::new(fading_config(), Some(1)).unwrap();
        assert!(ch.process(&[]).unwrap().is_empty());
        assert_eq!(ch.samples_processed(), 0);
    }

    #[test]
    fn test_output_length_and_counter() {
        let mut ch = FadingChannel::new(fading_config(), Some(1)).unwrap();
        let out = ch.process(&tone(1234)).unwrap();
        assert_eq!(out.len(), 1234);
        assert_eq!(ch.state().samples_processed, 1234);
    }

    #[test]
    fn test_non_finite_input_rejected_before_state_change() {
        let mut ch = FadingChannel::new(fading_config(), Some(1)).unwrap();
        let mut input = tone(10);
        input[6] = Complex64::new(f64::NAN, 0.0);

        let err = ch.process(&input).unwrap_err();
        assert_eq!(err, ValidationError::NonFiniteInput { index: 6 }.into());
        assert!(err.is_recoverable());
        assert_eq!(ch.samples_processed(), 0);
        assert!(!ch.is_faulted());
    }

    #[test]
    fn test_block_size_does_not_matter() {
        let input = tone(5000);
        let mut a = FadingChannel::new(fading_config(), Some(9)).unwrap();
        let whole = a.process(&input).unwrap();

        let mut b = FadingChannel::new(fading_config(), Some(9)).unwrap();
        let mut split = Vec::new();
        for chunk in input.chunks(333) {
            split.extend(b.process(chunk).unwrap());
        }
        assert_eq!(whole, split);
    }

    #[test]
    fn test_path_gain_series() {
        let mut ch = FadingChannel::new(fading_config(), Some(4)).unwrap();
        let (out, gains) = ch.process_with_path_gains(&tone(100)).unwrap();
        assert_eq!(out.len(), 100);
        assert_eq!(gains.len(), 2);
        assert!(gains.iter().all(|g| g.len() == 100));
        assert_eq!(ch.state().path_gains, vec![gains[0][99], gains[1][99]]);
    }

    #[test]
    fn test_advance_matches_processing_zeros() {
        let mut a = FadingChannel::new(fading_config(), Some(2)).unwrap();
        let mut b = FadingChannel::new(fading_config(), Some(2)).unwrap();
        a.advance(777).unwrap();
        b.process(&vec![Complex64::new(0.0, 0.0); 777]).unwrap();
        assert_eq!(a.state(), b.state());

        let input = tone(100);
        assert_eq!(a.process(&input).unwrap(), b.process(&input).unwrap());
    }

    #[test]
    fn test_reset_replays_from_start() {
        let input = tone(3000);
        let mut ch = FadingChannel::new(fading_config(), Some(21)).unwrap();
        let first = ch.process(&input).unwrap();
        ch.reset().unwrap();
        assert_eq!(ch.samples_processed(), 0);
        assert_eq!(ch.process(&input).unwrap(), first);
    }

    #[test]
    fn test_entropy_seeded_channels_differ() {
        let mut a = FadingChannel::new(fading_config(), None).unwrap();
        let mut b = FadingChannel::new(fading_config(), None).unwrap();
        let input = tone(100);
        assert_ne!(a.process(&input).unwrap(), b.process(&input).unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = FadingChannel::new(ChannelConfig::new(1000.0), Some(1)).err();
        assert_eq!(err, Some(ChannelError::Validation(ValidationError::NoPaths)));
    }

    // ========================================================================
    // FAULT HANDLING
    // ========================================================================

    #[test]
    fn test_huge_input_faults_channel() {
        let cfg = ChannelConfig::new(1000.0).with_path(0.0, 0.0).with_path(0.001, 0.0);
        let mut ch = FadingChannel::new(cfg, Some(1)).unwrap();

        // Finite in, overflow out
        let input = [Complex64::new(f64::MAX, 0.0), Complex64::new(f64::MAX, 0.0)];
        let err = ch.process(&input).unwrap_err();
        assert!(matches!(err, ChannelError::Numerical(NumericalError::NonFiniteOutput { sample_index: 1 })));
        assert!(!err.is_recoverable());
        assert!(ch.is_faulted());

        let later = ch.process(&tone(4)).unwrap_err();
        assert_eq!(later, StateError::Faulted.into());
        assert_eq!(ch.advance(1).unwrap_err(), StateError::Faulted.into());
        assert_eq!(ch.reconfigure(&ConfigUpdate::new()).unwrap_err(), StateError::Faulted.into());
    }

    #[test]
    fn test_configs_that_would_fault_are_rejected_up_front() {
        let two_path = |gain_db: f64| {
            ChannelConfig::from_vectors(1000.0, &[0.0, 0.001], &[gain_db, gain_db]).unwrap()
        };
        let cases = [
            two_path(-4000.0).with_normalization(true),
            two_path(4000.0),
            fading_config()
                .with_max_doppler(10.0)
                .with_spectrum(DopplerSpectrum::RestrictedJakes { f_min: 0.5, f_max: 0.5005 }),
            fading_config()
                .with_max_doppler(1e-200)
                .with_spectrum(DopplerSpectrum::gaussian()),
        ];
        for cfg in cases {
            let err = FadingChannel::new(cfg.clone(), Some(1)).err();
            assert!(
                matches!(err, Some(ChannelError::Validation(_))),
                "{:?} gave {:?}",
                cfg,
                err
            );
        }

        // Same checks guard reconfiguration
        let mut ch = FadingChannel::new(fading_config(), Some(1)).unwrap();
        let err = ch
            .reconfigure(&ConfigUpdate::new().path_gains(vec![-4000.0, -4000.0]).normalize(true))
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(ch.process(&tone(16)).unwrap().len(), 16);
        assert!(!ch.is_faulted());
    }

    // ========================================================================
    // RECONFIGURATION
    // ========================================================================

    #[test]
    fn test_gain_change_keeps_processes() {
        let mut a = FadingChannel::new(fading_config(), Some(5)).unwrap();
        let mut b = FadingChannel::new(fading_config().with_normalization(true), Some(5)).unwrap();

        let input = tone(500);
        a.process(&input).unwrap();
        b.process(&input).unwrap();
        a.reconfigure(&ConfigUpdate::new().normalize(true)).unwrap();

        // Same underlying processes, same normalized amplitudes
        assert_eq!(a.process(&input).unwrap(), b.process(&input).unwrap());
    }

    #[test]
    fn test_doppler_change_regenerates() {
        let mut ch = FadingChannel::new(fading_config(), Some(5)).unwrap();
        ch.process(&tone(100)).unwrap();
        ch.reconfigure(&ConfigUpdate::new().max_doppler(0.0)).unwrap();

        // Static now: gain is exactly the path amplitude
        let state = ch.state();
        assert_eq!(state.path_gains[0], Complex64::new(1.0, 0.0));
        let out = ch.process(&tone(10)).unwrap();
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn test_adding_paths_keeps_existing() {
        let base = fading_config();
        let mut grown = FadingChannel::new(base.clone(), Some(8)).unwrap();
        let mut reference = FadingChannel::new(base, Some(8)).unwrap();

        grown.process(&tone(200)).unwrap();
        reference.process(&tone(200)).unwrap();

        grown
            .reconfigure(
                &ConfigUpdate::new()
                    .path_delays(vec![0.0, 3e-4, 6e-4])
                    .path_gains(vec![0.0, -3.0, -100.0]),
            )
            .unwrap();
        assert_eq!(grown.num_paths(), 3);

        let (_, g_grown) = grown.process_with_path_gains(&tone(200)).unwrap();
        let (_, g_ref) = reference.process_with_path_gains(&tone(200)).unwrap();
        assert_eq!(g_grown[0], g_ref[0]);
        assert_eq!(g_grown[1], g_ref[1]);
    }

    #[test]
    fn test_rejected_reconfigure_is_atomic() {
        let mut ch = FadingChannel::new(fading_config(), Some(3)).unwrap();
        ch.process(&tone(100)).unwrap();
        let before_state = ch.state();
        let before_config = ch.config().clone();

        let bad = ConfigUpdate::new().max_doppler(1e6).path_gains(vec![0.0, 0.0]);
        assert!(ch.reconfigure(&bad).is_err());
        assert_eq!(ch.state(), before_state);
        assert_eq!(ch.config(), &before_config);

        let mut twin = FadingChannel::new(fading_config(), Some(3)).unwrap();
        twin.process(&tone(100)).unwrap();
        assert_eq!(ch.process(&tone(100)).unwrap(), twin.process(&tone(100)).unwrap());
    }

    #[test]
    fn test_fractional_delay_reconfigure_sets_latency() {
        let mut ch = FadingChannel::new(fading_config(), Some(3)).unwrap();
        assert_eq!(ch.filter_delay(), 0);
        ch.reconfigure(&ConfigUpdate::new().path_delays(vec![0.0, 2.75e-4])).unwrap();
        assert_eq!(ch.filter_delay(), 7);
    }

    #[test]
    fn test_delay_only_change_keeps_gain_processes() {
        let cfg = fading_config().with_rician(RicianParams::new(2.0, 15.0));
        let mut moved = FadingChannel::new(cfg.clone(), Some(13)).unwrap();
        let mut twin = FadingChannel::new(cfg, Some(13)).unwrap();

        moved.process(&tone(300)).unwrap();
        twin.process(&tone(300)).unwrap();

        moved
            .reconfigure(&ConfigUpdate::new().path_delays(vec![1e-4, 5.25e-4]))
            .unwrap();
        assert_eq!(moved.filter_delay(), 7);
        let taps = moved.snapshot_impulse_response();
        assert!((taps[0].delay_samples - 1.0).abs() < 1e-9);
        assert!((taps[1].delay_samples - 5.25).abs() < 1e-9);

        // Gain series continue bit for bit, LOS rotator included
        let (_, g_moved) = moved.process_with_path_gains(&tone(2000)).unwrap();
        let (_, g_twin) = twin.process_with_path_gains(&tone(2000)).unwrap();
        assert_eq!(g_moved, g_twin);

        // Back to integral delays drops the interpolation latency
        moved
            .reconfigure(&ConfigUpdate::new().path_delays(vec![0.0, 4e-4]))
            .unwrap();
        assert_eq!(moved.filter_delay(), 0);
        let (_, g_moved) = moved.process_with_path_gains(&tone(500)).unwrap();
        let (_, g_twin) = twin.process_with_path_gains(&tone(500)).unwrap();
        assert_eq!(g_moved, g_twin);
    }

    #[test]
    fn test_sample_rate_change_regenerates_and_retunes() {
        let los_hz = 250.0;
        let cfg = fading_config().with_rician(RicianParams::new(f64::INFINITY, los_hz));
        let mut ch = FadingChannel::new(cfg.clone(), Some(19)).unwrap();
        let mut twin = FadingChannel::new(cfg, Some(19)).unwrap();

        let input = tone(10_000);
        ch.process(&input).unwrap();
        twin.process(&input).unwrap();
        assert!(ch.doppler_spectrum_estimate(1).unwrap().segments > 0);

        ch.reconfigure(&ConfigUpdate::new().sample_rate(20_000.0)).unwrap();

        // Fresh processes: the periodogram restarted
        assert_eq!(ch.doppler_spectrum_estimate(1).unwrap().segments, 0);

        // 0.3 ms is now 6 samples instead of 3
        let taps = ch.snapshot_impulse_response();
        assert!((taps[1].delay_samples - 6.0).abs() < 1e-9);
        assert_eq!(ch.filter_delay(), 0);
        assert_eq!(ch.bandlimited_impulse_response().len(), 7);

        let (_, g_ch) = ch.process_with_path_gains(&tone(1000)).unwrap();
        let (_, g_twin) = twin.process_with_path_gains(&tone(1000)).unwrap();
        assert_ne!(g_ch[1], g_twin[1]);

        // Pure LOS path rotates by 2π f_LOS / fs per sample at the new rate
        let expected = 2.0 * std::f64::consts::PI * los_hz / 20_000.0;
        for pair in g_ch[0].windows(2) {
            let step = (pair[1] * pair[0].conj()).arg();
            assert!((step - expected).abs() < 1e-9, "phase step {} vs {}", step, expected);
        }
        let old_step = (g_twin[0][1] * g_twin[0][0].conj()).arg();
        assert!((old_step - 2.0 * expected).abs() < 1e-9);
    }

    // ========================================================================
    // CHARACTERIZATION
    // ========================================================================

    #[test]
    fn test_impulse_snapshot() {
        let ch = FadingChannel::new(fading_config(), Some(3)).unwrap();
        let taps = ch.snapshot_impulse_response();
        assert_eq!(taps.len(), 2);
        assert_eq!(taps[0].delay_samples, 0.0);
        assert!((taps[1].delay_samples - 3.0).abs() < 1e-9);

        let bl = ch.bandlimited_impulse_response();
        assert_eq!(bl.len(), 4);
        assert_eq!(bl[0], taps[0].gain);
        assert_eq!(bl[3], taps[1].gain);
    }

    #[test]
    fn test_frequency_response_of_static_two_ray() {
        let cfg = ChannelConfig::new(1000.0).with_path(0.0, 0.0).with_path(0.002, -6.0);
        let ch = FadingChannel::new(cfg, Some(1)).unwrap();
        let h = ch.snapshot_frequency_response(64).unwrap();
        let a = 10.0_f64.powf(-6.0 / 20.0);
        assert!((h[0].norm() - (1.0 + a)).abs() < 1e-9);
        assert!((h[16].norm() - (1.0 - a)).abs() < 1e-9);
        assert!(ch.snapshot_frequency_response(0).is_err());
    }

    #[test]
    fn test_doppler_estimate_bounds() {
        let ch = FadingChannel::new(fading_config(), Some(3)).unwrap();
        assert!(ch.doppler_spectrum_estimate(1).is_ok());
        let err = ch.doppler_spectrum_estimate(2).unwrap_err();
        assert_eq!(err, ValidationError::PathIndexOutOfRange { index: 2, num_paths: 2 }.into());
    }

    #[test]
    fn test_estimates_do_not_perturb_output() {
        let input = tone(2000);
        let mut a = FadingChannel::new(fading_config(), Some(17)).unwrap();
        let mut b = FadingChannel::new(fading_config(), Some(17)).unwrap();
        for chunk in input.chunks(100) {
            let _ = a.doppler_spectrum_estimate(0).unwrap();
            let _ = a.snapshot_frequency_response(32).unwrap();
            assert_eq!(a.process(chunk).unwrap(), b.process(chunk).unwrap());
        }
    }

    #[test]
    fn test_sum_of_sinusoids_channel() {
        let cfg = fading_config()
            .with_synthesis(SynthesisMethod::SumOfSinusoids)
            .with_spectrum(DopplerSpectrum::gaussian())
            .with_rician(RicianParams::new(2.0, 10.0));
        let mut ch = FadingChannel::new(cfg, Some(6)).unwrap();
        let out = ch.process(&tone(1000)).unwrap();
        assert!(out.iter().all(|y| y.re.is_finite() && y.im.is_finite()));
    }
}
