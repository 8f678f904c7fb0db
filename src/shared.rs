//! Thread-safe channel handle
//!
//! Processing and reconfiguration both need exclusive access; snapshots only
//! read. A flag marks an in-flight reconfiguration so that a processing
//! call arriving meanwhile fails fast instead of queueing behind it and then
//! running against parameters its caller never saw. A caller that already
//! passed the flag check is caught by the reconfiguration generation, read
//! before and compared after taking the lock.

use num_complex::Complex64;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::channel::{ChannelState, FadingChannel};
use crate::characterize::{DopplerSpectrumEstimate, PathTap};
use crate::config::{ChannelConfig, ConfigUpdate};
use crate::error::{Result, StateError};

struct Inner {
    channel: RwLock<FadingChannel>,
    reconfiguring: AtomicBool,
    // Bumped under the write lock by every accepted reconfiguration
    generation: AtomicU64,
}

/// Clears the in-flight flag when the reconfiguration ends, however it ends
struct ReconfigureGuard<'a>(&'a AtomicBool);

impl Drop for ReconfigureGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cloneable handle to a channel shared between threads
#[derive(Clone)]
pub struct SharedChannel {
    inner: Arc<Inner>,
}

impl SharedChannel {
    pub fn new(channel: FadingChannel) -> Self {
        Self {
            inner: Arc::new(Inner {
                channel: RwLock::new(channel),
                reconfiguring: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Build the channel and wrap it
    pub fn create(config: ChannelConfig, seed: Option<u64>) -> Result<Self> {
        Ok(Self::new(FadingChannel::new(config, seed)?))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, FadingChannel>> {
        self.inner
            .channel
            .read()
            .map_err(|_| StateError::LockPoisoned.into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, FadingChannel>> {
        self.inner
            .channel
            .write()
            .map_err(|_| StateError::LockPoisoned.into())
    }

    fn ensure_not_reconfiguring(&self) -> Result<()> {
        if self.inner.reconfiguring.load(Ordering::Acquire) {
            return Err(StateError::ReconfigurationInFlight.into());
        }
        Ok(())
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Write lock, refused if a reconfiguration was accepted after `seen`
    /// was read. Covers callers that passed the flag check and then queued
    /// behind the reconfiguration.
    fn write_unchanged_since(&self, seen: u64) -> Result<RwLockWriteGuard<'_, FadingChannel>> {
        let channel = self.write()?;
        if self.generation() != seen {
            return Err(StateError::ReconfigurationInFlight.into());
        }
        Ok(channel)
    }

    /// Run `f` with exclusive access unless a reconfiguration is in flight
    pub fn with_channel_mut<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut FadingChannel) -> Result<R>,
    {
        self.ensure_not_reconfiguring()?;
        let seen = self.generation();
        let mut channel = self.write_unchanged_since(seen)?;
        f(&mut channel)
    }

    /// Run `f` with shared read access
    pub fn with_channel<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&FadingChannel) -> R,
    {
        let channel = self.read()?;
        Ok(f(&channel))
    }

    pub fn process(&self, input: &[Complex64]) -> Result<Vec<Complex64>> {
        self.with_channel_mut(|ch| ch.process(input))
    }

    pub fn process_with_path_gains(
        &self,
        input: &[Complex64],
    ) -> Result<(Vec<Complex64>, Vec<Vec<Complex64>>)> {
        self.with_channel_mut(|ch| ch.process_with_path_gains(input))
    }

    pub fn advance(&self, num_samples: usize) -> Result<()> {
        self.with_channel_mut(|ch| ch.advance(num_samples))
    }

    pub fn reset(&self) -> Result<()> {
        self.with_channel_mut(|ch| ch.reset())
    }

    /// Reconfigure; a second concurrent call is refused rather than queued
    pub fn reconfigure(&self, update: &ConfigUpdate) -> Result<()> {
        if self.inner.reconfiguring.swap(true, Ordering::AcqRel) {
            return Err(StateError::ReconfigurationInFlight.into());
        }
        let _guard = ReconfigureGuard(&self.inner.reconfiguring);

        let mut channel = self.write()?;
        channel.reconfigure(update)?;
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    pub fn is_reconfiguring(&self) -> bool {
        self.inner.reconfiguring.load(Ordering::Acquire)
    }

    pub fn state(&self) -> Result<ChannelState> {
        self.with_channel(|ch| ch.state())
    }

    pub fn config(&self) -> Result<ChannelConfig> {
        self.with_channel(|ch| ch.config().clone())
    }

    pub fn snapshot_impulse_response(&self) -> Result<Vec<PathTap>> {
        self.with_channel(|ch| ch.snapshot_impulse_response())
    }

    pub fn bandlimited_impulse_response(&self) -> Result<Vec<Complex64>> {
        self.with_channel(|ch| ch.bandlimited_impulse_response())
    }

    pub fn snapshot_frequency_response(&self, n: usize) -> Result<Vec<Complex64>> {
        self.with_channel(|ch| ch.snapshot_frequency_response(n))?
    }

    pub fn doppler_spectrum_estimate(&self, path: usize) -> Result<DopplerSpectrumEstimate> {
        self.with_channel(|ch| ch.doppler_spectrum_estimate(path))?
    }
}
