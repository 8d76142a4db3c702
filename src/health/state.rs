//! Simulated dependency state.
//!
//! # States
//! Each dependency is either up or down. There is no unknown state.
//!
//! # Transitions
//! ```text
//! every health check:
//!     draw a < db_flip_probability          → db_connected = !db_connected
//!     draw b < third_party_flip_probability → third_party_available = !third_party_available
//! ```
//!
//! Both flips and the returned snapshot happen inside one critical section, so
//! readers never observe a half-applied check.

use std::sync::{Mutex, MutexGuard};

use rand::Rng;
use thiserror::Error;

use crate::config::FaultConfig;

/// Point-in-time view of the simulated dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultFlags {
    pub db_connected: bool,
    pub third_party_available: bool,
}

impl FaultFlags {
    /// True when both dependencies are up.
    pub fn all_up(&self) -> bool {
        self.db_connected && self.third_party_available
    }
}

/// Errors reading or mutating fault state.
#[derive(Debug, Error)]
pub enum FaultStateError {
    /// A thread panicked while holding the state lock.
    #[error("fault state lock poisoned")]
    Poisoned,
}

/// Shared, mutable simulated dependency health.
#[derive(Debug)]
pub struct FaultState {
    flags: Mutex<FaultFlags>,
    db_flip_probability: f64,
    third_party_flip_probability: f64,
}

impl FaultState {
    pub fn new(config: &FaultConfig) -> Self {
        Self {
            flags: Mutex::new(FaultFlags {
                db_connected: config.db_connected,
                third_party_available: config.third_party_available,
            }),
            db_flip_probability: config.db_flip_probability,
            third_party_flip_probability: config.third_party_flip_probability,
        }
    }

    /// Read both flags.
    pub fn snapshot(&self) -> Result<FaultFlags, FaultStateError> {
        Ok(*self.lock()?)
    }

    /// Randomly flip each flag and return the resulting state.
    pub fn check_and_maybe_flip(&self) -> Result<FaultFlags, FaultStateError> {
        self.check_and_maybe_flip_with(&mut rand::thread_rng())
    }

    /// Same as [`check_and_maybe_flip`](Self::check_and_maybe_flip) with a caller-supplied RNG.
    pub fn check_and_maybe_flip_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<FaultFlags, FaultStateError> {
        // Always draw twice so the two flips stay independent of each other.
        let flip_db = rng.gen::<f64>() < self.db_flip_probability;
        let flip_third_party = rng.gen::<f64>() < self.third_party_flip_probability;

        let mut flags = self.lock()?;
        if flip_db {
            flags.db_connected = !flags.db_connected;
            tracing::info!(db_connected = flags.db_connected, "Simulated database connectivity flipped");
        }
        if flip_third_party {
            flags.third_party_available = !flags.third_party_available;
            tracing::info!(
                third_party_available = flags.third_party_available,
                "Simulated third-party availability flipped"
            );
        }
        Ok(*flags)
    }

    fn lock(&self) -> Result<MutexGuard<'_, FaultFlags>, FaultStateError> {
        self.flags.lock().map_err(|_| FaultStateError::Poisoned)
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = self.flags.lock();
                    panic!("poisoning fault state for test");
                })
                .join();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn state(db_p: f64, api_p: f64) -> FaultState {
        FaultState::new(&FaultConfig {
            db_flip_probability: db_p,
            third_party_flip_probability: api_p,
            db_connected: true,
            third_party_available: true,
        })
    }

    #[test]
    fn test_zero_probability_never_flips() {
        let faults = state(0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let flags = faults.check_and_maybe_flip_with(&mut rng).unwrap();
            assert!(flags.all_up());
        }
    }

    #[test]
    fn test_certain_probability_always_flips() {
        let faults = state(1.0, 0.0);
        let first = faults.check_and_maybe_flip().unwrap();
        assert!(!first.db_connected);
        assert!(first.third_party_available);

        let second = faults.check_and_maybe_flip().unwrap();
        assert!(second.db_connected);
        assert_eq!(faults.snapshot().unwrap(), second);
    }

    #[test]
    fn test_flip_rate_tracks_probability() {
        let faults = state(0.10, 0.05);
        let mut rng = StdRng::seed_from_u64(42);
        let (mut db_flips, mut api_flips) = (0, 0);
        let mut prev = faults.snapshot().unwrap();

        for _ in 0..20_000 {
            let next = faults.check_and_maybe_flip_with(&mut rng).unwrap();
            if next.db_connected != prev.db_connected {
                db_flips += 1;
            }
            if next.third_party_available != prev.third_party_available {
                api_flips += 1;
            }
            prev = next;
        }

        assert!((1_600..2_400).contains(&db_flips), "db flips: {}", db_flips);
        assert!((700..1_300).contains(&api_flips), "api flips: {}", api_flips);
    }

    #[test]
    fn test_concurrent_checks_never_expose_half_applied_flip() {
        // With both probabilities at 1.0 every check flips both flags together,
        // so any consistent snapshot has the two flags equal.
        let faults = Arc::new(state(1.0, 1.0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let faults = Arc::clone(&faults);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let flipped = faults.check_and_maybe_flip().unwrap();
                        assert_eq!(flipped.db_connected, flipped.third_party_available);
                        let read = faults.snapshot().unwrap();
                        assert_eq!(read.db_connected, read.third_party_available);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // 8 * 500 flips is even, so both flags are back where they started.
        assert!(faults.snapshot().unwrap().all_up());
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let faults = state(0.0, 0.0);
        faults.poison();
        assert!(matches!(faults.snapshot(), Err(FaultStateError::Poisoned)));
        assert!(matches!(faults.check_and_maybe_flip(), Err(FaultStateError::Poisoned)));
    }
}
