/*
[INPUT]:  Wall clock time
[OUTPUT]: Millisecond nonces, strictly increasing per clock
[POS]:    Auth layer - replay protection for signed requests
[UPDATE]: When the exchange changes nonce resolution
*/

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Process-wide clock shared by every signer
pub(crate) static NONCE_CLOCK: NonceClock = NonceClock::new();

/// Millisecond nonce source that never repeats a value
#[derive(Debug, Default)]
pub struct NonceClock {
    last: AtomicU64,
}

impl NonceClock {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Next nonce: the current time in milliseconds, bumped past the previous
    /// value when the clock has not advanced.
    pub fn next(&self) -> u64 {
        self.next_from(now_millis())
    }

    fn next_from(&self, now: u64) -> u64 {
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_tracks_wall_clock() {
        let clock = NonceClock::new();
        let before = now_millis();
        let nonce = clock.next();
        assert!(nonce >= before);
    }

    #[test]
    fn test_nonce_strictly_increasing_on_stalled_clock() {
        let clock = NonceClock::new();
        let first = clock.next_from(1_700_000_000_000);
        let second = clock.next_from(1_700_000_000_000);
        let third = clock.next_from(1_699_999_999_000);

        assert_eq!(first, 1_700_000_000_000);
        assert_eq!(second, 1_700_000_000_001);
        assert_eq!(third, 1_700_000_000_002);
    }

    #[test]
    fn test_nonce_unique_across_threads() {
        let clock = std::sync::Arc::new(NonceClock::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = clock.clone();
                std::thread::spawn(move || (0..250).map(|_| clock.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
