//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] adds randomness to backoff delays so that tasks retrying
//! at the same moment (e.g. many runs of one deployment hitting the same
//! flaky dependency) do not re-invoke in lockstep.
//!
//! - [`JitterPolicy::None`]: no randomization, predictable delays
//! - [`JitterPolicy::Full`]: random delay in [0, base]
//! - [`JitterPolicy::Equal`]: delay = base/2 + random[0, base/2]

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of retry delays.
///
/// ## Trade-offs
/// - **None**: predictable, risks synchronized retries
/// - **Full**: maximum spreading, can shrink the delay to near zero
/// - **Equal**: balanced, preserves at least half of the base delay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact backoff delay.
    #[default]
    None,

    /// Full jitter: random delay in [0, base].
    Full,

    /// Equal jitter: delay = base/2 + random[0, base/2].
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given base delay.
    pub fn apply(&self, base: Duration) -> Duration {
        match self {
            JitterPolicy::None => base,
            JitterPolicy::Full => Self::full_jitter(base),
            JitterPolicy::Equal => Self::equal_jitter(base),
        }
    }

    /// Full jitter: random[0, base]
    fn full_jitter(base: Duration) -> Duration {
        let ms = base.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(0..=ms))
    }

    /// Equal jitter: base/2 + random[0, base/2]
    fn equal_jitter(base: Duration) -> Duration {
        let ms = base.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let half = ms / 2;
        let jitter = if half == 0 {
            0
        } else {
            let mut rng = rand::rng();
            rng.random_range(0..=half)
        };
        Duration::from_millis(half + jitter)
    }
}
