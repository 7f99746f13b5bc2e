use crate::Error;
use std::time::Duration;

/// Attempts per request when not configured.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Fixed pause between attempts when not configured.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Internal decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Fixed-delay retry policy.
///
/// `max_retries` counts total attempts, so the default of 5 means one call plus up to four
/// retries. The delay between attempts is constant; there is no exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed with `err`.
    pub(crate) fn decide(&self, err: &Error, attempt: u32) -> Decision {
        if err.is_attempt_failure() && attempt < self.max_retries {
            Decision::Retry {
                delay: self.retry_delay,
            }
        } else {
            Decision::Fail
        }
    }
}
