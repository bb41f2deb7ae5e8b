//! Fixed-interval polling
//!
//! Provisioning on the management plane is asynchronous: a mutating call is
//! accepted long before its effect is observable. [`poll_until`] re-runs an
//! observation on a fixed schedule until it yields a value or the policy's
//! deadline passes. Only the observation is repeated, never the mutating call.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Polling schedule
///
/// Elapsed time is the sum of the delays actually slept (initial delay plus
/// one interval per observation), so the number of observations is fixed by
/// the policy and does not depend on how long each observation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Settling delay before the first interval starts
    pub initial_delay: Duration,

    /// Delay before each observation
    pub interval: Duration,

    /// Total budget, including the initial delay
    pub max_elapsed: Duration,
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_elapsed: Duration) -> Self {
        Self {
            initial_delay: Duration::ZERO,
            interval,
            max_elapsed,
        }
    }

    pub const fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Upper bound on observations this policy performs
    pub fn max_attempts(&self) -> u32 {
        let budget = self.max_elapsed.saturating_sub(self.initial_delay).as_millis();
        let interval = self.effective_interval().as_millis();
        budget.div_ceil(interval) as u32
    }

    fn effective_interval(&self) -> Duration {
        self.interval.max(Duration::from_millis(1))
    }
}

/// Passed to the observation closure on every attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollAttempt {
    /// 1-based attempt counter
    pub number: u32,

    /// Time slept so far, including the current interval
    pub elapsed: Duration,
}

/// Result of a finished poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready {
        value: T,
        attempts: u32,
        elapsed: Duration,
    },
    TimedOut {
        attempts: u32,
        elapsed: Duration,
    },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            PollOutcome::Ready { elapsed, .. } | PollOutcome::TimedOut { elapsed, .. } => *elapsed,
        }
    }
}

/// Run `observe` on the policy's schedule until it returns `Some`
///
/// An observation error ends the poll immediately and is returned as-is.
pub async fn poll_until<T, E, F, Fut>(policy: &PollPolicy, mut observe: F) -> Result<PollOutcome<T>, E>
where
    F: FnMut(PollAttempt) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let interval = policy.effective_interval();
    let mut elapsed = Duration::ZERO;
    let mut attempts = 0u32;
    tracing::debug!("Polling up to {} time(s)", policy.max_attempts());

    if !policy.initial_delay.is_zero() {
        sleep(policy.initial_delay).await;
        elapsed += policy.initial_delay;
    }

    while elapsed < policy.max_elapsed {
        sleep(interval).await;
        elapsed += interval;
        attempts += 1;

        let attempt = PollAttempt {
            number: attempts,
            elapsed,
        };
        if let Some(value) = observe(attempt).await? {
            return Ok(PollOutcome::Ready {
                value,
                attempts,
                elapsed,
            });
        }
        tracing::debug!(
            "Poll attempt {} not ready ({}s/{}s)",
            attempts,
            elapsed.as_secs(),
            policy.max_elapsed.as_secs()
        );
    }

    Ok(PollOutcome::TimedOut { attempts, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(PollPolicy::new(secs(15), secs(600)).max_attempts(), 40);
        assert_eq!(
            PollPolicy::new(secs(15), secs(300))
                .with_initial_delay(secs(30))
                .max_attempts(),
            18
        );
        assert_eq!(PollPolicy::new(secs(7), secs(20)).max_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_n_intervals() {
        let policy = PollPolicy::new(secs(15), secs(600));
        let start = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let outcome = poll_until(&policy, |attempt| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().unwrap().push(start.elapsed());
                Ok::<_, ()>((attempt.number == 4).then_some("done"))
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome.attempts(), 4);
        assert_eq!(outcome.elapsed(), secs(60));
        assert_eq!(
            outcome,
            PollOutcome::Ready {
                value: "done",
                attempts: 4,
                elapsed: secs(60),
            }
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![secs(15), secs(30), secs(45), secs(60)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_counts_toward_deadline() {
        let policy = PollPolicy::new(secs(15), secs(300)).with_initial_delay(secs(30));
        let start = Instant::now();
        let first = Arc::new(Mutex::new(None));

        let outcome = poll_until(&policy, |_| {
            let first = Arc::clone(&first);
            async move {
                first.lock().unwrap().get_or_insert(start.elapsed());
                Ok::<Option<()>, ()>(None)
            }
        })
        .await
        .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                attempts: 18,
                elapsed: secs(300),
            }
        );
        assert_eq!(*first.lock().unwrap(), Some(secs(45)));
        assert_eq!(start.elapsed(), secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observation_error_stops_polling() {
        let policy = PollPolicy::new(secs(15), secs(600));
        let result = poll_until(&policy, |attempt| async move {
            if attempt.number == 2 {
                Err("boom")
            } else {
                Ok::<Option<()>, _>(None)
            }
        })
        .await;

        assert_eq!(result, Err("boom"));
    }
}
