//! Bounded retry around session opening.
//!
//! Management stacks on airOS radios regularly drop the first session
//! negotiation and recover within a couple of seconds. Authentication
//! failures never recover and are returned on the first occurrence.

use std::time::Duration;

use tracing::{debug, warn};

use airos_client::{Connector, SessionError};

use crate::config::RetryConfig;

/// Blocks the calling worker between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Retry schedule for opening device sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Filtered attempts before the final unconditional one.
    pub attempts: u32,
    /// Pause after each failed filtered attempt.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 9,
            delay: Duration::from_secs(2),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Open a session to `hostname`.
    ///
    /// Up to `attempts` tries: an authentication failure is returned at once,
    /// any other failure sleeps `delay` and retries. When every filtered try
    /// failed, one final attempt is made and its result returned unchanged.
    pub fn acquire_session<C, S>(
        &self,
        connector: &C,
        hostname: &str,
        secret: &str,
        sleeper: &S,
    ) -> Result<C::Session, SessionError>
    where
        C: Connector + ?Sized,
        S: Sleeper + ?Sized,
    {
        for attempt in 1..=self.attempts {
            match connector.open(hostname, secret) {
                Ok(session) => {
                    if attempt > 1 {
                        debug!(device = %hostname, attempt, "Session opened after retry");
                    }
                    return Ok(session);
                }
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    debug!(
                        device = %hostname,
                        attempt,
                        error = %e,
                        "Session attempt failed, retrying"
                    );
                    sleeper.sleep(self.delay);
                }
            }
        }

        warn!(
            device = %hostname,
            attempts = self.attempts,
            "Session attempts exhausted, making final attempt"
        );
        connector.open(hostname, secret)
    }
}

/// Open a session with the default policy, sleeping the current thread.
pub fn acquire_session<C: Connector + ?Sized>(
    connector: &C,
    hostname: &str,
    secret: &str,
) -> Result<C::Session, SessionError> {
    RetryPolicy::default().acquire_session(connector, hostname, secret, &ThreadSleeper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use airos_client::{FakeConnector, StatusDocument};
    use parking_lot::Mutex;

    /// Records requested pauses instead of sleeping.
    #[derive(Default)]
    struct RecordingSleeper {
        pauses: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn count(&self) -> usize {
            self.pauses.lock().len()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.pauses.lock().push(duration);
        }
    }

    fn transient() -> SessionError {
        SessionError::transport("radio", "Error reading SSH protocol banner")
    }

    fn auth() -> SessionError {
        SessionError::Auth {
            host: "radio".to_string(),
            user: "ubnt".to_string(),
        }
    }

    fn connector(failures: Vec<SessionError>) -> FakeConnector {
        FakeConnector::new(StatusDocument::default()).with_open_failures(failures)
    }

    #[test]
    fn test_first_attempt_succeeds() {
        let connector = connector(vec![]);
        let sleeper = RecordingSleeper::default();

        let result = RetryPolicy::default().acquire_session(&connector, "radio", "pw", &sleeper);

        assert!(result.is_ok());
        assert_eq!(connector.stats().opens(), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn test_success_on_ninth_attempt_sleeps_eight_times() {
        let connector = connector(vec![transient(); 8]);
        let sleeper = RecordingSleeper::default();

        let result = RetryPolicy::default().acquire_session(&connector, "radio", "pw", &sleeper);

        assert!(result.is_ok());
        assert_eq!(connector.stats().opens(), 9);
        assert_eq!(sleeper.count(), 8);
        assert!(
            sleeper
                .pauses
                .lock()
                .iter()
                .all(|d| *d == Duration::from_secs(2))
        );
    }

    #[test]
    fn test_auth_failure_is_immediate() {
        let connector = connector(vec![auth()]);
        let sleeper = RecordingSleeper::default();

        let result = RetryPolicy::default().acquire_session(&connector, "radio", "pw", &sleeper);

        assert!(matches!(result, Err(SessionError::Auth { .. })));
        assert_eq!(connector.stats().opens(), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn test_auth_failure_after_transient_stops_retrying() {
        let connector = connector(vec![transient(), transient(), auth()]);
        let sleeper = RecordingSleeper::default();

        let result = RetryPolicy::default().acquire_session(&connector, "radio", "pw", &sleeper);

        assert!(matches!(result, Err(SessionError::Auth { .. })));
        assert_eq!(connector.stats().opens(), 3);
        assert_eq!(sleeper.count(), 2);
    }

    #[test]
    fn test_final_attempt_succeeds() {
        let connector = connector(vec![transient(); 9]);
        let sleeper = RecordingSleeper::default();

        let result = RetryPolicy::default().acquire_session(&connector, "radio", "pw", &sleeper);

        assert!(result.is_ok());
        assert_eq!(connector.stats().opens(), 10);
        assert_eq!(sleeper.count(), 9);
    }

    #[test]
    fn test_final_attempt_error_is_returned_unfiltered() {
        let connector = connector(vec![transient(); 10]);
        let sleeper = RecordingSleeper::default();

        let result = RetryPolicy::default().acquire_session(&connector, "radio", "pw", &sleeper);

        assert!(matches!(result, Err(SessionError::Transport { .. })));
        assert_eq!(connector.stats().opens(), 10);
        assert_eq!(sleeper.count(), 9);
    }

    #[test]
    fn test_final_attempt_auth_error() {
        let mut failures = vec![transient(); 9];
        failures.push(auth());
        let connector = connector(failures);
        let sleeper = RecordingSleeper::default();

        let result = RetryPolicy::default().acquire_session(&connector, "radio", "pw", &sleeper);

        assert!(matches!(result, Err(SessionError::Auth { .. })));
        assert_eq!(connector.stats().opens(), 10);
        assert_eq!(sleeper.count(), 9);
    }

    #[test]
    fn test_zero_attempts_makes_single_try() {
        let connector = connector(vec![transient()]);
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            attempts: 0,
            delay: Duration::from_millis(1),
        };

        let result = policy.acquire_session(&connector, "radio", "pw", &sleeper);

        assert!(result.is_err());
        assert_eq!(connector.stats().opens(), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&RetryConfig {
            attempts: 3,
            delay_ms: 500,
        });
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(500));
    }
}
