//! Retry logic with backoff for StarChat requests
//!
//! StarChat answers some calls (the analyzer state count in particular) with
//! a non-200 status while it is still loading an index. Those calls are
//! polled with a fixed "patience" delay; everything else uses exponential
//! backoff.

use crate::http::error::HttpError;
use backoff::{backoff::Backoff, ExponentialBackoff};
use std::time::Duration;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in seconds)
    pub base_delay_secs: u64,
    /// Maximum delay between retries (in seconds)
    pub max_delay_secs: u64,
    /// Whether to add jitter to prevent thundering herd
    pub jitter: bool,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1,
            max_delay_secs: 30,
            jitter: true,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Constant `patience_secs` between at most `trials` retries
    pub fn patience(trials: u32, patience_secs: u64) -> Self {
        Self {
            max_attempts: trials,
            base_delay_secs: patience_secs,
            max_delay_secs: patience_secs,
            jitter: false,
            multiplier: 1.0,
        }
    }

    /// Create an exponential backoff instance
    pub fn create_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            current_interval: Duration::from_secs(self.base_delay_secs),
            initial_interval: Duration::from_secs(self.base_delay_secs),
            max_interval: Duration::from_secs(self.max_delay_secs),
            multiplier: self.multiplier,
            max_elapsed_time: None, // attempts are bounded by max_attempts
            ..Default::default()
        };

        if !self.jitter {
            backoff.randomization_factor = 0.0;
        }

        backoff
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration },
    /// Do not retry the request
    NoRetry,
}

/// Retry handler for HTTP requests
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempts: u32,
    backoff: ExponentialBackoff,
}

impl RetryHandler {
    /// Create a new retry handler with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = policy.create_backoff();
        Self {
            policy,
            attempts: 0,
            backoff,
        }
    }

    /// Determine if a request should be retried based on the error
    pub fn should_retry(&mut self, error: &HttpError) -> RetryDecision {
        if self.attempts >= self.policy.max_attempts || !error.should_retry() {
            return RetryDecision::NoRetry;
        }

        self.attempts += 1;
        let delay = self.calculate_delay(error);

        RetryDecision::Retry { delay }
    }

    fn calculate_delay(&mut self, error: &HttpError) -> Duration {
        if let Some(retry_after_secs) = error.get_retry_delay() {
            return Duration::from_secs(retry_after_secs);
        }

        self.backoff
            .next_backoff()
            .unwrap_or(Duration::from_secs(self.policy.max_delay_secs))
    }

    /// Reset the retry handler for a new request
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.backoff.reset();
    }

    /// Get the number of retries made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Execute a request with retry logic
pub async fn execute_with_retry<F, Fut, T>(
    mut request_fn: F,
    policy: RetryPolicy,
) -> Result<T, HttpError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, HttpError>>,
{
    let mut handler = RetryHandler::new(policy);

    loop {
        match request_fn().await {
            Ok(response) => return Ok(response),
            Err(error) => match handler.should_retry(&error) {
                RetryDecision::Retry { delay } => {
                    log::info!(
                        "Giving some time to StarChat (retry {}, waiting {:?}): {}",
                        handler.attempts(),
                        delay,
                        error
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::NoRetry => {
                    log::warn!(
                        "Request failed after {} retries, not retrying: {}",
                        handler.attempts(),
                        error
                    );
                    return Err(error);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::ErrorClassification;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> HttpError {
        HttpError::busy(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_secs, 1);
        assert_eq!(policy.max_delay_secs, 30);
        assert!(policy.jitter);
    }

    #[test]
    fn test_retry_handler_max_attempts() {
        let mut handler = RetryHandler::new(RetryPolicy::new(2));
        let error = server_error();

        assert!(matches!(handler.should_retry(&error), RetryDecision::Retry { .. }));
        assert_eq!(handler.attempts(), 1);
        assert!(matches!(handler.should_retry(&error), RetryDecision::Retry { .. }));
        assert_eq!(handler.attempts(), 2);
        assert_eq!(handler.should_retry(&error), RetryDecision::NoRetry);

        handler.reset();
        assert_eq!(handler.attempts(), 0);
    }

    #[test]
    fn test_non_retryable_errors() {
        let mut handler = RetryHandler::new(RetryPolicy::default());
        let auth_error = HttpError {
            status_code: Some(401),
            classification: ErrorClassification::AuthenticationError,
            server_code: None,
            message: "Unauthorized".to_string(),
            details: None,
            retry_after: None,
        };
        assert_eq!(handler.should_retry(&auth_error), RetryDecision::NoRetry);
    }

    #[test]
    fn test_retry_after_header() {
        let mut handler = RetryHandler::new(RetryPolicy::default());
        let mut error = server_error();
        error.retry_after = Some(10);

        assert_eq!(
            handler.should_retry(&error),
            RetryDecision::Retry { delay: Duration::from_secs(10) }
        );
    }

    #[test]
    fn test_patience_policy_is_constant() {
        let mut handler = RetryHandler::new(RetryPolicy::patience(3, 5));
        let error = server_error();
        for _ in 0..3 {
            assert!(matches!(
                handler.should_retry(&error),
                RetryDecision::Retry { delay } if delay.as_secs() == 5
            ));
        }
        assert_eq!(handler.should_retry(&error), RetryDecision::NoRetry);
    }

    #[tokio::test]
    async fn test_execute_with_retry_recovers() {
        let calls = AtomicU32::new(0);
        let result = execute_with_retry(
            || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 2 {
                        Err(server_error())
                    } else {
                        Ok(call)
                    }
                }
            },
            RetryPolicy::patience(5, 0),
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_with_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let result: Result<(), HttpError> = execute_with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(server_error()) }
            },
            RetryPolicy::patience(2, 0),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
