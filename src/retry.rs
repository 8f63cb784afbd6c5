//! Bounded retry with jittered backoff
//!
//! Supervises one named business action for one wallet. Failures below this
//! layer never escape the run: an exhausted operation degrades to a failed
//! outcome for that wallet alone.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::error::RegistrarError;

/// Retry knobs shared by every supervised operation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Inclusive backoff bounds, seconds
    pub sleep_range: [u64; 2],
}

impl RetryPolicy {
    fn backoff(&self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.sleep_range[0]..=self.sleep_range[1]);
        Duration::from_secs(secs)
    }
}

/// Run an action under the policy, returning its value or `None` once the
/// attempt budget is exhausted
///
/// The action receives the 1-based attempt number and must re-check current
/// on-chain state itself: an operation that already took effect has to
/// short-circuit to success rather than resubmit. Non-retryable errors end
/// the loop immediately.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    address: &str,
    mut action: F,
) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RegistrarError>>,
{
    let mut attempt = 1u32;

    loop {
        match action(attempt).await {
            Ok(value) => return Some(value),
            Err(err) => {
                warn!(
                    "{} | {} | Attempt {}/{} | Error: {}",
                    address, operation, attempt, policy.max_attempts, err
                );

                if !err.is_retryable() {
                    error!(
                        "{} | {} | Non-retryable error, giving up: {}",
                        address, operation, err
                    );
                    return None;
                }

                attempt += 1;
                if attempt > policy.max_attempts {
                    error!(
                        "{} | {} | Wallet failed after {} {}",
                        address,
                        operation,
                        policy.max_attempts,
                        if policy.max_attempts > 1 {
                            "retries"
                        } else {
                            "retry"
                        }
                    );
                    return None;
                }

                tokio::time::sleep(policy.backoff()).await;
            }
        }
    }
}
