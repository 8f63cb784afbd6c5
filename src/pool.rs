//! Worker pool: bounded-concurrency fan-out of wallet workflows
//!
//! One task per wallet, admitted through a counting gate of the configured
//! size. Each task jitters its start, runs its workflow to a terminal
//! outcome and appends that outcome to the result files. Failures stay
//! isolated per wallet; the pool never cancels siblings, and the run
//! completes when every task has resolved.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::chain::{Session, SessionPool};
use crate::config::RunConfig;
use crate::state::OutcomeLog;

/// Terminal outcome of one wallet workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Aggregated run totals
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Per-wallet workflow executed by the pool
#[async_trait]
pub trait WalletWorker: Send + Sync {
    async fn process(&self, session: &Session, seed_phrase: &str) -> Outcome;
}

pub struct WorkerPool {
    worker: Arc<dyn WalletWorker>,
    sessions: Arc<SessionPool>,
    outcome_log: Arc<OutcomeLog>,
    config: RunConfig,
}

impl WorkerPool {
    pub fn new(
        worker: Arc<dyn WalletWorker>,
        sessions: Arc<SessionPool>,
        outcome_log: Arc<OutcomeLog>,
        config: RunConfig,
    ) -> Self {
        Self {
            worker,
            sessions,
            outcome_log,
            config,
        }
    }

    /// Run every wallet to its terminal outcome and tally the results
    pub async fn run(&self, seed_phrases: Vec<String>) -> RunSummary {
        let gate = Arc::new(Semaphore::new(self.config.concurrency_limit));
        let mut handles = Vec::with_capacity(seed_phrases.len());

        for (index, seed_phrase) in seed_phrases.into_iter().enumerate() {
            let gate = gate.clone();
            let worker = self.worker.clone();
            let session = self.sessions.assign(index).clone();
            let outcome_log = self.outcome_log.clone();
            let sleep_range = self.config.sleep_range;

            handles.push(tokio::spawn(async move {
                let _permit = gate
                    .acquire_owned()
                    .await
                    .expect("admission gate is never closed");

                // Desynchronize submission timing across tasks
                let jitter = rand::thread_rng().gen_range(sleep_range[0]..=sleep_range[1]);
                tokio::time::sleep(Duration::from_secs(jitter)).await;

                let outcome = worker.process(&session, &seed_phrase).await;
                if let Err(err) = outcome_log.record(outcome, &seed_phrase).await {
                    warn!("Failed to record wallet outcome: {}", err);
                }
                outcome
            }));
        }

        let mut summary = RunSummary::default();
        for joined in futures::future::join_all(handles).await {
            summary.total += 1;
            match joined {
                Ok(Outcome::Succeeded) => summary.succeeded += 1,
                Ok(Outcome::Failed) => summary.failed += 1,
                Err(err) => {
                    warn!("Wallet task panicked: {}", err);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Worker double that tracks how many workflows run concurrently
    struct GaugeWorker {
        current: AtomicUsize,
        peak: AtomicUsize,
        fail_marker: &'static str,
    }

    impl GaugeWorker {
        fn new(fail_marker: &'static str) -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                fail_marker,
            }
        }
    }

    #[async_trait]
    impl WalletWorker for GaugeWorker {
        async fn process(&self, _session: &Session, seed_phrase: &str) -> Outcome {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            // Hold the slot long enough for other tasks to pile up
            tokio::time::sleep(Duration::from_secs(5)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            if seed_phrase.contains(self.fail_marker) {
                Outcome::Failed
            } else {
                Outcome::Succeeded
            }
        }
    }

    fn pool_with(worker: Arc<GaugeWorker>, concurrency_limit: usize, dir: &std::path::Path) -> WorkerPool {
        let sessions = Arc::new(SessionPool::build(&[], Duration::from_secs(5)).unwrap());
        let outcome_log = Arc::new(OutcomeLog::new(
            dir.join("succeeded.txt"),
            dir.join("failed.txt"),
        ));
        WorkerPool::new(
            worker,
            sessions,
            outcome_log,
            RunConfig {
                shuffle_accounts: false,
                use_proxy: false,
                concurrency_limit,
                max_retries: 1,
                sleep_range: [1, 2],
                gas_amount_range: [1, 1],
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_gate_bounds_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(GaugeWorker::new("bad"));
        let pool = pool_with(worker.clone(), 2, dir.path());

        let seeds: Vec<String> = (0..8).map(|i| format!("seed {}", i)).collect();
        let summary = pool.run(seeds).await;

        assert_eq!(summary.total, 8);
        assert_eq!(summary.succeeded, 8);
        assert!(worker.peak.load(Ordering::SeqCst) <= 2);
        // The gate should actually fill, not serialize everything
        assert_eq!(worker.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_isolated_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(GaugeWorker::new("bad"));
        let pool = pool_with(worker, 3, dir.path());

        let seeds = vec![
            "good one".to_string(),
            "bad two".to_string(),
            "good three".to_string(),
        ];
        let summary = pool.run(seeds).await;

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);

        let failed = tokio::fs::read_to_string(dir.path().join("failed.txt"))
            .await
            .unwrap();
        assert_eq!(failed, "bad two\n");

        let succeeded = tokio::fs::read_to_string(dir.path().join("succeeded.txt"))
            .await
            .unwrap();
        let mut lines: Vec<_> = succeeded.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["good one", "good three"]);
    }
}
