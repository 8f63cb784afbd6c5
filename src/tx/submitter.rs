//! Transaction submitter: build, encode, sign, submit, confirm
//!
//! One call of [`TransactionSubmitter::submit_entry_function`] is one
//! attempt: it fetches a fresh sequence number, builds a new envelope and
//! submits it once. Retrying is the caller's concern: a failed attempt is
//! rebuilt from scratch, never resubmitted byte-for-byte.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::gas::GasPolicy;
use crate::chain::{
    EntryFunctionPayload, NodeApi, Session, SignatureBlock, SignedTransaction, TransactionRequest,
};
use crate::error::{RegistrarError, RegistrarResult};
use crate::wallet::Account;

/// Timing knobs for the transaction lifecycle
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Seconds added to the current time for the expiration timestamp
    pub expiration_ttl_secs: u64,
    /// Confirmation poll ceiling, one poll per second
    pub transaction_wait_secs: u64,
}

/// Drives one transaction through its lifecycle against a node capability
pub struct TransactionSubmitter {
    node: Arc<dyn NodeApi>,
    gas: GasPolicy,
    config: SubmitterConfig,
}

impl TransactionSubmitter {
    pub fn new(node: Arc<dyn NodeApi>, gas: GasPolicy, config: SubmitterConfig) -> Self {
        Self { node, gas, config }
    }

    /// Build, sign and submit an entry-function transaction
    ///
    /// The sequence number is read from current on-chain state immediately
    /// before building; each wallet is processed by exactly one task, so no
    /// lock is held against concurrent submissions from the same account.
    pub async fn submit_entry_function(
        &self,
        session: &Session,
        account: &Account,
        payload: EntryFunctionPayload,
    ) -> RegistrarResult<String> {
        // Building
        let record = self.node.account(session, account.address(), None).await?;
        let sequence = record.sequence()?;
        let expiration = chrono::Utc::now().timestamp() as u64 + self.config.expiration_ttl_secs;

        let request = TransactionRequest {
            sender: account.address().to_string(),
            sequence_number: sequence.to_string(),
            max_gas_amount: self.gas.sample_max_gas().to_string(),
            gas_unit_price: self.gas.unit_price().to_string(),
            expiration_timestamp_secs: expiration.to_string(),
            payload,
        };

        // Encoding and Signing
        let signing_bytes = self.node.encode_submission(session, &request).await?;
        let signature =
            SignatureBlock::ed25519(account.public_key_hex(), account.sign_hex(&signing_bytes));

        // Submitting
        let signed = SignedTransaction { request, signature };
        let hash = self.node.submit(session, &signed).await?;
        debug!(hash = %hash, sender = %account.address(), sequence, "Transaction submitted");

        Ok(hash)
    }

    /// Poll a submitted transaction once per second until it confirms
    ///
    /// A hash the node does not know yet is polled like a pending one until
    /// the ceiling; a confirmed record must report success or the
    /// transaction counts as rejected.
    pub async fn wait_for_confirmation(
        &self,
        session: &Session,
        hash: &str,
    ) -> RegistrarResult<()> {
        let mut ticks = 0u64;

        loop {
            let record = self.node.transaction_by_hash(session, hash).await?;

            if let Some(record) = record {
                if !record.is_pending() {
                    return if record.success == Some(true) {
                        Ok(())
                    } else {
                        Err(RegistrarError::TransactionExecution {
                            reason: record
                                .vm_status
                                .unwrap_or_else(|| "no vm_status on confirmed record".to_string()),
                        })
                    };
                }
            }

            ticks += 1;
            if ticks >= self.config.transaction_wait_secs {
                return Err(RegistrarError::TransactionTimeout {
                    hash: hash.to_string(),
                });
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{AccountRecord, SessionPool, TransactionRecord};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    fn pending_record() -> TransactionRecord {
        TransactionRecord {
            kind: "pending_transaction".to_string(),
            success: None,
            vm_status: None,
        }
    }

    fn confirmed_record(success: bool, vm_status: &str) -> TransactionRecord {
        TransactionRecord {
            kind: "user_transaction".to_string(),
            success: Some(success),
            vm_status: Some(vm_status.to_string()),
        }
    }

    /// Node double: scripted poll responses, captured submissions
    struct ScriptedNode {
        sequence_number: &'static str,
        poll_script: Mutex<VecDeque<Option<TransactionRecord>>>,
        polls: AtomicUsize,
        submitted: Mutex<Option<SignedTransaction>>,
    }

    impl ScriptedNode {
        fn new(sequence_number: &'static str, script: Vec<Option<TransactionRecord>>) -> Self {
            Self {
                sequence_number,
                poll_script: Mutex::new(script.into()),
                polls: AtomicUsize::new(0),
                submitted: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl NodeApi for ScriptedNode {
        async fn account(
            &self,
            _session: &Session,
            _address: &str,
            _ledger_version: Option<u64>,
        ) -> RegistrarResult<AccountRecord> {
            Ok(AccountRecord {
                sequence_number: self.sequence_number.to_string(),
            })
        }

        async fn encode_submission(
            &self,
            _session: &Session,
            _request: &TransactionRequest,
        ) -> RegistrarResult<Vec<u8>> {
            Ok(vec![0xde, 0xad, 0xbe, 0xef])
        }

        async fn submit(
            &self,
            _session: &Session,
            signed: &SignedTransaction,
        ) -> RegistrarResult<String> {
            *self.submitted.lock().await = Some(signed.clone());
            Ok("0xfeedhash".to_string())
        }

        async fn transaction_by_hash(
            &self,
            _session: &Session,
            _hash: &str,
        ) -> RegistrarResult<Option<TransactionRecord>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            // An exhausted script keeps answering "not found"
            Ok(self.poll_script.lock().await.pop_front().flatten())
        }
    }

    fn submitter(node: Arc<ScriptedNode>, wait_secs: u64) -> TransactionSubmitter {
        TransactionSubmitter::new(
            node,
            GasPolicy::new([2500, 3200], 100),
            SubmitterConfig {
                expiration_ttl_secs: 600,
                transaction_wait_secs: wait_secs,
            },
        )
    }

    fn test_session() -> Session {
        SessionPool::build(&[], Duration::from_secs(5))
            .unwrap()
            .assign(0)
            .clone()
    }

    #[tokio::test]
    async fn test_submit_builds_fresh_envelope() {
        let node = Arc::new(ScriptedNode::new("11", vec![]));
        let submitter = submitter(node.clone(), 10);
        let account = Account::from_mnemonic("test test test").unwrap();

        let hash = submitter
            .submit_entry_function(
                &test_session(),
                &account,
                EntryFunctionPayload::entry_function("0x1::router::register_domain", vec![]),
            )
            .await
            .unwrap();
        assert_eq!(hash, "0xfeedhash");

        let signed = node.submitted.lock().await.clone().unwrap();
        assert_eq!(signed.request.sender, account.address());
        assert_eq!(signed.request.sequence_number, "11");
        let gas: u64 = signed.request.max_gas_amount.parse().unwrap();
        assert!((2500..=3200).contains(&gas));
        assert_eq!(signed.signature.kind, "ed25519_signature");
        // 64-byte signature, 0x-prefixed hex
        assert_eq!(signed.signature.signature.len(), 130);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_after_exactly_three_polls() {
        let node = Arc::new(ScriptedNode::new(
            "0",
            vec![
                None,
                Some(pending_record()),
                Some(confirmed_record(true, "Executed successfully")),
            ],
        ));
        let submitter = submitter(node.clone(), 20);

        submitter
            .wait_for_confirmation(&test_session(), "0xabc")
            .await
            .unwrap();
        assert_eq!(node.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_found_times_out_at_ceiling() {
        let node = Arc::new(ScriptedNode::new("0", vec![]));
        let submitter = submitter(node.clone(), 3);

        let err = submitter
            .wait_for_confirmation(&test_session(), "0xabc")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::TransactionTimeout { .. }));
        assert_eq!(node.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_transaction_reports_reason() {
        let node = Arc::new(ScriptedNode::new(
            "0",
            vec![Some(confirmed_record(false, "OUT_OF_GAS"))],
        ));
        let submitter = submitter(node, 20);

        let err = submitter
            .wait_for_confirmation(&test_session(), "0xabc")
            .await
            .unwrap_err();
        match err {
            RegistrarError::TransactionExecution { reason } => assert_eq!(reason, "OUT_OF_GAS"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
