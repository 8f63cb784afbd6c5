//! Domain registration workflow
//!
//! The two business operations (register a domain, set it as primary)
//! each re-check current on-chain state at the start of every attempt, so a
//! retried operation that already took effect short-circuits to success
//! instead of resubmitting a transaction.

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};

use crate::chain::{EntryFunctionPayload, Session};
use crate::config::{NamesConfig, NodeConfig};
use crate::error::RegistrarResult;
use crate::names::NamesApi;
use crate::pool::{Outcome, WalletWorker};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::tx::TransactionSubmitter;
use crate::wallet::Account;

pub struct DomainRegistrar {
    submitter: TransactionSubmitter,
    names: NamesApi,
    names_config: NamesConfig,
    retry: RetryPolicy,
    explorer_url: String,
}

impl DomainRegistrar {
    pub fn new(
        submitter: TransactionSubmitter,
        names_config: NamesConfig,
        node_config: &NodeConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            submitter,
            names: NamesApi::new(names_config.clone()),
            names_config,
            retry,
            explorer_url: node_config.explorer_url.clone(),
        }
    }

    /// Register a new domain for the wallet unless it already holds one
    ///
    /// Returns the freshly registered name, or `None` when the wallet
    /// already had a primary name and nothing was submitted.
    async fn register_domain(
        &self,
        session: &Session,
        account: &Account,
        attempt: u32,
    ) -> RegistrarResult<Option<String>> {
        let current = self.names.primary_name(session, account.address()).await?;

        // A dotted reply is not a bare registered name; treat it as absent
        if let Some(name) = current.filter(|name| !name.contains('.')) {
            info!(
                "{} | Register domain name | Attempt {}/{} | This wallet has already got domain name {}",
                account.address(),
                attempt,
                self.retry.max_attempts,
                name
            );
            return Ok(None);
        }

        let name = self.names.find_available(session).await?;
        let payload = EntryFunctionPayload::entry_function(
            &self.names_config.register_function,
            vec![
                json!(name),
                json!(self.names_config.registration_duration_secs.to_string()),
                json!({ "vec": [] }),
                json!({ "vec": [] }),
            ],
        );

        let hash = self
            .submitter
            .submit_entry_function(session, account, payload)
            .await?;
        info!(
            "{} | Register domain name | {}.apt | Attempt {}/{} | Transaction sent",
            account.address(),
            name,
            attempt,
            self.retry.max_attempts
        );

        self.submitter.wait_for_confirmation(session, &hash).await?;
        info!(
            "{} | Register domain name | {}.apt | Attempt {}/{} | Transaction succeeded | {}{}",
            account.address(),
            name,
            attempt,
            self.retry.max_attempts,
            self.explorer_url,
            hash
        );

        Ok(Some(name))
    }

    /// Make a freshly registered name the wallet's primary name
    async fn set_primary_name(
        &self,
        session: &Session,
        account: &Account,
        name: &str,
        attempt: u32,
    ) -> RegistrarResult<()> {
        let current = self.names.primary_name(session, account.address()).await?;

        let already_set =
            matches!(&current, Some(primary) if !primary.contains('.') && primary == name);
        if already_set {
            info!(
                "{} | Set new domain name as primary | {}.apt | Attempt {}/{} | This domain name has already been set",
                account.address(),
                name,
                attempt,
                self.retry.max_attempts
            );
            return Ok(());
        }

        let payload = EntryFunctionPayload::entry_function(
            &self.names_config.set_primary_function,
            vec![json!(name), json!({ "vec": [] })],
        );

        let hash = self
            .submitter
            .submit_entry_function(session, account, payload)
            .await?;
        info!(
            "{} | Set new domain name as primary | {}.apt | Attempt {}/{} | Transaction sent",
            account.address(),
            name,
            attempt,
            self.retry.max_attempts
        );

        self.submitter.wait_for_confirmation(session, &hash).await?;
        info!(
            "{} | Set new domain name as primary | {}.apt | Attempt {}/{} | Transaction succeeded | {}{}",
            account.address(),
            name,
            attempt,
            self.retry.max_attempts,
            self.explorer_url,
            hash
        );

        Ok(())
    }
}

#[async_trait]
impl WalletWorker for DomainRegistrar {
    /// Full workflow for one wallet: derive the key, register a domain,
    /// make it primary
    async fn process(&self, session: &Session, seed_phrase: &str) -> Outcome {
        let account = match Account::from_mnemonic(seed_phrase) {
            Ok(account) => account,
            Err(err) => {
                error!("Failed to derive wallet key: {}", err);
                return Outcome::Failed;
            }
        };

        let registered = run_with_retry(
            &self.retry,
            "Register domain name",
            account.address(),
            |attempt| self.register_domain(session, &account, attempt),
        )
        .await;

        match registered {
            None => Outcome::Failed,
            // Already had a name; nothing left to make primary
            Some(None) => Outcome::Succeeded,
            Some(Some(name)) => {
                let set = run_with_retry(
                    &self.retry,
                    "Set new domain name as primary",
                    account.address(),
                    |attempt| self.set_primary_name(session, &account, &name, attempt),
                )
                .await;

                match set {
                    Some(()) => Outcome::Succeeded,
                    None => Outcome::Failed,
                }
            }
        }
    }
}
