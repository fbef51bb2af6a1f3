//! Read and write access to the ledger, as the escrow client needs it.
//!
//! [EscrowLedger] is the only way the decoding and history code talks to the network,
//! which keeps it testable against an in-memory ledger.
use crate::config::{RetryConfig, RpcSettings};
use crate::error::Result;
use async_trait::async_trait;
use log::warn;
use serde_json::json;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_client::rpc_request::RpcRequest;
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};
use std::future::Future;
use tokio::time::sleep;

#[async_trait]
pub trait EscrowLedger: Send + Sync {
    /// Fetch a confirmed transaction with its status metadata, base64 encoded,
    /// at the highest transaction version this client understands.
    /// `Ok(None)` if the ledger does not know the signature.
    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<EncodedConfirmedTransactionWithStatusMeta>>;

    /// One page of signatures that touched `address`, newest first,
    /// strictly older than `before` when given.
    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: Option<usize>,
    ) -> Result<Vec<RpcConfirmedTransactionStatusWithSignature>>;

    /// `Ok(None)` if no account exists at `address`.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>>;
}

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit a fully signed transaction and wait until it reaches `commitment`.
    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature>;
}

/// Highest transaction version decoded by [tiplink_escrow_tx::HistoricalTransaction].
pub const MAX_SUPPORTED_TRANSACTION_VERSION: u8 = 0;

/// [EscrowLedger] over a Solana JSON RPC node, with optional bounded retry.
pub struct RpcLedger {
    client: RpcClient,
    retry: RetryConfig,
}

impl RpcLedger {
    pub fn new(client: RpcClient, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    pub fn from_settings(settings: &RpcSettings, retry: RetryConfig) -> Result<Self> {
        let url = settings.resolve_url(None)?;
        let commitment = match settings.commitment {
            Some(commitment) => commitment,
            None => settings
                .resolve_commitment(None)
                .unwrap_or_else(|_| CommitmentConfig::confirmed()),
        };
        Ok(Self::new(
            RpcClient::new_with_commitment(url, commitment),
            retry,
        ))
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// History endpoints reject `processed`.
    fn history_commitment(&self) -> CommitmentConfig {
        let commitment = self.client.commitment();
        if commitment.is_at_least_confirmed() {
            commitment
        } else {
            CommitmentConfig::confirmed()
        }
    }

    async fn with_retry<T, F, Fut>(&self, what: &str, call: F) -> Result<T>
    where
        F: Fn() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, ClientError>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retry.max_retries => {
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        "{} failed (attempt {}), retrying in {:?}: {}",
                        what,
                        attempt + 1,
                        backoff,
                        e
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl EscrowLedger for RpcLedger {
    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<EncodedConfirmedTransactionWithStatusMeta>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(self.history_commitment()),
            max_supported_transaction_version: Some(MAX_SUPPORTED_TRANSACTION_VERSION),
        };
        let params = json!([signature.to_string(), config]);
        // `get_transaction_with_config` treats a null result as a deserialization error,
        // so ask for an `Option` directly.
        self.with_retry("getTransaction", || {
            self.client
                .send::<Option<EncodedConfirmedTransactionWithStatusMeta>>(
                    RpcRequest::GetTransaction,
                    params.clone(),
                )
        })
        .await
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: Option<usize>,
    ) -> Result<Vec<RpcConfirmedTransactionStatusWithSignature>> {
        let commitment = self.history_commitment();
        self.with_retry("getSignaturesForAddress", || {
            self.client.get_signatures_for_address_with_config(
                address,
                GetConfirmedSignaturesForAddress2Config {
                    before,
                    until: None,
                    limit,
                    commitment: Some(commitment),
                },
            )
        })
        .await
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let commitment = self.client.commitment();
        let response = self
            .with_retry("getAccountInfo", || {
                self.client.get_account_with_commitment(address, commitment)
            })
            .await?;
        Ok(response.value)
    }
}

#[async_trait]
impl TransactionSubmitter for RpcLedger {
    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature> {
        Ok(self
            .client
            .send_and_confirm_transaction_with_spinner_and_commitment(transaction, commitment)
            .await?)
    }
}
