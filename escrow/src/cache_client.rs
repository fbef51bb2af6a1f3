use crate::action::RecordedEscrowAction;
use crate::context::EscrowContext;
use crate::error::{EscrowError, Result};
use crate::ledger::EscrowLedger;
use crate::serialize::{deserialize_recorded_actions, parse_transport_form};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

/// What the history cache can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKey {
    /// The full history of an escrow PDA.
    Escrow(Pubkey),
    /// The escrow actions of one transaction.
    Transaction(Signature),
}

impl HistoryKey {
    pub fn path(&self) -> String {
        match self {
            HistoryKey::Escrow(pda) => format!("/api/v1/escrow/{pda}"),
            HistoryKey::Transaction(signature) => format!("/api/v1/transaction/{signature}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheResponse {
    data: CacheData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheData {
    recorded_escrow_actions: Value,
}

/// Reads precomputed escrow history from the TipLink backend instead of replaying the ledger.
pub struct HistoryCacheClient {
    base_url: String,
    http: reqwest::Client,
}

impl HistoryCacheClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Client for the backend named in `ctx`'s configuration.
    pub fn from_context<L: EscrowLedger>(ctx: &EscrowContext<L>) -> Self {
        Self::new(ctx.config().backend_url.clone())
    }

    pub fn url(&self, key: &HistoryKey) -> String {
        format!("{}{}", self.base_url, key.path())
    }

    /// Fetch the cached actions for `key` and rebuild them, re-reading every mint from the ledger.
    pub async fn fetch<L: EscrowLedger>(
        &self,
        ctx: &EscrowContext<L>,
        key: HistoryKey,
    ) -> Result<Vec<RecordedEscrowAction>> {
        let url = self.url(&key);
        debug!("fetching cached escrow history from {}", url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EscrowError::CacheStatus {
                status: status.as_u16(),
                url,
            });
        }
        let body: CacheResponse = response.json().await?;
        let serialized = parse_transport_form(body.data.recorded_escrow_actions)?;
        deserialize_recorded_actions(ctx, serialized).await
    }
}
