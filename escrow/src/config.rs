//! Deployment settings for the escrow client, and resolution of the RPC endpoint
//! the same way the Solana CLI does it.
use crate::error::{EscrowError, Result};
use serde::{Deserialize, Serialize};
use solana_cli_config::Config as SolanaCliConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tiplink_escrow_serde::pubkey;

pub const DEFAULT_PROGRAM_ID: &str = "8TqqugH88U3fDEWeKHqBSxZKeqoRrXkdpy3ciX5GAruK";
pub const DEFAULT_TREASURY: &str = "BGZMcTjyTCbkRszC1CBpFpP9CbVh3Ah2ZhjzCsc9PsAr";
pub const DEFAULT_BACKEND_URL: &str = "https://backend.tiplink.io";
pub const DEFAULT_DEPOSITOR_URL: &str = "https://tiplink-mailer.vercel.app/depositor-url";
pub const DEFAULT_ENCLAVE_URL: &str = "https://mailer.tiplink.io";
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 400;

/// Suggested priority fee, in lamports, for escrow deposit and withdraw transactions.
pub const PRIORITY_FEE_LAMPORTS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Additional attempts after the first failure. Zero disables retrying.
    pub max_retries: u32,
    /// Doubles after every failed attempt.
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 500,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EscrowConfig {
    #[serde(with = "pubkey")]
    pub program_id: Pubkey,
    #[serde(with = "pubkey")]
    pub treasury: Pubkey,
    pub backend_url: String,
    pub depositor_url: String,
    pub enclave_url: String,
    /// Pause between per-signature transaction fetches while rebuilding history.
    pub request_delay_ms: u64,
    /// Page size requested from `getSignaturesForAddress`. When unset the node's default applies.
    pub signature_page_limit: Option<usize>,
    pub retry: RetryConfig,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            program_id: crate::ID,
            treasury: crate::TREASURY,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            depositor_url: DEFAULT_DEPOSITOR_URL.to_string(),
            enclave_url: DEFAULT_ENCLAVE_URL.to_string(),
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            signature_page_limit: None,
            retry: RetryConfig::default(),
        }
    }
}

impl EscrowConfig {
    /// Defaults, overridden by any of the `TIPLINK_*` environment variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup("TIPLINK_ESCROW_PROGRAM_ID") {
            config.program_id = parse_pubkey("TIPLINK_ESCROW_PROGRAM_ID", &v)?;
        }
        if let Some(v) = lookup("TIPLINK_ESCROW_TREASURY") {
            config.treasury = parse_pubkey("TIPLINK_ESCROW_TREASURY", &v)?;
        }
        if let Some(v) = lookup("TIPLINK_BACKEND_URL") {
            config.backend_url = v;
        }
        if let Some(v) = lookup("TIPLINK_DEPOSITOR_URL") {
            config.depositor_url = v;
        }
        if let Some(v) = lookup("TIPLINK_ENCLAVE_URL") {
            config.enclave_url = v;
        }
        if let Some(v) = lookup("TIPLINK_ESCROW_REQUEST_DELAY_MS") {
            config.request_delay_ms = v.parse().map_err(|_| {
                EscrowError::InvalidConfig(format!(
                    "TIPLINK_ESCROW_REQUEST_DELAY_MS must be an integer, got {v}"
                ))
            })?;
        }
        Ok(config)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn parse_pubkey(key: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|_| EscrowError::InvalidConfig(format!("{key} is not a valid address: {value}")))
}

fn normalize_to_url_if_moniker<T: AsRef<str>>(url_or_moniker: T) -> String {
    match url_or_moniker.as_ref() {
        "m" | "mainnet-beta" => "https://api.mainnet-beta.solana.com",
        "t" | "testnet" => "https://api.testnet.solana.com",
        "d" | "devnet" => "https://api.devnet.solana.com",
        "l" | "localhost" => "http://localhost:8899",
        url => url,
    }
    .to_string()
}

/// RPC endpoint and commitment for a [crate::ledger::RpcLedger].
#[derive(Debug, Clone, Default)]
pub struct RpcSettings {
    pub url: Option<String>,
    pub commitment: Option<CommitmentConfig>,
}

impl RpcSettings {
    /// Resolve the RPC URL: explicit value, then `SOLANA_RPC_URL`,
    /// then the `json_rpc_url` of the Solana CLI config file.
    pub fn resolve_url(&self, config: Option<SolanaCliConfig>) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(normalize_to_url_if_moniker(url));
        }
        if let Ok(url) = env::var("SOLANA_RPC_URL") {
            return Ok(normalize_to_url_if_moniker(url));
        }
        let config = match config {
            Some(config) => config,
            None => load_default_solana_cli_config()?,
        };
        Ok(normalize_to_url_if_moniker(config.json_rpc_url))
    }

    /// Resolve the commitment: explicit value, else the Solana CLI config's.
    pub fn resolve_commitment(&self, config: Option<SolanaCliConfig>) -> Result<CommitmentConfig> {
        if let Some(commitment) = self.commitment {
            return Ok(commitment);
        }
        let config = match config {
            Some(config) => config,
            None => load_default_solana_cli_config()?,
        };
        CommitmentConfig::from_str(&config.commitment).map_err(|e| {
            EscrowError::InvalidConfig(format!(
                "unrecognized commitment {} in Solana CLI config: {e}",
                config.commitment
            ))
        })
    }
}

/// Load configuration from the standard Solana CLI config path.
pub fn load_default_solana_cli_config() -> Result<SolanaCliConfig> {
    let config_file = solana_cli_config::CONFIG_FILE.as_ref().ok_or_else(|| {
        EscrowError::InvalidConfig(
            "unable to determine a config file path: no home directory on this OS or user"
                .to_string(),
        )
    })?;
    SolanaCliConfig::load(config_file).map_err(|e| {
        EscrowError::InvalidConfig(format!(
            "could not load Solana CLI config file {config_file}: {e}"
        ))
    })
}
