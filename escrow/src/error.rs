use solana_client::client_error::ClientError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tiplink_escrow_tx::TransactionViewError;

pub type Result<T> = std::result::Result<T, EscrowError>;

/// Everything that stops the escrow client from producing an answer.
///
/// "Nothing there" outcomes (an instruction of another program, a failed transaction,
/// an escrow with no live record) are ordinary values, not errors.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// A recognized escrow instruction whose payload or account list does not match
    /// the interface description. Points at IDL / program version drift.
    #[error("escrow instruction {instruction} does not match the program interface: {reason}")]
    SchemaMismatch { instruction: String, reason: String },
    #[error("could not resolve mint {mint}: {reason}")]
    MintResolution { mint: Pubkey, reason: String },
    #[error("the program interface description is invalid: {0}")]
    Idl(String),
    #[error("instruction {instruction} requires account {account}, which was not provided")]
    MissingAccount { instruction: String, account: String },
    #[error("unknown escrow action type: {0}")]
    UnknownActionType(String),
    #[error("an SPL escrow requires a mint")]
    MissingMint,
    #[error("{0} is off curve; pass the off-curve override to derive its token account")]
    OwnerOffCurve(Pubkey),
    #[error("ledger returned an invalid signature: {0}")]
    InvalidSignature(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("history cache responded with status {status} for {url}")]
    CacheStatus { status: u16, url: String },
    #[error("link service responded with status {status} for {url}")]
    LinkServiceStatus { status: u16, url: String },
    #[error(transparent)]
    Transaction(#[from] TransactionViewError),
    #[error(transparent)]
    Rpc(#[from] ClientError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed transport form: {0}")]
    Transport(#[from] serde_json::Error),
}

impl EscrowError {
    pub(crate) fn schema(instruction: &str, reason: impl std::fmt::Display) -> Self {
        Self::SchemaMismatch {
            instruction: instruction.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn mint(mint: Pubkey, reason: impl std::fmt::Display) -> Self {
        Self::MintResolution {
            mint,
            reason: reason.to_string(),
        }
    }
}
