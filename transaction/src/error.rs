use solana_sdk::signature::Signature;
use thiserror::Error;

/// Ledger payloads that cannot be turned into a [crate::historical::HistoricalTransaction].
#[derive(Debug, Error)]
pub enum TransactionViewError {
    #[error("transaction {0} could not be decoded from its binary encoding")]
    Undecodable(Signature),
    #[error("loaded address {0} is not a valid public key")]
    InvalidLoadedAddress(String),
    #[error("instruction data is not valid base58: {0}")]
    InvalidBase58(String),
    #[error("inner instruction group {0} is not in compiled form; request base64 or base58 encoding")]
    UnsupportedInnerInstructionEncoding(u8),
}
