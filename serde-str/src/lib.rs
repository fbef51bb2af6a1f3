//! Ledger addresses and transaction signatures serialize to byte arrays by default.
//! Cached escrow history and backend responses carry them as base58 text instead,
//! so these adaptors (de-)serialize [Pubkey] and [Signature] to and from base58 strings.
//!
//! Usage:
//!
//! ```
//! use solana_sdk::pubkey::Pubkey;
//! use solana_sdk::signature::Signature;
//! use tiplink_escrow_serde::{pubkey, signature};
//!
//! #[derive(serde::Serialize, serde::Deserialize)]
//! pub struct Deposit {
//!     #[serde(with = "pubkey")]
//!     pub pda: Pubkey,
//!     #[serde(rename = "txSig", with = "signature")]
//!     pub tx_sig: Signature,
//! }
//! ```
pub mod error;
pub mod pubkey;
pub mod signature;
