//! Client for the TipLink escrow program.
//!
//! Decodes escrow instructions out of confirmed transactions, rebuilds the full
//! deposit / withdraw history of an escrow PDA, moves that history to and from its
//! JSON transport form, and builds deposit and withdraw transactions.
//!
//! ```no_run
//! use solana_client::nonblocking::rpc_client::RpcClient;
//! use tiplink_escrow::{aggregate_history, EscrowConfig, EscrowContext, RpcLedger};
//!
//! # async fn run(pda: solana_sdk::pubkey::Pubkey) -> tiplink_escrow::Result<()> {
//! let config = EscrowConfig::from_env()?;
//! let ledger = RpcLedger::new(
//!     RpcClient::new("https://api.mainnet-beta.solana.com".to_string()),
//!     config.retry.clone(),
//! );
//! let ctx = EscrowContext::new(ledger, config)?;
//! for recorded in aggregate_history(&ctx, &pda).await? {
//!     println!("{} {:?}", recorded.slot, recorded.action);
//! }
//! # Ok(())
//! # }
//! ```
pub mod action;
pub mod cache_client;
pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod escrow_link;
pub mod history;
pub mod idl;
pub mod ledger;
pub mod link;
pub mod serialize;
pub mod state;
pub mod walker;

pub use action::{sort_most_recent_first, EscrowAction, EscrowMint, RecordedEscrowAction};
pub use cache_client::{HistoryCacheClient, HistoryKey};
pub use config::{EscrowConfig, RetryConfig, RpcSettings, PRIORITY_FEE_LAMPORTS};
pub use context::EscrowContext;
pub use decode::decode_instruction;
pub use error::{EscrowError, Result};
pub use escrow_link::{
    find_escrow_pda, CreateEscrowArgs, EmailSource, EscrowTipLink, ReceiverSource,
};
pub use history::{aggregate_history, aggregate_history_with_delay};
pub use idl::{EscrowIdl, EscrowInstructionKind};
pub use ledger::{EscrowLedger, RpcLedger, TransactionSubmitter};
pub use link::{EnclaveClient, ReceiverLinkService};
pub use serialize::{
    deserialize_recorded_actions, serialize_recorded_actions, SerializedEscrowAction,
    SerializedRecordedAction,
};
pub use state::{get_receiver_link, probe_escrow, EscrowLamports, EscrowProbe, EscrowSpl};
pub use walker::walk_transaction;

use solana_program::pubkey::Pubkey;

anchor_lang::declare_id!("8TqqugH88U3fDEWeKHqBSxZKeqoRrXkdpy3ciX5GAruK");

/// Receives the escrow program's fees.
pub const TREASURY: Pubkey = solana_program::pubkey!("BGZMcTjyTCbkRszC1CBpFpP9CbVh3Ah2ZhjzCsc9PsAr");

/// First seed of every escrow PDA, followed by the escrow id and the depositor.
pub const PDA_SEED: &[u8] = b"escrow";
