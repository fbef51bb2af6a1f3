//! The JSON transport form of recorded escrow actions, as stored by the history cache.
//!
//! Addresses travel as base58 text and mints as their address only. Mint metadata is
//! read back from the ledger on every deserialization.
use crate::action::{EscrowAction, RecordedEscrowAction};
use crate::context::EscrowContext;
use crate::error::{EscrowError, Result};
use crate::ledger::EscrowLedger;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::clock::{Slot, UnixTimestamp};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tiplink_escrow_serde::{pubkey, signature};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRecordedAction {
    pub slot: Slot,
    #[serde(default)]
    pub block_time: Option<UnixTimestamp>,
    #[serde(with = "signature")]
    pub tx_sig: Signature,
    pub ix_index: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_ix_index: Option<u8>,
    pub action: SerializedEscrowAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializedEscrowAction {
    #[serde(rename_all = "camelCase")]
    DepositLamport {
        #[serde(with = "pubkey")]
        depositor: Pubkey,
        #[serde(with = "pubkey")]
        pda: Pubkey,
        #[serde(rename = "receiverTipLink", with = "pubkey")]
        receiver_address: Pubkey,
        amount: u64,
    },
    #[serde(rename_all = "camelCase")]
    WithdrawLamport {
        #[serde(with = "pubkey")]
        authority: Pubkey,
        #[serde(with = "pubkey")]
        destination: Pubkey,
        #[serde(with = "pubkey")]
        pda: Pubkey,
    },
    #[serde(rename_all = "camelCase")]
    DepositSpl {
        #[serde(with = "pubkey")]
        depositor: Pubkey,
        #[serde(with = "pubkey")]
        pda: Pubkey,
        #[serde(rename = "receiverTipLink", with = "pubkey")]
        receiver_address: Pubkey,
        amount: u64,
        #[serde(with = "pubkey")]
        mint: Pubkey,
    },
    #[serde(rename_all = "camelCase")]
    WithdrawSpl {
        #[serde(with = "pubkey")]
        authority: Pubkey,
        #[serde(with = "pubkey")]
        destination: Pubkey,
        #[serde(with = "pubkey")]
        pda: Pubkey,
        #[serde(with = "pubkey")]
        mint: Pubkey,
    },
}

impl SerializedEscrowAction {
    /// Every `type` tag the transport form may carry.
    pub const TYPES: [&'static str; 4] = ["DepositLamport", "WithdrawLamport", "DepositSpl", "WithdrawSpl"];
}

impl From<&EscrowAction> for SerializedEscrowAction {
    fn from(action: &EscrowAction) -> Self {
        match *action {
            EscrowAction::DepositLamport {
                depositor,
                pda,
                receiver_address,
                amount,
            } => Self::DepositLamport {
                depositor,
                pda,
                receiver_address,
                amount,
            },
            EscrowAction::WithdrawLamport {
                authority,
                destination,
                pda,
            } => Self::WithdrawLamport {
                authority,
                destination,
                pda,
            },
            EscrowAction::DepositSpl {
                depositor,
                pda,
                receiver_address,
                amount,
                ref mint,
            } => Self::DepositSpl {
                depositor,
                pda,
                receiver_address,
                amount,
                mint: mint.address,
            },
            EscrowAction::WithdrawSpl {
                authority,
                destination,
                pda,
                ref mint,
            } => Self::WithdrawSpl {
                authority,
                destination,
                pda,
                mint: mint.address,
            },
        }
    }
}

impl From<&RecordedEscrowAction> for SerializedRecordedAction {
    fn from(recorded: &RecordedEscrowAction) -> Self {
        Self {
            slot: recorded.slot,
            block_time: recorded.block_time,
            tx_sig: recorded.transaction_signature,
            ix_index: recorded.outer_instruction_index,
            inner_ix_index: recorded.inner_instruction_index,
            action: (&recorded.action).into(),
        }
    }
}

pub fn serialize_recorded_actions(actions: &[RecordedEscrowAction]) -> Vec<SerializedRecordedAction> {
    actions.iter().map(Into::into).collect()
}

/// Parse a JSON array of transport-form actions.
///
/// An action whose `type` is not one of [SerializedEscrowAction::TYPES] is an
/// [EscrowError::UnknownActionType] rather than a generic parse error.
pub fn parse_transport_form(value: Value) -> Result<Vec<SerializedRecordedAction>> {
    let items: Vec<Value> = serde_json::from_value(value)?;
    items
        .into_iter()
        .map(|item| {
            if let Some(tag) = item.pointer("/action/type").and_then(Value::as_str) {
                if !SerializedEscrowAction::TYPES.contains(&tag) {
                    return Err(EscrowError::UnknownActionType(tag.to_string()));
                }
            }
            Ok(serde_json::from_value(item)?)
        })
        .collect()
}

/// Rebuild recorded actions from their transport form.
/// The mint of every SPL action is fetched fresh from the ledger.
pub async fn deserialize_recorded_actions<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    serialized: Vec<SerializedRecordedAction>,
) -> Result<Vec<RecordedEscrowAction>> {
    try_join_all(
        serialized
            .into_iter()
            .map(|s| deserialize_recorded_action(ctx, s)),
    )
    .await
}

async fn deserialize_recorded_action<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    serialized: SerializedRecordedAction,
) -> Result<RecordedEscrowAction> {
    let action = match serialized.action {
        SerializedEscrowAction::DepositLamport {
            depositor,
            pda,
            receiver_address,
            amount,
        } => EscrowAction::DepositLamport {
            depositor,
            pda,
            receiver_address,
            amount,
        },
        SerializedEscrowAction::WithdrawLamport {
            authority,
            destination,
            pda,
        } => EscrowAction::WithdrawLamport {
            authority,
            destination,
            pda,
        },
        SerializedEscrowAction::DepositSpl {
            depositor,
            pda,
            receiver_address,
            amount,
            mint,
        } => EscrowAction::DepositSpl {
            depositor,
            pda,
            receiver_address,
            amount,
            mint: ctx.fetch_mint(&mint).await?,
        },
        SerializedEscrowAction::WithdrawSpl {
            authority,
            destination,
            pda,
            mint,
        } => EscrowAction::WithdrawSpl {
            authority,
            destination,
            pda,
            mint: ctx.fetch_mint(&mint).await?,
        },
    };
    Ok(RecordedEscrowAction {
        slot: serialized.slot,
        block_time: serialized.block_time,
        transaction_signature: serialized.tx_sig,
        outer_instruction_index: serialized.ix_index,
        inner_instruction_index: serialized.inner_ix_index,
        action,
    })
}
