use solana_sdk::clock::{Slot, UnixTimestamp};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use spl_token::state::Mint;
use std::cmp::Ordering;

/// A token mint together with the address it was read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscrowMint {
    pub address: Pubkey,
    pub mint: Mint,
}

impl EscrowMint {
    pub fn decimals(&self) -> u8 {
        self.mint.decimals
    }
}

/// What a single escrow instruction did.
///
/// Amounts are in the smallest unit: lamports, or token base units per the mint's decimals.
#[derive(Debug, Clone, PartialEq)]
pub enum EscrowAction {
    DepositLamport {
        depositor: Pubkey,
        pda: Pubkey,
        receiver_address: Pubkey,
        amount: u64,
    },
    WithdrawLamport {
        authority: Pubkey,
        destination: Pubkey,
        pda: Pubkey,
    },
    DepositSpl {
        depositor: Pubkey,
        pda: Pubkey,
        receiver_address: Pubkey,
        amount: u64,
        mint: EscrowMint,
    },
    WithdrawSpl {
        authority: Pubkey,
        destination: Pubkey,
        pda: Pubkey,
        mint: EscrowMint,
    },
}

impl EscrowAction {
    pub fn pda(&self) -> &Pubkey {
        match self {
            EscrowAction::DepositLamport { pda, .. }
            | EscrowAction::WithdrawLamport { pda, .. }
            | EscrowAction::DepositSpl { pda, .. }
            | EscrowAction::WithdrawSpl { pda, .. } => pda,
        }
    }

    pub fn mint(&self) -> Option<&EscrowMint> {
        match self {
            EscrowAction::DepositSpl { mint, .. } | EscrowAction::WithdrawSpl { mint, .. } => {
                Some(mint)
            }
            _ => None,
        }
    }

    pub fn is_deposit(&self) -> bool {
        matches!(
            self,
            EscrowAction::DepositLamport { .. } | EscrowAction::DepositSpl { .. }
        )
    }
}

/// An [EscrowAction] and where on the ledger it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEscrowAction {
    pub slot: Slot,
    /// Informational only. Too coarse to order by.
    pub block_time: Option<UnixTimestamp>,
    pub transaction_signature: Signature,
    pub outer_instruction_index: u8,
    /// Set when the action ran inside a cross-program invocation
    /// of the outer instruction.
    pub inner_instruction_index: Option<u8>,
    pub action: EscrowAction,
}

impl RecordedEscrowAction {
    /// Most recent first: slot, then outer instruction, then inner instruction, all descending.
    ///
    /// An outer-level action sorts after the inner actions of the same outer instruction.
    /// Actions that still compare equal (distinct transactions in one slot at the same
    /// position) have no recoverable order and compare `Equal`.
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        other
            .slot
            .cmp(&self.slot)
            .then_with(|| other.outer_instruction_index.cmp(&self.outer_instruction_index))
            .then_with(|| other.inner_instruction_index.cmp(&self.inner_instruction_index))
    }
}

/// Sort actions most recent first. The sort is stable, so ties keep their input order.
pub fn sort_most_recent_first(actions: &mut [RecordedEscrowAction]) {
    actions.sort_by(RecordedEscrowAction::recency_cmp);
}
