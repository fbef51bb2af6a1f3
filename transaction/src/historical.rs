use crate::error::TransactionViewError;
use crate::instruction::RawInstruction;
use solana_program::message::v0::LoadedAddresses;
use solana_program::message::VersionedMessage;
use solana_sdk::clock::{Slot, UnixTimestamp};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransactionWithStatusMeta,
    UiInnerInstructions, UiLoadedAddresses, UiTransactionStatusMeta,
};
use std::str::FromStr;

/// The instructions a program issued while executing one top-level instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstructionGroup {
    /// Position of the top-level instruction that triggered these invocations.
    pub index: u8,
    pub instructions: Vec<RawInstruction>,
}

/// A confirmed transaction together with the execution metadata the runtime recorded for it.
///
/// Inner instructions and loaded addresses are not part of the transaction message,
/// so they are pulled from the status metadata returned by `getTransaction`.
#[derive(Debug, Clone)]
pub struct HistoricalTransaction {
    pub signature: Signature,
    pub slot: Slot,
    pub block_time: Option<UnixTimestamp>,
    /// Set when the transaction landed but failed on chain.
    pub execution_error: Option<TransactionError>,
    pub message: VersionedMessage,
    pub loaded_addresses: LoadedAddresses,
    /// In the order the runtime reported them. Top-level instructions without
    /// any invocations have no group.
    pub inner_instructions: Vec<InnerInstructionGroup>,
    /// `false` when the node returned no status metadata at all.
    pub has_meta: bool,
}

impl HistoricalTransaction {
    pub fn from_encoded(
        signature: Signature,
        value: EncodedConfirmedTransactionWithStatusMeta,
    ) -> Result<Self, TransactionViewError> {
        let EncodedConfirmedTransactionWithStatusMeta {
            slot,
            block_time,
            transaction:
                EncodedTransactionWithStatusMeta {
                    transaction, meta, ..
                },
        } = value;
        let has_meta = meta.is_some();
        let (execution_error, inner_instructions, loaded_addresses) =
            if let Some(UiTransactionStatusMeta {
                err,
                inner_instructions,
                loaded_addresses,
                ..
            }) = meta
            {
                let inner_instructions: Option<Vec<UiInnerInstructions>> =
                    inner_instructions.into();
                let loaded_addresses: Option<UiLoadedAddresses> = loaded_addresses.into();
                (
                    err,
                    extract_inner_instruction_groups(inner_instructions.unwrap_or_default())?,
                    loaded_addresses
                        .map(parse_loaded_addresses)
                        .transpose()?
                        .unwrap_or_default(),
                )
            } else {
                (None, vec![], LoadedAddresses::default())
            };
        let transaction = transaction
            .decode()
            .ok_or(TransactionViewError::Undecodable(signature))?;
        Ok(Self {
            signature,
            slot,
            block_time,
            execution_error,
            message: transaction.message,
            loaded_addresses,
            inner_instructions,
            has_meta,
        })
    }

    pub fn failed(&self) -> bool {
        self.execution_error.is_some()
    }

    /// The full account-key table that compiled instruction indices point into:
    /// the message's static keys, then addresses loaded from lookup tables,
    /// all writable ones before all read-only ones.
    pub fn account_keys(&self) -> Vec<Pubkey> {
        let static_keys = self.message.static_account_keys();
        let mut keys = Vec::with_capacity(
            static_keys.len()
                + self.loaded_addresses.writable.len()
                + self.loaded_addresses.readonly.len(),
        );
        keys.extend_from_slice(static_keys);
        keys.extend_from_slice(&self.loaded_addresses.writable);
        keys.extend_from_slice(&self.loaded_addresses.readonly);
        keys
    }

    pub fn outer_instructions(&self) -> Vec<RawInstruction> {
        self.message
            .instructions()
            .iter()
            .map(RawInstruction::from)
            .collect()
    }
}

/// Convert the metadata's inner instructions to [InnerInstructionGroup]s, keeping their order.
pub fn extract_inner_instruction_groups(
    ui_inner_instructions: Vec<UiInnerInstructions>,
) -> Result<Vec<InnerInstructionGroup>, TransactionViewError> {
    ui_inner_instructions
        .into_iter()
        .map(|group| {
            let index = group.index;
            Ok(InnerInstructionGroup {
                index,
                instructions: group
                    .instructions
                    .into_iter()
                    .map(|ix| RawInstruction::try_from_ui(ix, index))
                    .collect::<Result<_, _>>()?,
            })
        })
        .collect()
}

fn parse_loaded_addresses(
    ui_loaded_addresses: UiLoadedAddresses,
) -> Result<LoadedAddresses, TransactionViewError> {
    let parse = |addrs: Vec<String>| {
        addrs
            .into_iter()
            .map(|s| {
                Pubkey::from_str(&s).map_err(|_| TransactionViewError::InvalidLoadedAddress(s))
            })
            .collect::<Result<Vec<_>, _>>()
    };
    Ok(LoadedAddresses {
        writable: parse(ui_loaded_addresses.writable)?,
        readonly: parse(ui_loaded_addresses.readonly)?,
    })
}
