use crate::error::TransactionViewError;
use solana_program::instruction::CompiledInstruction;
use solana_sdk::bs58;
use solana_sdk::pubkey::Pubkey;
use solana_transaction_status::{UiCompiledInstruction, UiInstruction};
use std::borrow::Cow;

/// Instruction payload as the ledger hands it back.
///
/// Top-level instructions come out of the decoded message as raw bytes,
/// while inner instructions arrive in the status metadata as base58 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionData {
    Bytes(Vec<u8>),
    Base58(String),
}

impl InstructionData {
    /// The payload bytes, decoding base58 text on demand.
    pub fn to_bytes(&self) -> Result<Cow<'_, [u8]>, TransactionViewError> {
        match self {
            InstructionData::Bytes(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
            InstructionData::Base58(text) => bs58::decode(text)
                .into_vec()
                .map(Cow::Owned)
                .map_err(|_| TransactionViewError::InvalidBase58(text.clone())),
        }
    }
}

/// A compiled instruction whose program and accounts are indices into the
/// transaction's resolved account-key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: InstructionData,
}

impl RawInstruction {
    pub fn program_id<'a>(&self, account_keys: &'a [Pubkey]) -> Option<&'a Pubkey> {
        account_keys.get(self.program_id_index as usize)
    }

    /// Resolve the account passed at `position` in this instruction's account list.
    /// `None` if the instruction has fewer accounts, or the index falls outside the table.
    pub fn account(&self, position: usize, account_keys: &[Pubkey]) -> Option<Pubkey> {
        let idx = *self.accounts.get(position)?;
        account_keys.get(idx as usize).copied()
    }
}

impl From<&CompiledInstruction> for RawInstruction {
    fn from(ix: &CompiledInstruction) -> Self {
        Self {
            program_id_index: ix.program_id_index,
            accounts: ix.accounts.clone(),
            data: InstructionData::Bytes(ix.data.clone()),
        }
    }
}

impl From<UiCompiledInstruction> for RawInstruction {
    fn from(ix: UiCompiledInstruction) -> Self {
        Self {
            program_id_index: ix.program_id_index,
            accounts: ix.accounts,
            data: InstructionData::Base58(ix.data),
        }
    }
}

impl RawInstruction {
    /// Convert one entry of an inner-instruction group. `group` is only used for error reporting.
    pub fn try_from_ui(ix: UiInstruction, group: u8) -> Result<Self, TransactionViewError> {
        match ix {
            UiInstruction::Compiled(ix) => Ok(ix.into()),
            UiInstruction::Parsed(_) => {
                Err(TransactionViewError::UnsupportedInnerInstructionEncoding(group))
            }
        }
    }
}
