pub mod error;
pub mod historical;
pub mod instruction;

pub use error::TransactionViewError;
pub use historical::{HistoricalTransaction, InnerInstructionGroup};
pub use instruction::{InstructionData, RawInstruction};

use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;

/// Turns a bundle of instructions into an unsigned transaction, ready to be
/// handed to a wallet for signing.
/// Any type `T` where `&T: Into<Vec<Instruction>>` implements this trait.
pub trait TransactionSchema {
    /// Return the instructions.
    fn instructions(&self) -> Vec<Instruction>;

    /// Return an unsigned legacy transaction with no recent blockhash set.
    fn unsigned_transaction(&self, payer: Option<&Pubkey>) -> Transaction {
        Transaction::new_unsigned(Message::new(&self.instructions(), payer))
    }

    /// Return the unsigned message, serialized.
    /// Good for sending over the wire to request a signature.
    fn unsigned_serialized(&self, payer: Option<&Pubkey>) -> Vec<u8> {
        self.unsigned_transaction(payer).message.serialize()
    }

    fn programs(&self) -> Vec<Pubkey> {
        self.instructions()
            .into_iter()
            .map(|ix| ix.program_id)
            .collect()
    }
}

impl<T: ?Sized> TransactionSchema for T
where
    for<'a> &'a T: Into<Vec<Instruction>>,
{
    fn instructions(&self) -> Vec<Instruction> {
        self.into()
    }
}
