//! The escrow program's interface description.
//!
//! Instruction discriminators, account order and signer / writable flags all come
//! from the Anchor IDL shipped with this crate, so decoding and building instructions
//! never relies on hard-coded account positions.
pub mod discriminator;

use crate::error::{EscrowError, Result};
use anchor_syn::idl::types::{Idl, IdlAccountItem, IdlInstruction};
use discriminator::Discriminator;
use solana_program::instruction::AccountMeta;
use solana_program::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::ops::Deref;

const BUNDLED_IDL: &str = include_str!("tiplink_escrow.json");

/// The four escrow instructions this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EscrowInstructionKind {
    InitializeLamport,
    WithdrawLamport,
    InitializeSpl,
    WithdrawSpl,
}

impl EscrowInstructionKind {
    pub const ALL: [EscrowInstructionKind; 4] = [
        Self::InitializeLamport,
        Self::WithdrawLamport,
        Self::InitializeSpl,
        Self::WithdrawSpl,
    ];

    pub fn idl_name(&self) -> &'static str {
        match self {
            Self::InitializeLamport => "initializeLamport",
            Self::WithdrawLamport => "withdrawLamport",
            Self::InitializeSpl => "initializeSpl",
            Self::WithdrawSpl => "withdrawSpl",
        }
    }
}

/// One account slot of an instruction, flattened out of any nested account groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSlot {
    pub name: String,
    pub is_mut: bool,
    pub is_signer: bool,
}

#[derive(Debug, Clone)]
pub struct InstructionLayout {
    pub kind: EscrowInstructionKind,
    pub discriminator: Discriminator,
    pub accounts: Vec<AccountSlot>,
}

impl InstructionLayout {
    fn from_idl(kind: EscrowInstructionKind, ix: &IdlInstruction) -> Self {
        let mut accounts = vec![];
        flatten_accounts(&ix.accounts, &mut accounts);
        Self {
            kind,
            discriminator: discriminator::ix_discriminator(&ix.name),
            accounts,
        }
    }

    /// Position of the named account in the instruction's account list.
    pub fn position(&self, name: &str) -> Result<usize> {
        self.accounts
            .iter()
            .position(|slot| slot.name == name)
            .ok_or_else(|| {
                EscrowError::Idl(format!(
                    "instruction {} has no account named {}",
                    self.kind.idl_name(),
                    name
                ))
            })
    }

    /// Build account metas in IDL order, looking each slot up by name in `accounts`.
    pub fn account_metas(&self, accounts: &[(&str, Pubkey)]) -> Result<Vec<AccountMeta>> {
        self.accounts
            .iter()
            .map(|slot| {
                let pubkey = accounts
                    .iter()
                    .find(|(name, _)| *name == slot.name)
                    .map(|(_, pubkey)| *pubkey)
                    .ok_or_else(|| EscrowError::MissingAccount {
                        instruction: self.kind.idl_name().to_string(),
                        account: slot.name.clone(),
                    })?;
                Ok(AccountMeta {
                    pubkey,
                    is_signer: slot.is_signer,
                    is_writable: slot.is_mut,
                })
            })
            .collect()
    }
}

fn flatten_accounts(items: &[IdlAccountItem], out: &mut Vec<AccountSlot>) {
    for item in items {
        match item {
            IdlAccountItem::IdlAccount(act) => out.push(AccountSlot {
                name: act.name.clone(),
                is_mut: act.is_mut,
                is_signer: act.is_signer,
            }),
            IdlAccountItem::IdlAccounts(nested) => flatten_accounts(&nested.accounts, out),
        }
    }
}

/// A parsed escrow IDL with its instruction layouts indexed by discriminator.
#[derive(Debug, Clone)]
pub struct EscrowIdl {
    idl: Idl,
    layouts: BTreeMap<EscrowInstructionKind, InstructionLayout>,
    by_discriminator: BTreeMap<Discriminator, EscrowInstructionKind>,
}

impl EscrowIdl {
    /// The IDL of the deployed escrow program, compiled into this crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_IDL)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let idl: Idl = serde_json::from_str(json)
            .map_err(|e| EscrowError::Idl(format!("could not parse IDL JSON: {e}")))?;
        Self::from_idl(idl)
    }

    /// Fails if any of the four escrow instructions is missing from `idl`.
    pub fn from_idl(idl: Idl) -> Result<Self> {
        let mut layouts = BTreeMap::new();
        let mut by_discriminator = BTreeMap::new();
        for kind in EscrowInstructionKind::ALL {
            let ix = idl
                .instructions
                .iter()
                .find(|ix| ix.name == kind.idl_name())
                .ok_or_else(|| {
                    EscrowError::Idl(format!("missing instruction {}", kind.idl_name()))
                })?;
            let layout = InstructionLayout::from_idl(kind, ix);
            by_discriminator.insert(layout.discriminator, kind);
            layouts.insert(kind, layout);
        }
        Ok(Self {
            idl,
            layouts,
            by_discriminator,
        })
    }

    pub fn layout(&self, kind: EscrowInstructionKind) -> &InstructionLayout {
        &self.layouts[&kind]
    }

    /// Match instruction data against the known discriminators.
    /// Returns the layout and the argument bytes that follow the discriminator,
    /// or `None` for data that is not an escrow instruction.
    pub fn match_instruction<'d>(&self, data: &'d [u8]) -> Option<(&InstructionLayout, &'d [u8])> {
        let (disc, args) = discriminator::split_discriminator(data)?;
        let kind = self.by_discriminator.get(&disc)?;
        Some((self.layout(*kind), args))
    }
}

impl Deref for EscrowIdl {
    type Target = Idl;

    fn deref(&self) -> &Self::Target {
        &self.idl
    }
}
