//! Escrow TipLinks: funds held by the escrow program until the emailed receiver
//! link or the original depositor withdraws them.
//!
//! This module only builds transactions. Who may withdraw is enforced on chain.
use crate::action::EscrowMint;
use crate::context::EscrowContext;
use crate::decode::InitializeArgs;
use crate::error::{EscrowError, Result};
use crate::idl::{EscrowInstructionKind, InstructionLayout};
use crate::ledger::EscrowLedger;
use crate::link::ReceiverLinkService;
use crate::state::{probe_escrow, EscrowProbe};
use crate::PDA_SEED;
use borsh::BorshSerialize;
use log::debug;
use reqwest::Url;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;
use tiplink_escrow_tx::TransactionSchema;

/// Derive the escrow PDA for `escrow_id` and `depositor`.
pub fn find_escrow_pda(program_id: &Pubkey, escrow_id: &Pubkey, depositor: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[PDA_SEED, escrow_id.as_ref(), depositor.as_ref()],
        program_id,
    )
}

/// Associated token account of `owner`. Off-curve owners (PDAs) are rejected
/// unless `allow_off_curve`.
fn associated_token_address(owner: &Pubkey, mint: &Pubkey, allow_off_curve: bool) -> Result<Pubkey> {
    if !allow_off_curve && !owner.is_on_curve() {
        return Err(EscrowError::OwnerOffCurve(*owner));
    }
    Ok(get_associated_token_address(owner, mint))
}

/// Where the receiver link of a new escrow comes from.
pub enum ReceiverSource<'a> {
    Known(Pubkey),
    /// Have the link service issue a fresh link for the recipient's email.
    Issue(&'a dyn ReceiverLinkService),
}

/// Where the recipient email of an existing escrow comes from.
pub enum EmailSource<'a> {
    Known(String),
    Lookup(&'a dyn ReceiverLinkService),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateEscrowArgs {
    /// Lamports, or token base units for an SPL escrow.
    pub amount: u64,
    pub to_email: String,
    pub depositor: Pubkey,
    /// Set for an SPL escrow.
    pub mint: Option<EscrowMint>,
    /// Token account to deposit from. Defaults to the depositor's associated token account.
    pub depositor_ta: Option<Pubkey>,
    pub allow_depositor_off_curve: bool,
}

/// An escrow the depositor is about to fund, or one that is live on chain.
#[derive(Debug, Clone, PartialEq)]
pub struct EscrowTipLink {
    pub to_email: String,
    pub receiver_link: Pubkey,
    pub amount: u64,
    pub depositor: Pubkey,
    pub escrow_id: Pubkey,
    pub pda: Pubkey,
    pub mint: Option<EscrowMint>,
    /// Only known for escrows built with [EscrowTipLink::create]. A live escrow may have
    /// been funded from any token account.
    pub depositor_ta: Option<Pubkey>,
}

impl EscrowTipLink {
    /// Prepare a new escrow under a fresh random escrow id.
    pub async fn create<L: EscrowLedger>(
        ctx: &EscrowContext<L>,
        args: CreateEscrowArgs,
        receiver: ReceiverSource<'_>,
    ) -> Result<Self> {
        let receiver_link = match receiver {
            ReceiverSource::Known(link) => link,
            ReceiverSource::Issue(service) => service.create_receiver_link(&args.to_email).await?,
        };
        let escrow_id = Keypair::new().pubkey();
        let (pda, _) = find_escrow_pda(&ctx.config().program_id, &escrow_id, &args.depositor);
        let depositor_ta = match (args.depositor_ta, &args.mint) {
            (Some(ta), _) => Some(ta),
            (None, Some(mint)) => Some(associated_token_address(
                &args.depositor,
                &mint.address,
                args.allow_depositor_off_curve,
            )?),
            (None, None) => None,
        };
        debug!("prepared escrow {} for depositor {}", pda, args.depositor);
        Ok(Self {
            to_email: args.to_email,
            receiver_link,
            amount: args.amount,
            depositor: args.depositor,
            escrow_id,
            pda,
            mint: args.mint,
            depositor_ta,
        })
    }

    /// The live escrow at `pda`, or `None` when it has been withdrawn or never funded.
    pub async fn get<L: EscrowLedger>(
        ctx: &EscrowContext<L>,
        pda: &Pubkey,
        email: EmailSource<'_>,
    ) -> Result<Option<Self>> {
        let (amount, depositor, escrow_id, receiver_link, mint) = match probe_escrow(ctx, pda).await? {
            EscrowProbe::NotFound => return Ok(None),
            EscrowProbe::Lamport(record) => {
                (record.amount, record.depositor, record.escrow_id, record.tiplink, None)
            }
            EscrowProbe::Spl(record, mint) => (
                record.amount,
                record.depositor,
                record.escrow_id,
                record.tiplink,
                Some(mint),
            ),
        };
        let to_email = match email {
            EmailSource::Known(email) => email,
            EmailSource::Lookup(service) => service.receiver_email(&receiver_link).await?,
        };
        Ok(Some(Self {
            to_email,
            receiver_link,
            amount,
            depositor,
            escrow_id,
            pda: *pda,
            mint,
            depositor_ta: None,
        }))
    }

    /// Page where the depositor can follow the escrow: the configured base URL with a `pda` query.
    pub fn depositor_url<L: EscrowLedger>(&self, ctx: &EscrowContext<L>) -> Result<Url> {
        let base = &ctx.config().depositor_url;
        let mut url = Url::parse(base).map_err(|e| {
            EscrowError::InvalidConfig(format!("depositor URL {base} is invalid: {e}"))
        })?;
        url.query_pairs_mut().append_pair("pda", &self.pda.to_string());
        Ok(url)
    }

    /// Unsigned transaction funding this escrow, paid for by the depositor.
    pub fn deposit_transaction<L: EscrowLedger>(&self, ctx: &EscrowContext<L>) -> Result<Transaction> {
        let args = InitializeArgs {
            amount: self.amount,
            escrow_id: self.escrow_id,
        };
        let program_id = ctx.config().program_id;
        let treasury = ctx.config().treasury;
        let ix = match &self.mint {
            None => {
                let layout = ctx.idl().layout(EscrowInstructionKind::InitializeLamport);
                let accounts = layout.account_metas(&[
                    ("depositor", self.depositor),
                    ("pda", self.pda),
                    ("treasury", treasury),
                    ("tiplink", self.receiver_link),
                    ("systemProgram", system_program::id()),
                ])?;
                Instruction::new_with_bytes(program_id, &instruction_data(layout, Some(&args))?, accounts)
            }
            Some(mint) => {
                let layout = ctx.idl().layout(EscrowInstructionKind::InitializeSpl);
                let depositor_ta = self.depositor_ta.ok_or_else(|| EscrowError::MissingAccount {
                    instruction: layout.kind.idl_name().to_string(),
                    account: "depositorTa".to_string(),
                })?;
                let accounts = layout.account_metas(&[
                    ("depositor", self.depositor),
                    ("depositorTa", depositor_ta),
                    ("pda", self.pda),
                    ("pdaAta", get_associated_token_address(&self.pda, &mint.address)),
                    ("treasury", treasury),
                    ("tiplink", self.receiver_link),
                    ("mint", mint.address),
                    ("tokenProgram", spl_token::id()),
                    ("associatedTokenProgram", spl_associated_token_account::id()),
                    ("systemProgram", system_program::id()),
                ])?;
                Instruction::new_with_bytes(program_id, &instruction_data(layout, Some(&args))?, accounts)
            }
        };
        Ok(EscrowInstructions(vec![ix]).unsigned_transaction(Some(&self.depositor)))
    }

    /// Unsigned transaction paying the escrow out to `destination`, signed and paid for by `authority`.
    ///
    /// `authority` must be the depositor or the receiver link. For an SPL escrow `destination`
    /// is the owner, and the tokens go to its associated token account.
    pub fn withdraw_transaction<L: EscrowLedger>(
        &self,
        ctx: &EscrowContext<L>,
        authority: &Pubkey,
        destination: &Pubkey,
        allow_destination_off_curve: bool,
    ) -> Result<Transaction> {
        let program_id = ctx.config().program_id;
        let ix = match &self.mint {
            None => {
                let layout = ctx.idl().layout(EscrowInstructionKind::WithdrawLamport);
                let accounts = layout.account_metas(&[
                    ("authority", *authority),
                    ("destination", *destination),
                    ("pda", self.pda),
                ])?;
                Instruction::new_with_bytes(program_id, &instruction_data(layout, None)?, accounts)
            }
            Some(mint) => {
                let layout = ctx.idl().layout(EscrowInstructionKind::WithdrawSpl);
                let destination_ata =
                    associated_token_address(destination, &mint.address, allow_destination_off_curve)?;
                let accounts = layout.account_metas(&[
                    ("authority", *authority),
                    ("destination", *destination),
                    ("destinationAta", destination_ata),
                    ("pda", self.pda),
                    ("pdaAta", get_associated_token_address(&self.pda, &mint.address)),
                    ("mint", mint.address),
                    ("tokenProgram", spl_token::id()),
                    ("associatedTokenProgram", spl_associated_token_account::id()),
                    ("systemProgram", system_program::id()),
                ])?;
                Instruction::new_with_bytes(program_id, &instruction_data(layout, None)?, accounts)
            }
        };
        Ok(EscrowInstructions(vec![ix]).unsigned_transaction(Some(authority)))
    }
}

fn instruction_data(layout: &InstructionLayout, args: Option<&InitializeArgs>) -> Result<Vec<u8>> {
    let mut data = layout.discriminator.to_vec();
    if let Some(args) = args {
        args.serialize(&mut data)
            .map_err(|e| EscrowError::schema(layout.kind.idl_name(), e))?;
    }
    Ok(data)
}

struct EscrowInstructions(Vec<Instruction>);

impl From<&EscrowInstructions> for Vec<Instruction> {
    fn from(bundle: &EscrowInstructions) -> Self {
        bundle.0.clone()
    }
}
