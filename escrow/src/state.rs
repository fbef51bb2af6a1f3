//! Live escrow records, as the program stores them in the PDA.
//!
//! A record exists only while funds are escrowed. Once withdrawn the PDA is closed,
//! and only the history tells a withdrawn escrow apart from one that never existed.
use crate::action::EscrowMint;
use crate::context::EscrowContext;
use crate::error::{EscrowError, Result};
use crate::ledger::EscrowLedger;
use anchor_lang::prelude::*;
use anchor_lang::{AccountDeserialize, Discriminator};
use log::{debug, warn};

#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct EscrowLamports {
    pub amount: u64,
    pub depositor: Pubkey,
    pub escrow_id: Pubkey,
    pub tiplink: Pubkey,
}

#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct EscrowSpl {
    pub amount: u64,
    pub depositor: Pubkey,
    pub escrow_id: Pubkey,
    pub tiplink: Pubkey,
    pub mint: Pubkey,
}

/// What lives at an escrow PDA right now.
#[derive(Debug, Clone, PartialEq)]
pub enum EscrowProbe {
    NotFound,
    Lamport(EscrowLamports),
    Spl(EscrowSpl, EscrowMint),
}

impl EscrowProbe {
    pub fn receiver_link(&self) -> Option<Pubkey> {
        match self {
            EscrowProbe::NotFound => None,
            EscrowProbe::Lamport(record) => Some(record.tiplink),
            EscrowProbe::Spl(record, _) => Some(record.tiplink),
        }
    }
}

/// Read the live record at `pda`, telling the two record shapes apart by their
/// account discriminator. The mint of an SPL record is read fresh from the ledger.
pub async fn probe_escrow<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    pda: &Pubkey,
) -> Result<EscrowProbe> {
    let Some(account) = ctx.ledger().get_account(pda).await? else {
        debug!("no account at {}", pda);
        return Ok(EscrowProbe::NotFound);
    };
    if account.owner != ctx.config().program_id {
        debug!("{} is owned by {}, not the escrow program", pda, account.owner);
        return Ok(EscrowProbe::NotFound);
    }

    let data = account.data.as_slice();
    if data.starts_with(&EscrowLamports::DISCRIMINATOR) {
        let record = read_record::<EscrowLamports>("EscrowLamports", data)?;
        return Ok(EscrowProbe::Lamport(record));
    }
    if data.starts_with(&EscrowSpl::DISCRIMINATOR) {
        let record = read_record::<EscrowSpl>("EscrowSpl", data)?;
        let mint = ctx.fetch_mint(&record.mint).await?;
        return Ok(EscrowProbe::Spl(record, mint));
    }
    warn!("{} is owned by the escrow program but holds no escrow record", pda);
    Ok(EscrowProbe::NotFound)
}

fn read_record<T: AccountDeserialize>(name: &str, mut data: &[u8]) -> Result<T> {
    T::try_deserialize(&mut data).map_err(|e| EscrowError::schema(name, e))
}

/// The capability-link address allowed to withdraw from the live escrow at `pda`.
pub async fn get_receiver_link<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    pda: &Pubkey,
) -> Result<Option<Pubkey>> {
    Ok(probe_escrow(ctx, pda).await?.receiver_link())
}
