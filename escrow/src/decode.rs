//! Turn one compiled instruction into an [EscrowAction].
use crate::action::EscrowAction;
use crate::context::EscrowContext;
use crate::error::{EscrowError, Result};
use crate::idl::{EscrowInstructionKind, InstructionLayout};
use crate::ledger::EscrowLedger;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;
use tiplink_escrow_tx::RawInstruction;

/// Arguments of `initializeLamport` and `initializeSpl`, in their Borsh layout.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeArgs {
    pub amount: u64,
    pub escrow_id: Pubkey,
}

/// Decode `ix` against the escrow program's interface.
///
/// `Ok(None)` when the instruction belongs to another program or carries an unknown
/// discriminator. A recognized instruction with a malformed payload or too few accounts
/// is a [EscrowError::SchemaMismatch]. SPL variants resolve their mint through `ctx`,
/// and a mint that cannot be resolved fails the decode.
pub async fn decode_instruction<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    ix: &RawInstruction,
    account_keys: &[Pubkey],
) -> Result<Option<EscrowAction>> {
    match ix.program_id(account_keys) {
        Some(program_id) if *program_id == ctx.config().program_id => {}
        _ => return Ok(None),
    }
    let data = ix.data.to_bytes()?;
    let Some((layout, args)) = ctx.idl().match_instruction(&data) else {
        return Ok(None);
    };
    let accounts = AccountResolver {
        layout,
        ix,
        account_keys,
    };

    let action = match layout.kind {
        EscrowInstructionKind::InitializeLamport => {
            let args = decode_initialize_args(layout, args)?;
            EscrowAction::DepositLamport {
                depositor: accounts.get("depositor")?,
                pda: accounts.get("pda")?,
                receiver_address: accounts.get("tiplink")?,
                amount: args.amount,
            }
        }
        EscrowInstructionKind::WithdrawLamport => EscrowAction::WithdrawLamport {
            authority: accounts.get("authority")?,
            destination: accounts.get("destination")?,
            pda: accounts.get("pda")?,
        },
        EscrowInstructionKind::InitializeSpl => {
            let args = decode_initialize_args(layout, args)?;
            let depositor = accounts.get("depositor")?;
            let pda = accounts.get("pda")?;
            let receiver_address = accounts.get("tiplink")?;
            let mint = ctx.resolve_mint(&accounts.get("mint")?).await?;
            EscrowAction::DepositSpl {
                depositor,
                pda,
                receiver_address,
                amount: args.amount,
                mint,
            }
        }
        EscrowInstructionKind::WithdrawSpl => {
            let authority = accounts.get("authority")?;
            let destination = accounts.get("destination")?;
            let pda = accounts.get("pda")?;
            let mint = ctx.resolve_mint(&accounts.get("mint")?).await?;
            EscrowAction::WithdrawSpl {
                authority,
                destination,
                pda,
                mint,
            }
        }
    };
    Ok(Some(action))
}

fn decode_initialize_args(layout: &InstructionLayout, mut args: &[u8]) -> Result<InitializeArgs> {
    BorshDeserialize::deserialize(&mut args)
        .map_err(|e| EscrowError::schema(layout.kind.idl_name(), format!("bad arguments: {e}")))
}

struct AccountResolver<'a> {
    layout: &'a InstructionLayout,
    ix: &'a RawInstruction,
    account_keys: &'a [Pubkey],
}

impl AccountResolver<'_> {
    fn get(&self, name: &str) -> Result<Pubkey> {
        let position = self.layout.position(name)?;
        self.ix
            .account(position, self.account_keys)
            .ok_or_else(|| {
                EscrowError::schema(
                    self.layout.kind.idl_name(),
                    format!("no {name} account at position {position}"),
                )
            })
    }
}
