use crate::action::RecordedEscrowAction;
use crate::context::EscrowContext;
use crate::decode::decode_instruction;
use crate::error::Result;
use crate::ledger::EscrowLedger;
use futures_util::future::try_join_all;
use log::{debug, warn};
use solana_sdk::signature::Signature;
use tiplink_escrow_tx::{HistoricalTransaction, RawInstruction};

/// All escrow actions in one transaction, outer instructions first, then inner
/// instructions, each in the order they appear.
///
/// Empty when the ledger does not know the signature or the transaction failed on chain.
pub async fn walk_transaction<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    signature: &Signature,
) -> Result<Vec<RecordedEscrowAction>> {
    let Some(encoded) = ctx.ledger().get_transaction(signature).await? else {
        debug!("transaction {} not found", signature);
        return Ok(vec![]);
    };
    let transaction = HistoricalTransaction::from_encoded(*signature, encoded)?;
    if !transaction.has_meta {
        warn!(
            "transaction {} has no status metadata, inner instructions are unavailable",
            signature
        );
    }
    if transaction.failed() {
        debug!("transaction {} failed on chain, skipping", signature);
        return Ok(vec![]);
    }
    walk_historical_transaction(ctx, &transaction).await
}

/// [walk_transaction] over a transaction that was already fetched.
/// Failed transactions are not filtered here.
pub async fn walk_historical_transaction<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    transaction: &HistoricalTransaction,
) -> Result<Vec<RecordedEscrowAction>> {
    let account_keys = transaction.account_keys();
    let outer = transaction.outer_instructions();

    let mut positions: Vec<(u8, Option<u8>, &RawInstruction)> = (0u8..)
        .zip(outer.iter())
        .map(|(index, ix)| (index, None, ix))
        .collect();
    for group in &transaction.inner_instructions {
        positions.extend(
            (0u8..)
                .zip(group.instructions.iter())
                .map(|(inner, ix)| (group.index, Some(inner), ix)),
        );
    }

    let decoded = try_join_all(
        positions
            .iter()
            .map(|&(_, _, ix)| decode_instruction(ctx, ix, &account_keys)),
    )
    .await?;

    Ok(positions
        .into_iter()
        .zip(decoded)
        .filter_map(|((outer_index, inner_index, _), action)| {
            Some(RecordedEscrowAction {
                slot: transaction.slot,
                block_time: transaction.block_time,
                transaction_signature: transaction.signature,
                outer_instruction_index: outer_index,
                inner_instruction_index: inner_index,
                action: action?,
            })
        })
        .collect())
}
