//! Rebuild the complete action history of an escrow PDA from the ledger.
use crate::action::{sort_most_recent_first, RecordedEscrowAction};
use crate::context::EscrowContext;
use crate::error::{EscrowError, Result};
use crate::ledger::EscrowLedger;
use crate::walker::walk_transaction;
use log::{debug, info, warn};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;

/// Every escrow action that touched `pda`, most recent first,
/// pausing for the configured request delay between transaction fetches.
pub async fn aggregate_history<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    pda: &Pubkey,
) -> Result<Vec<RecordedEscrowAction>> {
    aggregate_history_with_delay(ctx, pda, ctx.config().request_delay()).await
}

/// [aggregate_history] with an explicit pause between transaction fetches.
///
/// Transactions are fetched one at a time. Any failed fetch fails the whole call,
/// so a returned history is never silently incomplete.
pub async fn aggregate_history_with_delay<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    pda: &Pubkey,
    delay: Duration,
) -> Result<Vec<RecordedEscrowAction>> {
    let signatures = collect_signatures(ctx, pda).await?;
    info!(
        "rebuilding history of {} from {} transactions",
        pda,
        signatures.len()
    );

    let mut actions = vec![];
    for (i, signature) in signatures.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            sleep(delay).await;
        }
        let recorded = walk_transaction(ctx, signature).await?;
        debug!("{}: {} escrow actions", signature, recorded.len());
        actions.extend(recorded);
    }

    sort_most_recent_first(&mut actions);
    info!("{} escrow actions found for {}", actions.len(), pda);
    Ok(actions)
}

/// Follow the `before` cursor until the ledger runs out of signatures, newest first.
pub async fn collect_signatures<L: EscrowLedger>(
    ctx: &EscrowContext<L>,
    address: &Pubkey,
) -> Result<Vec<Signature>> {
    let limit = ctx.config().signature_page_limit;
    let mut signatures = vec![];
    let mut seen = HashSet::new();
    let mut before = None;
    loop {
        let page = ctx
            .ledger()
            .get_signatures_for_address(address, before, limit)
            .await?;
        debug!(
            "signature page before {:?}: {} entries",
            before.map(|s: Signature| s.to_string()),
            page.len()
        );
        if page.is_empty() {
            break;
        }
        let page_len = page.len();
        for status in page {
            let signature = Signature::from_str(&status.signature)
                .map_err(|_| EscrowError::InvalidSignature(status.signature))?;
            if seen.insert(signature) {
                signatures.push(signature);
            } else {
                warn!("signature {} returned more than once for {}", signature, address);
            }
            before = Some(signature);
        }
        if matches!(limit, Some(limit) if page_len < limit) {
            break;
        }
    }
    Ok(signatures)
}
