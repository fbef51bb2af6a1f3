mod common;

use common::*;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::time::Duration;
use tiplink_escrow::history::collect_signatures;
use tiplink_escrow::{
    aggregate_history, aggregate_history_with_delay, EscrowConfig, EscrowContext, EscrowError,
};

fn limited_context(ledger: FakeLedger, limit: usize) -> EscrowContext<FakeLedger> {
    let config = EscrowConfig {
        request_delay_ms: 0,
        signature_page_limit: Some(limit),
        ..Default::default()
    };
    EscrowContext::new(ledger, config).unwrap()
}

#[tokio::test]
async fn pagination_visits_every_signature_once() {
    const N: u64 = 2501;
    let pda = Pubkey::new_unique();
    let (depositor, receiver) = (Pubkey::new_unique(), Pubkey::new_unique());
    let ledger = FakeLedger::with_page_cap(PAGE_CAP);
    for n in 0..N {
        ledger.add_transaction(
            signature(n),
            TxBuilder::new(1_000 + n)
                .outer(initialize_lamport_ix(depositor, pda, receiver, n))
                .build(),
            &[pda],
        );
    }
    let ctx = limited_context(ledger, PAGE_CAP);

    let actions = aggregate_history(&ctx, &pda).await.unwrap();
    assert_eq!(ctx.ledger().page_requests(), 3);
    assert_eq!(actions.len(), N as usize);
    let signatures: HashSet<_> = actions.iter().map(|a| a.transaction_signature).collect();
    assert_eq!(signatures.len(), N as usize);
    assert_eq!(actions[0].slot, 1_000 + N - 1);
    assert_eq!(actions[N as usize - 1].slot, 1_000);
}

#[tokio::test]
async fn without_a_limit_pagination_stops_on_an_empty_page() {
    let pda = Pubkey::new_unique();
    let ledger = FakeLedger::with_page_cap(2);
    for n in 0..5 {
        ledger.add_signature(pda, 100 + n, signature(n));
    }
    let ctx = context(ledger);

    let signatures = collect_signatures(&ctx, &pda).await.unwrap();
    assert_eq!(
        signatures,
        (0..5).rev().map(signature).collect::<Vec<_>>()
    );
    assert_eq!(ctx.ledger().page_requests(), 4);
}

#[tokio::test]
async fn history_is_ordered_and_repeatable() {
    let pda = Pubkey::new_unique();
    let (depositor, receiver, mint) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
    let ledger = FakeLedger::new();
    ledger.set_account(mint, mint_account(6, 10_000));
    ledger.add_transaction(
        signature(1),
        TxBuilder::new(50)
            .outer(initialize_lamport_ix(depositor, pda, receiver, 1))
            .outer(foreign_ix(&[0]))
            .inner(1, initialize_spl_ix(depositor, pda, receiver, mint, 2))
            .inner(1, initialize_spl_ix(depositor, pda, receiver, mint, 3))
            .build(),
        &[pda],
    );
    ledger.add_transaction(
        signature(2),
        TxBuilder::new(60)
            .outer(withdraw_lamport_ix(receiver, receiver, pda))
            .build(),
        &[pda],
    );
    ledger.add_transaction(
        signature(3),
        TxBuilder::new(40)
            .outer(withdraw_spl_ix(depositor, depositor, pda, mint))
            .outer(foreign_ix(&[1]))
            .build(),
        &[pda],
    );
    // Landed but failed: contributes nothing.
    ledger.add_transaction(
        signature(4),
        TxBuilder::new(70)
            .outer(withdraw_lamport_ix(depositor, depositor, pda))
            .failed()
            .build(),
        &[pda],
    );
    let ctx = context(ledger);

    let first = aggregate_history(&ctx, &pda).await.unwrap();
    let positions: Vec<_> = first
        .iter()
        .map(|a| (a.slot, a.outer_instruction_index, a.inner_instruction_index))
        .collect();
    assert_eq!(
        positions,
        vec![
            (60, 0, None),
            (50, 1, Some(1)),
            (50, 1, Some(0)),
            (50, 0, None),
            (40, 0, None),
        ]
    );
    for pair in first.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.slot >= b.slot);
        if a.slot == b.slot {
            assert!(a.outer_instruction_index >= b.outer_instruction_index);
        }
    }

    let second = aggregate_history(&ctx, &pda).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn a_failed_fetch_fails_the_whole_history() {
    let pda = Pubkey::new_unique();
    let ledger = FakeLedger::new();
    for n in 0..3 {
        ledger.add_transaction(
            signature(n),
            TxBuilder::new(n + 1)
                .outer(withdraw_lamport_ix(Pubkey::new_unique(), Pubkey::new_unique(), pda))
                .build(),
            &[pda],
        );
    }
    ledger.make_unavailable(signature(1));
    let ctx = context(ledger);

    assert!(matches!(
        aggregate_history(&ctx, &pda).await,
        Err(EscrowError::Rpc(_))
    ));
}

#[tokio::test]
async fn unknown_address_has_an_empty_history() {
    let ctx = context(FakeLedger::new());
    assert!(aggregate_history(&ctx, &Pubkey::new_unique())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(ctx.ledger().page_requests(), 1);
}

#[tokio::test(start_paused = true)]
async fn transaction_fetches_are_throttled() {
    let pda = Pubkey::new_unique();
    let ledger = FakeLedger::new();
    for n in 0..3 {
        ledger.add_signature(pda, n, signature(n));
    }
    let ctx = context(ledger);

    let delay = Duration::from_millis(400);
    let started = tokio::time::Instant::now();
    aggregate_history_with_delay(&ctx, &pda, delay).await.unwrap();
    assert!(started.elapsed() >= delay * 2);
}
