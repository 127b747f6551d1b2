//! Batch cycle tests: one project's failure never stops the cycle

mod common;

use std::collections::HashSet;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;

use common::{
    test_project, test_settings, BurnBehavior, MemoryLedger, MockBurner, MockOracle, MockSwapper,
};
use flywheel::pipeline::{BatchScheduler, Orchestrator, ProjectCycleResult};
use flywheel::wallet::wallet_address;

#[tokio::test]
async fn cycle_continues_past_a_failing_project() {
    let mint_a = Pubkey::new_unique().to_string();
    let mint_b = Pubkey::new_unique().to_string();
    let ledger = MemoryLedger::with_projects(vec![
        test_project(&mint_a, 1),
        test_project(&mint_b, 2),
    ]);

    // Project A's balance read dies; project B just has too little SOL
    let mut oracle = MockOracle::with_sol(0.01);
    oracle.fail_owners = HashSet::from([wallet_address(common::TEST_SECRET, 1)
        .parse()
        .unwrap()]);

    let orchestrator = Orchestrator::new(
        test_settings(None),
        ledger,
        oracle,
        MockSwapper::default(),
        MockBurner::new(BurnBehavior::Empty),
        None,
    );

    let scheduler =
        BatchScheduler::with_timing(Duration::from_millis(1), Duration::from_secs(60));
    let summary = scheduler.run_cycle(&orchestrator).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.succeeded, 0);

    match &summary.results[0] {
        ProjectCycleResult::Failed { token_mint, error } => {
            assert_eq!(token_mint, &mint_a);
            assert!(error.contains("rpc timeout"));
        }
        other => panic!("expected project A to fail, got {:?}", other),
    }
    match &summary.results[1] {
        ProjectCycleResult::Completed { outcome, .. } => assert!(outcome.is_skipped()),
        other => panic!("expected project B to be skipped, got {:?}", other),
    }
}

#[tokio::test]
async fn exhausted_time_budget_leaves_projects_unattempted() {
    let mint_a = Pubkey::new_unique().to_string();
    let mint_b = Pubkey::new_unique().to_string();
    let ledger = MemoryLedger::with_projects(vec![
        test_project(&mint_a, 1),
        test_project(&mint_b, 2),
    ]);
    let swapper = MockSwapper::default();
    let swap_calls = swapper.calls.clone();

    let orchestrator = Orchestrator::new(
        test_settings(None),
        ledger,
        MockOracle::with_sol(0.05),
        swapper,
        MockBurner::new(BurnBehavior::Empty),
        None,
    );

    // Zero budget: nothing may even start
    let scheduler = BatchScheduler::with_timing(Duration::ZERO, Duration::ZERO);
    let summary = scheduler.run_cycle(&orchestrator).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.skipped, 2);
    assert!(summary
        .results
        .iter()
        .all(|r| matches!(r, ProjectCycleResult::NotAttempted { .. })));
    assert_eq!(swap_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_burns_count_as_succeeded() {
    let mint = Pubkey::new_unique().to_string();
    let ledger = MemoryLedger::with_projects(vec![test_project(&mint, 1)]);

    let mut oracle = MockOracle::with_sol(0.05);
    oracle.token = Some(common::holding(1_000.0, 6));

    let orchestrator = Orchestrator::new(
        test_settings(None),
        ledger,
        oracle,
        MockSwapper::default(),
        MockBurner::new(BurnBehavior::Succeed { amount: 1_000.0 }),
        None,
    );

    let scheduler =
        BatchScheduler::with_timing(Duration::from_millis(1), Duration::from_secs(60));
    let summary = scheduler.run_cycle(&orchestrator).await.unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
}
