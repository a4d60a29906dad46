//! Integration test: replaying a JSON command script.
//!
//! One staker, 7 000 000 reward units over a week, a rejected funding call
//! by a stranger, and a query, claim and exit at the half-way point.

use stakewell_node::config::PoolConfig;
use stakewell_node::script;
use stakewell_node::{EventBus, LedgerService, ManualClock};
use stakewell_types::Amount;

/// Base timestamp for test scenarios.
const BASE_TIME: u64 = 1_700_000_000;

const ADMIN: &str = "0101010101010101010101010101010101010101";
const ALICE: &str = "a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";
const MALLORY: &str = "dededededededededededededededededededede";

fn scenario() -> String {
    format!(
        r#"[
            {{ "op": "mint_staking", "to": "{ALICE}", "amount": "1000" }},
            {{ "op": "approve_staking", "owner": "{ALICE}", "amount": "1000" }},
            {{ "op": "deposit", "caller": "{ALICE}", "amount": "1000" }},
            {{ "op": "mint_rewards", "to": "{ADMIN}", "amount": "7000000" }},
            {{ "op": "top_up_rewards", "from": "{ADMIN}", "amount": "7000000" }},
            {{ "op": "fund_epoch", "caller": "{MALLORY}", "amount": "7000000" }},
            {{ "op": "fund_epoch", "caller": "{ADMIN}", "amount": "7000000" }},
            {{ "op": "advance", "seconds": 302400 }},
            {{ "op": "query", "account": "{ALICE}" }},
            {{ "op": "withdraw", "caller": "{ALICE}", "amount": "1001" }},
            {{ "op": "claim", "caller": "{ALICE}" }},
            {{ "op": "exit", "caller": "{ALICE}" }},
            {{ "op": "rate_info" }}
        ]"#
    )
}

fn amount(value: &serde_json::Value) -> Amount {
    value
        .as_str()
        .expect("amount string")
        .parse()
        .expect("decimal amount")
}

#[tokio::test]
async fn half_period_scenario() {
    let clock = ManualClock::new(BASE_TIME);
    let service = LedgerService::deploy(&PoolConfig::default(), clock, EventBus::new(64))
        .await
        .expect("deploy pool");
    let mut events = service.events().subscribe();

    let commands = script::parse(&scenario()).expect("parse script");
    let outcomes = script::run(&service, &commands).await;
    assert_eq!(outcomes.len(), commands.len());

    let failed: Vec<_> = outcomes
        .iter()
        .filter(|o| !o.is_ok())
        .map(|o| o.op.as_str())
        .collect();
    assert_eq!(failed, vec!["fund_epoch", "withdraw"]);
    assert!(outcomes[5]
        .error
        .as_deref()
        .expect("error text")
        .contains("not authorized"));

    // Truncation only ever rounds against the staker.
    let query = outcomes[8].output.as_ref().expect("query output");
    let earned = amount(&query["earned"]);
    assert!(earned <= 3_500_000);
    assert!(earned >= 3_500_000 - 350);
    assert_eq!(amount(&query["staked"]), 1_000);

    let claim = outcomes[10].output.as_ref().expect("claim output");
    assert_eq!(amount(&claim["paid"]), earned);

    let exit = outcomes[11].output.as_ref().expect("exit output");
    assert_eq!(amount(&exit["withdrawn"]), 1_000);
    assert_eq!(amount(&exit["reward"]), 0);

    let names: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.event.name())
        .collect();
    assert_eq!(
        names,
        vec!["staked", "reward_funded", "reward_paid", "withdrawn"]
    );

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.total_staked, 0);
    assert!(snapshot.accounts.is_empty());
    assert_eq!(snapshot.last_seen, BASE_TIME + 302_400);
}

#[tokio::test]
async fn snapshot_survives_json() {
    let clock = ManualClock::new(BASE_TIME);
    let service = LedgerService::deploy(&PoolConfig::default(), clock, EventBus::new(64))
        .await
        .expect("deploy pool");
    let commands = script::parse(&scenario()).expect("parse script");
    // Stop before the claim so an open position is captured.
    script::run(&service, &commands[..9]).await;

    let snapshot = service.snapshot().await;
    let json = serde_json::to_string(&snapshot).expect("serialize");
    let restored: stakewell_ledger::PoolSnapshot =
        serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, snapshot);
    assert_eq!(restored.accounts.len(), 1);
    assert_eq!(restored.total_staked, 1_000);
}
