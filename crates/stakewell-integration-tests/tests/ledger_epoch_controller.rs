//! Integration test: reward period funding, rollover and duration changes
//! against a bare `StakingPool` with in-memory assets.

use stakewell_ledger::{LedgerError, PoolParams, StakingPool, SCALE};
use stakewell_token::{FungibleToken, MemoryToken};
use stakewell_types::events::LedgerEvent;
use stakewell_types::{Address, Amount};

const POOL: Address = Address::repeat_byte(0x50);
const OWNER: Address = Address::repeat_byte(0x01);
const DISTRIBUTOR: Address = Address::repeat_byte(0x02);
const ALICE: Address = Address::repeat_byte(0xa1);

const WEEK: u64 = 604_800;
/// Base timestamp for test scenarios.
const BASE_TIME: u64 = 1_700_000_000;

type Pool = StakingPool<MemoryToken, MemoryToken>;

fn new_pool() -> Pool {
    StakingPool::new(
        PoolParams {
            address: POOL,
            owner: OWNER,
            rewards_distributor: DISTRIBUTOR,
        },
        MemoryToken::new("MLPT"),
        MemoryToken::new("MRT"),
    )
}

fn top_up(pool: &mut Pool, amount: Amount) {
    pool.rewards_token_mut().mint(&POOL, amount).expect("mint");
}

fn stake(pool: &mut Pool, who: Address, amount: Amount, now: u64) {
    pool.staking_token_mut().mint(&who, amount).expect("mint");
    pool.staking_token_mut().approve(&who, &POOL, amount);
    pool.deposit(&who, amount, now).expect("deposit");
}

#[test]
fn fund_by_non_distributor_rejected() {
    let mut pool = new_pool();
    top_up(&mut pool, 1_000_000);

    let err = pool.fund_epoch(&ALICE, 1_000_000, BASE_TIME).expect_err("unauthorized");
    assert!(matches!(err, LedgerError::Unauthorized { caller, .. } if caller == ALICE));
    assert_eq!(pool.reward_rate(), 0);
    assert_eq!(pool.period_finish(), 0);
    assert!(pool.drain_events().is_empty());
}

#[test]
fn fund_without_reward_balance_rejected() {
    let mut pool = new_pool();
    let err = pool.fund_epoch(&DISTRIBUTOR, 1_000, BASE_TIME).expect_err("unfunded");
    assert!(matches!(
        err,
        LedgerError::InsufficientFunding { available: 0, .. }
    ));
    assert_eq!(pool.reward_rate(), 0);
    assert_eq!(pool.last_update_time(), 0);
}

#[test]
fn fund_sets_rate_and_period() {
    let mut pool = new_pool();
    top_up(&mut pool, 7_000_000);
    pool.fund_epoch(&DISTRIBUTOR, 7_000_000, BASE_TIME).expect("fund");

    assert_eq!(pool.reward_rate(), 7_000_000 * SCALE / u128::from(WEEK));
    assert_eq!(pool.last_update_time(), BASE_TIME);
    assert_eq!(pool.period_finish(), BASE_TIME + WEEK);
    assert_eq!(pool.reward_asset_balance(), 7_000_000);
    assert_eq!(
        pool.drain_events(),
        vec![LedgerEvent::RewardFunded { amount: 7_000_000 }]
    );
}

#[test]
fn fund_mid_period_rolls_over_leftover() {
    let mut pool = new_pool();
    top_up(&mut pool, u128::from(WEEK) * 10);
    pool.fund_epoch(&DISTRIBUTOR, u128::from(WEEK) * 10, BASE_TIME).expect("fund");
    let old_rate = pool.reward_rate();
    assert_eq!(old_rate, 10 * SCALE);

    let now = BASE_TIME + WEEK / 4;
    let new_amount = 1_000_000u128;
    top_up(&mut pool, new_amount);
    pool.fund_epoch(&DISTRIBUTOR, new_amount, now).expect("refund");

    let leftover = u128::from(BASE_TIME + WEEK - now) * old_rate;
    let expected = (new_amount * SCALE + leftover) / u128::from(WEEK);
    assert_eq!(pool.reward_rate(), expected);
    assert_ne!(pool.reward_rate(), new_amount * SCALE / u128::from(WEEK));
    assert_eq!(pool.period_finish(), now + WEEK);
}

#[test]
fn fund_mid_period_settles_stakers_first() {
    let mut pool = new_pool();
    stake(&mut pool, ALICE, 100, BASE_TIME);
    top_up(&mut pool, u128::from(WEEK));
    pool.fund_epoch(&DISTRIBUTOR, u128::from(WEEK), BASE_TIME).expect("fund");

    top_up(&mut pool, u128::from(WEEK) * 3);
    pool.fund_epoch(&DISTRIBUTOR, u128::from(WEEK) * 3, BASE_TIME + 1_000).expect("refund");

    // 1000s at 1/s were folded in before the rate changed.
    assert_eq!(pool.reward_per_token_stored(), 1_000 * SCALE / 100);
    assert_eq!(pool.earned(&ALICE, BASE_TIME + 1_000).expect("earned"), 1_000);
}

#[test]
fn fund_after_period_finish_starts_fresh() {
    let mut pool = new_pool();
    stake(&mut pool, ALICE, 10, BASE_TIME);
    top_up(&mut pool, u128::from(WEEK));
    pool.fund_epoch(&DISTRIBUTOR, u128::from(WEEK), BASE_TIME).expect("fund");

    let later = BASE_TIME + 2 * WEEK;
    top_up(&mut pool, u128::from(WEEK) * 2);
    pool.fund_epoch(&DISTRIBUTOR, u128::from(WEEK) * 2, later).expect("refund");

    assert_eq!(pool.reward_rate(), 2 * SCALE);
    assert_eq!(pool.last_update_time(), later);
    // The gap between the two periods paid nothing.
    assert_eq!(pool.earned(&ALICE, later).expect("earned"), u128::from(WEEK));
}

#[test]
fn rollover_above_balance_rejected() {
    let mut pool = new_pool();
    top_up(&mut pool, u128::from(WEEK));
    pool.fund_epoch(&DISTRIBUTOR, u128::from(WEEK), BASE_TIME).expect("fund");

    // Promise the same amount again without topping up.
    let err = pool
        .fund_epoch(&DISTRIBUTOR, u128::from(WEEK), BASE_TIME + 10)
        .expect_err("overpromise");
    assert!(matches!(err, LedgerError::InsufficientFunding { .. }));
    assert_eq!(pool.reward_rate(), SCALE);
    assert_eq!(pool.period_finish(), BASE_TIME + WEEK);
}

#[test]
fn set_duration_by_non_owner_rejected() {
    let mut pool = new_pool();
    let err = pool.set_epoch_duration(&ALICE, 1, BASE_TIME).expect_err("unauthorized");
    assert!(matches!(err, LedgerError::Unauthorized { .. }));
    assert_eq!(pool.rewards_duration(), WEEK);
}

#[test]
fn set_duration_during_active_period_rejected() {
    let mut pool = new_pool();
    top_up(&mut pool, 1_000_000);
    pool.fund_epoch(&DISTRIBUTOR, 1_000_000, BASE_TIME).expect("fund");

    let err = pool
        .set_epoch_duration(&OWNER, 1, BASE_TIME + WEEK - 1)
        .expect_err("active");
    assert!(matches!(
        err,
        LedgerError::EpochActive { period_finish, now }
            if period_finish == BASE_TIME + WEEK && now == BASE_TIME + WEEK - 1
    ));
    assert_eq!(pool.rewards_duration(), WEEK);
}

#[test]
fn set_duration_after_period() {
    let mut pool = new_pool();
    assert_eq!(pool.rewards_duration(), WEEK);
    pool.set_epoch_duration(&OWNER, WEEK * 2, BASE_TIME).expect("set");
    assert_eq!(pool.rewards_duration(), WEEK * 2);
    assert_eq!(
        pool.drain_events(),
        vec![LedgerEvent::EpochDurationUpdated {
            new_duration: WEEK * 2
        }]
    );

    top_up(&mut pool, 1_000);
    pool.fund_epoch(&DISTRIBUTOR, 1_000, BASE_TIME + 1).expect("fund");
    assert_eq!(pool.period_finish(), BASE_TIME + 1 + WEEK * 2);

    pool.set_epoch_duration(&OWNER, 100, BASE_TIME + 1 + WEEK * 2)
        .expect("set at period finish");
}

#[test]
fn set_zero_duration_rejected() {
    let mut pool = new_pool();
    assert!(matches!(
        pool.set_epoch_duration(&OWNER, 0, BASE_TIME),
        Err(LedgerError::ZeroDuration)
    ));
}

#[test]
fn reward_for_duration_and_applicable_time() {
    let mut pool = new_pool();
    top_up(&mut pool, u128::from(WEEK) * 5);
    pool.fund_epoch(&DISTRIBUTOR, u128::from(WEEK) * 5, BASE_TIME).expect("fund");

    assert_eq!(pool.reward_for_duration().expect("total"), u128::from(WEEK) * 5);
    assert_eq!(pool.last_time_reward_applicable(BASE_TIME + 10), BASE_TIME + 10);
    assert_eq!(pool.last_time_reward_applicable(BASE_TIME + 2 * WEEK), BASE_TIME + WEEK);
    assert_eq!(pool.rewards_token().balance_of(&POOL), u128::from(WEEK) * 5);
}
