//! Integration test: ownership transfer and distributor rotation.

use stakewell_ledger::{LedgerError, PoolParams, StakingPool};
use stakewell_token::MemoryToken;
use stakewell_types::events::LedgerEvent;
use stakewell_types::Address;

const POOL: Address = Address::repeat_byte(0x50);
const OWNER: Address = Address::repeat_byte(0x01);
const DISTRIBUTOR: Address = Address::repeat_byte(0x02);
const SUCCESSOR: Address = Address::repeat_byte(0x03);
const MALLORY: Address = Address::repeat_byte(0x66);

fn new_pool() -> StakingPool<MemoryToken, MemoryToken> {
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

#[test]
fn two_step_ownership_transfer() {
    let mut pool = new_pool();
    pool.nominate_owner(&OWNER, SUCCESSOR).expect("nominate");
    assert_eq!(pool.nominated_owner(), Some(SUCCESSOR));
    assert_eq!(pool.owner(), OWNER);

    pool.accept_ownership(&SUCCESSOR).expect("accept");
    assert_eq!(pool.owner(), SUCCESSOR);
    assert_eq!(pool.nominated_owner(), None);
    assert_eq!(
        pool.drain_events(),
        vec![
            LedgerEvent::OwnerNominated { nominee: SUCCESSOR },
            LedgerEvent::OwnerChanged {
                previous: OWNER,
                current: SUCCESSOR
            },
        ]
    );

    // The old owner lost its privileges.
    assert!(pool.set_epoch_duration(&OWNER, 10, 0).is_err());
    pool.set_epoch_duration(&SUCCESSOR, 10, 0).expect("new owner");
}

#[test]
fn nominate_by_non_owner_rejected() {
    let mut pool = new_pool();
    assert!(matches!(
        pool.nominate_owner(&MALLORY, MALLORY),
        Err(LedgerError::Unauthorized { .. })
    ));
    assert_eq!(pool.nominated_owner(), None);
}

#[test]
fn accept_without_nomination_rejected() {
    let mut pool = new_pool();
    assert!(pool.accept_ownership(&SUCCESSOR).is_err());
    assert_eq!(pool.owner(), OWNER);
}

#[test]
fn accept_by_someone_else_rejected() {
    let mut pool = new_pool();
    pool.nominate_owner(&OWNER, SUCCESSOR).expect("nominate");
    assert!(pool.accept_ownership(&MALLORY).is_err());
    assert_eq!(pool.owner(), OWNER);
    assert_eq!(pool.nominated_owner(), Some(SUCCESSOR));
}

#[test]
fn rotate_rewards_distributor() {
    let mut pool = new_pool();
    assert!(pool.set_rewards_distributor(&DISTRIBUTOR, MALLORY).is_err());

    pool.set_rewards_distributor(&OWNER, SUCCESSOR).expect("rotate");
    assert_eq!(pool.rewards_distributor(), SUCCESSOR);

    pool.rewards_token_mut().mint(&POOL, 100).expect("mint");
    assert!(matches!(
        pool.fund_epoch(&DISTRIBUTOR, 100, 1),
        Err(LedgerError::Unauthorized { .. })
    ));
    pool.fund_epoch(&SUCCESSOR, 100, 1).expect("new distributor funds");
}
