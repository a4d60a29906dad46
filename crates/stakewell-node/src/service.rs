//! Serialized access to a staking pool.
//!
//! [`LedgerService`] owns the pool behind an async mutex. Each call takes
//! the lock, reads the clock once, runs exactly one ledger operation, and
//! publishes whatever events it recorded before releasing the lock, so the
//! event sequence matches commit order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use stakewell_ledger::{ExitReceipt, LedgerError, PoolSnapshot, RateInfo, StakingPool};
use stakewell_token::{FungibleToken, MemoryToken, TokenError};
use stakewell_types::{Address, Amount, Timestamp, DEFAULT_REWARDS_DURATION_SECS};
use tokio::sync::Mutex;

use crate::config::PoolConfig;
use crate::events::EventBus;

/// The pool type run by the node.
pub type MemoryPool = StakingPool<MemoryToken, MemoryToken>;

/// Service errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

/// Convenience result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Source of "now" for ledger calls.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move forward by `secs`. Returns the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        self.now.fetch_add(secs, Ordering::SeqCst).saturating_add(secs)
    }

    /// Jump to `at`. Moving backwards is allowed here; the ledger rejects
    /// the next call instead.
    pub fn set(&self, at: Timestamp) {
        self.now.store(at, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Asset holdings of one principal.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalances {
    #[serde_as(as = "DisplayFromStr")]
    pub staking: Amount,
    #[serde_as(as = "DisplayFromStr")]
    pub rewards: Amount,
}

/// Mutex-guarded staking pool plus its clock and event bus.
pub struct LedgerService<C> {
    pool: Arc<Mutex<MemoryPool>>,
    clock: C,
    events: EventBus,
}

impl<C: Clone> Clone for LedgerService<C> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            clock: self.clock.clone(),
            events: self.events.clone(),
        }
    }
}

impl<C: Clock> LedgerService<C> {
    /// Wrap an existing pool.
    pub fn new(pool: MemoryPool, clock: C, events: EventBus) -> Self {
        Self {
            pool: Arc::new(Mutex::new(pool)),
            clock,
            events,
        }
    }

    /// Deploy a fresh pool with in-memory assets as described by `config`.
    ///
    /// A non-default `rewards_duration` is applied by the owner right after
    /// deployment, which records an `epoch_duration_updated` event.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroDuration`] if the configured duration is zero
    pub async fn deploy(config: &PoolConfig, clock: C, events: EventBus) -> Result<Self> {
        let pool = StakingPool::new(
            config.params(),
            MemoryToken::new(config.staking_asset.clone()),
            MemoryToken::new(config.reward_asset.clone()),
        );
        let service = Self::new(pool, clock, events);
        if config.rewards_duration != DEFAULT_REWARDS_DURATION_SECS {
            let owner = config.owner;
            let duration = config.rewards_duration;
            service
                .execute(|pool, now| Ok(pool.set_epoch_duration(&owner, duration, now)?))
                .await?;
        }
        tracing::info!(
            pool = %config.address,
            staking_asset = %config.staking_asset,
            reward_asset = %config.reward_asset,
            "pool deployed"
        );
        Ok(service)
    }

    /// The event bus ledger events are published on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The clock this service reads.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `op` under the lock at the current clock time and publish the
    /// events it recorded.
    async fn execute<T>(
        &self,
        op: impl FnOnce(&mut MemoryPool, Timestamp) -> Result<T>,
    ) -> Result<T> {
        let mut pool = self.pool.lock().await;
        let now = self.clock.now();
        let outcome = op(&mut *pool, now);
        for event in pool.drain_events() {
            self.events.emit(now, event);
        }
        outcome
    }

    /// Run a read-only query under the lock at the current clock time.
    async fn query<T>(&self, op: impl FnOnce(&MemoryPool, Timestamp) -> T) -> T {
        let pool = self.pool.lock().await;
        op(&*pool, self.clock.now())
    }

    // ---- Position operations ----

    pub async fn deposit(&self, caller: Address, amount: Amount) -> Result<()> {
        self.execute(|pool, now| Ok(pool.deposit(&caller, amount, now)?))
            .await
    }

    pub async fn withdraw(&self, caller: Address, amount: Amount) -> Result<()> {
        self.execute(|pool, now| Ok(pool.withdraw(&caller, amount, now)?))
            .await
    }

    /// Pay out accrued rewards. Returns the amount paid.
    pub async fn claim(&self, caller: Address) -> Result<Amount> {
        self.execute(|pool, now| Ok(pool.claim(&caller, now)?)).await
    }

    pub async fn exit(&self, caller: Address) -> Result<ExitReceipt> {
        self.execute(|pool, now| Ok(pool.exit(&caller, now)?)).await
    }

    // ---- Epoch and role operations ----

    pub async fn fund_epoch(&self, caller: Address, amount: Amount) -> Result<()> {
        self.execute(|pool, now| Ok(pool.fund_epoch(&caller, amount, now)?))
            .await
    }

    pub async fn set_epoch_duration(&self, caller: Address, duration: u64) -> Result<()> {
        self.execute(|pool, now| Ok(pool.set_epoch_duration(&caller, duration, now)?))
            .await
    }

    pub async fn nominate_owner(&self, caller: Address, nominee: Address) -> Result<()> {
        self.execute(|pool, _| Ok(pool.nominate_owner(&caller, nominee)?))
            .await
    }

    pub async fn accept_ownership(&self, caller: Address) -> Result<()> {
        self.execute(|pool, _| Ok(pool.accept_ownership(&caller)?))
            .await
    }

    pub async fn set_rewards_distributor(
        &self,
        caller: Address,
        distributor: Address,
    ) -> Result<()> {
        self.execute(|pool, _| Ok(pool.set_rewards_distributor(&caller, distributor)?))
            .await
    }

    // ---- Asset custody helpers ----

    /// Create staking units for `to`.
    pub async fn mint_staking(&self, to: Address, amount: Amount) -> Result<()> {
        self.execute(|pool, _| Ok(pool.staking_token_mut().mint(&to, amount)?))
            .await
    }

    /// Create reward units for `to`.
    pub async fn mint_rewards(&self, to: Address, amount: Amount) -> Result<()> {
        self.execute(|pool, _| Ok(pool.rewards_token_mut().mint(&to, amount)?))
            .await
    }

    /// Let the pool pull up to `amount` staking units from `owner`.
    pub async fn approve_staking(&self, owner: Address, amount: Amount) -> Result<()> {
        self.execute(|pool, _| {
            let spender = pool.address();
            pool.staking_token_mut().approve(&owner, &spender, amount);
            Ok(())
        })
        .await
    }

    /// Move reward units from `from` into the pool's custody, ahead of a
    /// `fund_epoch` call.
    pub async fn top_up_rewards(&self, from: Address, amount: Amount) -> Result<()> {
        self.execute(|pool, _| {
            let to = pool.address();
            Ok(pool.rewards_token_mut().transfer(&from, &to, amount)?)
        })
        .await
    }

    // ---- Queries ----

    pub async fn earned(&self, account: Address) -> Result<Amount> {
        self.query(|pool, now| pool.earned(&account, now).map_err(ServiceError::from))
            .await
    }

    pub async fn current_reward_per_token(&self) -> Result<u128> {
        self.query(|pool, now| {
            pool.current_reward_per_token(now)
                .map_err(ServiceError::from)
        })
        .await
    }

    pub async fn staked_balance_of(&self, account: Address) -> Amount {
        self.query(|pool, _| pool.staked_balance_of(&account)).await
    }

    pub async fn total_staked(&self) -> Amount {
        self.query(|pool, _| pool.total_staked()).await
    }

    pub async fn rate_info(&self) -> Result<RateInfo> {
        self.query(|pool, _| pool.rate_info().map_err(ServiceError::from))
            .await
    }

    pub async fn last_time_reward_applicable(&self) -> Timestamp {
        self.query(|pool, now| pool.last_time_reward_applicable(now))
            .await
    }

    pub async fn snapshot(&self) -> PoolSnapshot {
        self.query(|pool, _| pool.snapshot()).await
    }

    /// Staking and reward asset balances held by `account`.
    pub async fn balances(&self, account: Address) -> AssetBalances {
        self.query(|pool, _| AssetBalances {
            staking: pool.staking_token().balance_of(&account),
            rewards: pool.rewards_token().balance_of(&account),
        })
        .await
    }
}
