//! The staking pool.
//!
//! [`StakingPool`] owns every piece of ledger state: the reward schedule,
//! the accumulator, the per-account positions and the two asset handles.
//! Operations take the caller and the current time explicitly. Events are
//! buffered until the host drains them with [`StakingPool::drain_events`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use stakewell_token::FungibleToken;
use stakewell_types::events::LedgerEvent;
use stakewell_types::{Address, Amount, Timestamp};

use crate::accrual::{self, Accumulator};
use crate::epoch::{EpochSchedule, RateInfo};
use crate::position::Account;
use crate::roles::Roles;
use crate::{LedgerError, Result};

/// Construction parameters of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    /// Custody address holding the pool's staked and reward assets.
    pub address: Address,
    /// Initial owner.
    pub owner: Address,
    /// Initial rewards distributor.
    pub rewards_distributor: Address,
}

/// Single-asset staking pool paying a single reward asset.
#[derive(Debug)]
pub struct StakingPool<S, R> {
    pub(crate) address: Address,
    pub(crate) roles: Roles,
    pub(crate) schedule: EpochSchedule,
    pub(crate) accumulator: Accumulator,
    pub(crate) total_staked: Amount,
    pub(crate) accounts: BTreeMap<Address, Account>,
    pub(crate) last_seen: Timestamp,
    pub(crate) staking_token: S,
    pub(crate) rewards_token: R,
    events: Vec<LedgerEvent>,
}

/// Persistable image of a pool's state, without the asset handles.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub address: Address,
    pub roles: Roles,
    pub schedule: EpochSchedule,
    pub accumulator: Accumulator,
    #[serde_as(as = "DisplayFromStr")]
    pub total_staked: Amount,
    pub last_seen: Timestamp,
    pub accounts: Vec<AccountRecord>,
}

/// One account in a [`PoolSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub address: Address,
    pub account: Account,
}

impl<S, R> StakingPool<S, R> {
    /// Create an empty pool with the default 7-day reward duration.
    pub fn new(params: PoolParams, staking_token: S, rewards_token: R) -> Self {
        tracing::info!(
            address = %params.address,
            owner = %params.owner,
            distributor = %params.rewards_distributor,
            "staking pool created"
        );
        Self {
            address: params.address,
            roles: Roles {
                owner: params.owner,
                nominated_owner: None,
                rewards_distributor: params.rewards_distributor,
            },
            schedule: EpochSchedule::default(),
            accumulator: Accumulator::default(),
            total_staked: 0,
            accounts: BTreeMap::new(),
            last_seen: 0,
            staking_token,
            rewards_token,
            events: Vec::new(),
        }
    }

    /// Rebuild a pool from a snapshot and its asset handles.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidSnapshot`] if balances do not add up, an
    ///   account checkpoint is ahead of the accumulator, or the duration is zero
    pub fn restore(snapshot: PoolSnapshot, staking_token: S, rewards_token: R) -> Result<Self> {
        if snapshot.schedule.rewards_duration == 0 {
            return Err(LedgerError::InvalidSnapshot(
                "rewards duration is zero".to_string(),
            ));
        }

        let mut accounts = BTreeMap::new();
        let mut staked: Amount = 0;
        for record in snapshot.accounts {
            if record.account.reward_per_token_paid > snapshot.accumulator.reward_per_token_stored
            {
                return Err(LedgerError::InvalidSnapshot(format!(
                    "checkpoint of {} is ahead of the accumulator",
                    record.address
                )));
            }
            staked = staked
                .checked_add(record.account.staked_balance)
                .ok_or(LedgerError::Overflow)?;
            if accounts.insert(record.address, record.account).is_some() {
                return Err(LedgerError::InvalidSnapshot(format!(
                    "duplicate account {}",
                    record.address
                )));
            }
        }
        if staked != snapshot.total_staked {
            return Err(LedgerError::InvalidSnapshot(format!(
                "account balances sum to {staked}, total staked is {}",
                snapshot.total_staked
            )));
        }

        Ok(Self {
            address: snapshot.address,
            roles: snapshot.roles,
            schedule: snapshot.schedule,
            accumulator: snapshot.accumulator,
            total_staked: snapshot.total_staked,
            accounts,
            last_seen: snapshot.last_seen,
            staking_token,
            rewards_token,
            events: Vec::new(),
        })
    }

    /// Capture the pool's state.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            address: self.address,
            roles: self.roles,
            schedule: self.schedule,
            accumulator: self.accumulator,
            total_staked: self.total_staked,
            last_seen: self.last_seen,
            accounts: self
                .accounts
                .iter()
                .map(|(address, account)| AccountRecord {
                    address: *address,
                    account: *account,
                })
                .collect(),
        }
    }

    /// Custody address of the pool.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.roles.owner
    }

    /// Pending owner nomination, if any.
    pub fn nominated_owner(&self) -> Option<Address> {
        self.roles.nominated_owner
    }

    /// Current rewards distributor.
    pub fn rewards_distributor(&self) -> Address {
        self.roles.rewards_distributor
    }

    /// The staking asset.
    pub fn staking_token(&self) -> &S {
        &self.staking_token
    }

    /// Mutable access to the staking asset, e.g. for approvals by stakers.
    pub fn staking_token_mut(&mut self) -> &mut S {
        &mut self.staking_token
    }

    /// The reward asset.
    pub fn rewards_token(&self) -> &R {
        &self.rewards_token
    }

    /// Mutable access to the reward asset, e.g. to top up the pool before
    /// funding a period.
    pub fn rewards_token_mut(&mut self) -> &mut R {
        &mut self.rewards_token
    }

    /// Sum of all staked balances.
    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }

    /// Staked balance of `account`.
    pub fn staked_balance_of(&self, account: &Address) -> Amount {
        self.accounts
            .get(account)
            .map(|a| a.staked_balance)
            .unwrap_or(0)
    }

    /// Stored position of `account`, if it has one.
    pub fn account(&self, account: &Address) -> Option<&Account> {
        self.accounts.get(account)
    }

    /// Number of accounts with a position.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Iterate over all positions.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    /// Accumulator value as of the last settlement.
    pub fn reward_per_token_stored(&self) -> u128 {
        self.accumulator.reward_per_token_stored
    }

    /// Time of the last settlement.
    pub fn last_update_time(&self) -> Timestamp {
        self.accumulator.last_update_time
    }

    /// End of the current (or last) reward period.
    pub fn period_finish(&self) -> Timestamp {
        self.schedule.period_finish
    }

    /// Length of a funded reward period in seconds.
    pub fn rewards_duration(&self) -> u64 {
        self.schedule.rewards_duration
    }

    /// Reward units per second, scaled by [`crate::SCALE`].
    pub fn reward_rate(&self) -> u128 {
        self.schedule.reward_rate
    }

    /// `min(now, period_finish)`.
    pub fn last_time_reward_applicable(&self, now: Timestamp) -> Timestamp {
        self.schedule.last_time_reward_applicable(now)
    }

    /// Reward paid over one full period at the current rate.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn reward_for_duration(&self) -> Result<Amount> {
        self.schedule.reward_for_duration()
    }

    /// Accumulator value as of `now`, without settling.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn current_reward_per_token(&self, now: Timestamp) -> Result<u128> {
        self.accumulator.current(
            self.schedule.last_time_reward_applicable(now),
            self.schedule.reward_rate,
            self.total_staked,
        )
    }

    /// Reward `account` could claim at `now`.
    ///
    /// Matches exactly what a settlement at `now` would credit.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn earned(&self, account: &Address, now: Timestamp) -> Result<Amount> {
        let rpt = self.current_reward_per_token(now)?;
        let position = self.accounts.get(account).copied().unwrap_or_default();
        accrual::earned(
            position.staked_balance,
            rpt,
            position.reward_per_token_paid,
            position.rewards_owed,
        )
    }

    /// Reward schedule summary.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn rate_info(&self) -> Result<RateInfo> {
        Ok(RateInfo {
            reward_rate: self.schedule.reward_rate,
            rewards_duration: self.schedule.rewards_duration,
            period_finish: self.schedule.period_finish,
            last_update_time: self.accumulator.last_update_time,
            reward_per_token_stored: self.accumulator.reward_per_token_stored,
            reward_for_duration: self.schedule.reward_for_duration()?,
        })
    }

    /// Events recorded since the last drain, oldest first.
    pub fn pending_events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Take all recorded events, oldest first.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn record(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    /// Reject a time earlier than one already committed.
    pub(crate) fn observe(&self, now: Timestamp) -> Result<()> {
        if now < self.last_seen {
            return Err(LedgerError::ClockRegression {
                last_seen: self.last_seen,
                now,
            });
        }
        Ok(())
    }

    /// Settle the accumulator and `account` as of `now` on copies.
    ///
    /// Nothing is committed; the caller writes the staged values back once
    /// the rest of its operation has succeeded.
    pub(crate) fn stage_settlement(
        &self,
        account: &Address,
        now: Timestamp,
    ) -> Result<(Accumulator, Account)> {
        self.observe(now)?;

        let mut accumulator = self.accumulator;
        let rpt = accumulator.settle(
            self.schedule.last_time_reward_applicable(now),
            self.schedule.reward_rate,
            self.total_staked,
        )?;

        let mut position = self.accounts.get(account).copied().unwrap_or_default();
        let credited = accrual::settle_account(&mut position, rpt)?;
        tracing::trace!(
            %account,
            credited,
            owed = position.rewards_owed,
            "accrual: settled account"
        );

        Ok((accumulator, position))
    }

    /// Write back a staged settlement and position.
    pub(crate) fn commit(
        &mut self,
        accumulator: Accumulator,
        account: Address,
        position: Account,
        total_staked: Amount,
        now: Timestamp,
    ) {
        self.accumulator = accumulator;
        self.total_staked = total_staked;
        self.last_seen = now;
        if position.is_empty() {
            self.accounts.remove(&account);
        } else {
            self.accounts.insert(account, position);
        }
    }
}

impl<S: FungibleToken, R: FungibleToken> StakingPool<S, R> {
    /// Staking asset held in custody by the pool.
    pub fn staked_asset_balance(&self) -> Amount {
        self.staking_token.balance_of(&self.address)
    }

    /// Reward asset held in custody by the pool.
    pub fn reward_asset_balance(&self) -> Amount {
        self.rewards_token.balance_of(&self.address)
    }
}
