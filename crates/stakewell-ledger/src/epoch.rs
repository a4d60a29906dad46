//! Reward periods.
//!
//! A reward period (epoch) pays a constant `reward_rate` until
//! `period_finish`. Funding a new period while one is still running rolls
//! the unpaid remainder into the new rate instead of dropping it:
//!
//! ```text
//! idle:    rate = amount * SCALE / duration
//! running: rate = (amount * SCALE + (period_finish - now) * rate) / duration
//! ```
//!
//! The rate is rejected if paying it for a full period would need more
//! reward than the pool holds.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use stakewell_token::FungibleToken;
use stakewell_types::events::LedgerEvent;
use stakewell_types::{Address, Amount, Timestamp, DEFAULT_REWARDS_DURATION_SECS};

use crate::accrual::SCALE;
use crate::pool::StakingPool;
use crate::roles::ensure_role;
use crate::wide::{mul_div, narrow, widen};
use crate::{LedgerError, Result};

/// Rate and period state of the pool.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    /// Reward units per second, scaled by [`SCALE`].
    #[serde_as(as = "DisplayFromStr")]
    pub reward_rate: u128,
    /// Length of the next funded period in seconds.
    pub rewards_duration: u64,
    /// End of the current (or last) period.
    pub period_finish: Timestamp,
}

impl Default for EpochSchedule {
    fn default() -> Self {
        Self {
            reward_rate: 0,
            rewards_duration: DEFAULT_REWARDS_DURATION_SECS,
            period_finish: 0,
        }
    }
}

/// Read-only view of the pool's reward schedule.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateInfo {
    /// Reward units per second, scaled by [`SCALE`].
    #[serde_as(as = "DisplayFromStr")]
    pub reward_rate: u128,
    /// Length of a funded period in seconds.
    pub rewards_duration: u64,
    /// End of the current (or last) period.
    pub period_finish: Timestamp,
    /// Time of the last accumulator settlement.
    pub last_update_time: Timestamp,
    /// Accumulator value at `last_update_time`.
    #[serde_as(as = "DisplayFromStr")]
    pub reward_per_token_stored: u128,
    /// Reward paid over one full period at the current rate.
    #[serde_as(as = "DisplayFromStr")]
    pub reward_for_duration: Amount,
}

impl EpochSchedule {
    /// The latest time at which rewards still accrue: `min(now, period_finish)`.
    pub fn last_time_reward_applicable(&self, now: Timestamp) -> Timestamp {
        now.min(self.period_finish)
    }

    /// Whether a reward period is running at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        now < self.period_finish
    }

    /// Rate for a period funded with `amount` at `now`, including any
    /// rolled-over remainder of the running period.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroDuration`] if the duration is zero
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn next_rate(&self, amount: Amount, now: Timestamp) -> Result<u128> {
        if self.rewards_duration == 0 {
            return Err(LedgerError::ZeroDuration);
        }

        let mut total = widen(amount) * widen(SCALE);
        if self.is_active(now) {
            let remaining = u128::from(self.period_finish - now);
            total += widen(remaining) * widen(self.reward_rate);
        }

        narrow(total / widen(u128::from(self.rewards_duration)))
    }

    /// Reward paid over one full period at the current rate.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn reward_for_duration(&self) -> Result<Amount> {
        mul_div(self.reward_rate, u128::from(self.rewards_duration), SCALE)
    }
}

/// Check that paying `reward_rate` for `duration` seconds is covered by
/// `balance`.
///
/// # Errors
///
/// - [`LedgerError::InsufficientFunding`] if the balance is too small
pub fn ensure_solvent(reward_rate: u128, duration: u64, balance: Amount) -> Result<()> {
    let required = widen(reward_rate) * widen(u128::from(duration));
    let available = widen(balance) * widen(SCALE);
    if required > available {
        let rounded_up = (required + widen(SCALE - 1)) / widen(SCALE);
        return Err(LedgerError::InsufficientFunding {
            required: narrow(rounded_up).unwrap_or(Amount::MAX),
            available: balance,
        });
    }
    Ok(())
}

impl<S, R: FungibleToken> StakingPool<S, R> {
    /// Start a new reward period paying `amount` over `rewards_duration`.
    ///
    /// The reward asset must already be held by the pool. Global accrual is
    /// settled before the rate changes.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` is not the rewards distributor
    /// - [`LedgerError::ClockRegression`] if `now` is in the past
    /// - [`LedgerError::InsufficientFunding`] if the pool cannot pay the new rate
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn fund_epoch(&mut self, caller: &Address, amount: Amount, now: Timestamp) -> Result<()> {
        ensure_role(
            &self.roles.rewards_distributor,
            caller,
            "fund a reward period",
        )?;
        self.observe(now)?;

        let mut accumulator = self.accumulator;
        accumulator.settle(
            self.schedule.last_time_reward_applicable(now),
            self.schedule.reward_rate,
            self.total_staked,
        )?;

        let rolled_over = self.schedule.is_active(now);
        let reward_rate = self.schedule.next_rate(amount, now)?;
        let balance = self.rewards_token.balance_of(&self.address);
        ensure_solvent(reward_rate, self.schedule.rewards_duration, balance)?;
        let period_finish = now
            .checked_add(self.schedule.rewards_duration)
            .ok_or(LedgerError::Overflow)?;

        accumulator.last_update_time = now;
        self.accumulator = accumulator;
        self.schedule.reward_rate = reward_rate;
        self.schedule.period_finish = period_finish;
        self.last_seen = now;

        tracing::info!(
            amount,
            reward_rate,
            period_finish,
            rolled_over,
            "reward period funded"
        );
        self.record(LedgerEvent::RewardFunded { amount });
        Ok(())
    }

    /// Change the length of future reward periods.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` is not the owner
    /// - [`LedgerError::ClockRegression`] if `now` is in the past
    /// - [`LedgerError::EpochActive`] if the current period has not finished
    /// - [`LedgerError::ZeroDuration`] if `new_duration` is zero
    pub fn set_epoch_duration(
        &mut self,
        caller: &Address,
        new_duration: u64,
        now: Timestamp,
    ) -> Result<()> {
        ensure_role(&self.roles.owner, caller, "change the reward duration")?;
        self.observe(now)?;

        if self.schedule.is_active(now) {
            return Err(LedgerError::EpochActive {
                period_finish: self.schedule.period_finish,
                now,
            });
        }
        if new_duration == 0 {
            return Err(LedgerError::ZeroDuration);
        }

        self.schedule.rewards_duration = new_duration;
        self.last_seen = now;

        tracing::info!(new_duration, "reward duration updated");
        self.record(LedgerEvent::EpochDurationUpdated { new_duration });
        Ok(())
    }
}
