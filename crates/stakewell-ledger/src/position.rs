//! Staked positions.
//!
//! Every operation settles the caller's accrued reward first, then moves
//! balances. Settlement runs on staged copies; nothing is written back until
//! the asset transfer of the operation has succeeded, so a failed transfer
//! leaves the pool exactly as it was.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use stakewell_token::FungibleToken;
use stakewell_types::events::LedgerEvent;
use stakewell_types::{Address, Amount, Timestamp};

use crate::pool::StakingPool;
use crate::{LedgerError, Result};

/// Per-account position.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Staking asset deposited by the account.
    #[serde_as(as = "DisplayFromStr")]
    pub staked_balance: Amount,
    /// Accumulator value at the account's last settlement.
    #[serde_as(as = "DisplayFromStr")]
    pub reward_per_token_paid: u128,
    /// Settled reward not yet claimed.
    #[serde_as(as = "DisplayFromStr")]
    pub rewards_owed: Amount,
}

impl Account {
    /// No stake and nothing owed.
    pub fn is_empty(&self) -> bool {
        self.staked_balance == 0 && self.rewards_owed == 0
    }
}

/// Amounts paid out by [`StakingPool::exit`].
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReceipt {
    /// Staking asset returned.
    #[serde_as(as = "DisplayFromStr")]
    pub withdrawn: Amount,
    /// Reward asset paid.
    #[serde_as(as = "DisplayFromStr")]
    pub reward: Amount,
}

impl<S: FungibleToken, R: FungibleToken> StakingPool<S, R> {
    /// Stake `amount` of the staking asset.
    ///
    /// The caller must have approved the pool's address for at least
    /// `amount` on the staking asset.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAmount`] if `amount` is zero
    /// - [`LedgerError::TransferFailed`] if the asset cannot be pulled
    /// - [`LedgerError::ClockRegression`] if `now` is in the past
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn deposit(&mut self, caller: &Address, amount: Amount, now: Timestamp) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let (accumulator, mut position) = self.stage_settlement(caller, now)?;
        position.staked_balance = position
            .staked_balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        let pool = self.address;
        self.staking_token.transfer_from(&pool, caller, &pool, amount)?;

        self.commit(accumulator, *caller, position, total_staked, now);
        tracing::debug!(account = %caller, amount, total_staked, "staked");
        self.record(LedgerEvent::Staked {
            account: *caller,
            amount,
        });
        Ok(())
    }

    /// Withdraw `amount` of the caller's stake.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAmount`] if `amount` is zero
    /// - [`LedgerError::InsufficientBalance`] if `amount` exceeds the stake
    /// - [`LedgerError::TransferFailed`] if the asset cannot be returned
    /// - [`LedgerError::ClockRegression`] if `now` is in the past
    pub fn withdraw(&mut self, caller: &Address, amount: Amount, now: Timestamp) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let (accumulator, mut position) = self.stage_settlement(caller, now)?;
        if amount > position.staked_balance {
            return Err(LedgerError::InsufficientBalance {
                staked: position.staked_balance,
                requested: amount,
            });
        }
        position.staked_balance -= amount;
        let total_staked = self
            .total_staked
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;

        let pool = self.address;
        self.staking_token.transfer(&pool, caller, amount)?;

        self.commit(accumulator, *caller, position, total_staked, now);
        tracing::debug!(account = %caller, amount, total_staked, "withdrawn");
        self.record(LedgerEvent::Withdrawn {
            account: *caller,
            amount,
        });
        Ok(())
    }

    /// Pay out everything the caller has earned so far.
    ///
    /// Returns the amount paid; zero (and no transfer) if nothing is owed.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::TransferFailed`] if the reward cannot be paid
    /// - [`LedgerError::ClockRegression`] if `now` is in the past
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn claim(&mut self, caller: &Address, now: Timestamp) -> Result<Amount> {
        let (accumulator, mut position) = self.stage_settlement(caller, now)?;
        let reward = position.rewards_owed;

        if reward > 0 {
            let pool = self.address;
            self.rewards_token.transfer(&pool, caller, reward)?;
            position.rewards_owed = 0;
        }

        let total_staked = self.total_staked;
        self.commit(accumulator, *caller, position, total_staked, now);
        if reward > 0 {
            tracing::debug!(account = %caller, reward, "reward paid");
            self.record(LedgerEvent::RewardPaid {
                account: *caller,
                amount: reward,
            });
        }
        Ok(reward)
    }

    /// Withdraw the whole stake and claim all rewards in one call.
    ///
    /// Behaves as [`StakingPool::withdraw`] of the full balance followed by
    /// [`StakingPool::claim`], but either both happen or neither does. Both
    /// payouts are dry-run first, so this depends on the assets honouring
    /// the [`FungibleToken::check_transfer`] contract.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAmount`] if the caller has nothing staked
    /// - [`LedgerError::TransferFailed`] if either payout would fail
    /// - [`LedgerError::ClockRegression`] if `now` is in the past
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn exit(&mut self, caller: &Address, now: Timestamp) -> Result<ExitReceipt> {
        let (accumulator, mut position) = self.stage_settlement(caller, now)?;
        let withdrawn = position.staked_balance;
        if withdrawn == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let reward = position.rewards_owed;
        let total_staked = self
            .total_staked
            .checked_sub(withdrawn)
            .ok_or(LedgerError::Overflow)?;

        let pool = self.address;
        self.staking_token.check_transfer(&pool, caller, withdrawn)?;
        if reward > 0 {
            self.rewards_token.check_transfer(&pool, caller, reward)?;
        }
        self.staking_token.transfer(&pool, caller, withdrawn)?;
        if reward > 0 {
            self.rewards_token.transfer(&pool, caller, reward)?;
        }

        position.staked_balance = 0;
        position.rewards_owed = 0;
        self.commit(accumulator, *caller, position, total_staked, now);

        tracing::debug!(account = %caller, withdrawn, reward, "exited");
        self.record(LedgerEvent::Withdrawn {
            account: *caller,
            amount: withdrawn,
        });
        if reward > 0 {
            self.record(LedgerEvent::RewardPaid {
                account: *caller,
                amount: reward,
            });
        }
        Ok(ExitReceipt { withdrawn, reward })
    }
}
