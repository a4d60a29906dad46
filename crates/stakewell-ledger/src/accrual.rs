//! Reward-per-token accumulator.
//!
//! The accumulator tracks the reward one unit of stake would have earned had
//! it been staked since the pool was created. Each account keeps a snapshot
//! of the accumulator taken at its last settlement, so its entitlement is
//! the difference times its balance.
//!
//! ## Formula
//!
//! ```text
//! rpt    += (applicable_time - last_update_time) * reward_rate / total_staked
//! earned  = staked * (rpt - rpt_paid) / SCALE + rewards_owed
//! ```
//!
//! `reward_rate` is already multiplied by [`SCALE`]. Both products are
//! formed in 256 bits before dividing. Every division truncates, so
//! rounding never pays an account more than it is owed.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use stakewell_types::{Amount, Timestamp, REWARD_PER_TOKEN_SCALE};

use crate::position::Account;
use crate::wide::mul_div;
use crate::{LedgerError, Result};

/// Fixed-point multiplier for the accumulator and the reward rate.
pub const SCALE: u128 = REWARD_PER_TOKEN_SCALE;

/// Global accrual state of the pool.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accumulator {
    /// Cumulative reward per staked unit, scaled by [`SCALE`].
    #[serde_as(as = "DisplayFromStr")]
    pub reward_per_token_stored: u128,
    /// Time up to which the accumulator has been folded.
    pub last_update_time: Timestamp,
}

/// Compute the accumulator value at `applicable_time`.
///
/// With nothing staked the accumulator is frozen: nobody is eligible, and
/// the elapsed time is simply skipped.
///
/// # Errors
///
/// - [`LedgerError::Overflow`] on arithmetic overflow
pub fn reward_per_token(
    stored: u128,
    last_update_time: Timestamp,
    applicable_time: Timestamp,
    reward_rate: u128,
    total_staked: Amount,
) -> Result<u128> {
    if total_staked == 0 {
        return Ok(stored);
    }

    let elapsed = u128::from(applicable_time.saturating_sub(last_update_time));
    let delta = mul_div(elapsed, reward_rate, total_staked)?;

    stored.checked_add(delta).ok_or(LedgerError::Overflow)
}

/// Total reward owed to a position given the current accumulator value.
///
/// # Errors
///
/// - [`LedgerError::Overflow`] on arithmetic overflow, or if `rpt_paid`
///   is ahead of `rpt`
pub fn earned(staked: Amount, rpt: u128, rpt_paid: u128, rewards_owed: Amount) -> Result<Amount> {
    let delta = rpt.checked_sub(rpt_paid).ok_or(LedgerError::Overflow)?;
    let fresh = mul_div(staked, delta, SCALE)?;
    rewards_owed.checked_add(fresh).ok_or(LedgerError::Overflow)
}

impl Accumulator {
    /// Accumulator value at `applicable_time`, without mutating state.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn current(
        &self,
        applicable_time: Timestamp,
        reward_rate: u128,
        total_staked: Amount,
    ) -> Result<u128> {
        reward_per_token(
            self.reward_per_token_stored,
            self.last_update_time,
            applicable_time,
            reward_rate,
            total_staked,
        )
    }

    /// Fold elapsed time up to `applicable_time` into the accumulator.
    ///
    /// Returns the new accumulator value.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Overflow`] on arithmetic overflow
    pub fn settle(
        &mut self,
        applicable_time: Timestamp,
        reward_rate: u128,
        total_staked: Amount,
    ) -> Result<u128> {
        let rpt = self.current(applicable_time, reward_rate, total_staked)?;
        self.reward_per_token_stored = rpt;
        self.last_update_time = self.last_update_time.max(applicable_time);

        tracing::trace!(
            rpt,
            last_update_time = self.last_update_time,
            total_staked,
            "accrual: settled accumulator"
        );

        Ok(rpt)
    }
}

/// Credit an account with everything it earned up to `rpt` and move its
/// checkpoint forward.
///
/// Returns the newly credited amount.
///
/// # Errors
///
/// - [`LedgerError::Overflow`] on arithmetic overflow
pub fn settle_account(account: &mut Account, rpt: u128) -> Result<Amount> {
    let owed = earned(
        account.staked_balance,
        rpt,
        account.reward_per_token_paid,
        account.rewards_owed,
    )?;
    let credited = owed - account.rewards_owed;
    account.rewards_owed = owed;
    account.reward_per_token_paid = rpt;
    Ok(credited)
}
