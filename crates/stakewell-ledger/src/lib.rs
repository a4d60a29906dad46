//! # stakewell-ledger
//!
//! Single-pool staking ledger with continuous reward accrual.
//!
//! Stakers deposit a staking asset and accrue a reward asset in proportion
//! to their time-weighted share of the pool. A global reward-per-token
//! accumulator lets every account settle its entitlement in O(1), without
//! iterating over the other stakers.
//!
//! ## Modules
//!
//! - [`accrual`] - Reward-per-token accumulator and settlement math
//! - [`epoch`] - Reward period funding, rollover and duration changes
//! - [`position`] - Deposits, withdrawals, claims and exit
//! - [`roles`] - Owner and rewards-distributor guards
//! - [`pool`] - The [`StakingPool`] state, queries and snapshots
//! - [`wide`] - 256-bit intermediates for scaled products

pub mod accrual;
pub mod epoch;
pub mod pool;
pub mod position;
pub mod roles;
pub mod wide;

pub use accrual::SCALE;
pub use epoch::RateInfo;
pub use pool::{PoolParams, PoolSnapshot, StakingPool};
pub use position::{Account, ExitReceipt};

use stakewell_token::TokenError;
use stakewell_types::{Address, Amount, Timestamp};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Deposit or withdrawal of zero units.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Withdrawal exceeds the staked balance.
    #[error("insufficient staked balance: staked {staked}, requested {requested}")]
    InsufficientBalance {
        /// The account's staked balance.
        staked: Amount,
        /// The requested withdrawal.
        requested: Amount,
    },

    /// The underlying asset transfer failed.
    #[error("asset transfer failed: {0}")]
    TransferFailed(#[from] TokenError),

    /// The caller does not hold the role required for the action.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// The guarded action.
        action: &'static str,
        /// The rejected caller.
        caller: Address,
    },

    /// The funded rate would promise more reward than the pool holds.
    #[error("provided reward too high: requires {required}, pool holds {available}")]
    InsufficientFunding {
        /// Reward needed to pay the new rate for a full period.
        required: Amount,
        /// Reward asset balance held by the pool.
        available: Amount,
    },

    /// The current reward period has not finished yet.
    #[error("reward period active until {period_finish} (now {now})")]
    EpochActive {
        /// End of the running period.
        period_finish: Timestamp,
        /// The time of the rejected call.
        now: Timestamp,
    },

    /// A reward period must last at least one second.
    #[error("reward duration must be greater than zero")]
    ZeroDuration,

    /// Arithmetic overflow in reward or balance computation.
    #[error("arithmetic overflow")]
    Overflow,

    /// The supplied time is earlier than a previously observed one.
    #[error("clock went backwards: last seen {last_seen}, got {now}")]
    ClockRegression {
        /// Latest time committed by the ledger.
        last_seen: Timestamp,
        /// The time of the rejected call.
        now: Timestamp,
    },

    /// A persisted snapshot failed validation.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
