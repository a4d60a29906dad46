//! # stakewell-types
//!
//! Shared domain types used across the stakewell workspace: the principal
//! [`Address`], amount and time aliases, protocol constants, and the
//! [`events::LedgerEvent`] audit trail emitted by the staking ledger.

pub mod address;
pub mod events;

pub use address::Address;

/// Amount of an asset in its smallest denomination.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Default reward period length in seconds (7 days).
pub const DEFAULT_REWARDS_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Fixed-point multiplier for the reward-per-token accumulator and the
/// reward rate (10^18).
pub const REWARD_PER_TOKEN_SCALE: u128 = 1_000_000_000_000_000_000;

/// Error types for parsing shared types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The address string is not valid hex.
    #[error("invalid address hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The address has the wrong number of bytes.
    #[error("invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },
}

/// Convenience result type for shared type parsing.
pub type Result<T> = std::result::Result<T, TypesError>;
