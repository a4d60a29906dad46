//! # stakewell-token
//!
//! The fungible-asset interface the staking ledger needs from its custody
//! layer, plus an in-memory implementation.
//!
//! ## Modules
//!
//! - [`memory`] - In-memory fungible token with balances and allowances

pub mod memory;

pub use memory::MemoryToken;

use stakewell_types::{Address, Amount};

/// Error types for token operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The sender does not hold enough of the asset.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        /// Balance held by the sender.
        available: Amount,
        /// Amount requested.
        required: Amount,
    },

    /// The spender has not been approved for enough of the asset.
    #[error("insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance {
        /// Allowance granted to the spender.
        available: Amount,
        /// Amount requested.
        required: Amount,
    },

    /// The transfer was refused for this account.
    #[error("transfer rejected for {account}")]
    Rejected {
        /// The account that refused the transfer.
        account: Address,
    },

    /// Arithmetic overflow in a balance update.
    #[error("arithmetic overflow in token balance")]
    Overflow,
}

/// Convenience result type for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// A fungible asset with ERC-20 style transfer semantics.
///
/// Every mutating method is all-or-nothing: on error no balance or allowance
/// has changed.
pub trait FungibleToken {
    /// Identifier of the asset (e.g. its ticker).
    fn asset_id(&self) -> &str;

    /// Balance held by `owner`.
    fn balance_of(&self, owner: &Address) -> Amount;

    /// Check, without side effects, that [`FungibleToken::transfer`] with
    /// the same arguments would succeed right now.
    ///
    /// Implementations must keep the two in agreement: if this returns
    /// `Ok`, a `transfer` with the same arguments made before any other
    /// mutation of this token must also succeed. The ledger dry-runs both
    /// payouts of an exit through this method and relies on it to never
    /// leave one transfer made and the other failed.
    fn check_transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<()>;

    /// Move `amount` from `from` to `to`, authorized by `from`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance granted by `from`.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()>;

    /// Set the allowance of `spender` over `owner`'s balance.
    fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount);

    /// Remaining allowance of `spender` over `owner`'s balance.
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;
}
