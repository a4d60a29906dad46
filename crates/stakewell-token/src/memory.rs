//! In-memory fungible token.
//!
//! Balances and allowances live in hash maps. The token can be told to
//! reject transfers touching a given account, which stands in for a
//! receiver that refuses the asset.

use std::collections::{HashMap, HashSet};

use stakewell_types::{Address, Amount};

use crate::{FungibleToken, Result, TokenError};

/// An in-memory fungible asset.
#[derive(Clone, Debug, Default)]
pub struct MemoryToken {
    asset_id: String,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    rejected: HashSet<Address>,
}

impl MemoryToken {
    /// Create an empty token with the given asset identifier.
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            ..Self::default()
        }
    }

    /// Create `amount` new units credited to `to`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Overflow`] if the supply or balance would overflow
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<()> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(*to, balance);
        tracing::trace!(asset = %self.asset_id, %to, amount, "token: minted");
        Ok(())
    }

    /// Total units in existence.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Refuse every subsequent transfer from or to `account`.
    pub fn reject_transfers_for(&mut self, account: &Address) {
        self.rejected.insert(*account);
    }

    /// Lift a previous [`MemoryToken::reject_transfers_for`].
    pub fn accept_transfers_for(&mut self, account: &Address) {
        self.rejected.remove(account);
    }

    fn check_accepted(&self, account: &Address) -> Result<()> {
        if self.rejected.contains(account) {
            return Err(TokenError::Rejected { account: *account });
        }
        Ok(())
    }

    /// Validate a move and return the new `(from, to)` balances.
    fn plan_move(&self, from: &Address, to: &Address, amount: Amount) -> Result<(Amount, Amount)> {
        self.check_accepted(from)?;
        self.check_accepted(to)?;

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                available: from_balance,
                required: amount,
            });
        }
        if from == to {
            return Ok((from_balance, from_balance));
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Ok((from_balance - amount, to_balance))
    }

    fn apply_move(&mut self, from: &Address, to: &Address, balances: (Amount, Amount)) {
        self.balances.insert(*from, balances.0);
        self.balances.insert(*to, balances.1);
    }
}

impl FungibleToken for MemoryToken {
    fn asset_id(&self) -> &str {
        &self.asset_id
    }

    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn check_transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        self.plan_move(from, to, amount).map(|_| ())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let balances = self.plan_move(from, to, amount)?;
        self.apply_move(from, to, balances);
        tracing::trace!(asset = %self.asset_id, %from, %to, amount, "token: transfer");
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                available: allowance,
                required: amount,
            });
        }
        let balances = self.plan_move(from, to, amount)?;
        self.apply_move(from, to, balances);
        self.allowances.insert((*from, *spender), allowance - amount);
        tracing::trace!(
            asset = %self.asset_id,
            %spender,
            %from,
            %to,
            amount,
            "token: transfer_from"
        );
        Ok(())
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*owner, *spender), amount);
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }
}
