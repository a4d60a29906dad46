//! Ledger events.
//!
//! Every committed state change of the staking ledger records one of these
//! events. They form the audit trail consumed by external observers.
//! Amounts serialize as decimal strings so that `u128` values survive JSON
//! and TOML round trips.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{Address, Amount};

/// All ledger event kinds.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Staking asset deposited.
    Staked {
        account: Address,
        #[serde_as(as = "DisplayFromStr")]
        amount: Amount,
    },
    /// Staking asset withdrawn.
    Withdrawn {
        account: Address,
        #[serde_as(as = "DisplayFromStr")]
        amount: Amount,
    },
    /// Reward asset paid out to an account.
    RewardPaid {
        account: Address,
        #[serde_as(as = "DisplayFromStr")]
        amount: Amount,
    },
    /// A new reward period was funded.
    RewardFunded {
        #[serde_as(as = "DisplayFromStr")]
        amount: Amount,
    },
    /// The reward period length changed.
    EpochDurationUpdated { new_duration: u64 },
    /// The owner nominated a successor.
    OwnerNominated { nominee: Address },
    /// Ownership was accepted by the nominee.
    OwnerChanged {
        previous: Address,
        current: Address,
    },
    /// The rewards distributor role moved to a new principal.
    RewardsDistributorUpdated { distributor: Address },
}

/// Coarse event category, used for subscription filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Deposits, withdrawals and reward payouts.
    Position,
    /// Funding and duration changes.
    Epoch,
    /// Role changes.
    Governance,
}

impl LedgerEvent {
    /// Stable snake_case name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Staked { .. } => "staked",
            LedgerEvent::Withdrawn { .. } => "withdrawn",
            LedgerEvent::RewardPaid { .. } => "reward_paid",
            LedgerEvent::RewardFunded { .. } => "reward_funded",
            LedgerEvent::EpochDurationUpdated { .. } => "epoch_duration_updated",
            LedgerEvent::OwnerNominated { .. } => "owner_nominated",
            LedgerEvent::OwnerChanged { .. } => "owner_changed",
            LedgerEvent::RewardsDistributorUpdated { .. } => "rewards_distributor_updated",
        }
    }

    /// The category this event belongs to.
    pub fn category(&self) -> EventCategory {
        match self {
            LedgerEvent::Staked { .. }
            | LedgerEvent::Withdrawn { .. }
            | LedgerEvent::RewardPaid { .. } => EventCategory::Position,
            LedgerEvent::RewardFunded { .. } | LedgerEvent::EpochDurationUpdated { .. } => {
                EventCategory::Epoch
            }
            LedgerEvent::OwnerNominated { .. }
            | LedgerEvent::OwnerChanged { .. }
            | LedgerEvent::RewardsDistributorUpdated { .. } => EventCategory::Governance,
        }
    }

    /// The account an event concerns, if any.
    pub fn account(&self) -> Option<Address> {
        match self {
            LedgerEvent::Staked { account, .. }
            | LedgerEvent::Withdrawn { account, .. }
            | LedgerEvent::RewardPaid { account, .. } => Some(*account),
            _ => None,
        }
    }
}
