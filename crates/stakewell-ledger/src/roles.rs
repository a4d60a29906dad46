//! Owner and rewards-distributor roles.
//!
//! Both roles are single principals compared by equality. Ownership moves in
//! two steps: the owner nominates a successor, and the nominee accepts.

use serde::{Deserialize, Serialize};
use stakewell_types::events::LedgerEvent;
use stakewell_types::Address;

use crate::pool::StakingPool;
use crate::{LedgerError, Result};

/// Principals holding the pool's privileged roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    /// May change the reward duration and reassign roles.
    pub owner: Address,
    /// Pending owner, set by [`StakingPool::nominate_owner`].
    pub nominated_owner: Option<Address>,
    /// May fund reward periods.
    pub rewards_distributor: Address,
}

/// Reject `caller` unless it is `expected`.
///
/// # Errors
///
/// - [`LedgerError::Unauthorized`] if the principals differ
pub fn ensure_role(expected: &Address, caller: &Address, action: &'static str) -> Result<()> {
    if expected != caller {
        tracing::warn!(%caller, action, "unauthorized call rejected");
        return Err(LedgerError::Unauthorized {
            action,
            caller: *caller,
        });
    }
    Ok(())
}

impl<S, R> StakingPool<S, R> {
    /// Nominate a new owner. Takes effect once the nominee accepts.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` is not the owner
    pub fn nominate_owner(&mut self, caller: &Address, nominee: Address) -> Result<()> {
        ensure_role(&self.roles.owner, caller, "nominate an owner")?;

        self.roles.nominated_owner = Some(nominee);
        tracing::info!(%nominee, "owner nominated");
        self.record(LedgerEvent::OwnerNominated { nominee });
        Ok(())
    }

    /// Accept a pending nomination.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` is not the nominee
    pub fn accept_ownership(&mut self, caller: &Address) -> Result<()> {
        let Some(nominee) = self.roles.nominated_owner else {
            return Err(LedgerError::Unauthorized {
                action: "accept ownership",
                caller: *caller,
            });
        };
        ensure_role(&nominee, caller, "accept ownership")?;

        let previous = self.roles.owner;
        self.roles.owner = nominee;
        self.roles.nominated_owner = None;
        tracing::info!(%previous, current = %nominee, "ownership transferred");
        self.record(LedgerEvent::OwnerChanged {
            previous,
            current: nominee,
        });
        Ok(())
    }

    /// Hand the rewards-distributor role to another principal.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` is not the owner
    pub fn set_rewards_distributor(
        &mut self,
        caller: &Address,
        distributor: Address,
    ) -> Result<()> {
        ensure_role(&self.roles.owner, caller, "set the rewards distributor")?;

        self.roles.rewards_distributor = distributor;
        tracing::info!(%distributor, "rewards distributor updated");
        self.record(LedgerEvent::RewardsDistributorUpdated { distributor });
        Ok(())
    }
}
