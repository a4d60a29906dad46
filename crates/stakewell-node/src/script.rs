//! Command scripts for the simulation node.
//!
//! A script is a JSON array of commands, each tagged by `op`. Commands run
//! in order against a [`LedgerService`] driven by a [`ManualClock`]; only
//! `advance` moves time. A failing command is recorded and the script goes
//! on, which lets a script assert that a call is rejected.
//!
//! ```json
//! [
//!   { "op": "mint_staking", "to": "a1a1...", "amount": "1000" },
//!   { "op": "approve_staking", "owner": "a1a1...", "amount": "1000" },
//!   { "op": "deposit", "caller": "a1a1...", "amount": "1000" },
//!   { "op": "advance", "seconds": 3600 },
//!   { "op": "query", "account": "a1a1..." }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use stakewell_types::{Address, Amount};

use crate::service::{Clock, LedgerService, ManualClock, Result};

/// One scripted step.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    MintStaking {
        to: Address,
        #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
        amount: Amount,
    },
    MintRewards {
        to: Address,
        #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
        amount: Amount,
    },
    ApproveStaking {
        owner: Address,
        #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
        amount: Amount,
    },
    TopUpRewards {
        from: Address,
        #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
        amount: Amount,
    },
    Deposit {
        caller: Address,
        #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
        amount: Amount,
    },
    Withdraw {
        caller: Address,
        #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
        amount: Amount,
    },
    Claim {
        caller: Address,
    },
    Exit {
        caller: Address,
    },
    FundEpoch {
        caller: Address,
        #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
        amount: Amount,
    },
    SetEpochDuration {
        caller: Address,
        duration: u64,
    },
    NominateOwner {
        caller: Address,
        nominee: Address,
    },
    AcceptOwnership {
        caller: Address,
    },
    SetRewardsDistributor {
        caller: Address,
        distributor: Address,
    },
    /// Move the manual clock forward.
    Advance {
        seconds: u64,
    },
    /// Report an account's position and holdings.
    Query {
        account: Address,
    },
    /// Report the pool's rate parameters.
    RateInfo,
}

impl Command {
    /// The `op` tag of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::MintStaking { .. } => "mint_staking",
            Command::MintRewards { .. } => "mint_rewards",
            Command::ApproveStaking { .. } => "approve_staking",
            Command::TopUpRewards { .. } => "top_up_rewards",
            Command::Deposit { .. } => "deposit",
            Command::Withdraw { .. } => "withdraw",
            Command::Claim { .. } => "claim",
            Command::Exit { .. } => "exit",
            Command::FundEpoch { .. } => "fund_epoch",
            Command::SetEpochDuration { .. } => "set_epoch_duration",
            Command::NominateOwner { .. } => "nominate_owner",
            Command::AcceptOwnership { .. } => "accept_ownership",
            Command::SetRewardsDistributor { .. } => "set_rewards_distributor",
            Command::Advance { .. } => "advance",
            Command::Query { .. } => "query",
            Command::RateInfo => "rate_info",
        }
    }
}

/// Result of one scripted step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Zero-based position in the script.
    pub step: usize,
    pub op: String,
    /// Clock time the step ran at.
    pub at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Parse a JSON script.
pub fn parse(json: &str) -> serde_json::Result<Vec<Command>> {
    serde_json::from_str(json)
}

/// Run every command in order and collect the outcomes.
pub async fn run(service: &LedgerService<ManualClock>, commands: &[Command]) -> Vec<StepOutcome> {
    let mut outcomes = Vec::with_capacity(commands.len());
    for (step, command) in commands.iter().enumerate() {
        let at = service.clock().now();
        let outcome = match execute(service, command).await {
            Ok(output) => StepOutcome {
                step,
                op: command.name().to_string(),
                at,
                output,
                error: None,
            },
            Err(err) => {
                tracing::warn!(step, op = command.name(), error = %err, "script step failed");
                StepOutcome {
                    step,
                    op: command.name().to_string(),
                    at,
                    output: None,
                    error: Some(err.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

async fn execute(
    service: &LedgerService<ManualClock>,
    command: &Command,
) -> Result<Option<serde_json::Value>> {
    match *command {
        Command::MintStaking { to, amount } => service.mint_staking(to, amount).await?,
        Command::MintRewards { to, amount } => service.mint_rewards(to, amount).await?,
        Command::ApproveStaking { owner, amount } => service.approve_staking(owner, amount).await?,
        Command::TopUpRewards { from, amount } => service.top_up_rewards(from, amount).await?,
        Command::Deposit { caller, amount } => service.deposit(caller, amount).await?,
        Command::Withdraw { caller, amount } => service.withdraw(caller, amount).await?,
        Command::Claim { caller } => {
            let paid = service.claim(caller).await?;
            return Ok(Some(serde_json::json!({ "paid": paid.to_string() })));
        }
        Command::Exit { caller } => {
            let receipt = service.exit(caller).await?;
            return Ok(Some(serde_json::json!({
                "withdrawn": receipt.withdrawn.to_string(),
                "reward": receipt.reward.to_string(),
            })));
        }
        Command::FundEpoch { caller, amount } => service.fund_epoch(caller, amount).await?,
        Command::SetEpochDuration { caller, duration } => {
            service.set_epoch_duration(caller, duration).await?
        }
        Command::NominateOwner { caller, nominee } => {
            service.nominate_owner(caller, nominee).await?
        }
        Command::AcceptOwnership { caller } => service.accept_ownership(caller).await?,
        Command::SetRewardsDistributor {
            caller,
            distributor,
        } => service.set_rewards_distributor(caller, distributor).await?,
        Command::Advance { seconds } => {
            let now = service.clock().advance(seconds);
            return Ok(Some(serde_json::json!({ "now": now })));
        }
        Command::Query { account } => {
            let earned = service.earned(account).await?;
            let staked = service.staked_balance_of(account).await;
            let balances = service.balances(account).await;
            return Ok(Some(serde_json::json!({
                "account": account,
                "staked": staked.to_string(),
                "earned": earned.to_string(),
                "balances": balances,
            })));
        }
        Command::RateInfo => {
            let info = service.rate_info().await?;
            return Ok(serde_json::to_value(info).ok());
        }
    }
    Ok(None)
}
