//! # stakewell-node
//!
//! Host for a single staking pool: configuration, a mutex-serialized
//! service over the ledger, event fan-out, and a command-script runner used
//! by the `stakewell-node` binary.
//!
//! ## Modules
//!
//! - [`config`] - TOML configuration with defaults
//! - [`events`] - Broadcast bus for ledger events
//! - [`service`] - `LedgerService`, clocks
//! - [`script`] - JSON command scripts

pub mod config;
pub mod events;
pub mod script;
pub mod service;

pub use config::NodeConfig;
pub use events::{Event, EventBus, EventFilter};
pub use service::{Clock, LedgerService, ManualClock, ServiceError, SystemClock};
