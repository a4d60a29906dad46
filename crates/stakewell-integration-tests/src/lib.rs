//! Integration test crate for the stakewell workspace.
//!
//! This crate has no library code. Its tests drive a pool end to end,
//! through the ledger directly and through the node's `LedgerService`.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p stakewell-integration-tests
//! ```
