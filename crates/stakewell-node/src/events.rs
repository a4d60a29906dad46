//! Event fan-out.
//!
//! Ledger events drained from the pool after each committed operation are
//! stamped with a sequence number and the operation time, then broadcast to
//! every subscriber. Slow subscribers lag rather than block the ledger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stakewell_types::events::{EventCategory, LedgerEvent};
use stakewell_types::{Address, Timestamp};
use tokio::sync::broadcast;

/// Default subscriber buffer.
pub const DEFAULT_CAPACITY: usize = 1000;

/// A ledger event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Position in the total order of emitted events, starting at 1.
    pub sequence: u64,
    /// Ledger time of the operation that produced the event.
    pub timestamp: Timestamp,
    /// The event itself.
    pub event: LedgerEvent,
}

/// Filter for event subscriptions. `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Only these categories.
    pub categories: Option<Vec<EventCategory>>,
    /// Only events concerning these accounts. Events without an account
    /// never match an account filter.
    pub accounts: Option<Vec<Address>>,
}

/// Event bus for broadcasting ledger events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamp and broadcast an event. Returns the assigned sequence number.
    pub fn emit(&self, timestamp: Timestamp, event: LedgerEvent) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(sequence, event = event.name(), "event emitted");
        // No subscribers is fine.
        let _ = self.sender.send(Event {
            sequence,
            timestamp,
            event,
        });
        sequence
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref categories) = self.categories {
            if !categories.contains(&event.event.category()) {
                return false;
            }
        }

        if let Some(ref accounts) = self.accounts {
            match event.event.account() {
                Some(account) if accounts.contains(&account) => {}
                _ => return false,
            }
        }

        true
    }
}
