pub mod completion;
pub mod draft;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod memory;
pub mod notifications;
pub mod schedule;
pub mod service;
pub mod statistics;
pub mod tracker;
pub mod weekday;

pub use crate::error::{CompletionRejected, StoreError, TrackerError, ValidationError};
pub use crate::gateway::TrackerGateway;
pub use crate::memory::{MemoryStore, Snapshot};
pub use crate::service::{TrackerService, TrackerServiceBuilder};
