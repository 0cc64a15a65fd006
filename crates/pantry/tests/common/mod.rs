//! Shared test utilities for pantry integration tests.
//!
//! - `TestHarness` wires an orchestrator to a mock HTTP source and an
//!   in-memory database
//! - recording doubles for the search indexer and alert channels

pub mod doubles;
pub mod harness;

pub use doubles::{RecordingAlerts, RecordingIndexer};
pub use harness::TestHarness;
