// # ipwatch-core
//
// Core library for the ipwatch public-IP history tracker.
//
// ## Architecture Overview
//
// This library provides the core functionality for the batch job:
// - **IpResolver**: Trait for determining the current public IPv4 address
// - **HistoryStore**: SQLite-backed persistence for observation periods,
//   gap events and error events
// - **TickEngine**: Decides what one sample means against the history and
//   applies the store mutations
// - **report**: Pure read-only HTML rendering over the persisted history
//
// ## Design Principles
//
// 1. **Stateless ticks**: every invocation is a fresh process; all
//    cross-run state lives in the store
// 2. **Append-mostly history**: periods only gain rows or advance
//    `last_seen`; gap and error records are append-only
// 3. **Availability over strictness**: row-count surprises are logged and
//    recorded, never abort a tick
// 4. **Library-first**: the binary is a thin integration layer

pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::WatchConfig;
pub use engine::{TickEngine, TickOutcome};
pub use error::{Error, Result};
pub use report::{ReportMeta, render_report, write_report};
pub use store::{ErrorEvent, GapEvent, HistoryStore, ObservationPeriod};
pub use traits::IpResolver;
