//! Check layer: fetch orchestration and comparison
//!
//! ```text
//! references ──▶ parse / dedup ──▶ fetch tasks (per key, per-registry slots)
//!                                        │ join
//!                                        ▼
//!                   comparison pass (input order) ──▶ Reporter
//! ```
//!
//! # Modules
//!
//! - [`orchestrator`]: `Checker`, deduplication and concurrent fetching
//! - [`compare`]: per-reference filter chain and verdicts
//! - [`stats`]: run counters
//! - [`error`]: per-reference errors

pub mod compare;
pub mod error;
pub mod orchestrator;
pub mod stats;

pub use error::CheckError;
pub use orchestrator::{CheckOptions, Checker, FetchResult};
pub use stats::{FetchStats, RunStats};
