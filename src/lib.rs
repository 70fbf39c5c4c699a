//! cciu checks container image references against their registries and
//! reports whether the pinned tag is current, ahead of, or behind the other
//! tags of the same repository.
//!
//! # Modules
//!
//! - [`image`]: image reference parsing and normalization
//! - [`version`]: semantic versions, tag filters, sorting and verdicts
//! - [`registry`]: tag fetching from container registries
//! - [`check`]: fetch orchestration and the per-reference comparison pass
//! - [`output`]: text and JSON reporters
//! - [`config`]: configuration file and defaults
//! - [`logging`]: tracing subscriber setup

pub mod check;
pub mod config;
pub mod image;
pub mod logging;
pub mod output;
pub mod registry;
pub mod version;
