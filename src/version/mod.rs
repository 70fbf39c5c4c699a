//! Version layer: turning tags into comparable versions
//!
//! ```text
//! raw tags ──▶ SemanticVersion::parse ──▶ FilterChain ──▶ sort_descending
//!                                                              │
//!                                   base version ──▶ evaluate ◀┘
//! ```
//!
//! # Modules
//!
//! - [`semver`]: lenient tag parsing into [`SemanticVersion`]
//! - [`filter`]: tag filters and their AND-chain
//! - [`tags`]: building the filtered, newest-first version list
//! - [`verdict`]: ahead / equal / outdated classification

pub mod filter;
pub mod semver;
pub mod tags;
pub mod verdict;

pub use filter::{Filter, FilterChain};
pub use semver::{Precision, SemanticVersion};
pub use tags::{build_filtered_set, sort_descending};
pub use verdict::{CompareMode, Verdict, evaluate};
