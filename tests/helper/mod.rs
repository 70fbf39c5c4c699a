//! Shared test utilities
#![allow(dead_code)]

mod fetcher;
mod reporter;

use std::sync::Arc;

use cciu::check::{CheckOptions, Checker};
use cciu::image::Normalizer;
use cciu::registry::TagFetcher;

pub use fetcher::ScriptedFetcher;
pub use reporter::{Event, RecordingReporter};

pub fn references(refs: &[&str]) -> Vec<String> {
    refs.iter().map(|s| s.to_string()).collect()
}

/// Checker with default normalization
pub fn create_checker(fetcher: Arc<dyn TagFetcher>, options: CheckOptions) -> Checker {
    Checker::new(fetcher, Normalizer::default(), options)
}
