//! Report rendering
//!
//! The checker drives a [`Reporter`]: one `begin_reference` per requested
//! reference, then one `report_tag` per surviving tag, newest first, and a
//! single `flush` at the end of the run.

pub mod json;
pub mod text;

use std::io::{self, Write};
use std::time::Duration;

use crate::check::{CheckError, RunStats};
use crate::config::{OutputConfig, OutputFormat};
use crate::version::{SemanticVersion, Verdict};

pub use json::JsonReporter;
pub use text::TextReporter;

pub trait Reporter {
    /// Start the section of a requested reference. `error` is set when the
    /// reference produced no tag list.
    fn begin_reference(&mut self, name: &str, fetch_duration: Duration, error: Option<&CheckError>);

    /// One candidate tag of the current reference. `name` is the reference
    /// without tag; `verdict` is from the candidate's point of view.
    fn report_tag(
        &mut self,
        name: &str,
        base: &SemanticVersion,
        candidate: &SemanticVersion,
        verdict: Verdict,
    );

    /// Finish the report. Returns the first write error, if any.
    fn flush(&mut self, stats: &RunStats) -> io::Result<()>;
}

/// Reporter for the configured output format
pub fn create_reporter(config: &OutputConfig, writer: Box<dyn Write>) -> Box<dyn Reporter> {
    match config.format {
        OutputFormat::Text => Box::new(
            TextReporter::new(writer, config.simple_markers)
                .show_old(config.show_old)
                .show_stats(config.show_stats),
        ),
        OutputFormat::Json | OutputFormat::JsonPretty => Box::new(
            JsonReporter::new(writer)
                .pretty(config.format == OutputFormat::JsonPretty)
                .show_old(config.show_old)
                .show_stats(config.show_stats),
        ),
    }
}
