//! Reporter that records what the checker reports

use std::io;
use std::time::Duration;

use cciu::check::{CheckError, RunStats};
use cciu::output::Reporter;
use cciu::version::{SemanticVersion, Verdict};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Requested reference and error message, if any
    Reference(String, Option<String>),
    /// `name:tag` and the candidate's verdict
    Tag(String, Verdict),
}

#[derive(Default)]
pub struct RecordingReporter {
    pub events: Vec<Event>,
    pub flushed: Option<RunStats>,
}

impl RecordingReporter {
    /// Requested references in report order
    pub fn references(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Reference(name, _) => Some(name.as_str()),
                Event::Tag(..) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Reference(name, Some(error)) => Some((name.as_str(), error.as_str())),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn begin_reference(&mut self, name: &str, _: Duration, error: Option<&CheckError>) {
        self.events.push(Event::Reference(
            name.to_string(),
            error.map(|e| e.to_string()),
        ));
    }

    fn report_tag(
        &mut self,
        name: &str,
        _base: &SemanticVersion,
        candidate: &SemanticVersion,
        verdict: Verdict,
    ) {
        self.events
            .push(Event::Tag(format!("{}:{}", name, candidate), verdict));
    }

    fn flush(&mut self, stats: &RunStats) -> io::Result<()> {
        self.flushed = Some(stats.clone());
        Ok(())
    }
}
