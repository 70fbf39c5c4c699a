//! JSON report
//!
//! Collects everything and writes a single document on flush.

use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::check::{CheckError, RunStats};
use crate::output::Reporter;
use crate::version::{SemanticVersion, Verdict};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    generated_at: String,
    images: Vec<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<RunStats>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Image {
    requested: String,
    /// The requested tag's view of the newest tag
    verdict: Option<Verdict>,
    tags: Vec<Tag>,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tag {
    name: String,
    version: String,
    verdict: Verdict,
}

pub struct JsonReporter<W: Write> {
    writer: W,
    pretty: bool,
    show_old: bool,
    show_stats: bool,
    generated_at: DateTime<Utc>,
    images: Vec<Image>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
            show_old: false,
            show_stats: false,
            generated_at: Utc::now(),
            images: Vec::new(),
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Keep every tag instead of only the newest
    pub fn show_old(mut self, show_old: bool) -> Self {
        self.show_old = show_old;
        self
    }

    pub fn show_stats(mut self, show_stats: bool) -> Self {
        self.show_stats = show_stats;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    #[cfg(test)]
    fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn begin_reference(&mut self, name: &str, fetch_duration: Duration, error: Option<&CheckError>) {
        self.images.push(Image {
            requested: name.to_string(),
            verdict: None,
            tags: Vec::new(),
            duration_ms: u64::try_from(fetch_duration.as_millis()).unwrap_or(u64::MAX),
            error: error.map(|e| e.to_string()),
        });
    }

    fn report_tag(
        &mut self,
        name: &str,
        _base: &SemanticVersion,
        candidate: &SemanticVersion,
        verdict: Verdict,
    ) {
        let show_old = self.show_old;
        let Some(image) = self.images.last_mut() else {
            return;
        };
        if !show_old && !image.tags.is_empty() {
            return;
        }
        if image.verdict.is_none() {
            image.verdict = Some(verdict.inverse());
        }
        image.tags.push(Tag {
            name: format!("{}:{}", name, candidate),
            version: candidate.to_string(),
            verdict,
        });
    }

    fn flush(&mut self, stats: &RunStats) -> io::Result<()> {
        let document = Document {
            generated_at: self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            images: std::mem::take(&mut self.images),
            stats: self.show_stats.then(|| stats.clone()),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &document)?;
        } else {
            serde_json::to_writer(&mut self.writer, &document)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()
    }
}
