//! Human readable report

use std::io::{self, Write};
use std::time::Duration;

use crate::check::{CheckError, RunStats};
use crate::output::Reporter;
use crate::version::{SemanticVersion, Verdict};

const UNICODE_MARKERS: Markers = Markers {
    ahead: "▲",
    equal: "=",
    outdated: "▼",
};

const SIMPLE_MARKERS: Markers = Markers {
    ahead: "^",
    equal: "=",
    outdated: "v",
};

#[derive(Debug, Clone, Copy)]
struct Markers {
    ahead: &'static str,
    equal: &'static str,
    outdated: &'static str,
}

impl Markers {
    fn get(&self, verdict: Verdict) -> &'static str {
        match verdict {
            Verdict::Ahead => self.ahead,
            Verdict::Equal => self.equal,
            Verdict::Outdated => self.outdated,
        }
    }
}

/// Prints one header line per reference and one marked line per tag:
///
/// ```text
/// alpine:3.12 # fetched in 412ms
/// ▲	alpine:3.13
/// ```
pub struct TextReporter<W: Write> {
    writer: W,
    markers: Markers,
    show_old: bool,
    show_stats: bool,
    printed_tag: bool,
    error: Option<io::Error>,
}

impl<W: Write> TextReporter<W> {
    pub fn new(writer: W, simple_markers: bool) -> Self {
        Self {
            writer,
            markers: if simple_markers {
                SIMPLE_MARKERS
            } else {
                UNICODE_MARKERS
            },
            show_old: false,
            show_stats: false,
            printed_tag: false,
            error: None,
        }
    }

    /// Print every tag instead of only the newest
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

    /// Keep the first write error for `flush`
    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result
            && self.error.is_none()
        {
            self.error = Some(e);
        }
    }

    fn write_stats(&mut self, stats: &RunStats) -> io::Result<()> {
        let w = &mut self.writer;
        writeln!(w, "---")?;
        writeln!(w, "duration: {:?}", round_millis(stats.duration))?;
        writeln!(w, "asked: {}", stats.asked)?;
        writeln!(w, "checked: {}", stats.checked)?;
        writeln!(w, "non-semver: {}", stats.non_semver)?;
        writeln!(w, "duplicates: {}", stats.duplicates)?;
        writeln!(w, "invalid: {}", stats.invalid_spec)?;
        writeln!(w, "non-tagged: {}", stats.non_tagged)?;
        writeln!(w, "fetch failures: {}", stats.fetch_failed)?;
        writeln!(
            w,
            "fetched: {} in {:?}",
            stats.fetch.fetched,
            round_millis(stats.fetch.duration)
        )
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn begin_reference(&mut self, name: &str, fetch_duration: Duration, error: Option<&CheckError>) {
        self.printed_tag = false;
        let mut result = writeln!(
            self.writer,
            "{} # fetched in {:?}",
            name,
            round_millis(fetch_duration)
        );
        if let Some(error) = error {
            result = result.and_then(|_| writeln!(self.writer, "\t{}", error));
        }
        self.record(result);
    }

    fn report_tag(
        &mut self,
        name: &str,
        _base: &SemanticVersion,
        candidate: &SemanticVersion,
        verdict: Verdict,
    ) {
        if self.printed_tag && !self.show_old {
            return;
        }
        let marker = self.markers.get(verdict);
        let result = writeln!(self.writer, "{}\t{}:{}", marker, name, candidate);
        self.record(result);
        self.printed_tag = true;
    }

    fn flush(&mut self, stats: &RunStats) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        if self.show_stats {
            self.write_stats(stats)?;
        }
        self.writer.flush()
    }
}

/// Round to the nearest millisecond for display
fn round_millis(duration: Duration) -> Duration {
    let millis = (duration.as_nanos() + 500_000) / 1_000_000;
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::check::FetchStats;
    use crate::registry::RegistryError;

    fn v(tag: &str) -> SemanticVersion {
        SemanticVersion::parse(tag).unwrap()
    }

    fn render(reporter: TextReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    fn report_alpine<W: Write>(reporter: &mut TextReporter<W>) {
        let base = v("3.12");
        reporter.begin_reference("alpine:3.12", Duration::from_millis(412), None);
        reporter.report_tag("alpine", &base, &v("3.13"), Verdict::Ahead);
        reporter.report_tag("alpine", &base, &v("3.12"), Verdict::Equal);
        reporter.report_tag("alpine", &base, &v("3.11"), Verdict::Outdated);
    }

    #[test]
    fn prints_only_newest_tag_by_default() {
        let mut reporter = TextReporter::new(Vec::new(), false);

        report_alpine(&mut reporter);
        reporter.flush(&RunStats::default()).unwrap();

        assert_eq!(
            render(reporter),
            "alpine:3.12 # fetched in 412ms\n▲\talpine:3.13\n"
        );
    }

    #[test]
    fn prints_all_tags_with_simple_markers() {
        let mut reporter = TextReporter::new(Vec::new(), true).show_old(true);

        report_alpine(&mut reporter);
        reporter.flush(&RunStats::default()).unwrap();

        assert_eq!(
            render(reporter),
            "alpine:3.12 # fetched in 412ms\n^\talpine:3.13\n=\talpine:3.12\nv\talpine:3.11\n"
        );
    }

    #[test]
    fn newest_tag_is_printed_again_for_next_reference() {
        let mut reporter = TextReporter::new(Vec::new(), true);
        let base = v("1.0");

        reporter.begin_reference("a:1.0", Duration::ZERO, None);
        reporter.report_tag("a", &base, &v("1.1"), Verdict::Ahead);
        reporter.begin_reference("b:1.0", Duration::ZERO, None);
        reporter.report_tag("b", &base, &v("1.0-alpine"), Verdict::Equal);

        assert_eq!(
            render(reporter),
            "a:1.0 # fetched in 0ns\n^\ta:1.1\nb:1.0 # fetched in 0ns\n=\tb:1.0-alpine\n"
        );
    }

    #[test]
    fn header_rounds_fetch_duration_to_milliseconds() {
        let mut reporter = TextReporter::new(Vec::new(), false);

        reporter.begin_reference("alpine:3.12", Duration::from_nanos(412_518_731), None);
        reporter.begin_reference("alpine:3.13", Duration::from_nanos(1_499_731), None);
        reporter.begin_reference("alpine:3.14", Duration::from_nanos(200), None);

        assert_eq!(
            render(reporter),
            "alpine:3.12 # fetched in 413ms\nalpine:3.13 # fetched in 1ms\nalpine:3.14 # fetched in 0ns\n"
        );
    }

    #[test]
    fn prints_error_indented_below_header() {
        let mut reporter = TextReporter::new(Vec::new(), false);
        let error = CheckError::FetchFailure {
            reference: "nope:1.0".to_string(),
            source: Arc::new(RegistryError::NotFound("library/nope".to_string())),
        };

        reporter.begin_reference("nope:1.0", Duration::from_secs(1), Some(&error));

        assert_eq!(
            render(reporter),
            "nope:1.0 # fetched in 1s\n\tFailed to fetch tags for nope:1.0: Repository not found: library/nope\n"
        );
    }

    #[test]
    fn flush_prints_stats_block() {
        let mut reporter = TextReporter::new(Vec::new(), false).show_stats(true);
        let stats = RunStats {
            duration: Duration::from_nanos(1_500_200_000),
            asked: 3,
            checked: 1,
            duplicates: 1,
            non_semver: 1,
            fetch: FetchStats {
                duration: Duration::from_secs(1),
                fetched: 1,
            },
            ..RunStats::default()
        };

        reporter.flush(&stats).unwrap();

        assert_eq!(
            render(reporter),
            "---\nduration: 1.5s\nasked: 3\nchecked: 1\nnon-semver: 1\nduplicates: 1\n\
             invalid: 0\nnon-tagged: 0\nfetch failures: 0\nfetched: 1 in 1s\n"
        );
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn flush_returns_first_write_error() {
        let mut reporter = TextReporter::new(FailingWriter, false);

        report_alpine(&mut reporter);
        let err = reporter.flush(&RunStats::default()).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
