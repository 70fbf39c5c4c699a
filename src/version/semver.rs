//! Lenient semantic version parsing for container tags
//!
//! Registries are full of tags like `3`, `3.13`, `v1.2.3` or `20210530`,
//! which strict semver rejects. They are accepted here and padded with
//! zeros, while the original literal is kept for display.

use std::cmp::Ordering;
use std::fmt;

use semver::{BuildMetadata, Prerelease, Version};

/// How many numeric components the literal carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    Major,
    Minor,
    Patch,
}

/// A parsed tag. Equality and ordering follow semver precedence and ignore
/// build metadata and the literal.
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    version: Version,
    precision: Precision,
    original: String,
}

impl SemanticVersion {
    /// Parse a tag, returning None if it is no semantic version.
    ///
    /// Examples:
    /// - "1" -> 1.0.0
    /// - "v1.2" -> 1.2.0
    /// - "1.2.3-alpine+b1" -> 1.2.3, pre-release "alpine", build "b1"
    pub fn parse(tag: &str) -> Option<Self> {
        let literal = tag.strip_prefix('v').unwrap_or(tag);

        let (rest, build) = match literal.split_once('+') {
            Some((_, "")) => return None,
            Some((rest, build)) => (rest, BuildMetadata::new(build).ok()?),
            None => (literal, BuildMetadata::EMPTY),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((_, "")) => return None,
            Some((core, pre)) => (core, Prerelease::new(pre).ok()?),
            None => (rest, Prerelease::EMPTY),
        };

        let numbers = core
            .split('.')
            .map(parse_number)
            .collect::<Option<Vec<u64>>>()?;

        let (major, minor, patch, precision) = match numbers.as_slice() {
            [major] => (*major, 0, 0, Precision::Major),
            [major, minor] => (*major, *minor, 0, Precision::Minor),
            [major, minor, patch] => (*major, *minor, *patch, Precision::Patch),
            _ => return None,
        };

        let mut version = Version::new(major, minor, patch);
        version.pre = pre;
        version.build = build;

        Some(Self {
            version,
            precision,
            original: tag.to_string(),
        })
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// Pre-release identifier, empty if none
    pub fn prerelease(&self) -> &str {
        self.version.pre.as_str()
    }

    /// Build metadata, empty if none
    pub fn build(&self) -> &str {
        self.version.build.as_str()
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// The tag as it was found
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Normalized semver value
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Copy with the pre-release identifier cleared. The literal is kept so
    /// the copy still displays as the original tag.
    pub fn without_prerelease(&self) -> Self {
        let mut copy = self.clone();
        copy.version.pre = Prerelease::EMPTY;
        copy
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.version, &other.version);
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            .then_with(|| a.pre.cmp(&b.pre))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn parse_number(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
