//! Tag filters
//!
//! A [`Filter`] decides whether a fetched version is relevant for a requested
//! one; a [`FilterChain`] ANDs several of them in a fixed order.

use semver::{Comparator, Op, Prerelease, VersionReq};

use crate::config::KeepLevel;
use crate::version::semver::SemanticVersion;

/// Pre-release families dropped by [`Filter::PreReleaseFamilies`], checked in
/// this order
const PRERELEASE_FAMILIES: [&str; 3] = ["alpha", "beta", "rc"];

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Rejects versions whose major exceeds `base_major + limit`.
    ///
    /// Some repositories tag with dates (`20210530`), which parse as a huge
    /// major version and would always look newest.
    HugeGap { base_major: u64, limit: u64 },
    /// Rejects alpha, beta and rc pre-releases
    PreReleaseFamilies,
    /// Rejects versions whose pre-release is not exactly this label
    StrictLabel(String),
    /// Rejects versions outside the range, ignoring their pre-release
    KeepLevel(VersionReq),
}

impl Filter {
    pub fn huge_gap(base: &SemanticVersion, limit: u64) -> Self {
        Filter::HugeGap {
            base_major: base.major(),
            limit,
        }
    }

    /// Range filter for the given level, or None for `KeepLevel::None`
    pub fn keep_level(base: &SemanticVersion, level: KeepLevel) -> Option<Self> {
        let minor = match level {
            KeepLevel::None => return None,
            KeepLevel::Major => None,
            KeepLevel::Minor => Some(base.minor()),
        };
        Some(Filter::KeepLevel(tilde_range(base.major(), minor)))
    }

    pub fn accepts(&self, version: &SemanticVersion) -> bool {
        match self {
            Filter::HugeGap { base_major, limit } => {
                within_gap(*base_major, version.major(), *limit)
            }
            Filter::PreReleaseFamilies => {
                let pre = version.prerelease();
                !PRERELEASE_FAMILIES
                    .iter()
                    .any(|family| pre.starts_with(family))
            }
            Filter::StrictLabel(label) => version.prerelease() == label,
            Filter::KeepLevel(req) => req.matches(version.without_prerelease().version()),
        }
    }
}

/// `~major` or `~major.minor`
pub(crate) fn tilde_range(major: u64, minor: Option<u64>) -> VersionReq {
    VersionReq {
        comparators: vec![Comparator {
            op: Op::Tilde,
            major,
            minor,
            patch: None,
            pre: Prerelease::EMPTY,
        }],
    }
}

/// Majors above `i64::MAX` and sums that overflow are rejected.
fn within_gap(base_major: u64, candidate_major: u64, limit: u64) -> bool {
    let safe = i64::MAX as u64;
    if base_major > safe || candidate_major > safe {
        return false;
    }
    match base_major.checked_add(limit) {
        Some(ceiling) => candidate_major <= ceiling,
        None => false,
    }
}

/// Filters applied in insertion order; the first rejection wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Appends the filter when `enabled` is true
    pub fn with(mut self, filter: Filter, enabled: bool) -> Self {
        if enabled {
            self.push(filter);
        }
        self
    }

    pub fn accepts(&self, version: &SemanticVersion) -> bool {
        self.filters.iter().all(|f| f.accepts(version))
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FromIterator<Filter> for FilterChain {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
