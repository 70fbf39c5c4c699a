//! Verdicts: how a candidate tag relates to the requested one

use serde::Serialize;

use crate::version::filter::tilde_range;
use crate::version::semver::{Precision, SemanticVersion};

/// Classification of a candidate relative to the base, from the candidate's
/// point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ahead,
    Equal,
    Outdated,
}

impl Verdict {
    /// The same relation seen from the other side
    pub fn inverse(self) -> Self {
        match self {
            Verdict::Ahead => Verdict::Outdated,
            Verdict::Equal => Verdict::Equal,
            Verdict::Outdated => Verdict::Ahead,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ahead => "ahead",
            Verdict::Equal => "equal",
            Verdict::Outdated => "outdated",
        }
    }
}

/// How base and candidate are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompareMode {
    /// Plain precedence comparison
    #[default]
    Exact,
    /// A partial base (`8` or `8.4`) stands for the tilde range it implies;
    /// every candidate inside that range is `Equal`.
    Partial,
}

/// Compare a candidate against the base.
///
/// The candidate's pre-release is cleared first: for container tags it is
/// usually a label (`1.0.0-alpine`), and semver precedence would otherwise
/// rank it below the plain release.
pub fn evaluate(base: &SemanticVersion, candidate: &SemanticVersion, mode: CompareMode) -> Verdict {
    let candidate = candidate.without_prerelease();

    if mode == CompareMode::Partial && within_partial_range(base, &candidate) {
        return Verdict::Equal;
    }

    match candidate.cmp(base) {
        std::cmp::Ordering::Greater => Verdict::Ahead,
        std::cmp::Ordering::Equal => Verdict::Equal,
        std::cmp::Ordering::Less => Verdict::Outdated,
    }
}

fn within_partial_range(base: &SemanticVersion, candidate: &SemanticVersion) -> bool {
    let minor = match base.precision() {
        Precision::Patch => return false,
        Precision::Minor => Some(base.minor()),
        Precision::Major => None,
    };
    tilde_range(base.major(), minor).matches(candidate.version())
}
