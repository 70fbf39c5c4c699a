//! Run counters

use std::time::Duration;

use serde::{Serialize, Serializer};

/// Counters for one run. Written by the coordinating task only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,

    /// References given, duplicates included
    pub asked: usize,
    /// References that got a verdict list
    pub checked: usize,
    /// Literal repeats of an earlier reference
    pub duplicates: usize,
    /// References whose tag is no semantic version
    pub non_semver: usize,
    /// References without a tag
    pub non_tagged: usize,
    pub invalid_spec: usize,
    /// References whose repository could not be fetched
    pub fetch_failed: usize,

    pub fetch: FetchStats,
}

/// Fetch-related counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStats {
    /// Wall time from scheduling the first fetch until all fetches finished
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Fetch calls issued, one per distinct registry and repository
    pub fetched: usize,
}

impl RunStats {
    /// Every asked reference ends up in exactly one counter
    pub fn reconciles(&self) -> bool {
        self.asked
            == self.duplicates
                + self.invalid_spec
                + self.non_tagged
                + self.non_semver
                + self.fetch_failed
                + self.checked
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
