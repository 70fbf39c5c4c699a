//! Building the ordered set of candidate versions from raw registry tags

use crate::version::filter::FilterChain;
use crate::version::semver::SemanticVersion;

/// Parse raw tags and keep the versions the filter accepts.
///
/// Tags that are no semantic version are dropped silently; registries
/// commonly mix `latest`, commit hashes and the like with versioned tags.
pub fn build_filtered_set<S: AsRef<str>>(
    raw_tags: &[S],
    filter: &FilterChain,
) -> Vec<SemanticVersion> {
    raw_tags
        .iter()
        .filter_map(|tag| SemanticVersion::parse(tag.as_ref()))
        .filter(|v| filter.accepts(v))
        .collect()
}

/// Sort newest first. The sort is stable, so tags of equal precedence
/// (e.g. `3.13` and `3.13.0`) keep the order the registry listed them in.
pub fn sort_descending(versions: &mut [SemanticVersion]) {
    versions.sort_by(|a, b| b.cmp(a));
}
