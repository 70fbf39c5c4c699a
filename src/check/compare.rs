//! Per-reference comparison pass

use tracing::debug;

use crate::check::error::CheckError;
use crate::check::orchestrator::{CheckOptions, FetchResult};
use crate::check::stats::RunStats;
use crate::image::ImageSpec;
use crate::output::Reporter;
use crate::version::{
    Filter, FilterChain, SemanticVersion, build_filtered_set, evaluate, sort_descending,
};

/// Filter chain for one reference. The huge-gap filter is always present.
pub fn build_filter_chain(base: &SemanticVersion, label: &str, options: &CheckOptions) -> FilterChain {
    let mut chain = FilterChain::new()
        .with(Filter::huge_gap(base, options.max_major_gap), true)
        .with(Filter::PreReleaseFamilies, options.exclude_prerelease)
        .with(
            Filter::StrictLabel(label.to_string()),
            options.strict_labels,
        );
    if let Some(keep) = Filter::keep_level(base, options.keep_level) {
        chain.push(keep);
    }
    chain
}

/// Compare one reference against its repository's fetched tags and report
/// every surviving tag, newest first.
pub fn compare_reference<R: Reporter + ?Sized>(
    spec: &ImageSpec,
    fetched: &FetchResult,
    options: &CheckOptions,
    reporter: &mut R,
    stats: &mut RunStats,
) {
    let requested = spec.to_string();

    let Some(base) = SemanticVersion::parse(&spec.tag) else {
        stats.non_semver += 1;
        // Already reported before fetching in semver-only mode
        if !options.skip_non_semver {
            let error = CheckError::NotSemanticVersion {
                tag: spec.tag.clone(),
                reference: requested.clone(),
            };
            debug!("{}", error);
            reporter.begin_reference(&requested, fetched.elapsed, Some(&error));
        }
        return;
    };

    let tags = match &fetched.tags {
        Ok(tags) => tags,
        Err(source) => {
            stats.fetch_failed += 1;
            let error = CheckError::FetchFailure {
                reference: requested.clone(),
                source: source.clone(),
            };
            reporter.begin_reference(&requested, fetched.elapsed, Some(&error));
            return;
        }
    };

    let chain = build_filter_chain(&base, &spec.label, options);
    let mut versions = build_filtered_set(tags, &chain);
    sort_descending(&mut versions);
    debug!(
        "{}: {} of {} tags survived {} filters",
        requested,
        versions.len(),
        tags.len(),
        chain.filters().len()
    );

    stats.checked += 1;
    reporter.begin_reference(&requested, fetched.elapsed, None);

    let name = spec.without_tag().to_string();
    for candidate in &versions {
        let verdict = evaluate(&base, candidate, options.compare_mode);
        reporter.report_tag(&name, &base, candidate, verdict);
    }
}
