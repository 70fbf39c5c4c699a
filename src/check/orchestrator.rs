//! Fetch orchestration
//!
//! Deduplicates requested references by registry and repository, fetches
//! each repository's tags once in its own task, waits for all of them and
//! only then runs the comparison pass in input order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::check::compare::compare_reference;
use crate::check::error::CheckError;
use crate::check::stats::RunStats;
use crate::config::{Config, DEFAULT_MAX_MAJOR_GAP, KeepLevel};
use crate::image::{ImageSpec, Normalizer};
use crate::output::Reporter;
use crate::registry::{RegistryError, TagFetcher};
use crate::version::{CompareMode, SemanticVersion};

/// Options steering tag selection, comparison and fetching
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOptions {
    pub exclude_prerelease: bool,
    pub strict_labels: bool,
    /// Reject references with a non-semver tag before fetching
    pub skip_non_semver: bool,
    pub keep_level: KeepLevel,
    pub compare_mode: CompareMode,
    pub max_major_gap: u64,
    /// Concurrent fetches per registry host, 0 means unbounded
    pub limit_per_registry: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            exclude_prerelease: false,
            strict_labels: false,
            skip_non_semver: false,
            keep_level: KeepLevel::None,
            compare_mode: CompareMode::Exact,
            max_major_gap: DEFAULT_MAX_MAJOR_GAP,
            limit_per_registry: 0,
        }
    }
}

impl CheckOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            exclude_prerelease: config.check.exclude_prerelease,
            strict_labels: config.check.strict_labels,
            skip_non_semver: config.check.skip_non_semver,
            keep_level: config.check.keep_level(),
            compare_mode: config.check.compare_mode(),
            max_major_gap: config.check.max_major_gap,
            limit_per_registry: config.fetch.limit_per_registry,
        }
    }
}

/// Tags fetched for one registry and repository
#[derive(Debug)]
pub struct FetchResult {
    pub tags: Result<Vec<String>, Arc<RegistryError>>,
    pub elapsed: Duration,
}

impl FetchResult {
    fn failed(error: RegistryError) -> Self {
        Self {
            tags: Err(Arc::new(error)),
            elapsed: Duration::ZERO,
        }
    }
}

/// A reference that passed parsing and waits for its repository's tags
struct Scheduled {
    spec: ImageSpec,
    key: String,
}

/// Per-registry fetch slots. Only the coordinating task creates pools.
struct Admission {
    limit: usize,
    pools: HashMap<String, Arc<Semaphore>>,
}

impl Admission {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            pools: HashMap::new(),
        }
    }

    /// Slot pool for the registry, or None when fetches are unbounded
    fn pool_for(&mut self, registry: &str) -> Option<Arc<Semaphore>> {
        if self.limit == 0 {
            return None;
        }
        let limit = self.limit;
        let pool = self
            .pools
            .entry(registry.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(limit)));
        Some(Arc::clone(pool))
    }
}

/// Checks image references against their registries
pub struct Checker {
    fetcher: Arc<dyn TagFetcher>,
    normalizer: Normalizer,
    options: CheckOptions,
}

impl Checker {
    pub fn new(fetcher: Arc<dyn TagFetcher>, normalizer: Normalizer, options: CheckOptions) -> Self {
        Self {
            fetcher,
            normalizer,
            options,
        }
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Check all references and report to `reporter`.
    ///
    /// Fetch failures, invalid references and non-semver tags are reported
    /// per reference; the run always completes. The reporter is not flushed.
    pub async fn run<R: Reporter + ?Sized>(&self, references: &[String], reporter: &mut R) -> RunStats {
        let started = Instant::now();
        let mut stats = RunStats {
            asked: references.len(),
            ..RunStats::default()
        };

        let mut seen: HashSet<&str> = HashSet::new();
        let mut scheduled: Vec<Scheduled> = Vec::with_capacity(references.len());
        let mut pending: IndexMap<String, JoinHandle<FetchResult>> = IndexMap::new();
        let mut admission = Admission::new(self.options.limit_per_registry);

        for reference in references {
            if !seen.insert(reference.as_str()) {
                debug!("Skipping duplicate reference {}", reference);
                stats.duplicates += 1;
                continue;
            }

            let spec: ImageSpec = match reference.parse() {
                Ok(spec) => spec,
                Err(source) => {
                    stats.invalid_spec += 1;
                    let error = CheckError::InvalidReference {
                        reference: reference.clone(),
                        source,
                    };
                    warn!("{}", error);
                    reporter.begin_reference(reference, Duration::ZERO, Some(&error));
                    continue;
                }
            };

            if spec.tag.is_empty() {
                debug!("Skipping {}: no tag to compare against", reference);
                stats.non_tagged += 1;
                continue;
            }

            if self.options.skip_non_semver && SemanticVersion::parse(&spec.tag).is_none() {
                stats.non_semver += 1;
                let error = CheckError::NotSemanticVersion {
                    tag: spec.tag.clone(),
                    reference: spec.to_string(),
                };
                reporter.begin_reference(&spec.to_string(), Duration::ZERO, Some(&error));
                continue;
            }

            let target = self.normalizer.normalize(&spec.strip_context());
            let key = target.registry_repo();

            if !pending.contains_key(&key) {
                let slots = admission.pool_for(&target.registry);
                let fetcher = Arc::clone(&self.fetcher);
                debug!("Scheduling tag fetch for {}", key);
                pending.insert(key.clone(), tokio::spawn(fetch_tags(fetcher, target, slots)));
            }

            scheduled.push(Scheduled { spec, key });
        }

        stats.fetch.fetched = pending.len();
        let results = join_fetches(pending).await;
        stats.fetch.duration = started.elapsed();
        info!(
            "Fetched tags for {} repositories in {:?}",
            results.len(),
            stats.fetch.duration
        );

        for Scheduled { spec, key } in &scheduled {
            match results.get(key) {
                Some(fetched) => compare_reference(spec, fetched, &self.options, reporter, &mut stats),
                None => error!("No fetch result for {}", key),
            }
        }

        stats.duration = started.elapsed();
        stats
    }
}

/// Fetch one repository's tags, holding a registry slot if one is required
async fn fetch_tags(
    fetcher: Arc<dyn TagFetcher>,
    target: ImageSpec,
    slots: Option<Arc<Semaphore>>,
) -> FetchResult {
    let _permit = match slots {
        Some(slots) => match slots.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(e) => return FetchResult::failed(RegistryError::TaskFailed(e.to_string())),
        },
        None => None,
    };

    let key = target.registry_repo();
    let started = Instant::now();
    let tags = fetcher.fetch_tags(&target.registry, &target.repository).await;
    let elapsed = started.elapsed();

    match &tags {
        Ok(tags) => debug!("Fetched {} tags for {} in {:?}", tags.len(), key, elapsed),
        Err(e) => warn!("Failed to fetch tags for {}: {}", key, e),
    }

    FetchResult {
        tags: tags.map_err(Arc::new),
        elapsed,
    }
}

/// Join barrier: wait for every fetch task. A panicked task becomes a
/// failure of its own key only.
async fn join_fetches(
    pending: IndexMap<String, JoinHandle<FetchResult>>,
) -> IndexMap<String, FetchResult> {
    let (keys, handles): (Vec<String>, Vec<JoinHandle<FetchResult>>) = pending.into_iter().unzip();
    let outcomes = join_all(handles).await;

    keys.into_iter()
        .zip(outcomes)
        .map(|(key, outcome)| {
            let result = outcome.unwrap_or_else(|e| {
                error!("Fetch task for {} failed: {}", key, e);
                FetchResult::failed(RegistryError::TaskFailed(e.to_string()))
            });
            (key, result)
        })
        .collect()
}
