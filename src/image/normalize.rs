//! Short-name normalization
//!
//! Turns short references like `alpine` into fully qualified ones
//! (`docker.io/library/alpine:latest`). Filling in the registry is generic;
//! everything else is a per-registry convention.

use std::sync::Arc;

use crate::config::{DEFAULT_NAMESPACE, DEFAULT_REGISTRY, DEFAULT_TAG, NormalizeConfig};
use crate::image::spec::ImageSpec;

/// Registry-specific naming rules applied after the default registry is set
pub trait RegistryConvention: Send + Sync {
    /// Returns true if this convention applies to the given registry host
    fn applies_to(&self, registry: &str) -> bool;

    /// Rewrite the spec in place according to the registry's rules
    fn apply(&self, spec: &mut ImageSpec);
}

/// Docker Hub: official images live below a namespace and untagged
/// references mean a default tag.
#[derive(Debug, Clone)]
pub struct DockerHubConvention {
    host: String,
    namespace: String,
    tag: String,
}

impl DockerHubConvention {
    pub fn new(host: &str, namespace: &str, tag: &str) -> Self {
        Self {
            host: host.to_string(),
            namespace: namespace.to_string(),
            tag: tag.to_string(),
        }
    }
}

impl Default for DockerHubConvention {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY, DEFAULT_NAMESPACE, DEFAULT_TAG)
    }
}

impl RegistryConvention for DockerHubConvention {
    fn applies_to(&self, registry: &str) -> bool {
        registry == self.host
    }

    fn apply(&self, spec: &mut ImageSpec) {
        // "alpine" -> "library/alpine"
        if !spec.repository.contains('/') {
            spec.repository = format!("{}/{}", self.namespace, spec.repository);
        }
        if spec.tag.is_empty() {
            spec.tag = self.tag.clone();
        }
    }
}

/// Applies the default registry and all matching registry conventions
#[derive(Clone)]
pub struct Normalizer {
    default_registry: String,
    conventions: Vec<Arc<dyn RegistryConvention>>,
}

impl Normalizer {
    /// Creates a normalizer without any registry conventions
    pub fn new(default_registry: &str) -> Self {
        Self {
            default_registry: default_registry.to_string(),
            conventions: Vec::new(),
        }
    }

    /// Adds a registry convention. Conventions run in insertion order.
    pub fn with_convention(mut self, convention: Arc<dyn RegistryConvention>) -> Self {
        self.conventions.push(convention);
        self
    }

    pub fn from_config(config: &NormalizeConfig) -> Self {
        Self::new(&config.default_registry).with_convention(Arc::new(DockerHubConvention::new(
            DEFAULT_REGISTRY,
            &config.docker_hub_namespace,
            &config.default_tag,
        )))
    }

    /// Returns a normalized copy of spec
    pub fn normalize(&self, spec: &ImageSpec) -> ImageSpec {
        let mut normalized = spec.clone();

        if normalized.registry.is_empty() {
            normalized.registry = self.default_registry.clone();
        }

        for convention in &self.conventions {
            if convention.applies_to(&normalized.registry) {
                convention.apply(&mut normalized);
            }
        }

        normalized
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&NormalizeConfig::default())
    }
}
