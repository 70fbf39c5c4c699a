//! Scripted tag fetcher

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use cciu::registry::{RegistryError, TagFetcher};

#[derive(Default)]
struct InFlight {
    current: usize,
    max: usize,
}

/// Serves tags from a table keyed by `registry/repository`, sleeping for a
/// fixed delay per call and tracking concurrent calls per registry.
#[derive(Default)]
pub struct ScriptedFetcher {
    tags: HashMap<String, Vec<String>>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, key: &str, tags: &[&str]) -> Self {
        self.tags
            .insert(key.to_string(), tags.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Keys fetched so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of simultaneous calls seen for the registry
    pub fn max_in_flight(&self, registry: &str) -> usize {
        self.in_flight
            .lock()
            .unwrap()
            .get(registry)
            .map_or(0, |f| f.max)
    }

    fn enter(&self, registry: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        let entry = in_flight.entry(registry.to_string()).or_default();
        entry.current += 1;
        entry.max = entry.max.max(entry.current);
    }

    fn leave(&self, registry: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(entry) = in_flight.get_mut(registry) {
            entry.current -= 1;
        }
    }
}

#[async_trait]
impl TagFetcher for ScriptedFetcher {
    async fn fetch_tags(&self, registry: &str, repository: &str) -> Result<Vec<String>, RegistryError> {
        let key = format!("{}/{}", registry, repository);
        self.calls.lock().unwrap().push(key.clone());

        self.enter(registry);
        tokio::time::sleep(self.delay).await;
        self.leave(registry);

        self.tags
            .get(&key)
            .cloned()
            .ok_or(RegistryError::NotFound(repository.to_string()))
    }
}
