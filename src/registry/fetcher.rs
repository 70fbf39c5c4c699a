//! Tag fetcher trait for listing the tags of a repository

#[cfg(test)]
use mockall::automock;

use crate::registry::error::RegistryError;

/// Trait for fetching all tags of a repository from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagFetcher: Send + Sync {
    /// Fetches all tags of a repository
    ///
    /// # Arguments
    /// * `registry` - Registry host, optionally with port (e.g., "docker.io", "localhost:5000")
    /// * `repository` - Repository path (e.g., "library/alpine")
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Tags in the order the registry listed them
    /// * `Err(RegistryError)` - If the fetch fails or times out
    async fn fetch_tags(&self, registry: &str, repository: &str)
    -> Result<Vec<String>, RegistryError>;
}
