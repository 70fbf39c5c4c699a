//! Registry access layer
//!
//! - [`fetcher`]: the `TagFetcher` trait the orchestrator fetches through
//! - [`docker`]: Docker Registry HTTP API v2 implementation
//! - [`error`]: error type for fetch operations

pub mod docker;
pub mod error;
pub mod fetcher;

pub use docker::DockerRegistry;
pub use error::RegistryError;
pub use fetcher::TagFetcher;
