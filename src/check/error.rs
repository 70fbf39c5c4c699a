use std::sync::Arc;

use thiserror::Error;

use crate::image::ParseError;
use crate::registry::RegistryError;

/// Errors reported for a single reference. None of them stops the run.
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error("Invalid reference {reference:?}: {source}")]
    InvalidReference {
        reference: String,
        source: ParseError,
    },

    #[error("Tag {tag:?} of {reference} is not a semantic version")]
    NotSemanticVersion { tag: String, reference: String },

    /// Shared by every reference with the same registry and repository
    #[error("Failed to fetch tags for {reference}: {source}")]
    FetchFailure {
        reference: String,
        source: Arc<RegistryError>,
    },
}
