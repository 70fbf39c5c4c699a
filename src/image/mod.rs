//! Image reference layer
//! - spec.rs: ImageSpec and the reference grammar
//! - normalize.rs: default registry and registry-specific conventions

pub mod normalize;
pub mod spec;

pub use normalize::{DockerHubConvention, Normalizer, RegistryConvention};
pub use spec::{ImageSpec, ParseError};
