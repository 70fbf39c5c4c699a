//! Container image reference parsing
//!
//! A reference is split into five pieces:
//!
//! ```text
//! example.com:5000/library/alpine:3.13-alpine@web
//! ^-------------^ ^------------^ ^--^ ^----^ ^-^
//!    registry       repository   tag  label  context
//! ```
//!
//! The tag is what gets compared as a semantic version. The label is the
//! suffix after the first `-` of the tag segment (`alpine`, `slim`, ...). The
//! context is free-form text after `@` which lets callers map a reference back
//! to whatever deployed it.

use std::fmt;
use std::str::FromStr;

const SEP_REGISTRY_REPO: char = '/';
const SEP_REPO_TAG: char = ':';
const SEP_LABEL_CONTEXT: char = '@';
const SEP_TAG_LABEL: char = '-';

/// Error type for validating image references
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Nothing left for the repository after splitting
    #[error("repository name is empty")]
    EmptyRepository,

    /// The reference contains characters no registry accepts
    #[error("invalid character {0:?} in reference")]
    InvalidCharacter(char),
}

/// A parsed container image reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ImageSpec {
    /// Registry host, optionally with port. Empty when not given.
    pub registry: String,
    /// Repository path below the registry (e.g., "library/alpine")
    pub repository: String,
    /// Requested tag without label (e.g., "3.13")
    pub tag: String,
    /// Suffix after the first '-' of the tag segment
    pub label: String,
    /// Suffix after '@'
    pub context: String,
}

impl ImageSpec {
    /// Split a raw reference into its pieces.
    ///
    /// Never fails: malformed input yields whatever the split produces, an
    /// empty string yields an empty spec. Use `str::parse` for a validated spec.
    pub fn parse(raw: &str) -> Self {
        let (registry, rest) = split_registry_repo(raw);
        let (repository, rest) = split_once_or_all(rest, SEP_REPO_TAG);
        let (tag_label, context) = split_once_or_all(rest, SEP_LABEL_CONTEXT);
        let (tag, label) = split_once_or_all(tag_label, SEP_TAG_LABEL);

        Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
            label: label.to_string(),
            context: context.to_string(),
        }
    }

    /// Registry and repository joined by '/', or only the repository when
    /// no registry is set. This is the key tag fetches are deduplicated by.
    pub fn registry_repo(&self) -> String {
        if self.registry.is_empty() {
            self.repository.clone()
        } else {
            format!("{}/{}", self.registry, self.repository)
        }
    }

    /// Copy of this spec without the context
    pub fn strip_context(&self) -> Self {
        Self {
            context: String::new(),
            ..self.clone()
        }
    }

    /// Copy of this spec with tag, label and context cleared
    pub fn without_tag(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            repository: self.repository.clone(),
            ..Self::default()
        }
    }
}

impl fmt::Display for ImageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.registry_repo())?;
        if !self.tag.is_empty() {
            write!(f, "{}{}", SEP_REPO_TAG, self.tag)?;
        }
        if !self.label.is_empty() {
            write!(f, "{}{}", SEP_TAG_LABEL, self.label)?;
        }
        if !self.context.is_empty() {
            write!(f, "{}{}", SEP_LABEL_CONTEXT, self.context)?;
        }
        Ok(())
    }
}

impl FromStr for ImageSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(c) = s.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(ParseError::InvalidCharacter(c));
        }

        let spec = Self::parse(s);
        if spec.repository.is_empty() {
            return Err(ParseError::EmptyRepository);
        }
        Ok(spec)
    }
}

/// Split off the registry when the first path component looks like a host:
/// a domain containing '.', "localhost", or any host name with a numeric port.
fn split_registry_repo(raw: &str) -> (&str, &str) {
    match raw.split_once(SEP_REGISTRY_REPO) {
        Some((host, rest)) if looks_like_host(host) => (host, rest),
        _ => ("", raw),
    }
}

fn looks_like_host(component: &str) -> bool {
    let (host, has_port) = match component.rsplit_once(':') {
        Some((_, port)) if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) => {
            return false;
        }
        Some((host, _)) => (host, true),
        None => (component, false),
    };

    let host_chars = host
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-');
    if host.is_empty() || !host_chars {
        return false;
    }

    has_port || host.contains('.') || host == "localhost"
}

fn split_once_or_all(s: &str, sep: char) -> (&str, &str) {
    s.split_once(sep).unwrap_or((s, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alpine", "", "alpine", "", "", "")]
    #[case("alpine:3", "", "alpine", "3", "", "")]
    #[case("alpine:3.12", "", "alpine", "3.12", "", "")]
    #[case("alpine/latest", "", "alpine/latest", "", "", "")]
    #[case("repo/alpine:3", "", "repo/alpine", "3", "", "")]
    #[case("example.com/alpine", "example.com", "alpine", "", "", "")]
    #[case("example.com/repo/alpine:3", "example.com", "repo/alpine", "3", "", "")]
    #[case("example.com/repo/alpine:3.13", "example.com", "repo/alpine", "3.13", "", "")]
    #[case(
        "example.com/repo/alpine:3.13-label@sample-ctx",
        "example.com",
        "repo/alpine",
        "3.13",
        "label",
        "sample-ctx"
    )]
    #[case(
        "example.com/repo/alpine:3.13@sample-ctx",
        "example.com",
        "repo/alpine",
        "3.13",
        "",
        "sample-ctx"
    )]
    #[case(
        "example.com:8080/repo/alpine:3.13",
        "example.com:8080",
        "repo/alpine",
        "3.13",
        "",
        ""
    )]
    #[case("localhost:5000/app:1.0.0", "localhost:5000", "app", "1.0.0", "", "")]
    #[case("localhost/app:1.0.0", "localhost", "app", "1.0.0", "", "")]
    #[case("nginx:1.0.0-really-latest", "", "nginx", "1.0.0", "really-latest", "")]
    #[case("alpine:3.12@sha256:abcd", "", "alpine", "3.12", "", "sha256:abcd")]
    #[case("registry:5000/app:1.0", "registry:5000", "app", "1.0", "", "")]
    #[case("alpine:3.13@team/prod", "", "alpine", "3.13", "", "team/prod")]
    #[case("nginx:1.25-alpine@k8s/web", "", "nginx", "1.25", "alpine", "k8s/web")]
    #[case("alpine:3.13/extra", "", "alpine", "3.13/extra", "", "")]
    #[case("", "", "", "", "", "")]
    fn parse_splits_reference(
        #[case] raw: &str,
        #[case] registry: &str,
        #[case] repository: &str,
        #[case] tag: &str,
        #[case] label: &str,
        #[case] context: &str,
    ) {
        let spec = ImageSpec::parse(raw);

        assert_eq!(
            spec,
            ImageSpec {
                registry: registry.to_string(),
                repository: repository.to_string(),
                tag: tag.to_string(),
                label: label.to_string(),
                context: context.to_string(),
            }
        );
    }

    #[rstest]
    #[case("example.com/repo/alpine:3.13-label@ctx")]
    #[case("example.com:8080/repo/alpine:3.13")]
    #[case("alpine:3.13@team/prod")]
    #[case("repo/alpine:3-slim")]
    #[case("alpine")]
    fn display_reconstructs_canonical_reference(#[case] raw: &str) {
        assert_eq!(ImageSpec::parse(raw).to_string(), raw);
    }

    #[rstest]
    #[case("example.com/repo/alpine:3", "example.com/repo/alpine")]
    #[case("repo/alpine:3", "repo/alpine")]
    #[case("alpine", "alpine")]
    fn registry_repo_joins_registry_and_repository(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(ImageSpec::parse(raw).registry_repo(), expected);
    }

    #[test]
    fn strip_context_keeps_everything_else() {
        let spec = ImageSpec::parse("example.com/repo/alpine:3.13-label@ctx");

        assert_eq!(
            spec.strip_context().to_string(),
            "example.com/repo/alpine:3.13-label"
        );
        assert_eq!(spec.context, "ctx");
    }

    #[test]
    fn without_tag_keeps_registry_and_repository() {
        let spec = ImageSpec::parse("example.com/repo/alpine:3.13-label@ctx");

        assert_eq!(spec.without_tag().to_string(), "example.com/repo/alpine");
    }

    #[rstest]
    #[case("", ParseError::EmptyRepository)]
    #[case(":3.13", ParseError::EmptyRepository)]
    #[case("example.com/:1.0", ParseError::EmptyRepository)]
    #[case("alpine :3", ParseError::InvalidCharacter(' '))]
    #[case("alpine\t", ParseError::InvalidCharacter('\t'))]
    fn from_str_rejects_invalid_references(#[case] raw: &str, #[case] expected: ParseError) {
        assert_eq!(raw.parse::<ImageSpec>(), Err(expected));
    }

    #[test]
    fn from_str_accepts_valid_reference() {
        let spec: ImageSpec = "quay.io/prometheus/node-exporter:v1.7.0".parse().unwrap();

        assert_eq!(spec.registry, "quay.io");
        assert_eq!(spec.repository, "prometheus/node-exporter");
        assert_eq!(spec.tag, "v1.7.0");
    }
}
