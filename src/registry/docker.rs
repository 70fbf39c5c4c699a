//! Docker Registry HTTP API v2 tag listing
//!
//! Lists tags via `GET /v2/<name>/tags/list`, answering bearer-token
//! challenges anonymously and following `Link` pagination.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, LINK, WWW_AUTHENTICATE};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{DEFAULT_REGISTRY, USER_AGENT};
use crate::registry::error::RegistryError;
use crate::registry::fetcher::TagFetcher;

/// Docker Hub serves the registry API from a different host
const DOCKER_HUB_ENDPOINT: &str = "https://registry-1.docker.io";

/// Tags requested per page
const PAGE_SIZE: u32 = 1000;

static CHALLENGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid regex"));

static NEXT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).expect("valid regex"));

/// Response from the tags/list endpoint
#[derive(Debug, Deserialize)]
struct TagList {
    tags: Option<Vec<String>>,
}

/// Response from a token endpoint. Registries disagree on the field name.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parsed `WWW-Authenticate: Bearer ...` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

impl BearerChallenge {
    fn parse(header: &str) -> Option<Self> {
        let (scheme, params) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let mut values: HashMap<String, String> = CHALLENGE_PARAM
            .captures_iter(params)
            .map(|c| (c[1].to_ascii_lowercase(), c[2].to_string()))
            .collect();

        Some(Self {
            realm: values.remove("realm")?,
            service: values.remove("service"),
            scope: values.remove("scope"),
        })
    }
}

/// Tag fetcher for registries speaking the Docker Registry HTTP API v2
pub struct DockerRegistry {
    client: reqwest::Client,
    timeout: Option<Duration>,
    auth_file: Option<PathBuf>,
    endpoint_override: Option<String>,
}

impl DockerRegistry {
    /// Creates a new DockerRegistry
    ///
    /// # Arguments
    /// * `timeout` - Upper bound for one `fetch_tags` call including token and paging requests
    /// * `auth_file` - Credential store path, reserved for authenticated registries
    pub fn new(
        timeout: Option<Duration>,
        auth_file: Option<PathBuf>,
    ) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        if let Some(path) = &auth_file {
            debug!("Credential file {:?} configured, using anonymous access", path);
        }

        Ok(Self {
            client,
            timeout,
            auth_file,
            endpoint_override: None,
        })
    }

    /// Send every request to `endpoint` regardless of the registry host
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint_override = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    pub fn auth_file(&self) -> Option<&PathBuf> {
        self.auth_file.as_ref()
    }

    fn endpoint(&self, registry: &str) -> String {
        if let Some(endpoint) = &self.endpoint_override {
            return endpoint.clone();
        }
        if registry == DEFAULT_REGISTRY || registry.is_empty() {
            DOCKER_HUB_ENDPOINT.to_string()
        } else {
            format!("https://{}", registry)
        }
    }

    async fn get(&self, url: &str, token: Option<&str>) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(request.send().await?)
    }

    async fn fetch_token(
        &self,
        challenge: &BearerChallenge,
        repository: &str,
    ) -> Result<String, RegistryError> {
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", repository));

        let mut url = reqwest::Url::parse(&challenge.realm)
            .map_err(|e| RegistryError::InvalidResponse(format!("invalid token realm: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("scope", &scope);
            if let Some(service) = &challenge.service {
                query.append_pair("service", service);
            }
        }

        debug!("Requesting anonymous token from {}", challenge.realm);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(RegistryError::Unauthorized(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

        body.token
            .or(body.access_token)
            .ok_or_else(|| RegistryError::InvalidResponse("token response without token".into()))
    }

    async fn fetch_all_tags(
        &self,
        registry: &str,
        repository: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let endpoint = self.endpoint(registry);
        let mut url = format!("{}/v2/{}/tags/list?n={}", endpoint, repository, PAGE_SIZE);
        let mut token: Option<String> = None;
        let mut tags = Vec::new();
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(url.clone()) {
                warn!("Pagination of {} returned to {}", repository, url);
                return Err(RegistryError::InvalidResponse(format!(
                    "pagination loop at {}",
                    url
                )));
            }

            let mut response = self.get(&url, token.as_deref()).await?;

            if response.status() == StatusCode::UNAUTHORIZED && token.is_none() {
                let challenge = response
                    .headers()
                    .get(WWW_AUTHENTICATE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(BearerChallenge::parse)
                    .ok_or_else(|| RegistryError::Unauthorized(repository.to_string()))?;

                token = Some(self.fetch_token(&challenge, repository).await?);
                response = self.get(&url, token.as_deref()).await?;
            }

            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Err(RegistryError::NotFound(format!("{}/{}", registry, repository)));
            }

            if status == StatusCode::UNAUTHORIZED {
                return Err(RegistryError::Unauthorized(repository.to_string()));
            }

            if !status.is_success() {
                warn!("Registry returned status {}: {}", status, url);
                return Err(RegistryError::InvalidResponse(format!(
                    "Unexpected status: {}",
                    status
                )));
            }

            let next = next_page(response.headers(), &endpoint);

            let page: TagList = response.json().await.map_err(|e| {
                warn!("Failed to parse tag list response: {}", e);
                RegistryError::InvalidResponse(e.to_string())
            })?;
            tags.extend(page.tags.unwrap_or_default());

            match next {
                Some(next) => {
                    // Never hand the token to another host
                    if token.is_some() && !same_origin(&next, &endpoint) {
                        debug!("Next page {} is on another host, dropping token", next);
                        token = None;
                    }
                    url = next;
                }
                None => break,
            }
        }

        Ok(tags)
    }
}

/// URL of the next page from a `Link: <...>; rel="next"` header
fn next_page(headers: &HeaderMap, endpoint: &str) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    let target = NEXT_LINK.captures(link)?.get(1)?.as_str();

    if target.starts_with('/') {
        Some(format!("{}{}", endpoint, target))
    } else {
        Some(target.to_string())
    }
}

fn same_origin(url: &str, endpoint: &str) -> bool {
    match (reqwest::Url::parse(url), reqwest::Url::parse(endpoint)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => false,
    }
}

#[async_trait::async_trait]
impl TagFetcher for DockerRegistry {
    async fn fetch_tags(
        &self,
        registry: &str,
        repository: &str,
    ) -> Result<Vec<String>, RegistryError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.fetch_all_tags(registry, repository))
                .await
                .map_err(|_| RegistryError::Timeout(timeout))?,
            None => self.fetch_all_tags(registry, repository).await,
        }
    }
}
