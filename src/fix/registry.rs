//! npm registry lookups.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::debug;

use super::{FixError, FixResult};

/// Outcome of a dist-tags lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestVersion {
    /// The package does not exist in the registry.
    NotFound,
    /// The package exists but has no `latest` tag.
    Untagged,
    /// The version the `latest` tag points at.
    Version(String),
}

impl LatestVersion {
    /// The range to declare for the package: `^latest`, or `*` without a
    /// `latest` tag.
    pub fn range(&self) -> Option<String> {
        match self {
            LatestVersion::NotFound => None,
            LatestVersion::Untagged => Some("*".to_string()),
            LatestVersion::Version(version) => Some(format!("^{version}")),
        }
    }
}

/// Looks up the latest published version of a package.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Returns the `latest` dist-tag of `name`.
    async fn latest_version(&self, name: &str) -> FixResult<LatestVersion>;
}

#[derive(Debug, Deserialize)]
struct DistTags {
    #[serde(default)]
    latest: Option<String>,
}

/// Client for an npm-compatible registry.
pub struct NpmRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistryClient {
    /// Creates a client for the registry at `base_url`.
    pub fn new(base_url: &str) -> FixResult<Self> {
        let user_agent = format!("ghost-imports/{}", env!("CARGO_PKG_VERSION"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .map_err(|source| FixError::Registry {
                package: String::new(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the dist-tags document of `name`.
    pub fn dist_tags_url(&self, name: &str) -> String {
        format!("{}/-/package/{}/dist-tags", self.base_url, encode_package_name(name))
    }
}

/// Encodes a package name for a registry path; the scope separator of
/// `@scope/name` becomes `%2f`.
pub fn encode_package_name(name: &str) -> String {
    match name.strip_prefix('@').and_then(|rest| rest.split_once('/')) {
        Some((scope, package)) => format!(
            "@{}%2f{}",
            urlencoding::encode(scope),
            urlencoding::encode(package)
        ),
        None => urlencoding::encode(name).into_owned(),
    }
}

#[async_trait]
impl RegistryClient for NpmRegistryClient {
    async fn latest_version(&self, name: &str) -> FixResult<LatestVersion> {
        let url = self.dist_tags_url(name);
        debug!(package = name, %url, "querying registry");

        let registry_error = |source: reqwest::Error| FixError::Registry {
            package: name.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(registry_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(LatestVersion::NotFound);
        }
        if !status.is_success() {
            return Err(FixError::RegistryStatus {
                package: name.to_string(),
                status: status.as_u16(),
            });
        }

        let tags: DistTags = response.json().await.map_err(registry_error)?;
        Ok(tags
            .latest
            .map_or(LatestVersion::Untagged, LatestVersion::Version))
    }
}

/// Lookup cache that can be shared between clients.
pub type RegistryCache = Arc<DashMap<String, LatestVersion>>;

/// Wraps a registry client with a concurrent in-memory cache.
pub struct CachingRegistryClient<R: RegistryClient> {
    inner: R,
    cache: RegistryCache,
}

impl<R: RegistryClient> CachingRegistryClient<R> {
    /// Creates a new caching client wrapping `inner`.
    pub fn new(inner: R) -> Self {
        Self::with_cache(inner, RegistryCache::default())
    }

    /// Creates a caching client that reads and fills `cache`.
    pub fn with_cache(inner: R, cache: RegistryCache) -> Self {
        Self { inner, cache }
    }

    /// Handle to the underlying cache, for sharing with another client.
    pub fn cache(&self) -> RegistryCache {
        Arc::clone(&self.cache)
    }

    /// Number of cached lookups.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<R: RegistryClient> RegistryClient for CachingRegistryClient<R> {
    async fn latest_version(&self, name: &str) -> FixResult<LatestVersion> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }

        let latest = self.inner.latest_version(name).await?;
        self.cache.insert(name.to_string(), latest.clone());
        Ok(latest)
    }
}
