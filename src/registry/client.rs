use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::{PackageSource, RepoId, Tag};
use crate::installer::InstallFailure;
use crate::retry::{check_retryable, is_not_found, with_retry};

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.bower.io";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Registry entries as served by `GET /packages/{name}`.
#[derive(Debug, Deserialize)]
struct RegistryEntry {
    url: String,
}

/// Resolves names through a bower registry and reads tags from the GitHub API.
pub struct BowerRegistry {
    client: Client,
    registry_url: String,
    api_url: String,
    token: Option<String>,
}

impl BowerRegistry {
    #[tracing::instrument(skip(client))]
    pub fn new(client: Client, registry_url: &str, api_url: &str) -> Self {
        Self {
            client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Authenticates requests to the GitHub API. The registry never sees the token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn github_get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) if url.starts_with(&self.api_url) => request.bearer_auth(token),
            _ => request,
        }
    }

    /// Maps a package name to its GitHub repository.
    #[tracing::instrument(skip(self))]
    pub async fn lookup(&self, name: &str) -> Result<RepoId, InstallFailure> {
        if name.trim().is_empty() {
            return Err(InstallFailure::PackageNotFound {
                name: name.to_string(),
            });
        }
        if name.contains('/') {
            return name
                .parse::<RepoId>()
                .map_err(|_| InstallFailure::PackageNotFound {
                    name: name.to_string(),
                });
        }

        let url = format!("{}/packages/{}", self.registry_url, name);
        debug!("Looking up {} at {}...", name, url);

        let entry: RegistryEntry = with_retry("Looking up package", || {
            let client = self.client.clone();
            let url = url.clone();
            async move {
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .context("Failed to send request to the registry")?;

                let response = response.error_for_status().map_err(check_retryable)?;

                let entry = response
                    .json::<RegistryEntry>()
                    .await
                    .context("Failed to parse registry response")?;

                Ok(entry)
            }
        })
        .await
        .map_err(|e| {
            if is_not_found(&e) {
                InstallFailure::PackageNotFound {
                    name: name.to_string(),
                }
            } else {
                InstallFailure::network(e)
            }
        })?;

        RepoId::from_git_url(&entry.url).ok_or_else(|| {
            InstallFailure::other(format!(
                "Package {} is not hosted on GitHub ({})",
                name, entry.url
            ))
        })
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_tags(&self, repo: &RepoId) -> anyhow::Result<Vec<Tag>> {
        let mut tags = Vec::new();
        let mut page = 1;

        // Limit to 10 pages (1000 tags)
        while page <= 10 {
            let url = format!("{}/repos/{}/{}/tags", self.api_url, repo.owner, repo.repo);

            debug!("Fetching tags page {} from {}...", page, url);

            let parsed: Vec<Tag> = with_retry("Fetching tags", || {
                let request = self.github_get(&url);
                let page = page.to_string();
                async move {
                    let response = request
                        .query(&[("per_page", "100"), ("page", page.as_str())])
                        .send()
                        .await
                        .context("Failed to send request to GitHub API")?;

                    let response = response.error_for_status().map_err(check_retryable)?;

                    let parsed: Vec<Tag> = response
                        .json()
                        .await
                        .context("Failed to parse JSON response from GitHub API")?;

                    Ok(parsed)
                }
            })
            .await?;

            let len = parsed.len();
            tags.extend(parsed);

            if len < 100 {
                break;
            }

            page += 1;
        }

        Ok(tags)
    }
}

#[async_trait]
impl PackageSource for BowerRegistry {
    #[tracing::instrument(skip(self))]
    async fn tags(&self, name: &str) -> Result<Vec<Tag>, InstallFailure> {
        let repo = self.lookup(name).await?;
        self.fetch_tags(&repo).await.map_err(|e| {
            if is_not_found(&e) {
                InstallFailure::PackageNotFound {
                    name: name.to_string(),
                }
            } else {
                InstallFailure::network(e)
            }
        })
    }

    #[tracing::instrument(skip(self))]
    async fn download(&self, tag: &Tag) -> Result<Vec<u8>, InstallFailure> {
        debug!("Downloading {}...", tag.tarball_url);

        with_retry("Downloading tarball", || {
            let request = self.github_get(&tag.tarball_url);
            async move {
                let response = request
                    .send()
                    .await
                    .context("Failed to start download request")?;

                let response = response.error_for_status().map_err(check_retryable)?;

                let bytes = response
                    .bytes()
                    .await
                    .context("Failed to read download stream")?;

                Ok(bytes.to_vec())
            }
        })
        .await
        .map_err(InstallFailure::network)
    }
}
