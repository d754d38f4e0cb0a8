//! Package sources.
//!
//! A package name is resolved to a GitHub repository (through the bower
//! registry, or directly for `owner/repo` names) whose tags are the
//! installable versions.

mod client;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::installer::InstallFailure;

pub use client::{BowerRegistry, DEFAULT_API_URL, DEFAULT_REGISTRY_URL};

/// A tagged version of a package and where to download it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub name: String,
    pub tarball_url: String,
}

/// Where package versions come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// All tags published for a package.
    async fn tags(&self, name: &str) -> Result<Vec<Tag>, InstallFailure>;

    /// Raw gzip tarball of a tag.
    async fn download(&self, tag: &Tag) -> Result<Vec<u8>, InstallFailure>;
}

/// Repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    /// Parses a GitHub clone URL as stored in the bower registry.
    ///
    /// Accepts `git://github.com/o/r.git`, `https://github.com/o/r(.git)`,
    /// `git@github.com:o/r.git` and `ssh://git@github.com/o/r.git`.
    pub fn from_git_url(url: &str) -> Option<Self> {
        let url = url.trim();
        let path = if let Some(rest) = url.strip_prefix("git@github.com:") {
            rest
        } else {
            let (_, rest) = url.split_once("github.com/")?;
            rest
        };
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        path.parse().ok()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            anyhow::bail!("Invalid repository format. Expected 'owner/repo'.")
        } else {
            Ok(RepoId {
                owner: parts[0].to_string(),
                repo: parts[1].to_string(),
            })
        }
    }
}
