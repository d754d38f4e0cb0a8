use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::json;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::{InstallFailure, PackageInstaller};
use crate::archive::Extractor;
use crate::commands::InstallConfig;
use crate::package::{MANIFEST_FILE, Manifest, ManifestStore, PackageIdentity, VersionResolver};
use crate::registry::{PackageSource, Tag};
use crate::runtime::Runtime;

/// Written into every installed package directory to record what was installed.
pub const INSTALL_MARKER_FILE: &str = ".bower.json";

/// A package unpacked (or found already unpacked) in the install directory.
#[derive(Debug)]
struct Installed {
    version: String,
    dir: PathBuf,
}

/// Installs packages from a [`PackageSource`] into the configured install directory.
pub struct Installer<R: Runtime, S: PackageSource, M: ManifestStore, E: Extractor> {
    runtime: R,
    source: S,
    manifest: M,
    extractor: E,
    config: InstallConfig,
}

impl<R: Runtime, S: PackageSource, M: ManifestStore, E: Extractor> Installer<R, S, M, E> {
    pub fn new(runtime: R, source: S, manifest: M, extractor: E, config: InstallConfig) -> Self {
        Self {
            runtime,
            source,
            manifest,
            extractor,
            config,
        }
    }

    /// `owner/repo` shorthand installs into a directory named after the repo.
    fn package_dir(&self, name: &str) -> PathBuf {
        let dir_name = name.rsplit('/').next().unwrap_or(name);
        self.config.install_dir.join(dir_name)
    }

    fn cache_path(&self, name: &str, tag: &Tag) -> PathBuf {
        self.config
            .cache_dir
            .join(name.replace('/', "-"))
            .join(format!("{}.tar.gz", tag.name.replace('/', "-")))
    }

    fn installed_version(&self, dir: &Path) -> Option<String> {
        let marker = dir.join(INSTALL_MARKER_FILE);
        if !self.runtime.exists(&marker) {
            return None;
        }
        let contents = self.runtime.read_to_string(&marker).ok()?;
        let value: serde_json::Value = serde_json::from_str(&contents).ok()?;
        value
            .get("_release")
            .or_else(|| value.get("version"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn write_marker(&self, dir: &Path, package: &PackageIdentity, tag: &Tag) -> anyhow::Result<()> {
        let marker = json!({
            "name": package.name(),
            "version": tag.name.trim_start_matches('v'),
            "_release": tag.name,
            "_resolution": { "type": "version", "tag": tag.name },
            "_target": package.version_constraint(),
        });
        let contents = serde_json::to_string_pretty(&marker)?;
        self.runtime
            .write(&dir.join(INSTALL_MARKER_FILE), contents.as_bytes())
    }

    /// Dependencies declared by an installed package's own manifest.
    fn package_dependencies(&self, dir: &Path) -> Vec<PackageIdentity> {
        let path = dir.join(MANIFEST_FILE);
        if !self.runtime.exists(&path) {
            return Vec::new();
        }
        match Manifest::load(&self.runtime, &path) {
            Ok(manifest) => manifest.dependencies(),
            Err(e) => {
                warn!("Ignoring dependencies of {}: {:#}", dir.display(), e);
                Vec::new()
            }
        }
    }

    /// Staging directory next to `dir`; extraction lands here before replacing `dir`.
    fn staging_dir(dir: &Path) -> PathBuf {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        dir.with_file_name(format!(".{}.partial", name))
    }

    async fn fetch_archive(&self, name: &str, tag: &Tag) -> Result<Vec<u8>, InstallFailure> {
        let cache_path = self.cache_path(name, tag);
        if self.runtime.exists(&cache_path) {
            debug!("Using cached archive {}", cache_path.display());
            return Ok(self.runtime.read(&cache_path)?);
        }

        println!(" downloading {} {}", name, tag.name);
        let archive = self.source.download(tag).await?;

        if let Err(e) = self.store_archive(&cache_path, &archive) {
            warn!("Failed to cache {}: {:#}", cache_path.display(), e);
        }

        Ok(archive)
    }

    /// Writes to a `.part` file first so an interrupted write never leaves a
    /// truncated archive under the cache name.
    fn store_archive(&self, cache_path: &Path, archive: &[u8]) -> anyhow::Result<()> {
        if let Some(dir) = cache_path.parent() {
            self.runtime.create_dir_all(dir)?;
        }
        let file_name = cache_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial = cache_path.with_file_name(format!("{}.part", file_name));
        self.runtime.write(&partial, archive)?;
        self.runtime.rename(&partial, cache_path)
    }

    /// Extracts into a staging directory, then swaps it in for `dir`.
    /// On failure `dir` is left untouched and the cached archive is evicted.
    fn unpack(
        &self,
        archive: &[u8],
        dir: &Path,
        package: &PackageIdentity,
        tag: &Tag,
    ) -> anyhow::Result<()> {
        let staging = Self::staging_dir(dir);
        if self.runtime.exists(&staging) {
            self.runtime.remove_dir_all(&staging)?;
        }

        let staged = self
            .extractor
            .extract(archive, &staging)
            .and_then(|_| self.runtime.create_dir_all(&staging))
            .and_then(|_| self.write_marker(&staging, package, tag));
        if let Err(e) = staged {
            if self.runtime.exists(&staging) {
                if let Err(cleanup) = self.runtime.remove_dir_all(&staging) {
                    warn!("Failed to clean up {}: {:#}", staging.display(), cleanup);
                }
            }
            let cache_path = self.cache_path(package.name(), tag);
            if self.runtime.exists(&cache_path) {
                debug!("Evicting cached archive {}", cache_path.display());
                if let Err(evict) = self.runtime.remove_file(&cache_path) {
                    warn!("Failed to evict {}: {:#}", cache_path.display(), evict);
                }
            }
            return Err(e);
        }

        if self.runtime.exists(dir) {
            self.runtime.remove_dir_all(dir)?;
        }
        self.runtime.rename(&staging, dir)
    }

    #[tracing::instrument(skip(self))]
    async fn install_one(&self, package: &PackageIdentity) -> Result<Installed, InstallFailure> {
        let dir = self.package_dir(package.name());

        if let Some(version) = self.installed_version(&dir) {
            if VersionResolver::satisfies(&version, package.version_constraint()) {
                info!("{} {} is already installed", package.name(), version);
                return Ok(Installed { version, dir });
            }
        }

        println!("   resolving {}", package);
        let tags = self.source.tags(package.name()).await?;
        let tag = VersionResolver::resolve(&tags, package.version_constraint()).ok_or_else(|| {
            InstallFailure::VersionNotFound {
                name: package.name().to_string(),
                constraint: package.version_constraint().to_string(),
            }
        })?;

        let archive = self.fetch_archive(package.name(), tag).await?;

        println!("  installing {} {}", package.name(), tag.name);
        self.unpack(&archive, &dir, package, tag)?;

        Ok(Installed {
            version: tag.name.clone(),
            dir,
        })
    }

    /// Installs `roots` and everything they depend on, breadth-first.
    /// Each name is installed once; the first constraint seen for it wins.
    async fn install_tree(
        &self,
        roots: Vec<PackageIdentity>,
    ) -> Result<Vec<Installed>, InstallFailure> {
        let mut queue: VecDeque<PackageIdentity> = roots.into();
        let mut seen = HashSet::new();
        let mut installed = Vec::new();

        while let Some(package) = queue.pop_front() {
            if !seen.insert(package.name().to_string()) {
                debug!("Skipping {}, already handled", package);
                continue;
            }
            let result = self.install_one(&package).await?;
            queue.extend(self.package_dependencies(&result.dir));
            installed.push(result);
        }

        Ok(installed)
    }
}

#[async_trait]
impl<R, S, M, E> PackageInstaller for Installer<R, S, M, E>
where
    R: Runtime,
    S: PackageSource,
    M: ManifestStore,
    E: Extractor,
{
    #[tracing::instrument(skip(self))]
    async fn install_dependencies(&self) -> Result<(), InstallFailure> {
        let dependencies = self.manifest.dependencies()?;
        if dependencies.is_empty() {
            info!("No dependencies declared");
            return Ok(());
        }
        self.install_tree(dependencies).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn install_package(&self, package: &PackageIdentity) -> Result<(), InstallFailure> {
        let installed = self.install_tree(vec![package.clone()]).await?;

        if self.config.save_to_manifest {
            if let Some(root) = installed.first() {
                self.manifest.record(package, &root.version)?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn package_versions(
        &self,
        package: &PackageIdentity,
    ) -> Result<Vec<String>, InstallFailure> {
        let tags = self.source.tags(package.name()).await?;
        Ok(VersionResolver::available_versions(&tags))
    }
}
