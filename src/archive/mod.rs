use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use log::debug;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::runtime::Runtime;

/// Unpacks a downloaded package archive into its install directory.
#[cfg_attr(test, mockall::automock)]
pub trait Extractor: Send + Sync {
    /// Extract the archive bytes into `extract_to`.
    fn extract(&self, archive: &[u8], extract_to: &Path) -> Result<()>;
}

/// Gzip tarball extractor.
///
/// Repository tarballs wrap their content in a single top-level directory
/// (`owner-repo-sha/`); it is stripped so files land directly in `extract_to`.
pub struct TarGzExtractor<R: Runtime> {
    runtime: R,
}

impl<R: Runtime> TarGzExtractor<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }
}

impl<R: Runtime> Extractor for TarGzExtractor<R> {
    #[tracing::instrument(skip(self, archive))]
    fn extract(&self, archive: &[u8], extract_to: &Path) -> Result<()> {
        let mut tar = tar::Archive::new(GzDecoder::new(archive));
        self.runtime.create_dir_all(extract_to)?;

        for entry in tar.entries().context("Failed to read archive")? {
            let mut entry = entry.context("Failed to read archive entry")?;
            let path = entry.path().context("Invalid path in archive")?.into_owned();

            let Some(relative) = strip_top_level(&path)? else {
                continue;
            };
            let target = extract_to.join(&relative);
            let kind = entry.header().entry_type();

            if kind.is_dir() {
                self.runtime.create_dir_all(&target)?;
            } else if kind.is_file() {
                if let Some(parent) = target.parent() {
                    self.runtime.create_dir_all(parent)?;
                }
                let mut contents = Vec::new();
                entry
                    .read_to_end(&mut contents)
                    .with_context(|| format!("Failed to read {} from archive", path.display()))?;
                self.runtime.write(&target, &contents)?;
            } else {
                debug!("Skipping {:?} entry {}", kind, path.display());
            }
        }

        Ok(())
    }
}

/// Drops the archive's top-level directory. Returns `None` for the directory itself.
fn strip_top_level(path: &Path) -> Result<Option<PathBuf>> {
    let mut components = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir));
    components.next();

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            _ => bail!("Archive entry escapes the install directory: {}", path.display()),
        }
    }

    Ok(if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    })
}
