//! The package installer consumed by the install command.

mod bower;
mod failure;

use async_trait::async_trait;

use crate::package::PackageIdentity;

pub use bower::{INSTALL_MARKER_FILE, Installer};
pub use failure::{InstallFailure, codes};

/// Fetches and unpacks packages.
///
/// Each call is awaited to completion before the next one is made.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Installs every dependency declared in the project manifest, transitively.
    async fn install_dependencies(&self) -> Result<(), InstallFailure>;

    /// Installs one package at a version satisfying its constraint.
    async fn install_package(&self, package: &PackageIdentity) -> Result<(), InstallFailure>;

    /// All known versions of a package.
    async fn package_versions(&self, package: &PackageIdentity)
    -> Result<Vec<String>, InstallFailure>;
}
