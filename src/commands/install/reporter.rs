use anyhow::{Context, Result};
use console::style;
use std::io::Write;

use crate::installer::{InstallFailure, PackageInstaller};
use crate::package::PackageIdentity;

/// Writes the diagnostic for a failed install and returns the exit status.
///
/// A version that could not be found for the named package is followed by the
/// versions the installer does know about. A missing version of one of its
/// dependencies is reported without that list. If that lookup fails, its error
/// is returned instead of the exit status.
#[tracing::instrument(skip(installer, out))]
pub async fn report<I, W>(
    failure: &InstallFailure,
    target: Option<&PackageIdentity>,
    installer: &I,
    out: &mut W,
) -> Result<i32>
where
    I: PackageInstaller + ?Sized,
    W: Write,
{
    writeln!(out, "{}", style(failure).red())?;

    if let (InstallFailure::VersionNotFound { name, .. }, Some(target)) = (failure, target)
        && name == target.name()
    {
        let versions = installer
            .package_versions(target)
            .await
            .with_context(|| format!("Failed to list versions of {}", target.name()))?;
        writeln!(out, "Available versions: {}", versions.join(", "))?;
    }

    Ok(failure.code())
}
