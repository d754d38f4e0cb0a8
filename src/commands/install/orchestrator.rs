use anyhow::Result;
use log::debug;
use std::io::Write;

use super::request::InstallRequest;
use crate::installer::{InstallFailure, PackageInstaller};

/// How a dispatched install ended.
#[derive(Debug)]
pub enum InstallOutcome {
    Success,
    Failure(InstallFailure),
}

/// Dispatches `request` to the installer exactly once.
///
/// Installer failures are returned as [`InstallOutcome::Failure`] without
/// retrying. On success a single blank line is written to `out`. The only
/// error returned is a failure to write to `out`.
#[tracing::instrument(skip(installer, out))]
pub async fn run<I, W>(request: &InstallRequest, installer: &I, out: &mut W) -> Result<InstallOutcome>
where
    I: PackageInstaller + ?Sized,
    W: Write,
{
    let result = match request {
        InstallRequest::Bulk => installer.install_dependencies().await,
        InstallRequest::Single { target, .. } => installer.install_package(target).await,
    };

    match result {
        Ok(()) => {
            writeln!(out)?;
            Ok(InstallOutcome::Success)
        }
        Err(failure) => {
            debug!("Install failed with code {}: {}", failure.code(), failure);
            Ok(InstallOutcome::Failure(failure))
        }
    }
}
