use anyhow::Result;
use std::io::Write;

use crate::{
    archive::TarGzExtractor,
    installer::{Installer, PackageInstaller},
    package::JsonManifestStore,
    registry::BowerRegistry,
    runtime::Runtime,
};

use super::config::{ConfigOverrides, InstallConfig, github_token, http_client};

mod orchestrator;
mod reporter;
mod request;

pub use orchestrator::{InstallOutcome, run};
pub use reporter::report;
pub use request::InstallRequest;

/// `install [--save] [package[#version]]`; returns the process exit status.
#[tracing::instrument(skip(runtime, overrides))]
pub async fn install<R: Runtime + Clone + 'static>(
    runtime: R,
    specifier: Option<&str>,
    save: bool,
    overrides: ConfigOverrides,
) -> Result<i32> {
    let request = InstallRequest::new(specifier, save);
    let config = InstallConfig::new(&runtime, overrides, request.saves_to_manifest())?;

    let registry = BowerRegistry::new(http_client()?, &config.registry_url, &config.api_url)
        .with_token(github_token(&runtime));
    let manifest = JsonManifestStore::new(runtime.clone(), config.manifest_path());
    let extractor = TarGzExtractor::new(runtime.clone());
    let installer = Installer::new(runtime, registry, manifest, extractor, config);

    let mut out = std::io::stdout();
    execute(&request, &installer, &mut out).await
}

/// Runs the request and, when it fails, reports the failure.
pub async fn execute<I, W>(request: &InstallRequest, installer: &I, out: &mut W) -> Result<i32>
where
    I: PackageInstaller + ?Sized,
    W: Write,
{
    match run(request, installer, out).await? {
        InstallOutcome::Success => Ok(0),
        InstallOutcome::Failure(failure) => {
            report(&failure, request.target(), installer, out).await
        }
    }
}
