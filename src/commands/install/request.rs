use log::debug;

use crate::package::PackageIdentity;

/// What a single `install` invocation was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallRequest {
    /// Install everything declared in the project manifest.
    Bulk,
    /// Install one named package, optionally saving it to the manifest.
    Single {
        target: PackageIdentity,
        save_to_manifest: bool,
    },
}

impl InstallRequest {
    /// Builds the request from the optional specifier and the `--save` flag.
    /// `--save` only applies to a named package.
    pub fn new(specifier: Option<&str>, save: bool) -> Self {
        match PackageIdentity::parse(specifier) {
            Some(target) => InstallRequest::Single {
                target,
                save_to_manifest: save,
            },
            None => {
                if save {
                    debug!("--save ignored: no package named");
                }
                InstallRequest::Bulk
            }
        }
    }

    pub fn target(&self) -> Option<&PackageIdentity> {
        match self {
            InstallRequest::Bulk => None,
            InstallRequest::Single { target, .. } => Some(target),
        }
    }

    pub fn saves_to_manifest(&self) -> bool {
        matches!(
            self,
            InstallRequest::Single {
                save_to_manifest: true,
                ..
            }
        )
    }
}
