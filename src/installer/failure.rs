//! Install failure taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// Numeric codes carried by [`InstallFailure`]; they become the process exit status.
pub mod codes {
    pub const GENERIC: i32 = 1;
    pub const PACKAGE_NOT_FOUND: i32 = 2;
    pub const VERSION_NOT_FOUND: i32 = 3;
    pub const MANIFEST_MISSING: i32 = 4;
    pub const NETWORK: i32 = 5;
}

/// A failure raised by the package installer while installing.
#[derive(Debug, Error)]
pub enum InstallFailure {
    #[error("Package {name} not found")]
    PackageNotFound { name: String },

    #[error("Version {constraint} not found for package {name}")]
    VersionNotFound { name: String, constraint: String },

    #[error("bower.json not found at {}", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Other { code: i32, message: String },
}

impl InstallFailure {
    /// Exit status for this failure. Never zero.
    pub fn code(&self) -> i32 {
        match self {
            InstallFailure::PackageNotFound { .. } => codes::PACKAGE_NOT_FOUND,
            InstallFailure::VersionNotFound { .. } => codes::VERSION_NOT_FOUND,
            InstallFailure::ManifestMissing { .. } => codes::MANIFEST_MISSING,
            InstallFailure::Network(_) => codes::NETWORK,
            InstallFailure::Other { code: 0, .. } => codes::GENERIC,
            InstallFailure::Other { code, .. } => *code,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        InstallFailure::Other {
            code: codes::GENERIC,
            message: message.into(),
        }
    }

    /// Folds a transport error chain into a single-line network failure.
    pub fn network(error: anyhow::Error) -> Self {
        InstallFailure::Network(format!("{:#}", error))
    }
}

impl From<anyhow::Error> for InstallFailure {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<InstallFailure>() {
            Ok(failure) => failure,
            Err(error) => InstallFailure::other(format!("{:#}", error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_codes() {
        let cases = [
            (
                InstallFailure::PackageNotFound {
                    name: "nope".into(),
                },
                codes::PACKAGE_NOT_FOUND,
            ),
            (
                InstallFailure::VersionNotFound {
                    name: "jquery".into(),
                    constraint: "9.9.9".into(),
                },
                codes::VERSION_NOT_FOUND,
            ),
            (
                InstallFailure::ManifestMissing {
                    path: PathBuf::from("bower.json"),
                },
                codes::MANIFEST_MISSING,
            ),
            (InstallFailure::Network("timeout".into()), codes::NETWORK),
            (
                InstallFailure::Other {
                    code: 42,
                    message: "m".into(),
                },
                42,
            ),
        ];
        for (failure, code) in cases {
            assert_eq!(failure.code(), code, "{}", failure);
        }
    }

    #[test]
    fn test_other_with_zero_code_is_still_a_failure() {
        let failure = InstallFailure::Other {
            code: 0,
            message: "m".into(),
        };
        assert_eq!(failure.code(), codes::GENERIC);
    }

    #[test]
    fn test_messages() {
        let failure = InstallFailure::VersionNotFound {
            name: "jquery".into(),
            constraint: "9.9.9".into(),
        };
        assert_eq!(failure.to_string(), "Version 9.9.9 not found for package jquery");

        let failure = InstallFailure::PackageNotFound {
            name: "nope".into(),
        };
        assert_eq!(failure.to_string(), "Package nope not found");
    }

    #[test]
    fn test_from_anyhow_keeps_wrapped_failure() {
        let error = anyhow::Error::new(InstallFailure::PackageNotFound {
            name: "nope".into(),
        });
        let failure = InstallFailure::from(error);
        assert!(matches!(failure, InstallFailure::PackageNotFound { .. }));
    }

    #[test]
    fn test_from_anyhow_wraps_plain_error() {
        let failure = InstallFailure::from(anyhow!("disk full").context("Failed to write"));
        assert_eq!(failure.code(), codes::GENERIC);
        assert_eq!(failure.to_string(), "Failed to write: disk full");
    }
}
