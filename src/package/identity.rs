//! Package specifier parsing.
//!
//! A specifier is the command-line token naming a package, optionally
//! followed by a version constraint: `name` or `name#constraint`.

use std::fmt;

/// Constraint used when a specifier does not carry one.
pub const ANY_VERSION: &str = "*";

/// A package name paired with the version constraint it should satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    name: String,
    version_constraint: String,
}

impl PackageIdentity {
    /// Creates an identity; an empty constraint becomes [`ANY_VERSION`].
    pub fn new(name: impl Into<String>, version_constraint: impl Into<String>) -> Self {
        let version_constraint = version_constraint.into();
        let version_constraint = if version_constraint.is_empty() {
            ANY_VERSION.to_string()
        } else {
            version_constraint
        };
        Self {
            name: name.into(),
            version_constraint,
        }
    }

    /// Parses an optional raw specifier.
    ///
    /// `None` means no package was named (install everything from the manifest).
    /// Otherwise the token is split on its first `#`. The name is not validated
    /// here; the installer rejects names it cannot resolve.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        Some(match raw.split_once('#') {
            Some((name, constraint)) => Self::new(name, constraint),
            None => Self::new(raw, ANY_VERSION),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_constraint(&self) -> &str {
        &self.version_constraint
    }

    /// Whether the constraint accepts any version.
    pub fn is_any_version(&self) -> bool {
        self.version_constraint == ANY_VERSION
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.version_constraint)
    }
}
