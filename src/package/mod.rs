//! Package identities, project manifests and version resolution.

mod identity;
mod manifest;
mod version;

pub use identity::{ANY_VERSION, PackageIdentity};
#[cfg(test)]
pub use manifest::MockManifestStore;
pub use manifest::{JsonManifestStore, MANIFEST_FILE, Manifest, ManifestStore};
pub use version::VersionResolver;
