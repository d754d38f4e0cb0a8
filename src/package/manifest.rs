//! The project manifest (`bower.json`).
//!
//! The document is kept as an ordered JSON map so rewriting it after `--save`
//! preserves every field and its position.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::identity::PackageIdentity;
use crate::installer::InstallFailure;
use crate::runtime::Runtime;

pub const MANIFEST_FILE: &str = "bower.json";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    fields: Map<String, Value>,
}

impl Manifest {
    pub fn parse(contents: &str) -> Result<Self> {
        let fields = serde_json::from_str(contents).context("Manifest is not a JSON object")?;
        Ok(Self { fields })
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let contents = runtime.read_to_string(path)?;
        Self::parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&self.fields)?;
        json.push('\n');
        Ok(json)
    }

    /// Declared dependencies in manifest order.
    pub fn dependencies(&self) -> Vec<PackageIdentity> {
        let Some(deps) = self.fields.get("dependencies").and_then(Value::as_object) else {
            return Vec::new();
        };
        deps.iter()
            .map(|(name, constraint)| {
                PackageIdentity::new(name.as_str(), constraint.as_str().unwrap_or_default())
            })
            .collect()
    }

    /// Adds or replaces a dependency entry.
    pub fn add_dependency(&mut self, name: &str, constraint: &str) {
        let deps = self
            .fields
            .entry("dependencies")
            .or_insert_with(|| Value::Object(Map::new()));
        if !deps.is_object() {
            *deps = Value::Object(Map::new());
        }
        if let Value::Object(deps) = deps {
            deps.insert(name.to_string(), Value::String(constraint.to_string()));
        }
    }
}

/// Read and update access to the project manifest.
#[cfg_attr(test, mockall::automock)]
pub trait ManifestStore: Send + Sync {
    /// Dependencies declared by the project.
    fn dependencies(&self) -> Result<Vec<PackageIdentity>, InstallFailure>;

    /// Records an installed package as a project dependency.
    fn record(&self, package: &PackageIdentity, version: &str) -> Result<(), InstallFailure>;
}

/// [`ManifestStore`] backed by a `bower.json` file.
pub struct JsonManifestStore<R: Runtime> {
    runtime: R,
    path: PathBuf,
}

impl<R: Runtime> JsonManifestStore<R> {
    pub fn new(runtime: R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    /// Constraint written for an installed package: `~<version>` for wildcard
    /// requests, otherwise the constraint as requested.
    pub fn saved_constraint(package: &PackageIdentity, version: &str) -> String {
        if package.is_any_version() {
            format!("~{}", version.trim_start_matches('v'))
        } else {
            package.version_constraint().to_string()
        }
    }
}

impl<R: Runtime> ManifestStore for JsonManifestStore<R> {
    #[tracing::instrument(skip(self))]
    fn dependencies(&self) -> Result<Vec<PackageIdentity>, InstallFailure> {
        if !self.runtime.exists(&self.path) {
            return Err(InstallFailure::ManifestMissing {
                path: self.path.clone(),
            });
        }
        let manifest = Manifest::load(&self.runtime, &self.path)?;
        Ok(manifest.dependencies())
    }

    #[tracing::instrument(skip(self))]
    fn record(&self, package: &PackageIdentity, version: &str) -> Result<(), InstallFailure> {
        if !self.runtime.exists(&self.path) {
            warn!(
                "{} not found, {} was not saved",
                self.path.display(),
                package.name()
            );
            return Ok(());
        }

        let mut manifest = Manifest::load(&self.runtime, &self.path)?;
        let constraint = Self::saved_constraint(package, version);
        manifest.add_dependency(package.name(), &constraint);

        debug!(
            "Saving {}#{} to {}",
            package.name(),
            constraint,
            self.path.display()
        );
        self.runtime
            .write(&self.path, manifest.to_json()?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_manifest_dependencies_in_order() {
        let manifest = Manifest::parse(
            r#"{"name":"app","dependencies":{"jquery":"~2.1","bootstrap":"*","angular":""}}"#,
        )
        .unwrap();
        let deps = manifest.dependencies();
        assert_eq!(
            deps,
            vec![
                PackageIdentity::new("jquery", "~2.1"),
                PackageIdentity::new("bootstrap", "*"),
                PackageIdentity::new("angular", "*"),
            ]
        );
    }

    #[test]
    fn test_manifest_without_dependencies() {
        let manifest = Manifest::parse(r#"{"name":"app"}"#).unwrap();
        assert!(manifest.dependencies().is_empty());
    }

    #[test]
    fn test_manifest_rejects_non_object() {
        assert!(Manifest::parse("[]").is_err());
    }

    #[test]
    fn test_add_dependency_preserves_field_order() {
        let mut manifest =
            Manifest::parse(r#"{"name":"app","dependencies":{"jquery":"~2.1"},"private":true}"#)
                .unwrap();
        manifest.add_dependency("bootstrap", "~3.3.7");
        manifest.add_dependency("jquery", "~2.2");

        let json: Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "dependencies", "private"]);
        let deps: Vec<(&String, &Value)> =
            json["dependencies"].as_object().unwrap().iter().collect();
        assert_eq!(deps[0], (&"jquery".to_string(), &Value::from("~2.2")));
        assert_eq!(deps[1], (&"bootstrap".to_string(), &Value::from("~3.3.7")));
    }

    #[test]
    fn test_add_dependency_creates_section() {
        let mut manifest = Manifest::parse(r#"{"name":"app"}"#).unwrap();
        manifest.add_dependency("jquery", "~2.1.4");
        assert_eq!(
            manifest.dependencies(),
            vec![PackageIdentity::new("jquery", "~2.1.4")]
        );
    }

    #[test]
    fn test_saved_constraint() {
        let any = PackageIdentity::new("jquery", "*");
        assert_eq!(
            JsonManifestStore::<RealRuntime>::saved_constraint(&any, "v2.1.4"),
            "~2.1.4"
        );
        let pinned = PackageIdentity::new("jquery", "2.1.x");
        assert_eq!(
            JsonManifestStore::<RealRuntime>::saved_constraint(&pinned, "2.1.4"),
            "2.1.x"
        );
    }

    #[test]
    fn test_store_missing_manifest() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/project/bower.json")))
            .returning(|_| false);

        let store = JsonManifestStore::new(runtime, PathBuf::from("/project/bower.json"));
        let err = store.dependencies().unwrap_err();
        assert!(matches!(err, InstallFailure::ManifestMissing { .. }));
    }

    #[test]
    fn test_store_record_without_manifest_is_a_no_op() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        runtime.expect_write().never();

        let store = JsonManifestStore::new(runtime, PathBuf::from("/project/bower.json"));
        store
            .record(&PackageIdentity::new("jquery", "*"), "2.1.4")
            .unwrap();
    }

    #[test]
    fn test_store_record_writes_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, r#"{"name":"app"}"#).unwrap();

        let store = JsonManifestStore::new(RealRuntime, path.clone());
        store
            .record(&PackageIdentity::new("jquery", "*"), "2.1.4")
            .unwrap();

        assert_eq!(
            store.dependencies().unwrap(),
            vec![PackageIdentity::new("jquery", "~2.1.4")]
        );
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }

    #[test]
    fn test_store_invalid_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, "{ not json").unwrap();

        let store = JsonManifestStore::new(RealRuntime, path);
        let err = store.dependencies().unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
