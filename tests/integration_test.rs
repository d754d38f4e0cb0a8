use assert_cmd::Command;
use assert_cmd::cargo;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::{Server, ServerGuard};
use predicates::prelude::*;
use std::fs;
use std::io::prelude::*;
use std::path::Path;
use tar::Builder;
use tempfile::tempdir;

fn create_tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_path(name).unwrap();
        header.set_mode(0o644);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn bowl(project: &Path, cache: &Path, server: &ServerGuard) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("bowl"));
    cmd.arg("--cwd")
        .arg(project)
        .arg("--cache-dir")
        .arg(cache)
        .arg("--registry-url")
        .arg(server.url())
        .arg("--api-url")
        .arg(server.url())
        .env_remove("GITHUB_TOKEN");
    cmd
}

fn mock_jquery(server: &mut ServerGuard) {
    let url = server.url();

    server
        .mock("GET", "/packages/jquery")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"jquery","url":"git://github.com/jquery/jquery-dist.git"}"#)
        .create();

    server
        .mock("GET", "/repos/jquery/jquery-dist/tags?per_page=100&page=1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"[
                {{"name": "2.1.4", "tarball_url": "{url}/tarball/2.1.4"}},
                {{"name": "2.1.3", "tarball_url": "{url}/tarball/2.1.3"}},
                {{"name": "1.11.3", "tarball_url": "{url}/tarball/1.11.3"}}
            ]"#
        ))
        .create();

    server
        .mock("GET", "/tarball/2.1.4")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body(create_tar_gz(&[
            ("jquery-dist-2.1.4/jquery.js", "/* jQuery 2.1.4 */"),
            ("jquery-dist-2.1.4/bower.json", r#"{"name": "jquery"}"#),
        ]))
        .create();
}

#[test]
fn test_bulk_install_without_manifest() {
    let server = Server::new();
    let project = tempdir().unwrap();
    let cache = tempdir().unwrap();

    bowl(project.path(), cache.path(), &server)
        .arg("install")
        .assert()
        .code(4)
        .stdout(predicate::str::contains("bower.json not found at"));
}

#[test]
fn test_install_unknown_version_lists_available_versions() {
    let mut server = Server::new();
    mock_jquery(&mut server);
    let project = tempdir().unwrap();
    let cache = tempdir().unwrap();

    bowl(project.path(), cache.path(), &server)
        .args(["install", "jquery#9.9.9"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains(
            "Version 9.9.9 not found for package jquery",
        ))
        .stdout(predicate::str::contains(
            "Available versions: 2.1.4, 2.1.3, 1.11.3",
        ));

    assert!(!project.path().join("bower_components/jquery").exists());
}

#[test]
fn test_install_unknown_package() {
    let mut server = Server::new();
    server.mock("GET", "/packages/nope").with_status(404).create();
    let project = tempdir().unwrap();
    let cache = tempdir().unwrap();

    bowl(project.path(), cache.path(), &server)
        .args(["install", "nope"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Package nope not found"))
        .stdout(predicate::str::contains("Available versions").not());
}

#[test]
fn test_install_and_save_package() {
    let mut server = Server::new();
    mock_jquery(&mut server);
    let project = tempdir().unwrap();
    let cache = tempdir().unwrap();
    fs::write(
        project.path().join("bower.json"),
        r#"{"name": "site", "dependencies": {}}"#,
    )
    .unwrap();

    bowl(project.path(), cache.path(), &server)
        .args(["install", "-S", "jquery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installing jquery 2.1.4"))
        .stdout(predicate::str::ends_with("\n\n"));

    let installed = project.path().join("bower_components/jquery");
    assert_eq!(
        fs::read_to_string(installed.join("jquery.js")).unwrap(),
        "/* jQuery 2.1.4 */"
    );
    assert!(installed.join(".bower.json").exists());
    assert!(cache.path().join("jquery/2.1.4.tar.gz").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(project.path().join("bower.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["name"], "site");
    assert_eq!(manifest["dependencies"]["jquery"], "~2.1.4");
}

#[test]
fn test_bulk_install_from_manifest() {
    let mut server = Server::new();
    mock_jquery(&mut server);
    let project = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let manifest = r#"{"name": "site", "dependencies": {"jquery": "~2.1.0"}}"#;
    fs::write(project.path().join("bower.json"), manifest).unwrap();

    bowl(project.path(), cache.path(), &server)
        .args(["install", "--save"])
        .assert()
        .success();

    assert!(
        project
            .path()
            .join("bower_components/jquery/jquery.js")
            .exists()
    );
    assert_eq!(
        fs::read_to_string(project.path().join("bower.json")).unwrap(),
        manifest
    );
}

#[test]
fn test_version_flag() {
    Command::new(cargo::cargo_bin!("bowl"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("bowl "));
}
