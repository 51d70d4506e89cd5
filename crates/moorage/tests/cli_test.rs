//! Docker に接続しないコマンドの CLI テスト

mod common;

use common::moorage;
use predicates::prelude::*;

const CYCLIC: &str = r#"
services:
  a:
    image: alpine
    depends_on: [b]
  b:
    image: alpine
    depends_on: [a]
"#;

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    moorage(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("templates"));
}

#[test]
fn test_install_help() {
    let dir = tempfile::tempdir().unwrap();
    moorage(dir.path())
        .args(["install", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--env"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--volume"));
}

#[test]
fn test_validate_ok() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("compose.yml");
    std::fs::write(
        &manifest,
        "version: \"3.8\"\nservices:\n  web:\n    image: nginx\n    depends_on: [db]\n  db:\n    image: postgres\n",
    )
    .unwrap();

    moorage(&dir.path().join("data"))
        .arg("validate")
        .arg("-f")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("web"))
        .stdout(predicate::str::contains("db"))
        .stdout(predicate::str::contains("3.8"));
}

#[test]
fn test_validate_parse_error_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("compose.yml");
    std::fs::write(&manifest, "services: [unclosed").unwrap();

    moorage(&dir.path().join("data"))
        .arg("validate")
        .arg("-f")
        .arg(&manifest)
        .assert()
        .code(2);
}

/// 循環依存は validate では検出しない（パースのみ）
#[test]
fn test_validate_does_not_resolve_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("compose.yml");
    std::fs::write(&manifest, CYCLIC).unwrap();

    moorage(&dir.path().join("data"))
        .arg("validate")
        .arg("-f")
        .arg(&manifest)
        .assert()
        .success();
}

#[test]
fn test_validate_missing_file_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    moorage(dir.path())
        .args(["validate", "-f", "does-not-exist.yml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.yml"));
}

#[test]
fn test_templates_list_and_get() {
    let dir = tempfile::tempdir().unwrap();

    moorage(dir.path())
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("monitoring"))
        .stdout(predicate::str::contains("nextcloud-mariadb"))
        .stdout(predicate::str::contains("wordpress"));

    assert!(dir.path().join("apps/compose-templates/wordpress.yml").is_file());

    moorage(dir.path())
        .args(["templates", "wordpress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("services:"));
}

#[test]
fn test_templates_unknown_or_invalid_exits_2() {
    let dir = tempfile::tempdir().unwrap();

    moorage(dir.path())
        .args(["templates", "nope"])
        .assert()
        .code(2);

    moorage(dir.path())
        .args(["templates", "../secrets"])
        .assert()
        .code(2);
}

#[test]
fn test_apps_writes_default_catalog() {
    let dir = tempfile::tempdir().unwrap();

    moorage(dir.path())
        .arg("apps")
        .assert()
        .success()
        .stdout(predicate::str::contains("nextcloud"))
        .stdout(predicate::str::contains("NEXTCLOUD_ADMIN_PASSWORD"));

    assert!(dir.path().join("apps/apps.json").is_file());
}

#[test]
fn test_invalid_port_mapping_rejected() {
    let dir = tempfile::tempdir().unwrap();
    moorage(dir.path())
        .args(["install", "gitea", "-p", "web=http"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("web=http"));
}
