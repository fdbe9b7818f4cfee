//! Integration tests for the hangar CLI

use std::fs;
use std::process::Command;

const CATALOG: &str = r#"{
    "id": "acme",
    "packages": [
        {
            "id": "glider",
            "name": "Acme Glider",
            "revision": 3,
            "md5": "d41d8cd98f00b204e9800998ecf8427e",
            "dir": "Glider",
            "urls": ["http://127.0.0.1:9/glider.zip"],
            "tags": ["Glider"]
        },
        {
            "id": "tug",
            "name": "Tow Plane",
            "revision": 1,
            "dir": "Tug",
            "tags": ["Propeller"]
        }
    ]
}"#;

fn hangar() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hangar"));
    command.env_remove("HANGAR_CATALOG").env_remove("RUST_LOG");
    command
}

#[test]
fn test_cli_version() {
    let output = hangar().arg("--version").output().expect("Failed to execute hangar");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hangar"));
}

#[test]
fn test_cli_help() {
    let output = hangar().arg("--help").output().expect("Failed to execute hangar");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("install"));
    assert!(stdout.contains("uninstall"));
    assert!(stdout.contains("search"));
}

#[test]
fn test_cli_invalid_command() {
    let output = hangar()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute hangar");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_missing_catalog_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let output = hangar()
        .args(["--install-root"])
        .arg(temp.path())
        .arg("status")
        .output()
        .expect("Failed to execute hangar");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("catalog"));
}

#[test]
fn test_search_by_tag_as_json() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = temp.path().join("catalog.json");
    fs::write(&catalog, CATALOG).unwrap();

    let output = hangar()
        .arg("--json")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--install-root")
        .arg(temp.path().join("root"))
        .args(["search", "--tag", "glider"])
        .output()
        .expect("Failed to execute hangar");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let packages = value["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["id"], "acme.glider");
    assert_eq!(packages[0]["installed"], false);
}

#[test]
fn test_status_lists_adopted_installs() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = temp.path().join("catalog.json");
    fs::write(&catalog, CATALOG).unwrap();
    let glider = temp.path().join("root/Aircraft/Glider");
    fs::create_dir_all(&glider).unwrap();
    fs::write(glider.join(".revision"), "2\n").unwrap();

    let output = hangar()
        .arg("--json")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--install-root")
        .arg(temp.path().join("root"))
        .arg("status")
        .output()
        .expect("Failed to execute hangar");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let installed = value["installed"].as_array().unwrap();
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0]["package"], "acme.glider");
    assert_eq!(installed[0]["installedRevision"], 2);
    assert_eq!(installed[0]["hasUpdate"], true);
}

#[test]
fn test_uninstall_unknown_package_fails() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = temp.path().join("catalog.json");
    fs::write(&catalog, CATALOG).unwrap();

    let output = hangar()
        .arg("--catalog")
        .arg(&catalog)
        .arg("--install-root")
        .arg(temp.path().join("root"))
        .args(["uninstall", "tug"])
        .output()
        .expect("Failed to execute hangar");

    assert!(!output.status.success());
}
