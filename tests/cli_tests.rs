//! End-to-end tests for the nsadmin binary

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn nsadmin(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nsadmin"))
        .arg("--store")
        .arg(store)
        .args(args)
        .output()
        .expect("Failed to execute nsadmin")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stored(store: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(store).unwrap()).unwrap()
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_nsadmin"))
        .arg("--help")
        .output()
        .expect("Failed to execute nsadmin");

    assert!(output.status.success());
    assert!(stdout(&output).contains("reserved"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_nsadmin"))
        .arg("--version")
        .output()
        .expect("Failed to execute nsadmin");

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_namespace_and_owner_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("namespaces.json");

    assert!(nsadmin(&store, &["add-user", "alice"]).status.success());
    assert!(nsadmin(&store, &["add-user", "bob", "--on-behalf-of", "alice"])
        .status
        .success());

    let output = nsadmin(&store, &["add-namespace", "Contoso.", "--public"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Reserved namespace: Contoso."));

    assert!(nsadmin(&store, &["add-owner", "Contoso.", "alice"]).status.success());

    let output = nsadmin(&store, &["list"]);
    assert!(stdout(&output).contains("Contoso. [public]  owners: alice"));

    let output = nsadmin(&store, &["matching", "contoso.tools"]);
    assert!(stdout(&output).contains("Contoso."));

    let output = nsadmin(&store, &["check", "Contoso.Tools", "bob"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("denied"));

    let output = nsadmin(&store, &["check", "Contoso.Tools", "bob", "--on-behalf"]);
    assert!(stdout(&output).contains("pushing on behalf of alice"));

    assert!(nsadmin(&store, &["remove-owner", "Contoso.", "alice"])
        .status
        .success());
    let json = stored(&store);
    assert!(json["namespaces"][0]["owners"].as_array().unwrap().is_empty());

    assert!(nsadmin(&store, &["delete-namespace", "contoso."]).status.success());
    assert!(stdout(&nsadmin(&store, &["list"])).contains("No reserved namespaces"));
}

#[test]
fn test_owner_change_updates_stored_verified_flag() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("namespaces.json");
    std::fs::write(
        &store,
        r#"{
  "namespaces": [{ "prefix": "Contoso." }],
  "registrations": [{ "id": "Contoso.Tools", "owners": ["alice"] }],
  "users": [{ "username": "alice" }]
}"#,
    )
    .unwrap();

    assert!(nsadmin(&store, &["add-owner", "Contoso.", "alice"]).status.success());
    assert_eq!(stored(&store)["registrations"][0]["verified"], true);

    assert!(nsadmin(&store, &["remove-owner", "Contoso.", "alice", "--commit-each"])
        .status
        .success());
    assert_eq!(stored(&store)["registrations"][0]["verified"], false);
}

#[test]
fn test_error_exit_codes() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("namespaces.json");
    assert!(nsadmin(&store, &["add-namespace", "Contoso."]).status.success());

    let output = nsadmin(&store, &["add-namespace", "CONTOSO."]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Already exists"));

    assert_eq!(
        nsadmin(&store, &["delete-namespace", "Missing."]).status.code(),
        Some(3)
    );
    assert_eq!(
        nsadmin(&store, &["add-owner", "Contoso.", "mallory"]).status.code(),
        Some(2)
    );
    assert_eq!(
        nsadmin(&store, &["add-namespace", "Bad Prefix"]).status.code(),
        Some(2)
    );
    assert_eq!(nsadmin(&store, &["no-such-command"]).status.code(), Some(2));
}

#[test]
fn test_config_file_supplies_store_path() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("from-config.json");
    let config = temp_dir.path().join("nsadmin.toml");
    std::fs::write(
        &config,
        format!("store_path = {:?}\nmax_prefix_length = 8\n", store.to_string_lossy()),
    )
    .unwrap();

    let run = |args: &[&str]| {
        Command::new(env!("CARGO_BIN_EXE_nsadmin"))
            .arg("--config")
            .arg(&config)
            .args(args)
            .output()
            .expect("Failed to execute nsadmin")
    };

    assert!(run(&["add-namespace", "Short."]).status.success());
    assert!(store.exists());
    assert_eq!(run(&["add-namespace", "MuchTooLong."]).status.code(), Some(2));
}
