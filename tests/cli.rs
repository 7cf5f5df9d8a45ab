use assert_cmd::Command;
use predicates::prelude::*;

fn entra_ssh(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("entra-ssh").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_flags() {
    let home = tempfile::tempdir().unwrap();
    entra_ssh(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--resource-group"))
        .stdout(predicate::str::contains("--prefer-private-ip"))
        .stdout(predicate::str::contains("--keys-folder"));
}

#[test]
fn test_unknown_client_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    entra_ssh(home.path())
        .args(["--client", "putty"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_azure_cli_exits_with_one() {
    let home = tempfile::tempdir().unwrap();
    let empty_path = tempfile::tempdir().unwrap();

    entra_ssh(home.path())
        .env("PATH", empty_path.path())
        .args(["-g", "RG1", "-n", "vm01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Azure CLI (az) not found"));

    // Nothing is written before the prerequisite check passes
    assert!(!home.path().join(".ssh").exists());
}

#[test]
fn test_invalid_keys_folder_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    entra_ssh(home.path())
        .args(["--keys-folder", "../elsewhere", "-g", "RG1", "-n", "vm01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}
