//! Dev workflow integration tests
//!
//! Exercises the operational contract: best-effort clean, fail-fast
//! sequencing, and the install ordering (clean before uninstall before
//! install), using --dry-run where a step would touch cargo.

mod common;

use predicates::prelude::*;

fn seed_artifacts(workspace: &common::TestWorkspace) {
    workspace.write_file("target/debug/capgains", "bin");
    workspace.write_file("dist/capgains-0.3.0.tar.gz", "dist");
    workspace.write_file("coverage/capgains-1.profraw", "prof");
    workspace.write_file("capgains-2.profraw", "prof");
    workspace.write_file("src/main.rs~", "backup");
    workspace.write_file("settings.local.yaml", "local: true");
    workspace.write_file("test-ledger.json", "{}");
}

#[test]
fn test_clean_removes_artifacts_and_scratch_files() {
    let workspace = common::TestWorkspace::new();
    seed_artifacts(&workspace);
    workspace.write_file("src/main.rs", "fn main() {}");

    common::capgains_cmd(&workspace)
        .args(["dev", "clean"])
        .assert()
        .success();

    assert!(!workspace.file_exists("target"));
    assert!(!workspace.file_exists("dist"));
    assert!(!workspace.file_exists("coverage"));
    assert!(!workspace.file_exists("capgains-2.profraw"));
    assert!(!workspace.file_exists("src/main.rs~"));
    assert!(!workspace.file_exists("settings.local.yaml"));
    assert!(!workspace.file_exists("test-ledger.json"));
    // Source files survive the sweep
    assert!(workspace.file_exists("src/main.rs"));
}

#[test]
fn test_clean_succeeds_when_already_clean() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .args(["dev", "clean"])
        .assert()
        .success();
    // Idempotent: a second run still succeeds
    common::capgains_cmd(&workspace)
        .args(["dev", "clean"])
        .assert()
        .success();
}

#[test]
fn test_install_dry_run_orders_steps() {
    let workspace = common::TestWorkspace::new();
    let output = common::capgains_cmd(&workspace)
        .args(["dev", "--dry-run", "install"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).expect("utf8 stdout");

    let uninstall_at = stdout
        .find("cargo uninstall capgains")
        .expect("plans uninstall");
    let install_at = stdout
        .find("cargo install --path . --locked")
        .expect("plans install");
    assert!(uninstall_at < install_at);
}

#[test]
fn test_install_dry_run_cleans_first() {
    let workspace = common::TestWorkspace::new();
    seed_artifacts(&workspace);

    let output = common::capgains_cmd(&workspace)
        .args(["dev", "--dry-run", "install"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).expect("utf8 stdout");

    let clean_at = stdout.find("target").expect("plans artifact removal");
    let uninstall_at = stdout
        .find("cargo uninstall capgains")
        .expect("plans uninstall");
    assert!(clean_at < uninstall_at);
    // Dry run must not remove anything
    assert!(workspace.file_exists("target/debug/capgains"));
    assert!(workspace.file_exists("test-ledger.json"));
}

#[test]
fn test_test_dry_run_uses_coverage_instrumentation() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .args(["dev", "--dry-run", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "cargo test --all-features -- --nocapture",
        ));
}

#[test]
fn test_lint_dry_run_targets_sources_and_tests_separately() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .args(["dev", "--dry-run", "lint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clippy"))
        .stdout(predicate::str::contains("--lib --bins"));

    common::capgains_cmd(&workspace)
        .args(["dev", "--dry-run", "lint-tests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--tests"));
}

#[test]
fn test_uninstall_dry_run() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .args(["dev", "--dry-run", "uninstall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cargo uninstall capgains"));
}
