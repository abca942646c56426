//! CLI surface integration tests

mod common;

use predicates::prelude::*;

#[test]
fn test_no_args_shows_usage() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .arg("frobnicate")
        .assert()
        .failure();
}

#[test]
fn test_help_lists_commands() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("lots"))
        .stdout(predicate::str::contains("gains"))
        .stdout(predicate::str::contains("dev"));
}

#[test]
fn test_version_command() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("capgains"));
}

#[test]
fn test_completions_bash() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("capgains"));
}

#[test]
fn test_completions_unknown_shell() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown shell"));
}

#[test]
fn test_import_missing_file_fails() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .args(["import", "nonexistent.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_import_unrecognized_format_fails() {
    let workspace = common::TestWorkspace::new();
    workspace.write_file("mystery.csv", "alpha,beta\n1,2\n");
    common::capgains_cmd(&workspace)
        .args(["import", "mystery.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized format"));
}

#[test]
fn test_gains_rejects_bad_date() {
    let workspace = common::TestWorkspace::new();
    common::capgains_cmd(&workspace)
        .args(["gains", "out.csv", "-s", "06/01/2024"])
        .assert()
        .failure();
}

#[test]
fn test_import_bad_row_reports_line_and_column() {
    let workspace = common::TestWorkspace::new();
    workspace.write_file(
        "bad.csv",
        &format!(
            "{}\ntrade,tx-1,2016-01-04,,broker.test,1111,CUSIP,123456789,,,USD,oops,100,,,,,,,,,,\n",
            common::TX_HEADER
        ),
    );
    common::capgains_cmd(&workspace)
        .args(["import", "bad.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cash"))
        .stderr(predicate::str::contains(":2:"));
}
