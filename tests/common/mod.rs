//! Common test utilities for capgains integration tests

use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch workspace for integration tests
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in the workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from the workspace
    #[allow(dead_code)]
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    /// Check if a file exists in the workspace
    #[allow(dead_code)]
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Ledger file used by commands run in this workspace
    pub fn ledger_path(&self) -> PathBuf {
        self.path.join("ledger.json")
    }
}

/// A capgains command confined to the workspace (ledger, config and home all
/// point inside it)
pub fn capgains_cmd(workspace: &TestWorkspace) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("capgains").expect("capgains binary");
    cmd.current_dir(&workspace.path)
        .env("CAPGAINS_LEDGER", workspace.ledger_path())
        .env("HOME", &workspace.path)
        .env("XDG_CONFIG_HOME", workspace.path.join(".config"))
        .env("XDG_DATA_HOME", workspace.path.join(".local/share"));
    cmd
}

/// Header row for transaction CSV fixtures
#[allow(dead_code)]
pub const TX_HEADER: &str = "kind,uniqueid,datetime,dtsettle,brokerid,acctid,uniqueidtype,secid,\
ticker,secname,currency,cash,units,securityprice,fromacctid,fromuniqueidtype,fromsecid,\
fromunits,fromsecurityprice,numerator,denominator,sort,memo";
