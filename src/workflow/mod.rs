//! Dev workflow orchestration
//!
//! Named entry points for the development loop (`capgains dev <task>`).
//! Each task is a linear sequence of external tool invocations with
//! fail-fast exit-code propagation: a step's non-zero exit halts the
//! sequence and surfaces the child's own status unmodified.  Nothing is
//! retried or recovered here; failure handling belongs to the invoking
//! developer or CI system.

use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

use crate::error::{Result, workflow};

/// Named workflow operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    Test,
    Clean,
    Install,
    Uninstall,
    Lint,
    LintTests,
}

impl Task {
    pub fn name(self) -> &'static str {
        match self {
            Task::Test => "test",
            Task::Clean => "clean",
            Task::Install => "install",
            Task::Uninstall => "uninstall",
            Task::Lint => "lint",
            Task::LintTests => "lint-tests",
        }
    }
}

/// Build artifacts and scratch files removed by `clean`.
///
/// Removal is best-effort: missing paths are fine, `clean` never fails on
/// absence.
const CLEAN_DIRS: &[&str] = &["target", "dist", "coverage"];
const CLEAN_FILES: &[&str] = &["settings.local.yaml", "test-ledger.json"];

/// Runs workflow tasks against a project root.
///
/// With `dry_run`, prints the planned commands and removals without
/// executing anything.
pub struct Runner {
    root: PathBuf,
    dry_run: bool,
}

impl Runner {
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Runner { root, dry_run }
    }

    pub fn run(&self, task: Task) -> Result<()> {
        match task {
            Task::Test => self.test(),
            Task::Clean => self.clean(),
            Task::Install => self.install(),
            Task::Uninstall => self.uninstall(),
            Task::Lint => self.lint(),
            Task::LintTests => self.lint_tests(),
        }
    }

    /// Erase coverage state, then run the test runner with statement
    /// coverage instrumentation, verbose/no-capture
    fn test(&self) -> Result<()> {
        self.remove_coverage_state(Task::Test)?;
        self.exec(
            Task::Test,
            "cargo",
            &["test", "--all-features", "--", "--nocapture"],
            &[
                ("RUSTFLAGS", "-C instrument-coverage"),
                ("LLVM_PROFILE_FILE", "coverage/capgains-%p-%m.profraw"),
            ],
        )
    }

    /// Delete build artifacts, editor backups, coverage data, generated
    /// local settings and the scratch test ledger
    fn clean(&self) -> Result<()> {
        for dir in CLEAN_DIRS {
            self.remove_dir(Task::Clean, &self.root.join(dir))?;
        }
        for file in CLEAN_FILES {
            self.remove_file(Task::Clean, &self.root.join(file))?;
        }
        self.sweep_scratch_files(Task::Clean)?;
        Ok(())
    }

    /// clean, then uninstall, then install from source.
    ///
    /// Ordering is significant: stale artifacts and any prior installation
    /// must be gone before reinstalling, so the install is reproducible.
    fn install(&self) -> Result<()> {
        self.clean()?;
        self.uninstall()?;
        self.exec(
            Task::Install,
            "cargo",
            &["install", "--path", ".", "--locked"],
            &[],
        )
    }

    /// Remove any previously installed capgains, non-interactively.
    ///
    /// A missing installation is not a failure (mirrors auto-confirmed
    /// package-manager removal).
    fn uninstall(&self) -> Result<()> {
        let rendered = "cargo uninstall capgains";
        if self.dry_run {
            println!("{} {rendered}", style("Would run").cyan().bold());
            return Ok(());
        }
        println!("{} {rendered}", style("Running").green().bold());
        let output = Command::new("cargo")
            .args(["uninstall", "capgains"])
            .current_dir(&self.root)
            .output()
            .map_err(|e| workflow::spawn_failed(Task::Uninstall.name(), rendered, e.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("did not match any packages") {
            println!("capgains is not installed; nothing to uninstall.");
            return Ok(());
        }
        eprint!("{stderr}");
        Err(workflow::step_failed(
            Task::Uninstall.name(),
            rendered,
            output.status.to_string(),
        ))
    }

    /// Static analysis over package source (library and binaries)
    fn lint(&self) -> Result<()> {
        self.exec(
            Task::Lint,
            "cargo",
            &["clippy", "--all-features", "--lib", "--bins", "--", "-D", "warnings"],
            &[],
        )
    }

    /// Static analysis over test files
    fn lint_tests(&self) -> Result<()> {
        self.exec(
            Task::LintTests,
            "cargo",
            &["clippy", "--all-features", "--tests", "--", "-D", "warnings"],
            &[],
        )
    }

    fn remove_coverage_state(&self, task: Task) -> Result<()> {
        self.remove_dir(task, &self.root.join("coverage"))?;
        self.sweep_scratch_files(task)
    }

    /// Remove editor backups (`*~`) and stray coverage profiles
    /// (`*.profraw`) anywhere under the root
    fn sweep_scratch_files(&self, task: Task) -> Result<()> {
        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| entry.file_name().to_str() != Some(".git"));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Unreadable subtrees don't fail a best-effort sweep
                Err(_) => continue,
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.ends_with('~') || name.ends_with(".profraw") {
                self.remove_file(task, entry.path())?;
            }
        }
        Ok(())
    }

    fn remove_dir(&self, task: Task, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        if self.dry_run {
            println!(
                "{} {}",
                style("Would remove").cyan().bold(),
                path.display()
            );
            return Ok(());
        }
        fs::remove_dir_all(path)
            .map_err(|e| workflow::step_failed(task.name(), format!("rm -r {}", path.display()), e.to_string()))
    }

    fn remove_file(&self, task: Task, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        if self.dry_run {
            println!(
                "{} {}",
                style("Would remove").cyan().bold(),
                path.display()
            );
            return Ok(());
        }
        fs::remove_file(path)
            .map_err(|e| workflow::step_failed(task.name(), format!("rm {}", path.display()), e.to_string()))
    }

    fn exec(&self, task: Task, program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<()> {
        let rendered = format!("{program} {}", args.join(" "));
        if self.dry_run {
            println!("{} {rendered}", style("Would run").cyan().bold());
            return Ok(());
        }
        println!("{} {rendered}", style("Running").green().bold());
        let status = Command::new(program)
            .args(args)
            .envs(envs.iter().copied())
            .current_dir(&self.root)
            .status()
            .map_err(|e| workflow::spawn_failed(task.name(), &rendered, e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(workflow::step_failed(task.name(), &rendered, status.to_string()))
        }
    }
}
