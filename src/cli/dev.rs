use clap::{Parser, Subcommand};

/// Arguments for dev command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Run tests with coverage:\n    capgains dev test\n\n\
                  Reinstall from source (clean + uninstall first):\n    capgains dev install\n\n\
                  Show what install would do:\n    capgains dev --dry-run install")]
pub struct DevArgs {
    /// Print the planned commands without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub task: DevTask,
}

/// Development workflow tasks.
///
/// Each task runs external tools in sequence and stops at the first failing
/// step, propagating its exit status.
#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevTask {
    /// Erase coverage state, then run tests with coverage instrumentation
    Test,

    /// Delete build artifacts, backups, coverage data and scratch files
    /// (best-effort; missing files are fine)
    Clean,

    /// clean, uninstall, then install capgains from this source tree
    Install,

    /// Remove an installed capgains, tolerating its absence
    Uninstall,

    /// Static analysis over library and binary sources, warnings denied
    Lint,

    /// Static analysis over tests, warnings denied
    #[command(name = "lint-tests")]
    LintTests,
}
