//! Dev workflow command wrapper
//!
//! Maps the CLI task to the workflow runner; all sequencing and failure
//! semantics live in [`crate::workflow`].

use crate::cli::{DevArgs, DevTask};
use crate::error::Result;
use crate::workflow::{Runner, Task};

/// Run dev command
pub fn run(args: DevArgs) -> Result<()> {
    let root = std::env::current_dir()?;
    let runner = Runner::new(root, args.dry_run);
    let task = match args.task {
        DevTask::Test => Task::Test,
        DevTask::Clean => Task::Clean,
        DevTask::Install => Task::Install,
        DevTask::Uninstall => Task::Uninstall,
        DevTask::Lint => Task::Lint,
        DevTask::LintTests => Task::LintTests,
    };
    runner.run(task)
}
