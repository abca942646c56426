//! Dev workflow errors

use super::CapgainsError;

pub fn step_failed(
    task: impl Into<String>,
    command: impl Into<String>,
    status: impl Into<String>,
) -> CapgainsError {
    CapgainsError::WorkflowStepFailed {
        task: task.into(),
        command: command.into(),
        status: status.into(),
    }
}

pub fn spawn_failed(
    task: impl Into<String>,
    command: impl Into<String>,
    reason: impl Into<String>,
) -> CapgainsError {
    CapgainsError::WorkflowSpawnFailed {
        task: task.into(),
        command: command.into(),
        reason: reason.into(),
    }
}
