use std::process::Output;
use std::time::Duration;
use thiserror::Error;

/// Failure of a runtime operation (list, create, start, kill, build, inspect).
///
/// Services never retry or recover these; they are wrapped in
/// [`Error::Runtime`](crate::Error::Runtime) and returned to the caller.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("'{command}' did not finish within {} seconds", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("'{command}' failed{}: {stderr}", .exit_code.map(|c| format!(" (exit code {})", c)).unwrap_or_default())]
    CommandFailed {
        command: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("could not execute '{command}'")]
    ExecFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no such container: {container}")]
    ContainerNotFound { container: String },

    /// The engine already has a container (running or not) with this name.
    #[error("container name '{name}' is already in use")]
    NameConflict { name: String },

    #[error("Docker daemon is not responding")]
    DaemonUnavailable,

    #[error("unexpected output from '{command}': {reason}")]
    InvalidResponse { command: String, reason: String },

    #[error("no image given for container '{container}'")]
    MissingImage { container: String },
}

impl RuntimeError {
    /// A command that ran and exited non-zero, with its trimmed stderr.
    pub fn from_output(command: impl Into<String>, output: &Output) -> Self {
        RuntimeError::CommandFailed {
            command: command.into(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
        }
    }

    pub fn invalid_response(command: impl Into<String>, reason: impl Into<String>) -> Self {
        RuntimeError::InvalidResponse {
            command: command.into(),
            reason: reason.into(),
        }
    }
}
