use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(
        "The container runtime '{runtime}' could not be found on the search path; \
         install it or update PATH"
    )]
    EnvironmentResolution { runtime: String },

    #[error("Executable '{name}' could not be found inside container {container}")]
    ExecutableNotFound { name: String, container: String },

    #[error("The mandatory configuration attribute 'container' was not provided")]
    MissingContainerConfiguration,

    #[error("The mandatory configuration attribute '{attribute}' was not provided")]
    MissingExecutableConfiguration { attribute: &'static str },

    #[error("The mandatory configuration attribute 'script' was not provided")]
    MissingScriptConfiguration,

    #[error("Task count '{value}' is not a positive integer")]
    InvalidTaskCount { value: String },

    #[error("Failed to write runscript {path}: {source}")]
    ScriptWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to spawn container runtime {runtime}: {source}")]
    RuntimeSpawn {
        runtime: String,
        source: std::io::Error,
    },

    #[error("Container application failed ({status}); refer to {errlog} for more information")]
    ContainerLaunch { errlog: PathBuf, status: String },
}

impl ExecError {
    pub fn code(&self) -> &'static str {
        match self {
            ExecError::EnvironmentResolution { .. } => "CONTAINER_EXEC_RUNTIME_NOT_FOUND",
            ExecError::ExecutableNotFound { .. } => "CONTAINER_EXEC_EXECUTABLE_NOT_FOUND",
            ExecError::MissingContainerConfiguration => "CONTAINER_EXEC_MISSING_CONTAINER",
            ExecError::MissingExecutableConfiguration { .. } => {
                "CONTAINER_EXEC_MISSING_EXECUTABLE"
            }
            ExecError::MissingScriptConfiguration => "CONTAINER_EXEC_MISSING_SCRIPT",
            ExecError::InvalidTaskCount { .. } => "CONTAINER_EXEC_INVALID_TASK_COUNT",
            ExecError::ScriptWrite { .. } => "CONTAINER_EXEC_SCRIPT_WRITE_ERROR",
            ExecError::LogFile { .. } => "CONTAINER_EXEC_LOG_FILE_ERROR",
            ExecError::RuntimeSpawn { .. } => "CONTAINER_EXEC_RUNTIME_ERROR",
            ExecError::ContainerLaunch { .. } => "CONTAINER_EXEC_LAUNCH_FAILED",
        }
    }

    /// Log file an operator should inspect, when the failure produced one.
    pub fn log_path(&self) -> Option<&PathBuf> {
        match self {
            ExecError::ContainerLaunch { errlog, .. } => Some(errlog),
            ExecError::LogFile { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type Result<T, E = ExecError> = std::result::Result<T, E>;
