//! Launch executables inside Singularity-class container images on behalf of
//! a batch scheduler.
//!
//! The [`Driver`] resolves the runtime, probes the launcher inside the image,
//! assembles an `exec` command and supervises it with stdout/stderr captured
//! to files. [`RunscriptWriter`] is the deferred alternative that writes the
//! invocation to a shell script instead.

mod command;
mod config;
mod driver;
mod error;
mod launcher;
mod logger;
mod probe;
mod runscript;
mod runtime;

pub use command::{build_exec_command, CommandVector, RunRequest, TaskCount};
pub use config::{exec_config_schema, ExecConfig, ScriptMode};
pub use driver::{Driver, LaunchState};
pub use error::{ExecError, Result};
pub use launcher::{
    ExecutionResult, LogPaths, ProcessLauncher, DEFAULT_STDERR_LOG, DEFAULT_STDOUT_LOG,
};
pub use logger::{tracing_logger, LaunchLogger, NullLogger, SharedLogger, TracingLogger};
pub use probe::probe_executable;
pub use runscript::{LaunchMode, RunscriptWriter, SCRIPT_SHEBANG};
pub use runtime::{ContainerRuntime, DEFAULT_RUNTIME, RUNTIME_ENV};
