use crate::command::CommandVector;
use crate::error::{ExecError, Result};
use crate::logger::SharedLogger;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;
use tracing::debug;

pub const DEFAULT_STDOUT_LOG: &str = "out.log";
pub const DEFAULT_STDERR_LOG: &str = "err.log";

/// Caller overrides for the captured output streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPaths {
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
}

impl LogPaths {
    pub fn resolve(&self, workdir: &Path) -> (PathBuf, PathBuf) {
        (
            self.stdout
                .clone()
                .unwrap_or_else(|| workdir.join(DEFAULT_STDOUT_LOG)),
            self.stderr
                .clone()
                .unwrap_or_else(|| workdir.join(DEFAULT_STDERR_LOG)),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
    pub duration_ms: f64,
}

pub struct ProcessLauncher {
    logger: SharedLogger,
}

impl ProcessLauncher {
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }

    /// Run `command` in `workdir` to completion with stdout/stderr captured to files.
    ///
    /// Both log files are truncated on open and released before this returns,
    /// whether the process succeeded or not. One call is one attempt.
    pub fn launch(
        &self,
        command: &CommandVector,
        workdir: &Path,
        logs: &LogPaths,
    ) -> Result<ExecutionResult> {
        let (stdout_log, stderr_log) = logs.resolve(workdir);

        self.logger.warn(&format!(
            "The standard error will be written to {}.",
            stderr_log.display()
        ));
        self.logger.warn(&format!(
            "The standard output will be written to {}.",
            stdout_log.display()
        ));
        debug!(command = %command, workdir = %workdir.display(), "launching container process");

        let start = Instant::now();
        let status = run_to_completion(command, workdir, &stdout_log, &stderr_log)?;
        let duration = start.elapsed();

        match status.code() {
            Some(0) => Ok(ExecutionResult {
                exit_code: 0,
                stdout_log,
                stderr_log,
                duration_ms: duration.as_secs_f64() * 1000.0,
            }),
            _ => Err(ExecError::ContainerLaunch {
                errlog: stderr_log,
                status: status.to_string(),
            }),
        }
    }
}

// Every handle opened here is owned by this frame and dropped on return.
fn run_to_completion(
    command: &CommandVector,
    workdir: &Path,
    stdout_log: &Path,
    stderr_log: &Path,
) -> Result<ExitStatus> {
    let stdout = open_log(stdout_log)?;
    let stderr = open_log(stderr_log)?;

    let mut process = Command::new(command.program());
    process
        .args(command.args())
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));

    process.status().map_err(|err| ExecError::RuntimeSpawn {
        runtime: command.program().to_string(),
        source: err,
    })
}

fn open_log(path: &Path) -> Result<File> {
    File::create(path).map_err(|err| ExecError::LogFile {
        path: path.to_path_buf(),
        source: err,
    })
}
