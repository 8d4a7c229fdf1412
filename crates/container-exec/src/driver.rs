use crate::command::{build_exec_command, RunRequest, TaskCount};
use crate::config::ExecConfig;
use crate::error::{ExecError, Result};
use crate::launcher::{ExecutionResult, LogPaths, ProcessLauncher};
use crate::logger::{tracing_logger, SharedLogger};
use crate::probe::probe_executable;
use crate::runscript::RunscriptWriter;
use crate::runtime::ContainerRuntime;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Progress of a single driver invocation. There is no edge out of `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Unresolved,
    RuntimeResolved,
    CommandBuilt,
    Launched,
    Succeeded,
    Failed,
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LaunchState::Unresolved => "UNRESOLVED",
            LaunchState::RuntimeResolved => "RUNTIME_RESOLVED",
            LaunchState::CommandBuilt => "COMMAND_BUILT",
            LaunchState::Launched => "LAUNCHED",
            LaunchState::Succeeded => "SUCCEEDED",
            LaunchState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Entry point for schedulers: one call per container launch.
pub struct Driver {
    logger: SharedLogger,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(tracing_logger())
    }
}

impl Driver {
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }

    /// Launch `config.exec_path` inside `config.container` and wait for it.
    ///
    /// The launcher named by `exec_launcher` is looked up inside the image
    /// first and invoked by its in-container path.
    pub fn run(
        &self,
        workdir: &Path,
        config: &ExecConfig,
        ntasks: &str,
        app_args: Option<Vec<String>>,
        logs: &LogPaths,
    ) -> Result<ExecutionResult> {
        let mut state = LaunchState::Unresolved;
        let outcome = self.run_inner(&mut state, workdir, config, ntasks, app_args, logs);
        let terminal = if outcome.is_ok() {
            LaunchState::Succeeded
        } else {
            LaunchState::Failed
        };
        debug!(from = %state, to = %terminal, "launch finished");
        outcome
    }

    fn run_inner(
        &self,
        state: &mut LaunchState,
        workdir: &Path,
        config: &ExecConfig,
        ntasks: &str,
        app_args: Option<Vec<String>>,
        logs: &LogPaths,
    ) -> Result<ExecutionResult> {
        config.validate_for_launch()?;
        let container = config.container()?;
        let executable = config.exec_path()?;
        // Reject before the probe starts a container instance.
        TaskCount::parse(ntasks)?;

        let runtime = ContainerRuntime::locate(config.runtime.as_deref())?;
        transition(state, LaunchState::RuntimeResolved);

        let launcher = probe_executable(&runtime, container, config.exec_launcher()?)?;

        let request = RunRequest {
            workdir: workdir.to_path_buf(),
            container: container.to_string(),
            launcher,
            ntasks: ntasks.to_string(),
            launcher_flags: config.exec_launcher_flags.clone(),
            executable: executable.to_string(),
            app_args,
            bind_target: config.bind.clone(),
        };
        let command = build_exec_command(&runtime, &request)?;
        transition(state, LaunchState::CommandBuilt);
        debug!(command = %command, "assembled container command");

        transition(state, LaunchState::Launched);
        ProcessLauncher::new(self.logger.clone()).launch(&command, workdir, logs)
    }

    /// Write the deferred runscript named by `config.script`.
    pub fn write_runscript(&self, workdir: &Path, config: &ExecConfig) -> Result<PathBuf> {
        let container = config.container()?;
        let script = config
            .script
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(ExecError::MissingScriptConfiguration)?;

        let runtime = ContainerRuntime::locate(config.runtime.as_deref())?;
        RunscriptWriter::new(runtime, self.logger.clone()).write(
            container,
            script,
            workdir,
            &config.launch_mode(),
        )
    }
}

fn transition(state: &mut LaunchState, next: LaunchState) {
    debug!(from = %state, to = %next, "launch state");
    *state = next;
}
