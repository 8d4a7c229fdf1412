use crate::error::{ExecError, Result};
use crate::runtime::ContainerRuntime;
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// One launch of an executable inside a container.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub workdir: PathBuf,
    pub container: String,
    pub launcher: String,
    /// Raw task count as supplied by the caller; coerced when the command is built.
    pub ntasks: String,
    pub launcher_flags: Option<Vec<String>>,
    pub executable: String,
    pub app_args: Option<Vec<String>>,
    /// Container-side mount point for `workdir`. Defaults to the host path.
    pub bind_target: Option<String>,
}

impl RunRequest {
    /// `<host>:<container>` argument for `--bind`.
    pub fn bind_spec(&self) -> String {
        let host = self.workdir.to_string_lossy();
        let target = self
            .bind_target
            .as_deref()
            .filter(|target| !target.is_empty())
            .unwrap_or(&host);
        format!("{}:{}", host, target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCount(NonZeroU32);

impl TaskCount {
    pub fn parse(raw: &str) -> Result<Self> {
        raw.trim()
            .parse::<NonZeroU32>()
            .map(Self)
            .map_err(|_| ExecError::InvalidTaskCount {
                value: raw.to_string(),
            })
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for TaskCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully resolved process invocation; `as_slice()[0]` is the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVector(Vec<String>);

impl CommandVector {
    pub(crate) fn new(parts: Vec<String>) -> Self {
        debug_assert!(!parts.is_empty());
        Self(parts)
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Shell-ready rendering; tokens are quoted only when they need it.
    pub fn command_line(&self) -> String {
        shell_join(&self.0)
    }
}

impl fmt::Display for CommandVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Assemble `<runtime> exec <container> --bind <host>:<target> <launcher> -n <n>
/// [flags...] <executable> [args...]`.
pub fn build_exec_command(runtime: &ContainerRuntime, request: &RunRequest) -> Result<CommandVector> {
    if request.container.trim().is_empty() {
        return Err(ExecError::MissingContainerConfiguration);
    }
    if request.executable.trim().is_empty() {
        return Err(ExecError::MissingExecutableConfiguration {
            attribute: "exec_path",
        });
    }
    if request.launcher.trim().is_empty() {
        return Err(ExecError::MissingExecutableConfiguration {
            attribute: "exec_launcher",
        });
    }
    let ntasks = TaskCount::parse(&request.ntasks)?;

    let mut parts = vec![
        runtime.program(),
        "exec".to_string(),
        request.container.clone(),
        "--bind".to_string(),
        request.bind_spec(),
        request.launcher.clone(),
        "-n".to_string(),
        ntasks.to_string(),
    ];
    if let Some(flags) = &request.launcher_flags {
        parts.extend(flags.iter().cloned());
    }
    parts.push(request.executable.clone());
    if let Some(args) = &request.app_args {
        parts.extend(args.iter().cloned());
    }

    Ok(CommandVector::new(parts))
}

pub(crate) fn shell_escape(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

pub(crate) fn shell_join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| shell_escape(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
