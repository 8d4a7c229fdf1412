use crate::error::{ExecError, Result};
use crate::runscript::LaunchMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

const EXEC_CONFIG_SCHEMA: &str = include_str!("../schema/exec-config.v1.json");

/// JSON schema for one [`ExecConfig`] entry.
pub fn exec_config_schema() -> serde_json::Result<Value> {
    serde_json::from_str(EXEC_CONFIG_SCHEMA)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptMode {
    Run,
    Exec,
}

/// Application attributes for one container launch, usually one entry of a
/// YAML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecConfig {
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub exec_launcher: Option<String>,
    #[serde(default)]
    pub exec_path: Option<String>,
    #[serde(default)]
    pub exec_launcher_flags: Option<Vec<String>>,
    /// Container-side mount point for the working directory.
    #[serde(default)]
    pub bind: Option<String>,
    /// Runtime program name or path; see [`crate::ContainerRuntime::locate`].
    #[serde(default)]
    pub runtime: Option<String>,

    #[serde(default)]
    pub script: Option<PathBuf>,
    #[serde(default)]
    pub mode: Option<ScriptMode>,
    #[serde(default)]
    pub app_launch: Option<Vec<String>>,
    #[serde(default)]
    pub app_path: Option<Vec<String>>,
    #[serde(default)]
    pub app_args: Option<Vec<String>>,
}

impl ExecConfig {
    pub fn container(&self) -> Result<&str> {
        present(&self.container).ok_or(ExecError::MissingContainerConfiguration)
    }

    /// Executable path with surrounding whitespace removed.
    pub fn exec_path(&self) -> Result<&str> {
        present(&self.exec_path).ok_or(ExecError::MissingExecutableConfiguration {
            attribute: "exec_path",
        })
    }

    pub fn exec_launcher(&self) -> Result<&str> {
        present(&self.exec_launcher).ok_or(ExecError::MissingExecutableConfiguration {
            attribute: "exec_launcher",
        })
    }

    /// Checks required before an immediate launch.
    pub fn validate_for_launch(&self) -> Result<()> {
        self.container()?;
        self.exec_path()?;
        self.exec_launcher()?;
        Ok(())
    }

    /// Runscript mode: the explicit `mode` when set, otherwise inferred from
    /// which `app_*` groups are present.
    pub fn launch_mode(&self) -> LaunchMode {
        match self.mode {
            Some(ScriptMode::Run) => LaunchMode::DefaultEntryPoint,
            Some(ScriptMode::Exec) => LaunchMode::SpecificExecutable {
                launch_args: self.app_launch.clone(),
                path: self.app_path.clone(),
                args: self.app_args.clone(),
            },
            None => LaunchMode::infer(
                self.app_launch.clone(),
                self.app_path.clone(),
                self.app_args.clone(),
            ),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
