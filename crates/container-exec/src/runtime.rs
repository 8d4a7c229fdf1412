//! Locating the container runtime on the host.

use crate::error::{ExecError, Result};
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_RUNTIME: &str = "singularity";
pub const RUNTIME_ENV: &str = "SIFRUN_CONTAINER_RUNTIME";

/// Resolved container runtime executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRuntime {
    path: PathBuf,
}

impl ContainerRuntime {
    /// Look the runtime up on `PATH`.
    ///
    /// The program name comes from `preferred` when given (the config `runtime`
    /// key), then from `SIFRUN_CONTAINER_RUNTIME`, then falls back to
    /// `singularity`. A name containing a path separator is checked in place.
    pub fn locate(preferred: Option<&str>) -> Result<Self> {
        let name = runtime_name(preferred);
        let path = which::which(&name)
            .map_err(|_| ExecError::EnvironmentResolution { runtime: name.clone() })?;
        debug!(runtime = %path.display(), "resolved container runtime");
        Ok(Self { path })
    }

    /// Look the runtime up on an explicit search path instead of `PATH`.
    pub fn locate_in(name: &str, search_path: impl AsRef<OsStr>, cwd: &Path) -> Result<Self> {
        let path = which::which_in(name, Some(search_path), cwd).map_err(|_| {
            ExecError::EnvironmentResolution {
                runtime: name.to_string(),
            }
        })?;
        Ok(Self { path })
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn program(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

fn runtime_name(preferred: Option<&str>) -> String {
    if let Some(name) = preferred.map(str::trim).filter(|name| !name.is_empty()) {
        return name.to_string();
    }
    match env::var(RUNTIME_ENV) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => DEFAULT_RUNTIME.to_string(),
    }
}
