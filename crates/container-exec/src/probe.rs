use crate::error::{ExecError, Result};
use crate::runtime::ContainerRuntime;
use std::process::{Command, Stdio};
use tracing::debug;

/// Resolve `name` inside `container` by running `which` in a throwaway instance.
///
/// An empty answer means the binary is absent or the image did not start;
/// both are reported as [`ExecError::ExecutableNotFound`].
pub fn probe_executable(runtime: &ContainerRuntime, container: &str, name: &str) -> Result<String> {
    let output = Command::new(runtime.path())
        .arg("run")
        .arg(container)
        .arg("which")
        .arg(name)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| ExecError::RuntimeSpawn {
            runtime: runtime.program(),
            source: err,
        })?;

    let resolved = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if resolved.is_empty() {
        debug!(
            container,
            name,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "probe returned no path"
        );
        return Err(ExecError::ExecutableNotFound {
            name: name.to_string(),
            container: container.to_string(),
        });
    }

    debug!(container, name, path = %resolved, "probe resolved executable");
    Ok(resolved)
}
