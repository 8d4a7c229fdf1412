//! Deferred execution: write a container invocation to a shell script that a
//! scheduler can submit later.

use crate::command::shell_join;
use crate::error::{ExecError, Result};
use crate::logger::SharedLogger;
use crate::runtime::ContainerRuntime;
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SCRIPT_SHEBANG: &str = "#!/bin/sh";
const TIMESTAMP_FORMAT: &str = "%H:%M:%S %A %B %d, %Y";

/// What the runscript asks the container to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    /// `run`: the image's own entry point, no extra tokens.
    DefaultEntryPoint,
    /// `exec`: a specific executable. Absent groups are left out of the command line.
    SpecificExecutable {
        launch_args: Option<Vec<String>>,
        path: Option<Vec<String>>,
        args: Option<Vec<String>>,
    },
}

impl LaunchMode {
    /// Legacy rule for callers without an explicit choice: `run` only when
    /// none of the three groups was supplied.
    pub fn infer(
        launch_args: Option<Vec<String>>,
        path: Option<Vec<String>>,
        args: Option<Vec<String>>,
    ) -> Self {
        if launch_args.is_none() && path.is_none() && args.is_none() {
            LaunchMode::DefaultEntryPoint
        } else {
            LaunchMode::SpecificExecutable {
                launch_args,
                path,
                args,
            }
        }
    }

    pub fn subcommand(&self) -> &'static str {
        match self {
            LaunchMode::DefaultEntryPoint => "run",
            LaunchMode::SpecificExecutable { .. } => "exec",
        }
    }
}

pub struct RunscriptWriter {
    runtime: ContainerRuntime,
    logger: SharedLogger,
}

impl RunscriptWriter {
    pub fn new(runtime: ContainerRuntime, logger: SharedLogger) -> Self {
        Self { runtime, logger }
    }

    /// Command line the script will carry, without the surrounding preamble.
    pub fn command_line(&self, container: &str, mode: &LaunchMode) -> String {
        let mut tokens = vec![
            self.runtime.program(),
            mode.subcommand().to_string(),
            container.to_string(),
        ];

        if let LaunchMode::SpecificExecutable {
            launch_args,
            path,
            args,
        } = mode
        {
            for (attribute, group) in [
                ("app_launch", launch_args),
                ("app_path", path),
                ("app_args", args),
            ] {
                match group {
                    Some(values) => tokens.extend(values.iter().cloned()),
                    None => self.logger.warn(&format!(
                        "The attribute {} has not been provided and will not be included.",
                        attribute
                    )),
                }
            }
        }

        shell_join(&tokens)
    }

    /// Create or overwrite `script` with the invocation for `container`.
    pub fn write(
        &self,
        container: &str,
        script: &Path,
        workdir: &Path,
        mode: &LaunchMode,
    ) -> Result<PathBuf> {
        let command_line = self.command_line(container, mode);
        self.logger.info(&format!(
            "Writing container application instructions to {}.",
            script.display()
        ));

        let to_error = |source| ExecError::ScriptWrite {
            path: script.to_path_buf(),
            source,
        };

        let file = File::create(script).map_err(to_error)?;
        let mut out = BufWriter::new(file);
        writeln!(out, "{}", SCRIPT_SHEBANG).map_err(to_error)?;
        writeln!(out, "set -x -e").map_err(to_error)?;
        writeln!(out, "cd {}", shell_join(&[workdir.to_string_lossy()])).map_err(to_error)?;
        writeln!(out, "{}", command_line).map_err(to_error)?;
        writeln!(out, "# Created: {}", Local::now().format(TIMESTAMP_FORMAT)).map_err(to_error)?;
        out.flush().map_err(to_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(script, std::fs::Permissions::from_mode(0o755))
                .map_err(to_error)?;
        }

        Ok(script.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::testing::RecordingLogger;
    use crate::logger::NullLogger;
    use std::fs;
    use std::sync::Arc;

    fn writer() -> RunscriptWriter {
        RunscriptWriter::new(
            ContainerRuntime::from_path("/opt/singularity/bin/singularity"),
            Arc::new(NullLogger),
        )
    }

    fn strings(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn infer_selects_run_only_when_everything_is_absent() {
        assert_eq!(LaunchMode::infer(None, None, None), LaunchMode::DefaultEntryPoint);
        assert_eq!(
            LaunchMode::infer(None, strings(&["/bin/model"]), None).subcommand(),
            "exec"
        );
    }

    #[test]
    fn default_entry_point_script_uses_run_without_extra_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("launch.sh");

        writer()
            .write("lolcow.sif", &script, dir.path(), &LaunchMode::DefaultEntryPoint)
            .unwrap();

        let contents = fs::read_to_string(&script).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "#!/bin/sh");
        assert_eq!(lines[1], "set -x -e");
        assert_eq!(lines[2], format!("cd {}", dir.path().display()));
        assert_eq!(lines[3], "/opt/singularity/bin/singularity run lolcow.sif");
        assert!(lines[4].starts_with("# Created: "));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn specific_executable_script_uses_exec_in_order() {
        let mode = LaunchMode::SpecificExecutable {
            launch_args: strings(&["mpirun", "-n", "2"]),
            path: strings(&["/usr/bin/model"]),
            args: strings(&["--config", "model nml"]),
        };
        assert_eq!(
            writer().command_line("app.sif", &mode),
            "/opt/singularity/bin/singularity exec app.sif mpirun -n 2 /usr/bin/model \
             --config 'model nml'"
        );
    }

    #[test]
    fn absent_groups_are_warned_and_omitted() {
        let logger = Arc::new(RecordingLogger::default());
        let writer = RunscriptWriter::new(
            ContainerRuntime::from_path("singularity"),
            logger.clone(),
        );
        let mode = LaunchMode::SpecificExecutable {
            launch_args: None,
            path: strings(&["/usr/bin/model"]),
            args: None,
        };

        let line = writer.command_line("app.sif", &mode);
        assert_eq!(line, "singularity exec app.sif /usr/bin/model");

        let warnings = logger.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("app_launch"));
        assert!(warnings[1].contains("app_args"));
    }

    #[test]
    fn rewriting_only_changes_the_timestamp_line() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("launch.sh");
        let mode = LaunchMode::SpecificExecutable {
            launch_args: strings(&["srun"]),
            path: strings(&["/usr/bin/model"]),
            args: None,
        };

        writer().write("app.sif", &script, dir.path(), &mode).unwrap();
        let first = fs::read_to_string(&script).unwrap();
        writer().write("app.sif", &script, dir.path(), &mode).unwrap();
        let second = fs::read_to_string(&script).unwrap();

        let strip = |text: &str| {
            text.lines()
                .filter(|line| !line.starts_with("# Created: "))
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn write_logs_the_target_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("launch.sh");
        let logger = Arc::new(RecordingLogger::default());
        let writer = RunscriptWriter::new(ContainerRuntime::from_path("singularity"), logger.clone());

        writer
            .write("app.sif", &script, dir.path(), &LaunchMode::DefaultEntryPoint)
            .unwrap();

        let infos = logger.infos();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].contains(&script.display().to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn written_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("launch.sh");
        writer()
            .write("app.sif", &script, dir.path(), &LaunchMode::DefaultEntryPoint)
            .unwrap();

        let mode = fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn unwritable_target_reports_script_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("missing").join("launch.sh");

        let err = writer()
            .write("app.sif", &script, dir.path(), &LaunchMode::DefaultEntryPoint)
            .unwrap_err();
        match err {
            ExecError::ScriptWrite { path, .. } => assert_eq!(path, script),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
