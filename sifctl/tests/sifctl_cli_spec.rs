#![cfg(unix)]

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAKE_RUNTIME: &str = r#"#!/bin/sh
case "$1" in
  run)
    [ "$4" = absent ] && exit 1
    echo "/usr/local/bin/$4"
    ;;
  exec)
    shift
    printf '%s\n' "$@"
    for arg in "$@"; do
      [ "$arg" = /usr/bin/fail ] && { echo "model crashed" >&2; exit 9; }
    done
    exit 0
    ;;
esac
"#;

fn setup() -> Result<(TempDir, PathBuf)> {
    let temp = TempDir::new()?;
    let runtime = temp.path().join("fake-singularity");
    fs::write(&runtime, FAKE_RUNTIME)?;
    fs::set_permissions(&runtime, fs::Permissions::from_mode(0o755))?;

    let config = temp.path().join("apps.yaml");
    fs::write(
        &config,
        format!(
            r#"model:
  container: app.sif
  exec_launcher: mpirun
  exec_path: /usr/bin/model
  bind: /work
  runtime: {runtime}
broken:
  container: app.sif
  exec_launcher: mpirun
  exec_path: /usr/bin/fail
  runtime: {runtime}
lolcow:
  container: lolcow.sif
  runtime: {runtime}
nocontainer:
  exec_launcher: mpirun
  exec_path: /usr/bin/model
  runtime: {runtime}
"#,
            runtime = runtime.display()
        ),
    )?;
    Ok((temp, config))
}

fn sifctl() -> Command {
    Command::cargo_bin("sifctl").unwrap()
}

fn workdir(temp: &TempDir) -> &Path {
    temp.path()
}

#[test]
fn run_launches_entry_and_reports_logs() -> Result<()> {
    let (temp, config) = setup()?;

    sifctl()
        .args(["run", "--app", "model", "--ntasks", "4"])
        .arg("--config")
        .arg(&config)
        .arg("--workdir")
        .arg(workdir(&temp))
        .args(["--", "--days", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("out.log"));

    let argv = fs::read_to_string(temp.path().join("out.log"))?;
    let expected = format!(
        "app.sif\n--bind\n{}:/work\n/usr/local/bin/mpirun\n-n\n4\n/usr/bin/model\n--days\n2\n",
        temp.path().display()
    );
    assert_eq!(argv, expected);
    Ok(())
}

#[test]
fn run_failure_points_at_stderr_log() -> Result<()> {
    let (temp, config) = setup()?;

    sifctl()
        .args(["run", "--app", "broken", "--ntasks", "1"])
        .arg("--config")
        .arg(&config)
        .arg("--workdir")
        .arg(workdir(&temp))
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!(
            "See log: {}",
            temp.path().join("err.log").display()
        )));

    assert_eq!(
        fs::read_to_string(temp.path().join("err.log"))?,
        "model crashed\n"
    );
    Ok(())
}

#[test]
fn run_rejects_entry_without_container() -> Result<()> {
    let (temp, config) = setup()?;

    sifctl()
        .args(["run", "--app", "nocontainer", "--ntasks", "1"])
        .arg("--config")
        .arg(&config)
        .arg("--workdir")
        .arg(workdir(&temp))
        .assert()
        .failure()
        .stderr(predicate::str::contains("'container'"));
    Ok(())
}

#[test]
fn run_rejects_non_numeric_task_count() -> Result<()> {
    let (temp, config) = setup()?;

    sifctl()
        .args(["run", "--app", "model", "--ntasks", "lots"])
        .arg("--config")
        .arg(&config)
        .arg("--workdir")
        .arg(workdir(&temp))
        .assert()
        .failure()
        .stderr(predicate::str::contains("lots"));

    assert!(!temp.path().join("out.log").exists());
    Ok(())
}

#[test]
fn runscript_writes_default_entry_point_script() -> Result<()> {
    let (temp, config) = setup()?;
    let script = temp.path().join("lolcow.sh");

    sifctl()
        .args(["runscript", "--app", "lolcow"])
        .arg("--config")
        .arg(&config)
        .arg("--workdir")
        .arg(workdir(&temp))
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("lolcow.sh"));

    let contents = fs::read_to_string(&script)?;
    assert!(contents.starts_with("#!/bin/sh\n"));
    assert!(contents.contains(" run lolcow.sif\n"));
    Ok(())
}

#[test]
fn runscript_without_script_path_fails() -> Result<()> {
    let (temp, config) = setup()?;

    sifctl()
        .args(["runscript", "--app", "lolcow"])
        .arg("--config")
        .arg(&config)
        .arg("--workdir")
        .arg(workdir(&temp))
        .assert()
        .failure()
        .stderr(predicate::str::contains("'script'"));
    Ok(())
}

#[test]
fn probe_prints_in_container_path() -> Result<()> {
    let (temp, _config) = setup()?;
    let runtime = temp.path().join("fake-singularity");

    sifctl()
        .args(["probe", "--container", "app.sif", "model"])
        .arg("--runtime")
        .arg(&runtime)
        .assert()
        .success()
        .stdout("/usr/local/bin/model\n");

    sifctl()
        .args(["probe", "--container", "app.sif", "absent"])
        .arg("--runtime")
        .arg(&runtime)
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent"));
    Ok(())
}

#[test]
fn runtime_reports_missing_program() {
    sifctl()
        .args(["runtime", "--runtime", "no-such-runtime-51ab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-runtime-51ab"));
}

#[test]
fn validate_checks_every_entry() -> Result<()> {
    let (_temp, config) = setup()?;

    sifctl()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("model: ok"))
        .stdout(predicate::str::contains("lolcow: ok"));
    Ok(())
}

#[test]
fn validate_reports_unknown_keys() -> Result<()> {
    let temp = TempDir::new()?;
    let config = temp.path().join("apps.yaml");
    fs::write(&config, "model:\n  container: app.sif\n  exec_pth: /usr/bin/model\n")?;

    sifctl()
        .args(["validate", "--app", "model"])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("exec_pth"));
    Ok(())
}
