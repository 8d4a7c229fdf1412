use anyhow::{Context, Result};
use config_loader::ConfigManager;
use container_exec::{
    exec_config_schema, probe_executable, ContainerRuntime, Driver, ExecConfig, LogPaths,
};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct RunArgs {
    pub config: PathBuf,
    pub app: String,
    pub workdir: PathBuf,
    pub ntasks: String,
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
    pub app_args: Vec<String>,
}

fn manager() -> Result<ConfigManager> {
    let schema = exec_config_schema().context("Failed to parse bundled exec config schema")?;
    Ok(ConfigManager::new(schema))
}

fn load_entry(config: &Path, app: &str) -> Result<ExecConfig> {
    manager()?
        .load_entry(config, app)
        .with_context(|| format!("Failed to load application '{}' from {}", app, config.display()))
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    Ok(std::env::current_dir()
        .context("Failed to determine current directory")?
        .join(dir))
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = load_entry(&args.config, &args.app)?;
    let workdir = absolute(&args.workdir)?;
    let logs = LogPaths {
        stdout: args.stdout,
        stderr: args.stderr,
    };
    let app_args = (!args.app_args.is_empty()).then_some(args.app_args);

    let result = Driver::default()
        .run(&workdir, &config, &args.ntasks, app_args, &logs)
        .with_context(|| format!("Application '{}' did not complete", args.app))?;

    info!(
        app = %args.app,
        duration_ms = result.duration_ms,
        "container application finished"
    );
    println!("stdout: {}", result.stdout_log.display());
    println!("stderr: {}", result.stderr_log.display());
    Ok(())
}

pub fn runscript(config: &Path, app: &str, workdir: &Path, script: Option<PathBuf>) -> Result<()> {
    let mut entry = load_entry(config, app)?;
    if script.is_some() {
        entry.script = script;
    }
    let workdir = absolute(workdir)?;

    let written = Driver::default()
        .write_runscript(&workdir, &entry)
        .with_context(|| format!("Failed to write runscript for '{}'", app))?;
    println!("{}", written.display());
    Ok(())
}

pub fn probe(container: &str, name: &str, runtime: Option<&str>) -> Result<()> {
    let runtime = ContainerRuntime::locate(runtime)?;
    let path = probe_executable(&runtime, container, name)?;
    println!("{}", path);
    Ok(())
}

pub fn runtime(runtime: Option<&str>) -> Result<()> {
    let runtime = ContainerRuntime::locate(runtime)?;
    println!("{}", runtime.path().display());
    Ok(())
}

pub fn validate(config: &Path, app: Option<&str>) -> Result<()> {
    let manager = manager()?;
    let names = match app {
        Some(app) => vec![app.to_string()],
        None => manager.entry_names(config)?,
    };

    for name in &names {
        manager
            .validate_entry(config, name)
            .with_context(|| format!("Application '{}' is invalid", name))?;
        println!("{}: ok", name);
    }
    Ok(())
}
