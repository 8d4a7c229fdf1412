use anyhow::Result;
use clap::{Parser, Subcommand};
use container_exec::ExecError;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "sifctl", version, about = "Launch applications inside container images")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch an application entry now and wait for it to finish
    Run {
        /// YAML file holding application entries
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        /// Entry to launch
        #[arg(long)]
        app: String,
        /// Directory the container runs in; bound into the container
        #[arg(long, value_name = "DIR")]
        workdir: PathBuf,
        /// Task count passed to the launcher with -n
        #[arg(long)]
        ntasks: String,
        /// Stdout log (default: <workdir>/out.log)
        #[arg(long, value_name = "FILE")]
        stdout: Option<PathBuf>,
        /// Stderr log (default: <workdir>/err.log)
        #[arg(long, value_name = "FILE")]
        stderr: Option<PathBuf>,
        /// Arguments handed to the application
        #[arg(last = true)]
        app_args: Vec<String>,
    },
    /// Write a runscript for an application entry instead of launching it
    Runscript {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        #[arg(long)]
        app: String,
        #[arg(long, value_name = "DIR")]
        workdir: PathBuf,
        /// Overrides the entry's `script` attribute
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,
    },
    /// Print the path of an executable inside a container image
    Probe {
        #[arg(long)]
        container: String,
        /// Executable to look up
        name: String,
        /// Runtime program name or path
        #[arg(long)]
        runtime: Option<String>,
    },
    /// Print the resolved container runtime
    Runtime {
        #[arg(long)]
        runtime: Option<String>,
    },
    /// Check an application entry against the configuration schema
    Validate {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        /// Entry to check; every entry when omitted
        #[arg(long)]
        app: Option<String>,
    },
    /// Print version and exit
    Version,
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.cmd {
        Commands::Run {
            config,
            app,
            workdir,
            ntasks,
            stdout,
            stderr,
            app_args,
        } => commands::run(commands::RunArgs {
            config,
            app,
            workdir,
            ntasks,
            stdout,
            stderr,
            app_args,
        }),
        Commands::Runscript {
            config,
            app,
            workdir,
            script,
        } => commands::runscript(&config, &app, &workdir, script),
        Commands::Probe {
            container,
            name,
            runtime,
        } => commands::probe(&container, &name, runtime.as_deref()),
        Commands::Runtime { runtime } => commands::runtime(runtime.as_deref()),
        Commands::Validate { config, app } => commands::validate(&config, app.as_deref()),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {:#}", e);
        if let Some(log) = e.downcast_ref::<ExecError>().and_then(ExecError::log_path) {
            eprintln!("See log: {}", log.display());
        }
        std::process::exit(1);
    }
    Ok(())
}
