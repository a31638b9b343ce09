//! Penguin Bridge CLI - one-shot probes and diagnostics
//!
//! `if-addr` and `file-exists` are the probes task commands usually call;
//! the remaining commands talk to Moonraker using the daemon's config file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

use penguin_bridge_core::application::constants::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, SENTINEL_VALUE,
};
use penguin_bridge_core::application::{PassReport, TaskRunner};
use penguin_bridge_core::domain::{BridgeConfig, Snapshot, ValueKind};
use penguin_bridge_core::port::{RemoteState, SystemTimeProvider};
use penguin_bridge_infra_moonraker::MoonrakerClient;
use penguin_bridge_infra_system::{
    file_exists, format_exists, format_ipv4, interface_ipv4, ShellExecutor,
    DEFAULT_WIFI_CONFIG_PATH,
};

#[derive(Parser)]
#[command(name = "penguin-bridge-cli")]
#[command(about = "Klipper Penguin Bridge diagnostics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bridge configuration file
    #[arg(long, global = true, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the IPv4 address of a network interface, or `none`
    IfAddr {
        /// Interface name (e.g. wlan0)
        ifname: Option<String>,
    },

    /// Print `True` if the path exists, `False` otherwise
    FileExists {
        #[arg(default_value = DEFAULT_WIFI_CONFIG_PATH)]
        path: String,
    },

    /// Validate the configuration file and list its tasks
    CheckConfig,

    /// Show the current macro variables on the printer
    Snapshot,

    /// Write one macro variable
    Set {
        variable: String,
        value: String,

        /// Send the value as a number instead of a string
        #[arg(long)]
        number: bool,
    },

    /// Run a single pass and print what it did
    RunOnce,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    index: usize,
    variable: String,
    kind: String,
    timeout: String,
    command: String,
}

#[derive(Tabled)]
struct VariableRow {
    variable: String,
    value: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    variable: String,
    value: String,
    outcome: String,
}

fn init_logging() {
    // stdout is reserved for command output
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: &str) -> Result<BridgeConfig> {
    let path = PathBuf::from(shellexpand::tilde(path).into_owned());
    BridgeConfig::load(&path)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

fn task_rows(config: &BridgeConfig) -> Vec<TaskRow> {
    config
        .tasks()
        .iter()
        .enumerate()
        .map(|(index, task)| TaskRow {
            index,
            variable: task.variable_name().to_string(),
            kind: task.kind().to_string(),
            timeout: format!("{}s", task.exec_timeout().as_secs()),
            command: task.command().to_string(),
        })
        .collect()
}

fn variable_rows(snapshot: &Snapshot) -> Vec<VariableRow> {
    snapshot
        .iter()
        .map(|(name, value)| VariableRow {
            variable: name.to_string(),
            value: value.to_string(),
        })
        .collect()
}

fn outcome_rows(report: &PassReport) -> Vec<OutcomeRow> {
    report
        .tasks
        .iter()
        .map(|t| OutcomeRow {
            variable: t.variable_name.clone(),
            value: t.value.clone(),
            outcome: t.outcome.to_string(),
        })
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::IfAddr { ifname } => {
            let addr = ifname.as_deref().and_then(interface_ipv4);
            println!("{}", format_ipv4(addr));
        }

        Commands::FileExists { path } => {
            println!("{}", format_exists(file_exists(&path)));
        }

        Commands::CheckConfig => {
            let config = load_config(&cli.config)?;

            println!("{}", "✓ Configuration is valid".green().bold());
            println!();
            println!("  {} {}", "Moonraker:".bold(), config.base_url());
            println!("  {} {}", "Macro:".bold(), config.macro_name());
            println!("  {} {}s", "API timeout:".bold(), config.api_timeout().as_secs());
            println!("  {} {}s", "Interval:".bold(), config.update_interval().as_secs());
            println!();
            println!("{}", Table::new(task_rows(&config)));
        }

        Commands::Snapshot => {
            let config = load_config(&cli.config)?;
            let client = MoonrakerClient::new(&config)?;

            let snapshot = client
                .fetch_snapshot()
                .await
                .with_context(|| format!("Failed to query {}", config.base_url()))?;

            println!(
                "{}",
                format!("gcode_macro {}", config.macro_name()).cyan().bold()
            );
            if snapshot.is_empty() {
                println!("{}", "No variables defined".yellow());
            } else {
                println!("{}", Table::new(variable_rows(&snapshot)));
            }
        }

        Commands::Set {
            variable,
            value,
            number,
        } => {
            let config = load_config(&cli.config)?;
            let client = MoonrakerClient::new(&config)?;
            let kind = ValueKind::from_is_number(number);

            client
                .push_value(&variable, kind, &value)
                .await
                .with_context(|| format!("Failed to set {}", variable))?;

            println!(
                "{}",
                format!("✓ {} = {} ({})", variable, value, kind).green().bold()
            );
        }

        Commands::RunOnce => {
            let config = Arc::new(load_config(&cli.config)?);
            let time_provider = Arc::new(SystemTimeProvider);
            let runner = TaskRunner::new(
                config.clone(),
                Arc::new(ShellExecutor::new(time_provider.clone())),
                Arc::new(MoonrakerClient::new(&config)?),
                time_provider,
                tracing::info_span!("run_once", macro_name = %config.macro_name()),
            );

            let report = runner.run_pass().await;

            if report.snapshot_available {
                println!("  {} {}", "Snapshot:".bold(), "OK".green());
            } else {
                println!("  {} {}", "Snapshot:".bold(), "UNAVAILABLE".red());
            }
            println!("  {} {}", "Pushed:".bold(), report.pushed_count());
            println!("  {} {}", "Failed:".bold(), report.failed_count());
            println!("  {} {} ms", "Duration:".bold(), report.duration_ms);
            println!();
            println!("{}", Table::new(outcome_rows(&report)));

            if report.tasks.iter().any(|t| t.value == SENTINEL_VALUE) {
                println!(
                    "{}",
                    format!("Some commands produced no value and reported '{}'", SENTINEL_VALUE)
                        .yellow()
                );
            }
        }
    }

    Ok(())
}
