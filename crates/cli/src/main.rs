//! Load Actuator CLI
//!
//! A command-line tool for steering the synthetic load actuator: writing
//! utilization targets, inspecting the published status snapshot, and
//! probing the agent's health endpoint.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Load Actuator CLI
#[derive(Parser)]
#[command(name = "loadctl")]
#[command(author, version, about = "CLI for the synthetic load actuator", long_about = None)]
pub struct Cli {
    /// Path of the target config file polled by the actuator
    #[arg(
        long,
        env = "LOADCTL_CONFIG_PATH",
        default_value = "/tmp/load_actuator_config.json"
    )]
    pub config_path: PathBuf,

    /// Path of the status file published by the actuator
    #[arg(
        long,
        env = "LOADCTL_STATUS_PATH",
        default_value = "/tmp/load_actuator_status.json"
    )]
    pub status_path: PathBuf,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Update utilization targets
    Set {
        /// CPU utilization target percent
        #[arg(long)]
        cpu: Option<f64>,

        /// Memory utilization target percent
        #[arg(long)]
        memory: Option<f64>,

        /// Disk utilization target percent
        #[arg(long)]
        disk: Option<f64>,
    },

    /// Show the actuator status snapshot
    Status,

    /// Probe the actuator health endpoint
    Health {
        /// Actuator API URL (can also be set via LOADCTL_API_URL env var)
        #[arg(long, env = "LOADCTL_API_URL", default_value = "http://localhost:8090")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Set { cpu, memory, disk } => {
            commands::set_targets(&cli.config_path, cpu, memory, disk)
        }
        Commands::Status => commands::show_status(&cli.status_path, cli.format),
        Commands::Health { api_url } => commands::check_health(&api_url).await,
    }
}
