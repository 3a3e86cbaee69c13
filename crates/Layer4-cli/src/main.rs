//! Heatrix CLI - Main entry point

mod commands;
mod runtime;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::ReportFormat;
use heatrix_foundation::{HostConfig, Theme};

/// Heatrix - engineering calculation tools in one host
#[derive(Parser, Debug)]
#[command(name = "heatrix")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Data directory (registry, projects, isolation library)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Theme (light, dark)
    #[arg(long, global = true)]
    theme: Option<Theme>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start all enabled plugins and show their tabs
    Run,
    /// Write the consolidated report
    Report {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "html")]
        format: ReportFormat,
    },
    /// Manage the plugin registry
    Plugins {
        #[command(subcommand)]
        action: PluginsAction,
    },
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PluginsAction {
    /// List registered plugins with their status
    List,
    /// Enable a plugin
    Enable { id: String },
    /// Disable a plugin
    Disable { id: String },
}

#[derive(Subcommand, Debug)]
enum ProjectsAction {
    /// List projects (current marked with *)
    List,
    /// Create a project and make it current
    Create { name: String },
    /// Switch the current project
    Select { id: String },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let mut config = HostConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        HostConfig::default()
    });

    // CLI flags win over config files
    if let Some(dir) = args.data_dir {
        config = config.data_dir(dir);
    }
    if let Some(theme) = args.theme {
        config = config.theme(theme);
    }

    match args.command.unwrap_or(Command::Run) {
        Command::Run => commands::run(config),
        Command::Report { out, format } => commands::report(config, out, format),
        Command::Plugins { action } => match action {
            PluginsAction::List => commands::plugins_list(config),
            PluginsAction::Enable { id } => commands::plugins_set_enabled(config, &id, true),
            PluginsAction::Disable { id } => commands::plugins_set_enabled(config, &id, false),
        },
        Command::Projects { action } => match action {
            ProjectsAction::List => commands::projects_list(config),
            ProjectsAction::Create { name } => commands::projects_create(config, &name),
            ProjectsAction::Select { id } => commands::projects_select(config, &id),
        },
    }
}
