use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    AuthCommand, ChapterCommand, ConfigCommand, DocCommand, PlaceholderCommand, ProjectCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "archi")]
#[command(version)]
#[command(about = "Architecture project documentation kept in Google Sheets", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store or remove the Google access token
    Auth(AuthCommand),

    /// Manage configuration
    Config(ConfigCommand),

    /// List, show, create and refresh projects
    Project(ProjectCommand),

    /// Edit a project's chapters
    Chapter(ChapterCommand),

    /// Link and unlink Drive documents
    Doc(DocCommand),

    /// Edit a project's placeholders
    Placeholder(PlaceholderCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archi=info,archisheets_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    match &cli.command {
        Some(Commands::Auth(cmd)) => cmd.run(&config)?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        Some(Commands::Project(cmd)) => cmd.run(&config).await?,
        Some(Commands::Chapter(cmd)) => cmd.run(&config).await?,
        Some(Commands::Doc(cmd)) => cmd.run(&config).await?,
        Some(Commands::Placeholder(cmd)) => cmd.run(&config).await?,
        None => println!("Use --help to see available commands"),
    }

    Ok(())
}
