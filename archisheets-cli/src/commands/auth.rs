//! Authentication commands for the ArchiSheets CLI.
//!
//! The CLI does not run an OAuth flow: a bearer token obtained elsewhere
//! (for example `gcloud auth print-access-token`) is stored in the config
//! file and sent with every Google API call.

use crate::config::{mask_token, set_file_value, Config, ConfigError, ConfigSource};
use clap::{Args, Subcommand};
use std::io::{self, Write};

/// Authentication commands
#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Store a Google OAuth access token
    Login {
        /// Token to store; prompted for when omitted
        #[arg(long)]
        token: Option<String>,
    },
    /// Remove the stored token from config
    Logout,
    /// Show authentication status
    Status,
}

impl AuthCommand {
    pub fn run(&self, config: &Config) -> Result<(), AuthError> {
        match &self.command {
            AuthSubcommand::Login { token } => login(config, token.as_deref()),
            AuthSubcommand::Logout => logout(config),
            AuthSubcommand::Status => status(config),
        }
    }
}

/// Errors that can occur during authentication
#[derive(Debug)]
pub enum AuthError {
    /// I/O error
    IoError(io::Error),
    /// Config file error
    ConfigError(ConfigError),
    /// Empty token entered
    EmptyToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::IoError(e) => write!(f, "I/O error: {}", e),
            AuthError::ConfigError(e) => write!(f, "Config error: {}", e),
            AuthError::EmptyToken => write!(f, "Token cannot be empty"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self {
        AuthError::IoError(e)
    }
}

impl From<ConfigError> for AuthError {
    fn from(e: ConfigError) -> Self {
        AuthError::ConfigError(e)
    }
}

fn login(config: &Config, token: Option<&str>) -> Result<(), AuthError> {
    let token = match token {
        Some(token) => token.trim().to_string(),
        None => {
            print!("Paste your Google access token: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            line.trim().to_string()
        }
    };
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }

    let config_path = config.file_path();
    set_file_value(config_path, "token", Some(&token))?;
    println!("Token saved to {} ({})", config_path.display(), mask_token(&token));

    if config.token.source == ConfigSource::Environment {
        println!("Note: ARCHI_TOKEN is set and takes precedence over the config file.");
    }
    Ok(())
}

fn logout(config: &Config) -> Result<(), AuthError> {
    let config_path = config.file_path();

    if !config_path.exists() {
        println!("Already logged out (no config file).");
        return Ok(());
    }

    set_file_value(config_path, "token", None)?;
    println!("Logged out. Token removed from {}.", config_path.display());
    Ok(())
}

fn status(config: &Config) -> Result<(), AuthError> {
    match &config.token.value {
        Some(token) => println!(
            "Logged in (token: {}, from {})",
            mask_token(token),
            config.token.source
        ),
        None => println!("Not logged in. Run 'archi auth login' to store a token."),
    }
    match &config.master_sheet_id.value {
        Some(id) => println!("Master spreadsheet: {}", id),
        None => println!("Master spreadsheet: not set (run 'archi config set-master <ID>')"),
    }
    Ok(())
}
