use clap::{Args, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;

use crate::config::{mask_token, set_file_value, Config, ConfigSource, ConfigValue};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,

    /// Set the master spreadsheet that indexes all projects
    SetMaster {
        /// Spreadsheet id (the long token in its URL)
        id: String,
    },
}

fn print_optional(name: &str, value: &ConfigValue<Option<String>>) {
    match &value.value {
        Some(v) => println!("{}: {}", name, v),
        None => println!("{}: (not set)", name),
    }
    println!("  source: {}", value.source);
    println!();
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!("Config file: {} (not found)", config.file_path().display());
                        }
                        println!();

                        let token = ConfigValue::new(
                            config.token.value.as_deref().map(mask_token),
                            config.token.source.clone(),
                        );
                        print_optional("token", &token);
                        print_optional("master_sheet_id", &config.master_sheet_id);

                        println!("sheets_api_url: {}", config.sheets_api_url.value);
                        println!("  source: {}", config.sheets_api_url.source);
                        println!();

                        println!("drive_api_url: {}", config.drive_api_url.value);
                        println!("  source: {}", config.drive_api_url.source);
                        println!();

                        match config.request_timeout_secs.value {
                            Some(secs) => println!("request_timeout_secs: {}", secs),
                            None => println!("request_timeout_secs: (none)"),
                        }
                        println!("  source: {}", config.request_timeout_secs.source);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = config.file_path();

                // Check if config already exists
                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'archi config show' to view current configuration.");
                    return Ok(());
                }

                // Create parent directory
                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let default_config = r#"# archisheets configuration

# Google OAuth access token (or set ARCHI_TOKEN); see 'archi auth login'
# token: ya29...

# Spreadsheet holding the PROJECTES index (or set ARCHI_MASTER_SHEET_ID)
# master_sheet_id: 1AbC...

# API base URLs, for proxies
# sheets_api_url: https://sheets.googleapis.com/v4/spreadsheets
# drive_api_url: https://www.googleapis.com/drive/v3

# Fail requests that take longer than this many seconds
# request_timeout_secs: 60
"#;

                let mut file = fs::File::create(config_path)?;
                file.write_all(default_config.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }

            ConfigSubcommand::SetMaster { id } => {
                let id = id.trim();
                if id.is_empty() {
                    return Err("Master spreadsheet id cannot be empty".into());
                }
                set_file_value(config.file_path(), "master_sheet_id", Some(id))?;
                println!("Master spreadsheet set to {}", id);
                if config.master_sheet_id.source == ConfigSource::Environment {
                    println!(
                        "Note: ARCHI_MASTER_SHEET_ID is set and takes precedence over the config file."
                    );
                }
                Ok(())
            }
        }
    }
}
