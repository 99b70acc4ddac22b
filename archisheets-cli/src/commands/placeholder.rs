use clap::{Args, Subcommand};

use super::session::{CommandError, Session};
use crate::config::Config;

#[derive(Args)]
pub struct PlaceholderCommand {
    #[command(subcommand)]
    pub command: PlaceholderSubcommand,
}

#[derive(Subcommand)]
pub enum PlaceholderSubcommand {
    /// Add or update a placeholder
    Set {
        /// Project id or name
        project: String,
        key: String,
        value: String,
        /// Description shown next to the value
        #[arg(long, short)]
        description: Option<String>,
    },

    /// Remove a placeholder
    Remove {
        /// Project id or name
        project: String,
        key: String,
    },
}

impl PlaceholderCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let session = Session::from_config(config)?;

        match &self.command {
            PlaceholderSubcommand::Set {
                project,
                key,
                value,
                description,
            } => {
                let mut project = session.open_for_edit(project).await?;
                project.set_placeholder(key.as_str(), value.as_str(), description.clone())?;
                session.save(&project).await?;
                println!("Set {} = {} in {}", key, value, project.name);
                Ok(())
            }

            PlaceholderSubcommand::Remove { project, key } => {
                let mut project = session.open_for_edit(project).await?;
                if !project.remove_placeholder(key) {
                    println!("No placeholder '{}' in {}", key, project.name);
                    return Ok(());
                }
                session.save(&project).await?;
                println!("Removed placeholder '{}' from {}", key, project.name);
                Ok(())
            }
        }
    }
}
