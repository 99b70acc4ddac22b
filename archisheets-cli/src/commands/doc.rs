use clap::{Args, Subcommand};

use super::session::{CommandError, Session};
use crate::config::Config;

#[derive(Args)]
pub struct DocCommand {
    #[command(subcommand)]
    pub command: DocSubcommand,
}

#[derive(Subcommand)]
pub enum DocSubcommand {
    /// Link a Drive document into a chapter
    Add {
        /// Project id or name
        project: String,
        /// Chapter tab name
        chapter: String,
        /// Document title
        title: String,
        /// Drive, Docs or Sheets URL
        url: String,
    },

    /// Unlink a document from a chapter (the Drive file is untouched)
    Remove {
        /// Project id or name
        project: String,
        /// Chapter tab name
        chapter: String,
        /// Position of the document in the chapter, starting at 1
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        index: u64,
    },
}

impl DocCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let session = Session::from_config(config)?;

        match &self.command {
            DocSubcommand::Add {
                project,
                chapter,
                title,
                url,
            } => {
                let mut project = session.open_for_edit(project).await?;
                let doc = project
                    .chapter_mut(chapter)?
                    .add_document(title.as_str(), url.as_str())?
                    .clone();
                session.save(&project).await?;
                println!("Added {} to {}", doc, chapter);
                Ok(())
            }

            DocSubcommand::Remove {
                project,
                chapter,
                index,
            } => {
                let mut project = session.open_for_edit(project).await?;
                let removed = project
                    .chapter_mut(chapter)?
                    .remove_document((*index - 1) as usize)?;
                session.save(&project).await?;
                println!("Removed {} from {}", removed, chapter);
                Ok(())
            }
        }
    }
}
