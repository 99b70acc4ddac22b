use archisheets_core::{Direction, ModelError};
use clap::{Args, Subcommand, ValueEnum};

use super::session::{CommandError, Session};
use crate::config::Config;

#[derive(Clone, Copy, ValueEnum)]
pub enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(direction: MoveDirection) -> Self {
        match direction {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

#[derive(Args)]
pub struct ChapterCommand {
    #[command(subcommand)]
    pub command: ChapterSubcommand,
}

#[derive(Subcommand)]
pub enum ChapterSubcommand {
    /// Append a chapter; its tab name is derived from the title
    Add {
        /// Project id or name
        project: String,
        /// Chapter title
        title: String,
    },

    /// Remove a chapter from the structure (its tab is kept)
    Remove {
        /// Project id or name
        project: String,
        /// Chapter tab name, as shown by 'project show'
        tab: String,
    },

    /// Move a chapter one position up or down
    Move {
        /// Project id or name
        project: String,
        /// Chapter tab name
        tab: String,
        #[arg(value_enum)]
        direction: MoveDirection,
    },
}

impl ChapterCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let session = Session::from_config(config)?;

        match &self.command {
            ChapterSubcommand::Add { project, title } => {
                let mut project = session.open_for_edit(project).await?;
                let tab = project.add_chapter(title.as_str())?.sheet_tab_name().to_string();
                session.save(&project).await?;
                println!("Added chapter '{}' (tab {}) to {}", title, tab, project.name);
                Ok(())
            }

            ChapterSubcommand::Remove { project, tab } => {
                let mut project = session.open_for_edit(project).await?;
                let removed = project.remove_chapter(tab)?;
                session.save(&project).await?;
                println!(
                    "Removed chapter '{}' ({} documents) from {}",
                    removed.title,
                    removed.documents.len(),
                    project.name
                );
                Ok(())
            }

            ChapterSubcommand::Move {
                project,
                tab,
                direction,
            } => {
                let mut project = session.open_for_edit(project).await?;
                let index = project
                    .chapters
                    .iter()
                    .position(|c| c.sheet_tab_name() == tab)
                    .ok_or_else(|| ModelError::ChapterNotFound(tab.clone()))?;

                if !project.move_chapter(index, (*direction).into()) {
                    println!("Chapter {} is already at the edge.", tab);
                    return Ok(());
                }
                session.save(&project).await?;
                for (i, chapter) in project.chapters.iter().enumerate() {
                    println!("{}. {} ({})", i + 1, chapter.title, chapter.sheet_tab_name());
                }
                Ok(())
            }
        }
    }
}
