use archisheets_core::{create_project_from_template, Project};
use clap::{Args, Subcommand, ValueEnum};

use super::session::{CommandError, Session};
use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ProjectCommand {
    #[command(subcommand)]
    pub command: ProjectSubcommand,
}

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// List projects in the master index
    List {
        /// Only list templates
        #[arg(long)]
        templates: bool,
    },

    /// Show a project with its chapters, documents and placeholders
    Show {
        /// Project id or name
        project: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a project, optionally copying a template's documents
    Create {
        /// Project name
        name: String,

        /// Template project id or name to copy from
        #[arg(long, short)]
        template: Option<String>,
    },

    /// Re-read a project and write it back, restoring missing tabs and headers
    Refresh {
        /// Project id or name
        project: String,
    },
}

impl ProjectCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let session = Session::from_config(config)?;

        match &self.command {
            ProjectSubcommand::List { templates } => {
                let projects: Vec<Project> = session
                    .projects()
                    .await?
                    .into_iter()
                    .filter(|p| !templates || p.is_template)
                    .collect();

                if projects.is_empty() {
                    println!("No projects found.");
                    return Ok(());
                }
                print_project_table(&projects);
                Ok(())
            }

            ProjectSubcommand::Show { project, format } => {
                let (project, pulled) = session.open(project).await?;
                match format {
                    OutputFormat::Json => {
                        let json = serde_json::to_string_pretty(&project)
                            .map_err(|e| CommandError::Output(e.to_string()))?;
                        println!("{}", json);
                    }
                    OutputFormat::Text => {
                        print!("{}", project);
                        if !pulled {
                            println!("\n(spreadsheet could not be read; showing master summary only)");
                        }
                    }
                }
                Ok(())
            }

            ProjectSubcommand::Create { name, template } => {
                let template = match template {
                    Some(selector) => Some(session.open_for_edit(selector).await?),
                    None => None,
                };

                let project = create_project_from_template(
                    &session.client,
                    &session.token,
                    &session.master_id,
                    name,
                    template.as_ref(),
                )
                .await?;

                println!("Created project: {}", project.name);
                println!("  ID: {}", project.id);
                if let Some(sheet_id) = &project.sheet_id {
                    println!("  Spreadsheet: {}", sheet_id);
                }
                if let Some(template) = &template {
                    println!(
                        "  From template '{}': {} chapters, {} documents",
                        template.name,
                        project.chapters.len(),
                        project.document_count()
                    );
                }
                Ok(())
            }

            ProjectSubcommand::Refresh { project } => {
                let project = session.open_for_edit(project).await?;
                session.save(&project).await?;
                println!(
                    "Refreshed '{}' ({} chapters, {} documents, {} placeholders)",
                    project.name,
                    project.chapters.len(),
                    project.document_count(),
                    project.placeholders.len()
                );
                Ok(())
            }
        }
    }
}

/// Fixed-width table of master summaries.
fn print_project_table(projects: &[Project]) {
    let name_width = projects
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    println!("{:<36}  {:<name_width$}  {:<10}  TEMPLATE", "ID", "NAME", "CREATED");
    for project in projects {
        println!(
            "{:<36}  {:<name_width$}  {:<10}  {}",
            project.id,
            project.name,
            created_date(&project.created_at),
            if project.is_template { "yes" } else { "" }
        );
    }
}

/// Date part of a stored timestamp; anything unparseable is shown as is.
fn created_date(created_at: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}
