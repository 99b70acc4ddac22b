//! Shared plumbing for commands that talk to Google: credentials, project
//! lookup and the pull, edit, push cycle.

use archisheets_core::{
    fetch_master_projects, pull, ApiError, GoogleClient, ModelError, ProvisionError, Project,
    PushScheduler, SubmitOutcome, SyncError,
};

use crate::config::Config;

/// Everything a remote command needs, resolved from configuration.
pub struct Session {
    pub client: GoogleClient,
    pub token: String,
    pub master_id: String,
    scheduler: PushScheduler,
}

impl Session {
    pub fn from_config(config: &Config) -> Result<Self, CommandError> {
        let token = config
            .token
            .value
            .clone()
            .ok_or(CommandError::NotLoggedIn)?;
        let master_id = config
            .master_sheet_id
            .value
            .clone()
            .ok_or(CommandError::NoMasterSheet)?;
        let client = config.google_client().map_err(CommandError::Client)?;
        Ok(Self {
            scheduler: PushScheduler::new(client.clone()),
            client,
            token,
            master_id,
        })
    }

    pub async fn projects(&self) -> Result<Vec<Project>, CommandError> {
        Ok(fetch_master_projects(&self.client, &self.token, &self.master_id).await?)
    }

    /// Find a project by id or name and merge its spreadsheet contents into
    /// the master summary. The flag is false when the spreadsheet could not
    /// be read and the project only carries its summary.
    pub async fn open(&self, selector: &str) -> Result<(Project, bool), CommandError> {
        let projects = self.projects().await?;
        let mut project = find_project(&projects, selector)?.clone();

        let Some(sheet_id) = project.sheet_id.clone() else {
            return Ok((project, false));
        };
        match pull(&self.client, &self.token, &sheet_id).await {
            Some(remote) => {
                project.merge_remote(remote);
                Ok((project, true))
            }
            None => Ok((project, false)),
        }
    }

    /// Like [`Session::open`] but refuses projects whose spreadsheet could
    /// not be read, since pushing the bare summary would wipe it.
    pub async fn open_for_edit(&self, selector: &str) -> Result<Project, CommandError> {
        match self.open(selector).await? {
            (project, true) => Ok(project),
            (project, false) => Err(CommandError::Unreadable(project.name)),
        }
    }

    /// Push through the session's scheduler, so saves of the same project
    /// from one session never overlap.
    pub async fn save(&self, project: &Project) -> Result<(), CommandError> {
        match self.scheduler.submit(&self.token, project).await? {
            SubmitOutcome::Skipped => {
                tracing::warn!("Project '{}' has no spreadsheet, nothing saved", project.name)
            }
            outcome => tracing::debug!("Push outcome for '{}': {:?}", project.name, outcome),
        }
        Ok(())
    }
}

/// Match on id first, then on name (case-insensitive). A name shared by
/// several projects must be disambiguated with the id.
pub fn find_project<'a>(projects: &'a [Project], selector: &str) -> Result<&'a Project, CommandError> {
    if let Some(project) = projects.iter().find(|p| p.id == selector) {
        return Ok(project);
    }

    let matches: Vec<&Project> = projects
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case(selector.trim()))
        .collect();
    match matches.as_slice() {
        [project] => Ok(*project),
        [] => Err(CommandError::ProjectNotFound(selector.to_string())),
        several => Err(CommandError::AmbiguousProject(
            selector.to_string(),
            several.len(),
        )),
    }
}

/// Errors from commands that read or write projects
#[derive(Debug)]
pub enum CommandError {
    NotLoggedIn,
    NoMasterSheet,
    Client(ApiError),
    Sync(SyncError),
    Provision(ProvisionError),
    Model(ModelError),
    ProjectNotFound(String),
    AmbiguousProject(String, usize),
    Unreadable(String),
    Output(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::NotLoggedIn => {
                write!(f, "No Google token configured. Run 'archi auth login' first.")
            }
            CommandError::NoMasterSheet => write!(
                f,
                "No master spreadsheet configured. Run 'archi config set-master <ID>' first."
            ),
            CommandError::Client(e) => write!(f, "{}", e),
            CommandError::Sync(e) if e.is_unauthorized() => {
                write!(f, "{} (token expired? run 'archi auth login')", e)
            }
            CommandError::Sync(e) => write!(f, "{}", e),
            CommandError::Provision(e) => write!(f, "{}", e),
            CommandError::Model(e) => write!(f, "{}", e),
            CommandError::ProjectNotFound(selector) => {
                write!(f, "Project not found: {}", selector)
            }
            CommandError::AmbiguousProject(selector, count) => write!(
                f,
                "{} projects are named '{}'; use the project id instead",
                count, selector
            ),
            CommandError::Unreadable(name) => write!(
                f,
                "Could not read the spreadsheet of '{}'; refusing to overwrite it",
                name
            ),
            CommandError::Output(e) => write!(f, "Failed to format output: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Client(e) => Some(e),
            CommandError::Sync(e) => Some(e),
            CommandError::Provision(e) => Some(e),
            CommandError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SyncError> for CommandError {
    fn from(e: SyncError) -> Self {
        CommandError::Sync(e)
    }
}

impl From<ProvisionError> for CommandError {
    fn from(e: ProvisionError) -> Self {
        CommandError::Provision(e)
    }
}

impl From<ModelError> for CommandError {
    fn from(e: ModelError) -> Self {
        CommandError::Model(e)
    }
}
