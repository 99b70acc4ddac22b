//! Sync error types.

use thiserror::Error;

use crate::google::ApiError;
use crate::models::ModelError;

/// Errors that can occur while reading or writing project state remotely.
///
/// Each variant names the step that failed; the underlying API error is kept
/// as the source.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Reading the master index failed
    #[error("Failed to read master index: {0}")]
    MasterRead(#[source] ApiError),

    /// Creating the PROJECTES tab or its header failed
    #[error("Failed to set up master index: {0}")]
    MasterSetup(#[source] ApiError),

    /// Appending the project row failed
    #[error("Failed to register project in master index: {0}")]
    Registration(#[source] ApiError),

    /// Listing the project spreadsheet's tabs failed
    #[error("Failed to list project tabs: {0}")]
    ListTabs(#[source] ApiError),

    /// The add-sheet batch failed; none of the tabs were created
    #[error("Failed to create tabs {tabs:?}: {source}")]
    CreateTabs {
        tabs: Vec<String>,
        #[source]
        source: ApiError,
    },

    /// Clearing the previous contents failed
    #[error("Failed to clear project tabs: {0}")]
    Clear(#[source] ApiError),

    /// The batched value write failed
    #[error("Failed to write project tabs: {0}")]
    Write(#[source] ApiError),

    /// Two chapters, or a chapter and a fixed tab, share a tab name
    #[error("Project cannot be written: {0}")]
    InvalidProject(#[source] ModelError),
}

impl SyncError {
    /// The remote failure behind this error, if it came from the API.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SyncError::MasterRead(e)
            | SyncError::MasterSetup(e)
            | SyncError::Registration(e)
            | SyncError::ListTabs(e)
            | SyncError::Clear(e)
            | SyncError::Write(e) => Some(e),
            SyncError::CreateTabs { source, .. } => Some(source),
            SyncError::InvalidProject(_) => None,
        }
    }

    /// True when the bearer token was rejected.
    pub fn is_unauthorized(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_unauthorized)
    }
}
