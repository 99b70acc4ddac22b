//! ArchiSheets Core Library
//!
//! Architecture project model kept in Google Sheets: the spreadsheet layout,
//! pull/push synchronization and project provisioning from templates.

pub mod google;
pub mod models;
pub mod provision;
pub mod schema;
pub mod sync;

#[cfg(test)]
mod testing;

pub use google::{ApiError, Endpoints, GoogleClient};
pub use models::{
    extract_file_id, sheet_tab_name, Chapter, Direction, DocType, DriveDocument, ModelError,
    Placeholder, Project, RemoteProject,
};
pub use provision::{create_project_from_template, ProvisionError};
pub use sync::{
    fetch_master_projects, pull, push, register_project, PushScheduler, SubmitOutcome,
    SyncError, SyncStatus,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
