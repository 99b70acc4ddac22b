//! Synchronization between in-memory projects and their spreadsheets.
//!
//! ## Protocol
//!
//! - `pull`: one batched read of CONFIG + ESTRUCTURA, then one read per
//!   chapter tab. Failures degrade to `None` so local state is kept.
//! - `push`: list tabs, add the missing ones in one batch, clear the written
//!   ranges, then write every tab in one batched value update. Full overwrite,
//!   no diffing.
//! - master index: listing provisions the PROJECTES tab on first use;
//!   registration is skipped when the spreadsheet is already listed.
//!
//! The engine does no locking. Callers that push from several tasks go
//! through [`PushScheduler`], which serializes pushes per spreadsheet.

mod error;
mod master;
mod project;
mod scheduler;

pub use error::SyncError;
pub use master::{fetch_master_projects, register_project, setup_master_sheet};
pub use project::{pull, push};
pub use scheduler::{PushScheduler, SubmitOutcome, SyncStatus};
