use thiserror::Error;

mod chapter;
mod document;
mod placeholder;
mod project;

pub use chapter::{sheet_tab_name, Chapter, TAB_NAME_MAX_LEN};
pub use document::{extract_file_id, DocType, DriveDocument, FILE_ID_MIN_LEN};
pub use placeholder::Placeholder;
pub use project::{Direction, Project, RemoteProject};
pub(crate) use project::timestamp_now;

/// Errors from editing the in-memory project model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Chapter title cannot be empty")]
    EmptyTitle,

    #[error("Document needs both a title and a URL")]
    EmptyDocument,

    #[error("Placeholder key cannot be empty")]
    EmptyKey,

    #[error("Tab {0} is already used by the project spreadsheet")]
    DuplicateTab(String),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("Document {index} out of range (chapter has {len} documents)")]
    DocumentOutOfRange { index: usize, len: usize },
}
