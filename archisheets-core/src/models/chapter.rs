use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::document::DriveDocument;
use super::ModelError;

/// Longest tab name derived from a chapter title.
pub const TAB_NAME_MAX_LEN: usize = 30;

/// Derive the spreadsheet tab name for a chapter title.
///
/// Takes the first 30 characters, upper-cases ASCII letters and replaces
/// everything outside `[A-Z0-9]` with `_`. The result is the join key between
/// local chapters and remote tabs, so it must stay stable for a given title.
pub fn sheet_tab_name(title: &str) -> String {
    title
        .chars()
        .take(TAB_NAME_MAX_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A section of the project documentation, backed by one spreadsheet tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Local id, regenerated on every remote read
    pub id: Uuid,
    pub title: String,
    sheet_tab_name: String,
    pub documents: Vec<DriveDocument>,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: Uuid::new_v4(),
            sheet_tab_name: sheet_tab_name(&title),
            title,
            documents: Vec::new(),
        }
    }

    /// Rebuild a chapter read from the ESTRUCTURA tab. The remote tab name is
    /// kept as-is so tabs written by older versions still line up; a blank one
    /// falls back to the derived name.
    pub fn from_remote(
        title: impl Into<String>,
        tab_name: impl Into<String>,
        documents: Vec<DriveDocument>,
    ) -> Self {
        let title = title.into();
        let tab_name = tab_name.into();
        let sheet_tab_name = if tab_name.trim().is_empty() {
            sheet_tab_name(&title)
        } else {
            tab_name
        };
        Self {
            id: Uuid::new_v4(),
            title,
            sheet_tab_name,
            documents,
        }
    }

    /// Same title and tab with a fresh local id and the given documents.
    pub fn copy_with_documents(&self, documents: Vec<DriveDocument>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            sheet_tab_name: self.sheet_tab_name.clone(),
            documents,
        }
    }

    pub fn with_documents(mut self, documents: Vec<DriveDocument>) -> Self {
        self.documents = documents;
        self
    }

    pub fn sheet_tab_name(&self) -> &str {
        &self.sheet_tab_name
    }

    pub fn add_document(
        &mut self,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<&DriveDocument, ModelError> {
        let title = title.into();
        let url = url.into();
        if title.trim().is_empty() || url.trim().is_empty() {
            return Err(ModelError::EmptyDocument);
        }
        self.documents.push(DriveDocument::new(title, url));
        Ok(&self.documents[self.documents.len() - 1])
    }

    pub fn remove_document(&mut self, index: usize) -> Result<DriveDocument, ModelError> {
        if index >= self.documents.len() {
            return Err(ModelError::DocumentOutOfRange {
                index,
                len: self.documents.len(),
            });
        }
        Ok(self.documents.remove(index))
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (tab: {})", self.title, self.sheet_tab_name)?;
        for (i, doc) in self.documents.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, doc)?;
        }
        Ok(())
    }
}
