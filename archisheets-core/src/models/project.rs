use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use super::chapter::{sheet_tab_name, Chapter};
use super::placeholder::Placeholder;
use super::ModelError;
use crate::schema::{CONFIG_TAB, STRUCTURE_TAB};

/// Direction for reordering a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A project: one row in the master index plus its own spreadsheet and
/// Drive folder.
///
/// `sheet_id` is assigned when the project is provisioned and never changes
/// afterwards; it is the key that links this snapshot to its remote tabs.
/// Summaries read from the master index carry no chapters or placeholders
/// until they are pulled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_template: bool,
    /// RFC 3339 timestamp, kept verbatim as read from the master index
    pub created_at: String,
    pub sheet_id: Option<String>,
    /// Absent for legacy projects and for master summaries
    pub folder_id: Option<String>,
    pub chapters: Vec<Chapter>,
    pub placeholders: Vec<Placeholder>,
}

/// Chapters and placeholders read back from a project spreadsheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteProject {
    pub chapters: Vec<Chapter>,
    pub placeholders: Vec<Placeholder>,
}

fn is_reserved_tab(tab: &str) -> bool {
    tab == CONFIG_TAB || tab == STRUCTURE_TAB
}

/// Current time in the format the master index stores (`2024-05-01T09:30:00.000Z`).
pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Project {
    /// A new, not yet provisioned project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            is_template: false,
            created_at: timestamp_now(),
            sheet_id: None,
            folder_id: None,
            chapters: Vec::new(),
            placeholders: Vec::new(),
        }
    }

    pub fn with_sheet_id(mut self, sheet_id: impl Into<String>) -> Self {
        self.sheet_id = Some(sheet_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn as_template(mut self) -> Self {
        self.is_template = true;
        self
    }

    pub fn chapter(&self, tab_name: &str) -> Option<&Chapter> {
        self.chapters
            .iter()
            .find(|c| c.sheet_tab_name() == tab_name)
    }

    pub fn chapter_mut(&mut self, tab_name: &str) -> Result<&mut Chapter, ModelError> {
        self.chapters
            .iter_mut()
            .find(|c| c.sheet_tab_name() == tab_name)
            .ok_or_else(|| ModelError::ChapterNotFound(tab_name.to_string()))
    }

    /// Append a chapter at the end of the structure. The derived tab name
    /// must not collide with CONFIG, ESTRUCTURA or another chapter's tab.
    pub fn add_chapter(&mut self, title: impl Into<String>) -> Result<&mut Chapter, ModelError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModelError::EmptyTitle);
        }
        let tab = sheet_tab_name(&title);
        if is_reserved_tab(&tab) || self.chapter(&tab).is_some() {
            return Err(ModelError::DuplicateTab(tab));
        }
        self.chapters.push(Chapter::new(title));
        let last = self.chapters.len() - 1;
        Ok(&mut self.chapters[last])
    }

    /// Every chapter must own exactly one tab of its own. Projects read back
    /// from a spreadsheet or taken from a template are not guaranteed to.
    pub fn check_tabs(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for chapter in &self.chapters {
            let tab = chapter.sheet_tab_name();
            if is_reserved_tab(tab) || !seen.insert(tab) {
                return Err(ModelError::DuplicateTab(tab.to_string()));
            }
        }
        Ok(())
    }

    /// Swap the chapter at `index` with its neighbour. Returns false when the
    /// move would leave the list.
    pub fn move_chapter(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        match target {
            Some(target) if index < self.chapters.len() && target < self.chapters.len() => {
                self.chapters.swap(index, target);
                true
            }
            _ => false,
        }
    }

    /// Remove a chapter from the local structure. The remote tab is left alone.
    pub fn remove_chapter(&mut self, tab_name: &str) -> Result<Chapter, ModelError> {
        let index = self
            .chapters
            .iter()
            .position(|c| c.sheet_tab_name() == tab_name)
            .ok_or_else(|| ModelError::ChapterNotFound(tab_name.to_string()))?;
        Ok(self.chapters.remove(index))
    }

    /// Insert or update a placeholder; an existing key keeps its position.
    pub fn set_placeholder(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        description: Option<String>,
    ) -> Result<(), ModelError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ModelError::EmptyKey);
        }
        let value = value.into();

        match self.placeholders.iter_mut().find(|p| p.key == key) {
            Some(existing) => {
                existing.value = value;
                if let Some(description) = description {
                    existing.description = description;
                }
            }
            None => {
                self.placeholders.push(Placeholder {
                    key,
                    value,
                    description: description.unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    pub fn remove_placeholder(&mut self, key: &str) -> bool {
        let len_before = self.placeholders.len();
        self.placeholders.retain(|p| p.key != key);
        self.placeholders.len() != len_before
    }

    /// Apply a pulled snapshot. Each collection is replaced only when the
    /// remote one is non-empty, so a pull that races the first push cannot
    /// wipe local state.
    pub fn merge_remote(&mut self, remote: RemoteProject) {
        if !remote.chapters.is_empty() {
            self.chapters = remote.chapters;
        }
        if !remote.placeholders.is_empty() {
            self.placeholders = remote.placeholders;
        }
    }

    pub fn document_count(&self) -> usize {
        self.chapters.iter().map(|c| c.documents.len()).sum()
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = if self.is_template {
            format!("{} [template]", self.name)
        } else {
            self.name.clone()
        };
        writeln!(f, "{}", heading)?;
        writeln!(f, "{}", "=".repeat(heading.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        if let Some(sheet_id) = &self.sheet_id {
            writeln!(f, "Spreadsheet: {}", sheet_id)?;
        }
        if let Some(folder_id) = &self.folder_id {
            writeln!(f, "Folder: {}", folder_id)?;
        }
        writeln!(f, "Created: {}", self.created_at)?;
        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }

        if !self.chapters.is_empty() {
            writeln!(f, "\nChapters:")?;
            for (i, chapter) in self.chapters.iter().enumerate() {
                write!(f, "{}. {}", i + 1, chapter)?;
            }
        }

        if !self.placeholders.is_empty() {
            writeln!(f, "\nPlaceholders:")?;
            for placeholder in &self.placeholders {
                writeln!(f, "  - {}", placeholder)?;
            }
        }

        Ok(())
    }
}
