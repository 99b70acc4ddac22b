use serde_json::{json, Value};

use super::{cell, is_blank};
use crate::google::Row;
use crate::models::Project;

/// Build a project summary from a `PROJECTES` row. Chapters and placeholders
/// stay empty until the project is pulled. Blank rows yield `None`.
pub fn project_from_master_row(row: &Row) -> Option<Project> {
    if is_blank(row) {
        return None;
    }

    let sheet_id = cell(row, 2).trim();
    Some(Project {
        id: cell(row, 0).to_string(),
        name: cell(row, 1).to_string(),
        description: String::new(),
        is_template: cell(row, 4) == "TRUE",
        created_at: cell(row, 3).to_string(),
        sheet_id: (!sheet_id.is_empty()).then(|| sheet_id.to_string()),
        folder_id: None,
        chapters: Vec::new(),
        placeholders: Vec::new(),
    })
}

/// The `PROJECTES` row for a project.
pub fn master_row(project: &Project) -> Vec<Value> {
    vec![
        json!(project.id),
        json!(project.name),
        json!(project.sheet_id.as_deref().unwrap_or("")),
        json!(project.created_at),
        json!(project.is_template),
    ]
}
