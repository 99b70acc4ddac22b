use std::collections::HashSet;

use serde_json::{json, Value};

use super::{
    cell, chapter_write_range, config_write_range, is_blank, structure_write_range,
    CHAPTER_HEADER, CONFIG_HEADER, CONFIG_TAB, STRUCTURE_HEADER, STRUCTURE_TAB,
};
use crate::google::{Row, ValueRangeWrite};
use crate::models::{Chapter, DriveDocument, Placeholder, Project};

/// One row of the ESTRUCTURA tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureEntry {
    pub title: String,
    pub tab_name: String,
}

fn header(cells: &[&str]) -> Vec<Value> {
    cells.iter().map(|c| json!(c)).collect()
}

/// Placeholders from CONFIG data rows. Rows without a key are skipped and a
/// repeated key keeps its first occurrence.
pub fn placeholders_from_rows(rows: &[Row]) -> Vec<Placeholder> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| !cell(row, 0).trim().is_empty())
        .filter(|row| seen.insert(cell(row, 0).to_string()))
        .map(|row| Placeholder {
            key: cell(row, 0).to_string(),
            value: cell(row, 1).to_string(),
            description: cell(row, 2).to_string(),
        })
        .collect()
}

/// Chapter entries from ESTRUCTURA data rows, in sheet order. The DOCS
/// column is informational and ignored.
pub fn structure_from_rows(rows: &[Row]) -> Vec<StructureEntry> {
    rows.iter()
        .filter(|row| !cell(row, 0).trim().is_empty() || !cell(row, 1).trim().is_empty())
        .map(|row| StructureEntry {
            title: cell(row, 0).to_string(),
            tab_name: cell(row, 1).trim().to_string(),
        })
        .collect()
}

/// Documents from a chapter tab's data rows. The type is re-derived from the
/// URL, so PDF and OTHER read back as Google Docs.
pub fn documents_from_rows(rows: &[Row]) -> Vec<DriveDocument> {
    rows.iter()
        .filter(|row| !is_blank(row))
        .map(|row| DriveDocument::new(cell(row, 0), cell(row, 1)))
        .collect()
}

fn config_values(placeholders: &[Placeholder]) -> Vec<Vec<Value>> {
    std::iter::once(header(&CONFIG_HEADER))
        .chain(
            placeholders
                .iter()
                .map(|p| vec![json!(p.key), json!(p.value), json!(p.description)]),
        )
        .collect()
}

fn structure_values(chapters: &[Chapter]) -> Vec<Vec<Value>> {
    std::iter::once(header(&STRUCTURE_HEADER))
        .chain(chapters.iter().map(|c| {
            vec![
                json!(c.title),
                json!(c.sheet_tab_name()),
                json!(c.documents.len()),
            ]
        }))
        .collect()
}

fn chapter_values(chapter: &Chapter) -> Vec<Vec<Value>> {
    std::iter::once(header(&CHAPTER_HEADER))
        .chain(
            chapter
                .documents
                .iter()
                .map(|d| vec![json!(d.title), json!(d.url)]),
        )
        .collect()
}

/// Every value block a push writes: CONFIG, ESTRUCTURA and one block per
/// chapter, each starting with its header row.
pub fn project_writes(project: &Project) -> Vec<ValueRangeWrite> {
    let mut writes = vec![
        ValueRangeWrite {
            range: config_write_range(),
            values: config_values(&project.placeholders),
        },
        ValueRangeWrite {
            range: structure_write_range(),
            values: structure_values(&project.chapters),
        },
    ];
    writes.extend(project.chapters.iter().map(|chapter| ValueRangeWrite {
        range: chapter_write_range(chapter.sheet_tab_name()),
        values: chapter_values(chapter),
    }));
    writes
}

/// Tabs a project spreadsheet must have, in order and without repeats.
pub fn required_tabs(project: &Project) -> Vec<String> {
    let mut seen = HashSet::new();
    [CONFIG_TAB, STRUCTURE_TAB]
        .into_iter()
        .chain(project.chapters.iter().map(|c| c.sheet_tab_name()))
        .filter(|tab| seen.insert(*tab))
        .map(str::to_string)
        .collect()
}

/// Required tabs that do not exist yet. Adding an existing tab fails the
/// whole batch, so this must be exact.
pub fn missing_tabs(required: &[String], existing: &[String]) -> Vec<String> {
    let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
    required
        .iter()
        .filter(|tab| !existing.contains(tab.as_str()))
        .cloned()
        .collect()
}
