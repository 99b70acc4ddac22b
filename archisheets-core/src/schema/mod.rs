//! Fixed spreadsheet layout shared with every earlier version of the app.
//!
//! The tab names and header rows below are literal and unversioned: a
//! spreadsheet written by any release must stay readable by any other.
//!
//! # Layout
//!
//! Master spreadsheet:
//! - `PROJECTES`: `[ID, NOM, SHEET_ID, CREAT_EL, ES_PLANTILLA]`, one row per project
//!
//! Project spreadsheet:
//! - `CONFIG`: `[CLAU, VALOR, DESCRIPCIO]`, one row per placeholder
//! - `ESTRUCTURA`: `[TITOL, PESTANYA, DOCS]`, one row per chapter, in order
//! - one tab per chapter: `[NOM DOCUMENT, URL DRIVE]`, one row per document

mod master;
mod project;

pub use master::{master_row, project_from_master_row};
pub use project::{
    documents_from_rows, missing_tabs, placeholders_from_rows, project_writes, required_tabs,
    structure_from_rows, StructureEntry,
};

use crate::google::{a1_range, Row};

pub const MASTER_TAB: &str = "PROJECTES";
pub const CONFIG_TAB: &str = "CONFIG";
pub const STRUCTURE_TAB: &str = "ESTRUCTURA";

pub const MASTER_HEADER: [&str; 5] = ["ID", "NOM", "SHEET_ID", "CREAT_EL", "ES_PLANTILLA"];
pub const CONFIG_HEADER: [&str; 3] = ["CLAU", "VALOR", "DESCRIPCIO"];
pub const STRUCTURE_HEADER: [&str; 3] = ["TITOL", "PESTANYA", "DOCS"];
pub const CHAPTER_HEADER: [&str; 2] = ["NOM DOCUMENT", "URL DRIVE"];

/// Title given to newly created project spreadsheets.
pub fn spreadsheet_title(project_name: &str) -> String {
    format!("ARCHI - {}", project_name)
}

pub fn master_data_range() -> String {
    a1_range(MASTER_TAB, "A2:E")
}

pub fn master_header_range() -> String {
    a1_range(MASTER_TAB, "A1:E1")
}

pub fn master_append_range() -> String {
    a1_range(MASTER_TAB, "A:E")
}

pub fn config_read_range() -> String {
    a1_range(CONFIG_TAB, "A2:C")
}

pub fn structure_read_range() -> String {
    a1_range(STRUCTURE_TAB, "A2:C")
}

/// Chapter tabs are read three columns wide; the third one is tolerated
/// and ignored.
pub fn chapter_read_range(tab: &str) -> String {
    a1_range(tab, "A2:C")
}

fn config_write_range() -> String {
    a1_range(CONFIG_TAB, "A1:C")
}

fn structure_write_range() -> String {
    a1_range(STRUCTURE_TAB, "A1:C")
}

fn chapter_write_range(tab: &str) -> String {
    a1_range(tab, "A1:B")
}

/// Cell `index` of a row, or `""` when the API trimmed it away.
fn cell(row: &Row, index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn is_blank(row: &Row) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
