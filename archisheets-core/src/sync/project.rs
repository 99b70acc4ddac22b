use super::SyncError;
use crate::google::GoogleClient;
use crate::models::{Chapter, Project, RemoteProject};
use crate::schema::{
    chapter_read_range, config_read_range, documents_from_rows, missing_tabs,
    placeholders_from_rows, project_writes, required_tabs, structure_from_rows,
    structure_read_range,
};

/// Read a project's placeholders and chapters from its spreadsheet.
///
/// Returns `None` when the spreadsheet cannot be read, so the caller keeps
/// whatever it has locally. A chapter tab listed in the structure but
/// missing from the spreadsheet reads as an empty chapter.
pub async fn pull(client: &GoogleClient, token: &str, sheet_id: &str) -> Option<RemoteProject> {
    let ranges = [config_read_range(), structure_read_range()];
    let mut blocks = match client.batch_get_values(token, sheet_id, &ranges).await {
        Ok(blocks) => blocks.into_iter(),
        Err(e) => {
            tracing::warn!("Pull of {} failed: {}", sheet_id, e);
            return None;
        }
    };
    let config_rows = blocks.next().unwrap_or_default();
    let structure_rows = blocks.next().unwrap_or_default();

    let placeholders = placeholders_from_rows(&config_rows);
    let mut chapters = Vec::new();
    for entry in structure_from_rows(&structure_rows) {
        let chapter = Chapter::from_remote(entry.title, entry.tab_name, Vec::new());
        let documents = match client
            .get_values(token, sheet_id, &chapter_read_range(chapter.sheet_tab_name()))
            .await
        {
            Ok(rows) => documents_from_rows(&rows),
            Err(e) if e.is_not_found() => {
                tracing::debug!("Chapter tab {} missing, reading as empty", chapter.sheet_tab_name());
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Pull of {} failed reading tab {}: {}",
                    sheet_id,
                    chapter.sheet_tab_name(),
                    e
                );
                return None;
            }
        };
        chapters.push(chapter.with_documents(documents));
    }

    tracing::debug!(
        "Pulled {}: {} placeholders, {} chapters",
        sheet_id,
        placeholders.len(),
        chapters.len()
    );
    Some(RemoteProject {
        chapters,
        placeholders,
    })
}

/// Write the full project state to its spreadsheet.
///
/// Missing tabs are created in one batch, previous contents of every
/// written range are cleared, then all tabs are written in one batch. A
/// project without a spreadsheet is a no-op. A project whose chapters do not
/// each map to their own tab is refused before anything is sent.
pub async fn push(client: &GoogleClient, token: &str, project: &Project) -> Result<(), SyncError> {
    let Some(sheet_id) = project.sheet_id.as_deref() else {
        tracing::debug!("Project {} has no spreadsheet, skipping push", project.id);
        return Ok(());
    };
    project.check_tabs().map_err(SyncError::InvalidProject)?;

    let existing = client
        .sheet_titles(token, sheet_id)
        .await
        .map_err(SyncError::ListTabs)?;
    let missing = missing_tabs(&required_tabs(project), &existing);
    if !missing.is_empty() {
        tracing::debug!("Adding tabs {:?} to {}", missing, sheet_id);
        client
            .add_sheets(token, sheet_id, &missing)
            .await
            .map_err(|source| SyncError::CreateTabs {
                tabs: missing.clone(),
                source,
            })?;
    }

    let writes = project_writes(project);
    let ranges: Vec<String> = writes.iter().map(|w| w.range.clone()).collect();
    client
        .batch_clear_values(token, sheet_id, &ranges)
        .await
        .map_err(SyncError::Clear)?;
    client
        .batch_update_values(token, sheet_id, writes)
        .await
        .map_err(SyncError::Write)?;

    tracing::info!(
        "Pushed '{}' to {} ({} chapters, {} documents)",
        project.name,
        sheet_id,
        project.chapters.len(),
        project.document_count()
    );
    Ok(())
}
