//! Creating a new project: Drive folder, dedicated spreadsheet, optional deep
//! copy of a template's documents, master registration and first push.

use thiserror::Error;

use crate::google::{ApiError, GoogleClient};
use crate::models::{timestamp_now, Chapter, DriveDocument, ModelError, Project};
use crate::schema::{spreadsheet_title, CONFIG_TAB, STRUCTURE_TAB};
use crate::sync::{push, register_project, SyncError};

/// Errors that abort provisioning. Nothing created before the failing step
/// is rolled back.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Project name cannot be empty")]
    EmptyName,

    #[error("Template cannot be copied: {0}")]
    InvalidTemplate(#[source] ModelError),

    #[error("Failed to create project folder: {0}")]
    CreateFolder(#[source] ApiError),

    #[error("Failed to create project spreadsheet: {0}")]
    CreateSpreadsheet(#[source] ApiError),

    #[error("Failed to move spreadsheet into project folder: {0}")]
    MoveSpreadsheet(#[source] ApiError),

    #[error("{0}")]
    Registration(#[source] SyncError),

    #[error("Initial push failed: {0}")]
    InitialPush(#[source] SyncError),
}

/// Provision a new project next to the master spreadsheet, optionally
/// cloning `template`'s structure, placeholders and documents.
pub async fn create_project_from_template(
    client: &GoogleClient,
    token: &str,
    master_id: &str,
    name: &str,
    template: Option<&Project>,
) -> Result<Project, ProvisionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProvisionError::EmptyName);
    }
    if let Some(template) = template {
        template
            .check_tabs()
            .map_err(ProvisionError::InvalidTemplate)?;
    }

    let parent = match client.file_parent(token, master_id).await {
        Ok(parent) => parent,
        Err(e) => {
            tracing::warn!("Could not resolve master folder, using Drive root: {}", e);
            None
        }
    };

    let folder_id = client
        .create_folder(token, name, parent.as_deref())
        .await
        .map_err(ProvisionError::CreateFolder)?;
    let sheet_id = client
        .create_spreadsheet(token, &spreadsheet_title(name), &[CONFIG_TAB, STRUCTURE_TAB])
        .await
        .map_err(ProvisionError::CreateSpreadsheet)?;
    client
        .move_to_folder(token, &sheet_id, &folder_id)
        .await
        .map_err(ProvisionError::MoveSpreadsheet)?;
    tracing::debug!("Created folder {} and spreadsheet {}", folder_id, sheet_id);

    let chapters = match template {
        Some(template) => clone_chapters(client, token, name, &folder_id, &template.chapters).await,
        None => Vec::new(),
    };

    let project = Project {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: template.map(|t| t.description.clone()).unwrap_or_default(),
        is_template: false,
        created_at: timestamp_now(),
        sheet_id: Some(sheet_id),
        folder_id: Some(folder_id),
        chapters,
        placeholders: template.map(|t| t.placeholders.clone()).unwrap_or_default(),
    };

    register_project(client, token, master_id, &project)
        .await
        .map_err(ProvisionError::Registration)?;
    push(client, token, &project)
        .await
        .map_err(ProvisionError::InitialPush)?;

    tracing::info!(
        "Provisioned project '{}' ({} chapters, {} documents)",
        project.name,
        project.chapters.len(),
        project.document_count()
    );
    Ok(project)
}

async fn clone_chapters(
    client: &GoogleClient,
    token: &str,
    project_name: &str,
    folder_id: &str,
    chapters: &[Chapter],
) -> Vec<Chapter> {
    let mut cloned = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let mut documents = Vec::with_capacity(chapter.documents.len());
        for doc in &chapter.documents {
            documents.push(clone_document(client, token, project_name, folder_id, doc).await);
        }
        cloned.push(chapter.copy_with_documents(documents));
    }
    cloned
}

/// Copy one template document into the project folder. References without a
/// Drive file id, and copies that fail, keep the original URL.
async fn clone_document(
    client: &GoogleClient,
    token: &str,
    project_name: &str,
    folder_id: &str,
    doc: &DriveDocument,
) -> DriveDocument {
    let Some(file_id) = doc.file_id() else {
        tracing::debug!("No Drive file id in '{}', keeping reference", doc.url);
        return doc.duplicate();
    };

    let copy_name = format!("{} - {}", project_name, doc.title);
    match client.copy_file(token, file_id, &copy_name, folder_id).await {
        Ok(new_id) => doc.relinked(file_id, &new_id),
        Err(e) => {
            tracing::warn!("Copy of '{}' failed, keeping original: {}", doc.title, e);
            doc.duplicate()
        }
    }
}
