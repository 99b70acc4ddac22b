//! Drive primitives used when provisioning projects: parent lookup, folder
//! creation, moving and copying files.

use serde::Deserialize;
use serde_json::json;

use super::{send, send_json, ApiError, GoogleClient};

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Deserialize)]
struct FileParents {
    #[serde(default)]
    parents: Vec<String>,
}

#[derive(Deserialize)]
struct FileId {
    id: String,
}

impl GoogleClient {
    /// First parent folder of a file, or `None` for files at the Drive root
    /// that report no parent.
    pub async fn file_parent(&self, token: &str, file_id: &str) -> Result<Option<String>, ApiError> {
        tracing::debug!("GET file {} parents", file_id);
        let url = self.drive_url(&format!("/files/{}", file_id));
        let body: FileParents = send_json(
            "read file parents",
            self.http
                .get(url)
                .bearer_auth(token)
                .query(&[("fields", "parents")]),
        )
        .await?;
        Ok(body.parents.into_iter().next())
    }

    /// Create a folder under `parent_id` (or the Drive root) and return its id.
    pub async fn create_folder(
        &self,
        token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, ApiError> {
        tracing::debug!("POST folder '{}' under {:?}", name, parent_id);
        let parents: Vec<&str> = parent_id.into_iter().collect();
        let body: FileId = send_json(
            "create folder",
            self.http
                .post(self.drive_url("/files"))
                .bearer_auth(token)
                .query(&[("fields", "id")])
                .json(&json!({
                    "name": name,
                    "mimeType": FOLDER_MIME_TYPE,
                    "parents": parents,
                })),
        )
        .await?;
        Ok(body.id)
    }

    /// Move a file into `folder_id`, detaching it from its current parent.
    pub async fn move_to_folder(
        &self,
        token: &str,
        file_id: &str,
        folder_id: &str,
    ) -> Result<(), ApiError> {
        let current_parent = self.file_parent(token, file_id).await?;
        tracing::debug!(
            "PATCH file {} from {:?} to {}",
            file_id,
            current_parent,
            folder_id
        );

        let mut query = vec![("addParents", folder_id)];
        if let Some(parent) = current_parent.as_deref() {
            query.push(("removeParents", parent));
        }

        let url = self.drive_url(&format!("/files/{}", file_id));
        send(
            "move file",
            self.http
                .patch(url)
                .bearer_auth(token)
                .query(&query)
                .json(&json!({})),
        )
        .await?;
        Ok(())
    }

    /// Copy a file into `folder_id` under a new name and return the copy's id.
    pub async fn copy_file(
        &self,
        token: &str,
        file_id: &str,
        new_name: &str,
        folder_id: &str,
    ) -> Result<String, ApiError> {
        tracing::debug!("POST copy of {} as '{}' into {}", file_id, new_name, folder_id);
        let url = self.drive_url(&format!("/files/{}/copy", file_id));
        let body: FileId = send_json(
            "copy file",
            self.http
                .post(url)
                .bearer_auth(token)
                .query(&[("fields", "id")])
                .json(&json!({
                    "name": new_name,
                    "parents": [folder_id],
                })),
        )
        .await?;
        Ok(body.id)
    }
}
