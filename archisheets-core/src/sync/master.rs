use serde_json::json;

use super::SyncError;
use crate::google::GoogleClient;
use crate::models::Project;
use crate::schema::{
    master_append_range, master_data_range, master_header_range, master_row,
    project_from_master_row, MASTER_HEADER, MASTER_TAB,
};

/// List every project in the master index.
///
/// A master spreadsheet without a `PROJECTES` tab is treated as new: the tab
/// and its header are created and the list is empty.
pub async fn fetch_master_projects(
    client: &GoogleClient,
    token: &str,
    master_id: &str,
) -> Result<Vec<Project>, SyncError> {
    match client
        .get_values(token, master_id, &master_data_range())
        .await
    {
        Ok(rows) => {
            let projects: Vec<Project> = rows.iter().filter_map(project_from_master_row).collect();
            tracing::debug!("Master index lists {} projects", projects.len());
            Ok(projects)
        }
        Err(e) if e.is_not_found() => {
            tracing::info!("Master index has no {} tab, creating it", MASTER_TAB);
            setup_master_sheet(client, token, master_id).await?;
            Ok(Vec::new())
        }
        Err(e) => Err(SyncError::MasterRead(e)),
    }
}

/// Add the `PROJECTES` tab and write its header row.
pub async fn setup_master_sheet(
    client: &GoogleClient,
    token: &str,
    master_id: &str,
) -> Result<(), SyncError> {
    client
        .add_sheets(token, master_id, &[MASTER_TAB.to_string()])
        .await
        .map_err(SyncError::MasterSetup)?;

    let header = MASTER_HEADER.iter().map(|c| json!(c)).collect();
    client
        .update_values(token, master_id, &master_header_range(), vec![header])
        .await
        .map_err(SyncError::MasterSetup)?;
    Ok(())
}

/// Append the project to the master index unless its spreadsheet (or id) is
/// already listed. Returns whether a row was appended.
pub async fn register_project(
    client: &GoogleClient,
    token: &str,
    master_id: &str,
    project: &Project,
) -> Result<bool, SyncError> {
    let listed = fetch_master_projects(client, token, master_id).await?;
    let already_listed = listed.iter().any(|p| {
        p.id == project.id || (project.sheet_id.is_some() && p.sheet_id == project.sheet_id)
    });
    if already_listed {
        tracing::debug!("Project {} already in master index", project.id);
        return Ok(false);
    }

    client
        .append_values(
            token,
            master_id,
            &master_append_range(),
            vec![master_row(project)],
        )
        .await
        .map_err(SyncError::Registration)?;
    tracing::info!("Registered project '{}' in master index", project.name);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGoogle, TOKEN};

    #[tokio::test]
    async fn test_fetch_creates_master_tab_on_first_use() {
        let fake = FakeGoogle::start().await;
        fake.add_spreadsheet("master", &["Sheet1"], None);

        let projects = fetch_master_projects(&fake.client(), TOKEN, "master")
            .await
            .unwrap();

        assert!(projects.is_empty());
        assert!(fake.tabs("master").contains(&MASTER_TAB.to_string()));
        assert_eq!(
            fake.rows("master", MASTER_TAB).unwrap(),
            vec![MASTER_HEADER.map(String::from).to_vec()]
        );
    }

    #[tokio::test]
    async fn test_fetch_parses_rows() {
        let fake = FakeGoogle::start().await;
        fake.set_rows(
            "master",
            MASTER_TAB,
            &[
                &MASTER_HEADER,
                &["1", "Casa", "sheet-a", "2024-01-01T00:00:00.000Z", "FALSE"],
                &[],
                &["2", "Plantilla", "sheet-b", "2024-02-01T00:00:00.000Z", "TRUE"],
            ],
        );

        let projects = fetch_master_projects(&fake.client(), TOKEN, "master")
            .await
            .unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "Casa");
        assert!(!projects[0].is_template);
        assert_eq!(projects[1].sheet_id.as_deref(), Some("sheet-b"));
        assert!(projects[1].is_template);
    }

    #[tokio::test]
    async fn test_fetch_propagates_auth_failure() {
        let fake = FakeGoogle::start().await;
        fake.add_spreadsheet("master", &[MASTER_TAB], None);

        let err = fetch_master_projects(&fake.client(), "expired", "master")
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::MasterRead(_)));
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_register_appends_once() {
        let fake = FakeGoogle::start().await;
        fake.add_spreadsheet("master", &["Sheet1"], None);
        let client = fake.client();
        let project = Project::new("Casa Vicens").with_sheet_id("sheet-1");

        assert!(register_project(&client, TOKEN, "master", &project)
            .await
            .unwrap());
        assert!(!register_project(&client, TOKEN, "master", &project)
            .await
            .unwrap());

        let rows = fake.rows("master", MASTER_TAB).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], "Casa Vicens");
        assert_eq!(rows[1][2], "sheet-1");
        assert_eq!(rows[1][4], "FALSE");
        assert_eq!(fake.count_calls("POST", ":append"), 1);

        let listed = fetch_master_projects(&client, TOKEN, "master").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, project.id);
    }

    #[tokio::test]
    async fn test_register_skips_known_sheet_under_other_id() {
        let fake = FakeGoogle::start().await;
        fake.set_rows(
            "master",
            MASTER_TAB,
            &[&MASTER_HEADER, &["old-id", "Casa", "sheet-1", "", "FALSE"]],
        );

        let project = Project::new("Casa").with_sheet_id("sheet-1");
        let appended = register_project(&fake.client(), TOKEN, "master", &project)
            .await
            .unwrap();

        assert!(!appended);
        assert_eq!(fake.count_calls("POST", ":append"), 0);
    }
}
