//! Sheets API calls: value ranges and tab structure.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{send, send_json, ApiError, GoogleClient};

/// One row of cells rendered as text. Trailing empty cells are omitted by
/// the API, so rows can be shorter than the range they were read from.
pub type Row = Vec<String>;

const USER_ENTERED: [(&str, &str); 1] = [("valueInputOption", "USER_ENTERED")];

/// Build an A1 range for `tab`, quoting the tab name so titles with spaces,
/// punctuation or a leading digit parse.
pub fn a1_range(tab: &str, cells: &str) -> String {
    format!("'{}'!{}", tab.replace('\'', "''"), cells)
}

/// A block of values to write at `range`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueRangeWrite {
    pub range: String,
    pub values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn to_rows(values: Vec<Vec<Value>>) -> Vec<Row> {
    values
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

fn encode(range: &str) -> String {
    urlencoding::encode(range).into_owned()
}

impl GoogleClient {
    /// Read a single range.
    pub async fn get_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Row>, ApiError> {
        tracing::debug!("GET values {} {}", spreadsheet_id, range);
        let url = self.sheets_url(&format!("/{}/values/{}", spreadsheet_id, encode(range)));
        let body: ValueRange =
            send_json("read values", self.http.get(url).bearer_auth(token)).await?;
        Ok(to_rows(body.values))
    }

    /// Read several ranges in one request. The result has one entry per
    /// requested range, in request order.
    pub async fn batch_get_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Vec<Vec<Row>>, ApiError> {
        tracing::debug!("GET values:batchGet {} {:?}", spreadsheet_id, ranges);
        let url = self.sheets_url(&format!("/{}/values:batchGet", spreadsheet_id));
        let query: Vec<(&str, &str)> = ranges.iter().map(|r| ("ranges", r.as_str())).collect();
        let body: BatchGetResponse = send_json(
            "batch read values",
            self.http.get(url).bearer_auth(token).query(&query),
        )
        .await?;

        let mut result: Vec<Vec<Row>> = body
            .value_ranges
            .into_iter()
            .map(|vr| to_rows(vr.values))
            .collect();
        result.resize_with(ranges.len(), Vec::new);
        Ok(result)
    }

    /// Overwrite the cells starting at `range`.
    pub async fn update_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), ApiError> {
        tracing::debug!("PUT values {} {}", spreadsheet_id, range);
        let url = self.sheets_url(&format!("/{}/values/{}", spreadsheet_id, encode(range)));
        send(
            "write values",
            self.http
                .put(url)
                .bearer_auth(token)
                .query(&USER_ENTERED)
                .json(&json!({ "values": values })),
        )
        .await?;
        Ok(())
    }

    /// Append rows after the last row of data in `range`.
    pub async fn append_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), ApiError> {
        tracing::debug!("POST values:append {} {}", spreadsheet_id, range);
        let url = self.sheets_url(&format!(
            "/{}/values/{}:append",
            spreadsheet_id,
            encode(range)
        ));
        send(
            "append values",
            self.http
                .post(url)
                .bearer_auth(token)
                .query(&USER_ENTERED)
                .json(&json!({ "values": values })),
        )
        .await?;
        Ok(())
    }

    /// Write several ranges in one request.
    pub async fn batch_update_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        data: Vec<ValueRangeWrite>,
    ) -> Result<(), ApiError> {
        tracing::debug!(
            "POST values:batchUpdate {} ({} ranges)",
            spreadsheet_id,
            data.len()
        );
        let url = self.sheets_url(&format!("/{}/values:batchUpdate", spreadsheet_id));
        send(
            "batch write values",
            self.http.post(url).bearer_auth(token).json(&json!({
                "valueInputOption": "USER_ENTERED",
                "data": data,
            })),
        )
        .await?;
        Ok(())
    }

    /// Clear several ranges in one request.
    pub async fn batch_clear_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<(), ApiError> {
        tracing::debug!("POST values:batchClear {} {:?}", spreadsheet_id, ranges);
        let url = self.sheets_url(&format!("/{}/values:batchClear", spreadsheet_id));
        send(
            "batch clear values",
            self.http
                .post(url)
                .bearer_auth(token)
                .json(&json!({ "ranges": ranges })),
        )
        .await?;
        Ok(())
    }

    /// Titles of every tab in the spreadsheet, in tab order.
    pub async fn sheet_titles(
        &self,
        token: &str,
        spreadsheet_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        tracing::debug!("GET spreadsheet {} tabs", spreadsheet_id);
        let url = self.sheets_url(&format!("/{}", spreadsheet_id));
        let body: SpreadsheetMeta = send_json(
            "list tabs",
            self.http
                .get(url)
                .bearer_auth(token)
                .query(&[("fields", "sheets.properties.title")]),
        )
        .await?;
        Ok(body.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// Add tabs in a single batch. The API rejects the whole batch if any
    /// title already exists.
    pub async fn add_sheets(
        &self,
        token: &str,
        spreadsheet_id: &str,
        titles: &[String],
    ) -> Result<(), ApiError> {
        tracing::debug!("POST batchUpdate {} addSheet {:?}", spreadsheet_id, titles);
        let requests: Vec<Value> = titles
            .iter()
            .map(|title| json!({ "addSheet": { "properties": { "title": title } } }))
            .collect();
        let url = self.sheets_url(&format!("/{}:batchUpdate", spreadsheet_id));
        send(
            "add tabs",
            self.http
                .post(url)
                .bearer_auth(token)
                .json(&json!({ "requests": requests })),
        )
        .await?;
        Ok(())
    }

    /// Create a spreadsheet with the given tabs and return its id.
    pub async fn create_spreadsheet(
        &self,
        token: &str,
        title: &str,
        tabs: &[&str],
    ) -> Result<String, ApiError> {
        tracing::debug!("POST spreadsheet '{}' with tabs {:?}", title, tabs);
        let sheets: Vec<Value> = tabs
            .iter()
            .map(|tab| json!({ "properties": { "title": tab } }))
            .collect();
        let body: CreatedSpreadsheet = send_json(
            "create spreadsheet",
            self.http.post(self.sheets_url("")).bearer_auth(token).json(&json!({
                "properties": { "title": title },
                "sheets": sheets,
            })),
        )
        .await?;
        Ok(body.spreadsheet_id)
    }
}
