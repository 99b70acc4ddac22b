//! In-process stand-in for the Sheets and Drive REST APIs, served with axum
//! on a random local port.
//!
//! It keeps spreadsheets as plain grids of text and mimics the answers the
//! real services give for the calls this crate makes, including the
//! `400 Unable to parse range` for missing tabs and the all-or-nothing
//! add-sheet batch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::google::{Endpoints, GoogleClient};

pub const TOKEN: &str = "test-token";

type Grid = Vec<Vec<String>>;

struct Tab {
    title: String,
    cells: Grid,
}

#[derive(Default)]
struct Spreadsheet {
    tabs: Vec<Tab>,
}

impl Spreadsheet {
    fn tab(&self, title: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.title == title)
    }

    fn tab_mut(&mut self, title: &str) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.title == title)
    }
}

struct File {
    name: String,
    parents: Vec<String>,
}

#[derive(Default)]
struct FakeState {
    spreadsheets: HashMap<String, Spreadsheet>,
    files: HashMap<String, File>,
    calls: Vec<String>,
    next_id: u64,
    delay: Option<Duration>,
    active: usize,
    max_active: usize,
}

impl FakeState {
    fn new_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{:0>24}", prefix, self.next_id)
    }
}

#[derive(Clone)]
pub struct FakeGoogle {
    state: Arc<Mutex<FakeState>>,
    base_url: String,
}

impl FakeGoogle {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let fake = FakeGoogle {
            state: Arc::new(Mutex::new(FakeState::default())),
            base_url: format!("http://127.0.0.1:{}", port),
        };

        let app = Router::new()
            .route("/v4/spreadsheets", post(create_spreadsheet))
            .route("/v4/spreadsheets/{*rest}", any(sheets_api))
            .route("/drive/v3/files", post(create_file))
            .route("/drive/v3/files/{*rest}", any(drive_api))
            .layer(middleware::from_fn_with_state(fake.clone(), track))
            .with_state(fake.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        fake
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(
            format!("{}/v4/spreadsheets", self.base_url),
            format!("{}/drive/v3", self.base_url),
        )
    }

    pub fn client(&self) -> GoogleClient {
        GoogleClient::new(self.endpoints())
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Add a spreadsheet (and its Drive file entry) with empty tabs.
    pub fn add_spreadsheet(&self, id: &str, tabs: &[&str], parent: Option<&str>) {
        let mut state = self.lock();
        state.spreadsheets.insert(
            id.to_string(),
            Spreadsheet {
                tabs: tabs
                    .iter()
                    .map(|t| Tab {
                        title: t.to_string(),
                        cells: Vec::new(),
                    })
                    .collect(),
            },
        );
        state.files.insert(
            id.to_string(),
            File {
                name: id.to_string(),
                parents: parent.into_iter().map(str::to_string).collect(),
            },
        );
    }

    pub fn add_file(&self, id: &str, name: &str, parent: Option<&str>) {
        self.lock().files.insert(
            id.to_string(),
            File {
                name: name.to_string(),
                parents: parent.into_iter().map(str::to_string).collect(),
            },
        );
    }

    /// Replace a tab's contents from row 1, creating the tab if needed.
    pub fn set_rows(&self, id: &str, tab: &str, rows: &[&[&str]]) {
        let mut state = self.lock();
        let sheet = state.spreadsheets.entry(id.to_string()).or_default();
        let cells: Grid = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        match sheet.tab_mut(tab) {
            Some(existing) => existing.cells = cells,
            None => sheet.tabs.push(Tab {
                title: tab.to_string(),
                cells,
            }),
        }
    }

    /// Full contents of a tab with trailing blanks trimmed.
    pub fn rows(&self, id: &str, tab: &str) -> Option<Grid> {
        let state = self.lock();
        let tab = state.spreadsheets.get(id)?.tab(tab)?;
        Some(trim_grid(tab.cells.clone()))
    }

    pub fn tabs(&self, id: &str) -> Vec<String> {
        self.lock()
            .spreadsheets
            .get(id)
            .map(|s| s.tabs.iter().map(|t| t.title.clone()).collect())
            .unwrap_or_default()
    }

    pub fn spreadsheet_ids(&self) -> Vec<String> {
        self.lock().spreadsheets.keys().cloned().collect()
    }

    /// Name and parents of a Drive file.
    pub fn file(&self, id: &str) -> Option<(String, Vec<String>)> {
        self.lock()
            .files
            .get(id)
            .map(|f| (f.name.clone(), f.parents.clone()))
    }

    /// Number of authorized calls with this method whose decoded path ends
    /// with `suffix`.
    pub fn count_calls(&self, method: &str, suffix: &str) -> usize {
        let prefix = format!("{} ", method);
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(&prefix) && c.ends_with(suffix))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.len()
    }

    /// Hold every request for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Highest number of requests that were being served at the same time.
    pub fn max_concurrent_requests(&self) -> usize {
        self.lock().max_active
    }
}

fn google_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "error": { "code": status.as_u16(), "message": message.into() } })),
    )
        .into_response()
}

fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

fn query_values(query: &str, key: &str) -> Vec<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(k, _)| *k == key)
        .map(|(_, v)| decode(&v.replace('+', " ")))
        .collect()
}

fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
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

fn value_grid(values: &Value) -> Grid {
    values
        .as_array()
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| cells.iter().map(cell_text).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}

fn trim_grid(mut grid: Grid) -> Grid {
    for row in grid.iter_mut() {
        while row.last().is_some_and(|c| c.is_empty()) {
            row.pop();
        }
    }
    while grid.last().is_some_and(|r| r.is_empty()) {
        grid.pop();
    }
    grid
}

/// Parsed A1 range: tab plus zero-based start row/column and optional last
/// column.
struct A1 {
    tab: String,
    start_row: usize,
    start_col: usize,
    end_col: Option<usize>,
}

fn parse_cell(cell: &str) -> Option<(usize, Option<usize>)> {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return None;
    }
    let col = letters
        .chars()
        .fold(0, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1))
        - 1;
    let digits = &cell[letters.len()..];
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse().ok()?)
    };
    Some((col, row))
}

fn parse_range(range: &str) -> Option<A1> {
    let (tab, cells) = range.rsplit_once('!')?;
    let tab = if tab.len() >= 2 && tab.starts_with('\'') && tab.ends_with('\'') {
        tab[1..tab.len() - 1].replace("''", "'")
    } else {
        tab.to_string()
    };
    let (start, end) = match cells.split_once(':') {
        Some((s, e)) => (s, Some(e)),
        None => (cells, None),
    };
    let (start_col, start_row) = parse_cell(start)?;
    let end_col = end.and_then(parse_cell).map(|(c, _)| c);
    Some(A1 {
        tab,
        start_row: start_row.unwrap_or(1).saturating_sub(1),
        start_col,
        end_col,
    })
}

fn read_cells(tab: &Tab, a1: &A1) -> Grid {
    let rows = tab
        .cells
        .iter()
        .skip(a1.start_row)
        .map(|row| {
            let end = a1.end_col.map(|e| e + 1).unwrap_or(row.len()).min(row.len());
            if a1.start_col < end {
                row[a1.start_col..end].to_vec()
            } else {
                Vec::new()
            }
        })
        .collect();
    trim_grid(rows)
}

fn write_cells(tab: &mut Tab, start_row: usize, start_col: usize, grid: &Grid) {
    for (i, row) in grid.iter().enumerate() {
        let r = start_row + i;
        if tab.cells.len() <= r {
            tab.cells.resize_with(r + 1, Vec::new);
        }
        for (j, value) in row.iter().enumerate() {
            let c = start_col + j;
            if tab.cells[r].len() <= c {
                tab.cells[r].resize(c + 1, String::new());
            }
            tab.cells[r][c] = value.clone();
        }
    }
}

fn clear_cells(tab: &mut Tab, a1: &A1) {
    for row in tab.cells.iter_mut().skip(a1.start_row) {
        let end = a1.end_col.map(|e| e + 1).unwrap_or(row.len()).min(row.len());
        for cell in row.iter_mut().take(end).skip(a1.start_col) {
            cell.clear();
        }
    }
}

fn values_response(range: &str, grid: Grid) -> Value {
    if grid.is_empty() {
        json!({ "range": range, "majorDimension": "ROWS" })
    } else {
        json!({ "range": range, "majorDimension": "ROWS", "values": grid })
    }
}

async fn track(State(fake): State<FakeGoogle>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        == Some(TOKEN);
    if !authorized {
        return google_error(
            StatusCode::UNAUTHORIZED,
            "Request had invalid authentication credentials.",
        );
    }

    let delay = {
        let mut state = fake.lock();
        state
            .calls
            .push(format!("{} {}", request.method(), decode(request.uri().path())));
        state.active += 1;
        state.max_active = state.max_active.max(state.active);
        state.delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let response = next.run(request).await;
    fake.lock().active -= 1;
    response
}

async fn create_spreadsheet(State(fake): State<FakeGoogle>, Json(body): Json<Value>) -> Response {
    let mut state = fake.lock();
    let id = state.new_id("sheet");
    let mut tabs: Vec<Tab> = body["sheets"]
        .as_array()
        .map(|sheets| {
            sheets
                .iter()
                .filter_map(|s| s["properties"]["title"].as_str())
                .map(|title| Tab {
                    title: title.to_string(),
                    cells: Vec::new(),
                })
                .collect()
        })
        .unwrap_or_default();
    if tabs.is_empty() {
        tabs.push(Tab {
            title: "Sheet1".to_string(),
            cells: Vec::new(),
        });
    }
    let name = body["properties"]["title"].as_str().unwrap_or("Untitled").to_string();

    state.spreadsheets.insert(id.clone(), Spreadsheet { tabs });
    state.files.insert(
        id.clone(),
        File {
            name,
            parents: Vec::new(),
        },
    );
    Json(json!({ "spreadsheetId": id })).into_response()
}

async fn sheets_api(
    State(fake): State<FakeGoogle>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let segments: Vec<String> = uri
        .path()
        .trim_start_matches("/v4/spreadsheets/")
        .split('/')
        .map(decode)
        .collect();
    let query = uri.query().unwrap_or("");
    let body = parse_body(&body);
    let mut state = fake.lock();

    match (&method, segments.as_slice()) {
        (&Method::GET, [id]) => match state.spreadsheets.get(id) {
            Some(sheet) => {
                let sheets: Vec<Value> = sheet
                    .tabs
                    .iter()
                    .map(|t| json!({ "properties": { "title": t.title } }))
                    .collect();
                Json(json!({ "sheets": sheets })).into_response()
            }
            None => google_error(StatusCode::NOT_FOUND, "Requested entity was not found."),
        },

        (&Method::POST, [target]) if target.ends_with(":batchUpdate") => {
            let id = target.trim_end_matches(":batchUpdate");
            let Some(sheet) = state.spreadsheets.get_mut(id) else {
                return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
            };
            let titles: Vec<String> = body["requests"]
                .as_array()
                .map(|reqs| {
                    reqs.iter()
                        .filter_map(|r| r["addSheet"]["properties"]["title"].as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            for (i, title) in titles.iter().enumerate() {
                if sheet.tab(title).is_some() || titles[..i].contains(title) {
                    return google_error(
                        StatusCode::BAD_REQUEST,
                        format!(
                            "Invalid requests[{}].addSheet: A sheet with the name \"{}\" already exists. Please enter another name.",
                            i, title
                        ),
                    );
                }
            }
            for title in &titles {
                sheet.tabs.push(Tab {
                    title: title.clone(),
                    cells: Vec::new(),
                });
            }
            Json(json!({ "spreadsheetId": id, "replies": [] })).into_response()
        }

        (&Method::GET, [id, op]) if op.as_str() == "values:batchGet" => {
            let Some(sheet) = state.spreadsheets.get(id) else {
                return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
            };
            let mut value_ranges = Vec::new();
            for range in query_values(query, "ranges") {
                let Some(a1) = parse_range(&range) else {
                    return google_error(
                        StatusCode::BAD_REQUEST,
                        format!("Unable to parse range: {}", range),
                    );
                };
                let Some(tab) = sheet.tab(&a1.tab) else {
                    return google_error(
                        StatusCode::BAD_REQUEST,
                        format!("Unable to parse range: {}", range),
                    );
                };
                value_ranges.push(values_response(&range, read_cells(tab, &a1)));
            }
            Json(json!({ "spreadsheetId": id, "valueRanges": value_ranges })).into_response()
        }

        (&Method::POST, [id, op])
            if op.as_str() == "values:batchUpdate" || op.as_str() == "values:batchClear" =>
        {
            let Some(sheet) = state.spreadsheets.get_mut(id) else {
                return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
            };
            let clearing = op.as_str() == "values:batchClear";
            let ranges: Vec<(String, Grid)> = if clearing {
                body["ranges"]
                    .as_array()
                    .map(|rs| {
                        rs.iter()
                            .filter_map(Value::as_str)
                            .map(|r| (r.to_string(), Vec::new()))
                            .collect()
                    })
                    .unwrap_or_default()
            } else {
                body["data"]
                    .as_array()
                    .map(|data| {
                        data.iter()
                            .map(|d| {
                                (
                                    d["range"].as_str().unwrap_or("").to_string(),
                                    value_grid(&d["values"]),
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            };

            let mut parsed = Vec::new();
            for (range, grid) in ranges {
                match parse_range(&range) {
                    Some(a1) if sheet.tab(&a1.tab).is_some() => parsed.push((a1, grid)),
                    _ => {
                        return google_error(
                            StatusCode::BAD_REQUEST,
                            format!("Unable to parse range: {}", range),
                        )
                    }
                }
            }
            for (a1, grid) in parsed {
                if let Some(tab) = sheet.tab_mut(&a1.tab) {
                    if clearing {
                        clear_cells(tab, &a1);
                    } else {
                        write_cells(tab, a1.start_row, a1.start_col, &grid);
                    }
                }
            }
            Json(json!({ "spreadsheetId": id })).into_response()
        }

        (&Method::GET, [id, values, range]) if values.as_str() == "values" => {
            let Some(sheet) = state.spreadsheets.get(id) else {
                return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
            };
            match parse_range(range).and_then(|a1| sheet.tab(&a1.tab).map(|tab| read_cells(tab, &a1))) {
                Some(grid) => Json(values_response(range, grid)).into_response(),
                None => google_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unable to parse range: {}", range),
                ),
            }
        }

        (&Method::PUT, [id, values, range]) if values.as_str() == "values" => {
            let Some(sheet) = state.spreadsheets.get_mut(id) else {
                return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
            };
            let grid = value_grid(&body["values"]);
            match parse_range(range) {
                Some(a1) => match sheet.tab_mut(&a1.tab) {
                    Some(tab) => {
                        write_cells(tab, a1.start_row, a1.start_col, &grid);
                        Json(json!({ "updatedRange": range })).into_response()
                    }
                    None => google_error(
                        StatusCode::BAD_REQUEST,
                        format!("Unable to parse range: {}", range),
                    ),
                },
                None => google_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unable to parse range: {}", range),
                ),
            }
        }

        (&Method::POST, [id, values, target])
            if values.as_str() == "values" && target.ends_with(":append") =>
        {
            let range = target.trim_end_matches(":append");
            let Some(sheet) = state.spreadsheets.get_mut(id) else {
                return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
            };
            let grid = value_grid(&body["values"]);
            let Some(a1) = parse_range(range) else {
                return google_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unable to parse range: {}", range),
                );
            };
            match sheet.tab_mut(&a1.tab) {
                Some(tab) => {
                    let next_row = trim_grid(tab.cells.clone()).len();
                    write_cells(tab, next_row, a1.start_col, &grid);
                    Json(json!({ "spreadsheetId": id })).into_response()
                }
                None => google_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unable to parse range: {}", range),
                ),
            }
        }

        _ => google_error(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn create_file(State(fake): State<FakeGoogle>, Json(body): Json<Value>) -> Response {
    let mut state = fake.lock();
    let id = state.new_id("folder");
    let parents = body["parents"]
        .as_array()
        .map(|ps| ps.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let name = body["name"].as_str().unwrap_or("").to_string();
    state.files.insert(id.clone(), File { name, parents });
    Json(json!({ "id": id })).into_response()
}

async fn drive_api(
    State(fake): State<FakeGoogle>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let segments: Vec<String> = uri
        .path()
        .trim_start_matches("/drive/v3/files/")
        .split('/')
        .map(decode)
        .collect();
    let query = uri.query().unwrap_or("");
    let body = parse_body(&body);
    let mut state = fake.lock();

    match (&method, segments.as_slice()) {
        (&Method::GET, [id]) => match state.files.get(id) {
            Some(file) if file.parents.is_empty() => Json(json!({})).into_response(),
            Some(file) => Json(json!({ "parents": file.parents })).into_response(),
            None => google_error(StatusCode::NOT_FOUND, format!("File not found: {}.", id)),
        },

        (&Method::PATCH, [id]) => {
            let Some(file) = state.files.get_mut(id) else {
                return google_error(StatusCode::NOT_FOUND, format!("File not found: {}.", id));
            };
            let removed = query_values(query, "removeParents");
            file.parents.retain(|p| !removed.contains(p));
            for parent in query_values(query, "addParents") {
                if !file.parents.contains(&parent) {
                    file.parents.push(parent);
                }
            }
            Json(json!({ "id": id })).into_response()
        }

        (&Method::POST, [id, copy]) if copy.as_str() == "copy" => {
            if !state.files.contains_key(id) {
                return google_error(StatusCode::NOT_FOUND, format!("File not found: {}.", id));
            }
            let new_id = state.new_id("copy");
            let parents = body["parents"]
                .as_array()
                .map(|ps| ps.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();
            let name = body["name"].as_str().unwrap_or("").to_string();
            state.files.insert(new_id.clone(), File { name, parents });
            Json(json!({ "id": new_id })).into_response()
        }

        _ => google_error(StatusCode::NOT_FOUND, "Not found"),
    }
}
