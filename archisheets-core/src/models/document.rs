use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// Minimum length of the id token embedded in a Drive/Docs/Sheets URL.
pub const FILE_ID_MIN_LEN: usize = 25;

static FILE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]{25,}").expect("file id pattern is valid"));

/// Kind of file a document points at.
///
/// Only `GoogleDoc` and `GoogleSheet` can be recovered from a URL; `Pdf` and
/// `Other` are set locally and read back as `GoogleDoc` after a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "DOC")]
    GoogleDoc,
    #[serde(rename = "SHEET")]
    GoogleSheet,
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "OTHER")]
    Other,
}

impl DocType {
    /// Classify a document URL. Anything that is not a spreadsheet link is
    /// treated as a Google Doc.
    pub fn classify(url: &str) -> Self {
        if url.contains("spreadsheets") {
            DocType::GoogleSheet
        } else {
            DocType::GoogleDoc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::GoogleDoc => "DOC",
            DocType::GoogleSheet => "SHEET",
            DocType::Pdf => "PDF",
            DocType::Other => "OTHER",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extract the Drive file id from a URL: the first run of at least 25 id
/// characters. Returns `None` for links that are not Drive files.
pub fn extract_file_id(url: &str) -> Option<&str> {
    FILE_ID_RE.find(url).map(|m| m.as_str())
}

/// A reference to a file stored in Drive (or an external link).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveDocument {
    /// Local id, regenerated on every remote read
    pub id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub doc_type: DocType,
}

impl DriveDocument {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            doc_type: DocType::classify(&url),
            url,
        }
    }

    /// Override the classified type (PDF and OTHER are only known locally).
    pub fn with_type(mut self, doc_type: DocType) -> Self {
        self.doc_type = doc_type;
        self
    }

    pub fn file_id(&self) -> Option<&str> {
        extract_file_id(&self.url)
    }

    /// Same document pointing at another file: the id token in the URL is
    /// replaced and a fresh local id assigned.
    pub fn relinked(&self, old_id: &str, new_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            url: self.url.replacen(old_id, new_id, 1),
            doc_type: self.doc_type,
        }
    }

    /// Copy of the reference with a fresh local id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

impl fmt::Display for DriveDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} <{}>", self.doc_type, self.title, self.url)
    }
}
