use archisheets_core::google::{DRIVE_API_URL, SHEETS_API_URL};
use archisheets_core::{ApiError, Endpoints, GoogleClient};
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// OAuth bearer token for the Google APIs
    #[serde(serialize_with = "serialize_masked")]
    pub token: ConfigValue<Option<String>>,
    /// Spreadsheet holding the PROJECTES index
    pub master_sheet_id: ConfigValue<Option<String>>,
    pub sheets_api_url: ConfigValue<String>,
    pub drive_api_url: ConfigValue<String>,
    /// Per-request timeout; unset means wait as long as the transport does
    pub request_timeout_secs: ConfigValue<Option<u64>>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Where edits are written, whether or not the file exists yet
    #[serde(skip)]
    path: PathBuf,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    token: Option<String>,
    master_sheet_id: Option<String>,
    sheets_api_url: Option<String>,
    drive_api_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

fn serialize_masked<S: Serializer>(
    token: &ConfigValue<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    ConfigValue::new(token.value.as_deref().map(mask_token), token.source.clone())
        .serialize(serializer)
}

/// Show only the ends of a secret.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut token = ConfigValue::new(None, ConfigSource::Default);
        let mut master_sheet_id = ConfigValue::new(None, ConfigSource::Default);
        let mut sheets_api_url = ConfigValue::new(SHEETS_API_URL.to_string(), ConfigSource::Default);
        let mut drive_api_url = ConfigValue::new(DRIVE_API_URL.to_string(), ConfigSource::Default);
        let mut request_timeout_secs = ConfigValue::new(None, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(value) = file_config.token.and_then(non_empty) {
                token = ConfigValue::new(Some(value), ConfigSource::File);
            }
            if let Some(value) = file_config.master_sheet_id.and_then(non_empty) {
                master_sheet_id = ConfigValue::new(Some(value), ConfigSource::File);
            }
            if let Some(url) = file_config.sheets_api_url {
                sheets_api_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(url) = file_config.drive_api_url {
                drive_api_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(secs) = file_config.request_timeout_secs {
                request_timeout_secs = ConfigValue::new(Some(secs), ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Some(value) = std::env::var("ARCHI_TOKEN").ok().and_then(non_empty) {
            token = ConfigValue::new(Some(value), ConfigSource::Environment);
        }
        if let Some(value) = std::env::var("ARCHI_MASTER_SHEET_ID").ok().and_then(non_empty) {
            master_sheet_id = ConfigValue::new(Some(value), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("ARCHI_SHEETS_API_URL") {
            sheets_api_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("ARCHI_DRIVE_API_URL") {
            drive_api_url = ConfigValue::new(url, ConfigSource::Environment);
        }

        Ok(Self {
            token,
            master_sheet_id,
            sheets_api_url,
            drive_api_url,
            request_timeout_secs,
            config_file,
            path,
        })
    }

    /// Path commands write to: `--config` if given, else the default location.
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(
            self.sheets_api_url.value.clone(),
            self.drive_api_url.value.clone(),
        )
    }

    /// HTTP client for the configured endpoints and timeout.
    pub fn google_client(&self) -> Result<GoogleClient, ApiError> {
        match self.request_timeout_secs.value {
            Some(secs) => GoogleClient::with_timeout(self.endpoints(), Duration::from_secs(secs)),
            None => Ok(GoogleClient::new(self.endpoints())),
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/archisheets/
    /// - macOS: ~/Library/Application Support/archisheets/
    /// - Windows: %APPDATA%/archisheets/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("archisheets")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Set (or with `None`, remove) a top-level key in the config file, keeping
/// every other entry. The file and its directory are created if needed.
pub fn set_file_value(path: &Path, key: &str, value: Option<&str>) -> Result<(), ConfigError> {
    let mut yaml: serde_yaml::Value = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?
    } else {
        serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
    };

    // an empty file parses as null
    if yaml.is_null() {
        yaml = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
    }
    let mapping = yaml
        .as_mapping_mut()
        .ok_or_else(|| ConfigError::InvalidFormat(path.to_path_buf()))?;

    let key = serde_yaml::Value::String(key.to_string());
    match value {
        Some(value) => {
            mapping.insert(key, serde_yaml::Value::String(value.to_string()));
        }
        None => {
            mapping.remove(&key);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e))?;
    }
    let contents = serde_yaml::to_string(&yaml)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteError(path.to_path_buf(), e))?;
    Ok(())
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    WriteError(PathBuf, std::io::Error),
    InvalidFormat(PathBuf),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::WriteError(path, e) => {
                write!(f, "Failed to write config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidFormat(path) => {
                write!(f, "Config file '{}' is not a mapping", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}
