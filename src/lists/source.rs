use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading list data.
#[derive(Error, Debug)]
pub enum ListSourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("list source unavailable: {0}")]
    Unavailable(String),
}

/// Raw list data as stored by the list source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListData {
    #[serde(default)]
    pub cpf_permissive_list: Vec<String>,
    #[serde(default)]
    pub cpf_restrictive_list: Vec<String>,
    #[serde(default)]
    pub ip_restrictive_list: Vec<String>,
    #[serde(default)]
    pub device_restrictive_list: Vec<String>,
}

/// Bulk source of list data.
///
/// Loads are all-or-nothing: a source either returns complete data or an
/// error, never a partial result.
pub trait ListSource: Send + Sync {
    fn load(&self) -> Result<ListData, ListSourceError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// List source backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileListSource {
    path: PathBuf,
}

impl JsonFileListSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileListSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ListSource for JsonFileListSource {
    fn load(&self) -> Result<ListData, ListSourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| ListSourceError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// List source serving fixed data; used by tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct StaticListSource {
    data: ListData,
}

impl StaticListSource {
    pub fn new(data: ListData) -> Self {
        StaticListSource { data }
    }
}

impl ListSource for StaticListSource {
    fn load(&self) -> Result<ListData, ListSourceError> {
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
