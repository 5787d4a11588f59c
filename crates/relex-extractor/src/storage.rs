//! Dictionary storage backends
//!
//! Dictionaries live either on the local filesystem or on HDFS, reached
//! through the WebHDFS REST gateway. Both backends list the files of a
//! folder and open them for line-oriented reading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use relex_core::{RelexError, Result};

/// Source of dictionary files
pub trait DictionaryStorage {
    /// Paths of the files in `folder` whose file name passes `accept`,
    /// sorted lexicographically
    fn list(&self, folder: &str, accept: &dyn Fn(&str) -> bool) -> Result<Vec<String>>;

    /// Open `path` for reading; the reader is closed when dropped
    fn open(&self, path: &str) -> Result<Box<dyn BufRead>>;

    fn name(&self) -> &str;
}

// ============================================================================
// Local filesystem
// ============================================================================

/// Non-recursive listing of a local folder, hidden files excluded
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl DictionaryStorage for LocalStorage {
    fn list(&self, folder: &str, accept: &dyn Fn(&str) -> bool) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(folder).map_err(|e| RelexError::io(folder, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| RelexError::io(folder, e))?.path();
            if !path.is_file() {
                continue;
            }

            // hidden files (e.g. `._genes.dic` resource forks) are never dictionaries
            let accepted = path
                .file_name()
                .map(|name| name.to_string_lossy())
                .map(|name| !name.starts_with('.') && accept(&*name))
                .unwrap_or(false);
            if accepted {
                paths.push(path.to_string_lossy().into_owned());
            }
        }

        paths.sort();
        Ok(paths)
    }

    fn open(&self, path: &str) -> Result<Box<dyn BufRead>> {
        let file = File::open(path).map_err(|e| RelexError::io(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn name(&self) -> &str {
        "local"
    }
}

// ============================================================================
// WebHDFS
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListStatusResponse {
    #[serde(rename = "FileStatuses")]
    file_statuses: FileStatuses,
}

#[derive(Debug, Deserialize)]
struct FileStatuses {
    #[serde(rename = "FileStatus", default)]
    file_status: Vec<HdfsFileStatus>,
}

/// Entry of a WebHDFS `LISTSTATUS` answer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HdfsFileStatus {
    #[serde(rename = "pathSuffix")]
    pub path_suffix: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

impl HdfsFileStatus {
    pub fn is_directory(&self) -> bool {
        self.file_type == "DIRECTORY"
    }
}

pub(crate) fn parse_list_status(body: &str) -> Result<Vec<HdfsFileStatus>> {
    let response: ListStatusResponse = serde_json::from_str(body)
        .map_err(|e| RelexError::Storage(format!("invalid LISTSTATUS response: {e}")))?;
    Ok(response.file_statuses.file_status)
}

fn join_hdfs_path(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Depth-first walk below `folder`, `list_status` answering one directory
/// at a time. Returned paths are sorted.
pub(crate) fn walk<F>(
    folder: &str,
    accept: &dyn Fn(&str) -> bool,
    mut list_status: F,
) -> Result<Vec<String>>
where
    F: FnMut(&str) -> Result<Vec<HdfsFileStatus>>,
{
    let mut paths = Vec::new();
    let mut pending = vec![folder.to_string()];

    while let Some(dir) = pending.pop() {
        for status in list_status(&dir)? {
            let path = join_hdfs_path(&dir, &status.path_suffix);
            if status.is_directory() {
                pending.push(path);
            } else if accept(&status.path_suffix) {
                paths.push(path);
            }
        }
    }

    paths.sort();
    Ok(paths)
}

/// HDFS access over the WebHDFS REST API (`/webhdfs/v1`)
#[derive(Debug, Clone)]
pub struct WebHdfsStorage {
    base_url: String,
    user: Option<String>,
    client: reqwest::blocking::Client,
}

impl WebHdfsStorage {
    pub fn new(base_url: impl Into<String>, user: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RelexError::Storage(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            user,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// REST endpoint of an HDFS path, without query parameters
    pub fn endpoint(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        format!("{}/webhdfs/v1{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, path: &str, op: &str) -> Result<reqwest::blocking::Response> {
        let mut query = vec![("op", op.to_string())];
        if let Some(user) = &self.user {
            query.push(("user.name", user.clone()));
        }

        let response = self
            .client
            .get(self.endpoint(path))
            .query(&query)
            .send()
            .map_err(|e| RelexError::Storage(format!("{op} {path} failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RelexError::NotFound(format!("{path} (WebHDFS {op})")));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RelexError::Storage(format!(
                "{op} {path} returned {status}: {body}"
            )));
        }

        Ok(response)
    }

    fn list_status(&self, path: &str) -> Result<Vec<HdfsFileStatus>> {
        let body = self
            .request(path, "LISTSTATUS")?
            .text()
            .map_err(|e| RelexError::Storage(format!("LISTSTATUS {path} body: {e}")))?;
        parse_list_status(&body)
    }
}

impl DictionaryStorage for WebHdfsStorage {
    /// Walks `folder` recursively
    fn list(&self, folder: &str, accept: &dyn Fn(&str) -> bool) -> Result<Vec<String>> {
        walk(folder, accept, |dir| self.list_status(dir))
    }

    fn open(&self, path: &str) -> Result<Box<dyn BufRead>> {
        let response = self.request(path, "OPEN")?;
        Ok(Box::new(BufReader::new(response)))
    }

    fn name(&self) -> &str {
        "webhdfs"
    }
}

// ============================================================================
// Backend selection
// ============================================================================

/// Storage chosen for a dictionary folder
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local(LocalStorage),
    WebHdfs(WebHdfsStorage),
}

impl StorageBackend {
    /// WebHDFS when a URL is given (falling back to `HDFS_URL` and
    /// `HDFS_USER`), the local filesystem otherwise
    pub fn connect(url: Option<&str>, user: Option<&str>, timeout_secs: u64) -> Result<Self> {
        let url = url
            .map(str::to_string)
            .or_else(|| std::env::var("HDFS_URL").ok());
        let user = user
            .map(str::to_string)
            .or_else(|| std::env::var("HDFS_USER").ok());

        Self::select(url, user, timeout_secs)
    }

    fn select(url: Option<String>, user: Option<String>, timeout_secs: u64) -> Result<Self> {
        match url.filter(|u| !u.trim().is_empty()) {
            Some(url) => {
                tracing::debug!("Using WebHDFS storage at {}", url);
                Ok(Self::WebHdfs(WebHdfsStorage::new(url, user, timeout_secs)?))
            }
            None => Ok(Self::Local(LocalStorage)),
        }
    }

    fn inner(&self) -> &dyn DictionaryStorage {
        match self {
            Self::Local(storage) => storage,
            Self::WebHdfs(storage) => storage,
        }
    }
}

impl DictionaryStorage for StorageBackend {
    fn list(&self, folder: &str, accept: &dyn Fn(&str) -> bool) -> Result<Vec<String>> {
        self.inner().list(folder, accept)
    }

    fn open(&self, path: &str) -> Result<Box<dyn BufRead>> {
        self.inner().open(path)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// Base name of `path` with its last extension removed
pub fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
