use std::path::{Path, PathBuf};

use regex_lite::Regex;

use super::schema::{BookmarksFile, ServicesFile};
use super::SourceError;

/// Loads and parses the services catalog file.
pub struct ServiceLoader {
    path: PathBuf,
}

impl ServiceLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<ServicesFile, SourceError> {
        let data = read_and_strip(&self.path)?;
        serde_yaml::from_str(&data).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

/// Loads and parses the bookmarks catalog file.
pub struct BookmarkLoader {
    path: PathBuf,
}

impl BookmarkLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<BookmarksFile, SourceError> {
        let data = read_and_strip(&self.path)?;
        serde_yaml::from_str(&data).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

fn read_and_strip(path: &Path) -> Result<String, SourceError> {
    let data = std::fs::read_to_string(path).map_err(|e| SourceError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(strip_template_placeholders(&data))
}

/// Replace dashboard templating placeholders (`{{…}}`) with empty strings
/// so the file parses as plain YAML.
fn strip_template_placeholders(data: &str) -> String {
    let re = Regex::new(r"\{\{[^}]+\}\}").unwrap();
    re.replace_all(data, "\"\"").into_owned()
}
