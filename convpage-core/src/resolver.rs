use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ConvpageError, Result};

/// Maps opaque asset pointers and attachment ids to displayable URLs.
pub trait AssetResolver {
    fn resolve_asset(&self, pointer: &str) -> Option<String>;
    fn resolve_attachment(&self, attachment_id: &str) -> Option<String>;
}

/// Resolver that knows nothing; every asset renders as deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn resolve_asset(&self, _pointer: &str) -> Option<String> {
        None
    }

    fn resolve_attachment(&self, _attachment_id: &str) -> Option<String> {
        None
    }
}

/// Resolver backed by a `{pointer-or-id: file name}` JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMap {
    entries: HashMap<String, String>,
    base_url: Option<String>,
    uploads_dir: Option<String>,
}

impl AssetMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn from_json_str(path: &Path, raw: &str) -> Result<Self> {
        let entries = serde_json::from_str::<HashMap<String, String>>(raw).map_err(|source| {
            ConvpageError::InvalidJson {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConvpageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::from_json_str(path, &raw)?;
        tracing::info!(path = %path.display(), entries = map.len(), "loaded asset map");
        Ok(map)
    }

    /// Prefix joined in front of every mapped file name.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Attachments missing from the map resolve to `<uploads_dir>/<id>`.
    pub fn with_uploads_dir(mut self, uploads_dir: impl Into<String>) -> Self {
        self.uploads_dir = Some(uploads_dir.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let file = self.entries.get(key)?;
        Some(match &self.base_url {
            Some(base) => join_url(base, file),
            None => file.clone(),
        })
    }
}

impl AssetResolver for AssetMap {
    fn resolve_asset(&self, pointer: &str) -> Option<String> {
        self.lookup(pointer)
    }

    fn resolve_attachment(&self, attachment_id: &str) -> Option<String> {
        self.lookup(attachment_id).or_else(|| {
            self.uploads_dir
                .as_deref()
                .map(|dir| join_url(dir, attachment_id))
        })
    }
}

fn join_url(base: &str, file: &str) -> String {
    if base.is_empty() {
        return file.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), file.trim_start_matches('/'))
}
