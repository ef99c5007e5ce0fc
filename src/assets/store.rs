//! Asset storage backends.
//!
//! # Responsibilities
//! - Map a request path to a stored asset (`/` and `dir/` → `index.html`)
//! - Return the bytes together with a content type
//! - Report missing or unreadable assets as errors; the router decides the fallback
//!
//! # Design Decisions
//! - `AssetStore` is object safe so the server can hold `Arc<dyn AssetStore>`
//! - Paths containing `..` segments are rejected before touching the filesystem

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use thiserror::Error;

/// A stored asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub body: Bytes,
    pub content_type: String,
}

impl Asset {
    pub fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }

    pub fn is_html(&self) -> bool {
        self.content_type.starts_with("text/html")
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("invalid asset path: {0}")]
    InvalidPath(String),

    #[error("asset store error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only asset lookup.
pub trait AssetStore: Send + Sync {
    fn lookup<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Asset, AssetError>>;
}

/// Resolve a request path to the key of the asset that serves it.
///
/// `/` and paths ending in `/` serve their `index.html`; a last segment without
/// an extension is treated as a directory.
pub fn asset_key(path: &str) -> Result<String, AssetError> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.split('/').any(|segment| segment == "..") || trimmed.contains('\\') {
        return Err(AssetError::InvalidPath(path.to_string()));
    }

    if trimmed.is_empty() || trimmed.ends_with('/') {
        return Ok(format!("{trimmed}index.html"));
    }

    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if last.contains('.') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/index.html"))
    }
}

/// Content type for an asset key, by extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        _ => "application/octet-stream",
    }
}

/// Serves assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for FsAssetStore {
    fn lookup<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Asset, AssetError>> {
        Box::pin(async move {
            let key = asset_key(path)?;
            let file = self.root.join(&key);
            match tokio::fs::read(&file).await {
                Ok(bytes) => Ok(Asset::new(bytes, content_type_for(&key))),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(AssetError::NotFound(key))
                }
                Err(e) => Err(AssetError::Io(e)),
            }
        })
    }
}

/// Serves assets from memory. Keys are asset keys as produced by [`asset_key`].
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    assets: HashMap<String, Asset>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset under `key`, guessing the content type from its extension.
    pub fn with(mut self, key: &str, body: impl Into<Bytes>) -> Self {
        let key = key.trim_start_matches('/').to_string();
        let asset = Asset::new(body, content_type_for(&key));
        self.assets.insert(key, asset);
        self
    }
}

impl AssetStore for MemoryAssetStore {
    fn lookup<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Asset, AssetError>> {
        Box::pin(async move {
            let key = asset_key(path)?;
            self.assets
                .get(&key)
                .cloned()
                .ok_or(AssetError::NotFound(key))
        })
    }
}
