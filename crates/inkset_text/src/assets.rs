//! Image asset loading and memoization
//!
//! Highlight, background and list-marker images are referenced by a source
//! string. [`AssetLoader`] turns that string into bytes; [`AssetCache`]
//! parses them once and shares the result. Failed loads are logged and left
//! out of the cache so the next reference retries them.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use base64::Engine;
use rustc_hash::FxHashMap;

use crate::svg::SvgAsset;
use crate::{Result, TextError};

/// Fetches the raw bytes behind a source string.
pub trait AssetLoader: Send + Sync {
    fn load(&self, source: &str) -> Result<Vec<u8>>;
}

/// What a source string points at.
#[derive(Debug, Clone, PartialEq)]
enum AssetSource<'a> {
    /// `<svg ...>` markup written in place.
    Inline(&'a str),
    /// `data:[<mime>][;base64],<payload>`
    Data { payload: &'a str, base64: bool },
    File(PathBuf),
}

impl<'a> AssetSource<'a> {
    fn from_uri(uri: &'a str) -> Self {
        let trimmed = uri.trim_start();
        if trimmed.starts_with("<svg") || trimmed.starts_with("<?xml") {
            return Self::Inline(trimmed);
        }
        if let Some(rest) = uri.strip_prefix("data:") {
            let (header, payload) = rest.split_once(',').unwrap_or(("", rest));
            return Self::Data {
                payload,
                base64: header.ends_with(";base64"),
            };
        }
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        Self::File(PathBuf::from(path))
    }
}

/// Inline markup, `data:` URIs, `file://` URIs and plain paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoader;

impl AssetLoader for DefaultLoader {
    fn load(&self, source: &str) -> Result<Vec<u8>> {
        let fail = |reason: String| TextError::AssetLoad {
            source_id: abbreviate(source),
            reason,
        };
        match AssetSource::from_uri(source) {
            AssetSource::Inline(markup) => Ok(markup.as_bytes().to_vec()),
            AssetSource::Data {
                payload,
                base64: true,
            } => base64::engine::general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| fail(format!("invalid base64 payload: {}", e))),
            AssetSource::Data { payload, .. } => urlencoding::decode(payload)
                .map(|text| text.into_owned().into_bytes())
                .map_err(|e| fail(format!("invalid percent-encoding: {}", e))),
            AssetSource::File(path) => {
                std::fs::read(&path).map_err(|e| fail(format!("failed to read {:?}: {}", path, e)))
            }
        }
    }
}

/// Keeps log lines and errors short for inline sources.
fn abbreviate(source: &str) -> String {
    const LIMIT: usize = 48;
    match source.char_indices().nth(LIMIT) {
        Some((end, _)) => format!("{}...", &source[..end]),
        None => source.to_string(),
    }
}

/// Parsed assets keyed by source string.
pub struct AssetCache {
    loader: Box<dyn AssetLoader>,
    assets: RwLock<FxHashMap<String, Arc<SvgAsset>>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::with_loader(DefaultLoader)
    }

    pub fn with_loader(loader: impl AssetLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            assets: RwLock::new(FxHashMap::default()),
        }
    }

    /// Process-wide cache using [`DefaultLoader`].
    pub fn global() -> Arc<AssetCache> {
        static GLOBAL: OnceLock<Arc<AssetCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(AssetCache::new())).clone()
    }

    /// The cached asset, without loading.
    pub fn get(&self, source: &str) -> Option<Arc<SvgAsset>> {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
            .cloned()
    }

    pub fn insert(&self, source: impl Into<String>, asset: SvgAsset) -> Arc<SvgAsset> {
        let asset = Arc::new(asset);
        self.assets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.into(), Arc::clone(&asset));
        asset
    }

    /// Returns the cached asset or loads, parses and caches it.
    ///
    /// Concurrent misses may both load; the last writer wins, which is
    /// harmless because the key is the content identity.
    pub fn load(&self, source: &str) -> Result<Arc<SvgAsset>> {
        if let Some(hit) = self.get(source) {
            return Ok(hit);
        }
        let bytes = self.loader.load(source)?;
        let asset = SvgAsset::parse(&bytes).map_err(|e| TextError::AssetLoad {
            source_id: abbreviate(source),
            reason: e.to_string(),
        })?;
        tracing::debug!("cached asset {}", abbreviate(source));
        Ok(self.insert(source, asset))
    }

    /// Loads every source, logging failures. Returns how many failed.
    pub fn load_all<'a>(&self, sources: impl IntoIterator<Item = &'a str>) -> usize {
        let mut failed = 0;
        for source in sources {
            if let Err(e) = self.load(source) {
                tracing::warn!("{}", e);
                failed += 1;
            }
        }
        failed
    }

    pub fn len(&self) -> usize {
        self.assets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache").field("len", &self.len()).finish()
    }
}
