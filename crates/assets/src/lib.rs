//! Asset loading: an asynchronous loader capability, content-addressed
//! handles, and batch lifecycle callbacks.
//!
//! Assets are identified by a hash of their URI. The runtime consumes assets
//! by handle, never by raw path. Decoding is left to whoever owns the handle.
//!
//! # Invariants
//! - `on_start` and `on_load` fire exactly once per non-empty batch.
//! - A failed item never aborts its batch.

mod loader;
mod manager;

pub use loader::{FileLoader, Loader};
pub use manager::{BatchReport, LoadObserver, LoadingManager, ProgressLog};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Content-addressed asset handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn for_uri(uri: &str) -> Self {
        let digest = Sha256::digest(uri.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(bytes))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Broad category, from the URI's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Texture,
    Font,
    EnvironmentMap,
    Blob,
}

impl AssetKind {
    pub fn from_uri(uri: &str) -> Self {
        let lower = uri.to_ascii_lowercase();
        if lower.ends_with(".typeface.json") || lower.ends_with(".ttf") || lower.ends_with(".otf") {
            return Self::Font;
        }
        match lower.rsplit_once('.').map(|(_, ext)| ext) {
            Some("png" | "jpg" | "jpeg" | "webp" | "gif") => Self::Texture,
            Some("hdr" | "exr") => Self::EnvironmentMap,
            _ => Self::Blob,
        }
    }
}

/// Bytes of one loaded asset. Undecoded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAsset {
    pub id: AssetId,
    pub uri: String,
    pub kind: AssetKind,
    pub bytes: Vec<u8>,
}

impl LoadedAsset {
    pub fn new(uri: impl Into<String>, bytes: Vec<u8>) -> Self {
        let uri = uri.into();
        Self {
            id: AssetId::for_uri(&uri),
            kind: AssetKind::from_uri(&uri),
            uri,
            bytes,
        }
    }
}

/// Serializable summary of one stored asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: AssetId,
    pub uri: String,
    pub kind: AssetKind,
    pub size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error for {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid asset uri: {0}")]
    InvalidUri(String),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest IO error: {0}")]
    Manifest(#[from] std::io::Error),
}

/// Content-addressed registry of loaded assets.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: BTreeMap<AssetId, LoadedAsset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an asset, replacing any earlier load of the same URI.
    pub fn insert(&mut self, asset: LoadedAsset) -> AssetId {
        let id = asset.id;
        self.assets.insert(id, asset);
        id
    }

    pub fn get(&self, id: AssetId) -> Option<&LoadedAsset> {
        self.assets.get(&id)
    }

    pub fn get_by_uri(&self, uri: &str) -> Option<&LoadedAsset> {
        self.get(AssetId::for_uri(uri))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn manifest(&self) -> Vec<AssetEntry> {
        self.assets
            .values()
            .map(|a| AssetEntry {
                id: a.id,
                uri: a.uri.clone(),
                kind: a.kind,
                size: a.bytes.len(),
            })
            .collect()
    }

    /// Write the manifest (not the bytes) as JSON.
    pub fn save_manifest(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &self.manifest())?;
        Ok(())
    }

    pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<AssetEntry>, AssetError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}
