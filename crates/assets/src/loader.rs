use crate::{AssetError, LoadedAsset};
use std::path::{Component, Path, PathBuf};

/// Asynchronous loader capability.
///
/// Implementations fetch the bytes behind a URI; they do not decode.
#[allow(async_fn_in_trait)]
pub trait Loader {
    async fn load(&self, uri: &str) -> Result<LoadedAsset, AssetError>;
}

/// Reads assets from a directory. A leading `/` in the URI is relative to
/// the root, so `/static/a.png` and `static/a.png` name the same file.
///
/// The read itself is a blocking `std::fs::read`; the future completes on
/// its first poll. Run it on a blocking-capable executor for large files.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(uri.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if uri.trim().is_empty() || escapes {
            return Err(AssetError::InvalidUri(uri.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl Loader for FileLoader {
    async fn load(&self, uri: &str) -> Result<LoadedAsset, AssetError> {
        let path = self.resolve(uri)?;
        let bytes = std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(uri.to_string())
            } else {
                AssetError::Io {
                    uri: uri.to_string(),
                    source,
                }
            }
        })?;
        tracing::debug!(uri, bytes = bytes.len(), "asset read");
        Ok(LoadedAsset::new(uri, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetKind;

    #[test]
    fn reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/door.jpg"), b"jpg").unwrap();

        let loader = FileLoader::new(dir.path());
        let asset = pollster::block_on(loader.load("/static/door.jpg")).unwrap();
        assert_eq!(asset.bytes, b"jpg");
        assert_eq!(asset.kind, AssetKind::Texture);
        assert_eq!(asset.uri, "/static/door.jpg");
    }

    #[test]
    fn file_load_is_ready_on_first_poll() {
        use std::future::Future;
        use std::task::{Context, Poll, Waker};

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("font.json"), b"{}").unwrap();
        let loader = FileLoader::new(dir.path());
        let mut fut = std::pin::pin!(loader.load("font.json"));
        let mut cx = Context::from_waker(Waker::noop());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(asset) => assert_eq!(asset.unwrap().bytes, b"{}"),
            Poll::Pending => panic!("file read should not suspend"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileLoader::new(dir.path());
        let err = pollster::block_on(loader.load("nope.png")).unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn parent_traversal_rejected() {
        let loader = FileLoader::new("/tmp");
        for uri in ["../etc/passwd", "a/../../b", ""] {
            let err = pollster::block_on(loader.load(uri)).unwrap_err();
            assert!(matches!(err, AssetError::InvalidUri(_)), "{uri}");
        }
    }
}
