use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::RwLock;

use host_driver::{decode_base64, encode_base64, Directory, Filesystem, HostError, HostErrorKind};

fn not_found(engine: &'static str, directory: Option<Directory>, path: &str) -> HostError {
    let mut builder = HostError::builder(
        engine,
        HostErrorKind::NotFound,
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File does not exist: {path}"),
        ),
    )
    .path(path);
    if let Some(directory) = directory {
        builder = builder.directory(directory);
    }
    builder.build()
}

#[derive(Debug, Default)]
struct MemoryFiles {
    directories: HashMap<Directory, HashMap<Utf8PathBuf, Vec<u8>>>,

    /// Files living outside the host's directories, such as camera temporaries.
    external: HashMap<Utf8PathBuf, Vec<u8>>,
}

/// Filesystem that keeps every file in memory.
///
/// Files written into a directory are reported under `file://<root>/<directory>/<path>`
/// URIs, and those URIs can be read back through [`Filesystem::read_uri`].
#[derive(Debug)]
pub struct MemoryFilesystem {
    root: Utf8PathBuf,
    files: RwLock<MemoryFiles>,
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFilesystem {
    /// Create an empty in-memory filesystem rooted at `/memory`.
    pub fn new() -> Self {
        Self::with_root("/memory")
    }

    /// Create an empty in-memory filesystem reporting URIs under `root`.
    pub fn with_root(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: RwLock::new(MemoryFiles::default()),
        }
    }

    fn absolute(&self, directory: Directory, path: &Utf8Path) -> Utf8PathBuf {
        let mut absolute = self.root.join(directory.as_str());
        absolute.push(path);
        absolute
    }

    /// Place a file outside the host directories, addressable by absolute
    /// path or `file://` URI.
    pub async fn insert_external(&self, path: impl Into<Utf8PathBuf>, data: impl Into<Vec<u8>>) {
        let mut files = self.files.write().await;
        files.external.insert(path.into(), data.into());
    }

    /// Whether a file exists in the directory.
    pub async fn contains(&self, directory: Directory, path: &Utf8Path) -> bool {
        let files = self.files.read().await;
        files
            .directories
            .get(&directory)
            .is_some_and(|entries| entries.contains_key(path))
    }

    /// List the files in a directory.
    pub async fn list(&self, directory: Directory) -> Vec<Utf8PathBuf> {
        let files = self.files.read().await;
        let mut paths: Vec<_> = files
            .directories
            .get(&directory)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    /// Resolve an absolute path to a directory entry, if it lies in one.
    fn locate<'p>(&self, absolute: &'p Utf8Path) -> Option<(Directory, &'p Utf8Path)> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let mut components = relative.components();
        let directory = components.next()?.as_str().parse::<Directory>().ok()?;
        Some((directory, components.as_path()))
    }
}

#[async_trait::async_trait]
impl Filesystem for MemoryFilesystem {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn uri(&self, directory: Directory, path: &Utf8Path) -> String {
        format!("file://{}", self.absolute(directory, path))
    }

    async fn write(
        &self,
        directory: Directory,
        path: &Utf8Path,
        data: &str,
    ) -> Result<String, HostError> {
        let bytes = decode_base64(self.name(), data)?;
        tracing::trace!(%directory, %path, size = bytes.len(), "write memory file");

        let mut files = self.files.write().await;
        files
            .directories
            .entry(directory)
            .or_default()
            .insert(path.to_owned(), bytes);

        Ok(self.uri(directory, path))
    }

    async fn read(&self, directory: Directory, path: &Utf8Path) -> Result<String, HostError> {
        let files = self.files.read().await;
        let data = files
            .directories
            .get(&directory)
            .and_then(|entries| entries.get(path))
            .ok_or_else(|| not_found(self.name(), Some(directory), path.as_str()))?;
        Ok(encode_base64(data))
    }

    async fn delete(&self, directory: Directory, path: &Utf8Path) -> Result<(), HostError> {
        let mut files = self.files.write().await;
        files
            .directories
            .get_mut(&directory)
            .and_then(|entries| entries.remove(path))
            .map(|_| ())
            .ok_or_else(|| not_found(self.name(), Some(directory), path.as_str()))
    }

    async fn read_uri(&self, uri: &str) -> Result<String, HostError> {
        let absolute = Utf8Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        if let Some((directory, path)) = self.locate(absolute) {
            return self.read(directory, path).await;
        }

        let files = self.files.read().await;
        let data = files
            .external
            .get(absolute)
            .ok_or_else(|| not_found(self.name(), None, uri))?;
        Ok(encode_base64(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_delete() {
        let fs = MemoryFilesystem::new();
        let path = Utf8Path::new("1.jpeg");

        let uri = fs
            .write(Directory::Data, path, &encode_base64(b"jpeg"))
            .await
            .unwrap();
        assert_eq!(uri, "file:///memory/data/1.jpeg");
        assert!(fs.contains(Directory::Data, path).await);
        assert!(!fs.contains(Directory::Cache, path).await);

        assert_eq!(
            fs.read_bytes(Directory::Data, path).await.unwrap(),
            b"jpeg".to_vec()
        );
        assert_eq!(fs.read_uri(&uri).await.unwrap(), encode_base64(b"jpeg"));

        fs.delete(Directory::Data, path).await.unwrap();
        assert!(fs.list(Directory::Data).await.is_empty());

        let err = fs.delete(Directory::Data, path).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.directory(), Some(Directory::Data));
    }

    #[tokio::test]
    async fn rejects_invalid_base64() {
        let fs = MemoryFilesystem::new();
        let err = fs
            .write(Directory::Data, Utf8Path::new("bad.jpeg"), "%%%")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), HostErrorKind::SerializationError);
    }

    #[tokio::test]
    async fn external_files() {
        let fs = MemoryFilesystem::new();
        fs.insert_external("/tmp/camera/capture.jpeg", b"raw".to_vec())
            .await;

        assert_eq!(
            fs.read_uri("file:///tmp/camera/capture.jpeg").await.unwrap(),
            encode_base64(b"raw")
        );
        assert_eq!(
            fs.read_uri("/tmp/camera/capture.jpeg").await.unwrap(),
            encode_base64(b"raw")
        );
        assert!(fs
            .read_uri("/tmp/camera/other.jpeg")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
