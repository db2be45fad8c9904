use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::local::LocalFilesystem;
use host_driver::{Directory, Filesystem, HostError};

/// A filesystem that stores files in a temporary directory, removed on drop.
#[derive(Debug)]
pub struct TempFilesystem {
    #[allow(unused)]
    dir: TempDir,
    inner: LocalFilesystem,
}

impl TempFilesystem {
    /// Create a new `TempFilesystem` in a fresh temporary directory.
    pub fn new() -> io::Result<Self> {
        let tmp = TempDir::new()?;
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_owned()).map_err(|path| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("temporary directory is not utf-8: {}", path.display()),
            )
        })?;

        Ok(Self {
            dir: tmp,
            inner: LocalFilesystem::new(root)?,
        })
    }

    /// The temporary root directory.
    pub fn root(&self) -> &Utf8Path {
        self.inner.root()
    }
}

#[async_trait::async_trait]
impl Filesystem for TempFilesystem {
    fn name(&self) -> &'static str {
        "temp"
    }

    fn uri(&self, directory: Directory, path: &Utf8Path) -> String {
        self.inner.uri(directory, path)
    }

    async fn write(
        &self,
        directory: Directory,
        path: &Utf8Path,
        data: &str,
    ) -> Result<String, HostError> {
        self.inner.write(directory, path, data).await
    }

    async fn read(&self, directory: Directory, path: &Utf8Path) -> Result<String, HostError> {
        self.inner.read(directory, path).await
    }

    async fn delete(&self, directory: Directory, path: &Utf8Path) -> Result<(), HostError> {
        self.inner.delete(directory, path).await
    }

    async fn read_uri(&self, uri: &str) -> Result<String, HostError> {
        self.inner.read_uri(uri).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_driver::encode_base64;

    #[tokio::test]
    async fn removed_on_drop() {
        let fs = TempFilesystem::new().unwrap();
        let root = fs.root().to_owned();

        fs.write(Directory::Cache, Utf8Path::new("a.jpeg"), &encode_base64(b"a"))
            .await
            .unwrap();
        assert!(root.join("cache/a.jpeg").exists());

        drop(fs);
        assert!(!root.exists());
    }
}
