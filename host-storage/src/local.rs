use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::WrapErr;
use tokio::io::AsyncWriteExt;
use url::Url;

use host_driver::{decode_base64, encode_base64, Directory, Filesystem, HostError, HostErrorKind};

/// Filesystem backed by a directory on disk.
///
/// Each [`Directory`] is a subdirectory of the root. The root is always
/// absolute, so every reported URI is a valid `file:///` URI.
#[derive(Debug)]
pub struct LocalFilesystem {
    root: Utf8PathBuf,
    base: Url,
}

impl LocalFilesystem {
    /// Create a filesystem rooted at `root`, resolved against the current
    /// directory when relative. The root is created lazily on the first write.
    pub fn new(root: impl Into<Utf8PathBuf>) -> io::Result<Self> {
        let root = Utf8PathBuf::try_from(std::path::absolute(root.into())?)
            .map_err(|err| err.into_io_error())?;
        let base = Url::from_directory_path(&root).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("root is not an absolute path: {root}"),
            )
        })?;
        Ok(Self { root, base })
    }

    /// The root directory.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn path(&self, directory: Directory, path: &Utf8Path) -> Utf8PathBuf {
        let mut full = self.root.join(directory.as_str());
        full.push(path);
        full
    }

    fn io_error(
        &self,
        context: &'static str,
        directory: Option<Directory>,
        path: &str,
        err: std::io::Error,
    ) -> HostError {
        let mut builder = HostError::builder(self.name(), err.kind().into(), err)
            .path(path)
            .context(context);
        if let Some(directory) = directory {
            builder = builder.directory(directory);
        }
        builder.build()
    }
}

/// Turn a `file://` URI (or a bare path) into a local path.
fn local_path(uri: &str) -> Result<Utf8PathBuf, HostError> {
    if !uri.starts_with("file:") {
        return Ok(Utf8PathBuf::from(uri));
    }

    let url = Url::parse(uri)
        .wrap_err_with(|| format!("parse file uri {uri}"))
        .map_err(HostError::with("local", HostErrorKind::InvalidRequest))?;
    let path = url
        .to_file_path()
        .map_err(|_| eyre::eyre!("not a local file uri: {uri}"))
        .map_err(HostError::with("local", HostErrorKind::InvalidRequest))?;
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| eyre::eyre!("non utf-8 path: {}", path.display()))
        .map_err(HostError::with("local", HostErrorKind::InvalidRequest))
}

#[async_trait::async_trait]
impl Filesystem for LocalFilesystem {
    fn name(&self) -> &'static str {
        "local"
    }

    fn uri(&self, directory: Directory, path: &Utf8Path) -> String {
        let mut url = self.base.clone();
        // File URLs always have path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(directory.as_str())
                .extend(path.components().map(|component| component.as_str()));
        }
        url.into()
    }

    async fn write(
        &self,
        directory: Directory,
        path: &Utf8Path,
        data: &str,
    ) -> Result<String, HostError> {
        let bytes = decode_base64(self.name(), data)?;
        let full = self.path(directory, path);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error("create_dir_all", Some(directory), path.as_str(), err))?;
        }

        let mut file = tokio::io::BufWriter::new(
            tokio::fs::File::create(&full)
                .await
                .map_err(|err| self.io_error("create file", Some(directory), path.as_str(), err))?,
        );
        file.write_all(&bytes)
            .await
            .map_err(|err| self.io_error("write file", Some(directory), path.as_str(), err))?;
        file.shutdown()
            .await
            .map_err(|err| self.io_error("shutdown writer", Some(directory), path.as_str(), err))?;

        tracing::trace!(%full, size = bytes.len(), "wrote local file");
        Ok(self.uri(directory, path))
    }

    async fn read(&self, directory: Directory, path: &Utf8Path) -> Result<String, HostError> {
        let full = self.path(directory, path);
        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|err| self.io_error("read file", Some(directory), path.as_str(), err))?;
        Ok(encode_base64(bytes))
    }

    async fn delete(&self, directory: Directory, path: &Utf8Path) -> Result<(), HostError> {
        let full = self.path(directory, path);
        tokio::fs::remove_file(&full)
            .await
            .map_err(|err| self.io_error("remove_file", Some(directory), path.as_str(), err))?;
        Ok(())
    }

    async fn read_uri(&self, uri: &str) -> Result<String, HostError> {
        let path = local_path(uri)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| self.io_error("read uri", None, uri, err))?;
        Ok(encode_base64(bytes))
    }
}
