use std::{fmt, ops::Deref, str::FromStr, sync::Arc};

use base64::Engine as _;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostErrorKind};

/// A logical storage partition on the host.
///
/// Applications keep their files in [`Directory::Data`] unless configured
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directory {
    /// Private application data.
    Data,

    /// User-visible documents.
    Documents,

    /// Cache space, which the operating system may reclaim.
    Cache,
}

impl Directory {
    /// Name of the directory, as used for on-disk layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            Directory::Data => "data",
            Directory::Documents => "documents",
            Directory::Cache => "cache",
        }
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown directory name.
#[derive(Debug, thiserror::Error)]
#[error("unknown directory: {0}")]
pub struct UnknownDirectory(String);

impl FromStr for Directory {
    type Err = UnknownDirectory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "data" => Ok(Directory::Data),
            "documents" => Ok(Directory::Documents),
            "cache" => Ok(Directory::Cache),
            _ => Err(UnknownDirectory(s.to_owned())),
        }
    }
}

/// File storage provided by the host.
///
/// File contents cross this boundary base64 encoded, the same way the
/// device filesystem bridges hand them to a web view.
#[async_trait::async_trait]
pub trait Filesystem: fmt::Debug {
    /// The name of the backend.
    fn name(&self) -> &'static str;

    /// The URI under which a file in a directory is reachable.
    fn uri(&self, directory: Directory, path: &Utf8Path) -> String;

    /// Write base64-encoded contents to a file, returning its URI.
    async fn write(
        &self,
        directory: Directory,
        path: &Utf8Path,
        data: &str,
    ) -> Result<String, HostError>;

    /// Read a file, returning its contents base64 encoded.
    async fn read(&self, directory: Directory, path: &Utf8Path) -> Result<String, HostError>;

    /// Delete a file.
    async fn delete(&self, directory: Directory, path: &Utf8Path) -> Result<(), HostError>;

    /// Read a file by URI or absolute device path, such as the temporary
    /// file a camera leaves behind. The result is base64 encoded.
    async fn read_uri(&self, uri: &str) -> Result<String, HostError>;

    /// Read a file and decode its contents.
    async fn read_bytes(
        &self,
        directory: Directory,
        path: &Utf8Path,
    ) -> Result<Vec<u8>, HostError> {
        let data = self.read(directory, path).await?;
        base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|err| {
                HostError::builder(self.name(), HostErrorKind::SerializationError, err)
                    .directory(directory)
                    .path(path.as_str())
                    .build()
            })
    }
}

/// Encode bytes in the standard base64 alphabet.
pub fn encode_base64<T: AsRef<[u8]>>(data: T) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode standard base64, reporting failures as host errors from `engine`.
pub fn decode_base64(engine: &'static str, data: &str) -> Result<Vec<u8>, HostError> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(HostError::with(engine, HostErrorKind::SerializationError))
}

#[async_trait::async_trait]
impl<F> Filesystem for Arc<F>
where
    F: ?Sized + Filesystem + Sync + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.deref().name()
    }

    fn uri(&self, directory: Directory, path: &Utf8Path) -> String {
        self.deref().uri(directory, path)
    }

    async fn write(
        &self,
        directory: Directory,
        path: &Utf8Path,
        data: &str,
    ) -> Result<String, HostError> {
        self.deref().write(directory, path, data).await
    }

    async fn read(&self, directory: Directory, path: &Utf8Path) -> Result<String, HostError> {
        self.deref().read(directory, path).await
    }

    async fn delete(&self, directory: Directory, path: &Utf8Path) -> Result<(), HostError> {
        self.deref().delete(directory, path).await
    }

    async fn read_uri(&self, uri: &str) -> Result<String, HostError> {
        self.deref().read_uri(uri).await
    }
}

#[async_trait::async_trait]
impl<F> Filesystem for &F
where
    F: ?Sized + Filesystem + Sync + Send + 'static,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn uri(&self, directory: Directory, path: &Utf8Path) -> String {
        (**self).uri(directory, path)
    }

    async fn write(
        &self,
        directory: Directory,
        path: &Utf8Path,
        data: &str,
    ) -> Result<String, HostError> {
        (**self).write(directory, path, data).await
    }

    async fn read(&self, directory: Directory, path: &Utf8Path) -> Result<String, HostError> {
        (**self).read(directory, path).await
    }

    async fn delete(&self, directory: Directory, path: &Utf8Path) -> Result<(), HostError> {
        (**self).delete(directory, path).await
    }

    async fn read_uri(&self, uri: &str) -> Result<String, HostError> {
        (**self).read_uri(uri).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_obj_safe!(Filesystem);

    #[test]
    fn directory_names() {
        assert_eq!(Directory::Data.to_string(), "data");
        assert_eq!("DATA".parse::<Directory>().unwrap(), Directory::Data);
        assert_eq!("cache".parse::<Directory>().unwrap(), Directory::Cache);
        assert!("library".parse::<Directory>().is_err());
    }

    #[test]
    fn base64_helpers() {
        let encoded = encode_base64(b"\xff\xd8\xff\xe0");
        assert_eq!(encoded, "/9j/4A==");
        assert_eq!(decode_base64("test", &encoded).unwrap(), b"\xff\xd8\xff\xe0");

        let err = decode_base64("test", "not base64!").unwrap_err();
        assert_eq!(err.kind(), HostErrorKind::SerializationError);
    }
}
