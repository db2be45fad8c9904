//! # Host storage backends
//!
//! Configuration and unification for the filesystem and preference backends.

use std::sync::Arc;

use camino::Utf8Path;
#[cfg(feature = "local")]
use camino::Utf8PathBuf;
use serde::Deserialize;

#[cfg(feature = "local")]
pub(crate) mod local;
pub(crate) mod memory;
pub(crate) mod preferences;
#[cfg(feature = "tmp")]
pub(crate) mod temp;

#[cfg(feature = "local")]
#[doc(inline)]
pub use local::LocalFilesystem;

#[doc(inline)]
pub use memory::MemoryFilesystem;

#[cfg(feature = "local")]
#[doc(inline)]
pub use preferences::FilePreferences;
#[doc(inline)]
pub use preferences::MemoryPreferences;

#[cfg(feature = "tmp")]
#[doc(inline)]
pub use temp::TempFilesystem;

#[doc(inline)]
pub use host_driver::{Directory, Filesystem, HostError, HostErrorKind, Preferences};

/// Shared handle to any filesystem backend.
pub type ArcFilesystem = Arc<dyn Filesystem + Send + Sync>;

/// Shared handle to any preference backend.
pub type ArcPreferences = Arc<dyn Preferences + Send + Sync>;

/// Which filesystem backend to use.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilesystemConfig {
    /// Keep files in memory.
    #[default]
    Memory,

    /// Keep files under a directory on disk.
    #[cfg(feature = "local")]
    Local {
        /// Root directory.
        path: Utf8PathBuf,
    },

    /// Keep files in a temporary directory, removed at exit.
    #[cfg(feature = "tmp")]
    Temp,
}

impl FilesystemConfig {
    /// Construct the configured backend.
    #[tracing::instrument]
    pub async fn build(self) -> Result<ArcFilesystem, HostError> {
        let filesystem: ArcFilesystem = match self {
            FilesystemConfig::Memory => Arc::new(MemoryFilesystem::new()),
            #[cfg(feature = "local")]
            FilesystemConfig::Local { path } => Arc::new(
                LocalFilesystem::new(path).map_err(|err| HostError::io("local", err))?,
            ),
            #[cfg(feature = "tmp")]
            FilesystemConfig::Temp => Arc::new(
                TempFilesystem::new().map_err(|err| HostError::io("temp", err))?,
            ),
        };
        tracing::debug!(backend = filesystem.name(), "filesystem ready");
        Ok(filesystem)
    }
}

/// Which preference backend to use.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreferencesConfig {
    /// Keep preferences in memory.
    #[default]
    Memory,

    /// Keep preferences in a JSON file.
    #[cfg(feature = "local")]
    File {
        /// Path of the JSON file.
        path: Utf8PathBuf,
    },
}

impl PreferencesConfig {
    /// Construct the configured backend.
    #[tracing::instrument]
    pub async fn build(self) -> Result<ArcPreferences, HostError> {
        let preferences: ArcPreferences = match self {
            PreferencesConfig::Memory => Arc::new(MemoryPreferences::new()),
            #[cfg(feature = "local")]
            PreferencesConfig::File { path } => Arc::new(FilePreferences::new(path)),
        };
        tracing::debug!(backend = preferences.name(), "preferences ready");
        Ok(preferences)
    }
}

/// A filesystem bound to a single [`Directory`].
#[derive(Debug, Clone)]
pub struct Partition {
    directory: Directory,
    filesystem: ArcFilesystem,
}

impl Partition {
    /// Bind `filesystem` to `directory`.
    pub fn new(filesystem: ArcFilesystem, directory: Directory) -> Self {
        Self {
            directory,
            filesystem,
        }
    }

    /// The private application data partition.
    pub fn data(filesystem: ArcFilesystem) -> Self {
        Self::new(filesystem, Directory::Data)
    }

    /// The bound directory.
    pub fn directory(&self) -> Directory {
        self.directory
    }

    /// The underlying filesystem.
    pub fn filesystem(&self) -> &ArcFilesystem {
        &self.filesystem
    }

    /// URI of a file in this partition.
    pub fn uri(&self, path: &Utf8Path) -> String {
        self.filesystem.uri(self.directory, path)
    }

    /// Write base64-encoded contents, returning the file's URI.
    #[tracing::instrument(skip(self, data), fields(fs=self.filesystem.name(), directory=%self.directory))]
    pub async fn write(&self, path: &Utf8Path, data: &str) -> Result<String, HostError> {
        tracing::trace!(%path, "Writing to: {}/{path}", self.directory);
        self.filesystem.write(self.directory, path, data).await
    }

    /// Read a file as base64.
    #[tracing::instrument(skip(self), fields(fs=self.filesystem.name(), directory=%self.directory))]
    pub async fn read(&self, path: &Utf8Path) -> Result<String, HostError> {
        tracing::trace!(%path, "Reading from: {}/{path}", self.directory);
        self.filesystem.read(self.directory, path).await
    }

    /// Read a file and decode it.
    #[tracing::instrument(skip(self), fields(fs=self.filesystem.name(), directory=%self.directory))]
    pub async fn read_bytes(&self, path: &Utf8Path) -> Result<Vec<u8>, HostError> {
        self.filesystem.read_bytes(self.directory, path).await
    }

    /// Delete a file.
    #[tracing::instrument(skip(self), fields(fs=self.filesystem.name(), directory=%self.directory))]
    pub async fn delete(&self, path: &Utf8Path) -> Result<(), HostError> {
        self.filesystem.delete(self.directory, path).await
    }

    /// Read a file by URI or absolute path, outside of the partition.
    #[tracing::instrument(skip(self), fields(fs=self.filesystem.name()))]
    pub async fn read_uri(&self, uri: &str) -> Result<String, HostError> {
        self.filesystem.read_uri(uri).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_driver::encode_base64;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        filesystem: FilesystemConfig,
        preferences: PreferencesConfig,
    }

    #[cfg(feature = "local")]
    #[test]
    fn config_forms() {
        let config: Wrapper = serde_json::from_str(
            r#"{"filesystem": {"local": {"path": "/var/photos"}}, "preferences": "memory"}"#,
        )
        .unwrap();
        assert!(matches!(
            config.filesystem,
            FilesystemConfig::Local { ref path } if path == "/var/photos"
        ));
        assert!(matches!(config.preferences, PreferencesConfig::Memory));
    }

    #[tokio::test]
    async fn partition_routes_to_directory() {
        let memory = Arc::new(MemoryFilesystem::new());
        let partition = Partition::data(memory.clone());
        assert_eq!(partition.directory(), Directory::Data);

        let uri = partition
            .write(Utf8Path::new("2.jpeg"), &encode_base64(b"two"))
            .await
            .unwrap();
        assert_eq!(uri, partition.uri(Utf8Path::new("2.jpeg")));
        assert!(memory.contains(Directory::Data, Utf8Path::new("2.jpeg")).await);

        assert_eq!(
            partition.read_bytes(Utf8Path::new("2.jpeg")).await.unwrap(),
            b"two".to_vec()
        );
        partition.delete(Utf8Path::new("2.jpeg")).await.unwrap();
        assert!(partition
            .read(Utf8Path::new("2.jpeg"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn build_memory_backends() {
        let fs = FilesystemConfig::default().build().await.unwrap();
        assert_eq!(fs.name(), "memory");
        let prefs = PreferencesConfig::default().build().await.unwrap();
        assert_eq!(prefs.name(), "memory");
    }
}
