use std::sync::Arc;

use camino::Utf8Path;
use serde::Deserialize;

use host_storage::{Directory, FilesystemConfig, Partition, PreferencesConfig};

use crate::error::{Error, RegistryResult};
use crate::host::{Host, HostKind, WebViewServer};
use crate::registry::{ArcCamera, PhotoRegistry, DEFAULT_KEY, DEFAULT_QUALITY};
use crate::resource::ResourceFetcher;

/// Registry configuration.
///
/// ```toml
/// host = "web-view"
/// quality = 50
///
/// directory = "documents"
///
/// [filesystem.local]
/// path = "/var/lib/photos"
///
/// [preferences.file]
/// path = "/var/lib/photos/preferences.json"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Which host strategy to run with.
    pub host: HostKind,

    /// Preference key for the photo list.
    pub key: String,

    /// Camera quality, 0 to 100.
    pub quality: u8,

    /// The webview server native file URLs are rewritten for.
    pub server: WebViewServer,

    /// Host directory photo files are kept in.
    pub directory: Directory,

    /// File storage backend.
    pub filesystem: FilesystemConfig,

    /// Preference backend.
    pub preferences: PreferencesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: HostKind::default(),
            key: DEFAULT_KEY.into(),
            quality: DEFAULT_QUALITY,
            server: WebViewServer::default(),
            directory: Directory::Data,
            filesystem: FilesystemConfig::default(),
            preferences: PreferencesConfig::default(),
        }
    }
}

impl Config {
    /// Native host keeping files and preferences under `root` on disk.
    pub fn local(root: &Utf8Path) -> Self {
        Self {
            filesystem: FilesystemConfig::Local {
                path: root.to_owned(),
            },
            preferences: PreferencesConfig::File {
                path: root.join("preferences.json"),
            },
            ..Self::default()
        }
    }

    /// Build the backends and assemble a registry around `camera`.
    #[tracing::instrument(skip(camera))]
    pub async fn build(self, camera: ArcCamera) -> RegistryResult<PhotoRegistry> {
        let filesystem = self.filesystem.build().await.map_err(Error::Storage)?;
        let preferences = self.preferences.build().await.map_err(Error::Preferences)?;

        let fetch = Arc::new(ResourceFetcher::new(filesystem.clone(), self.server.clone()));
        let host = Host::select(
            &self.host,
            Partition::new(filesystem, self.directory),
            fetch,
            self.server,
        );

        Ok(PhotoRegistry::new(host, camera, preferences)
            .with_key(self.key)
            .with_quality(self.quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::camera::ImportCamera;

    #[test]
    fn defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.host, HostKind::Native);
        assert_eq!(config.key, "fotos");
        assert_eq!(config.quality, 50);
        assert_eq!(config.server, WebViewServer::default());
        assert_eq!(config.directory, Directory::Data);
        assert!(matches!(config.filesystem, FilesystemConfig::Memory));
    }

    #[test]
    fn web_view_config() {
        let config: Config = serde_json::from_str(
            r#"{"host": "web-view", "key": "photos", "directory": "cache", "server": {"scheme": "capacitor"}}"#,
        )
        .unwrap();
        assert_eq!(config.directory, Directory::Cache);
        assert_eq!(config.host, HostKind::WebView);
        assert_eq!(config.key, "photos");
        assert_eq!(config.server.scheme, "capacitor");
        assert_eq!(config.server.hostname, "localhost");
    }

    #[tokio::test]
    async fn build_selects_host() {
        let config = Config {
            host: HostKind::WebView,
            key: "photos".into(),
            directory: Directory::Documents,
            ..Config::default()
        };
        let registry = config.build(Arc::new(ImportCamera::empty())).await.unwrap();
        assert!(!registry.host().is_native());
        assert_eq!(registry.host().data().directory(), Directory::Documents);
        assert_eq!(registry.key(), "photos");
        assert!(registry.is_empty());
    }

    #[test]
    fn local_config_paths() {
        let config = Config::local(Utf8Path::new("/srv/photos"));
        assert!(matches!(
            config.preferences,
            PreferencesConfig::File { ref path } if path == "/srv/photos/preferences.json"
        ));
    }
}
