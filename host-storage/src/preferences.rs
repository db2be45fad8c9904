use std::collections::BTreeMap;

use parking_lot::Mutex;

use host_driver::{HostError, Preferences};

/// Preferences kept in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    /// Create an empty preference store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preference store seeded with the given entries.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Read a value without going through the async trait.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}

#[async_trait::async_trait]
impl Preferences for MemoryPreferences {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        tracing::trace!(%key, size = value.len(), "set memory preference");
        self.values.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), HostError> {
        self.values.lock().remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, HostError> {
        Ok(self.values.lock().keys().cloned().collect())
    }
}

#[cfg(feature = "local")]
pub use file::FilePreferences;

#[cfg(feature = "local")]
mod file {
    use std::collections::BTreeMap;

    use camino::{Utf8Path, Utf8PathBuf};
    use eyre::WrapErr;

    use host_driver::{HostError, HostErrorKind, Preferences};

    type Values = BTreeMap<String, String>;

    /// Preferences persisted as a JSON object in a single file.
    ///
    /// Every `set` or `remove` rewrites the whole file.
    #[derive(Debug)]
    pub struct FilePreferences {
        path: Utf8PathBuf,
        lock: tokio::sync::Mutex<()>,
    }

    impl FilePreferences {
        /// Use the JSON file at `path`, which need not exist yet.
        pub fn new(path: Utf8PathBuf) -> Self {
            Self {
                path,
                lock: tokio::sync::Mutex::new(()),
            }
        }

        /// Path of the backing file.
        pub fn path(&self) -> &Utf8Path {
            &self.path
        }

        fn io_error(&self, context: &'static str, err: std::io::Error) -> HostError {
            HostError::builder(self.name(), err.kind().into(), err)
                .path(self.path.as_str())
                .context(context)
                .build()
        }

        async fn load(&self) -> Result<Values, HostError> {
            let contents = match tokio::fs::read(&self.path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Values::new()),
                Err(err) => return Err(self.io_error("read preferences", err)),
            };

            serde_json::from_slice(&contents)
                .wrap_err_with(|| format!("parse preferences file {}", self.path))
                .map_err(HostError::with(self.name(), HostErrorKind::SerializationError))
        }

        async fn store(&self, values: &Values) -> Result<(), HostError> {
            let contents = serde_json::to_vec_pretty(values)
                .wrap_err("serialize preferences")
                .map_err(HostError::with(self.name(), HostErrorKind::SerializationError))?;

            if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| self.io_error("create_dir_all", err))?;
            }
            tokio::fs::write(&self.path, contents)
                .await
                .map_err(|err| self.io_error("write preferences", err))
        }
    }

    #[async_trait::async_trait]
    impl Preferences for FilePreferences {
        fn name(&self) -> &'static str {
            "file"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, HostError> {
            let _guard = self.lock.lock().await;
            Ok(self.load().await?.remove(key))
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
            let _guard = self.lock.lock().await;
            let mut values = self.load().await?;
            values.insert(key.to_owned(), value.to_owned());
            self.store(&values).await
        }

        async fn remove(&self, key: &str) -> Result<(), HostError> {
            let _guard = self.lock.lock().await;
            let mut values = self.load().await?;
            if values.remove(key).is_some() {
                self.store(&values).await?;
            }
            Ok(())
        }

        async fn keys(&self) -> Result<Vec<String>, HostError> {
            let _guard = self.lock.lock().await;
            Ok(self.load().await?.into_keys().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_preferences() {
        let prefs = MemoryPreferences::with_values([("theme", "dark")]);
        assert_eq!(prefs.get("theme").await.unwrap().as_deref(), Some("dark"));
        assert_eq!(prefs.get("fotos").await.unwrap(), None);

        prefs.set("fotos", "[]").await.unwrap();
        assert_eq!(prefs.peek("fotos").as_deref(), Some("[]"));
        assert_eq!(prefs.keys().await.unwrap(), vec!["fotos", "theme"]);

        prefs.remove("theme").await.unwrap();
        prefs.remove("theme").await.unwrap();
        assert_eq!(prefs.keys().await.unwrap(), vec!["fotos"]);
    }

    #[cfg(feature = "local")]
    #[tokio::test]
    async fn file_preferences_survive_reopen() {
        use camino::Utf8PathBuf;

        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("prefs/preferences.json")).unwrap();

        let prefs = FilePreferences::new(path.clone());
        assert_eq!(prefs.get("fotos").await.unwrap(), None);
        prefs.set("fotos", r#"[{"filePath":"1.jpeg"}]"#).await.unwrap();
        drop(prefs);

        let prefs = FilePreferences::new(path);
        assert_eq!(
            prefs.get("fotos").await.unwrap().as_deref(),
            Some(r#"[{"filePath":"1.jpeg"}]"#)
        );
        prefs.remove("fotos").await.unwrap();
        assert!(prefs.keys().await.unwrap().is_empty());
    }

    #[cfg(feature = "local")]
    #[tokio::test]
    async fn corrupt_preferences_file() {
        use camino::Utf8PathBuf;
        use host_driver::HostErrorKind;

        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("preferences.json")).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let prefs = FilePreferences::new(path);
        let err = prefs.get("fotos").await.unwrap_err();
        assert_eq!(err.kind(), HostErrorKind::SerializationError);
    }
}
