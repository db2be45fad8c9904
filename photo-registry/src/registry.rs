use std::sync::Arc;

use bytes::Bytes;
use camino::Utf8Path;

use host_driver::{Camera, CaptureOptions};
use host_storage::ArcPreferences;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, RegistryResult};
use crate::host::Host;
use crate::record::{decode_list, PhotoRecord};

/// Shared handle to a camera.
pub type ArcCamera = Arc<dyn Camera + Send + Sync>;

/// Preference key the photo list is stored under.
pub const DEFAULT_KEY: &str = "fotos";

/// JPEG quality requested from the camera. Keeps files from good cameras
/// small while still looking fine on screen.
pub const DEFAULT_QUALITY: u8 = 50;

/// Extension of every photo file written by the registry.
pub const FILE_EXTENSION: &str = "jpeg";

/// The list of captured photos, newest first, kept in step with the
/// preference store and the host's file storage.
///
/// The registry is the single writer of its list: every mutation takes
/// `&mut self`, and each one ends by overwriting the persisted list in full.
#[derive(Debug)]
pub struct PhotoRegistry {
    photos: Vec<PhotoRecord>,
    host: Host,
    camera: ArcCamera,
    preferences: ArcPreferences,
    clock: Arc<dyn Clock>,
    key: String,
    quality: u8,
}

impl PhotoRegistry {
    /// Create an empty registry. Call [`PhotoRegistry::hydrate`] to load the
    /// saved list.
    pub fn new(host: Host, camera: ArcCamera, preferences: ArcPreferences) -> Self {
        Self {
            photos: Vec::new(),
            host,
            camera,
            preferences,
            clock: Arc::new(SystemClock),
            key: DEFAULT_KEY.into(),
            quality: DEFAULT_QUALITY,
        }
    }

    /// Store the list under a different preference key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Request a different camera quality, capped at 100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(100);
        self
    }

    /// Name new files after a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The photos, newest first.
    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    /// The photo at `position`.
    pub fn get(&self, position: usize) -> Option<&PhotoRecord> {
        self.photos.get(position)
    }

    /// Iterate over the photos, newest first.
    pub fn iter(&self) -> std::slice::Iter<'_, PhotoRecord> {
        self.photos.iter()
    }

    /// Number of photos.
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    /// Whether there are no photos.
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// The host strategy in use.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// The preference key the list is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the in-memory list with the saved one.
    ///
    /// On a web view every photo is read back from storage, one at a time,
    /// and inlined as a data URI. A single missing file fails the whole
    /// load and leaves the current list untouched.
    #[tracing::instrument(skip(self), fields(key = %self.key, host = %self.host.kind()))]
    pub async fn hydrate(&mut self) -> RegistryResult<&[PhotoRecord]> {
        let stored = self
            .preferences
            .get(&self.key)
            .await
            .map_err(Error::Preferences)?;

        let mut photos = decode_list(stored.as_deref()).unwrap_or_else(|err| {
            tracing::warn!(%err, "Saved photo list is unreadable, starting empty");
            Vec::new()
        });

        if !self.host.is_native() {
            for photo in photos.iter_mut() {
                let display = self.host.display_path_for(photo).await?;
                photo.set_display_path(display);
            }
        }

        tracing::debug!(count = photos.len(), "Loaded saved photos");
        self.photos = photos;
        Ok(&self.photos)
    }

    /// Take a photo, store it, and put it at the front of the list.
    ///
    /// Returns `None` when the user dismisses the camera; nothing is stored
    /// in that case.
    #[tracing::instrument(skip(self), fields(host = %self.host.kind(), camera = self.camera.name()))]
    pub async fn capture(&mut self) -> RegistryResult<Option<PhotoRecord>> {
        let photo = match self
            .camera
            .capture(CaptureOptions::file_reference(self.quality))
            .await
        {
            Ok(photo) => photo,
            Err(err) if err.is_cancelled() => {
                tracing::debug!(%err, "Capture cancelled");
                return Ok(None);
            }
            Err(err) => return Err(Error::Camera(err)),
        };

        let data = self.host.read_capture(&photo).await?;

        let file_name = self.next_file_name();
        let saved = self.host.write(Utf8Path::new(&file_name), &data).await?;
        tracing::trace!(%file_name, %saved, "Stored capture");

        let record = self.host.record_for(saved, &file_name, &photo);
        self.photos.insert(0, record.clone());
        self.persist().await?;

        Ok(Some(record))
    }

    /// Remove the photo at `position` and delete its file.
    ///
    /// The position is trusted: if `record` is no longer at `position` a
    /// warning is logged and whatever is there now is removed. The file
    /// deleted is the one named by `record`. The list is persisted before the
    /// file is deleted, and is not restored if the file deletion fails.
    #[tracing::instrument(skip(self, record), fields(file_path = %record.file_path()))]
    pub async fn delete(
        &mut self,
        record: &PhotoRecord,
        position: usize,
    ) -> RegistryResult<PhotoRecord> {
        let current = self.photos.get(position).ok_or(Error::PositionOutOfRange {
            position,
            len: self.photos.len(),
        })?;
        if current.file_path() != record.file_path() {
            tracing::warn!(
                found = %current.file_path(),
                "Photo at position {position} is not the one being deleted"
            );
        }

        let removed = self.photos.remove(position);
        self.persist().await?;

        self.host.delete(Utf8Path::new(record.file_name())).await?;
        Ok(removed)
    }

    /// Remove the photo stored at `file_path`, wherever it is in the list.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&mut self, file_path: &str) -> RegistryResult<PhotoRecord> {
        let position = self
            .photos
            .iter()
            .position(|photo| photo.file_path() == file_path)
            .ok_or_else(|| Error::UnknownPhoto(file_path.to_owned()))?;
        let record = self.photos[position].clone();
        self.delete(&record, position).await
    }

    /// The image bytes behind `record`, for sharing or export.
    #[tracing::instrument(skip(self, record), fields(file_path = %record.file_path()))]
    pub async fn displayable_bytes(&self, record: &PhotoRecord) -> RegistryResult<Bytes> {
        let uri = self
            .host
            .display_path_for(record)
            .await?
            .ok_or_else(|| Error::MissingDisplayPath(record.file_path().to_owned()))?;
        self.host.fetch(&uri).await
    }

    /// Overwrite the saved list with the in-memory one.
    async fn persist(&self) -> RegistryResult<()> {
        let value = serde_json::to_string(&self.photos)?;
        tracing::trace!(count = self.photos.len(), "Saving photo list");
        self.preferences
            .set(&self.key, &value)
            .await
            .map_err(Error::Preferences)
    }

    /// A `<millis>.jpeg` name not already used by a photo in the list.
    fn next_file_name(&self) -> String {
        let mut millis = self.clock.now_millis();
        loop {
            let name = format!("{millis}.{FILE_EXTENSION}");
            if !self.photos.iter().any(|photo| photo.file_name() == name) {
                return name;
            }
            millis += 1;
        }
    }
}

impl<'r> IntoIterator for &'r PhotoRegistry {
    type Item = &'r PhotoRecord;
    type IntoIter = std::slice::Iter<'r, PhotoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.photos.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use host_storage::{MemoryFilesystem, MemoryPreferences, Partition};

    use crate::camera::ImportCamera;
    use crate::clock::ManualClock;
    use crate::host::{HostKind, WebViewServer};
    use crate::resource::ResourceFetcher;

    fn registry(preferences: MemoryPreferences) -> PhotoRegistry {
        let memory = Arc::new(MemoryFilesystem::new());
        let server = WebViewServer::default();
        let fetch = Arc::new(ResourceFetcher::new(memory.clone(), server.clone()));
        let host = Host::select(&HostKind::Native, Partition::data(memory), fetch, server);
        PhotoRegistry::new(host, Arc::new(ImportCamera::empty()), Arc::new(preferences))
    }

    #[test]
    fn file_names_skip_existing() {
        let mut registry = registry(MemoryPreferences::new())
            .with_clock(Arc::new(ManualClock::new(100)));
        assert_eq!(registry.next_file_name(), "100.jpeg");

        registry.photos = vec![
            PhotoRecord::new("file:///memory/data/101.jpeg", None),
            PhotoRecord::new("file:///memory/data/100.jpeg", None),
        ];
        assert_eq!(registry.next_file_name(), "102.jpeg");
    }

    #[test]
    fn quality_is_capped() {
        let registry = registry(MemoryPreferences::new()).with_quality(120);
        assert_eq!(registry.quality, 100);
        assert_eq!(registry.key(), DEFAULT_KEY);
    }

    #[tokio::test]
    async fn cancelled_capture_changes_nothing() {
        let mut registry = registry(MemoryPreferences::new());
        assert_eq!(registry.capture().await.unwrap(), None);
        assert!(registry.is_empty());
        assert_eq!(registry.preferences.get(DEFAULT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_list_loads_empty() {
        let mut registry = registry(MemoryPreferences::with_values([(DEFAULT_KEY, "[{oops")]));
        assert!(registry.hydrate().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_past_end_is_rejected() {
        let mut registry = registry(MemoryPreferences::new());
        let record = PhotoRecord::new("1.jpeg", None);
        let err = registry.delete(&record, 0).await.unwrap_err();
        assert!(matches!(
            err,
            Error::PositionOutOfRange {
                position: 0,
                len: 0
            }
        ));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn remove_unknown_photo() {
        let mut registry = registry(MemoryPreferences::new());
        let err = registry.remove("1.jpeg").await.unwrap_err();
        assert!(matches!(err, Error::UnknownPhoto(ref path) if path == "1.jpeg"));
    }
}
