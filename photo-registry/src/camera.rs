use camino::{Utf8Path, Utf8PathBuf};

use host_driver::{encode_base64, Camera, CaptureOptions, CapturedPhoto, HostError, HostErrorKind, ResultType};

/// A camera for hosts without one: "captures" an existing image file.
///
/// The file is reported the way a device camera reports a fresh capture,
/// as a device path plus a `file://` web path. With no image selected, a
/// capture behaves like the user dismissing the camera.
#[derive(Debug, Default, Clone)]
pub struct ImportCamera {
    source: Option<Utf8PathBuf>,
}

impl ImportCamera {
    /// Import the image at `source` on every capture.
    pub fn new(source: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source: Some(source.into()),
        }
    }

    /// A camera with nothing to import.
    pub fn empty() -> Self {
        Self::default()
    }
}

fn image_format(path: &Utf8Path) -> String {
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") | None => "jpeg".into(),
        Some(other) => other.into(),
    }
}

#[async_trait::async_trait]
impl Camera for ImportCamera {
    fn name(&self) -> &'static str {
        "import"
    }

    async fn capture(&self, options: CaptureOptions) -> Result<CapturedPhoto, HostError> {
        let Some(source) = self.source.as_deref() else {
            return Err(HostError::cancelled(self.name(), "no image selected"));
        };

        // Imports are taken as they are; the quality is only advisory.
        tracing::debug!(quality = options.quality, result = ?options.result, "importing {source}");

        let absolute = tokio::fs::canonicalize(source).await.map_err(|err| {
            HostError::builder(self.name(), err.kind().into(), err)
                .path(source.as_str())
                .context("locate image")
                .build()
        })?;
        let absolute = Utf8PathBuf::from_path_buf(absolute).map_err(|path| {
            HostError::new(
                self.name(),
                HostErrorKind::InvalidRequest,
                format!("non utf-8 path: {}", path.display()),
            )
        })?;
        let format = image_format(&absolute);

        match options.result {
            ResultType::Uri => {
                let web_path = url::Url::from_file_path(&absolute)
                    .map(String::from)
                    .map_err(|_| {
                        HostError::new(
                            self.name(),
                            HostErrorKind::InvalidRequest,
                            format!("not an absolute path: {absolute}"),
                        )
                    })?;
                Ok(CapturedPhoto {
                    path: Some(absolute.into_string()),
                    web_path: Some(web_path),
                    base64_string: None,
                    format,
                })
            }
            ResultType::Base64 => {
                let bytes = tokio::fs::read(&absolute)
                    .await
                    .map_err(|err| HostError::io(self.name(), err))?;
                Ok(CapturedPhoto {
                    path: None,
                    web_path: None,
                    base64_string: Some(encode_base64(bytes)),
                    format,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use host_driver::CameraSource;

    #[tokio::test]
    async fn empty_camera_is_cancelled() {
        let err = ImportCamera::empty()
            .capture(CaptureOptions::file_reference(50))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let err = ImportCamera::new("/definitely/not/here.jpeg")
            .capture(CaptureOptions::file_reference(50))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn imports_file_reference() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("IMG_0001.JPG");
        std::fs::write(&image, b"jpeg").unwrap();
        let image = Utf8PathBuf::from_path_buf(image).unwrap();

        let camera = ImportCamera::new(image.clone());
        let photo = camera
            .capture(CaptureOptions::file_reference(50))
            .await
            .unwrap();
        assert_eq!(photo.format, "jpeg");
        assert!(photo.path.as_deref().unwrap().ends_with("IMG_0001.JPG"));
        assert!(photo.web_path.as_deref().unwrap().starts_with("file:///"));
        assert_eq!(photo.base64_string, None);

        let inline = camera
            .capture(CaptureOptions {
                quality: 90,
                result: ResultType::Base64,
                source: CameraSource::Photos,
            })
            .await
            .unwrap();
        assert_eq!(inline.base64_string, Some(encode_base64(b"jpeg")));
    }

    #[test]
    fn formats() {
        assert_eq!(image_format(Utf8Path::new("a.png")), "png");
        assert_eq!(image_format(Utf8Path::new("a.jpg")), "jpeg");
        assert_eq!(image_format(Utf8Path::new("a")), "jpeg");
    }
}
