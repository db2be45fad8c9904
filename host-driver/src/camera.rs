use std::{fmt, ops::Deref, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// How the camera should hand back the captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultType {
    /// Inline bytes, base64 encoded.
    Base64,

    /// A reference to a file left on the device, with a web-servable path.
    Uri,
}

/// Where the image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraSource {
    /// Ask the user whether to use the camera or the photo library.
    #[default]
    Prompt,

    /// Take a new photo with the camera.
    Camera,

    /// Pick an existing photo from the library.
    Photos,
}

/// Options for a single capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// JPEG quality, 0 to 100.
    pub quality: u8,

    /// How the result should be returned.
    pub result: ResultType,

    /// Where the image comes from.
    pub source: CameraSource,
}

impl CaptureOptions {
    /// Capture a new camera photo as a file reference at the given quality.
    pub fn file_reference(quality: u8) -> Self {
        Self {
            quality: quality.min(100),
            result: ResultType::Uri,
            source: CameraSource::Camera,
        }
    }
}

/// A captured photo, as reported by the camera.
///
/// Which fields are populated depends on the requested [`ResultType`] and
/// the host: a native host reports `path`, a web view reports `web_path`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedPhoto {
    /// Device path of the captured file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Path a web view can load the capture from while it is alive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_path: Option<String>,

    /// Inline base64 contents, for [`ResultType::Base64`] captures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_string: Option<String>,

    /// Image format, such as `jpeg`.
    pub format: String,
}

/// Interactive device camera.
#[async_trait::async_trait]
pub trait Camera: fmt::Debug {
    /// The name of the camera backend.
    fn name(&self) -> &'static str;

    /// Capture a photo. The user backing out is reported as a
    /// [`Cancelled`](crate::HostErrorKind::Cancelled) error.
    async fn capture(&self, options: CaptureOptions) -> Result<CapturedPhoto, HostError>;
}

#[async_trait::async_trait]
impl<C> Camera for Arc<C>
where
    C: ?Sized + Camera + Sync + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.deref().name()
    }

    async fn capture(&self, options: CaptureOptions) -> Result<CapturedPhoto, HostError> {
        self.deref().capture(options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_obj_safe!(Camera);

    #[test]
    fn file_reference_clamps_quality() {
        let options = CaptureOptions::file_reference(150);
        assert_eq!(options.quality, 100);
        assert_eq!(options.result, ResultType::Uri);
        assert_eq!(options.source, CameraSource::Camera);
    }

    #[test]
    fn captured_photo_wire_names() {
        let photo: CapturedPhoto =
            serde_json::from_str(r#"{"webPath":"blob:http://localhost/1","format":"jpeg"}"#)
                .unwrap();
        assert_eq!(photo.web_path.as_deref(), Some("blob:http://localhost/1"));
        assert_eq!(photo.path, None);
    }
}
