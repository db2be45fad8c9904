//! Platform-dependent handling of photo files.
//!
//! A native host stores full device URIs and serves them to the web view
//! through the local webview server. A plain web view stores bare file names
//! and has to inline the bytes as data URIs to show them.

use std::{fmt, sync::Arc};

use bytes::Bytes;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use host_driver::{encode_base64, CapturedPhoto, Fetch, Platform};
use host_storage::Partition;

use crate::error::{Error, RegistryResult};
use crate::record::PhotoRecord;
use crate::resource::jpeg_data_uri;

/// Shared handle to a resource fetcher.
pub type ArcFetch = Arc<dyn Fetch + Send + Sync>;

/// The two kinds of host the registry runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKind {
    /// A host with native file and camera access.
    #[default]
    Native,

    /// A plain web view.
    WebView,
}

impl Platform for HostKind {
    fn is_native_capability_host(&self) -> bool {
        matches!(self, HostKind::Native)
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKind::Native => f.write_str("native"),
            HostKind::WebView => f.write_str("web-view"),
        }
    }
}

/// The local server a native host's web view loads device files through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WebViewServer {
    /// URL scheme, `https` unless configured otherwise.
    pub scheme: String,

    /// Host name, `localhost` unless configured otherwise.
    pub hostname: String,
}

impl Default for WebViewServer {
    fn default() -> Self {
        Self {
            scheme: "https".into(),
            hostname: "localhost".into(),
        }
    }
}

impl WebViewServer {
    const FILE_PREFIX: &'static str = "/_capacitor_file_";
    const CONTENT_PREFIX: &'static str = "/_capacitor_content_";

    /// Scheme and host of the server, without a trailing slash.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.hostname)
    }

    /// Rewrite a device file URI or absolute path into a URL the web view
    /// can load. Anything else is returned unchanged.
    pub fn convert_file_src(&self, uri: &str) -> String {
        if uri.starts_with('/') {
            format!("{}{}{uri}", self.origin(), Self::FILE_PREFIX)
        } else if let Some(path) = uri.strip_prefix("file://") {
            format!("{}{}{path}", self.origin(), Self::FILE_PREFIX)
        } else if let Some(path) = uri.strip_prefix("content:/") {
            format!("{}{}{path}", self.origin(), Self::CONTENT_PREFIX)
        } else {
            uri.to_owned()
        }
    }

    /// The device path behind a URL produced by [`Self::convert_file_src`]
    /// for a file, if `uri` is one.
    pub fn local_path<'u>(&self, uri: &'u str) -> Option<&'u str> {
        uri.strip_prefix(self.scheme.as_str())?
            .strip_prefix("://")?
            .strip_prefix(self.hostname.as_str())?
            .strip_prefix(Self::FILE_PREFIX)
            .filter(|path| path.starts_with('/'))
    }
}

/// File handling for a host with native file and camera access.
#[derive(Debug, Clone)]
pub struct NativeHost {
    data: Partition,
    fetch: ArcFetch,
    server: WebViewServer,
}

/// File handling for a plain web view.
#[derive(Debug, Clone)]
pub struct WebViewHost {
    data: Partition,
    fetch: ArcFetch,
}

/// The platform strategy, chosen once at startup.
#[derive(Debug, Clone)]
pub enum Host {
    /// Native file and camera access.
    Native(NativeHost),

    /// Plain web view.
    WebView(WebViewHost),
}

impl Host {
    /// Pick the strategy for `platform`.
    pub fn select(
        platform: &dyn Platform,
        data: Partition,
        fetch: ArcFetch,
        server: WebViewServer,
    ) -> Self {
        if platform.is_native_capability_host() {
            Host::Native(NativeHost {
                data,
                fetch,
                server,
            })
        } else {
            Host::WebView(WebViewHost { data, fetch })
        }
    }

    /// Which kind of host this is.
    pub fn kind(&self) -> HostKind {
        match self {
            Host::Native(_) => HostKind::Native,
            Host::WebView(_) => HostKind::WebView,
        }
    }

    /// Whether this is a native host.
    pub fn is_native(&self) -> bool {
        matches!(self, Host::Native(_))
    }

    /// The storage partition photo files are kept in.
    pub fn data(&self) -> &Partition {
        match self {
            Host::Native(host) => &host.data,
            Host::WebView(host) => &host.data,
        }
    }

    fn fetcher(&self) -> &ArcFetch {
        match self {
            Host::Native(host) => &host.fetch,
            Host::WebView(host) => &host.fetch,
        }
    }

    /// Load a fresh capture as base64.
    ///
    /// A native host reads the camera's device file; a web view fetches the
    /// camera's web path. Inline captures are used as they are.
    pub async fn read_capture(&self, photo: &CapturedPhoto) -> RegistryResult<String> {
        if let Some(data) = &photo.base64_string {
            return Ok(data.clone());
        }

        match self {
            Host::Native(host) => {
                let path = photo.path.as_deref().ok_or(Error::MissingCapture("path"))?;
                host.data.read_uri(path).await.map_err(Error::Storage)
            }
            Host::WebView(host) => {
                let web_path = photo
                    .web_path
                    .as_deref()
                    .ok_or(Error::MissingCapture("web path"))?;
                let bytes = host.fetch.fetch(web_path).await.map_err(Error::Fetch)?;
                Ok(encode_base64(bytes))
            }
        }
    }

    /// Write base64 contents into the data partition, returning the URI.
    pub async fn write(&self, path: &Utf8Path, data: &str) -> RegistryResult<String> {
        self.data().write(path, data).await.map_err(Error::Storage)
    }

    /// Read a file from the data partition as base64.
    pub async fn read(&self, path: &Utf8Path) -> RegistryResult<String> {
        self.data().read(path).await.map_err(Error::Storage)
    }

    /// Delete a file from the data partition.
    pub async fn delete(&self, path: &Utf8Path) -> RegistryResult<()> {
        self.data().delete(path).await.map_err(Error::Storage)
    }

    /// Build the record for a capture just written as `file_name`, which
    /// storage reported at `saved_uri`.
    pub fn record_for(
        &self,
        saved_uri: String,
        file_name: &str,
        photo: &CapturedPhoto,
    ) -> PhotoRecord {
        match self {
            Host::Native(host) => {
                let display = host.server.convert_file_src(&saved_uri);
                PhotoRecord::new(saved_uri, Some(display))
            }
            // The camera's web path stays loadable for the rest of the session.
            Host::WebView(_) => PhotoRecord::new(file_name, photo.web_path.clone()),
        }
    }

    /// The URI a display surface should load for `record`.
    ///
    /// A web view re-reads the file and inlines it as a data URI; a native
    /// host keeps the stored display path.
    pub async fn display_path_for(&self, record: &PhotoRecord) -> RegistryResult<Option<String>> {
        match self {
            Host::Native(_) => Ok(record.display_path().map(str::to_owned)),
            Host::WebView(_) => {
                let data = self.read(Utf8Path::new(record.file_path())).await?;
                Ok(Some(jpeg_data_uri(&data)))
            }
        }
    }

    /// Fetch the bytes behind a display URI.
    pub async fn fetch(&self, uri: &str) -> RegistryResult<Bytes> {
        self.fetcher().fetch(uri).await.map_err(Error::Fetch)
    }
}
