use bytes::Bytes;
use percent_encoding::percent_decode_str;

use host_driver::{decode_base64, Fetch, HostError, HostErrorKind};
use host_storage::ArcFilesystem;

use crate::host::WebViewServer;

/// A `data:` URI carrying base64 JPEG bytes.
pub fn jpeg_data_uri(base64: &str) -> String {
    format!("data:{};base64,{base64}", mime::IMAGE_JPEG)
}

/// Decode the payload of a `data:` URI (without the `data:` prefix).
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, HostError> {
    let (meta, payload) = uri.split_once(',').ok_or_else(|| {
        HostError::builder(
            "data-uri",
            HostErrorKind::InvalidRequest,
            "data uri has no payload",
        )
        .context(uri.chars().take(32).collect::<String>())
        .build()
    })?;

    if meta.ends_with(";base64") {
        decode_base64("data-uri", payload)
    } else {
        Ok(percent_decode_str(payload).collect())
    }
}

/// Fetches display URIs the way the web view would load them.
///
/// Handles inline `data:` URIs, `file://` URIs and absolute paths, and the
/// webview server's file URLs. File reads go through the host filesystem.
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
    filesystem: ArcFilesystem,
    server: WebViewServer,
}

impl ResourceFetcher {
    /// Create a fetcher reading files through `filesystem`.
    pub fn new(filesystem: ArcFilesystem, server: WebViewServer) -> Self {
        Self { filesystem, server }
    }

    async fn read_file(&self, uri: &str) -> Result<Vec<u8>, HostError> {
        let data = self.filesystem.read_uri(uri).await?;
        decode_base64(self.filesystem.name(), &data)
    }
}

#[async_trait::async_trait]
impl Fetch for ResourceFetcher {
    #[tracing::instrument(level = "trace", skip(self, uri))]
    async fn fetch(&self, uri: &str) -> Result<Bytes, HostError> {
        let bytes = if let Some(rest) = uri.strip_prefix("data:") {
            decode_data_uri(rest)?
        } else if uri.starts_with("file:") || uri.starts_with('/') {
            self.read_file(uri).await?
        } else if let Some(path) = self.server.local_path(uri) {
            let path = percent_decode_str(path).decode_utf8().map_err(|err| {
                HostError::builder("fetch", HostErrorKind::InvalidRequest, err)
                    .path(uri)
                    .build()
            })?;
            tracing::trace!(%path, "fetch through webview server");
            self.read_file(&path).await?
        } else {
            return Err(HostError::builder(
                "fetch",
                HostErrorKind::InvalidRequest,
                format!("unsupported uri: {uri}"),
            )
            .path(uri)
            .build());
        };

        Ok(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use host_driver::encode_base64;
    use host_storage::MemoryFilesystem;

    fn fetcher() -> (Arc<MemoryFilesystem>, ResourceFetcher) {
        let memory = Arc::new(MemoryFilesystem::new());
        let fetcher = ResourceFetcher::new(memory.clone(), WebViewServer::default());
        (memory, fetcher)
    }

    #[test]
    fn jpeg_data_uri_prefix() {
        assert_eq!(jpeg_data_uri("AAAA"), "data:image/jpeg;base64,AAAA");
    }

    #[tokio::test]
    async fn data_uris() {
        let (_, fetcher) = fetcher();
        let uri = jpeg_data_uri(&encode_base64(b"\xff\xd8"));
        assert_eq!(fetcher.fetch(&uri).await.unwrap(), Bytes::from_static(b"\xff\xd8"));

        assert_eq!(
            fetcher.fetch("data:text/plain,hello%20there").await.unwrap(),
            Bytes::from_static(b"hello there")
        );

        let err = fetcher.fetch("data:image/jpeg;base64").await.unwrap_err();
        assert_eq!(err.kind(), HostErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn file_uris() {
        let (memory, fetcher) = fetcher();
        memory.insert_external("/tmp/cap.jpeg", b"cap".to_vec()).await;

        assert_eq!(
            fetcher.fetch("file:///tmp/cap.jpeg").await.unwrap(),
            Bytes::from_static(b"cap")
        );
        assert_eq!(
            fetcher
                .fetch("https://localhost/_capacitor_file_/tmp/cap.jpeg")
                .await
                .unwrap(),
            Bytes::from_static(b"cap")
        );
        assert!(fetcher
            .fetch("file:///tmp/missing.jpeg")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn server_urls_are_percent_decoded() {
        let (memory, fetcher) = fetcher();
        memory
            .insert_external("/tmp/my photos/café.jpeg", b"cafe".to_vec())
            .await;

        assert_eq!(
            fetcher
                .fetch("https://localhost/_capacitor_file_/tmp/my%20photos/caf%C3%A9.jpeg")
                .await
                .unwrap(),
            Bytes::from_static(b"cafe")
        );

        let err = fetcher
            .fetch("https://localhost/_capacitor_file_/tmp/%FF.jpeg")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), HostErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn unsupported_schemes() {
        let (_, fetcher) = fetcher();
        let err = fetcher.fetch("blob:http://localhost/1").await.unwrap_err();
        assert_eq!(err.kind(), HostErrorKind::InvalidRequest);
        assert_eq!(err.path(), Some("blob:http://localhost/1"));
    }
}
