use std::{fmt, ops::Deref, sync::Arc};

use bytes::Bytes;

use crate::error::HostError;

/// Runtime query distinguishing a host with native file and camera access
/// from a plain web view.
pub trait Platform: fmt::Debug {
    /// Whether the host has native file and camera access.
    fn is_native_capability_host(&self) -> bool;
}

impl Platform for bool {
    fn is_native_capability_host(&self) -> bool {
        *self
    }
}

/// Loads the payload behind a URI, the way a web view's `fetch` would.
#[async_trait::async_trait]
pub trait Fetch: fmt::Debug {
    /// Fetch the raw bytes behind `uri`.
    async fn fetch(&self, uri: &str) -> Result<Bytes, HostError>;
}

#[async_trait::async_trait]
impl<F> Fetch for Arc<F>
where
    F: ?Sized + Fetch + Sync + Send + 'static,
{
    async fn fetch(&self, uri: &str) -> Result<Bytes, HostError> {
        self.deref().fetch(uri).await
    }
}
