use std::{fmt, ops::Deref, sync::Arc};

use crate::error::HostError;

/// Key-value preference storage provided by the host.
///
/// Values are opaque strings; callers serialize their own structures.
#[async_trait::async_trait]
pub trait Preferences: fmt::Debug {
    /// The name of the backend.
    fn name(&self) -> &'static str;

    /// Get the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, HostError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), HostError>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), HostError>;

    /// List all stored keys.
    async fn keys(&self) -> Result<Vec<String>, HostError>;
}

#[async_trait::async_trait]
impl<P> Preferences for Arc<P>
where
    P: ?Sized + Preferences + Sync + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.deref().name()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        self.deref().get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        self.deref().set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), HostError> {
        self.deref().remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, HostError> {
        self.deref().keys().await
    }
}
