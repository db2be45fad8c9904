//! Error types for the photo registry

use host_driver::HostError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, Error>;

/// Error types for registry operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The camera failed, or the user denied access to it
    #[error("camera error: {0}")]
    Camera(#[source] HostError),

    /// File storage failed
    #[error("storage error: {0}")]
    Storage(#[source] HostError),

    /// The preference store failed
    #[error("preferences error: {0}")]
    Preferences(#[source] HostError),

    /// Fetching a display URI failed
    #[error("fetch error: {0}")]
    Fetch(#[source] HostError),

    /// Position past the end of the photo list
    #[error("no photo at position {position}, the list has {len}")]
    PositionOutOfRange {
        /// Requested position
        position: usize,
        /// Length of the list
        len: usize,
    },

    /// No photo with the given file path
    #[error("no photo with file path {0}")]
    UnknownPhoto(String),

    /// The camera result lacked a field the host needs
    #[error("camera result is missing its {0}")]
    MissingCapture(&'static str),

    /// The photo has nothing a display surface could load
    #[error("photo {0} has no display path")]
    MissingDisplayPath(String),

    /// The photo list could not be serialized
    #[error("serialize photo list: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// The host capability error behind this error, if any.
    pub fn host_error(&self) -> Option<&HostError> {
        match self {
            Error::Camera(err) | Error::Storage(err) | Error::Preferences(err) | Error::Fetch(err) => {
                Some(err)
            }
            _ => None,
        }
    }

    /// Whether a file or record was missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::UnknownPhoto(_) | Error::PositionOutOfRange { .. } => true,
            _ => self.host_error().is_some_and(HostError::is_not_found),
        }
    }
}
