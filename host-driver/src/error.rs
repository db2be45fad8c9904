use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use tracing_error::SpanTrace;

use crate::Directory;

/// Categorizes host capability errors by their semantic meaning, independent
/// of which camera, filesystem or preference backend produced them.
///
/// Callers use the kind to decide how to respond without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostErrorKind {
    /// The requested file or resource was not found.
    ///
    /// **Caller action:** Check the path, or handle as a missing resource.
    NotFound,

    /// The user or the operating system refused access (camera permission,
    /// file permissions).
    ///
    /// **Caller action:** Ask the user to grant the permission.
    PermissionDenied,

    /// The user dismissed an interactive prompt, such as the camera.
    ///
    /// **Caller action:** Abort quietly; this is not a failure.
    Cancelled,

    /// The operation failed due to a disk or device I/O error.
    Io,

    /// The capability is not available on this host.
    Unavailable,

    /// The request was invalid (bad parameters, unsupported URI, etc.).
    InvalidRequest,

    /// Data encoding or decoding failed.
    SerializationError,

    /// An unexpected or uncategorized error occurred.
    Other,
}

impl HostErrorKind {
    /// Returns whether this kind represents the user backing out rather than
    /// an actual failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, HostErrorKind::Cancelled)
    }
}

impl fmt::Display for HostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostErrorKind::NotFound => write!(f, "not found"),
            HostErrorKind::PermissionDenied => write!(f, "permission denied"),
            HostErrorKind::Cancelled => write!(f, "cancelled"),
            HostErrorKind::Io => write!(f, "I/O error"),
            HostErrorKind::Unavailable => write!(f, "unavailable"),
            HostErrorKind::InvalidRequest => write!(f, "invalid request"),
            HostErrorKind::SerializationError => write!(f, "serialization error"),
            HostErrorKind::Other => write!(f, "other error"),
        }
    }
}

impl From<std::io::ErrorKind> for HostErrorKind {
    fn from(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::NotFound => HostErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => HostErrorKind::PermissionDenied,
            _ => HostErrorKind::Io,
        }
    }
}

#[derive(Debug)]
struct ErrorTrace {
    /// Note: Backtrace capture is controlled by RUST_BACKTRACE environment variable.
    backtrace: Backtrace,

    /// Span context at the point where the error was created.
    span_trace: SpanTrace,
}

impl ErrorTrace {
    #[track_caller]
    fn capture() -> Self {
        ErrorTrace {
            backtrace: Backtrace::capture(),
            span_trace: SpanTrace::capture(),
        }
    }
}

/// Error produced by a host capability (camera, filesystem, preferences,
/// resource fetching).
///
/// Carries the semantic [`HostErrorKind`], the engine which produced it,
/// optional directory/path context, the underlying error, and a backtrace
/// plus span trace captured at construction.
///
/// # Example
///
/// ```rust
/// use host_driver::{Directory, HostError, HostErrorKind};
///
/// let error = HostError::builder(
///     "local",
///     HostErrorKind::NotFound,
///     std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
/// )
/// .directory(Directory::Data)
/// .path("1700000000000.jpeg")
/// .build();
///
/// assert_eq!(error.kind(), HostErrorKind::NotFound);
/// ```
#[derive(Debug)]
pub struct HostError {
    kind: HostErrorKind,
    engine: &'static str,
    directory: Option<Directory>,
    path: Option<String>,
    context: Option<String>,
    source: Box<dyn StdError + Send + Sync + 'static>,
    traces: Box<ErrorTrace>,
}

impl StdError for HostError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

impl HostError {
    /// Create a new host error with the minimum required information.
    ///
    /// For more control, use `HostError::builder()`.
    pub fn new<E>(engine: &'static str, kind: HostErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            kind,
            engine,
            directory: None,
            path: None,
            context: None,
            source: error.into(),
            traces: Box::new(ErrorTrace::capture()),
        }
    }

    /// Create a builder for a host error with full context.
    pub fn builder<E>(engine: &'static str, kind: HostErrorKind, error: E) -> HostErrorBuilder
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        HostErrorBuilder {
            engine,
            kind,
            source: error.into(),
            directory: None,
            path: None,
            context: None,
        }
    }

    /// Returns a boxed closure that creates a host error from a downstream error.
    ///
    /// This is useful with `.map_err()` for simple error conversion.
    ///
    /// ```rust
    /// use host_driver::{HostError, HostErrorKind};
    ///
    /// fn operation() -> Result<(), HostError> {
    ///     std::fs::File::open("photo.jpeg")
    ///         .map_err(HostError::with("local", HostErrorKind::Io))?;
    ///     Ok(())
    /// }
    /// ```
    pub fn with<E>(
        engine: &'static str,
        kind: HostErrorKind,
    ) -> Box<dyn FnOnce(E) -> HostError + Send + Sync>
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Box::new(move |error: E| HostError::new(engine, kind, error))
    }

    /// Convert an I/O error, picking the kind from the I/O error kind.
    pub fn io(engine: &'static str, error: std::io::Error) -> Self {
        HostError::new(engine, error.kind().into(), error)
    }

    /// Shorthand for a `Cancelled` error, used by interactive capabilities
    /// when the user backs out.
    pub fn cancelled(engine: &'static str, message: impl Into<String>) -> Self {
        HostError::new(engine, HostErrorKind::Cancelled, message.into())
    }

    /// Returns the error kind.
    pub fn kind(&self) -> HostErrorKind {
        self.kind
    }

    /// Returns the engine name.
    pub fn engine(&self) -> &'static str {
        self.engine
    }

    /// Returns the directory, if available.
    pub fn directory(&self) -> Option<Directory> {
        self.directory
    }

    /// Returns the file path, if available.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns additional context, if available.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns whether the user backed out of the operation.
    pub fn is_cancelled(&self) -> bool {
        self.kind.is_cancellation()
    }

    /// Returns whether the resource was missing.
    pub fn is_not_found(&self) -> bool {
        self.kind == HostErrorKind::NotFound
    }

    /// Returns a reference to the captured backtrace.
    pub fn backtrace(&self) -> &Backtrace {
        &self.traces.backtrace
    }

    /// Returns a reference to the captured span trace.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.traces.span_trace
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host error [{}] from {}", self.kind, self.engine)?;

        if let Some(directory) = &self.directory {
            write!(f, " (directory: {})", directory)?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }

        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }

        write!(f, ": {}", self.source)
    }
}

/// Builder for constructing `HostError` with optional context fields.
#[derive(Debug)]
pub struct HostErrorBuilder {
    kind: HostErrorKind,
    engine: &'static str,
    source: Box<dyn StdError + Send + Sync + 'static>,
    directory: Option<Directory>,
    path: Option<String>,
    context: Option<String>,
}

impl HostErrorBuilder {
    /// Set the directory.
    pub fn directory(mut self, directory: Directory) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set the file path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set additional context.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Build the `HostError`.
    pub fn build(self) -> HostError {
        HostError {
            kind: self.kind,
            engine: self.engine,
            directory: self.directory,
            path: self.path,
            context: self.context,
            source: self.source,
            traces: Box::new(ErrorTrace::capture()),
        }
    }
}
