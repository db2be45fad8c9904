//! # Host capabilities
//!
//! Traits for the device capabilities a photo registry is built on: the
//! camera, file storage, key-value preferences, resource fetching, and the
//! platform query which tells a native host apart from a web view.

mod camera;
mod error;
mod filesystem;
mod platform;
mod preferences;

pub use camera::{Camera, CameraSource, CaptureOptions, CapturedPhoto, ResultType};
pub use error::{HostError, HostErrorBuilder, HostErrorKind};
pub use filesystem::{decode_base64, encode_base64, Directory, Filesystem, UnknownDirectory};
pub use platform::{Fetch, Platform};
pub use preferences::Preferences;
