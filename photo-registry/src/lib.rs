//! # Photo registry
//!
//! Capture photos, keep a reference to each one, list them newest first, and
//! delete them again. The registry sits on top of the host's camera, file
//! storage and key-value preferences, and keeps all three in step.
//!
//! The host is either native, with direct file and camera access, or a plain
//! web view. That choice is made once, through [`Host::select`], and decides
//! how photo files are named and how they are shown.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use photo_registry::{Config, ImportCamera};
//!
//! # async fn example() -> Result<(), photo_registry::Error> {
//! let mut registry = Config::default()
//!     .build(Arc::new(ImportCamera::new("IMG_0001.jpeg")))
//!     .await?;
//!
//! registry.hydrate().await?;
//! if let Some(photo) = registry.capture().await? {
//!     println!("captured {}", photo.file_path());
//! }
//! # Ok(())
//! # }
//! ```

mod camera;
mod clock;
mod config;
mod error;
mod host;
mod record;
mod registry;
mod resource;

pub use camera::ImportCamera;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, RegistryResult};
pub use host::{ArcFetch, Host, HostKind, NativeHost, WebViewHost, WebViewServer};
pub use record::PhotoRecord;
pub use registry::{ArcCamera, PhotoRegistry, DEFAULT_KEY, DEFAULT_QUALITY, FILE_EXTENSION};
pub use resource::{jpeg_data_uri, ResourceFetcher};
