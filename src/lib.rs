//! Filesystem semantics (directories, visibility, metadata, signed URLs) over a flat object store.

pub mod adapters;
pub mod compat;
pub mod fs;
pub mod listing;
pub mod metadata;
pub mod model;
pub mod options;
pub mod prefix;
pub mod signing;
pub mod util;

pub use compat::CompatAdapter;
pub use fs::{FileStoreAdapter, ObjectFS};
pub use model::fs::{ErrorKind, FSError};
pub use options::{Config, RequestOptions, Visibility};
