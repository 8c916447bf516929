//! Domain layer for lectern-resource.
//!
//! Pure types with no I/O: the server configuration, byte ranges, and the
//! extension → content type table.

pub mod config;
pub mod resource;

pub use config::{ResourceServerConfig, DEFAULT_RESOURCE_PORT};
pub use resource::{content_type_for, ByteRange};
