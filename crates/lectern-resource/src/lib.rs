//! lectern-resource library crate.
//!
//! Serves files from one allowed root over loopback HTTP so the output
//! surface can render video, images and PDFs by resource path instead of by
//! filesystem path.
//!
//! # Architecture
//!
//! ```text
//! Output surface  (GET /media/clip.mp4, Range: bytes=...)
//!         ↕
//! [lectern-resource]
//!   ├── domain/           ResourceServerConfig, ByteRange, content types
//!   ├── application/      ResourcePolicy: path → file inside the root, or 403/404
//!   └── infrastructure/
//!         └── http_server/ axum router, streaming, graceful shutdown
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` touches the filesystem only to canonicalize and stat.
//! - `infrastructure` owns sockets and file streams.
//!
//! The control surface embeds the server through [`infrastructure::run_server`];
//! the `lectern-resource` binary runs it standalone.

/// Domain layer: configuration, byte ranges, content types.
pub mod domain;

/// Application layer: the path policy.
pub mod application;

/// Infrastructure layer: HTTP server.
pub mod infrastructure;
