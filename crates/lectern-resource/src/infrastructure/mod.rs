//! Infrastructure layer for lectern-resource.
//!
//! Owns the socket: binds the listener, routes requests through axum, and
//! streams file bytes.  Path decisions are delegated to
//! [`crate::application::ResourcePolicy`].

pub mod http_server;

pub use http_server::{router, run_server, serve};
