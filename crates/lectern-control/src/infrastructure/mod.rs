//! Infrastructure layer for the control surface.
//!
//! Contains OS-facing adapters: display enumeration, output process
//! spawning, the WebSocket surface bridge, file-system storage, and the
//! UI command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `lectern_core`, but MUST NOT be imported by the `application` layer
//! (test-only mocks excepted).

pub mod display;
pub mod storage;
pub mod surface;
pub mod surface_bridge;
pub mod ui_bridge;
