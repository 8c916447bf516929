//! lectern-output library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does lectern-output do? (for beginners)
//!
//! The *output surface* is the window on the projector or second monitor.
//! The control surface starts it on the secondary display and passes a
//! WebSocket URL on the command line.  The output surface:
//!
//! 1. Connects to that URL.  The connection itself tells the control surface
//!    that the output finished loading.
//! 2. Receives a full state replay, then one envelope per change.
//! 3. Applies every envelope to its own copy of the domain stores.
//! 4. Keeps video playback aligned with the control surface's clock using
//!    the drift-correction engine.
//! 5. Exposes the store state to the renderer through `ui_bridge`.

/// Application layer: use cases for the output surface.
pub mod application;

/// Infrastructure layer: control link, players, and the renderer bridge.
pub mod infrastructure;
