//! Infrastructure layer for the output surface.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `lectern_core`, but MUST NOT be imported by the `application` layer
//! (tests excepted).
//!
//! # Sub-modules
//!
//! - **`control_link`** – WebSocket client that connects to the control
//!   surface's bridge and forwards decoded envelopes.
//!
//! - **`player`** – `MediaPlayer` implementations: a headless clock player
//!   and a call-recording mock.
//!
//! - **`ui_bridge`** – Commands that expose store state to the renderer.

pub mod control_link;
pub mod player;
pub mod ui_bridge;
