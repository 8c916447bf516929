//! Application layer use cases for the control surface.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (the stores and message model in `lectern_core`) and the infrastructure
//! (sockets, child processes, files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil an operator goal (e.g., "show
//!   John 3:16 on the projector").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the infrastructure can be swapped without changing this code.
//! - **Contain no OS calls, no network I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`control_session`**    – Operator intents → local store update +
//!   outbound envelope; full-state resync when the output surface attaches.
//! - **`surface_lifecycle`**  – The output surface state machine
//!   (absent / opening / attached / no second display).
//! - **`playback_reporter`**  – Throttle for periodic video position reports.
//! - **`content_forwarding`** – Streams Bible text from a provider to the
//!   output surface in chunks.
//! - **`settings`**           – Persisted operator settings port.

pub mod content_forwarding;
pub mod control_session;
pub mod playback_reporter;
pub mod settings;
pub mod surface_lifecycle;
