//! Surface Lifecycle Manager: creates, checks, and closes the output surface.
//!
//! # State machine
//!
//! ```text
//!            ensure() ─ no eligible display ──► NoSecondDisplay
//!               │                                   │ ensure() retries
//!               ▼                                   ▼
//!   Absent ──ensure()──► Opening ──mark_loaded()──► Attached
//!     ▲                    │                          │
//!     └──── close() / surface_lost() / creation failure ┘
//! ```
//!
//! Every transition that observers care about is published as a
//! [`LifecycleEvent`] on the channel returned by
//! [`SurfaceLifecycleManager::new`].  The control session reacts to
//! [`LifecycleEvent::Opened`] with a full-state resync.
//!
//! Creation failure (the platform refused to open a window, the output
//! process could not be spawned, …) is a distinct outcome from "there is no
//! second display".  Neither crashes the control surface; it simply keeps
//! running in single-surface mode.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifies one output surface instance.  A fresh id is minted for every
/// creation attempt, so events about an old surface cannot be confused with
/// the current one.
pub type SurfaceId = Uuid;

// ── Ports ─────────────────────────────────────────────────────────────────────

/// One physical display as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub display_id: u32,
    /// Horizontal offset of the top-left corner in desktop coordinates.
    pub x_offset: i32,
    pub y_offset: i32,
    pub width: u32,
    pub height: u32,
    /// DPI scale in percent (100 = 96 DPI).
    pub scale_factor: u32,
    pub is_primary: bool,
}

/// Error type for display enumeration.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("platform error while enumerating displays: {0}")]
    Platform(String),
}

/// Lists the displays currently connected.
pub trait DisplayEnumerator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`DisplayError`] if the display list cannot be retrieved.
    fn enumerate_displays(&self) -> Result<Vec<DisplayInfo>, DisplayError>;
}

/// Error type for creating an output surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface creation denied: {0}")]
    CreationDenied(String),
    #[error("platform error: {0}")]
    Platform(String),
}

/// Creates and destroys output surfaces on a given display.
pub trait SurfaceFactory: Send + Sync {
    /// Starts creating a surface.  Success means the surface exists and is
    /// loading; it reports back (through the transport) once loaded.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the platform refuses to create it.
    fn create(&self, id: SurfaceId, display: &DisplayInfo) -> Result<(), SurfaceError>;

    /// Tears the surface down.  Unknown ids are ignored.
    fn destroy(&self, id: SurfaceId);
}

/// Picks the display the output surface should use: the first non-primary one.
pub fn eligible_display(displays: &[DisplayInfo]) -> Option<&DisplayInfo> {
    displays.iter().find(|d| !d.is_primary)
}

// ── State and events ──────────────────────────────────────────────────────────

/// Observable state of the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Absent,
    Opening,
    Attached,
    NoSecondDisplay,
}

/// Lifecycle notifications for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The surface finished its initial load and is ready for messages.
    Opened { surface_id: SurfaceId },
    /// The surface is gone (closed by us, or lost on its own).
    Closed { surface_id: SurfaceId },
    /// No eligible secondary display exists; projection is unavailable.
    NoSecondDisplay,
    /// The platform refused to create the surface.
    CreationFailed { reason: String },
}

/// Result of [`SurfaceLifecycleManager::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// A new surface is being created.
    Opening(SurfaceId),
    /// A surface already exists (opening or attached); nothing was done.
    AlreadyPresent(SurfaceState),
    NoSecondDisplay,
    CreationFailed(String),
}

// ── Manager ───────────────────────────────────────────────────────────────────

/// Owns the output surface state machine.
pub struct SurfaceLifecycleManager {
    displays: Arc<dyn DisplayEnumerator>,
    factory: Arc<dyn SurfaceFactory>,
    state: SurfaceState,
    current: Option<SurfaceId>,
    events: mpsc::UnboundedSender<LifecycleEvent>,
}

impl SurfaceLifecycleManager {
    /// Creates a manager in the `Absent` state.
    ///
    /// Returns the manager and the receiving end of its lifecycle events.
    pub fn new(
        displays: Arc<dyn DisplayEnumerator>,
        factory: Arc<dyn SurfaceFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                displays,
                factory,
                state: SurfaceState::Absent,
                current: None,
                events,
            },
            rx,
        )
    }

    /// Makes sure an output surface exists or is being created.
    ///
    /// From `Absent` or `NoSecondDisplay`, looks for an eligible display and
    /// asks the factory for a surface.  From `Opening` or `Attached`, does
    /// nothing.
    pub fn ensure(&mut self) -> EnsureOutcome {
        match self.state {
            SurfaceState::Opening | SurfaceState::Attached => {
                return EnsureOutcome::AlreadyPresent(self.state)
            }
            SurfaceState::Absent | SurfaceState::NoSecondDisplay => {}
        }

        let displays = match self.displays.enumerate_displays() {
            Ok(d) => d,
            Err(e) => {
                let reason = e.to_string();
                warn!("cannot open output surface: {reason}");
                self.state = SurfaceState::Absent;
                self.emit(LifecycleEvent::CreationFailed {
                    reason: reason.clone(),
                });
                return EnsureOutcome::CreationFailed(reason);
            }
        };

        let Some(target) = eligible_display(&displays) else {
            info!("no secondary display connected; projection unavailable");
            self.state = SurfaceState::NoSecondDisplay;
            self.emit(LifecycleEvent::NoSecondDisplay);
            return EnsureOutcome::NoSecondDisplay;
        };

        let id = Uuid::new_v4();
        match self.factory.create(id, target) {
            Ok(()) => {
                info!(
                    surface_id = %id,
                    display_id = target.display_id,
                    "output surface opening on {}x{}",
                    target.width,
                    target.height
                );
                self.state = SurfaceState::Opening;
                self.current = Some(id);
                EnsureOutcome::Opening(id)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("output surface creation failed: {reason}");
                self.state = SurfaceState::Absent;
                self.current = None;
                self.emit(LifecycleEvent::CreationFailed {
                    reason: reason.clone(),
                });
                EnsureOutcome::CreationFailed(reason)
            }
        }
    }

    /// Current state.  No side effects.
    pub fn check(&self) -> SurfaceState {
        self.state
    }

    /// Whether the output surface is attached right now.
    pub fn is_attached(&self) -> bool {
        self.state == SurfaceState::Attached
    }

    /// The surface currently opening or attached.
    pub fn current_surface(&self) -> Option<SurfaceId> {
        self.current
    }

    /// Whether `id` is the surface this manager spawned and still tracks.
    /// Connections from any other id must not be attached.
    pub fn expects(&self, id: SurfaceId) -> bool {
        matches!(self.state, SurfaceState::Opening | SurfaceState::Attached)
            && self.current == Some(id)
    }

    /// Records that surface `id` finished its initial load.
    ///
    /// Moves `Opening → Attached` and emits `Opened`.  Ignored (returns
    /// `false`) for any id other than the one currently opening.
    pub fn mark_loaded(&mut self, id: SurfaceId) -> bool {
        if self.state != SurfaceState::Opening || self.current != Some(id) {
            debug!(surface_id = %id, state = ?self.state, "ignoring load report");
            return false;
        }
        self.state = SurfaceState::Attached;
        info!(surface_id = %id, "output surface attached");
        self.emit(LifecycleEvent::Opened { surface_id: id });
        true
    }

    /// Tears down the surface and returns to `Absent`.
    ///
    /// From `NoSecondDisplay` this only resets the state.  Returns `false`
    /// when already `Absent`.
    pub fn close(&mut self) -> bool {
        match self.state {
            SurfaceState::Absent => false,
            SurfaceState::NoSecondDisplay => {
                self.state = SurfaceState::Absent;
                true
            }
            SurfaceState::Opening | SurfaceState::Attached => {
                if let Some(id) = self.current.take() {
                    self.factory.destroy(id);
                    info!(surface_id = %id, "output surface closed");
                    self.emit(LifecycleEvent::Closed { surface_id: id });
                }
                self.state = SurfaceState::Absent;
                true
            }
        }
    }

    /// Records that surface `id` went away on its own (window closed,
    /// process exited, connection dropped).  Stale ids are ignored.
    pub fn surface_lost(&mut self, id: SurfaceId) -> bool {
        if self.current != Some(id) {
            return false;
        }
        self.current = None;
        self.state = SurfaceState::Absent;
        self.factory.destroy(id);
        warn!(surface_id = %id, "output surface lost");
        self.emit(LifecycleEvent::Closed { surface_id: id });
        true
    }

    fn emit(&self, event: LifecycleEvent) {
        // Nobody listening is fine; the state is still queryable via check().
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::display::mock::MockDisplayEnumerator;
    use crate::infrastructure::surface::mock::MockSurfaceFactory;

    fn make_manager(
        displays: MockDisplayEnumerator,
        factory: MockSurfaceFactory,
    ) -> (
        SurfaceLifecycleManager,
        mpsc::UnboundedReceiver<LifecycleEvent>,
        Arc<MockDisplayEnumerator>,
        Arc<MockSurfaceFactory>,
    ) {
        let displays = Arc::new(displays);
        let factory = Arc::new(factory);
        let (mgr, rx) = SurfaceLifecycleManager::new(
            Arc::clone(&displays) as Arc<dyn DisplayEnumerator>,
            Arc::clone(&factory) as Arc<dyn SurfaceFactory>,
        );
        (mgr, rx, displays, factory)
    }

    fn opening_id(outcome: EnsureOutcome) -> SurfaceId {
        match outcome {
            EnsureOutcome::Opening(id) => id,
            other => panic!("expected Opening, got {:?}", other),
        }
    }

    #[test]
    fn test_initial_state_is_absent() {
        let (mgr, _rx, _, _) = make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());

        assert_eq!(mgr.check(), SurfaceState::Absent);
        assert!(!mgr.is_attached());
    }

    #[test]
    fn test_ensure_with_single_display_reports_no_second_display() {
        // Arrange
        let (mut mgr, mut rx, _, factory) =
            make_manager(MockDisplayEnumerator::single(), MockSurfaceFactory::new());

        // Act
        let outcome = mgr.ensure();

        // Assert
        assert_eq!(outcome, EnsureOutcome::NoSecondDisplay);
        assert_eq!(mgr.check(), SurfaceState::NoSecondDisplay);
        assert_eq!(rx.try_recv().ok(), Some(LifecycleEvent::NoSecondDisplay));
        assert!(factory.created.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ensure_opens_on_first_non_primary_display() {
        // Arrange
        let (mut mgr, _rx, _, factory) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());

        // Act
        let id = opening_id(mgr.ensure());

        // Assert
        assert_eq!(mgr.check(), SurfaceState::Opening);
        let created = factory.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, id);
        assert!(!created[0].1.is_primary);
    }

    #[test]
    fn test_mark_loaded_attaches_and_emits_opened() {
        // Arrange
        let (mut mgr, mut rx, _, _) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());
        let id = opening_id(mgr.ensure());

        // Act
        let attached = mgr.mark_loaded(id);

        // Assert
        assert!(attached);
        assert!(mgr.is_attached());
        assert_eq!(
            rx.try_recv().ok(),
            Some(LifecycleEvent::Opened { surface_id: id })
        );
    }

    #[test]
    fn test_mark_loaded_with_stale_id_is_ignored() {
        let (mut mgr, _rx, _, _) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());
        mgr.ensure();

        assert!(!mgr.mark_loaded(Uuid::new_v4()));
        assert_eq!(mgr.check(), SurfaceState::Opening);
    }

    #[test]
    fn test_ensure_while_present_is_a_no_op() {
        let (mut mgr, _rx, _, factory) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());
        let id = opening_id(mgr.ensure());

        assert_eq!(
            mgr.ensure(),
            EnsureOutcome::AlreadyPresent(SurfaceState::Opening)
        );
        mgr.mark_loaded(id);
        assert_eq!(
            mgr.ensure(),
            EnsureOutcome::AlreadyPresent(SurfaceState::Attached)
        );
        assert_eq!(factory.created.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_creation_failure_is_distinct_and_returns_to_absent() {
        // Arrange
        let (mut mgr, mut rx, _, _) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::failing());

        // Act
        let outcome = mgr.ensure();

        // Assert
        assert!(matches!(outcome, EnsureOutcome::CreationFailed(_)));
        assert_eq!(mgr.check(), SurfaceState::Absent);
        assert!(matches!(
            rx.try_recv(),
            Ok(LifecycleEvent::CreationFailed { .. })
        ));
    }

    #[test]
    fn test_enumeration_error_is_reported_as_creation_failure() {
        let (mut mgr, _rx, _, _) =
            make_manager(MockDisplayEnumerator::failing(), MockSurfaceFactory::new());

        assert!(matches!(mgr.ensure(), EnsureOutcome::CreationFailed(_)));
        assert_eq!(mgr.check(), SurfaceState::Absent);
    }

    #[test]
    fn test_ensure_retries_after_display_is_connected() {
        // Arrange
        let (mut mgr, _rx, displays, _) =
            make_manager(MockDisplayEnumerator::single(), MockSurfaceFactory::new());
        assert_eq!(mgr.ensure(), EnsureOutcome::NoSecondDisplay);

        // Act – a projector gets plugged in
        displays.set_displays(MockDisplayEnumerator::dual_layout());
        let outcome = mgr.ensure();

        // Assert
        assert!(matches!(outcome, EnsureOutcome::Opening(_)));
        assert_eq!(mgr.check(), SurfaceState::Opening);
    }

    #[test]
    fn test_close_destroys_surface_and_emits_closed() {
        // Arrange
        let (mut mgr, mut rx, _, factory) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());
        let id = opening_id(mgr.ensure());
        mgr.mark_loaded(id);
        let _ = rx.try_recv();

        // Act
        let closed = mgr.close();

        // Assert
        assert!(closed);
        assert_eq!(mgr.check(), SurfaceState::Absent);
        assert_eq!(*factory.destroyed.lock().unwrap(), vec![id]);
        assert_eq!(
            rx.try_recv().ok(),
            Some(LifecycleEvent::Closed { surface_id: id })
        );
    }

    #[test]
    fn test_close_when_absent_returns_false() {
        let (mut mgr, _rx, _, _) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());

        assert!(!mgr.close());
    }

    #[test]
    fn test_surface_lost_returns_to_absent_and_allows_reattach() {
        // Arrange
        let (mut mgr, mut rx, _, _) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());
        let first = opening_id(mgr.ensure());
        mgr.mark_loaded(first);

        // Act
        assert!(mgr.surface_lost(first));
        let second = opening_id(mgr.ensure());
        mgr.mark_loaded(second);

        // Assert
        assert_ne!(first, second);
        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                LifecycleEvent::Opened { surface_id: first },
                LifecycleEvent::Closed { surface_id: first },
                LifecycleEvent::Opened { surface_id: second },
            ]
        );
    }

    #[test]
    fn test_expects_only_the_spawned_surface() {
        // Arrange
        let (mut mgr, _rx, _, _) =
            make_manager(MockDisplayEnumerator::dual(), MockSurfaceFactory::new());
        let stranger = uuid::Uuid::new_v4();
        assert!(!mgr.expects(stranger));

        // Act
        let id = opening_id(mgr.ensure());

        // Assert
        assert!(mgr.expects(id));
        assert!(!mgr.expects(stranger));
        mgr.mark_loaded(id);
        assert!(mgr.expects(id));
        mgr.close();
        assert!(!mgr.expects(id));
    }

    #[test]
    fn test_eligible_display_skips_primary() {
        let displays = MockDisplayEnumerator::dual_layout();

        let chosen = eligible_display(&displays).expect("secondary display");

        assert_eq!(chosen.display_id, 1);
    }
}
