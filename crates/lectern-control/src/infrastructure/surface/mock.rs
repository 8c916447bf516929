//! Mock surface factory for unit testing.

use std::sync::Mutex;

use crate::application::surface_lifecycle::{DisplayInfo, SurfaceError, SurfaceFactory, SurfaceId};

/// Records every create/destroy call.
#[derive(Debug, Default)]
pub struct MockSurfaceFactory {
    pub created: Mutex<Vec<(SurfaceId, DisplayInfo)>>,
    pub destroyed: Mutex<Vec<SurfaceId>>,
    pub should_fail: bool,
}

impl MockSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `create` is refused.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }
}

impl SurfaceFactory for MockSurfaceFactory {
    fn create(&self, id: SurfaceId, display: &DisplayInfo) -> Result<(), SurfaceError> {
        if self.should_fail {
            return Err(SurfaceError::CreationDenied("simulated refusal".to_string()));
        }
        self.created
            .lock()
            .expect("lock poisoned")
            .push((id, display.clone()));
        Ok(())
    }

    fn destroy(&self, id: SurfaceId) {
        self.destroyed.lock().expect("lock poisoned").push(id);
    }
}
