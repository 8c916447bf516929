//! Mock display enumerator for unit testing.

use std::sync::Mutex;

use crate::application::surface_lifecycle::{DisplayEnumerator, DisplayError, DisplayInfo};

/// Returns a configurable display list; the list can be changed mid-test to
/// simulate a projector being plugged in.
#[derive(Debug, Default)]
pub struct MockDisplayEnumerator {
    displays: Mutex<Vec<DisplayInfo>>,
    pub should_fail: bool,
}

impl MockDisplayEnumerator {
    pub fn new(displays: Vec<DisplayInfo>) -> Self {
        Self {
            displays: Mutex::new(displays),
            should_fail: false,
        }
    }

    /// One 1920×1080 primary display.
    pub fn single() -> Self {
        Self::new(vec![primary_1080p()])
    }

    /// A 1920×1080 primary display with a 1280×720 projector to its right.
    pub fn dual() -> Self {
        Self::new(Self::dual_layout())
    }

    /// Enumeration always fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn dual_layout() -> Vec<DisplayInfo> {
        vec![
            primary_1080p(),
            DisplayInfo {
                display_id: 1,
                x_offset: 1920,
                y_offset: 0,
                width: 1280,
                height: 720,
                scale_factor: 100,
                is_primary: false,
            },
        ]
    }

    pub fn set_displays(&self, displays: Vec<DisplayInfo>) {
        *self.displays.lock().expect("lock poisoned") = displays;
    }
}

fn primary_1080p() -> DisplayInfo {
    DisplayInfo {
        display_id: 0,
        x_offset: 0,
        y_offset: 0,
        width: 1920,
        height: 1080,
        scale_factor: 100,
        is_primary: true,
    }
}

impl DisplayEnumerator for MockDisplayEnumerator {
    fn enumerate_displays(&self) -> Result<Vec<DisplayInfo>, DisplayError> {
        if self.should_fail {
            return Err(DisplayError::Platform("simulated failure".to_string()));
        }
        Ok(self.displays.lock().expect("lock poisoned").clone())
    }
}
