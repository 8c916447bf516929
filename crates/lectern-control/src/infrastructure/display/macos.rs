//! macOS display enumeration via Core Graphics.
//!
//! Core Graphics puts the origin at the bottom-left of the main display;
//! offsets are flipped to a top-left origin to match Windows.

use core_graphics::display::{CGDisplay, CGDisplayBounds};

use crate::application::surface_lifecycle::{DisplayEnumerator, DisplayError, DisplayInfo};

/// Enumerates the active displays.
#[derive(Debug, Default)]
pub struct MacosDisplays;

impl MacosDisplays {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayEnumerator for MacosDisplays {
    fn enumerate_displays(&self) -> Result<Vec<DisplayInfo>, DisplayError> {
        let active = CGDisplay::active_displays()
            .map_err(|e| DisplayError::Platform(format!("CGGetActiveDisplayList: {e}")))?;
        if active.is_empty() {
            return Err(DisplayError::Platform(
                "CGGetActiveDisplayList returned zero displays".to_string(),
            ));
        }

        let main_id = CGDisplay::main().id;
        let main_height = CGDisplayBounds(main_id).size.height as i32;

        let mut displays: Vec<DisplayInfo> = active
            .iter()
            .map(|&id| {
                let bounds = CGDisplayBounds(id);
                let height = bounds.size.height as u32;
                DisplayInfo {
                    display_id: id,
                    x_offset: bounds.origin.x as i32,
                    y_offset: main_height - bounds.origin.y as i32 - height as i32,
                    width: bounds.size.width as u32,
                    height,
                    scale_factor: 100,
                    is_primary: id == main_id,
                }
            })
            .collect();

        displays.sort_by_key(|d| !d.is_primary);
        Ok(displays)
    }
}
