//! Display enumeration adapters.
//!
//! The lifecycle manager needs to know which displays exist so it can put
//! the output surface on the first non-primary one.
//!
//! # Implementations
//!
//! | Type                 | Source                                          |
//! |----------------------|-------------------------------------------------|
//! | `NativeDisplays`     | Win32 `EnumDisplayMonitors` (Windows) or Core Graphics (macOS) |
//! | `ConfiguredDisplays` | The `[[surface.displays]]` list in the config file |
//! | `MockDisplayEnumerator` | Tests                                        |
//!
//! On Linux there is no native enumerator; the display layout comes from the
//! config file.  An empty list means one primary display, which reports
//! "no second display" rather than guessing.

use std::sync::Arc;

use crate::application::surface_lifecycle::{DisplayEnumerator, DisplayError, DisplayInfo};
use crate::infrastructure::storage::config::SurfaceConfig;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::WindowsDisplays as NativeDisplays;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "macos")]
pub use macos::MacosDisplays as NativeDisplays;

/// Display list fixed at construction time (from the config file).
#[derive(Debug, Clone)]
pub struct ConfiguredDisplays {
    displays: Vec<DisplayInfo>,
}

impl ConfiguredDisplays {
    pub fn new(displays: Vec<DisplayInfo>) -> Self {
        Self { displays }
    }

    pub fn from_config(config: &SurfaceConfig) -> Self {
        Self::new(config.displays.iter().map(DisplayInfo::from).collect())
    }
}

impl DisplayEnumerator for ConfiguredDisplays {
    fn enumerate_displays(&self) -> Result<Vec<DisplayInfo>, DisplayError> {
        Ok(self.displays.clone())
    }
}

/// Picks the enumerator for this platform.
///
/// An explicit display list in the config file always wins.
pub fn display_enumerator(config: &SurfaceConfig) -> Arc<dyn DisplayEnumerator> {
    if !config.displays.is_empty() {
        return Arc::new(ConfiguredDisplays::from_config(config));
    }

    #[cfg(any(target_os = "windows", target_os = "macos"))]
    {
        Arc::new(NativeDisplays::new())
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Arc::new(ConfiguredDisplays::new(Vec::new()))
    }
}
