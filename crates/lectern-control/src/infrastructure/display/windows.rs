//! Windows display enumeration via `EnumDisplayMonitors` / `GetMonitorInfoW`.

use windows::{
    Win32::Foundation::{BOOL, LPARAM, RECT},
    Win32::Graphics::Gdi::{EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW},
};

use crate::application::surface_lifecycle::{DisplayEnumerator, DisplayError, DisplayInfo};

const MONITORINFOF_PRIMARY: u32 = 1;

/// Enumerates the monitors attached to the Windows desktop.
#[derive(Debug, Default)]
pub struct WindowsDisplays;

impl WindowsDisplays {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayEnumerator for WindowsDisplays {
    fn enumerate_displays(&self) -> Result<Vec<DisplayInfo>, DisplayError> {
        let mut displays: Vec<DisplayInfo> = Vec::new();

        // SAFETY: `lParam` points to `displays`, which outlives this call.
        // The callback runs synchronously inside `EnumDisplayMonitors`.
        unsafe {
            let _ = EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(monitor_enum_proc),
                LPARAM(&mut displays as *mut Vec<DisplayInfo> as isize),
            );
        }

        if displays.is_empty() {
            return Err(DisplayError::Platform(
                "EnumDisplayMonitors returned no monitors".to_string(),
            ));
        }

        displays.sort_by_key(|d| !d.is_primary);
        for (i, d) in displays.iter_mut().enumerate() {
            d.display_id = i as u32;
        }
        Ok(displays)
    }
}

/// # Safety
///
/// `lparam` must point to a live `Vec<DisplayInfo>` for the duration of the
/// enumeration call.
unsafe extern "system" fn monitor_enum_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _lprc_clip: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let displays = &mut *(lparam.0 as *mut Vec<DisplayInfo>);

    // SAFETY: MONITORINFOEXW is plain data; zero is a valid bit pattern.
    let mut info: MONITORINFOEXW = std::mem::zeroed();
    info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

    if GetMonitorInfoW(hmonitor, &mut info.monitorInfo).as_bool() {
        let rc = &info.monitorInfo.rcMonitor;
        displays.push(DisplayInfo {
            display_id: 0, // assigned after sort
            x_offset: rc.left,
            y_offset: rc.top,
            width: (rc.right - rc.left) as u32,
            height: (rc.bottom - rc.top) as u32,
            scale_factor: 100,
            is_primary: (info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY) != 0,
        });
    }

    BOOL(1)
}
