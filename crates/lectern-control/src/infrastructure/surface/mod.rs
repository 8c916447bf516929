//! Output surface factories.
//!
//! The output surface is a separate process (`lectern-output`) that connects
//! back to the control surface's bridge.  [`ProcessSurfaceFactory`] spawns it
//! with the surface id and target display geometry on its command line;
//! [`mock::MockSurfaceFactory`] records calls for tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::application::surface_lifecycle::{DisplayInfo, SurfaceError, SurfaceFactory, SurfaceId};

pub mod mock;

/// Spawns one `lectern-output` child process per surface.
#[derive(Debug)]
pub struct ProcessSurfaceFactory {
    binary: PathBuf,
    bridge_url: String,
    /// Appended to every spawn: resource URL and drift thresholds.
    extra_args: Vec<String>,
    children: Mutex<HashMap<SurfaceId, Child>>,
}

impl ProcessSurfaceFactory {
    /// `bridge_url` is the base WebSocket URL of the surface bridge, e.g.
    /// `ws://127.0.0.1:24900`; the surface id is appended as a path.
    pub fn new(binary: PathBuf, bridge_url: impl Into<String>) -> Self {
        Self {
            binary,
            bridge_url: bridge_url.into(),
            extra_args: Vec::new(),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Arguments passed to every output process after the geometry.
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    /// The output binary installed next to the running executable.
    pub fn sibling_binary() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        let dir = exe.parent()?;
        Some(dir.join(format!("lectern-output{}", std::env::consts::EXE_SUFFIX)))
    }

    /// Command-line arguments for a surface on `display`.
    pub fn args(&self, id: SurfaceId, display: &DisplayInfo) -> Vec<String> {
        let mut args = vec![
            "--control-url".to_string(),
            format!("{}/surface/{}", self.bridge_url.trim_end_matches('/'), id),
            "--x".to_string(),
            display.x_offset.to_string(),
            "--y".to_string(),
            display.y_offset.to_string(),
            "--width".to_string(),
            display.width.to_string(),
            "--height".to_string(),
            display.height.to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl SurfaceFactory for ProcessSurfaceFactory {
    fn create(&self, id: SurfaceId, display: &DisplayInfo) -> Result<(), SurfaceError> {
        let child = Command::new(&self.binary)
            .args(self.args(id, display))
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    SurfaceError::CreationDenied(format!("{}: {e}", self.binary.display()))
                }
                _ => SurfaceError::Platform(format!("{}: {e}", self.binary.display())),
            })?;
        debug!(surface_id = %id, pid = child.id(), "output process spawned");

        let mut children = self
            .children
            .lock()
            .map_err(|e| SurfaceError::Platform(e.to_string()))?;
        children.insert(id, child);
        Ok(())
    }

    fn destroy(&self, id: SurfaceId) {
        let child = match self.children.lock() {
            Ok(mut children) => children.remove(&id),
            Err(e) => {
                warn!("surface registry lock poisoned: {e}");
                return;
            }
        };
        let Some(mut child) = child else { return };

        // The process may already have exited on its own.
        if let Err(e) = child.kill() {
            debug!(surface_id = %id, "kill: {e}");
        }
        if let Err(e) = child.wait() {
            warn!(surface_id = %id, "failed to reap output process: {e}");
        }
    }
}

impl Drop for ProcessSurfaceFactory {
    fn drop(&mut self) {
        if let Ok(children) = self.children.get_mut() {
            for (_, mut child) in children.drain() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }
}
