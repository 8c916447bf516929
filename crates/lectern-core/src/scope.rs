//! Scoped acquisition/release record for background resources.
//!
//! A surface runtime acquires resources (spawned tasks, listeners, timers)
//! while it runs.  Each acquisition registers a release action with a
//! [`ResourceScope`]; the scope runs every outstanding release exactly once,
//! newest first, when [`ResourceScope::release_all`] is called or the scope is
//! dropped.  There is one scope per runtime, never a process-wide registry.

use std::fmt;

/// Handle identifying one acquisition inside a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

struct Entry {
    id: ResourceId,
    label: String,
    release: Box<dyn FnOnce() + Send>,
}

/// Owner of release actions for everything acquired within one scope.
#[derive(Default)]
pub struct ResourceScope {
    entries: Vec<Entry>,
    next_id: u64,
}

impl fmt::Debug for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceScope")
            .field("held", &self.labels())
            .finish()
    }
}

impl ResourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a resource and the action that releases it.
    pub fn acquire<F>(&mut self, label: impl Into<String>, release: F) -> ResourceId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            label: label.into(),
            release: Box::new(release),
        });
        id
    }

    /// Releases one resource early.  Returns `false` if it was already released.
    pub fn release(&mut self, id: ResourceId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                let entry = self.entries.remove(pos);
                tracing::debug!(resource = %entry.label, "releasing");
                (entry.release)();
                true
            }
            None => false,
        }
    }

    /// Releases everything still held, newest first.
    pub fn release_all(&mut self) {
        while let Some(entry) = self.entries.pop() {
            tracing::debug!(resource = %entry.label, "releasing");
            (entry.release)();
        }
    }

    /// Number of resources still held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels of held resources, oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        self.release_all();
    }
}
