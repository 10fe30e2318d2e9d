use std::sync::{Mutex, MutexGuard};

/// Lock-guarded buffer of formatted lines awaiting transmission.
///
/// Lines only ever leave through [`LineCache::drain`], which swaps the whole
/// buffer out under the lock. Neither operation holds the lock across I/O.
#[derive(Debug, Default)]
pub struct LineCache {
    lines: Mutex<Vec<String>>,
}

impl LineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line at the tail and return the number of cached lines.
    pub fn append(&self, line: String) -> usize {
        let mut lines = self.lock();
        lines.push(line);
        lines.len()
    }

    /// Take every cached line, leaving an empty buffer behind.
    pub fn drain(&self) -> Vec<String> {
        let mut lines = self.lock();
        if lines.is_empty() {
            return Vec::new();
        }
        std::mem::take(&mut *lines)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A writer that panicked mid-append cannot leave the Vec half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
