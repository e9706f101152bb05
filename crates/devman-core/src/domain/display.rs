//! Reference-counted registry of open display connections.
//!
//! A host may report the same physical display more than once (for example
//! when two logical handles point at one X11 display).  Only the first open
//! and the last close of a given display name are meaningful: those are the
//! moments when the display's devices must be enumerated.
//!
//! ```text
//! open(":0")   ─► First          (enumerate devices, start watching)
//! open(":0")   ─► Shared(2)
//! close(":0")  ─► Shared(1)
//! close(":0")  ─► Last           (enumerate devices as removed, stop watching)
//! close(":0")  ─► Unknown
//! ```

use std::collections::HashMap;

/// Outcome of a reference count change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefChange {
    /// The count went from zero to one.
    First,
    /// The display stays open; carries the count after the change.
    Shared(u32),
    /// The count went from one to zero and the entry was removed.
    Last,
    /// The display was not registered; nothing changed.
    Unknown,
}

/// Display name → open count.  An entry exists only while its count is
/// positive.
#[derive(Debug, Default)]
pub struct DisplayRegistry {
    counts: HashMap<String, u32>,
}

impl DisplayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more open notification for `name`.
    pub fn open(&mut self, name: &str) -> RefChange {
        let count = self.counts.entry(name.to_owned()).or_insert(0);
        *count += 1;
        if *count == 1 {
            RefChange::First
        } else {
            RefChange::Shared(*count)
        }
    }

    /// Records one close notification for `name`.
    pub fn close(&mut self, name: &str) -> RefChange {
        match self.counts.get_mut(name) {
            None => RefChange::Unknown,
            Some(count) if *count > 1 => {
                *count -= 1;
                RefChange::Shared(*count)
            }
            Some(_) => {
                self.counts.remove(name);
                RefChange::Last
            }
        }
    }

    /// Current open count; zero for displays that are not registered.
    pub fn count(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    /// Names of all open displays, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
