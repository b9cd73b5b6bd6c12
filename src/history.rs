//! Session history facility
//!
//! The router does not own the session history; it drives one through the
//! [`History`] trait and listens to its change events. In a browser the
//! implementation wraps `window.history`; [`MemoryHistory`] keeps the entries
//! in memory, which is what tests and non-browser hosts use.
//!
//! Contract:
//! - `push` truncates forward entries, appends, and emits [`HistoryAction::Push`]
//! - `replace` overwrites the current entry and emits [`HistoryAction::Replace`]
//! - `go`/`back`/`forward` move the cursor and emit [`HistoryAction::Pop`]
//! - listeners run synchronously, after the facility has updated itself, and
//!   may call back into the facility

use crate::location::Location;
use crate::{debug_log, trace_log};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// What caused a history change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// A new entry was pushed
    Push,
    /// The current entry was replaced
    Replace,
    /// The cursor moved through existing entries (back/forward/go)
    Pop,
}

impl HistoryAction {
    /// Check if this is a traversal of existing entries
    pub fn is_traversal(self) -> bool {
        matches!(self, HistoryAction::Pop)
    }
}

/// Change notification delivered to listeners
///
/// `location.state` is the raw state stored with the entry.
#[derive(Debug, Clone)]
pub struct HistoryEvent {
    pub action: HistoryAction,
    pub location: Location,
}

/// Callback receiving history changes
pub type HistoryListener = Arc<dyn Fn(&HistoryEvent) + Send + Sync>;

/// Handle returned by [`History::listen`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A browser-style session history
pub trait History: Send + Sync {
    /// The current entry; `state` is the raw entry state
    fn location(&self) -> Location;

    /// Push a new entry for `path` carrying `state`
    fn push(&self, path: &str, state: Option<Value>);

    /// Replace the current entry with `path` carrying `state`
    fn replace(&self, path: &str, state: Option<Value>);

    /// Move the cursor by `delta` entries
    fn go(&self, delta: isize);

    /// Move one entry back
    fn back(&self) {
        self.go(-1);
    }

    /// Move one entry forward
    fn forward(&self) {
        self.go(1);
    }

    /// Turn a path into an href usable by links
    fn create_href(&self, path: &str) -> String;

    /// Subscribe to changes
    fn listen(&self, listener: HistoryListener) -> ListenerId;

    /// Drop a subscription
    fn unlisten(&self, id: ListenerId);

    /// Number of entries
    fn len(&self) -> usize;

    /// Check if there are no entries (never true for a usable history)
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor position
    fn index(&self) -> usize;
}

// ============================================================================
// MemoryHistory
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct HistoryEntry {
    path: String,
    state: Option<Value>,
}

impl HistoryEntry {
    fn to_location(&self) -> Location {
        Location::parse(&self.path, self.state.clone())
    }
}

struct Inner {
    entries: Vec<HistoryEntry>,
    current: usize,
    /// Maximum number of entries (0 = unlimited)
    max_size: usize,
    listeners: Vec<(ListenerId, HistoryListener)>,
    next_listener: u64,
}

impl Inner {
    fn enforce_size_limit(&mut self) {
        if self.max_size > 0 && self.entries.len() > self.max_size {
            // Remove oldest entries, keeping the current one reachable
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.current = self.current.saturating_sub(excess);
        }
    }
}

/// In-memory [`History`] implementation
///
/// # Example
///
/// ```
/// use session_navigator::{History, MemoryHistory};
///
/// let history = MemoryHistory::new("/");
/// history.push("/users", None);
/// history.push("/users/1", None);
/// history.back();
///
/// assert_eq!(history.location().pathname, "/users");
/// assert_eq!(history.len(), 3);
/// ```
pub struct MemoryHistory {
    inner: Mutex<Inner>,
}

impl MemoryHistory {
    /// Create a history with a single entry
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self::with_state(initial_path, None)
    }

    /// Create a history with a single entry carrying raw state
    pub fn with_state(initial_path: impl Into<String>, state: Option<Value>) -> Self {
        Self::from_entries(vec![(initial_path.into(), state)], 0)
    }

    /// Create a history from `(path, state)` entries with the cursor at `current`.
    ///
    /// An empty list becomes a single `/` entry; `current` is clamped.
    pub fn from_entries(entries: Vec<(String, Option<Value>)>, current: usize) -> Self {
        let mut entries: Vec<HistoryEntry> = entries
            .into_iter()
            .map(|(path, state)| HistoryEntry { path, state })
            .collect();
        if entries.is_empty() {
            entries.push(HistoryEntry {
                path: "/".to_string(),
                state: None,
            });
        }
        let current = current.min(entries.len() - 1);

        Self {
            inner: Mutex::new(Inner {
                entries,
                current,
                max_size: 0,
                listeners: Vec::new(),
                next_listener: 0,
            }),
        }
    }

    /// Limit the number of entries kept; the oldest are dropped first
    pub fn with_max_size(self, max_size: usize) -> Self {
        {
            let mut inner = self.inner.lock();
            inner.max_size = max_size;
            inner.enforce_size_limit();
        }
        self
    }

    /// Paths of every entry, oldest first
    pub fn paths(&self) -> Vec<String> {
        self.inner.lock().entries.iter().map(|e| e.path.clone()).collect()
    }

    /// Raw state of the entry at `index`
    pub fn state_at(&self, index: usize) -> Option<Value> {
        self.inner
            .lock()
            .entries
            .get(index)
            .and_then(|e| e.state.clone())
    }

    /// Check if can go back
    pub fn can_go_back(&self) -> bool {
        self.inner.lock().current > 0
    }

    /// Check if can go forward
    pub fn can_go_forward(&self) -> bool {
        let inner = self.inner.lock();
        inner.current + 1 < inner.entries.len()
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Run listeners outside the lock so they can call back in
    fn notify(&self, action: HistoryAction) {
        let (listeners, location) = {
            let inner = self.inner.lock();
            let listeners: Vec<HistoryListener> =
                inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (listeners, inner.entries[inner.current].to_location())
        };

        trace_log!(
            "History {:?} to '{}' ({} listeners)",
            action,
            location.path(),
            listeners.len()
        );

        let event = HistoryEvent { action, location };
        for listener in listeners {
            listener(&event);
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl std::fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryHistory")
            .field("entries", &inner.entries)
            .field("current", &inner.current)
            .field("max_size", &inner.max_size)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Location {
        let inner = self.inner.lock();
        inner.entries[inner.current].to_location()
    }

    fn push(&self, path: &str, state: Option<Value>) {
        {
            let mut inner = self.inner.lock();
            let next = inner.current + 1;
            // Remove forward history when pushing
            inner.entries.truncate(next);
            inner.entries.push(HistoryEntry {
                path: path.to_string(),
                state,
            });
            inner.current = next;
            inner.enforce_size_limit();
        }
        self.notify(HistoryAction::Push);
    }

    fn replace(&self, path: &str, state: Option<Value>) {
        {
            let mut inner = self.inner.lock();
            let current = inner.current;
            inner.entries[current] = HistoryEntry {
                path: path.to_string(),
                state,
            };
        }
        self.notify(HistoryAction::Replace);
    }

    fn go(&self, delta: isize) {
        let moved = {
            let mut inner = self.inner.lock();
            let last = inner.entries.len() - 1;
            let target = inner
                .current
                .saturating_add_signed(delta)
                .min(last);
            let moved = target != inner.current;
            inner.current = target;
            moved
        };

        if moved {
            self.notify(HistoryAction::Pop);
        } else {
            debug_log!("History go({}) stayed in place", delta);
        }
    }

    fn create_href(&self, path: &str) -> String {
        path.to_string()
    }

    fn listen(&self, listener: HistoryListener) -> ListenerId {
        let mut inner = self.inner.lock();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, listener));
        id
    }

    fn unlisten(&self, id: ListenerId) {
        self.inner.lock().listeners.retain(|(other, _)| *other != id);
    }

    fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    fn index(&self) -> usize {
        self.inner.lock().current
    }
}
