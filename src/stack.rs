//! Location/view stack and the commit protocol
//!
//! The router mirrors the session history with two parallel stacks: the
//! location of every entry, and the view resolved for it (if any). A commit
//! awaits a resolution under the concurrency guard, then writes the winning
//! view into the stacks and the history together.

use crate::error::{NavigationError, NavigationOutcome};
use crate::location::{HistoryState, Location};
use crate::options::LoadingStatus;
use crate::router::Router;
use crate::{debug_log, info_log, warn_log};
use futures::future::try_join_all;
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// Stack state
// ============================================================================

/// Parallel location and view stacks
#[derive(Debug)]
pub(crate) struct StackState<V> {
    pub(crate) locations: Vec<Location>,
    pub(crate) views: Vec<Option<Arc<V>>>,
    /// Target of the in-flight resolution, if any
    pub(crate) resolving: Option<Location>,
}

impl<V> StackState<V> {
    /// Single-entry stack for a history the router has not written to yet
    pub(crate) fn seeded(location: Location, current_view: Option<Arc<V>>) -> Self {
        Self {
            locations: vec![location],
            views: vec![current_view],
            resolving: None,
        }
    }

    /// Stack recovered from state a previous session persisted.
    ///
    /// Views are unknown except the current one.
    pub(crate) fn restored(state: HistoryState, current_view: Option<Arc<V>>) -> Self {
        let len = state.location_stack.len();
        let mut views: Vec<Option<Arc<V>>> = (0..len).map(|_| None).collect();
        if let Some(slot) = views.get_mut(state.index) {
            *slot = current_view;
        }
        Self {
            locations: state.location_stack,
            views,
            resolving: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.locations.len()
    }

    /// Clamp a persisted index into the stack
    pub(crate) fn clamp(&self, index: usize) -> usize {
        index.min(self.len().saturating_sub(1))
    }

    /// Drop every entry from `index` on, then append.
    ///
    /// Returns the new entry's index.
    pub(crate) fn append_truncate(
        &mut self,
        index: usize,
        location: Location,
        view: Arc<V>,
    ) -> usize {
        let index = index.min(self.len());
        // Remove forward entries when pushing
        self.locations.truncate(index);
        self.views.truncate(index);
        self.locations.push(location);
        self.views.push(Some(view));
        index
    }

    /// Overwrite the entry at `index`; lengths are unchanged
    pub(crate) fn overwrite(&mut self, index: usize, location: Location, view: Arc<V>) {
        let index = self.clamp(index);
        self.locations[index] = location;
        self.views[index] = Some(view);
    }

    /// Persisted form of the stack with `index` as current entry
    pub(crate) fn history_state(&self, index: usize) -> HistoryState {
        HistoryState {
            index,
            location_stack: self.locations.clone(),
            state: self.locations.get(index).and_then(|l| l.state.clone()),
        }
    }
}

/// How a winning resolution is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommitMode {
    /// Append after the current entry, dropping forward entries
    Push,
    /// Overwrite the current entry
    Replace,
}

// ============================================================================
// Commit protocol
// ============================================================================

impl<V: Send + Sync + 'static> Router<V> {
    /// Await `task` and, if no newer navigation started meanwhile, push its
    /// view as a new entry for `location`.
    ///
    /// Everything after the current entry is dropped first.
    pub async fn commit<F>(
        &self,
        task: F,
        location: Location,
    ) -> Result<NavigationOutcome, NavigationError>
    where
        F: Future<Output = Result<Arc<V>, NavigationError>> + Send,
    {
        self.commit_base(task, location, CommitMode::Push).await
    }

    /// Like [`commit`](Self::commit) but overwrites the current entry
    pub async fn commit_replace<F>(
        &self,
        task: F,
        location: Location,
    ) -> Result<NavigationOutcome, NavigationError>
    where
        F: Future<Output = Result<Arc<V>, NavigationError>> + Send,
    {
        self.commit_base(task, location, CommitMode::Replace).await
    }

    async fn commit_base<F>(
        &self,
        task: F,
        location: Location,
        mode: CommitMode,
    ) -> Result<NavigationOutcome, NavigationError>
    where
        F: Future<Output = Result<Arc<V>, NavigationError>> + Send,
    {
        let path = location.path();

        let previous = self.stack.lock().resolving.replace(location.clone());
        if let Some(previous) = previous {
            debug_log!("Navigation to '{}' superseded by '{}'", previous.path(), path);
            self.emit_loading(LoadingStatus::Cancelled);
        }
        self.emit_loading(LoadingStatus::Pending);

        let Some(result) = self.guard.guard(task).await else {
            debug_log!("Dropping stale resolution of '{}'", path);
            return Ok(NavigationOutcome::Superseded { path });
        };

        // Writing the history fires listeners that cancel whatever is in
        // flight, so this resolution must stop counting as in flight first.
        self.stack.lock().resolving = None;

        match result {
            Ok(view) => {
                let index = self.apply(mode, location, view);
                info_log!("Committed '{}' at index {} ({:?})", path, index, mode);
                self.emit_loading(LoadingStatus::Resolved);
                Ok(NavigationOutcome::Committed { path, index })
            }
            Err(error) => {
                warn_log!("Navigation to '{}' failed: {}", path, error);
                self.emit_loading(LoadingStatus::Rejected);
                Err(error)
            }
        }
    }

    /// Write a resolved view into the stacks, then into the history
    fn apply(&self, mode: CommitMode, location: Location, view: Arc<V>) -> usize {
        let current = self.current_index();
        let path = location.path();

        let (index, persisted) = {
            let mut stack = self.stack.lock();
            let index = match mode {
                CommitMode::Push => stack.append_truncate(current + 1, location, view),
                CommitMode::Replace => {
                    let index = stack.clamp(current);
                    stack.overwrite(index, location, view);
                    index
                }
            };
            (index, stack.history_state(index))
        };

        match mode {
            CommitMode::Push => self.history.push(&path, Some(persisted.to_value())),
            CommitMode::Replace => self.history.replace(&path, Some(persisted.to_value())),
        }
        index
    }

    /// Resolve a view for every entry of the location stack.
    ///
    /// Used after restoring a persisted stack, where only the current view is
    /// known. All resolutions run concurrently; if any fails nothing is
    /// written and the first error is returned. If a navigation commits
    /// meanwhile, the resolved views are dropped and the stack is left alone.
    pub async fn init_history_stack(self: &Arc<Self>) -> Result<(), NavigationError> {
        let locations = self.stack.lock().locations.clone();
        debug_log!("Resolving {} stacked locations", locations.len());

        let views = try_join_all(locations.iter().cloned().map(|l| self.resolve(l))).await?;

        {
            let mut stack = self.stack.lock();
            if stack.locations != locations {
                debug_log!(
                    "Location stack changed while resolving, discarding {} views",
                    views.len()
                );
                return Ok(());
            }
            stack.views = views.into_iter().map(Some).collect();
        }

        // Let listeners pick up the freshly resolved current view
        let location = self.history.location();
        self.history.replace(&location.path(), location.state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loc(path: &str) -> Location {
        Location::parse(path, None)
    }

    fn paths<V>(stack: &StackState<V>) -> Vec<String> {
        stack.locations.iter().map(Location::path).collect()
    }

    #[test]
    fn test_append_truncates_forward_entries() {
        let mut stack = StackState::seeded(loc("/"), None);
        stack.append_truncate(1, loc("/a"), Arc::new(1));
        stack.append_truncate(2, loc("/b"), Arc::new(2));
        assert_eq!(stack.len(), 3);

        // Back at index 0, push
        let index = stack.append_truncate(1, loc("/c"), Arc::new(3));
        assert_eq!(index, 1);
        assert_eq!(paths(&stack), vec!["/", "/c"]);
        assert_eq!(stack.views.len(), 2);
        assert_eq!(stack.views[1].as_deref(), Some(&3));
    }

    #[test]
    fn test_overwrite_keeps_length() {
        let mut stack = StackState::seeded(loc("/"), None);
        stack.append_truncate(1, loc("/a"), Arc::new(1));
        stack.overwrite(0, loc("/z"), Arc::new(9));

        assert_eq!(paths(&stack), vec!["/z", "/a"]);
        assert_eq!(stack.views[0].as_deref(), Some(&9));
        assert_eq!(stack.views[1].as_deref(), Some(&1));
    }

    #[test]
    fn test_restored_places_current_view() {
        let state = HistoryState {
            index: 1,
            location_stack: vec![loc("/"), loc("/a"), loc("/b")],
            state: None,
        };
        let stack = StackState::restored(state, Some(Arc::new("a")));

        assert_eq!(stack.len(), 3);
        assert!(stack.views[0].is_none());
        assert_eq!(stack.views[1].as_deref(), Some(&"a"));
        assert!(stack.views[2].is_none());
    }

    #[test]
    fn test_history_state_carries_entry_state() {
        let mut stack: StackState<u8> = StackState::seeded(loc("/"), None);
        stack.append_truncate(1, Location::parse("/a", Some(json!({"tab": 2}))), Arc::new(1));

        let state = stack.history_state(1);
        assert_eq!(state.index, 1);
        assert_eq!(state.location_stack.len(), 2);
        assert_eq!(state.state, Some(json!({"tab": 2})));
    }

    #[test]
    fn test_clamp() {
        let stack: StackState<u8> = StackState::seeded(loc("/"), None);
        assert_eq!(stack.clamp(5), 0);
    }
}
