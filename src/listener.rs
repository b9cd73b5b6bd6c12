//! Reacting to history changes
//!
//! Once subscribed, every history change cancels in-flight resolutions and
//! hands the entry's view to the host: straight from the view stack when it
//! was resolved before, through a spawned refresh otherwise.

use crate::history::{HistoryEvent, HistoryListener, ListenerId};
use crate::location::{HistoryState, Location};
use crate::router::Router;
use crate::{debug_log, error_log, info_log, trace_log};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Weak};

/// Runs the refreshes a history change triggers
///
/// Typically wraps the host runtime, e.g.
/// `Arc::new(|task| { tokio::spawn(task); })`.
pub type Spawner = Arc<dyn Fn(BoxFuture<'static, ()>) + Send + Sync>;

/// Receives the view to show after a history change
pub type ViewChangeCallback<V> = Arc<dyn Fn(Arc<V>, &Location) + Send + Sync>;

/// Handle of an attached listener
#[must_use = "the listener stays attached until `unsubscribe` is called"]
pub struct Subscription<V: Send + Sync + 'static> {
    router: Arc<Router<V>>,
    id: ListenerId,
}

impl<V: Send + Sync + 'static> Subscription<V> {
    /// Detach from the history, cancelling any in-flight resolution
    pub fn unsubscribe(self) {
        self.router.cancel();
        self.router.history.unlisten(self.id);
        info_log!("Router listener detached");
    }
}

impl<V: Send + Sync + 'static> fmt::Debug for Subscription<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<V: Send + Sync + 'static> Router<V> {
    /// Subscribe to history changes.
    ///
    /// `on_view_change` receives the view of the entry the history moved to,
    /// along with its location (caller state only). Views missing from the
    /// view stack are resolved by a refresh handed to `spawner`.
    ///
    /// The current entry is re-written once on subscription so the host gets
    /// an initial view.
    pub fn listen<F>(self: &Arc<Self>, spawner: Spawner, on_view_change: F) -> Subscription<V>
    where
        F: Fn(Arc<V>, &Location) + Send + Sync + 'static,
    {
        let on_view_change: ViewChangeCallback<V> = Arc::new(on_view_change);
        // Weak: the history owns the listener and the router owns the history
        let router: Weak<Self> = Arc::downgrade(self);

        let listener: HistoryListener = Arc::new(move |event: &HistoryEvent| {
            if let Some(router) = router.upgrade() {
                router.handle_history_event(event, &spawner, &on_view_change);
            }
        });
        let id = self.history.listen(listener);
        info_log!("Router listener attached");

        let current = self.history.location();
        self.history.replace(&current.path(), current.state);

        Subscription {
            router: Arc::clone(self),
            id,
        }
    }

    fn handle_history_event(
        self: &Arc<Self>,
        event: &HistoryEvent,
        spawner: &Spawner,
        on_view_change: &ViewChangeCallback<V>,
    ) {
        trace_log!("History event {:?} to '{}'", event.action, event.location.path());
        self.cancel();

        let raw_state = event.location.state.as_ref();
        let index = HistoryState::index_of(raw_state);
        let cached = self.stack.lock().views.get(index).cloned().flatten();

        match cached {
            Some(view) => {
                let location = event
                    .location
                    .clone()
                    .with_state(HistoryState::caller_state_of(raw_state));
                on_view_change(view, &location);
            }
            None => {
                debug_log!("No view stacked at index {}, refreshing", index);
                let router = Arc::clone(self);
                spawner(Box::pin(async move {
                    if let Err(error) = router.refresh().await {
                        error_log!("Refresh after history change failed: {}", error);
                    }
                }));
            }
        }

        // A traversed-to entry carries the stack as it was when the entry was
        // written; give it the current one.
        if event.action.is_traversal() {
            let state = self.merged_history_state(raw_state);
            self.history.replace(&event.location.path(), Some(state));
        }
    }

    /// `raw` with its location stack swapped for the router's
    fn merged_history_state(&self, raw: Option<&Value>) -> Value {
        let mut state = match raw {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        let locations = self.stack.lock().locations.clone();
        state.insert(
            HistoryState::STACK_KEY.to_string(),
            serde_json::to_value(locations).unwrap_or(Value::Array(Vec::new())),
        );
        Value::Object(state)
    }
}
