//! The router
//!
//! [`Router`] ties a route table, a session history and a view resolver
//! together. It is always shared as `Arc<Router<V>>`: resolutions hand the
//! router to the view resolver, and history listeners call back into it.
//!
//! Locks are never held across an `.await` or while calling into the
//! history, since the history runs listeners synchronously and those
//! listeners re-enter the router.

use crate::concurrency::ConcurrencyGuard;
use crate::error::{NavigationError, NavigationOutcome};
use crate::history::History;
use crate::location::{HistoryState, Location};
use crate::matcher::MatchChain;
use crate::options::{
    resolver_fn, LoadingStatus, ResolveContext, RouterConfig, RouterOptions, Settings,
    ViewResolver,
};
use crate::params::RouteParams;
use crate::route::{NamedRouteRegistry, Route};
use crate::stack::StackState;
use crate::{debug_log, info_log};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, MatchCache};

/// Nested-route resolver synchronized with a session history
///
/// `V` is whatever the view resolver produces. Views are kept as `Arc<V>` so
/// traversing back to an entry hands out the very same view again.
pub struct Router<V> {
    pub(crate) routes: Vec<Arc<Route>>,
    pub(crate) named_routes: NamedRouteRegistry,
    pub(crate) history: Arc<dyn History>,
    pub(crate) resolve_view: ViewResolver<V>,
    pub(crate) guard: ConcurrencyGuard,
    pub(crate) settings: RwLock<Settings<V>>,
    pub(crate) stack: Mutex<StackState<V>>,
    #[cfg(feature = "cache")]
    pub(crate) match_cache: Mutex<MatchCache>,
}

impl<V: Send + Sync + 'static> Router<V> {
    /// Create a router.
    ///
    /// If the history's current entry carries a location stack persisted by
    /// an earlier router, that stack is restored; otherwise the stack starts
    /// with the current entry alone. `options.current_view`, if given, is
    /// taken as the view of the current entry.
    ///
    /// # Example
    ///
    /// ```
    /// use session_navigator::{MemoryHistory, Route, Router, RouterOptions};
    /// use std::sync::Arc;
    ///
    /// let routes = vec![
    ///     Route::new("/").name("home"),
    ///     Route::new("/users/:id").name("user"),
    /// ];
    /// let router = Router::new(
    ///     routes,
    ///     Arc::new(MemoryHistory::new("/")),
    ///     |chain, _cx| async move { Ok(chain.matched_path()) },
    ///     RouterOptions::new(),
    /// );
    ///
    /// let chain = router.match_path("/users/7").unwrap();
    /// assert_eq!(chain.params().get("id"), Some(&"7".to_string()));
    /// ```
    pub fn new<F, Fut>(
        routes: Vec<Route>,
        history: Arc<dyn History>,
        resolve_view: F,
        options: RouterOptions<V>,
    ) -> Arc<Self>
    where
        F: Fn(MatchChain, ResolveContext<V>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, NavigationError>> + Send + 'static,
    {
        Self::with_resolver(routes, history, resolver_fn(resolve_view), options)
    }

    /// Create a router from an already boxed [`ViewResolver`]
    pub fn with_resolver(
        routes: Vec<Route>,
        history: Arc<dyn History>,
        resolve_view: ViewResolver<V>,
        options: RouterOptions<V>,
    ) -> Arc<Self> {
        let routes: Vec<Arc<Route>> = routes.into_iter().map(Arc::new).collect();
        let named_routes = NamedRouteRegistry::from_routes(&routes);

        let current = history.location();
        info_log!(
            "Router created with {} root routes at '{}'",
            routes.len(),
            current.path()
        );

        let current_view = options.current_view.map(Arc::new);
        let persisted = current.state.as_ref().and_then(HistoryState::from_value);
        let stack = match persisted {
            Some(persisted) if !persisted.location_stack.is_empty() => {
                debug_log!(
                    "Restoring {} stacked locations at index {}",
                    persisted.location_stack.len(),
                    persisted.index
                );
                StackState::restored(persisted, current_view)
            }
            _ => StackState::seeded(current, current_view),
        };

        Arc::new(Self {
            routes,
            named_routes,
            history,
            resolve_view,
            guard: ConcurrencyGuard::new(),
            settings: RwLock::new(Settings {
                base_url: options.base_url,
                error_handler: options.error_handler,
                on_loading_change: options.on_loading_change,
            }),
            stack: Mutex::new(stack),
            #[cfg(feature = "cache")]
            match_cache: Mutex::new(MatchCache::new()),
        })
    }

    /// Update the mutable options; unset fields of `config` are left alone
    pub fn set_options(&self, config: RouterConfig<V>) {
        self.settings.write().apply(config);
        debug_log!("Router options updated");
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// The history's current location, with the caller's own state
    pub fn location(&self) -> Location {
        let location = self.history.location();
        let state = match location.state.as_ref() {
            Some(raw) if raw.get(HistoryState::STACK_KEY).is_some() => {
                HistoryState::caller_state_of(Some(raw))
            }
            _ => location.state.clone(),
        };
        location.with_state(state)
    }

    /// Position of the current entry in the location stack
    pub fn current_index(&self) -> usize {
        let index = HistoryState::index_of(self.history.location().state.as_ref());
        self.stack.lock().clamp(index)
    }

    /// View of the current entry, if resolved
    pub fn current_view(&self) -> Option<Arc<V>> {
        let index = self.current_index();
        self.stack.lock().views.get(index).cloned().flatten()
    }

    /// Snapshot of the location stack
    pub fn location_stack(&self) -> Vec<Location> {
        self.stack.lock().locations.clone()
    }

    /// Snapshot of the view stack
    pub fn view_stack(&self) -> Vec<Option<Arc<V>>> {
        self.stack.lock().views.clone()
    }

    /// Target of the in-flight navigation, if any
    pub fn resolving(&self) -> Option<Location> {
        self.stack.lock().resolving.clone()
    }

    /// Check if a navigation is in flight
    pub fn is_resolving(&self) -> bool {
        self.stack.lock().resolving.is_some()
    }

    /// The root routes
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Check if there is an entry to go back to
    pub fn can_go_back(&self) -> bool {
        self.history.index() > 0
    }

    /// Check if there is an entry to go forward to
    pub fn can_go_forward(&self) -> bool {
        self.history.index() + 1 < self.history.len()
    }

    /// Match cache statistics
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.match_cache.lock().stats().clone()
    }

    /// Forget every cached match
    #[cfg(feature = "cache")]
    pub fn clear_cache(&self) {
        self.match_cache.lock().clear();
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Resolve `path` and push it as a new entry
    ///
    /// Returns [`NavigationOutcome::Superseded`] if another navigation started
    /// before this one resolved; nothing is written in that case.
    pub async fn navigate(
        self: &Arc<Self>,
        path: &str,
        state: Option<Value>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let location = self.to_location(path, state);
        debug_log!("Navigating to '{}'", location.path());
        self.commit(self.resolve(location.clone()), location).await
    }

    /// Resolve `path` and replace the current entry with it
    pub async fn navigate_replace(
        self: &Arc<Self>,
        path: &str,
        state: Option<Value>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let location = self.to_location(path, state);
        debug_log!("Navigating (replace) to '{}'", location.path());
        self.commit_replace(self.resolve(location.clone()), location)
            .await
    }

    /// Re-resolve the current location and replace the current entry
    pub async fn refresh(self: &Arc<Self>) -> Result<NavigationOutcome, NavigationError> {
        let location = self.location();
        debug_log!("Refreshing '{}'", location.path());
        self.commit_replace(self.resolve(location.clone()), location)
            .await
    }

    /// Navigate to a named route
    pub async fn navigate_named(
        self: &Arc<Self>,
        name: &str,
        params: &RouteParams,
        state: Option<Value>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let path = self
            .url_for(name, params)
            .ok_or_else(|| NavigationError::custom(format!("Unknown route name: {}", name)))?;
        self.navigate(&path, state).await
    }

    /// Move through the history by `delta` entries
    pub fn go(&self, delta: isize) {
        self.history.go(delta);
    }

    pub fn back(&self) {
        self.history.back();
    }

    pub fn forward(&self) {
        self.history.forward();
    }

    /// Href for an app-relative path, base URL included
    pub fn create_href(&self, path: &str) -> String {
        let base_url = self.settings.read().base_url.clone();
        self.history.create_href(&format!("{}{}", base_url, path))
    }

    /// App-relative path of a named route, parameters filled in
    pub fn url_for(&self, name: &str, params: &RouteParams) -> Option<String> {
        self.named_routes.url_for(name, params)
    }

    /// Drop every in-flight resolution.
    ///
    /// Emits [`LoadingStatus::Cancelled`] if one was in flight.
    pub fn cancel(&self) {
        self.guard.cancel_all();
        let cancelled = self.stack.lock().resolving.take();
        if let Some(location) = cancelled {
            debug_log!("Cancelled navigation to '{}'", location.path());
            self.emit_loading(LoadingStatus::Cancelled);
        }
    }

    pub(crate) fn emit_loading(&self, status: LoadingStatus) {
        let callback = self.settings.read().on_loading_change.clone();
        if let Some(callback) = callback {
            callback(status);
        }
    }
}

impl<V> fmt::Debug for Router<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self.stack.lock();
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("base_url", &self.settings.read().base_url)
            .field("locations", &stack.locations)
            .field("resolving", &stack.resolving)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use serde_json::json;

    fn router(history: Arc<dyn History>) -> Arc<Router<String>> {
        Router::new(
            vec![
                Route::new("/").name("home"),
                Route::new("/users/:id").name("user"),
            ],
            history,
            |chain, _cx| async move { Ok(chain.matched_path()) },
            RouterOptions::new(),
        )
    }

    #[test]
    fn test_new_seeds_single_entry() {
        let history = Arc::new(MemoryHistory::with_state("/users/1", Some(json!({"k": 1}))));
        let router = router(history);

        assert_eq!(router.current_index(), 0);
        assert!(router.current_view().is_none());
        let stack = router.location_stack();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].pathname, "/users/1");
        assert_eq!(router.location().state, Some(json!({"k": 1})));
    }

    #[test]
    fn test_new_restores_persisted_stack() {
        let persisted = HistoryState {
            index: 1,
            location_stack: vec![Location::parse("/", None), Location::parse("/users/2", None)],
            state: Some(json!("mine")),
        };
        let history = Arc::new(MemoryHistory::with_state("/users/2", Some(persisted.to_value())));
        let router = Router::new(
            vec![Route::new("/"), Route::new("/users/:id")],
            history,
            |chain, _cx| async move { Ok(chain.matched_path()) },
            RouterOptions::new().current_view("restored".to_string()),
        );

        assert_eq!(router.location_stack().len(), 2);
        assert_eq!(router.current_index(), 1);
        assert_eq!(router.current_view().as_deref().map(String::as_str), Some("restored"));
        assert!(router.view_stack()[0].is_none());
        assert_eq!(router.location().state, Some(json!("mine")));
    }

    #[test]
    fn test_url_for_and_create_href() {
        let history = Arc::new(MemoryHistory::new("/"));
        let router = router(history);

        let mut params = RouteParams::new();
        params.insert("id".to_string(), "42".to_string());
        assert_eq!(router.url_for("user", &params), Some("/users/42".to_string()));
        assert_eq!(router.url_for("missing", &params), None);

        router.set_options(RouterConfig::new().base_url("/app"));
        assert_eq!(router.create_href("/users/42"), "/app/users/42");
    }

    #[test]
    fn test_cancel_without_navigation_is_silent() {
        let history = Arc::new(MemoryHistory::new("/"));
        let router = router(history);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        router.set_options(RouterConfig::new().on_loading_change(move |s| sink.lock().push(s)));

        router.cancel();
        assert!(calls.lock().is_empty());
        assert!(!router.is_resolving());
    }

    #[test]
    fn test_navigation_helpers_follow_history() {
        let history = Arc::new(MemoryHistory::new("/"));
        history.push("/users/1", None);
        let router = router(Arc::clone(&history) as Arc<dyn History>);

        assert!(router.can_go_back());
        router.back();
        assert_eq!(router.location().pathname, "/");
        assert!(router.can_go_forward());
        router.go(1);
        assert_eq!(router.location().pathname, "/users/1");
    }
}
