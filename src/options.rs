//! Router configuration and callback types

use crate::error::{rethrow, ErrorHandler, NavigationError};
use crate::location::Location;
use crate::matcher::MatchChain;
use crate::router::Router;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// Loading status
// ============================================================================

/// Progress of the navigation currently being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingStatus {
    /// The in-flight navigation was superseded or cancelled
    Cancelled,
    /// A navigation started resolving
    Pending,
    /// The navigation resolved and was committed
    Resolved,
    /// The navigation failed
    Rejected,
}

/// Callback receiving loading transitions
///
/// Callers that need to abort real work (e.g. a network request) when a
/// navigation is superseded key off [`LoadingStatus::Cancelled`].
pub type LoadingCallback = Arc<dyn Fn(LoadingStatus) + Send + Sync>;

// ============================================================================
// View resolution
// ============================================================================

/// What the view resolver gets besides the match chain
pub struct ResolveContext<V> {
    /// The router performing the resolution
    pub router: Arc<Router<V>>,
    /// The location being resolved
    pub location: Location,
}

impl<V> fmt::Debug for ResolveContext<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Caller-supplied function building a view for a matched location
pub type ViewResolver<V> = Arc<
    dyn Fn(MatchChain, ResolveContext<V>) -> BoxFuture<'static, Result<V, NavigationError>>
        + Send
        + Sync,
>;

/// Box an async closure into a [`ViewResolver`]
///
/// # Example
///
/// ```
/// use session_navigator::resolver_fn;
///
/// let resolver = resolver_fn::<String, _, _>(|chain, _cx| async move {
///     Ok(format!("view for {}", chain.matched_path()))
/// });
/// # let _ = resolver;
/// ```
pub fn resolver_fn<V, F, Fut>(f: F) -> ViewResolver<V>
where
    F: Fn(MatchChain, ResolveContext<V>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, NavigationError>> + Send + 'static,
{
    Arc::new(move |chain, context| Box::pin(f(chain, context)))
}

// ============================================================================
// Options
// ============================================================================

/// Options applied once when a router is created
///
/// # Example
///
/// ```
/// use session_navigator::{LoadingStatus, RouterOptions};
///
/// let options = RouterOptions::<String>::new()
///     .base_url("/app")
///     .on_loading_change(|status: LoadingStatus| println!("{:?}", status));
/// assert_eq!(options.base_url, "/app");
/// ```
pub struct RouterOptions<V> {
    /// View already on screen for the current entry, if any
    pub current_view: Option<V>,
    /// Prefix stripped before matching and prepended to produced paths
    pub base_url: String,
    /// Hook every resolution failure passes through
    pub error_handler: ErrorHandler<V>,
    /// Loading transition callback
    pub on_loading_change: Option<LoadingCallback>,
}

impl<V: 'static> RouterOptions<V> {
    /// Defaults: no current view, empty base, rethrowing error handler
    pub fn new() -> Self {
        Self {
            current_view: None,
            base_url: String::new(),
            error_handler: rethrow(),
            on_loading_change: None,
        }
    }

    /// Set the view already showing for the current entry
    pub fn current_view(mut self, view: V) -> Self {
        self.current_view = Some(view);
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url.into());
        self
    }

    /// Set the error handler
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(NavigationError) -> Result<V, NavigationError> + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Set the loading callback
    pub fn on_loading_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(LoadingStatus) + Send + Sync + 'static,
    {
        self.on_loading_change = Some(Arc::new(callback));
        self
    }
}

impl<V: 'static> Default for RouterOptions<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for RouterOptions<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("current_view", &self.current_view.is_some())
            .field("base_url", &self.base_url)
            .field("on_loading_change", &self.on_loading_change.is_some())
            .finish_non_exhaustive()
    }
}

/// Patch applied by [`Router::set_options`]; `None` fields are left alone.
///
/// There is no current view here: it only means something at
/// creation time.
pub struct RouterConfig<V> {
    pub base_url: Option<String>,
    pub error_handler: Option<ErrorHandler<V>>,
    pub on_loading_change: Option<LoadingCallback>,
}

impl<V> RouterConfig<V> {
    /// Empty patch
    pub fn new() -> Self {
        Self {
            base_url: None,
            error_handler: None,
            on_loading_change: None,
        }
    }

    /// Replace the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(normalize_base_url(base_url.into()));
        self
    }

    /// Replace the error handler
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(NavigationError) -> Result<V, NavigationError> + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Replace the loading callback
    pub fn on_loading_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(LoadingStatus) + Send + Sync + 'static,
    {
        self.on_loading_change = Some(Arc::new(callback));
        self
    }
}

impl<V> Default for RouterConfig<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings the router reads on every operation
pub(crate) struct Settings<V> {
    pub(crate) base_url: String,
    pub(crate) error_handler: ErrorHandler<V>,
    pub(crate) on_loading_change: Option<LoadingCallback>,
}

impl<V> Settings<V> {
    pub(crate) fn apply(&mut self, config: RouterConfig<V>) {
        if let Some(base_url) = config.base_url {
            self.base_url = base_url;
        }
        if let Some(handler) = config.error_handler {
            self.error_handler = handler;
        }
        if let Some(callback) = config.on_loading_change {
            self.on_loading_change = Some(callback);
        }
    }
}

/// `"/app/"` and `"/app"` are the same base; `"/"` is no base at all
fn normalize_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}
