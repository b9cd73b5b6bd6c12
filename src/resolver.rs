//! Matching and view resolution
//!
//! Turns paths into locations and locations into views. The base URL is
//! stripped before matching and prepended when building locations, so route
//! tables never mention it.

use crate::error::NavigationError;
use crate::location::Location;
use crate::matcher::{match_routes, MatchChain};
use crate::options::ResolveContext;
use crate::router::Router;
use crate::{debug_log, trace_log, warn_log};
use serde_json::Value;
use std::sync::Arc;

impl<V: Send + Sync + 'static> Router<V> {
    /// Match a full pathname (base URL included) against the route table.
    ///
    /// Returns `None` when the pathname lies outside the base URL or no
    /// route matches.
    pub fn match_path(&self, pathname: &str) -> Option<MatchChain> {
        let base_url = self.settings.read().base_url.clone();
        let stripped = strip_base(&base_url, pathname)?;

        #[cfg(feature = "cache")]
        {
            if let Some(cached) = self.match_cache.lock().get(stripped) {
                return cached;
            }
        }

        let chain = match_routes(&self.routes, stripped);

        #[cfg(feature = "cache")]
        self.match_cache
            .lock()
            .insert(stripped.to_string(), chain.clone());

        chain
    }

    /// Build a location for an app-relative path, prefixing the base URL
    ///
    /// # Example
    ///
    /// ```
    /// use session_navigator::{MemoryHistory, Route, Router, RouterOptions};
    /// use std::sync::Arc;
    ///
    /// let router = Router::new(
    ///     vec![Route::new("/a")],
    ///     Arc::new(MemoryHistory::new("/app")),
    ///     |_chain, _cx| async { Ok("view") },
    ///     RouterOptions::new().base_url("/app"),
    /// );
    /// assert_eq!(router.to_location("/a?x=1", None).path(), "/app/a?x=1");
    /// ```
    pub fn to_location(&self, path: &str, state: Option<Value>) -> Location {
        let base_url = self.settings.read().base_url.clone();
        Location::parse(&format!("{}{}", base_url, path), state)
    }

    /// Resolve a view for `location`.
    ///
    /// Failures, including the not-found error for an unmatched pathname,
    /// pass through the error handler, which may recover with a view.
    pub async fn resolve(self: &Arc<Self>, location: Location) -> Result<Arc<V>, NavigationError> {
        match self.resolve_unhandled(location).await {
            Ok(view) => Ok(Arc::new(view)),
            Err(error) => {
                warn_log!("Resolution failed: {}", error);
                let handler = Arc::clone(&self.settings.read().error_handler);
                handler(error).map(Arc::new)
            }
        }
    }

    /// [`to_location`](Self::to_location) followed by [`resolve`](Self::resolve)
    pub async fn resolve_to(
        self: &Arc<Self>,
        path: &str,
        state: Option<Value>,
    ) -> Result<Arc<V>, NavigationError> {
        let location = self.to_location(path, state);
        self.resolve(location).await
    }

    async fn resolve_unhandled(self: &Arc<Self>, location: Location) -> Result<V, NavigationError> {
        let Some(chain) = self.match_path(&location.pathname) else {
            debug_log!("No route for '{}'", location.pathname);
            return Err(NavigationError::not_found(location.pathname));
        };

        trace_log!(
            "Resolving '{}' through {} matched levels",
            location.path(),
            chain.len()
        );
        let context = ResolveContext {
            router: Arc::clone(self),
            location,
        };
        (self.resolve_view)(chain, context).await
    }
}

/// Strip `base_url` off `pathname`; `None` if it is not a prefix at a
/// segment boundary
fn strip_base<'a>(base_url: &str, pathname: &'a str) -> Option<&'a str> {
    if base_url.is_empty() {
        return Some(pathname);
    }
    match pathname.strip_prefix(base_url)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_base() {
        assert_eq!(strip_base("", "/a"), Some("/a"));
        assert_eq!(strip_base("/app", "/app/a"), Some("/a"));
        assert_eq!(strip_base("/app", "/app"), Some("/"));
        assert_eq!(strip_base("/app", "/apple"), None);
        assert_eq!(strip_base("/app", "/a"), None);
    }
}
