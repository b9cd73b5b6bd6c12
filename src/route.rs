//! Route definition and configuration

use crate::error::RouteError;
use crate::matcher::{MatchOptions, PathPattern, Segment};
use crate::params::{encode_uri_component, RouteParams};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Route
// ============================================================================

/// A node in the route table.
///
/// A route without a path template matches at zero width. A route with
/// children is an interior node and only needs to match a prefix of the path;
/// a leaf must match the rest of the path exactly.
///
/// Routes are shared as `Arc<Route>` so match frames can point back at them.
#[derive(Debug, Clone)]
pub struct Route {
    path: Option<String>,
    pattern: Option<PathPattern>,
    name: Option<String>,
    meta: HashMap<String, String>,
    children: Vec<Arc<Route>>,
}

impl Route {
    /// Create a route for a path template
    ///
    /// # Panics
    ///
    /// Panics if the template is malformed. Route tables are static
    /// configuration, so this is a programming error. Use `try_new` to get
    /// the error instead.
    ///
    /// # Example
    ///
    /// ```
    /// use session_navigator::Route;
    ///
    /// let route = Route::new("/users/:id").name("user").meta("title", "User");
    /// assert_eq!(route.path(), Some("/users/:id"));
    /// ```
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        match Self::try_new(path.as_str()) {
            Ok(route) => route,
            Err(e) => panic!("Invalid route path '{}': {}", path, e),
        }
    }

    /// Create a route for a path template, returning an error if malformed
    pub fn try_new(path: impl Into<String>) -> Result<Self, RouteError> {
        let path = path.into();
        let pattern = PathPattern::compile(&path, MatchOptions::leaf())?;
        Ok(Self {
            path: Some(path),
            pattern: Some(pattern),
            name: None,
            meta: HashMap::new(),
            children: Vec::new(),
        })
    }

    /// Create a route without a template (matches at zero width)
    ///
    /// Useful as a layout wrapper around children, or placed last as a
    /// catch-all for whatever its siblings did not match.
    pub fn pathless() -> Self {
        Self {
            path: None,
            pattern: None,
            name: None,
            meta: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Set child routes, making this an interior route
    pub fn children(mut self, children: impl IntoIterator<Item = Route>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self.sync_pattern_end();
        self
    }

    /// Add a single child route
    pub fn child(mut self, child: Route) -> Self {
        self.children.push(Arc::new(child));
        self.sync_pattern_end();
        self
    }

    /// Set route name
    ///
    /// Named routes can be turned into URLs with [`NamedRouteRegistry::url_for`].
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add metadata to the route
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Path template, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Compiled template, if any
    pub fn pattern(&self) -> Option<&PathPattern> {
        self.pattern.as_ref()
    }

    /// Route name, if any
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Metadata value
    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// All metadata
    pub fn meta_map(&self) -> &HashMap<String, String> {
        &self.meta
    }

    /// Child routes
    pub fn children_routes(&self) -> &[Arc<Route>] {
        &self.children
    }

    /// Check if this is an interior (layout) route
    pub fn is_layout(&self) -> bool {
        !self.children.is_empty()
    }

    fn sync_pattern_end(&mut self) {
        let end = self.children.is_empty();
        self.pattern = self.pattern.take().map(|p| p.with_end(end));
    }
}

// ============================================================================
// NamedRouteRegistry
// ============================================================================

/// Registry mapping route names to their full path templates
#[derive(Clone, Debug, Default)]
pub struct NamedRouteRegistry {
    routes: HashMap<String, String>,
}

impl NamedRouteRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every named route of a route forest, joining nested templates
    pub fn from_routes(routes: &[Arc<Route>]) -> Self {
        let mut registry = Self::new();
        registry.collect(routes, "");
        registry
    }

    fn collect(&mut self, routes: &[Arc<Route>], parent: &str) {
        for route in routes {
            let full = build_child_path(parent, route.path().unwrap_or(""));
            if let Some(name) = route.get_name() {
                self.register(name, full.as_ref());
            }
            self.collect(route.children_routes(), full.as_ref());
        }
    }

    /// Register a named route
    pub fn register(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.routes.insert(name.into(), path.into());
    }

    /// Get path template for a named route
    pub fn get(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(|s| s.as_str())
    }

    /// Check if a route name exists
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Generate a path for a named route
    ///
    /// Returns `None` for an unknown name or a missing required parameter.
    /// Optional parameters that are absent drop their segment.
    ///
    /// # Example
    ///
    /// ```
    /// use session_navigator::{NamedRouteRegistry, RouteParams};
    ///
    /// let mut registry = NamedRouteRegistry::new();
    /// registry.register("user.detail", "/users/:id");
    ///
    /// let mut params = RouteParams::new();
    /// params.insert("id".to_string(), "123".to_string());
    ///
    /// let url = registry.url_for("user.detail", &params).unwrap();
    /// assert_eq!(url, "/users/123");
    /// ```
    pub fn url_for(&self, name: &str, params: &RouteParams) -> Option<String> {
        let template = self.get(name)?;
        substitute_params(template, params)
    }

    /// Get number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Substitute parameters into a template, segment by segment
fn substitute_params(template: &str, params: &RouteParams) -> Option<String> {
    let pattern = PathPattern::compile(template, MatchOptions::leaf()).ok()?;
    let mut path = String::new();

    for segment in pattern.segments() {
        match segment {
            Segment::Static(text) => {
                path.push('/');
                path.push_str(text);
            }
            Segment::Param { name, .. } => {
                path.push('/');
                path.push_str(&encode_uri_component(params.get(name)?));
            }
            Segment::Optional(inner) => {
                if let Some(value) = inner.param_name().and_then(|name| params.get(name)) {
                    path.push('/');
                    path.push_str(&encode_uri_component(value));
                }
            }
            Segment::Wildcard => {
                path.push('/');
                path.push_str(params.get("*").map_or("", String::as_str));
            }
        }
    }

    if path.is_empty() {
        path.push('/');
    }
    Some(path)
}

/// Build the full template for a child route
///
/// Returns `Cow<str>` to avoid allocating when the child adds nothing.
///
/// # Example
///
/// ```
/// use session_navigator::build_child_path;
///
/// assert_eq!(build_child_path("/dashboard", "settings"), "/dashboard/settings");
/// assert_eq!(build_child_path("/dashboard", ""), "/dashboard");
/// ```
pub fn build_child_path<'a>(parent_path: &'a str, child_path: &'a str) -> Cow<'a, str> {
    let parent = parent_path.trim_end_matches('/');
    let child = child_path.trim_start_matches('/').trim_end_matches('/');

    if child.is_empty() {
        if parent == parent_path {
            Cow::Borrowed(parent_path)
        } else {
            Cow::Owned(parent.to_string())
        }
    } else if parent.is_empty() {
        Cow::Owned(format!("/{}", child))
    } else {
        Cow::Owned(format!("{}/{}", parent, child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_builder() {
        let route = Route::new("/admin")
            .name("admin")
            .meta("title", "Admin Panel")
            .child(Route::new("/users"));

        assert_eq!(route.path(), Some("/admin"));
        assert_eq!(route.get_name(), Some("admin"));
        assert_eq!(route.get_meta("title"), Some("Admin Panel"));
        assert_eq!(route.meta_map().len(), 1);
        assert!(route.is_layout());
        assert_eq!(route.children_routes().len(), 1);
    }

    #[test]
    fn test_interior_route_matches_prefix() {
        let leaf = Route::new("/b");
        assert!(leaf.pattern().unwrap().matches("/b/5").is_none());

        let interior = Route::new("/b").child(Route::new("/:id"));
        assert!(!interior.pattern().unwrap().options().end);
        assert!(interior.pattern().unwrap().matches("/b/5").is_some());
    }

    #[test]
    fn test_try_new_rejects_malformed() {
        assert!(Route::try_new("/a//b").is_err());
        assert!(Route::try_new("/users/:id").is_ok());
    }

    #[test]
    #[should_panic(expected = "Invalid route path")]
    fn test_new_panics_on_malformed() {
        let _ = Route::new("/a/:id/:id");
    }

    #[test]
    fn test_pathless_route() {
        let route = Route::pathless();
        assert!(route.path().is_none());
        assert!(route.pattern().is_none());
    }

    #[test]
    fn test_registry_from_nested_routes() {
        let routes = vec![Arc::new(
            Route::new("/dashboard").name("dashboard").children(vec![
                Route::new("settings").name("dashboard.settings"),
                Route::new("/users/:id").name("dashboard.user"),
            ]),
        )];

        let registry = NamedRouteRegistry::from_routes(&routes);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("dashboard.settings"), Some("/dashboard/settings"));
        assert_eq!(registry.get("dashboard.user"), Some("/dashboard/users/:id"));
    }

    #[test]
    fn test_registry_paths_match_under_root_layout() {
        let routes = vec![Arc::new(Route::new("/").children([
            Route::new("users").name("users"),
            Route::new("/users/:id").name("user"),
        ]))];
        let registry = NamedRouteRegistry::from_routes(&routes);

        let users = registry.url_for("users", &RouteParams::new()).unwrap();
        assert_eq!(users, "/users");
        assert!(crate::matcher::match_routes(&routes, &users).is_some());

        let mut params = RouteParams::new();
        params.insert("id".to_string(), "5".to_string());
        let user = registry.url_for("user", &params).unwrap();
        let chain = crate::matcher::match_routes(&routes, &user).unwrap();
        assert_eq!(chain.params().get("id"), Some(&"5".to_string()));
    }

    #[test]
    fn test_url_for_substitution() {
        let mut registry = NamedRouteRegistry::new();
        registry.register("post", "/users/:userId/posts/:postId");
        registry.register("settings", "/settings/:tab?");
        registry.register("item", "/items/:id");

        let mut params = RouteParams::new();
        params.insert("userId".to_string(), "1".to_string());
        params.insert("postId".to_string(), "99".to_string());
        assert_eq!(
            registry.url_for("post", &params),
            Some("/users/1/posts/99".to_string())
        );

        assert_eq!(
            registry.url_for("settings", &RouteParams::new()),
            Some("/settings".to_string())
        );

        // Required parameter missing
        assert_eq!(registry.url_for("item", &RouteParams::new()), None);

        let mut params = RouteParams::new();
        params.insert("id".to_string(), "a b".to_string());
        assert_eq!(
            registry.url_for("item", &params),
            Some("/items/a%20b".to_string())
        );
    }

    #[test]
    fn test_build_child_path() {
        assert_eq!(build_child_path("/", "users"), "/users");
        assert_eq!(build_child_path("", "/users"), "/users");
        assert_eq!(build_child_path("/a/", "/b/"), "/a/b");
    }
}
