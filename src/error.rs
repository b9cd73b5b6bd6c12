//! Error handling for the navigator
//!
//! Provides the error raised by failed resolutions, the error raised by malformed
//! route templates, the outcome of a commit, and the global error handler hook.

use std::fmt;
use std::sync::Arc;

// ============================================================================
// Navigation Outcome
// ============================================================================

/// Outcome of a commit that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The resolved view was written into the stacks at `index`
    Committed { path: String, index: usize },
    /// A newer navigation (or a cancel) started before this one settled.
    /// Nothing was mutated and no loading signal was emitted.
    Superseded { path: String },
}

impl NavigationOutcome {
    /// Check if the navigation was committed
    pub fn is_committed(&self) -> bool {
        matches!(self, NavigationOutcome::Committed { .. })
    }

    /// Check if the navigation lost to a newer one
    pub fn is_superseded(&self) -> bool {
        matches!(self, NavigationOutcome::Superseded { .. })
    }

    /// Path (pathname + search + hash) this outcome refers to
    pub fn path(&self) -> &str {
        match self {
            NavigationOutcome::Committed { path, .. } | NavigationOutcome::Superseded { path } => {
                path
            }
        }
    }

    /// Stack index written by a committed navigation
    pub fn index(&self) -> Option<usize> {
        match self {
            NavigationOutcome::Committed { index, .. } => Some(*index),
            NavigationOutcome::Superseded { .. } => None,
        }
    }
}

// ============================================================================
// Navigation Errors
// ============================================================================

/// Errors that can occur while resolving a location into a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// No route chain matched the pathname
    RouteNotFound { path: String },

    /// The view resolver failed
    ResolutionFailed { message: String },

    /// Custom error, typically produced by an error handler
    Custom { message: String },
}

impl NavigationError {
    /// Route not found for `path`
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// View resolution failed with `message`
    pub fn resolution_failed(message: impl Into<String>) -> Self {
        Self::ResolutionFailed {
            message: message.into(),
        }
    }

    /// Custom error with `message`
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, NavigationError::RouteNotFound { .. })
    }

    /// Pathname carried by a not-found error
    pub fn not_found_path(&self) -> Option<&str> {
        match self {
            NavigationError::RouteNotFound { path } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::RouteNotFound { path } => {
                write!(f, "Route not found: {}", path)
            }
            NavigationError::ResolutionFailed { message } => {
                write!(f, "View resolution failed: {}", message)
            }
            NavigationError::Custom { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for NavigationError {}

// ============================================================================
// Route Template Errors
// ============================================================================

/// A route template that cannot be compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Template contains `//`
    ConsecutiveSlashes { template: String },

    /// A `:` with no name after it
    EmptyParamName { template: String },

    /// Parameter name with characters other than alphanumerics and `_`
    InvalidParamName { template: String, name: String },

    /// Same parameter name used twice
    DuplicateParam { template: String, name: String },

    /// Constraint that is not a valid regular expression
    InvalidConstraint { template: String, message: String },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::ConsecutiveSlashes { template } => {
                write!(
                    f,
                    "Route path '{}' cannot contain consecutive slashes",
                    template
                )
            }
            RouteError::EmptyParamName { template } => {
                write!(f, "Route path '{}' has an empty parameter name", template)
            }
            RouteError::InvalidParamName { template, name } => {
                write!(
                    f,
                    "Route parameter '{}' in '{}' must contain only alphanumeric \
                     characters and underscores",
                    name, template
                )
            }
            RouteError::DuplicateParam { template, name } => {
                write!(f, "Duplicate route parameter '{}' in '{}'", name, template)
            }
            RouteError::InvalidConstraint { template, message } => {
                write!(f, "Invalid constraint in '{}': {}", template, message)
            }
        }
    }
}

impl std::error::Error for RouteError {}

// ============================================================================
// Error Handler
// ============================================================================

/// Global hook every resolution failure passes through.
///
/// Returning `Err` propagates (possibly transformed); returning `Ok` recovers
/// with a view, e.g. an error page.
pub type ErrorHandler<V> = Arc<dyn Fn(NavigationError) -> Result<V, NavigationError> + Send + Sync>;

/// The default handler: propagate the error unchanged
pub fn rethrow<V: 'static>() -> ErrorHandler<V> {
    Arc::new(Err::<V, NavigationError>)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_outcome_committed() {
        let outcome = NavigationOutcome::Committed {
            path: "/home".to_string(),
            index: 2,
        };
        assert!(outcome.is_committed());
        assert!(!outcome.is_superseded());
        assert_eq!(outcome.path(), "/home");
        assert_eq!(outcome.index(), Some(2));
    }

    #[test]
    fn test_navigation_outcome_superseded() {
        let outcome = NavigationOutcome::Superseded {
            path: "/slow".to_string(),
        };
        assert!(outcome.is_superseded());
        assert_eq!(outcome.index(), None);
    }

    #[test]
    fn test_navigation_error_display() {
        let error = NavigationError::not_found("/test");
        assert_eq!(error.to_string(), "Route not found: /test");
        assert!(error.is_not_found());
        assert_eq!(error.not_found_path(), Some("/test"));

        let error = NavigationError::resolution_failed("timeout");
        assert_eq!(error.to_string(), "View resolution failed: timeout");
        assert_eq!(error.not_found_path(), None);
    }

    #[test]
    fn test_route_error_display() {
        let error = RouteError::DuplicateParam {
            template: "/a/:id/:id".to_string(),
            name: "id".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Duplicate route parameter 'id' in '/a/:id/:id'"
        );
    }

    #[test]
    fn test_rethrow_propagates_unchanged() {
        let handler = rethrow::<String>();
        let result = handler(NavigationError::not_found("/x"));
        assert_eq!(result, Err(NavigationError::not_found("/x")));
    }
}
