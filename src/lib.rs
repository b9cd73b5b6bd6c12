//! # Session Navigator
//!
//! A nested-route navigation core that keeps a location/view stack in step
//! with a browser-style session history:
//!
//! - **Nested Matching** - Ordered route trees with params, optional segments,
//!   wildcards and constraints; interior routes match prefixes
//! - **Async Resolution** - Views are produced by a caller-supplied async
//!   resolver from the chain of matched routes
//! - **Last Navigation Wins** - Overlapping navigations never commit a stale
//!   view
//! - **View Stack** - Traversing back or forward reuses the view resolved for
//!   that entry
//! - **Session Persistence** - The location stack is stored in history entry
//!   state and restored on startup
//! - **Base URL** - Mount the whole route table under a prefix
//! - **Named Routes** - Build paths from route names and params
//!
//! # Quick Start
//!
//! ```
//! use session_navigator::*;
//! use std::sync::Arc;
//!
//! let routes = vec![
//!     Route::new("/"),
//!     Route::new("/users").children([Route::new("/:id").name("user")]),
//! ];
//!
//! let router = Router::new(
//!     routes,
//!     Arc::new(MemoryHistory::new("/")),
//!     |chain, _cx| async move {
//!         let id = chain.params().get("id").cloned().unwrap_or_default();
//!         Ok(format!("page {}", id))
//!     },
//!     RouterOptions::new(),
//! );
//!
//! pollster::block_on(async {
//!     let outcome = router.navigate("/users/7", None).await.unwrap();
//!     assert!(outcome.is_committed());
//!     assert_eq!(router.current_view().as_deref().map(String::as_str), Some("page 7"));
//! });
//! ```
//!
//! # Listening
//!
//! Hosts get the view to show after every history change through
//! [`Router::listen`]. Views not resolved yet are resolved by a refresh the
//! host's runtime runs:
//!
//! ```ignore
//! let subscription = router.listen(
//!     Arc::new(|task| { tokio::spawn(task); }),
//!     |view, location| render(view, location),
//! );
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)
//! - `cache` (default) - LRU cache of match results

#![doc(html_root_url = "https://docs.rs/session-navigator/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Cache (optional)
#[cfg(feature = "cache")]
pub mod cache;

// Core routing modules
pub mod concurrency;
pub mod history;
pub mod location;
pub mod matcher;
pub mod route;

// Error handling
pub mod error;

// Router
pub mod listener;
pub mod options;
mod resolver;
pub mod router;
mod stack;

// Other modules
pub mod params;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{CacheStats, MatchCache};
pub use concurrency::{ConcurrencyGuard, Generation};
pub use error::{rethrow, ErrorHandler, NavigationError, NavigationOutcome, RouteError};
pub use history::{
    History, HistoryAction, HistoryEvent, HistoryListener, ListenerId, MemoryHistory,
};
pub use listener::{Spawner, Subscription, ViewChangeCallback};
pub use location::{HistoryState, Location};
pub use matcher::{match_routes, MatchChain, MatchFrame, MatchOptions, PathPattern, PatternMatch};
pub use options::{
    resolver_fn, LoadingCallback, LoadingStatus, ResolveContext, RouterConfig, RouterOptions,
    ViewResolver,
};
pub use params::{decode_uri_component, encode_uri_component, QueryParams, RouteParams};
pub use route::{build_child_path, NamedRouteRegistry, Route};
pub use router::Router;
