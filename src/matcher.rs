//! Route matching
//!
//! Two layers live here:
//!
//! - [`PathPattern`], the pattern primitive: a route template compiled to a
//!   regular expression, matched either anchored (`end`) or as a prefix that
//!   stops on a segment boundary.
//! - [`match_routes`], the tree walk: depth-first over an ordered route forest,
//!   first match wins, and no backtracking into siblings once an interior
//!   route's prefix has matched.
//!
//! Template syntax:
//! - `users` static text
//! - `:id` a required parameter, one segment
//! - `:id?` an optional parameter segment
//! - `:id<\d+>` a parameter constrained by a regular expression (`<num>` and
//!   `<uuid>` are shorthands); constraints cannot contain `/`
//! - `*` the rest of the path, captured as the `*` parameter

use crate::error::RouteError;
use crate::params::{decode_uri_component, RouteParams};
use crate::route::Route;
use crate::trace_log;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Group holding the whole matched path in every compiled pattern
const MATCHED_GROUP: &str = "m";

/// Matching flags, mirroring the usual path-to-regexp options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Trailing slashes are significant
    pub strict: bool,
    /// Matching is case-sensitive
    pub sensitive: bool,
    /// Percent-decode captured parameters
    pub decode: bool,
    /// Require the whole path to be consumed
    pub end: bool,
}

impl MatchOptions {
    /// Options for a leaf route: strict, sensitive, decoding, anchored
    pub fn leaf() -> Self {
        Self {
            strict: true,
            sensitive: true,
            decode: true,
            end: true,
        }
    }

    /// Options for an interior route: like [`MatchOptions::leaf`] but prefix-only
    pub fn prefix() -> Self {
        Self {
            end: false,
            ..Self::leaf()
        }
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::leaf()
    }
}

/// A single segment in a route template
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Static text that must match exactly (empty for a trailing slash)
    Static(String),
    /// Parameter that captures one segment
    Param {
        name: String,
        constraint: Option<Constraint>,
    },
    /// Segment that may be missing, along with its leading slash
    Optional(Box<Segment>),
    /// Captures the rest of the path
    Wildcard,
}

impl Segment {
    /// Parse a segment from string
    ///
    /// Examples:
    /// - "users" -> Static("users")
    /// - ":id" -> Param { name: "id", constraint: None }
    /// - ":id<\\d+>" -> Param { name: "id", constraint: Some(Numeric) }
    /// - ":id?" -> Optional(Param { name: "id", .. })
    /// - "*" -> Wildcard
    pub fn parse(s: &str) -> Self {
        if s == "*" {
            return Segment::Wildcard;
        }

        let Some(rest) = s.strip_prefix(':') else {
            return Segment::Static(s.to_string());
        };

        if let Some(inner) = rest.strip_suffix('?') {
            return Segment::Optional(Box::new(Segment::parse(&format!(":{}", inner))));
        }

        // Constraint: :id<\d+>
        if let Some(pos) = rest.find('<') {
            if let Some(body) = rest[pos + 1..].strip_suffix('>') {
                return Segment::Param {
                    name: rest[..pos].to_string(),
                    constraint: Some(Constraint::parse(body)),
                };
            }
        }

        Segment::Param {
            name: rest.to_string(),
            constraint: None,
        }
    }

    /// Name of the parameter this segment captures, if any
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param { name, .. } => Some(name),
            Segment::Optional(inner) => inner.param_name(),
            Segment::Wildcard => Some("*"),
        }
    }
}

/// Constraint for validating parameter values
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Arbitrary regular expression
    Pattern(String),
    /// ASCII digits
    Numeric,
    /// 8-4-4-4-12 hex UUID
    Uuid,
}

impl Constraint {
    fn parse(s: &str) -> Self {
        match s {
            "\\d+" | "num" => Constraint::Numeric,
            "uuid" => Constraint::Uuid,
            _ => Constraint::Pattern(s.to_string()),
        }
    }

    fn regex_source(&self) -> &str {
        match self {
            Constraint::Numeric => r"\d+",
            Constraint::Uuid => {
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
            }
            Constraint::Pattern(pattern) => pattern,
        }
    }
}

/// Result of matching a [`PathPattern`]
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// The consumed prefix of the input (all of it when anchored)
    pub matched_path: String,
    /// Captured parameters
    pub params: RouteParams,
}

/// A route template compiled for matching
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    param_names: Vec<String>,
    exact: Regex,
    prefix: Regex,
    options: MatchOptions,
}

impl PathPattern {
    /// Compile a template.
    ///
    /// A template that does not start with `/` is treated as if it did, so
    /// `"settings"` and `"/settings"` are the same pattern.
    pub fn compile(template: &str, options: MatchOptions) -> Result<Self, RouteError> {
        let segments = parse_template(template)?;
        let param_names: Vec<String> = segments
            .iter()
            .filter_map(|s| s.param_name().map(str::to_string))
            .collect();

        let body = render_segments(&segments);
        let flags = if options.sensitive { "" } else { "(?i)" };
        let trailing = if options.strict { "" } else { "/?" };
        let exact_src = format!("{flags}^(?P<{MATCHED_GROUP}>{body}{trailing})$");
        // A prefix never consumes its trailing slash: children of `/` see `/users`
        let prefix_body = body.strip_suffix('/').unwrap_or(&body);
        let prefix_src = format!("{flags}^(?P<{MATCHED_GROUP}>{prefix_body})(?:/|$)");

        let compile = |src: &str| {
            Regex::new(src).map_err(|e| RouteError::InvalidConstraint {
                template: template.to_string(),
                message: e.to_string(),
            })
        };

        Ok(Self {
            template: template.to_string(),
            segments,
            param_names,
            exact: compile(&exact_src)?,
            prefix: compile(&prefix_src)?,
            options,
        })
    }

    /// The template this pattern was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parsed segments
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of every parameter, in template order
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Options in effect
    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Same pattern with a different `end` flag
    pub fn with_end(mut self, end: bool) -> Self {
        self.options.end = end;
        self
    }

    /// Match `path`, honoring the `end` option
    pub fn matches(&self, path: &str) -> Option<PatternMatch> {
        let regex = if self.options.end {
            &self.exact
        } else {
            &self.prefix
        };
        let captures = regex.captures(path)?;
        let matched_path = captures.name(MATCHED_GROUP)?.as_str().to_string();

        let mut params = RouteParams::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(value) = captures.name(&group_name(i)) {
                let value = if self.options.decode {
                    decode_uri_component(value.as_str())
                } else {
                    value.as_str().to_string()
                };
                params.insert(name.clone(), value);
            }
        }

        Some(PatternMatch {
            matched_path,
            params,
        })
    }
}

fn group_name(index: usize) -> String {
    format!("p{}", index)
}

/// Split and validate a template
fn parse_template(template: &str) -> Result<Vec<Segment>, RouteError> {
    if template.is_empty() {
        return Ok(Vec::new());
    }
    if template.contains("//") {
        return Err(RouteError::ConsecutiveSlashes {
            template: template.to_string(),
        });
    }

    let relative = template.strip_prefix('/').unwrap_or(template);
    let segments: Vec<Segment> = relative.split('/').map(Segment::parse).collect();

    let mut seen = HashSet::new();
    for segment in &segments {
        let Some(name) = segment.param_name() else {
            continue;
        };
        if name == "*" {
            if !seen.insert(name.to_string()) {
                return Err(RouteError::DuplicateParam {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }
            continue;
        }
        if name.is_empty() {
            return Err(RouteError::EmptyParamName {
                template: template.to_string(),
            });
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(RouteError::InvalidParamName {
                template: template.to_string(),
                name: name.to_string(),
            });
        }
        if !seen.insert(name.to_string()) {
            return Err(RouteError::DuplicateParam {
                template: template.to_string(),
                name: name.to_string(),
            });
        }
    }

    Ok(segments)
}

fn render_segments(segments: &[Segment]) -> String {
    let mut body = String::new();
    let mut index = 0;
    for segment in segments {
        render_segment(segment, &mut index, &mut body);
    }
    body
}

fn render_segment(segment: &Segment, index: &mut usize, out: &mut String) {
    match segment {
        Segment::Static(text) => {
            out.push('/');
            out.push_str(&regex::escape(text));
        }
        Segment::Param { constraint, .. } => {
            let inner = constraint
                .as_ref()
                .map_or("[^/]+", |constraint| constraint.regex_source());
            out.push_str(&format!("/(?P<{}>(?:{}))", group_name(*index), inner));
            *index += 1;
        }
        Segment::Optional(inner) => {
            out.push_str("(?:");
            render_segment(inner, index, out);
            out.push_str(")?");
        }
        Segment::Wildcard => {
            out.push_str(&format!("/(?P<{}>.*)", group_name(*index)));
            *index += 1;
        }
    }
}

// ============================================================================
// Route tree matching
// ============================================================================

/// One level of a successful match
#[derive(Debug, Clone)]
pub struct MatchFrame {
    /// The route matched at this level
    pub route: Arc<Route>,
    /// What this level consumed
    pub matched_path: String,
    /// Everything consumed by the levels above
    pub base_path: String,
    /// Parameters captured at this level only
    pub params: RouteParams,
}

/// Root-first chain of frames, ending at a leaf
#[derive(Debug, Clone)]
pub struct MatchChain {
    frames: Vec<MatchFrame>,
}

impl MatchChain {
    /// Wrap frames produced by a matcher
    pub fn new(frames: Vec<MatchFrame>) -> Self {
        Self { frames }
    }

    /// All frames, root first
    pub fn frames(&self) -> &[MatchFrame] {
        &self.frames
    }

    /// The deepest frame
    pub fn leaf(&self) -> Option<&MatchFrame> {
        self.frames.last()
    }

    /// Parameters of every level merged, deeper levels winning
    pub fn params(&self) -> RouteParams {
        let mut params = RouteParams::new();
        for frame in &self.frames {
            params.merge(&frame.params);
        }
        params
    }

    /// Concatenation of every frame's matched substring
    pub fn matched_path(&self) -> String {
        self.frames.iter().map(|f| f.matched_path.as_str()).collect()
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// A chain is never empty when produced by [`match_routes`]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate over frames
    pub fn iter(&self) -> std::slice::Iter<'_, MatchFrame> {
        self.frames.iter()
    }
}

impl<'a> IntoIterator for &'a MatchChain {
    type Item = &'a MatchFrame;
    type IntoIter = std::slice::Iter<'a, MatchFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Match `pathname` against an ordered route forest.
///
/// Routes at each level are tried in declared order:
/// - a route without a template matches anything at zero width, so a
///   trailing one acts as a catch-all
/// - a leaf with a template must consume the remaining path entirely
/// - an interior route matches a prefix, then its children are matched
///   against the rest
///
/// When an interior route matches but none of its children do, the level
/// fails without trying the interior route's later siblings.
pub fn match_routes(routes: &[Arc<Route>], pathname: &str) -> Option<MatchChain> {
    trace_log!("Matching '{}' against {} root routes", pathname, routes.len());
    let mut frames = Vec::new();
    if match_level(routes, pathname, "", &mut frames) {
        Some(MatchChain::new(frames))
    } else {
        trace_log!("No route matched '{}'", pathname);
        None
    }
}

fn match_level(
    routes: &[Arc<Route>],
    remaining: &str,
    base: &str,
    frames: &mut Vec<MatchFrame>,
) -> bool {
    for route in routes {
        let is_leaf = route.children_routes().is_empty();

        let matched = match route.pattern() {
            Some(pattern) => pattern.matches(remaining),
            None => Some(PatternMatch {
                matched_path: String::new(),
                params: RouteParams::new(),
            }),
        };
        let Some(matched) = matched else {
            continue;
        };

        trace_log!(
            "  '{}' matched '{}' (base '{}')",
            route.path().unwrap_or(""),
            matched.matched_path,
            base
        );

        let rest = &remaining[matched.matched_path.len()..];
        let next_base = format!("{}{}", base, matched.matched_path);
        frames.push(MatchFrame {
            route: Arc::clone(route),
            matched_path: matched.matched_path,
            base_path: base.to_string(),
            params: matched.params,
        });

        if is_leaf || match_level(route.children_routes(), rest, &next_base, frames) {
            return true;
        }

        // Prefix matched but no child did: this level fails as a whole.
        frames.pop();
        return false;
    }

    false
}
