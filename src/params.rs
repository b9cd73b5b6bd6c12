//! Route parameter extraction and query string parsing
//!
//! This module provides types for working with values captured by route templates
//! (like `:id`) and query strings (like `?page=1&sort=name`), plus the
//! percent-decoding used by the matcher.

use std::collections::HashMap;

/// Route parameters captured from path segments
///
/// # Example
///
/// ```
/// use session_navigator::RouteParams;
///
/// // Route template: /users/:id
/// // Matched path: /users/123
/// let mut params = RouteParams::new();
/// params.insert("id".to_string(), "123".to_string());
///
/// assert_eq!(params.get("id"), Some(&"123".to_string()));
/// assert_eq!(params.get_as::<i32>("id"), Some(123));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    /// Create new empty route params
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from hashmap
    pub fn from_map(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a parameter value as a string
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.params.get(key)?.parse().ok()
    }

    /// Insert a parameter
    pub fn insert(&mut self, key: String, value: String) {
        self.params.insert(key, value);
    }

    /// Copy every parameter of `other` into `self`, overwriting on conflict
    pub fn merge(&mut self, other: &RouteParams) {
        for (key, value) in other.iter() {
            self.params.insert(key.clone(), value.clone());
        }
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get all parameters as a reference to the HashMap
    pub fn all(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Iterate over all parameters
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters parsed from a location's search string
///
/// Supports multiple values for the same key.
///
/// # Example
///
/// ```
/// use session_navigator::QueryParams;
///
/// let query = QueryParams::from_query_string("?page=1&sort=name&tag=rust&tag=web");
///
/// assert_eq!(query.get("page"), Some(&"1".to_string()));
/// assert_eq!(query.get_as::<i32>("page"), Some(1));
/// assert_eq!(query.get_all("tag").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: HashMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create new empty query params
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a query string, with or without the leading `?`
    ///
    /// A key without `=` is kept with an empty value.
    pub fn from_query_string(query: &str) -> Self {
        let mut params: HashMap<String, Vec<String>> = HashMap::new();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params
                .entry(decode_query_component(key))
                .or_default()
                .push(decode_query_component(value));
        }

        Self { params }
    }

    /// Get first value for a parameter
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)?.first()
    }

    /// Get all values for a parameter
    pub fn get_all(&self, key: &str) -> Option<&Vec<String>> {
        self.params.get(key)
    }

    /// Get the first value parsed as type T
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Insert a parameter
    ///
    /// If the key already exists, the value is appended to the list.
    pub fn insert(&mut self, key: String, value: String) {
        self.params.entry(key).or_default().push(value);
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Convert to a query string without the leading `?`
    ///
    /// Keys are emitted in sorted order so the output is stable.
    pub fn to_query_string(&self) -> String {
        let mut keys: Vec<&String> = self.params.keys().collect();
        keys.sort();

        let pairs: Vec<String> = keys
            .into_iter()
            .flat_map(|key| {
                self.params[key].iter().map(move |value| {
                    format!(
                        "{}={}",
                        encode_uri_component(key),
                        encode_uri_component(value)
                    )
                })
            })
            .collect();

        pairs.join("&")
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get number of unique parameter keys
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

/// URI component encoding of everything outside the unreserved set
pub fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Percent-decode a path component.
///
/// `+` is left alone. Input that does not decode to valid UTF-8, or that
/// contains a broken escape, is returned unchanged.
pub fn decode_uri_component(s: &str) -> String {
    percent_decode(s, false).unwrap_or_else(|| s.to_string())
}

/// Percent-decode a query component, treating `+` as a space
fn decode_query_component(s: &str) -> String {
    percent_decode(s, true).unwrap_or_else(|| s.to_string())
}

fn percent_decode(s: &str, plus_as_space: bool) -> Option<String> {
    if !s.contains('%') && !(plus_as_space && s.contains('+')) {
        return Some(s.to_string());
    }

    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = s.get(i + 1..i + 3)?;
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_params_basic() {
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "123".to_string());

        assert_eq!(params.get("id"), Some(&"123".to_string()));
        assert!(params.contains("id"));
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_route_params_get_as() {
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "123".to_string());
        params.insert("active".to_string(), "true".to_string());

        assert_eq!(params.get_as::<i32>("id"), Some(123));
        assert_eq!(params.get_as::<bool>("active"), Some(true));
        assert_eq!(params.get_as::<i32>("missing"), None);
    }

    #[test]
    fn test_route_params_merge_overwrites() {
        let mut parent = RouteParams::new();
        parent.insert("org".to_string(), "acme".to_string());
        parent.insert("id".to_string(), "1".to_string());

        let mut child = RouteParams::new();
        child.insert("id".to_string(), "2".to_string());

        parent.merge(&child);
        assert_eq!(parent.len(), 2);
        assert_eq!(parent.get("id"), Some(&"2".to_string()));
        assert_eq!(parent.get("org"), Some(&"acme".to_string()));
    }

    #[test]
    fn test_query_params_basic() {
        let query = QueryParams::from_query_string("?page=1&sort=name&flag");

        assert_eq!(query.get("page"), Some(&"1".to_string()));
        assert_eq!(query.get("sort"), Some(&"name".to_string()));
        assert_eq!(query.get("flag"), Some(&String::new()));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_query_params_multiple_values() {
        let query = QueryParams::from_query_string("tag=rust&tag=web&tag=ui");

        let tags = query.get_all("tag").unwrap();
        assert_eq!(tags, &vec!["rust".to_string(), "web".to_string(), "ui".to_string()]);
        assert_eq!(query.get("tag"), Some(&"rust".to_string()));
    }

    #[test]
    fn test_empty_query_string() {
        assert!(QueryParams::from_query_string("").is_empty());
        assert!(QueryParams::from_query_string("?").is_empty());
    }

    #[test]
    fn test_to_query_string_is_sorted() {
        let mut query = QueryParams::new();
        query.insert("sort".to_string(), "name".to_string());
        query.insert("page".to_string(), "1".to_string());
        query.insert("q".to_string(), "a b".to_string());

        assert_eq!(query.to_query_string(), "page=1&q=a%20b&sort=name");
    }

    #[test]
    fn test_uri_encoding() {
        assert_eq!(encode_uri_component("hello world"), "hello%20world");
        assert_eq!(encode_uri_component("test@example.com"), "test%40example.com");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
    }

    #[test]
    fn test_uri_decoding() {
        assert_eq!(decode_uri_component("hello%20world"), "hello world");
        assert_eq!(decode_uri_component("caf%C3%A9"), "café");
        // `+` is only special in query strings
        assert_eq!(decode_uri_component("a+b"), "a+b");
        assert_eq!(decode_query_component("a+b"), "a b");
    }

    #[test]
    fn test_malformed_escape_is_kept() {
        assert_eq!(decode_uri_component("100%"), "100%");
        assert_eq!(decode_uri_component("%zz"), "%zz");
        assert_eq!(decode_uri_component("%FF"), "%FF");
    }
}
