//! Locations and the state persisted with each history entry

use crate::params::QueryParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed navigation target
///
/// The wire form is `pathname + search + hash`; `search` keeps its leading
/// `?` and `hash` its leading `#`, both empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub hash: String,
    /// Caller-opaque state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl Location {
    /// Parse a path such as `/users?page=2#top`.
    ///
    /// An empty pathname becomes `/`. A `?` after the `#` belongs to the hash.
    ///
    /// # Example
    ///
    /// ```
    /// use session_navigator::Location;
    ///
    /// let location = Location::parse("/users?page=2#top", None);
    /// assert_eq!(location.pathname, "/users");
    /// assert_eq!(location.search, "?page=2");
    /// assert_eq!(location.hash, "#top");
    /// assert_eq!(location.path(), "/users?page=2#top");
    /// ```
    pub fn parse(path: &str, state: Option<Value>) -> Self {
        let (rest, hash) = match path.find('#') {
            Some(pos) => path.split_at(pos),
            None => (path, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(pos) => rest.split_at(pos),
            None => (rest, ""),
        };

        Self {
            pathname: if pathname.is_empty() {
                "/".to_string()
            } else {
                pathname.to_string()
            },
            // A lone `?` or `#` carries nothing
            search: if search == "?" { String::new() } else { search.to_string() },
            hash: if hash == "#" { String::new() } else { hash.to_string() },
            state,
        }
    }

    /// Canonical wire form: pathname + search + hash
    pub fn path(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }

    /// Parsed query string
    pub fn query(&self) -> QueryParams {
        QueryParams::from_query_string(&self.search)
    }

    /// Same location with different state
    pub fn with_state(mut self, state: Option<Value>) -> Self {
        self.state = state;
        self
    }

    /// Check if two locations point at the same path, ignoring state
    pub fn same_path(&self, other: &Location) -> bool {
        self.pathname == other.pathname && self.search == other.search && self.hash == other.hash
    }
}

/// Router bookkeeping stored in every history entry
///
/// Serialized as `{"index": n, "locationStack": [...], "state": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    /// Position of the entry in `location_stack`
    #[serde(default)]
    pub index: usize,
    /// The router's whole location stack at the time the entry was written
    #[serde(default)]
    pub location_stack: Vec<Location>,
    /// Caller state of the entry's location
    #[serde(default)]
    pub state: Option<Value>,
}

impl HistoryState {
    /// Key of the index field in the persisted object
    pub const INDEX_KEY: &'static str = "index";
    /// Key of the location stack field in the persisted object
    pub const STACK_KEY: &'static str = "locationStack";
    /// Key of the caller state field in the persisted object
    pub const STATE_KEY: &'static str = "state";

    /// Read router bookkeeping from an entry's raw state.
    ///
    /// Returns `None` unless the value is an object carrying a location stack.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get(Self::STACK_KEY).is_none() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Read only the index of an entry's raw state, defaulting to 0
    pub fn index_of(value: Option<&Value>) -> usize {
        value
            .and_then(|v| v.get(Self::INDEX_KEY))
            .and_then(Value::as_u64)
            .and_then(|i| usize::try_from(i).ok())
            .unwrap_or(0)
    }

    /// Read only the caller state of an entry's raw state
    pub fn caller_state_of(value: Option<&Value>) -> Option<Value> {
        value
            .and_then(|v| v.get(Self::STATE_KEY))
            .filter(|v| !v.is_null())
            .cloned()
    }

    /// Serialize into the raw form stored by the history facility
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_path() {
        let location = Location::parse("/a/b?x=1&y=2#frag", Some(json!({"k": 1})));
        assert_eq!(location.pathname, "/a/b");
        assert_eq!(location.search, "?x=1&y=2");
        assert_eq!(location.hash, "#frag");
        assert_eq!(location.state, Some(json!({"k": 1})));
        assert_eq!(location.query().get_as::<i32>("y"), Some(2));
    }

    #[test]
    fn test_parse_edge_cases() {
        assert_eq!(Location::parse("", None).pathname, "/");
        assert_eq!(Location::parse("?q", None).pathname, "/");

        let location = Location::parse("/a?#", None);
        assert_eq!(location.search, "");
        assert_eq!(location.hash, "");

        // `?` inside the hash stays in the hash
        let location = Location::parse("/a#x?y", None);
        assert_eq!(location.search, "");
        assert_eq!(location.hash, "#x?y");
    }

    #[test]
    fn test_same_path_ignores_state() {
        let a = Location::parse("/a?x=1#h", Some(json!({"k": 1})));
        let b = Location::parse("/a?x=1#h", None);
        assert!(a.same_path(&b));
        assert!(!a.same_path(&Location::parse("/a?x=1#other", None)));
        assert!(!a.same_path(&Location::parse("/a?x=2#h", None)));
    }

    #[test]
    fn test_history_state_layout() {
        let state = HistoryState {
            index: 1,
            location_stack: vec![
                Location::parse("/", None),
                Location::parse("/a?x=1", Some(json!("s"))),
            ],
            state: Some(json!("s")),
        };

        let value = state.to_value();
        assert_eq!(value["index"], json!(1));
        assert_eq!(value["locationStack"][1]["pathname"], json!("/a"));
        assert_eq!(value["locationStack"][1]["search"], json!("?x=1"));
        assert_eq!(value["state"], json!("s"));

        assert_eq!(HistoryState::from_value(&value), Some(state));
    }

    #[test]
    fn test_history_state_rejects_foreign_values() {
        assert_eq!(HistoryState::from_value(&json!({"scrollY": 10})), None);
        assert_eq!(HistoryState::from_value(&json!("plain")), None);
    }

    #[test]
    fn test_index_and_state_accessors() {
        let value = json!({"index": 3, "state": {"tab": "a"}});
        assert_eq!(HistoryState::index_of(Some(&value)), 3);
        assert_eq!(HistoryState::index_of(None), 0);
        assert_eq!(HistoryState::index_of(Some(&json!({}))), 0);
        assert_eq!(
            HistoryState::caller_state_of(Some(&value)),
            Some(json!({"tab": "a"}))
        );
        assert_eq!(HistoryState::caller_state_of(Some(&json!({"state": null}))), None);
    }
}
