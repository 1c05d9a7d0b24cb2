//! # Route Descriptor
//!
//! A route's action metadata comes in two shapes: bare marker values (`"protected"`)
//! and keyed attributes (`protected: true`, `scopes: [...]`). Both are kept so either
//! spelling can be honored.
//!
//! Descriptors are attached to requests as an extension, usually with
//! `axum::Extension(descriptor)` on the matched route.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker value and attribute key flagging a route as protected
pub const PROTECTED_MARKER: &str = "protected";

/// Attribute key holding the OAuth2 scopes a route requires
pub const SCOPES_KEY: &str = "scopes";

/// Read-only metadata for the matched route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Bare action values
    #[serde(default)]
    pub markers: Vec<String>,

    /// Keyed action values
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl RouteDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the bare `protected` marker
    pub fn protected(self) -> Self {
        self.with_marker(PROTECTED_MARKER)
    }

    pub fn with_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn with_attribute<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Declare the OAuth2 scopes this route requires
    pub fn with_scopes<I, S>(self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes = scopes
            .into_iter()
            .map(|scope| Value::String(scope.into()))
            .collect();
        self.with_attribute(SCOPES_KEY, Value::Array(scopes))
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// A route is protected when it carries the bare `protected` marker or a
    /// `protected` attribute that is exactly boolean `true`.
    pub fn is_protected(&self) -> bool {
        self.has_marker(PROTECTED_MARKER)
            || matches!(self.attribute(PROTECTED_MARKER), Some(Value::Bool(true)))
    }

    /// Scopes declared on the route. A single string counts as one scope;
    /// a missing or null attribute yields an empty list.
    pub fn scopes(&self) -> Vec<String> {
        match self.attribute(SCOPES_KEY) {
            Some(Value::Array(values)) => values.iter().filter_map(scope_value).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => scope_value(other).into_iter().collect(),
        }
    }
}

fn scope_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_protection_detection() {
        assert!(RouteDescriptor::new().protected().is_protected());
        assert!(RouteDescriptor::new()
            .with_attribute("protected", json!(true))
            .is_protected());

        assert!(!RouteDescriptor::new().is_protected());
        assert!(!RouteDescriptor::new()
            .with_attribute("protected", json!(false))
            .is_protected());
        // Only a real boolean counts
        assert!(!RouteDescriptor::new()
            .with_attribute("protected", json!("true"))
            .is_protected());
        assert!(!RouteDescriptor::new()
            .with_attribute("protected", json!(1))
            .is_protected());
    }

    #[test]
    fn test_scopes_extraction() {
        let route = RouteDescriptor::new().with_scopes(["read", "write"]);
        assert_eq!(route.scopes(), vec!["read", "write"]);

        let single = RouteDescriptor::new().with_attribute("scopes", json!("admin"));
        assert_eq!(single.scopes(), vec!["admin"]);

        assert!(RouteDescriptor::new().scopes().is_empty());
        assert!(RouteDescriptor::new()
            .with_attribute("scopes", json!(null))
            .scopes()
            .is_empty());
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
markers: [protected]
attributes:
  scopes: [users.read]
"#;
        let route: RouteDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(route.is_protected());
        assert_eq!(route.scopes(), vec!["users.read"]);
    }
}
