//! Immutable context snapshots.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type ContextMap = BTreeMap<String, String>;

/// Point-in-time copy of an ambient context.
///
/// Cloning is cheap: the map is shared behind an `Arc` and never mutated after
/// capture. `Default` is the absent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSnapshot {
    entries: Option<Arc<ContextMap>>,
}

impl ContextSnapshot {
    /// The "no context set" marker.
    pub fn absent() -> Self {
        Self { entries: None }
    }

    pub fn from_map(map: ContextMap) -> Self {
        Self {
            entries: Some(Arc::new(map)),
        }
    }

    pub(crate) fn from_shared(entries: Option<Arc<ContextMap>>) -> Self {
        Self { entries }
    }

    pub(crate) fn shared(&self) -> Option<Arc<ContextMap>> {
        self.entries.clone()
    }

    pub fn is_absent(&self) -> bool {
        self.entries.is_none()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .as_ref()
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.len())
    }

    /// True for both the absent snapshot and an empty map.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> FromIterator<(K, V)> for ContextSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl fmt::Display for ContextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(entries) = &self.entries else {
            return write!(f, "<none>");
        };
        write!(f, "{{")?;
        for (index, (key, value)) in entries.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, "}}")
    }
}

impl Serialize for ContextSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.as_deref().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_distinct_from_empty() {
        let absent = ContextSnapshot::absent();
        let empty = ContextSnapshot::from_map(ContextMap::new());

        assert!(absent.is_absent());
        assert!(!empty.is_absent());
        assert_ne!(absent, empty);
        assert!(absent.is_empty() && empty.is_empty());
    }

    #[test]
    fn test_display_formats_entries_in_key_order() {
        let snapshot: ContextSnapshot = [("user", "ana"), ("request_id", "r-1")].into_iter().collect();
        assert_eq!(snapshot.to_string(), "{request_id=r-1, user=ana}");
        assert_eq!(ContextSnapshot::absent().to_string(), "<none>");
    }

    #[test]
    fn test_serializes_absent_as_null() {
        let absent = serde_json::to_value(ContextSnapshot::absent()).unwrap();
        assert!(absent.is_null());

        let snapshot: ContextSnapshot = [("key", "v1")].into_iter().collect();
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value, serde_json::json!({ "key": "v1" }));
    }
}
