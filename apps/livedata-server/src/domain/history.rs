//! Field History Store
//!
//! Per-subscription last-known-value cache. Each incoming message is merged
//! field by field, retaining only the most recent value per field key. The
//! merged view is what consumers see on every outbound update, so a tick
//! that carries only a bid still publishes the last known ask alongside it.

use std::collections::BTreeMap;

use crate::domain::message::{Field, FieldMessage, FieldValue};

// =============================================================================
// Field Keys
// =============================================================================

/// Retention key for a field.
///
/// Named fields key by name. Unnamed fields fall back to their position
/// among the unnamed fields of the incoming message, so the n-th unnamed
/// field of every message overwrites the same slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldKey {
    /// Field keyed by name.
    Named(String),
    /// Unnamed field keyed by its per-message position.
    Positional(usize),
}

// =============================================================================
// FieldHistoryStore
// =============================================================================

/// Last-known-value cache keyed by field name.
///
/// Not versioned; last write wins and no history depth is kept.
#[derive(Debug, Clone, Default)]
pub struct FieldHistoryStore {
    values: BTreeMap<FieldKey, FieldValue>,
}

impl FieldHistoryStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Create a store pre-populated from a message.
    ///
    /// Applies the same merge logic as [`Self::live_data_received`], so
    /// duplicate field names in the source message collapse to the latest
    /// occurrence.
    #[must_use]
    pub fn from_message(message: &FieldMessage) -> Self {
        let mut store = Self::new();
        store.live_data_received(message);
        store
    }

    /// Merge an incoming message into the store.
    ///
    /// Later occurrences of a field name within the same message overwrite
    /// earlier ones.
    pub fn live_data_received(&mut self, message: &FieldMessage) {
        let mut unnamed_position = 0usize;
        for field in message.iter() {
            let key = match &field.name {
                Some(name) => FieldKey::Named(name.clone()),
                None => {
                    let key = FieldKey::Positional(unnamed_position);
                    unnamed_position += 1;
                    key
                }
            };
            self.values.insert(key, field.value.clone());
        }
    }

    /// Snapshot the merged view: exactly one field per distinct key.
    #[must_use]
    pub fn last_known_values(&self) -> FieldMessage {
        self.values
            .iter()
            .map(|(key, value)| Field {
                name: match key {
                    FieldKey::Named(name) => Some(name.clone()),
                    FieldKey::Positional(_) => None,
                },
                value: value.clone(),
            })
            .collect()
    }

    /// Get the last known value for a named field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(&FieldKey::Named(name.to_string()))
    }

    /// Check whether the store holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct field keys retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Discard all retained values.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_latest_value_per_name() {
        let mut store = FieldHistoryStore::new();
        store.live_data_received(&FieldMessage::new().with("BID", 100.0).with("ASK", 101.0));
        store.live_data_received(&FieldMessage::new().with("BID", 100.5));

        let snapshot = store.last_known_values();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("BID"), Some(&FieldValue::Double(100.5)));
        assert_eq!(snapshot.get("ASK"), Some(&FieldValue::Double(101.0)));
    }

    #[test]
    fn duplicate_names_in_one_message_collapse() {
        let msg = FieldMessage::new()
            .with("LAST", 1.0)
            .with("LAST", 2.0)
            .with("LAST", 3.0);

        let store = FieldHistoryStore::from_message(&msg);

        let snapshot = store.last_known_values();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("LAST"), Some(&FieldValue::Double(3.0)));
    }

    #[test]
    fn unnamed_fields_use_positional_slots() {
        let mut first = FieldMessage::new();
        first.add_unnamed("a");
        first.add_unnamed("b");

        let mut second = FieldMessage::new();
        second.add_unnamed("c");

        let mut store = FieldHistoryStore::new();
        store.live_data_received(&first);
        store.live_data_received(&second);

        // Slot 0 overwritten by "c", slot 1 still "b".
        let snapshot = store.last_known_values();
        assert_eq!(snapshot.len(), 2);
        let values: Vec<_> = snapshot.iter().map(|f| f.value.clone()).collect();
        assert!(values.contains(&FieldValue::Text("c".to_string())));
        assert!(values.contains(&FieldValue::Text("b".to_string())));
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let mut original = FieldHistoryStore::new();
        original.live_data_received(&FieldMessage::new().with("BID", 100.0));

        let mut copy = original.clone();
        copy.live_data_received(&FieldMessage::new().with("BID", 999.0));
        copy.clear();

        assert_eq!(original.get("BID"), Some(&FieldValue::Double(100.0)));
        assert!(copy.is_empty());
        assert!(!original.is_empty());
    }

    #[test]
    fn empty_and_clear() {
        let mut store = FieldHistoryStore::new();
        assert!(store.is_empty());

        store.live_data_received(&FieldMessage::new().with("BID", 1.0));
        assert!(!store.is_empty());
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }
}
