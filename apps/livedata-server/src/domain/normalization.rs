//! Normalization Rules
//!
//! Raw provider messages pass through an ordered list of field transforms
//! before publication. A rule may rewrite the message or suppress it
//! entirely (e.g. when a required field is missing). Rule sets are named and
//! resolved by id; two rule sets are equal iff their ids are equal.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::domain::history::FieldHistoryStore;
use crate::domain::message::{Field, FieldMessage, FieldValue};

/// Rule set id used when no normalization is wanted.
pub const NO_NORMALIZATION_ID: &str = "Raw";

// =============================================================================
// Errors
// =============================================================================

/// Normalization failure for a single message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NormalizationError {
    /// A rule expected a numeric field and found something else.
    #[error("field {field} is not numeric")]
    NotNumeric {
        /// Offending field name.
        field: String,
    },
}

// =============================================================================
// Rule trait
// =============================================================================

/// A single field transform.
///
/// Returns the rewritten message, `Ok(None)` to suppress the message for
/// this distributor, or an error. The field history carries the last known
/// values for the subscription and lets rules fill gaps from prior ticks.
pub trait NormalizationRule: Send + Sync {
    /// Apply the transform to a message.
    ///
    /// # Errors
    ///
    /// Returns an error when the message violates the rule's expectations
    /// (e.g. a non-numeric value where a number is required).
    fn apply(
        &self,
        message: FieldMessage,
        history: &FieldHistoryStore,
    ) -> Result<Option<FieldMessage>, NormalizationError>;
}

// =============================================================================
// Shipped rules
// =============================================================================

/// Keeps only the named fields in an allow list; everything else is dropped.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    allowed: BTreeSet<String>,
}

impl FieldFilter {
    /// Create a filter keeping only the given field names.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl NormalizationRule for FieldFilter {
    fn apply(
        &self,
        message: FieldMessage,
        _history: &FieldHistoryStore,
    ) -> Result<Option<FieldMessage>, NormalizationError> {
        let filtered: FieldMessage = message
            .iter()
            .filter(|f| f.name.as_deref().is_some_and(|n| self.allowed.contains(n)))
            .cloned()
            .collect();
        Ok(Some(filtered))
    }
}

/// Renames one field, leaving all others untouched.
#[derive(Debug, Clone)]
pub struct FieldRename {
    from: String,
    to: String,
}

impl FieldRename {
    /// Create a rename from one field name to another.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl NormalizationRule for FieldRename {
    fn apply(
        &self,
        message: FieldMessage,
        _history: &FieldHistoryStore,
    ) -> Result<Option<FieldMessage>, NormalizationError> {
        let renamed: FieldMessage = message
            .iter()
            .map(|f| {
                let name = match f.name.as_deref() {
                    Some(n) if n == self.from => Some(self.to.clone()),
                    other => other.map(ToString::to_string),
                };
                Field {
                    name,
                    value: f.value.clone(),
                }
            })
            .collect();
        Ok(Some(renamed))
    }
}

/// Multiplies a numeric field by a fixed factor (unit conversion).
#[derive(Debug, Clone)]
pub struct UnitScale {
    field: String,
    factor: f64,
}

impl UnitScale {
    /// Create a scaling rule for the given field.
    #[must_use]
    pub fn new(field: impl Into<String>, factor: f64) -> Self {
        Self {
            field: field.into(),
            factor,
        }
    }
}

impl NormalizationRule for UnitScale {
    fn apply(
        &self,
        message: FieldMessage,
        _history: &FieldHistoryStore,
    ) -> Result<Option<FieldMessage>, NormalizationError> {
        let mut out = FieldMessage::new();
        for f in message.iter() {
            if f.name.as_deref() == Some(self.field.as_str()) {
                let numeric = f.value.as_f64().ok_or_else(|| NormalizationError::NotNumeric {
                    field: self.field.clone(),
                })?;
                out.add(self.field.clone(), numeric * self.factor);
            } else {
                match &f.name {
                    Some(name) => out.add(name.clone(), f.value.clone()),
                    None => out.add_unnamed(f.value.clone()),
                }
            }
        }
        Ok(Some(out))
    }
}

/// Suppresses the message unless all required fields are available, either
/// in the message itself or in the field history.
#[derive(Debug, Clone)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    /// Create a gate requiring the given field names.
    #[must_use]
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl NormalizationRule for RequiredFields {
    fn apply(
        &self,
        message: FieldMessage,
        history: &FieldHistoryStore,
    ) -> Result<Option<FieldMessage>, NormalizationError> {
        let satisfied = self
            .fields
            .iter()
            .all(|f| message.get(f).is_some() || history.get(f).is_some());
        Ok(satisfied.then_some(message))
    }
}

// =============================================================================
// Rule sets
// =============================================================================

/// A named, ordered list of normalization rules.
///
/// Equality and hashing are by id only.
pub struct NormalizationRuleSet {
    id: String,
    rules: Vec<Box<dyn NormalizationRule>>,
}

impl NormalizationRuleSet {
    /// Create a rule set with the given id and rules.
    #[must_use]
    pub fn new(id: impl Into<String>, rules: Vec<Box<dyn NormalizationRule>>) -> Self {
        Self {
            id: id.into(),
            rules,
        }
    }

    /// The shared "no normalization" rule set: raw messages pass unchanged.
    #[must_use]
    pub fn no_normalization() -> Arc<Self> {
        Arc::new(Self::new(NO_NORMALIZATION_ID, Vec::new()))
    }

    /// Get the rule set id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of rules in the set.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run a message through the rules in order.
    ///
    /// Returns `Ok(None)` when some rule suppressed the message.
    ///
    /// # Errors
    ///
    /// Propagates the first rule failure.
    pub fn normalize(
        &self,
        message: FieldMessage,
        history: &FieldHistoryStore,
    ) -> Result<Option<FieldMessage>, NormalizationError> {
        let mut current = message;
        for rule in &self.rules {
            match rule.apply(current, history)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

impl fmt::Debug for NormalizationRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizationRuleSet")
            .field("id", &self.id)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl PartialEq for NormalizationRuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NormalizationRuleSet {}

impl Hash for NormalizationRuleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(bid: f64, ask: f64) -> FieldMessage {
        FieldMessage::new().with("BID", bid).with("ASK", ask)
    }

    #[test]
    fn field_filter_drops_unlisted_fields() {
        let rule = FieldFilter::new(["BID"]);
        let out = rule
            .apply(quote(100.0, 101.0), &FieldHistoryStore::new())
            .unwrap()
            .unwrap();

        assert_eq!(out.len(), 1);
        assert!(out.get("BID").is_some());
        assert!(out.get("ASK").is_none());
    }

    #[test]
    fn field_rename_rewrites_matching_names() {
        let rule = FieldRename::new("BID", "BID_PRICE");
        let out = rule
            .apply(quote(100.0, 101.0), &FieldHistoryStore::new())
            .unwrap()
            .unwrap();

        assert!(out.get("BID").is_none());
        assert_eq!(out.get("BID_PRICE"), Some(&FieldValue::Double(100.0)));
        assert!(out.get("ASK").is_some());
    }

    #[test]
    fn unit_scale_multiplies_numeric_field() {
        let rule = UnitScale::new("BID", 0.01);
        let out = rule
            .apply(quote(100.0, 101.0), &FieldHistoryStore::new())
            .unwrap()
            .unwrap();

        assert_eq!(out.get("BID"), Some(&FieldValue::Double(1.0)));
    }

    #[test]
    fn unit_scale_rejects_non_numeric_field() {
        let rule = UnitScale::new("VENUE", 2.0);
        let msg = FieldMessage::new().with("VENUE", "XNAS");

        let result = rule.apply(msg, &FieldHistoryStore::new());
        assert!(matches!(
            result,
            Err(NormalizationError::NotNumeric { field }) if field == "VENUE"
        ));
    }

    #[test]
    fn required_fields_suppresses_when_missing() {
        let rule = RequiredFields::new(["BID", "ASK"]);
        let msg = FieldMessage::new().with("BID", 100.0);

        let out = rule.apply(msg, &FieldHistoryStore::new()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn required_fields_satisfied_from_history() {
        let rule = RequiredFields::new(["BID", "ASK"]);
        let history = FieldHistoryStore::from_message(&quote(99.0, 100.0));
        let msg = FieldMessage::new().with("BID", 100.0);

        let out = rule.apply(msg, &history).unwrap();
        assert!(out.is_some());
    }

    #[test]
    fn rule_set_applies_rules_in_order() {
        let set = NormalizationRuleSet::new(
            "pennies",
            vec![
                Box::new(FieldFilter::new(["BID", "ASK"])),
                Box::new(UnitScale::new("BID", 100.0)),
            ],
        );

        let msg = quote(1.5, 2.0).with("NOISE", "x");
        let out = set.normalize(msg, &FieldHistoryStore::new()).unwrap().unwrap();

        assert_eq!(out.get("BID"), Some(&FieldValue::Double(150.0)));
        assert!(out.get("NOISE").is_none());
    }

    #[test]
    fn no_normalization_passes_message_through() {
        let set = NormalizationRuleSet::no_normalization();
        let msg = quote(1.0, 2.0);

        let out = set
            .normalize(msg.clone(), &FieldHistoryStore::new())
            .unwrap()
            .unwrap();
        assert_eq!(out, msg);
    }

    #[test]
    fn rule_sets_equal_by_id_only() {
        let a = NormalizationRuleSet::new("std", vec![Box::new(FieldFilter::new(["BID"]))]);
        let b = NormalizationRuleSet::new("std", Vec::new());
        let c = NormalizationRuleSet::new("other", Vec::new());

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
