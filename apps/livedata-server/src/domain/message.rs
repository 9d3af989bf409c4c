//! Field Messages
//!
//! The payload exchanged with providers and consumers: an ordered sequence
//! of optionally-named field values. Raw provider ticks, normalized updates
//! and snapshots all travel as [`FieldMessage`].

use serde::{Deserialize, Serialize};

// =============================================================================
// Field Values
// =============================================================================

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value.
    Boolean(bool),
    /// Integral value.
    Integer(i64),
    /// Floating-point value.
    Double(f64),
    /// Text value.
    Text(String),
}

impl FieldValue {
    /// Interpret the value as a float, if numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::Boolean(_) | Self::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

// =============================================================================
// Fields
// =============================================================================

/// A field within a message: a value with an optional name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name; unnamed fields are keyed positionally downstream.
    pub name: Option<String>,
    /// Field value.
    pub value: FieldValue,
}

// =============================================================================
// FieldMessage
// =============================================================================

/// An ordered sequence of fields.
///
/// Order is significant: repeated names are allowed and downstream
/// last-value caching resolves repeats in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMessage {
    fields: Vec<Field>,
}

impl FieldMessage {
    /// Create an empty message.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a named field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push(Field {
            name: Some(name.into()),
            value: value.into(),
        });
    }

    /// Append an unnamed field.
    pub fn add_unnamed(&mut self, value: impl Into<FieldValue>) {
        self.fields.push(Field {
            name: None,
            value: value.into(),
        });
    }

    /// Builder-style named field append.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.add(name, value);
        self
    }

    /// Get the latest value for a named field, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.name.as_deref() == Some(name))
            .map(|f| &f.value)
    }

    /// Check whether the message carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields, counting repeats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}

impl FromIterator<Field> for FieldMessage {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
