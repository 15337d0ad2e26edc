//! Style description model.
//!
//! A [`StyleDescription`] is an insertion-ordered map from keys to [`StyleValue`]s. Keys are
//! property names, modifier keys (`&:hover`, `:focus`, `[disabled]`), at-rule keys
//! (`@media ...`) or descendant selectors (`span`, `.icon`). Each key is classified exactly
//! once into a [`StyleEntry`] which the compiler dispatches on.

use core::error::Error;
use core::fmt;
use core::hash::{Hash, Hasher};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// A value stored under a style key.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    /// Missing value (`null` / `undefined`); skipped silently.
    Absent,
    /// Boolean produced by conditional styling; never emitted.
    Flag(bool),
    /// Numeric value; a unit is inferred from the property name.
    Number(f64),
    /// Literal text value.
    Text(String),
    /// Fallback values, emitted as repeated declarations in order.
    List(Vec<StyleValue>),
    /// Nested description for modifier, at-rule and descendant keys.
    Nested(StyleDescription),
}

impl StyleValue {
    /// Borrow the nested description, if this value is one.
    #[inline]
    pub const fn as_nested(&self) -> Option<&StyleDescription> {
        match self {
            Self::Nested(description) => Some(description),
            _ => None,
        }
    }

    const fn tag(&self) -> u8 {
        match self {
            Self::Absent => 0,
            Self::Flag(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
            Self::List(_) => 4,
            Self::Nested(_) => 5,
        }
    }
}

/// Fold `-0.0` into `0.0` so both hash and compare identically.
#[inline]
fn number_bits(number: f64) -> u64 {
    (number + 0.0).to_bits()
}

impl PartialEq for StyleValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) => true,
            (Self::Flag(left), Self::Flag(right)) => left == right,
            (Self::Number(left), Self::Number(right)) => number_bits(*left) == number_bits(*right),
            (Self::Text(left), Self::Text(right)) => left == right,
            (Self::List(left), Self::List(right)) => left == right,
            (Self::Nested(left), Self::Nested(right)) => left == right,
            _ => false,
        }
    }
}

impl Eq for StyleValue {}

impl Hash for StyleValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.tag());
        match self {
            Self::Absent => {}
            Self::Flag(flag) => flag.hash(state),
            Self::Number(number) => state.write_u64(number_bits(*number)),
            Self::Text(text) => text.hash(state),
            Self::List(items) => items.hash(state),
            Self::Nested(description) => description.hash(state),
        }
    }
}

impl From<&str> for StyleValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for StyleValue {
    #[inline]
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for StyleValue {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for StyleValue {
    #[inline]
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for StyleValue {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for StyleValue {
    #[inline]
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for StyleValue {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for StyleValue {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<StyleDescription> for StyleValue {
    #[inline]
    fn from(value: StyleDescription) -> Self {
        Self::Nested(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for StyleValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for StyleValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

impl From<JsonValue> for StyleValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Absent,
            JsonValue::Bool(flag) => Self::Flag(flag),
            JsonValue::Number(number) => number.as_f64().map_or(Self::Absent, Self::Number),
            JsonValue::String(text) => Self::Text(text),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::Nested(
                map.into_iter()
                    .map(|(key, inner)| (key, Self::from(inner)))
                    .collect(),
            ),
        }
    }
}

/// Errors raised when converting untyped input into the description model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptionError {
    /// The root (or a keyframe stop) was not a mapping.
    NotAMapping {
        /// JSON kind that was found instead.
        found: &'static str,
    },
    /// The input text was not valid JSON.
    Malformed(String),
}

impl fmt::Display for DescriptionError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAMapping { found } => {
                write!(formatter, "style description must be a mapping, found {found}")
            }
            Self::Malformed(message) => write!(formatter, "malformed style description: {message}"),
        }
    }
}

impl Error for DescriptionError {}

const fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Nested, insertion-ordered style description for one element.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct StyleDescription {
    entries: IndexMap<String, StyleValue>,
}

impl StyleDescription {
    /// Create an empty description.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a key, keeping the original position of replaced keys.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<StyleValue>) -> Option<StyleValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder form of [`StyleDescription::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.insert(key, value);
        self
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.entries.get(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Classified entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = StyleEntry<'_>> {
        self.iter().map(|(key, value)| classify(key, value))
    }

    /// Parse a description from JSON text, preserving key order.
    ///
    /// # Errors
    /// Returns [`DescriptionError`] when the text is not JSON or its root is not an object.
    pub fn from_json_str(text: &str) -> Result<Self, DescriptionError> {
        let value: JsonValue = serde_json::from_str(text)
            .map_err(|error| DescriptionError::Malformed(error.to_string()))?;
        Self::try_from(value)
    }
}

impl PartialEq for StyleDescription {
    /// Structural equality: same keys with equal values in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(left, right)| left == right)
    }
}

impl Eq for StyleDescription {}

impl Hash for StyleDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.entries.len());
        for (key, value) in &self.entries {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: Into<String>, V: Into<StyleValue>> FromIterator<(K, V)> for StyleDescription {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl TryFrom<JsonValue> for StyleDescription {
    type Error = DescriptionError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(map) => Ok(map
                .into_iter()
                .map(|(key, inner)| (key, StyleValue::from(inner)))
                .collect()),
            other => Err(DescriptionError::NotAMapping {
                found: json_kind(&other),
            }),
        }
    }
}

/// Ordered keyframe stops: stop label (`from`, `to`, `50%`, `0%, 100%`) to declarations.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct KeyframeStops {
    stops: IndexMap<String, StyleDescription>,
}

impl KeyframeStops {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, declarations: StyleDescription) -> Option<StyleDescription> {
        self.stops.insert(label.into(), declarations)
    }

    #[must_use]
    pub fn with(mut self, label: impl Into<String>, declarations: StyleDescription) -> Self {
        self.insert(label, declarations);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Stops in insertion order; never reordered numerically.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleDescription)> {
        self.stops.iter().map(|(label, body)| (label.as_str(), body))
    }
}

impl PartialEq for KeyframeStops {
    /// Same stops with equal bodies in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(left, right)| left == right)
    }
}

impl Eq for KeyframeStops {}

impl Hash for KeyframeStops {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.stops.len());
        for (label, body) in &self.stops {
            label.hash(state);
            body.hash(state);
        }
    }
}

impl TryFrom<JsonValue> for KeyframeStops {
    type Error = DescriptionError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        let JsonValue::Object(map) = value else {
            return Err(DescriptionError::NotAMapping {
                found: json_kind(&value),
            });
        };
        let mut stops = Self::new();
        for (label, body) in map {
            stops.insert(label, StyleDescription::try_from(body)?);
        }
        Ok(stops)
    }
}

/// A key classified once by its prefix and the shape of its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleEntry<'desc> {
    /// Plain `property: value` declaration.
    Declaration {
        property: &'desc str,
        value: &'desc StyleValue,
    },
    /// Pseudo-class/element or attribute condition on the same element.
    Modifier {
        pattern: &'desc str,
        body: &'desc StyleDescription,
    },
    /// Conditional group rule such as `@media` or `@supports`.
    AtRule {
        prelude: &'desc str,
        body: &'desc StyleDescription,
    },
    /// Nested element or class selector.
    Descendant {
        selector: &'desc str,
        body: &'desc StyleDescription,
    },
    /// Key that cannot produce output (e.g. a modifier without a block).
    Ignored {
        key: &'desc str,
        reason: &'static str,
    },
}

/// Modifier keys reference the parent selector explicitly (`&`) or start with a
/// pseudo-class, pseudo-element or attribute condition.
#[inline]
pub fn is_modifier_key(key: &str) -> bool {
    let trimmed = key.trim_start();
    trimmed.starts_with([':', '[']) || trimmed.contains('&')
}

#[inline]
pub fn is_at_rule_key(key: &str) -> bool {
    key.trim_start().starts_with('@')
}

/// Classify a single key/value pair.
pub fn classify<'desc>(key: &'desc str, value: &'desc StyleValue) -> StyleEntry<'desc> {
    let nested = value.as_nested();
    if is_at_rule_key(key) {
        return nested.map_or(
            StyleEntry::Ignored {
                key,
                reason: "at-rule without a nested block",
            },
            |body| StyleEntry::AtRule { prelude: key, body },
        );
    }
    if is_modifier_key(key) {
        return nested.map_or(
            StyleEntry::Ignored {
                key,
                reason: "modifier without a nested block",
            },
            |body| StyleEntry::Modifier { pattern: key, body },
        );
    }
    match nested {
        Some(body) => StyleEntry::Descendant {
            selector: key,
            body,
        },
        None => StyleEntry::Declaration {
            property: key,
            value,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn classification_covers_every_key_kind() {
        let body = StyleDescription::new().with("opacity", 0.9);
        let nested = StyleValue::Nested(body.clone());
        let text = StyleValue::from("red");

        assert!(matches!(classify("color", &text), StyleEntry::Declaration { property: "color", .. }));
        assert!(matches!(classify("&:hover", &nested), StyleEntry::Modifier { .. }));
        assert!(matches!(classify(":focus", &nested), StyleEntry::Modifier { .. }));
        assert!(matches!(classify("[disabled]", &nested), StyleEntry::Modifier { .. }));
        assert!(matches!(classify("@media (min-width: 1px)", &nested), StyleEntry::AtRule { .. }));
        assert!(matches!(classify("span", &nested), StyleEntry::Descendant { selector: "span", .. }));
        assert!(matches!(classify("&:hover", &text), StyleEntry::Ignored { .. }));
        assert!(matches!(classify("@media print", &text), StyleEntry::Ignored { .. }));
    }

    #[test]
    fn json_preserves_key_order() {
        let description = StyleDescription::from_json_str(r#"{"zIndex": 2, "color": "red", "alpha": 1}"#)
            .unwrap_or_default();
        let keys: Vec<&str> = description.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["zIndex", "color", "alpha"]);
    }

    #[test]
    fn non_mapping_json_is_rejected() {
        let error = StyleDescription::try_from(serde_json::json!([1, 2]));
        assert_eq!(error, Err(DescriptionError::NotAMapping { found: "array" }));
        assert!(matches!(
            StyleDescription::from_json_str("{oops"),
            Err(DescriptionError::Malformed(_))
        ));
    }

    #[test]
    fn structurally_equal_descriptions_hash_equally() {
        let first = StyleDescription::new().with("padding", 0.0).with("color", "red");
        let second = StyleDescription::new().with("padding", -0.0).with("color", "red");
        assert_eq!(first, second);
        assert_eq!(hash_of(&first), hash_of(&second));

        let reordered = StyleDescription::new().with("color", "red").with("padding", 0.0);
        assert_ne!(first, reordered);
    }

    #[test]
    fn keyframe_stops_compare_in_order() {
        let fade_in = KeyframeStops::new()
            .with("from", StyleDescription::new().with("opacity", 0))
            .with("to", StyleDescription::new().with("opacity", 1));
        let same = fade_in.clone();
        let reversed = KeyframeStops::new()
            .with("to", StyleDescription::new().with("opacity", 1))
            .with("from", StyleDescription::new().with("opacity", 0));
        assert_eq!(fade_in, same);
        assert_eq!(hash_of(&fade_in), hash_of(&same));
        assert_ne!(fade_in, reversed);
        assert_ne!(hash_of(&fade_in), hash_of(&reversed));
    }

    #[test]
    fn replacing_a_key_keeps_its_position() {
        let mut description = StyleDescription::new().with("color", "red").with("margin", 4);
        description.insert("color", "blue");
        let keys: Vec<&str> = description.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["color", "margin"]);
        assert_eq!(description.get("color"), Some(&StyleValue::from("blue")));
    }
}
