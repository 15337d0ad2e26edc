//! Per-call options for style lookups.

use serde::Deserialize;

/// How the identifier of a style entry is chosen.
///
/// Options take part in the fingerprint, so the same description requested with a
/// different name or label is a different entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleOptions {
    /// Fixed class name used instead of a generated token.
    pub name: Option<String>,
    /// Readable fragment inserted into generated identifiers in debug mode.
    pub label: Option<String>,
    /// Whether a custom `name` gets the configured prefix.
    pub prefix_name: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            name: None,
            label: None,
            prefix_name: true,
        }
    }
}

impl StyleOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn without_prefix(mut self) -> Self {
        self.prefix_name = false;
        self
    }
}
