//! Identifier issuance.

use crate::config::StyleConfig;
use crate::fingerprint::{Fingerprint, Namespace, to_base36};
use crate::options::StyleOptions;
use core::fmt;
use log::warn;
use serde::Serialize;
use styled_compiler::selector::sanitize_ident;

/// Sentinel returned for rejected input. Generation never produces it.
pub const INVALID_IDENTIFIER: &str = "styled-invalid";

const DIGEST_WIDTH: usize = 6;

/// Class name or animation name handed to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    #[inline]
    pub(crate) fn issued(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn invalid() -> Self {
        Self(INVALID_IDENTIFIER.to_owned())
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.0 == INVALID_IDENTIFIER
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `.identifier`, the root selector rules are compiled against.
    pub fn class_selector(&self) -> String {
        format!(".{}", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<Identifier> for String {
    fn from(identifier: Identifier) -> Self {
        identifier.0
    }
}

/// Inputs available to a custom identifier generator.
#[derive(Clone, Copy, Debug)]
pub struct IdentifierSeed<'seed> {
    pub namespace: Namespace,
    pub prefix: &'seed str,
    pub fingerprint: Fingerprint,
    /// Process-wide issue counter, strictly increasing.
    pub sequence: u64,
    pub label: Option<&'seed str>,
}

/// Pick the identifier for a new entry.
///
/// Custom names win, then a configured generator, then the default
/// `{prefix}[-kf][-label]-{digest}{sequence}` scheme.
pub fn issue(seed: &IdentifierSeed<'_>, options: Option<&StyleOptions>, config: &StyleConfig) -> Identifier {
    if let Some(identifier) = options.and_then(|options| custom_name(seed.prefix, options)) {
        return identifier;
    }
    if let Some(generator) = &config.identifier_generator {
        let produced = sanitize_ident(&generator(seed));
        if !produced.is_empty() && produced != INVALID_IDENTIFIER {
            return Identifier::issued(produced);
        }
        warn!(target: "styled_cache", "identifier generator returned `{produced}`, using the default scheme");
    }
    default_identifier(seed, config.debug)
}

fn custom_name(prefix: &str, options: &StyleOptions) -> Option<Identifier> {
    let raw = options.name.as_deref()?;
    let name = sanitize_ident(raw);
    if name.is_empty() {
        warn!(target: "styled_cache", "custom name `{raw}` has no usable characters");
        return None;
    }
    let candidate = if options.prefix_name {
        format!("{prefix}-{name}")
    } else {
        name
    };
    (candidate != INVALID_IDENTIFIER).then_some(Identifier::issued(candidate))
}

fn default_identifier(seed: &IdentifierSeed<'_>, debug: bool) -> Identifier {
    let mut out = String::from(seed.prefix);
    match seed.namespace {
        Namespace::Style => {}
        Namespace::Keyframes => out.push_str("-kf"),
        Namespace::Global => out.push_str("-g"),
    }
    if debug && let Some(label) = seed.label.map(sanitize_ident).filter(|label| !label.is_empty()) {
        out.push('-');
        out.push_str(&label);
    }
    let digest: String = seed.fingerprint.to_base36().chars().take(DIGEST_WIDTH).collect();
    out.push('-');
    out.extend(core::iter::repeat_n('0', DIGEST_WIDTH - digest.len()));
    out.push_str(&digest);
    out.push_str(&to_base36(seed.sequence));
    Identifier::issued(out)
}
