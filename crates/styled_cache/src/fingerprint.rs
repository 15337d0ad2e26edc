//! Content fingerprints.
//!
//! A fingerprint is a 64-bit `FxHash` over a namespace tag, the input and every setting that
//! changes the compiled output. Hashing is order sensitive: descriptions with the same
//! entries in a different order get different fingerprints. Distinct inputs colliding on
//! all 64 bits would share an entry; that risk is accepted.

use crate::config::StyleConfig;
use crate::options::StyleOptions;
use core::fmt;
use core::hash::{Hash, Hasher as _};
use rustc_hash::FxHasher;
use serde::Serialize;
use styled_compiler::{KeyframeStops, StyleDescription};

/// Which kind of entry a fingerprint addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Style,
    Keyframes,
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(u64);

impl Fingerprint {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Lowercase base-36 digits of the fingerprint.
    pub fn to_base36(self) -> String {
        to_base36(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:016x}", self.0)
    }
}

/// Render `value` in lowercase base 36.
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::with_capacity(13);
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

fn hasher_for(namespace: Namespace, config: &StyleConfig) -> FxHasher {
    let mut hasher = FxHasher::default();
    namespace.hash(&mut hasher);
    config.identifier_prefix.hash(&mut hasher);
    config.minify.hash(&mut hasher);
    config.debug.hash(&mut hasher);
    hasher
}

/// Fingerprint of a style description and its per-call options.
pub fn style(description: &StyleDescription, options: &StyleOptions, config: &StyleConfig) -> Fingerprint {
    let mut hasher = hasher_for(Namespace::Style, config);
    description.hash(&mut hasher);
    options.hash(&mut hasher);
    Fingerprint(hasher.finish())
}

pub fn keyframes(stops: &KeyframeStops, config: &StyleConfig) -> Fingerprint {
    let mut hasher = hasher_for(Namespace::Keyframes, config);
    stops.hash(&mut hasher);
    Fingerprint(hasher.finish())
}

pub fn global(selector: &str, description: &StyleDescription, config: &StyleConfig) -> Fingerprint {
    let mut hasher = hasher_for(Namespace::Global, config);
    selector.hash(&mut hasher);
    description.hash(&mut hasher);
    Fingerprint(hasher.finish())
}

/// Digest of rendered rule text, used to skip duplicate deliveries.
pub fn text_digest(rule_text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    rule_text.hash(&mut hasher);
    hasher.finish()
}
