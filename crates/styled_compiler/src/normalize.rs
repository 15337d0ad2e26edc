//! Declaration normalization: property hyphenation, unit inference and value cleanup.
//!
//! Unit inference is table driven. Numeric values for properties in the unitless table are
//! emitted bare; everything else (the explicit pixel table and unknown properties alike)
//! receives `px`.

use crate::description::StyleValue;
use crate::rule::Declaration;
use log::debug;
use std::borrow::Cow;

/// How a numeric value is rendered for a given property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitClass {
    /// Always emitted without a unit (`opacity`, `z-index`, ...).
    Unitless,
    /// Always emitted in pixels (`width`, `padding`, ...).
    Pixel,
    /// Not listed in either table; defaults to pixels.
    DefaultPixel,
}

impl UnitClass {
    /// Suffix appended to numeric values.
    #[inline]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Unitless => "",
            Self::Pixel | Self::DefaultPixel => "px",
        }
    }
}

/// Classify a hyphenated property name.
pub fn unit_class(property: &str) -> UnitClass {
    // Custom properties carry arbitrary tokens; never guess a unit for them.
    if property.starts_with("--") {
        return UnitClass::Unitless;
    }
    match property {
        "animation-iteration-count"
        | "aspect-ratio"
        | "border-image-outset"
        | "border-image-slice"
        | "border-image-width"
        | "box-flex"
        | "box-flex-group"
        | "box-ordinal-group"
        | "column-count"
        | "columns"
        | "fill-opacity"
        | "flex"
        | "flex-grow"
        | "flex-negative"
        | "flex-order"
        | "flex-positive"
        | "flex-shrink"
        | "flood-opacity"
        | "font-weight"
        | "grid-area"
        | "grid-column"
        | "grid-column-end"
        | "grid-column-span"
        | "grid-column-start"
        | "grid-row"
        | "grid-row-end"
        | "grid-row-span"
        | "grid-row-start"
        | "initial-letter"
        | "line-clamp"
        | "line-height"
        | "opacity"
        | "order"
        | "orphans"
        | "scale"
        | "shape-image-threshold"
        | "stop-opacity"
        | "stroke-dasharray"
        | "stroke-dashoffset"
        | "stroke-miterlimit"
        | "stroke-opacity"
        | "stroke-width"
        | "tab-size"
        | "widows"
        | "z-index"
        | "zoom"
        | "-webkit-line-clamp"
        | "-webkit-box-flex" => UnitClass::Unitless,
        "width"
        | "height"
        | "min-width"
        | "min-height"
        | "max-width"
        | "max-height"
        | "top"
        | "right"
        | "bottom"
        | "left"
        | "inset"
        | "margin"
        | "margin-top"
        | "margin-right"
        | "margin-bottom"
        | "margin-left"
        | "padding"
        | "padding-top"
        | "padding-right"
        | "padding-bottom"
        | "padding-left"
        | "gap"
        | "row-gap"
        | "column-gap"
        | "font-size"
        | "letter-spacing"
        | "word-spacing"
        | "text-indent"
        | "border-width"
        | "border-top-width"
        | "border-right-width"
        | "border-bottom-width"
        | "border-left-width"
        | "border-radius"
        | "border-top-left-radius"
        | "border-top-right-radius"
        | "border-bottom-right-radius"
        | "border-bottom-left-radius"
        | "outline-width"
        | "outline-offset"
        | "flex-basis" => UnitClass::Pixel,
        _ => UnitClass::DefaultPixel,
    }
}

/// Convert a camel-case property name to its hyphenated CSS form.
///
/// `backgroundColor` becomes `background-color`, `WebkitTransition` becomes
/// `-webkit-transition` and `msTransform` becomes `-ms-transform`. Custom properties and
/// names without uppercase letters are returned unchanged.
pub fn hyphenate(name: &str) -> Cow<'_, str> {
    if name.starts_with("--") || !name.bytes().any(|byte| byte.is_ascii_uppercase()) {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len() + 4);
    for character in name.chars() {
        if character.is_ascii_uppercase() {
            out.push('-');
            out.push(character.to_ascii_lowercase());
        } else {
            out.push(character);
        }
    }
    if out.starts_with("ms-") {
        out.insert(0, '-');
    }
    Cow::Owned(out)
}

/// Shortest decimal text for a number, or `None` when it is not finite.
pub fn format_number(number: f64) -> Option<String> {
    if !number.is_finite() {
        return None;
    }
    // `-0.0 + 0.0` is `+0.0`, so negative zero never reaches the output.
    Some(format!("{}", number + 0.0))
}

/// Normalize one value into zero or more value texts for `property`.
///
/// `property` must already be hyphenated. Lists expand into several values, which become
/// repeated declarations (fallbacks for older engines).
pub fn normalize_value(property: &str, value: &StyleValue) -> Vec<String> {
    let mut out = Vec::new();
    push_values(property, value, &mut out);
    out
}

fn push_values(property: &str, value: &StyleValue, out: &mut Vec<String>) {
    match value {
        StyleValue::Absent | StyleValue::Flag(_) | StyleValue::Nested(_) => {}
        StyleValue::Number(number) => match format_number(*number) {
            Some(mut text) => {
                text.push_str(unit_class(property).suffix());
                out.push(text);
            }
            None => debug!("skipping non-finite value for `{property}`"),
        },
        StyleValue::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_owned());
            }
        }
        StyleValue::List(items) => {
            for item in items {
                push_values(property, item, out);
            }
        }
    }
}

/// Normalize a `(property, value)` pair into declarations ready for emission.
pub fn normalize_declaration(property: &str, value: &StyleValue) -> Vec<Declaration> {
    let name = hyphenate(property.trim());
    if name.is_empty() {
        return Vec::new();
    }
    normalize_value(&name, value)
        .into_iter()
        .map(|text| Declaration::new(&*name, text))
        .collect()
}
