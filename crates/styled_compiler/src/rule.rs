//! Compiled rule model and its textual rendering.

use crate::selector::split_top_level;

/// A single emitted declaration (`property: value`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Declaration {
    /// Hyphenated property name.
    pub property: String,
    /// Normalized value text, units included.
    pub value: String,
}

impl Declaration {
    #[inline]
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// One stop of an animation block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyframeStop {
    pub label: String,
    pub declarations: Vec<Declaration>,
}

/// A flat top-level rule block. CSS has no native nesting, so nested descriptions always
/// compile into sibling `Style` blocks, optionally wrapped by an `AtRule`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RuleBlock {
    /// `selector { declarations }`
    Style {
        selector: String,
        declarations: Vec<Declaration>,
    },
    /// `@media ... { rules }` and other conditional group rules.
    AtRule { prelude: String, rules: Vec<RuleBlock> },
    /// `@keyframes name { stops }`
    Keyframes { name: String, stops: Vec<KeyframeStop> },
}

/// Output flavour of the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// `sel { a: b; }` blocks separated by newlines.
    #[default]
    Pretty,
    /// `sel{a:b}` with no separators. Only whitespace is dropped; values are untouched.
    Minified,
}

impl RuleBlock {
    /// Number of declarations in this block and every block it wraps.
    pub fn declaration_count(&self) -> usize {
        match self {
            Self::Style { declarations, .. } => declarations.len(),
            Self::AtRule { rules, .. } => rules.iter().map(Self::declaration_count).sum(),
            Self::Keyframes { stops, .. } => stops.iter().map(|stop| stop.declarations.len()).sum(),
        }
    }

    /// Append the rendered block to `out`.
    pub fn write_to(&self, out: &mut String, mode: RenderMode) {
        match self {
            Self::Style {
                selector,
                declarations,
            } => write_block(out, &render_selector(selector, mode), declarations, mode),
            Self::AtRule { prelude, rules } => {
                out.push_str(prelude);
                open_brace(out, mode);
                for rule in rules {
                    if mode == RenderMode::Pretty {
                        out.push(' ');
                    }
                    rule.write_to(out, mode);
                }
                close_brace(out, mode);
            }
            Self::Keyframes { name, stops } => {
                out.push_str("@keyframes ");
                out.push_str(name);
                open_brace(out, mode);
                for stop in stops {
                    if mode == RenderMode::Pretty {
                        out.push(' ');
                    }
                    write_block(out, &render_selector(&stop.label, mode), &stop.declarations, mode);
                }
                close_brace(out, mode);
            }
        }
    }
}

fn render_selector(selector: &str, mode: RenderMode) -> String {
    match mode {
        RenderMode::Pretty => selector.to_owned(),
        RenderMode::Minified => split_top_level(selector).join(","),
    }
}

fn open_brace(out: &mut String, mode: RenderMode) {
    match mode {
        RenderMode::Pretty => out.push_str(" {"),
        RenderMode::Minified => out.push('{'),
    }
}

fn close_brace(out: &mut String, mode: RenderMode) {
    match mode {
        RenderMode::Pretty => out.push_str(" }"),
        RenderMode::Minified => out.push('}'),
    }
}

fn write_block(out: &mut String, selector: &str, declarations: &[Declaration], mode: RenderMode) {
    out.push_str(selector);
    open_brace(out, mode);
    for (index, declaration) in declarations.iter().enumerate() {
        match mode {
            RenderMode::Pretty => {
                out.push(' ');
                out.push_str(&declaration.property);
                out.push_str(": ");
                out.push_str(&declaration.value);
                out.push(';');
            }
            RenderMode::Minified => {
                if index > 0 {
                    out.push(';');
                }
                out.push_str(&declaration.property);
                out.push(':');
                out.push_str(&declaration.value);
            }
        }
    }
    close_brace(out, mode);
}

/// Render a sequence of top-level blocks.
pub fn render(rules: &[RuleBlock], mode: RenderMode) -> String {
    let mut out = String::new();
    for (index, rule) in rules.iter().enumerate() {
        if index > 0 && mode == RenderMode::Pretty {
            out.push('\n');
        }
        rule.write_to(&mut out, mode);
    }
    out
}
