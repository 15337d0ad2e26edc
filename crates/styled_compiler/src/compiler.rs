//! Recursive style compiler.
//!
//! Turns a nested [`StyleDescription`] into flat rule blocks under a root selector:
//!
//! ```text
//! { padding: 8, "&:hover": { opacity: 0.9 } }  against  .x
//!     ↓
//! .x { padding: 8px; }
//! .x:hover { opacity: 0.9; }
//! ```
//!
//! The element's own declarations always come first, followed by nested blocks in the
//! order their keys were encountered.

use crate::description::{StyleDescription, StyleEntry};
use crate::normalize::normalize_declaration;
use crate::rule::{self, RenderMode, RuleBlock};
use crate::selector::{collapse_whitespace, join_descendant, resolve_modifier};
use log::debug;

/// Result of compiling one description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledStyle {
    /// Flat rule blocks in emission order.
    pub rules: Vec<RuleBlock>,
    /// Rendered rule text.
    pub rule_text: String,
    /// Number of declarations emitted across every block.
    pub property_count: usize,
    /// Whether any modifier, at-rule or descendant produced output.
    pub has_nested_rules: bool,
}

impl CompiledStyle {
    pub(crate) fn from_rules(rules: Vec<RuleBlock>, has_nested_rules: bool, mode: RenderMode) -> Self {
        let property_count = rules.iter().map(RuleBlock::declaration_count).sum();
        let rule_text = rule::render(&rules, mode);
        Self {
            rules,
            rule_text,
            property_count,
            has_nested_rules,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Compiler options that do not change the meaning of the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompileOptions {
    pub mode: RenderMode,
}

/// Compile `description` against `root_selector` with pretty output.
pub fn compile(description: &StyleDescription, root_selector: &str) -> CompiledStyle {
    compile_with(description, root_selector, CompileOptions::default())
}

/// Compile `description` against `root_selector`.
///
/// `root_selector` is used verbatim; callers pass an already escaped fragment such as
/// `.css-1k2j`. An empty description yields an empty result.
pub fn compile_with(
    description: &StyleDescription,
    root_selector: &str,
    options: CompileOptions,
) -> CompiledStyle {
    let mut collector = Collector::default();
    let mut rules = Vec::new();
    collector.collect(description, root_selector, &mut rules);
    CompiledStyle::from_rules(rules, collector.nested_rules, options.mode)
}

#[derive(Default)]
struct Collector {
    nested_rules: bool,
}

impl Collector {
    /// Depth-first walk emitting `selector`'s own block followed by its nested blocks.
    fn collect(&mut self, description: &StyleDescription, selector: &str, out: &mut Vec<RuleBlock>) {
        let mut declarations = Vec::new();
        let mut nested = Vec::new();

        for entry in description.entries() {
            match entry {
                StyleEntry::Declaration { property, value } => {
                    declarations.extend(normalize_declaration(property, value));
                }
                StyleEntry::Modifier { pattern, body } => {
                    let modified = resolve_modifier(selector, pattern);
                    self.collect_nested(body, &modified, &mut nested);
                }
                StyleEntry::Descendant {
                    selector: key,
                    body,
                } => {
                    let descendant = join_descendant(selector, key);
                    if descendant.is_empty() {
                        debug!("skipping empty descendant selector under `{selector}`");
                        continue;
                    }
                    self.collect_nested(body, &descendant, &mut nested);
                }
                StyleEntry::AtRule { prelude, body } => {
                    let mut inner = Vec::new();
                    self.collect(body, selector, &mut inner);
                    if !inner.is_empty() {
                        self.nested_rules = true;
                        nested.push(RuleBlock::AtRule {
                            prelude: collapse_whitespace(prelude),
                            rules: inner,
                        });
                    }
                }
                StyleEntry::Ignored { key, reason } => {
                    debug!("ignoring `{key}` under `{selector}`: {reason}");
                }
            }
        }

        if !declarations.is_empty() {
            out.push(RuleBlock::Style {
                selector: selector.to_owned(),
                declarations,
            });
        }
        out.append(&mut nested);
    }

    fn collect_nested(&mut self, body: &StyleDescription, selector: &str, out: &mut Vec<RuleBlock>) {
        let before = out.len();
        self.collect(body, selector, out);
        if out.len() > before {
            self.nested_rules = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::StyleValue;
    use crate::rule::Declaration;

    #[test]
    fn own_declarations_come_before_nested_blocks() {
        let description = StyleDescription::new()
            .with("&:hover", StyleDescription::new().with("opacity", 0.9))
            .with("padding", 8);
        let compiled = compile(&description, ".x");
        assert_eq!(compiled.rule_text, ".x { padding: 8px; }\n.x:hover { opacity: 0.9; }");
        assert!(compiled.has_nested_rules);
        assert_eq!(compiled.property_count, 2);
    }

    #[test]
    fn empty_description_is_empty_text() {
        let compiled = compile(&StyleDescription::new(), ".x");
        assert!(compiled.is_empty());
        assert_eq!(compiled.rule_text, "");
        assert!(!compiled.has_nested_rules);
    }

    #[test]
    fn empty_nested_blocks_are_dropped() {
        let description = StyleDescription::new()
            .with("color", "red")
            .with("&:hover", StyleDescription::new().with("color", StyleValue::Absent))
            .with("@media print", StyleDescription::new());
        let compiled = compile(&description, ".x");
        assert_eq!(
            compiled.rules,
            [RuleBlock::Style {
                selector: ".x".to_owned(),
                declarations: vec![Declaration::new("color", "red")],
            }]
        );
        assert!(!compiled.has_nested_rules);
    }
}
