//! Keyframe compiler.

use crate::compiler::{CompileOptions, CompiledStyle};
use crate::description::{KeyframeStops, StyleEntry};
use crate::normalize::normalize_declaration;
use crate::rule::{KeyframeStop, RuleBlock};
use crate::selector::{collapse_whitespace, split_top_level};
use log::debug;

/// Compile `stops` into a single `@keyframes <name>` block.
///
/// Stops are emitted in input order. Only plain declarations are honoured inside a stop;
/// modifier, at-rule and descendant keys are ignored. Stops that end up without
/// declarations are dropped, and an empty stop set produces an empty result.
pub fn compile_keyframes(name: &str, stops: &KeyframeStops, options: CompileOptions) -> CompiledStyle {
    let mut compiled_stops = Vec::with_capacity(stops.len());
    for (label, body) in stops.iter() {
        let label = split_top_level(label)
            .into_iter()
            .map(collapse_whitespace)
            .collect::<Vec<_>>()
            .join(", ");
        if label.is_empty() {
            debug!("skipping keyframe stop with an empty label in `{name}`");
            continue;
        }
        let mut declarations = Vec::new();
        for entry in body.entries() {
            match entry {
                StyleEntry::Declaration { property, value } => {
                    declarations.extend(normalize_declaration(property, value));
                }
                StyleEntry::Modifier { pattern: key, .. }
                | StyleEntry::AtRule { prelude: key, .. }
                | StyleEntry::Descendant { selector: key, .. }
                | StyleEntry::Ignored { key, .. } => {
                    debug!("ignoring nested key `{key}` in keyframe stop `{label}`");
                }
            }
        }
        if declarations.is_empty() {
            continue;
        }
        compiled_stops.push(KeyframeStop { label, declarations });
    }

    if compiled_stops.is_empty() {
        return CompiledStyle::default();
    }
    let rules = vec![RuleBlock::Keyframes {
        name: name.to_owned(),
        stops: compiled_stops,
    }];
    CompiledStyle::from_rules(rules, false, options.mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::StyleDescription;
    use crate::rule::RenderMode;

    fn fade() -> KeyframeStops {
        KeyframeStops::new()
            .with("to", StyleDescription::new().with("opacity", 1))
            .with("from", StyleDescription::new().with("opacity", 0))
    }

    #[test]
    fn stops_keep_input_order() {
        let compiled = compile_keyframes("fade", &fade(), CompileOptions::default());
        assert_eq!(compiled.rule_text, "@keyframes fade { to { opacity: 1; } from { opacity: 0; } }");
        assert_eq!(compiled.property_count, 2);
        assert!(!compiled.has_nested_rules);
    }

    #[test]
    fn nested_keys_inside_stops_are_ignored() {
        let stops = KeyframeStops::new().with(
            "0%,100%",
            StyleDescription::new()
                .with("transform", "scale(1)")
                .with("&:hover", StyleDescription::new().with("color", "red"))
                .with("@media print", StyleDescription::new().with("color", "blue")),
        );
        let compiled = compile_keyframes("pulse", &stops, CompileOptions { mode: RenderMode::Minified });
        assert_eq!(compiled.rule_text, "@keyframes pulse{0%,100%{transform:scale(1)}}");
    }

    #[test]
    fn empty_stop_set_is_empty() {
        let compiled = compile_keyframes("none", &KeyframeStops::new(), CompileOptions::default());
        assert!(compiled.is_empty());
        assert_eq!(compiled.rule_text, "");
    }
}
