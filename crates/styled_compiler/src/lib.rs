//! Style compiler for the styled runtime.
//!
//! Translates declarative, nested style descriptions into flat CSS rule text. The crate is
//! pure: nothing here caches, allocates identifiers or touches a style sheet; that is the job
//! of `styled_cache`.
//!
//! # Pipeline
//!
//! ```text
//! StyleDescription ── classify keys ──► Declaration | Modifier | AtRule | Descendant
//!        │                                   │
//!        └── normalize (hyphenate, units) ◄──┘
//!                      ↓
//!               RuleBlock tree (flat, at-rules wrap)
//!                      ↓
//!               render (pretty | minified)
//! ```
//!
//! # Example
//!
//! ```
//! use styled_compiler::{compile, style};
//!
//! let description = style! {
//!     "padding" => 8,
//!     "&:hover" => { "opacity" => 0.9 },
//! };
//! let compiled = compile(&description, ".x");
//! assert_eq!(compiled.rule_text, ".x { padding: 8px; }\n.x:hover { opacity: 0.9; }");
//! ```

#![allow(
    clippy::module_name_repetitions,
    reason = "Types like CompiledStyle read better than Compiled"
)]
#![allow(clippy::missing_errors_doc, reason = "Errors are documented on the error type")]

mod compiler;
mod description;
mod keyframes;
mod macros;
pub mod normalize;
mod rule;
pub mod selector;

pub use compiler::{CompileOptions, CompiledStyle, compile, compile_with};
pub use description::{
    DescriptionError, KeyframeStops, StyleDescription, StyleEntry, StyleValue, classify,
    is_at_rule_key, is_modifier_key,
};
pub use keyframes::compile_keyframes;
pub use rule::{Declaration, KeyframeStop, RenderMode, RuleBlock, render};
