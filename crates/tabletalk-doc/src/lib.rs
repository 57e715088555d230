//! TableTalk Doc
//!
//! Parser, linter, and renderers for the Markdown schema documentation that
//! grounds SQL generation. The format stays plain Markdown: readable without
//! any of this tooling.

pub mod lint;
pub mod parser;
pub mod render;

pub use lint::{check, lint};
pub use parser::{parse_document, parse_str, DocError, ParsedDoc};
pub use render::{render_markdown, render_prompt_context};
