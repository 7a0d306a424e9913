//! # Pulpit Bridge
//!
//! Lossless conversion between the document AST and the rich-text
//! editor's native tree, plus deterministic renderings for export.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ rich-text view (external editor schema)     │
//! └─────────────────────────────────────────────┘
//!            ↑ ast_to_rich_text  ↓ rich_text_to_ast
//! ┌─────────────────────────────────────────────┐
//! │ bridge: schema mapping + identity carrying  │
//! │  - node ids ride as view-level attributes   │
//! │  - passage metadata rides as attributes     │
//! │  - render_html / markdown / plain for export│
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ast + editor: source of truth               │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Conversion never produces partial output: a malformed view tree or an
//! unknown node type returns a tagged [`ConversionError`].

mod convert;
mod html;
mod richtext;

pub use convert::{ast_to_rich_text, rich_text_to_ast, BridgeOptions, ConversionError};
pub use html::{render_for, render_html, render_markdown, render_plain_text, ExportFormat};
pub use richtext::{attr, kind, RichTextDoc, RichTextNode};
