//! Rendering of analysis results to Markdown, plain text and JSON.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, JsonFormat};
pub use markdown::{to_markdown, to_markdown_pages, MarkdownRenderer};
pub use options::RenderOptions;
pub use text::{to_text, to_text_pages};
