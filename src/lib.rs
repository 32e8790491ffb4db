//! # doclayout
//!
//! Semantic layout reconstruction from positioned text fragments.
//!
//! A PDF or office document parser yields text runs with coordinates but
//! no structure. This library rebuilds the structure from geometry and
//! typography alone: columns, lines, blocks, paragraphs, headings, lists,
//! reading order, and running headers and footers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use doclayout::{load_pages, render, Analyzer};
//!
//! fn main() -> doclayout::Result<()> {
//!     // Load a fragment dump produced by an upstream parser
//!     let pages = load_pages("fragments.json")?;
//!
//!     // Analyze every page, removing running headers and footers
//!     let analysis = Analyzer::new().analyze_document(&pages);
//!
//!     // Convert to Markdown
//!     let options = render::RenderOptions::default();
//!     println!("{}", analysis.markdown(&options));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Column detection**: whitespace gutters, spanning titles
//! - **Reading order**: column-aware, LTR and RTL, standard or inverted Y axis
//! - **Structure**: paragraphs with styles, headings with levels, nested lists
//! - **Running headers/footers**: detected across pages, page numbers included
//! - **Parallel processing**: Uses Rayon for multi-page documents
//! - **Output formats**: Markdown, plain text, JSON

pub mod analyzer;
pub mod error;
pub mod layout;
pub mod model;
pub mod render;

// Re-export commonly used types
pub use analyzer::{
    AnalysisResult, AnalysisStats, Analyzer, AnalyzerConfig, DocumentAnalysis, ElementKind,
    ElementType, LayoutElement,
};
pub use error::{Error, Result};
pub use model::{BBox, Document, Page, TextDirection, TextFragment};
pub use render::{JsonFormat, RenderOptions};

use std::io::Read;
use std::path::Path;

/// Load pages from a JSON fragment dump.
///
/// The file may hold a bare array of pages or an object with a `pages`
/// field.
///
/// # Example
///
/// ```no_run
/// use doclayout::load_pages;
///
/// let pages = load_pages("fragments.json").unwrap();
/// println!("Pages: {}", pages.len());
/// ```
pub fn load_pages<P: AsRef<Path>>(path: P) -> Result<Vec<Page>> {
    Ok(Document::open(path)?.pages)
}

/// Load pages from a reader holding a JSON fragment dump.
pub fn pages_from_reader<R: Read>(reader: R) -> Result<Vec<Page>> {
    Ok(Document::from_reader(reader)?.pages)
}

/// Parse pages from a JSON string.
///
/// # Example
///
/// ```
/// use doclayout::pages_from_json;
///
/// let pages = pages_from_json(r#"[{"width": 612, "height": 792, "fragments": []}]"#).unwrap();
/// assert_eq!(pages[0].number, 1);
/// ```
pub fn pages_from_json(json: &str) -> Result<Vec<Page>> {
    Ok(Document::from_json(json)?.pages)
}

/// Analyze every page of a fragment dump file and render it as Markdown.
///
/// Running headers and footers are removed first.
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let pages = load_pages(path)?;
    let analysis = Analyzer::new().analyze_document(&pages);
    Ok(analysis.markdown(&RenderOptions::default()))
}

/// Analyze every page of a fragment dump file and return its text in
/// reading order.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let pages = load_pages(path)?;
    Ok(Analyzer::new().analyze_document(&pages).text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DUMP: &str = r#"{
        "pages": [
            {
                "width": 612,
                "height": 792,
                "fragments": [
                    {"text": "Hello", "x": 72, "y": 700, "width": 40, "height": 12, "font_size": 12}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_pages_from_json_wrapped() {
        let pages = pages_from_json(DUMP).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].fragments[0].text, "Hello");
    }

    #[test]
    fn test_pages_from_reader() {
        let pages = pages_from_reader(DUMP.as_bytes()).unwrap();
        assert_eq!(pages[0].number, 1);
    }

    #[test]
    fn test_pages_from_json_malformed() {
        let result = pages_from_json("[{\"width\": 612");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_load_pages_missing_file() {
        let result = load_pages("/nonexistent/fragments.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_extract_text_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();

        let text = extract_text(file.path()).unwrap();
        assert_eq!(text, "Hello");
        let markdown = to_markdown(file.path()).unwrap();
        assert_eq!(markdown, "Hello");
    }
}
