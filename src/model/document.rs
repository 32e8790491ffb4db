//! Document-level input: a sequence of pages, loadable from JSON dumps.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Page;
use crate::error::{Error, Result};

/// A multi-page fragment dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Pages in the document
    pub pages: Vec<Page>,
}

/// Accepted on-disk shapes: a bare page array or a `{ "pages": [...] }` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentRepr {
    Pages(Vec<Page>),
    Wrapped { pages: Vec<Page> },
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from pages.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Parse a JSON fragment dump.
    pub fn from_json(json: &str) -> Result<Self> {
        let repr: DocumentRepr = serde_json::from_str(json)?;
        Self::from_repr(repr)
    }

    /// Parse a JSON fragment dump from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let repr: DocumentRepr = serde_json::from_reader(reader)?;
        Self::from_repr(repr)
    }

    /// Load a JSON fragment dump from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_repr(repr: DocumentRepr) -> Result<Self> {
        let mut pages = match repr {
            DocumentRepr::Pages(pages) => pages,
            DocumentRepr::Wrapped { pages } => pages,
        };
        for (i, page) in pages.iter_mut().enumerate() {
            if !page.width.is_finite() || !page.height.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "page {} has non-finite dimensions",
                    i + 1
                )));
            }
            if page.number == 0 {
                page.number = i as u32 + 1;
            }
        }
        Ok(Self { pages })
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        if page_num == 0 {
            return None;
        }
        self.pages.get((page_num - 1) as usize)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total number of fragments across all pages.
    pub fn fragment_count(&self) -> usize {
        self.pages.iter().map(|p| p.fragment_count()).sum()
    }
}
