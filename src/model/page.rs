//! Page-level input types.

use super::TextFragment;
use serde::{Deserialize, Serialize};

/// One page worth of fragments plus its dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    #[serde(default)]
    pub number: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Text fragments on the page, in stream order
    #[serde(default)]
    pub fragments: Vec<TextFragment>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            fragments: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0) // 8.5 * 72, 11 * 72
    }

    /// Builder-style fragment list.
    pub fn with_fragments(mut self, fragments: Vec<TextFragment>) -> Self {
        self.fragments = fragments;
        self
    }

    /// Add a fragment to the page.
    pub fn add_fragment(&mut self, fragment: TextFragment) {
        self.fragments.push(fragment);
    }

    /// Check if the page has no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Get the number of fragments on the page.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Average number of characters per fragment.
    ///
    /// Producers that emit one glyph per fragment yield values around 1.
    pub fn average_fragment_length(&self) -> f32 {
        average_fragment_length(&self.fragments)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::letter(1)
    }
}

/// Average rune count per fragment (0 for an empty slice).
pub fn average_fragment_length(fragments: &[TextFragment]) -> f32 {
    if fragments.is_empty() {
        return 0.0;
    }
    let total: usize = fragments.iter().map(|f| f.char_count()).sum();
    total as f32 / fragments.len() as f32
}
