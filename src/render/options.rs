//! Rendering options.

/// Options for rendering analysis results as Markdown.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Maximum heading level (1-6); deeper headings are clamped
    pub max_heading_level: u8,

    /// Character to use for bullet list markers
    pub list_marker: char,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,

    /// Text inserted between pages in multi-page output
    pub page_separator: String,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Set the list marker character.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Enable or disable escaping.
    pub fn with_escape(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Set the page separator.
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_heading_level: 6,
            list_marker: '-',
            escape_special_chars: true,
            page_separator: "\n\n---\n\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_heading_is_clamped() {
        assert_eq!(RenderOptions::new().with_max_heading(0).max_heading_level, 1);
        assert_eq!(RenderOptions::new().with_max_heading(9).max_heading_level, 6);
        assert_eq!(RenderOptions::new().with_max_heading(3).max_heading_level, 3);
    }

    #[test]
    fn test_builders() {
        let options = RenderOptions::new()
            .with_list_marker('*')
            .with_escape(false)
            .with_page_separator("\n");
        assert_eq!(options.list_marker, '*');
        assert!(!options.escape_special_chars);
        assert_eq!(options.page_separator, "\n");
    }
}
