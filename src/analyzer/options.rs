//! Analyzer configuration.

use serde::{Deserialize, Serialize};

use crate::layout::{
    BlockDetectorConfig, ColumnDetectorConfig, HeaderFooterDetectorConfig, HeadingDetectorConfig,
    LineDetectorConfig, ListDetectorConfig, ParagraphDetectorConfig, ReadingOrderConfig,
};

/// Configuration for the full layout pipeline.
///
/// Holds one config per detector plus the feature switches. The column and
/// line configs are shared with the reading order phase, so the values in
/// `reading_order.column` and `reading_order.line` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub column: ColumnDetectorConfig,
    pub line: LineDetectorConfig,
    pub block: BlockDetectorConfig,
    pub paragraph: ParagraphDetectorConfig,
    pub heading: HeadingDetectorConfig,
    pub list: ListDetectorConfig,
    pub reading_order: ReadingOrderConfig,
    pub header_footer: HeaderFooterDetectorConfig,

    /// Run heading detection
    pub detect_headings: bool,

    /// Run list detection
    pub detect_lists: bool,

    /// Build paragraphs from reading order sections instead of raw lines
    pub use_reading_order: bool,
}

impl AnalyzerConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable heading detection.
    pub fn with_headings(mut self, enabled: bool) -> Self {
        self.detect_headings = enabled;
        self
    }

    /// Enable or disable list detection.
    pub fn with_lists(mut self, enabled: bool) -> Self {
        self.detect_lists = enabled;
        self
    }

    /// Enable or disable the reading order phase.
    pub fn with_reading_order(mut self, enabled: bool) -> Self {
        self.use_reading_order = enabled;
        self
    }

    pub fn with_column_config(mut self, config: ColumnDetectorConfig) -> Self {
        self.column = config;
        self
    }

    pub fn with_line_config(mut self, config: LineDetectorConfig) -> Self {
        self.line = config;
        self
    }

    pub fn with_block_config(mut self, config: BlockDetectorConfig) -> Self {
        self.block = config;
        self
    }

    pub fn with_paragraph_config(mut self, config: ParagraphDetectorConfig) -> Self {
        self.paragraph = config;
        self
    }

    pub fn with_heading_config(mut self, config: HeadingDetectorConfig) -> Self {
        self.heading = config;
        self
    }

    pub fn with_list_config(mut self, config: ListDetectorConfig) -> Self {
        self.list = config;
        self
    }

    pub fn with_reading_order_config(mut self, config: ReadingOrderConfig) -> Self {
        self.reading_order = config;
        self
    }

    pub fn with_header_footer_config(mut self, config: HeaderFooterDetectorConfig) -> Self {
        self.header_footer = config;
        self
    }

    /// Reading order config carrying the shared column and line settings.
    pub(crate) fn effective_reading_order(&self) -> ReadingOrderConfig {
        ReadingOrderConfig {
            column: self.column.clone(),
            line: self.line.clone(),
            ..self.reading_order.clone()
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            column: ColumnDetectorConfig::default(),
            line: LineDetectorConfig::default(),
            block: BlockDetectorConfig::default(),
            paragraph: ParagraphDetectorConfig::default(),
            heading: HeadingDetectorConfig::default(),
            list: ListDetectorConfig::default(),
            reading_order: ReadingOrderConfig::default(),
            header_footer: HeaderFooterDetectorConfig::default(),
            detect_headings: true,
            detect_lists: true,
            use_reading_order: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_all_phases() {
        let config = AnalyzerConfig::default();
        assert!(config.detect_headings);
        assert!(config.detect_lists);
        assert!(config.use_reading_order);
    }

    #[test]
    fn test_builders() {
        let config = AnalyzerConfig::new()
            .with_headings(false)
            .with_lists(false)
            .with_reading_order(false);
        assert!(!config.detect_headings);
        assert!(!config.detect_lists);
        assert!(!config.use_reading_order);
    }

    #[test]
    fn test_reading_order_shares_column_config() {
        let column = ColumnDetectorConfig {
            max_columns: 2,
            ..Default::default()
        };
        let config = AnalyzerConfig::new().with_column_config(column);
        assert_eq!(config.effective_reading_order().column.max_columns, 2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalyzerConfig = serde_json::from_str(r#"{"detect_lists": false}"#).unwrap();
        assert!(!config.detect_lists);
        assert!(config.detect_headings);
        assert_eq!(config.list.min_consecutive_items, 2);
    }
}
