//! Plain text rendering for analysis results.

use crate::analyzer::AnalysisResult;

/// Page text in reading order.
///
/// Reading order text is preferred; without it the paragraph text is used.
pub fn to_text(result: &AnalysisResult) -> String {
    let text = match (&result.reading_order, &result.paragraphs) {
        (Some(order), _) if !order.is_empty() => order.text(),
        (_, Some(paragraphs)) => paragraphs.text(),
        _ => String::new(),
    };
    text.trim().to_string()
}

/// Text of several pages, separated by blank lines.
pub fn to_text_pages(results: &[AnalysisResult]) -> String {
    results
        .iter()
        .map(to_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Analyzer, AnalyzerConfig};
    use crate::model::TextFragment;

    fn fragments() -> Vec<TextFragment> {
        vec![
            TextFragment::new("Hello, world!", 72.0, 700.0, 200.0, 12.0),
            TextFragment::new("Still the first.", 72.0, 686.0, 200.0, 12.0),
            TextFragment::new("Second paragraph.", 72.0, 640.0, 200.0, 12.0),
        ]
    }

    #[test]
    fn test_to_text() {
        let result = Analyzer::new().analyze(&fragments(), 612.0, 792.0);
        let text = to_text(&result);

        assert!(text.contains("Hello, world!"));
        assert!(text.contains("Second paragraph."));
    }

    #[test]
    fn test_to_text_without_reading_order() {
        let analyzer = Analyzer::with_config(AnalyzerConfig::new().with_reading_order(false));
        let result = analyzer.analyze(&fragments(), 612.0, 792.0);

        assert!(result.reading_order.is_none());
        assert_eq!(
            to_text(&result),
            "Hello, world! Still the first.\n\nSecond paragraph."
        );
    }

    #[test]
    fn test_to_text_pages_skips_empty_pages() {
        let analyzer = Analyzer::new();
        let pages = vec![
            analyzer.analyze(&fragments()[..1], 612.0, 792.0),
            analyzer.analyze(&[], 612.0, 792.0),
        ];
        assert_eq!(to_text_pages(&pages), "Hello, world!");
    }
}
