//! Full-page layout analysis.
//!
//! The [`Analyzer`] runs the detectors in sequence and assembles their
//! output into a single list of headings, lists and paragraphs in reading
//! order.
//!
//! # Example
//!
//! ```
//! use doclayout::analyzer::Analyzer;
//! use doclayout::model::TextFragment;
//!
//! let fragments = vec![
//!     TextFragment::new("Introduction", 72.0, 720.0, 150.0, 24.0),
//!     TextFragment::new("Body text of the first paragraph.", 72.0, 690.0, 300.0, 12.0),
//!     TextFragment::new("It continues on a second line.", 72.0, 676.0, 280.0, 12.0),
//! ];
//!
//! let result = Analyzer::new().analyze(&fragments, 612.0, 792.0);
//! assert!(result.element_count() > 0);
//! ```

mod options;
mod result;

pub use options::AnalyzerConfig;
pub use result::{
    AnalysisResult, AnalysisStats, DocumentAnalysis, ElementKind, ElementType, LayoutElement,
};

use std::borrow::Cow;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::layout::{
    detect_coordinate_system, reorder_lines, BlockDetector, ColumnDetector, CoordinateSystem,
    HeaderFooterDetector, HeadingDetector, HeadingLayout, Line, LineDetector, ListDetector,
    ListLayout, ParagraphDetector, ParagraphLayout, ReadingOrderDetector, ReadingOrderLayout,
};
use crate::model::{BBox, Page, TextFragment};

/// Row height (points) for top-to-bottom ordering without reading order.
const ROW_TOLERANCE: f32 = 10.0;

/// Vertical slack (points) when matching an element to a reading order line.
const LINE_MATCH_TOLERANCE: f32 = 2.0;

/// Share of a paragraph's area a heading or list must cover to consume it.
const CONSUME_RATIO: f32 = 0.5;

/// Runs the layout pipeline over a page.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with a custom configuration.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the fragments of one page.
    pub fn analyze(&self, fragments: &[TextFragment], page_width: f32, page_height: f32) -> AnalysisResult {
        let fragments = finite_fragments(fragments);
        let config = &self.config;

        let columns =
            ColumnDetector::with_config(config.column.clone()).detect(&fragments, page_width, page_height);

        let reading_order = config.use_reading_order.then(|| {
            ReadingOrderDetector::with_config(config.effective_reading_order()).detect_with_columns(
                &fragments,
                columns.clone(),
                page_width,
                page_height,
            )
        });
        let coords = reading_order
            .as_ref()
            .map(|r| r.coordinate_system)
            .or(config.reading_order.coordinate_system)
            .unwrap_or_else(|| detect_coordinate_system(&fragments, page_height));

        let mut lines =
            LineDetector::with_config(config.line.clone()).detect(&fragments, page_width, page_height);
        if coords == CoordinateSystem::Inverted {
            reorder_lines(&mut lines.lines, coords);
        }

        let blocks =
            BlockDetector::with_config(config.block.clone()).detect(&fragments, page_width, page_height);

        let paragraph_detector = ParagraphDetector::with_config(config.paragraph.clone());
        let paragraphs = match &reading_order {
            Some(order) => paragraph_detector.detect_sections(order),
            None => paragraph_detector.detect(&lines.lines),
        };

        let headings = config
            .detect_headings
            .then(|| HeadingDetector::with_config(config.heading.clone()).detect(&paragraphs));
        let lists = config
            .detect_lists
            .then(|| ListDetector::with_config(config.list.clone()).detect(&paragraphs));

        let elements = assemble_elements(&paragraphs, headings.as_ref(), lists.as_ref());
        let elements = order_elements(elements, reading_order.as_ref(), coords);

        let mut result = AnalysisResult {
            page_width,
            page_height,
            elements,
            columns: Some(columns),
            lines: Some(lines),
            blocks: Some(blocks),
            paragraphs: Some(paragraphs),
            headings,
            lists,
            reading_order,
            ..Default::default()
        };
        result.compute_stats(fragments.len());

        log::debug!(
            "Analyzer: {} fragments -> {} columns, {} lines, {} paragraphs, {} elements",
            result.stats.fragment_count,
            result.stats.column_count,
            result.stats.line_count,
            result.stats.paragraph_count,
            result.stats.element_count
        );
        result
    }

    /// Analyze a page.
    pub fn analyze_page(&self, page: &Page) -> AnalysisResult {
        let mut result = self.analyze(&page.fragments, page.width, page.height);
        result.page_number = page.number;
        result
    }

    /// Run only column, reading order and paragraph detection.
    ///
    /// Elements are the paragraphs in reading order; lines, blocks,
    /// headings and lists are left empty.
    pub fn quick_analyze(&self, fragments: &[TextFragment], page_width: f32, page_height: f32) -> AnalysisResult {
        let fragments = finite_fragments(fragments);
        let columns = ColumnDetector::with_config(self.config.column.clone()).detect(
            &fragments,
            page_width,
            page_height,
        );
        let reading_order = ReadingOrderDetector::with_config(self.config.effective_reading_order())
            .detect_with_columns(&fragments, columns.clone(), page_width, page_height);
        let paragraphs =
            ParagraphDetector::with_config(self.config.paragraph.clone()).detect_sections(&reading_order);

        let elements = assemble_elements(&paragraphs, None, None);
        let elements = order_elements(elements, Some(&reading_order), reading_order.coordinate_system);

        let mut result = AnalysisResult {
            page_width,
            page_height,
            elements,
            columns: Some(columns),
            paragraphs: Some(paragraphs),
            reading_order: Some(reading_order),
            ..Default::default()
        };
        result.compute_stats(fragments.len());
        log::debug!(
            "Analyzer: quick analysis -> {} paragraphs",
            result.stats.paragraph_count
        );
        result
    }

    /// Analyze one page after removing headers and footers detected
    /// across all `pages`. `page_index` is 0-based.
    pub fn analyze_with_header_footer_filtering(&self, pages: &[Page], page_index: usize) -> Result<AnalysisResult> {
        let page = pages
            .get(page_index)
            .ok_or(Error::PageOutOfRange(page_index, pages.len()))?;

        let header_footer =
            HeaderFooterDetector::with_config(self.config.header_footer.clone()).detect(pages);
        let fragments = header_footer.filter_fragments(page_index, &page.fragments, page.height);
        log::debug!(
            "Analyzer: header/footer filtering removed {} fragments from page {}",
            page.fragments.len() - fragments.len(),
            page_index + 1
        );

        let mut result = self.analyze(&fragments, page.width, page.height);
        result.page_number = page.number;
        result.header_footer = Some(header_footer);
        Ok(result)
    }

    /// Analyze pages independently in parallel, preserving page order.
    pub fn analyze_pages(&self, pages: &[Page]) -> Vec<AnalysisResult> {
        pages.par_iter().map(|page| self.analyze_page(page)).collect()
    }

    /// Detect headers and footers once, then analyze every filtered page.
    pub fn analyze_document(&self, pages: &[Page]) -> DocumentAnalysis {
        let header_footer =
            HeaderFooterDetector::with_config(self.config.header_footer.clone()).detect(pages);
        let filtered = header_footer.filter_pages(pages);
        DocumentAnalysis {
            pages: self.analyze_pages(&filtered),
            header_footer,
        }
    }
}

/// Drop fragments with non-finite geometry.
fn finite_fragments(fragments: &[TextFragment]) -> Cow<'_, [TextFragment]> {
    if fragments.iter().all(|f| f.is_finite()) {
        return Cow::Borrowed(fragments);
    }
    let kept: Vec<TextFragment> = fragments.iter().filter(|f| f.is_finite()).cloned().collect();
    log::warn!(
        "Analyzer: dropped {} fragments with non-finite geometry",
        fragments.len() - kept.len()
    );
    Cow::Owned(kept)
}

/// Seed elements with headings then lists, and add every paragraph they
/// do not cover.
fn assemble_elements(
    paragraphs: &ParagraphLayout,
    headings: Option<&HeadingLayout>,
    lists: Option<&ListLayout>,
) -> Vec<LayoutElement> {
    let seeds = headings
        .into_iter()
        .flat_map(|h| h.headings.iter().cloned().map(ElementKind::Heading))
        .chain(
            lists
                .into_iter()
                .flat_map(|l| l.lists.iter().cloned().map(ElementKind::List)),
        );

    let mut consumed = vec![false; paragraphs.paragraphs.len()];
    let mut elements = Vec::new();
    for kind in seeds {
        let element = LayoutElement::new(kind);
        for (paragraph, used) in paragraphs.paragraphs.iter().zip(consumed.iter_mut()) {
            if !*used && covers(&element.bbox, &paragraph.bbox) {
                *used = true;
            }
        }
        elements.push(element);
    }

    elements.extend(
        paragraphs
            .paragraphs
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(p, _)| LayoutElement::new(ElementKind::Paragraph(p.clone()))),
    );
    elements
}

/// Check whether `outer` overlaps more than half of `paragraph`.
fn covers(outer: &BBox, paragraph: &BBox) -> bool {
    let area = paragraph.area();
    if area <= 0.0 {
        return outer.contains(paragraph, 0.0);
    }
    outer.intersection_area(paragraph) > area * CONSUME_RATIO
}

/// Put elements in reading order and renumber them.
fn order_elements(
    mut elements: Vec<LayoutElement>,
    reading_order: Option<&ReadingOrderLayout>,
    coords: CoordinateSystem,
) -> Vec<LayoutElement> {
    match reading_order.filter(|r| !r.is_empty()) {
        Some(order) => {
            let lines: Vec<&Line> = order.lines().collect();
            // Stable sort: unmatched elements keep their relative order at the end.
            elements.sort_by_cached_key(|e| {
                lines
                    .iter()
                    .position(|line| line_matches(line, &e.bbox))
                    .unwrap_or(usize::MAX)
            });
        }
        None => {
            elements.sort_by(|a, b| {
                row_of(&a.bbox, coords)
                    .cmp(&row_of(&b.bbox, coords))
                    .then(a.bbox.x.total_cmp(&b.bbox.x))
            });
        }
    }

    for (i, element) in elements.iter_mut().enumerate() {
        element.index = i;
        element.z_order = i;
    }
    elements
}

fn line_matches(line: &Line, bbox: &BBox) -> bool {
    line.bbox.y <= bbox.top() + LINE_MATCH_TOLERANCE
        && line.bbox.top() >= bbox.y - LINE_MATCH_TOLERANCE
        && line.bbox.overlaps_horizontally(bbox)
}

/// Row rank growing down the page.
fn row_of(bbox: &BBox, coords: CoordinateSystem) -> i64 {
    match coords {
        CoordinateSystem::Standard => -(bbox.top() / ROW_TOLERANCE).floor() as i64,
        CoordinateSystem::Inverted => (bbox.y / ROW_TOLERANCE).floor() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f32, y: f32, width: f32, font_size: f32) -> TextFragment {
        TextFragment::new(text, x, y, width, font_size)
    }

    #[test]
    fn test_empty_page() {
        let result = Analyzer::new().analyze(&[], 612.0, 792.0);
        assert_eq!(result.element_count(), 0);
        assert_eq!(result.column_count(), 1);
        assert_eq!(result.paragraph_count(), 0);
        assert_eq!(result.text(), "");
    }

    #[test]
    fn test_heading_consumes_its_paragraph() {
        let fragments = vec![
            frag("Introduction", 72.0, 720.0, 150.0, 24.0),
            frag("Body text one.", 72.0, 680.0, 300.0, 12.0),
            frag("Body text two.", 72.0, 666.0, 300.0, 12.0),
            frag("Body text three.", 72.0, 652.0, 300.0, 12.0),
        ];
        let result = Analyzer::new().analyze(&fragments, 612.0, 792.0);

        assert_eq!(result.heading_count(), 1);
        assert_eq!(result.element_count(), 2);
        assert_eq!(result.elements[0].element_type(), ElementType::Heading);
        assert_eq!(result.elements[0].text, "Introduction");
        assert_eq!(result.elements[1].element_type(), ElementType::Paragraph);
        for (i, element) in result.elements.iter().enumerate() {
            assert_eq!(element.index, i);
            assert_eq!(element.z_order, i);
        }
    }

    #[test]
    fn test_list_consumes_item_paragraphs() {
        let fragments = vec![
            frag("1. First", 72.0, 700.0, 120.0, 12.0),
            frag("2. Second", 72.0, 686.0, 120.0, 12.0),
            frag("3. Third", 72.0, 672.0, 120.0, 12.0),
        ];
        let result = Analyzer::new().analyze(&fragments, 612.0, 792.0);

        assert_eq!(result.list_count(), 1);
        assert_eq!(result.element_count(), 1);
        let list = result.elements[0].as_list().unwrap();
        assert_eq!(list.numbers(), vec![1, 2, 3]);
        assert_eq!(result.stats.list_item_count, 3);
    }

    #[test]
    fn test_disabled_phases_leave_layouts_empty() {
        let config = AnalyzerConfig::new()
            .with_headings(false)
            .with_lists(false)
            .with_reading_order(false);
        let fragments = vec![
            frag("Title", 72.0, 720.0, 100.0, 24.0),
            frag("1. First", 72.0, 690.0, 120.0, 12.0),
            frag("2. Second", 72.0, 676.0, 120.0, 12.0),
        ];
        let result = Analyzer::with_config(config).analyze(&fragments, 612.0, 792.0);

        assert!(result.headings.is_none());
        assert!(result.lists.is_none());
        assert!(result.reading_order.is_none());
        assert_eq!(result.heading_count(), 0);
        assert_eq!(result.section_count(), 0);
        assert!(result
            .elements
            .iter()
            .all(|e| e.element_type() == ElementType::Paragraph));
        assert_eq!(result.elements[0].text, "Title");
    }

    #[test]
    fn test_two_columns_read_left_then_right() {
        let mut fragments = Vec::new();
        for i in 0..4 {
            let y = 700.0 - i as f32 * 14.0;
            fragments.push(frag(&format!("left {}", i), 72.0, y, 200.0, 12.0));
            fragments.push(frag(&format!("right {}", i), 340.0, y, 200.0, 12.0));
        }
        let result = Analyzer::new().analyze(&fragments, 612.0, 792.0);

        assert_eq!(result.column_count(), 2);
        let text = result.text();
        let left = text.find("left 3").unwrap();
        let right = text.find("right 0").unwrap();
        assert!(left < right);
    }

    #[test]
    fn test_full_width_paragraph_above_columns_is_normal() {
        let mut fragments = vec![
            frag(
                "This abstract runs across the whole text block of the page and introduces",
                72.0,
                740.0,
                468.0,
                12.0,
            ),
            frag(
                "the two columns of body text that follow it further down the same page.",
                72.0,
                726.0,
                468.0,
                12.0,
            ),
        ];
        for i in 0..30 {
            let y = 690.0 - i as f32 * 14.0;
            fragments.push(frag(&format!("left body {}", i), 72.0, y, 220.0, 12.0));
            fragments.push(frag(&format!("right body {}", i), 320.0, y, 220.0, 12.0));
        }
        let result = Analyzer::new().analyze(&fragments, 612.0, 792.0);

        assert_eq!(result.column_count(), 2);
        let paragraphs = result.paragraphs.as_ref().unwrap();
        let abstract_paragraph = paragraphs
            .paragraphs
            .iter()
            .find(|p| p.text.starts_with("This abstract"))
            .unwrap();
        assert_eq!(abstract_paragraph.style, crate::layout::ParagraphStyle::Normal);
        assert_eq!(abstract_paragraph.left_indent, 0.0);
        assert!(result.markdown().starts_with("This abstract"));
    }

    #[test]
    fn test_non_finite_fragments_are_dropped() {
        let fragments = vec![
            frag("Valid text", 72.0, 700.0, 100.0, 12.0),
            frag("Broken", f32::NAN, 686.0, 100.0, 12.0),
        ];
        let result = Analyzer::new().analyze(&fragments, 612.0, 792.0);
        assert_eq!(result.stats.fragment_count, 1);
        assert_eq!(result.text(), "Valid text");
    }

    #[test]
    fn test_quick_analyze() {
        let fragments = vec![
            frag("Alpha line one", 72.0, 700.0, 200.0, 12.0),
            frag("Alpha line two", 72.0, 686.0, 200.0, 12.0),
        ];
        let result = Analyzer::new().quick_analyze(&fragments, 612.0, 792.0);

        assert!(result.lines.is_none());
        assert!(result.blocks.is_none());
        assert!(result.headings.is_none());
        assert_eq!(result.paragraph_count(), 1);
        assert_eq!(result.element_count(), 1);
        assert_eq!(result.section_count(), 1);
    }

    #[test]
    fn test_header_footer_filtering() {
        let pages: Vec<Page> = (1..=3)
            .map(|n| {
                Page::letter(n).with_fragments(vec![
                    frag("Company Report 2024", 72.0, 760.0, 150.0, 10.0),
                    frag(&format!("Body of page {}", n), 72.0, 600.0, 200.0, 12.0),
                ])
            })
            .collect();
        let analyzer = Analyzer::new();

        let result = analyzer.analyze_with_header_footer_filtering(&pages, 1).unwrap();
        assert_eq!(result.page_number, 2);
        assert_eq!(result.text(), "Body of page 2");
        assert!(result.header_footer.as_ref().unwrap().has_headers());

        let err = analyzer.analyze_with_header_footer_filtering(&pages, 3).unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange(3, 3)));
    }

    #[test]
    fn test_analyze_document_preserves_order() {
        let pages: Vec<Page> = (1..=4)
            .map(|n| {
                Page::letter(n).with_fragments(vec![
                    frag("Quarterly Summary", 72.0, 760.0, 150.0, 10.0),
                    frag(&format!("Content {}", n), 72.0, 600.0, 200.0, 12.0),
                ])
            })
            .collect();
        let analysis = Analyzer::new().analyze_document(&pages);

        assert_eq!(analysis.page_count(), 4);
        assert!(analysis.header_footer.has_headers());
        for (i, page) in analysis.pages.iter().enumerate() {
            assert_eq!(page.page_number, i as u32 + 1);
            assert_eq!(page.text(), format!("Content {}", i + 1));
        }
    }
}
