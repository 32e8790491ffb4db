//! Analysis results.

use serde::{Deserialize, Serialize};

use crate::layout::{
    BlockLayout, ColumnLayout, HeaderFooterResult, Heading, HeadingLayout, LineLayout, List,
    ListLayout, Paragraph, ParagraphLayout, ReadingOrderLayout,
};
use crate::model::BBox;
use crate::render::{self, RenderOptions};

/// Kind of a top-level page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Heading,
    List,
    Paragraph,
}

/// Payload of a page element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ElementKind {
    Heading(Heading),
    List(List),
    Paragraph(Paragraph),
}

/// A top-level element of the page tree, in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutElement {
    /// Position in the element list
    pub index: usize,
    /// Reading order rank (equal to `index` after assembly)
    pub z_order: usize,
    pub bbox: BBox,
    pub text: String,
    pub kind: ElementKind,
}

impl LayoutElement {
    pub(crate) fn new(kind: ElementKind) -> Self {
        let (bbox, text) = match &kind {
            ElementKind::Heading(h) => (h.bbox(), h.text().to_string()),
            ElementKind::List(l) => (l.bbox, l.text()),
            ElementKind::Paragraph(p) => (p.bbox, p.text.clone()),
        };
        Self {
            index: 0,
            z_order: 0,
            bbox,
            text,
            kind,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self.kind {
            ElementKind::Heading(_) => ElementType::Heading,
            ElementKind::List(_) => ElementType::List,
            ElementKind::Paragraph(_) => ElementType::Paragraph,
        }
    }

    pub fn as_heading(&self) -> Option<&Heading> {
        match &self.kind {
            ElementKind::Heading(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match &self.kind {
            ElementKind::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match &self.kind {
            ElementKind::Paragraph(p) => Some(p),
            _ => None,
        }
    }
}

/// Summary counts for one analyzed page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub fragment_count: usize,
    pub column_count: usize,
    pub line_count: usize,
    pub block_count: usize,
    pub paragraph_count: usize,
    pub heading_count: usize,
    pub list_count: usize,
    pub list_item_count: usize,
    pub section_count: usize,
    pub element_count: usize,
}

/// Result of analyzing one page.
///
/// Intermediate layouts are `None` when their phase did not run; every
/// accessor treats a missing layout as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Page number (1-indexed, 0 when unknown)
    pub page_number: u32,
    pub page_width: f32,
    pub page_height: f32,

    /// Top-level elements in reading order
    pub elements: Vec<LayoutElement>,

    pub columns: Option<ColumnLayout>,
    pub lines: Option<LineLayout>,
    pub blocks: Option<BlockLayout>,
    pub paragraphs: Option<ParagraphLayout>,
    pub headings: Option<HeadingLayout>,
    pub lists: Option<ListLayout>,
    pub reading_order: Option<ReadingOrderLayout>,

    /// Header/footer regions removed before analysis, if filtering ran
    pub header_footer: Option<HeaderFooterResult>,

    pub stats: AnalysisStats,
}

impl AnalysisResult {
    /// Top-level elements in reading order.
    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements of one kind, in reading order.
    pub fn elements_of_type(&self, element_type: ElementType) -> Vec<&LayoutElement> {
        self.elements
            .iter()
            .filter(|e| e.element_type() == element_type)
            .collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.as_ref().map_or(0, |c| c.column_count())
    }

    pub fn is_multi_column(&self) -> bool {
        self.columns.as_ref().is_some_and(|c| c.is_multi_column())
    }

    pub fn line_count(&self) -> usize {
        self.lines.as_ref().map_or(0, |l| l.line_count())
    }

    pub fn block_count(&self) -> usize {
        self.blocks.as_ref().map_or(0, |b| b.block_count())
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.as_ref().map_or(0, |p| p.paragraph_count())
    }

    pub fn heading_count(&self) -> usize {
        self.headings.as_ref().map_or(0, |h| h.heading_count())
    }

    pub fn list_count(&self) -> usize {
        self.lists.as_ref().map_or(0, |l| l.list_count())
    }

    pub fn section_count(&self) -> usize {
        self.reading_order.as_ref().map_or(0, |r| r.section_count())
    }

    /// Detected headings, or an empty slice.
    pub fn all_headings(&self) -> &[Heading] {
        self.headings.as_ref().map_or(&[], |h| h.headings.as_slice())
    }

    /// Detected lists, or an empty slice.
    pub fn all_lists(&self) -> &[List] {
        self.lists.as_ref().map_or(&[], |l| l.lists.as_slice())
    }

    /// Detected paragraphs, or an empty slice.
    pub fn all_paragraphs(&self) -> &[Paragraph] {
        self.paragraphs.as_ref().map_or(&[], |p| p.paragraphs.as_slice())
    }

    /// Plain text in reading order.
    pub fn text(&self) -> String {
        render::to_text(self)
    }

    /// Markdown with default render options.
    pub fn markdown(&self) -> String {
        render::to_markdown(self, &RenderOptions::default())
    }

    pub(crate) fn compute_stats(&mut self, fragment_count: usize) {
        self.stats = AnalysisStats {
            fragment_count,
            column_count: self.column_count(),
            line_count: self.line_count(),
            block_count: self.block_count(),
            paragraph_count: self.paragraph_count(),
            heading_count: self.heading_count(),
            list_count: self.list_count(),
            list_item_count: self.lists.as_ref().map_or(0, |l| l.total_item_count()),
            section_count: self.section_count(),
            element_count: self.element_count(),
        };
    }
}

/// Results for a multi-page document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// Per-page results in page order
    pub pages: Vec<AnalysisResult>,

    /// Header/footer regions detected across all pages
    pub header_footer: HeaderFooterResult,
}

impl DocumentAnalysis {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page result (0-indexed).
    pub fn get_page(&self, index: usize) -> Option<&AnalysisResult> {
        self.pages.get(index)
    }

    /// Plain text of every page, separated by blank lines.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Markdown of every page, joined with the page separator.
    pub fn markdown(&self, options: &RenderOptions) -> String {
        render::to_markdown_pages(&self.pages, options)
    }
}
