//! Heading detection and level assignment.
//!
//! Every paragraph is scored with additive typographic evidence (font-size
//! ratio to the body text, weight, capitalization, numbering, centering,
//! brevity). Accepted headings get an initial level from their numbering or
//! font-size ratio; a refinement pass then ranks the distinct heading font
//! sizes on the page so that levels are consistent across the document.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::line::LineAlignment;
use super::nesting::{build_forest, Nested};
use super::paragraph::{Paragraph, ParagraphLayout, ParagraphStyle};
use super::patterns::{
    is_mostly_uppercase, is_valid_roman, DECIMAL_PREFIX, KEYWORD_PREFIX, LETTER_PREFIX,
    ROMAN_PREFIX,
};
use crate::model::BBox;

/// Heading level, H1 (top) to H6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
    H4 = 4,
    H5 = 5,
    H6 = 6,
}

impl HeadingLevel {
    /// Level from a number, clamped to 1..=6.
    pub fn from_number(n: usize) -> Self {
        match n {
            0 | 1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            4 => HeadingLevel::H4,
            5 => HeadingLevel::H5,
            _ => HeadingLevel::H6,
        }
    }

    pub fn as_number(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.as_number())
    }
}

/// Heading detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingDetectorConfig {
    /// Minimum confidence for a paragraph to count as a heading
    pub min_confidence: f32,
    /// Confidence added for centered paragraphs
    pub center_boost: f32,
    /// Font-size ratios (against body text) for H1..H6
    pub level_ratios: [f32; 6],
    /// Paragraphs with more lines are not headings unless already styled so
    pub max_heading_lines: usize,
    /// Paragraphs smaller than this ratio of the body font are never
    /// headings (0 disables the cutoff)
    pub min_font_ratio: f32,
    /// Remap levels to the rank of each heading font size on the page
    pub refine_levels: bool,
}

impl Default for HeadingDetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            center_boost: 0.1,
            level_ratios: [1.8, 1.5, 1.3, 1.15, 1.1, 1.05],
            max_heading_lines: 3,
            min_font_ratio: 0.0,
            refine_levels: true,
        }
    }
}

/// A paragraph recognized as a heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heading {
    pub paragraph: Paragraph,
    pub level: HeadingLevel,
    /// Accumulated evidence, 0.0 to 1.0
    pub confidence: f32,
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_all_caps: bool,
    pub is_numbered: bool,
    /// Leading enumerator such as `2.1` or `Chapter 3`
    pub number_prefix: Option<String>,
}

impl Heading {
    pub fn text(&self) -> &str {
        &self.paragraph.text
    }

    pub fn bbox(&self) -> BBox {
        self.paragraph.bbox
    }

    pub fn font_size(&self) -> f32 {
        self.paragraph.average_font_size
    }
}

/// One node of the heading outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub text: String,
    pub level: HeadingLevel,
    /// Index into `HeadingLayout::headings`
    pub heading_index: usize,
    pub children: Vec<OutlineEntry>,
}

impl Nested for OutlineEntry {
    fn nesting_level(&self) -> usize {
        self.level.as_number() as usize
    }

    fn push_child(&mut self, child: Self) {
        self.children.push(child);
    }
}

/// Headings detected on a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeadingLayout {
    /// Headings in paragraph order
    pub headings: Vec<Heading>,
    /// Font size of the bulk of the body text
    pub body_font_size: f32,
}

impl HeadingLayout {
    /// Get the number of headings.
    pub fn heading_count(&self) -> usize {
        self.headings.len()
    }

    /// Get a heading by index.
    pub fn get_heading(&self, index: usize) -> Option<&Heading> {
        self.headings.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.headings.is_empty()
    }

    /// Headings at the given level.
    pub fn headings_at_level(&self, level: HeadingLevel) -> Vec<&Heading> {
        self.headings.iter().filter(|h| h.level == level).collect()
    }

    /// The heading outline as a forest; deeper headings nest under the
    /// closest preceding heading of a higher level.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        build_forest(self.headings.iter().enumerate().map(|(i, h)| OutlineEntry {
            text: h.text().to_string(),
            level: h.level,
            heading_index: i,
            children: vec![],
        }))
    }

    /// Heading texts, one per line.
    pub fn text(&self) -> String {
        self.headings
            .iter()
            .map(|h| h.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Scores paragraphs and assigns heading levels.
pub struct HeadingDetector {
    config: HeadingDetectorConfig,
}

impl HeadingDetector {
    /// Create a new heading detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: HeadingDetectorConfig::default(),
        }
    }

    /// Create a new heading detector with custom configuration.
    pub fn with_config(config: HeadingDetectorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &HeadingDetectorConfig {
        &self.config
    }

    /// Detect headings among paragraphs.
    pub fn detect(&self, layout: &ParagraphLayout) -> HeadingLayout {
        let body_font_size = body_font_size(&layout.paragraphs);
        let mut headings: Vec<Heading> = layout
            .paragraphs
            .iter()
            .filter_map(|p| self.evaluate(p, body_font_size))
            .collect();

        if self.config.refine_levels {
            refine_levels(&mut headings);
        }

        log::debug!(
            "HeadingDetector: {} headings (body font {:.1})",
            headings.len(),
            body_font_size
        );
        HeadingLayout {
            headings,
            body_font_size,
        }
    }

    fn evaluate(&self, paragraph: &Paragraph, body_font_size: f32) -> Option<Heading> {
        let text = paragraph.text.trim();
        if text.is_empty() {
            return None;
        }

        let ratio = if body_font_size > 0.0 && paragraph.average_font_size > 0.0 {
            paragraph.average_font_size / body_font_size
        } else {
            1.0
        };
        if ratio < self.config.min_font_ratio {
            return None;
        }
        if paragraph.line_count() > self.config.max_heading_lines
            && paragraph.style != ParagraphStyle::Heading
        {
            return None;
        }

        let is_bold = paragraph.is_bold();
        let is_italic = paragraph.lines.iter().any(|l| l.is_italic());
        let is_all_caps = is_mostly_uppercase(text);
        let numbering = numbered_prefix(text);

        let mut confidence = if ratio >= 1.5 {
            0.5
        } else if ratio >= 1.2 {
            0.35
        } else if ratio >= 1.1 {
            0.2
        } else if ratio >= 1.05 {
            0.1
        } else {
            0.0
        };
        if is_bold {
            confidence += 0.2;
        }
        if is_all_caps {
            confidence += 0.15;
        }
        if numbering.is_some() {
            confidence += 0.2;
        }
        if paragraph.alignment == LineAlignment::Center {
            confidence += self.config.center_boost;
        }
        let words = paragraph.word_count();
        if words <= 10 {
            confidence += 0.1;
        } else if words <= 20 {
            confidence += 0.05;
        }
        match paragraph.line_count() {
            1 => confidence += 0.1,
            2 => confidence += 0.05,
            _ => {}
        }
        let confidence = confidence.min(1.0);

        log::trace!(
            "HeadingDetector: {:?} ratio {:.2} confidence {:.2}",
            text,
            ratio,
            confidence
        );
        if confidence < self.config.min_confidence {
            return None;
        }

        let level = match &numbering {
            Some((_, level)) => *level,
            None => self.level_for_ratio(ratio),
        };

        Some(Heading {
            paragraph: paragraph.clone(),
            level,
            confidence,
            is_bold,
            is_italic,
            is_all_caps,
            is_numbered: numbering.is_some(),
            number_prefix: numbering.map(|(prefix, _)| prefix),
        })
    }

    fn level_for_ratio(&self, ratio: f32) -> HeadingLevel {
        self.config
            .level_ratios
            .iter()
            .position(|threshold| ratio >= *threshold)
            .map(|i| HeadingLevel::from_number(i + 1))
            .unwrap_or(HeadingLevel::H6)
    }
}

impl Default for HeadingDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Font size (0.1pt buckets) carrying the most lines.
fn body_font_size(paragraphs: &[Paragraph]) -> f32 {
    let mut buckets: Vec<(i64, usize)> = Vec::new();
    for paragraph in paragraphs {
        if paragraph.average_font_size <= 0.0 {
            continue;
        }
        let key = (paragraph.average_font_size * 10.0).round() as i64;
        match buckets.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 += paragraph.line_count(),
            None => buckets.push((key, paragraph.line_count())),
        }
    }
    // Ties go to the smaller size
    buckets
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(key, _)| key as f32 / 10.0)
        .unwrap_or(0.0)
}

/// Recognize a numbering prefix and the level it implies.
fn numbered_prefix(text: &str) -> Option<(String, HeadingLevel)> {
    if let Some(caps) = KEYWORD_PREFIX.captures(text) {
        let keyword = caps[1].to_lowercase();
        let number = &caps[2];
        let level = if keyword == "section" && number.starts_with(|c: char| c.is_ascii_digit()) {
            HeadingLevel::from_number(number.matches('.').count() + 1)
        } else {
            HeadingLevel::H1
        };
        return Some((caps[0].to_string(), level));
    }
    if let Some(caps) = DECIMAL_PREFIX.captures(text) {
        let number = &caps[1];
        return Some((
            number.to_string(),
            HeadingLevel::from_number(number.matches('.').count() + 1),
        ));
    }
    if let Some(caps) = ROMAN_PREFIX.captures(text) {
        if is_valid_roman(&caps[1]) {
            return Some((caps[1].to_string(), HeadingLevel::H1));
        }
    }
    if let Some(caps) = LETTER_PREFIX.captures(text) {
        return Some((caps[1].to_string(), HeadingLevel::H2));
    }
    None
}

/// Remap levels to the rank of each heading's font size (largest = H1).
fn refine_levels(headings: &mut [Heading]) {
    let mut sizes: Vec<i64> = headings
        .iter()
        .map(|h| (h.font_size() * 10.0).round() as i64)
        .collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes.dedup();

    for heading in headings.iter_mut() {
        let key = (heading.font_size() * 10.0).round() as i64;
        if let Some(rank) = sizes.iter().position(|s| *s == key) {
            heading.level = HeadingLevel::from_number(rank + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::line::LineDetector;
    use crate::layout::paragraph::ParagraphDetector;
    use crate::model::TextFragment;

    fn paragraphs_of(fragments: &[TextFragment]) -> ParagraphLayout {
        let lines = LineDetector::new().detect(fragments, 612.0, 792.0).lines;
        ParagraphDetector::new().detect(&lines)
    }

    fn frag(text: &str, x: f32, y: f32, width: f32, size: f32) -> TextFragment {
        TextFragment::new(text, x, y, width, size)
    }

    fn body(y: f32) -> TextFragment {
        frag("Body text runs across the full column width here", 72.0, y, 400.0, 12.0)
    }

    #[test]
    fn test_large_title_is_h1() {
        let layout = paragraphs_of(&[
            frag("Introduction", 72.0, 700.0, 150.0, 24.0),
            body(670.0),
            body(656.0),
            body(642.0),
        ]);
        let headings = HeadingDetector::new().detect(&layout);
        assert_eq!(headings.heading_count(), 1);
        assert_eq!(headings.headings[0].level, HeadingLevel::H1);
        assert_eq!(headings.headings[0].text(), "Introduction");
        assert!((headings.body_font_size - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_levels_ranked_by_font_size() {
        let layout = paragraphs_of(&[
            frag("Title", 72.0, 740.0, 100.0, 20.0),
            body(710.0),
            body(696.0),
            body(682.0),
            frag("Subsection", 72.0, 650.0, 100.0, 16.0),
            body(620.0),
            body(606.0),
            body(592.0),
        ]);
        let headings = HeadingDetector::new().detect(&layout);
        assert_eq!(headings.heading_count(), 2);
        assert_eq!(headings.headings[0].level, HeadingLevel::H1);
        assert_eq!(headings.headings[1].level, HeadingLevel::H2);

        let outline = headings.outline();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].children.len(), 1);
        assert_eq!(outline[0].children[0].text, "Subsection");
        assert_eq!(headings.headings_at_level(HeadingLevel::H2).len(), 1);
    }

    #[test]
    fn test_body_text_is_not_heading() {
        let layout = paragraphs_of(&[body(700.0), body(686.0), body(672.0)]);
        let headings = HeadingDetector::new().detect(&layout);
        assert!(headings.is_empty());
        assert_eq!(headings.text(), "");
    }

    #[test]
    fn test_numbered_prefix() {
        let (prefix, level) = numbered_prefix("2.1 Methods").unwrap();
        assert_eq!(prefix, "2.1");
        assert_eq!(level, HeadingLevel::H2);

        let (_, level) = numbered_prefix("Chapter 3 Results").unwrap();
        assert_eq!(level, HeadingLevel::H1);

        let (prefix, _) = numbered_prefix("IV. Discussion").unwrap();
        assert_eq!(prefix, "IV");

        assert!(numbered_prefix("Plain words").is_none());
    }

    #[test]
    fn test_level_for_ratio() {
        let config = HeadingDetectorConfig {
            refine_levels: false,
            ..Default::default()
        };
        let detector = HeadingDetector::with_config(config);
        assert_eq!(detector.level_for_ratio(2.0), HeadingLevel::H1);
        assert_eq!(detector.level_for_ratio(1.35), HeadingLevel::H3);
        assert_eq!(detector.level_for_ratio(1.0), HeadingLevel::H6);
    }

    #[test]
    fn test_bold_uppercase_body_size_heading() {
        let layout = paragraphs_of(&[
            frag("METHODS", 72.0, 700.0, 80.0, 12.0).with_font("Helvetica-Bold"),
            body(670.0),
            body(656.0),
            body(642.0),
        ]);
        let headings = HeadingDetector::new().detect(&layout);
        assert_eq!(headings.heading_count(), 1);
        assert!(headings.headings[0].is_bold);
        assert!(headings.headings[0].is_all_caps);
    }

    #[test]
    fn test_small_numbered_heading_accepted_on_confidence() {
        let fragments = [
            frag("1. INTRODUCTION", 72.0, 700.0, 110.0, 11.0).with_font("Helvetica-Bold"),
            body(670.0),
            body(656.0),
            body(642.0),
        ];
        let layout = paragraphs_of(&fragments);
        let headings = HeadingDetector::new().detect(&layout);
        assert_eq!(headings.heading_count(), 1);
        assert_eq!(headings.headings[0].text(), "1. INTRODUCTION");
        assert!(headings.headings[0].is_numbered);
        assert_eq!(headings.headings[0].level, HeadingLevel::H1);

        let config = HeadingDetectorConfig {
            min_font_ratio: 0.95,
            ..Default::default()
        };
        assert!(HeadingDetector::with_config(config).detect(&layout).is_empty());
    }
}
