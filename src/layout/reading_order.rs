//! Reading order: splitting a page into spanning and per-column sections and
//! ordering them the way a reader would traverse the page.
//!
//! Spanning content (titles, full-width figures' captions) cuts the columns
//! into vertical bands, so a page laid out as title / two columns /
//! full-width note / two columns reads as five sections in that order.

use serde::{Deserialize, Serialize};

use super::column::{ColumnDetector, ColumnDetectorConfig, ColumnLayout};
use super::line::{
    classify_alignment, compute_spacing, reorder_lines, CoordinateSystem, Line, LineAlignment,
    LineDetector, LineDetectorConfig,
};
use crate::model::{BBox, TextDirection, TextFragment};

/// Horizontal reading direction of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingDirection {
    #[default]
    Ltr,
    Rtl,
}

/// Kind of reading section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    /// Content crossing column boundaries
    Spanning,
    /// Content inside one column
    Column,
}

/// Reading order detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingOrderConfig {
    /// Forced reading direction; detected from the fragments when `None`
    pub direction: Option<ReadingDirection>,
    /// Forced Y convention; detected from the fragments when `None`
    pub coordinate_system: Option<CoordinateSystem>,
    /// Fragments wider than this fraction of the page width are spanning
    pub spanning_threshold: f32,
    /// Sections overlapping vertically by more than this fraction of the
    /// shorter one share a row and are ordered horizontally
    pub row_overlap_ratio: f32,
    /// A spanning section whose top is within this distance (points) of the
    /// preceding column section's top is read first
    pub spanning_priority_tolerance: f32,
    /// Width ratio to the section's widest line above which a column line
    /// counts as justified
    pub justified_ratio: f32,
    pub column: ColumnDetectorConfig,
    pub line: LineDetectorConfig,
}

impl Default for ReadingOrderConfig {
    fn default() -> Self {
        Self {
            direction: None,
            coordinate_system: None,
            spanning_threshold: 0.6,
            row_overlap_ratio: 0.5,
            spanning_priority_tolerance: 10.0,
            justified_ratio: 0.85,
            column: ColumnDetectorConfig::default(),
            line: LineDetectorConfig::default(),
        }
    }
}

/// A contiguous region read as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSection {
    /// Position in reading order
    pub index: usize,
    pub section_type: SectionType,
    /// Source column for column sections
    pub column_index: Option<usize>,
    pub bbox: BBox,
    /// Lines in reading order with spacing computed within the section
    pub lines: Vec<Line>,
}

impl ReadingSection {
    pub fn is_spanning(&self) -> bool {
        self.section_type == SectionType::Spanning
    }

    /// Number of lines in the section.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Section text, one line per output line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All fragments of the section in reading order.
    pub fn fragments(&self) -> impl Iterator<Item = &TextFragment> {
        self.lines.iter().flat_map(|l| l.fragments.iter())
    }
}

/// Sections of a page in reading order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingOrderLayout {
    pub sections: Vec<ReadingSection>,
    pub direction: ReadingDirection,
    pub coordinate_system: CoordinateSystem,
    pub columns: ColumnLayout,
    pub page_width: f32,
    pub page_height: f32,
}

impl ReadingOrderLayout {
    /// Get the number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Get a section by index.
    pub fn get_section(&self, index: usize) -> Option<&ReadingSection> {
        self.sections.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All lines, section by section.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.sections.iter().flat_map(|s| s.lines.iter())
    }

    /// Total number of lines across sections.
    pub fn line_count(&self) -> usize {
        self.sections.iter().map(|s| s.lines.len()).sum()
    }

    /// Page text in reading order; sections separated by blank lines.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Determines the reading order of a page.
pub struct ReadingOrderDetector {
    config: ReadingOrderConfig,
}

impl ReadingOrderDetector {
    /// Create a new reading order detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: ReadingOrderConfig::default(),
        }
    }

    /// Create a new reading order detector with custom configuration.
    pub fn with_config(config: ReadingOrderConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ReadingOrderConfig {
        &self.config
    }

    /// Detect the reading order of a page.
    pub fn detect(&self, fragments: &[TextFragment], page_width: f32, page_height: f32) -> ReadingOrderLayout {
        let columns = ColumnDetector::with_config(self.config.column.clone()).detect(
            fragments,
            page_width,
            page_height,
        );
        self.detect_with_columns(fragments, columns, page_width, page_height)
    }

    /// Detect the reading order using an existing column layout.
    pub fn detect_with_columns(
        &self,
        fragments: &[TextFragment],
        columns: ColumnLayout,
        page_width: f32,
        page_height: f32,
    ) -> ReadingOrderLayout {
        let direction = self
            .config
            .direction
            .unwrap_or_else(|| detect_direction(fragments));
        let coords = self
            .config
            .coordinate_system
            .unwrap_or_else(|| detect_coordinate_system(fragments, page_height));

        let mut sections = if columns.is_multi_column() {
            self.build_sections(&columns, page_width, coords)
        } else {
            self.single_section(fragments, page_width, page_height, coords)
                .into_iter()
                .collect()
        };

        self.order_sections(&mut sections, direction, coords);
        for (i, section) in sections.iter_mut().enumerate() {
            section.index = i;
        }

        log::debug!(
            "ReadingOrderDetector: {} sections over {} columns ({:?}, {:?})",
            sections.len(),
            columns.column_count(),
            direction,
            coords
        );

        ReadingOrderLayout {
            sections,
            direction,
            coordinate_system: coords,
            columns,
            page_width,
            page_height,
        }
    }

    fn line_detector(&self) -> LineDetector {
        LineDetector::with_config(self.config.line.clone())
    }

    fn single_section(
        &self,
        fragments: &[TextFragment],
        page_width: f32,
        page_height: f32,
        coords: CoordinateSystem,
    ) -> Option<ReadingSection> {
        let mut lines = self.line_detector().detect(fragments, page_width, page_height).lines;
        if lines.is_empty() {
            return None;
        }
        reorder_lines(&mut lines, coords);
        Some(ReadingSection {
            index: 0,
            section_type: SectionType::Column,
            column_index: Some(0),
            bbox: BBox::union_all(lines.iter().map(|l| l.bbox)),
            lines,
        })
    }

    /// Split a multi-column page into spanning runs and column bands.
    fn build_sections(
        &self,
        columns: &ColumnLayout,
        page_width: f32,
        coords: CoordinateSystem,
    ) -> Vec<ReadingSection> {
        let boundaries: Vec<f32> = columns.gaps.iter().map(|g| g.center()).collect();
        let wide_limit = page_width * self.config.spanning_threshold;

        let mut spanning: Vec<TextFragment> = Vec::new();
        let mut per_column: Vec<Vec<TextFragment>> = vec![Vec::new(); columns.column_count()];
        for (ci, column) in columns.columns.iter().enumerate() {
            for fragment in &column.fragments {
                let crosses = boundaries
                    .iter()
                    .any(|b| fragment.x < *b && fragment.right() > *b);
                if (page_width > 0.0 && fragment.width > wide_limit) || crosses {
                    spanning.push(fragment.clone());
                } else {
                    per_column[ci].push(fragment.clone());
                }
            }
        }

        let runs = self.spanning_runs(&spanning, &per_column, coords);
        let run_boxes: Vec<BBox> = runs
            .iter()
            .map(|r| BBox::union_all(r.iter().map(|l| l.bbox)))
            .collect();

        // Spanning lines keep page-wide alignment and indent from the content edge
        let content = BBox::union_all(
            columns
                .columns
                .iter()
                .map(|c| c.bbox)
                .chain(run_boxes.iter().copied()),
        );
        let mut sections = Vec::new();
        for mut lines in runs {
            for line in &mut lines {
                line.indentation = line.bbox.x - content.x;
                line.alignment = classify_alignment(
                    &line.bbox,
                    content.x,
                    content.right(),
                    content.width,
                    &self.config.line,
                );
            }
            compute_spacing(&mut lines, coords);
            sections.push(ReadingSection {
                index: 0,
                section_type: SectionType::Spanning,
                column_index: None,
                bbox: BBox::union_all(lines.iter().map(|l| l.bbox)),
                lines,
            });
        }

        for (ci, fragments) in per_column.into_iter().enumerate() {
            let mut bands: Vec<Vec<TextFragment>> = vec![Vec::new(); run_boxes.len() + 1];
            for fragment in fragments {
                let band = run_boxes
                    .iter()
                    .filter(|r| is_above(r, &fragment.bbox(), coords))
                    .count();
                bands[band].push(fragment);
            }
            for band in bands.into_iter().filter(|b| !b.is_empty()) {
                if let Some(section) = self.column_section(&band, ci, coords) {
                    sections.push(section);
                }
            }
        }
        sections
    }

    /// Group spanning fragments into lines and split them into vertical
    /// runs wherever column content lies between two spanning lines.
    fn spanning_runs(
        &self,
        spanning: &[TextFragment],
        per_column: &[Vec<TextFragment>],
        coords: CoordinateSystem,
    ) -> Vec<Vec<Line>> {
        let mut lines = self.line_detector().group_lines(spanning);
        reorder_lines(&mut lines, coords);

        let mut runs: Vec<Vec<Line>> = Vec::new();
        for line in lines {
            let split = match runs.last().and_then(|r| r.last()) {
                Some(prev) => per_column.iter().flatten().any(|f| {
                    let b = f.bbox();
                    is_above(&prev.bbox, &b, coords) && is_above(&b, &line.bbox, coords)
                }),
                None => true,
            };
            if split {
                runs.push(vec![line]);
            } else if let Some(run) = runs.last_mut() {
                run.push(line);
            }
        }
        runs
    }

    fn column_section(
        &self,
        fragments: &[TextFragment],
        column_index: usize,
        coords: CoordinateSystem,
    ) -> Option<ReadingSection> {
        let mut lines = self.line_detector().group_lines(fragments);
        if lines.is_empty() {
            return None;
        }
        reorder_lines(&mut lines, coords);

        let left = lines.iter().map(|l| l.bbox.x).reduce(f32::min).unwrap_or(0.0);
        let max_width = lines.iter().map(|l| l.width()).reduce(f32::max).unwrap_or(0.0);
        for line in &mut lines {
            line.indentation = line.bbox.x - left;
            line.alignment = if max_width > 0.0 && line.width() >= max_width * self.config.justified_ratio {
                LineAlignment::Justified
            } else {
                LineAlignment::Left
            };
        }

        Some(ReadingSection {
            index: 0,
            section_type: SectionType::Column,
            column_index: Some(column_index),
            bbox: BBox::union_all(lines.iter().map(|l| l.bbox)),
            lines,
        })
    }

    /// Order sections top to bottom, grouping vertically overlapping ones
    /// into rows read left to right (right to left for RTL pages).
    fn order_sections(
        &self,
        sections: &mut Vec<ReadingSection>,
        direction: ReadingDirection,
        coords: CoordinateSystem,
    ) {
        sections.sort_by(|a, b| {
            top_key(&a.bbox, coords)
                .total_cmp(&top_key(&b.bbox, coords))
                .then(a.bbox.x.total_cmp(&b.bbox.x))
        });

        let mut rows: Vec<Vec<ReadingSection>> = Vec::new();
        for section in sections.drain(..) {
            let joins = rows
                .last()
                .map(|row| {
                    row.iter()
                        .any(|s| overlap_ratio(&s.bbox, &section.bbox) > self.config.row_overlap_ratio)
                })
                .unwrap_or(false);
            match rows.last_mut() {
                Some(row) if joins => row.push(section),
                _ => rows.push(vec![section]),
            }
        }

        for mut row in rows {
            match direction {
                ReadingDirection::Ltr => row.sort_by(|a, b| a.bbox.x.total_cmp(&b.bbox.x)),
                ReadingDirection::Rtl => {
                    row.sort_by(|a, b| b.bbox.right().total_cmp(&a.bbox.right()))
                }
            }
            sections.extend(row);
        }

        // A spanning section level with the column section before it is read first
        let tolerance = self.config.spanning_priority_tolerance;
        for i in 1..sections.len() {
            let mut j = i;
            while j > 0
                && sections[j].is_spanning()
                && !sections[j - 1].is_spanning()
                && (sections[j].bbox.top() - sections[j - 1].bbox.top()).abs() <= tolerance
            {
                sections.swap(j, j - 1);
                j -= 1;
            }
        }
    }
}

impl Default for ReadingOrderDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Majority vote over fragment directions (ties read left to right).
pub fn detect_direction(fragments: &[TextFragment]) -> ReadingDirection {
    let mut ltr = 0usize;
    let mut rtl = 0usize;
    for fragment in fragments {
        match fragment.resolved_direction() {
            TextDirection::Rtl => rtl += 1,
            TextDirection::Ltr => ltr += 1,
            _ => {}
        }
    }
    if rtl > ltr {
        ReadingDirection::Rtl
    } else {
        ReadingDirection::Ltr
    }
}

/// Decide whether Y grows upward (standard) or downward (inverted).
///
/// Content reaching above half the page height is standard. Content
/// confined to the lowest 30% and starting near zero is taken as inverted
/// (a top-anchored page). Anything else stays standard.
pub fn detect_coordinate_system(fragments: &[TextFragment], page_height: f32) -> CoordinateSystem {
    if page_height <= 0.0 || fragments.is_empty() {
        return CoordinateSystem::Standard;
    }
    let max_y = fragments.iter().map(|f| f.y).reduce(f32::max).unwrap_or(0.0);
    let min_y = fragments.iter().map(|f| f.y).reduce(f32::min).unwrap_or(0.0);

    if max_y > page_height * 0.5 {
        CoordinateSystem::Standard
    } else if max_y < page_height * 0.3 && min_y <= page_height * 0.05 {
        CoordinateSystem::Inverted
    } else {
        CoordinateSystem::Standard
    }
}

/// Sort key that increases down the page.
fn top_key(bbox: &BBox, coords: CoordinateSystem) -> f32 {
    match coords {
        CoordinateSystem::Standard => -bbox.top(),
        CoordinateSystem::Inverted => bbox.y,
    }
}

/// Check if `upper` lies entirely above `lower` on the page.
fn is_above(upper: &BBox, lower: &BBox, coords: CoordinateSystem) -> bool {
    match coords {
        CoordinateSystem::Standard => upper.center_y() > lower.top(),
        CoordinateSystem::Inverted => upper.center_y() < lower.y,
    }
}

/// Vertical overlap as a fraction of the shorter box's height.
fn overlap_ratio(a: &BBox, b: &BBox) -> f32 {
    let shorter = a.height.min(b.height);
    if shorter <= 0.0 {
        return 0.0;
    }
    a.vertical_overlap(b) / shorter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f32, y: f32, width: f32) -> TextFragment {
        TextFragment::new(text, x, y, width, 12.0)
    }

    fn two_columns_with_title() -> Vec<TextFragment> {
        let mut fragments = vec![frag("A Title Across Both Columns", 150.0, 750.0, 300.0)];
        for i in 0..30 {
            let y = 720.0 - i as f32 * 14.0;
            fragments.push(frag(&format!("left {}", i), 72.0, y, 220.0));
            fragments.push(frag(&format!("right {}", i), 320.0, y, 220.0));
        }
        fragments
    }

    #[test]
    fn test_single_column_one_section() {
        let fragments = vec![frag("one", 72.0, 700.0, 100.0), frag("two", 72.0, 686.0, 100.0)];
        let layout = ReadingOrderDetector::new().detect(&fragments, 612.0, 792.0);
        assert_eq!(layout.section_count(), 1);
        assert_eq!(layout.text(), "one\ntwo");
        assert_eq!(layout.coordinate_system, CoordinateSystem::Standard);
    }

    #[test]
    fn test_title_then_columns() {
        let layout = ReadingOrderDetector::new().detect(&two_columns_with_title(), 612.0, 792.0);
        assert_eq!(layout.section_count(), 3);
        assert!(layout.sections[0].is_spanning());
        assert_eq!(layout.sections[0].text(), "A Title Across Both Columns");
        assert!(layout.sections[1].text().starts_with("left 0"));
        assert!(layout.sections[2].text().starts_with("right 0"));
        assert_eq!(layout.line_count(), 61);
    }

    #[test]
    fn test_rtl_orders_right_column_first() {
        let config = ReadingOrderConfig {
            direction: Some(ReadingDirection::Rtl),
            ..Default::default()
        };
        let layout =
            ReadingOrderDetector::with_config(config).detect(&two_columns_with_title(), 612.0, 792.0);
        assert!(layout.sections[1].text().starts_with("right 0"));
    }

    #[test]
    fn test_column_lines_normalized() {
        let layout = ReadingOrderDetector::new().detect(&two_columns_with_title(), 612.0, 792.0);
        let right = &layout.sections[2];
        assert_eq!(right.lines[0].indentation, 0.0);
        assert_eq!(right.lines[0].alignment, LineAlignment::Justified);
        assert_eq!(right.lines[0].spacing_before, 0.0);
    }

    #[test]
    fn test_detect_coordinate_system() {
        let standard = vec![frag("a", 72.0, 700.0, 10.0)];
        assert_eq!(detect_coordinate_system(&standard, 792.0), CoordinateSystem::Standard);
        let inverted = vec![frag("a", 72.0, 10.0, 10.0), frag("b", 72.0, 200.0, 10.0)];
        assert_eq!(detect_coordinate_system(&inverted, 792.0), CoordinateSystem::Inverted);
        let ambiguous = vec![frag("a", 72.0, 120.0, 10.0), frag("b", 72.0, 300.0, 10.0)];
        assert_eq!(detect_coordinate_system(&ambiguous, 792.0), CoordinateSystem::Standard);
        assert_eq!(detect_coordinate_system(&[], 792.0), CoordinateSystem::Standard);
    }

    #[test]
    fn test_detect_direction() {
        let fragments = vec![
            TextFragment::new("שלום", 72.0, 700.0, 40.0, 12.0).with_direction(TextDirection::Unknown),
            TextFragment::new("עולם", 120.0, 700.0, 40.0, 12.0).with_direction(TextDirection::Rtl),
            TextFragment::new("ok", 170.0, 700.0, 20.0, 12.0),
        ];
        assert_eq!(detect_direction(&fragments), ReadingDirection::Rtl);
        assert_eq!(detect_direction(&[]), ReadingDirection::Ltr);
    }

    #[test]
    fn test_empty_page() {
        let layout = ReadingOrderDetector::new().detect(&[], 612.0, 792.0);
        assert!(layout.is_empty());
        assert_eq!(layout.text(), "");
        assert_eq!(layout.columns.column_count(), 1);
    }

    #[test]
    fn test_spanning_section_level_with_column_read_first() {
        let mut fragments = vec![
            frag("Side note", 72.0, 693.0, 150.0),
            frag("A banner line across the whole text block", 72.0, 688.0, 468.0),
        ];
        for i in 0..30 {
            let y = 650.0 - i as f32 * 14.0;
            fragments.push(frag(&format!("left {}", i), 72.0, y, 220.0));
            fragments.push(frag(&format!("right {}", i), 320.0, y, 220.0));
        }
        let layout = ReadingOrderDetector::new().detect(&fragments, 612.0, 792.0);

        assert_eq!(layout.columns.column_count(), 2);
        assert_eq!(layout.section_count(), 4);
        assert!(layout.sections[0].is_spanning());
        assert_eq!(layout.sections[0].text(), "A banner line across the whole text block");
        assert_eq!(layout.sections[1].text(), "Side note");
        assert!(layout.sections[2].text().starts_with("left 0"));
        assert!(layout.sections[3].text().starts_with("right 0"));
    }
}
