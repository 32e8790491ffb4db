//! Line detection: grouping fragments that share a Y band.
//!
//! The Y tolerance adapts to the page. Producers that compress the content
//! transform place visually distinct lines a fraction of a point apart while
//! still reporting 10-12pt glyph heights, so a fixed fraction of the font
//! height would fuse whole paragraphs into one line.

use serde::{Deserialize, Serialize};

use super::patterns::is_spaceless_script_char;
use crate::model::{BBox, TextDirection, TextFragment};

/// Default line spacing when a page offers no measurable gap.
pub(crate) const DEFAULT_LINE_SPACING: f32 = 12.0;

/// Vertical orientation of page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    /// PDF convention: Y=0 at the bottom, larger Y is higher on the page
    #[default]
    Standard,
    /// Y=0 at the top, larger Y is lower on the page
    Inverted,
}

/// Horizontal alignment of a line relative to the page content area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineAlignment {
    Left,
    Center,
    Right,
    Justified,
    #[default]
    Unknown,
}

/// Line detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineDetectorConfig {
    /// Y tolerance as a fraction of the average fragment height
    pub line_height_tolerance: f32,
    /// Distance (points) within which a line edge counts as aligned to a margin
    pub alignment_tolerance: f32,
    /// Width ratio against the widest line above which a line is justified
    pub justification_threshold: f32,
    /// Horizontal gap, as a fraction of fragment height, that inserts a space
    pub space_gap_ratio: f32,
    /// X tolerance (fraction of font size) for keeping stream order
    pub stream_order_tolerance: f32,
    /// Smallest Y tolerance used for compressed coordinates (points)
    pub min_compressed_tolerance: f32,
}

impl Default for LineDetectorConfig {
    fn default() -> Self {
        Self {
            line_height_tolerance: 0.5,
            alignment_tolerance: 10.0,
            justification_threshold: 0.9,
            space_gap_ratio: 0.1,
            stream_order_tolerance: 0.15,
            min_compressed_tolerance: 0.15,
        }
    }
}

/// A line of text composed of fragments on the same Y band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    /// Position of the line within its layout
    pub index: usize,
    /// Fragments in reading order (left to right)
    pub fragments: Vec<TextFragment>,
    /// Bounding box of all fragments
    pub bbox: BBox,
    /// Lowest fragment Y
    pub baseline: f32,
    /// Tallest fragment height
    pub height: f32,
    /// Mean font size of the fragments
    pub average_font_size: f32,
    /// Assembled text with inferred word spaces
    pub text: String,
    /// Majority direction of the fragments
    pub direction: TextDirection,
    /// Alignment against the page (or section) margins
    pub alignment: LineAlignment,
    /// Left offset used for indentation analysis
    pub indentation: f32,
    /// Vertical gap to the previous line (0 for the first line)
    pub spacing_before: f32,
    /// Vertical gap to the next line (0 for the last line)
    pub spacing_after: f32,
}

impl Line {
    /// Build a line from fragments that already share a Y band.
    pub fn from_fragments(fragments: Vec<TextFragment>) -> Self {
        Self::build(fragments, &LineDetectorConfig::default())
    }

    fn build(fragments: Vec<TextFragment>, config: &LineDetectorConfig) -> Self {
        let fragments = order_fragments(fragments, config.stream_order_tolerance);
        let bbox = BBox::union_all(fragments.iter().map(|f| f.bbox()));
        let baseline = fragments
            .iter()
            .map(|f| f.y)
            .reduce(f32::min)
            .unwrap_or(0.0);
        let height = fragments
            .iter()
            .map(|f| f.effective_height())
            .reduce(f32::max)
            .unwrap_or(0.0);
        let average_font_size = if fragments.is_empty() {
            0.0
        } else {
            fragments
                .iter()
                .map(|f| f.effective_font_size())
                .sum::<f32>()
                / fragments.len() as f32
        };
        let text = assemble_text(&fragments, config.space_gap_ratio);
        let direction = dominant_direction(&fragments);

        Self {
            index: 0,
            fragments,
            bbox,
            baseline,
            height,
            average_font_size,
            text,
            direction,
            alignment: LineAlignment::Unknown,
            indentation: bbox.x,
            spacing_before: 0.0,
            spacing_after: 0.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.bbox.width
    }

    /// Number of fragments in the line.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Check if the line is predominantly bold.
    pub fn is_bold(&self) -> bool {
        weighted_ratio(&self.fragments, TextFragment::is_bold) > 0.5
    }

    /// Check if the line is predominantly italic.
    pub fn is_italic(&self) -> bool {
        weighted_ratio(&self.fragments, TextFragment::is_italic) > 0.5
    }

    /// Check if every fragment uses a monospace font.
    pub fn is_monospace(&self) -> bool {
        !self.fragments.is_empty() && self.fragments.iter().all(|f| f.is_monospace())
    }
}

/// Share of characters (by byte length) whose fragment satisfies `pred`.
fn weighted_ratio(fragments: &[TextFragment], pred: fn(&TextFragment) -> bool) -> f32 {
    let total: usize = fragments.iter().map(|f| f.text.len()).sum();
    if total == 0 {
        return 0.0;
    }
    let matching: usize = fragments
        .iter()
        .filter(|f| pred(f))
        .map(|f| f.text.len())
        .sum();
    matching as f32 / total as f32
}

/// Lines detected on a page or section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineLayout {
    /// Lines from top to bottom
    pub lines: Vec<Line>,
    pub page_width: f32,
    pub page_height: f32,
    /// Y tolerance used to group fragments
    pub tolerance: f32,
    /// Leftmost line edge
    pub left_margin: f32,
    /// Rightmost line edge
    pub right_margin: f32,
    /// Width of the widest line
    pub max_line_width: f32,
}

impl LineLayout {
    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Get a line by index.
    pub fn get_line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Check if no lines were detected.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line texts joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Mean of the positive gaps between consecutive lines.
    pub fn average_line_spacing(&self) -> f32 {
        average_positive_spacing(&self.lines)
    }

    /// Mean line height.
    pub fn average_line_height(&self) -> f32 {
        if self.lines.is_empty() {
            return 0.0;
        }
        self.lines.iter().map(|l| l.height).sum::<f32>() / self.lines.len() as f32
    }

    /// Lines whose vertical range intersects `[min_y, max_y]`.
    pub fn lines_in_range(&self, min_y: f32, max_y: f32) -> Vec<&Line> {
        self.lines
            .iter()
            .filter(|l| l.bbox.top() >= min_y && l.bbox.y <= max_y)
            .collect()
    }
}

/// Mean of the positive `spacing_before` values, or the default spacing.
pub(crate) fn average_positive_spacing(lines: &[Line]) -> f32 {
    let spacings: Vec<f32> = lines
        .iter()
        .skip(1)
        .map(|l| l.spacing_before)
        .filter(|s| *s > 0.0)
        .collect();
    if spacings.is_empty() {
        DEFAULT_LINE_SPACING
    } else {
        spacings.iter().sum::<f32>() / spacings.len() as f32
    }
}

/// Groups fragments into lines.
pub struct LineDetector {
    config: LineDetectorConfig,
}

impl LineDetector {
    /// Create a new line detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: LineDetectorConfig::default(),
        }
    }

    /// Create a new line detector with custom configuration.
    pub fn with_config(config: LineDetectorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &LineDetectorConfig {
        &self.config
    }

    /// Detect lines on a page.
    ///
    /// Fragments are re-sorted internally; whitespace-only fragments are
    /// ignored. Lines come back top to bottom in the standard convention.
    pub fn detect(&self, fragments: &[TextFragment], page_width: f32, page_height: f32) -> LineLayout {
        let lines = self.group_lines(fragments);
        let mut layout = LineLayout {
            lines,
            page_width,
            page_height,
            tolerance: self.compute_tolerance(fragments),
            ..Default::default()
        };
        compute_spacing(&mut layout.lines, CoordinateSystem::Standard);
        self.assign_alignment(&mut layout);
        log::debug!(
            "LineDetector: {} fragments -> {} lines (tolerance {:.2})",
            fragments.len(),
            layout.lines.len(),
            layout.tolerance
        );
        layout
    }

    /// Group fragments into lines without computing page-level metrics.
    pub fn group_lines(&self, fragments: &[TextFragment]) -> Vec<Line> {
        let mut indexed: Vec<(usize, &TextFragment)> = fragments
            .iter()
            .filter(|f| !f.text.trim().is_empty())
            .enumerate()
            .collect();
        if indexed.is_empty() {
            return vec![];
        }
        let tolerance = self.compute_tolerance(fragments);

        // Stable: equal Y keeps stream order
        indexed.sort_by(|a, b| b.1.y.total_cmp(&a.1.y));

        let mut groups: Vec<Vec<(usize, &TextFragment)>> = Vec::new();
        let mut current: Vec<(usize, &TextFragment)> = Vec::new();
        let mut sum_y = 0.0f32;

        for item in indexed {
            if !current.is_empty() {
                let avg_y = sum_y / current.len() as f32;
                if (item.1.y - avg_y).abs() > tolerance {
                    groups.push(std::mem::take(&mut current));
                    sum_y = 0.0;
                }
            }
            sum_y += item.1.y;
            current.push(item);
        }
        if !current.is_empty() {
            groups.push(current);
        }

        groups
            .into_iter()
            .enumerate()
            .map(|(i, mut group)| {
                // Back to stream order before deciding how to order by X
                group.sort_by_key(|(idx, _)| *idx);
                let fragments = group.into_iter().map(|(_, f)| f.clone()).collect();
                let mut line = Line::build(fragments, &self.config);
                line.index = i;
                line
            })
            .collect()
    }

    /// Compute the Y tolerance for grouping a fragment set.
    ///
    /// Normally `avg_height * line_height_tolerance`. When the gaps between
    /// distinct Y positions are tiny compared to the reported heights (even
    /// the 90th percentile gap is below half a glyph height), the page uses
    /// a compressed transform and the tolerance drops to 20% of the
    /// 10th-percentile gap.
    pub fn compute_tolerance(&self, fragments: &[TextFragment]) -> f32 {
        let heights: Vec<f32> = fragments
            .iter()
            .map(|f| f.effective_height())
            .filter(|h| *h > 0.0)
            .collect();
        let avg_height = if heights.is_empty() {
            DEFAULT_LINE_SPACING
        } else {
            heights.iter().sum::<f32>() / heights.len() as f32
        };
        let default_tolerance = avg_height * self.config.line_height_tolerance;

        let mut ys: Vec<i64> = fragments
            .iter()
            .filter(|f| f.y.is_finite())
            .map(|f| (f.y * 10.0).round() as i64)
            .collect();
        ys.sort_unstable();
        ys.dedup();
        if ys.len() < 3 {
            return default_tolerance;
        }

        let mut gaps: Vec<f32> = ys.windows(2).map(|w| (w[1] - w[0]) as f32 / 10.0).collect();
        gaps.sort_by(f32::total_cmp);
        let p10 = gaps[gaps.len() / 10];
        let p90 = gaps[(gaps.len() * 9 / 10).min(gaps.len() - 1)];

        if p90 < avg_height * 0.5 && p10 < avg_height * 0.25 {
            let tight = (p10 * 0.2).max(self.config.min_compressed_tolerance);
            log::debug!(
                "LineDetector: compressed coordinates (p10 gap {:.2}, p90 gap {:.2}, avg height {:.2}), tolerance {:.2}",
                p10,
                p90,
                avg_height,
                tight
            );
            return tight;
        }
        default_tolerance
    }

    fn assign_alignment(&self, layout: &mut LineLayout) {
        if layout.lines.is_empty() {
            return;
        }
        layout.left_margin = layout
            .lines
            .iter()
            .map(|l| l.bbox.x)
            .reduce(f32::min)
            .unwrap_or(0.0);
        layout.right_margin = layout
            .lines
            .iter()
            .map(|l| l.bbox.right())
            .reduce(f32::max)
            .unwrap_or(0.0);
        layout.max_line_width = layout
            .lines
            .iter()
            .map(|l| l.bbox.width)
            .reduce(f32::max)
            .unwrap_or(0.0);

        for line in &mut layout.lines {
            line.alignment = classify_alignment(
                &line.bbox,
                layout.left_margin,
                layout.right_margin,
                layout.max_line_width,
                &self.config,
            );
        }
    }
}

impl Default for LineDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a line box against page-wide margins.
pub(crate) fn classify_alignment(
    bbox: &BBox,
    left_margin: f32,
    right_margin: f32,
    max_width: f32,
    config: &LineDetectorConfig,
) -> LineAlignment {
    if max_width <= 0.0 {
        return LineAlignment::Unknown;
    }
    let tolerance = config.alignment_tolerance;
    let content_center = (left_margin + right_margin) / 2.0;

    if bbox.width >= max_width * config.justification_threshold {
        LineAlignment::Justified
    } else if (bbox.x - left_margin).abs() <= tolerance {
        LineAlignment::Left
    } else if (bbox.center_x() - content_center).abs() <= tolerance {
        LineAlignment::Center
    } else if (bbox.right() - right_margin).abs() <= tolerance {
        LineAlignment::Right
    } else {
        LineAlignment::Unknown
    }
}

/// Vertical gap between two consecutive lines under a coordinate system.
pub(crate) fn vertical_gap(upper: &BBox, lower: &BBox, coords: CoordinateSystem) -> f32 {
    match coords {
        CoordinateSystem::Standard => upper.y - lower.top(),
        CoordinateSystem::Inverted => lower.y - upper.top(),
    }
}

/// Recompute `spacing_before` / `spacing_after` for lines already in
/// reading order, and renumber them.
pub fn compute_spacing(lines: &mut [Line], coords: CoordinateSystem) {
    for i in 0..lines.len() {
        lines[i].index = i;
        lines[i].spacing_before = 0.0;
        lines[i].spacing_after = 0.0;
    }
    for i in 1..lines.len() {
        let gap = vertical_gap(&lines[i - 1].bbox, &lines[i].bbox, coords);
        lines[i].spacing_before = gap;
        lines[i - 1].spacing_after = gap;
    }
}

/// Put lines in top-to-bottom order for the given coordinate system and
/// recompute their spacing.
pub fn reorder_lines(lines: &mut [Line], coords: CoordinateSystem) {
    match coords {
        CoordinateSystem::Standard => lines.sort_by(|a, b| b.bbox.y.total_cmp(&a.bbox.y)),
        CoordinateSystem::Inverted => lines.sort_by(|a, b| a.bbox.y.total_cmp(&b.bbox.y)),
    }
    compute_spacing(lines, coords);
}

/// Order a line's fragments left to right.
///
/// Some producers emit overlapping glyph runs whose X positions disagree
/// slightly with the intended order; when stream order already runs left to
/// right within `fontSize * tolerance`, it is kept as is.
pub(crate) fn order_fragments(mut fragments: Vec<TextFragment>, tolerance: f32) -> Vec<TextFragment> {
    let stream_ordered = fragments.windows(2).all(|w| {
        let slack = w[0].effective_font_size().max(w[1].effective_font_size()) * tolerance;
        w[1].x >= w[0].x - slack
    });
    if !stream_ordered {
        fragments.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    fragments
}

/// Join fragment texts, inserting a space where the horizontal gap exceeds
/// `gap_ratio` of the fragment height.
///
/// No space goes between two characters of scripts that do not use word
/// spaces, or next to existing whitespace.
pub(crate) fn assemble_text(fragments: &[TextFragment], gap_ratio: f32) -> String {
    let mut result = String::new();
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            let prev = &fragments[i - 1];
            let gap = fragment.x - prev.right();
            let threshold = fragment.effective_height() * gap_ratio;

            let prev_last = prev.text.chars().last();
            let curr_first = fragment.text.chars().next();
            let both_spaceless = prev_last.map(is_spaceless_script_char).unwrap_or(false)
                && curr_first.map(is_spaceless_script_char).unwrap_or(false);
            let has_space = prev_last.map(char::is_whitespace).unwrap_or(true)
                || curr_first.map(char::is_whitespace).unwrap_or(true);

            if gap > threshold && !both_spaceless && !has_space {
                result.push(' ');
            }
        }
        result.push_str(&fragment.text);
    }
    result.trim().to_string()
}

/// Majority direction of a fragment set (ties go to LTR).
pub(crate) fn dominant_direction(fragments: &[TextFragment]) -> TextDirection {
    let mut ltr = 0usize;
    let mut rtl = 0usize;
    let mut ttb = 0usize;
    for f in fragments {
        match f.resolved_direction() {
            TextDirection::Ltr => ltr += 1,
            TextDirection::Rtl => rtl += 1,
            TextDirection::Ttb => ttb += 1,
            TextDirection::Unknown => {}
        }
    }
    if rtl > ltr && rtl >= ttb {
        TextDirection::Rtl
    } else if ttb > ltr && ttb > rtl {
        TextDirection::Ttb
    } else {
        TextDirection::Ltr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f32, y: f32, width: f32) -> TextFragment {
        TextFragment::new(text, x, y, width, 12.0)
    }

    #[test]
    fn test_groups_by_y_band() {
        let fragments = vec![
            frag("world", 110.0, 700.0, 30.0),
            frag("Hello", 72.0, 700.5, 35.0),
            frag("Next", 72.0, 686.0, 25.0),
        ];
        let layout = LineDetector::new().detect(&fragments, 612.0, 792.0);
        assert_eq!(layout.line_count(), 2);
        assert_eq!(layout.lines[0].text, "Hello world");
        assert_eq!(layout.lines[1].text, "Next");
        assert_eq!(layout.lines[0].baseline, 700.0);
    }

    #[test]
    fn test_space_insertion_threshold() {
        // Gap of 0.5pt is below 10% of 12pt height: no space
        let fragments = vec![frag("Hel", 72.0, 700.0, 18.0), frag("lo", 90.5, 700.0, 12.0)];
        let layout = LineDetector::new().detect(&fragments, 612.0, 792.0);
        assert_eq!(layout.lines[0].text, "Hello");
    }

    #[test]
    fn test_cjk_no_space() {
        let fragments = vec![frag("日本", 72.0, 700.0, 24.0), frag("語", 100.0, 700.0, 12.0)];
        let layout = LineDetector::new().detect(&fragments, 612.0, 792.0);
        assert_eq!(layout.lines[0].text, "日本語");
    }

    #[test]
    fn test_spacing_symmetry() {
        let fragments = vec![
            frag("a", 72.0, 700.0, 100.0),
            frag("b", 72.0, 686.0, 100.0),
            frag("c", 72.0, 660.0, 100.0),
        ];
        let layout = LineDetector::new().detect(&fragments, 612.0, 792.0);
        assert_eq!(layout.lines[0].spacing_before, 0.0);
        for i in 1..layout.lines.len() {
            assert_eq!(
                layout.lines[i].spacing_before,
                layout.lines[i - 1].spacing_after
            );
        }
        assert!((layout.lines[1].spacing_before - 2.0).abs() < 1e-3);
        assert!((layout.lines[2].spacing_before - 14.0).abs() < 1e-3);
    }

    #[test]
    fn test_compressed_coordinates_use_tight_tolerance() {
        // Lines 1.2pt apart with 12pt glyph heights
        let fragments: Vec<TextFragment> = (0..10)
            .map(|i| frag(&format!("line{}", i), 72.0, 100.0 - i as f32 * 1.2, 50.0))
            .collect();
        let detector = LineDetector::new();
        let tolerance = detector.compute_tolerance(&fragments);
        assert!(tolerance < 1.0);
        let layout = detector.detect(&fragments, 612.0, 792.0);
        assert_eq!(layout.line_count(), 10);
    }

    #[test]
    fn test_normal_tolerance() {
        let fragments: Vec<TextFragment> = (0..10)
            .map(|i| frag("text", 72.0, 700.0 - i as f32 * 14.0, 50.0))
            .collect();
        let tolerance = LineDetector::new().compute_tolerance(&fragments);
        assert!((tolerance - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_stream_order_preserved_for_overlapping_runs() {
        // Second run starts 1pt left of the first; stream order wins
        let fragments = vec![frag("ab", 72.0, 700.0, 10.0), frag("cd", 71.0, 700.0, 10.0)];
        let ordered = order_fragments(fragments, 0.15);
        assert_eq!(ordered[0].text, "ab");

        let fragments = vec![frag("cd", 150.0, 700.0, 10.0), frag("ab", 72.0, 700.0, 10.0)];
        let ordered = order_fragments(fragments, 0.15);
        assert_eq!(ordered[0].text, "ab");
    }

    #[test]
    fn test_alignment_classification() {
        let fragments = vec![
            frag("Full width line of body text", 72.0, 700.0, 468.0),
            frag("Centered", 276.0, 686.0, 60.0),
            frag("Short left", 72.0, 672.0, 80.0),
            frag("Right", 500.0, 658.0, 40.0),
        ];
        let layout = LineDetector::new().detect(&fragments, 612.0, 792.0);
        let alignments: Vec<LineAlignment> = layout.lines.iter().map(|l| l.alignment).collect();
        assert_eq!(
            alignments,
            vec![
                LineAlignment::Justified,
                LineAlignment::Center,
                LineAlignment::Left,
                LineAlignment::Right
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let layout = LineDetector::new().detect(&[], 612.0, 792.0);
        assert_eq!(layout.line_count(), 0);
        assert_eq!(layout.text(), "");
        assert_eq!(layout.average_line_spacing(), DEFAULT_LINE_SPACING);
    }

    #[test]
    fn test_inverted_reorder() {
        let fragments = vec![frag("top", 72.0, 50.0, 30.0), frag("bottom", 72.0, 80.0, 30.0)];
        let mut lines = LineDetector::new().group_lines(&fragments);
        reorder_lines(&mut lines, CoordinateSystem::Inverted);
        assert_eq!(lines[0].text, "top");
        assert!((lines[1].spacing_before - 18.0).abs() < 1e-3);
    }
}
