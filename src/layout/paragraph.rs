//! Paragraph detection: grouping ordered lines and classifying their style.

use serde::{Deserialize, Serialize};

use super::line::{average_positive_spacing, Line, LineAlignment};
use super::patterns::is_list_item_text;
use super::reading_order::ReadingOrderLayout;
use crate::model::BBox;

/// Bucket size (points) for the left-margin mode.
const MARGIN_BUCKET: f32 = 5.0;

/// Visual role of a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphStyle {
    #[default]
    Normal,
    Heading,
    BlockQuote,
    ListItem,
    Code,
    Caption,
}

impl ParagraphStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParagraphStyle::Normal => "normal",
            ParagraphStyle::Heading => "heading",
            ParagraphStyle::BlockQuote => "blockquote",
            ParagraphStyle::ListItem => "listitem",
            ParagraphStyle::Code => "code",
            ParagraphStyle::Caption => "caption",
        }
    }
}

/// Paragraph detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphDetectorConfig {
    /// A gap above this multiple of the average line spacing breaks a paragraph
    pub spacing_threshold: f32,
    /// Font-size ratio that breaks a paragraph and marks heading candidates
    pub heading_font_size_ratio: f32,
    /// Indentation (points) that marks a first-line indent
    pub indent_threshold: f32,
    /// Extra left offset (points) for a block quote
    pub block_quote_indent: f32,
    /// A previous line narrower than this fraction of the opening line ends
    /// the paragraph
    pub short_line_ratio: f32,
    /// Font-size ratio below which a short centered paragraph is a caption
    pub caption_font_size_ratio: f32,
    /// Longest paragraph (lines) that may be styled as a heading
    pub max_heading_lines: usize,
    /// Longest paragraph (lines) that may be styled as a caption
    pub max_caption_lines: usize,
}

impl Default for ParagraphDetectorConfig {
    fn default() -> Self {
        Self {
            spacing_threshold: 1.5,
            heading_font_size_ratio: 1.2,
            indent_threshold: 15.0,
            block_quote_indent: 30.0,
            short_line_ratio: 0.7,
            caption_font_size_ratio: 0.9,
            max_heading_lines: 3,
            max_caption_lines: 2,
        }
    }
}

/// A run of consecutive lines forming one paragraph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub index: usize,
    pub lines: Vec<Line>,
    pub bbox: BBox,
    /// Lines joined with spaces (no space after a hyphenated line end)
    pub text: String,
    pub style: ParagraphStyle,
    /// Most common line alignment
    pub alignment: LineAlignment,
    /// Offset of the first line against the paragraph's leftmost line
    pub first_line_indent: f32,
    /// Smallest line indentation
    pub left_indent: f32,
    pub average_font_size: f32,
    /// Mean gap between the paragraph's own lines
    pub line_spacing: f32,
    /// Gap to the previous paragraph (0 for the first one in a section)
    pub spacing_before: f32,
}

impl Paragraph {
    fn from_lines(lines: Vec<Line>) -> Self {
        let bbox = BBox::union_all(lines.iter().map(|l| l.bbox));
        let text = join_lines(&lines);
        let left_indent = lines
            .iter()
            .map(|l| l.indentation)
            .reduce(f32::min)
            .unwrap_or(0.0);
        let first_line_indent = lines
            .first()
            .map(|l| l.indentation - left_indent)
            .unwrap_or(0.0);
        let average_font_size = if lines.is_empty() {
            0.0
        } else {
            lines.iter().map(|l| l.average_font_size).sum::<f32>() / lines.len() as f32
        };
        let line_spacing = if lines.len() > 1 {
            lines[1..].iter().map(|l| l.spacing_before).sum::<f32>() / (lines.len() - 1) as f32
        } else {
            0.0
        };
        let spacing_before = lines.first().map(|l| l.spacing_before).unwrap_or(0.0);

        Self {
            index: 0,
            alignment: dominant_alignment(&lines),
            lines,
            bbox,
            text,
            style: ParagraphStyle::Normal,
            first_line_indent,
            left_indent,
            average_font_size,
            line_spacing,
            spacing_before,
        }
    }

    /// Number of lines in the paragraph.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn first_line(&self) -> Option<&Line> {
        self.lines.first()
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn is_heading(&self) -> bool {
        self.style == ParagraphStyle::Heading
    }

    pub fn is_list_item(&self) -> bool {
        self.style == ParagraphStyle::ListItem
    }

    /// Check if the paragraph is predominantly bold.
    pub fn is_bold(&self) -> bool {
        let bold = self.lines.iter().filter(|l| l.is_bold()).count();
        !self.lines.is_empty() && bold * 2 > self.lines.len()
    }
}

/// Paragraphs detected on a page, in reading order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParagraphLayout {
    pub paragraphs: Vec<Paragraph>,
    /// Mean positive line spacing of the input
    pub average_line_spacing: f32,
    /// Mean line font size of the input
    pub average_font_size: f32,
    /// Most common line indentation
    pub left_margin: f32,
}

impl ParagraphLayout {
    /// Get the number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Get a paragraph by index.
    pub fn get_paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Paragraphs with the given style.
    pub fn paragraphs_with_style(&self, style: ParagraphStyle) -> Vec<&Paragraph> {
        self.paragraphs.iter().filter(|p| p.style == style).collect()
    }

    /// Paragraph texts separated by blank lines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Page-wide statistics that paragraph breaks and styles are judged against.
struct LineStats {
    average_spacing: f32,
    average_font_size: f32,
    left_margin: f32,
}

impl LineStats {
    fn collect(groups: &[&[Line]]) -> Self {
        let mut spacings = Vec::new();
        let mut font_sizes = Vec::new();
        let mut indents = Vec::new();
        for group in groups {
            for (i, line) in group.iter().enumerate() {
                if i > 0 && line.spacing_before > 0.0 {
                    spacings.push(line.spacing_before);
                }
                if line.average_font_size > 0.0 {
                    font_sizes.push(line.average_font_size);
                }
                indents.push(line.indentation);
            }
        }

        let average_spacing = if spacings.is_empty() {
            average_positive_spacing(&[])
        } else {
            spacings.iter().sum::<f32>() / spacings.len() as f32
        };
        let average_font_size = if font_sizes.is_empty() {
            0.0
        } else {
            font_sizes.iter().sum::<f32>() / font_sizes.len() as f32
        };

        Self {
            average_spacing,
            average_font_size,
            left_margin: margin_mode(&indents),
        }
    }
}

/// Mean of the indentations in the most populated 5pt bucket (ties go to
/// the leftmost bucket).
fn margin_mode(indents: &[f32]) -> f32 {
    let mut buckets: Vec<(i64, usize, f32)> = Vec::new();
    for &indent in indents {
        let key = (indent / MARGIN_BUCKET).floor() as i64;
        match buckets.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) => {
                entry.1 += 1;
                entry.2 += indent;
            }
            None => buckets.push((key, 1, indent)),
        }
    }
    buckets
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(_, count, sum)| sum / count as f32)
        .unwrap_or(0.0)
}

/// Groups lines into paragraphs.
pub struct ParagraphDetector {
    config: ParagraphDetectorConfig,
}

impl ParagraphDetector {
    /// Create a new paragraph detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParagraphDetectorConfig::default(),
        }
    }

    /// Create a new paragraph detector with custom configuration.
    pub fn with_config(config: ParagraphDetectorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ParagraphDetectorConfig {
        &self.config
    }

    /// Detect paragraphs in lines that are already in reading order with
    /// spacing computed.
    pub fn detect(&self, lines: &[Line]) -> ParagraphLayout {
        self.detect_groups(&[lines])
    }

    /// Detect paragraphs section by section so that spacing is only
    /// compared within a section. Styles are judged against statistics of
    /// the whole page.
    pub fn detect_sections(&self, reading_order: &ReadingOrderLayout) -> ParagraphLayout {
        let groups: Vec<&[Line]> = reading_order
            .sections
            .iter()
            .map(|s| s.lines.as_slice())
            .collect();
        self.detect_groups(&groups)
    }

    fn detect_groups(&self, groups: &[&[Line]]) -> ParagraphLayout {
        let stats = LineStats::collect(groups);
        let mut paragraphs = Vec::new();

        for group in groups {
            for lines in self.split(group, &stats) {
                let mut paragraph = Paragraph::from_lines(lines);
                paragraph.style = self.classify(&paragraph, &stats);
                paragraphs.push(paragraph);
            }
        }
        for (i, paragraph) in paragraphs.iter_mut().enumerate() {
            paragraph.index = i;
        }

        log::debug!(
            "ParagraphDetector: {} paragraphs (avg spacing {:.2}, avg font {:.2}, margin {:.1})",
            paragraphs.len(),
            stats.average_spacing,
            stats.average_font_size,
            stats.left_margin
        );

        ParagraphLayout {
            paragraphs,
            average_line_spacing: stats.average_spacing,
            average_font_size: stats.average_font_size,
            left_margin: stats.left_margin,
        }
    }

    /// Fold the ordered lines into paragraph runs.
    fn split(&self, lines: &[Line], stats: &LineStats) -> Vec<Vec<Line>> {
        let mut runs: Vec<Vec<Line>> = Vec::new();
        let mut current: Vec<Line> = Vec::new();

        for line in lines {
            if let (Some(opening), Some(prev)) = (current.first(), current.last()) {
                if self.should_break(opening, prev, line, stats) {
                    runs.push(std::mem::take(&mut current));
                }
            }
            current.push(line.clone());
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    /// Determine if `line` starts a new paragraph after `prev`.
    fn should_break(&self, opening: &Line, prev: &Line, line: &Line, stats: &LineStats) -> bool {
        // Large spacing
        if line.spacing_before > stats.average_spacing * self.config.spacing_threshold {
            return true;
        }

        // Font size change in either direction
        let ratio = self.config.heading_font_size_ratio;
        if prev.average_font_size > 0.0 && line.average_font_size > 0.0 {
            let r = line.average_font_size / prev.average_font_size;
            if r > ratio || r < 1.0 / ratio {
                return true;
            }
        }

        if is_significant_alignment_change(prev.alignment, line.alignment) {
            return true;
        }

        // First-line indent signature
        let threshold = self.config.indent_threshold;
        if line.indentation - stats.left_margin > threshold
            && prev.indentation - stats.left_margin <= threshold
        {
            return true;
        }

        // Every list marker opens its own item
        if is_list_item_text(&line.text) {
            return true;
        }

        // A short previous line ends its paragraph
        if opening.width() > 0.0 && prev.width() < opening.width() * self.config.short_line_ratio {
            return true;
        }

        false
    }

    fn classify(&self, paragraph: &Paragraph, stats: &LineStats) -> ParagraphStyle {
        let avg_font = stats.average_font_size;
        let lines = paragraph.line_count();

        if avg_font > 0.0
            && paragraph.average_font_size >= avg_font * self.config.heading_font_size_ratio
            && lines <= self.config.max_heading_lines
        {
            return ParagraphStyle::Heading;
        }

        if paragraph
            .first_line()
            .map(|l| is_list_item_text(&l.text))
            .unwrap_or(false)
        {
            return ParagraphStyle::ListItem;
        }

        if paragraph.left_indent > stats.left_margin + self.config.block_quote_indent
            && paragraph.alignment != LineAlignment::Center
        {
            return ParagraphStyle::BlockQuote;
        }

        if avg_font > 0.0
            && paragraph.average_font_size < avg_font * self.config.caption_font_size_ratio
            && lines <= self.config.max_caption_lines
            && paragraph.alignment == LineAlignment::Center
        {
            return ParagraphStyle::Caption;
        }

        if paragraph.lines.iter().all(|l| l.is_monospace()) && lines > 0 {
            return ParagraphStyle::Code;
        }

        ParagraphStyle::Normal
    }
}

impl Default for ParagraphDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Center and right alignment are deliberate; moving between left and
/// justified is ordinary ragged text.
fn is_significant_alignment_change(prev: LineAlignment, curr: LineAlignment) -> bool {
    use LineAlignment::{Center, Right};
    prev != curr && (matches!(prev, Center | Right) || matches!(curr, Center | Right))
}

fn dominant_alignment(lines: &[Line]) -> LineAlignment {
    let mut counts: Vec<(LineAlignment, usize)> = Vec::new();
    for line in lines {
        match counts.iter_mut().find(|(a, _)| *a == line.alignment) {
            Some(entry) => entry.1 += 1,
            None => counts.push((line.alignment, 1)),
        }
    }
    // First seen wins ties
    let mut best: Option<(LineAlignment, usize)> = None;
    for (alignment, count) in counts {
        if best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((alignment, count));
        }
    }
    best.map(|(a, _)| a).unwrap_or_default()
}

/// Join line texts with spaces; a line ending in a hyphen runs straight
/// into the next one.
fn join_lines(lines: &[Line]) -> String {
    let mut text = String::new();
    for line in lines {
        let piece = line.text.trim();
        if piece.is_empty() {
            continue;
        }
        if !text.is_empty() && !text.ends_with('-') {
            text.push(' ');
        }
        text.push_str(piece);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::line::LineDetector;
    use crate::model::TextFragment;

    fn lines_of(fragments: &[TextFragment]) -> Vec<Line> {
        LineDetector::new().detect(fragments, 612.0, 792.0).lines
    }

    fn frag(text: &str, x: f32, y: f32, width: f32, size: f32) -> TextFragment {
        TextFragment::new(text, x, y, width, size)
    }

    #[test]
    fn test_single_paragraph() {
        let lines = lines_of(&[
            frag("The first line of a paragraph", 72.0, 700.0, 400.0, 12.0),
            frag("continues on the second line", 72.0, 686.0, 400.0, 12.0),
            frag("and ends on the third.", 72.0, 672.0, 400.0, 12.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);
        assert_eq!(layout.paragraph_count(), 1);
        assert_eq!(layout.paragraphs[0].line_count(), 3);
        assert_eq!(layout.paragraphs[0].style, ParagraphStyle::Normal);
    }

    #[test]
    fn test_spacing_breaks_paragraphs() {
        let lines = lines_of(&[
            frag("one", 72.0, 700.0, 400.0, 12.0),
            frag("two", 72.0, 686.0, 400.0, 12.0),
            frag("three", 72.0, 672.0, 400.0, 12.0),
            frag("four", 72.0, 630.0, 400.0, 12.0),
            frag("five", 72.0, 616.0, 400.0, 12.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);
        assert_eq!(layout.paragraph_count(), 2);
        assert_eq!(layout.paragraphs[1].text, "four five");
        assert!(layout.paragraphs[1].spacing_before > 20.0);
    }

    #[test]
    fn test_heading_style() {
        let lines = lines_of(&[
            frag("Introduction", 72.0, 700.0, 150.0, 24.0),
            frag("Body text line one", 72.0, 670.0, 400.0, 12.0),
            frag("Body text line two", 72.0, 656.0, 400.0, 12.0),
            frag("Body text line three", 72.0, 642.0, 400.0, 12.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);
        assert_eq!(layout.paragraph_count(), 2);
        assert_eq!(layout.paragraphs[0].style, ParagraphStyle::Heading);
        assert_eq!(layout.paragraphs[1].style, ParagraphStyle::Normal);
        assert_eq!(layout.paragraphs_with_style(ParagraphStyle::Heading).len(), 1);
    }

    #[test]
    fn test_list_items_split() {
        let lines = lines_of(&[
            frag("1. First", 72.0, 700.0, 100.0, 12.0),
            frag("2. Second", 72.0, 686.0, 100.0, 12.0),
            frag("3. Third", 72.0, 672.0, 100.0, 12.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);
        assert_eq!(layout.paragraph_count(), 3);
        assert!(layout.paragraphs.iter().all(|p| p.is_list_item()));
    }

    #[test]
    fn test_hyphenated_join() {
        let lines = lines_of(&[
            frag("a hyphen-", 72.0, 700.0, 400.0, 12.0),
            frag("ated word", 72.0, 686.0, 400.0, 12.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);
        assert_eq!(layout.paragraphs[0].text, "a hyphen-ated word");
    }

    #[test]
    fn test_short_line_ends_paragraph() {
        let lines = lines_of(&[
            frag("A long opening line of body text", 72.0, 700.0, 400.0, 12.0),
            frag("short end.", 72.0, 686.0, 100.0, 12.0),
            frag("Next paragraph begins here at full width", 72.0, 672.0, 400.0, 12.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);
        assert_eq!(layout.paragraph_count(), 2);
        assert_eq!(layout.paragraphs[0].line_count(), 2);
    }

    #[test]
    fn test_first_line_indent_breaks() {
        let lines = lines_of(&[
            frag("body line one", 72.0, 700.0, 400.0, 12.0),
            frag("body line two", 72.0, 686.0, 400.0, 12.0),
            frag("Indented opening", 100.0, 672.0, 372.0, 12.0),
            frag("body line four", 72.0, 658.0, 400.0, 12.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);
        assert_eq!(layout.paragraph_count(), 2);
        assert!((layout.paragraphs[1].first_line_indent - 28.0).abs() < 1e-3);
    }

    #[test]
    fn test_code_style() {
        let fragments = vec![
            frag("fn main() {", 72.0, 700.0, 400.0, 12.0).with_font("Courier"),
            frag("}", 72.0, 686.0, 400.0, 12.0).with_font("Courier"),
        ];
        let layout = ParagraphDetector::new().detect(&lines_of(&fragments));
        assert_eq!(layout.paragraphs[0].style, ParagraphStyle::Code);
    }

    #[test]
    fn test_margin_mode() {
        assert!((margin_mode(&[72.0, 72.5, 73.0, 300.0]) - 72.5).abs() < 1e-3);
        assert_eq!(margin_mode(&[]), 0.0);
    }

    #[test]
    fn test_empty() {
        let layout = ParagraphDetector::new().detect(&[]);
        assert!(layout.is_empty());
        assert_eq!(layout.text(), "");
    }

    #[test]
    fn test_block_quote_style() {
        let lines = lines_of(&[
            frag("Body text before the quotation", 72.0, 700.0, 400.0, 12.0),
            frag("continues at the left margin", 72.0, 686.0, 400.0, 12.0),
            frag("and ends here.", 72.0, 672.0, 400.0, 12.0),
            frag("A quoted passage set in", 120.0, 640.0, 250.0, 12.0),
            frag("from both margins", 120.0, 626.0, 250.0, 12.0),
            frag("Body text resumes after", 72.0, 594.0, 400.0, 12.0),
            frag("the quotation.", 72.0, 580.0, 400.0, 12.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);

        assert_eq!(layout.paragraph_count(), 3);
        assert_eq!(layout.paragraphs[0].style, ParagraphStyle::Normal);
        assert_eq!(layout.paragraphs[1].style, ParagraphStyle::BlockQuote);
        assert_eq!(layout.paragraphs[1].text, "A quoted passage set in from both margins");
        assert_eq!(layout.paragraphs[2].style, ParagraphStyle::Normal);
    }

    #[test]
    fn test_caption_style() {
        let lines = lines_of(&[
            frag("Body text above the figure", 72.0, 700.0, 400.0, 12.0),
            frag("runs the full width of", 72.0, 686.0, 400.0, 12.0),
            frag("the column.", 72.0, 672.0, 400.0, 12.0),
            frag("Figure 1: Results", 172.0, 640.0, 200.0, 10.0),
        ]);
        let layout = ParagraphDetector::new().detect(&lines);

        assert_eq!(layout.paragraph_count(), 2);
        let caption = &layout.paragraphs[1];
        assert_eq!(caption.alignment, LineAlignment::Center);
        assert_eq!(caption.style, ParagraphStyle::Caption);
        assert_eq!(layout.paragraphs_with_style(ParagraphStyle::Caption).len(), 1);
    }
}
