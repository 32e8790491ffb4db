//! List detection: bullet, numbered, lettered, roman and checkbox lists
//! with indentation-based nesting.

use serde::{Deserialize, Serialize};

use super::nesting::{build_forest, Nested};
use super::paragraph::{Paragraph, ParagraphLayout};
use super::patterns::{
    is_valid_roman, letter_to_int, roman_to_int, BULLET_GLYPHS, CHECKBOX_GLYPHS, LETTERED_ITEM,
    NUMBERED_ITEM, ROMAN_ITEM,
};
use crate::model::BBox;

/// Kind of list enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Bullet,
    Numbered,
    Lettered,
    Roman,
    Checkbox,
}

/// Glyph family of a bullet marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletStyle {
    Disc,
    Circle,
    Square,
    Diamond,
    Arrow,
    Dash,
    Asterisk,
    Star,
    Dot,
    Checkbox,
    #[default]
    None,
}

impl BulletStyle {
    fn from_glyph(c: char) -> Self {
        match c {
            '•' | '●' => BulletStyle::Disc,
            '○' | '◦' => BulletStyle::Circle,
            '■' | '□' | '▪' | '▫' => BulletStyle::Square,
            '◆' | '◇' => BulletStyle::Diamond,
            '►' | '▸' | '▶' | '‣' | '➢' | '➤' | '→' => BulletStyle::Arrow,
            '-' | '–' | '—' | '⁃' => BulletStyle::Dash,
            '*' => BulletStyle::Asterisk,
            '★' | '☆' | '✦' => BulletStyle::Star,
            '∙' | '·' => BulletStyle::Dot,
            c if CHECKBOX_GLYPHS.contains(&c) => BulletStyle::Checkbox,
            _ => BulletStyle::None,
        }
    }
}

/// List detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDetectorConfig {
    /// Lists with fewer items are discarded
    pub min_consecutive_items: usize,
    /// Largest vertical gap between items, in average font sizes
    pub max_list_gap: f32,
    /// Horizontal offset (points) per nesting level
    pub indent_threshold: f32,
}

impl Default for ListDetectorConfig {
    fn default() -> Self {
        Self {
            min_consecutive_items: 2,
            max_list_gap: 2.0,
            indent_threshold: 20.0,
        }
    }
}

/// A list entry, owning its nested items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    /// Item text without its marker
    pub text: String,
    /// Marker as written (`•`, `3.`, `(b)`)
    pub marker: String,
    /// Ordinal for enumerated items
    pub number: Option<u32>,
    /// Nesting depth, 0 for top-level items
    pub level: usize,
    /// Checkbox state for checkbox items
    pub checked: Option<bool>,
    pub bbox: BBox,
    /// Index of the source paragraph
    pub paragraph_index: usize,
    pub children: Vec<ListItem>,
}

impl ListItem {
    /// Number of items in this subtree, including this one.
    pub fn item_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.item_count()).sum::<usize>()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a ListItem>) {
        out.push(self);
        for child in &self.children {
            child.collect(out);
        }
    }
}

impl Nested for ListItem {
    fn nesting_level(&self) -> usize {
        self.level
    }

    fn push_child(&mut self, child: Self) {
        self.children.push(child);
    }
}

/// A detected list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub index: usize,
    pub list_type: ListType,
    pub bullet_style: BulletStyle,
    /// Top-level items
    pub items: Vec<ListItem>,
    pub bbox: BBox,
}

impl List {
    /// Items in document order, depth first.
    pub fn flatten(&self) -> Vec<&ListItem> {
        let mut out = Vec::new();
        for item in &self.items {
            item.collect(&mut out);
        }
        out
    }

    /// Total number of items at every depth.
    pub fn item_count(&self) -> usize {
        self.items.iter().map(|i| i.item_count()).sum()
    }

    /// Ordinals of the enumerated items, in document order.
    pub fn numbers(&self) -> Vec<u32> {
        self.flatten().iter().filter_map(|i| i.number).collect()
    }

    /// Items as `marker text`, indented two spaces per level.
    pub fn text(&self) -> String {
        self.flatten()
            .iter()
            .map(|i| format!("{}{} {}", "  ".repeat(i.level), i.marker, i.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lists detected on a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListLayout {
    pub lists: Vec<List>,
}

impl ListLayout {
    /// Get the number of lists.
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Get a list by index.
    pub fn get_list(&self, index: usize) -> Option<&List> {
        self.lists.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Lists of the given type.
    pub fn lists_of_type(&self, list_type: ListType) -> Vec<&List> {
        self.lists.iter().filter(|l| l.list_type == list_type).collect()
    }

    /// Items across all lists, at every depth.
    pub fn total_item_count(&self) -> usize {
        self.lists.iter().map(|l| l.item_count()).sum()
    }

    /// List texts separated by blank lines.
    pub fn text(&self) -> String {
        self.lists
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A recognized list marker at the start of a paragraph.
#[derive(Debug, Clone, PartialEq)]
struct Marker {
    list_type: ListType,
    bullet_style: BulletStyle,
    marker: String,
    number: Option<u32>,
    checked: Option<bool>,
    content: String,
}

/// Recognizes list items among paragraphs and groups them into lists.
pub struct ListDetector {
    config: ListDetectorConfig,
}

impl ListDetector {
    /// Create a new list detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: ListDetectorConfig::default(),
        }
    }

    /// Create a new list detector with custom configuration.
    pub fn with_config(config: ListDetectorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ListDetectorConfig {
        &self.config
    }

    /// Detect lists among paragraphs.
    pub fn detect(&self, layout: &ParagraphLayout) -> ListLayout {
        let mut lists = Vec::new();
        let mut run: Vec<(usize, Marker, &Paragraph)> = Vec::new();

        for (i, paragraph) in layout.paragraphs.iter().enumerate() {
            let context = run.last().map(|(_, m, _)| m.list_type);
            let Some(marker) = parse_marker(&paragraph.text, context) else {
                continue;
            };

            if let Some((last_index, last_marker, last_paragraph)) = run.last() {
                let adjacent = i == last_index + 1;
                let avg_font = (last_paragraph.average_font_size + paragraph.average_font_size) / 2.0;
                let close = vertical_distance(&last_paragraph.bbox, &paragraph.bbox)
                    <= avg_font * self.config.max_list_gap;
                if marker.list_type != last_marker.list_type || !(adjacent || close) {
                    self.flush(&mut run, &mut lists);
                }
            }
            run.push((i, marker, paragraph));
        }
        self.flush(&mut run, &mut lists);

        for (i, list) in lists.iter_mut().enumerate() {
            list.index = i;
        }
        log::debug!("ListDetector: {} lists", lists.len());
        ListLayout { lists }
    }

    fn flush(&self, run: &mut Vec<(usize, Marker, &Paragraph)>, lists: &mut Vec<List>) {
        let items = std::mem::take(run);
        if items.len() < self.config.min_consecutive_items || items.is_empty() {
            return;
        }

        let list_type = items[0].1.list_type;
        let bullet_style = items[0].1.bullet_style;
        let bbox = BBox::union_all(items.iter().map(|(_, _, p)| p.bbox));
        let min_x = items
            .iter()
            .map(|(_, _, p)| item_x(p))
            .reduce(f32::min)
            .unwrap_or(0.0);

        let flat = items.into_iter().map(|(index, marker, paragraph)| {
            let offset = (item_x(paragraph) - min_x).max(0.0);
            let level = if self.config.indent_threshold > 0.0 {
                (offset / self.config.indent_threshold).floor() as usize
            } else {
                0
            };
            ListItem {
                text: marker.content,
                marker: marker.marker,
                number: marker.number,
                level,
                checked: marker.checked,
                bbox: paragraph.bbox,
                paragraph_index: index,
                children: vec![],
            }
        });

        lists.push(List {
            index: 0,
            list_type,
            bullet_style,
            items: build_forest(flat),
            bbox,
        });
    }
}

impl Default for ListDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn item_x(paragraph: &Paragraph) -> f32 {
    paragraph
        .first_line()
        .map(|l| l.indentation)
        .unwrap_or(paragraph.bbox.x)
}

/// Gap between the vertical ranges of two boxes (0 when they overlap).
fn vertical_distance(a: &BBox, b: &BBox) -> f32 {
    (a.y - b.top()).max(b.y - a.top()).max(0.0)
}

/// Parse the list marker at the start of `text`.
///
/// `context` is the type of the list being built; a lone `i`, `v` or `x`
/// continues a lettered list instead of opening a roman one.
fn parse_marker(text: &str, context: Option<ListType>) -> Option<Marker> {
    let text = text.trim();
    let mut chars = text.chars();
    let first = chars.next()?;

    if BULLET_GLYPHS.contains(&first) || CHECKBOX_GLYPHS.contains(&first) {
        let rest = chars.as_str();
        if !rest.starts_with(char::is_whitespace) || rest.trim().is_empty() {
            return None;
        }
        let is_checkbox = CHECKBOX_GLYPHS.contains(&first);
        return Some(Marker {
            list_type: if is_checkbox {
                ListType::Checkbox
            } else {
                ListType::Bullet
            },
            bullet_style: BulletStyle::from_glyph(first),
            marker: first.to_string(),
            number: None,
            checked: is_checkbox.then_some(first != '☐'),
            content: rest.trim().to_string(),
        });
    }

    if let Some(caps) = NUMBERED_ITEM.captures(text) {
        return Some(enumerated(ListType::Numbered, text, &caps, caps[1].parse().ok()));
    }

    if let Some(caps) = ROMAN_ITEM.captures(text) {
        let numeral = &caps[1];
        let lettered_context = context == Some(ListType::Lettered) && numeral.chars().count() == 1;
        if is_valid_roman(numeral) && !lettered_context {
            return Some(enumerated(ListType::Roman, text, &caps, roman_to_int(numeral)));
        }
    }

    if let Some(caps) = LETTERED_ITEM.captures(text) {
        let number = caps[1].chars().next().and_then(letter_to_int);
        return Some(enumerated(ListType::Lettered, text, &caps, number));
    }

    None
}

fn enumerated(list_type: ListType, text: &str, caps: &regex::Captures<'_>, number: Option<u32>) -> Marker {
    let content_start = caps.get(2).map(|m| m.start()).unwrap_or(text.len());
    Marker {
        list_type,
        bullet_style: BulletStyle::None,
        marker: text[..content_start].trim().to_string(),
        number,
        checked: None,
        content: caps[2].trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::line::LineDetector;
    use crate::layout::paragraph::ParagraphDetector;
    use crate::model::TextFragment;

    fn detect(fragments: &[TextFragment]) -> ListLayout {
        let lines = LineDetector::new().detect(fragments, 612.0, 792.0).lines;
        let paragraphs = ParagraphDetector::new().detect(&lines);
        ListDetector::new().detect(&paragraphs)
    }

    fn frag(text: &str, x: f32, y: f32) -> TextFragment {
        TextFragment::new(text, x, y, 120.0, 12.0)
    }

    #[test]
    fn test_numbered_list() {
        let layout = detect(&[
            frag("1. First", 72.0, 700.0),
            frag("2. Second", 72.0, 686.0),
            frag("3. Third", 72.0, 672.0),
        ]);
        assert_eq!(layout.list_count(), 1);
        let list = &layout.lists[0];
        assert_eq!(list.list_type, ListType::Numbered);
        assert_eq!(list.item_count(), 3);
        assert_eq!(list.numbers(), vec![1, 2, 3]);
        assert_eq!(list.items[0].text, "First");
        assert_eq!(list.items[0].marker, "1.");
    }

    #[test]
    fn test_nested_bullets() {
        let layout = detect(&[
            frag("• Fruit", 72.0, 700.0),
            frag("• Apple", 100.0, 686.0),
            frag("• Pear", 100.0, 672.0),
            frag("• Vegetables", 72.0, 658.0),
        ]);
        assert_eq!(layout.list_count(), 1);
        let list = &layout.lists[0];
        assert_eq!(list.bullet_style, BulletStyle::Disc);
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].children.len(), 2);
        assert_eq!(list.item_count(), 4);
        for item in &list.items {
            for child in &item.children {
                assert!(child.level > item.level);
            }
        }
    }

    #[test]
    fn test_single_item_discarded() {
        let layout = detect(&[frag("1. Lonely", 72.0, 700.0), frag("Plain text", 72.0, 600.0)]);
        assert!(layout.is_empty());
        assert_eq!(layout.total_item_count(), 0);
    }

    #[test]
    fn test_type_change_splits_lists() {
        let layout = detect(&[
            frag("1. one", 72.0, 700.0),
            frag("2. two", 72.0, 686.0),
            frag("• dot", 72.0, 672.0),
            frag("• dot", 72.0, 658.0),
        ]);
        assert_eq!(layout.list_count(), 2);
        assert_eq!(layout.lists_of_type(ListType::Bullet).len(), 1);
    }

    #[test]
    fn test_checkbox_markers() {
        let marker = parse_marker("☐ buy milk", None).unwrap();
        assert_eq!(marker.list_type, ListType::Checkbox);
        assert_eq!(marker.checked, Some(false));
        let marker = parse_marker("☑ done", None).unwrap();
        assert_eq!(marker.checked, Some(true));
    }

    #[test]
    fn test_roman_and_letter_markers() {
        let marker = parse_marker("iv. fourth", None).unwrap();
        assert_eq!(marker.list_type, ListType::Roman);
        assert_eq!(marker.number, Some(4));

        let marker = parse_marker("c) third", None).unwrap();
        assert_eq!(marker.list_type, ListType::Lettered);
        assert_eq!(marker.number, Some(3));

        let marker = parse_marker("i. ninth", Some(ListType::Lettered)).unwrap();
        assert_eq!(marker.list_type, ListType::Lettered);
        assert_eq!(marker.number, Some(9));

        assert!(parse_marker("-based", None).is_none());
    }
}
