//! Markdown rendering for analysis results.

use crate::analyzer::{AnalysisResult, ElementKind, LayoutElement};
use crate::layout::{Heading, List, ListItem, ListType, Paragraph, ParagraphStyle};

use super::RenderOptions;

/// Markdown renderer.
pub struct MarkdownRenderer<'a> {
    options: &'a RenderOptions,
}

impl<'a> MarkdownRenderer<'a> {
    /// Create a new Markdown renderer.
    pub fn new(options: &'a RenderOptions) -> Self {
        Self { options }
    }

    /// Render one page. Elements are separated by blank lines.
    pub fn render(&self, result: &AnalysisResult) -> String {
        result
            .elements
            .iter()
            .map(|element| self.render_element(element))
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn render_element(&self, element: &LayoutElement) -> String {
        match &element.kind {
            ElementKind::Heading(heading) => self.render_heading(heading),
            ElementKind::List(list) => self.render_list(list),
            ElementKind::Paragraph(paragraph) => self.render_paragraph(paragraph),
        }
    }

    fn render_heading(&self, heading: &Heading) -> String {
        let level = heading.level.as_number().min(self.options.max_heading_level).max(1);
        format!("{} {}", "#".repeat(level as usize), self.escape(heading.text().trim()))
    }

    fn render_list(&self, list: &List) -> String {
        let mut output = String::new();
        self.render_items(&mut output, list.list_type, &list.items, 0);
        output.truncate(output.trim_end().len());
        output
    }

    fn render_items(&self, output: &mut String, list_type: ListType, items: &[ListItem], depth: usize) {
        for (position, item) in items.iter().enumerate() {
            output.push_str(&"  ".repeat(depth));
            output.push_str(&self.item_marker(list_type, item, position));
            output.push(' ');
            output.push_str(&self.escape(&item.text));
            output.push('\n');
            self.render_items(output, list_type, &item.children, depth + 1);
        }
    }

    fn item_marker(&self, list_type: ListType, item: &ListItem, position: usize) -> String {
        match list_type {
            ListType::Bullet => self.options.list_marker.to_string(),
            ListType::Checkbox => {
                let mark = if item.checked == Some(true) { 'x' } else { ' ' };
                format!("{} [{}]", self.options.list_marker, mark)
            }
            ListType::Numbered => {
                format!("{}.", item.number.unwrap_or(position as u32 + 1))
            }
            ListType::Lettered | ListType::Roman => {
                let core = item
                    .marker
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_string();
                if core.is_empty() {
                    format!("{}.", position + 1)
                } else {
                    format!("{}.", core)
                }
            }
        }
    }

    fn render_paragraph(&self, paragraph: &Paragraph) -> String {
        match paragraph.style {
            ParagraphStyle::BlockQuote => self
                .escape(paragraph.text.trim())
                .lines()
                .map(|line| format!("> {}", line))
                .collect::<Vec<_>>()
                .join("\n"),
            ParagraphStyle::Code => {
                let body = paragraph
                    .lines
                    .iter()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("```\n{}\n```", body)
            }
            _ => {
                let text = self.escape(paragraph.text.trim());
                if self.options.escape_special_chars {
                    escape_line_start(&text)
                } else {
                    text
                }
            }
        }
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

/// Render one page as Markdown.
pub fn to_markdown(result: &AnalysisResult, options: &RenderOptions) -> String {
    MarkdownRenderer::new(options).render(result)
}

/// Render several pages, joined with the page separator.
pub fn to_markdown_pages(results: &[AnalysisResult], options: &RenderOptions) -> String {
    let renderer = MarkdownRenderer::new(options);
    results
        .iter()
        .map(|r| renderer.render(r))
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(&options.page_separator)
}

/// Escape inline Markdown characters.
/// Characters that only matter at the start of a line are left alone here.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

/// Keep body text from being read as a heading, quote or list.
fn escape_line_start(text: &str) -> String {
    match text.chars().next() {
        Some(c @ ('#' | '>' | '+')) => format!("\\{}{}", c, &text[c.len_utf8()..]),
        Some('-') if text[1..].starts_with(' ') => format!("\\{}", text),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Analyzer, AnalyzerConfig};
    use crate::model::TextFragment;

    fn frag(text: &str, x: f32, y: f32, width: f32, font_size: f32) -> TextFragment {
        TextFragment::new(text, x, y, width, font_size)
    }

    fn render(fragments: &[TextFragment], options: &RenderOptions) -> String {
        let result = Analyzer::new().analyze(fragments, 612.0, 792.0);
        to_markdown(&result, options)
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
        assert_eq!(escape_markdown("a.b-c!"), "a.b-c!");
    }

    #[test]
    fn test_escape_line_start() {
        assert_eq!(escape_line_start("# not a heading"), "\\# not a heading");
        assert_eq!(escape_line_start("- not a list"), "\\- not a list");
        assert_eq!(escape_line_start("-5 degrees"), "-5 degrees");
    }

    #[test]
    fn test_render_heading_and_paragraph() {
        let markdown = render(
            &[
                frag("Introduction", 72.0, 720.0, 150.0, 24.0),
                frag("Body text one.", 72.0, 680.0, 300.0, 12.0),
                frag("Body text two.", 72.0, 666.0, 300.0, 12.0),
            ],
            &RenderOptions::default(),
        );
        assert!(markdown.starts_with("# Introduction\n\n"));
        assert!(markdown.contains("Body text one."));
    }

    #[test]
    fn test_render_numbered_list() {
        let markdown = render(
            &[
                frag("1. First", 72.0, 700.0, 120.0, 12.0),
                frag("2. Second", 72.0, 686.0, 120.0, 12.0),
                frag("3. Third", 72.0, 672.0, 120.0, 12.0),
            ],
            &RenderOptions::default(),
        );
        assert_eq!(markdown, "1. First\n2. Second\n3. Third");
    }

    #[test]
    fn test_render_nested_bullets() {
        let markdown = render(
            &[
                frag("• Fruit", 72.0, 700.0, 120.0, 12.0),
                frag("• Apple", 100.0, 686.0, 120.0, 12.0),
                frag("• Bread", 72.0, 672.0, 120.0, 12.0),
            ],
            &RenderOptions::default().with_list_marker('*'),
        );
        assert_eq!(markdown, "* Fruit\n  * Apple\n* Bread");
    }

    #[test]
    fn test_heading_level_is_capped() {
        let options = RenderOptions::new().with_max_heading(1);
        let analyzer = Analyzer::with_config(AnalyzerConfig::default());
        let result = analyzer.analyze(
            &[
                frag("Title", 72.0, 740.0, 100.0, 24.0),
                frag("Subtitle", 72.0, 700.0, 100.0, 16.0),
                frag("Body text one.", 72.0, 660.0, 300.0, 12.0),
                frag("Body text two.", 72.0, 646.0, 300.0, 12.0),
            ],
            612.0,
            792.0,
        );
        let markdown = to_markdown(&result, &options);
        assert!(!markdown.contains("##"));
    }

    #[test]
    fn test_pages_are_joined_with_separator() {
        let analyzer = Analyzer::new();
        let pages = vec![
            analyzer.analyze(&[frag("Page one", 72.0, 700.0, 100.0, 12.0)], 612.0, 792.0),
            analyzer.analyze(&[], 612.0, 792.0),
            analyzer.analyze(&[frag("Page two", 72.0, 700.0, 100.0, 12.0)], 612.0, 792.0),
        ];
        let options = RenderOptions::new().with_page_separator("\n\n---\n\n");
        assert_eq!(to_markdown_pages(&pages, &options), "Page one\n\n---\n\nPage two");
    }
}
