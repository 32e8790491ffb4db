//! Positioned text fragments, the atoms every detector consumes.

use serde::{Deserialize, Serialize};
use unicode_bidi::{bidi_class, BidiClass};

use super::BBox;

/// Writing direction tag attached to a fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    /// Left to right (default)
    #[default]
    Ltr,
    /// Right to left (Arabic, Hebrew)
    Rtl,
    /// Top to bottom (vertical CJK)
    Ttb,
    /// Not tagged by the producer
    Unknown,
}

impl TextDirection {
    /// Infer a direction from the strong bidi classes of `text`.
    ///
    /// Returns `Rtl` when right-to-left strong characters outnumber
    /// left-to-right ones, `Ltr` when there is at least one strong LTR
    /// character, and `Unknown` for text without strong characters
    /// (digits, punctuation).
    pub fn infer(text: &str) -> Self {
        let mut ltr = 0usize;
        let mut rtl = 0usize;
        for c in text.chars() {
            match bidi_class(c) {
                BidiClass::L => ltr += 1,
                BidiClass::R | BidiClass::AL => rtl += 1,
                _ => {}
            }
        }
        if rtl > ltr {
            TextDirection::Rtl
        } else if ltr > 0 {
            TextDirection::Ltr
        } else {
            TextDirection::Unknown
        }
    }

    /// Check if this is a right-to-left direction.
    pub fn is_rtl(&self) -> bool {
        matches!(self, TextDirection::Rtl)
    }
}

/// A positioned run of text as produced by a content-stream parser.
///
/// Fragments carry no structure of their own and are never mutated by the
/// detectors; they are cloned into whatever grouping a detector builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// The text content
    pub text: String,
    /// Left edge in page space
    pub x: f32,
    /// Baseline / bottom edge in page space
    pub y: f32,
    /// Advance width of the run
    #[serde(default)]
    pub width: f32,
    /// Glyph box height (0 when the producer does not report it)
    #[serde(default)]
    pub height: f32,
    /// Font size in points
    #[serde(default)]
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    #[serde(default)]
    pub font_name: String,
    /// Writing direction tag
    #[serde(default)]
    pub direction: TextDirection,
}

impl TextFragment {
    /// Create a new fragment with an empty font name and LTR direction.
    ///
    /// The height defaults to the font size; use [`TextFragment::with_height`]
    /// when the producer reports a real glyph box.
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height: font_size,
            font_size,
            font_name: String::new(),
            direction: TextDirection::Ltr,
        }
    }

    /// Set the glyph box height.
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Set the font name.
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    /// Set the direction tag.
    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Height used for geometry: the reported height, or the font size when
    /// the producer left it empty.
    pub fn effective_height(&self) -> f32 {
        if self.height > 0.0 {
            self.height
        } else {
            self.font_size.max(0.0)
        }
    }

    /// Font size used for typography, falling back to the box height.
    pub fn effective_font_size(&self) -> f32 {
        if self.font_size > 0.0 {
            self.font_size
        } else {
            self.height.max(0.0)
        }
    }

    /// Bounding box of the fragment.
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x, self.y, self.width, self.effective_height())
    }

    pub fn right(&self) -> f32 {
        self.x + self.width.max(0.0)
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width.max(0.0) / 2.0
    }

    /// Direction of the fragment, inferring it from the text when untagged.
    pub fn resolved_direction(&self) -> TextDirection {
        match self.direction {
            TextDirection::Unknown => TextDirection::infer(&self.text),
            d => d,
        }
    }

    /// Number of characters (runes) in the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the font appears to be bold.
    pub fn is_bold(&self) -> bool {
        let name = self.font_name.to_lowercase();
        name.contains("bold") || name.contains("black") || name.contains("heavy")
    }

    /// Check if the font appears to be italic.
    pub fn is_italic(&self) -> bool {
        let name = self.font_name.to_lowercase();
        name.contains("italic") || name.contains("oblique")
    }

    /// Check if the font appears to be monospaced.
    pub fn is_monospace(&self) -> bool {
        let name = self.font_name.to_lowercase();
        name.contains("mono")
            || name.contains("courier")
            || name.contains("consol")
            || name.contains("code")
    }

    /// Check that every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.font_size.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_style_detection() {
        let f = TextFragment::new("Test", 0.0, 0.0, 20.0, 12.0).with_font("Helvetica-Bold");
        assert!(f.is_bold());
        assert!(!f.is_italic());

        let f = TextFragment::new("Test", 0.0, 0.0, 20.0, 12.0).with_font("Times-Oblique");
        assert!(!f.is_bold());
        assert!(f.is_italic());

        let f = TextFragment::new("let x", 0.0, 0.0, 20.0, 12.0).with_font("CourierNew");
        assert!(f.is_monospace());
    }

    #[test]
    fn test_effective_height_falls_back_to_font_size() {
        let f = TextFragment::new("a", 0.0, 0.0, 5.0, 11.0).with_height(0.0);
        assert_eq!(f.effective_height(), 11.0);
        assert_eq!(f.bbox().height, 11.0);
    }

    #[test]
    fn test_direction_inference() {
        assert_eq!(TextDirection::infer("Hello"), TextDirection::Ltr);
        assert_eq!(TextDirection::infer("שלום עולם"), TextDirection::Rtl);
        assert_eq!(TextDirection::infer("123 ..."), TextDirection::Unknown);

        let f = TextFragment::new("مرحبا", 0.0, 0.0, 30.0, 12.0)
            .with_direction(TextDirection::Unknown);
        assert_eq!(f.resolved_direction(), TextDirection::Rtl);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let f: TextFragment = serde_json::from_str(r#"{"text":"Hi","x":1.0,"y":2.0}"#).unwrap();
        assert_eq!(f.text, "Hi");
        assert_eq!(f.width, 0.0);
        assert_eq!(f.direction, TextDirection::Ltr);
    }
}
