//! Text patterns shared by the paragraph, heading, list and header/footer
//! detectors.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// `1. item`, `(2) item`, `3) item`
    pub(crate) static ref NUMBERED_ITEM: Regex =
        Regex::new(r"^\(?(\d{1,3})[.)]\s+(\S.*)$").expect("numbered item pattern");

    /// `a. item`, `(b) item`, `C) item`
    pub(crate) static ref LETTERED_ITEM: Regex =
        Regex::new(r"^\(?([A-Za-z])[.)]\s+(\S.*)$").expect("lettered item pattern");

    /// `iv. item`, `(XII) item`
    pub(crate) static ref ROMAN_ITEM: Regex =
        Regex::new(r"^\(?([IVXLCDMivxlcdm]{1,15})[.)]\s+(\S.*)$").expect("roman item pattern");

    /// `Chapter 3`, `Section 2.1`, `Part IV`
    pub(crate) static ref KEYWORD_PREFIX: Regex = Regex::new(
        r"(?i)^(chapter|section|part)\s+(\d+(?:\.\d+)*|[ivxlcdm]+)\b"
    )
    .expect("keyword heading pattern");

    /// `1`, `1.`, `1.2`, `1.2.3` followed by a title
    pub(crate) static ref DECIMAL_PREFIX: Regex =
        Regex::new(r"^(\d+(?:\.\d+){0,5})\.?\s+\S").expect("decimal heading pattern");

    /// `IV. Title`
    pub(crate) static ref ROMAN_PREFIX: Regex =
        Regex::new(r"^([IVXLCDM]+)[.)]\s+\S").expect("roman heading pattern");

    /// `A. Title`
    pub(crate) static ref LETTER_PREFIX: Regex =
        Regex::new(r"^([A-Z])[.)]\s+\S").expect("letter heading pattern");

    /// Runs of ASCII or Unicode digits.
    pub(crate) static ref DIGIT_RUN: Regex = Regex::new(r"\d+").expect("digit run pattern");

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("whitespace pattern");
}

/// Bullet glyphs that open an unordered list item.
pub(crate) const BULLET_GLYPHS: &[char] = &[
    '•', '●', '○', '◦', '■', '□', '▪', '▫', '◆', '◇', '►', '▸', '▶', '‣', '➢', '➤', '→', '⁃',
    '∙', '·', '-', '–', '—', '*', '★', '☆', '✦',
];

/// Checkbox glyphs; `☐` is unchecked, the rest are checked.
pub(crate) const CHECKBOX_GLYPHS: &[char] = &['☐', '☑', '☒', '✓', '✔', '✗', '✘'];

/// Check if a line starts like a list item (bullet, checkbox, or an
/// enumerator followed by text).
pub fn is_list_item_text(text: &str) -> bool {
    let text = text.trim_start();
    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        if BULLET_GLYPHS.contains(&first) || CHECKBOX_GLYPHS.contains(&first) {
            // A lone dash or a dash glued to a word ("-based") is not a bullet.
            return chars.next().map(char::is_whitespace).unwrap_or(false);
        }
    }
    NUMBERED_ITEM.is_match(text)
        || LETTERED_ITEM.is_match(text)
        || ROMAN_ITEM
            .captures(text)
            .map(|c| is_valid_roman(&c[1]))
            .unwrap_or(false)
}

/// Decode a roman numeral with subtractive notation (case-insensitive).
///
/// Returns `None` for characters outside the roman alphabet.
pub fn roman_to_int(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut total: i64 = 0;
    let mut prev = 0i64;
    for c in s.chars().rev() {
        let value = match c.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if value < prev {
            total -= value;
        } else {
            total += value;
            prev = value;
        }
    }
    u32::try_from(total).ok().filter(|v| *v > 0)
}

/// Encode a number as an upper-case roman numeral.
pub fn int_to_roman(mut num: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for &(value, symbol) in TABLE {
        while num >= value {
            out.push_str(symbol);
            num -= value;
        }
    }
    out
}

/// Check that `s` is a canonical roman numeral of 1..=15 characters in a
/// single case.
///
/// Single letters other than `i` are rejected so that `c.` or `d.` inside a
/// lettered list are not mistaken for 100 and 500.
pub fn is_valid_roman(s: &str) -> bool {
    let len = s.chars().count();
    if len == 0 || len > 15 {
        return false;
    }
    let upper = s.chars().all(|c| c.is_ascii_uppercase());
    let lower = s.chars().all(|c| c.is_ascii_lowercase());
    if !upper && !lower {
        return false;
    }
    if len == 1 && !s.eq_ignore_ascii_case("i") {
        return false;
    }
    match roman_to_int(s) {
        Some(n) => int_to_roman(n) == s.to_ascii_uppercase(),
        None => false,
    }
}

/// Number of a letter enumerator: a=1 .. z=26, case-insensitive.
pub fn letter_to_int(c: char) -> Option<u32> {
    let lower = c.to_ascii_lowercase();
    if lower.is_ascii_lowercase() {
        Some(lower as u32 - 'a' as u32 + 1)
    } else {
        None
    }
}

/// Replace every digit run with `#` and collapse whitespace.
///
/// Text is NFKC-folded first, so full-width digits and letters compare
/// equal to their ASCII forms.
pub fn normalize_digits(text: &str) -> String {
    let folded: String = text.trim().nfkc().collect();
    let replaced = DIGIT_RUN.replace_all(&folded, "#");
    WHITESPACE_RUN.replace_all(&replaced, " ").into_owned()
}

/// Check whether every letter is upper-case: at least 3 letters, of which
/// 90% or more are upper-case.
pub fn is_mostly_uppercase(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 3 {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper as f32 / letters.len() as f32 >= 0.9
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // CJK Unified Ideographs Extension B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana and Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
