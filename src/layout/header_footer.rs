//! Running header and footer detection across pages.
//!
//! Text that repeats at the same position near the top or bottom edge of
//! many pages is a running header or footer. Digit runs are normalized so
//! that page numbers and dates still group together.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::line::LineDetector;
use super::patterns::{normalize_digits, DIGIT_RUN};
use crate::model::{average_fragment_length, Page, TextFragment};

/// Placeholder forms of a page number after digit normalization.
const PAGE_NUMBER_FORMS: &[&str] = &["#", "page #", "# of #", "page # of #", "p. #", "- # -", "#/#"];

/// Which edge a region repeats at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    Header,
    Footer,
}

/// Header/footer detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderFooterDetectorConfig {
    /// Fewer pages than this yields no regions
    pub min_pages: usize,
    /// Fraction of pages a pattern must appear on
    pub min_occurrence_ratio: f32,
    /// Height of the header band as a fraction of page height
    pub header_band_ratio: f32,
    /// Height of the footer band as a fraction of page height
    pub footer_band_ratio: f32,
    /// Allowed vertical drift between occurrences (points)
    pub position_tolerance: f32,
    /// Allowed horizontal drift between occurrences (points)
    pub x_position_tolerance: f32,
    /// Normalized text must be longer than this (runes) unless it is a page number
    pub min_text_length: usize,
    /// Pages whose average fragment length is at most this are character-level
    pub char_level_threshold: f32,
}

impl Default for HeaderFooterDetectorConfig {
    fn default() -> Self {
        Self {
            min_pages: 2,
            min_occurrence_ratio: 0.5,
            header_band_ratio: 0.1,
            footer_band_ratio: 0.1,
            position_tolerance: 5.0,
            x_position_tolerance: 15.0,
            min_text_length: 2,
            char_level_threshold: 2.0,
        }
    }
}

/// A repeating header or footer pattern.
///
/// Regions do not own fragments; they are matched against a page's
/// fragments when filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderFooterRegion {
    pub region_type: RegionType,
    /// Text of the first occurrence
    pub text: String,
    /// Text with digit runs replaced by `#`
    pub pattern: String,
    /// Zero-based indices of the pages the region appears on
    pub pages: Vec<usize>,
    /// Left edge of the first occurrence
    pub x: f32,
    /// Width of the first occurrence
    pub width: f32,
    /// Distance of the first occurrence from its page edge
    pub edge_offset: f32,
    pub confidence: f32,
    pub is_page_number: bool,
}

impl HeaderFooterRegion {
    /// Check if the region appears on a page.
    pub fn on_page(&self, page_index: usize) -> bool {
        self.pages.binary_search(&page_index).is_ok()
    }

    pub fn occurrence_count(&self) -> usize {
        self.pages.len()
    }
}

/// Regions detected across a set of pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderFooterResult {
    pub regions: Vec<HeaderFooterRegion>,
    /// Number of pages examined
    pub page_count: usize,
    #[serde(skip)]
    config: HeaderFooterDetectorConfig,
}

impl HeaderFooterResult {
    /// Get the number of regions.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn has_headers(&self) -> bool {
        self.regions.iter().any(|r| r.region_type == RegionType::Header)
    }

    pub fn has_footers(&self) -> bool {
        self.regions.iter().any(|r| r.region_type == RegionType::Footer)
    }

    pub fn headers(&self) -> Vec<&HeaderFooterRegion> {
        self.regions_of_type(RegionType::Header)
    }

    pub fn footers(&self) -> Vec<&HeaderFooterRegion> {
        self.regions_of_type(RegionType::Footer)
    }

    /// Regions recognized as page numbers.
    pub fn page_number_regions(&self) -> Vec<&HeaderFooterRegion> {
        self.regions.iter().filter(|r| r.is_page_number).collect()
    }

    /// Regions present on a page.
    pub fn regions_for_page(&self, page_index: usize) -> Vec<&HeaderFooterRegion> {
        self.regions.iter().filter(|r| r.on_page(page_index)).collect()
    }

    fn regions_of_type(&self, region_type: RegionType) -> Vec<&HeaderFooterRegion> {
        self.regions
            .iter()
            .filter(|r| r.region_type == region_type)
            .collect()
    }

    /// Remove the fragments of one page that belong to a detected region.
    ///
    /// A fragment inside a region's band is removed when its text equals
    /// the region text or pattern. On character-level pages, where single
    /// glyphs cannot be matched by text, position within the band decides.
    pub fn filter_fragments(
        &self,
        page_index: usize,
        fragments: &[TextFragment],
        page_height: f32,
    ) -> Vec<TextFragment> {
        let regions = self.regions_for_page(page_index);
        if regions.is_empty() {
            return fragments.to_vec();
        }
        let frame = PageFrame::new(fragments, page_height, &self.config);
        let char_level = average_fragment_length(fragments) <= self.config.char_level_threshold;

        fragments
            .iter()
            .filter(|fragment| {
                let Some((region_type, offset)) = frame.locate(fragment) else {
                    return true;
                };
                !regions.iter().any(|region| {
                    region.region_type == region_type
                        && if char_level {
                            (offset - region.edge_offset).abs() <= self.config.position_tolerance
                                && fragment.x >= region.x - self.config.x_position_tolerance
                                && fragment.right()
                                    <= region.x + region.width + self.config.x_position_tolerance
                        } else {
                            let text = fragment.text.trim();
                            text == region.text || normalize_digits(text) == region.pattern
                        }
                })
            })
            .cloned()
            .collect()
    }

    /// Filter every page; page indices are positions in `pages`.
    pub fn filter_pages(&self, pages: &[Page]) -> Vec<Page> {
        pages
            .iter()
            .enumerate()
            .map(|(i, page)| Page {
                fragments: self.filter_fragments(i, &page.fragments, page.height),
                ..page.clone()
            })
            .collect()
    }
}

/// Header and footer bands of one page.
struct PageFrame {
    height: f32,
    inverted: bool,
    header_band: f32,
    footer_band: f32,
}

impl PageFrame {
    fn new(fragments: &[TextFragment], page_height: f32, config: &HeaderFooterDetectorConfig) -> Self {
        let content_top = fragments
            .iter()
            .map(|f| f.bbox().top())
            .reduce(f32::max)
            .unwrap_or(0.0);
        // Content above the page box means Y grows downward on a rescaled page
        let inverted = page_height > 0.0 && content_top > page_height;
        let height = if inverted || page_height <= 0.0 {
            content_top.max(page_height)
        } else {
            page_height
        };
        Self {
            height,
            inverted,
            header_band: height * config.header_band_ratio,
            footer_band: height * config.footer_band_ratio,
        }
    }

    /// Band a fragment falls in and its distance from that edge.
    fn locate(&self, fragment: &TextFragment) -> Option<(RegionType, f32)> {
        let b = fragment.bbox();
        let (from_top, from_bottom) = if self.inverted {
            (b.y, self.height - b.top())
        } else {
            (self.height - b.top(), b.y)
        };
        if from_top <= self.header_band {
            Some((RegionType::Header, from_top))
        } else if from_bottom <= self.footer_band {
            Some((RegionType::Footer, from_bottom))
        } else {
            None
        }
    }
}

/// One header/footer candidate on one page.
#[derive(Debug, Clone)]
struct Candidate {
    page_index: usize,
    region_type: RegionType,
    text: String,
    x: f32,
    width: f32,
    edge_offset: f32,
}

/// Finds running headers and footers across pages.
pub struct HeaderFooterDetector {
    config: HeaderFooterDetectorConfig,
}

impl HeaderFooterDetector {
    /// Create a new header/footer detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: HeaderFooterDetectorConfig::default(),
        }
    }

    /// Create a new header/footer detector with custom configuration.
    pub fn with_config(config: HeaderFooterDetectorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &HeaderFooterDetectorConfig {
        &self.config
    }

    /// Detect repeating regions across pages.
    pub fn detect(&self, pages: &[Page]) -> HeaderFooterResult {
        let mut result = HeaderFooterResult {
            regions: vec![],
            page_count: pages.len(),
            config: self.config.clone(),
        };
        if pages.len() < self.config.min_pages.max(1) {
            log::debug!(
                "HeaderFooterDetector: {} pages, need at least {}",
                pages.len(),
                self.config.min_pages
            );
            return result;
        }

        let candidates: Vec<Vec<Candidate>> = pages
            .par_iter()
            .enumerate()
            .map(|(i, page)| self.extract_candidates(i, page))
            .collect();

        let mut groups: BTreeMap<(RegionType, String), Vec<Candidate>> = BTreeMap::new();
        for candidate in candidates.into_iter().flatten() {
            let key = (candidate.region_type, normalize_digits(&candidate.text));
            groups.entry(key).or_default().push(candidate);
        }

        let total = pages.len();
        for ((region_type, pattern), group) in groups {
            if let Some(region) = self.evaluate_group(region_type, pattern, group, total) {
                log::debug!(
                    "HeaderFooterDetector: {:?} {:?} on {}/{} pages (confidence {:.2})",
                    region.region_type,
                    region.text,
                    region.pages.len(),
                    total,
                    region.confidence
                );
                result.regions.push(region);
            }
        }
        result
    }

    /// Convenience: detect regions and return the filtered pages.
    pub fn remove_headers_footers(&self, pages: &[Page]) -> Vec<Page> {
        self.detect(pages).filter_pages(pages)
    }

    fn extract_candidates(&self, page_index: usize, page: &Page) -> Vec<Candidate> {
        let fragments = if average_fragment_length(&page.fragments) <= self.config.char_level_threshold {
            reassemble_lines(&page.fragments)
        } else {
            page.fragments.clone()
        };
        let frame = PageFrame::new(&fragments, page.height, &self.config);

        fragments
            .iter()
            .filter(|f| !f.text.trim().is_empty())
            .filter_map(|f| {
                frame.locate(f).map(|(region_type, edge_offset)| Candidate {
                    page_index,
                    region_type,
                    text: f.text.trim().to_string(),
                    x: f.x,
                    width: f.width,
                    edge_offset,
                })
            })
            .collect()
    }

    fn evaluate_group(
        &self,
        region_type: RegionType,
        pattern: String,
        group: Vec<Candidate>,
        total_pages: usize,
    ) -> Option<HeaderFooterRegion> {
        let required = (total_pages as f32 * self.config.min_occurrence_ratio).max(2.0);
        if (distinct_pages(&group).len() as f32) < required {
            return None;
        }

        // Keep occurrences that agree with the median position
        let mx = median(group.iter().map(|c| c.x));
        let my = median(group.iter().map(|c| c.edge_offset));
        let total_occurrences = group.len();
        let consistent: Vec<Candidate> = group
            .into_iter()
            .filter(|c| {
                (c.x - mx).abs() <= self.config.x_position_tolerance
                    && (c.edge_offset - my).abs() <= self.config.position_tolerance
            })
            .collect();
        let pages = distinct_pages(&consistent);
        if (pages.len() as f32) < required {
            return None;
        }

        let texts: Vec<&str> = consistent.iter().map(|c| c.text.as_str()).collect();
        let is_page_number = is_page_number_pattern(&pattern) || is_number_sequence(&texts);
        if pattern.chars().count() <= self.config.min_text_length && !is_page_number {
            return None;
        }

        let position_bonus = if consistent.len() == total_occurrences {
            0.1
        } else {
            0.0
        };
        let ratio = pages.len() as f32 / total_pages as f32;
        let first = consistent.first()?;

        Some(HeaderFooterRegion {
            region_type,
            text: first.text.clone(),
            x: first.x,
            width: first.width,
            edge_offset: first.edge_offset,
            pattern,
            pages,
            confidence: (ratio * 0.9 + position_bonus).min(1.0),
            is_page_number,
        })
    }
}

impl Default for HeaderFooterDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild line-level fragments from character-level ones.
fn reassemble_lines(fragments: &[TextFragment]) -> Vec<TextFragment> {
    LineDetector::new()
        .group_lines(fragments)
        .into_iter()
        .map(|line| {
            let font_name = line
                .fragments
                .first()
                .map(|f| f.font_name.clone())
                .unwrap_or_default();
            TextFragment {
                text: line.text,
                x: line.bbox.x,
                y: line.bbox.y,
                width: line.bbox.width,
                height: line.bbox.height,
                font_size: line.average_font_size,
                font_name,
                direction: line.direction,
            }
        })
        .collect()
}

fn distinct_pages(group: &[Candidate]) -> Vec<usize> {
    let mut pages: Vec<usize> = group.iter().map(|c| c.page_index).collect();
    pages.sort_unstable();
    pages.dedup();
    pages
}

fn median(values: impl Iterator<Item = f32>) -> f32 {
    let mut values: Vec<f32> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f32::total_cmp);
    values[values.len() / 2]
}

fn is_page_number_pattern(pattern: &str) -> bool {
    let lower = pattern.to_lowercase();
    PAGE_NUMBER_FORMS.contains(&lower.as_str())
}

/// At least half of the consecutive sorted numbers in the texts differ by
/// exactly one.
fn is_number_sequence(texts: &[&str]) -> bool {
    let mut numbers: Vec<u64> = texts
        .iter()
        .flat_map(|t| {
            let folded: String = t.nfkc().collect();
            DIGIT_RUN
                .find_iter(&folded)
                .filter_map(|m| m.as_str().parse().ok())
                .collect::<Vec<u64>>()
        })
        .collect();
    if numbers.len() < 2 {
        return false;
    }
    numbers.sort_unstable();
    let pairs = numbers.len() - 1;
    let steps = numbers.windows(2).filter(|w| w[1] == w[0] + 1).count();
    steps * 2 >= pairs
}
