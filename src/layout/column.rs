//! Column detection based on vertical whitespace (gutter) analysis.
//!
//! Fragments are projected onto the X axis; uncovered bands between the
//! projections are gutter candidates. A candidate only becomes a column
//! boundary when it stays clear over most of the page height, which rejects
//! gaps that exist only beside a title, a short table row or a footer.

use serde::{Deserialize, Serialize};

use super::line::LineDetector;
use crate::model::{BBox, TextFragment};

/// Column detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDetectorConfig {
    /// Columns narrower than this (points) are merged into a neighbour
    pub min_column_width: f32,
    /// Minimum width (points) of a whitespace band to be a gutter candidate
    pub min_gap_width: f32,
    /// Fraction of page height a gutter must stay unobstructed
    pub min_gap_height_ratio: f32,
    /// Upper bound on the number of columns
    pub max_columns: usize,
    /// Projections closer than this (points) are merged into one band
    pub merge_threshold: f32,
    /// Fragments wider than this fraction of the content width do not open
    /// gutter candidates (titles, full-width rules of text)
    pub spanning_width_ratio: f32,
}

impl Default for ColumnDetectorConfig {
    fn default() -> Self {
        Self {
            min_column_width: 50.0,
            min_gap_width: 15.0,
            min_gap_height_ratio: 0.5,
            max_columns: 4,
            merge_threshold: 2.0,
            spanning_width_ratio: 0.6,
        }
    }
}

/// A detected column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column index (0 = leftmost)
    pub index: usize,
    /// Bounding box of the column's fragments
    pub bbox: BBox,
    /// Left boundary of the column band
    pub left: f32,
    /// Right boundary of the column band
    pub right: f32,
    /// Fragments assigned to the column, top to bottom
    pub fragments: Vec<TextFragment>,
}

impl Column {
    /// Check if an X coordinate falls within this column's band.
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }

    /// Check if a fragment's horizontal center falls within this column's band.
    pub fn contains_fragment(&self, fragment: &TextFragment) -> bool {
        self.contains(fragment.center_x())
    }

    pub fn width(&self) -> f32 {
        self.bbox.width
    }

    /// Get the number of fragments in the column.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Check if the column holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Column text, one detected line per output line.
    pub fn text(&self) -> String {
        LineDetector::new()
            .group_lines(&self.fragments)
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// An accepted gutter between two columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnGap {
    /// Left edge of the whitespace band
    pub left: f32,
    /// Right edge of the whitespace band
    pub right: f32,
    /// Fraction of the page height the band stays unobstructed
    pub vertical_extent: f32,
}

impl ColumnGap {
    pub fn center(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// Result of column detection for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// Columns from left to right (always at least one)
    pub columns: Vec<Column>,
    /// Gutters that became column boundaries
    pub gaps: Vec<ColumnGap>,
    pub page_width: f32,
    pub page_height: f32,
}

impl ColumnLayout {
    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get a column by index.
    pub fn get_column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Check if more than one column was detected.
    pub fn is_multi_column(&self) -> bool {
        self.columns.len() > 1
    }

    /// The column whose band contains `x`.
    pub fn column_at(&self, x: f32) -> Option<&Column> {
        self.columns.iter().find(|c| c.contains(x))
    }

    /// Column texts, left to right, separated by blank lines.
    pub fn text(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Detects column layout from fragment positions.
pub struct ColumnDetector {
    config: ColumnDetectorConfig,
}

impl ColumnDetector {
    /// Create a new column detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: ColumnDetectorConfig::default(),
        }
    }

    /// Create a new column detector with custom configuration.
    pub fn with_config(config: ColumnDetectorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ColumnDetectorConfig {
        &self.config
    }

    /// Detect columns on a page.
    ///
    /// Always returns at least one column. Without an accepted gutter the
    /// single column holds every fragment, top to bottom.
    pub fn detect(&self, fragments: &[TextFragment], page_width: f32, page_height: f32) -> ColumnLayout {
        let mut layout = ColumnLayout {
            columns: vec![],
            gaps: vec![],
            page_width,
            page_height,
        };

        if fragments.is_empty() {
            layout.columns.push(Column {
                index: 0,
                bbox: BBox::zero(),
                left: 0.0,
                right: page_width.max(0.0),
                fragments: vec![],
            });
            return layout;
        }

        let gaps = self.find_gaps(fragments, page_height);
        log::debug!("ColumnDetector: {} accepted gutters", gaps.len());

        if gaps.is_empty() {
            layout.columns.push(single_column(fragments));
            return layout;
        }

        let boundaries: Vec<f32> = gaps.iter().map(|g| g.center()).collect();
        let mut buckets: Vec<Vec<TextFragment>> = vec![Vec::new(); boundaries.len() + 1];
        for fragment in fragments {
            let center = fragment.center_x();
            let slot = boundaries.iter().take_while(|b| center >= **b).count();
            buckets[slot].push(fragment.clone());
        }

        let (content_left, content_right) = horizontal_extent(fragments);
        let mut columns: Vec<Column> = buckets
            .into_iter()
            .enumerate()
            .filter(|(_, frags)| !frags.is_empty())
            .map(|(slot, frags)| {
                let left = if slot == 0 {
                    content_left.min(0.0)
                } else {
                    boundaries[slot - 1]
                };
                let right = if slot == boundaries.len() {
                    content_right.max(page_width)
                } else {
                    boundaries[slot]
                };
                make_column(frags, left, right)
            })
            .collect();

        self.merge_narrow_columns(&mut columns);

        if columns.len() <= 1 {
            layout.columns.push(single_column(fragments));
            return layout;
        }

        // Keep only the gutters that still separate surviving columns
        layout.gaps = gaps
            .into_iter()
            .filter(|g| {
                columns
                    .windows(2)
                    .any(|w| (w[0].right - g.center()).abs() < 1e-3)
            })
            .collect();
        for (i, column) in columns.iter_mut().enumerate() {
            column.index = i;
        }
        layout.columns = columns;
        layout
    }

    /// Find gutters that qualify as column boundaries, sorted by X.
    pub fn find_gaps(&self, fragments: &[TextFragment], page_height: f32) -> Vec<ColumnGap> {
        let (content_left, content_right) = horizontal_extent(fragments);
        let content_width = content_right - content_left;
        if content_width <= 0.0 {
            return vec![];
        }
        let wide_limit = content_width * self.config.spanning_width_ratio;

        let mut intervals: Vec<(f32, f32)> = fragments
            .iter()
            .filter(|f| f.width > 0.0 && f.width <= wide_limit)
            .map(|f| (f.x, f.right()))
            .collect();
        let bands = merge_intervals(&mut intervals, self.config.merge_threshold);

        let reference_height = if page_height > 0.0 {
            page_height
        } else {
            vertical_extent(fragments)
        };
        if reference_height <= 0.0 {
            return vec![];
        }

        let mut accepted: Vec<ColumnGap> = Vec::new();
        for pair in bands.windows(2) {
            let (left, right) = (pair[0].1, pair[1].0);
            if right - left <= self.config.min_gap_width {
                continue;
            }

            let mut blocked: Vec<(f32, f32)> = fragments
                .iter()
                .filter(|f| f.x < right && f.right() > left)
                .map(|f| {
                    let b = f.bbox();
                    (b.y, b.top())
                })
                .collect();
            let blocked_height: f32 = merge_intervals(&mut blocked, 0.0)
                .iter()
                .map(|(a, b)| b - a)
                .sum();
            let extent = 1.0 - blocked_height / reference_height;

            if extent >= self.config.min_gap_height_ratio {
                log::debug!(
                    "ColumnDetector: gutter {:.1}-{:.1} accepted (extent {:.2})",
                    left,
                    right,
                    extent
                );
                accepted.push(ColumnGap {
                    left,
                    right,
                    vertical_extent: extent,
                });
            } else {
                log::debug!(
                    "ColumnDetector: gutter {:.1}-{:.1} rejected (extent {:.2})",
                    left,
                    right,
                    extent
                );
            }
        }

        let max_gaps = self.config.max_columns.saturating_sub(1);
        if accepted.len() > max_gaps {
            // Keep the widest gutters
            accepted.sort_by(|a, b| b.width().total_cmp(&a.width()));
            accepted.truncate(max_gaps);
        }
        accepted.sort_by(|a, b| a.left.total_cmp(&b.left));
        accepted
    }

    /// Fold columns narrower than `min_column_width` into their nearest
    /// neighbour so their fragments are never lost.
    fn merge_narrow_columns(&self, columns: &mut Vec<Column>) {
        while columns.len() > 1 {
            let narrowest = columns
                .iter()
                .enumerate()
                .filter(|(_, c)| c.bbox.width < self.config.min_column_width)
                .min_by(|a, b| a.1.bbox.width.total_cmp(&b.1.bbox.width))
                .map(|(i, _)| i);
            let Some(i) = narrowest else {
                break;
            };

            let target = if i == 0 {
                1
            } else if i == columns.len() - 1 {
                i - 1
            } else {
                let left_dist = columns[i].bbox.x - columns[i - 1].bbox.right();
                let right_dist = columns[i + 1].bbox.x - columns[i].bbox.right();
                if left_dist <= right_dist {
                    i - 1
                } else {
                    i + 1
                }
            };
            log::debug!(
                "ColumnDetector: merging narrow column {} ({:.1}pt) into {}",
                i,
                columns[i].bbox.width,
                target
            );

            let narrow = columns.remove(i);
            let target = if target > i { target - 1 } else { target };
            let host = &mut columns[target];
            let mut fragments = std::mem::take(&mut host.fragments);
            fragments.extend(narrow.fragments);
            let left = host.left.min(narrow.left);
            let right = host.right.max(narrow.right);
            *host = make_column(fragments, left, right);
        }
    }
}

impl Default for ColumnDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn single_column(fragments: &[TextFragment]) -> Column {
    let (left, right) = horizontal_extent(fragments);
    make_column(fragments.to_vec(), left, right)
}

fn make_column(mut fragments: Vec<TextFragment>, left: f32, right: f32) -> Column {
    sort_top_to_bottom(&mut fragments);
    let bbox = BBox::union_all(fragments.iter().map(|f| f.bbox()));
    Column {
        index: 0,
        bbox,
        left,
        right,
        fragments,
    }
}

/// Sort fragments top to bottom (standard convention), then left to right.
pub(crate) fn sort_top_to_bottom(fragments: &mut [TextFragment]) {
    fragments.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));
}

fn horizontal_extent(fragments: &[TextFragment]) -> (f32, f32) {
    let left = fragments.iter().map(|f| f.x).reduce(f32::min).unwrap_or(0.0);
    let right = fragments
        .iter()
        .map(|f| f.right())
        .reduce(f32::max)
        .unwrap_or(0.0);
    (left, right)
}

fn vertical_extent(fragments: &[TextFragment]) -> f32 {
    let bbox = BBox::union_all(fragments.iter().map(|f| f.bbox()));
    bbox.height
}

/// Sort and merge intervals that overlap or lie within `tolerance`.
fn merge_intervals(intervals: &mut [(f32, f32)], tolerance: f32) -> Vec<(f32, f32)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f32, f32)> = Vec::new();
    for &(start, end) in intervals.iter() {
        match merged.last_mut() {
            Some(last) if start <= last.1 + tolerance => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
