//! Block detection: spatial clustering of lines into rectangular regions.
//!
//! Blocks use their own, simpler line grouping (a fixed fraction of the
//! fragment height) and do not depend on column detection. A block is a
//! spatial cluster, not necessarily a paragraph.

use serde::{Deserialize, Serialize};

use super::column::sort_top_to_bottom;
use super::line::Line;
use crate::model::{BBox, TextFragment};

/// Row height (points) used when sorting blocks top to bottom.
const ROW_TOLERANCE: f32 = 10.0;

/// Block detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDetectorConfig {
    /// Y tolerance for line grouping, as a fraction of fragment height
    pub line_tolerance: f32,
    /// Maximum vertical gap between lines of a block, in average line heights
    pub vertical_gap_threshold: f32,
    /// Maximum left-edge jump between lines of a block, in font sizes
    pub horizontal_gap_threshold: f32,
    /// Merge blocks whose boxes overlap substantially
    pub merge_overlapping: bool,
    /// Overlap (fraction of the smaller block's area) that triggers a merge
    pub overlap_ratio: f32,
    /// Blocks narrower than this (points) are discarded
    pub min_block_width: f32,
    /// Blocks shorter than this (points) are discarded
    pub min_block_height: f32,
}

impl Default for BlockDetectorConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 0.5,
            vertical_gap_threshold: 1.5,
            horizontal_gap_threshold: 3.0,
            merge_overlapping: true,
            overlap_ratio: 0.3,
            min_block_width: 5.0,
            min_block_height: 5.0,
        }
    }
}

/// A spatially coherent group of lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: usize,
    pub bbox: BBox,
    /// Lines from top to bottom
    pub lines: Vec<Line>,
    pub average_font_size: f32,
}

impl Block {
    fn from_lines(lines: Vec<Line>) -> Self {
        let bbox = BBox::union_all(lines.iter().map(|l| l.bbox));
        let average_font_size = if lines.is_empty() {
            0.0
        } else {
            lines.iter().map(|l| l.average_font_size).sum::<f32>() / lines.len() as f32
        };
        Self {
            index: 0,
            bbox,
            lines,
            average_font_size,
        }
    }

    fn absorb(&mut self, other: Block) {
        let mut lines = std::mem::take(&mut self.lines);
        lines.extend(other.lines);
        lines.sort_by(|a, b| b.bbox.y.total_cmp(&a.bbox.y));
        *self = Block {
            index: self.index,
            ..Block::from_lines(lines)
        };
    }

    /// Number of lines in the block.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Block text, one line per output line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Blocks detected on a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockLayout {
    pub blocks: Vec<Block>,
    pub page_width: f32,
    pub page_height: f32,
}

impl BlockLayout {
    /// Get the number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Get a block by index.
    pub fn get_block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks whose box intersects `region`.
    pub fn blocks_in_region(&self, region: &BBox) -> Vec<&Block> {
        self.blocks
            .iter()
            .filter(|b| b.bbox.intersects(region))
            .collect()
    }

    /// Block texts separated by blank lines.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Clusters lines into blocks.
pub struct BlockDetector {
    config: BlockDetectorConfig,
}

impl BlockDetector {
    /// Create a new block detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: BlockDetectorConfig::default(),
        }
    }

    /// Create a new block detector with custom configuration.
    pub fn with_config(config: BlockDetectorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockDetectorConfig {
        &self.config
    }

    /// Detect blocks on a page.
    pub fn detect(&self, fragments: &[TextFragment], page_width: f32, page_height: f32) -> BlockLayout {
        let lines = self.group_lines(fragments);
        let mut blocks = self.cluster(lines);

        if self.config.merge_overlapping {
            blocks = self.merge_overlapping(blocks);
        }

        blocks.retain(|b| {
            b.bbox.width >= self.config.min_block_width && b.bbox.height >= self.config.min_block_height
        });
        blocks.sort_by(|a, b| {
            row_of(&b.bbox)
                .cmp(&row_of(&a.bbox))
                .then(a.bbox.x.total_cmp(&b.bbox.x))
        });
        for (i, block) in blocks.iter_mut().enumerate() {
            block.index = i;
        }

        log::debug!("BlockDetector: {} blocks", blocks.len());
        BlockLayout {
            blocks,
            page_width,
            page_height,
        }
    }

    /// Group fragments into line segments: a fixed fraction of each
    /// fragment's height as the Y tolerance, split wherever the horizontal
    /// gap inside a band exceeds `horizontal_gap_threshold` font sizes.
    fn group_lines(&self, fragments: &[TextFragment]) -> Vec<Line> {
        let mut sorted: Vec<TextFragment> = fragments
            .iter()
            .filter(|f| !f.text.trim().is_empty())
            .cloned()
            .collect();
        sort_top_to_bottom(&mut sorted);

        let mut bands: Vec<Vec<TextFragment>> = Vec::new();
        let mut current: Vec<TextFragment> = Vec::new();
        for fragment in sorted {
            if let Some(first) = current.first() {
                let tolerance = first.effective_height() * self.config.line_tolerance;
                if (fragment.y - first.y).abs() > tolerance {
                    bands.push(std::mem::take(&mut current));
                }
            }
            current.push(fragment);
        }
        if !current.is_empty() {
            bands.push(current);
        }

        let mut lines = Vec::new();
        for mut band in bands {
            band.sort_by(|a, b| a.x.total_cmp(&b.x));
            let mut segment: Vec<TextFragment> = Vec::new();
            for fragment in band {
                if let Some(prev) = segment.last() {
                    let max_gap = prev.effective_font_size() * self.config.horizontal_gap_threshold;
                    if fragment.x - prev.right() > max_gap {
                        lines.push(Line::from_fragments(std::mem::take(&mut segment)));
                    }
                }
                segment.push(fragment);
            }
            if !segment.is_empty() {
                lines.push(Line::from_fragments(segment));
            }
        }
        lines
    }

    /// Attach each line (top to bottom) to the most recent block whose last
    /// line it continues; otherwise open a new block.
    fn cluster(&self, lines: Vec<Line>) -> Vec<Block> {
        if lines.is_empty() {
            return vec![];
        }
        let average_height = lines.iter().map(|l| l.height).sum::<f32>() / lines.len() as f32;
        let max_gap = average_height * self.config.vertical_gap_threshold;

        let mut groups: Vec<Vec<Line>> = Vec::new();
        for line in lines {
            let target = groups.iter().rposition(|group| {
                group
                    .last()
                    .map(|prev| self.continues(prev, &line, max_gap))
                    .unwrap_or(false)
            });
            match target {
                Some(i) => groups[i].push(line),
                None => groups.push(vec![line]),
            }
        }
        groups.into_iter().map(Block::from_lines).collect()
    }

    fn continues(&self, prev: &Line, line: &Line, max_gap: f32) -> bool {
        let gap = prev.bbox.y - line.bbox.top();
        let font_size = prev.average_font_size.max(line.average_font_size);
        let indent_jump = (line.bbox.x - prev.bbox.x).abs();
        gap <= max_gap
            && prev.bbox.overlaps_horizontally(&line.bbox)
            && indent_jump <= font_size * self.config.horizontal_gap_threshold
    }

    /// Single pass: each block absorbs into the first earlier block it
    /// overlaps by more than `overlap_ratio` of the smaller area.
    fn merge_overlapping(&self, blocks: Vec<Block>) -> Vec<Block> {
        let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            let target = merged.iter_mut().find(|m| {
                let smaller = m.bbox.area().min(block.bbox.area());
                smaller > 0.0 && m.bbox.intersection_area(&block.bbox) > smaller * self.config.overlap_ratio
            });
            match target {
                Some(target) => target.absorb(block),
                None => merged.push(block),
            }
        }
        merged
    }
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn row_of(bbox: &BBox) -> i64 {
    (bbox.top() / ROW_TOLERANCE).floor() as i64
}
