//! Layout detectors.
//!
//! Each detector is a pure function of its input: configuration is fixed at
//! construction and nothing is cached between calls. Detectors never fail;
//! empty input yields an empty layout.
//!
//! - [`ColumnDetector`]: column bands from whitespace gutters
//! - [`LineDetector`]: fragments sharing a Y band
//! - [`BlockDetector`]: spatial clusters of lines
//! - [`ReadingOrderDetector`]: spanning and per-column sections in reading order
//! - [`ParagraphDetector`]: paragraphs and their style
//! - [`HeadingDetector`]: headings and levels
//! - [`ListDetector`]: lists and nesting
//! - [`HeaderFooterDetector`]: running headers and footers across pages

mod block;
mod column;
mod header_footer;
mod heading;
mod line;
mod list;
mod nesting;
mod paragraph;
pub mod patterns;
mod reading_order;

pub use block::{Block, BlockDetector, BlockDetectorConfig, BlockLayout};
pub use column::{Column, ColumnDetector, ColumnDetectorConfig, ColumnGap, ColumnLayout};
pub use header_footer::{
    HeaderFooterDetector, HeaderFooterDetectorConfig, HeaderFooterRegion, HeaderFooterResult,
    RegionType,
};
pub use heading::{
    Heading, HeadingDetector, HeadingDetectorConfig, HeadingLayout, HeadingLevel, OutlineEntry,
};
pub use line::{
    compute_spacing, reorder_lines, CoordinateSystem, Line, LineAlignment, LineDetector,
    LineDetectorConfig, LineLayout,
};
pub use list::{BulletStyle, List, ListDetector, ListDetectorConfig, ListItem, ListLayout, ListType};
pub use paragraph::{
    Paragraph, ParagraphDetector, ParagraphDetectorConfig, ParagraphLayout, ParagraphStyle,
};
pub use reading_order::{
    detect_coordinate_system, detect_direction, ReadingDirection, ReadingOrderConfig,
    ReadingOrderDetector, ReadingOrderLayout, ReadingSection, SectionType,
};
