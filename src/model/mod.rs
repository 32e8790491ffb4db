//! Input model types for layout analysis.
//!
//! This module defines what the upstream content-stream parser hands over:
//! positioned text fragments grouped into pages. Everything downstream is
//! derived from these values and never mutates them.

mod document;
mod fragment;
mod geometry;
mod page;

pub use document::Document;
pub use fragment::{TextDirection, TextFragment};
pub use geometry::BBox;
pub use page::{average_fragment_length, Page};
