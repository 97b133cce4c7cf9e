//! Box reconciliation for the label finder
//!
//! Volunteers each draw their own bounding box around every label on a
//! herbarium sheet, so one physical label usually arrives as several slightly
//! different boxes. This crate turns those into one consensus label per
//! region and converts boxes to and from the normalized YOLO representation.
//!
//! # Features
//! - Greedy overlap grouping driven by an `IoU` threshold
//! - Box merging (enclosing rectangle) and class voting with a fixed tie-break
//! - Pixel <-> normalized center/extent coordinate codec
//! - YOLO label line formatting and parsing
//! - Per-sheet pipeline that can fan out across sheets with Rayon
//!
//! # Example
//! ```
//! use label_finder_common::Category;
//! use label_finder_reconcile::{BoundingBox, ReconcileConfig, Reconciler, SheetBook};
//!
//! # fn main() -> Result<(), label_finder_reconcile::ReconcileError> {
//! let mut sheets = SheetBook::new();
//! sheets.add_box("sheet_001.jpg", BoundingBox::new(100.0, 100.0, 400.0, 400.0), Category::Typewritten);
//! sheets.add_box("sheet_001.jpg", BoundingBox::new(110.0, 110.0, 410.0, 410.0), Category::Typewritten);
//!
//! let reconciler = Reconciler::new(ReconcileConfig::default())?;
//! let labels = reconciler.reconcile_all(&sheets)?;
//! assert_eq!(labels.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod geometry;
pub mod grouping;
pub mod label_line;
pub mod merge;
pub mod pipeline;
pub mod sheet;
pub mod training;

pub use codec::{to_absolute, to_normalized, ImageSize, NormalizedBox};
pub use geometry::BoundingBox;
pub use grouping::{find_box_groups, group_members, DisjointSet};
pub use label_line::{parse_label_file, parse_label_line, LabelLine};
pub use merge::{merge_boxes, merge_votes, ConsensusLabel};
pub use pipeline::{ReconcileConfig, Reconciler};
pub use sheet::{Sheet, SheetBook};
pub use training::{
    build_label_lines, render_label_file, TrainingRow, TrainingSheet, TrainingSheets,
};

use label_finder_common::FinderError;
use thiserror::Error;

/// Error types for box reconciliation
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("IoU threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Expansion factor must be a positive finite number, got {0}")]
    InvalidExpansion(f64),

    #[error("Box #{index} has non-finite coordinates: {bbox:?}")]
    NonFiniteBox { index: usize, bbox: BoundingBox },

    #[error("Missing value for {0}")]
    MissingField(&'static str),

    #[error("Cannot merge an empty box group")]
    EmptyGroup,

    #[error("Image size must be positive, got {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Sheet {sheet}: {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: Box<ReconcileError>,
    },

    #[error(transparent)]
    Common(#[from] FinderError),
}

impl ReconcileError {
    /// Attach the sheet identifier so the caller can find the bad input row
    #[must_use]
    pub fn in_sheet(self, sheet: &str) -> Self {
        match self {
            already @ ReconcileError::Sheet { .. } => already,
            other => ReconcileError::Sheet {
                sheet: sheet.to_string(),
                source: Box::new(other),
            },
        }
    }
}

impl From<ReconcileError> for FinderError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Common(inner) => inner,
            other => FinderError::Other(other.to_string()),
        }
    }
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
