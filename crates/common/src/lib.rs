//! Common types and utilities shared by the label finder crates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors surfaced at the boundaries of the label finder tools
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("Unknown label class: {0:?}")]
    UnknownCategory(String),

    #[error("Unknown class index: {0} (known classes: {max})", max = CATEGORIES.len())]
    UnknownClassIndex(usize),

    #[error("Invalid label line {line}: {message}")]
    LabelParse { line: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<image::ImageError> for FinderError {
    fn from(err: image::ImageError) -> Self {
        FinderError::ImageError(err.to_string())
    }
}

/// Result type for label finder operations
pub type Result<T> = std::result::Result<T, FinderError>;

/// Label class drawn by volunteers and predicted by the model.
///
/// The set is closed. Persisted class indices are positions in [`CATEGORIES`],
/// so that table must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Anything that is not typewritten (handwritten, barcodes, mixed)
    Other,
    /// A typewritten or printed label
    Typewritten,
}

/// Ordered category table. Position is the serialized class index.
pub const CATEGORIES: [Category; 2] = [Category::Other, Category::Typewritten];

/// Order used to break ties between equally voted categories (first wins).
pub const TIE_BREAK_PRIORITY: [Category; 2] = [Category::Other, Category::Typewritten];

impl Category {
    /// Class name as written in CSV files and label image names
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Category::Other => "Other",
            Category::Typewritten => "Typewritten",
        }
    }

    /// Class index used in normalized label lines
    #[must_use]
    pub fn index(&self) -> usize {
        CATEGORIES
            .iter()
            .position(|c| c == self)
            .unwrap_or_default()
    }

    /// Look up a category by its class index
    pub fn from_index(index: usize) -> Result<Self> {
        CATEGORIES
            .get(index)
            .copied()
            .ok_or(FinderError::UnknownClassIndex(index))
    }

    /// Fold a raw expedition selection into a category.
    ///
    /// Volunteers pick from a longer list than the model is trained on. Only an
    /// exact `Typewritten` selection counts as typewritten; everything else,
    /// including an empty cell, is `Other`.
    #[must_use]
    pub fn from_expedition_vote(vote: &str) -> Self {
        if vote == Category::Typewritten.name() {
            Category::Typewritten
        } else {
            Category::Other
        }
    }

    /// Position in [`TIE_BREAK_PRIORITY`]; lower wins a tie
    #[must_use]
    pub fn tie_break_rank(&self) -> usize {
        TIE_BREAK_PRIORITY
            .iter()
            .position(|c| c == self)
            .unwrap_or(TIE_BREAK_PRIORITY.len())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self> {
        CATEGORIES
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or_else(|| FinderError::UnknownCategory(s.to_string()))
    }
}
