//! Collapse a box group into one consensus label

use crate::geometry::BoundingBox;
use crate::{ReconcileError, Result};
use label_finder_common::{Category, CATEGORIES};
use serde::{Deserialize, Serialize};

/// One reconciled label: the merged box and the winning class for a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusLabel {
    /// Sheet identifier (image file name)
    pub sheet: String,
    /// Enclosing box, already multiplied by the expansion factor
    pub bbox: BoundingBox,
    /// Majority class
    pub category: Category,
}

/// Check an expansion factor before it is applied to boxes
pub fn validate_expansion(expand_by: f64) -> Result<()> {
    if expand_by.is_finite() && expand_by > 0.0 {
        Ok(())
    } else {
        Err(ReconcileError::InvalidExpansion(expand_by))
    }
}

/// Get the outside dimensions of the boxes, scaled by `expand_by`.
///
/// `expand_by` undoes the reduction applied to expedition images, so every
/// edge is multiplied by it, shifting the box as well as growing it.
/// Boxes with a NaN or infinite edge are rejected, never folded in.
pub fn merge_boxes(boxes: &[BoundingBox], expand_by: f64) -> Result<BoundingBox> {
    validate_expansion(expand_by)?;
    if let Some((index, bbox)) = boxes.iter().enumerate().find(|(_, b)| !b.is_finite()) {
        return Err(ReconcileError::NonFiniteBox {
            index,
            bbox: *bbox,
        });
    }
    let (first, rest) = boxes.split_first().ok_or(ReconcileError::EmptyGroup)?;
    let enclosing = rest.iter().fold(*first, |acc, b| acc.union(b));
    Ok(enclosing.scaled(expand_by))
}

/// Get the most common class.
///
/// Ties go to the category listed first in `TIE_BREAK_PRIORITY`, so with the
/// current two classes `Typewritten` needs a strict majority to win.
#[must_use]
pub fn merge_votes(votes: &[Category]) -> Category {
    let mut counts = [0usize; CATEGORIES.len()];
    for vote in votes {
        counts[vote.index()] += 1;
    }

    CATEGORIES
        .iter()
        .copied()
        .max_by(|a, b| {
            counts[a.index()]
                .cmp(&counts[b.index()])
                .then_with(|| b.tie_break_rank().cmp(&a.tie_break_rank()))
        })
        .unwrap_or(Category::Other)
}
