//! Overlap grouping of redundant boxes
//!
//! Boxes on one sheet are joined whenever their `IoU` reaches the threshold,
//! and joins are transitive: a chain of pairwise matches puts every box of the
//! chain in one group. Groups are the connected components of that match
//! graph, computed with a disjoint-set forest.
//!
//! Group ids are handed out in seed order: the largest remaining box first,
//! with equal areas taken from the highest index down. Downstream label files
//! were numbered this way, so the order is part of the output contract even
//! though the partition itself does not depend on it.

use crate::geometry::BoundingBox;
use crate::{ReconcileError, Result};
use tracing::debug;

/// Disjoint-set forest over `0..len` with path halving and union by size
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    /// Create `len` singleton sets
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of the set containing `x`
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets containing `a` and `b`. Returns false if already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let mut root_a = self.find(a);
        let mut root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        if self.size[root_a] < self.size[root_b] {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        self.parent[root_b] = root_a;
        self.size[root_a] += self.size[root_b];
        true
    }
}

/// Check that an `IoU` threshold lies in `[0, 1]` (rejects NaN)
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ReconcileError::InvalidThreshold(threshold))
    }
}

/// Box indices in seed order: largest area first, ties broken by higher index.
fn seed_order(boxes: &[BoundingBox]) -> Vec<usize> {
    let areas: Vec<f64> = boxes.iter().map(BoundingBox::area).collect();
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    // Stable ascending sort, consumed from the back
    order.sort_by(|&a, &b| areas[a].total_cmp(&areas[b]));
    order.reverse();
    order
}

/// Find overlapping sets of bounding boxes.
///
/// Returns one group id per input box, in input order. Ids start at 1 and
/// follow the seed order described in the module docs. Empty input gives an
/// empty result.
///
/// # Errors
///
/// `InvalidThreshold` when `threshold` is outside `[0, 1]`, and
/// `NonFiniteBox` when any coordinate is NaN or infinite.
pub fn find_box_groups(boxes: &[BoundingBox], threshold: f64) -> Result<Vec<usize>> {
    validate_threshold(threshold)?;

    if let Some((index, bbox)) = boxes.iter().enumerate().find(|(_, b)| !b.is_finite()) {
        return Err(ReconcileError::NonFiniteBox { index, bbox: *bbox });
    }

    if boxes.is_empty() {
        return Ok(Vec::new());
    }

    let mut sets = DisjointSet::new(boxes.len());
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            if boxes[i].iou(&boxes[j]) >= threshold {
                sets.union(i, j);
            }
        }
    }

    let mut root_group = vec![0usize; boxes.len()];
    let mut groups = vec![0usize; boxes.len()];
    let mut next_group = 0;

    for idx in seed_order(boxes) {
        let root = sets.find(idx);
        if root_group[root] == 0 {
            next_group += 1;
            root_group[root] = next_group;
        }
        groups[idx] = root_group[root];
    }

    debug!(
        "Grouped {} boxes into {} groups at IoU >= {}",
        boxes.len(),
        next_group,
        threshold
    );

    Ok(groups)
}

/// Collect box indices per group id.
///
/// Entry `k` holds the members of group `k + 1`, each list in ascending index
/// order.
#[must_use]
pub fn group_members(groups: &[usize]) -> Vec<Vec<usize>> {
    let count = groups.iter().copied().max().unwrap_or(0);
    let mut members = vec![Vec::new(); count];
    for (idx, &group) in groups.iter().enumerate() {
        if group > 0 {
            members[group - 1].push(idx);
        }
    }
    members
}
