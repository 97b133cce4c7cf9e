//! Per-sheet accumulation of volunteer boxes and votes

use crate::geometry::BoundingBox;
use label_finder_common::Category;
use std::collections::BTreeMap;

/// Raw boxes drawn on one sheet and the class vote that came with each box.
///
/// `boxes[i]` and `votes[i]` always belong together. A sheet with no boxes
/// is a negative example: no label present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    boxes: Vec<BoundingBox>,
    votes: Vec<Category>,
}

impl Sheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one volunteer box with its class vote
    pub fn push(&mut self, bbox: BoundingBox, vote: Category) {
        self.boxes.push(bbox);
        self.votes.push(vote);
    }

    #[must_use]
    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    #[must_use]
    pub fn votes(&self) -> &[Category] {
        &self.votes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl FromIterator<(BoundingBox, Category)> for Sheet {
    fn from_iter<I: IntoIterator<Item = (BoundingBox, Category)>>(iter: I) -> Self {
        let mut sheet = Sheet::new();
        for (bbox, vote) in iter {
            sheet.push(bbox, vote);
        }
        sheet
    }
}

/// All sheets of an input pass, keyed by sheet identifier.
///
/// Built once while reading the annotation export; iteration is in sheet id
/// order so repeated runs emit the same output.
#[derive(Debug, Clone, Default)]
pub struct SheetBook {
    sheets: BTreeMap<String, Sheet>,
}

impl SheetBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a volunteer box for `sheet`, creating the sheet on first sight
    pub fn add_box(&mut self, sheet: &str, bbox: BoundingBox, vote: Category) {
        self.entry(sheet).push(bbox, vote);
    }

    /// Register `sheet` without adding any box
    pub fn add_negative(&mut self, sheet: &str) {
        self.entry(sheet);
    }

    fn entry(&mut self, sheet: &str) -> &mut Sheet {
        self.sheets.entry(sheet.to_string()).or_default()
    }

    #[must_use]
    pub fn get(&self, sheet: &str) -> Option<&Sheet> {
        self.sheets.get(sheet)
    }

    /// Number of sheets, including negatives
    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Total number of raw boxes across all sheets
    #[must_use]
    pub fn box_count(&self) -> usize {
        self.sheets.values().map(Sheet::len).sum()
    }

    /// Keep only the first `limit` sheets that have boxes, in id order.
    /// Negative sheets are dropped: they yield no labels.
    pub fn truncate(&mut self, limit: usize) {
        let mut kept = 0;
        self.sheets.retain(|_, sheet| {
            if sheet.is_empty() || kept >= limit {
                return false;
            }
            kept += 1;
            true
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(id, sheet)| (id.as_str(), sheet))
    }
}
