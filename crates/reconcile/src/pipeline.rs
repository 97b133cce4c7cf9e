//! Sheet-by-sheet reconciliation: group, merge, emit

use crate::grouping::{find_box_groups, group_members, validate_threshold};
use crate::merge::{merge_boxes, merge_votes, validate_expansion, ConsensusLabel};
use crate::sheet::{Sheet, SheetBook};
use crate::Result;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, info};

/// Configuration for reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Two boxes overlap when their `IoU` is at least this value (0.0-1.0)
    pub iou_threshold: f64,
    /// Factor the expedition images were reduced by; merged boxes are
    /// multiplied by it to get back to original pixels
    pub expand_by: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.6,
            expand_by: 1.0,
        }
    }
}

impl ReconcileConfig {
    /// Check both parameters before any sheet is processed
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.iou_threshold)?;
        validate_expansion(self.expand_by)
    }
}

/// Reconciles volunteer boxes into consensus labels
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    /// Create a reconciler; fails if the configuration is out of range
    pub fn new(config: ReconcileConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Reconciler initialized: iou_threshold={}, expand_by={}",
            config.iou_threshold, config.expand_by
        );
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile one sheet. Returns one label per box group, in group order.
    ///
    /// A sheet without boxes yields no labels. Errors carry the sheet id.
    pub fn reconcile_sheet(&self, sheet_id: &str, sheet: &Sheet) -> Result<Vec<ConsensusLabel>> {
        self.reconcile_sheet_inner(sheet_id, sheet)
            .map_err(|e| e.in_sheet(sheet_id))
    }

    fn reconcile_sheet_inner(&self, sheet_id: &str, sheet: &Sheet) -> Result<Vec<ConsensusLabel>> {
        let groups = find_box_groups(sheet.boxes(), self.config.iou_threshold)?;
        let members = group_members(&groups);

        let mut labels = Vec::with_capacity(members.len());
        for indices in &members {
            let boxes: Vec<_> = indices.iter().map(|&i| sheet.boxes()[i]).collect();
            let votes: Vec<_> = indices.iter().map(|&i| sheet.votes()[i]).collect();

            labels.push(ConsensusLabel {
                sheet: sheet_id.to_string(),
                bbox: merge_boxes(&boxes, self.config.expand_by)?,
                category: merge_votes(&votes),
            });
        }

        debug!(
            "Sheet {}: {} boxes -> {} labels",
            sheet_id,
            sheet.len(),
            labels.len()
        );

        Ok(labels)
    }

    /// Reconcile every sheet in parallel.
    ///
    /// Output is grouped by sheet in sheet id order; each sheet's labels are
    /// complete and contiguous.
    pub fn reconcile_all(&self, sheets: &SheetBook) -> Result<Vec<ConsensusLabel>> {
        self.reconcile_all_with(sheets, |_, _| {})
    }

    /// Same as [`Reconciler::reconcile_all`], calling `on_sheet` with the
    /// sheet id and its label count as each sheet finishes (from worker
    /// threads, in no particular order).
    pub fn reconcile_all_with<F>(
        &self,
        sheets: &SheetBook,
        on_sheet: F,
    ) -> Result<Vec<ConsensusLabel>>
    where
        F: Fn(&str, usize) + Sync + Send,
    {
        let work: Vec<(&str, &Sheet)> = sheets.iter().collect();

        let per_sheet: Vec<Vec<ConsensusLabel>> = work
            .par_iter()
            .map(|&(sheet_id, sheet)| {
                let labels = self.reconcile_sheet(sheet_id, sheet)?;
                on_sheet(sheet_id, labels.len());
                Ok(labels)
            })
            .collect::<Result<_>>()?;

        let labels: Vec<ConsensusLabel> = per_sheet.into_iter().flatten().collect();

        info!(
            "Reconciled {} sheets ({} boxes) into {} labels",
            sheets.len(),
            sheets.box_count(),
            labels.len()
        );

        Ok(labels)
    }
}
