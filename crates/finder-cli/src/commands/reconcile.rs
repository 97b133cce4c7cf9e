//! Reconcile volunteer boxes from an expedition export into one box per label

use super::RunContext;
use crate::expedition::{read_unreconciled, write_reconciled, ExpeditionColumns};
use crate::progress::sheet_progress;
use anyhow::{Context as _, Result};
use clap::Args;
use label_finder_reconcile::{ReconcileConfig, Reconciler};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ReconcileCommand {
    /// Unreconciled expedition CSV
    #[arg(long, value_name = "CSV")]
    unreconciled: PathBuf,

    /// Output CSV of reconciled labels
    #[arg(long, value_name = "CSV")]
    reconciled: PathBuf,

    /// Boxes overlap when their IoU is at least this (default 0.6)
    #[arg(long)]
    iou_threshold: Option<f64>,

    /// Factor the expedition images were reduced by (default 1)
    #[arg(long)]
    expand_by: Option<f64>,

    /// Column holding the sheet file name
    #[arg(long)]
    sheet_column: Option<String>,

    /// Header prefix of the box JSON columns
    #[arg(long)]
    box_columns: Option<String>,

    /// Header prefix of the box class columns
    #[arg(long)]
    class_columns: Option<String>,

    /// Only reconcile the first N sheets that have boxes (by sheet name)
    #[arg(long)]
    limit: Option<usize>,
}

impl ReconcileCommand {
    pub fn execute(self, ctx: &RunContext) -> Result<()> {
        let start = Instant::now();
        info!("=== Label Finder: reconcile started ===");

        let from_file = ctx.config.reconcile_params();
        let config = ReconcileConfig {
            iou_threshold: self.iou_threshold.unwrap_or(from_file.iou_threshold),
            expand_by: self.expand_by.unwrap_or(from_file.expand_by),
        };
        let reconciler = Reconciler::new(config).context("Invalid reconcile settings")?;

        let columns = ExpeditionColumns {
            sheet_column: self.sheet_column.unwrap_or_else(|| ctx.config.sheet_column()),
            box_prefix: self.box_columns.unwrap_or_else(|| ctx.config.box_columns()),
            class_prefix: self
                .class_columns
                .unwrap_or_else(|| ctx.config.class_columns()),
        };

        let input = File::open(&self.unreconciled).with_context(|| {
            format!("Failed to open unreconciled CSV: {}", self.unreconciled.display())
        })?;
        let mut sheets = read_unreconciled(input, &columns)
            .with_context(|| format!("Failed to read {}", self.unreconciled.display()))?;
        info!(
            "Read {} sheets with {} boxes",
            sheets.len(),
            sheets.box_count()
        );

        if let Some(limit) = self.limit {
            sheets.truncate(limit);
            info!("Limited to the first {} sheets", sheets.len());
        }

        let pb = sheet_progress(sheets.len(), ctx.quiet, "sheets");
        let labels = reconciler.reconcile_all_with(&sheets, |_, _| pb.inc(1))?;
        pb.finish_and_clear();

        let output = File::create(&self.reconciled).with_context(|| {
            format!("Failed to create reconciled CSV: {}", self.reconciled.display())
        })?;
        write_reconciled(BufWriter::new(output), &labels)?;

        info!(
            "Wrote {} labels to {}",
            labels.len(),
            self.reconciled.display()
        );
        info!(
            "=== reconcile finished in {:.2}s ===",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
