//! Build YOLO training images and label files from a label CSV

use super::{create_dir, RunContext};
use crate::progress::sheet_progress;
use crate::sheet_image::{image_size, open_sheet, resize_square, save_as};
use anyhow::{Context as _, Result};
use clap::Args;
use label_finder_common::FinderError;
use label_finder_reconcile::{
    build_label_lines, render_label_file, TrainingRow, TrainingSheet, TrainingSheets,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Args, Debug, Clone)]
pub struct TrainingDataCommand {
    /// CSV with columns path,class,left,top,right,bottom
    #[arg(long, value_name = "CSV")]
    label_csv: PathBuf,

    /// Output directory for resized sheet images
    #[arg(long)]
    yolo_images: PathBuf,

    /// Output directory for YOLO label files
    #[arg(long)]
    yolo_labels: PathBuf,

    /// Side of the square model input (default 640)
    #[arg(long)]
    yolo_size: Option<u32>,
}

/// Read and group a training label CSV
pub fn read_training_csv(path: &Path) -> Result<TrainingSheets> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open label CSV: {}", path.display()))?;
    let rows = rdr
        .deserialize::<TrainingRow>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Bad label CSV record {}", i + 1)))
        .collect::<Result<Vec<_>>>()?;
    Ok(TrainingSheets::from_rows(&rows)?)
}

impl TrainingDataCommand {
    pub fn execute(self, ctx: &RunContext) -> Result<()> {
        let start = Instant::now();
        info!("=== Label Finder: training-data started ===");

        let yolo_size = self.yolo_size.unwrap_or_else(|| ctx.config.yolo_size());
        create_dir(&self.yolo_images)?;
        create_dir(&self.yolo_labels)?;

        let sheets = read_training_csv(&self.label_csv)?;
        info!("Preparing {} training sheets at {}px", sheets.len(), yolo_size);

        let work: Vec<(&str, &TrainingSheet)> = sheets.iter().collect();
        let pb = sheet_progress(work.len(), ctx.quiet, "sheets");
        let prepared = work
            .par_iter()
            .map(|&(stem, sheet)| {
                let result = self.prepare_sheet(stem, sheet, yolo_size);
                pb.inc(1);
                match result {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Skipping {}: {}", sheet.path, e);
                        false
                    }
                }
            })
            .filter(|&ok| ok)
            .count();
        pb.finish_and_clear();

        info!(
            "Prepared {} sheets ({} skipped)",
            prepared,
            work.len() - prepared
        );
        info!(
            "=== training-data finished in {:.2}s ===",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn prepare_sheet(
        &self,
        stem: &str,
        sheet: &TrainingSheet,
        yolo_size: u32,
    ) -> label_finder_common::Result<()> {
        let source = Path::new(&sheet.path);
        let image = open_sheet(source)?;
        let size = image_size(&image)?;
        save_as(&resize_square(&image, yolo_size), &self.yolo_images, source)?;

        // Labels are normalized, so they are encoded against the original size
        let lines = build_label_lines(&sheet.labels, size);
        let label_path = self.yolo_labels.join(format!("{stem}.txt"));
        std::fs::write(&label_path, render_label_file(&lines)).map_err(FinderError::from)?;
        debug!("{}: {} labels", stem, lines.len());
        Ok(())
    }
}
