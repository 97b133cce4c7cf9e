//! Resize sheets listed in a CSV into YOLO model inputs

use super::{create_dir, RunContext};
use crate::progress::sheet_progress;
use crate::sheet_image::{open_sheet, resize_square, save_as};
use anyhow::{Context as _, Result};
use clap::Args;
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct InferenceDataCommand {
    /// CSV with a `path` column naming each sheet image
    #[arg(long, value_name = "CSV")]
    sheet_csv: PathBuf,

    /// Output directory for resized sheet images
    #[arg(long)]
    yolo_images: PathBuf,

    /// Side of the square model input (default 640)
    #[arg(long)]
    yolo_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SheetRow {
    path: String,
}

fn read_sheet_paths(path: &Path) -> Result<Vec<PathBuf>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open sheet CSV: {}", path.display()))?;
    rdr.deserialize::<SheetRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map(|r| PathBuf::from(r.path))
                .with_context(|| format!("Bad sheet CSV record {}", i + 1))
        })
        .collect()
}

impl InferenceDataCommand {
    pub fn execute(self, ctx: &RunContext) -> Result<()> {
        let start = Instant::now();
        info!("=== Label Finder: inference-data started ===");

        let yolo_size = self.yolo_size.unwrap_or_else(|| ctx.config.yolo_size());
        create_dir(&self.yolo_images)?;
        let sheets = read_sheet_paths(&self.sheet_csv)?;

        let pb = sheet_progress(sheets.len(), ctx.quiet, "sheets");
        let prepared = sheets
            .par_iter()
            .filter(|path| {
                let result = open_sheet(path).and_then(|image| {
                    save_as(&resize_square(&image, yolo_size), &self.yolo_images, path)
                });
                pb.inc(1);
                if let Err(e) = &result {
                    warn!("Skipping {}: {}", path.display(), e);
                }
                result.is_ok()
            })
            .count();
        pb.finish_and_clear();

        info!(
            "Resized {} of {} sheets to {}px",
            prepared,
            sheets.len(),
            yolo_size
        );
        info!(
            "=== inference-data finished in {:.2}s ===",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
