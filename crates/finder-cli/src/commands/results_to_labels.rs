//! Cut predicted labels out of the sheets using YOLO result files

use super::{create_dir, sorted_files, stem_of, RunContext};
use crate::progress::sheet_progress;
use crate::sheet_image::{crop_label, dotted_extension, image_size, label_file_name, open_sheet};
use anyhow::{Context as _, Result};
use clap::Args;
use label_finder_reconcile::{parse_label_file, to_absolute};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Args, Debug, Clone)]
pub struct ResultsToLabelsCommand {
    /// Directory of YOLO result label files (*.txt)
    #[arg(long)]
    yolo_labels: PathBuf,

    /// Directory of the full size sheet images
    #[arg(long)]
    sheet_dir: PathBuf,

    /// Output directory for the label crops
    #[arg(long)]
    label_dir: PathBuf,
}

impl ResultsToLabelsCommand {
    pub fn execute(self, ctx: &RunContext) -> Result<()> {
        let start = Instant::now();
        info!("=== Label Finder: results-to-labels started ===");

        create_dir(&self.label_dir)?;
        let sheets: HashMap<String, PathBuf> = sorted_files(&self.sheet_dir)?
            .into_iter()
            .map(|path| (stem_of(&path), path))
            .collect();

        let results: Vec<(PathBuf, PathBuf)> = sorted_files(&self.yolo_labels)?
            .into_iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .filter_map(|path| match sheets.get(&stem_of(&path)) {
                Some(sheet) => Some((path, sheet.clone())),
                None => {
                    warn!("No sheet image for {}", path.display());
                    None
                }
            })
            .collect();

        let pb = sheet_progress(results.len(), ctx.quiet, "sheets");
        let crops: Vec<usize> = results
            .par_iter()
            .map(|(label_file, sheet)| {
                let written = self.cut_labels(label_file, sheet);
                pb.inc(1);
                written
            })
            .collect::<Result<_>>()?;
        pb.finish_and_clear();

        info!(
            "Wrote {} label crops from {} sheets",
            crops.iter().sum::<usize>(),
            results.len()
        );
        info!(
            "=== results-to-labels finished in {:.2}s ===",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Crop every label in `label_file` out of `sheet`; returns the crop count.
    /// An unreadable sheet is skipped, a malformed label file is an error.
    fn cut_labels(&self, label_file: &Path, sheet: &Path) -> Result<usize> {
        let contents = std::fs::read_to_string(label_file)
            .with_context(|| format!("Failed to read {}", label_file.display()))?;
        let labels = parse_label_file(&contents)
            .with_context(|| format!("Malformed label file {}", label_file.display()))?;

        let image = match open_sheet(sheet) {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping {}: {}", sheet.display(), e);
                return Ok(0);
            }
        };
        let size = image_size(&image)?;
        let stem = stem_of(sheet);
        let ext = dotted_extension(sheet);

        let mut written = 0;
        for label in &labels {
            let bbox = to_absolute(&label.bbox, size);
            let Some(crop) = crop_label(&image, &bbox) else {
                debug!("{}: label {:?} lies outside the sheet", stem, bbox);
                continue;
            };
            let target = self
                .label_dir
                .join(label_file_name(&stem, label.category, &bbox, &ext));
            crop.save(&target)
                .with_context(|| format!("Failed to save {}", target.display()))?;
            written += 1;
        }
        Ok(written)
    }
}
