//! Shrink herbarium sheets for a volunteer expedition and write its manifest

use super::{create_dir, sorted_files, RunContext};
use crate::progress::sheet_progress;
use crate::sheet_image::{open_sheet, reduce, save_as};
use anyhow::{Context as _, Result};
use clap::Args;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

pub const MANIFEST_FILE: &str = "manifest.csv";

#[derive(Args, Debug, Clone)]
pub struct BuildExpeditionCommand {
    /// Directory of full size sheet images
    #[arg(long)]
    sheet_dir: PathBuf,

    /// Where to write the reduced images and the manifest
    #[arg(long)]
    expedition_dir: PathBuf,

    /// Shrink each image dimension by this factor
    #[arg(long, default_value = "1")]
    reduce_by: u32,
}

impl BuildExpeditionCommand {
    pub fn execute(self, ctx: &RunContext) -> Result<()> {
        let start = Instant::now();
        info!("=== Label Finder: build-expedition started ===");

        create_dir(&self.expedition_dir)?;
        let sheets = sorted_files(&self.sheet_dir)?;
        info!(
            "Reducing {} sheets by {}",
            sheets.len(),
            self.reduce_by.max(1)
        );

        let pb = sheet_progress(sheets.len(), ctx.quiet, "sheets");
        let written: Vec<Option<String>> = sheets
            .par_iter()
            .map(|path| {
                let name = self.prepare_sheet(path);
                pb.inc(1);
                name
            })
            .collect();
        pb.finish_and_clear();

        let names: Vec<String> = written.into_iter().flatten().collect();
        let skipped = sheets.len() - names.len();
        self.write_manifest(&names)?;

        info!(
            "Wrote {} sheets ({} skipped) to {}",
            names.len(),
            skipped,
            self.expedition_dir.display()
        );
        info!(
            "=== build-expedition finished in {:.2}s ===",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Reduce one sheet; returns its file name, or `None` if it was skipped
    fn prepare_sheet(&self, path: &Path) -> Option<String> {
        let result = open_sheet(path)
            .and_then(|image| save_as(&reduce(&image, self.reduce_by), &self.expedition_dir, path));
        match result {
            Ok(saved) => saved
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            Err(e) => {
                warn!("Could not prepare {}: {}", path.display(), e);
                None
            }
        }
    }

    fn write_manifest(&self, names: &[String]) -> Result<()> {
        let path = self.expedition_dir.join(MANIFEST_FILE);
        let mut wtr = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create manifest: {}", path.display()))?;
        wtr.write_record(["Filename", "reduced_by"])?;
        let reduced_by = self.reduce_by.max(1).to_string();
        for name in names {
            wtr.write_record([name.as_str(), reduced_by.as_str()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    #[test]
    fn test_build_expedition() {
        let sheets = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        RgbImage::new(40, 30)
            .save(sheets.path().join("b.png"))
            .unwrap();
        RgbImage::new(9, 9).save(sheets.path().join("a.png")).unwrap();
        std::fs::write(sheets.path().join("broken.png"), b"not an image").unwrap();

        let expedition_dir = out.path().join("expedition");
        let cmd = BuildExpeditionCommand {
            sheet_dir: sheets.path().to_path_buf(),
            expedition_dir: expedition_dir.clone(),
            reduce_by: 4,
        };
        let ctx = RunContext {
            quiet: true,
            ..Default::default()
        };
        cmd.execute(&ctx).unwrap();

        let reduced = image::open(expedition_dir.join("b.png")).unwrap();
        assert_eq!(reduced.dimensions(), (10, 8));
        let reduced = image::open(expedition_dir.join("a.png")).unwrap();
        assert_eq!(reduced.dimensions(), (3, 3));
        assert!(!expedition_dir.join("broken.png").exists());

        let manifest = std::fs::read_to_string(expedition_dir.join(MANIFEST_FILE)).unwrap();
        assert_eq!(manifest, "Filename,reduced_by\na.png,4\nb.png,4\n");
    }
}
