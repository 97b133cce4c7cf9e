//! Move typewritten label crops into their own directory for OCR

use super::{create_dir, sorted_files, stem_of, RunContext};
use anyhow::{Context as _, Result};
use clap::Args;
use label_finder_common::Category;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Args, Debug, Clone)]
pub struct TypewrittenCommand {
    /// Directory of label crops written by results-to-labels
    #[arg(long)]
    label_dir: PathBuf,

    /// Destination for the typewritten crops
    #[arg(long)]
    typewritten_dir: PathBuf,
}

/// Whether a crop file name marks a typewritten label
pub fn is_typewritten(path: &Path) -> bool {
    let marker = format!("_{}_", Category::Typewritten.name());
    stem_of(path).contains(&marker)
}

/// Rename, falling back to copy and delete across filesystems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    std::fs::remove_file(from).with_context(|| format!("Failed to remove {}", from.display()))
}

impl TypewrittenCommand {
    pub fn execute(self, _ctx: &RunContext) -> Result<()> {
        let start = Instant::now();
        info!("=== Label Finder: typewritten started ===");

        create_dir(&self.typewritten_dir)?;

        let mut moved = 0;
        for path in sorted_files(&self.label_dir)?
            .into_iter()
            .filter(|p| is_typewritten(p))
        {
            let Some(name) = path.file_name() else {
                continue;
            };
            let target = self.typewritten_dir.join(name);
            move_file(&path, &target)?;
            debug!("Moved {}", target.display());
            moved += 1;
        }

        info!(
            "Moved {} typewritten labels to {}",
            moved,
            self.typewritten_dir.display()
        );
        info!(
            "=== typewritten finished in {:.2}s ===",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
