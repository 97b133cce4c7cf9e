pub mod build_expedition;
pub mod inference_data;
pub mod reconcile;
pub mod results_to_labels;
pub mod training_data;
pub mod typewritten;

use crate::config::Config;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Settings shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub config: Config,
    /// Hide progress bars
    pub quiet: bool,
}

/// Regular files directly inside `dir`, sorted by name
pub(crate) fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// File stem as an owned string, empty when the path has none
pub(crate) fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_files_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let names: Vec<String> = sorted_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_stem_of() {
        assert_eq!(stem_of(Path::new("dir/sheet_1.jpg")), "sheet_1");
        assert_eq!(stem_of(Path::new("")), "");
    }
}
