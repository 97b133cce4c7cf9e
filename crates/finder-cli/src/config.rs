//! Configuration loading for label-finder.
//!
//! Values come from three places, highest priority first: command-line
//! flags, the TOML config file, built-in defaults.

use anyhow::{Context, Result};
use label_finder_reconcile::ReconcileConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "label-finder.toml";

/// Default column holding the sheet image file name in expedition exports
pub const DEFAULT_SHEET_COLUMN: &str = "subject_Filename";

/// Default prefix of the box coordinate columns in expedition exports
pub const DEFAULT_BOX_COLUMNS: &str = "Box(es): box #";

/// Default prefix of the box class columns in expedition exports
pub const DEFAULT_CLASS_COLUMNS: &str = "Box(es): select #";

/// Default square image size fed to the YOLO model
pub const DEFAULT_YOLO_SIZE: u32 = 640;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    pub reconcile: Option<ReconcileSection>,
    pub yolo: Option<YoloSection>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ReconcileSection {
    /// `iou_threshold` and `expand_by`; absent keys take the library defaults
    #[serde(flatten)]
    pub params: ReconcileConfig,
    pub sheet_column: Option<String>,
    pub box_columns: Option<String>,
    pub class_columns: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct YoloSection {
    pub image_size: Option<u32>,
}

impl Config {
    fn reconcile_value<T>(&self, get: impl Fn(&ReconcileSection) -> Option<T>) -> Option<T> {
        self.reconcile.as_ref().and_then(get)
    }

    /// Reconcile parameters from the file, defaults where unset
    pub fn reconcile_params(&self) -> ReconcileConfig {
        self.reconcile_value(|r| Some(r.params)).unwrap_or_default()
    }

    pub fn sheet_column(&self) -> String {
        self.reconcile_value(|r| r.sheet_column.clone())
            .unwrap_or_else(|| DEFAULT_SHEET_COLUMN.to_string())
    }

    pub fn box_columns(&self) -> String {
        self.reconcile_value(|r| r.box_columns.clone())
            .unwrap_or_else(|| DEFAULT_BOX_COLUMNS.to_string())
    }

    pub fn class_columns(&self) -> String {
        self.reconcile_value(|r| r.class_columns.clone())
            .unwrap_or_else(|| DEFAULT_CLASS_COLUMNS.to_string())
    }

    /// Get the YOLO image size.
    /// Returns configured value or default (640).
    pub fn yolo_size(&self) -> u32 {
        self.yolo
            .as_ref()
            .and_then(|y| y.image_size)
            .unwrap_or(DEFAULT_YOLO_SIZE)
    }
}

/// Resolve which config file to read: the explicit path, else the default
/// file name in the working directory
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config =
        toml::from_str(&contents).context("Failed to parse config file as TOML")?;
    Ok(config)
}
