//! Training record builder: label CSV rows -> per-sheet YOLO label lines

use crate::codec::{to_normalized, ImageSize};
use crate::geometry::BoundingBox;
use crate::label_line::LabelLine;
use crate::{ReconcileError, Result};
use label_finder_common::Category;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One row of the training label CSV.
///
/// An empty `class` marks a sheet with no labels; it is still used as a
/// negative training example.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrainingRow {
    /// Path to the herbarium sheet image
    pub path: String,
    /// Label class name, or empty
    #[serde(default)]
    pub class: String,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
}

impl TrainingRow {
    fn bbox(&self) -> Result<BoundingBox> {
        let get = |value: Option<f64>, field: &'static str| {
            value.ok_or(ReconcileError::MissingField(field))
        };
        Ok(BoundingBox::new(
            get(self.left, "left")?,
            get(self.top, "top")?,
            get(self.right, "right")?,
            get(self.bottom, "bottom")?,
        ))
    }
}

/// Labels for one sheet image, in pixel coordinates of the original image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSheet {
    /// Image path as given in the first row seen for this sheet
    pub path: String,
    pub labels: Vec<(Category, BoundingBox)>,
}

/// Training sheets keyed by image file stem
#[derive(Debug, Clone, Default)]
pub struct TrainingSheets {
    sheets: BTreeMap<String, TrainingSheet>,
    rows: usize,
}

impl TrainingSheets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group rows by sheet, stopping at the first bad row
    pub fn from_rows<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a TrainingRow>,
    {
        let mut sheets = Self::new();
        for row in rows {
            sheets.add_row(row)?;
        }
        Ok(sheets)
    }

    /// Add one CSV row. A row without a class only registers the sheet.
    ///
    /// # Errors
    ///
    /// Unknown class names, missing or non-finite coordinates. The error names
    /// the sheet stem; `NonFiniteBox::index` is the 0-based data row.
    pub fn add_row(&mut self, row: &TrainingRow) -> Result<()> {
        let row_index = self.rows;
        self.rows += 1;

        let stem = sheet_stem(&row.path);
        let entry = self
            .sheets
            .entry(stem.clone())
            .or_insert_with(|| TrainingSheet {
                path: row.path.clone(),
                labels: Vec::new(),
            });

        if row.class.is_empty() {
            return Ok(());
        }

        let labeled = || -> Result<(Category, BoundingBox)> {
            let category: Category = row.class.parse()?;
            let bbox = row.bbox()?;
            if !bbox.is_finite() {
                return Err(ReconcileError::NonFiniteBox {
                    index: row_index,
                    bbox,
                });
            }
            Ok((category, bbox))
        };

        let label = labeled().map_err(|e| e.in_sheet(&stem))?;
        entry.labels.push(label);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    #[must_use]
    pub fn get(&self, stem: &str) -> Option<&TrainingSheet> {
        self.sheets.get(stem)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrainingSheet)> {
        self.sheets.iter().map(|(stem, sheet)| (stem.as_str(), sheet))
    }
}

/// File stem of a sheet path, or the whole string when it has none
fn sheet_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Encode pixel labels against the original image size
#[must_use]
pub fn build_label_lines(labels: &[(Category, BoundingBox)], size: ImageSize) -> Vec<LabelLine> {
    labels
        .iter()
        .map(|(category, bbox)| LabelLine::new(*category, to_normalized(bbox, size)))
        .collect()
}

/// Label file contents: one line per label, newline terminated
#[must_use]
pub fn render_label_file(lines: &[LabelLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(path: &str, class: &str, bbox: [f64; 4]) -> TrainingRow {
        TrainingRow {
            path: path.to_string(),
            class: class.to_string(),
            left: Some(bbox[0]),
            top: Some(bbox[1]),
            right: Some(bbox[2]),
            bottom: Some(bbox[3]),
        }
    }

    fn negative(path: &str) -> TrainingRow {
        TrainingRow {
            path: path.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rows_group_by_stem() {
        let rows = vec![
            row("sheets/a.jpg", "Typewritten", [0.0, 0.0, 10.0, 10.0]),
            row("sheets/a.jpg", "Other", [20.0, 20.0, 30.0, 30.0]),
            negative("sheets/b.jpg"),
        ];
        let sheets = TrainingSheets::from_rows(&rows).unwrap();

        assert_eq!(sheets.len(), 2);
        let a = sheets.get("a").unwrap();
        assert_eq!(a.path, "sheets/a.jpg");
        assert_eq!(a.labels.len(), 2);
        assert!(sheets.get("b").unwrap().labels.is_empty());
    }

    #[test]
    fn test_negative_row_after_labels_keeps_labels() {
        let mut sheets = TrainingSheets::new();
        sheets
            .add_row(&row("a.jpg", "Other", [0.0, 0.0, 1.0, 1.0]))
            .unwrap();
        sheets.add_row(&negative("a.jpg")).unwrap();
        assert_eq!(sheets.get("a").unwrap().labels.len(), 1);
    }

    #[test]
    fn test_unknown_class_is_an_error() {
        let mut sheets = TrainingSheets::new();
        let err = sheets
            .add_row(&row("a.jpg", "Barcode", [0.0, 0.0, 1.0, 1.0]))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Barcode"));
        assert!(message.contains('a'));
    }

    #[test]
    fn test_missing_coordinate_is_an_error() {
        let mut bad = row("a.jpg", "Other", [0.0, 0.0, 1.0, 1.0]);
        bad.bottom = None;
        let mut sheets = TrainingSheets::new();
        let err = sheets.add_row(&bad).unwrap_err();
        assert!(err.to_string().contains("bottom"));
    }

    #[test]
    fn test_label_file_rendering() {
        let size = ImageSize::new(100, 100).unwrap();
        let lines = build_label_lines(
            &[
                (Category::Typewritten, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
                (Category::Other, BoundingBox::new(50.0, 20.0, 69.0, 39.0)),
            ],
            size,
        );
        assert_eq!(
            render_label_file(&lines),
            "1 0.050000 0.050000 0.110000 0.110000\n0 0.595000 0.295000 0.200000 0.200000\n"
        );
        assert_eq!(render_label_file(&[]), "");
    }
}
