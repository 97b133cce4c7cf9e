//! Expedition CSV readers and writers.
//!
//! An unreconciled export has one row per volunteer classification. Every
//! box a volunteer drew sits in its own JSON cell (`Box(es): box #1`, ...)
//! and the class picked for it in a matching select column
//! (`Box(es): select #1`, ...).

use anyhow::{bail, Context, Result};
use label_finder_common::Category;
use label_finder_reconcile::{BoundingBox, ConsensusLabel, SheetBook};
use serde::Deserialize;
use std::io::{Read, Write};
use tracing::debug;

/// Header names used to find the sheet id, box and class columns
#[derive(Debug, Clone)]
pub struct ExpeditionColumns {
    pub sheet_column: String,
    pub box_prefix: String,
    pub class_prefix: String,
}

/// Box cell contents. Extra keys (tool labels, details) are ignored.
#[derive(Debug, Deserialize)]
struct BoxCell {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

/// A box column and the class column its vote is read from
#[derive(Debug, Clone, PartialEq)]
struct BoxColumn {
    index: usize,
    name: String,
    vote: Option<usize>,
}

/// Pair box columns with class columns by the suffix after their prefixes.
/// Unpaired box columns take the first unused class column.
fn pair_columns(headers: &csv::StringRecord, columns: &ExpeditionColumns) -> Vec<BoxColumn> {
    let boxes: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| h.strip_prefix(columns.box_prefix.as_str()).map(|s| (i, s)))
        .collect();
    let classes: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| h.strip_prefix(columns.class_prefix.as_str()).map(|s| (i, s)))
        .collect();

    let mut used = vec![false; classes.len()];
    let mut paired: Vec<BoxColumn> = boxes
        .iter()
        .map(|&(index, suffix)| {
            let vote = classes.iter().position(|&(_, s)| s == suffix);
            if let Some(k) = vote {
                used[k] = true;
            }
            BoxColumn {
                index,
                name: headers[index].to_string(),
                vote: vote.map(|k| classes[k].0),
            }
        })
        .collect();

    for column in paired.iter_mut().filter(|c| c.vote.is_none()) {
        if let Some(k) = used.iter().position(|u| !u) {
            used[k] = true;
            column.vote = Some(classes[k].0);
        }
    }

    paired
}

/// Read an unreconciled expedition export into per-sheet boxes and votes.
///
/// Rows without any box register their sheet as a negative. Malformed box
/// JSON aborts with the CSV line and column.
pub fn read_unreconciled<R: Read>(reader: R, columns: &ExpeditionColumns) -> Result<SheetBook> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV header")?.clone();

    let Some(sheet_index) = headers.iter().position(|h| h == columns.sheet_column) else {
        bail!("Missing sheet column {:?}", columns.sheet_column);
    };
    let box_columns = pair_columns(&headers, columns);
    debug!(
        "Found {} box columns for prefix {:?}",
        box_columns.len(),
        columns.box_prefix
    );

    let mut sheets = SheetBook::new();
    for record in rdr.records() {
        let record = record.context("Failed to read CSV record")?;
        let line = record.position().map_or(0, csv::Position::line);
        let sheet = record.get(sheet_index).unwrap_or_default();

        let mut drawn = 0;
        for column in &box_columns {
            let cell = record.get(column.index).unwrap_or_default().trim();
            if cell.is_empty() {
                continue;
            }
            let parsed: BoxCell = serde_json::from_str(cell).with_context(|| {
                format!("Invalid box JSON at line {line}, column {:?}", column.name)
            })?;
            let vote = column
                .vote
                .and_then(|i| record.get(i))
                .map_or(Category::Other, |v| Category::from_expedition_vote(v.trim()));

            sheets.add_box(
                sheet,
                BoundingBox::new(parsed.left, parsed.top, parsed.right, parsed.bottom),
                vote,
            );
            drawn += 1;
        }

        if drawn == 0 {
            sheets.add_negative(sheet);
        }
    }

    Ok(sheets)
}

/// Write consensus labels as `sheet,left,top,right,bottom,class`
pub fn write_reconciled<W: Write>(writer: W, labels: &[ConsensusLabel]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["sheet", "left", "top", "right", "bottom", "class"])?;
    for label in labels {
        wtr.write_record([
            label.sheet.clone(),
            label.bbox.left.to_string(),
            label.bbox.top.to_string(),
            label.bbox.right.to_string(),
            label.bbox.bottom.to_string(),
            label.category.name().to_string(),
        ])?;
    }
    wtr.flush().context("Failed to flush reconciled CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> ExpeditionColumns {
        ExpeditionColumns {
            sheet_column: "subject_Filename".to_string(),
            box_prefix: "Box(es): box #".to_string(),
            class_prefix: "Box(es): select #".to_string(),
        }
    }

    fn cell(left: u32, top: u32, right: u32, bottom: u32) -> String {
        format!(
            "\"{{\"\"left\"\": {left}, \"\"top\"\": {top}, \"\"right\"\": {right}, \"\"bottom\"\": {bottom}}}\""
        )
    }

    #[test]
    fn test_read_pairs_boxes_with_votes() {
        let csv = format!(
            "subject_Filename,Box(es): box #1,Box(es): select #1,Box(es): box #2,Box(es): select #2\n\
             a.jpg,{},Typewritten,{},Handwritten\n\
             a.jpg,{},Typewritten,,\n\
             b.jpg,,,,\n",
            cell(10, 10, 100, 50),
            cell(200, 300, 260, 330),
            cell(12, 9, 98, 52),
        );

        let sheets = read_unreconciled(csv.as_bytes(), &columns()).unwrap();
        assert_eq!(sheets.len(), 2);

        let a = sheets.get("a.jpg").unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.boxes()[1], BoundingBox::new(200.0, 300.0, 260.0, 330.0));
        assert_eq!(
            a.votes(),
            &[Category::Typewritten, Category::Other, Category::Typewritten]
        );
        assert!(sheets.get("b.jpg").unwrap().is_empty());
    }

    #[test]
    fn test_unmatched_box_column_takes_free_vote() {
        let csv = format!(
            "subject_Filename,Box(es): box #A,Box(es): select #1\n\
             a.jpg,{},Typewritten\n",
            cell(0, 0, 5, 5),
        );
        let sheets = read_unreconciled(csv.as_bytes(), &columns()).unwrap();
        assert_eq!(sheets.get("a.jpg").unwrap().votes(), &[Category::Typewritten]);
    }

    #[test]
    fn test_box_without_any_vote_column_is_other() {
        let csv = format!("subject_Filename,Box(es): box #1\na.jpg,{}\n", cell(0, 0, 5, 5));
        let sheets = read_unreconciled(csv.as_bytes(), &columns()).unwrap();
        assert_eq!(sheets.get("a.jpg").unwrap().votes(), &[Category::Other]);
    }

    #[test]
    fn test_malformed_json_names_the_line() {
        let csv = "subject_Filename,Box(es): box #1\na.jpg,\nb.jpg,\"{\"\"left\"\": 1\"\n";
        let err = read_unreconciled(csv.as_bytes(), &columns()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("line 3"), "{message}");
    }

    #[test]
    fn test_missing_sheet_column() {
        let csv = "Filename,Box(es): box #1\na.jpg,\n";
        let err = read_unreconciled(csv.as_bytes(), &columns()).unwrap_err();
        assert!(err.to_string().contains("subject_Filename"));
    }

    #[test]
    fn test_write_reconciled() {
        let labels = vec![ConsensusLabel {
            sheet: "a.jpg".to_string(),
            bbox: BoundingBox::new(40.0, 36.0, 400.5, 208.0),
            category: Category::Typewritten,
        }];
        let mut out = Vec::new();
        write_reconciled(&mut out, &labels).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "sheet,left,top,right,bottom,class\na.jpg,40,36,400.5,208,Typewritten\n"
        );
    }
}
