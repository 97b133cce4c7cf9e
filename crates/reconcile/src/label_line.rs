//! YOLO label lines: `<class_index> <center_x> <center_y> <width> <height>`

use crate::codec::NormalizedBox;
use label_finder_common::{Category, FinderError, Result};
use std::fmt;

/// One normalized label as written to, or read from, a YOLO label file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLine {
    pub category: Category,
    pub bbox: NormalizedBox,
}

impl LabelLine {
    #[must_use]
    pub fn new(category: Category, bbox: NormalizedBox) -> Self {
        Self { category, bbox }
    }
}

impl fmt::Display for LabelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.category.index(),
            self.bbox.center_x,
            self.bbox.center_y,
            self.bbox.width,
            self.bbox.height
        )
    }
}

/// Parse one label line. `line_num` is 1-based and only used in errors.
///
/// Blank lines yield `Ok(None)`. Tokens after the fifth (a confidence score
/// in model output, for instance) are ignored.
pub fn parse_label_line(line: &str, line_num: usize) -> Result<Option<LabelLine>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().take(5).collect();
    if tokens.len() < 5 {
        return Err(FinderError::LabelParse {
            line: line_num,
            message: format!("expected 5 tokens, found {}", tokens.len()),
        });
    }

    let class_index = tokens[0]
        .parse::<usize>()
        .map_err(|_| FinderError::LabelParse {
            line: line_num,
            message: format!(
                "invalid class index '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;
    let category = Category::from_index(class_index)?;

    let center_x = parse_fraction(tokens[1], "center_x", line_num)?;
    let center_y = parse_fraction(tokens[2], "center_y", line_num)?;
    let width = parse_fraction(tokens[3], "width", line_num)?;
    let height = parse_fraction(tokens[4], "height", line_num)?;

    Ok(Some(LabelLine::new(
        category,
        NormalizedBox::new(center_x, center_y, width, height),
    )))
}

/// Parse every non-blank line of a label file
pub fn parse_label_file(contents: &str) -> Result<Vec<LabelLine>> {
    let mut labels = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if let Some(label) = parse_label_line(line, idx + 1)? {
            labels.push(label);
        }
    }
    Ok(labels)
}

fn parse_fraction(raw: &str, field_name: &str, line_num: usize) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FinderError::LabelParse {
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected a finite number"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_six_decimals() {
        let line = LabelLine::new(
            Category::Typewritten,
            NormalizedBox::new(0.05, 0.05, 0.11, 0.11),
        );
        assert_eq!(line.to_string(), "1 0.050000 0.050000 0.110000 0.110000");
    }

    #[test]
    fn test_parse_valid_line() {
        let label = parse_label_line("0 0.5 0.25 0.1 0.2", 1).unwrap().unwrap();
        assert_eq!(label.category, Category::Other);
        assert_eq!(label.bbox, NormalizedBox::new(0.5, 0.25, 0.1, 0.2));
    }

    #[test]
    fn test_parse_ignores_trailing_confidence() {
        let label = parse_label_line("1 0.5 0.5 0.2 0.2 0.87", 3)
            .unwrap()
            .unwrap();
        assert_eq!(label.category, Category::Typewritten);
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(parse_label_line("   ", 1).unwrap().is_none());
    }

    #[test]
    fn test_parse_short_line() {
        let err = parse_label_line("0 0.5 0.5", 4).unwrap_err();
        assert!(matches!(err, FinderError::LabelParse { line: 4, .. }));
    }

    #[test]
    fn test_parse_unknown_class_index() {
        let err = parse_label_line("7 0.5 0.5 0.1 0.1", 1).unwrap_err();
        assert!(matches!(err, FinderError::UnknownClassIndex(7)));
    }

    #[test]
    fn test_parse_bad_number() {
        let err = parse_label_line("0 0.5 abc 0.1 0.1", 2).unwrap_err();
        assert!(err.to_string().contains("center_y"));
        assert!(parse_label_line("0 0.5 NaN 0.1 0.1", 2).is_err());
    }

    #[test]
    fn test_parse_label_file() {
        let contents = "0 0.5 0.5 0.1 0.1\n\n1 0.2 0.3 0.05 0.05\n";
        let labels = parse_label_file(contents).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].category, Category::Typewritten);
    }
}
