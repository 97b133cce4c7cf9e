use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Per-sheet progress bar; hidden when `quiet` is set
pub fn sheet_progress(len: usize, quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let pb = ProgressBar::new(len as u64);
    pb.set_style(style);
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_bar_is_hidden() {
        let pb = sheet_progress(10, true, "sheets");
        assert!(pb.is_hidden());
        pb.inc(3);
        assert_eq!(pb.position(), 3);
    }

    #[test]
    fn test_bar_length() {
        let pb = sheet_progress(7, false, "sheets");
        assert_eq!(pb.length(), Some(7));
        pb.finish_and_clear();
    }
}
