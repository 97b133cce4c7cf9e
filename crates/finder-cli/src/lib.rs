//! Label finder command-line tools.
//!
//! Dataset preparation for the YOLO herbarium label finder and reconciliation
//! of volunteer-drawn label boxes from expedition exports.

pub mod commands;
pub mod config;
pub mod expedition;
pub mod progress;
pub mod sheet_image;
