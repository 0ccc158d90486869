//! Document rendering pipeline.
//!
//! `builder` turns jobs/topsheets into the backend-agnostic block model in
//! `model`; `html`, `pdf` and `xlsx` are the thin per-format adapters. All
//! three consume the same `DocumentStyle`.

pub mod builder;
pub mod html;
pub mod model;
pub mod pdf;
pub mod style;
pub mod xlsx;

pub use model::{Document, DocumentKind};
pub use style::{DateFormat, DocumentStyle, StyleOverrides};

use std::path::Path;

/// Output backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Pdf,
    Xlsx,
}

impl OutputFormat {
    pub fn from_string(s: &str) -> Self {
        match s {
            "html" => OutputFormat::Html,
            "xlsx" => OutputFormat::Xlsx,
            _ => OutputFormat::Pdf,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Html => "text/html; charset=utf-8",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

/// Read an image asset referenced from the style configuration.
///
/// A missing or unreadable asset degrades the render (the block is
/// skipped) instead of aborting it; the caller decides what to draw.
pub(crate) fn read_image_bytes(assets_path: &Path, reference: &str) -> Option<Vec<u8>> {
    let path = assets_path.join(reference);
    match std::fs::read(&path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(asset = %path.display(), error = %e, "Image asset unreachable, skipping");
            None
        }
    }
}
