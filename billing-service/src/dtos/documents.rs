//! Request DTOs for document rendering endpoints.

use serde::Deserialize;
use uuid::Uuid;

use crate::documents::StyleOverrides;

/// Query parameters for single-document render endpoints.
///
/// `style` carries optional per-request overrides as a JSON-encoded
/// `StyleOverrides` object; it takes precedence over the stored settings
/// row, which takes precedence over the hardcoded defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderQuery {
    pub doc_type: Option<String>,
    pub format: Option<String>,
    pub style: Option<String>,
}

/// Body for the bulk render endpoint: one page/sheet per job.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkRenderRequest {
    pub job_ids: Vec<Uuid>,
    pub doc_type: Option<String>,
    pub format: Option<String>,
    pub style: Option<StyleOverrides>,
}
