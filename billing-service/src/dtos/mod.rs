pub mod documents;
pub mod jobs;
pub mod topsheets;

pub use documents::{BulkRenderRequest, RenderQuery};
pub use jobs::{
    JobListResponse, JobPayload, JobResponse, JobRow, LineItemPayload, MeasurementPayload,
};
pub use topsheets::{TopsheetPayload, TopsheetResponse};
