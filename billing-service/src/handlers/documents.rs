use std::path::PathBuf;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::documents::builder::{
    build_bulk_documents, build_job_document, build_topsheet_document,
};
use crate::documents::{
    html::render_html, pdf::render_pdf, xlsx::render_xlsx, Document, DocumentKind, DocumentStyle,
    OutputFormat, StyleOverrides,
};
use crate::dtos::{BulkRenderRequest, RenderQuery};
use crate::middleware::OwnerId;
use crate::services::metrics::{DOCUMENTS_RENDERED_TOTAL, ERRORS_TOTAL, RENDER_DURATION};
use crate::startup::AppState;

/// Key under which the stored style overrides live in the settings store.
const STYLE_SETTING_KEY: &str = "document_style";

/// Resolve the effective style for one render call:
/// defaults <- stored settings row <- per-request overrides.
async fn resolve_style(
    state: &AppState,
    owner_id: Uuid,
    request_overrides: Option<StyleOverrides>,
) -> Result<DocumentStyle, AppError> {
    let stored = match state.db.get_setting(owner_id, STYLE_SETTING_KEY).await? {
        Some(setting) => match serde_json::from_value::<StyleOverrides>(setting.value) {
            Ok(overrides) => Some(overrides),
            Err(e) => {
                tracing::warn!(error = %e, "Stored document style is malformed, ignoring");
                None
            }
        },
        None => None,
    };

    Ok(DocumentStyle::merged(
        stored.as_ref(),
        request_overrides.as_ref(),
    ))
}

fn parse_style_param(raw: Option<&str>) -> Result<Option<StyleOverrides>, AppError> {
    match raw {
        None => Ok(None),
        Some(json) => serde_json::from_str(json)
            .map(Some)
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid style overrides: {}", e))),
    }
}

/// Run one composition on the blocking pool under the configured timeout.
/// A timeout surfaces as a distinct failure; the caller never receives a
/// partial body.
async fn compose(
    state: &AppState,
    format: OutputFormat,
    documents: Vec<Document>,
    style: DocumentStyle,
) -> Result<Vec<u8>, AppError> {
    let assets_path = PathBuf::from(&state.config.render.assets_path);
    let timeout = state.config.render.timeout();
    let timer = RENDER_DURATION
        .with_label_values(&[format.extension()])
        .start_timer();

    let task = tokio::task::spawn_blocking(move || match format {
        OutputFormat::Html => Ok(render_html(&documents, &style).into_bytes()),
        OutputFormat::Pdf => render_pdf(&documents, &style, &assets_path),
        OutputFormat::Xlsx => render_xlsx(&documents, &style, &assets_path),
    });

    let bytes = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| {
            ERRORS_TOTAL.with_label_values(&["render_timeout"]).inc();
            AppError::Timeout(format!(
                "Render timed out after {} seconds",
                timeout.as_secs()
            ))
        })?
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Render task failed: {}", e)))?
        .map_err(|e| {
            ERRORS_TOTAL.with_label_values(&["render_failed"]).inc();
            e
        })?;

    timer.observe_duration();
    Ok(bytes)
}

fn attachment_response(
    format: OutputFormat,
    filename: String,
    bytes: Vec<u8>,
) -> impl IntoResponse {
    (
        [
            (
                header::CONTENT_TYPE,
                format.content_type().to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
}

/// Render one job document. The document type defaults to the job's
/// current lifecycle status.
pub async fn render_job_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(job_id): Path<Uuid>,
    Query(query): Query<RenderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state
        .db
        .get_job_snapshot(owner_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;
    let customer = state
        .db
        .get_customer(owner_id, snapshot.job.customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    let kind = DocumentKind::from_string(query.doc_type.as_deref().unwrap_or(&snapshot.job.status));
    let format = OutputFormat::from_string(query.format.as_deref().unwrap_or("pdf"));
    let overrides = parse_style_param(query.style.as_deref())?;
    let style = resolve_style(&state, owner_id, overrides).await?;

    let document = build_job_document(&snapshot, &customer, kind, &style, None);
    let filename = document.suggested_filename(format.extension());

    let bytes = compose(&state, format, vec![document], style).await?;

    DOCUMENTS_RENDERED_TOTAL
        .with_label_values(&[kind.as_str(), format.extension()])
        .inc();
    tracing::info!(job_id = %job_id, doc_type = %kind.as_str(), format = %format.extension(), "Document rendered");

    Ok(attachment_response(format, filename, bytes))
}

/// Render a batch of jobs as one document: one page (PDF/HTML) or one
/// worksheet (XLSX) per job, each numbered with a `-{index}` suffix.
pub async fn render_bulk_documents(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<BulkRenderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.job_ids.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "job_ids must not be empty"
        )));
    }

    let snapshots = state
        .db
        .get_job_snapshots(owner_id, &request.job_ids)
        .await?;
    if snapshots.len() != request.job_ids.len() {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "One or more jobs not found"
        )));
    }

    let mut jobs = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        let customer = state
            .db
            .get_customer(owner_id, snapshot.job.customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;
        jobs.push((snapshot, customer));
    }

    let kind = DocumentKind::from_string(request.doc_type.as_deref().unwrap_or("bill"));
    let format = OutputFormat::from_string(request.format.as_deref().unwrap_or("pdf"));
    let style = resolve_style(&state, owner_id, request.style.clone()).await?;

    let documents = build_bulk_documents(&jobs, kind, &style);
    let filename = documents
        .first()
        .map(|d| d.suggested_filename(format.extension()))
        .unwrap_or_else(|| format!("documents.{}", format.extension()));
    let count = documents.len();

    let bytes = compose(&state, format, documents, style).await?;

    DOCUMENTS_RENDERED_TOTAL
        .with_label_values(&[kind.as_str(), format.extension()])
        .inc_by(count as f64);
    tracing::info!(jobs = count, doc_type = %kind.as_str(), format = %format.extension(), "Bulk documents rendered");

    Ok(attachment_response(format, filename, bytes))
}

/// Render the topsheet listing document.
pub async fn render_topsheet_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(topsheet_id): Path<Uuid>,
    Query(query): Query<RenderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let topsheet = state
        .db
        .get_topsheet(owner_id, topsheet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Topsheet not found")))?;
    let members = state
        .db
        .topsheet_member_snapshots(owner_id, topsheet_id)
        .await?;

    let format = OutputFormat::from_string(query.format.as_deref().unwrap_or("pdf"));
    let overrides = parse_style_param(query.style.as_deref())?;
    let style = resolve_style(&state, owner_id, overrides).await?;

    let document = build_topsheet_document(&topsheet, &members, &style);
    let filename = document.suggested_filename(format.extension());

    let bytes = compose(&state, format, vec![document], style).await?;

    DOCUMENTS_RENDERED_TOTAL
        .with_label_values(&["topsheet", format.extension()])
        .inc();
    tracing::info!(topsheet_id = %topsheet_id, format = %format.extension(), "Topsheet document rendered");

    Ok(attachment_response(format, filename, bytes))
}
