use axum::{extract::Request, middleware::Next, response::Response};

use crate::services::metrics::HTTP_REQUESTS_TOTAL;

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&path, &status])
        .inc();

    response
}
