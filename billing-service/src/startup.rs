use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::BillingConfig;
use crate::handlers;
use crate::services::Database;

#[derive(Clone)]
pub struct AppState {
    pub config: BillingConfig,
    pub db: Database,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: BillingConfig) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            e
        })?;

        let state = AppState {
            config: config.clone(),
            db,
        };

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .route(
            "/customers",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/customers/:id",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/jobs",
            post(handlers::jobs::create_job).get(handlers::jobs::list_jobs),
        )
        .route(
            "/jobs/:id",
            get(handlers::jobs::get_job)
                .put(handlers::jobs::update_job)
                .delete(handlers::jobs::delete_job),
        )
        .route("/jobs/:id/expenses", post(handlers::jobs::create_expense))
        .route("/expenses/:id", axum::routing::put(handlers::jobs::update_expense))
        .route(
            "/jobs/:id/document",
            get(handlers::documents::render_job_document),
        )
        .route(
            "/documents/bulk",
            post(handlers::documents::render_bulk_documents),
        )
        .route(
            "/topsheets",
            post(handlers::topsheets::create_topsheet).get(handlers::topsheets::list_topsheets),
        )
        .route(
            "/topsheets/:id",
            get(handlers::topsheets::get_topsheet)
                .put(handlers::topsheets::update_topsheet)
                .delete(handlers::topsheets::delete_topsheet),
        )
        .route(
            "/topsheets/:id/document",
            get(handlers::documents::render_topsheet_document),
        )
        .route("/dashboard/monthly", get(handlers::dashboard::monthly_summary))
        .route(
            "/settings/:key",
            get(handlers::settings::get_setting).put(handlers::settings::put_setting),
        )
        .layer(axum::middleware::from_fn(
            crate::middleware::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
