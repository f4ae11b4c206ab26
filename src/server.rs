//! HTTP surface: `GET /api/data/generate` returns a CSV download.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{Datelike, Local};
use tracing::{error, info};

use crate::encoder::{encode_csv, CsvSchema};
use crate::generator::Generator;
use crate::request::{CountLimits, GenerateParams};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    pub limits: CountLimits,
    pub download_filename: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/data/generate", get(generate))
        .route("/health", get(health))
        .with_state(state)
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// GET /api/data/generate
async fn generate(State(state): State<AppState>, Query(params): Query<GenerateParams>) -> Response {
    let current_year = Local::now().year();
    let request = match params.validate(state.limits, current_year) {
        Ok(r) => r,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let generator = Arc::clone(&state.generator);
    let joined = tokio::task::spawn_blocking(move || {
        let records = generator.generate(&request, &mut rand::thread_rng())?;
        encode_csv(&records, CsvSchema::Full)
    })
    .await;

    match joined {
        Ok(Ok(body)) => {
            info!(bytes = body.len(), "served generated CSV");
            let disposition = format!("attachment; filename=\"{}.csv\"", state.download_filename);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=UTF-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Ok(Err(e)) => {
            error!(error = %e, "generation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error generating data: {e}")).into_response()
        }
        Err(e) => {
            error!(error = %e, "generation task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error generating data".to_string()).into_response()
        }
    }
}

pub async fn serve(addr: &str, state: AppState) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
