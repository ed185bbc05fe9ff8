use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::domain::StudyAccession;
use crate::error::MetasheetError;
use crate::service::Archiver;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Structured error body returned for retrieval misses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub exception_id: String,
    pub description: String,
    pub data: ErrorData,
}

#[derive(Debug, Serialize)]
pub struct ErrorData {
    pub study_accession: String,
}

pub fn router(archiver: Arc<Archiver>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/studies/{accession}", get(get_study_workbook))
        .layer(TraceLayer::new_for_http())
        .with_state(archiver)
}

pub async fn serve(addr: SocketAddr, archiver: Arc<Archiver>) -> Result<(), MetasheetError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| MetasheetError::Server(err.to_string()))?;
    info!("listening on {addr}");
    axum::serve(listener, router(archiver))
        .await
        .map_err(|err| MetasheetError::Server(err.to_string()))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "OK"}))
}

async fn get_study_workbook(
    State(archiver): State<Arc<Archiver>>,
    Path(accession): Path<String>,
) -> Response {
    // An accession that fails validation cannot exist in either store, so it
    // gets the same unified not-found body as a miss.
    let parsed: StudyAccession = match accession.parse() {
        Ok(parsed) => parsed,
        Err(_) => return not_found(&accession),
    };

    match archiver.retrieve_workbook(&parsed).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{parsed}.xlsx\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(MetasheetError::MetadataNotFound(_)) => not_found(&accession),
        Err(err) => {
            error!("failed to retrieve workbook for {parsed}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn not_found(accession: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            exception_id: "metadataNotFoundError".to_string(),
            description: "Metadata for study accession not found.".to_string(),
            data: ErrorData {
                study_accession: accession.to_string(),
            },
        }),
    )
        .into_response()
}
