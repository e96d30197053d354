use crate::boundary::BoundarySource;
use crate::canvas::MapCanvas;
use crate::config::AppConfig;
use crate::data::{is_supported_file, load_sheet_from_bytes, SheetError};
use crate::error::MapError;
use crate::pipeline::generate;
use crate::samples::{workbook_bytes, SampleKind};
use crate::store::MapStore;
use crate::types::{RenderMode, RenderRequest, Theme};
use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct AppState {
    pub boundaries: Arc<dyn BoundarySource + Send + Sync>,
    pub store: MapStore,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub map_url: String,
    pub download_url: String,
    pub points_count: usize,
    pub map_type: &'static str,
    pub theme: &'static str,
    pub data_type: &'static str,
    pub has_quantity: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

/// Failure reported to the client as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<MapError> for ApiError {
    fn from(err: MapError) -> Self {
        let status = match &err {
            e if e.is_user_error() => StatusCode::BAD_REQUEST,
            MapError::BoundaryDataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<SheetError> for ApiError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::Io(e) => Self::internal(e.to_string()),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{err:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self.message);
        } else {
            warn!("Request rejected: {}", self.message);
        }
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .route("/map/:filename", get(view_handler))
        .route("/download/:filename", get(download_handler))
        .route("/exemplo", get(sample_coordinates))
        .route("/exemplo-estados", get(sample_states))
        .route("/exemplo-municipios", get(sample_municipalities))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let state = Arc::new(AppState {
        boundaries: Arc::new(config.boundaries.source()),
        store: MapStore::new(&config.output.maps_dir),
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.host))?;

    info!("Starting server on http://{}", addr);
    info!("Maps are written to {:?}", config.output.maps_dir);

    let app = router(state, config.server.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn form_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::bad_request(format!("Malformed upload: {err}"))
}

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut map_type = String::from("tradicional");
    let mut theme = String::from("claro");

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(form_error)?;
                file = Some((file_name, bytes.to_vec()));
            }
            "map_type" => map_type = field.text().await.map_err(form_error)?,
            "theme" => theme = field.text().await.map_err(form_error)?,
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if file_name.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if !is_supported_file(&file_name) {
        return Err(ApiError::bad_request(
            "File type not allowed. Use .xlsx, .xls or .csv",
        ));
    }

    let request = RenderRequest::new(RenderMode::from_str(&map_type), Theme::from_str(&theme));
    info!(
        "Upload {} ({} bytes), requested {} / {}",
        file_name,
        bytes.len(),
        request.requested_mode,
        request.theme.name()
    );

    let worker_state = state.clone();
    let (map, saved_name) = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let sheet = load_sheet_from_bytes(&file_name, bytes)?;
        let map = generate(&sheet, request, worker_state.boundaries.as_ref())?;
        let html = map.artifact.finalize()?;
        let saved_name = worker_state
            .store
            .save(map.effective_mode, request.theme, &html)?;
        Ok((map, saved_name))
    })
    .await
    .map_err(|e| ApiError::internal(format!("Map worker failed: {e}")))??;

    if let Some(warning) = map.warning {
        warn!("{}", warning);
    }

    let count = map.record_count();
    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "Map {} ({}) generated successfully! {} points processed.",
            map.effective_mode,
            request.theme.name(),
            count
        ),
        map_url: format!("/map/{saved_name}"),
        download_url: format!("/download/{saved_name}"),
        points_count: count,
        map_type: map.effective_mode.name(),
        theme: request.theme.name(),
        data_type: map.shape.name(),
        has_quantity: map.has_quantity,
        warning: map.warning,
    }))
}

fn read_map(state: &AppState, filename: &str) -> Result<String, Response> {
    match state.store.load(filename) {
        Ok(Some(html)) => Ok(html),
        Ok(None) | Err(_) => Err((StatusCode::NOT_FOUND, "Map not found").into_response()),
    }
}

async fn view_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    match read_map(&state, &filename) {
        Ok(html) => Html(html).into_response(),
        Err(resp) => resp,
    }
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    match read_map(&state, &filename) {
        Ok(html) => (
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"mapa_coordenadas_{filename}\""),
                ),
            ],
            html,
        )
            .into_response(),
        Err(resp) => resp,
    }
}

fn sample_response(kind: SampleKind) -> Response {
    match workbook_bytes(kind) {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", kind.download_name()),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => ApiError::internal(format!("Failed to build sample: {e}")).into_response(),
    }
}

async fn sample_coordinates() -> Response {
    sample_response(SampleKind::Coordinates)
}

async fn sample_states() -> Response {
    sample_response(SampleKind::States)
}

async fn sample_municipalities() -> Response {
    sample_response(SampleKind::Municipalities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryKind;
    use crate::types::DataShape;

    #[test]
    fn test_user_errors_are_bad_requests() {
        let err = ApiError::from(MapError::EmptyDataset {
            shape: DataShape::Coordinates,
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ApiError::from(MapError::Schema {
            field: "latitude",
            available: vec!["foo".into()],
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("foo"));
    }

    #[test]
    fn test_missing_boundaries_are_unavailable() {
        let err = ApiError::from(MapError::BoundaryDataUnavailable {
            kind: BoundaryKind::Municipality,
            reason: "timed out".into(),
        });
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_bad_file_is_bad_request() {
        let err = ApiError::from(SheetError::UnsupportedFormat("pdf".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_warning_omitted_when_absent() {
        let resp = UploadResponse {
            success: true,
            message: "ok".into(),
            map_url: "/map/a.html".into(),
            download_url: "/download/a.html".into(),
            points_count: 1,
            map_type: "traditional",
            theme: "light",
            data_type: "coordinates",
            has_quantity: false,
            warning: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("warning").is_none());
        assert_eq!(json["points_count"], 1);
    }
}
