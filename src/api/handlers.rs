use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};

use super::models::*;
use crate::config::ServerConfig;
use crate::error::Error;
use crate::io::source::fetch;
use crate::overlay::{convert_bytes, validate_center, ForecastUnit};

/// Shared state of the API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

/// Failure of an API request, rendered as `{"error": ...}`
#[derive(Debug)]
pub enum ApiError {
    MissingUrl,
    BadRequest(String),
    Conversion(Error),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conversion(Error::InputRange(_)) => StatusCode::BAD_REQUEST,
            ApiError::Conversion(Error::NoData { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conversion(e) if e.is_decode() => StatusCode::BAD_GATEWAY,
            ApiError::Conversion(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::MissingUrl => "Missing URL".to_string(),
            ApiError::BadRequest(message) | ApiError::Internal(message) => message.clone(),
            ApiError::Conversion(e) if e.is_decode() => {
                format!("forecast layer unavailable: {}", e)
            }
            ApiError::Conversion(e) => e.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::Conversion(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", message);
        } else {
            warn!(status = status.as_u16(), "{}", message);
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn parse_coordinate(name: &str, raw: Option<&str>) -> Result<f64, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::BadRequest(format!("Missing {}", name)))?;
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {}: {}", name, raw)))
}

/// `GET /api/tif?url=&lat=&lng=`: fetches a forecast layer and returns it
/// as a PNG overlay
pub async fn get_tif(
    State(state): State<AppState>,
    Query(query): Query<TifQuery>,
) -> Result<Json<TifResponse>, ApiError> {
    let start = Instant::now();

    let path = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::MissingUrl)?;
    let lat = parse_coordinate("lat", query.lat.as_deref())?;
    let lng = parse_coordinate("lng", query.lng.as_deref())?;
    validate_center(lat, lng)?;

    if state.config.forecast_base_url.trim().is_empty() {
        return Err(ApiError::Internal("Forecast base URL is not configured".to_string()));
    }
    let url = state.config.forecast_url(path).ok_or_else(|| {
        ApiError::BadRequest(format!("URL must be a path on the forecast server: {}", path))
    })?;
    let body = fetch(&state.client, &url, state.config.max_raster_bytes).await?;

    let overlay = tokio::task::spawn_blocking(move || convert_bytes(&body, lat, lng))
        .await
        .map_err(|e| ApiError::Internal(format!("Conversion task failed: {}", e)))??;

    let unit = ForecastUnit::from_path(path);
    info!(
        url = %url,
        width = overlay.width,
        height = overlay.height,
        unit = %unit,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Served overlay"
    );

    Ok(Json(TifResponse {
        status_code: 200,
        data: OverlayPayload::new(&overlay, unit),
    }))
}

pub async fn health() -> &'static str {
    "ok"
}
