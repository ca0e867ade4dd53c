use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ridgeline::{
    ImageSource, PixmapSurface, Progress, RenderError, RenderOutcome, Renderer, Settings, Viewport,
};

/// Slices stay short so one render does not hog a runtime worker.
const SERVER_FRAME_BUDGET: Duration = Duration::from_millis(50);
const MAX_SIDE: u32 = 8192;

type AppState = Arc<Renderer<ImageSource>>;

#[derive(Deserialize)]
struct RenderRequest {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    viewport: Viewport,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Serialize)]
struct RenderResponse {
    image: Option<String>,
    cancelled: bool,
    timings: Vec<TimingEntry>,
    width: u32,
    height: u32,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, err: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn encode_data_url(png: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(png);
    format!("data:image/png;base64,{}", b64)
}

async fn render_handler(
    State(renderer): State<AppState>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let width = req.width.unwrap_or(1024).min(MAX_SIDE);
    let height = req.height.unwrap_or(768).min(MAX_SIDE);
    let mut surface = PixmapSurface::new(width, height).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            RenderError::Surface { width, height },
        )
    })?;

    let outcome = renderer
        .render(&req.viewport, &req.settings, &mut surface)
        .await
        .map_err(|e| match e {
            RenderError::Config(_) | RenderError::Surface { .. } => {
                api_error(StatusCode::BAD_REQUEST, e)
            }
            RenderError::Fetch(_) => {
                error!(error = %e, "render failed");
                api_error(StatusCode::BAD_GATEWAY, e)
            }
        })?;

    let response = match outcome {
        RenderOutcome::Completed(stats) => {
            let png = surface
                .encode_png()
                .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
            RenderResponse {
                image: Some(encode_data_url(&png)),
                cancelled: false,
                timings: stats
                    .timings
                    .iter()
                    .map(|t| TimingEntry {
                        name: t.name.to_string(),
                        ms: t.ms,
                    })
                    .collect(),
                width,
                height,
            }
        }
        RenderOutcome::Cancelled => RenderResponse {
            image: None,
            cancelled: true,
            timings: Vec::new(),
            width,
            height,
        },
    };

    Ok(Json(response))
}

async fn progress_handler(State(renderer): State<AppState>) -> Json<Option<Progress>> {
    Json(renderer.current_progress())
}

async fn cancel_handler(State(renderer): State<AppState>) -> StatusCode {
    renderer.cancel();
    StatusCode::NO_CONTENT
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let heightmap =
        std::env::var("RIDGELINE_HEIGHTMAP").unwrap_or_else(|_| "heightmap.png".into());
    let addr: SocketAddr = std::env::var("RIDGELINE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".into())
        .parse()?;

    let renderer = Renderer::new(ImageSource::open(&heightmap)?).with_frame_budget(SERVER_FRAME_BUDGET);
    let state: AppState = Arc::new(renderer);

    let app = Router::new()
        .route("/api/render", post(render_handler))
        .route("/api/progress", get(progress_handler))
        .route("/api/cancel", post(cancel_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!(%addr, %heightmap, "ridgeline server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
