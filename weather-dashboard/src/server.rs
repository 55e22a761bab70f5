//! HTTP front of the proxy: JSON endpoints under `/api`, a health probe and
//! the static dashboard assets.

use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use weather_core::{
    Config, Dashboard, LocationQuery, SvgSurface, WeatherProxy, provider_from_config,
    render_line_chart,
    view::{CHART_SIZE, chart_points},
};

use crate::error::ApiError;

/// Shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub proxy: WeatherProxy,
}

#[derive(Debug, Deserialize)]
struct CityParams {
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationParams {
    city: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

impl LocationParams {
    fn query(&self) -> Result<LocationQuery, ApiError> {
        Ok(LocationQuery::from_params(
            self.city.as_deref(),
            self.lat.as_deref(),
            self.lon.as_deref(),
        )?)
    }
}

pub fn router(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/weather", get(weather))
        .route("/forecast", get(forecast))
        .route("/fullweather", get(full_weather))
        .route("/dashboard", get(dashboard))
        .route("/chart.svg", get(chart_svg))
}

/// Bind the listener and serve until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState {
        proxy: WeatherProxy::new(provider_from_config(&config)),
    };
    let app = router(state, &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server running on http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for shutdown signal");
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn weather(
    State(state): State<AppState>,
    Query(params): Query<CityParams>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.proxy.weather(params.city.as_deref()).await?))
}

async fn forecast(
    State(state): State<AppState>,
    Query(params): Query<CityParams>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.proxy.forecast(params.city.as_deref()).await?))
}

async fn full_weather(
    State(state): State<AppState>,
    Query(params): Query<LocationParams>,
) -> Result<Json<Value>, ApiError> {
    let body = state
        .proxy
        .full_weather(params.lat.as_deref(), params.lon.as_deref())
        .await?;
    Ok(Json(body))
}

async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<LocationParams>,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.proxy.dashboard(&params.query()?).await?))
}

/// Hourly trend as an SVG document. A trend with nothing to plot yields an
/// empty drawing rather than an error.
async fn chart_svg(
    State(state): State<AppState>,
    Query(params): Query<LocationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = state.proxy.dashboard(&params.query()?).await?;

    let (width, height) = CHART_SIZE;
    let mut surface = SvgSurface::new(width, height);
    if render_line_chart(&mut surface, &chart_points(&dashboard.hourly)).is_none() {
        tracing::debug!("hourly trend empty, serving blank chart");
    }

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], surface.to_svg()))
}
