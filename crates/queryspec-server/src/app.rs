use crate::errors::ApiError;
use crate::metrics::{OPS_TOTAL, OP_DURATION, SEARCH_PAGE_ITEMS};
use crate::params::parse_search;
use axum::http::{header, StatusCode};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use queryspec_core::{
    AliasMap, CreateForecast, PagedResult, UpdateForecast, WeatherForecast,
    WeatherForecastResponse,
};
use queryspec_storage::{apply_specification, Repository};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Repository<WeatherForecast>>,
    pub aliases: Arc<AliasMap>,
    pub max_page_size: u32,
    pub query_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Repository<WeatherForecast>>,
        max_page_size: u32,
        query_timeout: Duration,
    ) -> Self {
        Self {
            store,
            aliases: Arc::new(forecast_aliases()),
            max_page_size,
            query_timeout,
        }
    }
}

/// Short names accepted by the forecast search in place of shape paths.
pub fn forecast_aliases() -> AliasMap {
    AliasMap::new().with("temp", "temperatureC")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/weatherforecasts", get(search).post(create))
        .route(
            "/weatherforecasts/:id",
            get(get_forecast).put(update).delete(delete),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    let _ = encoder.encode(&metric_families, &mut buf);
    (StatusCode::OK, String::from_utf8(buf).unwrap_or_default())
}

async fn search(
    State(app): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PagedResult<WeatherForecastResponse>>, ApiError> {
    let _timer = OP_DURATION.with_label_values(&["search"]).start_timer();
    let request = parse_search(&pairs, app.max_page_size)?;

    // Dropping this handler (client went away) cancels the token.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let run = apply_specification(&*app.store, &request, &app.aliases, &cancel);
    let page = match tokio::time::timeout(app.query_timeout, run).await {
        Ok(res) => res?,
        Err(_) => {
            cancel.cancel();
            warn!(timeout_ms = app.query_timeout.as_millis() as u64, "search timed out");
            return Err(ApiError::Cancelled);
        }
    };

    SEARCH_PAGE_ITEMS.observe(page.items().len() as f64);
    OPS_TOTAL.with_label_values(&["search"]).inc();
    Ok(Json(page.map(WeatherForecastResponse::from)))
}

async fn get_forecast(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<axum::response::Response, ApiError> {
    let _timer = OP_DURATION.with_label_values(&["get"]).start_timer();
    let found = app.store.find(id).await?;
    OPS_TOTAL.with_label_values(&["get"]).inc();
    Ok(match found {
        Some(wf) => Json(WeatherForecastResponse::from(wf)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn create(
    State(app): State<AppState>,
    Json(cmd): Json<CreateForecast>,
) -> Result<impl IntoResponse, ApiError> {
    let _timer = OP_DURATION.with_label_values(&["create"]).start_timer();
    cmd.validate()?;
    let wf = app.store.create(cmd.into_entity()).await?;
    info!(id = wf.id, "forecast created");
    OPS_TOTAL.with_label_values(&["create"]).inc();
    let location = format!("/weatherforecasts/{}", wf.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(WeatherForecastResponse::from(wf)),
    ))
}

async fn update(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    Json(cmd): Json<UpdateForecast>,
) -> Result<Json<WeatherForecastResponse>, ApiError> {
    let _timer = OP_DURATION.with_label_values(&["update"]).start_timer();
    cmd.validate()?;
    let mut wf = app.store.find(id).await?.ok_or(ApiError::NotFound(id))?;
    cmd.apply_to(&mut wf);
    let wf = app.store.update(wf).await?;
    info!(id, "forecast updated");
    OPS_TOTAL.with_label_values(&["update"]).inc();
    Ok(Json(wf.into()))
}

async fn delete(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let _timer = OP_DURATION.with_label_values(&["delete"]).start_timer();
    app.store.delete(id).await.map_err(|e| match e {
        queryspec_core::StoreError::NotFound => ApiError::NotFound(id),
        other => other.into(),
    })?;
    info!(id, "forecast deleted");
    OPS_TOTAL.with_label_values(&["delete"]).inc();
    Ok(StatusCode::NO_CONTENT)
}
