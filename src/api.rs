//! HTTP API.
//!
//! Endpoints:
//! - GET /api/locations?year=2025
//! - POST /api/taxes

use crate::error::{DataError, InputError};
use crate::estimate::{Estimator, TaxResult};
use crate::input::{Person, TaxInput, TaxableAmount};
use crate::location::LocationProvider;
use crate::schema::Location;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone)]
pub struct AppState {
    pub locations: Arc<dyn LocationProvider>,
    pub estimator: Arc<Estimator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/locations", get(locations))
        .route("/api/taxes", post(taxes))
        .with_state(state)
}

pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct LocationsQuery {
    year: Option<u32>,
}

async fn locations(
    State(state): State<AppState>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let locations = state.locations.tax_locations(query.year).await?;
    Ok(Json(locations.list().to_vec()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxRequest {
    city_id: u32,
    year: u32,
    persons: Vec<Person>,
    taxable_income: Decimal,
    #[serde(default)]
    taxable_wealth: Decimal,
}

async fn taxes(
    State(state): State<AppState>,
    Json(request): Json<TaxRequest>,
) -> Result<Json<TaxResult>, ApiError> {
    let canton_id = state
        .locations
        .canton_id_by_city_id(request.city_id, request.year)
        .await?;
    let input = TaxInput::new(canton_id, request.city_id, request.year, request.persons)?;
    let taxable_income = TaxableAmount::new(request.taxable_income)?;
    let taxable_wealth = TaxableAmount::new(request.taxable_wealth)?;
    let result = state
        .estimator
        .estimate(&input, taxable_income, taxable_wealth)
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Input(#[from] InputError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Data(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Input(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        warn!("Request failed with {status}: {self}");
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
