//! Public read-only queries: plots, packages, kit stock and per-day staff
//! availability.

use super::error::ApiError;
use crate::server::AppState;
use crate::types::{FuneralKit, Package, Plot, PlotStatus, Staff, StaffRole};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Filter for the plot listing.
#[derive(Debug, Deserialize)]
pub struct PlotQuery {
    /// Restrict to one occupancy status.
    pub status: Option<PlotStatus>,
}

/// List plots, optionally filtered by status.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn list_plots(
    State(state): State<AppState>,
    Query(query): Query<PlotQuery>,
) -> Result<Json<Vec<Plot>>, ApiError> {
    let plots = match query.status {
        Some(PlotStatus::Available) => state.workflow.plots().list_available().await?,
        Some(status) => state
            .workflow
            .plots()
            .list()
            .await?
            .into_iter()
            .filter(|p| p.status == status)
            .collect(),
        None => state.workflow.plots().list().await?,
    };
    Ok(Json(plots))
}

/// List currently offered packages.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn list_packages(
    State(state): State<AppState>,
) -> Result<Json<Vec<Package>>, ApiError> {
    Ok(Json(state.workflow.catalog().list(true).await?))
}

/// Current funeral-kit stock levels.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn list_kits(State(state): State<AppState>) -> Result<Json<Vec<FuneralKit>>, ApiError> {
    Ok(Json(state.workflow.kits().list().await?))
}

/// Parameters for the staff availability query.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Role to look up.
    pub role: StaffRole,
    /// Any instant on the calendar day of interest (RFC 3339).
    pub date: DateTime<Utc>,
}

/// Active members of a role who are free on the given calendar day.
///
/// "Not required" is always a valid selection and is not represented as a
/// roster row, so it never appears in this list.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn available_staff(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Staff>>, ApiError> {
    let staff = state
        .workflow
        .roster()
        .list_available(query.role, query.date)
        .await?;
    Ok(Json(staff))
}
