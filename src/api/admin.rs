//! Admin endpoints: booking review, roster management, plot seeding, kit
//! stock adjustments, package catalog and dashboard statistics.

use super::error::ApiError;
use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::stats::Overview;
use crate::types::{
    Booking, BookingId, BookingStatus, FuneralKit, KitId, KitType, KitUsageReason, KitUsageRecord,
    Money, Package, PackageId, Plot, PlotId, Staff, StaffId, StaffRole, WaqafRecord,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

// ============================================================================
// Bookings
// ============================================================================

/// Filter for the admin booking listing.
#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    /// Restrict to one workflow state.
    pub status: Option<BookingStatus>,
}

/// All bookings, optionally filtered by status.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn list_bookings(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.workflow.list_all(admin.0, query.status).await?))
}

/// Approve a pending booking, starting the payment window.
///
/// # Errors
///
/// Returns 422 unless the booking is pending.
pub async fn approve_booking(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .workflow
        .approve(admin.0, BookingId::from_uuid(id))
        .await?;
    Ok(Json(booking))
}

/// Rejection payload.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Reason shown to the requester.
    pub reason: String,
}

/// Reject a pending booking with a reason, releasing every resource.
///
/// # Errors
///
/// Returns 422 for an empty reason or a non-pending booking.
pub async fn reject_booking(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .workflow
        .reject(admin.0, BookingId::from_uuid(id), &request.reason)
        .await?;
    Ok(Json(booking))
}

/// Verify a submitted payment, confirming the booking.
///
/// # Errors
///
/// Returns 422 when no receipt has been submitted.
pub async fn verify_payment(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .workflow
        .verify_payment(admin.0, BookingId::from_uuid(id))
        .await?;
    Ok(Json(booking))
}

/// Complete a confirmed booking, moving its plot to occupied.
///
/// # Errors
///
/// Returns 422 unless the booking is confirmed.
pub async fn complete_booking(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .workflow
        .complete(admin.0, BookingId::from_uuid(id))
        .await?;
    Ok(Json(booking))
}

/// Cancel any pre-completed booking on the requester's behalf.
///
/// # Errors
///
/// Returns 422 for completed bookings.
pub async fn cancel_booking(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .workflow
        .cancel(admin.0, BookingId::from_uuid(id))
        .await?;
    Ok(Json(booking))
}

// ============================================================================
// Plots
// ============================================================================

/// Plot seeding payload.
#[derive(Debug, Deserialize)]
pub struct CreatePlotRequest {
    /// Human-readable code, e.g. `A1-5`.
    pub code: String,
    /// Grid row.
    pub row: u32,
    /// Grid column.
    pub column: u32,
}

/// Seed a new plot into the ledger.
///
/// # Errors
///
/// Returns 422 for an empty code.
pub async fn create_plot(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreatePlotRequest>,
) -> Result<(StatusCode, Json<Plot>), ApiError> {
    let plot = state
        .workflow
        .plots()
        .create(Plot::new(
            PlotId::new(),
            request.code,
            request.row,
            request.column,
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(plot)))
}

// ============================================================================
// Staff roster
// ============================================================================

/// The whole roster, active and inactive.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn list_staff(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Staff>>, ApiError> {
    Ok(Json(state.workflow.roster().list().await?))
}

/// Roster member payload.
#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    /// Full name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Role this member performs.
    pub role: StaffRole,
}

/// Add a roster member.
///
/// # Errors
///
/// Returns 422 for an empty name.
pub async fn create_staff(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<Staff>), ApiError> {
    let staff = state
        .workflow
        .roster()
        .create(Staff {
            id: StaffId::new(),
            name: request.name,
            phone: request.phone,
            role: request.role,
            active: true,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(staff)))
}

/// Roster member update payload.
#[derive(Debug, Deserialize)]
pub struct UpdateStaffRequest {
    /// Full name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Role this member performs.
    pub role: StaffRole,
    /// Whether the member is currently active.
    pub active: bool,
}

/// Overwrite a member's details; deactivation retires them from future
/// selection without touching existing assignments.
///
/// # Errors
///
/// Returns 404 for unknown members.
pub async fn update_staff(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStaffRequest>,
) -> Result<Json<Staff>, ApiError> {
    let staff = state
        .workflow
        .roster()
        .update(Staff {
            id: StaffId::from_uuid(id),
            name: request.name,
            phone: request.phone,
            role: request.role,
            active: request.active,
        })
        .await?;
    Ok(Json(staff))
}

/// Remove an unreferenced roster member.
///
/// # Errors
///
/// Returns 409 while assignments still reference the member.
pub async fn delete_staff(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .workflow
        .roster()
        .delete(StaffId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Kits
// ============================================================================

/// Stock adjustment payload.
#[derive(Debug, Deserialize)]
pub struct AdjustKitRequest {
    /// Signed stock change.
    pub delta: i64,
    /// `admin_add` or `admin_remove`.
    pub reason: KitUsageReason,
    /// Free-text note for the ledger.
    #[serde(default)]
    pub note: String,
}

/// Adjust a kit's available stock.
///
/// # Errors
///
/// Returns 409 when the adjustment would take stock below zero.
pub async fn adjust_kit(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdjustKitRequest>,
) -> Result<Json<FuneralKit>, ApiError> {
    let kit = state
        .workflow
        .kits()
        .adjust(
            KitId::from_uuid(id),
            request.delta,
            request.reason,
            request.note,
            admin.0.user_id,
        )
        .await?;
    Ok(Json(kit))
}

/// Kit stock seeding payload.
#[derive(Debug, Deserialize)]
pub struct CreateKitRequest {
    /// Kit variant.
    pub kit_type: KitType,
    /// Initial available stock.
    pub available: u32,
}

/// Seed the stock row for a kit type.
///
/// # Errors
///
/// Returns 409 if the type already has a row.
pub async fn create_kit(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreateKitRequest>,
) -> Result<(StatusCode, Json<FuneralKit>), ApiError> {
    let kit = state
        .workflow
        .kits()
        .create(request.kit_type, request.available)
        .await?;
    Ok((StatusCode::CREATED, Json(kit)))
}

/// Usage-ledger entries for a kit, oldest first.
///
/// # Errors
///
/// Returns 404 for unknown kits.
pub async fn kit_usage(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<KitUsageRecord>>, ApiError> {
    Ok(Json(
        state.workflow.kits().usage_history(KitId::from_uuid(id)).await?,
    ))
}

// ============================================================================
// Packages
// ============================================================================

/// Every package, including retired ones.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn list_packages(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Package>>, ApiError> {
    Ok(Json(state.workflow.catalog().list(false).await?))
}

/// Package payload.
#[derive(Debug, Deserialize)]
pub struct PackageRequest {
    /// Display name.
    pub name: String,
    /// Description of included services.
    #[serde(default)]
    pub description: String,
    /// Price in cents.
    pub price_cents: u64,
    /// Whether the package is offered.
    #[serde(default = "default_true")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

/// Add a package to the catalog.
///
/// # Errors
///
/// Returns 422 for an empty name.
pub async fn create_package(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<PackageRequest>,
) -> Result<(StatusCode, Json<Package>), ApiError> {
    let package = state
        .workflow
        .catalog()
        .create(Package {
            id: PackageId::new(),
            name: request.name,
            description: request.description,
            price: Money::from_cents(request.price_cents),
            active: request.active,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(package)))
}

/// Overwrite a package's details. Price changes do not retroactively touch
/// existing booking totals.
///
/// # Errors
///
/// Returns 404 for unknown packages.
pub async fn update_package(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PackageRequest>,
) -> Result<Json<Package>, ApiError> {
    let package = state
        .workflow
        .catalog()
        .update(Package {
            id: PackageId::from_uuid(id),
            name: request.name,
            description: request.description,
            price: Money::from_cents(request.price_cents),
            active: request.active,
        })
        .await?;
    Ok(Json(package))
}

// ============================================================================
// Statistics and waqaf
// ============================================================================

/// The combined dashboard rollup.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn stats_overview(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Overview>, ApiError> {
    Ok(Json(state.stats.overview().await?))
}

/// Waqaf donation payload.
#[derive(Debug, Deserialize)]
pub struct WaqafRequest {
    /// Donor display name.
    pub donor_name: String,
    /// Donated amount in cents.
    pub amount_cents: u64,
    /// Stated purpose.
    #[serde(default)]
    pub purpose: String,
}

/// Record a waqaf donation.
///
/// # Errors
///
/// Returns 422 for an empty donor name or zero amount.
pub async fn record_waqaf(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<WaqafRequest>,
) -> Result<(StatusCode, Json<WaqafRecord>), ApiError> {
    let record = state
        .stats
        .record_waqaf(
            request.donor_name,
            Money::from_cents(request.amount_cents),
            request.purpose,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Waqaf records, newest first.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn list_waqaf(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<WaqafRecord>>, ApiError> {
    Ok(Json(state.stats.waqaf_records().await?))
}

