//! Member booking endpoints: create, list, inspect, pay, cancel.

use super::error::ApiError;
use crate::auth::SessionUser;
use crate::booking::{BookingDetail, CreateBooking, KitRequest};
use crate::server::AppState;
use crate::staff::RoleSelection;
use crate::types::{
    Booking, BookingId, Deceased, PackageId, PlotId, StaffId, StaffRole, StaffSelection,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

// ============================================================================
// Request types
// ============================================================================

/// One staff choice on the wire. `staff_id: null` means the family handles
/// the service themselves.
#[derive(Debug, Deserialize)]
pub struct StaffSelectionRequest {
    /// Mandatory role being covered.
    pub role: StaffRole,
    /// Chosen member, or `null` for not-required.
    pub staff_id: Option<StaffId>,
}

impl From<StaffSelectionRequest> for RoleSelection {
    fn from(req: StaffSelectionRequest) -> Self {
        Self {
            role: req.role,
            selection: req
                .staff_id
                .map_or(StaffSelection::NotRequired, StaffSelection::Member),
        }
    }
}

/// Booking creation payload.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// Plot to reserve.
    pub plot_id: PlotId,
    /// Deceased person details.
    pub deceased: Deceased,
    /// Scheduled burial date and time (RFC 3339).
    pub scheduled_at: DateTime<Utc>,
    /// Selected packages, at least one.
    pub package_ids: Vec<PackageId>,
    /// Requested funeral kits.
    #[serde(default)]
    pub kits: Vec<KitRequest>,
    /// Staff selections, one per mandatory role.
    pub staff: Vec<StaffSelectionRequest>,
    /// Supporting document URLs.
    #[serde(default)]
    pub document_urls: Vec<String>,
}

/// Payment submission payload.
#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    /// Receipt file content, base64-encoded.
    pub receipt_base64: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a booking, reserving plot, staff and kits atomically.
///
/// # Errors
///
/// Maps reservation conflicts to 409 and input problems to 422; nothing is
/// held when an error response returns.
pub async fn create_booking(
    session: SessionUser,
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let booking = state
        .workflow
        .create(
            session.0,
            CreateBooking {
                plot_id: request.plot_id,
                deceased: request.deceased,
                scheduled_at: request.scheduled_at,
                package_ids: request.package_ids,
                kits: request.kits,
                staff: request.staff.into_iter().map(RoleSelection::from).collect(),
                document_urls: request.document_urls,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// The caller's bookings, newest first.
///
/// # Errors
///
/// Returns a 500 response on datastore failure.
pub async fn my_bookings(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.workflow.list_mine(session.0).await?))
}

/// One booking with its held resources. Owners and admins only.
///
/// # Errors
///
/// Returns 404 for unknown bookings and 403 for other users' bookings.
pub async fn get_booking(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetail>, ApiError> {
    let detail = state
        .workflow
        .get(session.0, BookingId::from_uuid(id))
        .await?;
    Ok(Json(detail))
}

/// Attach a payment receipt to an approved booking.
///
/// # Errors
///
/// Returns 400 for malformed base64 and 422 when the booking is not in the
/// approved state.
pub async fn submit_payment(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitPaymentRequest>,
) -> Result<Json<Booking>, ApiError> {
    let receipt = base64::engine::general_purpose::STANDARD
        .decode(request.receipt_base64.as_bytes())
        .map_err(|_| ApiError::bad_request("receipt_base64 is not valid base64"))?;
    if receipt.is_empty() {
        return Err(ApiError::validation("receipt must not be empty"));
    }
    let booking = state
        .workflow
        .submit_payment(
            session.0,
            BookingId::from_uuid(id),
            receipt,
            state.storage.as_ref(),
        )
        .await?;
    Ok(Json(booking))
}

/// Cancel a booking, releasing its resources.
///
/// # Errors
///
/// Returns 422 for completed bookings and 403 when a member tries to cancel
/// past the approved state.
pub async fn cancel_booking(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .workflow
        .cancel(session.0, BookingId::from_uuid(id))
        .await?;
    Ok(Json(booking))
}
