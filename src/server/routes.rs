//! Router configuration.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{admin, availability, bookings};
use axum::routing::{delete, get, post, put};
use axum::Router;

/// Build the complete Axum router.
///
/// Public reads live under `/api`, member booking endpoints under
/// `/api/bookings`, admin endpoints under `/api/admin`. Authentication is
/// enforced per-handler by the extractors, not by middleware, so the route
/// table stays a plain listing.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/plots", get(availability::list_plots))
        .route("/packages", get(availability::list_packages))
        .route("/kits", get(availability::list_kits))
        .route("/staff/availability", get(availability::available_staff));

    let member = Router::new()
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings", get(bookings::my_bookings))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/payment", post(bookings::submit_payment))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking));

    let admin = Router::new()
        .route("/bookings", get(admin::list_bookings))
        .route("/bookings/:id/approve", post(admin::approve_booking))
        .route("/bookings/:id/reject", post(admin::reject_booking))
        .route("/bookings/:id/verify-payment", post(admin::verify_payment))
        .route("/bookings/:id/complete", post(admin::complete_booking))
        .route("/bookings/:id/cancel", post(admin::cancel_booking))
        .route("/plots", post(admin::create_plot))
        .route("/staff", get(admin::list_staff))
        .route("/staff", post(admin::create_staff))
        .route("/staff/:id", put(admin::update_staff))
        .route("/staff/:id", delete(admin::delete_staff))
        .route("/kits", post(admin::create_kit))
        .route("/kits/:id/adjust", post(admin::adjust_kit))
        .route("/kits/:id/usage", get(admin::kit_usage))
        .route("/packages", get(admin::list_packages))
        .route("/packages", post(admin::create_package))
        .route("/packages/:id", put(admin::update_package))
        .route("/stats", get(admin::stats_overview))
        .route("/waqaf", post(admin::record_waqaf))
        .route("/waqaf", get(admin::list_waqaf));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", public.merge(member))
        .nest("/api/admin", admin)
        .with_state(state)
}
