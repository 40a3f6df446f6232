//! Orchestrator implementation.

use crate::auth::Principal;
use crate::config::BookingConfig;
use crate::error::{DomainError, Result};
use crate::kits::KitInventory;
use crate::packages::PackageCatalog;
use crate::plots::PlotLedger;
use crate::staff::{RoleSelection, StaffRoster};
use crate::storage::ObjectStorage;
use crate::store::CemeteryStore;
use crate::types::{
    Booking, BookingId, BookingStatus, Deceased, KitReservation, KitType, PackageId, Payment,
    PaymentStatus, PlotId, StaffAssignment, StaffRole, UserId,
};
use chrono::{DateTime, Duration, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One requested kit line in a booking.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct KitRequest {
    /// Kit variant to reserve.
    pub kit_type: KitType,
    /// Units to reserve.
    pub quantity: u32,
}

/// Everything a requester submits to create a booking.
#[derive(Clone, Debug)]
pub struct CreateBooking {
    /// Plot to reserve.
    pub plot_id: PlotId,
    /// Deceased person details.
    pub deceased: Deceased,
    /// Scheduled burial date and time.
    pub scheduled_at: DateTime<Utc>,
    /// Selected service packages (price source, at least one).
    pub package_ids: Vec<PackageId>,
    /// Requested funeral kits.
    pub kits: Vec<KitRequest>,
    /// Staff selections, one per mandatory role.
    pub staff: Vec<RoleSelection>,
    /// Supporting document URLs (death certificate, permits).
    pub document_urls: Vec<String>,
}

/// A booking together with its held resources, for detail views.
#[derive(Clone, Debug, Serialize)]
pub struct BookingDetail {
    /// The booking itself.
    pub booking: Booking,
    /// Staff assignments held.
    pub assignments: Vec<StaffAssignment>,
    /// Kit reservations held.
    pub kit_reservations: Vec<KitReservation>,
    /// Selected package ids.
    pub package_ids: Vec<PackageId>,
}

/// Coordinates the three resource managers through the booking lifecycle.
#[derive(Clone)]
pub struct BookingWorkflow {
    store: Arc<dyn CemeteryStore>,
    plots: PlotLedger,
    roster: StaffRoster,
    kits: KitInventory,
    catalog: PackageCatalog,
    config: BookingConfig,
}

impl BookingWorkflow {
    /// Wires the orchestrator over a store and its resource managers.
    #[must_use]
    pub fn new(store: Arc<dyn CemeteryStore>, config: BookingConfig) -> Self {
        let time_zone = config
            .time_zone_offset_hours
            .checked_mul(3600)
            .and_then(chrono::FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self {
            plots: PlotLedger::new(store.clone()),
            roster: StaffRoster::new(store.clone(), time_zone),
            kits: KitInventory::new(store.clone()),
            catalog: PackageCatalog::new(store.clone()),
            store,
            config,
        }
    }

    /// The plot ledger this workflow coordinates.
    #[must_use]
    pub const fn plots(&self) -> &PlotLedger {
        &self.plots
    }

    /// The staff roster this workflow coordinates.
    #[must_use]
    pub const fn roster(&self) -> &StaffRoster {
        &self.roster
    }

    /// The kit inventory this workflow coordinates.
    #[must_use]
    pub const fn kits(&self) -> &KitInventory {
        &self.kits
    }

    /// The package catalog this workflow prices against.
    #[must_use]
    pub const fn catalog(&self) -> &PackageCatalog {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create a booking, reserving plot, staff and kits as one logical
    /// operation.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] for missing deceased data, missing
    ///   mandatory roles, empty package selection or zero kit quantities.
    /// - [`DomainError::DuplicateReservation`] if a kit type appears twice.
    /// - [`DomainError::Conflict`] if the plot or a staff member was taken
    ///   by a concurrent request.
    /// - [`DomainError::InsufficientStock`] if a kit is out of stock.
    ///
    /// On any reservation failure the already-applied steps are released
    /// again before the error returns; no partial reservation survives.
    pub async fn create(&self, principal: Principal, request: CreateBooking) -> Result<Booking> {
        if request.deceased.name.trim().is_empty() {
            return Err(DomainError::validation("deceased name is required"));
        }
        if request.deceased.ic_number.trim().is_empty() {
            return Err(DomainError::validation("deceased IC number is required"));
        }
        for (i, kit) in request.kits.iter().enumerate() {
            if kit.quantity == 0 {
                return Err(DomainError::validation("kit quantity must be positive"));
            }
            if request.kits[..i].iter().any(|k| k.kit_type == kit.kit_type) {
                return Err(DomainError::DuplicateReservation(format!(
                    "kit type {} requested more than once",
                    kit.kit_type.as_str()
                )));
            }
        }
        // Role coverage is checked again inside the roster, but it must fail
        // here, before any row is written or any resource contended.
        for role in StaffRole::MANDATORY {
            let count = request.staff.iter().filter(|s| s.role == role).count();
            if count != 1 {
                return Err(DomainError::validation(format!(
                    "exactly one selection required for role {}",
                    role.as_str()
                )));
            }
        }

        let total = self.catalog.price_total(&request.package_ids).await?;
        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            requester: principal.user_id,
            plot_id: request.plot_id,
            deceased: request.deceased.clone(),
            scheduled_at: request.scheduled_at,
            total,
            status: BookingStatus::Pending,
            payment: Payment::empty(),
            document_urls: request.document_urls.clone(),
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_booking(&booking).await?;
        if let Err(err) = self
            .store
            .insert_booking_packages(booking.id, &request.package_ids)
            .await
        {
            self.store.delete_booking(booking.id).await?;
            return Err(err);
        }

        if let Err(err) = self.reserve_resources(&booking, &request, principal).await {
            self.store.delete_booking(booking.id).await?;
            return Err(err);
        }

        tracing::info!(
            booking = %booking.id,
            plot = %booking.plot_id,
            requester = %principal.user_id,
            total = %booking.total,
            "booking created"
        );
        Ok(booking)
    }

    /// The reservation batch: plot, then staff, then kits. Compensates in
    /// reverse order on failure.
    async fn reserve_resources(
        &self,
        booking: &Booking,
        request: &CreateBooking,
        principal: Principal,
    ) -> Result<()> {
        self.plots.reserve(request.plot_id, booking.id).await?;

        if let Err(err) = self
            .roster
            .assign(
                booking.id,
                request.scheduled_at,
                &request.staff,
                principal.user_id,
            )
            .await
        {
            self.plots.release(request.plot_id).await?;
            return Err(err);
        }

        for kit in &request.kits {
            if let Err(err) = self
                .kits
                .reserve(booking.id, kit.kit_type, kit.quantity, principal.user_id)
                .await
            {
                // Releases only this booking's holds, in reverse order.
                self.kits.release(booking.id, principal.user_id).await?;
                self.roster.release(booking.id).await?;
                self.plots.release(request.plot_id).await?;
                return Err(err);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    async fn load(&self, id: BookingId) -> Result<Booking> {
        self.store
            .booking(id)
            .await?
            .ok_or_else(|| DomainError::not_found("booking", id))
    }

    fn authorize_view(principal: Principal, booking: &Booking) -> Result<()> {
        if principal.is_admin() || booking.requester == principal.user_id {
            Ok(())
        } else {
            Err(DomainError::authorization(
                "booking belongs to another user",
            ))
        }
    }

    /// Fetch a booking with its held resources. Owners and admins only.
    ///
    /// # Errors
    ///
    /// - [`DomainError::NotFound`] if the booking does not exist.
    /// - [`DomainError::Authorization`] for other users' bookings.
    pub async fn get(&self, principal: Principal, id: BookingId) -> Result<BookingDetail> {
        let booking = self.load(id).await?;
        Self::authorize_view(principal, &booking)?;
        Ok(BookingDetail {
            assignments: self.store.assignments_for(id).await?,
            kit_reservations: self.store.kit_reservations_for(id).await?,
            package_ids: self.store.packages_for_booking(id).await?,
            booking,
        })
    }

    /// Bookings submitted by the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn list_mine(&self, principal: Principal) -> Result<Vec<Booking>> {
        self.store.bookings_for(principal.user_id).await
    }

    /// All bookings, optionally filtered by status. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Authorization`] for non-admin callers.
    pub async fn list_all(
        &self,
        principal: Principal,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>> {
        Self::require_admin(principal)?;
        self.store.bookings(status).await
    }

    // ------------------------------------------------------------------
    // Admin transitions
    // ------------------------------------------------------------------

    fn require_admin(principal: Principal) -> Result<()> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(DomainError::authorization("admin role required"))
        }
    }

    /// Approve a pending booking and start the payment window.
    ///
    /// Repeated calls on an already-approved booking are no-ops.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Authorization`] for non-admin callers.
    /// - [`DomainError::InvalidState`] unless the booking is pending.
    pub async fn approve(&self, principal: Principal, id: BookingId) -> Result<Booking> {
        Self::require_admin(principal)?;
        let mut booking = self.load(id).await?;
        if booking.status == BookingStatus::Approved {
            return Ok(booking);
        }
        if booking.status != BookingStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "cannot approve a {} booking",
                booking.status.as_str()
            )));
        }
        booking.status = BookingStatus::Approved;
        booking.payment.deadline =
            Some(Utc::now() + Duration::days(self.config.payment_deadline_days));
        booking.updated_at = Utc::now();
        self.store.update_booking(&booking).await?;
        tracing::info!(booking = %id, admin = %principal.user_id, "booking approved");
        Ok(booking)
    }

    /// Attach a payment receipt to an approved booking.
    ///
    /// The receipt bytes are uploaded through the object storage
    /// collaborator; the booking records the returned URL.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Authorization`] unless the caller owns the booking
    ///   or is an admin.
    /// - [`DomainError::InvalidState`] unless the booking is approved and
    ///   the payment is not yet confirmed.
    pub async fn submit_payment(
        &self,
        principal: Principal,
        id: BookingId,
        receipt: Vec<u8>,
        storage: &dyn ObjectStorage,
    ) -> Result<Booking> {
        let mut booking = self.load(id).await?;
        Self::authorize_view(principal, &booking)?;
        if booking.status != BookingStatus::Approved {
            return Err(DomainError::invalid_state(format!(
                "cannot submit payment for a {} booking",
                booking.status.as_str()
            )));
        }
        if booking.payment.status == PaymentStatus::Confirmed {
            return Err(DomainError::invalid_state("payment is already confirmed"));
        }

        let url = storage
            .upload(&format!("receipts/{id}.bin"), receipt)
            .await?;
        booking.payment.status = PaymentStatus::Submitted;
        booking.payment.receipt_url = Some(url);
        booking.payment.submitted_at = Some(Utc::now());
        booking.updated_at = Utc::now();
        self.store.update_booking(&booking).await?;
        tracing::info!(booking = %id, "payment receipt submitted");
        Ok(booking)
    }

    /// Verify a submitted payment, confirming the booking.
    ///
    /// Repeated calls on an already-confirmed booking are no-ops.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Authorization`] for non-admin callers.
    /// - [`DomainError::InvalidState`] unless a receipt has been submitted.
    pub async fn verify_payment(&self, principal: Principal, id: BookingId) -> Result<Booking> {
        Self::require_admin(principal)?;
        let mut booking = self.load(id).await?;
        if booking.status == BookingStatus::Confirmed {
            return Ok(booking);
        }
        if booking.status != BookingStatus::Approved
            || booking.payment.status != PaymentStatus::Submitted
        {
            return Err(DomainError::invalid_state(
                "no submitted payment to verify",
            ));
        }
        booking.payment.status = PaymentStatus::Confirmed;
        booking.payment.verified_by = Some(principal.user_id);
        booking.payment.verified_at = Some(Utc::now());
        booking.status = BookingStatus::Confirmed;
        booking.updated_at = Utc::now();
        self.store.update_booking(&booking).await?;
        tracing::info!(booking = %id, admin = %principal.user_id, "payment verified");
        Ok(booking)
    }

    /// Complete a confirmed booking, moving its plot to occupied.
    ///
    /// Repeated calls on a completed booking are no-ops.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Authorization`] for non-admin callers.
    /// - [`DomainError::InvalidState`] unless the booking is confirmed.
    pub async fn complete(&self, principal: Principal, id: BookingId) -> Result<Booking> {
        Self::require_admin(principal)?;
        let mut booking = self.load(id).await?;
        if booking.status == BookingStatus::Completed {
            return Ok(booking);
        }
        if booking.status != BookingStatus::Confirmed {
            return Err(DomainError::invalid_state(format!(
                "cannot complete a {} booking",
                booking.status.as_str()
            )));
        }
        self.plots.finalize(booking.plot_id, booking.id).await?;
        booking.status = BookingStatus::Completed;
        booking.updated_at = Utc::now();
        self.store.update_booking(&booking).await?;
        tracing::info!(booking = %id, "booking completed");
        Ok(booking)
    }

    /// Reject a pending booking with a reason, releasing every resource.
    ///
    /// Repeated calls on a rejected booking are no-ops.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Authorization`] for non-admin callers.
    /// - [`DomainError::Validation`] if the reason is empty.
    /// - [`DomainError::InvalidState`] unless the booking is pending.
    pub async fn reject(
        &self,
        principal: Principal,
        id: BookingId,
        reason: &str,
    ) -> Result<Booking> {
        Self::require_admin(principal)?;
        if reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason is required"));
        }
        let mut booking = self.load(id).await?;
        if booking.status == BookingStatus::Rejected {
            return Ok(booking);
        }
        if booking.status != BookingStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "cannot reject a {} booking",
                booking.status.as_str()
            )));
        }
        // Releases run before the terminal status is persisted; each step
        // is idempotent, so a failure part-way leaves the call retryable.
        self.release_resources(&booking, principal.user_id).await?;
        booking.status = BookingStatus::Rejected;
        booking.rejection_reason = Some(reason.trim().to_string());
        booking.updated_at = Utc::now();
        self.store.update_booking(&booking).await?;
        tracing::info!(booking = %id, reason, "booking rejected");
        Ok(booking)
    }

    /// Cancel a booking, releasing every resource.
    ///
    /// Admins may cancel from any pre-completed state. Owners may cancel
    /// only while the booking is pending or approved. Cancelling an
    /// already-cancelled booking is a no-op.
    ///
    /// # Errors
    ///
    /// - [`DomainError::InvalidState`] if the booking is completed.
    /// - [`DomainError::Authorization`] for non-owners, or for owners once
    ///   the payment has been confirmed.
    pub async fn cancel(&self, principal: Principal, id: BookingId) -> Result<Booking> {
        let mut booking = self.load(id).await?;
        Self::authorize_view(principal, &booking)?;
        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }
        if !booking.status.cancellable() {
            return Err(DomainError::invalid_state(format!(
                "cannot cancel a {} booking",
                booking.status.as_str()
            )));
        }
        if !principal.is_admin()
            && !matches!(
                booking.status,
                BookingStatus::Pending | BookingStatus::Approved
            )
        {
            return Err(DomainError::authorization(
                "only an admin can cancel a confirmed booking",
            ));
        }
        // Same ordering as reject: free the resources first, then persist.
        self.release_resources(&booking, principal.user_id).await?;
        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now();
        self.store.update_booking(&booking).await?;
        tracing::info!(booking = %id, by = %principal.user_id, "booking cancelled");
        Ok(booking)
    }

    /// Compensation shared by reject and cancel: kits, staff, plot, in
    /// reverse order of acquisition. Each step is idempotent.
    async fn release_resources(&self, booking: &Booking, actor: UserId) -> Result<()> {
        self.kits.release(booking.id, actor).await?;
        self.roster.release(booking.id).await?;
        self.plots.release(booking.plot_id).await?;
        Ok(())
    }
}
