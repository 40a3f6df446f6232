//! Funeral Kit Inventory.
//!
//! Tracks available/used counts per kit type and records every quantity
//! change as an immutable usage-ledger entry. Quantity checks are atomic
//! conditional updates in the store, so concurrent reservations and
//! adjustments cannot overdraw stock.
//!
//! Ledger policy: in the booking path the ledger entry is part of the
//! operation — if it cannot be appended the quantity change is undone and
//! the call fails. In the admin adjust path the ledger is best-effort: a
//! failed append is logged and the stock change stands.

use crate::error::{DomainError, Result};
use crate::store::CemeteryStore;
use crate::types::{
    BookingId, FuneralKit, KitId, KitReservation, KitType, KitUsageReason, KitUsageRecord, UserId,
};
use chrono::Utc;
use std::sync::Arc;

/// Inventory manager over the kit tables.
#[derive(Clone)]
pub struct KitInventory {
    store: Arc<dyn CemeteryStore>,
}

impl KitInventory {
    /// Creates an inventory manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CemeteryStore>) -> Self {
        Self { store }
    }

    /// Current stock levels for every kit type.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn list(&self) -> Result<Vec<FuneralKit>> {
        self.store.kits().await
    }

    /// Fetch a kit by id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the kit does not exist.
    pub async fn get(&self, id: KitId) -> Result<FuneralKit> {
        self.store
            .kit(id)
            .await?
            .ok_or_else(|| DomainError::not_found("kit", id))
    }

    /// Usage-ledger entries for a kit, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the kit does not exist.
    pub async fn usage_history(&self, id: KitId) -> Result<Vec<KitUsageRecord>> {
        self.get(id).await?;
        self.store.kit_usage_for(id).await
    }

    /// Seed the stock row for a kit type.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Conflict`] if the type already has a row.
    pub async fn create(&self, kit_type: KitType, available: u32) -> Result<FuneralKit> {
        if self.store.kit_by_type(kit_type).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "a {} kit row already exists",
                kit_type.as_str()
            )));
        }
        let kit = FuneralKit {
            id: KitId::new(),
            kit_type,
            available,
            total_used: 0,
        };
        self.store.insert_kit(&kit).await?;
        Ok(kit)
    }

    /// Reserve `quantity` units of a kit type for a booking.
    ///
    /// On success the available count is decremented, the used count
    /// incremented, a reservation row inserted and a `Booking` ledger entry
    /// appended with delta `-quantity`.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] if `quantity` is zero.
    /// - [`DomainError::NotFound`] if no kit row exists for the type.
    /// - [`DomainError::DuplicateReservation`] if the booking already holds
    ///   this kit type.
    /// - [`DomainError::InsufficientStock`] if fewer than `quantity` units
    ///   are available.
    pub async fn reserve(
        &self,
        booking: BookingId,
        kit_type: KitType,
        quantity: u32,
        actor: UserId,
    ) -> Result<()> {
        if quantity == 0 {
            return Err(DomainError::validation("kit quantity must be positive"));
        }
        let kit = self
            .store
            .kit_by_type(kit_type)
            .await?
            .ok_or_else(|| DomainError::not_found("kit", kit_type.as_str()))?;
        if self.store.kit_reservation(booking, kit.id).await?.is_some() {
            return Err(DomainError::DuplicateReservation(format!(
                "booking {booking} already reserves the {} kit",
                kit_type.as_str()
            )));
        }
        if !self.store.try_consume_kit(kit.id, quantity).await? {
            return Err(DomainError::InsufficientStock(format!(
                "only {} {} kit(s) available, {quantity} requested",
                kit.available,
                kit_type.as_str()
            )));
        }

        let reservation = KitReservation {
            booking_id: booking,
            kit_id: kit.id,
            quantity,
        };
        let record = KitUsageRecord {
            kit_id: kit.id,
            booking_id: Some(booking),
            delta: -i64::from(quantity),
            reason: KitUsageReason::Booking,
            actor,
            note: String::new(),
            recorded_at: Utc::now(),
        };
        // The ledger is part of the booking reservation; undo the quantity
        // change if either insert fails.
        let staged = async {
            self.store.insert_kit_reservation(&reservation).await?;
            self.store.append_kit_usage(&record).await
        };
        if let Err(err) = staged.await {
            self.store.delete_kit_reservation(booking, kit.id).await?;
            self.store.restore_kit(kit.id, quantity).await?;
            return Err(err);
        }
        tracing::info!(
            booking = %booking,
            kit = kit_type.as_str(),
            quantity,
            "kit reserved"
        );
        Ok(())
    }

    /// Return every unit a booking holds to the pool.
    ///
    /// Appends a `BookingCancelled` ledger entry with delta `+quantity` per
    /// reservation and deletes the reservation rows. Idempotent: a booking
    /// with no reservations is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn release(&self, booking: BookingId, actor: UserId) -> Result<()> {
        let reservations = self.store.kit_reservations_for(booking).await?;
        for reservation in &reservations {
            self.store
                .restore_kit(reservation.kit_id, reservation.quantity)
                .await?;
            let record = KitUsageRecord {
                kit_id: reservation.kit_id,
                booking_id: Some(booking),
                delta: i64::from(reservation.quantity),
                reason: KitUsageReason::BookingCancelled,
                actor,
                note: String::new(),
                recorded_at: Utc::now(),
            };
            self.store.append_kit_usage(&record).await?;
        }
        self.store.delete_kit_reservations(booking).await?;
        if !reservations.is_empty() {
            tracing::info!(booking = %booking, count = reservations.len(), "kit reservations released");
        }
        Ok(())
    }

    /// Admin stock adjustment with a signed delta.
    ///
    /// The guard against negative stock is a conditional update in the
    /// store; no usage record is appended when the guard rejects. A failed
    /// ledger append after a successful adjustment is logged and swallowed.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] if `delta` is zero or the reason is not
    ///   an admin reason.
    /// - [`DomainError::NotFound`] if the kit does not exist.
    /// - [`DomainError::NegativeStock`] if the result would go below zero.
    pub async fn adjust(
        &self,
        id: KitId,
        delta: i64,
        reason: KitUsageReason,
        note: String,
        actor: UserId,
    ) -> Result<FuneralKit> {
        if delta == 0 {
            return Err(DomainError::validation("adjustment delta must be non-zero"));
        }
        if !matches!(
            reason,
            KitUsageReason::AdminAdd | KitUsageReason::AdminRemove
        ) {
            return Err(DomainError::validation(
                "adjustment reason must be admin_add or admin_remove",
            ));
        }
        let kit = self.get(id).await?;
        if !self.store.try_adjust_kit(id, delta).await? {
            return Err(DomainError::NegativeStock(format!(
                "{} kit has {} available, cannot apply {delta}",
                kit.kit_type.as_str(),
                kit.available
            )));
        }

        let record = KitUsageRecord {
            kit_id: id,
            booking_id: None,
            delta,
            reason,
            actor,
            note,
            recorded_at: Utc::now(),
        };
        if let Err(err) = self.store.append_kit_usage(&record).await {
            // Audit is best-effort on the admin path; the stock change stands.
            tracing::warn!(kit = %id, error = %err, "usage ledger append failed");
        }
        tracing::info!(kit = kit.kit_type.as_str(), delta, "kit stock adjusted");
        self.get(id).await
    }
}
