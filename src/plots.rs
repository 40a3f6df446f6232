//! Plot Ledger.
//!
//! Tracks each burial plot's occupancy state and its binding to at most one
//! active booking. The ledger never cascades to staff or kit release; the
//! booking workflow sequences all three resource managers.

use crate::error::{DomainError, Result};
use crate::store::CemeteryStore;
use crate::types::{BookingId, Plot, PlotId, PlotStatus};
use std::sync::Arc;

/// Occupancy ledger over the plot table.
#[derive(Clone)]
pub struct PlotLedger {
    store: Arc<dyn CemeteryStore>,
}

impl PlotLedger {
    /// Creates a ledger over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CemeteryStore>) -> Self {
        Self { store }
    }

    /// Fetch a plot by id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the plot does not exist.
    pub async fn get(&self, id: PlotId) -> Result<Plot> {
        self.store
            .plot(id)
            .await?
            .ok_or_else(|| DomainError::not_found("plot", id))
    }

    /// The full plot grid, ordered by row and column.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn list(&self) -> Result<Vec<Plot>> {
        self.store.plots().await
    }

    /// Plots currently open for reservation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn list_available(&self) -> Result<Vec<Plot>> {
        Ok(self
            .store
            .plots()
            .await?
            .into_iter()
            .filter(|p| p.status == PlotStatus::Available)
            .collect())
    }

    /// Seed a plot into the ledger. New plots start available.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if the code is empty or the plot
    /// is not in the available state.
    pub async fn create(&self, plot: Plot) -> Result<Plot> {
        if plot.code.trim().is_empty() {
            return Err(DomainError::validation("plot code must not be empty"));
        }
        if plot.status != PlotStatus::Available || plot.booking_id.is_some() {
            return Err(DomainError::validation("new plots must start available"));
        }
        self.store.insert_plot(&plot).await?;
        Ok(plot)
    }

    /// Reserve an available plot for a booking.
    ///
    /// The transition is a single compare-and-set update, so two racing
    /// bookings cannot both win the same plot.
    ///
    /// # Errors
    ///
    /// - [`DomainError::NotFound`] if the plot does not exist.
    /// - [`DomainError::Conflict`] if the plot is no longer available; the
    ///   caller must re-select. No state is mutated in that case.
    pub async fn reserve(&self, id: PlotId, booking: BookingId) -> Result<()> {
        let plot = self.get(id).await?;
        if self.store.try_reserve_plot(id, booking).await? {
            tracing::info!(plot = %plot.code, booking = %booking, "plot reserved");
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "plot {} is no longer available",
                plot.code
            )))
        }
    }

    /// Transition `Reserved → Occupied` when the booking completes.
    ///
    /// # Errors
    ///
    /// - [`DomainError::NotFound`] if the plot does not exist.
    /// - [`DomainError::InvalidState`] if the plot is not currently reserved
    ///   for the expected booking.
    pub async fn finalize(&self, id: PlotId, booking: BookingId) -> Result<()> {
        let plot = self.get(id).await?;
        if self.store.try_finalize_plot(id, booking).await? {
            tracing::info!(plot = %plot.code, booking = %booking, "plot occupied");
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "plot {} is not reserved for booking {booking}",
                plot.code
            )))
        }
    }

    /// Return a plot to the available pool, clearing its binding.
    ///
    /// Idempotent: releasing an already-available plot is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn release(&self, id: PlotId) -> Result<()> {
        self.store.release_plot(id).await?;
        tracing::info!(plot = %id, "plot released");
        Ok(())
    }
}
