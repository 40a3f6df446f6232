//! Read-only rollups over bookings, plots and waqaf records.

use crate::error::{DomainError, Result};
use crate::store::CemeteryStore;
use crate::types::{
    BookingStatus, Money, PlotStatus, WaqafId, WaqafRecord,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Booking counts per workflow state.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BookingStats {
    /// Bookings awaiting review.
    pub pending: usize,
    /// Bookings approved and awaiting payment.
    pub approved: usize,
    /// Bookings with verified payment.
    pub confirmed: usize,
    /// Completed burials.
    pub completed: usize,
    /// Rejected bookings.
    pub rejected: usize,
    /// Cancelled bookings.
    pub cancelled: usize,
}

/// Plot counts per ledger state.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PlotStats {
    /// Plots open for booking.
    pub available: usize,
    /// Plots held by a live booking.
    pub reserved: usize,
    /// Plots with a completed burial.
    pub occupied: usize,
    /// Total plots in the ledger.
    pub total: usize,
}

/// Waqaf donation rollup.
#[derive(Clone, Debug, Default, Serialize)]
pub struct WaqafStats {
    /// Number of donation records.
    pub count: usize,
    /// Sum of all donations, in cents.
    pub total: Money,
    /// Donation sums keyed by stated purpose.
    pub by_purpose: BTreeMap<String, Money>,
}

/// Combined dashboard rollup.
#[derive(Clone, Debug, Serialize)]
pub struct Overview {
    /// Booking counts per state.
    pub bookings: BookingStats,
    /// Plot counts per state.
    pub plots: PlotStats,
    /// Waqaf totals.
    pub waqaf: WaqafStats,
}

/// Aggregator over the booking, plot and waqaf tables.
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn CemeteryStore>,
}

impl StatsAggregator {
    /// Creates an aggregator over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CemeteryStore>) -> Self {
        Self { store }
    }

    /// Booking counts per state.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn bookings(&self) -> Result<BookingStats> {
        let mut stats = BookingStats::default();
        for booking in self.store.bookings(None).await? {
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Approved => stats.approved += 1,
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::Completed => stats.completed += 1,
                BookingStatus::Rejected => stats.rejected += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
            }
        }
        Ok(stats)
    }

    /// Plot counts per state.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn plots(&self) -> Result<PlotStats> {
        let mut stats = PlotStats::default();
        for plot in self.store.plots().await? {
            stats.total += 1;
            match plot.status {
                PlotStatus::Available => stats.available += 1,
                PlotStatus::Reserved => stats.reserved += 1,
                PlotStatus::Occupied => stats.occupied += 1,
            }
        }
        Ok(stats)
    }

    /// Waqaf totals, overall and per purpose.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] if a running sum overflows.
    /// - [`DomainError::Storage`] on datastore failure.
    pub async fn waqaf(&self) -> Result<WaqafStats> {
        let mut stats = WaqafStats::default();
        for record in self.store.waqaf_records().await? {
            stats.count += 1;
            stats.total = stats
                .total
                .checked_add(record.amount)
                .ok_or_else(|| DomainError::validation("waqaf total overflows"))?;
            let entry = stats
                .by_purpose
                .entry(record.purpose.clone())
                .or_insert(Money::ZERO);
            *entry = entry
                .checked_add(record.amount)
                .ok_or_else(|| DomainError::validation("waqaf total overflows"))?;
        }
        Ok(stats)
    }

    /// The combined dashboard rollup.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn overview(&self) -> Result<Overview> {
        Ok(Overview {
            bookings: self.bookings().await?,
            plots: self.plots().await?,
            waqaf: self.waqaf().await?,
        })
    }

    /// Record a waqaf donation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if the donor name is empty or the
    /// amount is zero.
    pub async fn record_waqaf(
        &self,
        donor_name: String,
        amount: Money,
        purpose: String,
    ) -> Result<WaqafRecord> {
        if donor_name.trim().is_empty() {
            return Err(DomainError::validation("donor name is required"));
        }
        if amount.is_zero() {
            return Err(DomainError::validation("donation amount must be positive"));
        }
        let record = WaqafRecord {
            id: WaqafId::new(),
            donor_name,
            amount,
            purpose,
            recorded_at: Utc::now(),
        };
        self.store.insert_waqaf(&record).await?;
        tracing::info!(record = %record.id, amount = %record.amount, "waqaf recorded");
        Ok(record)
    }

    /// Waqaf records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn waqaf_records(&self) -> Result<Vec<WaqafRecord>> {
        self.store.waqaf_records().await
    }
}
