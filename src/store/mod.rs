//! Data-access traits for the booking backend.
//!
//! The relational store is an external collaborator, injected into every
//! resource manager as a trait object rather than reached through an ambient
//! client. Two implementations are provided:
//!
//! - [`MemoryStore`] — in-process, for tests and local development.
//! - [`PostgresStore`] — sqlx-backed production store.
//!
//! # Concurrency contract
//!
//! The `try_*` operations are atomic compare-and-set updates: the condition
//! is evaluated and the row mutated in a single statement
//! (`UPDATE ... WHERE status = 'available'`), and the return value reports
//! whether a row actually changed. Callers never re-implement these checks as
//! a separate read followed by a write.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::error::Result;
use crate::types::{
    Booking, BookingId, BookingStatus, FuneralKit, KitId, KitReservation, KitType, KitUsageRecord,
    Package, PackageId, Plot, PlotId, Staff, StaffAssignment, StaffId, StaffRole, UserId,
    WaqafRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence operations for the plot ledger.
#[async_trait]
pub trait PlotStore: Send + Sync {
    /// Seed a new plot row.
    async fn insert_plot(&self, plot: &Plot) -> Result<()>;

    /// Fetch a plot by id.
    async fn plot(&self, id: PlotId) -> Result<Option<Plot>>;

    /// All plots, ordered by grid position.
    async fn plots(&self) -> Result<Vec<Plot>>;

    /// Atomically transition `Available → Reserved` and bind the booking.
    /// Returns `false` if the plot was not available.
    async fn try_reserve_plot(&self, id: PlotId, booking: BookingId) -> Result<bool>;

    /// Atomically transition `Reserved → Occupied` for the expected booking.
    /// Returns `false` if the plot was not reserved for that booking.
    async fn try_finalize_plot(&self, id: PlotId, booking: BookingId) -> Result<bool>;

    /// Transition back to `Available` and clear the binding. Idempotent.
    async fn release_plot(&self, id: PlotId) -> Result<()>;
}

/// Persistence operations for the staff roster and assignments.
#[async_trait]
pub trait StaffStore: Send + Sync {
    /// Add a roster member.
    async fn insert_staff(&self, staff: &Staff) -> Result<()>;

    /// Fetch a member by id.
    async fn staff(&self, id: StaffId) -> Result<Option<Staff>>;

    /// Active members of a role.
    async fn active_staff(&self, role: StaffRole) -> Result<Vec<Staff>>;

    /// Every roster member, active or not.
    async fn all_staff(&self) -> Result<Vec<Staff>>;

    /// Overwrite a member's details and active flag.
    async fn update_staff(&self, staff: &Staff) -> Result<()>;

    /// Whether any assignment row references this member.
    async fn staff_is_referenced(&self, id: StaffId) -> Result<bool>;

    /// Remove a member row. Callers must check references first.
    async fn delete_staff(&self, id: StaffId) -> Result<()>;

    /// Staff ids bound to bookings scheduled within `[start, end)` whose
    /// status still holds resources, excluding the given booking's own rows.
    async fn busy_staff(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<Vec<StaffId>>;

    /// Replace all assignments for a booking in one transaction.
    async fn replace_assignments(
        &self,
        booking: BookingId,
        rows: &[StaffAssignment],
    ) -> Result<()>;

    /// Assignments currently held by a booking.
    async fn assignments_for(&self, booking: BookingId) -> Result<Vec<StaffAssignment>>;

    /// Delete all assignments for a booking. Idempotent.
    async fn delete_assignments(&self, booking: BookingId) -> Result<()>;
}

/// Persistence operations for the funeral-kit inventory and usage ledger.
#[async_trait]
pub trait KitStore: Send + Sync {
    /// Seed a kit row.
    async fn insert_kit(&self, kit: &FuneralKit) -> Result<()>;

    /// Fetch a kit by id.
    async fn kit(&self, id: KitId) -> Result<Option<FuneralKit>>;

    /// Fetch the kit row for a variant.
    async fn kit_by_type(&self, kit_type: KitType) -> Result<Option<FuneralKit>>;

    /// All kit rows.
    async fn kits(&self) -> Result<Vec<FuneralKit>>;

    /// Atomically `available -= q, total_used += q` iff `available >= q`.
    /// Returns `false` when stock is insufficient.
    async fn try_consume_kit(&self, id: KitId, quantity: u32) -> Result<bool>;

    /// `available += q, total_used -= q` (used floor at zero). Compensation
    /// for a prior consume.
    async fn restore_kit(&self, id: KitId, quantity: u32) -> Result<()>;

    /// Atomically `available += delta` iff the result is non-negative.
    /// Negative deltas (admin removals) also count into `total_used`;
    /// positive deltas are pure stock injection and leave it unchanged.
    /// Returns `false` when the adjustment would go below zero.
    async fn try_adjust_kit(&self, id: KitId, delta: i64) -> Result<bool>;

    /// Record a booking's hold on a kit.
    async fn insert_kit_reservation(&self, reservation: &KitReservation) -> Result<()>;

    /// Fetch a booking's hold on one kit, if present.
    async fn kit_reservation(
        &self,
        booking: BookingId,
        kit: KitId,
    ) -> Result<Option<KitReservation>>;

    /// All holds for a booking.
    async fn kit_reservations_for(&self, booking: BookingId) -> Result<Vec<KitReservation>>;

    /// Delete a single hold. Idempotent.
    async fn delete_kit_reservation(&self, booking: BookingId, kit: KitId) -> Result<()>;

    /// Delete all holds for a booking. Idempotent.
    async fn delete_kit_reservations(&self, booking: BookingId) -> Result<()>;

    /// Append an immutable usage-ledger entry.
    async fn append_kit_usage(&self, record: &KitUsageRecord) -> Result<()>;

    /// Ledger entries for a kit, oldest first.
    async fn kit_usage_for(&self, kit: KitId) -> Result<Vec<KitUsageRecord>>;
}

/// Persistence operations for bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new booking.
    async fn insert_booking(&self, booking: &Booking) -> Result<()>;

    /// Fetch a booking by id.
    async fn booking(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Overwrite a booking row.
    async fn update_booking(&self, booking: &Booking) -> Result<()>;

    /// Remove a booking row. Used only to unwind a failed create; live
    /// bookings are never hard-deleted.
    async fn delete_booking(&self, id: BookingId) -> Result<()>;

    /// Bookings submitted by a user, newest first.
    async fn bookings_for(&self, user: UserId) -> Result<Vec<Booking>>;

    /// All bookings, optionally filtered by status, newest first.
    async fn bookings(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>>;

    /// Link selected packages to a booking.
    async fn insert_booking_packages(
        &self,
        booking: BookingId,
        packages: &[PackageId],
    ) -> Result<()>;

    /// Package ids linked to a booking.
    async fn packages_for_booking(&self, booking: BookingId) -> Result<Vec<PackageId>>;
}

/// Persistence operations for the package catalog.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Add a package.
    async fn insert_package(&self, package: &Package) -> Result<()>;

    /// Fetch a package by id.
    async fn package(&self, id: PackageId) -> Result<Option<Package>>;

    /// All packages, optionally restricted to active ones.
    async fn packages(&self, only_active: bool) -> Result<Vec<Package>>;

    /// Overwrite a package row.
    async fn update_package(&self, package: &Package) -> Result<()>;
}

/// Persistence operations for waqaf (donation) records.
#[async_trait]
pub trait WaqafStore: Send + Sync {
    /// Append a donation record.
    async fn insert_waqaf(&self, record: &WaqafRecord) -> Result<()>;

    /// All donation records, newest first.
    async fn waqaf_records(&self) -> Result<Vec<WaqafRecord>>;
}

/// The full data-access surface required by the application.
pub trait CemeteryStore:
    PlotStore + StaffStore + KitStore + BookingStore + PackageStore + WaqafStore
{
}

impl<T> CemeteryStore for T where
    T: PlotStore + StaffStore + KitStore + BookingStore + PackageStore + WaqafStore
{
}
