//! In-memory store for tests and local development.
//!
//! Every conditional operation takes the write lock for its full duration, so
//! the compare-and-set contract of the store traits holds under concurrent
//! tasks just as it does for the SQL implementation.

use crate::error::{DomainError, Result};
use crate::store::{
    BookingStore, KitStore, PackageStore, PlotStore, StaffStore, WaqafStore,
};
use crate::types::{
    Booking, BookingId, BookingStatus, FuneralKit, KitId, KitReservation, KitType, KitUsageRecord,
    Package, PackageId, Plot, PlotId, PlotStatus, Staff, StaffAssignment, StaffId, StaffRole,
    UserId, WaqafRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Inner {
    plots: HashMap<PlotId, Plot>,
    staff: HashMap<StaffId, Staff>,
    assignments: Vec<StaffAssignment>,
    kits: HashMap<KitId, FuneralKit>,
    kit_reservations: Vec<KitReservation>,
    kit_usage: Vec<KitUsageRecord>,
    bookings: HashMap<BookingId, Booking>,
    booking_packages: Vec<(BookingId, PackageId)>,
    packages: HashMap<PackageId, Package>,
    waqaf: Vec<WaqafRecord>,
}

/// In-memory implementation of the full store surface.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| DomainError::storage("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("memory store lock poisoned"))
    }
}

#[async_trait]
impl PlotStore for MemoryStore {
    async fn insert_plot(&self, plot: &Plot) -> Result<()> {
        self.write()?.plots.insert(plot.id, plot.clone());
        Ok(())
    }

    async fn plot(&self, id: PlotId) -> Result<Option<Plot>> {
        Ok(self.read()?.plots.get(&id).cloned())
    }

    async fn plots(&self) -> Result<Vec<Plot>> {
        let mut plots: Vec<Plot> = self.read()?.plots.values().cloned().collect();
        plots.sort_by_key(|p| (p.row, p.column));
        Ok(plots)
    }

    async fn try_reserve_plot(&self, id: PlotId, booking: BookingId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.plots.get_mut(&id) {
            Some(plot) if plot.status == PlotStatus::Available => {
                plot.status = PlotStatus::Reserved;
                plot.booking_id = Some(booking);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_finalize_plot(&self, id: PlotId, booking: BookingId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.plots.get_mut(&id) {
            Some(plot)
                if plot.status == PlotStatus::Reserved && plot.booking_id == Some(booking) =>
            {
                plot.status = PlotStatus::Occupied;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_plot(&self, id: PlotId) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(plot) = inner.plots.get_mut(&id) {
            plot.status = PlotStatus::Available;
            plot.booking_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl StaffStore for MemoryStore {
    async fn insert_staff(&self, staff: &Staff) -> Result<()> {
        self.write()?.staff.insert(staff.id, staff.clone());
        Ok(())
    }

    async fn staff(&self, id: StaffId) -> Result<Option<Staff>> {
        Ok(self.read()?.staff.get(&id).cloned())
    }

    async fn active_staff(&self, role: StaffRole) -> Result<Vec<Staff>> {
        let mut members: Vec<Staff> = self
            .read()?
            .staff
            .values()
            .filter(|s| s.role == role && s.active)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    async fn all_staff(&self) -> Result<Vec<Staff>> {
        let mut members: Vec<Staff> = self.read()?.staff.values().cloned().collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    async fn update_staff(&self, staff: &Staff) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.staff.contains_key(&staff.id) {
            return Err(DomainError::not_found("staff", staff.id));
        }
        inner.staff.insert(staff.id, staff.clone());
        Ok(())
    }

    async fn staff_is_referenced(&self, id: StaffId) -> Result<bool> {
        Ok(self
            .read()?
            .assignments
            .iter()
            .any(|a| a.staff_id == Some(id)))
    }

    async fn delete_staff(&self, id: StaffId) -> Result<()> {
        self.write()?.staff.remove(&id);
        Ok(())
    }

    async fn busy_staff(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<Vec<StaffId>> {
        let inner = self.read()?;
        let mut busy = Vec::new();
        for assignment in &inner.assignments {
            if Some(assignment.booking_id) == exclude {
                continue;
            }
            let Some(staff_id) = assignment.staff_id else {
                continue;
            };
            let Some(booking) = inner.bookings.get(&assignment.booking_id) else {
                continue;
            };
            if booking.status.holds_resources()
                && booking.scheduled_at >= start
                && booking.scheduled_at < end
            {
                busy.push(staff_id);
            }
        }
        Ok(busy)
    }

    async fn replace_assignments(
        &self,
        booking: BookingId,
        rows: &[StaffAssignment],
    ) -> Result<()> {
        let mut inner = self.write()?;
        inner.assignments.retain(|a| a.booking_id != booking);
        inner.assignments.extend_from_slice(rows);
        Ok(())
    }

    async fn assignments_for(&self, booking: BookingId) -> Result<Vec<StaffAssignment>> {
        Ok(self
            .read()?
            .assignments
            .iter()
            .filter(|a| a.booking_id == booking)
            .cloned()
            .collect())
    }

    async fn delete_assignments(&self, booking: BookingId) -> Result<()> {
        self.write()?.assignments.retain(|a| a.booking_id != booking);
        Ok(())
    }
}

#[async_trait]
impl KitStore for MemoryStore {
    async fn insert_kit(&self, kit: &FuneralKit) -> Result<()> {
        self.write()?.kits.insert(kit.id, kit.clone());
        Ok(())
    }

    async fn kit(&self, id: KitId) -> Result<Option<FuneralKit>> {
        Ok(self.read()?.kits.get(&id).cloned())
    }

    async fn kit_by_type(&self, kit_type: KitType) -> Result<Option<FuneralKit>> {
        Ok(self
            .read()?
            .kits
            .values()
            .find(|k| k.kit_type == kit_type)
            .cloned())
    }

    async fn kits(&self) -> Result<Vec<FuneralKit>> {
        let mut kits: Vec<FuneralKit> = self.read()?.kits.values().cloned().collect();
        kits.sort_by_key(|k| k.kit_type.as_str());
        Ok(kits)
    }

    async fn try_consume_kit(&self, id: KitId, quantity: u32) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.kits.get_mut(&id) {
            Some(kit) if kit.available >= quantity => {
                kit.available -= quantity;
                kit.total_used += quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore_kit(&self, id: KitId, quantity: u32) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(kit) = inner.kits.get_mut(&id) {
            kit.available += quantity;
            kit.total_used = kit.total_used.saturating_sub(quantity);
        }
        Ok(())
    }

    async fn try_adjust_kit(&self, id: KitId, delta: i64) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.kits.get_mut(&id) {
            Some(kit) => {
                let Some(next) = i64::from(kit.available).checked_add(delta) else {
                    return Ok(false);
                };
                if next < 0 {
                    return Ok(false);
                }
                kit.available = u32::try_from(next)
                    .map_err(|_| DomainError::storage("kit quantity out of range"))?;
                if delta < 0 {
                    let removed = u32::try_from(delta.unsigned_abs())
                        .map_err(|_| DomainError::storage("kit quantity out of range"))?;
                    kit.total_used = kit.total_used.saturating_add(removed);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_kit_reservation(&self, reservation: &KitReservation) -> Result<()> {
        self.write()?.kit_reservations.push(reservation.clone());
        Ok(())
    }

    async fn kit_reservation(
        &self,
        booking: BookingId,
        kit: KitId,
    ) -> Result<Option<KitReservation>> {
        Ok(self
            .read()?
            .kit_reservations
            .iter()
            .find(|r| r.booking_id == booking && r.kit_id == kit)
            .cloned())
    }

    async fn kit_reservations_for(&self, booking: BookingId) -> Result<Vec<KitReservation>> {
        Ok(self
            .read()?
            .kit_reservations
            .iter()
            .filter(|r| r.booking_id == booking)
            .cloned()
            .collect())
    }

    async fn delete_kit_reservation(&self, booking: BookingId, kit: KitId) -> Result<()> {
        self.write()?
            .kit_reservations
            .retain(|r| !(r.booking_id == booking && r.kit_id == kit));
        Ok(())
    }

    async fn delete_kit_reservations(&self, booking: BookingId) -> Result<()> {
        self.write()?
            .kit_reservations
            .retain(|r| r.booking_id != booking);
        Ok(())
    }

    async fn append_kit_usage(&self, record: &KitUsageRecord) -> Result<()> {
        self.write()?.kit_usage.push(record.clone());
        Ok(())
    }

    async fn kit_usage_for(&self, kit: KitId) -> Result<Vec<KitUsageRecord>> {
        Ok(self
            .read()?
            .kit_usage
            .iter()
            .filter(|r| r.kit_id == kit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.write()?.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn booking(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.read()?.bookings.get(&id).cloned())
    }

    async fn update_booking(&self, booking: &Booking) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.bookings.contains_key(&booking.id) {
            return Err(DomainError::not_found("booking", booking.id));
        }
        inner.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn delete_booking(&self, id: BookingId) -> Result<()> {
        let mut inner = self.write()?;
        inner.bookings.remove(&id);
        inner.booking_packages.retain(|(b, _)| *b != id);
        Ok(())
    }

    async fn bookings_for(&self, user: UserId) -> Result<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .read()?
            .bookings
            .values()
            .filter(|b| b.requester == user)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn bookings(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .read()?
            .bookings
            .values()
            .filter(|b| status.is_none_or(|s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn insert_booking_packages(
        &self,
        booking: BookingId,
        packages: &[PackageId],
    ) -> Result<()> {
        let mut inner = self.write()?;
        for package in packages {
            inner.booking_packages.push((booking, *package));
        }
        Ok(())
    }

    async fn packages_for_booking(&self, booking: BookingId) -> Result<Vec<PackageId>> {
        Ok(self
            .read()?
            .booking_packages
            .iter()
            .filter(|(b, _)| *b == booking)
            .map(|(_, p)| *p)
            .collect())
    }
}

#[async_trait]
impl PackageStore for MemoryStore {
    async fn insert_package(&self, package: &Package) -> Result<()> {
        self.write()?.packages.insert(package.id, package.clone());
        Ok(())
    }

    async fn package(&self, id: PackageId) -> Result<Option<Package>> {
        Ok(self.read()?.packages.get(&id).cloned())
    }

    async fn packages(&self, only_active: bool) -> Result<Vec<Package>> {
        let mut packages: Vec<Package> = self
            .read()?
            .packages
            .values()
            .filter(|p| !only_active || p.active)
            .cloned()
            .collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    async fn update_package(&self, package: &Package) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.packages.contains_key(&package.id) {
            return Err(DomainError::not_found("package", package.id));
        }
        inner.packages.insert(package.id, package.clone());
        Ok(())
    }
}

#[async_trait]
impl WaqafStore for MemoryStore {
    async fn insert_waqaf(&self, record: &WaqafRecord) -> Result<()> {
        self.write()?.waqaf.push(record.clone());
        Ok(())
    }

    async fn waqaf_records(&self) -> Result<Vec<WaqafRecord>> {
        let mut records = self.read()?.waqaf.clone();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn plot_reserve_is_compare_and_set() {
        let store = MemoryStore::new();
        let plot = Plot::new(PlotId::new(), "A1-1".to_string(), 1, 1);
        store.insert_plot(&plot).await.unwrap();

        let b1 = BookingId::new();
        let b2 = BookingId::new();
        assert!(store.try_reserve_plot(plot.id, b1).await.unwrap());
        assert!(!store.try_reserve_plot(plot.id, b2).await.unwrap());

        let stored = store.plot(plot.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PlotStatus::Reserved);
        assert_eq!(stored.booking_id, Some(b1));
    }

    #[tokio::test]
    async fn kit_consume_refuses_overdraw() {
        let store = MemoryStore::new();
        let kit = FuneralKit {
            id: KitId::new(),
            kit_type: KitType::Male,
            available: 2,
            total_used: 0,
        };
        store.insert_kit(&kit).await.unwrap();

        assert!(!store.try_consume_kit(kit.id, 3).await.unwrap());
        assert!(store.try_consume_kit(kit.id, 2).await.unwrap());
        let stored = store.kit(kit.id).await.unwrap().unwrap();
        assert_eq!(stored.available, 0);
        assert_eq!(stored.total_used, 2);
    }
}
