//! Cancel and reject must survive a datastore failure part-way through:
//! resources are freed before the terminal status is persisted, so a failed
//! call leaves the booking in its prior state and a retry finishes the job.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pusara::auth::Principal;
use pusara::config::BookingConfig;
use pusara::staff::RoleSelection;
use pusara::store::{
    BookingStore, CemeteryStore, KitStore, MemoryStore, PackageStore, PlotStore, StaffStore,
    WaqafStore,
};
use pusara::types::{
    Booking, BookingId, BookingStatus, Deceased, FuneralKit, Gender, KitId, KitReservation,
    KitType, KitUsageRecord, Money, Package, PackageId, Plot, PlotId, PlotStatus, Staff,
    StaffAssignment, StaffId, StaffRole, StaffSelection, UserId, WaqafRecord,
};
use pusara::{BookingWorkflow, CreateBooking, DomainError, KitRequest, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Delegates everything to a [`MemoryStore`], except that the next `n`
/// armed calls to `update_booking` fail as if the connection dropped.
struct FailingUpdateStore {
    inner: MemoryStore,
    failures: AtomicU32,
}

impl FailingUpdateStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(0),
        }
    }

    fn arm(&self, failures: u32) {
        self.failures.store(failures, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlotStore for FailingUpdateStore {
    async fn insert_plot(&self, plot: &Plot) -> Result<()> {
        self.inner.insert_plot(plot).await
    }
    async fn plot(&self, id: PlotId) -> Result<Option<Plot>> {
        self.inner.plot(id).await
    }
    async fn plots(&self) -> Result<Vec<Plot>> {
        self.inner.plots().await
    }
    async fn try_reserve_plot(&self, id: PlotId, booking: BookingId) -> Result<bool> {
        self.inner.try_reserve_plot(id, booking).await
    }
    async fn try_finalize_plot(&self, id: PlotId, booking: BookingId) -> Result<bool> {
        self.inner.try_finalize_plot(id, booking).await
    }
    async fn release_plot(&self, id: PlotId) -> Result<()> {
        self.inner.release_plot(id).await
    }
}

#[async_trait]
impl StaffStore for FailingUpdateStore {
    async fn insert_staff(&self, staff: &Staff) -> Result<()> {
        self.inner.insert_staff(staff).await
    }
    async fn staff(&self, id: StaffId) -> Result<Option<Staff>> {
        self.inner.staff(id).await
    }
    async fn active_staff(&self, role: StaffRole) -> Result<Vec<Staff>> {
        self.inner.active_staff(role).await
    }
    async fn all_staff(&self) -> Result<Vec<Staff>> {
        self.inner.all_staff().await
    }
    async fn update_staff(&self, staff: &Staff) -> Result<()> {
        self.inner.update_staff(staff).await
    }
    async fn staff_is_referenced(&self, id: StaffId) -> Result<bool> {
        self.inner.staff_is_referenced(id).await
    }
    async fn delete_staff(&self, id: StaffId) -> Result<()> {
        self.inner.delete_staff(id).await
    }
    async fn busy_staff(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<Vec<StaffId>> {
        self.inner.busy_staff(start, end, exclude).await
    }
    async fn replace_assignments(
        &self,
        booking: BookingId,
        rows: &[StaffAssignment],
    ) -> Result<()> {
        self.inner.replace_assignments(booking, rows).await
    }
    async fn assignments_for(&self, booking: BookingId) -> Result<Vec<StaffAssignment>> {
        self.inner.assignments_for(booking).await
    }
    async fn delete_assignments(&self, booking: BookingId) -> Result<()> {
        self.inner.delete_assignments(booking).await
    }
}

#[async_trait]
impl KitStore for FailingUpdateStore {
    async fn insert_kit(&self, kit: &FuneralKit) -> Result<()> {
        self.inner.insert_kit(kit).await
    }
    async fn kit(&self, id: KitId) -> Result<Option<FuneralKit>> {
        self.inner.kit(id).await
    }
    async fn kit_by_type(&self, kit_type: KitType) -> Result<Option<FuneralKit>> {
        self.inner.kit_by_type(kit_type).await
    }
    async fn kits(&self) -> Result<Vec<FuneralKit>> {
        self.inner.kits().await
    }
    async fn try_consume_kit(&self, id: KitId, quantity: u32) -> Result<bool> {
        self.inner.try_consume_kit(id, quantity).await
    }
    async fn restore_kit(&self, id: KitId, quantity: u32) -> Result<()> {
        self.inner.restore_kit(id, quantity).await
    }
    async fn try_adjust_kit(&self, id: KitId, delta: i64) -> Result<bool> {
        self.inner.try_adjust_kit(id, delta).await
    }
    async fn insert_kit_reservation(&self, reservation: &KitReservation) -> Result<()> {
        self.inner.insert_kit_reservation(reservation).await
    }
    async fn kit_reservation(
        &self,
        booking: BookingId,
        kit: KitId,
    ) -> Result<Option<KitReservation>> {
        self.inner.kit_reservation(booking, kit).await
    }
    async fn kit_reservations_for(&self, booking: BookingId) -> Result<Vec<KitReservation>> {
        self.inner.kit_reservations_for(booking).await
    }
    async fn delete_kit_reservation(&self, booking: BookingId, kit: KitId) -> Result<()> {
        self.inner.delete_kit_reservation(booking, kit).await
    }
    async fn delete_kit_reservations(&self, booking: BookingId) -> Result<()> {
        self.inner.delete_kit_reservations(booking).await
    }
    async fn append_kit_usage(&self, record: &KitUsageRecord) -> Result<()> {
        self.inner.append_kit_usage(record).await
    }
    async fn kit_usage_for(&self, kit: KitId) -> Result<Vec<KitUsageRecord>> {
        self.inner.kit_usage_for(kit).await
    }
}

#[async_trait]
impl BookingStore for FailingUpdateStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.inner.insert_booking(booking).await
    }
    async fn booking(&self, id: BookingId) -> Result<Option<Booking>> {
        self.inner.booking(id).await
    }
    async fn update_booking(&self, booking: &Booking) -> Result<()> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DomainError::storage("connection reset"));
        }
        self.inner.update_booking(booking).await
    }
    async fn delete_booking(&self, id: BookingId) -> Result<()> {
        self.inner.delete_booking(id).await
    }
    async fn bookings_for(&self, user: UserId) -> Result<Vec<Booking>> {
        self.inner.bookings_for(user).await
    }
    async fn bookings(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>> {
        self.inner.bookings(status).await
    }
    async fn insert_booking_packages(
        &self,
        booking: BookingId,
        packages: &[PackageId],
    ) -> Result<()> {
        self.inner.insert_booking_packages(booking, packages).await
    }
    async fn packages_for_booking(&self, booking: BookingId) -> Result<Vec<PackageId>> {
        self.inner.packages_for_booking(booking).await
    }
}

#[async_trait]
impl PackageStore for FailingUpdateStore {
    async fn insert_package(&self, package: &Package) -> Result<()> {
        self.inner.insert_package(package).await
    }
    async fn package(&self, id: PackageId) -> Result<Option<Package>> {
        self.inner.package(id).await
    }
    async fn packages(&self, only_active: bool) -> Result<Vec<Package>> {
        self.inner.packages(only_active).await
    }
    async fn update_package(&self, package: &Package) -> Result<()> {
        self.inner.update_package(package).await
    }
}

#[async_trait]
impl WaqafStore for FailingUpdateStore {
    async fn insert_waqaf(&self, record: &WaqafRecord) -> Result<()> {
        self.inner.insert_waqaf(record).await
    }
    async fn waqaf_records(&self) -> Result<Vec<WaqafRecord>> {
        self.inner.waqaf_records().await
    }
}

struct Fixture {
    faults: Arc<FailingUpdateStore>,
    workflow: BookingWorkflow,
    plot: PlotId,
    package: PackageId,
}

async fn fixture() -> Fixture {
    let faults = Arc::new(FailingUpdateStore::new());
    let store: Arc<dyn CemeteryStore> = faults.clone();

    let plot = PlotId::new();
    store
        .insert_plot(&Plot::new(plot, "B2-1".to_string(), 2, 1))
        .await
        .unwrap();
    store
        .insert_kit(&FuneralKit {
            id: KitId::new(),
            kit_type: KitType::Male,
            available: 3,
            total_used: 0,
        })
        .await
        .unwrap();

    let package = PackageId::new();
    store
        .insert_package(&Package {
            id: package,
            name: "Standard burial".to_string(),
            description: String::new(),
            price: Money::from_cents(150_000),
            active: true,
        })
        .await
        .unwrap();

    Fixture {
        workflow: BookingWorkflow::new(store, BookingConfig::default()),
        faults,
        plot,
        package,
    }
}

fn request(fx: &Fixture) -> CreateBooking {
    CreateBooking {
        plot_id: fx.plot,
        deceased: Deceased {
            name: "Hassan bin Ismail".to_string(),
            ic_number: "470615-07-3333".to_string(),
            gender: Gender::Male,
        },
        scheduled_at: Utc.with_ymd_and_hms(2025, 4, 2, 3, 0, 0).unwrap(),
        package_ids: vec![fx.package],
        kits: vec![KitRequest {
            kit_type: KitType::Male,
            quantity: 1,
        }],
        staff: vec![
            RoleSelection {
                role: StaffRole::GraveDigger,
                selection: StaffSelection::NotRequired,
            },
            RoleSelection {
                role: StaffRole::BodyWasher,
                selection: StaffSelection::NotRequired,
            },
        ],
        document_urls: vec![],
    }
}

#[tokio::test]
async fn failed_cancel_leaves_the_booking_retryable() {
    let fx = fixture().await;
    let member = Principal::member(UserId::new());

    let booking = fx.workflow.create(member, request(&fx)).await.unwrap();

    fx.faults.arm(1);
    let err = fx.workflow.cancel(member, booking.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Storage(_)));

    // Resources were already freed, and the booking never reached the
    // cancelled state, so nothing is stranded behind the no-op path.
    let plot = fx.workflow.plots().get(fx.plot).await.unwrap();
    assert_eq!(plot.status, PlotStatus::Available);
    let detail = fx.workflow.get(member, booking.id).await.unwrap();
    assert_eq!(detail.booking.status, BookingStatus::Pending);

    let cancelled = fx.workflow.cancel(member, booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    let kits = fx.workflow.kits().list().await.unwrap();
    assert_eq!(kits[0].available, 3);
}

#[tokio::test]
async fn failed_reject_leaves_the_booking_retryable() {
    let fx = fixture().await;
    let member = Principal::member(UserId::new());
    let admin = Principal::admin(UserId::new());

    let booking = fx.workflow.create(member, request(&fx)).await.unwrap();

    fx.faults.arm(1);
    let err = fx
        .workflow
        .reject(admin, booking.id, "plot unsuitable")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Storage(_)));

    let detail = fx.workflow.get(admin, booking.id).await.unwrap();
    assert_eq!(detail.booking.status, BookingStatus::Pending);

    let rejected = fx
        .workflow
        .reject(admin, booking.id, "plot unsuitable")
        .await
        .unwrap();
    assert_eq!(rejected.status, BookingStatus::Rejected);
    let plot = fx.workflow.plots().get(fx.plot).await.unwrap();
    assert_eq!(plot.status, PlotStatus::Available);
    let kits = fx.workflow.kits().list().await.unwrap();
    assert_eq!(kits[0].available, 3);
}
