//! Staff roster and per-calendar-day availability tests.

#![allow(clippy::unwrap_used)]

use chrono::{FixedOffset, TimeZone, Utc};
use pusara::staff::RoleSelection;
use pusara::store::{CemeteryStore, MemoryStore};
use pusara::types::{
    Booking, BookingId, BookingStatus, Deceased, Gender, Money, Payment, PlotId, Staff, StaffId,
    StaffRole, StaffSelection, UserId,
};
use pusara::{DomainError, StaffRoster};
use std::sync::Arc;

const TZ_SECONDS: i32 = 8 * 3600;

struct Fixture {
    store: Arc<dyn CemeteryStore>,
    roster: StaffRoster,
    digger: StaffId,
    washer: StaffId,
}

async fn fixture() -> Fixture {
    let store: Arc<dyn CemeteryStore> = Arc::new(MemoryStore::new());
    let tz = FixedOffset::east_opt(TZ_SECONDS).unwrap();
    let roster = StaffRoster::new(store.clone(), tz);

    let digger = StaffId::new();
    let washer = StaffId::new();
    store
        .insert_staff(&Staff {
            id: digger,
            name: "Ahmad".to_string(),
            phone: "012-3456789".to_string(),
            role: StaffRole::GraveDigger,
            active: true,
        })
        .await
        .unwrap();
    store
        .insert_staff(&Staff {
            id: washer,
            name: "Siti".to_string(),
            phone: "013-9876543".to_string(),
            role: StaffRole::BodyWasher,
            active: true,
        })
        .await
        .unwrap();

    Fixture {
        store,
        roster,
        digger,
        washer,
    }
}

/// Inserts a live booking row so assignments against it count as busy.
async fn live_booking(store: &Arc<dyn CemeteryStore>, scheduled_at: chrono::DateTime<Utc>) -> BookingId {
    let now = Utc::now();
    let booking = Booking {
        id: BookingId::new(),
        requester: UserId::new(),
        plot_id: PlotId::new(),
        deceased: Deceased {
            name: "Abdullah".to_string(),
            ic_number: "501231-10-5555".to_string(),
            gender: Gender::Male,
        },
        scheduled_at,
        total: Money::from_cents(100_000),
        status: BookingStatus::Pending,
        payment: Payment::empty(),
        document_urls: vec![],
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_booking(&booking).await.unwrap();
    booking.id
}

fn both_roles(digger: StaffSelection, washer: StaffSelection) -> Vec<RoleSelection> {
    vec![
        RoleSelection {
            role: StaffRole::GraveDigger,
            selection: digger,
        },
        RoleSelection {
            role: StaffRole::BodyWasher,
            selection: washer,
        },
    ]
}

#[tokio::test]
async fn assigned_member_disappears_from_that_day_only() {
    let fx = fixture().await;
    let date = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
    let booking = live_booking(&fx.store, date).await;

    fx.roster
        .assign(
            booking,
            date,
            &both_roles(
                StaffSelection::Member(fx.digger),
                StaffSelection::NotRequired,
            ),
            UserId::new(),
        )
        .await
        .unwrap();

    let same_day = fx
        .roster
        .list_available(StaffRole::GraveDigger, date)
        .await
        .unwrap();
    assert!(same_day.is_empty());

    let next_day = fx
        .roster
        .list_available(
            StaffRole::GraveDigger,
            Utc.with_ymd_and_hms(2025, 3, 11, 2, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(next_day.len(), 1);
    assert_eq!(next_day[0].id, fx.digger);
}

#[tokio::test]
async fn availability_is_judged_in_the_local_zone() {
    let fx = fixture().await;
    // 23:00 UTC on Mar 9 is already Mar 10 in UTC+8.
    let late_utc = Utc.with_ymd_and_hms(2025, 3, 9, 23, 0, 0).unwrap();
    let booking = live_booking(&fx.store, late_utc).await;

    fx.roster
        .assign(
            booking,
            late_utc,
            &both_roles(
                StaffSelection::Member(fx.digger),
                StaffSelection::NotRequired,
            ),
            UserId::new(),
        )
        .await
        .unwrap();

    // Mar 10 morning local time falls on the same local day: busy.
    let morning = Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap();
    assert!(fx
        .roster
        .list_available(StaffRole::GraveDigger, morning)
        .await
        .unwrap()
        .is_empty());

    // Mar 9 afternoon UTC is still Mar 9 locally: free.
    let earlier = Utc.with_ymd_and_hms(2025, 3, 9, 8, 0, 0).unwrap();
    assert_eq!(
        fx.roster
            .list_available(StaffRole::GraveDigger, earlier)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn double_booking_a_member_on_one_day_conflicts() {
    let fx = fixture().await;
    let date = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
    let first = live_booking(&fx.store, date).await;
    let second = live_booking(&fx.store, date).await;
    let selections = both_roles(
        StaffSelection::Member(fx.digger),
        StaffSelection::Member(fx.washer),
    );

    fx.roster
        .assign(first, date, &selections, UserId::new())
        .await
        .unwrap();
    let err = fx
        .roster
        .assign(second, date, &selections, UserId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // The failed call persisted nothing.
    assert!(fx.roster.assignments(second).await.unwrap().is_empty());
}

#[tokio::test]
async fn reassignment_does_not_conflict_with_itself() {
    let fx = fixture().await;
    let date = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
    let booking = live_booking(&fx.store, date).await;

    fx.roster
        .assign(
            booking,
            date,
            &both_roles(
                StaffSelection::Member(fx.digger),
                StaffSelection::NotRequired,
            ),
            UserId::new(),
        )
        .await
        .unwrap();

    // Same member again for the same booking: allowed, replaced wholesale.
    fx.roster
        .assign(
            booking,
            date,
            &both_roles(
                StaffSelection::Member(fx.digger),
                StaffSelection::Member(fx.washer),
            ),
            UserId::new(),
        )
        .await
        .unwrap();

    let assignments = fx.roster.assignments(booking).await.unwrap();
    assert_eq!(assignments.len(), 2);
}

#[tokio::test]
async fn cancelled_bookings_free_their_staff() {
    let fx = fixture().await;
    let date = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
    let booking = live_booking(&fx.store, date).await;

    fx.roster
        .assign(
            booking,
            date,
            &both_roles(
                StaffSelection::Member(fx.digger),
                StaffSelection::NotRequired,
            ),
            UserId::new(),
        )
        .await
        .unwrap();
    fx.roster.release(booking).await.unwrap();

    assert_eq!(
        fx.roster
            .list_available(StaffRole::GraveDigger, date)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn wrong_role_and_inactive_members_are_rejected() {
    let fx = fixture().await;
    let date = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
    let booking = live_booking(&fx.store, date).await;

    // Washer selected for the digger role.
    let err = fx
        .roster
        .assign(
            booking,
            date,
            &both_roles(
                StaffSelection::Member(fx.washer),
                StaffSelection::NotRequired,
            ),
            UserId::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    // Deactivated member.
    let mut retired = fx.roster.get(fx.digger).await.unwrap();
    retired.active = false;
    fx.roster.update(retired).await.unwrap();
    let err = fx
        .roster
        .assign(
            booking,
            date,
            &both_roles(
                StaffSelection::Member(fx.digger),
                StaffSelection::NotRequired,
            ),
            UserId::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn referenced_staff_cannot_be_deleted() {
    let fx = fixture().await;
    let date = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
    let booking = live_booking(&fx.store, date).await;

    fx.roster
        .assign(
            booking,
            date,
            &both_roles(
                StaffSelection::Member(fx.digger),
                StaffSelection::NotRequired,
            ),
            UserId::new(),
        )
        .await
        .unwrap();

    let err = fx.roster.delete(fx.digger).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Unreferenced members can go.
    fx.roster.delete(fx.washer).await.unwrap();
}
