//! Funeral-kit inventory tests: stock accounting, ledger entries and the
//! never-negative invariant under arbitrary admin adjustment sequences.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use pusara::store::{CemeteryStore, MemoryStore};
use pusara::types::{
    BookingId, FuneralKit, KitId, KitType, KitUsageReason, UserId,
};
use pusara::{DomainError, KitInventory};
use std::sync::Arc;

async fn inventory_with_stock(available: u32) -> (KitInventory, KitId) {
    let store: Arc<dyn CemeteryStore> = Arc::new(MemoryStore::new());
    let id = KitId::new();
    store
        .insert_kit(&FuneralKit {
            id,
            kit_type: KitType::Male,
            available,
            total_used: 0,
        })
        .await
        .unwrap();
    (KitInventory::new(store), id)
}

#[tokio::test]
async fn reserve_moves_stock_and_writes_the_ledger() {
    let (inventory, id) = inventory_with_stock(5).await;
    let booking = BookingId::new();
    let actor = UserId::new();

    inventory
        .reserve(booking, KitType::Male, 2, actor)
        .await
        .unwrap();

    let kit = inventory.get(id).await.unwrap();
    assert_eq!(kit.available, 3);
    assert_eq!(kit.total_used, 2);

    let ledger = inventory.usage_history(id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].delta, -2);
    assert_eq!(ledger[0].reason, KitUsageReason::Booking);
    assert_eq!(ledger[0].booking_id, Some(booking));
}

#[tokio::test]
async fn overdraw_is_refused_without_mutation() {
    let (inventory, id) = inventory_with_stock(1).await;
    let err = inventory
        .reserve(BookingId::new(), KitType::Male, 2, UserId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InsufficientStock(_)));

    let kit = inventory.get(id).await.unwrap();
    assert_eq!(kit.available, 1);
    assert_eq!(kit.total_used, 0);
    assert!(inventory.usage_history(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn double_reservation_for_one_booking_is_refused() {
    let (inventory, _) = inventory_with_stock(5).await;
    let booking = BookingId::new();
    let actor = UserId::new();

    inventory
        .reserve(booking, KitType::Male, 1, actor)
        .await
        .unwrap();
    let err = inventory
        .reserve(booking, KitType::Male, 1, actor)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateReservation(_)));
}

#[tokio::test]
async fn release_returns_stock_and_compensates_the_ledger() {
    let (inventory, id) = inventory_with_stock(5).await;
    let booking = BookingId::new();
    let actor = UserId::new();

    inventory
        .reserve(booking, KitType::Male, 3, actor)
        .await
        .unwrap();
    inventory.release(booking, actor).await.unwrap();

    let kit = inventory.get(id).await.unwrap();
    assert_eq!(kit.available, 5);

    let ledger = inventory.usage_history(id).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[1].delta, 3);
    assert_eq!(ledger[1].reason, KitUsageReason::BookingCancelled);

    // Releasing again finds nothing to do.
    inventory.release(booking, actor).await.unwrap();
    assert_eq!(inventory.usage_history(id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn admin_adjustments_guard_against_negative_stock() {
    let (inventory, id) = inventory_with_stock(2).await;
    let actor = UserId::new();

    let kit = inventory
        .adjust(id, 5, KitUsageReason::AdminAdd, "restock".to_string(), actor)
        .await
        .unwrap();
    assert_eq!(kit.available, 7);

    let err = inventory
        .adjust(
            id,
            -10,
            KitUsageReason::AdminRemove,
            "damaged".to_string(),
            actor,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NegativeStock(_)));
    assert_eq!(inventory.get(id).await.unwrap().available, 7);

    // Rejected adjustments leave no ledger entry.
    let ledger = inventory.usage_history(id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].reason, KitUsageReason::AdminAdd);
}

#[tokio::test]
async fn admin_removal_counts_into_total_used() {
    let (inventory, id) = inventory_with_stock(5).await;
    let actor = UserId::new();

    let kit = inventory
        .adjust(
            id,
            -2,
            KitUsageReason::AdminRemove,
            "damaged".to_string(),
            actor,
        )
        .await
        .unwrap();
    assert_eq!(kit.available, 3);
    assert_eq!(kit.total_used, 2);

    // Restocking is pure injection and does not rewind the used counter.
    let kit = inventory
        .adjust(id, 4, KitUsageReason::AdminAdd, "restock".to_string(), actor)
        .await
        .unwrap();
    assert_eq!(kit.available, 7);
    assert_eq!(kit.total_used, 2);
}

#[tokio::test]
async fn booking_reason_codes_are_not_usable_for_adjustments() {
    let (inventory, id) = inventory_with_stock(2).await;
    let err = inventory
        .adjust(id, 1, KitUsageReason::Booking, String::new(), UserId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn seeding_a_second_row_for_a_type_conflicts() {
    let (inventory, _) = inventory_with_stock(2).await;
    let err = inventory.create(KitType::Male, 10).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    inventory.create(KitType::Female, 10).await.unwrap();
}

proptest! {
    /// Available stock never goes negative and always equals the seed plus
    /// the sum of accepted deltas, whatever adjustment sequence arrives.
    #[test]
    fn stock_never_goes_negative(
        seed in 0u32..50,
        deltas in prop::collection::vec(-40i64..40, 1..30),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            let (inventory, id) = inventory_with_stock(seed).await;
            let actor = UserId::new();
            let mut expected = i64::from(seed);

            for delta in deltas {
                if delta == 0 {
                    continue;
                }
                let reason = if delta > 0 {
                    KitUsageReason::AdminAdd
                } else {
                    KitUsageReason::AdminRemove
                };
                match inventory.adjust(id, delta, reason, String::new(), actor).await {
                    Ok(kit) => {
                        expected += delta;
                        prop_assert_eq!(i64::from(kit.available), expected);
                    }
                    Err(DomainError::NegativeStock(_)) => {
                        prop_assert!(expected + delta < 0);
                    }
                    Err(other) => return Err(TestCaseError::fail(other.to_string())),
                }
            }
            let kit = inventory.get(id).await.unwrap();
            prop_assert!(expected >= 0);
            prop_assert_eq!(i64::from(kit.available), expected);
            Ok(())
        })?;
    }
}
