//! Staff Roster & Availability Checker.
//!
//! Tracks staff by role and determines who is free on a given date. A real
//! member may serve at most one live booking per calendar day; the
//! [`StaffSelection::NotRequired`] variant represents family-handled service
//! and is exempt from the exclusivity rule.
//!
//! Calendar days are compared in the cemetery's configured local time zone,
//! not by exact timestamp.

use crate::error::{DomainError, Result};
use crate::store::CemeteryStore;
use crate::types::{
    BookingId, Staff, StaffAssignment, StaffId, StaffRole, StaffSelection, UserId,
};
use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// One requested role coverage for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleSelection {
    /// The mandatory role being covered.
    pub role: StaffRole,
    /// The chosen member, or not-required.
    pub selection: StaffSelection,
}

/// Roster and per-day availability over the staff tables.
#[derive(Clone)]
pub struct StaffRoster {
    store: Arc<dyn CemeteryStore>,
    time_zone: FixedOffset,
}

/// UTC bounds `[start, end)` of the calendar day containing `at`, in `tz`.
#[must_use]
pub fn day_bounds(at: DateTime<Utc>, tz: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = at.with_timezone(&tz).date_naive().and_time(NaiveTime::MIN);
    let start = match tz.from_local_datetime(&local_midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => at,
    };
    (start, start + Duration::days(1))
}

impl StaffRoster {
    /// Creates a roster over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CemeteryStore>, time_zone: FixedOffset) -> Self {
        Self { store, time_zone }
    }

    /// Active members of `role` with no live booking on the calendar day of
    /// `date`. "Not required" is always selectable and is represented by
    /// [`StaffSelection::NotRequired`] rather than a roster row.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn list_available(
        &self,
        role: StaffRole,
        date: DateTime<Utc>,
    ) -> Result<Vec<Staff>> {
        let (start, end) = day_bounds(date, self.time_zone);
        let busy: HashSet<StaffId> = self
            .store
            .busy_staff(start, end, None)
            .await?
            .into_iter()
            .collect();
        Ok(self
            .store
            .active_staff(role)
            .await?
            .into_iter()
            .filter(|s| !busy.contains(&s.id))
            .collect())
    }

    /// Record the staff selections for a booking, replacing any prior
    /// assignments wholesale.
    ///
    /// Exclusivity is re-validated for the booking's own date, excluding the
    /// booking's previous assignments, so re-assignment to the same member
    /// does not conflict with itself. The whole call fails and persists
    /// nothing if any selected member is busy.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] if a mandatory role is missing or
    ///   selected twice.
    /// - [`DomainError::NotFound`] if a selected member does not exist.
    /// - [`DomainError::Validation`] if a member is inactive or has the
    ///   wrong role.
    /// - [`DomainError::Conflict`] if a member already serves another live
    ///   booking that day.
    pub async fn assign(
        &self,
        booking: BookingId,
        date: DateTime<Utc>,
        selections: &[RoleSelection],
        assigned_by: UserId,
    ) -> Result<()> {
        for role in StaffRole::MANDATORY {
            let count = selections.iter().filter(|s| s.role == role).count();
            if count != 1 {
                return Err(DomainError::validation(format!(
                    "exactly one selection required for role {}",
                    role.as_str()
                )));
            }
        }

        let (start, end) = day_bounds(date, self.time_zone);
        let busy: HashSet<StaffId> = self
            .store
            .busy_staff(start, end, Some(booking))
            .await?
            .into_iter()
            .collect();

        let mut chosen = HashSet::new();
        for selection in selections {
            let Some(staff_id) = selection.selection.staff_id() else {
                continue;
            };
            let member = self
                .store
                .staff(staff_id)
                .await?
                .ok_or_else(|| DomainError::not_found("staff", staff_id))?;
            if !member.active {
                return Err(DomainError::validation(format!(
                    "staff {} is not active",
                    member.name
                )));
            }
            if member.role != selection.role {
                return Err(DomainError::validation(format!(
                    "staff {} is a {}, not a {}",
                    member.name,
                    member.role.as_str(),
                    selection.role.as_str()
                )));
            }
            if busy.contains(&staff_id) || !chosen.insert(staff_id) {
                return Err(DomainError::conflict(format!(
                    "staff {} is already assigned on that day",
                    member.name
                )));
            }
        }

        let now = Utc::now();
        let rows: Vec<StaffAssignment> = selections
            .iter()
            .map(|s| StaffAssignment {
                booking_id: booking,
                role: s.role,
                staff_id: s.selection.staff_id(),
                assigned_by,
                assigned_at: now,
            })
            .collect();
        self.store.replace_assignments(booking, &rows).await?;
        tracing::info!(booking = %booking, count = rows.len(), "staff assigned");
        Ok(())
    }

    /// Current assignments held by a booking.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn assignments(&self, booking: BookingId) -> Result<Vec<StaffAssignment>> {
        self.store.assignments_for(booking).await
    }

    /// Release all assignments for a booking. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn release(&self, booking: BookingId) -> Result<()> {
        self.store.delete_assignments(booking).await?;
        tracing::info!(booking = %booking, "staff assignments released");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Roster administration
    // ------------------------------------------------------------------

    /// Fetch a member by id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the member does not exist.
    pub async fn get(&self, id: StaffId) -> Result<Staff> {
        self.store
            .staff(id)
            .await?
            .ok_or_else(|| DomainError::not_found("staff", id))
    }

    /// The whole roster, active and inactive.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn list(&self) -> Result<Vec<Staff>> {
        self.store.all_staff().await
    }

    /// Add a roster member.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if the name is empty.
    pub async fn create(&self, staff: Staff) -> Result<Staff> {
        if staff.name.trim().is_empty() {
            return Err(DomainError::validation("staff name must not be empty"));
        }
        self.store.insert_staff(&staff).await?;
        Ok(staff)
    }

    /// Overwrite a member's details.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the member does not exist.
    pub async fn update(&self, staff: Staff) -> Result<Staff> {
        self.store.update_staff(&staff).await?;
        Ok(staff)
    }

    /// Remove a member. Allowed only while no assignment references them;
    /// deactivate instead to retire a referenced member.
    ///
    /// # Errors
    ///
    /// - [`DomainError::NotFound`] if the member does not exist.
    /// - [`DomainError::Conflict`] if assignments still reference them.
    pub async fn delete(&self, id: StaffId) -> Result<()> {
        let member = self.get(id).await?;
        if self.store.staff_is_referenced(id).await? {
            return Err(DomainError::conflict(format!(
                "staff {} is referenced by bookings; deactivate instead",
                member.name
            )));
        }
        self.store.delete_staff(id).await
    }
}
