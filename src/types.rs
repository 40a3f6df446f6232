//! Domain types for the cemetery booking system.
//!
//! Value objects, entities and state enums shared by every resource manager:
//! the plot ledger, the staff roster, the funeral-kit inventory and the
//! booking workflow orchestrator.

use crate::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing `Uuid`.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a burial plot.
    PlotId
);
uuid_id!(
    /// Unique identifier for a staff member.
    StaffId
);
uuid_id!(
    /// Unique identifier for a booking.
    BookingId
);
uuid_id!(
    /// Unique identifier for a funeral kit.
    KitId
);
uuid_id!(
    /// Unique identifier for a service package.
    PackageId
);
uuid_id!(
    /// Unique identifier for a waqaf (donation) record.
    WaqafId
);
uuid_id!(
    /// Unique identifier for an authenticated user.
    UserId
);

// ============================================================================
// Money (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Plot Ledger
// ============================================================================

/// Occupancy state of a burial plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotStatus {
    /// Free for reservation.
    Available,
    /// Bound to a live booking awaiting completion.
    Reserved,
    /// A burial has taken place; permanently bound.
    Occupied,
}

impl PlotStatus {
    /// Database text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Occupied => "occupied",
        }
    }

    /// Parse from the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "occupied" => Ok(Self::Occupied),
            _ => Err(DomainError::storage(format!("invalid plot status: {s}"))),
        }
    }
}

/// A single burial plot, addressable by a human-readable code and grid position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    /// Unique plot identifier.
    pub id: PlotId,
    /// Human-readable code, e.g. `A1-5`.
    pub code: String,
    /// Grid row.
    pub row: u32,
    /// Grid column.
    pub column: u32,
    /// Current occupancy status.
    pub status: PlotStatus,
    /// The active booking bound to this plot, if any.
    pub booking_id: Option<BookingId>,
}

impl Plot {
    /// Creates a new available plot.
    #[must_use]
    pub const fn new(id: PlotId, code: String, row: u32, column: u32) -> Self {
        Self {
            id,
            code,
            row,
            column,
            status: PlotStatus::Available,
            booking_id: None,
        }
    }
}

// ============================================================================
// Staff Roster
// ============================================================================

/// Role of a cemetery staff member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Digs and prepares the grave.
    GraveDigger,
    /// Performs the ritual washing of the body.
    BodyWasher,
}

impl StaffRole {
    /// Every role a booking must carry an assignment for.
    pub const MANDATORY: [Self; 2] = [Self::GraveDigger, Self::BodyWasher];

    /// Database text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GraveDigger => "grave_digger",
            Self::BodyWasher => "body_washer",
        }
    }

    /// Parse from the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if the string doesn't match a known role.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "grave_digger" => Ok(Self::GraveDigger),
            "body_washer" => Ok(Self::BodyWasher),
            _ => Err(DomainError::storage(format!("invalid staff role: {s}"))),
        }
    }
}

/// A cemetery staff member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// Unique staff identifier.
    pub id: StaffId,
    /// Full name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Role this member performs.
    pub role: StaffRole,
    /// Whether the member is currently active on the roster.
    pub active: bool,
}

/// Requester-side choice for a mandatory staff role.
///
/// `NotRequired` means the family handles the service themselves. It is exempt
/// from the one-booking-per-day exclusivity rule and may be attached to any
/// number of bookings on the same date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "staff_id")]
pub enum StaffSelection {
    /// Service handled by the family; no staff member needed.
    NotRequired,
    /// A specific roster member.
    Member(StaffId),
}

impl StaffSelection {
    /// Returns the staff id for a `Member` selection.
    #[must_use]
    pub const fn staff_id(&self) -> Option<StaffId> {
        match self {
            Self::NotRequired => None,
            Self::Member(id) => Some(*id),
        }
    }
}

/// Links a booking to a staff selection for one mandatory role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAssignment {
    /// The booking this assignment belongs to.
    pub booking_id: BookingId,
    /// Role being covered.
    pub role: StaffRole,
    /// `None` when the service is not required.
    pub staff_id: Option<StaffId>,
    /// Who recorded the assignment.
    pub assigned_by: UserId,
    /// When the assignment was recorded.
    pub assigned_at: DateTime<Utc>,
}

// ============================================================================
// Funeral Kit Inventory
// ============================================================================

/// Funeral kit variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KitType {
    /// Kit for male deceased.
    Male,
    /// Kit for female deceased.
    Female,
}

impl KitType {
    /// Database text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Parse from the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if the string doesn't match a known kit type.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(DomainError::storage(format!("invalid kit type: {s}"))),
        }
    }
}

/// Countable funeral-kit stock for one kit type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuneralKit {
    /// Unique kit identifier.
    pub id: KitId,
    /// Kit variant.
    pub kit_type: KitType,
    /// Units currently available for reservation. Never negative.
    pub available: u32,
    /// Units consumed by live reservations and admin removals.
    pub total_used: u32,
}

/// Reason code attached to every kit quantity change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KitUsageReason {
    /// Reserved for a booking.
    Booking,
    /// Returned after a booking was cancelled or rejected.
    BookingCancelled,
    /// Admin added stock.
    AdminAdd,
    /// Admin removed stock.
    AdminRemove,
}

impl KitUsageReason {
    /// Database text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::BookingCancelled => "booking_cancelled",
            Self::AdminAdd => "admin_add",
            Self::AdminRemove => "admin_remove",
        }
    }

    /// Parse from the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if the string doesn't match a known reason.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "booking" => Ok(Self::Booking),
            "booking_cancelled" => Ok(Self::BookingCancelled),
            "admin_add" => Ok(Self::AdminAdd),
            "admin_remove" => Ok(Self::AdminRemove),
            _ => Err(DomainError::storage(format!("invalid usage reason: {s}"))),
        }
    }
}

/// Immutable usage-ledger entry recording one kit quantity change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitUsageRecord {
    /// Kit whose quantity changed.
    pub kit_id: KitId,
    /// Booking that caused the change, if any.
    pub booking_id: Option<BookingId>,
    /// Signed change applied to the available quantity.
    pub delta: i64,
    /// Why the quantity changed.
    pub reason: KitUsageReason,
    /// Who performed the change.
    pub actor: UserId,
    /// Free-text note.
    pub note: String,
    /// When the change happened.
    pub recorded_at: DateTime<Utc>,
}

/// Links a booking to a funeral kit with a reserved quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitReservation {
    /// The reserving booking.
    pub booking_id: BookingId,
    /// The reserved kit.
    pub kit_id: KitId,
    /// Units held by the booking.
    pub quantity: u32,
}

// ============================================================================
// Packages
// ============================================================================

/// A burial service package selectable at booking time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Unique package identifier.
    pub id: PackageId,
    /// Display name.
    pub name: String,
    /// Description of included services.
    pub description: String,
    /// Price in cents.
    pub price: Money,
    /// Whether the package is currently offered.
    pub active: bool,
}

// ============================================================================
// Booking
// ============================================================================

/// Gender of the deceased, selecting the matching kit variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl Gender {
    /// Database text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Parse from the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if the string doesn't match a known gender.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(DomainError::storage(format!("invalid gender: {s}"))),
        }
    }
}

/// Details of the person to be buried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deceased {
    /// Full name.
    pub name: String,
    /// National identity card number.
    pub ic_number: String,
    /// Gender.
    pub gender: Gender,
}

/// Booking workflow state machine.
///
/// ```text
/// Pending → Approved → Confirmed → Completed
///    │          │          │
/// Rejected   Cancelled  Cancelled
/// ```
///
/// `Rejected` is reachable only from `Pending`; `Cancelled` from any
/// pre-`Completed` state. Both are terminal and trigger resource release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Submitted, awaiting admin review.
    Pending,
    /// Approved; payment pending within the deadline.
    Approved,
    /// Payment verified by an admin.
    Confirmed,
    /// Burial completed; plot occupied.
    Completed,
    /// Rejected by an admin with a reason.
    Rejected,
    /// Cancelled by the requester or an admin.
    Cancelled,
}

impl BookingStatus {
    /// Whether resources bound to the booking are still held.
    #[must_use]
    pub const fn holds_resources(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::Confirmed)
    }

    /// Whether the booking can still be cancelled.
    #[must_use]
    pub const fn cancellable(&self) -> bool {
        self.holds_resources()
    }

    /// Whether the state machine has reached a final state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }

    /// Database text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::storage(format!("invalid booking status: {s}"))),
        }
    }
}

/// Payment sub-status for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No receipt submitted yet.
    NotSubmitted,
    /// Receipt uploaded, awaiting verification.
    Submitted,
    /// Verified by an admin.
    Confirmed,
}

impl PaymentStatus {
    /// Database text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotSubmitted => "not_submitted",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
        }
    }

    /// Parse from the database text representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "not_submitted" => Ok(Self::NotSubmitted),
            "submitted" => Ok(Self::Submitted),
            "confirmed" => Ok(Self::Confirmed),
            _ => Err(DomainError::storage(format!("invalid payment status: {s}"))),
        }
    }
}

/// Payment record attached to a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Current payment status.
    pub status: PaymentStatus,
    /// Uploaded receipt URL.
    pub receipt_url: Option<String>,
    /// Deadline set at approval time.
    pub deadline: Option<DateTime<Utc>>,
    /// When the receipt was submitted.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Admin who verified the payment.
    pub verified_by: Option<UserId>,
    /// When the payment was verified.
    pub verified_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// An empty payment record for a new booking.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            status: PaymentStatus::NotSubmitted,
            receipt_url: None,
            deadline: None,
            submitted_at: None,
            verified_by: None,
            verified_at: None,
        }
    }
}

/// A burial plot booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// Requesting user.
    pub requester: UserId,
    /// Reserved plot.
    pub plot_id: PlotId,
    /// Deceased person details.
    pub deceased: Deceased,
    /// Scheduled burial date and time.
    pub scheduled_at: DateTime<Utc>,
    /// Total price computed from the selected packages.
    pub total: Money,
    /// Current workflow state.
    pub status: BookingStatus,
    /// Payment sub-record.
    pub payment: Payment,
    /// Uploaded supporting document URLs (death certificate, permits).
    pub document_urls: Vec<String>,
    /// Reason recorded when the booking is rejected.
    pub rejection_reason: Option<String>,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last mutated.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Waqaf
// ============================================================================

/// A charitable donation record, tracked separately from bookings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaqafRecord {
    /// Unique record identifier.
    pub id: WaqafId,
    /// Donor display name.
    pub donor_name: String,
    /// Donated amount in cents.
    pub amount: Money,
    /// Stated purpose, e.g. "land expansion".
    pub purpose: String,
    /// When the donation was recorded.
    pub recorded_at: DateTime<Utc>,
}
