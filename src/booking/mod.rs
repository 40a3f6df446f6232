//! Booking Workflow Orchestrator.
//!
//! Drives a booking from creation through approval, payment, confirmation
//! and completion (or rejection/cancellation), coordinating reservation and
//! release of the plot ledger, the staff roster and the kit inventory at the
//! appropriate transitions.
//!
//! # State machine
//!
//! ```text
//! Pending → Approved → Confirmed → Completed
//!    │          │          │
//! Rejected   Cancelled  Cancelled
//! ```
//!
//! # Reservation batch
//!
//! Creation reserves three resources in sequence: plot, staff, kits. Each
//! step is an atomic compare-and-set against its own table; if any step
//! fails, the already-applied steps are compensated in reverse order before
//! the error surfaces, so partial success never leaves one resource held
//! without its siblings.

mod workflow;

pub use workflow::{BookingDetail, BookingWorkflow, CreateBooking, KitRequest};
