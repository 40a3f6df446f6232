//! Cemetery plot booking and administration backend.
//!
//! The core is a set of resource managers coordinated by a booking workflow:
//!
//! - [`plots`] — occupancy ledger for the burial plot grid.
//! - [`staff`] — roster and per-calendar-day availability.
//! - [`kits`] — funeral-kit stock with an append-only usage ledger.
//! - [`packages`] — the service catalog bookings are priced from.
//! - [`booking`] — the workflow orchestrator and its state machine.
//! - [`stats`] — read-only rollups plus waqaf donation records.
//!
//! Persistence sits behind the [`store`] traits with Postgres and in-memory
//! implementations; the HTTP surface lives in [`api`] and [`server`].

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod kits;
pub mod packages;
pub mod plots;
pub mod server;
pub mod staff;
pub mod stats;
pub mod storage;
pub mod store;
pub mod types;

pub use booking::{BookingDetail, BookingWorkflow, CreateBooking, KitRequest};
pub use config::Config;
pub use error::{DomainError, Result};
pub use kits::KitInventory;
pub use packages::PackageCatalog;
pub use plots::PlotLedger;
pub use staff::{RoleSelection, StaffRoster};
pub use stats::StatsAggregator;
