//! HTTP API surface.
//!
//! Handlers are grouped by audience: `availability` is public read-only,
//! `bookings` requires an authenticated member, `admin` requires the admin
//! role. All of them translate [`crate::error::DomainError`] into JSON
//! responses through [`error::ApiError`].

pub mod admin;
pub mod availability;
pub mod bookings;
pub mod error;

pub use error::ApiError;
