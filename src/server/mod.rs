//! HTTP server: shared state, health endpoints and router configuration.

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
