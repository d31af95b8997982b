//! API layer - HTTP endpoints

pub mod health;
pub mod router;
pub mod sequences;
pub mod state;
pub mod steps;
pub mod types;

pub use router::create_router_with_state;
pub use state::AppState;
