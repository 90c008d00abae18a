pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod services;

// Re-export main components for easier use
pub use error::Error;
pub use services::{IncidentStore, InMemoryIncidentStore, PgIncidentStore};
