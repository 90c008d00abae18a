pub mod incident_store;
pub mod memory_store;
pub mod postgres_store;

pub use incident_store::{create_incident_store, validate_incident_id, IncidentStore};
pub use memory_store::InMemoryIncidentStore;
pub use postgres_store::PgIncidentStore;
