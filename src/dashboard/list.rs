use crate::db::models::{IncidentFilter, IncidentRecord, ResolveAction};
use crate::services::IncidentStore;
use log::{error, info};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    /// Load failed; the dashboard offers a manual retry
    Failed(String),
}

/// Open incidents shown in the list, plus in-flight resolves
#[derive(Debug, Clone)]
pub struct IncidentListState {
    load: LoadState,
    incidents: Vec<IncidentRecord>,
    resolving: HashSet<String>,
    error: Option<String>,
}

impl Default for IncidentListState {
    fn default() -> Self {
        Self::new()
    }
}

impl IncidentListState {
    pub fn new() -> Self {
        Self {
            load: LoadState::Loading,
            incidents: Vec::new(),
            resolving: HashSet::new(),
            error: None,
        }
    }

    /// Query the store for unresolved incidents
    pub async fn load(&mut self, store: &dyn IncidentStore) {
        self.load = LoadState::Loading;
        self.error = None;

        match store.list_incidents(IncidentFilter::unresolved()).await {
            Ok(incidents) => self.loaded(incidents),
            Err(e) => {
                error!("Error fetching incidents: {}", e);
                self.load = LoadState::Failed(e.to_string());
            }
        }
    }

    pub fn loaded(&mut self, incidents: Vec<IncidentRecord>) {
        self.incidents = incidents;
        self.load = LoadState::Loaded;
    }

    /// Mark a listed incident as resolving. False if it is not listed or already in flight.
    pub fn begin_resolve(&mut self, id: &str) -> bool {
        if self.find(id).is_none() || self.resolving.contains(id) {
            return false;
        }
        self.resolving.insert(id.to_string());
        true
    }

    /// Settle an in-flight resolve. Success drops the row without re-querying;
    /// failure keeps the row and records the error.
    pub fn finish_resolve(&mut self, id: &str, outcome: Result<(), String>) {
        self.resolving.remove(id);
        match outcome {
            Ok(()) => self.incidents.retain(|incident| incident.id != id),
            Err(message) => self.error = Some(format!("Failed to resolve incident: {}", message)),
        }
    }

    /// Resolve one listed incident through the store
    pub async fn resolve(&mut self, store: &dyn IncidentStore, id: &str) -> bool {
        if !self.begin_resolve(id) {
            self.error = Some(format!("Incident {} is not open", id));
            return false;
        }

        // The list only holds open incidents, so only an open one may be resolved.
        let action = ResolveAction::CompareAndSet {
            expected: false,
            value: true,
        };
        let outcome = store
            .resolve_incident(id, action)
            .await
            .map(|_| info!("Resolved incident {}", id))
            .map_err(|e| {
                error!("Error resolving incident: {}", e);
                e.to_string()
            });
        let resolved = outcome.is_ok();
        self.finish_resolve(id, outcome);
        resolved
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn incidents(&self) -> &[IncidentRecord] {
        &self.incidents
    }

    pub fn find(&self, id: &str) -> Option<&IncidentRecord> {
        self.incidents.iter().find(|incident| incident.id == id)
    }

    pub fn is_resolving(&self, id: &str) -> bool {
        self.resolving.contains(id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryIncidentStore;
    use chrono::Utc;

    async fn loaded_list() -> (InMemoryIncidentStore, IncidentListState) {
        let store = InMemoryIncidentStore::fixture(Utc::now());
        let mut list = IncidentListState::new();
        assert_eq!(list.load_state(), &LoadState::Loading);
        list.load(&store).await;
        (store, list)
    }

    #[tokio::test]
    async fn load_fetches_open_incidents() {
        let (_, list) = loaded_list().await;
        assert_eq!(list.load_state(), &LoadState::Loaded);
        assert_eq!(list.incidents().len(), 4);
        assert!(list.incidents().iter().all(|i| !i.resolved));
    }

    #[tokio::test]
    async fn resolve_removes_row_without_reloading() {
        let (store, mut list) = loaded_list().await;

        assert!(list.resolve(&store, "2").await);
        assert!(list.find("2").is_none());
        assert_eq!(list.incidents().len(), 3);
        assert!(!list.is_resolving("2"));
        assert!(list.error().is_none());

        let open = store
            .list_incidents(IncidentFilter::unresolved())
            .await
            .unwrap();
        assert!(open.iter().all(|i| i.id != "2"));
    }

    #[tokio::test]
    async fn failed_resolve_keeps_row_and_reports() {
        let (store, mut list) = loaded_list().await;
        // Someone else resolved it after the list was loaded.
        store
            .resolve_incident("3", ResolveAction::Set(true))
            .await
            .unwrap();

        assert!(!list.resolve(&store, "3").await);
        assert!(list.find("3").is_some());
        assert!(list.error().unwrap().starts_with("Failed to resolve incident"));
    }

    #[tokio::test]
    async fn in_flight_rows_cannot_be_resolved_twice() {
        let mut list = IncidentListState::new();
        assert!(!list.begin_resolve("1"));

        let store = InMemoryIncidentStore::fixture(Utc::now());
        list.load(&store).await;

        assert!(list.begin_resolve("1"));
        assert!(list.is_resolving("1"));
        assert!(!list.begin_resolve("1"));

        list.finish_resolve("1", Err("HTTP error! status: 500".to_string()));
        assert!(!list.is_resolving("1"));
        assert!(list.find("1").is_some());
    }
}
