use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::WorkflowState;

use super::{StateStoreError, StateStoreResult, WorkflowStateStore};

/// DashMap-backed store for tests and single-process deployments.
///
/// Version checks happen under the entry lock, so the CAS contract holds
/// even with concurrent invocations on the same ticket.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    records: DashMap<String, WorkflowState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of workflows currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl WorkflowStateStore for InMemoryStateStore {
    async fn load(&self, ticket_key: &str) -> StateStoreResult<Option<WorkflowState>> {
        Ok(self.records.get(ticket_key).map(|entry| entry.clone()))
    }

    async fn insert_new(&self, state: &WorkflowState) -> StateStoreResult<()> {
        match self.records.entry(state.ticket_key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StateStoreError::already_exists(&state.ticket_key))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(state.clone());
                Ok(())
            }
        }
    }

    async fn compare_and_update(&self, state: &WorkflowState) -> StateStoreResult<WorkflowState> {
        let mut entry = self
            .records
            .get_mut(&state.ticket_key)
            .ok_or_else(|| StateStoreError::not_found(&state.ticket_key))?;

        if entry.version != state.version {
            return Err(StateStoreError::version_conflict(
                &state.ticket_key,
                state.version,
            ));
        }

        let mut updated = state.clone();
        updated.version += 1;
        *entry = updated.clone();
        Ok(updated)
    }
}
