//! In-process gateway backed by a [`Snapshot`]. Used for offline editing of
//! snapshot files and in tests.

use super::PersistenceGateway;
use crate::error::GatewayError;
use crate::model::{NewRelationship, Relationship, Snapshot, TableNode};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Default)]
struct MemoryState {
    snapshot: Snapshot,
    fail_reads: bool,
    fail_writes: bool,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                snapshot,
                ..MemoryState::default()
            }),
        }
    }

    /// Make every fetch fail as if the service were down.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Make every write fail as if the service were down.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Current stored document.
    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot.clone()
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> Result<T, GatewayError> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(GatewayError::Unavailable("memory gateway offline".to_string()));
        }
        Ok(f(&state.snapshot))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut MemoryState) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(GatewayError::Unavailable("memory gateway offline".to_string()));
        }
        f(&mut state)
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn fetch_tables(&self) -> Result<Vec<TableNode>, GatewayError> {
        self.read(|s| s.tables.clone())
    }

    async fn fetch_relationships(&self) -> Result<Vec<Relationship>, GatewayError> {
        self.read(|s| s.relationships.clone())
    }

    async fn update_table(&self, table: &TableNode) -> Result<(), GatewayError> {
        self.write(|state| {
            let stored = state
                .snapshot
                .tables
                .iter_mut()
                .find(|t| t.table_name == table.table_name)
                .ok_or_else(|| GatewayError::NotFound(table.table_name.clone()))?;
            *stored = table.clone();
            Ok(())
        })
    }

    async fn create_relationship(
        &self,
        payload: &NewRelationship,
    ) -> Result<Relationship, GatewayError> {
        self.write(|state| {
            state.next_id += 1;
            let rel = payload.clone().with_id(format!("rel-{}", state.next_id));
            state.snapshot.relationships.push(rel.clone());
            Ok(rel)
        })
    }

    async fn delete_relationship(&self, id: &str) -> Result<(), GatewayError> {
        self.write(|state| {
            let rels = &mut state.snapshot.relationships;
            let index = rels
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
            rels.remove(index);
            Ok(())
        })
    }
}
