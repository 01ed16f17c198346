//! Persistence: the gateway seam, its implementations, and the adapter that
//! turns local mutations into gateway writes and merges the results back.

mod http;
mod memory;

pub use http::HttpGateway;
pub use memory::MemoryGateway;

use crate::editor::Notification;
use crate::error::{EditorError, GatewayError, WriteOp};
use crate::layout::LayoutModel;
use crate::model::{NewRelationship, Position, Relationship, TableNode};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The external service of record for tables and relationships.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn fetch_tables(&self) -> Result<Vec<TableNode>, GatewayError>;

    async fn fetch_relationships(&self) -> Result<Vec<Relationship>, GatewayError>;

    /// Store the table's current position, keyed by `table_name`.
    async fn update_table(&self, table: &TableNode) -> Result<(), GatewayError>;

    async fn create_relationship(
        &self,
        payload: &NewRelationship,
    ) -> Result<Relationship, GatewayError>;

    async fn delete_relationship(&self, id: &str) -> Result<(), GatewayError>;
}

/// Result of a gateway call, delivered back to the editor's event queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Loaded(Result<(Vec<TableNode>, Vec<Relationship>), GatewayError>),
    PositionSaved {
        table: String,
        position: Position,
        result: Result<(), GatewayError>,
    },
    RelationshipCreated {
        provisional_id: String,
        result: Result<Relationship, GatewayError>,
    },
    RelationshipDeleted {
        id: String,
        result: Result<(), GatewayError>,
    },
}

pub struct PersistenceAdapter {
    gateway: Arc<dyn PersistenceGateway>,
    completions: mpsc::UnboundedSender<Completion>,
    /// Provisional ids whose create is still in flight.
    pending_creates: HashSet<String>,
    /// Provisional ids deleted locally before their create came back.
    discarded: HashSet<String>,
    /// Provisional ids whose create failed. They exist only locally.
    unconfirmed: HashSet<String>,
    in_flight: usize,
}

impl PersistenceAdapter {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        completions: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            gateway,
            completions,
            pending_creates: HashSet::new(),
            discarded: HashSet::new(),
            unconfirmed: HashSet::new(),
            in_flight: 0,
        }
    }

    /// Number of gateway calls whose completion has not been reconciled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn load_all(&mut self) {
        let gateway = self.gateway.clone();
        self.spawn(async move {
            let (tables, relationships) =
                tokio::join!(gateway.fetch_tables(), gateway.fetch_relationships());
            Completion::Loaded(tables.and_then(|t| relationships.map(|r| (t, r))))
        });
    }

    pub fn save_table_position(&mut self, table: &TableNode) {
        let gateway = self.gateway.clone();
        let table = table.clone();
        self.spawn(async move {
            let result = gateway.update_table(&table).await;
            Completion::PositionSaved {
                position: table.position.unwrap_or_default(),
                table: table.table_name,
                result,
            }
        });
    }

    pub fn create_relationship(&mut self, provisional_id: String, payload: NewRelationship) {
        self.pending_creates.insert(provisional_id.clone());
        let gateway = self.gateway.clone();
        self.spawn(async move {
            let result = gateway.create_relationship(&payload).await;
            Completion::RelationshipCreated {
                provisional_id,
                result,
            }
        });
    }

    pub fn delete_relationship(&mut self, id: &str) {
        if self.pending_creates.contains(id) {
            // Not on the gateway yet; the confirmed record is deleted once
            // its create completes.
            debug!(id = %id, "deferring delete until create completes");
            self.discarded.insert(id.to_string());
            return;
        }
        if self.unconfirmed.remove(id) {
            debug!(id = %id, "dropping relationship the gateway never stored");
            return;
        }
        let gateway = self.gateway.clone();
        let id = id.to_string();
        self.spawn(async move {
            let result = gateway.delete_relationship(&id).await;
            Completion::RelationshipDeleted { id, result }
        });
    }

    /// Merge a completion into the model. Local optimistic state is never
    /// rolled back; failures are only reported.
    pub fn reconcile(
        &mut self,
        completion: Completion,
        model: &mut LayoutModel,
    ) -> Vec<Notification> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let mut out = Vec::new();

        match completion {
            Completion::Loaded(Ok((tables, relationships))) => {
                info!(
                    tables = tables.len(),
                    relationships = relationships.len(),
                    "diagram loaded"
                );
                model.replace_all(tables, relationships);
                self.unconfirmed.clear();
                out.push(Notification::TablesChanged);
                out.push(Notification::RelationshipsChanged);
            }
            Completion::Loaded(Err(err)) => {
                model.clear();
                self.unconfirmed.clear();
                out.push(report(EditorError::LoadFailure(err)));
                out.push(Notification::TablesChanged);
                out.push(Notification::RelationshipsChanged);
            }
            Completion::PositionSaved {
                table,
                position,
                result,
            } => match result {
                Ok(()) => info!(table = %table, x = position.x, y = position.y, "position saved"),
                Err(err) => out.push(report(EditorError::write(WriteOp::SavePosition, err))),
            },
            Completion::RelationshipCreated {
                provisional_id,
                result,
            } => {
                self.pending_creates.remove(&provisional_id);
                let discarded = self.discarded.remove(&provisional_id);
                match result {
                    Ok(rel) if discarded => {
                        debug!(id = %rel.id, "deleting relationship discarded before confirmation");
                        self.delete_relationship(&rel.id);
                    }
                    Ok(rel) => {
                        info!(id = %rel.id, provisional = %provisional_id, "relationship created");
                        model.replace_relationship(&provisional_id, rel);
                        out.push(Notification::RelationshipsChanged);
                    }
                    Err(_) if discarded => {}
                    Err(err) => {
                        self.unconfirmed.insert(provisional_id);
                        out.push(report(EditorError::write(WriteOp::CreateRelationship, err)));
                    }
                }
            }
            Completion::RelationshipDeleted { id, result } => match result {
                Ok(()) => info!(id = %id, "relationship deleted"),
                Err(err) => out.push(report(EditorError::write(WriteOp::DeleteRelationship, err))),
            },
        }

        out
    }

    fn spawn<F>(&mut self, call: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let completions = self.completions.clone();
        tokio::spawn(async move {
            // The editor may be gone by the time the call resolves.
            let _ = completions.send(call.await);
        });
    }
}

fn report(err: EditorError) -> Notification {
    warn!(error = %err, "editor failure");
    Notification::Failure(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, RelationshipType, Snapshot};

    fn snapshot() -> Snapshot {
        Snapshot {
            tables: vec![
                TableNode::new("orders")
                    .with_column(Column::new("id", "int").pk())
                    .at(0.0, 0.0),
                TableNode::new("customers")
                    .with_column(Column::new("id", "int").pk())
                    .at(200.0, 0.0),
            ],
            ..Snapshot::default()
        }
    }

    fn payload() -> NewRelationship {
        NewRelationship {
            from_table: "orders".to_string(),
            from_column: "id".to_string(),
            to_table: "customers".to_string(),
            to_column: "id".to_string(),
            relationship_type: RelationshipType::OneToMany,
            description: None,
        }
    }

    fn setup() -> (
        Arc<MemoryGateway>,
        PersistenceAdapter,
        mpsc::UnboundedReceiver<Completion>,
    ) {
        let gateway = Arc::new(MemoryGateway::new(snapshot()));
        let (tx, rx) = mpsc::unbounded_channel();
        let adapter = PersistenceAdapter::new(gateway.clone(), tx);
        (gateway, adapter, rx)
    }

    #[tokio::test]
    async fn test_load_all() {
        let (_gateway, mut adapter, mut rx) = setup();
        let mut model = LayoutModel::new();

        adapter.load_all();
        assert_eq!(adapter.in_flight(), 1);
        let completion = rx.recv().await.unwrap();
        let notes = adapter.reconcile(completion, &mut model);

        assert_eq!(adapter.in_flight(), 0);
        assert_eq!(model.table_count(), 2);
        assert!(notes.contains(&Notification::TablesChanged));
    }

    #[tokio::test]
    async fn test_load_failure_empties_model() {
        let (gateway, mut adapter, mut rx) = setup();
        gateway.set_fail_reads(true);
        let mut model = LayoutModel::from_parts(snapshot().tables, vec![]);

        adapter.load_all();
        let notes = adapter.reconcile(rx.recv().await.unwrap(), &mut model);

        assert_eq!(model.table_count(), 0);
        assert!(matches!(
            notes.first(),
            Some(Notification::Failure(EditorError::LoadFailure(_)))
        ));
    }

    #[tokio::test]
    async fn test_create_replaces_provisional() {
        let (gateway, mut adapter, mut rx) = setup();
        let mut model = LayoutModel::from_parts(snapshot().tables, vec![]);
        model.add_relationship(payload().with_id("local-1"));

        adapter.create_relationship("local-1".to_string(), payload());
        adapter.reconcile(rx.recv().await.unwrap(), &mut model);

        let stored = gateway.snapshot().relationships;
        assert_eq!(stored.len(), 1);
        assert!(model.relationship("local-1").is_none());
        assert!(model.relationship(&stored[0].id).is_some());
    }

    #[tokio::test]
    async fn test_delete_before_confirmation() {
        let (gateway, mut adapter, mut rx) = setup();
        let mut model = LayoutModel::from_parts(snapshot().tables, vec![]);
        model.add_relationship(payload().with_id("local-1"));

        adapter.create_relationship("local-1".to_string(), payload());
        model.remove_relationship("local-1");
        adapter.delete_relationship("local-1");
        // Only the create is in flight; the delete waits for its id.
        assert_eq!(adapter.in_flight(), 1);

        adapter.reconcile(rx.recv().await.unwrap(), &mut model);
        assert_eq!(adapter.in_flight(), 1);
        adapter.reconcile(rx.recv().await.unwrap(), &mut model);

        assert_eq!(adapter.in_flight(), 0);
        assert_eq!(model.relationship_count(), 0);
        assert!(gateway.snapshot().relationships.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_is_reported_not_rolled_back() {
        let (gateway, mut adapter, mut rx) = setup();
        gateway.set_fail_writes(true);
        let mut model = LayoutModel::from_parts(snapshot().tables, vec![]);
        model.set_position("orders", 50.0, 75.0).unwrap();

        adapter.save_table_position(model.table("orders").unwrap());
        let notes = adapter.reconcile(rx.recv().await.unwrap(), &mut model);

        assert_eq!(
            model.table("orders").unwrap().position,
            Some(Position::new(50.0, 75.0))
        );
        assert!(matches!(
            notes.as_slice(),
            [Notification::Failure(EditorError::WriteFailure {
                op: WriteOp::SavePosition,
                ..
            })]
        ));
    }
}
