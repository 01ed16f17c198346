//! The editor: owned UI state plus the single event queue that drives it.
//!
//! Every transition and model mutation happens in [`Editor::handle`]. Gateway
//! calls run as spawned tasks and come back as [`Completion`] events on the
//! same queue, so nothing here needs a lock.

use crate::error::EditorError;
use crate::gesture::{GestureEffect, GestureEvent, GestureState};
use crate::inspector::{Inspector, Selection, TableDetails};
use crate::layout::{LayoutError, LayoutModel};
use crate::persistence::{Completion, PersistenceAdapter, PersistenceGateway};
use crate::proposal::RelationshipProposal;
use crate::render::{CanvasRenderer, Scene};
use crate::settings::CanvasSettings;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub layout: LayoutModel,
    pub gesture: GestureState,
    pub selection: Selection,
}

impl EditorState {
    pub fn new(layout: LayoutModel) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }
}

/// Outbound events for the surrounding application.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SelectionChanged(Option<String>),
    RelationshipsChanged,
    TablesChanged,
    Failure(EditorError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorInput {
    Gesture(GestureEvent),
    /// Click on an edge label; deletes that relationship.
    ClickRelationshipLabel(String),
    SelectTable(String),
    ClearSelection,
    Reload,
}

impl From<GestureEvent> for EditorInput {
    fn from(event: GestureEvent) -> Self {
        Self::Gesture(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Input(EditorInput),
    Completion(Completion),
}

pub struct Editor {
    state: EditorState,
    adapter: PersistenceAdapter,
    completions: mpsc::UnboundedReceiver<Completion>,
    renderer: CanvasRenderer,
    notifications: Vec<Notification>,
}

impl Editor {
    /// Must be called from within a tokio runtime; gateway calls are spawned.
    pub fn new(gateway: Arc<dyn PersistenceGateway>, canvas: CanvasSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: EditorState::default(),
            adapter: PersistenceAdapter::new(gateway, tx),
            completions: rx,
            renderer: CanvasRenderer::new(canvas),
            notifications: Vec::new(),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Fetch tables and relationships and wait for them to land.
    pub async fn load(&mut self) {
        self.adapter.load_all();
        self.settle().await;
    }

    pub fn dispatch(&mut self, input: impl Into<EditorInput>) {
        self.handle(EditorEvent::Input(input.into()));
    }

    pub fn handle(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::Input(input) => self.on_input(input),
            EditorEvent::Completion(completion) => {
                let notes = self.adapter.reconcile(completion, &mut self.state.layout);
                self.notifications.extend(notes);
            }
        }
    }

    /// Process completions until no gateway call is in flight.
    pub async fn settle(&mut self) {
        while self.adapter.in_flight() > 0 {
            match self.completions.recv().await {
                Some(completion) => self.handle(EditorEvent::Completion(completion)),
                None => break,
            }
        }
    }

    /// Service inputs and completions from one loop until `inputs` closes,
    /// then let outstanding writes finish.
    pub async fn run(&mut self, mut inputs: mpsc::UnboundedReceiver<EditorInput>) {
        loop {
            let event = tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => EditorEvent::Input(input),
                    None => break,
                },
                Some(completion) = self.completions.recv() => EditorEvent::Completion(completion),
            };
            self.handle(event);
        }
        self.settle().await;
    }

    pub fn render(&self) -> Scene {
        self.renderer.render(&self.state)
    }

    pub fn details(&self) -> Option<TableDetails> {
        Inspector::details(&self.state.layout, &self.state.selection)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Commit a relationship proposal: insert it locally under a provisional
    /// id and send it to the gateway. Returns the provisional id.
    pub fn create_relationship(
        &mut self,
        proposal: RelationshipProposal,
    ) -> Result<String, EditorError> {
        let layout = &self.state.layout;
        let from = layout
            .table(&proposal.from_table)
            .ok_or_else(|| LayoutError::UnknownTable(proposal.from_table.clone()))?;
        let to = layout
            .table(&proposal.to_table)
            .ok_or_else(|| LayoutError::UnknownTable(proposal.to_table.clone()))?;
        let payload = proposal.validate(from, to)?;

        let id = format!("local-{}", Uuid::new_v4());
        debug!(
            id = %id,
            from = %payload.from_table,
            to = %payload.to_table,
            "provisional relationship"
        );
        self.state.layout.add_relationship(payload.clone().with_id(id.clone()));
        self.adapter.create_relationship(id.clone(), payload);
        self.notifications.push(Notification::RelationshipsChanged);
        Ok(id)
    }

    fn on_input(&mut self, input: EditorInput) {
        match input {
            EditorInput::Gesture(event) => {
                let state = std::mem::take(&mut self.state.gesture);
                let transition = state.apply(event, &self.state.layout);
                self.state.gesture = transition.state;
                if let Some(effect) = transition.effect {
                    self.on_effect(effect);
                }
            }
            EditorInput::ClickRelationshipLabel(id) => {
                if self.state.layout.remove_relationship(&id).is_some() {
                    self.adapter.delete_relationship(&id);
                    self.notifications.push(Notification::RelationshipsChanged);
                } else {
                    debug!(id = %id, "label click on unknown relationship");
                }
            }
            EditorInput::SelectTable(table) => {
                if self.state.layout.contains_table(&table) {
                    self.select(table);
                } else {
                    self.fail(LayoutError::UnknownTable(table).into());
                }
            }
            EditorInput::ClearSelection => {
                if self.state.selection.clear() {
                    self.notifications.push(Notification::SelectionChanged(None));
                }
            }
            EditorInput::Reload => self.adapter.load_all(),
        }
    }

    fn on_effect(&mut self, effect: GestureEffect) {
        match effect {
            GestureEffect::CommitPosition { table, position } => {
                if let Err(err) = self.state.layout.set_position(&table, position.x, position.y) {
                    self.fail(err.into());
                    return;
                }
                if let Some(node) = self.state.layout.table(&table) {
                    self.adapter.save_table_position(node);
                }
                self.notifications.push(Notification::TablesChanged);
            }
            GestureEffect::ProposeRelationship { from, to } => {
                let layout = &self.state.layout;
                let proposal = match (layout.table(&from), layout.table(&to)) {
                    (Some(from), Some(to)) => Ok(RelationshipProposal::between(from, to)),
                    (None, _) => Err(LayoutError::UnknownTable(from.clone())),
                    (_, None) => Err(LayoutError::UnknownTable(to.clone())),
                };
                let created = proposal
                    .map_err(EditorError::from)
                    .and_then(|proposal| self.create_relationship(proposal));
                if let Err(err) = created {
                    self.fail(err);
                }
            }
            GestureEffect::Select(table) => self.select(table),
            GestureEffect::Rejected(err) => self.fail(err),
        }
    }

    fn select(&mut self, table: String) {
        if self.state.selection.select(table.clone()) {
            self.notifications.push(Notification::SelectionChanged(Some(table)));
        }
    }

    fn fail(&mut self, err: EditorError) {
        warn!(error = %err, "editor failure");
        self.notifications.push(Notification::Failure(err));
    }
}
