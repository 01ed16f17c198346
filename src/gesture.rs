//! Interaction state machine: idle, dragging one table, or the two-click
//! connect gesture. Only one of these is ever active.

use crate::error::EditorError;
use crate::layout::{LayoutError, LayoutModel};
use crate::model::Position;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        table: String,
        /// Last pointer position, for drag feedback only.
        pointer: Option<Position>,
    },
    ConnectPending,
    ConnectAwaitingTarget {
        source: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    DragStart(String),
    PointerMove(Position),
    Drop(Position),
    /// Drag released somewhere other than the canvas.
    DragEnd,
    ToggleConnect,
    ClickTable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    CommitPosition { table: String, position: Position },
    ProposeRelationship { from: String, to: String },
    Select(String),
    Rejected(EditorError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GestureState,
    pub effect: Option<GestureEffect>,
}

impl Transition {
    fn to(state: GestureState) -> Self {
        Self { state, effect: None }
    }

    fn with(state: GestureState, effect: GestureEffect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::ConnectPending | Self::ConnectAwaitingTarget { .. })
    }

    pub fn dragging(&self) -> Option<&str> {
        match self {
            Self::Dragging { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn connect_source(&self) -> Option<&str> {
        match self {
            Self::ConnectAwaitingTarget { source } => Some(source),
            _ => None,
        }
    }

    /// Single transition entry point. Events that mean nothing in the
    /// current state leave it unchanged.
    pub fn apply(self, event: GestureEvent, model: &LayoutModel) -> Transition {
        let transition = match (self, event) {
            (Self::Idle, GestureEvent::DragStart(table)) => {
                if model.contains_table(&table) {
                    Transition::to(Self::Dragging {
                        table,
                        pointer: None,
                    })
                } else {
                    Transition::with(Self::Idle, unknown_table(table))
                }
            }
            (Self::Dragging { table, .. }, GestureEvent::PointerMove(p)) => {
                Transition::to(Self::Dragging {
                    table,
                    pointer: Some(p),
                })
            }
            (Self::Dragging { table, .. }, GestureEvent::Drop(position)) => Transition::with(
                Self::Idle,
                GestureEffect::CommitPosition { table, position },
            ),
            (Self::Dragging { .. }, GestureEvent::DragEnd) => Transition::to(Self::Idle),
            (Self::Idle, GestureEvent::ToggleConnect) => Transition::to(Self::ConnectPending),
            (
                Self::ConnectPending | Self::ConnectAwaitingTarget { .. },
                GestureEvent::ToggleConnect,
            ) => Transition::to(Self::Idle),
            (Self::Idle, GestureEvent::ClickTable(table)) => {
                if model.contains_table(&table) {
                    Transition::with(Self::Idle, GestureEffect::Select(table))
                } else {
                    Transition::with(Self::Idle, unknown_table(table))
                }
            }
            (Self::ConnectPending, GestureEvent::ClickTable(table)) => match model.table(&table) {
                None => Transition::with(Self::ConnectPending, unknown_table(table)),
                Some(node) if node.columns.is_empty() => {
                    Transition::with(Self::ConnectPending, no_columns(&table))
                }
                Some(_) => Transition::to(Self::ConnectAwaitingTarget { source: table }),
            },
            (Self::ConnectAwaitingTarget { source }, GestureEvent::ClickTable(target)) => {
                if target == source {
                    Transition::to(Self::ConnectAwaitingTarget { source })
                } else {
                    match model.table(&target) {
                        None => Transition::with(
                            Self::ConnectAwaitingTarget { source },
                            unknown_table(target),
                        ),
                        Some(node) if node.columns.is_empty() => {
                            Transition::with(Self::Idle, no_columns(&target))
                        }
                        Some(_) => Transition::with(
                            Self::Idle,
                            GestureEffect::ProposeRelationship {
                                from: source,
                                to: target,
                            },
                        ),
                    }
                }
            }
            (state, _) => Transition::to(state),
        };
        debug!(state = ?transition.state, effect = ?transition.effect, "gesture transition");
        transition
    }
}

fn unknown_table(table: String) -> GestureEffect {
    GestureEffect::Rejected(LayoutError::UnknownTable(table).into())
}

fn no_columns(table: &str) -> GestureEffect {
    GestureEffect::Rejected(EditorError::InvalidRelationshipTarget(format!(
        "table {table} has no columns"
    )))
}
