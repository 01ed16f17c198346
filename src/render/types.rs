//! Draw commands produced by the canvas renderer.

use crate::model::{Position, RelationshipType};

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, p: Position) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVisual {
    Normal,
    Selected,
    /// Source table of a pending connect gesture.
    ConnectSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRow {
    pub name: String,
    /// Type text with PK / NOT NULL markers appended.
    pub detail: String,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub table_name: String,
    pub rect: Rect,
    pub header_height: f64,
    pub visual: NodeVisual,
    pub description: Option<String>,
    pub rows: Vec<ColumnRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLine {
    pub relationship_id: String,
    pub from: Position,
    pub to: Position,
    pub relationship_type: RelationshipType,
    pub stroke: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    DeleteRelationship(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub relationship_id: String,
    pub at: Position,
    pub text: String,
    /// Clickable area around the label text.
    pub bounds: Rect,
    pub action: ClickAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Edge(EdgeLine),
    EdgeLabel(EdgeLabel),
    Node(NodeBox),
    /// Outline following the pointer while a table is dragged.
    DragGhost { table_name: String, rect: Rect },
    /// Connect-mode hint overlay.
    Banner { lines: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    Table(String),
    RelationshipLabel(ClickAction),
}

/// Everything needed to paint one frame, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn nodes(&self) -> impl Iterator<Item = &NodeBox> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Node(n) => Some(n),
            _ => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeLine> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Edge(e) => Some(e),
            _ => None,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &EdgeLabel> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::EdgeLabel(l) => Some(l),
            _ => None,
        })
    }

    pub fn node(&self, table_name: &str) -> Option<&NodeBox> {
        self.nodes().find(|n| n.table_name == table_name)
    }
}
