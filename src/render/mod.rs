//! Canvas renderer: a pure function from editor state to a scene of draw
//! commands. Called after every state change; never mutates anything.

mod anchors;
mod hit;
mod types;

pub use anchors::{anchor, edge_endpoints, label_position};
pub use types::{
    ClickAction, ColumnRow, DrawCommand, EdgeLabel, EdgeLine, HitTarget, NodeBox, NodeVisual,
    Rect, Scene,
};

use crate::editor::EditorState;
use crate::gesture::GestureState;
use crate::measure::TextMetrics;
use crate::model::{Position, RelationshipType, TableNode};
use crate::settings::CanvasSettings;
use std::collections::HashMap;

const ONE_TO_MANY_STROKE: &str = "#3b82f6";
const OTHER_STROKE: &str = "#10b981";
const CANVAS_MARGIN: f64 = 20.0;

#[derive(Default)]
pub struct CanvasRenderer {
    metrics: TextMetrics,
    canvas: CanvasSettings,
}

impl CanvasRenderer {
    pub fn new(canvas: CanvasSettings) -> Self {
        Self {
            metrics: TextMetrics::default(),
            canvas,
        }
    }

    pub fn render(&self, state: &EditorState) -> Scene {
        let model = &state.layout;

        let rects: HashMap<&str, Rect> = model
            .list_tables()
            .map(|t| (t.table_name.as_str(), self.node_rect(t)))
            .collect();

        let mut commands = Vec::new();

        // Edges first, behind the nodes. Dangling relationships never get here.
        for (rel, from, to) in model.resolved_relationships() {
            let (Some(from_rect), Some(to_rect)) = (
                rects.get(from.table_name.as_str()),
                rects.get(to.table_name.as_str()),
            ) else {
                continue;
            };
            let (start, end) = edge_endpoints(from_rect, to_rect, &self.canvas);

            commands.push(DrawCommand::Edge(EdgeLine {
                relationship_id: rel.id.clone(),
                from: start,
                to: end,
                relationship_type: rel.relationship_type,
                stroke: stroke_for(rel.relationship_type),
            }));

            let text = rel.relationship_type.as_str().to_string();
            let at = label_position(start, end);
            let (w, h) = self.metrics.label_size(&text);
            // Text is drawn on a baseline; the box covers the glyphs above it.
            let bounds = Rect::new(at.x - w / 2.0, at.y - h, w, h + 4.0);
            commands.push(DrawCommand::EdgeLabel(EdgeLabel {
                relationship_id: rel.id.clone(),
                at,
                text,
                bounds,
                action: ClickAction::DeleteRelationship(rel.id.clone()),
            }));
        }

        // The selected node is painted last so it sits on top.
        let mut nodes: Vec<&TableNode> = model.list_tables().collect();
        nodes.sort_by_key(|t| state.selection.is_selected(&t.table_name));
        for table in nodes {
            if let Some(rect) = rects.get(table.table_name.as_str()) {
                commands.push(DrawCommand::Node(self.node_box(table, *rect, state)));
            }
        }

        if let GestureState::Dragging {
            table,
            pointer: Some(pointer),
        } = &state.gesture
        {
            if let Some(rect) = rects.get(table.as_str()) {
                commands.push(DrawCommand::DragGhost {
                    table_name: table.clone(),
                    rect: Rect::new(pointer.x, pointer.y, rect.width, rect.height),
                });
            }
        }

        if state.gesture.is_connecting() {
            let mut lines = vec![
                "Connection Mode Active".to_string(),
                "Click on two tables to create a relationship".to_string(),
            ];
            if let Some(source) = state.gesture.connect_source() {
                lines.push(format!("From: {} -> Click target table", source));
            }
            commands.push(DrawCommand::Banner { lines });
        }

        let width = rects
            .values()
            .map(|r| r.right() + CANVAS_MARGIN)
            .fold(self.canvas.width, f64::max);
        let height = rects
            .values()
            .map(|r| r.bottom() + CANVAS_MARGIN)
            .fold(self.canvas.height, f64::max);

        Scene {
            width,
            height,
            commands,
        }
    }

    fn node_rect(&self, table: &TableNode) -> Rect {
        let position = table
            .position
            .unwrap_or(Position::new(self.canvas.default_x, self.canvas.default_y));
        let (width, height) =
            self.metrics
                .node_size(&table.table_name, table.description.as_deref(), &table.columns);
        Rect::new(position.x, position.y, width, height)
    }

    fn node_box(&self, table: &TableNode, rect: Rect, state: &EditorState) -> NodeBox {
        let visual = if state.gesture.connect_source() == Some(table.table_name.as_str()) {
            NodeVisual::ConnectSource
        } else if state.selection.is_selected(&table.table_name) {
            NodeVisual::Selected
        } else {
            NodeVisual::Normal
        };

        let rows = table
            .columns
            .iter()
            .map(|c| {
                let (name, detail) = TextMetrics::column_row(c);
                ColumnRow {
                    name,
                    detail,
                    primary_key: c.primary_key,
                }
            })
            .collect();

        NodeBox {
            table_name: table.table_name.clone(),
            rect,
            header_height: self.metrics.header_height(table.description.as_deref()),
            visual,
            description: table.description.clone(),
            rows,
        }
    }
}

fn stroke_for(relationship_type: RelationshipType) -> &'static str {
    match relationship_type {
        RelationshipType::OneToMany => ONE_TO_MANY_STROKE,
        _ => OTHER_STROKE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutModel;
    use crate::model::{Column, Relationship};

    fn rel(id: &str, from: &str, to: &str, t: RelationshipType) -> Relationship {
        Relationship {
            id: id.to_string(),
            from_table: from.to_string(),
            from_column: "id".to_string(),
            to_table: to.to_string(),
            to_column: "id".to_string(),
            relationship_type: t,
            description: None,
        }
    }

    fn state() -> EditorState {
        EditorState::new(LayoutModel::from_parts(
            vec![
                TableNode::new("orders")
                    .with_column(Column::new("id", "int").pk())
                    .with_column(Column::new("total", "float"))
                    .at(0.0, 0.0),
                TableNode::new("customers")
                    .with_column(Column::new("id", "int").pk())
                    .with_column(Column::new("name", "string"))
                    .at(400.0, 0.0),
                TableNode::new("unplaced").with_column(Column::new("id", "int")),
            ],
            vec![
                rel("r1", "orders", "customers", RelationshipType::OneToMany),
                rel("r2", "customers", "orders", RelationshipType::OneToOne),
                rel("r3", "orders", "vanished", RelationshipType::OneToMany),
            ],
        ))
    }

    #[test]
    fn test_default_position() {
        let scene = CanvasRenderer::default().render(&state());
        let node = scene.node("unplaced").unwrap();
        assert_eq!((node.rect.x, node.rect.y), (100.0, 100.0));
    }

    #[test]
    fn test_dangling_relationship_not_rendered() {
        let state = state();
        let scene = CanvasRenderer::default().render(&state);
        let ids: Vec<&str> = scene.edges().map(|e| e.relationship_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert_eq!(state.layout.relationship_count(), 3);
    }

    #[test]
    fn test_edge_direction_and_anchors() {
        let scene = CanvasRenderer::default().render(&state());
        let edges: Vec<&EdgeLine> = scene.edges().collect();
        assert_eq!(edges[0].from, Position::new(96.0, 50.0));
        assert_eq!(edges[0].to, Position::new(496.0, 50.0));
        // Reverse relationship runs the other way.
        assert_eq!(edges[1].from, Position::new(496.0, 50.0));
        assert_eq!(edges[1].to, Position::new(96.0, 50.0));
        assert_eq!(edges[0].stroke, ONE_TO_MANY_STROKE);
        assert_eq!(edges[1].stroke, OTHER_STROKE);
    }

    #[test]
    fn test_label_deletes_relationship() {
        let scene = CanvasRenderer::default().render(&state());
        let label = scene.labels().next().unwrap();
        assert_eq!(label.text, "one-to-many");
        assert_eq!(
            label.action,
            ClickAction::DeleteRelationship("r1".to_string())
        );
    }

    #[test]
    fn test_visual_states() {
        let mut state = state();
        state.selection.select("orders");
        let scene = CanvasRenderer::default().render(&state);
        assert_eq!(scene.node("orders").unwrap().visual, NodeVisual::Selected);
        assert_eq!(scene.node("customers").unwrap().visual, NodeVisual::Normal);
        // Selected node is painted last.
        assert_eq!(scene.nodes().last().unwrap().table_name, "orders");

        state.gesture = GestureState::ConnectAwaitingTarget {
            source: "orders".to_string(),
        };
        let scene = CanvasRenderer::default().render(&state);
        assert_eq!(scene.node("orders").unwrap().visual, NodeVisual::ConnectSource);
        assert!(matches!(
            scene.commands.last(),
            Some(DrawCommand::Banner { lines }) if lines.len() == 3
        ));
    }

    #[test]
    fn test_drag_ghost_follows_pointer() {
        let mut state = state();
        state.gesture = GestureState::Dragging {
            table: "orders".to_string(),
            pointer: Some(Position::new(300.0, 300.0)),
        };
        let scene = CanvasRenderer::default().render(&state);
        let ghost = scene.commands.iter().find_map(|c| match c {
            DrawCommand::DragGhost { rect, .. } => Some(*rect),
            _ => None,
        });
        assert_eq!(ghost.map(|r| (r.x, r.y)), Some((300.0, 300.0)));
        // The stored position does not move mid-drag.
        let node = scene.node("orders").unwrap();
        assert_eq!((node.rect.x, node.rect.y), (0.0, 0.0));
    }

    #[test]
    fn test_render_is_deterministic() {
        let state = state();
        let renderer = CanvasRenderer::default();
        assert_eq!(renderer.render(&state), renderer.render(&state));
    }

    #[test]
    fn test_canvas_grows_to_fit() {
        let mut state = state();
        state.layout.set_position("customers", 2000.0, 900.0).unwrap();
        let scene = CanvasRenderer::default().render(&state);
        let node = scene.node("customers").unwrap();
        assert_eq!(scene.width, node.rect.right() + CANVAS_MARGIN);
        assert_eq!(scene.height, node.rect.bottom() + CANVAS_MARGIN);
    }

    #[test]
    fn test_hit_test() {
        let scene = CanvasRenderer::default().render(&state());
        assert_eq!(
            scene.hit_test(Position::new(10.0, 10.0)),
            Some(HitTarget::Table("orders".to_string()))
        );

        let label = scene.labels().next().unwrap();
        let at = Position::new(label.at.x, label.at.y - 2.0);
        // Both labels share the midpoint between the two nodes; the one
        // painted last is on top.
        assert_eq!(
            scene.hit_test(at),
            Some(HitTarget::RelationshipLabel(ClickAction::DeleteRelationship(
                "r2".to_string()
            )))
        );
        assert_eq!(scene.hit_test(Position::new(1000.0, 550.0)), None);
    }
}
