//! Pointer hit testing against a rendered scene.

use crate::model::Position;

use super::types::{DrawCommand, HitTarget, Scene};

impl Scene {
    /// What a click at `p` lands on. Table nodes sit above edges, so the
    /// topmost node wins before any edge label is considered.
    pub fn hit_test(&self, p: Position) -> Option<HitTarget> {
        let node = self.commands.iter().rev().find_map(|c| match c {
            DrawCommand::Node(n) if n.rect.contains(p) => {
                Some(HitTarget::Table(n.table_name.clone()))
            }
            _ => None,
        });
        if node.is_some() {
            return node;
        }

        self.commands.iter().rev().find_map(|c| match c {
            DrawCommand::EdgeLabel(l) if l.bounds.contains(p) => {
                Some(HitTarget::RelationshipLabel(l.action.clone()))
            }
            _ => None,
        })
    }
}
