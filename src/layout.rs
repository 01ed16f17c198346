//! Canonical in-memory layout: table nodes keyed by name and relationships
//! keyed by id, both kept in insertion order.

use crate::model::{Position, Relationship, TableNode};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown table: {0}")]
    UnknownTable(String),
}

#[derive(Debug, Clone, Default)]
pub struct LayoutModel {
    tables: IndexMap<String, TableNode>,
    relationships: IndexMap<String, Relationship>,
}

impl LayoutModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(tables: Vec<TableNode>, relationships: Vec<Relationship>) -> Self {
        let mut model = Self::new();
        model.replace_all(tables, relationships);
        model
    }

    /// Insert a table or replace the one with the same name, keeping its slot.
    pub fn upsert_table(&mut self, node: TableNode) {
        self.tables.insert(node.table_name.clone(), node);
    }

    pub fn set_position(&mut self, table_name: &str, x: f64, y: f64) -> Result<(), LayoutError> {
        let node = self
            .tables
            .get_mut(table_name)
            .ok_or_else(|| LayoutError::UnknownTable(table_name.to_string()))?;
        node.position = Some(Position::new(x, y));
        Ok(())
    }

    pub fn list_tables(&self) -> impl Iterator<Item = &TableNode> {
        self.tables.values()
    }

    pub fn table(&self, table_name: &str) -> Option<&TableNode> {
        self.tables.get(table_name)
    }

    pub fn contains_table(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    /// Only reloads and tests drop tables; the editor never deletes one itself.
    pub fn remove_table(&mut self, table_name: &str) -> Option<TableNode> {
        self.tables.shift_remove(table_name)
    }

    pub fn add_relationship(&mut self, rel: Relationship) {
        self.relationships.insert(rel.id.clone(), rel);
    }

    pub fn remove_relationship(&mut self, id: &str) -> Option<Relationship> {
        self.relationships.shift_remove(id)
    }

    /// Swap `old_id` for `rel` in the same insertion slot. Appends when
    /// `old_id` is no longer present.
    pub fn replace_relationship(&mut self, old_id: &str, rel: Relationship) {
        match self.relationships.get_index_of(old_id) {
            Some(index) => {
                self.relationships.shift_remove_index(index);
                if self.relationships.contains_key(&rel.id) {
                    self.add_relationship(rel);
                    return;
                }
                let (new_index, _) = self.relationships.insert_full(rel.id.clone(), rel);
                self.relationships.move_index(new_index, index);
            }
            None => self.add_relationship(rel),
        }
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn relationships_touching<'a>(
        &'a self,
        table_name: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.values().filter(move |r| r.touches(table_name))
    }

    /// Relationships whose both endpoints resolve to a table. The rest are
    /// dangling and stay stored, just never drawn.
    pub fn resolved_relationships(
        &self,
    ) -> impl Iterator<Item = (&Relationship, &TableNode, &TableNode)> {
        self.relationships.values().filter_map(|r| {
            let from = self.tables.get(&r.from_table)?;
            let to = self.tables.get(&r.to_table)?;
            Some((r, from, to))
        })
    }

    pub fn replace_all(&mut self, tables: Vec<TableNode>, relationships: Vec<Relationship>) {
        self.tables = tables
            .into_iter()
            .map(|t| (t.table_name.clone(), t))
            .collect();
        self.relationships = relationships
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
    }

    pub fn clear(&mut self) {
        self.tables.clear();
        self.relationships.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, RelationshipType};

    fn rel(id: &str, from: &str, to: &str) -> Relationship {
        Relationship {
            id: id.to_string(),
            from_table: from.to_string(),
            from_column: "id".to_string(),
            to_table: to.to_string(),
            to_column: "id".to_string(),
            relationship_type: RelationshipType::OneToMany,
            description: None,
        }
    }

    fn sample() -> LayoutModel {
        LayoutModel::from_parts(
            vec![
                TableNode::new("orders")
                    .with_column(Column::new("id", "int").pk())
                    .at(0.0, 0.0),
                TableNode::new("customers")
                    .with_column(Column::new("id", "int").pk())
                    .at(200.0, 0.0),
                TableNode::new("items").with_column(Column::new("id", "int").pk()),
            ],
            vec![
                rel("r1", "orders", "customers"),
                rel("r2", "items", "orders"),
                rel("r3", "items", "customers"),
            ],
        )
    }

    #[test]
    fn test_set_position() {
        let mut model = sample();
        model.set_position("orders", 50.0, 75.0).unwrap();
        assert_eq!(
            model.table("orders").unwrap().position,
            Some(Position::new(50.0, 75.0))
        );
    }

    #[test]
    fn test_set_position_unknown_table() {
        let mut model = sample();
        assert_eq!(
            model.set_position("ghost", 1.0, 1.0),
            Err(LayoutError::UnknownTable("ghost".to_string()))
        );
    }

    #[test]
    fn test_upsert_keeps_slot() {
        let mut model = sample();
        model.upsert_table(TableNode::new("orders").with_description("replaced"));
        let names: Vec<&str> = model.list_tables().map(|t| t.table_name.as_str()).collect();
        assert_eq!(names, vec!["orders", "customers", "items"]);
        assert_eq!(
            model.table("orders").unwrap().description.as_deref(),
            Some("replaced")
        );
    }

    #[test]
    fn test_relationships_touching_in_insertion_order() {
        let model = sample();
        let ids: Vec<&str> = model
            .relationships_touching("customers")
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["r1", "r3"]);
    }

    #[test]
    fn test_dangling_relationship_kept_but_unresolved() {
        let mut model = sample();
        model.remove_table("customers");
        assert_eq!(model.relationship_count(), 3);
        let resolved: Vec<&str> = model
            .resolved_relationships()
            .map(|(r, _, _)| r.id.as_str())
            .collect();
        assert_eq!(resolved, vec!["r2"]);
    }

    #[test]
    fn test_replace_relationship_keeps_slot() {
        let mut model = sample();
        model.replace_relationship("r2", rel("r9", "items", "orders"));
        let ids: Vec<&str> = model.relationships().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r9", "r3"]);

        model.replace_relationship("gone", rel("r10", "orders", "items"));
        assert_eq!(model.relationships().last().unwrap().id, "r10");
    }

    #[test]
    fn test_remove_relationship() {
        let mut model = sample();
        assert!(model.remove_relationship("r1").is_some());
        assert!(model.remove_relationship("r1").is_none());
        assert_eq!(model.relationship_count(), 2);
    }
}
