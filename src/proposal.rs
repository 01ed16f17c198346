//! Default relationship proposal for the connect gesture.

use crate::error::EditorError;
use crate::model::{NewRelationship, RelationshipType, TableNode};

/// A relationship about to be created. Starts from defaults picked from the
/// two tables; any field may be overridden before it is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipProposal {
    pub from_table: String,
    pub from_column: Option<String>,
    pub to_table: String,
    pub to_column: Option<String>,
    pub relationship_type: RelationshipType,
    pub description: String,
}

impl RelationshipProposal {
    pub fn between(from: &TableNode, to: &TableNode) -> Self {
        Self {
            from_table: from.table_name.clone(),
            from_column: from.key_column().map(|c| c.name.clone()),
            to_table: to.table_name.clone(),
            to_column: to.key_column().map(|c| c.name.clone()),
            relationship_type: RelationshipType::default(),
            description: format!(
                "Relationship between {} and {}",
                from.table_name, to.table_name
            ),
        }
    }

    pub fn with_columns(mut self, from_column: Option<String>, to_column: Option<String>) -> Self {
        if from_column.is_some() {
            self.from_column = from_column;
        }
        if to_column.is_some() {
            self.to_column = to_column;
        }
        self
    }

    pub fn with_type(mut self, relationship_type: RelationshipType) -> Self {
        self.relationship_type = relationship_type;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check the proposal against the tables it names and produce the
    /// create payload.
    pub fn validate(
        self,
        from: &TableNode,
        to: &TableNode,
    ) -> Result<NewRelationship, EditorError> {
        if from.table_name == to.table_name {
            return Err(EditorError::InvalidRelationshipTarget(format!(
                "cannot relate {} to itself",
                from.table_name
            )));
        }
        let from_column = resolve_column(from, self.from_column)?;
        let to_column = resolve_column(to, self.to_column)?;
        Ok(NewRelationship {
            from_table: self.from_table,
            from_column,
            to_table: self.to_table,
            to_column,
            relationship_type: self.relationship_type,
            description: Some(self.description),
        })
    }
}

fn resolve_column(table: &TableNode, column: Option<String>) -> Result<String, EditorError> {
    if table.columns.is_empty() {
        return Err(EditorError::InvalidRelationshipTarget(format!(
            "table {} has no columns",
            table.table_name
        )));
    }
    match column {
        Some(name) if table.column(&name).is_some() => Ok(name),
        Some(name) => Err(EditorError::InvalidRelationshipTarget(format!(
            "table {} has no column {}",
            table.table_name, name
        ))),
        None => Err(EditorError::InvalidRelationshipTarget(format!(
            "no column chosen for {}",
            table.table_name
        ))),
    }
}
