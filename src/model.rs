use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            primary_key: false,
            nullable: false,
        }
    }

    pub fn pk(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Absent until the table has been placed; renders at the canvas default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl TableNode {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            description: None,
            columns: Vec::new(),
            position: None,
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// First primary-key column, else the first declared column.
    pub fn key_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .or_else(|| self.columns.first())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    #[default]
    OneToMany,
    OneToOne,
    ManyToMany,
    ManyToOne,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToMany => "one-to-many",
            Self::OneToOne => "one-to-one",
            Self::ManyToMany => "many-to-many",
            Self::ManyToOne => "many-to-one",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "one-to-many" => Some(Self::OneToMany),
            "one-to-one" => Some(Self::OneToOne),
            "many-to-many" => Some(Self::ManyToMany),
            "many-to-one" => Some(Self::ManyToOne),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    #[serde(default)]
    pub relationship_type: RelationshipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Relationship {
    pub fn touches(&self, table_name: &str) -> bool {
        self.from_table == table_name || self.to_table == table_name
    }

    /// The create payload this relationship was made from.
    pub fn payload(&self) -> NewRelationship {
        NewRelationship {
            from_table: self.from_table.clone(),
            from_column: self.from_column.clone(),
            to_table: self.to_table.clone(),
            to_column: self.to_column.clone(),
            relationship_type: self.relationship_type,
            description: self.description.clone(),
        }
    }
}

/// A relationship as sent to the gateway, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRelationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub relationship_type: RelationshipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRelationship {
    pub fn with_id(self, id: impl Into<String>) -> Relationship {
        Relationship {
            id: id.into(),
            from_table: self.from_table,
            from_column: self.from_column,
            to_table: self.to_table,
            to_column: self.to_column,
            relationship_type: self.relationship_type,
            description: self.description,
        }
    }
}

/// Offline diagram document: a named set of tables and relationships.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tables: Vec<TableNode>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_column_prefers_pk() {
        let table = TableNode::new("orders")
            .with_column(Column::new("total", "float"))
            .with_column(Column::new("id", "int").pk());
        assert_eq!(table.key_column().unwrap().name, "id");
    }

    #[test]
    fn test_key_column_falls_back_to_first() {
        let table = TableNode::new("log")
            .with_column(Column::new("at", "string"))
            .with_column(Column::new("msg", "string"));
        assert_eq!(table.key_column().unwrap().name, "at");
        assert!(TableNode::new("empty").key_column().is_none());
    }

    #[test]
    fn test_gateway_table_json() {
        let json = r#"{
            "table_name": "operators",
            "columns": [
                {"name": "operator_id", "type": "string", "primary_key": true},
                {"name": "name", "type": "string", "nullable": false},
                {"name": "shift_preference", "type": "string", "nullable": true}
            ],
            "position": {"x": 100, "y": 350},
            "description": "Operator information and qualifications"
        }"#;
        let table: TableNode = serde_json::from_str(json).unwrap();
        assert_eq!(table.columns.len(), 3);
        assert!(table.columns[0].primary_key);
        assert!(!table.columns[0].nullable);
        assert!(table.columns[2].nullable);
        assert_eq!(table.position, Some(Position::new(100.0, 350.0)));
    }

    #[test]
    fn test_relationship_id_alias() {
        let json = r#"{
            "_id": "r1",
            "from_table": "production_data",
            "to_table": "operators",
            "from_column": "operator_id",
            "to_column": "operator_id",
            "relationship_type": "many-to-one"
        }"#;
        let rel: Relationship = serde_json::from_str(json).unwrap();
        assert_eq!(rel.id, "r1");
        assert_eq!(rel.relationship_type, RelationshipType::ManyToOne);

        let json = json.replace("_id", "id");
        let rel: Relationship = serde_json::from_str(&json).unwrap();
        assert_eq!(rel.id, "r1");
    }

    #[test]
    fn test_relationship_type_names() {
        for t in [
            RelationshipType::OneToMany,
            RelationshipType::OneToOne,
            RelationshipType::ManyToMany,
            RelationshipType::ManyToOne,
        ] {
            assert_eq!(RelationshipType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(RelationshipType::from_str("one-to-few"), None);
    }
}
