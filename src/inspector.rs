//! Selected-table detail pane. Reads the layout model, never writes it.

use crate::layout::LayoutModel;
use crate::model::RelationshipType;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    table: Option<String>,
}

impl Selection {
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn is_selected(&self, table_name: &str) -> bool {
        self.table.as_deref() == Some(table_name)
    }

    /// Returns true when the selection actually changed.
    pub fn select(&mut self, table_name: impl Into<String>) -> bool {
        let table_name = table_name.into();
        if self.is_selected(&table_name) {
            return false;
        }
        self.table = Some(table_name);
        true
    }

    pub fn clear(&mut self) -> bool {
        self.table.take().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDetail {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub primary_key: bool,
    pub nullable: bool,
}

impl ColumnDetail {
    pub fn flags(&self) -> String {
        let mut flags = String::new();
        if self.primary_key {
            flags.push_str(" (PK)");
        }
        if !self.nullable {
            flags.push_str(" (NOT NULL)");
        }
        flags
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipSummary {
    pub id: String,
    pub from_table: String,
    pub to_table: String,
    pub relationship_type: RelationshipType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDetails {
    pub table_name: String,
    pub description: Option<String>,
    pub columns: Vec<ColumnDetail>,
    pub relationships: Vec<RelationshipSummary>,
}

impl TableDetails {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Table Details: {}", self.table_name)?;
        if let Some(description) = &self.description {
            writeln!(out, "{}", description)?;
        }
        writeln!(out)?;
        writeln!(out, "Columns")?;
        for column in &self.columns {
            writeln!(out, "  {:<24} {}{}", column.name, column.typ, column.flags())?;
        }
        writeln!(out)?;
        writeln!(out, "Relationships")?;
        if self.relationships.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for rel in &self.relationships {
            writeln!(
                out,
                "  {} -> {} ({}) [{}]",
                rel.from_table, rel.to_table, rel.relationship_type, rel.id
            )?;
        }
        Ok(())
    }
}

pub struct Inspector;

impl Inspector {
    pub fn details(model: &LayoutModel, selection: &Selection) -> Option<TableDetails> {
        Self::table_details(model, selection.table()?)
    }

    pub fn table_details(model: &LayoutModel, table_name: &str) -> Option<TableDetails> {
        let table = model.table(table_name)?;
        let columns = table
            .columns
            .iter()
            .map(|c| ColumnDetail {
                name: c.name.clone(),
                typ: c.typ.clone(),
                primary_key: c.primary_key,
                nullable: c.nullable,
            })
            .collect();
        let relationships = model
            .relationships_touching(table_name)
            .map(|r| RelationshipSummary {
                id: r.id.clone(),
                from_table: r.from_table.clone(),
                to_table: r.to_table.clone(),
                relationship_type: r.relationship_type,
            })
            .collect();

        Some(TableDetails {
            table_name: table.table_name.clone(),
            description: table.description.clone(),
            columns,
            relationships,
        })
    }
}
