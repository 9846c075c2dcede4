//! Serialized shape of a link-table configuration.

use serde::{Deserialize, Serialize};

/// A versioned link-table record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkTable {
    pub uid: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub config: LinkTableConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkTableConfig {
    #[serde(default)]
    pub links: Vec<Link>,
}

/// One join between two tables of the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub left_table: LinkTableTable,
    pub right_table: LinkTableTable,
    /// Join-type token, validated when the link is lowered
    pub join_type: String,
    #[serde(default)]
    pub link_fields: Vec<LinkFieldPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFieldPair {
    pub left_field: String,
    pub right_field: String,
}

/// A table participating in a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkTableTable {
    pub rt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub table_type: TableType,
    /// Scoping identifiers; only meaningful for event-log tables
    #[serde(default)]
    pub system_ids: Vec<String>,
}

impl LinkTableTable {
    /// Whether rows of this table are scoped by system id.
    pub fn is_scoped(&self) -> bool {
        self.table_type == TableType::EventLog
    }
}

/// Kind tag of a link-table table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    #[serde(alias = "EventLog")]
    EventLog,
    #[default]
    #[serde(alias = "BuildIn")]
    BuildIn,
    #[serde(alias = "BizRt")]
    BizRt,
    #[serde(other)]
    Other,
}
