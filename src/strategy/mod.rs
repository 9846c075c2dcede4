//! External request shapes: a strategy and its rule-audit query description.
//!
//! These types mirror the loosely-typed JSON supplied by callers. Tokens such
//! as operators or join types stay plain strings here; [`crate::lowering`]
//! validates them and produces the typed IR.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `config_type` of a single-table query.
pub const CONFIG_TYPE_SINGLE_TABLE: &str = "single_table";
/// `config_type` of a query over a stored link table.
pub const CONFIG_TYPE_LINK_TABLE: &str = "link_table";

/// An audit strategy: the query to run plus the output field mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub strategy_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_name: Option<String>,
    pub configs: RuleAuditConfig,
    #[serde(default)]
    pub event_basic_field_configs: Vec<EventBasicField>,
}

impl Strategy {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// One output column of the wrapping query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBasicField {
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_config: Option<FieldMap>,
}

/// Where the value of an output column comes from.
///
/// A constant `target_value` wins over `source_field`, the display name of an
/// inner select field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldMap {
    #[serde(default)]
    pub source_field: Option<String>,
    #[serde(default)]
    pub target_value: Option<String>,
}

/// The declarative query description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAuditConfig {
    pub config_type: String,
    pub data_source: DataSource,
    #[serde(default)]
    pub select: Vec<FieldDescriptor>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_condition: Option<WhereJson>,
    #[serde(default)]
    pub group_by: Vec<FieldDescriptor>,
    #[serde(default)]
    pub order_by: Vec<OrderByJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationJson>,
}

/// Either a single table (`rt_id`) or a link-table reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub system_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_table: Option<LinkTableRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTableRef {
    pub uid: String,
    pub version: u32,
}

/// A column reference as written by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Table the column belongs to
    pub rt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_alias: Option<String>,
    pub raw_name: String,
    pub display_name: String,
    #[serde(default = "default_field_type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
}

fn default_field_type() -> String {
    "string".to_string()
}

/// A condition-tree node: either `condition` or `conditions` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereJson {
    #[serde(default = "default_connector")]
    pub connector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionJson>,
    #[serde(default)]
    pub conditions: Vec<WhereJson>,
}

fn default_connector() -> String {
    "and".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionJson {
    pub field: FieldDescriptor,
    pub operator: String,
    /// Scalar filter for comparison and regex operators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// List filter for `include`/`exclude`
    #[serde(default)]
    pub filters: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByJson {
    pub field: FieldDescriptor,
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_order() -> String {
    "asc".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginationJson {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}
