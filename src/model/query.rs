use super::condition::WhereCondition;
use super::table::{Field, Table};
use super::types::{JoinType, SortOrder};

/// One equality pair of a join: `left.left_field = right.right_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkField {
    pub left_field: String,
    pub right_field: String,
}

impl LinkField {
    pub fn new(left_field: impl Into<String>, right_field: impl Into<String>) -> Self {
        Self {
            left_field: left_field.into(),
            right_field: right_field.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub left: Table,
    pub right: Table,
    pub link_fields: Vec<LinkField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: Field,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A complete query description, ready for assembly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryConfig {
    pub select_fields: Vec<Field>,
    pub from_table: Option<Table>,
    pub join_tables: Vec<JoinSpec>,
    pub where_condition: Option<WhereCondition>,
    pub group_by: Vec<Field>,
    pub order_by: Vec<OrderBy>,
    pub pagination: Option<Pagination>,
}

impl QueryConfig {
    /// Whether any select field carries an aggregate.
    pub fn has_aggregate(&self) -> bool {
        self.select_fields.iter().any(Field::is_aggregate)
    }
}
