//! Typed intermediate representation of a declarative audit query.
//!
//! The lowering layer builds these values from external JSON and the planner
//! consumes them. Every token that arrives as a string (join types, operators,
//! aggregates, ...) is parsed into a closed enum here, so an unknown token is
//! rejected before any SQL is assembled.

pub mod condition;
pub mod query;
pub mod table;
pub mod types;

pub use condition::{Condition, FilterValue, Scalar, WhereCondition};
pub use query::{JoinSpec, LinkField, OrderBy, Pagination, QueryConfig};
pub use table::{Field, Table};
pub use types::{Aggregate, Connector, FieldType, JoinType, Operator, SortOrder};

use thiserror::Error;

/// A string token outside one of the closed IR enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unsupported join type: {0}")]
    UnsupportedJoinType(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("invalid aggregate type: {0}")]
    InvalidAggregateType(String),

    #[error("unsupported field type: {0}")]
    UnsupportedFieldType(String),

    #[error("unsupported connector: {0}")]
    UnsupportedConnector(String),

    #[error("unsupported sort order: {0}")]
    UnsupportedSortOrder(String),
}
