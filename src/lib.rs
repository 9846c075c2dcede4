//! # auditql
//!
//! Compiles declarative audit strategies into SQL.
//!
//! ## Architecture
//!
//! A strategy is a JSON document describing which table(s) to read, which
//! fields to project and aggregate, and a tree of filter conditions. It is
//! compiled in three stages:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Strategy (JSON document)                 │
//! │   (data source, select, where tree, group/order/page)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lowering + link table store]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 QueryConfig (model IR)                   │
//! │     (tables, fields, joins, conditions, pagination)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Inner SELECT (sql::Query)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SELECT JSON_OBJECT(...) "event_data", <id> ...         │
//! │   FROM (inner) "sub_table"                               │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod link_table;
pub mod lowering;
pub mod model;
pub mod planner;
pub mod sql;
pub mod strategy;

// Re-export SQL submodules at crate level
pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{
        compile_config, compile_strategy, compile_strategy_json, CompileError, CompileOptions,
        CompileOutput,
    };
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::expr::{
        // Constructors
        avg,
        col,
        count,
        func,
        json_object,
        lit_bool,
        lit_float,
        lit_int,
        lit_null,
        lit_str,
        max,
        min,
        sum,
        table_col,
        // Types
        BinaryOperator,
        Expr,
        ExprExt,
        Literal,
    };
    pub use crate::link_table::{DirectoryLinkTableStore, InMemoryLinkTableStore, LinkTableStore};
    pub use crate::model::{
        Aggregate, Condition, Connector, Field, FieldType, JoinSpec, JoinType, LinkField,
        Operator, OrderBy, Pagination, QueryConfig, Scalar, SortOrder, Table, WhereCondition,
    };
    pub use crate::query::{OrderByExpr, Query, SelectExpr, SortDir, TableRef};
    pub use crate::strategy::Strategy;
}

// Also export at crate root for convenience
pub use compile::{compile_strategy, compile_strategy_json, CompileError, CompileOptions};
pub use dialect::Dialect;
pub use query::Query;
pub use strategy::Strategy;
