//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates multi-dialect SQL.
//! It includes:
//!
//! - [`query`] - SELECT query builder (joins, derived tables, pagination)
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    avg, col, count, func, json_object, lit_bool, lit_float, lit_int, lit_null, lit_str, max, min,
    sum, table_col, BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::{
    Join, JoinType, LimitOffset, OrderByExpr, Query, SelectExpr, SortDir, TableFactor, TableRef,
};
pub use token::{Token, TokenStream};
