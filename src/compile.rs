//! End-to-end compilation from a strategy to SQL.
//!
//! This module provides the high-level API:
//!
//! ```text
//! Strategy JSON → Lower → QueryConfig → Assemble → inner Query
//!                                                     │
//!                        outer SELECT JSON_OBJECT(...) FROM (inner) "sub_table"
//! ```
//!
//! # Example
//!
//! ```ignore
//! use auditql::compile::{compile_strategy, CompileOptions};
//! use auditql::link_table::InMemoryLinkTableStore;
//! use auditql::strategy::Strategy;
//!
//! let strategy = Strategy::from_json(json)?;
//! let store = InMemoryLinkTableStore::new();
//! let output = compile_strategy(&strategy, &store, &CompileOptions::default())?;
//! println!("{}", output.sql);
//! ```

use tracing::{debug, info};

use crate::config::{OutputSettings, ScopingSettings, Settings};
use crate::link_table::LinkTableStore;
use crate::lowering::{self, LoweringContext, LoweringError};
use crate::model::QueryConfig;
use crate::planner::{PlanError, SqlGenerator};
use crate::sql::expr::{json_object, lit_int, lit_str, table_col, ExprExt};
use crate::sql::query::{Query, SelectExpr};
use crate::sql::Dialect;
use crate::strategy::{FieldMap, Strategy};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid strategy JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Lowering error: {0}")]
    Lowering(#[from] LoweringError),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Field mapping '{field_name}' refers to unknown source field '{source_field}'")]
    UnknownSourceField {
        field_name: String,
        source_field: String,
    },
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,

    /// Names used by the wrapping query.
    pub output: OutputSettings,

    /// Scoping column of event-log tables.
    pub scoping: ScopingSettings,
}

impl CompileOptions {
    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_output(mut self, output: OutputSettings) -> Self {
        self.output = output;
        self
    }

    pub fn with_scoping_column(mut self, column: &str) -> Self {
        self.scoping.column = column.to_string();
        self
    }
}

impl From<&Settings> for CompileOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            dialect: settings.compile.dialect,
            output: settings.output.clone(),
            scoping: settings.scoping.clone(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling a strategy to SQL.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The final SQL string (outer query).
    pub sql: String,

    /// The inner query alone.
    pub inner_sql: String,

    /// The outer query AST.
    pub query: Query,

    /// The inner query AST.
    pub inner_query: Query,

    /// The dialect used for generation.
    pub dialect: Dialect,
}

/// Result of compiling a bare query configuration.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    pub sql: String,
    pub query: Query,
    pub dialect: Dialect,
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile a strategy into the final event-producing SELECT.
///
/// Looks up at most one link table through `store`. Every failure aborts
/// the compilation; no partial SQL is returned.
pub fn compile_strategy(
    strategy: &Strategy,
    store: &dyn LinkTableStore,
    options: &CompileOptions,
) -> CompileResult<CompileOutput> {
    // Step 1: Lower external JSON to the IR
    let ctx = LoweringContext {
        store,
        scoping_column: &options.scoping.column,
    };
    let config = lowering::lower(&strategy.configs, &ctx)?;

    // Step 2: Assemble the inner query
    let inner_query = SqlGenerator::new(&config).generate()?;

    // Step 3: Wrap it
    let query = wrap_query(strategy, &config, inner_query.clone(), &options.output)?;

    let output = CompileOutput {
        sql: query.to_sql(options.dialect),
        inner_sql: inner_query.to_sql(options.dialect),
        query,
        inner_query,
        dialect: options.dialect,
    };
    info!(
        strategy_id = strategy.strategy_id,
        dialect = %options.dialect,
        "compiled strategy"
    );
    Ok(output)
}

/// Parse a strategy from JSON and compile it.
pub fn compile_strategy_json(
    json: &str,
    store: &dyn LinkTableStore,
    options: &CompileOptions,
) -> CompileResult<CompileOutput> {
    let strategy = Strategy::from_json(json)?;
    compile_strategy(&strategy, store, options)
}

/// Compile a query configuration on its own, without wrapping.
pub fn compile_config(
    config: &QueryConfig,
    options: &CompileOptions,
) -> CompileResult<QueryOutput> {
    let query = SqlGenerator::new(config).generate()?;
    Ok(QueryOutput {
        sql: query.to_sql(options.dialect),
        query,
        dialect: options.dialect,
    })
}

/// Build the outer query selecting from `inner` as a sub-query.
///
/// The select list is the JSON payload, the strategy id, then one column per
/// field mapping in declaration order.
fn wrap_query(
    strategy: &Strategy,
    config: &QueryConfig,
    inner: Query,
    output: &OutputSettings,
) -> CompileResult<Query> {
    let sub = output.subquery_alias.as_str();

    let payload = json_object(
        config
            .select_fields
            .iter()
            .map(|field| {
                (
                    field.display_name.clone(),
                    table_col(sub, &field.display_name),
                )
            })
            .collect(),
    );

    let mut select: Vec<SelectExpr> = vec![
        payload.alias(&output.payload_column),
        lit_int(strategy.strategy_id).alias(&output.strategy_id_column),
    ];

    for field in &strategy.event_basic_field_configs {
        let Some(map_config) = &field.map_config else {
            continue;
        };
        match resolve_mapping(map_config) {
            Mapping::Constant(value) => {
                select.push(lit_str(value).alias(&field.field_name));
            }
            Mapping::Source(source) => {
                let known = config
                    .select_fields
                    .iter()
                    .any(|f| f.display_name == source);
                if !known {
                    return Err(CompileError::UnknownSourceField {
                        field_name: field.field_name.clone(),
                        source_field: source.to_string(),
                    });
                }
                select.push(table_col(sub, source).alias(&field.field_name));
            }
            Mapping::Omitted => {
                debug!(field = %field.field_name, "field mapping has no value, omitted");
            }
        }
    }

    Ok(Query::new().select(select).from_subquery(inner, sub))
}

enum Mapping<'a> {
    Constant(&'a str),
    Source(&'a str),
    Omitted,
}

/// A constant wins over a source field; empty strings count as absent.
fn resolve_mapping(map: &FieldMap) -> Mapping<'_> {
    fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|s| !s.is_empty())
    }

    match (present(&map.target_value), present(&map.source_field)) {
        (Some(value), _) => Mapping::Constant(value),
        (None, Some(source)) => Mapping::Source(source),
        (None, None) => Mapping::Omitted,
    }
}
