//! Query assembly - turns a [`QueryConfig`] into a SQL [`Query`].
//!
//! Clauses are built in a fixed order regardless of which are present:
//! register tables → FROM → JOIN → SELECT → WHERE → GROUP BY → ORDER BY →
//! LIMIT/OFFSET. Every table reference goes through the [`TableRegistry`].

pub mod expr_converter;
pub mod join_builder;
pub mod registry;

pub use expr_converter::ExprConverter;
pub use join_builder::JoinBuilder;
pub use registry::TableRegistry;

use thiserror::Error;
use tracing::debug;

use crate::model::{Aggregate, Field, Operator, QueryConfig, SortOrder};
use crate::sql::expr::{avg, count, max, min, sum, Expr as SqlExpr, ExprExt};
use crate::sql::query::{OrderByExpr, Query};

/// Errors that can occur during query assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("table '{0}' is not registered")]
    UnregisteredTable(String),

    #[error("query has neither a from table nor any join")]
    MissingFromOrJoin,

    #[error("alias '{key}' is registered for table '{existing}' and cannot also name '{conflicting}'")]
    AliasConflict {
        key: String,
        existing: String,
        conflicting: String,
    },

    #[error("operator '{0}' takes a single value, not a list")]
    ListFilterForScalarOperator(Operator),

    #[error("join between '{left}' and '{right}' has no link fields")]
    MissingJoinCondition { left: String, right: String },

    #[error("float filter value {0} has no SQL literal")]
    NonFiniteFloat(String),
}

pub type PlanResult<T> = Result<T, PlanError>;

/// Builds one SELECT statement from a query configuration.
pub struct SqlGenerator<'a> {
    config: &'a QueryConfig,
}

impl<'a> SqlGenerator<'a> {
    pub fn new(config: &'a QueryConfig) -> Self {
        Self { config }
    }

    /// Run every stage and return the assembled query.
    pub fn generate(&self) -> PlanResult<Query> {
        let registry = TableRegistry::register(self.config)?;
        debug!(tables = registry.len(), "registered tables");

        let query = Query::new();
        let query = self.build_from(query, &registry)?;
        let query = self.build_select(query, &registry)?;
        let query = self.build_where(query, &registry)?;
        let query = self.build_group_by(query, &registry)?;
        let query = self.build_order_by(query, &registry)?;
        Ok(self.build_pagination(query))
    }

    fn build_from(&self, query: Query, registry: &TableRegistry) -> PlanResult<Query> {
        // The first join's left table is authoritative when joins exist
        let from = match (self.config.join_tables.first(), &self.config.from_table) {
            (Some(first), _) => &first.left,
            (None, Some(table)) => table,
            (None, None) => return Err(PlanError::MissingFromOrJoin),
        };

        let mut query = query.from(registry.resolve(from)?);
        query.joins = JoinBuilder::new(registry).build_all(&self.config.join_tables)?;
        debug!(from = from.key(), joins = query.joins.len(), "built FROM/JOIN");
        Ok(query)
    }

    fn build_select(&self, query: Query, registry: &TableRegistry) -> PlanResult<Query> {
        let mut query = query;
        for field in &self.config.select_fields {
            let column = registry.column(field)?;
            let expr = match field.aggregate {
                Some(aggregate) => apply_aggregate(aggregate, column),
                None => column,
            };
            query = query.add_select(expr.alias(&field.display_name));
        }
        debug!(columns = query.select.len(), "built SELECT");
        Ok(query)
    }

    fn build_where(&self, query: Query, registry: &TableRegistry) -> PlanResult<Query> {
        let Some(root) = &self.config.where_condition else {
            return Ok(query);
        };

        match ExprConverter::convert_where(root, registry)? {
            Some(predicate) => {
                debug!(conditions = root.leaf_count(), "built WHERE");
                Ok(query.filter(predicate))
            }
            None => Ok(query),
        }
    }

    fn build_group_by(&self, query: Query, registry: &TableRegistry) -> PlanResult<Query> {
        let fields: Vec<&Field> = if !self.config.group_by.is_empty() {
            self.config.group_by.iter().collect()
        } else if self.config.has_aggregate() {
            // Group by every plain select field
            self.config
                .select_fields
                .iter()
                .filter(|field| !field.is_aggregate())
                .collect()
        } else {
            return Ok(query);
        };

        let exprs = fields
            .into_iter()
            .map(|field| registry.column(field))
            .collect::<PlanResult<Vec<_>>>()?;
        debug!(columns = exprs.len(), "built GROUP BY");
        Ok(query.group_by(exprs))
    }

    fn build_order_by(&self, query: Query, registry: &TableRegistry) -> PlanResult<Query> {
        if self.config.order_by.is_empty() {
            return Ok(query);
        }

        let items = self
            .config
            .order_by
            .iter()
            .map(|entry| {
                let column = registry.column(&entry.field)?;
                Ok(match entry.order {
                    SortOrder::Asc => OrderByExpr::asc(column),
                    SortOrder::Desc => OrderByExpr::desc(column),
                })
            })
            .collect::<PlanResult<Vec<_>>>()?;
        Ok(query.order_by(items))
    }

    fn build_pagination(&self, query: Query) -> Query {
        let Some(pagination) = self.config.pagination else {
            return query;
        };

        let mut query = query;
        if let Some(limit) = pagination.limit.filter(|n| *n > 0) {
            query = query.limit(limit);
        }
        if let Some(offset) = pagination.offset.filter(|n| *n > 0) {
            query = query.offset(offset);
        }
        query
    }
}

/// Wrap a column in its aggregate function.
pub fn apply_aggregate(aggregate: Aggregate, column: SqlExpr) -> SqlExpr {
    match aggregate {
        Aggregate::Count => count(column),
        Aggregate::Sum => sum(column),
        Aggregate::Max => max(column),
        Aggregate::Min => min(column),
        Aggregate::Avg => avg(column),
    }
}

/// Assemble `config` into a query.
pub fn generate(config: &QueryConfig) -> PlanResult<Query> {
    SqlGenerator::new(config).generate()
}
