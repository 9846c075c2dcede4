//! Table registry: the single point resolving table references.

use std::collections::HashMap;

use tracing::trace;

use super::{PlanError, PlanResult};
use crate::model::{Field, QueryConfig, Table};
use crate::sql::expr::Expr as SqlExpr;
use crate::sql::query::TableRef;

/// Tables declared by one query configuration, keyed by alias-or-name.
///
/// Built once per compilation and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<String, Table>,
}

impl TableRegistry {
    /// Register the from-table and both sides of every join.
    pub fn register(config: &QueryConfig) -> PlanResult<Self> {
        let mut registry = Self::default();

        if let Some(from) = &config.from_table {
            registry.add(from)?;
        }
        for join in &config.join_tables {
            registry.add(&join.left)?;
            registry.add(&join.right)?;
        }

        Ok(registry)
    }

    /// Add a table; re-adding the same table under the same key is a no-op.
    pub fn add(&mut self, table: &Table) -> PlanResult<()> {
        let key = table.key();
        match self.tables.get(key) {
            Some(existing) if existing.name != table.name => Err(PlanError::AliasConflict {
                key: key.to_string(),
                existing: existing.name.clone(),
                conflicting: table.name.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                trace!(table = %table.name, key, "registered table");
                self.tables.insert(key.to_string(), table.clone());
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains(&self, table: &Table) -> bool {
        self.tables.contains_key(table.key())
    }

    /// Resolve a reference to its registered table, rendered as `"name" "key"`.
    pub fn resolve(&self, table: &Table) -> PlanResult<TableRef> {
        let key = table.key();
        self.tables
            .get(key)
            .map(|registered| TableRef::new(&registered.name).with_alias(key))
            .ok_or_else(|| PlanError::UnregisteredTable(key.to_string()))
    }

    /// Resolve a field to a qualified column reference.
    pub fn column(&self, field: &Field) -> PlanResult<SqlExpr> {
        self.column_of(&field.table, &field.raw_name)
    }

    /// Resolve `table.column` for an arbitrary column name.
    pub fn column_of(&self, table: &Table, column: &str) -> PlanResult<SqlExpr> {
        Ok(self.resolve(table)?.col(column))
    }
}
