use super::types::{Aggregate, FieldType};

/// A table reference: physical name plus optional alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: String,
    pub alias: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Identity used for registration and resolution: the alias, or the name
    /// when no alias is set.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A column of a registered table as it appears in a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub table: Table,
    pub raw_name: String,
    /// Output alias in the SELECT list
    pub display_name: String,
    pub field_type: FieldType,
    pub aggregate: Option<Aggregate>,
}

impl Field {
    pub fn new(table: Table, raw_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            table,
            raw_name: raw_name.into(),
            display_name: display_name.into(),
            field_type: FieldType::default(),
            aggregate: None,
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }
}
