//! Filter conditions and the boolean condition tree.

use super::table::Field;
use super::types::{Connector, Operator};

/// A typed scalar filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.into())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// A single `field <operator> filter` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: Field,
    pub operator: Operator,
    pub filter: FilterValue,
}

impl Condition {
    pub fn new(field: Field, operator: Operator, filter: FilterValue) -> Self {
        Self {
            field,
            operator,
            filter,
        }
    }

    pub fn scalar(field: Field, operator: Operator, value: impl Into<Scalar>) -> Self {
        Self::new(field, operator, FilterValue::Scalar(value.into()))
    }

    pub fn list(field: Field, operator: Operator, values: Vec<Scalar>) -> Self {
        Self::new(field, operator, FilterValue::List(values))
    }
}

/// A node of the condition tree.
///
/// A leaf holds exactly one condition; a group holds a connector and its
/// ordered children.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereCondition {
    Leaf(Condition),
    Group {
        connector: Connector,
        children: Vec<WhereCondition>,
    },
}

impl WhereCondition {
    pub fn and(children: Vec<WhereCondition>) -> Self {
        WhereCondition::Group {
            connector: Connector::And,
            children,
        }
    }

    pub fn or(children: Vec<WhereCondition>) -> Self {
        WhereCondition::Group {
            connector: Connector::Or,
            children,
        }
    }

    /// Number of leaf conditions below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            WhereCondition::Leaf(_) => 1,
            WhereCondition::Group { children, .. } => {
                children.iter().map(WhereCondition::leaf_count).sum()
            }
        }
    }
}

impl From<Condition> for WhereCondition {
    fn from(condition: Condition) -> Self {
        WhereCondition::Leaf(condition)
    }
}
