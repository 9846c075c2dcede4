//! Closed token enums of the IR.
//!
//! Each enum parses case-insensitively from the string token used in the
//! external JSON and fails with the matching [`ModelError`] variant.

use std::fmt;
use std::str::FromStr;

use super::ModelError;

/// Column type tag carried by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    String,
    Text,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Timestamp,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
        }
    }
}

impl FromStr for FieldType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "text" => Ok(FieldType::Text),
            "int" => Ok(FieldType::Int),
            "long" => Ok(FieldType::Long),
            "float" => Ok(FieldType::Float),
            "double" => Ok(FieldType::Double),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "timestamp" => Ok(FieldType::Timestamp),
            _ => Err(ModelError::UnsupportedFieldType(s.to_string())),
        }
    }
}

/// Aggregate function applied to a select field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum,
    Max,
    Min,
    Avg,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Max => "MAX",
            Aggregate::Min => "MIN",
            Aggregate::Avg => "AVG",
        }
    }
}

impl FromStr for Aggregate {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "COUNT" => Ok(Aggregate::Count),
            "SUM" => Ok(Aggregate::Sum),
            "MAX" => Ok(Aggregate::Max),
            "MIN" => Ok(Aggregate::Min),
            "AVG" => Ok(Aggregate::Avg),
            _ => Err(ModelError::InvalidAggregateType(s.to_string())),
        }
    }
}

/// Condition operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    /// Regex match
    Reg,
    /// Regex non-match
    Nreg,
    /// Set membership
    Include,
    /// Set exclusion
    Exclude,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Reg => "reg",
            Operator::Nreg => "nreg",
            Operator::Include => "include",
            Operator::Exclude => "exclude",
        }
    }

    /// Set operators take a list filter; all others take a scalar.
    pub fn is_set_operator(&self) -> bool {
        matches!(self, Operator::Include | Operator::Exclude)
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Operator::Reg | Operator::Nreg)
    }
}

impl FromStr for Operator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" | "=" => Ok(Operator::Eq),
            "neq" | "!=" | "<>" => Ok(Operator::Neq),
            "reg" => Ok(Operator::Reg),
            "nreg" => Ok(Operator::Nreg),
            "include" => Ok(Operator::Include),
            "exclude" => Ok(Operator::Exclude),
            _ => Err(ModelError::UnsupportedOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connector of a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl FromStr for Connector {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Connector::And),
            "or" => Ok(Connector::Or),
            _ => Err(ModelError::UnsupportedConnector(s.to_string())),
        }
    }
}

/// Sort direction of an ORDER BY entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ModelError::UnsupportedSortOrder(s.to_string())),
        }
    }
}

/// Join type of a join specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner_join",
            JoinType::Left => "left_join",
            JoinType::Right => "right_join",
            JoinType::Full => "full_outer_join",
        }
    }
}

impl FromStr for JoinType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let token = lower.strip_suffix("_join").unwrap_or(&lower);
        match token {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "full" | "full_outer" => Ok(JoinType::Full),
            _ => Err(ModelError::UnsupportedJoinType(s.to_string())),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
