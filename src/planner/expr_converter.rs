//! Condition compilation: operator dispatch and condition-tree folding.

use tracing::trace;

use super::registry::TableRegistry;
use super::{PlanError, PlanResult};
use crate::model::{Condition, Connector, FilterValue, Operator, Scalar, WhereCondition};
use crate::sql::expr::{BinaryOperator as SqlBinaryOp, Expr as SqlExpr, ExprExt, Literal};

/// Stateless condition converter.
pub struct ExprConverter;

impl ExprConverter {
    /// Reduce a condition tree to a single predicate.
    ///
    /// Returns `None` for a group with no children, which contributes nothing
    /// to the WHERE clause.
    pub fn convert_where(
        node: &WhereCondition,
        registry: &TableRegistry,
    ) -> PlanResult<Option<SqlExpr>> {
        match node {
            WhereCondition::Leaf(condition) => {
                Self::convert_condition(condition, registry).map(Some)
            }

            WhereCondition::Group {
                connector,
                children,
            } => {
                let op = Self::convert_connector(*connector);
                let mut folded: Option<SqlExpr> = None;

                for child in children {
                    let Some(expr) = Self::convert_where(child, registry)? else {
                        continue;
                    };
                    let expr = Self::bracket_for(expr, op);
                    folded = Some(match folded {
                        Some(acc) => SqlExpr::BinaryOp {
                            left: Box::new(acc),
                            op,
                            right: Box::new(expr),
                        },
                        None => expr,
                    });
                }

                trace!(?connector, children = children.len(), "folded condition group");
                Ok(folded)
            }
        }
    }

    /// Compile one leaf condition through the operator table.
    pub fn convert_condition(
        condition: &Condition,
        registry: &TableRegistry,
    ) -> PlanResult<SqlExpr> {
        let field = registry.column(&condition.field)?;

        Ok(match condition.operator {
            Operator::Eq => field.eq(Self::scalar_filter(condition)?),
            Operator::Neq => field.ne(Self::scalar_filter(condition)?),
            Operator::Reg => field.regex(Self::scalar_filter(condition)?),
            Operator::Nreg => field.not_regex(Self::scalar_filter(condition)?),
            Operator::Include => field.in_list(Self::list_filter(&condition.filter)?),
            Operator::Exclude => field.not_in_list(Self::list_filter(&condition.filter)?),
        })
    }

    fn scalar_filter(condition: &Condition) -> PlanResult<SqlExpr> {
        match &condition.filter {
            FilterValue::Scalar(value) => Self::convert_scalar(value),
            FilterValue::List(_) => Err(PlanError::ListFilterForScalarOperator(condition.operator)),
        }
    }

    /// A scalar given to a set operator is a one-element list.
    fn list_filter(filter: &FilterValue) -> PlanResult<Vec<SqlExpr>> {
        match filter {
            FilterValue::List(values) => values.iter().map(Self::convert_scalar).collect(),
            FilterValue::Scalar(value) => Ok(vec![Self::convert_scalar(value)?]),
        }
    }

    /// NaN and infinities have no SQL literal.
    pub fn convert_scalar(value: &Scalar) -> PlanResult<SqlExpr> {
        Ok(SqlExpr::Literal(match value {
            Scalar::Int(n) => Literal::Int(*n),
            Scalar::Float(f) if !f.is_finite() => {
                return Err(PlanError::NonFiniteFloat(f.to_string()))
            }
            Scalar::Float(f) => Literal::Float(*f),
            Scalar::String(s) => Literal::String(s.clone()),
            Scalar::Bool(b) => Literal::Bool(*b),
        }))
    }

    fn convert_connector(connector: Connector) -> SqlBinaryOp {
        match connector {
            Connector::And => SqlBinaryOp::And,
            Connector::Or => SqlBinaryOp::Or,
        }
    }

    /// A compound of the other connector keeps its own grouping; a compound of
    /// the same connector is flattened into its parent.
    fn bracket_for(expr: SqlExpr, parent: SqlBinaryOp) -> SqlExpr {
        match expr.logical_op() {
            Some(op) if op != parent => expr.paren(),
            _ => expr,
        }
    }
}
