//! JOIN clause construction from join specifications.

use super::registry::TableRegistry;
use super::{PlanError, PlanResult};
use crate::model::{JoinSpec, JoinType};
use crate::sql::expr::ExprExt;
use crate::sql::query::{Join, JoinType as SqlJoinType};

pub struct JoinBuilder<'a> {
    registry: &'a TableRegistry,
}

impl<'a> JoinBuilder<'a> {
    pub fn new(registry: &'a TableRegistry) -> Self {
        Self { registry }
    }

    /// Build one JOIN against the right table of `spec`.
    ///
    /// Every link-field pair becomes `left.col = right.col`; several pairs
    /// are ANDed into a single ON clause.
    pub fn build(&self, spec: &JoinSpec) -> PlanResult<Join> {
        let left = self.registry.resolve(&spec.left)?;
        let right = self.registry.resolve(&spec.right)?;

        let on = spec
            .link_fields
            .iter()
            .map(|link| left.col(&link.left_field).eq(right.col(&link.right_field)))
            .reduce(|acc, pair| acc.and(pair))
            .ok_or_else(|| PlanError::MissingJoinCondition {
                left: spec.left.key().to_string(),
                right: spec.right.key().to_string(),
            })?;

        Ok(Join {
            join_type: Self::convert_join_type(spec.join_type),
            table: right,
            on: Some(on),
        })
    }

    /// Build every JOIN in declaration order.
    pub fn build_all(&self, specs: &[JoinSpec]) -> PlanResult<Vec<Join>> {
        specs.iter().map(|spec| self.build(spec)).collect()
    }

    fn convert_join_type(join_type: JoinType) -> SqlJoinType {
        match join_type {
            JoinType::Inner => SqlJoinType::Inner,
            JoinType::Left => SqlJoinType::Left,
            JoinType::Right => SqlJoinType::Right,
            JoinType::Full => SqlJoinType::Full,
        }
    }
}

