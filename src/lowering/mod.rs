//! Lowering the external rule-audit JSON to the typed IR.
//!
//! This is the only place string tokens are validated: join types,
//! operators, aggregates, connectors, field types, sort orders and the
//! config type all fail here, before any clause is assembled. Regex patterns
//! are compiled once to reject malformed ones early.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::link_table::{Link, LinkTableError, LinkTableStore, LinkTableTable};
use crate::model::{
    Condition, Connector, Field, FieldType, FilterValue, JoinSpec, LinkField, ModelError,
    Operator, OrderBy, Pagination, QueryConfig, Scalar, Table, WhereCondition,
};
use crate::strategy::{
    ConditionJson, DataSource, FieldDescriptor, OrderByJson, RuleAuditConfig, WhereJson,
    CONFIG_TYPE_LINK_TABLE, CONFIG_TYPE_SINGLE_TABLE,
};

/// Errors raised while turning external JSON into the IR.
#[derive(Debug, Error)]
pub enum LoweringError {
    #[error("select list is empty")]
    EmptySelect,

    #[error("operator '{operator}' on '{field}' requires a filter value")]
    MissingFilter { field: String, operator: Operator },

    #[error("operator '{operator}' on '{field}' takes a single value, not a list")]
    UnexpectedListFilter { field: String, operator: Operator },

    #[error("operator '{operator}' on '{field}' requires a non-empty list of values")]
    EmptyListFilter { field: String, operator: Operator },

    #[error("filter on '{field}' must be a string, number or boolean, got {value}")]
    NonScalarFilter { field: String, value: String },

    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("data source of a {config_type} query is missing '{key}'")]
    MissingDataSource {
        config_type: String,
        key: &'static str,
    },

    #[error("unsupported config type: {0}")]
    UnsupportedConfigType(String),

    #[error("condition node sets both 'condition' and 'conditions'")]
    ConditionWithChildren,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    LinkTable(#[from] LinkTableError),
}

pub type LoweringResult<T> = Result<T, LoweringError>;

/// What lowering needs beyond the JSON itself.
pub struct LoweringContext<'a> {
    /// Source of link-table configurations
    pub store: &'a dyn LinkTableStore,
    /// Column holding the scoping identifiers of scoped tables
    pub scoping_column: &'a str,
}

/// Tables, joins and scoping lists derived from a data source.
#[derive(Debug, Clone, PartialEq)]
struct DataSourcePlan {
    from_table: Table,
    join_tables: Vec<JoinSpec>,
    scoped_tables: Vec<(Table, Vec<String>)>,
}

/// Lower a rule-audit configuration to a query configuration.
pub fn lower(
    config: &RuleAuditConfig,
    ctx: &LoweringContext<'_>,
) -> LoweringResult<QueryConfig> {
    if config.select.is_empty() {
        return Err(LoweringError::EmptySelect);
    }
    let select_fields = config
        .select
        .iter()
        .map(lower_field)
        .collect::<LoweringResult<Vec<_>>>()?;

    let plan = match config.config_type.as_str() {
        CONFIG_TYPE_SINGLE_TABLE => lower_single_table(&config.data_source)?,
        CONFIG_TYPE_LINK_TABLE => lower_link_table(&config.data_source, ctx.store)?,
        other => return Err(LoweringError::UnsupportedConfigType(other.to_string())),
    };
    debug!(
        from = plan.from_table.key(),
        joins = plan.join_tables.len(),
        "resolved data source"
    );

    let user_where = config
        .where_condition
        .as_ref()
        .map(lower_where)
        .transpose()?;
    let where_condition = inject_scoping(user_where, &plan.scoped_tables, ctx.scoping_column);

    let group_by = config
        .group_by
        .iter()
        .map(lower_field)
        .collect::<LoweringResult<Vec<_>>>()?;
    let order_by = config
        .order_by
        .iter()
        .map(lower_order_by)
        .collect::<LoweringResult<Vec<_>>>()?;
    let pagination = config.pagination.map(|p| Pagination {
        limit: p.limit,
        offset: p.offset,
    });

    Ok(QueryConfig {
        select_fields,
        from_table: Some(plan.from_table),
        join_tables: plan.join_tables,
        where_condition,
        group_by,
        order_by,
        pagination,
    })
}

// =============================================================================
// Data sources
// =============================================================================

fn lower_single_table(source: &DataSource) -> LoweringResult<DataSourcePlan> {
    let rt_id = source
        .rt_id
        .as_deref()
        .ok_or_else(|| LoweringError::MissingDataSource {
            config_type: CONFIG_TYPE_SINGLE_TABLE.to_string(),
            key: "rt_id",
        })?;

    let from_table = table(rt_id, source.alias.as_deref());
    Ok(DataSourcePlan {
        scoped_tables: vec![(from_table.clone(), source.system_ids.clone())],
        from_table,
        join_tables: Vec::new(),
    })
}

fn lower_link_table(
    source: &DataSource,
    store: &dyn LinkTableStore,
) -> LoweringResult<DataSourcePlan> {
    let reference = source
        .link_table
        .as_ref()
        .ok_or_else(|| LoweringError::MissingDataSource {
            config_type: CONFIG_TYPE_LINK_TABLE.to_string(),
            key: "link_table",
        })?;

    let link_table = store.get(&reference.uid, reference.version)?;
    let links = &link_table.config.links;
    let Some(first) = links.first() else {
        return Err(LinkTableError::NoLinks {
            uid: reference.uid.clone(),
            version: reference.version,
        }
        .into());
    };

    let mut scoped_tables: Vec<(Table, Vec<String>)> = Vec::new();
    let mut join_tables = Vec::with_capacity(links.len());
    for link in links {
        for side in [&link.left_table, &link.right_table] {
            if side.is_scoped() {
                record_scope(&mut scoped_tables, link_side(side), &side.system_ids);
            }
        }
        join_tables.push(lower_link(link)?);
    }

    Ok(DataSourcePlan {
        from_table: link_side(&first.left_table),
        join_tables,
        scoped_tables,
    })
}

fn lower_link(link: &Link) -> LoweringResult<JoinSpec> {
    Ok(JoinSpec {
        join_type: link.join_type.parse()?,
        left: link_side(&link.left_table),
        right: link_side(&link.right_table),
        link_fields: link
            .link_fields
            .iter()
            .map(|pair| LinkField::new(&pair.left_field, &pair.right_field))
            .collect(),
    })
}

fn link_side(side: &LinkTableTable) -> Table {
    table(&side.rt_id, side.alias.as_deref())
}

/// A table seen again keeps its position and takes the latest list.
fn record_scope(scoped: &mut Vec<(Table, Vec<String>)>, table: Table, ids: &[String]) {
    match scoped.iter_mut().find(|(t, _)| t.key() == table.key()) {
        Some((_, existing)) => *existing = ids.to_vec(),
        None => scoped.push((table, ids.to_vec())),
    }
}

// =============================================================================
// Scoping
// =============================================================================

/// AND the user filter with one membership condition per scoped table.
fn inject_scoping(
    user_where: Option<WhereCondition>,
    scoped_tables: &[(Table, Vec<String>)],
    scoping_column: &str,
) -> Option<WhereCondition> {
    let mut children: Vec<WhereCondition> = user_where.into_iter().collect();

    for (table, ids) in scoped_tables {
        if ids.is_empty() {
            warn!(table = table.key(), "scoping list is empty, no restriction added");
            continue;
        }
        let field = Field::new(table.clone(), scoping_column, scoping_column)
            .with_type(FieldType::String);
        let values = ids.iter().map(|id| Scalar::String(id.clone())).collect();
        children.push(Condition::list(field, Operator::Include, values).into());
    }

    if children.is_empty() {
        None
    } else {
        Some(WhereCondition::Group {
            connector: Connector::And,
            children,
        })
    }
}

// =============================================================================
// Fields and conditions
// =============================================================================

fn table(name: &str, alias: Option<&str>) -> Table {
    match alias {
        Some(alias) => Table::new(name).with_alias(alias),
        None => Table::new(name),
    }
}

/// Lower a field descriptor.
pub fn lower_field(descriptor: &FieldDescriptor) -> LoweringResult<Field> {
    let mut field = Field::new(
        table(&descriptor.rt_id, descriptor.table_alias.as_deref()),
        &descriptor.raw_name,
        &descriptor.display_name,
    )
    .with_type(descriptor.field_type.parse()?);

    if let Some(aggregate) = &descriptor.aggregate {
        field = field.with_aggregate(aggregate.parse()?);
    }
    Ok(field)
}

fn lower_order_by(entry: &OrderByJson) -> LoweringResult<OrderBy> {
    Ok(OrderBy {
        field: lower_field(&entry.field)?,
        order: entry.order.parse()?,
    })
}

/// Lower a condition-tree node, one to one.
///
/// A node carrying `condition` is a leaf and its connector is ignored.
pub fn lower_where(node: &WhereJson) -> LoweringResult<WhereCondition> {
    if let Some(condition) = &node.condition {
        if !node.conditions.is_empty() {
            return Err(LoweringError::ConditionWithChildren);
        }
        return Ok(WhereCondition::Leaf(lower_condition(condition)?));
    }

    let connector: Connector = node.connector.parse()?;
    let children = node
        .conditions
        .iter()
        .map(lower_where)
        .collect::<LoweringResult<Vec<_>>>()?;
    Ok(WhereCondition::Group {
        connector,
        children,
    })
}

/// Lower a single condition, checking its filter against the operator.
pub fn lower_condition(condition: &ConditionJson) -> LoweringResult<Condition> {
    let field = lower_field(&condition.field)?;
    let operator: Operator = condition.operator.parse()?;
    let name = field.display_name.clone();

    let filter = if operator.is_set_operator() {
        let values = if !condition.filters.is_empty() {
            lower_scalars(&name, &condition.filters)?
        } else {
            match &condition.filter {
                Some(Value::Array(items)) => lower_scalars(&name, items)?,
                Some(Value::Null) | None => Vec::new(),
                Some(Value::String(s)) if s.is_empty() => Vec::new(),
                Some(value) => vec![lower_scalar(&name, value)?],
            }
        };
        if values.is_empty() {
            return Err(LoweringError::EmptyListFilter {
                field: name,
                operator,
            });
        }
        FilterValue::List(values)
    } else {
        let value = match &condition.filter {
            Some(Value::Array(_)) => {
                return Err(LoweringError::UnexpectedListFilter {
                    field: name,
                    operator,
                })
            }
            Some(Value::Null) | None if !condition.filters.is_empty() => {
                return Err(LoweringError::UnexpectedListFilter {
                    field: name,
                    operator,
                })
            }
            Some(Value::Null) | None => {
                return Err(LoweringError::MissingFilter {
                    field: name,
                    operator,
                })
            }
            Some(value) => lower_scalar(&name, value)?,
        };
        if operator.is_regex() {
            check_regex(&value)?;
        }
        FilterValue::Scalar(value)
    };

    Ok(Condition::new(field, operator, filter))
}

fn lower_scalars(field: &str, values: &[Value]) -> LoweringResult<Vec<Scalar>> {
    values.iter().map(|value| lower_scalar(field, value)).collect()
}

fn lower_scalar(field: &str, value: &Value) -> LoweringResult<Scalar> {
    match value {
        Value::String(s) => Ok(Scalar::String(s.clone())),
        Value::Bool(b) => Ok(Scalar::Bool(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(Scalar::Int(i)),
            (None, Some(f)) => Ok(Scalar::Float(f)),
            (None, None) => Err(non_scalar(field, value)),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => Err(non_scalar(field, value)),
    }
}

fn non_scalar(field: &str, value: &Value) -> LoweringError {
    LoweringError::NonScalarFilter {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn check_regex(value: &Scalar) -> LoweringResult<()> {
    let Scalar::String(pattern) = value else {
        return Err(LoweringError::InvalidRegex {
            pattern: format!("{:?}", value),
            reason: "pattern must be a string".to_string(),
        });
    };
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| LoweringError::InvalidRegex {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })
}
