use auditql::model::{Field, JoinSpec, JoinType, LinkField, QueryConfig, Table};
use auditql::planner::{JoinBuilder, PlanError, TableRegistry};
use auditql::sql::query::{JoinType as SqlJoinType, TableRef};
use auditql::sql::Dialect;

/// Configuration joining `login_log` to `users`, and `users` to `departments`.
fn chain_config(first: JoinType, second: JoinType) -> QueryConfig {
    let login = Table::new("login_log");
    let users = Table::new("users").with_alias("u");
    let departments = Table::new("departments");

    QueryConfig {
        select_fields: vec![Field::new(login.clone(), "id", "event_id")],
        from_table: Some(login.clone()),
        join_tables: vec![
            JoinSpec {
                join_type: first,
                left: login,
                right: users.clone(),
                link_fields: vec![LinkField::new("username", "name")],
            },
            JoinSpec {
                join_type: second,
                left: users,
                right: departments,
                link_fields: vec![
                    LinkField::new("dept_id", "id"),
                    LinkField::new("tenant", "tenant"),
                ],
            },
        ],
        ..Default::default()
    }
}

#[test]
fn test_build_single_join() {
    let config = chain_config(JoinType::Left, JoinType::Inner);
    let registry = TableRegistry::register(&config).unwrap();
    let join = JoinBuilder::new(&registry)
        .build(&config.join_tables[0])
        .unwrap();

    assert_eq!(join.join_type, SqlJoinType::Left);
    assert_eq!(join.table, TableRef::new("users").with_alias("u"));
    assert_eq!(
        join.on.unwrap().to_sql(Dialect::BkBase),
        r#""login_log"."username"="u"."name""#
    );
}

#[test]
fn test_build_all_keeps_order() {
    let config = chain_config(JoinType::Inner, JoinType::Full);
    let registry = TableRegistry::register(&config).unwrap();
    let joins = JoinBuilder::new(&registry)
        .build_all(&config.join_tables)
        .unwrap();

    assert_eq!(joins.len(), 2);
    assert_eq!(joins[0].join_type, SqlJoinType::Inner);
    assert_eq!(joins[1].join_type, SqlJoinType::Full);
    assert_eq!(joins[1].table.reference_name(), "departments");
    assert_eq!(
        joins[1].on.as_ref().unwrap().to_sql(Dialect::BkBase),
        r#""u"."dept_id"="departments"."id" AND "u"."tenant"="departments"."tenant""#
    );
}

#[test]
fn test_every_join_type() {
    let cases = [
        (JoinType::Inner, SqlJoinType::Inner),
        (JoinType::Left, SqlJoinType::Left),
        (JoinType::Right, SqlJoinType::Right),
        (JoinType::Full, SqlJoinType::Full),
    ];
    for (join_type, expected) in cases {
        let config = chain_config(join_type, JoinType::Inner);
        let registry = TableRegistry::register(&config).unwrap();
        let join = JoinBuilder::new(&registry)
            .build(&config.join_tables[0])
            .unwrap();
        assert_eq!(join.join_type, expected);
    }
}

#[test]
fn test_join_without_link_fields() {
    let mut config = chain_config(JoinType::Inner, JoinType::Inner);
    config.join_tables[0].link_fields.clear();
    let registry = TableRegistry::register(&config).unwrap();

    assert_eq!(
        JoinBuilder::new(&registry)
            .build(&config.join_tables[0])
            .unwrap_err(),
        PlanError::MissingJoinCondition {
            left: "login_log".to_string(),
            right: "u".to_string(),
        }
    );
}

#[test]
fn test_join_against_unregistered_table() {
    let config = chain_config(JoinType::Inner, JoinType::Inner);
    let registry = TableRegistry::register(&config).unwrap();
    let stray = JoinSpec {
        join_type: JoinType::Inner,
        left: Table::new("login_log"),
        right: Table::new("assets"),
        link_fields: vec![LinkField::new("asset_id", "id")],
    };

    assert_eq!(
        JoinBuilder::new(&registry).build(&stray).unwrap_err(),
        PlanError::UnregisteredTable("assets".to_string())
    );
}

#[test]
fn test_alias_conflict_is_rejected() {
    let mut config = chain_config(JoinType::Inner, JoinType::Inner);
    config.join_tables[1].right = Table::new("departments").with_alias("u");

    assert_eq!(
        TableRegistry::register(&config).unwrap_err(),
        PlanError::AliasConflict {
            key: "u".to_string(),
            existing: "users".to_string(),
            conflicting: "departments".to_string(),
        }
    );
}
