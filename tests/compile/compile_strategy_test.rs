use auditql::compile::{
    compile_config, compile_strategy, compile_strategy_json, CompileError, CompileOptions,
};
use auditql::config::OutputSettings;
use auditql::link_table::{InMemoryLinkTableStore, LinkTable, LinkTableError};
use auditql::lowering::LoweringError;
use auditql::model::{Field, QueryConfig, Table};
use auditql::sql::Dialect;
use auditql::strategy::Strategy;
use insta::assert_snapshot;
use serde_json::{json, Value};

fn strategy(value: Value) -> Strategy {
    serde_json::from_value(value).unwrap()
}

/// Single-table login strategy scoped to one system.
fn login_strategy() -> Strategy {
    strategy(json!({
        "strategy_id": 42,
        "strategy_name": "adult logins",
        "configs": {
            "config_type": "single_table",
            "data_source": {"rt_id": "users", "system_ids": ["bk_iam"]},
            "select": [
                {"rt_id": "users", "raw_name": "id", "display_name": "user_id", "field_type": "int"},
                {"rt_id": "users", "raw_name": "name", "display_name": "user_name"}
            ],
            "where": {
                "connector": "and",
                "conditions": [
                    {"condition": {
                        "field": {"rt_id": "users", "raw_name": "age", "display_name": "age"},
                        "operator": "eq",
                        "filter": 18
                    }}
                ]
            }
        },
        "event_basic_field_configs": [
            {"field_name": "raw_event_id", "map_config": {"source_field": "user_id"}},
            {"field_name": "operator", "map_config": {"source_field": "user_name", "target_value": "admin"}},
            {"field_name": "event_content", "map_config": {}},
            {"field_name": "start_time"}
        ]
    }))
}

fn login_link_table() -> LinkTable {
    serde_json::from_value(json!({
        "uid": "lt_login",
        "version": 1,
        "config": {
            "links": [{
                "left_table": {
                    "rt_id": "login_log",
                    "table_type": "EventLog",
                    "system_ids": ["bk_iam"]
                },
                "right_table": {"rt_id": "users", "table_type": "BizRt"},
                "join_type": "left_join",
                "link_fields": [{"left_field": "username", "right_field": "name"}]
            }]
        }
    }))
    .unwrap()
}

fn link_strategy() -> Strategy {
    strategy(json!({
        "strategy_id": 7,
        "configs": {
            "config_type": "link_table",
            "data_source": {"link_table": {"uid": "lt_login", "version": 1}},
            "select": [
                {"rt_id": "login_log", "raw_name": "username", "display_name": "username"},
                {"rt_id": "users", "raw_name": "dept", "display_name": "dept"}
            ],
            "where": {
                "connector": "or",
                "conditions": [
                    {"condition": {
                        "field": {"rt_id": "login_log", "raw_name": "result", "display_name": "result"},
                        "operator": "neq",
                        "filter": "success"
                    }},
                    {"condition": {
                        "field": {"rt_id": "users", "raw_name": "dept", "display_name": "dept"},
                        "operator": "include",
                        "filters": ["ops", "sec"]
                    }}
                ]
            }
        }
    }))
}

#[test]
fn test_single_table_strategy() {
    let store = InMemoryLinkTableStore::new();
    let output = compile_strategy(&login_strategy(), &store, &CompileOptions::default()).unwrap();

    assert_snapshot!(
        output.inner_sql,
        @r#"SELECT "users"."id" "user_id","users"."name" "user_name" FROM "users" "users" WHERE "users"."age"=18 AND "users"."system_id" IN ('bk_iam')"#
    );
    assert_snapshot!(
        output.sql,
        @r#"SELECT JSON_OBJECT('user_id',"sub_table"."user_id",'user_name',"sub_table"."user_name") "event_data",42 "strategy_id","sub_table"."user_id" "raw_event_id",'admin' "operator" FROM (SELECT "users"."id" "user_id","users"."name" "user_name" FROM "users" "users" WHERE "users"."age"=18 AND "users"."system_id" IN ('bk_iam')) "sub_table""#
    );
    assert_eq!(output.dialect, Dialect::BkBase);
}

#[test]
fn test_link_table_strategy() {
    let store = InMemoryLinkTableStore::new().with(login_link_table());
    let output = compile_strategy(&link_strategy(), &store, &CompileOptions::default()).unwrap();

    assert_snapshot!(
        output.inner_sql,
        @r#"SELECT "login_log"."username" "username","users"."dept" "dept" FROM "login_log" "login_log" LEFT JOIN "users" "users" ON "login_log"."username"="users"."name" WHERE ("login_log"."result"<>'success' OR "users"."dept" IN ('ops','sec')) AND "login_log"."system_id" IN ('bk_iam')"#
    );
    assert!(output.sql.starts_with(
        r#"SELECT JSON_OBJECT('username',"sub_table"."username",'dept',"sub_table"."dept") "event_data",7 "strategy_id" FROM ("#
    ));
    assert!(output.sql.ends_with(r#") "sub_table""#));
}

#[test]
fn test_link_table_not_found() {
    let store = InMemoryLinkTableStore::new();
    let err = compile_strategy(&link_strategy(), &store, &CompileOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        CompileError::Lowering(LoweringError::LinkTable(LinkTableError::NotFound {
            version: 1,
            ..
        }))
    ));
}

#[test]
fn test_link_table_without_links() {
    let mut empty = login_link_table();
    empty.config.links.clear();
    let store = InMemoryLinkTableStore::new().with(empty);
    let err = compile_strategy(&link_strategy(), &store, &CompileOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        CompileError::Lowering(LoweringError::LinkTable(LinkTableError::NoLinks { .. }))
    ));
}

#[test]
fn test_unknown_source_field() {
    let mut strategy = login_strategy();
    strategy.event_basic_field_configs[0]
        .map_config
        .as_mut()
        .unwrap()
        .source_field = Some("missing".to_string());

    let err = compile_strategy(
        &strategy,
        &InMemoryLinkTableStore::new(),
        &CompileOptions::default(),
    )
    .unwrap_err();

    match err {
        CompileError::UnknownSourceField {
            field_name,
            source_field,
        } => {
            assert_eq!(field_name, "raw_event_id");
            assert_eq!(source_field, "missing");
        }
        other => panic!("expected UnknownSourceField, got {:?}", other),
    }
}

#[test]
fn test_postgres_output() {
    let options = CompileOptions::default().with_dialect(Dialect::Postgres);
    let output = compile_strategy(&login_strategy(), &InMemoryLinkTableStore::new(), &options)
        .unwrap();

    assert_eq!(
        output.sql,
        concat!(
            r#"SELECT JSON_BUILD_OBJECT('user_id',"sub_table"."user_id",'user_name',"sub_table"."user_name") AS "event_data","#,
            r#"42 AS "strategy_id","sub_table"."user_id" AS "raw_event_id",'admin' AS "operator" "#,
            r#"FROM (SELECT "users"."id" AS "user_id","users"."name" AS "user_name" FROM "users" AS "users" "#,
            r#"WHERE "users"."age"=18 AND "users"."system_id" IN ('bk_iam')) AS "sub_table""#
        )
    );
}

#[test]
fn test_mysql_output() {
    let options = CompileOptions::default().with_dialect(Dialect::MySql);
    let output = compile_strategy(&login_strategy(), &InMemoryLinkTableStore::new(), &options)
        .unwrap();

    assert!(output.sql.starts_with("SELECT JSON_OBJECT('user_id',`sub_table`.`user_id`"));
    assert!(output.sql.contains("FROM `users` AS `users`"));
    assert!(output.sql.ends_with(") AS `sub_table`"));
}

#[test]
fn test_custom_output_names() {
    let options = CompileOptions::default()
        .with_output(OutputSettings {
            subquery_alias: "t".to_string(),
            payload_column: "payload".to_string(),
            strategy_id_column: "sid".to_string(),
        })
        .with_scoping_column("bk_system");
    let output = compile_strategy(&login_strategy(), &InMemoryLinkTableStore::new(), &options)
        .unwrap();

    assert!(output.sql.starts_with(
        r#"SELECT JSON_OBJECT('user_id',"t"."user_id",'user_name',"t"."user_name") "payload",42 "sid""#
    ));
    assert!(output.sql.contains(r#""users"."bk_system" IN ('bk_iam')"#));
    assert!(output.sql.ends_with(r#") "t""#));
}

#[test]
fn test_compile_from_json() {
    let json = serde_json::to_string(&json!({
        "strategy_id": 1,
        "configs": {
            "config_type": "single_table",
            "data_source": {"rt_id": "orders"},
            "select": [
                {"rt_id": "orders", "raw_name": "status", "display_name": "status"},
                {"rt_id": "orders", "raw_name": "id", "display_name": "n", "aggregate": "COUNT"}
            ],
            "pagination": {"limit": 10, "offset": 20}
        }
    }))
    .unwrap();

    let output =
        compile_strategy_json(&json, &InMemoryLinkTableStore::new(), &CompileOptions::default())
            .unwrap();
    assert_eq!(
        output.inner_sql,
        concat!(
            r#"SELECT "orders"."status" "status",COUNT("orders"."id") "n" FROM "orders" "orders" "#,
            r#"GROUP BY "orders"."status" LIMIT 10 OFFSET 20"#
        )
    );
}

#[test]
fn test_invalid_json() {
    let err = compile_strategy_json(
        r#"{"strategy_id": "x"}"#,
        &InMemoryLinkTableStore::new(),
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::InvalidJson(_)));
}

#[test]
fn test_compile_config_without_wrapping() {
    let users = Table::new("users");
    let config = QueryConfig {
        select_fields: vec![Field::new(users.clone(), "id", "user_id")],
        from_table: Some(users),
        ..Default::default()
    };

    let output = compile_config(&config, &CompileOptions::default()).unwrap();
    assert_eq!(output.sql, r#"SELECT "users"."id" "user_id" FROM "users" "users""#);
}

#[test]
fn test_compilation_is_deterministic() {
    let store = InMemoryLinkTableStore::new().with(login_link_table());
    let options = CompileOptions::default();

    let first = compile_strategy(&link_strategy(), &store, &options).unwrap();
    let second = compile_strategy(&link_strategy(), &store, &options).unwrap();
    assert_eq!(first.sql, second.sql);
    assert_eq!(first.query, second.query);
}

#[test]
fn test_pagination_beyond_i64_is_rendered_verbatim() {
    let json = serde_json::to_string(&json!({
        "strategy_id": 1,
        "configs": {
            "config_type": "single_table",
            "data_source": {"rt_id": "orders"},
            "select": [{"rt_id": "orders", "raw_name": "id", "display_name": "id"}],
            "pagination": {"limit": u64::MAX, "offset": 9223372036854775808u64}
        }
    }))
    .unwrap();

    let output =
        compile_strategy_json(&json, &InMemoryLinkTableStore::new(), &CompileOptions::default())
            .unwrap();
    assert!(output
        .inner_sql
        .ends_with("LIMIT 18446744073709551615 OFFSET 9223372036854775808"));
    assert!(!output.inner_sql.contains('-'));
}
