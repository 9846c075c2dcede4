//! End-to-end tests of query assembly from a hand-built `QueryConfig`.

use auditql::model::{
    Aggregate, Condition, Field, FieldType, JoinSpec, JoinType, LinkField, Operator, OrderBy,
    Pagination, QueryConfig, Scalar, SortOrder, Table, WhereCondition,
};
use auditql::planner::{generate, PlanError, SqlGenerator};
use auditql::sql::Dialect;

fn users() -> Table {
    Table::new("users")
}

fn orders() -> Table {
    Table::new("orders")
}

fn field(table: Table, raw: &str, display: &str) -> Field {
    Field::new(table, raw, display)
}

fn render(config: &QueryConfig) -> String {
    generate(config).unwrap().to_sql(Dialect::BkBase)
}

/// `users` with id and name selected.
fn users_config() -> QueryConfig {
    QueryConfig {
        select_fields: vec![
            field(users(), "id", "user_id").with_type(FieldType::Int),
            field(users(), "name", "user_name"),
        ],
        from_table: Some(users()),
        ..Default::default()
    }
}

fn users_orders_join(join_type: JoinType) -> JoinSpec {
    JoinSpec {
        join_type,
        left: users(),
        right: orders(),
        link_fields: vec![LinkField::new("id", "user_id")],
    }
}

#[test]
fn test_simple_select() {
    assert_eq!(
        render(&users_config()),
        r#"SELECT "users"."id" "user_id","users"."name" "user_name" FROM "users" "users""#
    );
}

#[test]
fn test_inner_join() {
    let mut config = users_config();
    config
        .select_fields
        .push(field(orders(), "order_id", "order_id"));
    config.join_tables.push(users_orders_join(JoinType::Inner));

    assert_eq!(
        render(&config),
        concat!(
            r#"SELECT "users"."id" "user_id","users"."name" "user_name","orders"."order_id" "order_id" "#,
            r#"FROM "users" "users" JOIN "orders" "orders" ON "users"."id"="orders"."user_id""#
        )
    );
}

#[test]
fn test_inner_and_left_join() {
    let products = Table::new("products");
    let mut config = users_config();
    config.select_fields.push(field(products.clone(), "title", "title"));
    config.join_tables = vec![
        users_orders_join(JoinType::Inner),
        JoinSpec {
            join_type: JoinType::Left,
            left: orders(),
            right: products,
            link_fields: vec![LinkField::new("product_id", "id")],
        },
    ];

    let sql = render(&config);
    assert!(sql.contains(
        r#"FROM "users" "users" JOIN "orders" "orders" ON "users"."id"="orders"."user_id" LEFT JOIN "products" "products" ON "orders"."product_id"="products"."id""#
    ));
}

#[test]
fn test_three_way_join_with_aliases() {
    // Same physical table joined twice under different aliases
    let manager = Table::new("users").with_alias("manager");
    let mut config = users_config();
    config.select_fields.push(field(manager.clone(), "name", "manager_name"));
    config.join_tables = vec![
        users_orders_join(JoinType::Inner),
        JoinSpec {
            join_type: JoinType::Left,
            left: users(),
            right: manager,
            link_fields: vec![LinkField::new("manager_id", "id")],
        },
    ];

    let sql = render(&config);
    assert!(sql.contains(r#""manager"."name" "manager_name""#));
    assert!(sql.contains(
        r#"LEFT JOIN "users" "manager" ON "users"."manager_id"="manager"."id""#
    ));
}

#[test]
fn test_join_with_several_link_fields() {
    let mut config = users_config();
    config.join_tables.push(JoinSpec {
        join_type: JoinType::Inner,
        left: users(),
        right: orders(),
        link_fields: vec![
            LinkField::new("id", "user_id"),
            LinkField::new("region", "region"),
        ],
    });

    assert!(render(&config).contains(
        r#"ON "users"."id"="orders"."user_id" AND "users"."region"="orders"."region""#
    ));
}

#[test]
fn test_first_join_left_is_authoritative() {
    let mut config = users_config();
    config.from_table = Some(orders());
    config.join_tables.push(users_orders_join(JoinType::Inner));

    assert!(render(&config).contains(r#"FROM "users" "users" JOIN "orders" "orders""#));
}

#[test]
fn test_where_and() {
    let mut config = users_config();
    config.where_condition = Some(WhereCondition::and(vec![
        Condition::scalar(field(users(), "age", "age"), Operator::Eq, 18i64).into(),
        Condition::scalar(field(users(), "country", "country"), Operator::Eq, "Ireland").into(),
    ]));

    assert!(render(&config).ends_with(
        r#"FROM "users" "users" WHERE "users"."age"=18 AND "users"."country"='Ireland'"#
    ));
}

#[test]
fn test_where_nested_or() {
    let name = || field(users(), "name", "name");
    let mut config = users_config();
    config.where_condition = Some(WhereCondition::and(vec![
        WhereCondition::or(vec![
            Condition::scalar(name(), Operator::Neq, "David").into(),
            Condition::scalar(name(), Operator::Eq, "Jack").into(),
        ]),
        Condition::scalar(field(users(), "country", "country"), Operator::Reg, "^Ire").into(),
    ]));

    assert!(render(&config).ends_with(
        r#"WHERE ("users"."name"<>'David' OR "users"."name"='Jack') AND "users"."country" REGEX '^Ire'"#
    ));
}

#[test]
fn test_where_include_list() {
    let mut config = users_config();
    config.where_condition = Some(
        Condition::list(
            field(users(), "country", "country"),
            Operator::Include,
            vec![Scalar::from("Ireland"), Scalar::from("France")],
        )
        .into(),
    );

    assert!(render(&config).ends_with(r#"WHERE "users"."country" IN ('Ireland','France')"#));
}

#[test]
fn test_empty_group_has_no_where() {
    let mut config = users_config();
    config.where_condition = Some(WhereCondition::and(vec![]));

    assert!(!render(&config).contains("WHERE"));
}

#[test]
fn test_order_by() {
    let mut config = users_config();
    config.order_by = vec![
        OrderBy {
            field: field(users(), "age", "age"),
            order: SortOrder::Asc,
        },
        OrderBy {
            field: field(users(), "name", "user_name"),
            order: SortOrder::Desc,
        },
    ];

    assert!(render(&config).ends_with(r#"ORDER BY "users"."age" ASC,"users"."name" DESC"#));
}

#[test]
fn test_count_with_explicit_group_by() {
    let config = QueryConfig {
        select_fields: vec![
            field(users(), "country", "country"),
            field(users(), "id", "user_count").with_aggregate(Aggregate::Count),
        ],
        from_table: Some(users()),
        group_by: vec![field(users(), "country", "country")],
        ..Default::default()
    };

    assert_eq!(
        render(&config),
        concat!(
            r#"SELECT "users"."country" "country",COUNT("users"."id") "user_count" "#,
            r#"FROM "users" "users" GROUP BY "users"."country""#
        )
    );
}

#[test]
fn test_auto_group_by() {
    let config = QueryConfig {
        select_fields: vec![
            field(orders(), "id", "order_id"),
            field(orders(), "amount", "amount_sum").with_aggregate(Aggregate::Sum),
        ],
        from_table: Some(orders()),
        ..Default::default()
    };

    assert_eq!(
        render(&config),
        concat!(
            r#"SELECT "orders"."id" "order_id",SUM("orders"."amount") "amount_sum" "#,
            r#"FROM "orders" "orders" GROUP BY "orders"."id""#
        )
    );
}

#[test]
fn test_auto_group_by_keeps_select_order() {
    let config = QueryConfig {
        select_fields: vec![
            field(orders(), "status", "status"),
            field(orders(), "amount", "max_amount").with_aggregate(Aggregate::Max),
            field(orders(), "region", "region"),
            field(orders(), "id", "orders").with_aggregate(Aggregate::Count),
        ],
        from_table: Some(orders()),
        ..Default::default()
    };

    let sql = render(&config);
    assert!(sql.contains(r#"MAX("orders"."amount") "max_amount""#));
    assert!(sql.contains(r#"COUNT("orders"."id") "orders""#));
    assert!(sql.ends_with(r#"GROUP BY "orders"."status","orders"."region""#));
}

#[test]
fn test_no_aggregate_no_group_by() {
    assert!(!render(&users_config()).contains("GROUP BY"));
}

#[test]
fn test_every_aggregate() {
    let cases = [
        (Aggregate::Count, "COUNT"),
        (Aggregate::Sum, "SUM"),
        (Aggregate::Max, "MAX"),
        (Aggregate::Min, "MIN"),
        (Aggregate::Avg, "AVG"),
    ];
    for (aggregate, function) in cases {
        let config = QueryConfig {
            select_fields: vec![field(orders(), "amount", "value").with_aggregate(aggregate)],
            from_table: Some(orders()),
            ..Default::default()
        };
        assert_eq!(
            render(&config),
            format!(r#"SELECT {}("orders"."amount") "value" FROM "orders" "orders""#, function)
        );
    }
}

#[test]
fn test_limit_offset() {
    let mut config = users_config();
    config.pagination = Some(Pagination {
        limit: Some(10),
        offset: Some(20),
    });
    assert!(render(&config).ends_with(r#"FROM "users" "users" LIMIT 10 OFFSET 20"#));
}

#[test]
fn test_limit_without_offset() {
    let mut config = users_config();
    config.pagination = Some(Pagination {
        limit: Some(10),
        offset: None,
    });
    let sql = render(&config);
    assert!(sql.ends_with("LIMIT 10"));
    assert!(!sql.contains("OFFSET"));
}

#[test]
fn test_offset_without_limit() {
    let mut config = users_config();
    config.pagination = Some(Pagination {
        limit: None,
        offset: Some(5),
    });
    let sql = render(&config);
    assert!(sql.ends_with("OFFSET 5"));
    assert!(!sql.contains("LIMIT"));
}

#[test]
fn test_zero_pagination_is_omitted() {
    let mut config = users_config();
    config.pagination = Some(Pagination {
        limit: Some(0),
        offset: Some(0),
    });
    assert_eq!(render(&config), render(&users_config()));
}

#[test]
fn test_missing_from_or_join() {
    let config = QueryConfig {
        select_fields: vec![field(users(), "id", "user_id")],
        ..Default::default()
    };
    assert_eq!(generate(&config).unwrap_err(), PlanError::MissingFromOrJoin);
}

#[test]
fn test_unregistered_table_in_select() {
    let mut config = users_config();
    config
        .select_fields
        .push(field(Table::new("payments"), "amount", "amount"));

    assert_eq!(
        generate(&config).unwrap_err(),
        PlanError::UnregisteredTable("payments".to_string())
    );
}

#[test]
fn test_unregistered_table_in_where() {
    let mut config = users_config();
    config.where_condition = Some(
        Condition::scalar(field(Table::new("audit"), "id", "id"), Operator::Eq, 1i64).into(),
    );

    assert_eq!(
        generate(&config).unwrap_err(),
        PlanError::UnregisteredTable("audit".to_string())
    );
}

#[test]
fn test_unregistered_table_in_order_by() {
    let mut config = users_config();
    config.order_by.push(OrderBy {
        field: field(Table::new("payments"), "paid_at", "paid_at"),
        order: SortOrder::Desc,
    });

    assert_eq!(
        generate(&config).unwrap_err(),
        PlanError::UnregisteredTable("payments".to_string())
    );
}

#[test]
fn test_unregistered_table_in_group_by() {
    let mut config = users_config();
    config
        .group_by
        .push(field(Table::new("payments"), "currency", "currency"));

    assert_eq!(
        generate(&config).unwrap_err(),
        PlanError::UnregisteredTable("payments".to_string())
    );
}

#[test]
fn test_non_finite_float_filter() {
    let mut config = users_config();
    config.where_condition = Some(
        Condition::scalar(field(users(), "score", "score"), Operator::Eq, f64::NEG_INFINITY)
            .into(),
    );

    assert_eq!(
        generate(&config).unwrap_err(),
        PlanError::NonFiniteFloat("-inf".to_string())
    );
}

#[test]
fn test_unregistered_alias_names_the_alias() {
    let mut config = users_config();
    config
        .select_fields
        .push(field(Table::new("users").with_alias("u2"), "id", "other_id"));

    assert_eq!(
        generate(&config).unwrap_err(),
        PlanError::UnregisteredTable("u2".to_string())
    );
}

#[test]
fn test_list_filter_for_scalar_operator() {
    let mut config = users_config();
    config.where_condition = Some(
        Condition::list(
            field(users(), "age", "age"),
            Operator::Eq,
            vec![Scalar::Int(1), Scalar::Int(2)],
        )
        .into(),
    );

    assert_eq!(
        generate(&config).unwrap_err(),
        PlanError::ListFilterForScalarOperator(Operator::Eq)
    );
}

#[test]
fn test_generation_is_deterministic() {
    let mut config = users_config();
    config.where_condition = Some(WhereCondition::or(vec![
        Condition::scalar(field(users(), "age", "age"), Operator::Eq, 18i64).into(),
        Condition::scalar(field(users(), "age", "age"), Operator::Eq, 21i64).into(),
    ]));

    let generator = SqlGenerator::new(&config);
    let first = generator.generate().unwrap().to_sql(Dialect::BkBase);
    let second = generator.generate().unwrap().to_sql(Dialect::BkBase);
    assert_eq!(first, second);
    assert_eq!(first, render(&config));
}

#[test]
fn test_postgres_output() {
    let mut config = users_config();
    config.where_condition = Some(
        Condition::scalar(field(users(), "name", "name"), Operator::Nreg, "^bot").into(),
    );

    let sql = generate(&config).unwrap().to_sql(Dialect::Postgres);
    assert_eq!(
        sql,
        concat!(
            r#"SELECT "users"."id" AS "user_id","users"."name" AS "user_name" "#,
            r#"FROM "users" AS "users" WHERE "users"."name" !~ '^bot'"#
        )
    );
}
