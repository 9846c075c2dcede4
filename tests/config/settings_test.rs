use std::fs;
use std::path::PathBuf;

use auditql::compile::CompileOptions;
use auditql::config::{Settings, SettingsError};
use auditql::sql::Dialect;

/// Write `content` to a fresh file under the system temp directory.
fn write_config(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("auditql_settings_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_from_file() {
    let path = write_config(
        "full.toml",
        r#"
[compile]
dialect = "postgres"

[output]
subquery_alias = "inner_q"

[scoping]
column = "bk_system_id"

[link_tables]
dir = "/var/lib/auditql/link_tables"
"#,
    );

    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(settings.compile.dialect, Dialect::Postgres);
    assert_eq!(settings.output.subquery_alias, "inner_q");
    // Unset keys keep their defaults
    assert_eq!(settings.output.payload_column, "event_data");
    assert_eq!(settings.scoping.column, "bk_system_id");
    assert_eq!(
        settings.link_tables.resolved_dir().unwrap(),
        Some(PathBuf::from("/var/lib/auditql/link_tables"))
    );

    let options = CompileOptions::from(&settings);
    assert_eq!(options.dialect, Dialect::Postgres);
    assert_eq!(options.output.subquery_alias, "inner_q");
    assert_eq!(options.scoping.column, "bk_system_id");
}

#[test]
fn test_empty_file_is_default() {
    let path = write_config("empty.toml", "");
    assert_eq!(Settings::from_file(&path).unwrap(), Settings::default());
}

#[test]
fn test_missing_file() {
    let err = Settings::from_file("/nonexistent/auditql.toml").unwrap_err();
    assert!(matches!(err, SettingsError::FileNotFound(_)));
}

#[test]
fn test_invalid_names_are_rejected() {
    let path = write_config("blank.toml", "[scoping]\ncolumn = \"  \"\n");
    let err = Settings::from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidConfig(ref msg) if msg.contains("scoping.column")));
}

#[test]
fn test_link_table_dir_expands_env_vars() {
    std::env::set_var("AUDITQL_TEST_LINK_HOME", "/srv/audit");
    let path = write_config("env.toml", "[link_tables]\ndir = \"${AUDITQL_TEST_LINK_HOME}/lt\"\n");

    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(
        settings.link_tables.resolved_dir().unwrap(),
        Some(PathBuf::from("/srv/audit/lt"))
    );
}
