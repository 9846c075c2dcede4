//! BKBase SQL dialect.
//!
//! The query language of the BlueKing data platform, and the reference
//! rendering for compiled audit rules:
//! - ANSI identifier quoting (`"`)
//! - Aliases follow the expression directly, without `AS`
//! - `REGEX` / `NOT REGEX` predicates
//! - `JSON_OBJECT(key, value, ...)` for payload construction

use super::helpers;
use super::SqlDialect;

/// BKBase SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct BkBase;

impl SqlDialect for BkBase {
    fn name(&self) -> &'static str {
        "bkbase"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn emit_alias_keyword(&self) -> bool {
        false
    }

    // Uses default regex_operator (REGEX / NOT REGEX)
    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)
}
