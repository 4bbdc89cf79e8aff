//! Top-level entry point: source text in, SQL text out.
//!
//! The three pipeline stages ([`crate::parser`], [`crate::semantic`],
//! [`crate::sql`]) each have their own internal structure; this module just
//! wires them together in order, the way `prqlc`'s top-level `compile`
//! function chains its own stages.

use log::debug;

use crate::error::Result;
use crate::schema::Schema;
use crate::sql::Dialect;

/// Compiles one saneql query to SQL text against `schema`, targeting
/// `dialect`.
pub fn compile(source: &str, schema: &Schema, dialect: Dialect) -> Result<String> {
    let query = crate::parser::parse(source)?;
    debug!("parsed {} let binding(s)", query.lets.len());
    let result = crate::semantic::analyze_query(&query, schema)?;
    debug!("analysed query as a {}", result.describe());
    let sql = crate::sql::generate(&result, dialect);
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_scalar_query() {
        let schema = Schema::empty();
        let sql = compile("1 + 2", &schema, Dialect::Postgres).unwrap();
        assert_eq!(sql, "select (cast(1 as integer)) + (cast(2 as integer))");
    }

    #[test]
    fn compiles_a_table_query() {
        let schema = Schema::tpch();
        let sql = compile("region", &schema, Dialect::Postgres).unwrap();
        assert!(sql.starts_with("select v1 as r_regionkey"));
        assert!(sql.contains(r#"from "region""#));
    }

    #[test]
    fn reports_parse_errors() {
        let schema = Schema::empty();
        assert!(compile("1 +", &schema, Dialect::Postgres).is_err());
    }

    #[test]
    fn reports_name_resolution_errors() {
        let schema = Schema::empty();
        assert!(compile("no_such_table", &schema, Dialect::Postgres).is_err());
    }
}
