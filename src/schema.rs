//! Read-only catalogue consumed by the semantic analyser.
//!
//! The core only ever needs `lookup(name) -> Option<&Table>`; concrete
//! schemas (this module's `empty()`/`tpch()`, or a schema supplied by a host
//! database adapter) are just data.

use std::collections::HashMap;

use crate::types::Type;

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    fn new(name: &str, columns: Vec<(&str, Type)>) -> Self {
        Table {
            name: name.to_string(),
            columns: columns
                .into_iter()
                .map(|(name, ty)| Column {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: HashMap<String, Table>,
}

impl Schema {
    /// A schema with no tables. Useful for compiling purely scalar queries.
    pub fn empty() -> Self {
        Schema::default()
    }

    /// `name` must already be lowercase — callers (the analyser) are
    /// responsible for normalizing case, per the schema contract.
    pub fn lookup_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.to_lowercase(), table);
    }

    /// The canonical 8-table TPC-H schema, used by default by the CLI and by
    /// the golden-file test corpus.
    pub fn tpch() -> Self {
        let not_null = |t: Type| t;
        let nullable = |t: Type| t.with_nullable(true);
        let int = || Type::integer();
        let dec = |p, s| Type::decimal(p, s);
        let date = || Type::date();

        let mut schema = Schema::default();

        schema.insert(Table::new(
            "region",
            vec![
                ("r_regionkey", not_null(int())),
                ("r_name", not_null(Type::char(25))),
                ("r_comment", nullable(Type::varchar(152))),
            ],
        ));

        schema.insert(Table::new(
            "nation",
            vec![
                ("n_nationkey", not_null(int())),
                ("n_name", not_null(Type::char(25))),
                ("n_regionkey", not_null(int())),
                ("n_comment", nullable(Type::varchar(152))),
            ],
        ));

        schema.insert(Table::new(
            "supplier",
            vec![
                ("s_suppkey", not_null(int())),
                ("s_name", not_null(Type::char(25))),
                ("s_address", not_null(Type::varchar(40))),
                ("s_nationkey", not_null(int())),
                ("s_phone", not_null(Type::char(15))),
                ("s_acctbal", not_null(dec(15, 2))),
                ("s_comment", not_null(Type::varchar(101))),
            ],
        ));

        schema.insert(Table::new(
            "customer",
            vec![
                ("c_custkey", not_null(int())),
                ("c_name", not_null(Type::varchar(25))),
                ("c_address", not_null(Type::varchar(40))),
                ("c_nationkey", not_null(int())),
                ("c_phone", not_null(Type::char(15))),
                ("c_acctbal", not_null(dec(15, 2))),
                ("c_mktsegment", not_null(Type::char(10))),
                ("c_comment", not_null(Type::varchar(117))),
            ],
        ));

        schema.insert(Table::new(
            "part",
            vec![
                ("p_partkey", not_null(int())),
                ("p_name", not_null(Type::varchar(55))),
                ("p_mfgr", not_null(Type::char(25))),
                ("p_brand", not_null(Type::char(10))),
                ("p_type", not_null(Type::varchar(25))),
                ("p_size", not_null(int())),
                ("p_container", not_null(Type::char(10))),
                ("p_retailprice", not_null(dec(15, 2))),
                ("p_comment", not_null(Type::varchar(23))),
            ],
        ));

        schema.insert(Table::new(
            "partsupp",
            vec![
                ("ps_partkey", not_null(int())),
                ("ps_suppkey", not_null(int())),
                ("ps_availqty", not_null(int())),
                ("ps_supplycost", not_null(dec(15, 2))),
                ("ps_comment", not_null(Type::varchar(199))),
            ],
        ));

        schema.insert(Table::new(
            "orders",
            vec![
                ("o_orderkey", not_null(int())),
                ("o_custkey", not_null(int())),
                ("o_orderstatus", not_null(Type::char(1))),
                ("o_totalprice", not_null(dec(15, 2))),
                ("o_orderdate", not_null(date())),
                ("o_orderpriority", not_null(Type::char(15))),
                ("o_clerk", not_null(Type::char(15))),
                ("o_shippriority", not_null(int())),
                ("o_comment", not_null(Type::varchar(79))),
            ],
        ));

        schema.insert(Table::new(
            "lineitem",
            vec![
                ("l_orderkey", not_null(int())),
                ("l_partkey", not_null(int())),
                ("l_suppkey", not_null(int())),
                ("l_linenumber", not_null(int())),
                ("l_quantity", not_null(dec(15, 2))),
                ("l_extendedprice", not_null(dec(15, 2))),
                ("l_discount", not_null(dec(15, 2))),
                ("l_tax", not_null(dec(15, 2))),
                ("l_returnflag", not_null(Type::char(1))),
                ("l_linestatus", not_null(Type::char(1))),
                ("l_shipdate", not_null(date())),
                ("l_commitdate", not_null(date())),
                ("l_receiptdate", not_null(date())),
                ("l_shipinstruct", not_null(Type::char(25))),
                ("l_shipmode", not_null(Type::char(10))),
                ("l_comment", not_null(Type::varchar(44))),
            ],
        ));

        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tpch_has_eight_tables() {
        let schema = Schema::tpch();
        for name in [
            "region", "nation", "supplier", "customer", "part", "partsupp", "orders", "lineitem",
        ] {
            assert!(schema.lookup_table(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn lookup_is_case_insensitive_on_input_but_stored_lowercase() {
        let schema = Schema::tpch();
        assert!(schema.lookup_table("REGION").is_none());
        assert!(schema.lookup_table("region").is_some());
    }

    #[test]
    fn empty_schema_has_no_tables() {
        assert!(Schema::empty().lookup_table("region").is_none());
    }
}
