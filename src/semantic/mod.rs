//! Name resolution, type checking and algebra construction: turns a parsed
//! [`crate::ast::Query`] plus a [`crate::schema::Schema`] into an
//! [`analyzer::ExpressionResult`] ready for [`crate::sql`] to print.

pub mod analyzer;
pub mod functions;
pub mod scope;

pub use analyzer::{analyze_query, ExpressionResult, ScalarResult, TableResult};
