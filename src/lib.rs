//! saneql: a small relational query language that compiles to SQL.
//!
//! The pipeline mirrors a textbook compiler: [`lexer`] and [`parser`] turn
//! source text into an [`ast::Query`]; [`semantic`] binds names against a
//! [`schema::Schema`], checks types, and builds the typed [`ir`] algebra
//! tree; [`sql`] prints that tree as SQL for a target [`sql::Dialect`].
//! [`driver::compile`] runs all three stages in order.

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod driver;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod semantic;
pub mod sql;
pub mod types;

pub use driver::compile;
pub use error::{Error, Result};
pub use sql::Dialect;
