//! SQL code generation: the last pipeline stage, turning an analysed
//! [`crate::semantic::ExpressionResult`] into executable text.
//!
//! Mirrors the original's `SQLWriter`/`SQLGenerator` split: [`writer`] owns
//! the output buffer and the handful of lexical concerns (identifier/string
//! quoting, stable `IU -> v<n>` aliasing), while [`generator`] walks the
//! algebra tree and decides what to write.

pub mod dialect;
pub mod generator;
pub mod writer;

pub use dialect::Dialect;
pub use generator::generate;
pub use writer::Writer;
