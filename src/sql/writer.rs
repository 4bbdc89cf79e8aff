//! The output buffer the generator writes into, mirroring `SQLWriter`: a
//! plain string sink plus a stable `IU -> v<n>` name registry so every
//! reference to the same column prints the same alias, however many times
//! the generator revisits it.

use std::collections::HashMap;

use crate::ir::Iu;
use crate::sql::Dialect;
use crate::types::{Type, TypeKind};

pub struct Writer {
    buf: String,
    iu_names: HashMap<Iu, String>,
    dialect: Dialect,
}

impl Writer {
    pub fn new(dialect: Dialect) -> Self {
        Writer {
            buf: String::new(),
            iu_names: HashMap::new(),
            dialect,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn write(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// Writes the stable alias for `iu`, assigning `v<n>` the first time this
    /// IU is seen (`n` counts from 1, in first-use order).
    pub fn write_iu(&mut self, iu: Iu) {
        let next = self.iu_names.len() + 1;
        let name = self.iu_names.entry(iu).or_insert_with(|| format!("v{next}"));
        self.buf.push_str(name);
    }

    /// Double-quotes an identifier, doubling any embedded `"`.
    pub fn write_identifier(&mut self, identifier: &str) {
        self.buf.push('"');
        for ch in identifier.chars() {
            if ch == '"' {
                self.buf.push('"');
            }
            self.buf.push(ch);
        }
        self.buf.push('"');
    }

    /// Single-quotes a string literal, doubling any embedded `'`.
    pub fn write_string(&mut self, value: &str) {
        self.buf.push('\'');
        for ch in value.chars() {
            if ch == '\'' {
                self.buf.push('\'');
            }
            self.buf.push(ch);
        }
        self.buf.push('\'');
    }

    /// Writes the canonical SQL name of `ty`, ignoring nullability (SQL
    /// nullability is a column/constraint property, not part of a cast
    /// target's type name).
    pub fn write_type(&mut self, ty: &Type) {
        let rendered = match ty.kind {
            TypeKind::Bool => "boolean".to_string(),
            TypeKind::Integer => "integer".to_string(),
            TypeKind::Decimal { precision, scale } => format!("decimal({precision},{scale})"),
            TypeKind::Char { length } => format!("char({length})"),
            TypeKind::Varchar { length } => format!("varchar({length})"),
            TypeKind::Text => "text".to_string(),
            TypeKind::Date => "date".to_string(),
            TypeKind::Interval => "interval".to_string(),
            TypeKind::Unknown => "text".to_string(),
        };
        self.buf.push_str(&rendered);
    }

    pub fn into_result(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iu_aliases_are_stable_and_sequential() {
        let mut w = Writer::new(Dialect::Postgres);
        let a = Iu(5);
        let b = Iu(9);
        w.write_iu(a);
        w.write(",");
        w.write_iu(b);
        w.write(",");
        w.write_iu(a);
        assert_eq!(w.into_result(), "v1,v2,v1");
    }

    #[test]
    fn identifier_escapes_quotes() {
        let mut w = Writer::new(Dialect::Postgres);
        w.write_identifier(r#"weird"name"#);
        assert_eq!(w.into_result(), r#""weird""name""#);
    }

    #[test]
    fn string_escapes_quotes() {
        let mut w = Writer::new(Dialect::Postgres);
        w.write_string("it's");
        assert_eq!(w.into_result(), "'it''s'");
    }
}
