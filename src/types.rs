//! The value type system: a small tagged union with a nullability flag,
//! independent of where a value came from (column, constant, computation).
//!
//! Mirrors `Type` in `saneql`'s `infra/Schema.hpp`: comparisons are always
//! value comparisons (types are `Copy`), and nullability rides alongside the
//! tag rather than being folded into it, so `withNullable` is cheap.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub kind: TypeKind,
    pub nullable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Bool,
    Integer,
    Decimal { precision: u8, scale: u8 },
    Char { length: u32 },
    Varchar { length: u32 },
    Text,
    Date,
    Interval,
    /// The type of `NULL` before it has been reconciled against a sibling
    /// expression's type; coerces to anything (spec.md §4.2 implicit casts,
    /// rule 5).
    Unknown,
}

impl Type {
    fn of(kind: TypeKind) -> Self {
        Type {
            kind,
            nullable: false,
        }
    }

    pub fn bool() -> Self {
        Type::of(TypeKind::Bool)
    }
    pub fn integer() -> Self {
        Type::of(TypeKind::Integer)
    }
    pub fn decimal(precision: u8, scale: u8) -> Self {
        Type::of(TypeKind::Decimal { precision, scale })
    }
    pub fn char(length: u32) -> Self {
        Type::of(TypeKind::Char { length })
    }
    pub fn varchar(length: u32) -> Self {
        Type::of(TypeKind::Varchar { length })
    }
    pub fn text() -> Self {
        Type::of(TypeKind::Text)
    }
    pub fn date() -> Self {
        Type::of(TypeKind::Date)
    }
    pub fn interval() -> Self {
        Type::of(TypeKind::Interval)
    }
    pub fn unknown() -> Self {
        Type::of(TypeKind::Unknown)
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, TypeKind::Integer | TypeKind::Decimal { .. })
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Char { .. } | TypeKind::Varchar { .. } | TypeKind::Text
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, TypeKind::Unknown)
    }

    /// Same tag and parameters, ignoring nullability.
    pub fn same_kind(&self, other: &Type) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::Bool => write!(f, "bool"),
            TypeKind::Integer => write!(f, "integer"),
            TypeKind::Decimal { precision, scale } => {
                write!(f, "decimal({precision},{scale})")
            }
            TypeKind::Char { length } => write!(f, "char({length})"),
            TypeKind::Varchar { length } => write!(f, "varchar({length})"),
            TypeKind::Text => write!(f, "text"),
            TypeKind::Date => write!(f, "date"),
            TypeKind::Interval => write!(f, "interval"),
            TypeKind::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_sql_canonical_names() {
        assert_eq!(Type::integer().to_string(), "integer");
        assert_eq!(Type::decimal(10, 2).to_string(), "decimal(10,2)");
        assert_eq!(Type::text().to_string(), "text");
    }

    #[test]
    fn with_nullable_does_not_change_kind() {
        let t = Type::integer().with_nullable(true);
        assert!(t.is_nullable());
        assert!(t.same_kind(&Type::integer()));
    }
}
