//! SQL dialects the generator targets.
//!
//! Unlike a general-purpose translator this only changes a handful of
//! leaves — `Cast` to `Date`/`Interval` — so a dialect is modelled as a
//! closed enum rather than a trait object per dialect; `gen_expr` branches on
//! it directly at the one place it matters.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, WithErrorInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    SQLite,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::SQLite),
            other => Err(Error::simple(format!("unknown SQL dialect `{other}`"))
                .push_hint("expected `postgres` or `sqlite`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WithErrorInfo as _;

    #[test]
    fn parses_known_dialects() {
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("SQLite".parse::<Dialect>().unwrap(), Dialect::SQLite);
    }

    #[test]
    fn rejects_unknown_dialect() {
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
