//! Command-line entry point (feature `cli`): reads one or more `.sane`
//! files, concatenates them, compiles the result, and prints SQL to stdout.
//!
//! Modelled on the teacher's simplest binary shape (`prql-compiler`'s
//! `main.rs`): `clap` derive for argument parsing, `anyhow` for top-level
//! error formatting, `env_logger` for `RUST_LOG`-controlled diagnostics.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::schema::Schema;
use crate::sql::Dialect;

/// Compile one or more saneql source files to SQL.
#[derive(Debug, Parser)]
#[command(name = "saneql", version, about)]
pub struct Cli {
    /// Source files to compile, concatenated in order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target SQL dialect.
    #[arg(long, env = "SANEQL_DIALECT", default_value = "postgres")]
    pub dialect: Dialect,
}

impl Cli {
    /// Reads and concatenates the source files, compiles, and prints the
    /// result. Returns the process exit code directly (0 or 1) rather than
    /// an `anyhow::Result`, so the `error: <message>` line on stderr matches
    /// spec.md §6's contract exactly instead of `anyhow`'s own `Error:
    /// ...` formatting.
    pub fn run(self) -> i32 {
        let mut source = String::new();
        for path in &self.files {
            let contents = match fs::read_to_string(&path)
                .with_context(|| format!("failed to read `{}`", path.display()))
            {
                Ok(contents) => contents,
                Err(err) => {
                    eprintln!("error: {err}");
                    return 1;
                }
            };
            source.push_str(&contents);
            source.push('\n');
        }

        // No user-declared schemas yet (spec.md's Non-goals): every query
        // compiles against the fixed TPC-H catalog.
        let schema = Schema::tpch();
        match crate::driver::compile(&source, &schema, self.dialect) {
            Ok(sql) => {
                println!("{sql}");
                0
            }
            Err(err) => {
                eprintln!("error: {err}");
                1
            }
        }
    }
}

impl clap::ValueEnum for Dialect {
    fn value_variants<'a>() -> &'a [Self] {
        &[Dialect::Postgres, Dialect::SQLite]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.to_string()))
    }
}
