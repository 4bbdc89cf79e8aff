//! Name resolution scaffolding: the binding environment threaded through
//! analysis of a single query, modelled on `SemanticAnalysis::BindingInfo`.

use std::collections::HashMap;

use crate::ast::Ast;
use crate::ir::Iu;
use crate::types::Type;

/// One column visible in a scope: its external name, its `Iu`, and its type.
#[derive(Debug, Clone)]
pub struct BoundColumn {
    pub name: String,
    pub iu: Iu,
    pub ty: Type,
}

/// A named set of columns — the output of a table reference or join side.
/// `ambiguous` columns resolve when qualified (`scope.col`) but not bare.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub name: Option<String>,
    pub columns: Vec<BoundColumn>,
}

/// The result of looking an unqualified column name up against the scopes
/// currently in play.
pub enum Lookup<'a> {
    Found(&'a BoundColumn),
    Ambiguous,
    NotFound,
}

/// Binding state in effect while analysing one table-level expression.
/// Mirrors `BindingInfo`: a stack of named scopes (innermost/most-recent
/// first), a lazy argument map for `let` parameter substitution, and
/// (optionally) a group-by scope that changes how bare column references are
/// resolved inside aggregate arguments.
#[derive(Debug, Default, Clone)]
pub struct BindingInfo {
    scopes: Vec<Scope>,
    /// `let` call arguments in scope, keyed by parameter name, each holding
    /// the unevaluated argument AST, the [`BindingInfo`] it should be
    /// analysed against, and the let-visibility limit in effect at the call
    /// site (lazy substitution, spec.md §4.3).
    arguments: HashMap<String, (Ast, Box<BindingInfo>, usize)>,
}

impl BindingInfo {
    pub fn empty() -> Self {
        BindingInfo::default()
    }

    /// A fresh binding scope exposing exactly the given columns, named
    /// `alias` if the source gave one (`table(x) as t` semantics: every
    /// table reference introduces its own scope name, defaulting to the
    /// table/let name).
    pub fn for_columns(alias: Option<&str>, names_and_types: Vec<(String, Iu, Type)>) -> Self {
        let columns = names_and_types
            .into_iter()
            .map(|(name, iu, ty)| BoundColumn { name, iu, ty })
            .collect();
        BindingInfo {
            scopes: vec![Scope {
                name: alias.map(|s| s.to_string()),
                columns,
            }],
            arguments: HashMap::new(),
        }
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn register_argument(&mut self, name: &str, value: Ast, caller_scope: BindingInfo, caller_limit: usize) {
        self.arguments
            .insert(name.to_string(), (value, Box::new(caller_scope), caller_limit));
    }

    pub fn lookup_argument(&self, name: &str) -> Option<&(Ast, Box<BindingInfo>, usize)> {
        self.arguments.get(name)
    }

    /// Joins two bindings (e.g. the two sides of a `join`) into one scope
    /// list; columns sharing a bare name across sides become ambiguous when
    /// looked up unqualified.
    pub fn join(left: &BindingInfo, right: &BindingInfo) -> BindingInfo {
        let mut scopes = left.scopes.clone();
        scopes.extend(right.scopes.clone());
        let mut arguments = left.arguments.clone();
        for (name, value) in &right.arguments {
            arguments.entry(name.clone()).or_insert_with(|| value.clone());
        }
        BindingInfo { scopes, arguments }
    }

    /// Resolves a bare identifier against every scope, most-recently-pushed
    /// first. Two columns of the same name in *different* scopes make the
    /// lookup ambiguous; duplicates within one scope cannot occur (a
    /// `TableScan`'s columns are unique by construction).
    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        let mut found: Option<&BoundColumn> = None;
        for scope in self.scopes.iter().rev() {
            for col in &scope.columns {
                if col.name == name {
                    if found.is_some() {
                        return Lookup::Ambiguous;
                    }
                    found = Some(col);
                }
            }
        }
        match found {
            Some(col) => Lookup::Found(col),
            None => Lookup::NotFound,
        }
    }

    /// Resolves `scope_name.column_name`, e.g. `l.l_orderkey` after `lineitem
    /// as l`. If the same scope name was introduced twice (e.g. both sides of
    /// a join named themselves `l`), the prefix itself is ambiguous even
    /// though it is qualified, per spec.md §4.2's `BindingInfo` contract.
    pub fn lookup_qualified(&self, scope_name: &str, column_name: &str) -> Lookup<'_> {
        let mut matching_scopes = self.scopes.iter().filter(|s| s.name.as_deref() == Some(scope_name));
        let first = match matching_scopes.next() {
            Some(s) => s,
            None => return Lookup::NotFound,
        };
        if matching_scopes.next().is_some() {
            return Lookup::Ambiguous;
        }
        match first.columns.iter().find(|c| c.name == column_name) {
            Some(col) => Lookup::Found(col),
            None => Lookup::NotFound,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &BoundColumn> {
        self.scopes.iter().flat_map(|s| s.columns.iter())
    }
}
