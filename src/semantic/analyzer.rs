//! Turns a schema-free [`crate::ast::Query`] into a typed algebra tree bound
//! to schema columns. Mirrors `SemanticAnalysis::analyzeQuery` and its family
//! of `analyze*` helpers: one function per AST shape, each returning an
//! [`ExpressionResult`].

use std::collections::HashMap;

use crate::ast::{self, Ast, AstKind, FuncArg, Literal, Query};
use crate::error::{Error, Reason, Result, Span, WithErrorInfo};
use crate::ir::{
    AggregateOp, BinaryOp as IrBinaryOp, ComparisonMode, ConstValue, Expr, ExprKind, ExtractPart, GroupByAggregate,
    GroupByKey, Iu, IuGen, JoinType, MapComputation, Operator, SetOp, SortKey, TableColumn, UnaryOp as IrUnaryOp,
    WindowAggregate, WindowOp,
};
use crate::schema::Schema;
use crate::semantic::functions::{self, BuiltinId};
use crate::semantic::scope::{BindingInfo, Lookup, Scope};
use crate::types::{Type, TypeKind};

/// Maximum depth of let-call expansion, a defensive recursion guard — not a
/// cycle check (cycles are already excluded structurally by the strictly
/// decreasing visibility limit) but a bound on how deep legitimate nesting
/// may go before we prefer a clean error to a stack overflow.
const MAX_LET_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderingInfo {
    pub descending: bool,
    pub explicit: bool,
}

impl OrderingInfo {
    pub fn default_order() -> Self {
        OrderingInfo {
            descending: false,
            explicit: false,
        }
    }

    pub fn mark_ascending(&mut self) {
        self.descending = false;
        self.explicit = true;
    }

    pub fn mark_descending(&mut self) {
        self.descending = true;
        self.explicit = true;
    }
}

pub struct ScalarResult {
    pub expr: Expr,
    pub ordering: OrderingInfo,
}

pub struct TableResult {
    pub op: Operator,
    pub binding: BindingInfo,
}

pub enum ExpressionResult {
    Scalar(ScalarResult),
    Table(TableResult),
}

impl ExpressionResult {
    pub fn describe(&self) -> &'static str {
        match self {
            ExpressionResult::Scalar(_) => "a scalar expression",
            ExpressionResult::Table(_) => "a table",
        }
    }
}

struct LetDef {
    signature: Option<ast::Signature>,
    body: Ast,
}

pub fn analyze_query(query: &Query, schema: &Schema) -> Result<ExpressionResult> {
    let mut az = Analyzer {
        schema,
        iu_gen: IuGen::new(),
        lets: Vec::new(),
        let_lookup: HashMap::new(),
        next_symbol: 0,
        depth: 0,
    };
    for (index, entry) in query.lets.iter().enumerate() {
        if az.let_lookup.contains_key(&entry.name) {
            return Err(Error::new(Reason::Arity {
                message: format!("`{}` is declared more than once", entry.name),
            }));
        }
        az.let_lookup.insert(entry.name.clone(), index);
        az.lets.push(LetDef {
            signature: entry.signature.clone(),
            body: (*entry.body).clone(),
        });
    }
    let limit = az.lets.len();
    az.analyze(&query.body, &BindingInfo::empty(), limit)
}

struct Analyzer<'s> {
    schema: &'s Schema,
    iu_gen: IuGen,
    lets: Vec<LetDef>,
    let_lookup: HashMap<String, usize>,
    next_symbol: u64,
    depth: usize,
}

impl<'s> Analyzer<'s> {
    fn fresh_iu(&mut self) -> Iu {
        self.iu_gen.fresh()
    }

    // ---- entry points for the two result shapes -------------------------

    fn analyze_scalar(&mut self, ast: &Ast, binding: &BindingInfo, limit: usize) -> Result<Expr> {
        match self.analyze(ast, binding, limit)? {
            ExpressionResult::Scalar(s) => Ok(s.expr),
            other => Err(shape_error(ast.span, "a scalar expression", other.describe())),
        }
    }

    fn analyze_table(&mut self, ast: &Ast, binding: &BindingInfo, limit: usize) -> Result<TableResult> {
        match self.analyze(ast, binding, limit)? {
            ExpressionResult::Table(t) => Ok(t),
            other => Err(shape_error(ast.span, "a table", other.describe())),
        }
    }

    // ---- main dispatch ----------------------------------------------------

    fn analyze(&mut self, ast: &Ast, binding: &BindingInfo, limit: usize) -> Result<ExpressionResult> {
        match &ast.kind {
            AstKind::Literal(lit) => Ok(ExpressionResult::Scalar(ScalarResult {
                expr: literal_expr(lit),
                ordering: OrderingInfo::default_order(),
            })),
            AstKind::Ident(name) => self.analyze_ident(name, ast.span, binding, limit),
            AstKind::Access(base, field) => self.analyze_access(base, field, ast.span, binding, limit),
            AstKind::Binary(op, l, r) => self.analyze_binary(*op, l, r, binding, limit),
            AstKind::Unary(op, operand) => self.analyze_unary(*op, operand, binding, limit),
            AstKind::Cast(expr, type_name) => self.analyze_cast(expr, type_name, binding, limit),
            AstKind::Call(name, args) => self.analyze_call(name, args, ast.span, binding, limit),
            AstKind::Tuple(_) => Err(Error::new(Reason::Shape {
                message: "a brace group is only valid as an argument to map, project, groupby, orderby or window"
                    .to_string(),
            })
            .with_span(Some(ast.span))),
        }
    }

    fn analyze_ident(&mut self, name: &str, span: Span, binding: &BindingInfo, limit: usize) -> Result<ExpressionResult> {
        if let Some((value, caller_binding, caller_limit)) = binding.lookup_argument(name) {
            let (value, caller_binding, caller_limit) = (value.clone(), caller_binding.clone(), *caller_limit);
            return self.analyze(&value, &caller_binding, caller_limit);
        }
        match binding.lookup(name) {
            Lookup::Found(col) => {
                return Ok(ExpressionResult::Scalar(ScalarResult {
                    expr: Expr {
                        kind: ExprKind::IuRef(col.iu),
                        ty: col.ty,
                    },
                    ordering: OrderingInfo::default_order(),
                }))
            }
            Lookup::Ambiguous => {
                return Err(Error::new(Reason::Ambiguous { name: name.to_string() }).with_span(Some(span)))
            }
            Lookup::NotFound => {}
        }
        if let Some(&index) = self.let_lookup.get(name) {
            if index < limit {
                return self.expand_let(index, &[], binding, limit, span);
            }
        }
        if let Some(table) = self.schema.lookup_table(&name.to_lowercase()) {
            return Ok(ExpressionResult::Table(self.table_scan(table, name)));
        }
        Err(Error::not_found("name", name).with_span(Some(span)))
    }

    fn analyze_access(
        &mut self,
        base: &Ast,
        field: &str,
        span: Span,
        binding: &BindingInfo,
        limit: usize,
    ) -> Result<ExpressionResult> {
        if let AstKind::Ident(scope_name) = &base.kind {
            match binding.lookup_qualified(scope_name, field) {
                Lookup::Found(col) => {
                    return Ok(ExpressionResult::Scalar(ScalarResult {
                        expr: Expr {
                            kind: ExprKind::IuRef(col.iu),
                            ty: col.ty,
                        },
                        ordering: OrderingInfo::default_order(),
                    }))
                }
                Lookup::Ambiguous => {
                    return Err(Error::new(Reason::Ambiguous {
                        name: scope_name.clone(),
                    })
                    .with_span(Some(span)))
                }
                Lookup::NotFound => {}
            }
            // Not a scope name: treat `scope_name` as a table-valued `let`
            // argument and project column `field` out of it.
            if let Some((value, caller_binding, caller_limit)) = binding.lookup_argument(scope_name) {
                let (value, caller_binding, caller_limit) = (value.clone(), caller_binding.clone(), *caller_limit);
                let table = self.analyze_table(&value, &caller_binding, caller_limit)?;
                return match table.binding.lookup(field) {
                    Lookup::Found(col) => Ok(ExpressionResult::Scalar(ScalarResult {
                        expr: Expr {
                            kind: ExprKind::IuRef(col.iu),
                            ty: col.ty,
                        },
                        ordering: OrderingInfo::default_order(),
                    })),
                    Lookup::Ambiguous => Err(Error::new(Reason::Ambiguous {
                        name: field.to_string(),
                    })
                    .with_span(Some(span))),
                    Lookup::NotFound => Err(Error::not_found("column", field).with_span(Some(span))),
                };
            }
        }
        Err(Error::not_found("column", field).with_span(Some(span)))
    }

    fn expand_let(
        &mut self,
        index: usize,
        args: &[FuncArg],
        caller_binding: &BindingInfo,
        caller_limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        self.depth += 1;
        if self.depth > MAX_LET_DEPTH {
            self.depth -= 1;
            return Err(Error::new(Reason::Arity {
                message: "let expansion exceeded the maximum nesting depth".to_string(),
            })
            .with_span(Some(span)));
        }
        let result = self.expand_let_inner(index, args, caller_binding, caller_limit, span);
        self.depth -= 1;
        result
    }

    /// Builds the callee's argument bindings and analyses its body at
    /// visibility limit `index` (strictly below its own declaration, and
    /// below every later `let`), which is what makes self-recursion and
    /// forward references structurally impossible rather than merely
    /// detected at runtime. Each argument AST is stored unevaluated together
    /// with `caller_binding`/`caller_limit` — the scope the *call site* was
    /// analysed in — so it can be re-analysed lazily, correctly, wherever
    /// the callee's body references the parameter (spec.md §4.2).
    fn expand_let_inner(
        &mut self,
        index: usize,
        args: &[FuncArg],
        caller_binding: &BindingInfo,
        caller_limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let signature = self.lets[index].signature.clone();
        let body = self.lets[index].body.clone();

        let mut callee_binding = BindingInfo::empty();
        if let Some(signature) = signature {
            let mut positional = args.iter().filter(|a| a.name.is_none());
            for param in &signature.params {
                let supplied = args
                    .iter()
                    .find(|a| a.name.as_deref() == Some(param.name.as_str()))
                    .map(|a| a.value.clone())
                    .or_else(|| positional.next().map(|a| a.value.clone()));
                let value = match supplied {
                    Some(v) => v,
                    None => match &param.default {
                        // Defaults are written in the callee's own defining
                        // scope (spec.md §9: "default arguments are
                        // re-analysed in the scope of the let that declares
                        // them"), not the call site's.
                        Some(default) => {
                            callee_binding.register_argument(&param.name, default.clone(), BindingInfo::empty(), index);
                            continue;
                        }
                        None => {
                            return Err(Error::new(Reason::Arity {
                                message: format!("missing argument `{}`", param.name),
                            })
                            .with_span(Some(span)))
                        }
                    },
                };
                callee_binding.register_argument(&param.name, value, caller_binding.clone(), caller_limit);
            }
        } else if !args.is_empty() {
            return Err(Error::new(Reason::Arity {
                message: "this let takes no arguments".to_string(),
            })
            .with_span(Some(span)));
        }

        self.analyze(&body, &callee_binding, index)
    }

    fn table_scan(&mut self, table: &crate::schema::Table, alias: &str) -> TableResult {
        let columns: Vec<TableColumn> = table
            .columns
            .iter()
            .map(|c| TableColumn {
                name: c.name.clone(),
                iu: self.fresh_iu(),
                ty: c.ty,
            })
            .collect();
        let named: Vec<(String, Iu, Type)> = columns
            .iter()
            .map(|c| (c.name.clone(), c.iu, c.ty))
            .collect();
        let op = Operator::TableScan {
            name: table.name.clone(),
            columns,
        };
        let binding = BindingInfo::for_columns(Some(alias), named);
        TableResult { op, binding }
    }

    // ---- scalar operators -------------------------------------------------

    fn analyze_binary(
        &mut self,
        op: ast::BinaryOp,
        l: &Ast,
        r: &Ast,
        binding: &BindingInfo,
        limit: usize,
    ) -> Result<ExpressionResult> {
        use ast::BinaryOp::*;
        let left = self.analyze_scalar(l, binding, limit)?;
        let right = self.analyze_scalar(r, binding, limit)?;
        let span = Span::new(l.span.start, r.span.end);

        let expr = match op {
            Add | Sub | Mul | Div | Mod | Pow => self.analyze_arithmetic(op, left, right, span)?,
            Concat => {
                let (left, right, ty) = unify_textual(left, right, span)?;
                Expr {
                    kind: ExprKind::Binary {
                        op: IrBinaryOp::Concat,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ty,
                }
            }
            And | Or => {
                let left = require_bool(left, span)?;
                let right = require_bool(right, span)?;
                let nullable = left.ty.is_nullable() || right.ty.is_nullable();
                Expr {
                    kind: ExprKind::Binary {
                        op: if op == And { IrBinaryOp::And } else { IrBinaryOp::Or },
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ty: Type::bool().with_nullable(nullable),
                }
            }
            Eq | Ne | Is | IsNot | Lt | Le | Gt | Ge => {
                let (left, right, _) = unify(left, right, span)?;
                let mode = match op {
                    Eq => ComparisonMode::Equal,
                    Ne => ComparisonMode::NotEqual,
                    Is => ComparisonMode::Is,
                    IsNot => ComparisonMode::IsNot,
                    Lt => ComparisonMode::Less,
                    Le => ComparisonMode::LessOrEqual,
                    Gt => ComparisonMode::Greater,
                    Ge => ComparisonMode::GreaterOrEqual,
                    _ => unreachable!(),
                };
                let nullable = !matches!(mode, ComparisonMode::Is | ComparisonMode::IsNot)
                    && (left.ty.is_nullable() || right.ty.is_nullable());
                Expr {
                    kind: ExprKind::Comparison {
                        mode,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ty: Type::bool().with_nullable(nullable),
                }
            }
            Like => {
                let (left, right, _) = unify_textual(left, right, span)?;
                let nullable = left.ty.is_nullable() || right.ty.is_nullable();
                Expr {
                    kind: ExprKind::Comparison {
                        mode: ComparisonMode::Like,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ty: Type::bool().with_nullable(nullable),
                }
            }
        };
        Ok(ExpressionResult::Scalar(ScalarResult {
            expr,
            ordering: OrderingInfo::default_order(),
        }))
    }

    fn analyze_arithmetic(&mut self, op: ast::BinaryOp, left: Expr, right: Expr, span: Span) -> Result<Expr> {
        use ast::BinaryOp::*;
        // Date +/- Interval -> Date; Date - Date -> Interval (spec.md §4.2 rule 4).
        if matches!(op, Add | Sub) {
            if let (TypeKind::Date, TypeKind::Interval) = (left.ty.kind, right.ty.kind) {
                let nullable = left.ty.is_nullable() || right.ty.is_nullable();
                return Ok(Expr {
                    kind: ExprKind::Binary {
                        op: ir_arith_op(op),
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ty: Type::date().with_nullable(nullable),
                });
            }
            if op == Sub {
                if let (TypeKind::Date, TypeKind::Date) = (left.ty.kind, right.ty.kind) {
                    let nullable = left.ty.is_nullable() || right.ty.is_nullable();
                    return Ok(Expr {
                        kind: ExprKind::Binary {
                            op: IrBinaryOp::Minus,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        ty: Type::interval().with_nullable(nullable),
                    });
                }
            }
        }
        let (left, right, ty) = unify_numeric(left, right, span)?;
        Ok(Expr {
            kind: ExprKind::Binary {
                op: ir_arith_op(op),
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        })
    }

    fn analyze_unary(
        &mut self,
        op: ast::UnaryOp,
        operand: &Ast,
        binding: &BindingInfo,
        limit: usize,
    ) -> Result<ExpressionResult> {
        let inner = self.analyze_scalar(operand, binding, limit)?;
        let (ir_op, ty) = match op {
            ast::UnaryOp::Plus => {
                if !inner.ty.is_numeric() && !inner.ty.is_unknown() {
                    return Err(type_error(operand.span, format!("unary `+` needs a numeric operand, found {}", inner.ty)));
                }
                (IrUnaryOp::Plus, inner.ty)
            }
            ast::UnaryOp::Minus => {
                if !inner.ty.is_numeric() && !inner.ty.is_unknown() {
                    return Err(type_error(operand.span, format!("unary `-` needs a numeric operand, found {}", inner.ty)));
                }
                (IrUnaryOp::Minus, inner.ty)
            }
            ast::UnaryOp::Not => {
                let inner = require_bool(inner, operand.span)?;
                let ty = inner.ty;
                return Ok(ExpressionResult::Scalar(ScalarResult {
                    expr: Expr {
                        kind: ExprKind::Unary {
                            op: IrUnaryOp::Not,
                            operand: Box::new(inner),
                        },
                        ty,
                    },
                    ordering: OrderingInfo::default_order(),
                }));
            }
        };
        Ok(ExpressionResult::Scalar(ScalarResult {
            expr: Expr {
                kind: ExprKind::Unary {
                    op: ir_op,
                    operand: Box::new(inner),
                },
                ty,
            },
            ordering: OrderingInfo::default_order(),
        }))
    }

    fn analyze_cast(
        &mut self,
        expr: &Ast,
        type_name: &ast::TypeName,
        binding: &BindingInfo,
        limit: usize,
    ) -> Result<ExpressionResult> {
        let inner = self.analyze_scalar(expr, binding, limit)?;
        let target = resolve_type_name(type_name, expr.span)?;
        let nullable = inner.ty.is_nullable();
        Ok(ExpressionResult::Scalar(ScalarResult {
            expr: Expr {
                kind: ExprKind::Cast(Box::new(inner)),
                ty: target.with_nullable(nullable),
            },
            ordering: OrderingInfo::default_order(),
        }))
    }

    // ---- call dispatch ------------------------------------------------

    fn analyze_call(
        &mut self,
        name: &str,
        args: &[FuncArg],
        span: Span,
        binding: &BindingInfo,
        limit: usize,
    ) -> Result<ExpressionResult> {
        if let Some(&index) = self.let_lookup.get(name) {
            if index < limit {
                return self.expand_let(index, args, binding, limit, span);
            }
        }

        let id = functions::lookup(name).ok_or_else(|| Error::not_found("function", name).with_span(Some(span)))?;
        use BuiltinId::*;
        match id {
            Table => self.builtin_table(args, span),
            As => self.builtin_as(args, binding, limit, span),
            Filter => self.builtin_filter(args, binding, limit, span),
            Map => self.builtin_map(args, binding, limit, span, false),
            Project => self.builtin_map(args, binding, limit, span, true),
            Join => self.builtin_join(args, binding, limit, span),
            GroupBy => self.builtin_groupby(args, binding, limit, span),
            Aggregate => self.builtin_aggregate(args, binding, limit, span),
            OrderBy => self.builtin_orderby(args, binding, limit, span),
            Window => self.builtin_window(args, binding, limit, span),
            Union | UnionAll | Except | ExceptAll | Intersect | IntersectAll => {
                self.builtin_set_op(id, args, binding, limit, span)
            }
            Distinct => self.builtin_distinct(args, binding, limit, span),
            Extract => self.builtin_extract(args, binding, limit, span),
            Substr => self.builtin_substr(args, binding, limit, span),
            Case => self.builtin_case(args, binding, limit, span),
            Coalesce => self.builtin_coalesce(args, binding, limit, span),
            Between => self.builtin_between(args, binding, limit, span),
            In => self.builtin_in(args, binding, limit, span),
            GenSym => Ok(ExpressionResult::Scalar(ScalarResult {
                expr: Expr {
                    kind: ExprKind::Const(ConstValue::String(self.gensym())),
                    ty: Type::text(),
                },
                ordering: OrderingInfo::default_order(),
            })),
            Count | CountDistinct | Sum | SumDistinct | Avg | AvgDistinct | Min | Max => Err(Error::new(
                Reason::AggregationScope {
                    message: format!("`{name}` is only legal inside groupby, aggregate, or window"),
                },
            )
            .with_span(Some(span))),
            RowNumber => Err(Error::new(Reason::AggregationScope {
                message: "`rownumber` is only legal inside window".to_string(),
            })
            .with_span(Some(span))),
        }
    }

    fn gensym(&mut self) -> String {
        self.next_symbol += 1;
        format!("_g{}", self.next_symbol)
    }

    fn builtin_table(&mut self, args: &[FuncArg], span: Span) -> Result<ExpressionResult> {
        let name_ast = arg_at(args, 0, "table", span)?;
        let name = symbol_argument(name_ast)?;
        let table = self
            .schema
            .lookup_table(&name.to_lowercase())
            .ok_or_else(|| Error::not_found("table", &name).with_span(Some(span)))?;
        Ok(ExpressionResult::Table(self.table_scan(table, &name)))
    }

    fn builtin_as(&mut self, args: &[FuncArg], binding: &BindingInfo, limit: usize, span: Span) -> Result<ExpressionResult> {
        let base = arg_at(args, 0, "as", span)?;
        let alias_ast = arg_at(args, 1, "as", span)?;
        let table = self.analyze_table(base, binding, limit)?;
        let alias = symbol_argument(alias_ast)?;
        let renamed = BindingInfo::for_columns(
            Some(&alias),
            table
                .binding
                .columns()
                .map(|c| (c.name.clone(), c.iu, c.ty))
                .collect(),
        );
        Ok(ExpressionResult::Table(TableResult {
            op: table.op,
            binding: renamed,
        }))
    }

    fn builtin_filter(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let base = arg_at(args, 0, "filter", span)?;
        let predicate_ast = arg_at(args, 1, "filter", span)?;
        let table = self.analyze_table(base, binding, limit)?;
        let condition = self.analyze_scalar(predicate_ast, &table.binding, limit)?;
        let condition = require_bool(condition, predicate_ast.span)?;
        Ok(ExpressionResult::Table(TableResult {
            binding: table.binding.clone(),
            op: Operator::Select {
                input: Box::new(table.op),
                condition,
            },
        }))
    }

    fn builtin_map(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
        project: bool,
    ) -> Result<ExpressionResult> {
        let base = arg_at(args, 0, if project { "project" } else { "map" }, span)?;
        let entries_ast = arg_at(args, 1, if project { "project" } else { "map" }, span)?;
        let table = self.analyze_table(base, binding, limit)?;
        let entries = tuple_entries(entries_ast)?;

        let mut computations = Vec::with_capacity(entries.len());
        let mut new_columns = Vec::with_capacity(entries.len());
        for entry in entries {
            let value = self.analyze_scalar(&entry.value, &table.binding, limit)?;
            let name = entry
                .name
                .clone()
                .or_else(|| infer_name(&entry.value))
                .ok_or_else(|| {
                    Error::new(Reason::Shape {
                        message: "could not infer a column name for this expression; write `name: expr`".to_string(),
                    })
                    .with_span(Some(entry.value.span))
                })?;
            let iu = self.fresh_iu();
            new_columns.push((name, iu, value.ty));
            computations.push(MapComputation { output: iu, value });
        }

        let binding = if project {
            BindingInfo::for_columns(None, new_columns)
        } else {
            let mut result = table.binding.clone();
            result.push_scope(Scope {
                name: None,
                columns: new_columns
                    .into_iter()
                    .map(|(name, iu, ty)| crate::semantic::scope::BoundColumn { name, iu, ty })
                    .collect(),
            });
            result
        };

        Ok(ExpressionResult::Table(TableResult {
            op: Operator::Map {
                input: Box::new(table.op),
                computations,
            },
            binding,
        }))
    }

    fn builtin_join(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let left_ast = arg_at(args, 0, "join", span)?;
        let right_ast = arg_at(args, 1, "join", span)?;
        let on_ast = args.iter().find(|a| a.name.as_deref() == Some("on")).map(|a| &a.value).or_else(|| {
            args.iter()
                .filter(|a| a.name.is_none())
                .nth(2)
                .map(|a| &a.value)
        });
        let join_type = match args.iter().find(|a| a.name.as_deref() == Some("type")) {
            Some(a) => parse_join_type(&symbol_argument(&a.value)?, a.value.span)?,
            None => JoinType::Inner,
        };

        let left = self.analyze_table(left_ast, binding, limit)?;
        let right = self.analyze_table(right_ast, binding, limit)?;
        let joined_binding = BindingInfo::join(&left.binding, &right.binding);

        let condition = match on_ast {
            Some(ast) => Some(require_bool(self.analyze_scalar(ast, &joined_binding, limit)?, ast.span)?),
            None => None,
        };

        let output_binding = match join_type {
            JoinType::LeftSemi | JoinType::LeftAnti => left.binding.clone(),
            JoinType::RightSemi | JoinType::RightAnti => right.binding.clone(),
            _ => joined_binding,
        };

        Ok(ExpressionResult::Table(TableResult {
            op: Operator::Join {
                left: Box::new(left.op),
                right: Box::new(right.op),
                condition,
                join_type,
            },
            binding: output_binding,
        }))
    }

    fn builtin_groupby(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let base = arg_at(args, 0, "groupby", span)?;
        let keys_ast = arg_at(args, 1, "groupby", span)?;
        let aggs_ast = args.iter().filter(|a| a.name.is_none()).nth(2).map(|a| &a.value);

        let table = self.analyze_table(base, binding, limit)?;
        let key_entries = tuple_entries(keys_ast)?;

        let mut group_by = Vec::with_capacity(key_entries.len());
        let mut output_columns = Vec::new();
        for entry in key_entries {
            let value = self.analyze_scalar(&entry.value, &table.binding, limit)?;
            let name = entry.name.clone().or_else(|| infer_name(&entry.value)).ok_or_else(|| {
                Error::new(Reason::Shape {
                    message: "could not infer a column name for this group-by key; write `name: expr`".to_string(),
                })
                .with_span(Some(entry.value.span))
            })?;
            let iu = self.fresh_iu();
            output_columns.push((name, iu, value.ty));
            group_by.push(GroupByKey { output: iu, value });
        }

        let aggregates = match aggs_ast {
            Some(ast) => self.analyze_aggregate_list(ast, &table.binding, limit, &mut output_columns)?,
            None => Vec::new(),
        };

        let binding = BindingInfo::for_columns(None, output_columns);

        Ok(ExpressionResult::Table(TableResult {
            op: Operator::GroupBy {
                input: Box::new(table.op),
                group_by,
                aggregates,
            },
            binding,
        }))
    }

    /// Parses a `{name: aggFn(arg?), ...}` tuple shared by `groupby` and
    /// `aggregate`, appending the resulting output columns to `output_columns`.
    fn analyze_aggregate_list(
        &mut self,
        aggs_ast: &Ast,
        input_binding: &BindingInfo,
        limit: usize,
        output_columns: &mut Vec<(String, Iu, Type)>,
    ) -> Result<Vec<GroupByAggregate>> {
        let entries = tuple_entries(aggs_ast)?;
        let mut aggregates = Vec::with_capacity(entries.len());
        for entry in entries {
            let (op, argument) = self.analyze_aggregate_fn(&entry.value, input_binding, limit)?;
            let name = entry.name.clone().or_else(|| infer_name(&entry.value)).ok_or_else(|| {
                Error::new(Reason::Shape {
                    message: "could not infer a column name for this aggregate; write `name: expr`".to_string(),
                })
                .with_span(Some(entry.value.span))
            })?;
            let ty = aggregate_result_type(op, argument.as_ref());
            let iu = self.fresh_iu();
            output_columns.push((name, iu, ty));
            aggregates.push(GroupByAggregate {
                output: iu,
                op,
                argument,
            });
        }
        Ok(aggregates)
    }

    fn analyze_aggregate_fn(
        &mut self,
        ast: &Ast,
        input_binding: &BindingInfo,
        limit: usize,
    ) -> Result<(AggregateOp, Option<Expr>)> {
        let (name, call_args) = match &ast.kind {
            AstKind::Call(name, args) => (name.as_str(), args.as_slice()),
            _ => {
                return Err(Error::new(Reason::AggregationScope {
                    message: "expected an aggregate function (count, sum, avg, min, max, or a *_distinct variant)"
                        .to_string(),
                })
                .with_span(Some(ast.span)))
            }
        };
        let id = functions::lookup(name).filter(|id| functions::is_aggregate(*id)).ok_or_else(|| {
            Error::new(Reason::AggregationScope {
                message: format!("`{name}` is not an aggregate function"),
            })
            .with_span(Some(ast.span))
        })?;
        let argument = match call_args.first() {
            Some(arg) => Some(self.analyze_scalar(&arg.value, input_binding, limit)?),
            None => None,
        };
        let op = match (id, argument.is_some()) {
            (BuiltinId::Count, false) => AggregateOp::CountStar,
            (BuiltinId::Count, true) => AggregateOp::Count,
            (BuiltinId::CountDistinct, _) => AggregateOp::CountDistinct,
            (BuiltinId::Sum, _) => AggregateOp::Sum,
            (BuiltinId::SumDistinct, _) => AggregateOp::SumDistinct,
            (BuiltinId::Avg, _) => AggregateOp::Avg,
            (BuiltinId::AvgDistinct, _) => AggregateOp::AvgDistinct,
            (BuiltinId::Min, _) => AggregateOp::Min,
            (BuiltinId::Max, _) => AggregateOp::Max,
            _ => unreachable!("filtered by is_aggregate above"),
        };
        Ok((op, argument))
    }

    fn builtin_aggregate(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let base = arg_at(args, 0, "aggregate", span)?;
        let aggs_ast = arg_at(args, 1, "aggregate", span)?;
        let table = self.analyze_table(base, binding, limit)?;

        let mut output_columns = Vec::new();
        let aggregates = self.analyze_aggregate_list(aggs_ast, &table.binding, limit, &mut output_columns)?;
        if aggregates.len() != 1 {
            return Err(Error::new(Reason::Shape {
                message: "aggregate() with multiple aggregations needs a trailing computation; only a single aggregation entry is supported".to_string(),
            })
            .with_span(Some(span)));
        }
        let (_, iu, ty) = output_columns[0].clone();

        let group_by_op = Operator::GroupBy {
            input: Box::new(table.op),
            group_by: Vec::new(),
            aggregates,
        };

        Ok(ExpressionResult::Scalar(ScalarResult {
            expr: Expr {
                kind: ExprKind::Aggregate {
                    input: Box::new(group_by_op),
                    computation: Box::new(Expr {
                        kind: ExprKind::IuRef(iu),
                        ty,
                    }),
                },
                ty,
            },
            ordering: OrderingInfo::default_order(),
        }))
    }

    fn builtin_orderby(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let base = arg_at(args, 0, "orderby", span)?;
        let keys_ast = arg_at(args, 1, "orderby", span)?;
        let table = self.analyze_table(base, binding, limit)?;
        let order = self.analyze_sort_keys(keys_ast, &table.binding, limit)?;
        let limit_value = optional_named_limit(args, "limit")?;
        let offset_value = optional_named_limit(args, "offset")?;
        Ok(ExpressionResult::Table(TableResult {
            binding: table.binding.clone(),
            op: Operator::Sort {
                input: Box::new(table.op),
                order,
                limit: limit_value,
                offset: offset_value,
            },
        }))
    }

    fn analyze_sort_keys(&mut self, ast: &Ast, binding: &BindingInfo, limit: usize) -> Result<Vec<SortKey>> {
        let entries = tuple_entries(ast)?;
        let mut keys = Vec::with_capacity(entries.len());
        for entry in entries {
            let (value_ast, descending) = match &entry.value.kind {
                AstKind::Call(name, a) if name == "desc" && a.len() == 1 => (&a[0].value, true),
                AstKind::Call(name, a) if name == "asc" && a.len() == 1 => (&a[0].value, false),
                _ => (&entry.value, false),
            };
            let value = self.analyze_scalar(value_ast, binding, limit)?;
            keys.push(SortKey {
                value,
                descending,
                collate: None,
            });
        }
        Ok(keys)
    }

    fn builtin_window(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let base = arg_at(args, 0, "window", span)?;
        let aggs_ast = arg_at(args, 1, "window", span)?;
        let table = self.analyze_table(base, binding, limit)?;

        let partition_by = match args.iter().find(|a| a.name.as_deref() == Some("partition")) {
            Some(a) => tuple_entries(&a.value)?
                .iter()
                .map(|e| self.analyze_scalar(&e.value, &table.binding, limit))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        let order_by = match args.iter().find(|a| a.name.as_deref() == Some("order")) {
            Some(a) => self.analyze_sort_keys(&a.value, &table.binding, limit)?,
            None => Vec::new(),
        };

        let entries = tuple_entries(aggs_ast)?;
        let mut new_columns = Vec::with_capacity(entries.len());
        let mut aggregates = Vec::with_capacity(entries.len());
        for entry in entries {
            let op = match &entry.value.kind {
                AstKind::Call(name, _) if name == "rownumber" => WindowOp::RowNumber,
                AstKind::Call(name, call_args) => {
                    let id = functions::lookup(name).filter(|id| functions::is_aggregate(*id)).ok_or_else(|| {
                        Error::new(Reason::AggregationScope {
                            message: format!("`{name}` is not valid inside a window aggregate list"),
                        })
                        .with_span(Some(entry.value.span))
                    })?;
                    let argument = match call_args.first() {
                        Some(a) => Some(self.analyze_scalar(&a.value, &table.binding, limit)?),
                        None => None,
                    };
                    let agg_op = match (id, argument.is_some()) {
                        (BuiltinId::Count, false) => AggregateOp::CountStar,
                        (BuiltinId::Count, true) => AggregateOp::Count,
                        (BuiltinId::CountDistinct, _) => AggregateOp::CountDistinct,
                        (BuiltinId::Sum, _) => AggregateOp::Sum,
                        (BuiltinId::SumDistinct, _) => AggregateOp::SumDistinct,
                        (BuiltinId::Avg, _) => AggregateOp::Avg,
                        (BuiltinId::AvgDistinct, _) => AggregateOp::AvgDistinct,
                        (BuiltinId::Min, _) => AggregateOp::Min,
                        (BuiltinId::Max, _) => AggregateOp::Max,
                        _ => unreachable!(),
                    };
                    WindowOp::Aggregate { op: agg_op, argument }
                }
                _ => {
                    return Err(Error::new(Reason::AggregationScope {
                        message: "expected `rownumber()` or an aggregate function".to_string(),
                    })
                    .with_span(Some(entry.value.span)))
                }
            };
            let ty = match &op {
                WindowOp::RowNumber => Type::integer(),
                WindowOp::Aggregate { op, argument } => aggregate_result_type(*op, argument.as_ref()),
            };
            let name = entry.name.clone().or_else(|| infer_name(&entry.value)).ok_or_else(|| {
                Error::new(Reason::Shape {
                    message: "could not infer a column name for this window aggregate; write `name: expr`".to_string(),
                })
                .with_span(Some(entry.value.span))
            })?;
            let iu = self.fresh_iu();
            new_columns.push((name, iu, ty));
            aggregates.push(WindowAggregate { output: iu, op });
        }

        let mut result_binding = table.binding.clone();
        result_binding.push_scope(Scope {
            name: None,
            columns: new_columns
                .into_iter()
                .map(|(name, iu, ty)| crate::semantic::scope::BoundColumn { name, iu, ty })
                .collect(),
        });

        Ok(ExpressionResult::Table(TableResult {
            op: Operator::Window {
                input: Box::new(table.op),
                aggregates,
                partition_by,
                order_by,
            },
            binding: result_binding,
        }))
    }

    fn builtin_set_op(
        &mut self,
        id: BuiltinId,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let left_ast = arg_at(args, 0, "set operation", span)?;
        let right_ast = arg_at(args, 1, "set operation", span)?;
        let left = self.analyze_table(left_ast, binding, limit)?;
        let right = self.analyze_table(right_ast, binding, limit)?;

        let left_cols: Vec<_> = left.binding.columns().cloned().collect();
        let right_cols: Vec<_> = right.binding.columns().cloned().collect();
        if left_cols.len() != right_cols.len() {
            return Err(Error::new(Reason::Arity {
                message: format!(
                    "set operation column count mismatch: left has {}, right has {}",
                    left_cols.len(),
                    right_cols.len()
                ),
            })
            .with_span(Some(span)));
        }

        let mut result_columns = Vec::with_capacity(left_cols.len());
        let mut output_named = Vec::with_capacity(left_cols.len());
        for (l, r) in left_cols.iter().zip(right_cols.iter()) {
            if !compatible(l.ty, r.ty) {
                return Err(type_error(
                    span,
                    format!("set operation columns `{}`/`{}` have incompatible types {} and {}", l.name, r.name, l.ty, r.ty),
                ));
            }
            let iu = self.fresh_iu();
            result_columns.push(iu);
            output_named.push((l.name.clone(), iu, l.ty));
        }

        let op = match id {
            BuiltinId::Union => SetOp::Union,
            BuiltinId::UnionAll => SetOp::UnionAll,
            BuiltinId::Except => SetOp::Except,
            BuiltinId::ExceptAll => SetOp::ExceptAll,
            BuiltinId::Intersect => SetOp::Intersect,
            BuiltinId::IntersectAll => SetOp::IntersectAll,
            _ => unreachable!(),
        };

        let binding = BindingInfo::for_columns(None, output_named);

        Ok(ExpressionResult::Table(TableResult {
            op: Operator::SetOperation {
                left_columns: left_cols.iter().map(|c| c.iu).collect(),
                right_columns: right_cols.iter().map(|c| c.iu).collect(),
                result_columns,
                left: Box::new(left.op),
                right: Box::new(right.op),
                op,
            },
            binding,
        }))
    }

    fn builtin_distinct(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let base = arg_at(args, 0, "distinct", span)?;
        let table = self.analyze_table(base, binding, limit)?;
        let cols: Vec<_> = table.binding.columns().cloned().collect();
        let mut group_by = Vec::with_capacity(cols.len());
        let mut output_named = Vec::with_capacity(cols.len());
        for col in cols {
            let iu = self.fresh_iu();
            output_named.push((col.name.clone(), iu, col.ty));
            group_by.push(GroupByKey {
                output: iu,
                value: Expr {
                    kind: ExprKind::IuRef(col.iu),
                    ty: col.ty,
                },
            });
        }
        let binding = BindingInfo::for_columns(None, output_named);
        Ok(ExpressionResult::Table(TableResult {
            op: Operator::GroupBy {
                input: Box::new(table.op),
                group_by,
                aggregates: Vec::new(),
            },
            binding,
        }))
    }

    // ---- scalar builtins ------------------------------------------------

    fn builtin_extract(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let part_ast = arg_at(args, 0, "extract", span)?;
        let value_ast = arg_at(args, 1, "extract", span)?;
        let part = match &part_ast.kind {
            AstKind::Ident(name) => match name.to_lowercase().as_str() {
                "year" => ExtractPart::Year,
                "month" => ExtractPart::Month,
                "day" => ExtractPart::Day,
                other => {
                    return Err(Error::new(Reason::Shape {
                        message: format!("unknown extract part `{other}`; expected year, month or day"),
                    })
                    .with_span(Some(part_ast.span)))
                }
            },
            _ => {
                return Err(Error::new(Reason::Shape {
                    message: "extract's first argument must be a bare symbol (year, month, day)".to_string(),
                })
                .with_span(Some(part_ast.span)))
            }
        };
        let value = self.analyze_scalar(value_ast, binding, limit)?;
        let nullable = value.ty.is_nullable();
        Ok(ExpressionResult::Scalar(ScalarResult {
            expr: Expr {
                kind: ExprKind::Extract {
                    part,
                    value: Box::new(value),
                },
                ty: Type::integer().with_nullable(nullable),
            },
            ordering: OrderingInfo::default_order(),
        }))
    }

    fn builtin_substr(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let value_ast = arg_at(args, 0, "substr", span)?;
        let value = self.analyze_scalar(value_ast, binding, limit)?;
        let from = match args.iter().find(|a| a.name.as_deref() == Some("from")).or_else(|| args.get(1).filter(|a| a.name.is_none())) {
            Some(a) => self.analyze_scalar(&a.value, binding, limit)?,
            None => {
                return Err(Error::new(Reason::Arity {
                    message: "substr requires a `from` argument".to_string(),
                })
                .with_span(Some(span)))
            }
        };
        let len = match args.iter().find(|a| a.name.as_deref() == Some("len")).or_else(|| args.get(2).filter(|a| a.name.is_none())) {
            Some(a) => Some(Box::new(self.analyze_scalar(&a.value, binding, limit)?)),
            None => None,
        };
        let mut nullable = value.ty.is_nullable() || from.ty.is_nullable();
        if let Some(l) = &len {
            nullable |= l.ty.is_nullable();
        }
        let ty = value.ty.with_nullable(nullable);
        Ok(ExpressionResult::Scalar(ScalarResult {
            expr: Expr {
                kind: ExprKind::Substr {
                    value: Box::new(value),
                    from: Box::new(from),
                    len,
                },
                ty,
            },
            ordering: OrderingInfo::default_order(),
        }))
    }

    fn builtin_case(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        if args.len() < 2 {
            return Err(Error::new(Reason::Arity {
                message: "case requires at least a branch tuple and a default".to_string(),
            })
            .with_span(Some(span)));
        }
        // `case(scrutinee, {match: result, ...}, default)` — a simple case,
        // recognised by its second argument being a brace group. Otherwise
        // `case(cond, result, cond, result, ..., default)` — a searched
        // case, spec.md §4.2's "scrutinee absent" form; conditions are
        // arbitrary boolean expressions, which can't live in a tuple's
        // `name:` slot, so they're just alternating positional arguments.
        if args.len() >= 2 && matches!(args[1].value.kind, AstKind::Tuple(_)) {
            let scrutinee_ast = &args[0].value;
            let branches_ast = &args[1].value;
            let default_ast = arg_at(args, 2, "case", span)?;
            let scrutinee = self.analyze_scalar(scrutinee_ast, binding, limit)?;
            let default = self.analyze_scalar(default_ast, binding, limit)?;
            let entries = tuple_entries(branches_ast)?;
            let mut whens = Vec::with_capacity(entries.len());
            for entry in entries {
                let label = entry.name.as_deref().ok_or_else(|| {
                    Error::new(Reason::Shape {
                        message: "simple case branches must be written as `match: result`".to_string(),
                    })
                    .with_span(Some(entry.value.span))
                })?;
                let match_value = parse_branch_label(label);
                let result = self.analyze_scalar(&entry.value, binding, limit)?;
                whens.push((
                    Expr {
                        kind: ExprKind::Const(match_value),
                        ty: scrutinee.ty,
                    },
                    result,
                ));
            }
            let ty = default.ty;
            Ok(ExpressionResult::Scalar(ScalarResult {
                expr: Expr {
                    kind: ExprKind::SimpleCase {
                        value: Box::new(scrutinee),
                        whens,
                        otherwise: Some(Box::new(default)),
                    },
                    ty,
                },
                ordering: OrderingInfo::default_order(),
            }))
        } else {
            if args.len() < 3 || args.len() % 2 == 0 {
                return Err(Error::new(Reason::Arity {
                    message: "searched case needs pairs of (condition, result) plus a trailing default"
                        .to_string(),
                })
                .with_span(Some(span)));
            }
            let default = self.analyze_scalar(&args[args.len() - 1].value, binding, limit)?;
            let mut whens = Vec::with_capacity((args.len() - 1) / 2);
            let mut i = 0;
            while i + 1 < args.len() - 1 {
                let cond = self.analyze_scalar(&args[i].value, binding, limit)?;
                let cond = require_bool(cond, args[i].value.span)?;
                let result = self.analyze_scalar(&args[i + 1].value, binding, limit)?;
                whens.push((cond, result));
                i += 2;
            }
            let ty = default.ty;
            Ok(ExpressionResult::Scalar(ScalarResult {
                expr: Expr {
                    kind: ExprKind::SearchedCase {
                        whens,
                        otherwise: Some(Box::new(default)),
                    },
                    ty,
                },
                ordering: OrderingInfo::default_order(),
            }))
        }
    }

    fn builtin_coalesce(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        if args.is_empty() {
            return Err(Error::new(Reason::Arity {
                message: "coalesce requires at least one argument".to_string(),
            })
            .with_span(Some(span)));
        }
        let exprs: Vec<Expr> = args
            .iter()
            .map(|a| self.analyze_scalar(&a.value, binding, limit))
            .collect::<Result<_>>()?;
        let ty = exprs.last().unwrap().ty;
        let (init, rest) = exprs.split_first().unwrap();
        if rest.is_empty() {
            return Ok(ExpressionResult::Scalar(ScalarResult {
                expr: init.clone(),
                ordering: OrderingInfo::default_order(),
            }));
        }
        // Desugars into a searched case: the first non-null argument wins.
        let mut whens = Vec::with_capacity(exprs.len() - 1);
        for e in &exprs[..exprs.len() - 1] {
            let is_not_null = Expr {
                kind: ExprKind::Comparison {
                    mode: ComparisonMode::IsNot,
                    left: Box::new(e.clone()),
                    right: Box::new(Expr {
                        kind: ExprKind::Const(ConstValue::Null),
                        ty: e.ty,
                    }),
                },
                ty: Type::bool(),
            };
            whens.push((is_not_null, e.clone()));
        }
        Ok(ExpressionResult::Scalar(ScalarResult {
            expr: Expr {
                kind: ExprKind::SearchedCase {
                    whens,
                    otherwise: Some(Box::new(exprs.last().unwrap().clone())),
                },
                ty,
            },
            ordering: OrderingInfo::default_order(),
        }))
    }

    fn builtin_between(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        let value = self.analyze_scalar(arg_at(args, 0, "between", span)?, binding, limit)?;
        let lower = self.analyze_scalar(arg_at(args, 1, "between", span)?, binding, limit)?;
        let upper = self.analyze_scalar(arg_at(args, 2, "between", span)?, binding, limit)?;
        let nullable = value.ty.is_nullable() || lower.ty.is_nullable() || upper.ty.is_nullable();
        Ok(ExpressionResult::Scalar(ScalarResult {
            expr: Expr {
                kind: ExprKind::Between {
                    value: Box::new(value),
                    lower: Box::new(lower),
                    upper: Box::new(upper),
                },
                ty: Type::bool().with_nullable(nullable),
            },
            ordering: OrderingInfo::default_order(),
        }))
    }

    fn builtin_in(
        &mut self,
        args: &[FuncArg],
        binding: &BindingInfo,
        limit: usize,
        span: Span,
    ) -> Result<ExpressionResult> {
        if args.len() < 2 {
            return Err(Error::new(Reason::Arity {
                message: "in requires a probe value and at least one candidate".to_string(),
            })
            .with_span(Some(span)));
        }
        let value = self.analyze_scalar(&args[0].value, binding, limit)?;
        let mut nullable = value.ty.is_nullable();
        let list = args[1..]
            .iter()
            .map(|a| {
                let e = self.analyze_scalar(&a.value, binding, limit)?;
                nullable |= e.ty.is_nullable();
                Ok(e)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ExpressionResult::Scalar(ScalarResult {
            expr: Expr {
                kind: ExprKind::In {
                    value: Box::new(value),
                    list,
                },
                ty: Type::bool().with_nullable(nullable),
            },
            ordering: OrderingInfo::default_order(),
        }))
    }
}

fn aggregate_result_type(op: AggregateOp, argument: Option<&Expr>) -> Type {
    match op {
        AggregateOp::CountStar | AggregateOp::Count | AggregateOp::CountDistinct => Type::integer(),
        AggregateOp::Sum | AggregateOp::SumDistinct | AggregateOp::Avg | AggregateOp::AvgDistinct => argument
            .map(|a| a.ty.with_nullable(true))
            .unwrap_or_else(|| Type::decimal(18, 4).with_nullable(true)),
        AggregateOp::Min | AggregateOp::Max => argument
            .map(|a| a.ty.with_nullable(true))
            .unwrap_or_else(|| Type::unknown().with_nullable(true)),
    }
}

/// A simple-case match label as written in source (the bare name on the
/// left of `match: result`) parsed back into the constant it denotes.
fn parse_branch_label(label: &str) -> ConstValue {
    if let Ok(n) = label.parse::<i64>() {
        return ConstValue::Integer(n);
    }
    match label {
        "true" => ConstValue::Bool(true),
        "false" => ConstValue::Bool(false),
        other => ConstValue::String(other.to_string()),
    }
}

fn literal_expr(lit: &Literal) -> Expr {
    match lit {
        Literal::Integer(n) => Expr {
            kind: ExprKind::Const(ConstValue::Integer(*n)),
            ty: Type::integer(),
        },
        Literal::Decimal(text) => Expr {
            kind: ExprKind::Const(ConstValue::Decimal(text.clone())),
            ty: Type::decimal(18, 4),
        },
        Literal::String(text) => Expr {
            kind: ExprKind::Const(ConstValue::String(text.clone())),
            ty: Type::text(),
        },
        Literal::Bool(b) => Expr {
            kind: ExprKind::Const(ConstValue::Bool(*b)),
            ty: Type::bool(),
        },
        Literal::Null => Expr {
            kind: ExprKind::Const(ConstValue::Null),
            ty: Type::unknown().with_nullable(true),
        },
    }
}

fn ir_arith_op(op: ast::BinaryOp) -> IrBinaryOp {
    match op {
        ast::BinaryOp::Add => IrBinaryOp::Plus,
        ast::BinaryOp::Sub => IrBinaryOp::Minus,
        ast::BinaryOp::Mul => IrBinaryOp::Mul,
        ast::BinaryOp::Div => IrBinaryOp::Div,
        ast::BinaryOp::Mod => IrBinaryOp::Mod,
        ast::BinaryOp::Pow => IrBinaryOp::Power,
        _ => unreachable!("called only for arithmetic ops"),
    }
}

fn require_bool(expr: Expr, span: Span) -> Result<Expr> {
    if expr.ty.is_unknown() {
        return Ok(Expr {
            ty: Type::bool().with_nullable(expr.ty.is_nullable()),
            ..expr
        });
    }
    if !matches!(expr.ty.kind, TypeKind::Bool) {
        return Err(Error::new(Reason::NonBool {
            found: expr.ty.to_string(),
        })
        .with_span(Some(span)));
    }
    Ok(expr)
}

/// Implicit-cast unification for two arbitrary scalar operands (spec.md
/// §4.2 rules 1/2/3/5; rule 4's Date/Interval pairing is handled by callers
/// that need operator-specific results before falling back to this).
fn unify(left: Expr, right: Expr, span: Span) -> Result<(Expr, Expr, Type)> {
    if left.ty.same_kind(&right.ty) {
        let nullable = left.ty.is_nullable() || right.ty.is_nullable();
        let ty = left.ty.with_nullable(nullable);
        return Ok((left, right, ty));
    }
    if left.ty.is_unknown() {
        let ty = right.ty.with_nullable(left.ty.is_nullable() || right.ty.is_nullable());
        return Ok((cast_to(left, ty), right, ty));
    }
    if right.ty.is_unknown() {
        let ty = left.ty.with_nullable(left.ty.is_nullable() || right.ty.is_nullable());
        return Ok((left, cast_to(right, ty), ty));
    }
    if left.ty.is_numeric() && right.ty.is_numeric() {
        return unify_numeric(left, right, span);
    }
    if left.ty.is_textual() && right.ty.is_textual() {
        return unify_textual(left, right, span);
    }
    Err(type_error(span, format!("cannot compare or combine {} and {}", left.ty, right.ty)))
}

fn unify_numeric(left: Expr, right: Expr, span: Span) -> Result<(Expr, Expr, Type)> {
    if !((left.ty.is_numeric() || left.ty.is_unknown()) && (right.ty.is_numeric() || right.ty.is_unknown())) {
        return Err(type_error(span, format!("expected numeric operands, found {} and {}", left.ty, right.ty)));
    }
    let nullable = left.ty.is_nullable() || right.ty.is_nullable();
    let ty = match (left.ty.kind, right.ty.kind) {
        (TypeKind::Integer, TypeKind::Integer) => Type::integer(),
        (TypeKind::Decimal { precision: p1, scale: s1 }, TypeKind::Decimal { precision: p2, scale: s2 }) => {
            Type::decimal(p1.max(p2), s1.max(s2))
        }
        (TypeKind::Decimal { precision, scale }, _) | (_, TypeKind::Decimal { precision, scale }) => {
            Type::decimal(precision, scale)
        }
        (TypeKind::Unknown, _) => right.ty,
        (_, TypeKind::Unknown) => left.ty,
        _ => Type::integer(),
    }
    .with_nullable(nullable);
    Ok((cast_to(left, ty), cast_to(right, ty), ty))
}

/// Unlike [`unify_numeric`], this never wraps an operand in a `Cast` node:
/// `Char`, `Varchar` and `Text` are all just strings in SQL, and the
/// original never casts between them (`Expression.cpp`'s
/// `ConstExpression::generate` has no cast path for any of the three) — a
/// `char`/`varchar` column compared against a `text` literal renders as
/// `(v2) = ('EUROPE')`, not `(cast(v2 as text)) = ('EUROPE')`. Only the
/// unified `Type` returned to the caller changes; the operands themselves
/// are passed through untouched.
fn unify_textual(left: Expr, right: Expr, span: Span) -> Result<(Expr, Expr, Type)> {
    if !((left.ty.is_textual() || left.ty.is_unknown()) && (right.ty.is_textual() || right.ty.is_unknown())) {
        return Err(type_error(span, format!("expected textual operands, found {} and {}", left.ty, right.ty)));
    }
    let nullable = left.ty.is_nullable() || right.ty.is_nullable();
    let ty = Type::text().with_nullable(nullable);
    Ok((left, right, ty))
}

fn cast_to(expr: Expr, ty: Type) -> Expr {
    if expr.ty.same_kind(&ty) {
        return Expr { ty, ..expr };
    }
    Expr {
        kind: ExprKind::Cast(Box::new(expr)),
        ty,
    }
}

fn compatible(a: Type, b: Type) -> bool {
    a.same_kind(&b) || a.is_unknown() || b.is_unknown() || (a.is_numeric() && b.is_numeric()) || (a.is_textual() && b.is_textual())
}

fn resolve_type_name(type_name: &ast::TypeName, span: Span) -> Result<Type> {
    let name = type_name.name.to_lowercase();
    let args = &type_name.args;
    Ok(match name.as_str() {
        "bool" | "boolean" => Type::bool(),
        "integer" | "int" => Type::integer(),
        "decimal" | "numeric" => {
            let precision = args.first().copied().unwrap_or(18) as u8;
            let scale = args.get(1).copied().unwrap_or(0) as u8;
            Type::decimal(precision, scale)
        }
        "char" => Type::char(args.first().copied().unwrap_or(1) as u32),
        "varchar" => Type::varchar(args.first().copied().unwrap_or(255) as u32),
        "text" => Type::text(),
        "date" => Type::date(),
        "interval" => Type::interval(),
        other => {
            return Err(Error::new(Reason::TypeMismatch {
                message: format!("unknown type `{other}`"),
            })
            .with_span(Some(span)))
        }
    })
}

fn parse_join_type(name: &str, span: Span) -> Result<JoinType> {
    Ok(match name.to_lowercase().as_str() {
        "inner" => JoinType::Inner,
        "left" | "leftouter" => JoinType::LeftOuter,
        "right" | "rightouter" => JoinType::RightOuter,
        "full" | "fullouter" => JoinType::FullOuter,
        "leftsemi" => JoinType::LeftSemi,
        "rightsemi" => JoinType::RightSemi,
        "leftanti" => JoinType::LeftAnti,
        "rightanti" => JoinType::RightAnti,
        other => {
            return Err(Error::new(Reason::Shape {
                message: format!("unknown join type `{other}`"),
            })
            .with_span(Some(span)))
        }
    })
}

fn symbol_argument(ast: &Ast) -> Result<String> {
    match &ast.kind {
        AstKind::Ident(name) => Ok(name.clone()),
        AstKind::Literal(Literal::String(s)) => Ok(s.clone()),
        _ => Err(Error::new(Reason::Shape {
            message: "expected a bare name or string literal here".to_string(),
        })
        .with_span(Some(ast.span))),
    }
}

fn infer_name(ast: &Ast) -> Option<String> {
    match &ast.kind {
        AstKind::Ident(name) => Some(name.clone()),
        AstKind::Access(_, field) => Some(field.clone()),
        _ => None,
    }
}

fn tuple_entries(ast: &Ast) -> Result<&[FuncArg]> {
    match &ast.kind {
        AstKind::Tuple(entries) => Ok(entries),
        _ => Err(Error::new(Reason::Shape {
            message: "expected a `{...}` expression list here".to_string(),
        })
        .with_span(Some(ast.span))),
    }
}

fn arg_at<'a>(args: &'a [FuncArg], index: usize, what: &str, span: Span) -> Result<&'a Ast> {
    args.iter()
        .filter(|a| a.name.is_none())
        .nth(index)
        .map(|a| &a.value)
        .ok_or_else(|| {
            Error::new(Reason::Arity {
                message: format!("{what} is missing a required argument"),
            })
            .with_span(Some(span))
        })
}

fn optional_named_limit(args: &[FuncArg], name: &str) -> Result<Option<u64>> {
    match args.iter().find(|a| a.name.as_deref() == Some(name)) {
        None => Ok(None),
        Some(a) => match &a.value.kind {
            AstKind::Literal(Literal::Integer(n)) if *n >= 0 => Ok(Some(*n as u64)),
            _ => Err(Error::new(Reason::InvalidLimit {
                message: format!("`{name}` must be a non-negative integer constant"),
            })
            .with_span(Some(a.value.span))),
        },
    }
}

fn shape_error(span: Span, expected: &str, found: &str) -> Error {
    Error::new(Reason::Shape {
        message: format!("expected {expected}, found {found}"),
    })
    .with_span(Some(span))
}

fn type_error(span: Span, message: String) -> Error {
    Error::new(Reason::TypeMismatch { message }).with_span(Some(span))
}

#[cfg(test)]
mod tests {
    use crate::driver::compile;
    use crate::error::Reason;
    use crate::schema::Schema;
    use crate::sql::Dialect;

    fn analyze_err(source: &str) -> Reason {
        match compile(source, &Schema::tpch(), Dialect::Postgres) {
            Ok(sql) => panic!("expected an error for `{source}`, got {sql}"),
            Err(e) => e.reason,
        }
    }

    #[test]
    fn unknown_table_is_not_found() {
        assert!(matches!(analyze_err("no_such_table"), Reason::NotFound { .. }));
    }

    #[test]
    fn unknown_function_is_not_found() {
        assert!(matches!(analyze_err("region.nonesuch()"), Reason::NotFound { .. }));
    }

    #[test]
    fn unqualified_ambiguous_column_after_self_join_is_rejected() {
        // A self-join exports `r_name` from both sides; referring to it
        // unqualified afterwards must fail rather than silently pick one.
        let reason = analyze_err("region.join(region, true).filter(r_name = 'EUROPE')");
        assert!(matches!(reason, Reason::Ambiguous { .. }), "{reason:?}");
    }

    #[test]
    fn duplicate_scope_name_makes_the_qualified_prefix_ambiguous() {
        // Both sides are explicitly aliased `r`, so even a qualified
        // reference `r.r_name` cannot pick a side.
        let reason = analyze_err("region.as(r).join(region.as(r), true).filter(r.r_name = 'EUROPE')");
        assert!(matches!(reason, Reason::Ambiguous { .. }), "{reason:?}");
    }

    #[test]
    fn filter_requires_a_boolean_condition() {
        assert!(matches!(analyze_err("region.filter(r_name)"), Reason::NonBool { .. }));
    }

    #[test]
    fn aggregate_function_outside_aggregation_scope_is_rejected() {
        assert!(matches!(
            analyze_err("region.map({n: count()})"),
            Reason::AggregationScope { .. }
        ));
    }

    #[test]
    fn raw_column_in_groupby_aggregate_slot_is_rejected() {
        // `r_name` is not an aggregate call, so it cannot appear in the
        // aggregates tuple even though it is a valid column in scope.
        assert!(matches!(
            analyze_err("region.groupby({r_regionkey}, {bad: r_name})"),
            Reason::AggregationScope { .. }
        ));
    }

    #[test]
    fn duplicate_let_names_are_rejected() {
        assert!(matches!(
            analyze_err("let x = 1\nlet x = 2\nx"),
            Reason::Arity { .. }
        ));
    }

    #[test]
    fn forward_reference_between_lets_is_rejected() {
        // `a` is declared before `b`, so `a`'s body may not see `b`.
        assert!(matches!(analyze_err("let a = b\nlet b = 1\na"), Reason::NotFound { .. }));
    }

    #[test]
    fn set_op_arity_mismatch_is_rejected() {
        assert!(matches!(
            analyze_err("region.project({r_name}).union(region.project({r_name, r_comment}))"),
            Reason::Arity { .. }
        ));
    }

    #[test]
    fn negative_limit_is_rejected() {
        assert!(matches!(
            analyze_err("region.orderby({r_name}, limit: -1)"),
            Reason::InvalidLimit { .. }
        ));
    }

    #[test]
    fn incompatible_comparison_types_are_rejected() {
        assert!(matches!(
            analyze_err("region.filter(r_regionkey = r_name)"),
            Reason::TypeMismatch { .. }
        ));
    }
}
