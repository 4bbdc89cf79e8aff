//! Walks an analysed query and writes the equivalent SQL text.
//!
//! Grounded on `SQLGenerator.cpp`'s one-method-per-node-kind shape: a
//! function per [`Operator`] variant and per [`ExprKind`] variant, each
//! writing its own parentheses so callers never have to guess whether a
//! child needs wrapping. `gen_operand` is the one place that decides an
//! expression is "trivial enough" to skip parens — the original wraps every
//! operand unconditionally, and so do we, matching spec.md §4.3's literal
//! templates exactly rather than a more compact but unverified rendering.

use crate::ir::{
    AggregateOp, BinaryOp, CallType, ComparisonMode, ConstValue, Expr, ExprKind, ExtractPart, GroupByAggregate,
    Iu, JoinType, Operator, SetOp, SortKey, UnaryOp, WindowOp,
};
use crate::semantic::{ExpressionResult, ScalarResult, TableResult};
use crate::semantic::scope::BindingInfo;
use crate::sql::dialect::Dialect;
use crate::sql::writer::Writer;
use crate::types::{Type, TypeKind};

/// Renders a fully analysed query to SQL text for `dialect`.
///
/// Implements spec.md §4.4's top-level "peel": a scalar result becomes a
/// bare `select <expr>`; a table result whose root operator is a `Sort`
/// folds the `order by`/`limit`/`offset` straight into the outer select
/// instead of nesting another subquery purely to re-sort it; any other
/// table result becomes `select <cols> from <op> s`.
pub fn generate(result: &ExpressionResult, dialect: Dialect) -> String {
    let mut w = Writer::new(dialect);
    match result {
        ExpressionResult::Scalar(ScalarResult { expr, .. }) => {
            w.write("select ");
            gen_expr(&mut w, expr);
        }
        ExpressionResult::Table(TableResult { op, binding }) => match op {
            Operator::Sort {
                input,
                order,
                limit,
                offset,
            } => {
                w.write("select ");
                write_projection(&mut w, binding);
                w.write(" from ");
                gen_operator(&mut w, input);
                w.write(" s");
                gen_order_limit(&mut w, order, *limit, *offset);
            }
            other => {
                w.write("select ");
                write_projection(&mut w, binding);
                w.write(" from ");
                gen_operator(&mut w, other);
                w.write(" s");
            }
        },
    }
    w.into_result()
}

/// The final `<iu> as <name>` list for a top-level result. Output aliases
/// are the user-facing column names, written bare (unlike `TableScan`'s
/// source-column references, these never need to round-trip through a real
/// catalog, so quoting them would just be noise relative to spec.md §8's
/// expected output).
fn write_projection(w: &mut Writer, binding: &BindingInfo) {
    let mut first = true;
    for col in binding.columns() {
        if !first {
            w.write(", ");
        }
        first = false;
        w.write_iu(col.iu);
        w.write(" as ");
        w.write(&col.name);
    }
}

fn gen_operator(w: &mut Writer, op: &Operator) {
    w.write("(");
    match op {
        Operator::TableScan { name, columns } => {
            w.write("select ");
            for (i, c) in columns.iter().enumerate() {
                if i > 0 {
                    w.write(", ");
                }
                w.write_identifier(&c.name);
                w.write(" as ");
                w.write_iu(c.iu);
            }
            w.write(" from ");
            w.write_identifier(name);
        }
        Operator::Select { input, condition } => {
            w.write("select * from ");
            gen_operator(w, input);
            w.write(" s where ");
            gen_expr(w, condition);
        }
        Operator::Map { input, computations } => {
            w.write("select *, ");
            for (i, c) in computations.iter().enumerate() {
                if i > 0 {
                    w.write(", ");
                }
                gen_expr(w, &c.value);
                w.write(" as ");
                w.write_iu(c.output);
            }
            w.write(" from ");
            gen_operator(w, input);
            w.write(" s");
        }
        Operator::Join {
            left,
            right,
            condition,
            join_type,
        } => gen_join(w, left, right, condition.as_ref(), *join_type),
        Operator::GroupBy {
            input,
            group_by,
            aggregates,
        } => gen_groupby_body(w, input, group_by, aggregates, true),
        Operator::Sort {
            input,
            order,
            limit,
            offset,
        } => {
            w.write("select * from ");
            gen_operator(w, input);
            w.write(" s");
            gen_order_limit(w, order, *limit, *offset);
        }
        Operator::Window {
            input,
            aggregates,
            partition_by,
            order_by,
        } => {
            w.write("select *, ");
            for (i, a) in aggregates.iter().enumerate() {
                if i > 0 {
                    w.write(", ");
                }
                match &a.op {
                    WindowOp::RowNumber => w.write("row_number()"),
                    WindowOp::Aggregate { op, argument } => gen_aggregate_call(w, *op, argument.as_ref()),
                }
                w.write(" over (");
                let has_partition = !partition_by.is_empty();
                if has_partition {
                    w.write("partition by ");
                    for (j, p) in partition_by.iter().enumerate() {
                        if j > 0 {
                            w.write(", ");
                        }
                        gen_expr(w, p);
                    }
                }
                if !order_by.is_empty() {
                    if has_partition {
                        w.write(" ");
                    }
                    w.write("order by ");
                    gen_order_keys(w, order_by);
                }
                w.write(")");
                w.write(" as ");
                w.write_iu(a.output);
            }
            w.write(" from ");
            gen_operator(w, input);
            w.write(" s");
        }
        Operator::SetOperation {
            left,
            right,
            left_columns,
            right_columns,
            result_columns,
            op,
        } => gen_set_operation(w, left, right, left_columns, right_columns, result_columns, *op),
        Operator::InlineTable {
            columns,
            values,
            row_count,
        } => gen_inline_table(w, columns.iter().map(|c| c.iu).collect::<Vec<_>>().as_slice(), values, *row_count),
    }
    w.write(")");
}

fn join_keyword(jt: JoinType) -> &'static str {
    match jt {
        JoinType::Inner => "inner join",
        JoinType::LeftOuter => "left join",
        JoinType::RightOuter => "right join",
        JoinType::FullOuter => "full join",
        JoinType::LeftSemi | JoinType::RightSemi | JoinType::LeftAnti | JoinType::RightAnti => {
            unreachable!("semi/anti joins render via the exists/not-exists branch")
        }
    }
}

fn gen_join(w: &mut Writer, left: &Operator, right: &Operator, condition: Option<&Expr>, jt: JoinType) {
    match jt {
        JoinType::Inner | JoinType::LeftOuter | JoinType::RightOuter | JoinType::FullOuter => {
            w.write("select * from ");
            gen_operator(w, left);
            w.write(" l ");
            w.write(join_keyword(jt));
            w.write(" ");
            gen_operator(w, right);
            w.write(" r");
            if let Some(cond) = condition {
                w.write(" on ");
                gen_expr(w, cond);
            }
        }
        JoinType::LeftSemi | JoinType::LeftAnti => {
            w.write("select * from ");
            gen_operator(w, left);
            w.write(" l where ");
            if jt == JoinType::LeftAnti {
                w.write("not ");
            }
            w.write("exists (select * from ");
            gen_operator(w, right);
            w.write(" r");
            if let Some(cond) = condition {
                w.write(" where ");
                gen_expr(w, cond);
            }
            w.write(")");
        }
        JoinType::RightSemi | JoinType::RightAnti => {
            w.write("select * from ");
            gen_operator(w, right);
            w.write(" r where ");
            if jt == JoinType::RightAnti {
                w.write("not ");
            }
            w.write("exists (select * from ");
            gen_operator(w, left);
            w.write(" l");
            if let Some(cond) = condition {
                w.write(" where ");
                gen_expr(w, cond);
            }
            w.write(")");
        }
    }
}

/// Shared by the `groupby()` operator template and (with `emit_clause =
/// false`) the scalar `aggregate()` fallback: `select <keys>, <aggs> from
/// <input> s [group by ...]`.
fn gen_groupby_body(
    w: &mut Writer,
    input: &Operator,
    group_by: &[crate::ir::GroupByKey],
    aggregates: &[GroupByAggregate],
    emit_clause: bool,
) {
    w.write("select ");
    let mut first = true;
    for k in group_by {
        if !first {
            w.write(", ");
        }
        first = false;
        gen_expr(w, &k.value);
        w.write(" as ");
        w.write_iu(k.output);
    }
    for a in aggregates {
        if !first {
            w.write(", ");
        }
        first = false;
        gen_aggregate_call(w, a.op, a.argument.as_ref());
        w.write(" as ");
        w.write_iu(a.output);
    }
    w.write(" from ");
    gen_operator(w, input);
    w.write(" s");
    if emit_clause {
        if group_by.is_empty() {
            w.write(" group by true");
        } else {
            w.write(" group by ");
            for i in 0..group_by.len() {
                if i > 0 {
                    w.write(", ");
                }
                w.write(&(i + 1).to_string());
            }
        }
    }
}

fn gen_aggregate_call(w: &mut Writer, op: AggregateOp, argument: Option<&Expr>) {
    if op == AggregateOp::CountStar {
        w.write("count(*)");
        return;
    }
    let (name, distinct) = match op {
        AggregateOp::CountStar => unreachable!(),
        AggregateOp::Count => ("count", false),
        AggregateOp::CountDistinct => ("count", true),
        AggregateOp::Sum => ("sum", false),
        AggregateOp::SumDistinct => ("sum", true),
        AggregateOp::Avg => ("avg", false),
        AggregateOp::AvgDistinct => ("avg", true),
        AggregateOp::Min => ("min", false),
        AggregateOp::Max => ("max", false),
    };
    w.write(name);
    w.write("(");
    if distinct {
        w.write("distinct ");
    }
    gen_operand(w, argument.expect("non-count-star aggregate requires an argument"));
    w.write(")");
}

fn gen_order_keys(w: &mut Writer, order: &[SortKey]) {
    for (i, k) in order.iter().enumerate() {
        if i > 0 {
            w.write(", ");
        }
        gen_expr(w, &k.value);
        if let Some(collate) = &k.collate {
            w.write(" collate ");
            w.write_identifier(collate);
        }
        if k.descending {
            w.write(" desc");
        }
    }
}

fn gen_order_limit(w: &mut Writer, order: &[SortKey], limit: Option<u64>, offset: Option<u64>) {
    if !order.is_empty() {
        w.write(" order by ");
        gen_order_keys(w, order);
    }
    if let Some(l) = limit {
        w.write(" limit ");
        w.write(&l.to_string());
    }
    if let Some(o) = offset {
        w.write(" offset ");
        w.write(&o.to_string());
    }
}

fn setop_keyword(op: SetOp) -> &'static str {
    match op {
        SetOp::Union => "union",
        SetOp::UnionAll => "union all",
        SetOp::Except => "except",
        SetOp::ExceptAll => "except all",
        SetOp::Intersect => "intersect",
        SetOp::IntersectAll => "intersect all",
    }
}

fn gen_set_operation(
    w: &mut Writer,
    left: &Operator,
    right: &Operator,
    left_columns: &[Iu],
    right_columns: &[Iu],
    result_columns: &[Iu],
    op: SetOp,
) {
    w.write("select * from (");
    gen_set_side(w, left, left_columns, "l");
    w.write(" ");
    w.write(setop_keyword(op));
    w.write(" ");
    gen_set_side(w, right, right_columns, "r");
    w.write(") s(");
    for (i, iu) in result_columns.iter().enumerate() {
        if i > 0 {
            w.write(", ");
        }
        w.write_iu(*iu);
    }
    w.write(")");
}

fn gen_set_side(w: &mut Writer, side: &Operator, columns: &[Iu], alias: &str) {
    w.write("(select ");
    if columns.is_empty() {
        w.write("1");
    } else {
        for (i, iu) in columns.iter().enumerate() {
            if i > 0 {
                w.write(", ");
            }
            w.write_iu(*iu);
        }
    }
    w.write(" from ");
    gen_operator(w, side);
    w.write(" ");
    w.write(alias);
    w.write(")");
}

/// `values`-backed row source. Per spec.md §4.3's zero-row workaround, an
/// inline table with no rows still needs one literal row of `null`s to give
/// Postgres' `values` list something to type-infer from, followed by
/// `limit 0` to discard it; a row with zero columns (the empty tuple) gets a
/// single `null` placeholder column for the same reason.
fn gen_inline_table(w: &mut Writer, columns: &[Iu], values: &[Vec<ConstValue>], row_count: usize) {
    w.write("select * from (values ");
    if row_count == 0 {
        w.write("(");
        let width = columns.len().max(1);
        for i in 0..width {
            if i > 0 {
                w.write(", ");
            }
            w.write("null");
        }
        w.write(")");
    } else {
        for (ri, row) in values.iter().enumerate() {
            if ri > 0 {
                w.write(", ");
            }
            w.write("(");
            if row.is_empty() {
                w.write("null");
            } else {
                for (ci, v) in row.iter().enumerate() {
                    if ci > 0 {
                        w.write(", ");
                    }
                    gen_literal_value(w, v);
                }
            }
            w.write(")");
        }
    }
    w.write(") s(");
    for (i, iu) in columns.iter().enumerate() {
        if i > 0 {
            w.write(", ");
        }
        w.write_iu(*iu);
    }
    w.write(")");
    if row_count == 0 {
        w.write(" limit 0");
    }
}

/// A raw `values`-row literal: no explicit cast wrapper, since the row's
/// type is already fixed by the table's declared column types — unlike a
/// bare scalar [`ExprKind::Const`], which carries no such external
/// constraint and so must self-describe (see [`gen_const`]).
fn gen_literal_value(w: &mut Writer, value: &ConstValue) {
    match value {
        ConstValue::Integer(n) => w.write(&n.to_string()),
        ConstValue::Decimal(text) => w.write(text),
        ConstValue::String(s) => w.write_string(s),
        ConstValue::Bool(b) => w.write(if *b { "true" } else { "false" }),
        ConstValue::Null => w.write("null"),
    }
}

/// Writes `expr` wrapped in parentheses, matching `SQLGenerator::generate`'s
/// unconditional parenthesization of every operand — even a bare `IuRef` or
/// string literal comes out as `(v1)` / `('x')`, not stripped down for
/// readability.
fn gen_operand(w: &mut Writer, expr: &Expr) {
    w.write("(");
    gen_expr(w, expr);
    w.write(")");
}

fn gen_expr(w: &mut Writer, expr: &Expr) {
    match &expr.kind {
        ExprKind::IuRef(iu) => w.write_iu(*iu),
        ExprKind::Const(value) => gen_const(w, value, &expr.ty),
        ExprKind::Cast(child) => gen_cast(w, child, &expr.ty),
        ExprKind::Comparison { mode, left, right } => {
            gen_operand(w, left);
            w.write(" ");
            w.write(comparison_keyword(*mode));
            w.write(" ");
            gen_operand(w, right);
        }
        ExprKind::Between { value, lower, upper } => {
            gen_operand(w, value);
            w.write(" between ");
            gen_operand(w, lower);
            w.write(" and ");
            gen_operand(w, upper);
        }
        ExprKind::In { value, list } => {
            gen_operand(w, value);
            w.write(" in (");
            for (i, item) in list.iter().enumerate() {
                if i > 0 {
                    w.write(", ");
                }
                gen_expr(w, item);
            }
            w.write(")");
        }
        ExprKind::Binary { op, left, right } => {
            gen_operand(w, left);
            w.write(" ");
            w.write(binary_keyword(*op));
            w.write(" ");
            gen_operand(w, right);
        }
        ExprKind::Unary { op, operand } => {
            w.write(unary_keyword(*op));
            if matches!(op, UnaryOp::Not) {
                w.write(" ");
            }
            gen_operand(w, operand);
        }
        ExprKind::Extract { part, value } => {
            w.write("extract(");
            w.write(extract_keyword(*part));
            w.write(" from ");
            gen_expr(w, value);
            w.write(")");
        }
        ExprKind::Substr { value, from, len } => {
            w.write("substr(");
            gen_expr(w, value);
            w.write(", ");
            gen_expr(w, from);
            if let Some(len) = len {
                w.write(", ");
                gen_expr(w, len);
            }
            w.write(")");
        }
        ExprKind::SimpleCase {
            value,
            whens,
            otherwise,
        } => {
            w.write("case ");
            gen_operand(w, value);
            for (when, then) in whens {
                w.write(" when ");
                gen_operand(w, when);
                w.write(" then ");
                gen_operand(w, then);
            }
            if let Some(otherwise) = otherwise {
                w.write(" else ");
                gen_operand(w, otherwise);
            }
            w.write(" end");
        }
        ExprKind::SearchedCase { whens, otherwise } => {
            w.write("case");
            for (when, then) in whens {
                w.write(" when ");
                gen_operand(w, when);
                w.write(" then ");
                gen_operand(w, then);
            }
            if let Some(otherwise) = otherwise {
                w.write(" else ");
                gen_operand(w, otherwise);
            }
            w.write(" end");
        }
        ExprKind::Aggregate { input, computation } => gen_aggregate_expr(w, input, computation),
        ExprKind::ForeignCall { name, args, call_type } => gen_foreign_call(w, name, args, *call_type),
    }
}

/// The scalar `aggregate()` table builtin, collapsed to one subquery level
/// when it wraps a single whole-table aggregate with no further arithmetic
/// (the only shape the analyser currently constructs — see
/// `builtin_aggregate`): `(select count(*) from <input> s)`, not the doubly
/// nested, aliased-then-reselected form the generic `GroupBy` template would
/// otherwise produce. A computation combining more than the bare aggregate
/// output falls back to the general nested form.
fn gen_aggregate_expr(w: &mut Writer, input: &Operator, computation: &Expr) {
    if let Operator::GroupBy {
        input: inner,
        group_by,
        aggregates,
    } = input
    {
        if group_by.is_empty() && aggregates.len() == 1 {
            if let ExprKind::IuRef(iu) = &computation.kind {
                if *iu == aggregates[0].output {
                    w.write("(select ");
                    gen_aggregate_call(w, aggregates[0].op, aggregates[0].argument.as_ref());
                    w.write(" from ");
                    gen_operator(w, inner);
                    w.write(" s)");
                    return;
                }
            }
        }
        w.write("(select ");
        gen_expr(w, computation);
        w.write(" from (select ");
        for (i, a) in aggregates.iter().enumerate() {
            if i > 0 {
                w.write(", ");
            }
            gen_aggregate_call(w, a.op, a.argument.as_ref());
            w.write(" as ");
            w.write_iu(a.output);
        }
        w.write(" from ");
        gen_operator(w, inner);
        w.write(" s) s)");
        return;
    }
    w.write("(select ");
    gen_expr(w, computation);
    w.write(" from ");
    gen_operator(w, input);
    w.write(" s)");
}

/// Not currently reachable — no built-in function constructs
/// [`ExprKind::ForeignCall`] yet (see its doc comment) — but rendered in
/// full so the generator stays exhaustive over the IR rather than over the
/// subset the analyser happens to emit today.
fn gen_foreign_call(w: &mut Writer, name: &str, args: &[Expr], call_type: CallType) {
    match call_type {
        CallType::Function => {
            w.write_identifier(name);
            w.write("(");
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    w.write(", ");
                }
                gen_expr(w, a);
            }
            w.write(")");
        }
        CallType::LeftAssoc | CallType::RightAssoc => {
            let mut args = args.iter();
            if let Some(first) = args.next() {
                gen_operand(w, first);
            }
            for a in args {
                w.write(" ");
                w.write(name);
                w.write(" ");
                gen_operand(w, a);
            }
        }
    }
}

fn gen_const(w: &mut Writer, value: &ConstValue, ty: &Type) {
    match value {
        ConstValue::Integer(n) => {
            w.write("cast(");
            w.write(&n.to_string());
            w.write(" as ");
            w.write_type(&Type::integer());
            w.write(")");
        }
        ConstValue::Decimal(text) => {
            w.write("cast(");
            w.write(text);
            w.write(" as ");
            w.write_type(ty);
            w.write(")");
        }
        ConstValue::String(s) => w.write_string(s),
        ConstValue::Bool(b) => w.write(if *b { "true" } else { "false" }),
        ConstValue::Null => w.write("null"),
    }
}

/// `cast(<child> as <ty>)`, except SQLite has no native `date`/`interval`
/// storage class and represents both as integer unix-time offsets, so a
/// cast to either becomes a call into `unixepoch` instead (spec.md §6).
fn gen_cast(w: &mut Writer, child: &Expr, target: &Type) {
    match (w.dialect(), &target.kind) {
        (Dialect::SQLite, TypeKind::Date) => {
            w.write("unixepoch(");
            gen_operand(w, child);
            w.write(")");
        }
        (Dialect::SQLite, TypeKind::Interval) => {
            w.write("unixepoch(0, ");
            gen_operand(w, child);
            w.write(")");
        }
        _ => {
            w.write("cast(");
            gen_operand(w, child);
            w.write(" as ");
            w.write_type(target);
            w.write(")");
        }
    }
}

fn comparison_keyword(mode: ComparisonMode) -> &'static str {
    match mode {
        ComparisonMode::Equal => "=",
        ComparisonMode::NotEqual => "<>",
        ComparisonMode::Is => "is not distinct from",
        ComparisonMode::IsNot => "is distinct from",
        ComparisonMode::Less => "<",
        ComparisonMode::LessOrEqual => "<=",
        ComparisonMode::Greater => ">",
        ComparisonMode::GreaterOrEqual => ">=",
        ComparisonMode::Like => "like",
    }
}

fn binary_keyword(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Plus => "+",
        BinaryOp::Minus => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Power => "^",
        BinaryOp::Concat => "||",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

fn unary_keyword(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
        UnaryOp::Not => "not",
    }
}

fn extract_keyword(part: ExtractPart) -> &'static str {
    match part {
        ExtractPart::Year => "year",
        ExtractPart::Month => "month",
        ExtractPart::Day => "day",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ConstValue, Expr, ExprKind, IuGen};
    use crate::types::Type;

    fn int_const(n: i64) -> Expr {
        Expr {
            kind: ExprKind::Const(ConstValue::Integer(n)),
            ty: Type::integer(),
        }
    }

    #[test]
    fn integer_literals_render_as_explicit_casts() {
        let mut w = Writer::new(Dialect::Postgres);
        gen_expr(&mut w, &int_const(1));
        assert_eq!(w.into_result(), "cast(1 as integer)");
    }

    #[test]
    fn binary_operands_are_always_parenthesized() {
        let mut w = Writer::new(Dialect::Postgres);
        let expr = Expr {
            kind: ExprKind::Binary {
                op: BinaryOp::Plus,
                left: Box::new(int_const(1)),
                right: Box::new(int_const(2)),
            },
            ty: Type::integer(),
        };
        gen_expr(&mut w, &expr);
        assert_eq!(w.into_result(), "(cast(1 as integer)) + (cast(2 as integer))");
    }

    #[test]
    fn table_scan_quotes_source_columns_and_assigns_aliases() {
        let mut gen = IuGen::new();
        let iu = gen.fresh();
        let op = Operator::TableScan {
            name: "region".to_string(),
            columns: vec![crate::ir::TableColumn {
                name: "r_regionkey".to_string(),
                iu,
                ty: Type::integer(),
            }],
        };
        let mut w = Writer::new(Dialect::Postgres);
        gen_operator(&mut w, &op);
        assert_eq!(w.into_result(), r#"(select "r_regionkey" as v1 from "region")"#);
    }

    #[test]
    fn whole_table_aggregate_skips_the_group_by_clause() {
        let mut gen = IuGen::new();
        let count_iu = gen.fresh();
        let input = Operator::TableScan {
            name: "lineitem".to_string(),
            columns: vec![],
        };
        let group_by_op = Operator::GroupBy {
            input: Box::new(input),
            group_by: vec![],
            aggregates: vec![GroupByAggregate {
                output: count_iu,
                op: AggregateOp::CountStar,
                argument: None,
            }],
        };
        let computation = Expr {
            kind: ExprKind::IuRef(count_iu),
            ty: Type::integer(),
        };
        let mut w = Writer::new(Dialect::Postgres);
        gen_aggregate_expr(&mut w, &group_by_op, &computation);
        assert_eq!(w.into_result(), r#"(select count(*) from (select  from "lineitem") s)"#);
    }

    #[test]
    fn sqlite_casts_interval_through_unixepoch() {
        let mut w = Writer::new(Dialect::SQLite);
        let child = int_const(5);
        gen_cast(&mut w, &child, &Type::interval());
        assert_eq!(w.into_result(), "unixepoch(0, (cast(5 as integer)))");
    }
}
