//! The relational algebra the analyser builds and the SQL generator consumes.
//!
//! Mirrors `saneql`'s `algebra/Operator.hpp` / `algebra/Expression.hpp`:
//! every node owns its children (no shared subplans — a `let` that is used
//! twice is re-analysed twice, per spec.md §4.3), and every column produced
//! by an operator is identified by an opaque [`Iu`] handle rather than by
//! position, so generators never have to recompute "which column is this".

use crate::types::Type;

/// An "information unit": the identity of one column produced by exactly one
/// operator. Two `Iu`s are the same column iff they compare equal; there is
/// no structural equality beyond that, mirroring the original's
/// pointer-identity IUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iu(pub u32);

#[derive(Debug, Clone)]
pub struct IuDef {
    pub iu: Iu,
    pub name: Option<String>,
    pub ty: Type,
}

/// Allocates fresh, globally unique [`Iu`]s during analysis.
#[derive(Debug, Default)]
pub struct IuGen {
    next: u32,
}

impl IuGen {
    pub fn new() -> Self {
        IuGen::default()
    }

    pub fn fresh(&mut self) -> Iu {
        let iu = Iu(self.next);
        self.next += 1;
        iu
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    Equal,
    NotEqual,
    Is,
    IsNot,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Like,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Power,
    Concat,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    CountStar,
    Count,
    CountDistinct,
    Sum,
    SumDistinct,
    Avg,
    AvgDistinct,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractPart {
    Year,
    Month,
    Day,
}

/// A single child expression together with the type it evaluates to.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IuRef(Iu),
    Const(ConstValue),
    Cast(Box<Expr>),
    Comparison {
        mode: ComparisonMode,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Between {
        value: Box<Expr>,
        lower: Box<Expr>,
        upper: Box<Expr>,
    },
    In {
        value: Box<Expr>,
        list: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Extract {
        part: ExtractPart,
        value: Box<Expr>,
    },
    Substr {
        value: Box<Expr>,
        from: Box<Expr>,
        len: Option<Box<Expr>>,
    },
    SimpleCase {
        value: Box<Expr>,
        whens: Vec<(Expr, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    SearchedCase {
        whens: Vec<(Expr, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    /// An aggregate used in scalar position (the `aggregate(...)` table
    /// builtin): `input` is a `GroupBy` with no group keys, and
    /// `computation` is a scalar expression over that `GroupBy`'s output
    /// IUs. The generator wraps the subplan in an extra
    /// `select <computation> from (select <aggs...> from <input> s) s`,
    /// matching `SQLGenerator::generate(const Aggregate&)`.
    Aggregate {
        input: Box<Operator>,
        computation: Box<Expr>,
    },
    ForeignCall {
        name: String,
        args: Vec<Expr>,
        call_type: CallType,
    },
}

/// How a [`ExprKind::ForeignCall`] should be printed: as an ordinary
/// function call, or folded into nested binary form for a user-declared
/// infix operator (spec.md §3's `callType`). Not yet constructed by the
/// analyser — every scalar operation the built-in table currently declares
/// has a dedicated node (`Binary`, `Extract`, ...) — but kept so the
/// generator's handling of user-declared functions/operators is exact if
/// the built-in table grows one, per spec.md's `ForeignCall` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Function,
    LeftAssoc,
    RightAssoc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Integer(i64),
    Decimal(String),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    LeftSemi,
    RightSemi,
    LeftAnti,
    RightAnti,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    UnionAll,
    Except,
    ExceptAll,
    Intersect,
    IntersectAll,
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub value: Expr,
    pub descending: bool,
    /// Collation name, when the sort key named one explicitly. `None` means
    /// "omit the `collate` clause" (see [`crate::sql`]'s order-by emission).
    pub collate: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WindowAggregate {
    pub output: Iu,
    pub op: WindowOp,
}

#[derive(Debug, Clone)]
pub enum WindowOp {
    RowNumber,
    Aggregate { op: AggregateOp, argument: Option<Expr> },
}

#[derive(Debug, Clone)]
pub struct TableColumn {
    pub name: String,
    pub iu: Iu,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct GroupByKey {
    pub output: Iu,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct GroupByAggregate {
    pub output: Iu,
    pub op: AggregateOp,
    pub argument: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct MapComputation {
    pub output: Iu,
    pub value: Expr,
}

/// One node of the algebra tree. Every variant owns its children directly
/// (`Box<Operator>` / `Vec<Operator>`), matching the original's
/// `unique_ptr<Operator>` child ownership.
#[derive(Debug, Clone)]
pub enum Operator {
    TableScan {
        name: String,
        columns: Vec<TableColumn>,
    },
    Select {
        input: Box<Operator>,
        condition: Expr,
    },
    Map {
        input: Box<Operator>,
        computations: Vec<MapComputation>,
    },
    Join {
        left: Box<Operator>,
        right: Box<Operator>,
        condition: Option<Expr>,
        join_type: JoinType,
    },
    GroupBy {
        input: Box<Operator>,
        group_by: Vec<GroupByKey>,
        aggregates: Vec<GroupByAggregate>,
    },
    Sort {
        input: Box<Operator>,
        order: Vec<SortKey>,
        limit: Option<u64>,
        offset: Option<u64>,
    },
    Window {
        input: Box<Operator>,
        aggregates: Vec<WindowAggregate>,
        partition_by: Vec<Expr>,
        order_by: Vec<SortKey>,
    },
    SetOperation {
        left: Box<Operator>,
        right: Box<Operator>,
        left_columns: Vec<Iu>,
        right_columns: Vec<Iu>,
        result_columns: Vec<Iu>,
        op: SetOp,
    },
    InlineTable {
        columns: Vec<TableColumn>,
        values: Vec<Vec<ConstValue>>,
        row_count: usize,
    },
}

impl Operator {
    /// The output columns of this operator, in order — the set that a
    /// wrapping `select *` would expose. Used by the analyser to resolve
    /// `.column` access against a table-valued expression, and by the
    /// generator to materialise `select <cols> from <op> s` at the root.
    pub fn output_columns(&self) -> Vec<Iu> {
        match self {
            Operator::TableScan { columns, .. } => columns.iter().map(|c| c.iu).collect(),
            Operator::Select { input, .. } => input.output_columns(),
            Operator::Map { input, computations } => {
                let mut cols = input.output_columns();
                cols.extend(computations.iter().map(|c| c.output));
                cols
            }
            Operator::Join {
                left,
                right,
                join_type,
                ..
            } => match join_type {
                JoinType::LeftSemi | JoinType::LeftAnti => left.output_columns(),
                JoinType::RightSemi | JoinType::RightAnti => right.output_columns(),
                _ => {
                    let mut cols = left.output_columns();
                    cols.extend(right.output_columns());
                    cols
                }
            },
            Operator::GroupBy {
                group_by,
                aggregates,
                ..
            } => {
                let mut cols: Vec<Iu> = group_by.iter().map(|k| k.output).collect();
                cols.extend(aggregates.iter().map(|a| a.output));
                cols
            }
            Operator::Sort { input, .. } => input.output_columns(),
            Operator::Window {
                input, aggregates, ..
            } => {
                let mut cols = input.output_columns();
                cols.extend(aggregates.iter().map(|a| a.output));
                cols
            }
            Operator::SetOperation { result_columns, .. } => result_columns.clone(),
            Operator::InlineTable { columns, .. } => columns.iter().map(|c| c.iu).collect(),
        }
    }
}
