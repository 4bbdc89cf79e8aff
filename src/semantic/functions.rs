//! The built-in function table: name → builtin id, plus each builtin's
//! signature as an introspectable value — positional/named argument shapes,
//! expected types and defaults — mirroring the original's
//! `SemanticAnalysis.hpp` argument accessors (`scalarArgument`,
//! `tableArgument`, `symbolArgument`, `constBoolArgument`,
//! `expressionListArgument`, `scalarArgumentList`). Arity/shape *checking*
//! still lives with each builtin's handler in [`crate::semantic::analyzer`];
//! this module only exposes the declarative data those handlers agree with.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinId {
    // Table operations.
    Table,
    As,
    Filter,
    Map,
    Project,
    Join,
    GroupBy,
    Aggregate,
    OrderBy,
    Window,
    Union,
    UnionAll,
    Except,
    ExceptAll,
    Intersect,
    IntersectAll,
    Distinct,

    // Scalar operations.
    Extract,
    Substr,
    Case,
    Coalesce,
    Between,
    In,
    GenSym,

    // Aggregate functions, legal only inside groupby/aggregate/window.
    Count,
    CountDistinct,
    Sum,
    SumDistinct,
    Avg,
    AvgDistinct,
    Min,
    Max,
    RowNumber,
}

pub fn lookup(name: &str) -> Option<BuiltinId> {
    use BuiltinId::*;
    Some(match name.to_lowercase().as_str() {
        "table" => Table,
        "as" | "alias" => As,
        "filter" => Filter,
        "map" => Map,
        "project" => Project,
        "join" => Join,
        "groupby" => GroupBy,
        "aggregate" => Aggregate,
        "orderby" => OrderBy,
        "window" => Window,
        "union" => Union,
        "unionall" => UnionAll,
        "except" => Except,
        "exceptall" => ExceptAll,
        "intersect" => Intersect,
        "intersectall" => IntersectAll,
        "distinct" => Distinct,
        "extract" => Extract,
        "substr" => Substr,
        "case" => Case,
        "coalesce" => Coalesce,
        "between" => Between,
        "in" => In,
        "gensym" => GenSym,
        "count" => Count,
        "countdistinct" => CountDistinct,
        "sum" => Sum,
        "sumdistinct" => SumDistinct,
        "avg" => Avg,
        "avgdistinct" => AvgDistinct,
        "min" => Min,
        "max" => Max,
        "rownumber" => RowNumber,
        _ => return None,
    })
}

pub fn is_aggregate(id: BuiltinId) -> bool {
    use BuiltinId::*;
    matches!(
        id,
        Count | CountDistinct | Sum | SumDistinct | Avg | AvgDistinct | Min | Max
    )
}

/// The shape an argument slot accepts, matching the original's per-kind
/// argument accessors one for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// A scalar expression, analysed against the caller's binding
    /// (`scalarArgument`).
    Scalar,
    /// A table expression, analysed as a pipeline input (`tableArgument`).
    Table,
    /// A bare identifier taken literally, never resolved as a column
    /// (`symbolArgument`) — table names, `as` aliases, `extract`'s part.
    Symbol,
    /// A literal `true`/`false` with no column references
    /// (`constBoolArgument`).
    ConstBool,
    /// A brace tuple of named or positional scalar expressions
    /// (`expressionListArgument`/`scalarArgumentList`) — `map`'s
    /// computations, `groupby`'s keys and aggregates, `case`'s branches.
    ExpressionList,
}

/// One argument slot in a built-in's signature.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    /// The argument's name, usable positionally or as `name: value`.
    pub name: &'static str,
    pub shape: ArgShape,
    /// Expected scalar type, or `None` when any type is accepted (covers
    /// non-scalar shapes and polymorphic scalar slots alike).
    pub ty: Option<&'static str>,
    /// Saneql source for the default value, re-parsed and re-analysed on
    /// demand when the argument is omitted; `None` means the argument is
    /// required.
    pub default: Option<&'static str>,
}

impl ArgSpec {
    const fn required(name: &'static str, shape: ArgShape) -> Self {
        ArgSpec { name, shape, ty: None, default: None }
    }

    const fn typed(name: &'static str, shape: ArgShape, ty: &'static str) -> Self {
        ArgSpec { name, shape, ty: Some(ty), default: None }
    }

    const fn optional(name: &'static str, shape: ArgShape, default: &'static str) -> Self {
        ArgSpec { name, shape, ty: None, default: Some(default) }
    }
}

/// A built-in's full signature: its argument list, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub params: &'static [ArgSpec],
}

/// Looks up a built-in's signature by id. Every [`BuiltinId`] variant has
/// an entry; aggregate functions share one shape (`value`, optional for
/// `count`, required for the `*_distinct` variants) since they only ever
/// appear as the argument to `groupby`/`aggregate`/`window`, never called
/// bare.
pub fn signature(id: BuiltinId) -> Signature {
    use ArgShape::{ExpressionList, Scalar, Symbol, Table as TableArg};
    use BuiltinId::*;
    let params: &'static [ArgSpec] = match id {
        Table => &[ArgSpec::required("name", Symbol)],
        As => &[ArgSpec::required("table", TableArg), ArgSpec::required("name", Symbol)],
        Filter => &[ArgSpec::required("table", TableArg), ArgSpec::typed("condition", Scalar, "bool")],
        Map => &[ArgSpec::required("table", TableArg), ArgSpec::required("computations", ExpressionList)],
        Project => &[ArgSpec::required("table", TableArg), ArgSpec::required("columns", ExpressionList)],
        Join => &[
            ArgSpec::required("left", TableArg),
            ArgSpec::required("right", TableArg),
            ArgSpec::optional("on", Scalar, "true"),
            ArgSpec::optional("type", Symbol, "inner"),
        ],
        GroupBy => &[
            ArgSpec::required("table", TableArg),
            ArgSpec::required("keys", ExpressionList),
            ArgSpec::optional("aggregates", ExpressionList, "{}"),
        ],
        Aggregate => &[ArgSpec::required("table", TableArg), ArgSpec::required("aggregates", ExpressionList)],
        OrderBy => &[
            ArgSpec::required("table", TableArg),
            ArgSpec::required("keys", ExpressionList),
            ArgSpec::optional("limit", Scalar, "null"),
            ArgSpec::optional("offset", Scalar, "0"),
        ],
        Window => &[
            ArgSpec::required("table", TableArg),
            ArgSpec::required("aggregates", ExpressionList),
            ArgSpec::optional("partition", ExpressionList, "{}"),
            ArgSpec::optional("order", ExpressionList, "{}"),
        ],
        Union | UnionAll | Except | ExceptAll | Intersect | IntersectAll => {
            &[ArgSpec::required("left", TableArg), ArgSpec::required("right", TableArg)]
        }
        Distinct => &[ArgSpec::required("table", TableArg)],

        Extract => &[ArgSpec::required("part", Symbol), ArgSpec::required("value", Scalar)],
        Substr => &[
            ArgSpec::typed("value", Scalar, "text"),
            ArgSpec::typed("from", Scalar, "integer"),
            ArgSpec::optional("len", Scalar, "null"),
        ],
        Case => &[ArgSpec::required("scrutinee_or_condition", Scalar), ArgSpec::required("branches_and_default", ExpressionList)],
        Coalesce => &[ArgSpec::required("values", ExpressionList)],
        Between => &[
            ArgSpec::required("value", Scalar),
            ArgSpec::required("low", Scalar),
            ArgSpec::required("high", Scalar),
        ],
        In => &[ArgSpec::required("value", Scalar), ArgSpec::required("candidates", ExpressionList)],
        GenSym => &[],

        Count | Sum | Avg | Min | Max => &[ArgSpec::optional("value", Scalar, "*")],
        CountDistinct | SumDistinct | AvgDistinct => &[ArgSpec::required("value", Scalar)],
        RowNumber => &[],
    };
    Signature { params }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_has_a_signature() {
        let ids = [
            BuiltinId::Table,
            BuiltinId::As,
            BuiltinId::Filter,
            BuiltinId::Map,
            BuiltinId::Project,
            BuiltinId::Join,
            BuiltinId::GroupBy,
            BuiltinId::Aggregate,
            BuiltinId::OrderBy,
            BuiltinId::Window,
            BuiltinId::Union,
            BuiltinId::UnionAll,
            BuiltinId::Except,
            BuiltinId::ExceptAll,
            BuiltinId::Intersect,
            BuiltinId::IntersectAll,
            BuiltinId::Distinct,
            BuiltinId::Extract,
            BuiltinId::Substr,
            BuiltinId::Case,
            BuiltinId::Coalesce,
            BuiltinId::Between,
            BuiltinId::In,
            BuiltinId::GenSym,
            BuiltinId::Count,
            BuiltinId::CountDistinct,
            BuiltinId::Sum,
            BuiltinId::SumDistinct,
            BuiltinId::Avg,
            BuiltinId::AvgDistinct,
            BuiltinId::Min,
            BuiltinId::Max,
            BuiltinId::RowNumber,
        ];
        for id in ids {
            // Just confirms every variant is covered (an unmatched variant
            // would fail to compile, not panic here) and that shared
            // aggregate slots are named consistently.
            let sig = signature(id);
            if is_aggregate(id) && id != BuiltinId::Count {
                assert_eq!(sig.params.len(), 1);
                assert_eq!(sig.params[0].name, "value");
            }
        }
    }

    #[test]
    fn distinct_aggregates_require_their_value() {
        for id in [BuiltinId::CountDistinct, BuiltinId::SumDistinct, BuiltinId::AvgDistinct] {
            assert!(signature(id).params[0].default.is_none());
        }
    }

    #[test]
    fn plain_count_defaults_to_star() {
        assert_eq!(signature(BuiltinId::Count).params[0].default, Some("*"));
    }

    #[test]
    fn lookup_is_case_insensitive_and_signature_follows() {
        let id = lookup("OrderBy").expect("orderby should resolve");
        assert_eq!(id, BuiltinId::OrderBy);
        assert_eq!(signature(id).params[0].name, "table");
    }
}
