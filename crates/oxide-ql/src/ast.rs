//! AST vocabulary consumed (never produced) by this crate (§6, §4.15).
//!
//! SQL lexing and parsing are an external collaborator (§1's "out of
//! scope"); this module defines the *shape* of what such a parser hands
//! the engine, modeled on `oxide-sql-core::ast`'s node layout but trimmed
//! to the subset `compile::compile_select` actually lowers. No lexer, no
//! Pratt parser, no dialect table lives here — a caller builds a
//! `Statement` value directly (by hand, in a test, or from its own parser)
//! and hands it to `compile`.

use crate::order::OrderDirection;

/// A literal value as it would arrive from a parsed SQL statement, before
/// any column-type coercion the engine's `Scalar` performs.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

/// A placeholder as it appears in source text: positional (`?`, resolved by
/// encounter order) or named (`:name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamMarker {
    Positional,
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Like,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    IsNull,
    IsNotNull,
}

/// Quantifier for `ALL`/`ANY`/`SOME` comparisons against a subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
    Some,
}

/// One branch of a searched or simple `CASE` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub when: Expr,
    pub then: Expr,
}

/// An expression node. This is a superset of what `compile::compile_select`
/// lowers (it only handles AND-of-comparisons in WHERE plus plain column
/// references) — the rest of the vocabulary (window functions, CASE,
/// quantified comparisons, subqueries as scalars) exists so the type
/// faithfully describes what an upstream parser's AST can contain, per §6,
/// even where this crate declines to compile it onto the operator tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Placeholder(ParamMarker),
    /// A possibly-qualified identifier, e.g. `schema.table.col`.
    Column(Vec<String>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<Subquery>,
        negated: bool,
    },
    Exists {
        subquery: Box<Subquery>,
        negated: bool,
    },
    Quantified {
        left: Box<Expr>,
        op: BinaryOp,
        quantifier: Quantifier,
        subquery: Box<Subquery>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },
    /// Niladic functions with no argument list in source syntax, e.g.
    /// `CURRENT_DATE`.
    NiladicFunction(String),
    Window {
        function: Box<Expr>,
        partition_by: Vec<Expr>,
        order_by: Vec<OrderByItem>,
    },
    Case {
        operand: Option<Box<Expr>>,
        branches: Vec<CaseBranch>,
        else_branch: Option<Box<Expr>>,
    },
    Subquery(Box<Subquery>),
}

/// A subquery node: wraps a SELECT, UNION, or WITH statement. Its
/// evaluation context (scalar, IN-membership, EXISTS) is determined by
/// where it appears in the enclosing `Expr`, not by a field here (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub statement: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub source: TableRef,
    /// `ON` condition; absent for `CROSS JOIN`.
    pub on: Option<Expr>,
}

/// A FROM-clause source: a named table or a parenthesized derived
/// subquery, each with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    Named { name: String, alias: Option<String> },
    Derived { subquery: Box<Subquery>, alias: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    Intersect,
    Except,
}

/// A selected item: either `*`, `table.*`, or an expression with an
/// optional output alias.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard,
    QualifiedWildcard(String),
    Expr { expr: Expr, alias: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub distinct: bool,
    pub columns: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<JoinClause>,
    pub selection: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOpStatement {
    pub kind: SetOpKind,
    pub all: bool,
    pub left: Box<Statement>,
    pub right: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CteDefinition {
    pub name: String,
    pub columns: Vec<String>,
    pub recursive: bool,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStatement {
    pub ctes: Vec<CteDefinition>,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Select(Box<Statement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub source: InsertSource,
    /// `INSERT OR REPLACE` / upsert semantics.
    pub replace: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub selection: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    pub selection: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DdlTarget {
    Table,
    Index,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateStatement {
    pub target: DdlTarget,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropStatement {
    pub target: DdlTarget,
    pub name: String,
}

/// The top-level statement vocabulary this crate declares itself able to
/// consume from an upstream parser (§6). Only `Select` (and, through it,
/// `With`) is ever lowered by `compile`; the rest exist so the type is a
/// believable integration surface for a full SQL front end.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    SetOp(SetOpStatement),
    With(WithStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Create(CreateStatement),
    Drop(DropStatement),
}
