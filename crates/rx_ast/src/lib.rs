//! RX AST definitions
//!
//! This crate defines the abstract syntax tree (AST) for the RX language.
//! It serves as the contract between the parser and the compiler core.
//! Every expression node carries a `NodeId` stamped by the parser so the
//! semantic analyzer can record per-expression type decisions in a side
//! table without owning the tree.

use std::ops::Range;

/// Represents a source code span as a byte range.
pub type Span = Range<usize>;

/// Identity of an expression node, unique within one parsed module.
pub type NodeId = u32;

/// The top-level module AST node.
#[derive(Debug, Clone)]
pub struct Module {
    pub items: Vec<Item>,
    pub span: Span,
}

/// Top-level items.
#[derive(Debug, Clone)]
pub enum Item {
    Fn(FnDecl),
    Struct(StructDecl),
}

/// Function declaration.
#[derive(Debug, Clone)]
pub struct FnDecl {
    pub ident: Ident,
    pub params: Vec<Param>,
    /// None means the function returns unit.
    pub return_type: Option<TypeRef>,
    pub body: Block,
    pub span: Span,
}

/// Function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub ident: Ident,
    pub ty: TypeRef,
    pub mutable: bool,
    pub span: Span,
}

/// Struct declaration with ordered fields.
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub ident: Ident,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

/// Struct field declaration.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub ident: Ident,
    pub ty: TypeRef,
    pub span: Span,
}

/// An identifier with its source span.
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// Source-level types.
///
/// Field order inside tuples/structs is layout order: the IR generator
/// derives slot offsets from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    I64,
    Bool,
    /// The empty tuple; only valid as a return type.
    Unit,
    /// String literal type, valid solely as a `printlnStr` argument.
    Str,
    /// `&T` / `&mut T`.
    Ref { mutable: bool, inner: Box<TypeRef> },
    /// `[T; N]`.
    Array(Box<TypeRef>, usize),
    /// `(T1, T2, ...)` with at least two fields.
    Tuple(Vec<TypeRef>),
    /// Named struct type.
    Named(String),
}

impl TypeRef {
    /// True for `&T` and `&mut T`.
    pub fn is_ref(&self) -> bool {
        matches!(self, TypeRef::Ref { .. })
    }

    /// Strip one level of reference, if any.
    pub fn strip_ref(&self) -> &TypeRef {
        match self {
            TypeRef::Ref { inner, .. } => inner,
            other => other,
        }
    }
}

/// A block: statements plus an optional trailing expression whose value is
/// the block's value (at function-body level, the return value).
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub tail: Option<Expr>,
    pub span: Span,
}

/// Statements.
#[derive(Debug, Clone)]
pub enum Stmt {
    Let(LetStmt),
    Assign(AssignStmt),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    Loop(LoopStmt),
    Break(Span),
    Continue(Span),
    Return(ReturnStmt),
    Block(Block),
}

/// `let [mut] x [: T] = e;`
#[derive(Debug, Clone)]
pub struct LetStmt {
    pub ident: Ident,
    pub mutable: bool,
    pub ty: Option<TypeRef>,
    pub init: Expr,
    pub span: Span,
}

/// `lhs = rhs;` where `lhs` must denote a place.
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    pub span: Span,
}

/// Expression statement.
#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// If statement with optional else arm (block or chained if).
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Block,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

/// `while cond { ... }`
#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
    pub span: Span,
}

/// `loop { ... }`
#[derive(Debug, Clone)]
pub struct LoopStmt {
    pub body: Block,
    pub span: Span,
}

/// `return [e];`
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub arg: Option<Expr>,
    pub span: Span,
}

/// An expression node: kind plus identity and span.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression kinds.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal.
    Int(i64),
    /// Boolean literal.
    Bool(bool),
    /// String literal (escape-processed).
    Str(String),
    /// Variable reference.
    Var(String),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Call(CallExpr),
    /// `base.field` on a struct or `base.N` on a tuple.
    Field(FieldExpr),
    /// `base[index]` on an array.
    Index(IndexExpr),
    /// `(e1, e2, ...)` with at least two elements.
    Tuple(Vec<Expr>),
    /// `[e1, e2, ...]`.
    Array(Vec<Expr>),
    /// `[elem; N]`.
    Repeat(RepeatExpr),
    /// `Name { field: expr, ... }`.
    StructLit(StructLitExpr),
    /// `&e` / `&mut e`.
    Ref { mutable: bool, expr: Box<Expr> },
    /// `*e`.
    Deref(Box<Expr>),
}

/// Unary operator application.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical not.
    Not,
}

/// Binary operator application.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// True for `== != < <= > >=`.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// True for `&&` and `||`.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Function call. The callee is always a plain identifier in RX.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Ident,
    pub args: Vec<Expr>,
}

/// Field projection member.
#[derive(Debug, Clone)]
pub enum FieldMember {
    /// Named struct field.
    Named(String),
    /// Tuple index (`t.0`).
    Index(usize),
}

/// `base.member` projection.
#[derive(Debug, Clone)]
pub struct FieldExpr {
    pub base: Box<Expr>,
    pub member: FieldMember,
}

/// `base[index]` element access.
#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub base: Box<Expr>,
    pub index: Box<Expr>,
}

/// `[elem; N]` array repeat literal.
#[derive(Debug, Clone)]
pub struct RepeatExpr {
    pub elem: Box<Expr>,
    pub len: usize,
}

/// Struct literal with field initializers in source order.
#[derive(Debug, Clone)]
pub struct StructLitExpr {
    pub name: Ident,
    pub fields: Vec<(Ident, Expr)>,
}
