// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! The syntactic AST as handed over by the external parser.
//!
//! These nodes are plain data: no name resolution, no types, no folding has
//! happened yet. The semantic analyzer consumes this tree and produces the
//! typed tree defined by the semantics crate.
//!
//! The constructor helpers on the node types exist so that tests, demos and
//! language bindings can build trees without spelling out every field;
//! locations default to `None` and can be attached with `with_location`.

use serde::{Deserialize, Serialize};

use crate::location::SourceLocation;

/// An identifier as written in the source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub location: Option<SourceLocation>,
}

impl Identifier {
    pub fn new<T: ToString>(name: T) -> Identifier {
        Identifier {
            name: name.to_string(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Identifier {
        self.location = Some(location);
        self
    }
}

/// The version statement. Components are kept signed so that the analyzer
/// can reject negative components itself rather than relying on the parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub items: Vec<i64>,
    pub location: Option<SourceLocation>,
}

impl Version {
    pub fn new(items: impl Into<Vec<i64>>) -> Version {
        Version {
            items: items.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Version {
        self.location = Some(location);
        self
    }
}

/// A complete parsed program: the version statement, the optional qubit
/// count expression (absent when qubit variables are used, 1.1+), and the
/// top-level statement list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub version: Version,
    pub num_qubits: Option<Expression>,
    pub statements: Vec<Statement>,
    pub location: Option<SourceLocation>,
}

impl Program {
    pub fn new(
        version: Version,
        num_qubits: Option<Expression>,
        statements: Vec<Statement>,
    ) -> Program {
        Program {
            version,
            num_qubits,
            statements,
            location: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Bundle(Bundle),
    Mapping(Mapping),
    Variables(Variables),
    Subcircuit(Subcircuit),
    Structured(Structured),
}

impl Statement {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Statement::Bundle(bundle) => bundle.location.as_ref(),
            Statement::Mapping(mapping) => mapping.location.as_ref(),
            Statement::Variables(variables) => variables.location.as_ref(),
            Statement::Subcircuit(subcircuit) => subcircuit.location.as_ref(),
            Statement::Structured(structured) => structured.location(),
        }
    }
}

/// One or more instructions issued on a single source line, intended to
/// execute in parallel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub items: Vec<Instruction>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl Bundle {
    pub fn new(items: Vec<Instruction>) -> Bundle {
        Bundle {
            items,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Bundle {
        self.location = Some(location);
        self
    }

    pub fn to_statement(self) -> Statement {
        Statement::Bundle(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub name: Identifier,
    pub condition: Option<Expression>,
    pub operands: Vec<Expression>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl Instruction {
    pub fn new<T: ToString>(name: T, operands: Vec<Expression>) -> Instruction {
        Instruction {
            name: Identifier::new(name),
            condition: None,
            operands,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn with_condition(mut self, condition: Expression) -> Instruction {
        self.condition = Some(condition);
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Instruction {
        self.location = Some(location);
        self
    }

    /// Wraps this instruction in a singleton bundle statement.
    pub fn to_statement(self) -> Statement {
        let location = self.location.clone();
        Statement::Bundle(Bundle {
            items: vec![self],
            annotations: Vec::new(),
            location,
        })
    }
}

/// A `map name = expr` statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub alias: Identifier,
    pub expr: Expression,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl Mapping {
    pub fn new<T: ToString>(alias: T, expr: Expression) -> Mapping {
        Mapping {
            alias: Identifier::new(alias),
            expr,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Mapping {
        self.location = Some(location);
        self
    }

    pub fn to_statement(self) -> Statement {
        Statement::Mapping(self)
    }
}

/// A variable declaration: one type name, one or more variable names (1.1+).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variables {
    pub names: Vec<Identifier>,
    pub typ: Identifier,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl Variables {
    pub fn new<T: ToString>(typ: T, names: Vec<&str>) -> Variables {
        Variables {
            names: names.into_iter().map(Identifier::new).collect(),
            typ: Identifier::new(typ),
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Variables {
        self.location = Some(location);
        self
    }

    pub fn to_statement(self) -> Statement {
        Statement::Variables(self)
    }
}

/// A subcircuit header: `.name` or `.name(iterations)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subcircuit {
    pub name: Identifier,
    pub iterations: Option<Expression>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl Subcircuit {
    pub fn new<T: ToString>(name: T, iterations: Option<Expression>) -> Subcircuit {
        Subcircuit {
            name: Identifier::new(name),
            iterations,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Subcircuit {
        self.location = Some(location);
        self
    }

    pub fn to_statement(self) -> Statement {
        Statement::Subcircuit(self)
    }
}

/// Structured control-flow statements (1.2+).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Structured {
    IfElse(IfElse),
    ForLoop(ForLoop),
    ForeachLoop(ForeachLoop),
    WhileLoop(WhileLoop),
    RepeatUntilLoop(RepeatUntilLoop),
    Break(BreakStatement),
    Continue(ContinueStatement),
}

impl Structured {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Structured::IfElse(n) => n.location.as_ref(),
            Structured::ForLoop(n) => n.location.as_ref(),
            Structured::ForeachLoop(n) => n.location.as_ref(),
            Structured::WhileLoop(n) => n.location.as_ref(),
            Structured::RepeatUntilLoop(n) => n.location.as_ref(),
            Structured::Break(n) => n.location.as_ref(),
            Structured::Continue(n) => n.location.as_ref(),
        }
    }

    pub fn to_statement(self) -> Statement {
        Statement::Structured(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfElse {
    pub branches: Vec<IfElseBranch>,
    pub otherwise: Option<Vec<Statement>>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl IfElse {
    pub fn new(branches: Vec<IfElseBranch>, otherwise: Option<Vec<Statement>>) -> IfElse {
        IfElse {
            branches,
            otherwise,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn to_statement(self) -> Statement {
        Statement::Structured(Structured::IfElse(self))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfElseBranch {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

impl IfElseBranch {
    pub fn new(condition: Expression, body: Vec<Statement>) -> IfElseBranch {
        IfElseBranch { condition, body }
    }
}

/// An assignment pair as used by `set` desugaring in C-style for loops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub lhs: Expression,
    pub rhs: Expression,
}

impl Assignment {
    pub fn new(lhs: Expression, rhs: Expression) -> Assignment {
        Assignment { lhs, rhs }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForLoop {
    pub initialize: Option<Assignment>,
    pub condition: Expression,
    pub update: Option<Assignment>,
    pub body: Vec<Statement>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl ForLoop {
    pub fn new(
        initialize: Option<Assignment>,
        condition: Expression,
        update: Option<Assignment>,
        body: Vec<Statement>,
    ) -> ForLoop {
        ForLoop {
            initialize,
            condition,
            update,
            body,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn to_statement(self) -> Statement {
        Statement::Structured(Structured::ForLoop(self))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForeachLoop {
    pub lhs: Expression,
    pub frm: Expression,
    pub to: Expression,
    pub body: Vec<Statement>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl ForeachLoop {
    pub fn new(
        lhs: Expression,
        frm: Expression,
        to: Expression,
        body: Vec<Statement>,
    ) -> ForeachLoop {
        ForeachLoop {
            lhs,
            frm,
            to,
            body,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn to_statement(self) -> Statement {
        Statement::Structured(Structured::ForeachLoop(self))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhileLoop {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl WhileLoop {
    pub fn new(condition: Expression, body: Vec<Statement>) -> WhileLoop {
        WhileLoop {
            condition,
            body,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn to_statement(self) -> Statement {
        Statement::Structured(Structured::WhileLoop(self))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepeatUntilLoop {
    pub body: Vec<Statement>,
    pub until: Expression,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl RepeatUntilLoop {
    pub fn new(body: Vec<Statement>, until: Expression) -> RepeatUntilLoop {
        RepeatUntilLoop {
            body,
            until,
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn to_statement(self) -> Statement {
        Statement::Structured(Structured::RepeatUntilLoop(self))
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BreakStatement {
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl BreakStatement {
    pub fn to_statement(self) -> Statement {
        Statement::Structured(Structured::Break(self))
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinueStatement {
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl ContinueStatement {
    pub fn to_statement(self) -> Statement {
        Statement::Structured(Structured::Continue(self))
    }
}

/// An `@interface.operation(operands)` annotation attached to a statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationData {
    pub interface: Identifier,
    pub operation: Identifier,
    pub operands: Vec<Expression>,
    pub location: Option<SourceLocation>,
}

impl AnnotationData {
    pub fn new<T: ToString, U: ToString>(
        interface: T,
        operation: U,
        operands: Vec<Expression>,
    ) -> AnnotationData {
        AnnotationData {
            interface: Identifier::new(interface),
            operation: Identifier::new(operation),
            operands,
            location: None,
        }
    }
}

/// Unary operators, keyed by their source spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Negate,
    BitwiseNot,
    LogicalNot,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::LogicalNot => "!",
        }
    }
}

/// Binary operators, keyed by their source spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Power,
    Multiply,
    Divide,
    IntDivide,
    Modulo,
    Add,
    Subtract,
    ShiftLeft,
    ShiftRightArith,
    ShiftRightLogic,
    CmpEq,
    CmpNe,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    LogicalAnd,
    LogicalXor,
    LogicalOr,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Power => "**",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::IntDivide => "//",
            BinaryOp::Modulo => "%",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRightArith => ">>",
            BinaryOp::ShiftRightLogic => ">>>",
            BinaryOp::CmpEq => "==",
            BinaryOp::CmpNe => "!=",
            BinaryOp::CmpLt => "<",
            BinaryOp::CmpLe => "<=",
            BinaryOp::CmpGt => ">",
            BinaryOp::CmpGe => ">=",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalXor => "^^",
            BinaryOp::LogicalOr => "||",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExprKind,
    pub location: Option<SourceLocation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    IntegerLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    JsonLiteral(String),
    /// Rows of expressions; rectangularity is checked by the analyzer.
    MatrixLiteral(Vec<Vec<Expression>>),
    Identifier(String),
    Index {
        expr: Box<Expression>,
        indices: Vec<IndexEntry>,
    },
    FunctionCall {
        name: Identifier,
        arguments: Vec<Expression>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    TernaryCond {
        condition: Box<Expression>,
        if_true: Box<Expression>,
        if_false: Box<Expression>,
    },
}

/// One entry in an index list: a single index or an inclusive range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum IndexEntry {
    Item(Expression),
    Range {
        first: Expression,
        last: Expression,
    },
}

impl IndexEntry {
    /// A single constant index entry.
    pub fn at(index: i64) -> IndexEntry {
        IndexEntry::Item(Expression::int(index))
    }

    /// A constant `first..last` range entry (inclusive bounds).
    pub fn range(first: i64, last: i64) -> IndexEntry {
        IndexEntry::Range {
            first: Expression::int(first),
            last: Expression::int(last),
        }
    }
}

impl Expression {
    fn new(kind: ExprKind) -> Expression {
        Expression {
            kind,
            location: None,
        }
    }

    pub fn int(value: i64) -> Expression {
        Expression::new(ExprKind::IntegerLiteral(value))
    }

    pub fn real(value: f64) -> Expression {
        Expression::new(ExprKind::FloatLiteral(value))
    }

    pub fn string<T: ToString>(value: T) -> Expression {
        Expression::new(ExprKind::StringLiteral(value.to_string()))
    }

    pub fn json<T: ToString>(value: T) -> Expression {
        Expression::new(ExprKind::JsonLiteral(value.to_string()))
    }

    pub fn ident<T: ToString>(name: T) -> Expression {
        Expression::new(ExprKind::Identifier(name.to_string()))
    }

    pub fn matrix(rows: Vec<Vec<Expression>>) -> Expression {
        Expression::new(ExprKind::MatrixLiteral(rows))
    }

    pub fn call<T: ToString>(name: T, arguments: Vec<Expression>) -> Expression {
        Expression::new(ExprKind::FunctionCall {
            name: Identifier::new(name),
            arguments,
        })
    }

    pub fn index(expr: Expression, indices: Vec<IndexEntry>) -> Expression {
        Expression::new(ExprKind::Index {
            expr: Box::new(expr),
            indices,
        })
    }

    pub fn unary(op: UnaryOp, expr: Expression) -> Expression {
        Expression::new(ExprKind::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::new(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn ternary(condition: Expression, if_true: Expression, if_false: Expression) -> Expression {
        Expression::new(ExprKind::TernaryCond {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    pub fn with_location(mut self, location: SourceLocation) -> Expression {
        self.location = Some(location);
        self
    }
}
