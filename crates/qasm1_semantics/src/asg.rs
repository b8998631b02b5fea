// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! The typed, resolved, desugared semantic tree produced by analysis.
//!
//! Unlike the syntactic AST, everything in here has passed name resolution,
//! type checking and constant folding: operands are `Value`s, conditions are
//! boolean values, goto targets are indices into the program's subcircuit
//! list (a non-owning back-reference; the program owns the subcircuits).

use serde::{Deserialize, Serialize};

use qasm1_ast::location::SourceLocation;

use crate::error_model;
use crate::instruction;
use crate::primitives::{Int, Version};
use crate::types::Type;
use crate::values::Value;

/// The root of the semantic tree.
///
/// `num_qubits == 0` signals that qubit variables are used instead of the
/// qubit register (1.1+). When `num_qubits > 0`, the predefined mappings `q`
/// and `b` cover the full qubit and measurement-bit registers; those
/// predefined mappings are not part of `mappings`, which holds only
/// user-declared mappings in source order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The maximum version the analyzer was configured for.
    pub api_version: Version,
    /// The version declared by the file; at most `api_version`.
    pub version: Version,
    pub num_qubits: Int,
    pub variables: Vec<Variable>,
    pub subcircuits: Vec<Subcircuit>,
    pub mappings: Vec<Mapping>,
    pub error_model: Option<ErrorModel>,
    pub location: Option<SourceLocation>,
}

impl Program {
    pub fn new(api_version: Version) -> Program {
        Program {
            version: api_version.clone(),
            api_version,
            num_qubits: 0,
            variables: Vec::new(),
            subcircuits: Vec::new(),
            mappings: Vec::new(),
            error_model: None,
            location: None,
        }
    }

    /// Looks up a subcircuit by name. The implicit default subcircuit has
    /// the empty name.
    pub fn subcircuit(&self, name: &str) -> Option<&Subcircuit> {
        self.subcircuits.iter().find(|s| s.name == name)
    }
}

/// A named, iteration-counted region of the program. For files up to 1.1
/// the statements live in `bundles`; from 1.2 onward they live in `body`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subcircuit {
    pub name: String,
    pub iterations: Int,
    pub bundles: Vec<Bundle>,
    pub body: Option<Block>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

/// An ordered sequence of statements (1.2+).
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub location: Option<SourceLocation>,
}

impl Block {
    pub fn new() -> Block {
        Block::default()
    }

    /// Appends a statement and grows the block's source range to cover it.
    pub fn add(&mut self, statement: Statement) {
        if let Some(statement_location) = statement.location() {
            match &mut self.location {
                Some(block_location) => block_location.expand_to_include(statement_location),
                None => self.location = Some(statement_location.clone()),
            }
        }
        self.statements.push(statement);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Bundle(Bundle),
    SetInstruction(Box<SetInstruction>),
    GotoInstruction(GotoInstruction),
    IfElse(Box<IfElse>),
    ForLoop(Box<ForLoop>),
    ForeachLoop(Box<ForeachLoop>),
    WhileLoop(Box<WhileLoop>),
    RepeatUntilLoop(Box<RepeatUntilLoop>),
    Break(BreakStatement),
    Continue(ContinueStatement),
}

impl Statement {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Statement::Bundle(n) => n.location.as_ref(),
            Statement::SetInstruction(n) => n.location.as_ref(),
            Statement::GotoInstruction(n) => n.location.as_ref(),
            Statement::IfElse(n) => n.location.as_ref(),
            Statement::ForLoop(n) => n.location.as_ref(),
            Statement::ForeachLoop(n) => n.location.as_ref(),
            Statement::WhileLoop(n) => n.location.as_ref(),
            Statement::RepeatUntilLoop(n) => n.location.as_ref(),
            Statement::Break(n) => n.location.as_ref(),
            Statement::Continue(n) => n.location.as_ref(),
        }
    }
}

/// A group of instructions that execute in parallel. Any bundle of more
/// than one instruction may only contain instructions whose descriptors
/// allow parallelism.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Bundle {
    pub items: Vec<Instruction>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl Bundle {
    pub fn new() -> Bundle {
        Bundle::default()
    }

    pub fn to_statement(self) -> Statement {
        Statement::Bundle(self)
    }
}

/// A resolved instruction. `instruction` is the winning descriptor, or
/// `None` when instruction resolution is disabled. The condition is always
/// present; an unconditional instruction carries `ConstBool(true)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub instruction: Option<instruction::Instruction>,
    pub name: String,
    pub condition: Value,
    pub operands: Vec<Value>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl Instruction {
    pub fn new<T: ToString>(
        instruction: Option<instruction::Instruction>,
        name: T,
        operands: Vec<Value>,
    ) -> Instruction {
        Instruction {
            instruction,
            name: name.to_string(),
            condition: Value::ConstBool(true),
            operands,
            annotations: Vec::new(),
            location: None,
        }
    }
}

/// A (possibly conditional) assignment (1.2+). The right-hand side has been
/// promoted to the left-hand side's type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetInstruction {
    pub lhs: Value,
    pub rhs: Value,
    pub condition: Value,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl SetInstruction {
    pub fn new(lhs: Value, rhs: Value) -> SetInstruction {
        SetInstruction {
            lhs,
            rhs,
            condition: Value::ConstBool(true),
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn to_statement(self) -> Statement {
        Statement::SetInstruction(Box::new(self))
    }
}

/// A (possibly conditional) jump to a subcircuit (1.2+). `target` indexes
/// the program's subcircuit list once resolution has run; forward references
/// are the normal case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GotoInstruction {
    pub target_name: String,
    pub target: Option<usize>,
    pub condition: Value,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl GotoInstruction {
    pub fn new<T: ToString>(target_name: T) -> GotoInstruction {
        GotoInstruction {
            target_name: target_name.to_string(),
            target: None,
            condition: Value::ConstBool(true),
            annotations: Vec::new(),
            location: None,
        }
    }

    pub fn to_statement(self) -> Statement {
        Statement::GotoInstruction(self)
    }
}

/// An if-else chain after dead-branch elimination. When no conditional
/// branches survive folding the whole node is elided, so `branches` is
/// never empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfElse {
    pub branches: Vec<IfElseBranch>,
    pub otherwise: Option<Block>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl IfElse {
    pub fn to_statement(self) -> Statement {
        Statement::IfElse(Box::new(self))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfElseBranch {
    pub condition: Value,
    pub body: Block,
}

/// A C-style loop. The optional initialize/update assignments are
/// unconditional set instructions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForLoop {
    pub initialize: Option<SetInstruction>,
    pub condition: Value,
    pub update: Option<SetInstruction>,
    pub body: Block,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl ForLoop {
    pub fn to_statement(self) -> Statement {
        Statement::ForLoop(Box::new(self))
    }
}

/// A foreach loop over an inclusive constant range. `frm > to` simply yields
/// zero iterations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForeachLoop {
    pub lhs: Value,
    pub frm: Int,
    pub to: Int,
    pub body: Block,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl ForeachLoop {
    pub fn to_statement(self) -> Statement {
        Statement::ForeachLoop(Box::new(self))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhileLoop {
    pub condition: Value,
    pub body: Block,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl WhileLoop {
    pub fn to_statement(self) -> Statement {
        Statement::WhileLoop(Box::new(self))
    }
}

/// A repeat-until loop; the body executes at least once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepeatUntilLoop {
    pub body: Block,
    pub condition: Value,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl RepeatUntilLoop {
    pub fn to_statement(self) -> Statement {
        Statement::RepeatUntilLoop(Box::new(self))
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BreakStatement {
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl BreakStatement {
    pub fn to_statement(self) -> Statement {
        Statement::Break(self)
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinueStatement {
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl ContinueStatement {
    pub fn to_statement(self) -> Statement {
        Statement::Continue(self)
    }
}

/// A user-declared mapping as it appears in the final program list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub name: String,
    pub value: Value,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

/// A declared variable (1.1+). The type is always assignable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub typ: Type,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

/// An analyzed annotation: interface and operation names plus analyzed
/// operand values. The analyzer preserves but does not interpret these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationData {
    pub interface: String,
    pub operation: String,
    pub operands: Vec<Value>,
    pub location: Option<SourceLocation>,
}

/// The program's error model, at most one per program. `model` is the
/// resolved descriptor, or `None` when error-model resolution is disabled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorModel {
    pub model: Option<error_model::ErrorModel>,
    pub name: String,
    pub operands: Vec<Value>,
    pub annotations: Vec<AnnotationData>,
    pub location: Option<SourceLocation>,
}

impl ErrorModel {
    pub fn new<T: ToString>(
        model: Option<error_model::ErrorModel>,
        name: T,
        operands: Vec<Value>,
    ) -> ErrorModel {
        ErrorModel {
            model,
            name: name.to_string(),
            operands,
            annotations: Vec::new(),
            location: None,
        }
    }
}
