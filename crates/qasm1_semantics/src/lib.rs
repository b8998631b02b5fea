// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Semantic analyzer for the QASM 1.x quantum assembly dialect.
//!
//! Given a syntax tree produced by an external parser (the `qasm1_ast`
//! crate names that contract), this crate validates the program against the
//! language's static rules and emits a typed, resolved, desugared semantic
//! tree suitable for code generation or simulation:
//!
//! - identifiers are resolved through the scope stack,
//! - instruction, function and error-model uses are resolved against the
//!   registered overloads, with implicit numeric widening,
//! - constant expressions are folded and dead branches eliminated,
//! - structured control flow, qubit uniqueness, index-set alignment and
//!   bundle parallelizability are checked.
//!
//! The usual entry point is an [`Analyzer`]: construct it with the maximum
//! supported language version, configure it with the `register_*` methods
//! (or start from [`default_analyzer`]), then call its `analyze*` methods
//! any number of times. Each call returns an [`AnalysisResult`] carrying
//! the semantic tree and/or diagnostics.

pub mod analyzer;
pub mod asg;
pub mod context;
pub mod error_model;
pub mod functions;
pub mod instruction;
pub mod primitives;
pub mod resolver;
pub mod semantic_error;
pub mod types;
pub mod values;

mod ast_to_semantics;

pub use analyzer::{default_analyzer, AnalysisResult, Analyzer};
pub use semantic_error::{AnalysisError, AnalysisFailed, ErrorKind};
