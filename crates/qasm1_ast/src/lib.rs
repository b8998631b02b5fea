// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Syntactic AST for the QASM 1.x dialect, plus the contract with the
//! external parser that produces it.
//!
//! This crate deliberately contains no parsing code. The grammar and lexer
//! live with the parser implementation; what the semantic analyzer needs is
//! the shape of the tree the parser hands over (`ast`), the source locations
//! decorating that tree (`location`), and the result/trait types through
//! which a parser is plugged in (`parse`).

pub mod ast;
pub mod location;
pub mod parse;

pub use location::SourceLocation;
pub use parse::{ParseError, ParseResult, SourceParser};
