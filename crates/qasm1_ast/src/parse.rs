// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! The contract between the semantic analyzer and the external parser.
//!
//! Lexing and grammar parsing are not implemented in this workspace. A
//! parser plugs into the analyzer's `analyze_file`/`analyze_string` entry
//! points by implementing [`SourceParser`], or hands over a [`ParseResult`]
//! directly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast;
use crate::location::SourceLocation;

/// An error produced by the external parser. The analyzer wraps these
/// verbatim into its own diagnostic list.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl ParseError {
    pub fn new<T: ToString>(message: T, location: Option<SourceLocation>) -> ParseError {
        ParseError {
            message: message.to_string(),
            location,
        }
    }
}

/// What a parser run produces: a root node when parsing got far enough to
/// build one, and any number of errors. A well-behaved parser returns either
/// a root or at least one error.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ParseResult {
    pub root: Option<ast::Program>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn success(root: ast::Program) -> ParseResult {
        ParseResult {
            root: Some(root),
            errors: Vec::new(),
        }
    }

    pub fn failure(errors: Vec<ParseError>) -> ParseResult {
        ParseResult { root: None, errors }
    }
}

/// Implemented by external parsers so the analyzer can offer file- and
/// string-based convenience entry points.
pub trait SourceParser {
    /// Parses the contents of `path`.
    fn parse_file(&self, path: &Path) -> ParseResult;

    /// Parses `data`; `file_name` is used only for diagnostics.
    fn parse_string(&self, data: &str, file_name: Option<&str>) -> ParseResult;
}
