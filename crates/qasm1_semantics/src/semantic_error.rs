// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics produced during analysis.
//!
//! Recoverable language-rule violations become [`AnalysisError`]s collected
//! into the result; each statement is a recovery point. Breaches of internal
//! invariants (a malformed tree after a successful parse, a broken scope
//! stack) panic instead of entering the error list.

use std::fmt;

use thiserror::Error;

use qasm1_ast::location::SourceLocation;
use qasm1_ast::parse::ParseError;

/// The taxonomy of recoverable diagnostics.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ErrorKind {
    /// An error surfaced from the external parser, wrapped verbatim.
    #[error("{0}")]
    Parse(String),
    /// A generic language-rule violation.
    #[error("{0}")]
    Analysis(String),
    /// An identifier that did not resolve to anything.
    #[error("failed to resolve {what} \"{name}\"")]
    NameResolution { what: &'static str, name: String },
    /// A known name, but no overload accepts the argument types.
    #[error("failed to resolve overload for {name} with argument pack {arg_types}")]
    OverloadResolution { name: String, arg_types: String },
    /// A failed promotion or other type mismatch.
    #[error("{0}")]
    Type(String),
    /// Out-of-range indices, bad qubit counts, malformed matrices and the
    /// other domain rules.
    #[error("{0}")]
    Domain(String),
    /// Version ceiling exceeded, or a feature used below its minimum version.
    #[error("{0}")]
    Version(String),
}

/// A diagnostic with an optional source location.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub location: Option<SourceLocation>,
}

impl AnalysisError {
    pub fn new(kind: ErrorKind) -> AnalysisError {
        AnalysisError {
            kind,
            location: None,
        }
    }

    pub fn analysis<T: ToString>(message: T) -> AnalysisError {
        AnalysisError::new(ErrorKind::Analysis(message.to_string()))
    }

    pub fn type_error<T: ToString>(message: T) -> AnalysisError {
        AnalysisError::new(ErrorKind::Type(message.to_string()))
    }

    pub fn domain<T: ToString>(message: T) -> AnalysisError {
        AnalysisError::new(ErrorKind::Domain(message.to_string()))
    }

    pub fn version<T: ToString>(message: T) -> AnalysisError {
        AnalysisError::new(ErrorKind::Version(message.to_string()))
    }

    pub fn name_resolution<T: ToString>(what: &'static str, name: T) -> AnalysisError {
        AnalysisError::new(ErrorKind::NameResolution {
            what,
            name: name.to_string(),
        })
    }

    /// Attaches `location` as context, unless a more specific location was
    /// already attached deeper in the recursion.
    pub fn context(mut self, location: Option<&SourceLocation>) -> AnalysisError {
        if self.location.is_none() {
            self.location = location.cloned();
        }
        self
    }

    /// The bare message, without the location prefix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl From<ParseError> for AnalysisError {
    fn from(error: ParseError) -> AnalysisError {
        AnalysisError {
            kind: ErrorKind::Parse(error.message),
            location: error.location,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "Error at {}: {}", location, self.kind),
            None => write!(f, "Error: {}", self.kind),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// The aggregate failure returned when a caller demands a strictly
/// successful analysis but diagnostics were collected.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("analysis failed with {} error(s)", .errors.len())]
pub struct AnalysisFailed {
    pub errors: Vec<AnalysisError>,
}
