// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

// Source locations decorate AST nodes, semantic tree nodes, and analysis
// errors. Lines and columns are 1-based; a missing file name prints as
// "<unknown>".

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

const UNKNOWN_FILE_NAME: &str = "<unknown>";

/// A range of source text, from the first line/column to the last, inclusive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file_name: Option<String>,
    pub first_line: u32,
    pub first_column: u32,
    pub last_line: u32,
    pub last_column: u32,
}

impl SourceLocation {
    pub fn new(
        file_name: Option<&str>,
        first_line: u32,
        first_column: u32,
        last_line: u32,
        last_column: u32,
    ) -> SourceLocation {
        SourceLocation {
            file_name: file_name.map(str::to_string),
            first_line,
            first_column,
            last_line,
            last_column,
        }
    }

    /// A single-point location, handy when only a line/column pair is known.
    pub fn point(file_name: Option<&str>, line: u32, column: u32) -> SourceLocation {
        SourceLocation::new(file_name, line, column, line, column)
    }

    /// Grows this range just enough to also cover `other`.
    pub fn expand_to_include(&mut self, other: &SourceLocation) {
        if (other.first_line, other.first_column) < (self.first_line, self.first_column) {
            self.first_line = other.first_line;
            self.first_column = other.first_column;
        }
        if (other.last_line, other.last_column) > (self.last_line, self.last_column) {
            self.last_line = other.last_line;
            self.last_column = other.last_column;
        }
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Ordering is what the analyzer sorts the output mapping list by: file name
// first, then textual position.
impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        (
            &self.file_name,
            self.first_line,
            self.first_column,
            self.last_line,
            self.last_column,
        )
            .cmp(&(
                &other.file_name,
                other.first_line,
                other.first_column,
                other.last_line,
                other.last_column,
            ))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_name = self.file_name.as_deref().unwrap_or(UNKNOWN_FILE_NAME);
        write!(f, "{}:{}:{}", file_name, self.first_line, self.first_column)?;
        if self.last_line != self.first_line {
            write!(f, "..{}:{}", self.last_line, self.last_column)
        } else if self.last_column != self.first_column {
            write!(f, "..{}", self.last_column)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = SourceLocation::point(Some("test.qasm"), 3, 7);
        assert_eq!(loc.to_string(), "test.qasm:3:7");
        let loc = SourceLocation::new(Some("test.qasm"), 3, 7, 3, 12);
        assert_eq!(loc.to_string(), "test.qasm:3:7..12");
        let loc = SourceLocation::new(None, 3, 7, 5, 2);
        assert_eq!(loc.to_string(), "<unknown>:3:7..5:2");
    }

    #[test]
    fn test_ordering() {
        let a = SourceLocation::point(Some("a.qasm"), 2, 1);
        let b = SourceLocation::point(Some("a.qasm"), 2, 5);
        let c = SourceLocation::point(Some("a.qasm"), 4, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_expand() {
        let mut loc = SourceLocation::point(Some("a.qasm"), 3, 4);
        loc.expand_to_include(&SourceLocation::point(Some("a.qasm"), 5, 2));
        assert_eq!(loc, SourceLocation::new(Some("a.qasm"), 3, 4, 5, 2));
        loc.expand_to_include(&SourceLocation::point(Some("a.qasm"), 1, 9));
        assert_eq!(loc, SourceLocation::new(Some("a.qasm"), 1, 9, 5, 2));
    }
}
