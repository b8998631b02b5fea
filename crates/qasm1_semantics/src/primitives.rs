// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Primitive scalar and matrix payloads carried by constant values, and the
//! version numbers used for feature gating.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer primitive (the only integer width in the language).
pub type Int = i64;

/// Real number primitive.
pub type Real = f64;

/// Complex number primitive.
pub type Complex = num_complex::Complex64;

/// The axis of a rotation or measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
#[error("invalid version string \"{0}\"")]
pub struct InvalidVersion(pub String);

/// A dot-separated sequence of version components.
///
/// Comparison is lexicographic with the shorter sequence zero-padded, so
/// "1.0" < "1.1" < "1.2" < "2" and "1" == "1.0". Components are kept signed;
/// the analyzer rejects negative components with a diagnostic instead of
/// making them unrepresentable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Version(Vec<i64>);

impl Version {
    pub fn new(items: impl Into<Vec<i64>>) -> Version {
        Version(items.into())
    }

    pub fn items(&self) -> &[i64] {
        &self.0
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let lhs = self.0.get(i).copied().unwrap_or(0);
            let rhs = other.0.get(i).copied().unwrap_or(0);
            match lhs.cmp(&rhs) {
                std::cmp::Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        std::cmp::Ordering::Equal
    }
}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let items = s
            .split('.')
            .map(|component| component.parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| InvalidVersion(s.to_string()))?;
        if items.is_empty() || items.iter().any(|&item| item < 0) {
            return Err(InvalidVersion(s.to_string()));
        }
        Ok(Version(items))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for item in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{item}")?;
            first = false;
        }
        Ok(())
    }
}

/// Row-major matrix of reals with an explicit column count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RMatrix {
    data: Vec<Real>,
    num_cols: usize,
}

impl RMatrix {
    pub fn new(data: Vec<Real>, num_cols: usize) -> RMatrix {
        assert!(
            num_cols > 0 && data.len() % num_cols == 0,
            "matrix data is not rectangular"
        );
        RMatrix { data, num_cols }
    }

    pub fn num_rows(&self) -> usize {
        self.data.len() / self.num_cols
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn at(&self, row: usize, col: usize) -> Real {
        self.data[row * self.num_cols + col]
    }

    pub fn data(&self) -> &[Real] {
        &self.data
    }
}

/// Row-major matrix of complex numbers with an explicit column count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CMatrix {
    data: Vec<Complex>,
    num_cols: usize,
}

impl CMatrix {
    pub fn new(data: Vec<Complex>, num_cols: usize) -> CMatrix {
        assert!(
            num_cols > 0 && data.len() % num_cols == 0,
            "matrix data is not rectangular"
        );
        CMatrix { data, num_cols }
    }

    pub fn num_rows(&self) -> usize {
        self.data.len() / self.num_cols
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn at(&self, row: usize, col: usize) -> Complex {
        self.data[row * self.num_cols + col]
    }

    pub fn data(&self) -> &[Complex] {
        &self.data
    }
}
