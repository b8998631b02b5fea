// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! The types used to annotate values in the semantic tree, the shorthand
//! parameter-type spelling, and the type-check and widening relations.
//! Promotion of actual values lives in `values.rs`, because it needs the
//! typed tree and not just the types.

use std::fmt;

use boolenum::BoolEnum;
use serde::{Deserialize, Serialize};

/// Whether a type denotes an l-value (a register, measurement bit or
/// variable reference) rather than a read-only value.
#[derive(BoolEnum, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assignable {
    True,
    False,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Qubit,
    /// Bits and booleans are the same type in this dialect.
    Bool,
    Axis,
    Int,
    Real,
    Complex,
    String,
    Json,
    /// `None` dimensions are unconstrained; value-derived types always have
    /// concrete dimensions.
    RealMatrix {
        num_rows: Option<usize>,
        num_cols: Option<usize>,
    },
    ComplexMatrix {
        num_rows: Option<usize>,
        num_cols: Option<usize>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Type {
    pub kind: TypeKind,
    pub assignable: Assignable,
}

impl Type {
    /// A read-only type of the given kind.
    pub fn new(kind: TypeKind) -> Type {
        Type {
            kind,
            assignable: Assignable::False,
        }
    }

    /// An assignable (l-value) type of the given kind.
    pub fn assignable(kind: TypeKind) -> Type {
        Type {
            kind,
            assignable: Assignable::True,
        }
    }

    pub fn is_assignable(&self) -> bool {
        matches!(self.assignable, Assignable::True)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assignable() {
            write!(f, "assignable ")?;
        }
        match &self.kind {
            TypeKind::Qubit => write!(f, "qubit"),
            TypeKind::Bool => write!(f, "bool"),
            TypeKind::Axis => write!(f, "axis"),
            TypeKind::Int => write!(f, "int"),
            TypeKind::Real => write!(f, "real"),
            TypeKind::Complex => write!(f, "complex"),
            TypeKind::String => write!(f, "string"),
            TypeKind::Json => write!(f, "json"),
            TypeKind::RealMatrix { .. } => write!(f, "real matrix"),
            TypeKind::ComplexMatrix { .. } => write!(f, "complex matrix"),
        }
    }
}

/// Formats a parameter or argument type sequence as `(a, b, c)`.
pub fn types_to_string(types: &[Type]) -> String {
    let names = types
        .iter()
        .map(Type::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("({names})")
}

/// Parses a shorthand parameter-type spec string. Each character is one
/// parameter; lowercase means read-only, uppercase means assignable:
///
///  - `Q` = qubit reference
///  - `B` = assignable bit/bool (measurement register)
///  - `b` = bit/bool
///  - `a` = axis (x, y, or z)
///  - `i` = integer
///  - `r` = real
///  - `c` = complex
///  - `u` = complex unitary matrix of side 2^n, where n is the number of
///    qubit parameters that precede it
///  - `s` = (quoted) string
///  - `j` = json
///
/// Real matrices and complex matrices with other shape constraints cannot be
/// spelled this way; construct the `Type` values directly instead.
///
/// # Panics
///
/// Panics on an unknown character. Specs are compiled into the analyzer
/// configuration, so a bad spec is a programming error, not an input error.
pub fn from_spec(spec: &str) -> Vec<Type> {
    let mut types = Vec::with_capacity(spec.len());
    let mut num_qubits = 0u32;
    for code in spec.chars() {
        let typ = match code {
            'Q' => {
                num_qubits += 1;
                Type::assignable(TypeKind::Qubit)
            }
            'B' => Type::assignable(TypeKind::Bool),
            'b' => Type::new(TypeKind::Bool),
            'a' => Type::new(TypeKind::Axis),
            'i' => Type::new(TypeKind::Int),
            'r' => Type::new(TypeKind::Real),
            'c' => Type::new(TypeKind::Complex),
            'u' => {
                let side = 1usize << num_qubits;
                Type::new(TypeKind::ComplexMatrix {
                    num_rows: Some(side),
                    num_cols: Some(side),
                })
            }
            's' => Type::new(TypeKind::String),
            'j' => Type::new(TypeKind::Json),
            _ => panic!("unknown type code '{code}' in parameter type spec \"{spec}\""),
        };
        types.push(typ);
    }
    types
}

/// Accepted by the registration APIs wherever a parameter-type sequence is
/// expected: either an explicit list of types or a shorthand spec string.
pub trait ParamTypeSpec {
    fn into_types(self) -> Vec<Type>;
}

impl ParamTypeSpec for Vec<Type> {
    fn into_types(self) -> Vec<Type> {
        self
    }
}

impl ParamTypeSpec for &str {
    fn into_types(self) -> Vec<Type> {
        from_spec(self)
    }
}

fn dims_check(expected: Option<usize>, actual: Option<usize>) -> bool {
    match expected {
        None => true,
        Some(dim) => actual == Some(dim),
    }
}

/// Returns whether the `actual` type satisfies the constraints of the
/// `expected` type: the kinds must match (with matrix shape constraints on
/// `expected` satisfiable by `actual`), and an assignable `expected` demands
/// an assignable `actual`.
pub fn type_check(expected: &Type, actual: &Type) -> bool {
    if expected.is_assignable() && !actual.is_assignable() {
        return false;
    }
    match (&expected.kind, &actual.kind) {
        (
            TypeKind::RealMatrix {
                num_rows: expected_rows,
                num_cols: expected_cols,
            },
            TypeKind::RealMatrix { num_rows, num_cols },
        )
        | (
            TypeKind::ComplexMatrix {
                num_rows: expected_rows,
                num_cols: expected_cols,
            },
            TypeKind::ComplexMatrix { num_rows, num_cols },
        ) => dims_check(*expected_rows, *num_rows) && dims_check(*expected_cols, *num_cols),
        (expected_kind, actual_kind) => expected_kind == actual_kind,
    }
}

/// The implicit numeric widening chain: bool -> int -> real -> complex.
/// Returns whether a *constant* of kind `from` may be widened to kind `to`.
/// Everything else (e.g. integer to axis) is not implicit.
pub fn widens_to(from: &TypeKind, to: &TypeKind) -> bool {
    use TypeKind::*;
    matches!(
        (from, to),
        (Bool, Int) | (Bool, Real) | (Bool, Complex) | (Int, Real) | (Int, Complex) | (Real, Complex)
    )
}
