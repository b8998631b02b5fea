// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! The polymorphic value type that flows through the analyzer: constants,
//! qubit/bit reference sets, variable references, and deferred dynamic
//! function calls. Every value knows its type.

use serde::{Deserialize, Serialize};

use crate::primitives::{Axis, CMatrix, Complex, Int, RMatrix, Real};
use crate::types::{type_check, Assignable, Type, TypeKind};

/// A reference to a declared variable. `variable` indexes the program's
/// variable list; the type is carried explicitly so that typing works
/// without access to that list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableRef {
    pub variable: usize,
    pub typ: Type,
}

/// A dynamic function call left in the tree because its inputs did not all
/// fold to constants (1.1+). The return type is carried explicitly so typing
/// works before evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionValue {
    pub name: String,
    pub operands: Vec<Value>,
    pub return_type: Type,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    ConstInt(Int),
    ConstReal(Real),
    ConstComplex(Complex),
    ConstBool(bool),
    ConstString(String),
    ConstJson(String),
    ConstAxis(Axis),
    ConstRealMatrix(RMatrix),
    ConstComplexMatrix(CMatrix),
    /// A possibly compound reference into the qubit register.
    QubitRefs(Vec<Int>),
    /// A possibly compound reference into the measurement bit register.
    BitRefs(Vec<Int>),
    VariableRef(VariableRef),
    Function(Box<FunctionValue>),
}

impl Value {
    /// The type of this value. Reference sets are assignable; constants are
    /// not; variable references and deferred calls carry their own type.
    pub fn type_of(&self) -> Type {
        match self {
            Value::ConstInt(_) => Type::new(TypeKind::Int),
            Value::ConstReal(_) => Type::new(TypeKind::Real),
            Value::ConstComplex(_) => Type::new(TypeKind::Complex),
            Value::ConstBool(_) => Type::new(TypeKind::Bool),
            Value::ConstString(_) => Type::new(TypeKind::String),
            Value::ConstJson(_) => Type::new(TypeKind::Json),
            Value::ConstAxis(_) => Type::new(TypeKind::Axis),
            Value::ConstRealMatrix(matrix) => Type::new(TypeKind::RealMatrix {
                num_rows: Some(matrix.num_rows()),
                num_cols: Some(matrix.num_cols()),
            }),
            Value::ConstComplexMatrix(matrix) => Type::new(TypeKind::ComplexMatrix {
                num_rows: Some(matrix.num_rows()),
                num_cols: Some(matrix.num_cols()),
            }),
            Value::QubitRefs(_) => Type::assignable(TypeKind::Qubit),
            Value::BitRefs(_) => Type::assignable(TypeKind::Bool),
            Value::VariableRef(var_ref) => var_ref.typ.clone(),
            Value::Function(function) => function.return_type.clone(),
        }
    }

    /// Whether this is a constant scalar or matrix, i.e. something the
    /// constant folder can compute with.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Value::ConstInt(_)
                | Value::ConstReal(_)
                | Value::ConstComplex(_)
                | Value::ConstBool(_)
                | Value::ConstString(_)
                | Value::ConstJson(_)
                | Value::ConstAxis(_)
                | Value::ConstRealMatrix(_)
                | Value::ConstComplexMatrix(_)
        )
    }

    pub fn as_const_int(&self) -> Option<Int> {
        match self {
            Value::ConstInt(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_const_bool(&self) -> Option<bool> {
        match self {
            Value::ConstBool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_const_real(&self) -> Option<Real> {
        match self {
            Value::ConstReal(value) => Some(*value),
            _ => None,
        }
    }
}

/// Promotes `value` to the `expected` type, returning `None` when that is
/// impossible.
///
/// A value whose type already satisfies the type check is passed through
/// unchanged. Constants are additionally widened along the numeric chain
/// bool -> int -> real -> complex. Dynamic values (variable references,
/// deferred calls) are never converted; they only pass when the type check
/// accepts them as-is.
pub fn promote(value: Value, expected: &Type) -> Option<Value> {
    if type_check(expected, &value.type_of()) {
        return Some(value);
    }
    // Constants are never assignable, so nothing below can satisfy an
    // assignable expectation.
    if expected.is_assignable() {
        return None;
    }
    let promoted = match (&value, &expected.kind) {
        (Value::ConstBool(b), TypeKind::Int) => Value::ConstInt(*b as Int),
        (Value::ConstBool(b), TypeKind::Real) => Value::ConstReal(*b as u8 as Real),
        (Value::ConstBool(b), TypeKind::Complex) => {
            Value::ConstComplex(Complex::new(*b as u8 as Real, 0.0))
        }
        (Value::ConstInt(i), TypeKind::Real) => Value::ConstReal(*i as Real),
        (Value::ConstInt(i), TypeKind::Complex) => Value::ConstComplex(Complex::new(*i as Real, 0.0)),
        (Value::ConstReal(r), TypeKind::Complex) => Value::ConstComplex(Complex::new(*r, 0.0)),
        // The widening chain extends element-wise to matrices, so a matrix
        // literal that typed as real still satisfies a complex-matrix
        // parameter (e.g. a real-valued unitary).
        (
            Value::ConstRealMatrix(matrix),
            TypeKind::ComplexMatrix { num_rows, num_cols },
        ) => {
            let rows_ok = num_rows.map_or(true, |rows| rows == matrix.num_rows());
            let cols_ok = num_cols.map_or(true, |cols| cols == matrix.num_cols());
            if !rows_ok || !cols_ok {
                return None;
            }
            let data = matrix
                .data()
                .iter()
                .map(|&real| Complex::new(real, 0.0))
                .collect();
            Value::ConstComplexMatrix(CMatrix::new(data, matrix.num_cols()))
        }
        _ => return None,
    };
    Some(promoted)
}

/// Clears the assignable flag of `typ`, as needed when an l-value's type is
/// used as the expected type of an r-value.
pub fn as_rvalue_type(mut typ: Type) -> Type {
    typ.assignable = Assignable::False;
    typ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_of_refs() {
        assert_eq!(
            Value::QubitRefs(vec![0, 1]).type_of(),
            Type::assignable(TypeKind::Qubit)
        );
        assert_eq!(
            Value::BitRefs(vec![0]).type_of(),
            Type::assignable(TypeKind::Bool)
        );
    }

    #[test]
    fn test_promote_widening() {
        let promoted = promote(Value::ConstInt(3), &Type::new(TypeKind::Real));
        assert_eq!(promoted, Some(Value::ConstReal(3.0)));
        let promoted = promote(Value::ConstBool(true), &Type::new(TypeKind::Int));
        assert_eq!(promoted, Some(Value::ConstInt(1)));
        let promoted = promote(Value::ConstReal(1.5), &Type::new(TypeKind::Complex));
        assert_eq!(promoted, Some(Value::ConstComplex(Complex::new(1.5, 0.0))));
    }

    #[test]
    fn test_promote_no_narrowing() {
        assert_eq!(promote(Value::ConstInt(1), &Type::new(TypeKind::Bool)), None);
        assert_eq!(promote(Value::ConstReal(1.0), &Type::new(TypeKind::Int)), None);
    }

    #[test]
    fn test_promote_dynamic_passthrough() {
        // An int variable satisfies a read-only int parameter unchanged.
        let var_ref = Value::VariableRef(VariableRef {
            variable: 0,
            typ: Type::assignable(TypeKind::Int),
        });
        assert_eq!(
            promote(var_ref.clone(), &Type::new(TypeKind::Int)),
            Some(var_ref.clone())
        );
        // But it is not silently converted to real.
        assert_eq!(promote(var_ref, &Type::new(TypeKind::Real)), None);
    }

    #[test]
    fn test_promote_real_matrix_to_complex() {
        let matrix = Value::ConstRealMatrix(RMatrix::new(vec![0.0, 1.0, 1.0, 0.0], 2));
        let expected = Type::new(TypeKind::ComplexMatrix {
            num_rows: Some(2),
            num_cols: Some(2),
        });
        match promote(matrix.clone(), &expected) {
            Some(Value::ConstComplexMatrix(complex)) => {
                assert_eq!(complex.at(0, 1), Complex::new(1.0, 0.0));
            }
            other => panic!("expected complex matrix, got {other:?}"),
        }
        // Shape constraints still apply.
        let wrong_shape = Type::new(TypeKind::ComplexMatrix {
            num_rows: Some(4),
            num_cols: Some(4),
        });
        assert_eq!(promote(matrix, &wrong_shape), None);
    }

    #[test]
    fn test_promote_refs_to_bool() {
        // A bit reference is a valid boolean (e.g. as a condition).
        let refs = Value::BitRefs(vec![0]);
        assert_eq!(
            promote(refs.clone(), &Type::new(TypeKind::Bool)),
            Some(refs)
        );
        // A qubit reference is not.
        assert_eq!(
            promote(Value::QubitRefs(vec![0]), &Type::new(TypeKind::Bool)),
            None
        );
    }
}
