// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! The default mappings (constants and axes) and the default function
//! registry: the operator set plus the usual scalar math functions.
//!
//! Every implementation constant-folds when all promoted arguments are
//! constants and otherwise returns a deferred `Function` value carrying the
//! uncomputed call. Whether deferral is allowed at all (1.1+) is the
//! expression analyzer's concern, not the implementations'.

use std::f64::consts::{E, PI, TAU};
use std::sync::Arc;

use crate::primitives::{Complex, Int, Real};
use crate::resolver::{FunctionImpl, FunctionTable, MappingTable};
use crate::semantic_error::AnalysisError;
use crate::types::{self, Type, TypeKind};
use crate::values::{FunctionValue, Value};

/// Installs the default mappings: the axes, boolean literals, and the usual
/// mathematical constants (`pi`, `eu`/`e`, `tau`, the imaginary unit `im`).
pub fn register_default_mappings(mappings: &mut MappingTable) {
    use crate::primitives::Axis;
    mappings.add("x", Value::ConstAxis(Axis::X), None);
    mappings.add("y", Value::ConstAxis(Axis::Y), None);
    mappings.add("z", Value::ConstAxis(Axis::Z), None);
    mappings.add("true", Value::ConstBool(true), None);
    mappings.add("false", Value::ConstBool(false), None);
    mappings.add("pi", Value::ConstReal(PI), None);
    mappings.add("eu", Value::ConstReal(E), None);
    mappings.add("e", Value::ConstReal(E), None);
    mappings.add("tau", Value::ConstReal(TAU), None);
    mappings.add("im", Value::ConstComplex(Complex::new(0.0, 1.0)), None);
}

fn defer(name: &str, return_type: Type, operands: Vec<Value>) -> Value {
    Value::Function(Box::new(FunctionValue {
        name: name.to_string(),
        operands,
        return_type,
    }))
}

fn unary_int_op(name: &str, f: fn(Int) -> Int) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match args[0] {
        Value::ConstInt(a) => Ok(Value::ConstInt(f(a))),
        _ => Ok(defer(&name, Type::new(TypeKind::Int), args)),
    })
}

fn unary_real_op(name: &str, f: fn(Real) -> Real) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match args[0] {
        Value::ConstReal(a) => Ok(Value::ConstReal(f(a))),
        _ => Ok(defer(&name, Type::new(TypeKind::Real), args)),
    })
}

fn unary_complex_op(name: &str, f: fn(Complex) -> Complex) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match args[0] {
        Value::ConstComplex(a) => Ok(Value::ConstComplex(f(a))),
        _ => Ok(defer(&name, Type::new(TypeKind::Complex), args)),
    })
}

fn unary_bool_op(name: &str, f: fn(bool) -> bool) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match args[0] {
        Value::ConstBool(a) => Ok(Value::ConstBool(f(a))),
        _ => Ok(defer(&name, Type::new(TypeKind::Bool), args)),
    })
}

fn binary_int_op(name: &str, f: fn(Int, Int) -> Result<Int, AnalysisError>) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match (&args[0], &args[1]) {
        (Value::ConstInt(a), Value::ConstInt(b)) => Ok(Value::ConstInt(f(*a, *b)?)),
        _ => Ok(defer(&name, Type::new(TypeKind::Int), args)),
    })
}

fn binary_real_op(name: &str, f: fn(Real, Real) -> Real) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match (&args[0], &args[1]) {
        (Value::ConstReal(a), Value::ConstReal(b)) => Ok(Value::ConstReal(f(*a, *b))),
        _ => Ok(defer(&name, Type::new(TypeKind::Real), args)),
    })
}

fn binary_complex_op(name: &str, f: fn(Complex, Complex) -> Complex) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match (&args[0], &args[1]) {
        (Value::ConstComplex(a), Value::ConstComplex(b)) => Ok(Value::ConstComplex(f(*a, *b))),
        _ => Ok(defer(&name, Type::new(TypeKind::Complex), args)),
    })
}

fn binary_bool_op(name: &str, f: fn(bool, bool) -> bool) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match (&args[0], &args[1]) {
        (Value::ConstBool(a), Value::ConstBool(b)) => Ok(Value::ConstBool(f(*a, *b))),
        _ => Ok(defer(&name, Type::new(TypeKind::Bool), args)),
    })
}

fn cmp_int_op(name: &str, f: fn(Int, Int) -> bool) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match (&args[0], &args[1]) {
        (Value::ConstInt(a), Value::ConstInt(b)) => Ok(Value::ConstBool(f(*a, *b))),
        _ => Ok(defer(&name, Type::new(TypeKind::Bool), args)),
    })
}

fn cmp_real_op(name: &str, f: fn(Real, Real) -> bool) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match (&args[0], &args[1]) {
        (Value::ConstReal(a), Value::ConstReal(b)) => Ok(Value::ConstBool(f(*a, *b))),
        _ => Ok(defer(&name, Type::new(TypeKind::Bool), args)),
    })
}

fn cmp_complex_op(name: &str, f: fn(Complex, Complex) -> bool) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |args: Vec<Value>| match (&args[0], &args[1]) {
        (Value::ConstComplex(a), Value::ConstComplex(b)) => Ok(Value::ConstBool(f(*a, *b))),
        _ => Ok(defer(&name, Type::new(TypeKind::Bool), args)),
    })
}

/// The ternary conditional. Folds only when the condition and both branches
/// are constant; a dynamic branch keeps the whole call deferred.
fn ternary_op(name: &str, result_kind: TypeKind) -> FunctionImpl {
    let name = name.to_string();
    Arc::new(move |mut args: Vec<Value>| {
        if let Value::ConstBool(condition) = args[0] {
            if args[1].is_constant() && args[2].is_constant() {
                let chosen = if condition { 1 } else { 2 };
                return Ok(args.swap_remove(chosen));
            }
        }
        Ok(defer(&name, Type::new(result_kind.clone()), args))
    })
}

fn shift_amount(b: Int) -> u32 {
    (b & 63) as u32
}

fn floor_div(a: Int, b: Int) -> Result<Int, AnalysisError> {
    if b == 0 {
        return Err(AnalysisError::domain("division by zero"));
    }
    if b == -1 {
        return Ok(a.wrapping_neg());
    }
    let quotient = a / b;
    let remainder = a % b;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

fn floor_mod(a: Int, b: Int) -> Result<Int, AnalysisError> {
    if b == 0 {
        return Err(AnalysisError::domain("division by zero"));
    }
    if b == -1 {
        return Ok(0);
    }
    let remainder = a % b;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}

/// Installs the operator functions and the scalar math functions.
pub fn register_default_functions(functions: &mut FunctionTable) {
    {
        let mut op = |symbol: &str, spec: &str, implementation: FunctionImpl| {
            let name = format!("operator{symbol}");
            functions.add(&name, types::from_spec(spec), implementation);
        };

        // Unary.
        op("-", "i", unary_int_op("operator-", Int::wrapping_neg));
        op("-", "r", unary_real_op("operator-", |a| -a));
        op("-", "c", unary_complex_op("operator-", |a| -a));
        op("~", "i", unary_int_op("operator~", |a| !a));
        op("!", "b", unary_bool_op("operator!", |a| !a));

        // Exponentiation and multiplicative.
        op("**", "rr", binary_real_op("operator**", Real::powf));
        op("**", "cc", binary_complex_op("operator**", |a, b| a.powc(b)));
        op("*", "ii", binary_int_op("operator*", |a, b| Ok(a.wrapping_mul(b))));
        op("*", "rr", binary_real_op("operator*", |a, b| a * b));
        op("*", "cc", binary_complex_op("operator*", |a, b| a * b));
        op("/", "rr", binary_real_op("operator/", |a, b| a / b));
        op("/", "cc", binary_complex_op("operator/", |a, b| a / b));
        op("//", "ii", binary_int_op("operator//", floor_div));
        op("//", "rr", binary_real_op("operator//", |a, b| (a / b).floor()));
        op("%", "ii", binary_int_op("operator%", floor_mod));

        // Additive.
        op("+", "ii", binary_int_op("operator+", |a, b| Ok(a.wrapping_add(b))));
        op("+", "rr", binary_real_op("operator+", |a, b| a + b));
        op("+", "cc", binary_complex_op("operator+", |a, b| a + b));
        op("-", "ii", binary_int_op("operator-", |a, b| Ok(a.wrapping_sub(b))));
        op("-", "rr", binary_real_op("operator-", |a, b| a - b));
        op("-", "cc", binary_complex_op("operator-", |a, b| a - b));

        // Shifts.
        op("<<", "ii", binary_int_op("operator<<", |a, b| Ok(a.wrapping_shl(shift_amount(b)))));
        op(">>", "ii", binary_int_op("operator>>", |a, b| Ok(a >> shift_amount(b))));
        op(
            ">>>",
            "ii",
            binary_int_op("operator>>>", |a, b| {
                Ok(((a as u64) >> shift_amount(b)) as Int)
            }),
        );

        // Comparison.
        op("==", "bb", binary_bool_op("operator==", |a, b| a == b));
        op("==", "ii", cmp_int_op("operator==", |a, b| a == b));
        op("==", "rr", cmp_real_op("operator==", |a, b| a == b));
        op("==", "cc", cmp_complex_op("operator==", |a, b| a == b));
        op("!=", "bb", binary_bool_op("operator!=", |a, b| a != b));
        op("!=", "ii", cmp_int_op("operator!=", |a, b| a != b));
        op("!=", "rr", cmp_real_op("operator!=", |a, b| a != b));
        op("!=", "cc", cmp_complex_op("operator!=", |a, b| a != b));
        op("<", "ii", cmp_int_op("operator<", |a, b| a < b));
        op("<", "rr", cmp_real_op("operator<", |a, b| a < b));
        op("<=", "ii", cmp_int_op("operator<=", |a, b| a <= b));
        op("<=", "rr", cmp_real_op("operator<=", |a, b| a <= b));
        op(">", "ii", cmp_int_op("operator>", |a, b| a > b));
        op(">", "rr", cmp_real_op("operator>", |a, b| a > b));
        op(">=", "ii", cmp_int_op("operator>=", |a, b| a >= b));
        op(">=", "rr", cmp_real_op("operator>=", |a, b| a >= b));

        // Bitwise and logical.
        op("&", "ii", binary_int_op("operator&", |a, b| Ok(a & b)));
        op("^", "ii", binary_int_op("operator^", |a, b| Ok(a ^ b)));
        op("|", "ii", binary_int_op("operator|", |a, b| Ok(a | b)));
        op("&&", "bb", binary_bool_op("operator&&", |a, b| a && b));
        op("^^", "bb", binary_bool_op("operator^^", |a, b| a ^ b));
        op("||", "bb", binary_bool_op("operator||", |a, b| a || b));

        // Ternary conditional.
        op("?:", "bbb", ternary_op("operator?:", TypeKind::Bool));
        op("?:", "bii", ternary_op("operator?:", TypeKind::Int));
        op("?:", "brr", ternary_op("operator?:", TypeKind::Real));
        op("?:", "bcc", ternary_op("operator?:", TypeKind::Complex));
    }

    // Scalar math functions.
    let real_fns: [(&str, fn(Real) -> Real); 13] = [
        ("sin", Real::sin),
        ("cos", Real::cos),
        ("tan", Real::tan),
        ("asin", Real::asin),
        ("acos", Real::acos),
        ("atan", Real::atan),
        ("sinh", Real::sinh),
        ("cosh", Real::cosh),
        ("tanh", Real::tanh),
        ("exp", Real::exp),
        ("log", Real::ln),
        ("sqrt", Real::sqrt),
        ("abs", Real::abs),
    ];
    for (name, f) in real_fns {
        functions.add(name, types::from_spec("r"), unary_real_op(name, f));
    }
    let complex_fns: [(&str, fn(Complex) -> Complex); 3] = [
        ("exp", |z| z.exp()),
        ("log", |z| z.ln()),
        ("sqrt", |z| z.sqrt()),
    ];
    for (name, f) in complex_fns {
        functions.add(name, types::from_spec("c"), unary_complex_op(name, f));
    }
    functions.add("abs", types::from_spec("i"), unary_int_op("abs", Int::wrapping_abs));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;
    use crate::values::VariableRef;

    fn default_functions() -> FunctionTable {
        let mut functions = FunctionTable::new();
        register_default_functions(&mut functions);
        functions
    }

    fn int_var() -> Value {
        Value::VariableRef(VariableRef {
            variable: 0,
            typ: Type::assignable(TypeKind::Int),
        })
    }

    #[test]
    fn test_fold_arithmetic() {
        let functions = default_functions();
        let result = functions
            .call("operator+", vec![Value::ConstInt(1), Value::ConstInt(2)])
            .unwrap();
        assert_eq!(result, Value::ConstInt(3));
        // Mixed int/real promotes to the real overload.
        let result = functions
            .call("operator+", vec![Value::ConstInt(1), Value::ConstReal(2.5)])
            .unwrap();
        assert_eq!(result, Value::ConstReal(3.5));
    }

    #[test]
    fn test_floor_division_and_modulo() {
        let functions = default_functions();
        let div = |a: Int, b: Int| {
            functions
                .call("operator//", vec![Value::ConstInt(a), Value::ConstInt(b)])
                .unwrap()
        };
        assert_eq!(div(7, 2), Value::ConstInt(3));
        assert_eq!(div(-7, 2), Value::ConstInt(-4));
        let rem = |a: Int, b: Int| {
            functions
                .call("operator%", vec![Value::ConstInt(a), Value::ConstInt(b)])
                .unwrap()
        };
        assert_eq!(rem(7, 2), Value::ConstInt(1));
        assert_eq!(rem(-7, 2), Value::ConstInt(1));
    }

    #[test]
    fn test_division_by_zero() {
        let functions = default_functions();
        let err = functions
            .call("operator//", vec![Value::ConstInt(1), Value::ConstInt(0)])
            .unwrap_err();
        assert_eq!(err.message(), "division by zero");
    }

    #[test]
    fn test_comparison_folds_to_bool() {
        let functions = default_functions();
        let result = functions
            .call("operator<", vec![Value::ConstInt(1), Value::ConstReal(1.5)])
            .unwrap();
        assert_eq!(result, Value::ConstBool(true));
    }

    #[test]
    fn test_dynamic_argument_defers() {
        let functions = default_functions();
        let result = functions
            .call("operator+", vec![int_var(), Value::ConstInt(2)])
            .unwrap();
        match result {
            Value::Function(function) => {
                assert_eq!(function.name, "operator+");
                assert_eq!(function.return_type, Type::new(TypeKind::Int));
                assert_eq!(function.operands.len(), 2);
            }
            other => panic!("expected deferred function value, got {other:?}"),
        }
    }

    #[test]
    fn test_ternary_folds() {
        let functions = default_functions();
        let result = functions
            .call(
                "operator?:",
                vec![Value::ConstBool(false), Value::ConstInt(1), Value::ConstInt(2)],
            )
            .unwrap();
        assert_eq!(result, Value::ConstInt(2));
    }

    #[test]
    fn test_math_functions() {
        let functions = default_functions();
        let result = functions.call("sqrt", vec![Value::ConstReal(4.0)]).unwrap();
        assert_eq!(result, Value::ConstReal(2.0));
        // Integer argument promotes to the real overload.
        let result = functions.call("sqrt", vec![Value::ConstInt(9)]).unwrap();
        assert_eq!(result, Value::ConstReal(3.0));
        // But abs has a dedicated integer overload.
        let result = functions.call("abs", vec![Value::ConstInt(-3)]).unwrap();
        assert_eq!(result, Value::ConstInt(3));
    }

    #[test]
    fn test_case_insensitive_function_names() {
        let functions = default_functions();
        let result = functions.call("SQRT", vec![Value::ConstReal(4.0)]).unwrap();
        assert_eq!(result, Value::ConstReal(2.0));
    }
}
