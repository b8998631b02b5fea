// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

// End-to-end tests for the flat (1.0/1.1) analysis path: bundles, mappings,
// variables, the qubits statement, version gating, the error model, and the
// analysis entry points.

use qasm1_ast::ast::{self, BinaryOp, Expression, IndexEntry, Instruction, Mapping, Variables};
use qasm1_ast::parse::{ParseError, ParseResult, SourceParser};
use qasm1_ast::SourceLocation;
use qasm1_semantics::values::Value;
use qasm1_semantics::{asg, default_analyzer, Analyzer};

fn loc(line: u32) -> SourceLocation {
    SourceLocation::point(Some("test.qasm"), line, 1)
}

fn q(index: i64) -> Expression {
    Expression::index(Expression::ident("q"), vec![IndexEntry::at(index)])
}

fn b(index: i64) -> Expression {
    Expression::index(Expression::ident("b"), vec![IndexEntry::at(index)])
}

fn program(version: &[i64], num_qubits: i64, statements: Vec<ast::Statement>) -> ast::Program {
    ast::Program::new(
        ast::Version::new(version),
        Some(Expression::int(num_qubits)),
        statements,
    )
}

fn analyze_ok(analyzer: &Analyzer, ast_program: &ast::Program) -> asg::Program {
    let result = analyzer.analyze(ast_program);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    result.root.unwrap()
}

#[test]
fn test_simple_circuit() {
    let ast_program = program(
        &[1, 0],
        2,
        vec![
            Instruction::new("h", vec![q(0)]).to_statement(),
            Instruction::new("cnot", vec![q(0), q(1)]).to_statement(),
            Instruction::new("measure", vec![b(0), q(0)]).to_statement(),
        ],
    );
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);

    assert_eq!(root.num_qubits, 2);
    assert_eq!(root.subcircuits.len(), 1);
    let subcircuit = &root.subcircuits[0];
    assert_eq!(subcircuit.name, "");
    assert_eq!(subcircuit.iterations, 1);
    assert!(subcircuit.body.is_none());
    assert_eq!(subcircuit.bundles.len(), 3);
    for bundle in &subcircuit.bundles {
        assert_eq!(bundle.items.len(), 1);
    }

    let h = &subcircuit.bundles[0].items[0];
    assert_eq!(h.name, "h");
    assert!(h.instruction.is_some());
    assert_eq!(h.operands, vec![Value::QubitRefs(vec![0])]);
    assert_eq!(h.condition, Value::ConstBool(true));

    let cnot = &subcircuit.bundles[1].items[0];
    assert_eq!(
        cnot.operands,
        vec![Value::QubitRefs(vec![0]), Value::QubitRefs(vec![1])]
    );

    let measure = &subcircuit.bundles[2].items[0];
    assert_eq!(
        measure.operands,
        vec![Value::BitRefs(vec![0]), Value::QubitRefs(vec![0])]
    );
}

#[test]
fn test_mapping_shadowing_keeps_last_declaration() {
    let ast_program = program(
        &[1, 1],
        1,
        vec![
            Mapping::new("x", Expression::int(3))
                .with_location(loc(3))
                .to_statement(),
            Mapping::new(
                "x",
                Expression::binary(BinaryOp::Add, Expression::ident("x"), Expression::int(1)),
            )
            .with_location(loc(4))
            .to_statement(),
        ],
    );
    let root = analyze_ok(&default_analyzer("1.1"), &ast_program);

    // The mapping table is keyed by name, so the final program list holds a
    // single entry for x: the latest binding, with x folded through it.
    assert_eq!(root.mappings.len(), 1);
    assert_eq!(root.mappings[0].name, "x");
    assert_eq!(root.mappings[0].value, Value::ConstInt(4));
    assert_eq!(root.mappings[0].location, Some(loc(4)));
}

#[test]
fn test_mappings_sorted_by_source_location() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![
            Mapping::new("second", Expression::int(2))
                .with_location(loc(4))
                .to_statement(),
            Mapping::new("first", Expression::int(1))
                .with_location(loc(3))
                .to_statement(),
        ],
    );
    // Statement order deliberately disagrees with location order; the sort
    // by location must win regardless of the hash table's iteration order.
    let mut statements = ast_program.statements.clone();
    statements.swap(0, 1);
    let swapped = ast::Program::new(
        ast_program.version.clone(),
        ast_program.num_qubits.clone(),
        statements,
    );

    for input in [&ast_program, &swapped] {
        let root = analyze_ok(&default_analyzer("1.0"), input);
        let names: Vec<&str> = root.mappings.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}

#[test]
fn test_non_parallel_instruction_in_bundle() {
    let bundle = ast::Bundle::new(vec![
        Instruction::new("h", vec![q(0)]),
        Instruction::new("cnot", vec![q(0), q(1)]),
    ]);
    let ast_program = program(&[1, 0], 2, vec![bundle.to_statement()]);
    let result = default_analyzer("1.0").analyze(&ast_program);

    assert_eq!(result.errors.len(), 1);
    let message = result.errors[0].message();
    assert!(message.contains("cnot"), "message: {message}");
    assert!(message.contains("not parallelizable"), "message: {message}");
    assert!(message.contains("1 other instruction"), "message: {message}");
}

#[test]
fn test_parallel_bundle_is_accepted() {
    let bundle = ast::Bundle::new(vec![
        Instruction::new("h", vec![q(0)]),
        Instruction::new("x", vec![q(1)]),
    ]);
    let ast_program = program(&[1, 0], 2, vec![bundle.to_statement()]);
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert_eq!(root.subcircuits[0].bundles.len(), 1);
    assert_eq!(root.subcircuits[0].bundles[0].items.len(), 2);
}

#[test]
fn test_zero_qubits_is_rejected() {
    let ast_program = program(&[1, 0], 0, vec![]);
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message(), "invalid number of qubits");
}

#[test]
fn test_missing_qubits_statement() {
    // Below 1.1 the qubits statement is mandatory.
    let ast_program = ast::Program::new(ast::Version::new([1, 0]), None, vec![]);
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0]
        .message()
        .contains("missing qubits statement"));

    // From 1.1 its absence means qubit variables are used; num_qubits is 0.
    let ast_program = ast::Program::new(ast::Version::new([1, 1]), None, vec![]);
    let root = analyze_ok(&default_analyzer("1.1"), &ast_program);
    assert_eq!(root.num_qubits, 0);
}

#[test]
fn test_index_out_of_range() {
    let ast_program = program(&[1, 0], 2, vec![Instruction::new("h", vec![q(2)]).to_statement()]);
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message(), "index 2 out of range (size 2)");
}

#[test]
fn test_index_ranges_compose() {
    // Indexing picks from the indexed set, not the underlying register:
    // q[1..3][0] is qubit 1.
    let refs = Expression::index(
        Expression::index(Expression::ident("q"), vec![IndexEntry::range(1, 3)]),
        vec![IndexEntry::at(0)],
    );
    let ast_program = program(&[1, 0], 4, vec![Instruction::new("h", vec![refs]).to_statement()]);
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert_eq!(
        root.subcircuits[0].bundles[0].items[0].operands,
        vec![Value::QubitRefs(vec![1])]
    );
}

#[test]
fn test_backwards_index_range() {
    let refs = Expression::index(Expression::ident("q"), vec![IndexEntry::range(2, 1)]);
    let ast_program = program(&[1, 0], 4, vec![Instruction::new("h", vec![refs]).to_statement()]);
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "last index is lower than first index"
    );
}

#[test]
fn test_qubit_reuse_is_rejected() {
    let ast_program = program(
        &[1, 0],
        2,
        vec![Instruction::new("cnot", vec![q(0), q(0)]).to_statement()],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "qubit with index 0 is used more than once"
    );
}

#[test]
fn test_index_size_mismatch() {
    let two = Expression::index(Expression::ident("q"), vec![IndexEntry::range(0, 1)]);
    let ast_program = program(
        &[1, 0],
        3,
        vec![Instruction::new("cnot", vec![two, q(2)]).to_statement()],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "the number of indices (1) doesn't match previously found number of indices (2)"
    );
}

#[test]
fn test_condition_is_exempt_from_index_size_check() {
    // Single-gate-multiple-qubit notation with a single condition bit.
    let two = Expression::index(Expression::ident("q"), vec![IndexEntry::range(0, 1)]);
    let ast_program = program(
        &[1, 0],
        2,
        vec![Instruction::new("h", vec![two])
            .with_condition(b(0))
            .to_statement()],
    );
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    let h = &root.subcircuits[0].bundles[0].items[0];
    assert_eq!(h.condition, Value::BitRefs(vec![0]));
    assert_eq!(h.operands, vec![Value::QubitRefs(vec![0, 1])]);
}

#[test]
fn test_constant_false_condition_drops_bundle() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![Instruction::new("h", vec![q(0)])
            .with_condition(Expression::ident("false"))
            .to_statement()],
    );
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert!(root.subcircuits.is_empty());
}

#[test]
fn test_condition_must_be_boolean() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![Instruction::new("h", vec![q(0)])
            .with_condition(Expression::int(1))
            .to_statement()],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message(), "condition must be a boolean");
}

#[test]
fn test_unconditional_instruction_rejects_condition() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![Instruction::new("display", vec![])
            .with_condition(Expression::ident("true"))
            .to_statement()],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "conditional execution is not supported for this instruction"
    );
}

#[test]
fn test_unknown_instruction_and_mapping() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![
            Instruction::new("hadamard", vec![q(0)]).to_statement(),
            Instruction::new("h", vec![Expression::ident("foo")]).to_statement(),
        ],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(
        result.errors[0].message(),
        "failed to resolve instruction \"hadamard\""
    );
    assert_eq!(
        result.errors[1].message(),
        "failed to resolve mapping \"foo\""
    );
}

#[test]
fn test_overload_failure_reports_argument_pack() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![Instruction::new("h", vec![Expression::int(1)]).to_statement()],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "failed to resolve overload for h with argument pack (int)"
    );
}

#[test]
fn test_instruction_names_are_case_insensitive() {
    let ast_program = program(&[1, 0], 1, vec![Instruction::new("H", vec![q(0)]).to_statement()]);
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert_eq!(root.subcircuits[0].bundles[0].items[0].name, "H");
}

#[test]
fn test_unresolved_instructions_without_registration() {
    // An analyzer with no registered instructions accepts anything and
    // leaves the descriptor slot empty.
    let mut analyzer = Analyzer::new("1.0");
    analyzer.register_default_functions_and_mappings();
    let ast_program = program(
        &[1, 0],
        1,
        vec![Instruction::new("anything_goes", vec![q(0), Expression::int(42)]).to_statement()],
    );
    let root = analyze_ok(&analyzer, &ast_program);
    let item = &root.subcircuits[0].bundles[0].items[0];
    assert!(item.instruction.is_none());
    assert_eq!(item.name, "anything_goes");
    assert_eq!(
        item.operands,
        vec![Value::QubitRefs(vec![0]), Value::ConstInt(42)]
    );
}

#[test]
fn test_descriptor_annotations_are_preserved() {
    use qasm1_semantics::instruction::Instruction as InstructionDescriptor;

    let mut analyzer = Analyzer::new("1.0");
    analyzer.register_default_functions_and_mappings();
    analyzer
        .register_instruction(InstructionDescriptor::new("h", "Q").with_annotation("backend:42"));

    let ast_program = program(&[1, 0], 1, vec![Instruction::new("h", vec![q(0)]).to_statement()]);
    let root = analyze_ok(&analyzer, &ast_program);
    let descriptor = root.subcircuits[0].bundles[0].items[0]
        .instruction
        .as_ref()
        .unwrap();
    assert_eq!(descriptor.annotations, vec!["backend:42".to_string()]);
}

#[test]
fn test_variables_declaration() {
    let ast_program = program(
        &[1, 1],
        1,
        vec![Variables::new("int", vec!["i", "j"]).to_statement()],
    );
    let root = analyze_ok(&default_analyzer("1.1"), &ast_program);
    assert_eq!(root.variables.len(), 2);
    assert_eq!(root.variables[0].name, "i");
    assert_eq!(root.variables[1].name, "j");
    assert!(root.variables[0].typ.is_assignable());
}

#[test]
fn test_variables_require_version_1_1() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![Variables::new("int", vec!["i"]).to_statement()],
    );
    let result = default_analyzer("1.2").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "variables are only supported from version 1.1 onwards"
    );
}

#[test]
fn test_unknown_variable_type() {
    let ast_program = program(
        &[1, 1],
        1,
        vec![Variables::new("quaternion", vec!["v"]).to_statement()],
    );
    let result = default_analyzer("1.1").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message(), "unknown type \"quaternion\"");
}

#[test]
fn test_dynamic_expressions_rejected_below_1_1() {
    use qasm1_semantics::types::{Type, TypeKind};
    use qasm1_semantics::values::VariableRef;

    let mut analyzer = default_analyzer("1.0");
    analyzer.register_mapping(
        "v",
        Value::VariableRef(VariableRef {
            variable: 0,
            typ: Type::assignable(TypeKind::Int),
        }),
    );
    let ast_program = program(
        &[1, 0],
        1,
        vec![Mapping::new("w", Expression::ident("v")).to_statement()],
    );
    let result = analyzer.analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "dynamic expressions are only supported from version 1.1 onwards"
    );
}

#[test]
fn test_file_version_above_api_version() {
    let ast_program = program(&[1, 2], 1, vec![]);
    let result = default_analyzer("1.1").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "the maximum QASM version supported is 1.1, but the file is version 1.2"
    );
    // Analysis proceeds with the API version so the tree is still usable.
    let root = result.root.unwrap();
    let api: qasm1_semantics::primitives::Version = "1.1".parse().unwrap();
    assert_eq!(root.version, api);
}

#[test]
fn test_negative_version_component() {
    let ast_program = ast::Program::new(
        ast::Version::new([1, -1]),
        Some(Expression::int(1)),
        vec![],
    );
    let result = default_analyzer("1.2").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message(), "invalid version component");
}

#[test]
fn test_matrix_literals() {
    let real = Expression::matrix(vec![
        vec![Expression::int(1), Expression::int(0)],
        vec![Expression::int(0), Expression::int(1)],
    ]);
    let complex = Expression::matrix(vec![
        vec![Expression::int(0), Expression::ident("im")],
        vec![Expression::unary(ast::UnaryOp::Negate, Expression::ident("im")), Expression::int(0)],
    ]);
    let ast_program = program(
        &[1, 0],
        1,
        vec![
            Mapping::new("mr", real).to_statement(),
            Mapping::new("mc", complex).to_statement(),
        ],
    );
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    let by_name = |name: &str| {
        root.mappings
            .iter()
            .find(|m| m.name == name)
            .unwrap()
            .value
            .clone()
    };
    match by_name("mr") {
        Value::ConstRealMatrix(matrix) => {
            assert_eq!(matrix.num_rows(), 2);
            assert_eq!(matrix.at(0, 0), 1.0);
        }
        other => panic!("expected real matrix, got {other:?}"),
    }
    match by_name("mc") {
        Value::ConstComplexMatrix(matrix) => {
            assert_eq!(matrix.at(0, 1).im, 1.0);
            assert_eq!(matrix.at(1, 0).im, -1.0);
        }
        other => panic!("expected complex matrix, got {other:?}"),
    }
}

#[test]
fn test_non_rectangular_matrix() {
    let ragged = Expression::matrix(vec![
        vec![Expression::int(1), Expression::int(2)],
        vec![Expression::int(3)],
    ]);
    let ast_program = program(&[1, 0], 1, vec![Mapping::new("m", ragged).to_statement()]);
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message(), "matrix is not rectangular");
}

#[test]
fn test_unitary_gate_takes_real_matrix_literal() {
    // A real-valued unitary widens element-wise to the complex matrix
    // parameter of the u gate.
    let not_gate = Expression::matrix(vec![
        vec![Expression::int(0), Expression::int(1)],
        vec![Expression::int(1), Expression::int(0)],
    ]);
    let ast_program = program(
        &[1, 0],
        1,
        vec![Instruction::new("u", vec![q(0), not_gate]).to_statement()],
    );
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    match &root.subcircuits[0].bundles[0].items[0].operands[1] {
        Value::ConstComplexMatrix(matrix) => assert_eq!(matrix.at(0, 1).re, 1.0),
        other => panic!("expected complex matrix operand, got {other:?}"),
    }
}

#[test]
fn test_error_model() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![Instruction::new(
            "error_model",
            vec![Expression::ident("depolarizing_channel"), Expression::real(0.001)],
        )
        .to_statement()],
    );
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    let error_model = root.error_model.as_ref().unwrap();
    assert_eq!(error_model.name, "depolarizing_channel");
    assert!(error_model.model.is_some());
    assert_eq!(error_model.operands, vec![Value::ConstReal(0.001)]);
    // The error model statement is not a bundle.
    assert!(root.subcircuits.is_empty());
}

#[test]
fn test_error_model_can_only_be_specified_once() {
    let model = |p: f64| {
        Instruction::new(
            "error_model",
            vec![Expression::ident("depolarizing_channel"), Expression::real(p)],
        )
        .to_statement()
    };
    let ast_program = program(&[1, 0], 1, vec![model(0.001), model(0.01)]);
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0]
        .message()
        .starts_with("error model can only be specified once"));
}

#[test]
fn test_error_model_name_must_be_identifier() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![Instruction::new("error_model", vec![Expression::real(0.5)]).to_statement()],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "first argument of an error model must be its name as an identifier"
    );
}

#[test]
fn test_subcircuit_iterations() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![
            ast::Subcircuit::new("loop", Some(Expression::int(10))).to_statement(),
            Instruction::new("h", vec![q(0)]).to_statement(),
        ],
    );
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert_eq!(root.subcircuits.len(), 1);
    assert_eq!(root.subcircuits[0].name, "loop");
    assert_eq!(root.subcircuits[0].iterations, 10);
    assert_eq!(root.subcircuits[0].bundles.len(), 1);
}

#[test]
fn test_subcircuit_iterations_must_be_positive() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![ast::Subcircuit::new("loop", Some(Expression::int(0))).to_statement()],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "subcircuit iteration count must be positive, but is 0"
    );
}

#[test]
fn test_duplicate_subcircuit_names() {
    let ast_program = program(
        &[1, 0],
        1,
        vec![
            ast::Subcircuit::new("body", None)
                .with_location(loc(3))
                .to_statement(),
            ast::Subcircuit::new("body", None)
                .with_location(loc(5))
                .to_statement(),
        ],
    );
    let result = default_analyzer("1.0").analyze(&ast_program);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "duplicate subcircuit name \"body\"; previous definition was at test.qasm:3:1"
    );
}

#[test]
fn test_expression_operators_fold() {
    // 2 ** 3 * (1 << 2) == 32.0: ** promotes to real, << stays integral.
    let expr = Expression::binary(
        BinaryOp::Multiply,
        Expression::binary(BinaryOp::Power, Expression::int(2), Expression::int(3)),
        Expression::binary(BinaryOp::ShiftLeft, Expression::int(1), Expression::int(2)),
    );
    let ast_program = program(&[1, 0], 1, vec![Mapping::new("m", expr).to_statement()]);
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert_eq!(root.mappings[0].value, Value::ConstReal(32.0));
}

#[test]
fn test_ternary_and_comparison_fold() {
    // (1 < 2) ? 10 : 20 == 10
    let expr = Expression::ternary(
        Expression::binary(BinaryOp::CmpLt, Expression::int(1), Expression::int(2)),
        Expression::int(10),
        Expression::int(20),
    );
    let ast_program = program(&[1, 0], 1, vec![Mapping::new("m", expr).to_statement()]);
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert_eq!(root.mappings[0].value, Value::ConstInt(10));
}

#[test]
fn test_function_calls_fold() {
    let expr = Expression::call("sqrt", vec![Expression::real(16.0)]);
    let ast_program = program(&[1, 0], 1, vec![Mapping::new("m", expr).to_statement()]);
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert_eq!(root.mappings[0].value, Value::ConstReal(4.0));
}

#[test]
fn test_qubits_count_from_expression() {
    // The qubit count expression is constant-folded through the scope.
    let ast_program = ast::Program::new(
        ast::Version::new([1, 0]),
        Some(Expression::binary(
            BinaryOp::Add,
            Expression::int(1),
            Expression::int(2),
        )),
        vec![Instruction::new("h", vec![q(2)]).to_statement()],
    );
    let root = analyze_ok(&default_analyzer("1.0"), &ast_program);
    assert_eq!(root.num_qubits, 3);
}

#[test]
fn test_analyze_parse_result_propagates_errors() {
    let analyzer = default_analyzer("1.0");
    let parse_result = ParseResult::failure(vec![ParseError::new(
        "unexpected token",
        Some(loc(7)),
    )]);
    let result = analyzer.analyze_parse_result(parse_result);
    assert!(result.root.is_none());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message(), "unexpected token");
    assert_eq!(result.exit_code(), 1);
}

#[test]
fn test_analyze_with_version_gate() {
    let analyzer = default_analyzer("1.1");
    // The version thunk runs first; parsing must not run when the version
    // exceeds the maximum.
    let result = analyzer.analyze_with(
        || Ok(ast::Version::new([1, 2])),
        || panic!("parser must not run when the version check fails"),
    );
    assert!(result.root.is_none());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message(),
        "the maximum QASM version supported is 1.1, but the file is version 1.2"
    );

    // An acceptable version defers to the parser.
    let ast_program = program(&[1, 0], 1, vec![]);
    let result = analyzer.analyze_with(
        || Ok(ast::Version::new([1, 0])),
        || ParseResult::success(ast_program),
    );
    assert!(result.succeeded());
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn test_analyze_string_through_source_parser() {
    use std::path::Path;

    struct FixedParser(ast::Program);
    impl SourceParser for FixedParser {
        fn parse_file(&self, _path: &Path) -> ParseResult {
            ParseResult::success(self.0.clone())
        }
        fn parse_string(&self, _data: &str, _file_name: Option<&str>) -> ParseResult {
            ParseResult::success(self.0.clone())
        }
    }

    let parser = FixedParser(program(
        &[1, 0],
        1,
        vec![Instruction::new("h", vec![q(0)]).to_statement()],
    ));
    let analyzer = default_analyzer("1.0");
    let result = analyzer.analyze_string(&parser, "h q[0]", Some("test.qasm"));
    assert!(result.succeeded());
    assert_eq!(result.root.unwrap().subcircuits[0].bundles.len(), 1);
}

#[test]
fn test_into_program_aggregates_errors() {
    let ast_program = program(&[1, 0], 0, vec![]);
    let result = default_analyzer("1.0").analyze(&ast_program);
    let failure = result.into_program().unwrap_err();
    assert_eq!(failure.errors.len(), 1);
    assert_eq!(failure.to_string(), "analysis failed with 1 error(s)");
}
