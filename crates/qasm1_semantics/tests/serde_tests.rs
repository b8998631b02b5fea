// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

// Round-trip and determinism properties of the semantic output tree.

use qasm1_ast::ast::{self, BinaryOp, Expression, IndexEntry, Instruction, Mapping};
use qasm1_ast::SourceLocation;
use qasm1_semantics::{asg, default_analyzer};

fn q(index: i64) -> Expression {
    Expression::index(Expression::ident("q"), vec![IndexEntry::at(index)])
}

fn b(index: i64) -> Expression {
    Expression::index(Expression::ident("b"), vec![IndexEntry::at(index)])
}

fn loc(line: u32) -> SourceLocation {
    SourceLocation::point(Some("test.qasm"), line, 1)
}

fn example_program() -> ast::Program {
    ast::Program::new(
        ast::Version::new([1, 2]),
        Some(Expression::int(2)),
        vec![
            Mapping::new(
                "angle",
                Expression::binary(
                    BinaryOp::Divide,
                    Expression::ident("pi"),
                    Expression::int(2),
                ),
            )
            .with_location(loc(3))
            .to_statement(),
            ast::Subcircuit::new("start", None).to_statement(),
            Instruction::new("h", vec![q(0)]).to_statement(),
            Instruction::new("rx", vec![q(1), Expression::ident("angle")]).to_statement(),
            Instruction::new("measure", vec![b(0), q(0)])
                .with_condition(b(1))
                .to_statement(),
            Instruction::new("goto", vec![Expression::ident("end")]).to_statement(),
            ast::Subcircuit::new("end", None).to_statement(),
        ],
    )
}

fn analyze() -> asg::Program {
    let result = default_analyzer("1.2").analyze(&example_program());
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    result.root.unwrap()
}

#[test]
fn test_serde_round_trip() {
    let root = analyze();
    let serialized = serde_json::to_string(&root).unwrap();
    let deserialized: asg::Program = serde_json::from_str(&serialized).unwrap();
    assert_eq!(root, deserialized);
}

#[test]
fn test_analysis_is_deterministic() {
    // Same AST, same configuration: byte-identical serialized trees, in
    // particular a stable mapping order despite the hash-keyed tables.
    let first = serde_json::to_string(&analyze()).unwrap();
    for _ in 0..5 {
        let next = serde_json::to_string(&analyze()).unwrap();
        assert_eq!(first, next);
    }
}

#[test]
fn test_descriptor_survives_round_trip() {
    let root = analyze();
    let serialized = serde_json::to_string(&root).unwrap();
    let deserialized: asg::Program = serde_json::from_str(&serialized).unwrap();

    let body = deserialized.subcircuit("start").unwrap().body.as_ref().unwrap();
    let bundle = match &body.statements[0] {
        asg::Statement::Bundle(bundle) => bundle,
        other => panic!("expected bundle, got {other:?}"),
    };
    let descriptor = bundle.items[0].instruction.as_ref().unwrap();
    assert_eq!(descriptor.name, "h");
    assert!(descriptor.allow_parallel);
}
