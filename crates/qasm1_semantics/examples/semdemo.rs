// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use qasm1_ast::ast::{
    self, Assignment, BinaryOp, Expression, ForLoop, IfElse, IfElseBranch, IndexEntry,
    Instruction, Mapping, Variables,
};
use qasm1_semantics::{default_analyzer, AnalysisResult};

#[derive(Parser)]
#[command(name = "semdemo")]
#[command(about = "Demo of the semantic analyzer on programmatically built ASTs.")]
#[command(long_about = "
Demo of the semantic analyzer on programmatically built ASTs.

There is no parser in this workspace, so the demo builds the syntax trees in
code, runs them through an analyzer configured with the default instruction
set, and prints the semantic tree to stdout. Diagnostics go to stderr,
preceded by their source location; the exit code is nonzero when any were
collected. Set RUST_LOG=qasm1_semantics=debug to watch the pass.
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Maximum language version the analyzer accepts.
    #[arg(long, default_value = "1.2")]
    api_version: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a small Bell-pair circuit (flat 1.0 style)
    Bell,

    /// Analyze a 1.2 program with structured control flow
    Structured,

    /// Analyze a deliberately broken program to show diagnostics
    Broken,
}

fn q(index: i64) -> Expression {
    Expression::index(Expression::ident("q"), vec![IndexEntry::at(index)])
}

fn b(index: i64) -> Expression {
    Expression::index(Expression::ident("b"), vec![IndexEntry::at(index)])
}

fn bell_program() -> ast::Program {
    ast::Program::new(
        ast::Version::new([1, 0]),
        Some(Expression::int(2)),
        vec![
            Instruction::new("h", vec![q(0)]).to_statement(),
            Instruction::new("cnot", vec![q(0), q(1)]).to_statement(),
            Instruction::new("measure", vec![b(0), q(0)]).to_statement(),
            Instruction::new("measure", vec![b(1), q(1)]).to_statement(),
        ],
    )
}

fn structured_program() -> ast::Program {
    let i = || Expression::ident("i");
    ast::Program::new(
        ast::Version::new([1, 2]),
        Some(Expression::int(2)),
        vec![
            Mapping::new(
                "angle",
                Expression::binary(BinaryOp::Divide, Expression::ident("pi"), Expression::int(4)),
            )
            .to_statement(),
            Variables::new("int", vec!["i"]).to_statement(),
            ForLoop::new(
                Some(Assignment::new(i(), Expression::int(0))),
                Expression::binary(BinaryOp::CmpLt, i(), Expression::int(4)),
                Some(Assignment::new(
                    i(),
                    Expression::binary(BinaryOp::Add, i(), Expression::int(1)),
                )),
                vec![
                    Instruction::new("rx", vec![q(0), Expression::ident("angle")]).to_statement(),
                ],
            )
            .to_statement(),
            IfElse::new(
                vec![IfElseBranch::new(
                    b(0),
                    vec![Instruction::new("x", vec![q(1)]).to_statement()],
                )],
                None,
            )
            .to_statement(),
        ],
    )
}

fn broken_program() -> ast::Program {
    ast::Program::new(
        ast::Version::new([1, 0]),
        Some(Expression::int(2)),
        vec![
            // Out-of-range index.
            Instruction::new("h", vec![q(2)]).to_statement(),
            // Reused qubit.
            Instruction::new("cnot", vec![q(0), q(0)]).to_statement(),
            // Unknown instruction.
            Instruction::new("hadamard", vec![q(0)]).to_statement(),
        ],
    )
}

fn report(result: AnalysisResult) -> ExitCode {
    if let Some(root) = &result.root {
        println!("{root:#?}");
    }
    result
        .write_errors(&mut std::io::stderr())
        .expect("failed to write diagnostics");
    ExitCode::from(result.exit_code() as u8)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let analyzer = default_analyzer(&cli.api_version);

    let program = match cli.command {
        Commands::Bell => bell_program(),
        Commands::Structured => structured_program(),
        Commands::Broken => broken_program(),
    };
    report(analyzer.analyze(&program))
}
