// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! The analyzer configuration object and the analysis entry points.
//!
//! Construction and the `register_*` methods set up the instruction set,
//! the classical function set, the initial mappings and the error models.
//! The `analyze*` methods never mutate that configuration: each invocation
//! gets a fresh scope stack seeded from it, so one configured analyzer can
//! serve any number of analyses.

use std::io;
use std::path::Path;

use qasm1_ast::ast;
use qasm1_ast::parse::{ParseError, ParseResult, SourceParser};

use crate::asg;
use crate::ast_to_semantics::AnalyzerHelper;
use crate::error_model::ErrorModel;
use crate::functions;
use crate::instruction::Instruction;
use crate::primitives::Version;
use crate::resolver::{ErrorModelTable, FunctionImpl, FunctionTable, InstructionTable, MappingTable};
use crate::semantic_error::{AnalysisError, AnalysisFailed};
use crate::types::ParamTypeSpec;
use crate::values::Value;

/// The result of one analysis: the semantic tree (possibly partial) and the
/// diagnostics collected along the way. A populated root together with a
/// non-empty error list is valid and expected; tooling consumers rely on
/// such partial results.
#[derive(Clone, Debug)]
pub struct AnalysisResult {
    pub root: Option<asg::Program>,
    pub errors: Vec<AnalysisError>,
}

impl AnalysisResult {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the program when analysis was strictly successful, or all
    /// collected diagnostics as one aggregate failure.
    pub fn into_program(self) -> Result<asg::Program, AnalysisFailed> {
        if self.errors.is_empty() {
            Ok(self
                .root
                .expect("successful analysis must produce a program"))
        } else {
            Err(AnalysisFailed {
                errors: self.errors,
            })
        }
    }

    /// Writes every diagnostic to `writer`, one per line, preceded by its
    /// source location.
    pub fn write_errors(&self, writer: &mut dyn io::Write) -> io::Result<()> {
        for error in &self.errors {
            writeln!(writer, "{error}")?;
        }
        Ok(())
    }

    /// The process exit code for driver use: 0 on success, 1 when any error
    /// was collected.
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.errors.is_empty())
    }
}

/// The semantic analyzer. See the module documentation for the
/// configure-once, analyze-many lifecycle.
#[derive(Clone)]
pub struct Analyzer {
    api_version: Version,
    mappings: MappingTable,
    functions: FunctionTable,
    instruction_set: InstructionTable,
    resolve_instructions: bool,
    error_models: ErrorModelTable,
    resolve_error_model: bool,
}

impl Analyzer {
    /// Creates an analyzer supporting files up to `api_version`.
    ///
    /// # Panics
    ///
    /// Panics when `api_version` is not a valid version string; the version
    /// ceiling is part of the program configuration, not of the input.
    pub fn new(api_version: &str) -> Analyzer {
        Analyzer {
            api_version: api_version
                .parse()
                .expect("invalid API version string"),
            mappings: MappingTable::new(),
            functions: FunctionTable::new(),
            instruction_set: InstructionTable::new(),
            resolve_instructions: false,
            error_models: ErrorModelTable::new(),
            resolve_error_model: false,
        }
    }

    pub fn api_version(&self) -> &Version {
        &self.api_version
    }

    pub(crate) fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    pub(crate) fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub(crate) fn instruction_set(&self) -> &InstructionTable {
        &self.instruction_set
    }

    pub(crate) fn resolve_instructions(&self) -> bool {
        self.resolve_instructions
    }

    pub(crate) fn error_models(&self) -> &ErrorModelTable {
        &self.error_models
    }

    pub(crate) fn resolve_error_model(&self) -> bool {
        self.resolve_error_model
    }

    /// Registers a function usable within expressions. `param_types` is
    /// either an explicit type list or a shorthand spec string. The
    /// implementation receives the promoted arguments; it should fold to a
    /// constant when they are all constant and return a deferred `Function`
    /// value otherwise.
    pub fn register_function<P: ParamTypeSpec>(
        &mut self,
        name: &str,
        param_types: P,
        implementation: FunctionImpl,
    ) {
        self.functions
            .add(name, param_types.into_types(), implementation);
    }

    /// Registers an initial mapping from `name` to `value`.
    pub fn register_mapping(&mut self, name: &str, value: Value) {
        self.mappings.add(name, value, None);
    }

    /// Registers the default functions and mappings: the operator set, the
    /// usual math functions, and the constants/axes (see the functions
    /// module).
    pub fn register_default_functions_and_mappings(&mut self) {
        functions::register_default_mappings(&mut self.mappings);
        functions::register_default_functions(&mut self.functions);
    }

    /// Registers an instruction type. Until the first call, instruction
    /// resolution is disabled entirely: any name and operand list goes, and
    /// the semantic instruction nodes carry no descriptor.
    pub fn register_instruction(&mut self, instruction: Instruction) {
        self.resolve_instructions = true;
        self.instruction_set.add(instruction);
    }

    /// Registers an error model. As with instructions, the first call
    /// enables resolution of the `error_model` meta-instruction.
    pub fn register_error_model(&mut self, model: ErrorModel) {
        self.resolve_error_model = true;
        self.error_models.add(model);
    }

    /// Analyzes the given program AST.
    pub fn analyze(&self, program: &ast::Program) -> AnalysisResult {
        AnalyzerHelper::new(self).analyze(program)
    }

    /// Analyzes the given parse result. Parse errors are moved into the
    /// analysis result verbatim, and the root is left empty.
    pub fn analyze_parse_result(&self, parse_result: ParseResult) -> AnalysisResult {
        if !parse_result.errors.is_empty() {
            return AnalysisResult {
                root: None,
                errors: parse_result
                    .errors
                    .into_iter()
                    .map(AnalysisError::from)
                    .collect(),
            };
        }
        match parse_result.root {
            Some(program) => self.analyze(&program),
            None => panic!("parse result carries neither errors nor a root node"),
        }
    }

    /// Parses and analyzes using the given version and parser closures. The
    /// version is checked before parsing runs: a file version beyond the
    /// configured maximum immediately yields a single-error result.
    pub fn analyze_with<V, P>(&self, version: V, parse: P) -> AnalysisResult
    where
        V: FnOnce() -> Result<ast::Version, ParseError>,
        P: FnOnce() -> ParseResult,
    {
        match version() {
            Ok(version) => {
                let file_version = Version::new(version.items.clone());
                if file_version > self.api_version {
                    return AnalysisResult {
                        root: None,
                        errors: vec![AnalysisError::version(format!(
                            "the maximum QASM version supported is {}, but the file is version {}",
                            self.api_version, file_version
                        ))
                        .context(version.location.as_ref())],
                    };
                }
            }
            Err(error) => {
                return AnalysisResult {
                    root: None,
                    errors: vec![error.into()],
                }
            }
        }
        self.analyze_parse_result(parse())
    }

    /// Parses and analyzes the given file through an external parser.
    pub fn analyze_file<P: SourceParser>(
        &self,
        parser: &P,
        path: impl AsRef<Path>,
    ) -> AnalysisResult {
        self.analyze_parse_result(parser.parse_file(path.as_ref()))
    }

    /// Parses and analyzes the given string through an external parser. The
    /// optional file name is used only for diagnostics.
    pub fn analyze_string<P: SourceParser>(
        &self,
        parser: &P,
        data: &str,
        file_name: Option<&str>,
    ) -> AnalysisResult {
        self.analyze_parse_result(parser.parse_string(data, file_name))
    }
}

/// Constructs an analyzer with the default functions, mappings, instruction
/// set and error models for the given API version already registered.
pub fn default_analyzer(api_version: &str) -> Analyzer {
    let mut analyzer = Analyzer::new(api_version);
    analyzer.register_default_functions_and_mappings();

    // Single-qubit gates; these may be freely bundled.
    for name in [
        "i", "h", "x", "y", "z", "s", "sdag", "t", "tdag", "x90", "y90", "mx90", "my90",
        "prep_x", "prep_y", "prep_z",
    ] {
        analyzer.register_instruction(Instruction::new(name, "Q"));
    }
    // Rotations with an angle parameter.
    for name in ["rx", "ry", "rz"] {
        analyzer.register_instruction(Instruction::new(name, "Qr"));
    }
    analyzer.register_instruction(Instruction::new("u", "Qu"));

    // Multi-qubit gates are not parallelizable in the default set.
    for name in ["cnot", "cz", "swap"] {
        analyzer.register_instruction(Instruction::new(name, "QQ").with_parallel(false));
    }
    analyzer.register_instruction(Instruction::new("crk", "QQi").with_parallel(false));
    analyzer.register_instruction(Instruction::new("cr", "QQr").with_parallel(false));
    analyzer.register_instruction(Instruction::new("toffoli", "QQQ").with_parallel(false));

    // Measurement and display.
    analyzer.register_instruction(Instruction::new("measure", "BQ"));
    analyzer.register_instruction(Instruction::new("measure_z", "BQ"));
    analyzer.register_instruction(Instruction::new("measure_all", "").with_parallel(false));
    analyzer.register_instruction(
        Instruction::new("display", "")
            .with_conditional(false)
            .with_parallel(false),
    );
    analyzer.register_instruction(
        Instruction::new("display", "B")
            .with_conditional(false)
            .with_parallel(false),
    );

    analyzer.register_error_model(ErrorModel::new("depolarizing_channel", "r"));

    analyzer
}
