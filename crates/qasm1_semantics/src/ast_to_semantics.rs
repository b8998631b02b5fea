// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Builds the semantic tree defined in asg.rs from the syntactic AST.
//!
//! The pass is a strictly synchronous recursive descent. Each statement is a
//! recovery point: analysis errors raised while analyzing a statement are
//! recorded on the result and the pass continues with the next statement.
//! Expression-level errors propagate to the statement boundary with `?`.

use hashbrown::{HashMap, HashSet};
use tracing::{debug, trace};

use qasm1_ast::ast;
use qasm1_ast::location::SourceLocation;

use crate::analyzer::{AnalysisResult, Analyzer};
use crate::asg;
use crate::context::Scope;
use crate::primitives::{CMatrix, Int, RMatrix, Version};
use crate::semantic_error::AnalysisError;
use crate::types::{Type, TypeKind};
use crate::values::{self, Value, VariableRef};

/// One analysis invocation: the mutable state threaded through the
/// recursive descent. Configuration stays on the borrowed [`Analyzer`].
pub(crate) struct AnalyzerHelper<'a> {
    analyzer: &'a Analyzer,
    program: asg::Program,
    errors: Vec<AnalysisError>,
    scope_stack: Vec<Scope>,
}

impl<'a> AnalyzerHelper<'a> {
    pub(crate) fn new(analyzer: &'a Analyzer) -> AnalyzerHelper<'a> {
        let global_scope = Scope::new(
            analyzer.mappings().clone(),
            analyzer.functions().clone(),
            analyzer.instruction_set().clone(),
        );
        AnalyzerHelper {
            analyzer,
            program: asg::Program::new(analyzer.api_version().clone()),
            errors: Vec::new(),
            scope_stack: vec![global_scope],
        }
    }

    /// Runs the pass over the given AST and produces the analysis result.
    pub(crate) fn analyze(mut self, ast: &ast::Program) -> AnalysisResult {
        self.program.location = ast.location.clone();

        if let Err(err) = self.analyze_version(&ast.version) {
            self.errors.push(err.context(ast.version.location.as_ref()));
        }
        debug!(
            api_version = %self.program.api_version,
            file_version = %self.program.version,
            "analyzing program"
        );

        // Qubit variables can be used instead of the qubits statement from
        // 1.1 onwards, in which case num_qubits stays 0.
        match &ast.num_qubits {
            Some(count) => {
                if let Err(err) = self.analyze_qubits(count) {
                    self.errors.push(err.context(count.location.as_ref()));
                }
            }
            None => {
                if self.program.version < Version::new([1, 1]) {
                    self.errors.push(
                        AnalysisError::analysis(
                            "missing qubits statement (required until version 1.1)",
                        )
                        .context(ast.location.as_ref()),
                    );
                }
            }
        }

        self.analyze_statements(&ast.statements);
        self.resolve_subcircuits();
        self.collect_mappings();

        debug!(num_errors = self.errors.len(), "analysis finished");
        AnalysisResult {
            root: Some(self.program),
            errors: self.errors,
        }
    }

    fn current_scope(&self) -> &Scope {
        self.scope_stack.last().expect("scope stack is never empty")
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        self.scope_stack.last_mut().expect("scope stack is never empty")
    }

    /// Checks the AST version node against the configured API version and
    /// stores the file version. On failure the API version remains as the
    /// default so downstream version gates stay meaningful.
    fn analyze_version(&mut self, version: &ast::Version) -> Result<(), AnalysisError> {
        if version.items.iter().any(|&item| item < 0) {
            return Err(AnalysisError::version("invalid version component"));
        }
        let file_version = Version::new(version.items.clone());
        if file_version > *self.analyzer.api_version() {
            return Err(AnalysisError::version(format!(
                "the maximum QASM version supported is {}, but the file is version {}",
                self.analyzer.api_version(),
                file_version
            )));
        }
        self.program.version = file_version;
        Ok(())
    }

    /// Handles the qubits statement: folds the count, requires it to be
    /// positive, and installs the `q` and `b` register mappings.
    fn analyze_qubits(&mut self, count: &ast::Expression) -> Result<(), AnalysisError> {
        self.program.num_qubits = 0;
        let num_qubits = self.analyze_as_const_int(count)?;
        if num_qubits < 1 {
            return Err(AnalysisError::domain("invalid number of qubits"));
        }
        self.program.num_qubits = num_qubits;
        let all_indices: Vec<Int> = (0..num_qubits).collect();
        let scope = self.current_scope_mut();
        scope
            .mappings
            .add("q", Value::QubitRefs(all_indices.clone()), None);
        scope.mappings.add("b", Value::BitRefs(all_indices), None);
        Ok(())
    }

    /// Returns the index of the subcircuit currently being built, creating
    /// the implicit default subcircuit if none exists yet.
    fn current_subcircuit(&mut self, location: Option<SourceLocation>) -> usize {
        if self.program.subcircuits.is_empty() {
            let body = if *self.analyzer.api_version() >= Version::new([1, 2]) {
                Some(asg::Block {
                    statements: Vec::new(),
                    location: location.clone(),
                })
            } else {
                None
            };
            self.program.subcircuits.push(asg::Subcircuit {
                name: String::new(),
                iterations: 1,
                bundles: Vec::new(),
                body,
                annotations: Vec::new(),
                location,
            });
        }
        self.program.subcircuits.len() - 1
    }

    /// Adds an analyzed statement to the block currently being built: the
    /// innermost subblock if we are inside structured control flow, the
    /// current subcircuit's body otherwise (1.2+ only).
    fn add_to_current_block(&mut self, statement: asg::Statement) {
        let scope = self.current_scope_mut();
        if let Some(block) = &mut scope.block {
            block.add(statement);
            return;
        }
        let index = self.current_subcircuit(statement.location().cloned());
        self.program.subcircuits[index]
            .body
            .as_mut()
            .expect("subcircuit body must exist when block statements are produced")
            .add(statement);
    }

    fn analyze_statements(&mut self, statements: &[ast::Statement]) {
        for statement in statements {
            if let Err(err) = self.analyze_statement(statement) {
                self.errors.push(err.context(statement.location()));
            }
        }
    }

    fn analyze_statement(&mut self, statement: &ast::Statement) -> Result<(), AnalysisError> {
        match statement {
            ast::Statement::Bundle(bundle) => {
                if *self.analyzer.api_version() >= Version::new([1, 2]) {
                    self.analyze_bundle_ext(bundle)
                } else {
                    self.analyze_bundle(bundle)
                }
            }
            ast::Statement::Mapping(mapping) => self.analyze_mapping(mapping),
            ast::Statement::Variables(variables) => self.analyze_variables(variables),
            ast::Statement::Subcircuit(subcircuit) => self.analyze_subcircuit(subcircuit),
            ast::Statement::Structured(structured) => {
                if self.program.version < Version::new([1, 2]) {
                    return Err(AnalysisError::version(
                        "structured control-flow is not supported (need version 1.2+)",
                    ));
                }
                self.analyze_structured(structured)
            }
        }
    }

    /// Analyzes a statement list as a structured control-flow subblock:
    /// pushes a child scope that accumulates into a fresh block, analyzes,
    /// and pops.
    fn analyze_subblock(&mut self, statements: &[ast::Statement], is_loop: bool) -> asg::Block {
        let subscope = self.current_scope().subscope(is_loop);
        self.scope_stack.push(subscope);
        self.analyze_statements(statements);
        let scope = self.scope_stack.pop().expect("scope stack is never empty");
        scope.block.expect("subscopes always carry a block")
    }

    /// Analyzes a bundle for API versions up to 1.1, appending it to the
    /// current subcircuit's bundle list.
    fn analyze_bundle(&mut self, bundle: &ast::Bundle) -> Result<(), AnalysisError> {
        // The error model statement conflicts grammatically with
        // instructions, so single error_model bundles are special-cased.
        if bundle.items.len() == 1
            && bundle.items[0].name.name.eq_ignore_ascii_case("error_model")
        {
            return self.analyze_error_model(&bundle.items[0]);
        }

        let mut node = asg::Bundle::new();
        for instruction in &bundle.items {
            match self.analyze_instruction(instruction) {
                Ok(Some(item)) => node.items.push(item),
                Ok(None) => {}
                Err(err) => self.errors.push(err.context(instruction.location.as_ref())),
            }
        }
        self.check_parallelizable(&node);

        // All condition codes resolving to constant false can leave the
        // bundle empty, in which case it is dropped entirely.
        if node.items.is_empty() {
            return Ok(());
        }

        node.annotations = self.analyze_annotations(&bundle.annotations);
        node.location = bundle.location.clone();
        let index = self.current_subcircuit(bundle.location.clone());
        self.program.subcircuits[index].bundles.push(node);
        Ok(())
    }

    /// Analyzes a bundle for API version 1.2+: set and goto items become
    /// their own statements, the remaining instructions stay bundled, and
    /// everything lands in the current block.
    fn analyze_bundle_ext(&mut self, bundle: &ast::Bundle) -> Result<(), AnalysisError> {
        if bundle.items.len() == 1
            && bundle.items[0].name.name.eq_ignore_ascii_case("error_model")
        {
            return self.analyze_error_model(&bundle.items[0]);
        }

        let mut node = asg::Bundle::new();
        let mut extras = Vec::new();
        for instruction in &bundle.items {
            let name = &instruction.name.name;
            if name.eq_ignore_ascii_case("set") {
                match self.analyze_set_instruction(instruction) {
                    Ok(Some(set)) => extras.push(set.to_statement()),
                    Ok(None) => {}
                    Err(err) => self.errors.push(err.context(instruction.location.as_ref())),
                }
            } else if name.eq_ignore_ascii_case("goto") {
                match self.analyze_goto_instruction(instruction) {
                    Ok(Some(goto)) => extras.push(goto.to_statement()),
                    Ok(None) => {}
                    Err(err) => self.errors.push(err.context(instruction.location.as_ref())),
                }
            } else {
                match self.analyze_instruction(instruction) {
                    Ok(Some(item)) => node.items.push(item),
                    Ok(None) => {}
                    Err(err) => self.errors.push(err.context(instruction.location.as_ref())),
                }
            }
        }
        self.check_parallelizable(&node);

        if !node.items.is_empty() {
            node.annotations = self.analyze_annotations(&bundle.annotations);
            node.location = bundle.location.clone();
            self.add_to_current_block(node.to_statement());
        }
        for statement in extras {
            self.add_to_current_block(statement);
        }
        Ok(())
    }

    /// In any bundle of more than one instruction, every resolved
    /// instruction must permit parallel execution.
    fn check_parallelizable(&mut self, bundle: &asg::Bundle) {
        if bundle.items.len() <= 1 {
            return;
        }
        let num_others = bundle.items.len() - 1;
        let plural = if num_others == 1 { "" } else { "s" };
        for item in &bundle.items {
            if let Some(descriptor) = &item.instruction {
                if !descriptor.allow_parallel {
                    self.errors.push(
                        AnalysisError::analysis(format!(
                            "instruction {descriptor} is not parallelizable, \
                             but is bundled with {num_others} other instruction{plural}"
                        ))
                        .context(item.location.as_ref()),
                    );
                }
            }
        }
    }

    /// Analyzes a single instruction. Returns `None` without an error when
    /// the condition folds to constant false: the instruction is dead.
    fn analyze_instruction(
        &mut self,
        instruction: &ast::Instruction,
    ) -> Result<Option<asg::Instruction>, AnalysisError> {
        let mut operands = Vec::with_capacity(instruction.operands.len());
        for operand in &instruction.operands {
            operands.push(self.analyze_expression(operand)?);
        }

        let mut node = if self.analyzer.resolve_instructions() {
            self.current_scope()
                .instruction_set
                .resolve(&instruction.name.name, &operands)?
        } else {
            asg::Instruction::new(None, &instruction.name.name, operands)
        };

        // Condition first: a constant-false condition kills the instruction
        // before any further checking.
        match &instruction.condition {
            Some(condition_expr) => {
                if let Some(descriptor) = &node.instruction {
                    if !descriptor.allow_conditional {
                        return Err(AnalysisError::analysis(
                            "conditional execution is not supported for this instruction",
                        ));
                    }
                }
                let condition_value = self.analyze_expression(condition_expr)?;
                let condition = values::promote(condition_value, &Type::new(TypeKind::Bool))
                    .ok_or_else(|| AnalysisError::type_error("condition must be a boolean"))?;
                if condition.as_const_bool() == Some(false) {
                    return Ok(None);
                }
                node.condition = condition;
            }
            None => node.condition = Value::ConstBool(true),
        }

        // Qubit uniqueness across all qubit operands.
        if matches!(&node.instruction, Some(d) if !d.allow_reused_qubits) {
            let mut qubits_used = HashSet::new();
            for operand in &node.operands {
                if let Value::QubitRefs(indices) = operand {
                    for &index in indices {
                        if !qubits_used.insert(index) {
                            return Err(AnalysisError::domain(format!(
                                "qubit with index {index} is used more than once"
                            )));
                        }
                    }
                }
            }
        }

        // All qubit and bit reference operands must have the same index
        // cardinality. The condition is exempt: it is reduced at runtime
        // rather than split across the parallel instances.
        if matches!(&node.instruction, Some(d) if !d.allow_different_index_sizes) {
            let mut num_refs = 0usize;
            for operand in &node.operands {
                let indices = match operand {
                    Value::QubitRefs(indices) | Value::BitRefs(indices) => indices,
                    _ => continue,
                };
                if num_refs == 0 {
                    num_refs = indices.len();
                } else if indices.len() != num_refs {
                    return Err(AnalysisError::domain(format!(
                        "the number of indices ({}) doesn't match previously \
                         found number of indices ({})",
                        indices.len(),
                        num_refs
                    )));
                }
            }
        }

        node.annotations = self.analyze_annotations(&instruction.annotations);
        node.location = instruction.location.clone();
        Ok(Some(node))
    }

    /// Analyzes a 1.2+ set instruction. Like regular instructions, a
    /// constant-false condition drops it.
    fn analyze_set_instruction(
        &mut self,
        instruction: &ast::Instruction,
    ) -> Result<Option<asg::SetInstruction>, AnalysisError> {
        if instruction.operands.len() != 2 {
            return Err(AnalysisError::analysis("set instruction must have two operands"));
        }
        let mut node =
            self.analyze_set_operands(&instruction.operands[0], &instruction.operands[1])?;

        match &instruction.condition {
            Some(condition_expr) => {
                let condition_value = self.analyze_expression(condition_expr)?;
                let condition = values::promote(condition_value, &Type::new(TypeKind::Bool))
                    .ok_or_else(|| AnalysisError::type_error("condition must be a boolean"))?;
                if condition.as_const_bool() == Some(false) {
                    return Ok(None);
                }
                node.condition = condition;
            }
            None => node.condition = Value::ConstBool(true),
        }

        node.annotations = self.analyze_annotations(&instruction.annotations);
        node.location = instruction.location.clone();
        Ok(Some(node))
    }

    /// Analyzes the two operands of an assignment: the set instruction
    /// itself and the initialize/update clauses of C-style for loops.
    fn analyze_set_operands(
        &mut self,
        lhs_expr: &ast::Expression,
        rhs_expr: &ast::Expression,
    ) -> Result<asg::SetInstruction, AnalysisError> {
        let lhs = self.analyze_expression(lhs_expr)?;
        let rhs = self.analyze_expression(rhs_expr)?;

        let assignable = match &lhs {
            Value::VariableRef(_) | Value::QubitRefs(_) | Value::BitRefs(_) => true,
            Value::Function(function) => function.return_type.is_assignable(),
            _ => false,
        };
        if !assignable {
            return Err(AnalysisError::analysis(
                "left-hand side of assignment statement must be assignable",
            ));
        }

        let target_type = values::as_rvalue_type(lhs.type_of());
        let rhs_type = rhs.type_of();
        let rhs_promoted = values::promote(rhs, &target_type).ok_or_else(|| {
            AnalysisError::type_error(format!(
                "type of right-hand side ({}) could not be coerced to left-hand side ({})",
                rhs_type,
                lhs.type_of()
            ))
        })?;

        Ok(asg::SetInstruction::new(lhs, rhs_promoted))
    }

    /// Analyzes a 1.2+ goto instruction. The target is recorded by name and
    /// resolved after all statements are analyzed, because gotos may refer
    /// forward.
    fn analyze_goto_instruction(
        &mut self,
        instruction: &ast::Instruction,
    ) -> Result<Option<asg::GotoInstruction>, AnalysisError> {
        if instruction.operands.len() != 1 {
            return Err(AnalysisError::analysis("goto instruction must have a single operand"));
        }
        let target_name = match &instruction.operands[0].kind {
            ast::ExprKind::Identifier(name) => name.clone(),
            _ => {
                return Err(AnalysisError::analysis(
                    "goto instruction operand must be a subcircuit identifier",
                ))
            }
        };
        let mut node = asg::GotoInstruction::new(target_name);

        match &instruction.condition {
            Some(condition_expr) => {
                let condition_value = self.analyze_expression(condition_expr)?;
                let condition = values::promote(condition_value, &Type::new(TypeKind::Bool))
                    .ok_or_else(|| AnalysisError::type_error("condition must be a boolean"))?;
                if condition.as_const_bool() == Some(false) {
                    return Ok(None);
                }
                node.condition = condition;
            }
            None => node.condition = Value::ConstBool(true),
        }

        node.annotations = self.analyze_annotations(&instruction.annotations);
        node.location = instruction.location.clone();
        Ok(Some(node))
    }

    /// Analyzes the error_model meta-instruction, allowed at most once per
    /// program.
    fn analyze_error_model(&mut self, instruction: &ast::Instruction) -> Result<(), AnalysisError> {
        if let Some(existing) = &self.program.error_model {
            let mut message = String::from("error model can only be specified once");
            if let Some(location) = &existing.location {
                message.push_str(&format!(", previous specification was at {location}"));
            }
            return Err(AnalysisError::analysis(message));
        }

        let Some((name_expr, operand_exprs)) = instruction.operands.split_first() else {
            return Err(AnalysisError::analysis("missing error model name"));
        };
        let name = match &name_expr.kind {
            ast::ExprKind::Identifier(name) => name.clone(),
            _ => {
                return Err(AnalysisError::analysis(
                    "first argument of an error model must be its name as an identifier",
                ))
            }
        };

        let mut operands = Vec::with_capacity(operand_exprs.len());
        for operand in operand_exprs {
            operands.push(self.analyze_expression(operand)?);
        }

        let mut node = if self.analyzer.resolve_error_model() {
            self.analyzer.error_models().resolve(&name, &operands)?
        } else {
            asg::ErrorModel::new(None, &name, operands)
        };
        node.annotations = self.analyze_annotations(&instruction.annotations);
        node.location = instruction.location.clone();
        self.program.error_model = Some(node);
        Ok(())
    }

    /// Records a `map name = expr` binding in the current scope, remembering
    /// the declaring AST node for the final program mapping list.
    fn analyze_mapping(&mut self, mapping: &ast::Mapping) -> Result<(), AnalysisError> {
        let value = self.analyze_expression(&mapping.expr)?;
        self.current_scope_mut()
            .mappings
            .add(mapping.alias.name.clone(), value, Some(mapping.clone()));
        Ok(())
    }

    /// Analyzes a variable declaration statement (1.1+): creates the
    /// variable nodes and installs reference mappings for them.
    fn analyze_variables(&mut self, variables: &ast::Variables) -> Result<(), AnalysisError> {
        if self.program.version < Version::new([1, 1]) {
            return Err(AnalysisError::version(
                "variables are only supported from version 1.1 onwards",
            ));
        }

        let type_name = variables.typ.name.to_lowercase();
        let kind = match type_name.as_str() {
            "qubit" => TypeKind::Qubit,
            "bit" | "bool" => TypeKind::Bool,
            "int" => TypeKind::Int,
            "real" => TypeKind::Real,
            "complex" => TypeKind::Complex,
            _ => {
                return Err(AnalysisError::analysis(format!(
                    "unknown type \"{type_name}\""
                )))
            }
        };
        let typ = Type::assignable(kind);
        let annotations = self.analyze_annotations(&variables.annotations);

        for identifier in &variables.names {
            let index = self.program.variables.len();
            self.program.variables.push(asg::Variable {
                name: identifier.name.clone(),
                typ: typ.clone(),
                annotations: annotations.clone(),
                location: identifier.location.clone(),
            });
            self.current_scope_mut().mappings.add(
                identifier.name.clone(),
                Value::VariableRef(VariableRef {
                    variable: index,
                    typ: typ.clone(),
                }),
                None,
            );
        }
        Ok(())
    }

    /// Analyzes a subcircuit header, only permitted at the top level.
    fn analyze_subcircuit(&mut self, subcircuit: &ast::Subcircuit) -> Result<(), AnalysisError> {
        if self.scope_stack.len() > 1 {
            return Err(AnalysisError::analysis("cannot open subcircuit within subblock"));
        }
        let mut iterations: Int = 1;
        if let Some(iterations_expr) = &subcircuit.iterations {
            iterations = self.analyze_as_const_int(iterations_expr)?;
            if iterations < 1 {
                return Err(AnalysisError::domain(format!(
                    "subcircuit iteration count must be positive, but is {iterations}"
                ))
                .context(iterations_expr.location.as_ref()));
            }
        }
        trace!(name = %subcircuit.name.name, iterations, "starting subcircuit");
        let body = if *self.analyzer.api_version() >= Version::new([1, 2]) {
            Some(asg::Block {
                statements: Vec::new(),
                location: subcircuit.location.clone(),
            })
        } else {
            None
        };
        let annotations = self.analyze_annotations(&subcircuit.annotations);
        self.program.subcircuits.push(asg::Subcircuit {
            name: subcircuit.name.name.clone(),
            iterations,
            bundles: Vec::new(),
            body,
            annotations,
            location: subcircuit.location.clone(),
        });
        Ok(())
    }

    /// Dispatches a structured control-flow statement (1.2+).
    fn analyze_structured(&mut self, structured: &ast::Structured) -> Result<(), AnalysisError> {
        match structured {
            ast::Structured::IfElse(if_else) => {
                if let Some(mut node) = self.analyze_if_else(if_else)? {
                    node.annotations = self.analyze_annotations(&if_else.annotations);
                    node.location = if_else.location.clone();
                    self.add_to_current_block(node.to_statement());
                }
            }
            ast::Structured::ForLoop(for_loop) => {
                let mut node = self.analyze_for_loop(for_loop)?;
                node.annotations = self.analyze_annotations(&for_loop.annotations);
                node.location = for_loop.location.clone();
                self.add_to_current_block(node.to_statement());
            }
            ast::Structured::ForeachLoop(foreach_loop) => {
                let mut node = self.analyze_foreach_loop(foreach_loop)?;
                node.annotations = self.analyze_annotations(&foreach_loop.annotations);
                node.location = foreach_loop.location.clone();
                self.add_to_current_block(node.to_statement());
            }
            ast::Structured::WhileLoop(while_loop) => {
                if let Some(mut node) = self.analyze_while_loop(while_loop)? {
                    node.annotations = self.analyze_annotations(&while_loop.annotations);
                    node.location = while_loop.location.clone();
                    self.add_to_current_block(node.to_statement());
                }
            }
            ast::Structured::RepeatUntilLoop(repeat_until) => {
                if let Some(mut node) = self.analyze_repeat_until_loop(repeat_until)? {
                    node.annotations = self.analyze_annotations(&repeat_until.annotations);
                    node.location = repeat_until.location.clone();
                    self.add_to_current_block(node.to_statement());
                }
            }
            ast::Structured::Break(break_statement) => {
                if !self.current_scope().within_loop {
                    return Err(AnalysisError::analysis(
                        "cannot use break outside of a structured loop",
                    ));
                }
                let node = asg::BreakStatement {
                    annotations: self.analyze_annotations(&break_statement.annotations),
                    location: break_statement.location.clone(),
                };
                self.add_to_current_block(node.to_statement());
            }
            ast::Structured::Continue(continue_statement) => {
                if !self.current_scope().within_loop {
                    return Err(AnalysisError::analysis(
                        "cannot use continue outside of a structured loop",
                    ));
                }
                let node = asg::ContinueStatement {
                    annotations: self.analyze_annotations(&continue_statement.annotations),
                    location: continue_statement.location.clone(),
                };
                self.add_to_current_block(node.to_statement());
            }
        }
        Ok(())
    }

    /// Analyzes an if-else chain and eliminates branches with constant
    /// conditions. Returns `None` when nothing remains of the statement.
    fn analyze_if_else(
        &mut self,
        if_else: &ast::IfElse,
    ) -> Result<Option<asg::IfElse>, AnalysisError> {
        let mut node = asg::IfElse {
            branches: Vec::with_capacity(if_else.branches.len()),
            otherwise: None,
            annotations: Vec::new(),
            location: None,
        };

        for branch in &if_else.branches {
            let condition_value = self.analyze_expression(&branch.condition)?;
            let condition = values::promote(condition_value, &Type::new(TypeKind::Bool))
                .ok_or_else(|| AnalysisError::type_error("if/else condition must be a boolean"))?;
            let body = self.analyze_subblock(&branch.body, false);
            node.branches.push(asg::IfElseBranch { condition, body });
        }
        if let Some(otherwise) = &if_else.otherwise {
            node.otherwise = Some(self.analyze_subblock(otherwise, false));
        }

        // Remove branches that are never taken due to constant-propagated
        // conditions; a constant-true branch absorbs everything after it.
        let mut index = 0;
        while index < node.branches.len() {
            match node.branches[index].condition.as_const_bool() {
                Some(true) => {
                    let branch = node.branches.remove(index);
                    node.branches.truncate(index);
                    node.otherwise = Some(branch.body);
                }
                Some(false) => {
                    node.branches.remove(index);
                }
                None => index += 1,
            }
        }

        // With no conditional branches left, the otherwise block's
        // statements are spliced into the surrounding block.
        if node.branches.is_empty() {
            if let Some(otherwise) = node.otherwise.take() {
                for statement in otherwise.statements {
                    self.add_to_current_block(statement);
                }
            }
            return Ok(None);
        }
        Ok(Some(node))
    }

    fn analyze_for_loop(&mut self, for_loop: &ast::ForLoop) -> Result<asg::ForLoop, AnalysisError> {
        let initialize = match &for_loop.initialize {
            Some(assignment) => Some(self.analyze_set_operands(&assignment.lhs, &assignment.rhs)?),
            None => None,
        };

        let condition_value = self.analyze_expression(&for_loop.condition)?;
        let condition = values::promote(condition_value, &Type::new(TypeKind::Bool))
            .ok_or_else(|| AnalysisError::type_error("loop condition must be a boolean"))?;

        let update = match &for_loop.update {
            Some(assignment) => Some(self.analyze_set_operands(&assignment.lhs, &assignment.rhs)?),
            None => None,
        };

        let body = self.analyze_subblock(&for_loop.body, true);
        Ok(asg::ForLoop {
            initialize,
            condition,
            update,
            body,
            annotations: Vec::new(),
            location: None,
        })
    }

    fn analyze_foreach_loop(
        &mut self,
        foreach_loop: &ast::ForeachLoop,
    ) -> Result<asg::ForeachLoop, AnalysisError> {
        let lhs_value = self.analyze_expression(&foreach_loop.lhs)?;
        let lhs = values::promote(lhs_value, &Type::assignable(TypeKind::Int)).ok_or_else(|| {
            AnalysisError::type_error("foreach loop variable must be an assignable integer")
        })?;

        // Any constant bounds are fine; frm > to yields zero iterations.
        let frm = self.analyze_as_const_int(&foreach_loop.frm)?;
        let to = self.analyze_as_const_int(&foreach_loop.to)?;

        let body = self.analyze_subblock(&foreach_loop.body, true);
        Ok(asg::ForeachLoop {
            lhs,
            frm,
            to,
            body,
            annotations: Vec::new(),
            location: None,
        })
    }

    /// Analyzes a while loop; a constant-false condition elides the whole
    /// loop.
    fn analyze_while_loop(
        &mut self,
        while_loop: &ast::WhileLoop,
    ) -> Result<Option<asg::WhileLoop>, AnalysisError> {
        let condition_value = self.analyze_expression(&while_loop.condition)?;
        let condition = values::promote(condition_value, &Type::new(TypeKind::Bool))
            .ok_or_else(|| AnalysisError::type_error("loop condition must be a boolean"))?;

        let body = self.analyze_subblock(&while_loop.body, true);

        if condition.as_const_bool() == Some(false) {
            return Ok(None);
        }
        Ok(Some(asg::WhileLoop {
            condition,
            body,
            annotations: Vec::new(),
            location: None,
        }))
    }

    /// Analyzes a repeat-until loop; a constant-true condition replaces the
    /// loop with a single execution of its body.
    fn analyze_repeat_until_loop(
        &mut self,
        repeat_until: &ast::RepeatUntilLoop,
    ) -> Result<Option<asg::RepeatUntilLoop>, AnalysisError> {
        let body = self.analyze_subblock(&repeat_until.body, true);

        let condition_value = self.analyze_expression(&repeat_until.until)?;
        let condition = values::promote(condition_value, &Type::new(TypeKind::Bool))
            .ok_or_else(|| AnalysisError::type_error("loop condition must be a boolean"))?;

        if condition.as_const_bool() == Some(true) {
            for statement in body.statements {
                self.add_to_current_block(statement);
            }
            return Ok(None);
        }
        Ok(Some(asg::RepeatUntilLoop {
            body,
            condition,
            annotations: Vec::new(),
            location: None,
        }))
    }

    /// Analyzes an annotation list. A failing operand expression records an
    /// error but does not lose the remaining operands or annotations.
    fn analyze_annotations(
        &mut self,
        annotations: &[ast::AnnotationData],
    ) -> Vec<asg::AnnotationData> {
        let mut retval = Vec::with_capacity(annotations.len());
        for annotation in annotations {
            let mut node = asg::AnnotationData {
                interface: annotation.interface.name.clone(),
                operation: annotation.operation.name.clone(),
                operands: Vec::with_capacity(annotation.operands.len()),
                location: annotation.location.clone(),
            };
            for operand in &annotation.operands {
                match self.analyze_expression(operand) {
                    Ok(value) => node.operands.push(value),
                    Err(err) => self.errors.push(err.context(annotation.location.as_ref())),
                }
            }
            retval.push(node);
        }
        retval
    }

    /// Recursively analyzes an expression to a value, folding constants
    /// along the way. Always returns a value or an error.
    fn analyze_expression(&mut self, expression: &ast::Expression) -> Result<Value, AnalysisError> {
        let result = match &expression.kind {
            ast::ExprKind::IntegerLiteral(value) => Ok(Value::ConstInt(*value)),
            ast::ExprKind::FloatLiteral(value) => Ok(Value::ConstReal(*value)),
            ast::ExprKind::StringLiteral(value) => Ok(Value::ConstString(value.clone())),
            ast::ExprKind::JsonLiteral(value) => Ok(Value::ConstJson(value.clone())),
            ast::ExprKind::MatrixLiteral(rows) => self.analyze_matrix(rows),
            ast::ExprKind::Identifier(name) => self.current_scope().mappings.resolve(name),
            ast::ExprKind::Index { expr, indices } => self.analyze_index(expr, indices),
            ast::ExprKind::FunctionCall { name, arguments } => {
                self.analyze_function(&name.name, arguments)
            }
            ast::ExprKind::Unary { op, expr } => self.analyze_operator(op.symbol(), &[expr]),
            ast::ExprKind::Binary { op, lhs, rhs } => {
                self.analyze_operator(op.symbol(), &[lhs, rhs])
            }
            ast::ExprKind::TernaryCond {
                condition,
                if_true,
                if_false,
            } => self.analyze_operator("?:", &[condition, if_true, if_false]),
        };
        let value = result.map_err(|err| err.context(expression.location.as_ref()))?;
        if *self.analyzer.api_version() < Version::new([1, 1])
            && matches!(value, Value::Function(_) | Value::VariableRef(_))
        {
            return Err(AnalysisError::version(
                "dynamic expressions are only supported from version 1.1 onwards",
            )
            .context(expression.location.as_ref()));
        }
        Ok(value)
    }

    /// Shorthand for analyzing an expression that must fold to a constant
    /// integer.
    fn analyze_as_const_int(&mut self, expression: &ast::Expression) -> Result<Int, AnalysisError> {
        let value = self.analyze_expression(expression)?;
        let value = values::promote(value, &Type::new(TypeKind::Int))
            .ok_or_else(|| AnalysisError::type_error("expected an integer"))
            .map_err(|err| err.context(expression.location.as_ref()))?;
        value
            .as_const_int()
            .ok_or_else(|| AnalysisError::analysis("integer must be constant"))
            .map_err(|err| err.context(expression.location.as_ref()))
    }

    /// Analyzes a matrix literal. Real typing is attempted first; any
    /// complex entry makes the whole matrix complex.
    fn analyze_matrix(&mut self, rows: &[Vec<ast::Expression>]) -> Result<Value, AnalysisError> {
        let num_cols = rows.first().map_or(0, Vec::len);
        if num_cols == 0 || rows.iter().any(|row| row.len() != num_cols) {
            return Err(AnalysisError::domain("matrix is not rectangular"));
        }
        let mut entries = Vec::with_capacity(rows.len() * num_cols);
        for row in rows {
            for entry in row {
                entries.push(self.analyze_expression(entry)?);
            }
        }

        let real_type = Type::new(TypeKind::Real);
        let mut real_data = Vec::with_capacity(entries.len());
        for entry in &entries {
            match values::promote(entry.clone(), &real_type) {
                Some(Value::ConstReal(real)) => real_data.push(real),
                _ => {
                    real_data.clear();
                    break;
                }
            }
        }
        if real_data.len() == entries.len() {
            return Ok(Value::ConstRealMatrix(RMatrix::new(real_data, num_cols)));
        }

        let complex_type = Type::new(TypeKind::Complex);
        let mut complex_data = Vec::with_capacity(entries.len());
        for entry in &entries {
            match values::promote(entry.clone(), &complex_type) {
                Some(Value::ConstComplex(complex)) => complex_data.push(complex),
                _ => {
                    return Err(AnalysisError::type_error(
                        "only matrices of constant real or complex numbers are currently supported",
                    ))
                }
            }
        }
        Ok(Value::ConstComplexMatrix(CMatrix::new(complex_data, num_cols)))
    }

    /// Analyzes an index operator. Only qubit and bit reference sets are
    /// indexable; indexing composes, i.e. it picks from the indexed set
    /// rather than from the underlying register.
    fn analyze_index(
        &mut self,
        expr: &ast::Expression,
        indices: &[ast::IndexEntry],
    ) -> Result<Value, AnalysisError> {
        let value = self.analyze_expression(expr)?;
        match value {
            Value::QubitRefs(base) => {
                let picked = self.analyze_index_list(indices, base.len())?;
                Ok(Value::QubitRefs(
                    picked.into_iter().map(|i| base[i as usize]).collect(),
                ))
            }
            Value::BitRefs(base) => {
                let picked = self.analyze_index_list(indices, base.len())?;
                Ok(Value::BitRefs(
                    picked.into_iter().map(|i| base[i as usize]).collect(),
                ))
            }
            // Matrices could conceivably be indexed as well, but they are
            // not today.
            other => Err(AnalysisError::type_error(format!(
                "indexation is not supported for value of type {}",
                other.type_of()
            ))),
        }
    }

    /// Analyzes an index list against a reference set of the given size.
    /// Entries are constant indices or inclusive constant ranges, all
    /// bounds-checked.
    fn analyze_index_list(
        &mut self,
        indices: &[ast::IndexEntry],
        size: usize,
    ) -> Result<Vec<Int>, AnalysisError> {
        let check_bounds = |index: Int, location: Option<&SourceLocation>| {
            if index < 0 || index as usize >= size {
                Err(AnalysisError::domain(format!(
                    "index {index} out of range (size {size})"
                ))
                .context(location))
            } else {
                Ok(())
            }
        };

        let mut retval = Vec::new();
        for entry in indices {
            match entry {
                ast::IndexEntry::Item(item) => {
                    let index = self.analyze_as_const_int(item)?;
                    check_bounds(index, item.location.as_ref())?;
                    retval.push(index);
                }
                ast::IndexEntry::Range { first, last } => {
                    let first_index = self.analyze_as_const_int(first)?;
                    check_bounds(first_index, first.location.as_ref())?;
                    let last_index = self.analyze_as_const_int(last)?;
                    check_bounds(last_index, last.location.as_ref())?;
                    if first_index > last_index {
                        return Err(AnalysisError::domain("last index is lower than first index")
                            .context(first.location.as_ref()));
                    }
                    retval.extend(first_index..=last_index);
                }
            }
        }
        Ok(retval)
    }

    /// Analyzes a function call expression through the function table.
    fn analyze_function(
        &mut self,
        name: &str,
        arguments: &[ast::Expression],
    ) -> Result<Value, AnalysisError> {
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.analyze_expression(argument)?);
        }
        self.current_scope().functions.call(name, args)
    }

    /// Rewrites an operator application to a call of the corresponding
    /// `operator<symbol>` function.
    fn analyze_operator(
        &mut self,
        symbol: &str,
        operands: &[&ast::Expression],
    ) -> Result<Value, AnalysisError> {
        let mut args = Vec::with_capacity(operands.len());
        for operand in operands {
            args.push(self.analyze_expression(operand)?);
        }
        self.current_scope()
            .functions
            .call(&format!("operator{symbol}"), args)
    }

    /// After all statements: checks subcircuit name uniqueness and resolves
    /// every goto target against the final subcircuit set.
    fn resolve_subcircuits(&mut self) {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (index, subcircuit) in self.program.subcircuits.iter().enumerate() {
            if let Some(&previous) = by_name.get(&subcircuit.name) {
                let mut message = format!("duplicate subcircuit name \"{}\"", subcircuit.name);
                if let Some(location) = &self.program.subcircuits[previous].location {
                    message.push_str(&format!("; previous definition was at {location}"));
                }
                self.errors
                    .push(AnalysisError::analysis(message).context(subcircuit.location.as_ref()));
            } else {
                by_name.insert(subcircuit.name.clone(), index);
            }
        }

        let mut goto_errors = Vec::new();
        for subcircuit in &mut self.program.subcircuits {
            if let Some(body) = &mut subcircuit.body {
                resolve_gotos_in_block(body, &by_name, &mut goto_errors);
            }
        }
        self.errors.append(&mut goto_errors);
    }

    /// Materializes the source-declared mappings of the final (global)
    /// scope into the program, sorted by source location so that the output
    /// is deterministic despite the hash-keyed mapping table.
    fn collect_mappings(&mut self) {
        let declared: Vec<(String, Value, ast::Mapping)> = self
            .current_scope()
            .mappings
            .iter()
            .filter_map(|(name, (value, source))| {
                source
                    .as_ref()
                    .map(|source| (name.clone(), value.clone(), source.clone()))
            })
            .collect();

        let mut mappings = Vec::with_capacity(declared.len());
        for (name, value, source) in declared {
            let annotations = self.analyze_annotations(&source.annotations);
            mappings.push(asg::Mapping {
                name,
                value,
                annotations,
                location: source.location.clone(),
            });
        }
        mappings.sort_by(|lhs, rhs| match (&lhs.location, &rhs.location) {
            (Some(lhs_location), Some(rhs_location)) => lhs_location.cmp(rhs_location),
            _ => std::cmp::Ordering::Equal,
        });
        self.program.mappings = mappings;
    }
}

/// Patches goto targets in a block (recursing through structured
/// statements), collecting an error for every name that does not refer to a
/// subcircuit.
fn resolve_gotos_in_block(
    block: &mut asg::Block,
    by_name: &HashMap<String, usize>,
    errors: &mut Vec<AnalysisError>,
) {
    for statement in &mut block.statements {
        match statement {
            asg::Statement::GotoInstruction(goto) => match by_name.get(&goto.target_name) {
                Some(&index) => goto.target = Some(index),
                None => errors.push(
                    AnalysisError::name_resolution("subcircuit", &goto.target_name)
                        .context(goto.location.as_ref()),
                ),
            },
            asg::Statement::IfElse(if_else) => {
                for branch in &mut if_else.branches {
                    resolve_gotos_in_block(&mut branch.body, by_name, errors);
                }
                if let Some(otherwise) = &mut if_else.otherwise {
                    resolve_gotos_in_block(otherwise, by_name, errors);
                }
            }
            asg::Statement::ForLoop(for_loop) => {
                resolve_gotos_in_block(&mut for_loop.body, by_name, errors);
            }
            asg::Statement::ForeachLoop(foreach_loop) => {
                resolve_gotos_in_block(&mut foreach_loop.body, by_name, errors);
            }
            asg::Statement::WhileLoop(while_loop) => {
                resolve_gotos_in_block(&mut while_loop.body, by_name, errors);
            }
            asg::Statement::RepeatUntilLoop(repeat_until) => {
                resolve_gotos_in_block(&mut repeat_until.body, by_name, errors);
            }
            _ => {}
        }
    }
}
