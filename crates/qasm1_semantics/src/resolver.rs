// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Name and overload resolution tables.
//!
//! Mappings are matched case-sensitively; functions, instructions and error
//! models case-insensitively (names are normalized on lookup, the registered
//! spelling is kept in the descriptor). Overload selection picks the
//! overload needing the fewest argument promotions; remaining ties go to the
//! earliest registration.

use std::sync::Arc;

use hashbrown::HashMap;

use qasm1_ast::ast;

use crate::asg;
use crate::error_model;
use crate::instruction;
use crate::semantic_error::{AnalysisError, ErrorKind};
use crate::types::{self, Type};
use crate::values::{self, Value};

/// A mapping table entry: the bound value, plus the declaring AST node when
/// the mapping was declared in the source (predefined and implicit mappings
/// have no declaration).
type MappingEntry = (Value, Option<ast::Mapping>);

/// Name -> value bindings. Insertion shadows silently; lookup is
/// case-sensitive.
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    table: HashMap<String, MappingEntry>,
}

impl MappingTable {
    pub fn new() -> MappingTable {
        MappingTable::default()
    }

    pub fn add<T: ToString>(&mut self, name: T, value: Value, source: Option<ast::Mapping>) {
        self.table.insert(name.to_string(), (value, source));
    }

    pub fn resolve(&self, name: &str) -> Result<Value, AnalysisError> {
        match self.table.get(name) {
            Some((value, _)) => Ok(value.clone()),
            None => Err(AnalysisError::name_resolution("mapping", name)),
        }
    }

    /// Iterates in unspecified order; callers sort before emitting.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappingEntry)> {
        self.table.iter()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// One registered overload: an opaque tag plus the parameter types.
#[derive(Clone)]
struct Overload<T> {
    tag: T,
    param_types: Vec<Type>,
}

/// The possible overloads registered under one name.
#[derive(Clone)]
struct OverloadResolver<T> {
    overloads: Vec<Overload<T>>,
}

impl<T> Default for OverloadResolver<T> {
    fn default() -> Self {
        OverloadResolver {
            overloads: Vec::new(),
        }
    }
}

pub(crate) enum ResolutionFailure {
    NameNotFound,
    NoMatchingOverload,
}

impl<T: Clone> OverloadResolver<T> {
    fn add_overload(&mut self, tag: T, param_types: Vec<Type>) {
        self.overloads.push(Overload { tag, param_types });
    }

    /// Selects the best applicable overload for `args` and returns its tag
    /// together with the promoted argument list.
    fn resolve(&self, args: &[Value]) -> Result<(T, Vec<Value>), ResolutionFailure> {
        let mut best: Option<(usize, &Overload<T>, Vec<Value>)> = None;
        for overload in &self.overloads {
            if overload.param_types.len() != args.len() {
                continue;
            }
            let mut promoted = Vec::with_capacity(args.len());
            let mut num_promotions = 0;
            let mut applicable = true;
            for (arg, param_type) in args.iter().zip(&overload.param_types) {
                if types::type_check(param_type, &arg.type_of()) {
                    promoted.push(arg.clone());
                } else {
                    match values::promote(arg.clone(), param_type) {
                        Some(value) => {
                            num_promotions += 1;
                            promoted.push(value);
                        }
                        None => {
                            applicable = false;
                            break;
                        }
                    }
                }
            }
            if !applicable {
                continue;
            }
            // Strictly fewer promotions wins; a tie keeps the earlier
            // registration.
            if best
                .as_ref()
                .map_or(true, |(fewest, ..)| num_promotions < *fewest)
            {
                best = Some((num_promotions, overload, promoted));
            }
        }
        match best {
            Some((_, overload, promoted)) => Ok((overload.tag.clone(), promoted)),
            None => Err(ResolutionFailure::NoMatchingOverload),
        }
    }
}

/// Table of overloaded callables with case-insensitive name matching.
#[derive(Clone)]
struct OverloadedNameResolver<T> {
    table: HashMap<String, OverloadResolver<T>>,
}

impl<T> Default for OverloadedNameResolver<T> {
    fn default() -> Self {
        OverloadedNameResolver {
            table: HashMap::new(),
        }
    }
}

impl<T: Clone> OverloadedNameResolver<T> {
    fn add_overload(&mut self, name: &str, tag: T, param_types: Vec<Type>) {
        self.table
            .entry(name.to_lowercase())
            .or_default()
            .add_overload(tag, param_types);
    }

    fn resolve(&self, name: &str, args: &[Value]) -> Result<(T, Vec<Value>), ResolutionFailure> {
        match self.table.get(&name.to_lowercase()) {
            Some(resolver) => resolver.resolve(args),
            None => Err(ResolutionFailure::NameNotFound),
        }
    }
}

fn argument_types(args: &[Value]) -> String {
    let arg_types = args.iter().map(Value::type_of).collect::<Vec<_>>();
    types::types_to_string(&arg_types)
}

/// The implementation of a registered function: takes the promoted argument
/// values, returns a constant when everything folds, or a deferred
/// `Function` value otherwise.
pub type FunctionImpl = Arc<dyn Fn(Vec<Value>) -> Result<Value, AnalysisError> + Send + Sync>;

/// The registered classical functions and operators.
#[derive(Clone, Default)]
pub struct FunctionTable {
    resolver: OverloadedNameResolver<FunctionImpl>,
}

impl FunctionTable {
    pub fn new() -> FunctionTable {
        FunctionTable::default()
    }

    pub fn add(&mut self, name: &str, param_types: Vec<Type>, implementation: FunctionImpl) {
        self.resolver.add_overload(name, implementation, param_types);
    }

    /// Resolves and invokes the best overload of `name` for `args`.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, AnalysisError> {
        match self.resolver.resolve(name, &args) {
            Ok((implementation, promoted)) => implementation(promoted),
            Err(ResolutionFailure::NameNotFound) => {
                Err(AnalysisError::name_resolution("function", name))
            }
            Err(ResolutionFailure::NoMatchingOverload) => {
                Err(AnalysisError::new(ErrorKind::OverloadResolution {
                    name: name.to_string(),
                    arg_types: argument_types(&args),
                }))
            }
        }
    }
}

/// The registered instruction set.
#[derive(Clone, Default)]
pub struct InstructionTable {
    resolver: OverloadedNameResolver<instruction::Instruction>,
}

impl InstructionTable {
    pub fn new() -> InstructionTable {
        InstructionTable::default()
    }

    pub fn add(&mut self, instruction: instruction::Instruction) {
        let name = instruction.name.clone();
        let param_types = instruction.param_types.clone();
        self.resolver.add_overload(&name, instruction, param_types);
    }

    /// Resolves an instruction use to a semantic instruction node carrying
    /// the winning descriptor and the promoted operands.
    pub fn resolve(&self, name: &str, operands: &[Value]) -> Result<asg::Instruction, AnalysisError> {
        match self.resolver.resolve(name, operands) {
            Ok((descriptor, promoted)) => {
                Ok(asg::Instruction::new(Some(descriptor), name, promoted))
            }
            Err(ResolutionFailure::NameNotFound) => {
                Err(AnalysisError::name_resolution("instruction", name))
            }
            Err(ResolutionFailure::NoMatchingOverload) => {
                Err(AnalysisError::new(ErrorKind::OverloadResolution {
                    name: name.to_string(),
                    arg_types: argument_types(operands),
                }))
            }
        }
    }
}

/// The registered error models.
#[derive(Clone, Default)]
pub struct ErrorModelTable {
    resolver: OverloadedNameResolver<error_model::ErrorModel>,
}

impl ErrorModelTable {
    pub fn new() -> ErrorModelTable {
        ErrorModelTable::default()
    }

    pub fn add(&mut self, model: error_model::ErrorModel) {
        let name = model.name.clone();
        let param_types = model.param_types.clone();
        self.resolver.add_overload(&name, model, param_types);
    }

    pub fn resolve(&self, name: &str, operands: &[Value]) -> Result<asg::ErrorModel, AnalysisError> {
        match self.resolver.resolve(name, operands) {
            Ok((model, promoted)) => Ok(asg::ErrorModel::new(Some(model), name, promoted)),
            Err(ResolutionFailure::NameNotFound) => {
                Err(AnalysisError::name_resolution("error model", name))
            }
            Err(ResolutionFailure::NoMatchingOverload) => {
                Err(AnalysisError::new(ErrorKind::OverloadResolution {
                    name: name.to_string(),
                    arg_types: argument_types(operands),
                }))
            }
        }
    }
}
