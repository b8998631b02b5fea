// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Lexical scopes as maintained by the analysis pass.
//!
//! Each scope owns snapshots of the mapping, function and instruction
//! tables, so lookups only ever consult the current scope: a subscope starts
//! as a copy of its parent and local (re)definitions shadow without leaking
//! out when the scope is popped.

use crate::asg;
use crate::resolver::{FunctionTable, InstructionTable, MappingTable};

#[derive(Clone)]
pub struct Scope {
    pub mappings: MappingTable,
    pub functions: FunctionTable,
    pub instruction_set: InstructionTable,
    /// The block this scope accumulates statements into. `None` for the
    /// global scope, whose statements go to the current subcircuit instead.
    pub block: Option<asg::Block>,
    /// Whether a `break`/`continue` is legal here; inherited by subscopes.
    pub within_loop: bool,
}

impl Scope {
    /// The global scope, seeded from the analyzer configuration.
    pub fn new(
        mappings: MappingTable,
        functions: FunctionTable,
        instruction_set: InstructionTable,
    ) -> Scope {
        Scope {
            mappings,
            functions,
            instruction_set,
            block: None,
            within_loop: false,
        }
    }

    /// A child scope for a structured control-flow subblock. The tables are
    /// snapshots of this scope's; the child accumulates into a fresh block.
    pub fn subscope(&self, is_loop: bool) -> Scope {
        Scope {
            mappings: self.mappings.clone(),
            functions: self.functions.clone(),
            instruction_set: self.instruction_set.clone(),
            block: Some(asg::Block::new()),
            within_loop: self.within_loop || is_loop,
        }
    }
}
