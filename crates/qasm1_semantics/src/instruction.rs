// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Instruction descriptors: the registered shape of a gate or measurement,
//! against which uses in the source are resolved.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{self, Type};

/// A registered instruction type. The flags control which checks the
/// analyzer applies to each use:
///
/// - `allow_conditional`: the instruction may carry a condition operand.
/// - `allow_parallel`: the instruction may appear in a bundle with others.
/// - `allow_reused_qubits`: a qubit index may appear more than once across
///   the qubit operands.
/// - `allow_different_index_sizes`: qubit/bit reference operands may have
///   differing index cardinalities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub name: String,
    pub param_types: Vec<Type>,
    pub allow_conditional: bool,
    pub allow_parallel: bool,
    pub allow_reused_qubits: bool,
    pub allow_different_index_sizes: bool,
    /// Opaque payloads attached at registration time. The analyzer carries
    /// them through to the resolved instruction nodes but never interprets
    /// them.
    pub annotations: Vec<String>,
}

impl Instruction {
    /// Creates a descriptor with the default flags: conditional and parallel
    /// execution allowed, qubit reuse and differing index sizes not.
    pub fn new<T: ToString, P: types::ParamTypeSpec>(name: T, param_types: P) -> Instruction {
        Instruction {
            name: name.to_string(),
            param_types: param_types.into_types(),
            allow_conditional: true,
            allow_parallel: true,
            allow_reused_qubits: false,
            allow_different_index_sizes: false,
            annotations: Vec::new(),
        }
    }

    pub fn with_conditional(mut self, allow: bool) -> Instruction {
        self.allow_conditional = allow;
        self
    }

    pub fn with_parallel(mut self, allow: bool) -> Instruction {
        self.allow_parallel = allow;
        self
    }

    pub fn with_reused_qubits(mut self, allow: bool) -> Instruction {
        self.allow_reused_qubits = allow;
        self
    }

    pub fn with_different_index_sizes(mut self, allow: bool) -> Instruction {
        self.allow_different_index_sizes = allow;
        self
    }

    pub fn with_annotation<T: ToString>(mut self, annotation: T) -> Instruction {
        self.annotations.push(annotation.to_string());
        self
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, types::types_to_string(&self.param_types))
    }
}
