// Copyright contributors to the qasm-analyzer project
// SPDX-License-Identifier: Apache-2.0

//! Error-model descriptors, registered for use with the dedicated
//! `error_model` meta-instruction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{self, Type};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorModel {
    pub name: String,
    pub param_types: Vec<Type>,
    /// Opaque payloads attached at registration time, preserved but never
    /// interpreted by the analyzer.
    pub annotations: Vec<String>,
}

impl ErrorModel {
    pub fn new<T: ToString, P: types::ParamTypeSpec>(name: T, param_types: P) -> ErrorModel {
        ErrorModel {
            name: name.to_string(),
            param_types: param_types.into_types(),
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation<T: ToString>(mut self, annotation: T) -> ErrorModel {
        self.annotations.push(annotation.to_string());
        self
    }
}

impl fmt::Display for ErrorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, types::types_to_string(&self.param_types))
    }
}
