// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::Serialize;
use uxgate_core::GateError;
use uxgate_policies::PolicyValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Hold = 1,
    Usage = 2,
    Validation = 3,
    DependencyFailure = 4,
    Internal = 10,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineError {
    pub code: String,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl MachineError {
    #[must_use]
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug)]
pub struct CliError {
    pub exit_code: ExitCode,
    pub machine: MachineError,
}

impl CliError {
    pub fn usage(message: &str) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            machine: MachineError::new("usage_error", message),
        }
    }

    /// A results document that parses but cannot be scored faithfully.
    pub fn invalid_results(path: &str, message: &str) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new("results_invalid", message).with_detail("path", path),
        }
    }

    pub fn dependency(message: String) -> Self {
        Self {
            exit_code: ExitCode::DependencyFailure,
            machine: MachineError::new("dependency_failure", &message),
        }
    }
}

impl From<PolicyValidationError> for CliError {
    fn from(err: PolicyValidationError) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new("policy_invalid", &err.to_string()),
        }
    }
}

impl From<GateError> for CliError {
    fn from(err: GateError) -> Self {
        let (exit_code, code) = match &err {
            GateError::Registry(_) => (ExitCode::Validation, "registry_invalid"),
            GateError::Policy(_) => (ExitCode::Validation, "policy_invalid"),
            GateError::Driver(_) => (ExitCode::DependencyFailure, "driver_failure"),
            GateError::Read { .. } => (ExitCode::DependencyFailure, "read_failed"),
            GateError::Write(_) => (ExitCode::DependencyFailure, "report_write_failed"),
            GateError::Coverage { .. } => (ExitCode::Internal, "result_coverage_mismatch"),
            GateError::Encode(_) => (ExitCode::Internal, "internal_error"),
        };
        let mut machine = MachineError::new(code, &err.to_string());
        match &err {
            GateError::Registry(parse) => {
                machine = machine
                    .with_detail("registry", parse.registry)
                    .with_detail("path", &parse.path);
            }
            GateError::Coverage {
                missing,
                unexpected,
            } => {
                machine = machine
                    .with_detail("missing", &missing.join(","))
                    .with_detail("unexpected", &unexpected.join(","));
            }
            _ => {}
        }
        Self { exit_code, machine }
    }
}

pub(crate) fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine.message);
    }
}
