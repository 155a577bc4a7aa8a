// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::PathBuf;

use uxgate_adapters::{AdapterError, DriverError};
use uxgate_policies::PolicyValidationError;

/// A registry document that cannot be audited safely. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryParseError {
    pub registry: &'static str,
    pub path: String,
    pub message: String,
}

impl RegistryParseError {
    pub(crate) fn new(
        registry: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RegistryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} registry: {}", self.registry, self.message)
        } else {
            write!(f, "{} registry: {}: {}", self.registry, self.path, self.message)
        }
    }
}

impl std::error::Error for RegistryParseError {}

#[derive(Debug)]
pub enum GateError {
    Registry(RegistryParseError),
    Policy(PolicyValidationError),
    Driver(DriverError),
    Read { path: PathBuf, detail: String },
    Write(AdapterError),
    Coverage {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    Encode(String),
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(err) => err.fmt(f),
            Self::Policy(err) => write!(f, "policy: {err}"),
            Self::Driver(err) => write!(f, "driver: {err}"),
            Self::Read { path, detail } => write!(f, "read {} failed: {detail}", path.display()),
            Self::Write(err) => write!(f, "report write failed: {err}"),
            Self::Coverage {
                missing,
                unexpected,
            } => write!(
                f,
                "result coverage mismatch: missing=[{}] unexpected=[{}]",
                missing.join(", "),
                unexpected.join(", ")
            ),
            Self::Encode(detail) => write!(f, "encode report failed: {detail}"),
        }
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Policy(err) => Some(err),
            Self::Driver(err) => Some(err),
            Self::Write(err) => Some(err),
            Self::Read { .. } | Self::Coverage { .. } | Self::Encode(_) => None,
        }
    }
}

impl From<RegistryParseError> for GateError {
    fn from(value: RegistryParseError) -> Self {
        Self::Registry(value)
    }
}

impl From<PolicyValidationError> for GateError {
    fn from(value: PolicyValidationError) -> Self {
        Self::Policy(value)
    }
}

impl From<DriverError> for GateError {
    fn from(value: DriverError) -> Self {
        Self::Driver(value)
    }
}

impl From<AdapterError> for GateError {
    fn from(value: AdapterError) -> Self {
        Self::Write(value)
    }
}
