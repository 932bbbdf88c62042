//! Parameter, state and event declarations.
//!
//! Declarations must be issued while the operator is idle, before any module
//! is started. Each one validates itself so malformed input is rejected
//! before it reaches the wire.

use crate::{ErrorLocation, ModelError};

use std::ops::RangeInclusive;
use std::panic::Location;

use serde::{Deserialize, Serialize};

/// Valid bit widths for states and events.
pub const BIT_WIDTH_RANGE: RangeInclusive<i32> = 1..=32;

/// Placeholder the operator uses for an empty parameter field.
pub const EMPTY_FIELD: &str = "%";

/// Reject empty identifiers and identifiers containing whitespace.
#[track_caller]
pub fn validate_identifier(kind: &str, name: &str) -> Result<(), ModelError> {
    if name.is_empty() {
        return Err(ModelError::Validation {
            message: format!("{kind} name cannot be empty"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if name.chars().any(char::is_whitespace) {
        return Err(ModelError::Validation {
            message: format!("{kind} name '{name}' must not contain whitespace"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(())
}

#[track_caller]
fn validate_bit_width(kind: &str, name: &str, bits: i32, initial: u32) -> Result<(), ModelError> {
    if !BIT_WIDTH_RANGE.contains(&bits) {
        return Err(ModelError::Validation {
            message: format!(
                "{kind} '{name}' has bit width {bits} (must be {}-{})",
                BIT_WIDTH_RANGE.start(),
                BIT_WIDTH_RANGE.end()
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    // bits is 1-32 here, so the shift cannot overflow a u64
    if u64::from(initial) >= 1u64 << bits {
        return Err(ModelError::Validation {
            message: format!("{kind} '{name}' initial value {initial} does not fit in {bits} bits"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(())
}

fn field_or_empty(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => EMPTY_FIELD,
    }
}

/// A `variant` parameter added under a section such as `Application:Remote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub section: String,
    pub name: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

impl ParameterDecl {
    pub fn new(section: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            name: name.into(),
            default: None,
            min: None,
            max: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_range(mut self, min: impl Into<String>, max: impl Into<String>) -> Self {
        self.min = Some(min.into());
        self.max = Some(max.into());
        self
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_identifier("Parameter section", &self.section)?;
        validate_identifier("Parameter", &self.name)
    }

    /// `add parameter <section> variant <name>= <default> <min> <max>`
    pub fn to_command(&self) -> String {
        format!(
            "add parameter {} variant {}= {} {} {}",
            self.section,
            self.name,
            field_or_empty(self.default.as_deref()),
            field_or_empty(self.min.as_deref()),
            field_or_empty(self.max.as_deref()),
        )
    }
}

/// A state variable recorded with every sample block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDecl {
    pub name: String,
    pub bits: i32,
    #[serde(default)]
    pub initial: u32,
}

impl StateDecl {
    pub fn new(name: impl Into<String>, bits: i32, initial: u32) -> Self {
        Self {
            name: name.into(),
            bits,
            initial,
        }
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_identifier("State", &self.name)?;
        validate_bit_width("State", &self.name, self.bits, self.initial)
    }

    pub fn to_command(&self) -> String {
        format!("add state {} {} {}", self.name, self.bits, self.initial)
    }
}

/// An event, recorded with sample-accurate timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDecl {
    pub name: String,
    pub bits: i32,
    #[serde(default)]
    pub initial: u32,
}

impl EventDecl {
    pub fn new(name: impl Into<String>, bits: i32, initial: u32) -> Self {
        Self {
            name: name.into(),
            bits,
            initial,
        }
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_identifier("Event", &self.name)?;
        validate_bit_width("Event", &self.name, self.bits, self.initial)
    }

    pub fn to_command(&self) -> String {
        format!("add event {} {} {}", self.name, self.bits, self.initial)
    }
}
