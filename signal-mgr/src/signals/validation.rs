//! Signal database validation
//!
//! Collects every problem that would make the generated code fail to compile
//! or misbehave, instead of stopping at the first one.

use crate::signals::database::{
    InitValue, SignalDatabase, SignalDefinition, SignalType, MAX_ARRAY_SIZE,
};
use crate::types::DataType;
use std::collections::HashSet;
use std::fmt;

/// C keywords that cannot be used as identifiers
const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Alignas", "_Alignof", "_Atomic",
    "_Bool", "_Complex", "_Generic", "_Imaginary", "_Noreturn", "_Static_assert",
    "_Thread_local",
];

/// Names the generated header gets from `<stdint.h>`, `<stdbool.h>` or defines itself
const PREDEFINED_NAMES: &[&str] = &[
    "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "bool", "true", "false", "SignalId_t", "SIGNAL_COUNT",
];

/// A problem found in the signal database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Signal the issue belongs to (None for database-wide issues)
    pub signal: Option<String>,
    pub kind: IssueKind,
}

/// Kinds of validation issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// A name is not usable as a C identifier
    InvalidIdentifier { what: &'static str, name: String },
    /// The same field name appears more than once in one structure
    DuplicateField { field: String },
    /// Two signals would define the same storage variable
    DuplicateVariable { variable: String },
    /// A structure without fields
    EmptyStruct,
    /// An array with no elements
    ZeroLengthArray,
    /// An array with more than [`MAX_ARRAY_SIZE`] elements
    ArrayTooLarge { size: usize },
    /// A name the generated code already uses for a type, function or macro
    ReservedName { what: &'static str, name: String },
    /// Two signals would define the same init value macro
    DuplicateInitMacro { name: String },
    /// The custom init value does not fit the signal's type
    InvalidInitValue { reason: String },
    /// A source or destination core that is not configured
    UnknownCore { core: String },
    /// A buffer count of zero
    ZeroBufferCount { attribute: &'static str },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(signal) = &self.signal {
            write!(f, "{}: ", signal)?;
        }
        match &self.kind {
            IssueKind::InvalidIdentifier { what, name } => {
                write!(f, "{} '{}' is not a valid C identifier", what, name)
            }
            IssueKind::DuplicateField { field } => {
                write!(f, "field '{}' is declared more than once", field)
            }
            IssueKind::DuplicateVariable { variable } => {
                write!(f, "variable '{}' is used by more than one signal", variable)
            }
            IssueKind::EmptyStruct => write!(f, "structure has no fields"),
            IssueKind::ZeroLengthArray => write!(f, "array size must be at least 1"),
            IssueKind::ArrayTooLarge { size } => {
                write!(f, "array size {} exceeds the maximum of {}", size, MAX_ARRAY_SIZE)
            }
            IssueKind::ReservedName { what, name } => {
                write!(f, "{} '{}' collides with a name of the generated code", what, name)
            }
            IssueKind::DuplicateInitMacro { name } => {
                write!(f, "init value macro '{}' is defined by more than one signal", name)
            }
            IssueKind::InvalidInitValue { reason } => write!(f, "invalid init value: {}", reason),
            IssueKind::UnknownCore { core } => write!(f, "core '{}' is not configured", core),
            IssueKind::ZeroBufferCount { attribute } => write!(f, "{} must be at least 1", attribute),
        }
    }
}

/// Check whether a name is a valid, non-reserved C identifier
pub fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    first_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !C_KEYWORDS.contains(&name)
}

/// Structural problems of one signal's type
///
/// These make the signal unusable anywhere, so the runtime store checks them
/// on declaration too.
pub fn check_layout(signal: &SignalDefinition) -> Vec<ValidationIssue> {
    layout_issues(&signal.signal_type)
        .into_iter()
        .map(|kind| ValidationIssue {
            signal: Some(signal.name.clone()),
            kind,
        })
        .collect()
}

fn layout_issues(signal_type: &SignalType) -> Vec<IssueKind> {
    let mut issues = Vec::new();
    match signal_type {
        SignalType::Primitive(_) => {}
        SignalType::Struct(fields) => {
            if fields.is_empty() {
                issues.push(IssueKind::EmptyStruct);
            }
            let mut seen = HashSet::new();
            let mut reported = HashSet::new();
            for field in fields {
                if !seen.insert(field.name.as_str()) && reported.insert(field.name.as_str()) {
                    issues.push(IssueKind::DuplicateField {
                        field: field.name.clone(),
                    });
                }
            }
        }
        SignalType::Array { size, .. } => {
            if *size == 0 {
                issues.push(IssueKind::ZeroLengthArray);
            } else if *size > MAX_ARRAY_SIZE {
                issues.push(IssueKind::ArrayTooLarge { size: *size });
            }
        }
    }
    issues
}

pub(crate) fn validate_database(db: &SignalDatabase) -> Vec<ValidationIssue> {
    let cores: HashSet<String> = db.available_cores().into_iter().collect();
    let generated = generated_names(db);
    let mut variables = HashSet::new();
    let mut macros = HashSet::new();
    let mut issues = Vec::new();

    for signal in db.signals() {
        let mut push = |kind: IssueKind| {
            issues.push(ValidationIssue {
                signal: Some(signal.name.clone()),
                kind,
            })
        };

        check_identifiers(signal, &mut push);

        if !variables.insert(signal.variable_name.as_str()) {
            push(IssueKind::DuplicateVariable {
                variable: signal.variable_name.clone(),
            });
        }
        if is_predefined(&signal.variable_name) || generated.contains(&signal.variable_name) {
            push(IssueKind::ReservedName {
                what: "variable name",
                name: signal.variable_name.clone(),
            });
        }
        if !matches!(signal.signal_type, SignalType::Primitive(_)) && is_predefined(&signal.c_type_name()) {
            push(IssueKind::ReservedName {
                what: "type name",
                name: signal.c_type_name(),
            });
        }

        let layout = layout_issues(&signal.signal_type);
        let layout_ok = layout.is_empty();
        layout.into_iter().for_each(&mut push);

        if let InitValue::Custom(_) = signal.init_value {
            let name = signal.init_macro_name();
            if !macros.insert(name.clone()) {
                push(IssueKind::DuplicateInitMacro { name });
            }
            // An init value cannot be checked against a broken layout
            if layout_ok {
                if let Err(e) = signal.initial_value() {
                    push(IssueKind::InvalidInitValue {
                        reason: e.to_string(),
                    });
                }
            }
        }

        for core in signal.source.iter().chain(signal.destinations.iter()) {
            if !cores.contains(core) {
                push(IssueKind::UnknownCore { core: core.clone() });
            }
        }

        if signal.ipc_buffer_count == 0 {
            push(IssueKind::ZeroBufferCount {
                attribute: "Buffer count_IPC",
            });
        }
        if signal.sm_buffer_count == 0 {
            push(IssueKind::ZeroBufferCount {
                attribute: "SM_Buff_Count",
            });
        }
    }

    if !issues.is_empty() {
        log::warn!("Signal database has {} validation issue(s)", issues.len());
    }
    issues
}

fn is_predefined(name: &str) -> bool {
    PREDEFINED_NAMES.contains(&name) || DataType::ALL.iter().any(|t| t.c_name() == name)
}

/// Type and function names the generated code declares for the signals
fn generated_names(db: &SignalDatabase) -> HashSet<String> {
    let mut names = HashSet::new();
    for signal in db.signals() {
        if !matches!(signal.signal_type, SignalType::Primitive(_)) {
            names.insert(signal.c_type_name());
        }
        names.insert(format!("Get_{}", signal.name));
        names.insert(format!("Set_{}", signal.name));
        if signal.notifiers {
            names.insert(format!("Notify_{}", signal.name));
        }
    }
    names
}

fn check_identifiers(signal: &SignalDefinition, push: &mut impl FnMut(IssueKind)) {
    if !is_c_identifier(&signal.name) {
        push(IssueKind::InvalidIdentifier {
            what: "signal name",
            name: signal.name.clone(),
        });
    }
    if signal.variable_name != signal.name && !is_c_identifier(&signal.variable_name) {
        push(IssueKind::InvalidIdentifier {
            what: "variable name",
            name: signal.variable_name.clone(),
        });
    }
    if let SignalType::Struct(fields) = &signal.signal_type {
        for field in fields {
            if !is_c_identifier(&field.name) {
                push(IssueKind::InvalidIdentifier {
                    what: "field name",
                    name: field.name.clone(),
                });
            }
        }
    }
}
