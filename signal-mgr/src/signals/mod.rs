//! Signal database, project file and lookup table handling
//!
//! This module contains the readers and writers for signal definition files
//! (JSON project files, CSV lookup tables) and the unified signal database.

pub mod database;
pub mod lookup_table;
pub mod project;
pub mod validation;
mod literal;

// Re-export key types for convenience
pub use database::{
    AccessType, Asil, Checksum, CoreProperties, DatabaseStats, ImplApproach, InitValue,
    MemoryRegion, Metadata, SignalDatabase, SignalDefinition, SignalType, StructField,
};
pub use lookup_table::ImportSummary;
pub use validation::{is_c_identifier, IssueKind, ValidationIssue};
