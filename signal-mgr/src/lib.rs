//! Signal Manager Library
//!
//! A reusable library for managing automotive signal definitions: it loads a
//! signal database from signal-manager project files (JSON) or lookup tables
//! (CSV), validates it, generates typed C accessors and provides a runtime
//! store with the same get/set contract.
//!
//! # Architecture
//!
//! - The signal database holds declared signals, structure layouts and the
//!   core topology in declaration order
//! - Validation collects every problem (duplicate struct fields, invalid
//!   identifiers, bad init values, unknown cores) before anything is generated
//! - Code generation emits `<stem>.h` with `Get_<Name>`/`Set_<Name>`
//!   prototypes and `<stem>.c` with storage and accessor bodies
//! - The signal store keeps current values, rejects writes outside the
//!   declared type's domain and tracks changes
//!
//! The command line front end lives in the application layer (signal-mgr-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use signal_mgr::{Generator, GeneratorConfig};
//! use std::path::Path;
//!
//! // Load signal definitions
//! let mut generator = Generator::new();
//! generator.add_project(Path::new("Test3.json")).unwrap();
//!
//! // Generate Test3.h / Test3.c
//! let config = GeneratorConfig::new().with_file_stem("Test3");
//! let files = generator.generate(&config).unwrap();
//! files.write_to(Path::new("out")).unwrap();
//!
//! // Use the same signals at runtime
//! let mut store = generator.build_store().unwrap();
//! let value = store.get("TestDataV1").unwrap();
//! let changed = store.set("TestDataV1", value).unwrap();
//! assert!(!changed);
//! ```

// Public modules
pub mod accessor;
pub mod codegen;
pub mod config;
pub mod generator;
pub mod signals;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use accessor::{field_as, SignalGroup, SignalScalar};
pub use config::GeneratorConfig;
pub use generator::{DatabaseStats, GeneratedFiles, Generator};
pub use signals::{
    InitValue, IssueKind, SignalDatabase, SignalDefinition, SignalType, StructField,
    ValidationIssue,
};
pub use store::{SignalChange, SignalStore, SubscriptionId};
pub use types::{DataType, FieldValue, Result, SignalError, SignalValue, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
