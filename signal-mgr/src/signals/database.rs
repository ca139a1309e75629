//! Unified signal database
//!
//! Holds the declared signals of a project together with the core topology and
//! the project metadata. Signals keep their declaration order, which is also
//! the order used by the code generators.

use crate::signals::literal;
use crate::signals::validation::{self, ValidationIssue};
use crate::types::{DataType, FieldValue, Result, SignalError, SignalValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Placeholder shown by editors before a real name was entered
const EDITOR_PLACEHOLDER: &str = "enter your name";

/// Largest supported array signal, in elements
pub const MAX_ARRAY_SIZE: usize = 1000;

/// Memory region a signal buffer is placed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryRegion {
    #[default]
    #[serde(rename = "DDR")]
    Ddr,
    Cached,
    NonCached,
}

/// Access discipline between producer and consumers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    #[default]
    Concurrent,
    Sequential,
}

/// Transport used to deliver a signal to its destination cores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImplApproach {
    #[default]
    SharedMemory,
    #[serde(rename = "IPC")]
    Ipc,
    #[serde(rename = "IPCOverEthernet")]
    IpcOverEthernet,
}

/// ISO 26262 integrity level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asil {
    #[default]
    #[serde(rename = "QM")]
    Qm,
    A,
    B,
    C,
    D,
}

/// Checksum protection of a signal buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Checksum {
    None,
    #[default]
    Additive,
    CustomChecksum,
}

/// How a signal's storage is initialized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InitValue {
    /// All bytes zero
    #[default]
    ZeroMemory,
    /// A C initializer, e.g. `42`, `1.5f` or `{1, 0}`
    Custom(String),
}

/// A field of a structure signal
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub data_type: DataType,
    pub description: String,
}

impl StructField {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Declared type of a signal
#[derive(Debug, Clone, PartialEq)]
pub enum SignalType {
    /// A single fixed-width value
    Primitive(DataType),
    /// An ordered aggregate of named primitive fields
    Struct(Vec<StructField>),
    /// A fixed-size array of one primitive type
    Array { element: DataType, size: usize },
}

impl SignalType {
    /// C type name used for this signal in generated code
    ///
    /// Aggregates get a dedicated typedef named after the signal (`TestDataV1_t`).
    pub fn c_type_name(&self, signal_name: &str) -> String {
        match self {
            SignalType::Primitive(data_type) => data_type.c_name().to_string(),
            SignalType::Struct(_) | SignalType::Array { .. } => format!("{}_t", signal_name),
        }
    }

    /// Name used for this type in project files
    pub fn database_name(&self) -> &'static str {
        match self {
            SignalType::Primitive(data_type) => data_type.database_name(),
            SignalType::Struct(_) => "STRUCT",
            SignalType::Array { .. } => "ARRAY",
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, SignalType::Struct(_))
    }

    /// Whether two types have the same memory layout
    ///
    /// Compares field names and types, element type and size; field
    /// descriptions are ignored.
    pub fn same_layout(&self, other: &SignalType) -> bool {
        match (self, other) {
            (SignalType::Primitive(a), SignalType::Primitive(b)) => a == b,
            (SignalType::Struct(a), SignalType::Struct(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|(x, y)| x.name == y.name && x.data_type == y.data_type)
            }
            (
                SignalType::Array { element, size },
                SignalType::Array {
                    element: other_element,
                    size: other_size,
                },
            ) => element == other_element && size == other_size,
            _ => false,
        }
    }

    /// Look up a structure field by name
    pub fn field(&self, name: &str) -> Option<&StructField> {
        match self {
            SignalType::Struct(fields) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    /// The all-zero value of this type
    pub fn zero_value(&self) -> SignalValue {
        match self {
            SignalType::Primitive(data_type) => data_type.zero_value(),
            SignalType::Struct(fields) => SignalValue::Struct(
                fields
                    .iter()
                    .map(|f| FieldValue::new(f.name.clone(), f.data_type.zero_value()))
                    .collect(),
            ),
            SignalType::Array { element, size } => {
                SignalValue::Array(vec![element.zero_value(); *size])
            }
        }
    }

    /// Check a value against this type and return its canonical form
    ///
    /// Structure values must name exactly the declared fields in declared
    /// order; array values must have exactly `size` elements.
    pub fn coerce(&self, signal: &str, value: &SignalValue) -> Result<SignalValue> {
        match (self, value) {
            (SignalType::Primitive(data_type), _) => data_type.coerce(signal, value),
            (SignalType::Struct(fields), SignalValue::Struct(values)) => {
                if fields.len() != values.len() {
                    return Err(SignalError::InvalidValue {
                        signal: signal.to_string(),
                        reason: format!(
                            "expected {} struct fields, found {}",
                            fields.len(),
                            values.len()
                        ),
                    });
                }
                let mut coerced = Vec::with_capacity(fields.len());
                for (field, field_value) in fields.iter().zip(values) {
                    if field.name != field_value.name {
                        return Err(SignalError::FieldNotFound {
                            signal: signal.to_string(),
                            field: field_value.name.clone(),
                        });
                    }
                    let path = format!("{}.{}", signal, field.name);
                    coerced.push(FieldValue::new(
                        field.name.clone(),
                        field.data_type.coerce(&path, &field_value.value)?,
                    ));
                }
                Ok(SignalValue::Struct(coerced))
            }
            (SignalType::Array { element, size }, SignalValue::Array(items)) => {
                if items.len() != *size {
                    return Err(SignalError::InvalidValue {
                        signal: signal.to_string(),
                        reason: format!("expected {} array elements, found {}", size, items.len()),
                    });
                }
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| element.coerce(&format!("{}[{}]", signal, i), item))
                    .collect::<Result<Vec<_>>>()
                    .map(SignalValue::Array)
            }
            _ => Err(SignalError::TypeMismatch {
                signal: signal.to_string(),
                expected: self.database_name().to_string(),
                found: value.kind_name().to_string(),
            }),
        }
    }
}

/// A declared signal with its deployment attributes
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    /// Signal name (also the accessor suffix: `Get_<name>`)
    pub name: String,
    /// Name of the generated storage variable
    pub variable_name: String,
    /// Declared type; immutable once the signal is in a store
    pub signal_type: SignalType,
    pub init_value: InitValue,
    pub description: String,
    /// Whether writers notify consumers after a change
    pub notifiers: bool,
    /// Producing core (`soc.core`), if assigned
    pub source: Option<String>,
    /// Consuming cores (`soc.core`)
    pub destinations: Vec<String>,
    pub memory_region: MemoryRegion,
    pub access_type: AccessType,
    pub impl_approach: ImplApproach,
    pub asil: Asil,
    pub checksum: Checksum,
    pub get_obj_ref: bool,
    pub ipc_buffer_count: u32,
    pub sm_buffer_count: u32,
    pub timeout_ms: u32,
    pub periodicity_ms: u32,
}

impl SignalDefinition {
    /// Create a signal with the default attributes of a newly added signal
    pub fn new(name: impl Into<String>, signal_type: SignalType) -> Self {
        let name = name.into();
        Self {
            variable_name: name.clone(),
            name,
            signal_type,
            init_value: InitValue::ZeroMemory,
            description: "New signal".to_string(),
            notifiers: false,
            source: None,
            destinations: Vec::new(),
            memory_region: MemoryRegion::default(),
            access_type: AccessType::default(),
            impl_approach: ImplApproach::default(),
            asil: Asil::default(),
            checksum: Checksum::default(),
            get_obj_ref: false,
            ipc_buffer_count: 1,
            sm_buffer_count: 1,
            timeout_ms: 10,
            periodicity_ms: 10,
        }
    }

    pub fn with_init_value(mut self, init_value: InitValue) -> Self {
        self.init_value = init_value;
        self
    }

    pub fn with_notifiers(mut self, enabled: bool) -> Self {
        self.notifiers = enabled;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_variable_name(mut self, variable_name: impl Into<String>) -> Self {
        self.variable_name = variable_name.into();
        self
    }

    pub fn with_source(mut self, core: impl Into<String>) -> Self {
        self.source = Some(core.into());
        self
    }

    pub fn add_destination(mut self, core: impl Into<String>) -> Self {
        self.destinations.push(core.into());
        self
    }

    /// C type name of this signal in generated code
    pub fn c_type_name(&self) -> String {
        self.signal_type.c_type_name(&self.name)
    }

    /// Name of the init value macro emitted for custom initializers
    pub fn init_macro_name(&self) -> String {
        format!("{}_INIT_VALUE", self.variable_name.to_ascii_uppercase())
    }

    /// Value the signal holds before the first write
    pub fn initial_value(&self) -> Result<SignalValue> {
        if let SignalType::Array { size, .. } = self.signal_type {
            if size > MAX_ARRAY_SIZE {
                return Err(SignalError::InvalidValue {
                    signal: self.name.clone(),
                    reason: format!("array size {} exceeds the maximum of {}", size, MAX_ARRAY_SIZE),
                });
            }
        }
        match &self.init_value {
            InitValue::ZeroMemory => Ok(self.signal_type.zero_value()),
            InitValue::Custom(text) => literal::parse_value(&self.name, &self.signal_type, text),
        }
    }
}

/// Properties of a processing core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreProperties {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default)]
    pub is_qnx: bool,
    #[serde(default)]
    pub is_autosar: bool,
    #[serde(default)]
    pub is_sim: bool,
    #[serde(default = "unknown")]
    pub os: String,
    #[serde(default = "unknown")]
    pub soc_family: String,
}

fn unknown() -> String {
    "Unknown".to_string()
}

impl Default for CoreProperties {
    fn default() -> Self {
        Self {
            description: String::new(),
            is_master: false,
            is_qnx: false,
            is_autosar: false,
            is_sim: false,
            os: unknown(),
            soc_family: unknown(),
        }
    }
}

/// Project version information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub editor: String,
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_description() -> String {
    "Signal Configuration".to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: default_version(),
            date: String::new(),
            editor: String::new(),
            description: default_description(),
        }
    }
}

impl Metadata {
    /// Fill in fields an older project file may lack
    pub fn ensure_defaults(&mut self, today: chrono::NaiveDate) {
        if self.version.trim().is_empty() {
            self.version = default_version();
        }
        if self.date.trim().is_empty() {
            self.date = today.format("%Y-%m-%d").to_string();
        }
    }

    /// Check that the metadata is complete enough to save or export
    pub fn check_for_export(&self) -> Result<()> {
        let editor = self.editor.trim();
        if editor.is_empty() || editor.eq_ignore_ascii_case(EDITOR_PLACEHOLDER) {
            return Err(SignalError::InvalidMetadata(
                "editor name is required before saving".to_string(),
            ));
        }
        if self.version.trim().is_empty() {
            return Err(SignalError::InvalidMetadata("version is required".to_string()));
        }
        if !self.date.is_empty() && chrono::NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err() {
            return Err(SignalError::InvalidMetadata(format!(
                "date '{}' is not in YYYY-MM-DD format",
                self.date
            )));
        }
        Ok(())
    }
}

/// The unified signal database
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDatabase {
    pub metadata: Metadata,
    /// Selected SOC
    pub soc_type: String,
    /// Selected build type (e.g. `SMP`)
    pub build_type: String,
    pub soc_list: Vec<String>,
    pub build_list: Vec<String>,

    /// Core topology: SOC name -> core name -> properties
    cores: IndexMap<String, IndexMap<String, CoreProperties>>,

    /// Declared signals by name, in declaration order
    signals: IndexMap<String, SignalDefinition>,
}

impl SignalDatabase {
    /// Create a new empty signal database
    pub fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            soc_type: "Windows".to_string(),
            build_type: "SMP".to_string(),
            soc_list: vec!["Windows".to_string()],
            build_list: vec!["SMP".to_string()],
            cores: IndexMap::new(),
            signals: IndexMap::new(),
        }
    }

    /// Add a signal; fails if a signal with the same name exists
    pub fn add_signal(&mut self, signal: SignalDefinition) -> Result<()> {
        if self.signals.contains_key(&signal.name) {
            return Err(SignalError::DuplicateSignal(signal.name));
        }
        log::debug!("Adding signal '{}' ({})", signal.name, signal.signal_type.database_name());
        self.signals.insert(signal.name.clone(), signal);
        Ok(())
    }

    /// Replace the definition of an existing signal
    pub fn update_signal(&mut self, signal: SignalDefinition) -> Result<()> {
        match self.signals.get_mut(&signal.name) {
            Some(existing) => {
                *existing = signal;
                Ok(())
            }
            None => Err(SignalError::SignalNotFound(signal.name)),
        }
    }

    pub fn remove_signal(&mut self, name: &str) -> Result<SignalDefinition> {
        self.signals
            .shift_remove(name)
            .ok_or_else(|| SignalError::SignalNotFound(name.to_string()))
    }

    /// Rename a signal, keeping its position in the declaration order
    ///
    /// The variable name follows the rename when it was still the default
    /// (equal to the old signal name).
    pub fn rename_signal(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if self.signals.contains_key(new_name) {
            return Err(SignalError::DuplicateSignal(new_name.to_string()));
        }
        let (index, _, mut signal) = self
            .signals
            .shift_remove_full(old_name)
            .ok_or_else(|| SignalError::SignalNotFound(old_name.to_string()))?;

        if signal.variable_name == signal.name {
            signal.variable_name = new_name.to_string();
        }
        signal.name = new_name.to_string();
        self.signals.shift_insert(index, new_name.to_string(), signal);
        log::debug!("Renamed signal '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    /// Copy a signal under a fresh name and return that name
    ///
    /// The copy is named `<name>_copy`, or `<name>_copy1`, `<name>_copy2`, ...
    /// when that is taken.
    pub fn duplicate_signal(&mut self, name: &str) -> Result<String> {
        let original = self
            .signals
            .get(name)
            .cloned()
            .ok_or_else(|| SignalError::SignalNotFound(name.to_string()))?;

        let mut new_name = format!("{}_copy", name);
        let mut counter = 1;
        while self.signals.contains_key(&new_name) {
            new_name = format!("{}_copy{}", name, counter);
            counter += 1;
        }

        let mut copy = original;
        if copy.variable_name == copy.name {
            copy.variable_name = new_name.clone();
        }
        copy.name = new_name.clone();
        self.signals.insert(new_name.clone(), copy);
        Ok(new_name)
    }

    pub fn get_signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.get(name)
    }

    /// All signals in declaration order
    pub fn signals(&self) -> impl Iterator<Item = &SignalDefinition> {
        self.signals.values()
    }

    pub fn signal_names(&self) -> Vec<&str> {
        self.signals.keys().map(String::as_str).collect()
    }

    /// Add or replace a core of a SOC
    pub fn add_core(&mut self, soc: &str, core: &str, properties: CoreProperties) {
        if !self.soc_list.iter().any(|s| s == soc) {
            self.soc_list.push(soc.to_string());
        }
        self.cores
            .entry(soc.to_string())
            .or_default()
            .insert(core.to_string(), properties);
    }

    pub fn core(&self, soc: &str, core: &str) -> Option<&CoreProperties> {
        self.cores.get(soc).and_then(|cores| cores.get(core))
    }

    /// Core topology by SOC
    pub fn cores(&self) -> &IndexMap<String, IndexMap<String, CoreProperties>> {
        &self.cores
    }

    /// All configured cores as `soc.core`
    pub fn available_cores(&self) -> Vec<String> {
        self.cores
            .iter()
            .flat_map(|(soc, cores)| cores.keys().map(move |core| format!("{}.{}", soc, core)))
            .collect()
    }

    /// Merge another database into this one
    ///
    /// Signals are appended in their declaration order; a name present in both
    /// is an error. Cores are merged, the other database winning on conflicts.
    pub fn merge(&mut self, other: SignalDatabase) -> Result<()> {
        if let Some(duplicate) = other.signals.keys().find(|n| self.signals.contains_key(*n)) {
            return Err(SignalError::DuplicateSignal(duplicate.clone()));
        }
        for (soc, cores) in other.cores {
            for (core, properties) in cores {
                self.add_core(&soc, &core, properties);
            }
        }
        for build in other.build_list {
            if !self.build_list.contains(&build) {
                self.build_list.push(build);
            }
        }
        self.signals.extend(other.signals);
        Ok(())
    }

    /// Check the database for problems that would produce broken code
    pub fn validate(&self) -> Vec<ValidationIssue> {
        validation::validate_database(self)
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        let mut stats = DatabaseStats {
            num_signals: self.signals.len(),
            num_cores: self.cores.values().map(|c| c.len()).sum(),
            ..DatabaseStats::default()
        };
        for signal in self.signals.values() {
            match signal.signal_type {
                SignalType::Primitive(_) => {}
                SignalType::Struct(_) => stats.num_structs += 1,
                SignalType::Array { .. } => stats.num_arrays += 1,
            }
            if signal.notifiers {
                stats.num_notifying += 1;
            }
        }
        stats
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of declared signals
    pub num_signals: usize,
    /// Signals declared with a structure type
    pub num_structs: usize,
    /// Signals declared with an array type
    pub num_arrays: usize,
    /// Signals with notifiers enabled
    pub num_notifying: usize,
    /// Total number of configured cores
    pub num_cores: usize,
}

impl Default for SignalDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_type() -> SignalType {
        SignalType::Struct(vec![
            StructField::new("flag_a", DataType::Bool),
            StructField::new("flag_b", DataType::Bool),
        ])
    }

    #[test]
    fn test_empty_database() {
        let db = SignalDatabase::new();
        let stats = db.stats();
        assert_eq!(stats.num_signals, 0);
        assert_eq!(stats.num_cores, 0);
    }

    #[test]
    fn test_add_signal() {
        let mut db = SignalDatabase::new();
        db.add_signal(SignalDefinition::new("TestDataV1", flags_type())).unwrap();
        db.add_signal(SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt16)))
            .unwrap();

        let stats = db.stats();
        assert_eq!(stats.num_signals, 2);
        assert_eq!(stats.num_structs, 1);

        let signal = db.get_signal("TestDataV1").unwrap();
        assert_eq!(signal.c_type_name(), "TestDataV1_t");
        assert_eq!(db.get_signal("Speed").unwrap().c_type_name(), "uint16");

        let err = db
            .add_signal(SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt8)))
            .unwrap_err();
        assert!(matches!(err, SignalError::DuplicateSignal(_)));
    }

    #[test]
    fn test_rename_keeps_order() {
        let mut db = SignalDatabase::new();
        for name in ["A", "B", "C"] {
            db.add_signal(SignalDefinition::new(name, SignalType::Primitive(DataType::Bool)))
                .unwrap();
        }
        db.rename_signal("B", "Beta").unwrap();
        assert_eq!(db.signal_names(), vec!["A", "Beta", "C"]);
        assert_eq!(db.get_signal("Beta").unwrap().variable_name, "Beta");

        assert!(matches!(
            db.rename_signal("A", "C"),
            Err(SignalError::DuplicateSignal(_))
        ));
        assert!(matches!(
            db.rename_signal("Missing", "X"),
            Err(SignalError::SignalNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_signal_names() {
        let mut db = SignalDatabase::new();
        db.add_signal(SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt16)))
            .unwrap();

        assert_eq!(db.duplicate_signal("Speed").unwrap(), "Speed_copy");
        assert_eq!(db.duplicate_signal("Speed").unwrap(), "Speed_copy1");
        assert_eq!(db.duplicate_signal("Speed").unwrap(), "Speed_copy2");
        assert_eq!(db.stats().num_signals, 4);
        assert_eq!(db.get_signal("Speed_copy1").unwrap().variable_name, "Speed_copy1");
    }

    #[test]
    fn test_remove_and_update() {
        let mut db = SignalDatabase::new();
        db.add_signal(SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt16)))
            .unwrap();

        let updated = SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt16))
            .with_notifiers(true);
        db.update_signal(updated).unwrap();
        assert!(db.get_signal("Speed").unwrap().notifiers);

        db.remove_signal("Speed").unwrap();
        assert!(db.get_signal("Speed").is_none());
        assert!(db.remove_signal("Speed").is_err());
    }

    #[test]
    fn test_available_cores() {
        let mut db = SignalDatabase::new();
        db.add_core("SocA", "Core0", CoreProperties::default());
        db.add_core("SocA", "Core1", CoreProperties::default());
        db.add_core("SocB", "Mcu", CoreProperties::default());

        assert_eq!(
            db.available_cores(),
            vec!["SocA.Core0", "SocA.Core1", "SocB.Mcu"]
        );
        assert!(db.soc_list.contains(&"SocB".to_string()));
        assert_eq!(db.stats().num_cores, 3);
    }

    #[test]
    fn test_struct_coerce() {
        let signal_type = flags_type();
        let value = SignalValue::Struct(vec![
            FieldValue::new("flag_a", SignalValue::Boolean(true)),
            FieldValue::new("flag_b", SignalValue::Boolean(false)),
        ]);
        assert_eq!(signal_type.coerce("TestDataV1", &value).unwrap(), value);

        let wrong_order = SignalValue::Struct(vec![
            FieldValue::new("flag_b", SignalValue::Boolean(true)),
            FieldValue::new("flag_a", SignalValue::Boolean(false)),
        ]);
        assert!(signal_type.coerce("TestDataV1", &wrong_order).is_err());
        assert!(signal_type.coerce("TestDataV1", &SignalValue::Boolean(true)).is_err());
    }

    #[test]
    fn test_same_layout_ignores_descriptions() {
        let documented = SignalType::Struct(vec![
            StructField::new("flag_a", DataType::Bool).with_description("First flag"),
            StructField::new("flag_b", DataType::Bool).with_description("Second flag"),
        ]);
        assert_ne!(documented, flags_type());
        assert!(documented.same_layout(&flags_type()));

        let retyped = SignalType::Struct(vec![
            StructField::new("flag_a", DataType::Bool),
            StructField::new("flag_b", DataType::UInt8),
        ]);
        assert!(!retyped.same_layout(&flags_type()));
        assert!(!SignalType::Array {
            element: DataType::UInt8,
            size: 4
        }
        .same_layout(&SignalType::Array {
            element: DataType::UInt8,
            size: 5
        }));
    }

    #[test]
    fn test_oversized_array_has_no_initial_value() {
        let signal = SignalDefinition::new(
            "Huge",
            SignalType::Array {
                element: DataType::UInt8,
                size: usize::MAX,
            },
        );
        assert!(matches!(
            signal.initial_value(),
            Err(SignalError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_metadata_export_check() {
        let mut metadata = Metadata::default();
        assert!(metadata.check_for_export().is_err());

        metadata.editor = "Enter your name".to_string();
        assert!(metadata.check_for_export().is_err());

        metadata.editor = "J. Doe".to_string();
        metadata.ensure_defaults(chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(metadata.date, "2024-05-01");
        assert!(metadata.check_for_export().is_ok());

        metadata.date = "01/05/2024".to_string();
        assert!(metadata.check_for_export().is_err());
    }
}
