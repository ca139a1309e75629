//! Signal project file (JSON) reader and writer
//!
//! Parses signal-manager project files and converts them into the internal
//! signal database format, and writes a database back out in the same layout.

use crate::signals::database::{
    AccessType, Asil, Checksum, CoreProperties, ImplApproach, InitValue, MemoryRegion, Metadata,
    SignalDatabase, SignalDefinition, SignalType, StructField,
};
use crate::types::{DataType, Result, SignalError};
use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

/// Top-level layout of a project file
#[derive(Debug, Serialize, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default = "default_soc")]
    soc_type: String,
    #[serde(default = "default_build")]
    build_type: String,
    #[serde(default)]
    soc_list: Vec<String>,
    #[serde(default)]
    build_list: Vec<String>,
    #[serde(default)]
    core_info: IndexMap<String, IndexMap<String, CoreEntry>>,
    #[serde(
        default,
        deserialize_with = "entries_in_order",
        serialize_with = "entries_as_map"
    )]
    signals: Vec<(String, SignalRecord)>,
}

fn default_soc() -> String {
    "Windows".to_string()
}

fn default_build() -> String {
    "SMP".to_string()
}

/// Core entry; older files store only a description string
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum CoreEntry {
    Properties(CoreProperties),
    Legacy(String),
}

/// A signal as stored in a project file
#[derive(Debug, Serialize, Deserialize)]
struct SignalRecord {
    #[serde(rename = "Variable_Port_Name", default)]
    variable_port_name: String,
    #[serde(rename = "Memory Region", default)]
    memory_region: MemoryRegion,
    #[serde(rename = "Buffer count_IPC", default = "one")]
    buffer_count_ipc: u32,
    #[serde(rename = "Type", default)]
    access_type: AccessType,
    #[serde(rename = "InitValue", default = "zero_memory")]
    init_value: String,
    #[serde(rename = "CustomInitValue", default, skip_serializing_if = "Option::is_none")]
    custom_init_value: Option<String>,
    #[serde(rename = "Notifiers", default)]
    notifiers: bool,
    #[serde(rename = "Source", default)]
    source: String,
    #[serde(rename = "Impl_Approach", default)]
    impl_approach: ImplApproach,
    #[serde(rename = "GetObjRef", default)]
    get_obj_ref: bool,
    #[serde(rename = "SM_Buff_Count", default = "one")]
    sm_buff_count: u32,
    #[serde(rename = "Timeout", default = "ten")]
    timeout: u32,
    #[serde(rename = "Periodicity", default = "ten")]
    periodicity: u32,
    #[serde(rename = "ASIL", default)]
    asil: Asil,
    /// `null` means no checksum
    #[serde(rename = "Checksum", default = "default_checksum")]
    checksum: Option<Checksum>,
    #[serde(rename = "DataType", default = "int32")]
    data_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_struct: bool,
    #[serde(
        default,
        deserialize_with = "entries_in_order",
        serialize_with = "entries_as_map"
    )]
    struct_fields: Vec<(String, FieldRecord)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    array_config: Option<ArrayConfig>,
    /// Per-core destination flags (`core_<soc>_<core>`) and unknown keys
    #[serde(flatten)]
    extra: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FieldRecord {
    #[serde(rename = "type")]
    data_type: DataType,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArrayConfig {
    base_type: DataType,
    size: usize,
}

fn one() -> u32 {
    1
}

fn ten() -> u32 {
    10
}

fn zero_memory() -> String {
    "ZeroMemory".to_string()
}

fn int32() -> String {
    "INT32".to_string()
}

fn default_checksum() -> Option<Checksum> {
    Some(Checksum::default())
}

/// Deserialize a JSON object into its entries, keeping order and repeated keys
///
/// A plain map would silently keep only the last of two equal keys; keeping
/// them lets validation report the repetition.
fn entries_in_order<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a JSON object")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some(entry) = map.next_entry::<String, T>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

fn entries_as_map<S, T>(entries: &[(String, T)], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
}

/// Key under which a signal stores whether a core is one of its destinations
fn destination_key(core: &str) -> String {
    format!("core_{}", core.replace('.', "_"))
}

/// Load a project file from disk
pub fn load_project(path: &Path) -> Result<SignalDatabase> {
    log::info!("Loading project file: {:?}", path);

    let content = std::fs::read_to_string(path).map_err(|e| {
        SignalError::ProjectParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;
    let db = parse_project(&content).map_err(|e| match e {
        SignalError::ProjectParseError(msg) => {
            SignalError::ProjectParseError(format!("{:?}: {}", path, msg))
        }
        other => other,
    })?;

    log::info!("Loaded {} signals from {:?}", db.stats().num_signals, path);
    Ok(db)
}

/// Parse the contents of a project file
pub fn parse_project(content: &str) -> Result<SignalDatabase> {
    let file: ProjectFile = serde_json::from_str(content)
        .map_err(|e| SignalError::ProjectParseError(e.to_string()))?;

    let mut db = SignalDatabase::new();
    db.metadata = file.metadata;
    db.metadata.ensure_defaults(chrono::Local::now().date_naive());
    db.soc_type = file.soc_type;
    db.build_type = file.build_type;
    db.soc_list = file.soc_list;
    db.build_list = file.build_list;
    if !db.soc_list.contains(&db.soc_type) {
        db.soc_list.insert(0, db.soc_type.clone());
    }
    if !db.build_list.contains(&db.build_type) {
        db.build_list.insert(0, db.build_type.clone());
    }

    for (soc, cores) in file.core_info {
        for (core, entry) in cores {
            let properties = match entry {
                CoreEntry::Properties(properties) => properties,
                CoreEntry::Legacy(description) => {
                    log::debug!("Upgrading legacy core entry {}.{}", soc, core);
                    CoreProperties {
                        description,
                        ..CoreProperties::default()
                    }
                }
            };
            db.add_core(&soc, &core, properties);
        }
    }

    let available_cores = db.available_cores();
    for (name, record) in file.signals {
        let signal = convert_signal(&name, record, &available_cores)?;
        db.add_signal(signal)?;
    }

    Ok(db)
}

/// Convert a project file signal record to our SignalDefinition
fn convert_signal(
    name: &str,
    record: SignalRecord,
    available_cores: &[String],
) -> Result<SignalDefinition> {
    let parse_error = |msg: String| SignalError::ProjectParseError(format!("signal '{}': {}", name, msg));

    let signal_type = if record.is_struct || record.data_type.eq_ignore_ascii_case("STRUCT") {
        SignalType::Struct(
            record
                .struct_fields
                .into_iter()
                .map(|(field_name, field)| {
                    StructField::new(field_name, field.data_type).with_description(field.description)
                })
                .collect(),
        )
    } else if record.data_type.eq_ignore_ascii_case("ARRAY") {
        let config = record
            .array_config
            .ok_or_else(|| parse_error("array signal without array_config".to_string()))?;
        SignalType::Array {
            element: config.base_type,
            size: config.size,
        }
    } else {
        let data_type = record
            .data_type
            .parse::<DataType>()
            .map_err(|e| parse_error(e.to_string()))?;
        SignalType::Primitive(data_type)
    };

    let init_value = match record.init_value.as_str() {
        "ZeroMemory" | "" => InitValue::ZeroMemory,
        "Custom" => InitValue::Custom(record.custom_init_value.unwrap_or_default()),
        other => {
            log::warn!("Signal '{}' has init value '{}', treating it as a custom initializer", name, other);
            InitValue::Custom(other.to_string())
        }
    };

    let mut destinations = Vec::new();
    for core in available_cores {
        if let Some(serde_json::Value::Bool(true)) = record.extra.get(&destination_key(core)) {
            destinations.push(core.clone());
        }
    }
    for key in record.extra.keys() {
        if key.starts_with("core_") && !available_cores.iter().any(|c| destination_key(c) == *key) {
            log::warn!("Signal '{}' references unconfigured core key '{}'", name, key);
        }
    }

    let mut signal = SignalDefinition::new(name, signal_type);
    if !record.variable_port_name.is_empty() {
        signal.variable_name = record.variable_port_name;
    }
    signal.init_value = init_value;
    signal.description = record.description;
    signal.notifiers = record.notifiers;
    signal.source = Some(record.source).filter(|s| !s.is_empty());
    signal.destinations = destinations;
    signal.memory_region = record.memory_region;
    signal.access_type = record.access_type;
    signal.impl_approach = record.impl_approach;
    signal.asil = record.asil;
    signal.checksum = record.checksum.unwrap_or(Checksum::None);
    signal.get_obj_ref = record.get_obj_ref;
    signal.ipc_buffer_count = record.buffer_count_ipc;
    signal.sm_buffer_count = record.sm_buff_count;
    signal.timeout_ms = record.timeout;
    signal.periodicity_ms = record.periodicity;
    Ok(signal)
}

fn to_record(signal: &SignalDefinition, available_cores: &[String]) -> SignalRecord {
    let (data_type, is_struct, struct_fields, array_config) = match &signal.signal_type {
        SignalType::Primitive(data_type) => (data_type.database_name().to_string(), false, Vec::new(), None),
        SignalType::Struct(fields) => (
            "STRUCT".to_string(),
            true,
            fields
                .iter()
                .map(|f| {
                    (
                        f.name.clone(),
                        FieldRecord {
                            data_type: f.data_type,
                            description: f.description.clone(),
                        },
                    )
                })
                .collect(),
            None,
        ),
        SignalType::Array { element, size } => (
            "ARRAY".to_string(),
            false,
            Vec::new(),
            Some(ArrayConfig {
                base_type: *element,
                size: *size,
            }),
        ),
    };

    let (init_value, custom_init_value) = match &signal.init_value {
        InitValue::ZeroMemory => ("ZeroMemory".to_string(), None),
        InitValue::Custom(text) => ("Custom".to_string(), Some(text.clone())),
    };

    let extra = available_cores
        .iter()
        .map(|core| {
            (
                destination_key(core),
                serde_json::Value::Bool(signal.destinations.contains(core)),
            )
        })
        .collect();

    SignalRecord {
        variable_port_name: signal.variable_name.clone(),
        memory_region: signal.memory_region,
        buffer_count_ipc: signal.ipc_buffer_count,
        access_type: signal.access_type,
        init_value,
        custom_init_value,
        notifiers: signal.notifiers,
        source: signal.source.clone().unwrap_or_default(),
        impl_approach: signal.impl_approach,
        get_obj_ref: signal.get_obj_ref,
        sm_buff_count: signal.sm_buffer_count,
        timeout: signal.timeout_ms,
        periodicity: signal.periodicity_ms,
        asil: signal.asil,
        checksum: Some(signal.checksum),
        data_type,
        description: signal.description.clone(),
        is_struct,
        struct_fields,
        array_config,
        extra,
    }
}

/// Render a database as project file JSON (4-space indentation)
pub fn to_json_string(db: &SignalDatabase) -> Result<String> {
    let available_cores = db.available_cores();
    let file = ProjectFile {
        metadata: db.metadata.clone(),
        soc_type: db.soc_type.clone(),
        build_type: db.build_type.clone(),
        soc_list: db.soc_list.clone(),
        build_list: db.build_list.clone(),
        core_info: db
            .cores()
            .iter()
            .map(|(soc, cores)| {
                let entries = cores
                    .iter()
                    .map(|(core, props)| (core.clone(), CoreEntry::Properties(props.clone())))
                    .collect();
                (soc.clone(), entries)
            })
            .collect(),
        signals: db
            .signals()
            .map(|s| (s.name.clone(), to_record(s, &available_cores)))
            .collect(),
    };

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    file.serialize(&mut serializer)
        .map_err(|e| SignalError::ProjectParseError(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| SignalError::ProjectParseError(e.to_string()))
}

/// Save a database as a project file
///
/// The metadata must name an editor; see [`Metadata::check_for_export`].
pub fn save_project(db: &SignalDatabase, path: &Path) -> Result<()> {
    db.metadata.check_for_export()?;
    let json = to_json_string(db)?;
    std::fs::write(path, json)?;
    log::info!("Saved project file: {:?}", path);
    Ok(())
}
