//! Lookup table (CSV) import and export
//!
//! The lookup table is the flat, one-row-per-signal view of a project that
//! downstream generator scripts consume. Booleans are written as `Yes`/`No`,
//! and every configured core gets its own destination column between
//! `DataType` and `description`.
//!
//! Project metadata and the core topology travel in two companion files next
//! to the table: `<stem>_Version.csv` and `<stem>_Config.csv`.

use crate::signals::database::{
    CoreProperties, InitValue, SignalDatabase, SignalDefinition, SignalType,
};
use crate::types::{DataType, Result, SignalError};
use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Companion file holding the project metadata
pub const VERSION_SHEET: &str = "Version";

/// Companion file holding the SOC, build type and core topology
pub const CONFIG_SHEET: &str = "Config";

/// Columns before the per-core destination columns
const LEADING_COLUMNS: [&str; 16] = [
    "Data_Type",
    "Variable_Port_Name",
    "Memory Region",
    "Buffer count_IPC",
    "Type",
    "InitValue",
    "Notifiers",
    "Source",
    "Impl_Approach",
    "GetObjRef",
    "SM_Buff_Count",
    "Timeout",
    "Periodicity",
    "ASIL",
    "Checksum",
    "DataType",
];

const DESCRIPTION_COLUMN: &str = "description";

/// Outcome of a lookup table import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Signals added to the database
    pub imported: usize,
    /// Rows that could not be represented (aggregate types), by signal name
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionRecord {
    #[serde(rename = "Version", default)]
    version: String,
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "Last Modified By", default)]
    editor: String,
    #[serde(rename = "Description", default)]
    description: String,
}

/// One row of the config file; SOC name and build type are only set on the first
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigRecord {
    #[serde(rename = "SOC Name", default)]
    soc_name: String,
    #[serde(rename = "TypeOfBin", default)]
    build_type: String,
    #[serde(rename = "SOC", default)]
    soc: String,
    #[serde(rename = "CORE", default)]
    core: String,
    #[serde(rename = "Master/Slave", default)]
    role: String,
    #[serde(rename = "Is Qnx Core ?", default)]
    is_qnx: String,
    #[serde(rename = "Is Autosar Compliant ?", default)]
    is_autosar: String,
    #[serde(rename = "Is Sim Core ?", default)]
    is_sim: String,
    #[serde(rename = "OS", default)]
    os: String,
    #[serde(rename = "SOC Family", default)]
    soc_family: String,
    #[serde(rename = "Description", default)]
    description: String,
}

/// Path of a companion file (`signals.csv` -> `signals_Config.csv`)
pub fn companion_path(table: &Path, sheet: &str) -> PathBuf {
    let stem = table
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    table.with_file_name(format!("{}_{}.csv", stem, sheet))
}

/// Write the lookup table of a database to a CSV file, plus its companions
///
/// Like saving a project, exporting requires a real editor name.
pub fn export_table(db: &SignalDatabase, path: &Path) -> Result<()> {
    db.metadata.check_for_export()?;

    write_table(db, std::fs::File::create(path)?)?;
    write_version(db, std::fs::File::create(companion_path(path, VERSION_SHEET))?)?;
    write_config(db, std::fs::File::create(companion_path(path, CONFIG_SHEET))?)?;
    log::info!("Exported {} signals to {:?}", db.stats().num_signals, path);
    Ok(())
}

/// Write the project metadata as a one-row CSV
pub fn write_version<W: Write>(db: &SignalDatabase, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .serialize(VersionRecord {
            version: db.metadata.version.clone(),
            date: db.metadata.date.clone(),
            editor: db.metadata.editor.clone(),
            description: db.metadata.description.clone(),
        })
        .map_err(table_error)?;
    csv_writer.flush()?;
    Ok(())
}

/// Write the selected SOC, build type and one row per core as CSV
pub fn write_config<W: Write>(db: &SignalDatabase, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut records: Vec<ConfigRecord> = db
        .cores()
        .iter()
        .flat_map(|(soc, cores)| {
            cores.iter().map(move |(core, props)| ConfigRecord {
                soc: soc.clone(),
                core: core.clone(),
                role: if props.is_master { "Master" } else { "Slave" }.to_string(),
                is_qnx: yes_no(props.is_qnx),
                is_autosar: yes_no(props.is_autosar),
                is_sim: yes_no(props.is_sim),
                os: props.os.clone(),
                soc_family: props.soc_family.clone(),
                description: props.description.clone(),
                ..ConfigRecord::default()
            })
        })
        .collect();
    if records.is_empty() {
        records.push(ConfigRecord::default());
    }
    records[0].soc_name = db.soc_type.clone();
    records[0].build_type = db.build_type.clone();

    for record in &records {
        csv_writer.serialize(record).map_err(table_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read the project metadata from a version CSV
///
/// Empty cells keep the current value; a date that is not `YYYY-MM-DD` is
/// ignored.
pub fn read_version<R: Read>(db: &mut SignalDatabase, reader: R) -> Result<()> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let Some(record) = csv_reader.deserialize::<VersionRecord>().next() else {
        return Ok(());
    };
    let record = record.map_err(table_error)?;

    let metadata = &mut db.metadata;
    if !record.version.trim().is_empty() {
        metadata.version = record.version.trim().to_string();
    }
    let date = record.date.trim();
    if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() {
        metadata.date = date.to_string();
    } else if !date.is_empty() {
        log::warn!("Ignoring version date '{}': not in YYYY-MM-DD format", date);
    }
    if !record.editor.trim().is_empty() {
        metadata.editor = record.editor.trim().to_string();
    }
    if !record.description.trim().is_empty() {
        metadata.description = record.description.trim().to_string();
    }
    Ok(())
}

/// Read the SOC, build type and cores from a config CSV; returns the number of cores read
pub fn read_config<R: Read>(db: &mut SignalDatabase, reader: R) -> Result<usize> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut cores = 0;
    for (line, record) in csv_reader.deserialize::<ConfigRecord>().enumerate() {
        let record = record.map_err(table_error)?;

        if line == 0 {
            let soc_name = record.soc_name.trim();
            if !soc_name.is_empty() {
                db.soc_type = soc_name.to_string();
                if !db.soc_list.iter().any(|s| s == soc_name) {
                    db.soc_list.push(soc_name.to_string());
                }
            }
            let build_type = record.build_type.trim();
            if !build_type.is_empty() {
                db.build_type = build_type.to_string();
                if !db.build_list.iter().any(|b| b == build_type) {
                    db.build_list.push(build_type.to_string());
                }
            }
        }

        let (soc, core) = (record.soc.trim(), record.core.trim());
        if soc.is_empty() || core.is_empty() {
            continue;
        }
        let text_or_unknown = |cell: &str| match cell.trim() {
            "" => "Unknown".to_string(),
            text => text.to_string(),
        };
        let properties = CoreProperties {
            description: record.description.trim().to_string(),
            is_master: record.role.trim().eq_ignore_ascii_case("master"),
            is_qnx: is_yes(record.is_qnx.trim()),
            is_autosar: is_yes(record.is_autosar.trim()),
            is_sim: is_yes(record.is_sim.trim()),
            os: text_or_unknown(&record.os),
            soc_family: text_or_unknown(&record.soc_family),
        };
        db.add_core(soc, core, properties);
        cores += 1;
    }
    Ok(cores)
}

/// Read the metadata companion of a lookup table, if there is one
///
/// Returns `false` when the table has no version file.
pub fn import_metadata(db: &mut SignalDatabase, table: &Path) -> Result<bool> {
    let path = companion_path(table, VERSION_SHEET);
    if !path.exists() {
        return Ok(false);
    }
    log::info!("Importing project metadata: {:?}", path);
    read_version(db, std::fs::File::open(&path)?)?;
    Ok(true)
}

/// Write the lookup table of a database as CSV
pub fn write_table<W: Write>(db: &SignalDatabase, writer: W) -> Result<()> {
    let cores = db.available_cores();
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = LEADING_COLUMNS.to_vec();
    header.extend(cores.iter().map(String::as_str));
    header.push(DESCRIPTION_COLUMN);
    csv_writer.write_record(&header).map_err(table_error)?;

    for signal in db.signals() {
        let init_value = match &signal.init_value {
            InitValue::ZeroMemory => "ZeroMemory".to_string(),
            InitValue::Custom(text) => text.clone(),
        };
        let mut row = vec![
            signal.name.clone(),
            signal.variable_name.clone(),
            enum_to_cell(&signal.memory_region),
            signal.ipc_buffer_count.to_string(),
            enum_to_cell(&signal.access_type),
            init_value,
            yes_no(signal.notifiers),
            signal.source.clone().unwrap_or_default(),
            enum_to_cell(&signal.impl_approach),
            yes_no(signal.get_obj_ref),
            signal.sm_buffer_count.to_string(),
            signal.timeout_ms.to_string(),
            signal.periodicity_ms.to_string(),
            enum_to_cell(&signal.asil),
            enum_to_cell(&signal.checksum),
            signal.signal_type.database_name().to_string(),
        ];
        row.extend(cores.iter().map(|core| yes_no(signal.destinations.contains(core))));
        row.push(signal.description.clone());
        csv_writer.write_record(&row).map_err(table_error)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Import a CSV lookup table into a database
///
/// The SOC selection and cores of the table's config companion are applied
/// first. Metadata is left alone; see [`import_metadata`].
pub fn import_table(db: &mut SignalDatabase, path: &Path) -> Result<ImportSummary> {
    let config = companion_path(path, CONFIG_SHEET);
    if config.exists() {
        let cores = read_config(db, std::fs::File::open(&config)?)?;
        log::info!("Imported {} cores from {:?}", cores, config);
    }

    log::info!("Importing lookup table: {:?}", path);
    let file = std::fs::File::open(path)?;
    read_table(db, file)
}

/// Read CSV lookup table rows into a database
///
/// Missing cells take the defaults of a new signal, rows without a
/// `Data_Type` are ignored and unknown columns are read as `<soc>.<core>`
/// destinations. A destination core that is not configured yet is added with
/// default properties. Structure and array rows are skipped because the table
/// does not carry their layout.
pub fn read_table<R: Read>(db: &mut SignalDatabase, reader: R) -> Result<ImportSummary> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers().map_err(table_error)?.clone();

    if !headers.iter().any(|h| h == "Data_Type") {
        return Err(SignalError::TableParseError(
            "missing 'Data_Type' column".to_string(),
        ));
    }
    let configured = db.available_cores();
    let mut core_columns: Vec<&str> = Vec::new();
    for column in headers
        .iter()
        .filter(|h| !LEADING_COLUMNS.contains(h) && *h != DESCRIPTION_COLUMN && !h.is_empty())
    {
        if configured.iter().any(|core| core == column) {
            core_columns.push(column);
            continue;
        }
        match column.split_once('.') {
            Some((soc, core)) if !soc.is_empty() && !core.is_empty() => {
                log::warn!("Core '{}' is not configured; adding it with default properties", column);
                db.add_core(soc, core, CoreProperties::default());
                core_columns.push(column);
            }
            _ => log::warn!("Ignoring column '{}': not a <soc>.<core> destination", column),
        }
    }

    let mut summary = ImportSummary::default();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record.map_err(table_error)?;
        let row: HashMap<&str, &str> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h, v.trim()))
            .filter(|(_, v)| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
            .collect();

        let Some(name) = row.get("Data_Type").copied() else {
            continue;
        };
        let row_error = |msg: String| {
            SignalError::TableParseError(format!("row {} ('{}'): {}", line + 2, name, msg))
        };

        let type_name = row.get("DataType").copied().unwrap_or("INT32");
        if type_name.eq_ignore_ascii_case("STRUCT") || type_name.eq_ignore_ascii_case("ARRAY") {
            log::warn!("Skipping {} signal '{}': layout is not part of the lookup table", type_name, name);
            summary.skipped.push(name.to_string());
            continue;
        }
        let data_type = type_name
            .parse::<DataType>()
            .map_err(|e| row_error(e.to_string()))?;

        let mut signal = SignalDefinition::new(name, SignalType::Primitive(data_type))
            .with_description("Imported signal");
        if let Some(v) = row.get("Variable_Port_Name") {
            signal.variable_name = v.to_string();
        }
        if let Some(v) = row.get("InitValue") {
            if *v != "ZeroMemory" {
                signal.init_value = InitValue::Custom(v.to_string());
            }
        }
        if let Some(v) = row.get("Source") {
            signal.source = Some(v.to_string());
        }
        if let Some(v) = row.get(DESCRIPTION_COLUMN) {
            signal.description = v.to_string();
        }
        signal.notifiers = row.get("Notifiers").is_some_and(|v| is_yes(v));
        signal.get_obj_ref = row.get("GetObjRef").is_some_and(|v| is_yes(v));

        signal.memory_region = enum_cell(&row, "Memory Region", signal.memory_region).map_err(&row_error)?;
        signal.access_type = enum_cell(&row, "Type", signal.access_type).map_err(&row_error)?;
        signal.impl_approach = enum_cell(&row, "Impl_Approach", signal.impl_approach).map_err(&row_error)?;
        signal.asil = enum_cell(&row, "ASIL", signal.asil).map_err(&row_error)?;
        signal.checksum = enum_cell(&row, "Checksum", signal.checksum).map_err(&row_error)?;

        signal.ipc_buffer_count = number_cell(&row, "Buffer count_IPC", 1).map_err(&row_error)?;
        signal.sm_buffer_count = number_cell(&row, "SM_Buff_Count", 1).map_err(&row_error)?;
        signal.timeout_ms = number_cell(&row, "Timeout", 10).map_err(&row_error)?;
        signal.periodicity_ms = number_cell(&row, "Periodicity", 10).map_err(&row_error)?;

        signal.destinations = core_columns
            .iter()
            .filter(|core| row.get(*core).is_some_and(|v| is_yes(v)))
            .map(|core| core.to_string())
            .collect();

        db.add_signal(signal)?;
        summary.imported += 1;
    }

    log::info!(
        "Imported {} signals ({} skipped)",
        summary.imported,
        summary.skipped.len()
    );
    Ok(summary)
}

fn table_error(e: csv::Error) -> SignalError {
    SignalError::TableParseError(e.to_string())
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

fn is_yes(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("yes") || cell.eq_ignore_ascii_case("true")
}

/// Serialized name of a unit enum variant
fn enum_to_cell<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn enum_cell<T: DeserializeOwned>(
    row: &HashMap<&str, &str>,
    column: &str,
    default: T,
) -> std::result::Result<T, String> {
    match row.get(column) {
        None => Ok(default),
        Some(cell) => {
            let deserializer: StrDeserializer<'_, serde::de::value::Error> =
                (*cell).into_deserializer();
            T::deserialize(deserializer)
                .map_err(|_| format!("invalid {} '{}'", column, cell))
        }
    }
}

fn number_cell(row: &HashMap<&str, &str>, column: &str, default: u32) -> std::result::Result<u32, String> {
    match row.get(column) {
        None => Ok(default),
        // Spreadsheets tend to write integers as `10.0`
        Some(cell) => cell
            .parse::<u32>()
            .ok()
            .or_else(|| {
                cell.parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64)
                    .map(|v| v as u32)
            })
            .ok_or_else(|| format!("invalid {} '{}'", column, cell)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::database::{Asil, Checksum, CoreProperties, StructField};

    fn sample_db() -> SignalDatabase {
        let mut db = SignalDatabase::new();
        db.metadata.editor = "J. Doe".to_string();
        db.metadata.date = "2024-03-01".to_string();
        db.add_core(
            "SocA",
            "Core0",
            CoreProperties {
                is_master: true,
                os: "QNX".to_string(),
                ..CoreProperties::default()
            },
        );
        db.add_core("SocA", "Core1", CoreProperties::default());
        db.add_signal(
            SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt16))
                .with_source("SocA.Core0")
                .add_destination("SocA.Core1")
                .with_notifiers(true)
                .with_init_value(InitValue::Custom("100".to_string()))
                .with_description("Vehicle speed"),
        )
        .unwrap();
        db.add_signal(SignalDefinition::new(
            "TestDataV1",
            SignalType::Struct(vec![
                StructField::new("flag_a", DataType::Bool),
                StructField::new("flag_b", DataType::Bool),
            ]),
        ))
        .unwrap();
        db
    }

    #[test]
    fn test_export_layout() {
        let mut out = Vec::new();
        write_table(&sample_db(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Data_Type,Variable_Port_Name,Memory Region,Buffer count_IPC,Type,InitValue,\
             Notifiers,Source,Impl_Approach,GetObjRef,SM_Buff_Count,Timeout,Periodicity,ASIL,\
             Checksum,DataType,SocA.Core0,SocA.Core1,description"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Speed,Speed,DDR,1,Concurrent,100,Yes,SocA.Core0,SharedMemory,No,1,10,10,QM,\
             Additive,UINT16,No,Yes,Vehicle speed"
        );
        assert!(lines.next().unwrap().starts_with("TestDataV1,TestDataV1,"));
    }

    #[test]
    fn test_import_rows() {
        let csv_text = "\
Data_Type,DataType,Notifiers,ASIL,Checksum,Timeout,Ecu.Main,Remarks,description
Speed,UINT16,Yes,C,None,20.0,Yes,x,
Flags,STRUCT,No,QM,Additive,10,No,,flags
,UINT8,No,QM,Additive,10,No,,empty name
Temp,float32,,,,,,,Coolant
";
        let mut db = SignalDatabase::new();
        let summary = read_table(&mut db, csv_text.as_bytes()).unwrap();

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, vec!["Flags"]);

        let speed = db.get_signal("Speed").unwrap();
        assert!(speed.notifiers);
        assert_eq!(speed.asil, Asil::C);
        assert_eq!(speed.checksum, Checksum::None);
        assert_eq!(speed.timeout_ms, 20);
        assert_eq!(speed.destinations, vec!["Ecu.Main"]);
        assert_eq!(speed.description, "Imported signal");

        // The destination column brings its core along; `Remarks` is not a core
        assert_eq!(db.available_cores(), vec!["Ecu.Main"]);

        let temp = db.get_signal("Temp").unwrap();
        assert_eq!(temp.signal_type, SignalType::Primitive(DataType::Float32));
        assert_eq!(temp.periodicity_ms, 10);
        assert_eq!(temp.description, "Coolant");
    }

    #[test]
    fn test_import_rejects_bad_cells() {
        let mut db = SignalDatabase::new();
        let err = read_table(&mut db, "Data_Type,ASIL\nSpeed,E\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2 ('Speed')"));

        let err = read_table(&mut db, "Name,DataType\nSpeed,UINT8\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SignalError::TableParseError(_)));
    }

    #[test]
    fn test_export_import_primitives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.csv");
        let mut source = sample_db();
        source.soc_type = "SocA".to_string();
        export_table(&source, &path).unwrap();
        assert!(dir.path().join("signals_Version.csv").exists());
        assert!(dir.path().join("signals_Config.csv").exists());

        // Cores and metadata come back from the companion files
        let mut db = SignalDatabase::new();
        let summary = import_table(&mut db, &path).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(db.get_signal("Speed"), source.get_signal("Speed"));
        assert_eq!(db.cores(), source.cores());
        assert_eq!(db.soc_type, "SocA");
        assert!(db.validate().is_empty());

        assert!(import_metadata(&mut db, &path).unwrap());
        assert_eq!(db.metadata.editor, "J. Doe");
        assert_eq!(db.metadata.date, "2024-03-01");
    }

    #[test]
    fn test_export_requires_editor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.csv");
        let mut db = sample_db();
        db.metadata.editor = String::new();

        assert!(matches!(
            export_table(&db, &path),
            Err(SignalError::InvalidMetadata(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_config_rows() {
        let mut out = Vec::new();
        write_config(&sample_db(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "SOC Name,TypeOfBin,SOC,CORE,Master/Slave,Is Qnx Core ?,Is Autosar Compliant ?,\
             Is Sim Core ?,OS,SOC Family,Description"
        );
        assert_eq!(lines.next().unwrap(), "Windows,SMP,SocA,Core0,Master,No,No,No,QNX,Unknown,");
        assert_eq!(lines.next().unwrap(), ",,SocA,Core1,Slave,No,No,No,Unknown,Unknown,");

        let mut db = SignalDatabase::new();
        let csv_text = "SOC Name,TypeOfBin,SOC,CORE,Master/Slave,Is Qnx Core ?,OS\n\
                        J7,AMP,J7,Mcu1,master,yes,\n";
        assert_eq!(read_config(&mut db, csv_text.as_bytes()).unwrap(), 1);
        assert_eq!(db.soc_type, "J7");
        assert_eq!(db.build_type, "AMP");
        assert!(db.build_list.contains(&"AMP".to_string()));
        let core = db.core("J7", "Mcu1").unwrap();
        assert!(core.is_master && core.is_qnx && !core.is_sim);
        assert_eq!(core.os, "Unknown");
    }

    #[test]
    fn test_version_row() {
        let mut db = SignalDatabase::new();
        let csv_text = "Version,Date,Last Modified By,Description\n2.1,03/01/2024,A. Smith,\n";
        read_version(&mut db, csv_text.as_bytes()).unwrap();
        assert_eq!(db.metadata.version, "2.1");
        assert_eq!(db.metadata.editor, "A. Smith");
        assert!(db.metadata.date.is_empty());
        assert_eq!(db.metadata.description, "Signal Configuration");
    }
}
