//! End-to-end tests: project file -> validation -> generated C -> runtime store

use signal_mgr::signals::{lookup_table, project, IssueKind};
use signal_mgr::{
    field_as, DataType, FieldValue, Generator, GeneratorConfig, InitValue, Result, SignalDefinition,
    SignalError, SignalGroup, SignalStore, SignalType, SignalValue, StructField,
};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

fn data_file(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn load(name: &str) -> Generator {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut generator = Generator::new();
    generator.add_project(&data_file(name)).unwrap();
    generator
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TestDataV1 {
    flag_a: bool,
    flag_b: bool,
}

impl SignalGroup for TestDataV1 {
    const SIGNAL: &'static str = "TestDataV1";

    fn signal_type() -> SignalType {
        signal_mgr::accessor::uniform_struct(&["flag_a", "flag_b"], DataType::Bool)
    }

    fn to_value(&self) -> SignalValue {
        SignalValue::Struct(vec![
            FieldValue::new("flag_a", SignalValue::Boolean(self.flag_a)),
            FieldValue::new("flag_b", SignalValue::Boolean(self.flag_b)),
        ])
    }

    fn from_value(value: &SignalValue) -> Result<Self> {
        Ok(Self {
            flag_a: field_as(Self::SIGNAL, value, "flag_a")?,
            flag_b: field_as(Self::SIGNAL, value, "flag_b")?,
        })
    }
}

#[test]
fn test_generated_header_matches_test3_layout() {
    let generator = load("Test3.json");
    assert!(generator.validate().is_empty());

    let config = GeneratorConfig::new().with_file_stem("Test3");
    let files = generator.generate(&config).unwrap();
    let expected = std::fs::read_to_string(data_file("Test3.h")).unwrap();
    assert_eq!(files.header, expected);

    let dir = tempfile::tempdir().unwrap();
    files.write_to(dir.path()).unwrap();
    let source = std::fs::read_to_string(dir.path().join("Test3.c")).unwrap();
    assert!(source.contains("TestDataV1_t TestDataV1 = {0};"));
    // The fixture declares no hooks, so the source must not call any
    assert!(!source.contains("Notify_"));
}

#[test]
fn test_notify_hooks_are_declared_and_called_together() {
    let generator = load("Test3.json");
    let config = GeneratorConfig::new().with_file_stem("Test3").with_notify_hooks(true);
    let files = generator.generate(&config).unwrap();

    assert!(files.header.contains("void Notify_TestDataV1(void);\n"));
    assert!(!files.header.contains("Notify_TestDataV2"));
    let (_, source) = files.source.as_ref().unwrap();
    assert!(source.contains("        Notify_TestDataV1();"));
    assert!(!source.contains("Notify_TestDataV2"));
}

#[test]
fn test_store_and_header_agree_on_init_values() {
    let mut generator = Generator::new();
    let db = generator.database_mut();
    db.add_signal(
        SignalDefinition::new("Mode", SignalType::Primitive(DataType::UInt8))
            .with_init_value(InitValue::Custom("010".to_string())),
    )
    .unwrap();
    db.add_signal(
        SignalDefinition::new(
            "Flags",
            SignalType::Struct(vec![
                StructField::new("flag_a", DataType::Bool),
                StructField::new("flag_b", DataType::Bool),
            ]),
        )
        .with_init_value(InitValue::Custom("{TRUE,\n 0}".to_string())),
    )
    .unwrap();

    let files = generator.generate(&GeneratorConfig::new()).unwrap();
    assert!(files.header.contains("#define MODE_INIT_VALUE 8u\n"));
    assert!(files.header.contains("#define FLAGS_INIT_VALUE {1, 0}\n"));

    let store = generator.build_store().unwrap();
    assert_eq!(store.get("Mode").unwrap(), SignalValue::Unsigned(8));
    assert_eq!(store.get_field("Flags", "flag_a").unwrap(), SignalValue::Boolean(true));
    assert_eq!(store.get_field("Flags", "flag_b").unwrap(), SignalValue::Boolean(false));
}

#[test]
fn test_store_rejects_duplicate_field_declaration() {
    let mut store = SignalStore::new();
    let result = store.declare(SignalDefinition::new(
        "TestDataV1",
        SignalType::Struct(vec![
            StructField::new("flag_a", DataType::Bool),
            StructField::new("flag_b", DataType::Bool),
            StructField::new("flag_b", DataType::Bool),
        ]),
    ));
    assert!(matches!(result, Err(SignalError::Validation(ref issues)) if issues.len() == 1));
    assert!(store.get("TestDataV1").is_err());
}

#[test]
fn test_duplicate_field_project_is_rejected() {
    let generator = load("Test3_duplicate_fields.json");

    let issues = generator.validate();
    let signals: Vec<_> = issues.iter().filter_map(|i| i.signal.as_deref()).collect();
    assert_eq!(signals, vec!["TestDataV1", "TestDataV2"]);
    assert!(issues.iter().all(|i| i.kind
        == IssueKind::DuplicateField {
            field: "flag_b".to_string()
        }));

    let result = generator.generate(&GeneratorConfig::new().with_file_stem("Test3"));
    assert!(matches!(result, Err(SignalError::Validation(ref issues)) if issues.len() == 2));
}

#[test]
fn test_store_identity_round_trip() {
    let generator = load("Test3.json");
    let mut store = generator.build_store().unwrap();

    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    store
        .subscribe("TestDataV1", move |_| counter.set(counter.get() + 1))
        .unwrap();

    for name in ["TestDataV1", "TestDataV2"] {
        let value = store.get(name).unwrap();
        assert!(!store.set(name, value).unwrap());
        assert_eq!(store.revision(name).unwrap(), 0);
    }
    assert_eq!(notified.get(), 0);

    let written = TestDataV1 {
        flag_a: true,
        flag_b: false,
    };
    assert!(store.set_from(&written).unwrap());
    assert_eq!(store.get_as::<TestDataV1>().unwrap(), written);
    assert_eq!(notified.get(), 1);

    let read_back = store.get_as::<TestDataV1>().unwrap();
    assert!(!store.set_from(&read_back).unwrap());
    assert_eq!(notified.get(), 1);

    // TestDataV2 is declared without notifiers
    assert!(matches!(
        store.subscribe("TestDataV2", |_| {}),
        Err(SignalError::NotificationsDisabled(_))
    ));
}

#[test]
fn test_out_of_domain_write_is_rejected() {
    let generator = load("Test3.json");
    let mut store = generator.build_store().unwrap();

    let wrong_field = SignalValue::Struct(vec![
        FieldValue::new("flag_a", SignalValue::Boolean(true)),
        FieldValue::new("flag_c", SignalValue::Boolean(true)),
    ]);
    assert!(store.set("TestDataV1", wrong_field).is_err());
    assert!(store
        .set_field("TestDataV1", "flag_a", SignalValue::Unsigned(2))
        .is_err());
    assert_eq!(store.get_as::<TestDataV1>().unwrap(), TestDataV1::default());
    assert!(!store.has_changes());
}

#[test]
fn test_project_save_and_table_export() {
    let generator = load("Test3.json");
    let dir = tempfile::tempdir().unwrap();

    let saved = dir.path().join("saved.json");
    project::save_project(generator.database(), &saved).unwrap();
    let reloaded = project::load_project(&saved).unwrap();
    assert_eq!(&reloaded, generator.database());

    let table = dir.path().join("signals.csv");
    lookup_table::export_table(generator.database(), &table).unwrap();
    let text = std::fs::read_to_string(&table).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().ends_with("DataType,Windows.Core0,description"));
    assert!(lines.next().unwrap().starts_with("TestDataV1,TestDataV1,DDR,1,Concurrent,ZeroMemory,Yes,"));
    assert!(dir.path().join("signals_Version.csv").exists());
    assert!(dir.path().join("signals_Config.csv").exists());
}
