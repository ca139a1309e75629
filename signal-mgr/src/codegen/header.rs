use super::{header_guard, CodeWriter};
use crate::config::GeneratorConfig;
use crate::signals::{InitValue, SignalDatabase, SignalType};
use crate::types::{DataType, Result};

/// Generate the accessor header for a database
///
/// The database is expected to have passed validation. Custom init values are
/// written in canonical C form, so the macro holds exactly the value the
/// runtime store starts with.
pub fn generate_header(db: &SignalDatabase, config: &GeneratorConfig) -> Result<String> {
    let guard = header_guard(&config.file_stem);
    let mut w = CodeWriter::new();

    if config.emit_banner {
        write_banner(&mut w, db, config);
    }

    w.line(format!("#ifndef {}", guard));
    w.line(format!("#define {}", guard));
    w.blank();
    w.line("#include <stdint.h>");
    w.line("#include <stdbool.h>");
    w.blank();

    w.line("/* Automotive data type definitions */");
    for data_type in DataType::ALL {
        w.line(format!("typedef {} {};", data_type.c_base_type(), data_type.c_name()));
    }
    w.blank();

    w.line("/* Structure type definitions */");
    for signal in db.signals() {
        match &signal.signal_type {
            SignalType::Primitive(_) => continue,
            SignalType::Struct(fields) => {
                w.line("typedef struct {");
                for field in fields {
                    w.line(format!("    {} {};", field.data_type.c_name(), field.name));
                }
                w.line(format!("}} {};", signal.c_type_name()));
            }
            SignalType::Array { element, size } => {
                w.line(format!("typedef {} {}[{}];", element.c_name(), signal.c_type_name(), size));
            }
        }
        w.blank();
    }
    if !db.signals().any(|s| !matches!(s.signal_type, SignalType::Primitive(_))) {
        w.blank();
    }

    if config.emit_signal_ids {
        w.line("/* Signal identifiers */");
        w.line("typedef enum {");
        for (id, signal) in db.signals().enumerate() {
            w.line(format!("    SIGNAL_ID_{} = {},", signal.name, id));
        }
        w.line("    SIGNAL_COUNT");
        w.line("} SignalId_t;");
        w.blank();
    }

    w.line("/* Signal type definitions */");
    for signal in db.signals() {
        w.line(format!("extern {} {};", signal.c_type_name(), signal.variable_name));
    }
    w.blank();

    w.line("/* Default initialization values */");
    for signal in db.signals() {
        if let InitValue::Custom(_) = &signal.init_value {
            let value = signal.initial_value()?;
            w.line(format!("#define {} {}", signal.init_macro_name(), value.to_c_initializer()));
        }
    }
    w.blank();

    let notifying: Vec<_> = db.signals().filter(|s| s.notifiers).collect();
    if config.emit_notify_hooks && !notifying.is_empty() {
        w.line("/* Change notification hooks (implemented by the application) */");
        for signal in notifying {
            w.line(format!("void Notify_{}(void);", signal.name));
        }
        w.blank();
    }

    w.line("/* Signal accessor function declarations */");
    for signal in db.signals() {
        let c_type = signal.c_type_name();
        w.line(format!("void Get_{}({}* value);", signal.name, c_type));
        w.line(format!("void Set_{}(const {}* value);", signal.name, c_type));
    }
    w.blank();

    w.line(format!("#endif /* {} */", guard));
    Ok(w.finish())
}

fn write_banner(w: &mut CodeWriter, db: &SignalDatabase, config: &GeneratorConfig) {
    let date = if db.metadata.date.is_empty() {
        chrono::Local::now().format("%Y-%m-%d").to_string()
    } else {
        db.metadata.date.clone()
    };

    w.line("/**");
    w.line(format!(" * @file {}", config.header_file_name()));
    w.line(format!(" * @brief {}", db.metadata.description));
    w.line(format!(" * @version {}", db.metadata.version));
    w.line(format!(" * @date {}", date));
    if !db.metadata.editor.trim().is_empty() {
        w.line(format!(" * @author {}", db.metadata.editor.trim()));
    }
    w.line(" *");
    w.line(" * Auto-generated signal accessors. Do not edit.");
    w.line(" */");
    w.blank();
}
