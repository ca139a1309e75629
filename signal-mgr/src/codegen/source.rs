use super::CodeWriter;
use crate::config::GeneratorConfig;
use crate::signals::{InitValue, SignalDatabase};

/// Generate the C source with signal storage and accessor bodies
///
/// `Set_` only copies when the new value differs from the stored one. With
/// notification hooks enabled it calls the signal's `Notify_` hook after a
/// change when the signal has notifiers.
pub fn generate_source(db: &SignalDatabase, config: &GeneratorConfig) -> String {
    let mut w = CodeWriter::new();

    w.line(format!("#include \"{}\"", config.header_file_name()));
    w.line("#include <string.h>");
    w.blank();

    w.line("/* Signal storage */");
    for signal in db.signals() {
        let init = match signal.init_value {
            InitValue::ZeroMemory => "{0}".to_string(),
            InitValue::Custom(_) => signal.init_macro_name(),
        };
        w.line(format!("{} {} = {};", signal.c_type_name(), signal.variable_name, init));
    }
    w.blank();

    w.line("/* Signal accessor function definitions */");
    for signal in db.signals() {
        let c_type = signal.c_type_name();
        let var = &signal.variable_name;

        w.line(format!("void Get_{}({}* value)", signal.name, c_type));
        w.line("{");
        w.line(format!("    memcpy(value, &{var}, sizeof({var}));"));
        w.line("}");
        w.blank();

        w.line(format!("void Set_{}(const {}* value)", signal.name, c_type));
        w.line("{");
        w.line(format!("    if (memcmp(&{var}, value, sizeof({var})) != 0) {{"));
        w.line(format!("        memcpy(&{var}, value, sizeof({var}));"));
        if config.emit_notify_hooks && signal.notifiers {
            w.line(format!("        Notify_{}();", signal.name));
        }
        w.line("    }");
        w.line("}");
        w.blank();
    }

    w.finish()
}
