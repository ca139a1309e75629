//! C code generation
//!
//! Emits the accessor header and the matching source file for a validated
//! signal database.

mod header;
mod source;

pub use header::generate_header;
pub use source::generate_source;

/// Line-oriented text buffer for generated C code
#[derive(Debug, Default)]
struct CodeWriter {
    out: String,
}

impl CodeWriter {
    fn new() -> Self {
        Self::default()
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Include guard macro for a file stem (`Test3` -> `TEST3_H`)
pub fn header_guard(stem: &str) -> String {
    let mut guard: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if guard.starts_with(|c: char| c.is_ascii_digit()) {
        guard.insert(0, '_');
    }
    guard.push_str("_H");
    guard
}
