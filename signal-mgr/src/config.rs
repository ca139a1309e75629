//! Generator configuration types
//!
//! This module defines the options that shape the generated C files. The
//! defaults reproduce the plain accessor header: no banner, no signal id enum
//! and no notification hooks.

use serde::{Deserialize, Serialize};

/// Configuration for code generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Base name of the generated files (`<stem>.h`, `<stem>.c`)
    #[serde(default = "default_file_stem")]
    pub file_stem: String,

    /// Whether to put a doc banner (file, version, date) above the include guard
    #[serde(default)]
    pub emit_banner: bool,

    /// Whether to emit a `SignalId_t` enum with one entry per signal
    #[serde(default)]
    pub emit_signal_ids: bool,

    /// Whether to declare `Notify_<Name>()` hooks and call them from `Set_`
    /// for signals with notifiers enabled
    #[serde(default)]
    pub emit_notify_hooks: bool,

    /// Whether to generate the C source with storage and accessor bodies
    #[serde(default = "default_true")]
    pub emit_source: bool,
}

fn default_file_stem() -> String {
    "signals".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            file_stem: default_file_stem(),
            emit_banner: false,
            emit_signal_ids: false,
            emit_notify_hooks: false,
            emit_source: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the output file stem
    pub fn with_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    /// Builder method: enable or disable the doc banner
    pub fn with_banner(mut self, enabled: bool) -> Self {
        self.emit_banner = enabled;
        self
    }

    /// Builder method: enable or disable the signal id enum
    pub fn with_signal_ids(mut self, enabled: bool) -> Self {
        self.emit_signal_ids = enabled;
        self
    }

    /// Builder method: enable or disable the notification hooks
    pub fn with_notify_hooks(mut self, enabled: bool) -> Self {
        self.emit_notify_hooks = enabled;
        self
    }

    /// Builder method: enable or disable source generation
    pub fn with_source(mut self, enabled: bool) -> Self {
        self.emit_source = enabled;
        self
    }

    pub fn header_file_name(&self) -> String {
        format!("{}.h", self.file_stem)
    }

    pub fn source_file_name(&self) -> String {
        format!("{}.c", self.file_stem)
    }
}
