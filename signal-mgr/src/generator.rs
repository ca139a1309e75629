//! Main generator API
//!
//! This module provides the primary interface for the library. The Generator
//! struct is the entry point for loading signal definitions, validating them,
//! generating C accessors and building a runtime store.

use crate::codegen;
use crate::config::GeneratorConfig;
use crate::signals::{lookup_table, project, ImportSummary, SignalDatabase, ValidationIssue};
use crate::store::SignalStore;
use crate::types::{Result, SignalError};
use std::path::{Path, PathBuf};

/// The main generator struct - entry point for all generation operations
pub struct Generator {
    /// Internal signal database (merged from project files and lookup tables)
    signal_db: SignalDatabase,
}

/// Output of a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub header_name: String,
    pub header: String,
    /// Source file name and content, if source generation is enabled
    pub source: Option<(String, String)>,
}

impl GeneratedFiles {
    /// Write the generated files into a directory, returning their paths
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        let header_path = dir.join(&self.header_name);
        std::fs::write(&header_path, &self.header)?;
        written.push(header_path);

        if let Some((name, content)) = &self.source {
            let source_path = dir.join(name);
            std::fs::write(&source_path, content)?;
            written.push(source_path);
        }

        log::info!("Wrote {} generated file(s) to {:?}", written.len(), dir);
        Ok(written)
    }
}

impl Generator {
    /// Create a new generator instance
    pub fn new() -> Self {
        Self {
            signal_db: SignalDatabase::new(),
        }
    }

    /// Create a generator around an existing database
    pub fn from_database(signal_db: SignalDatabase) -> Self {
        Self { signal_db }
    }

    /// Load a JSON project file and merge its definitions into the signal database
    ///
    /// # Example
    /// ```no_run
    /// use signal_mgr::Generator;
    /// use std::path::Path;
    ///
    /// let mut generator = Generator::new();
    /// generator.add_project(Path::new("Test3.json")).unwrap();
    /// ```
    pub fn add_project(&mut self, path: &Path) -> Result<()> {
        let db = project::load_project(path)?;

        // The first project also provides metadata and SOC selection
        if self.signal_db.signals().next().is_none() && self.signal_db.cores().is_empty() {
            self.signal_db = db;
        } else {
            self.signal_db.merge(db)?;
        }

        log::info!("Project loaded successfully: {:?}", path);
        Ok(())
    }

    /// Import a CSV lookup table into the signal database
    pub fn add_lookup_table(&mut self, path: &Path) -> Result<ImportSummary> {
        lookup_table::import_table(&mut self.signal_db, path)
    }

    pub fn database(&self) -> &SignalDatabase {
        &self.signal_db
    }

    pub fn database_mut(&mut self) -> &mut SignalDatabase {
        &mut self.signal_db
    }

    /// Get statistics about the loaded signal database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }

    /// Check the loaded signals; an empty list means generation can proceed
    pub fn validate(&self) -> Vec<ValidationIssue> {
        self.signal_db.validate()
    }

    /// Generate the C header (and source) for the loaded signals
    ///
    /// Refuses to generate when validation finds issues.
    pub fn generate(&self, config: &GeneratorConfig) -> Result<GeneratedFiles> {
        let issues = self.validate();
        if !issues.is_empty() {
            for issue in &issues {
                log::error!("{}", issue);
            }
            return Err(SignalError::Validation(issues));
        }

        log::info!(
            "Generating {} for {} signals",
            config.header_file_name(),
            self.signal_db.stats().num_signals
        );

        let header = codegen::generate_header(&self.signal_db, config)?;
        let source = config.emit_source.then(|| {
            (
                config.source_file_name(),
                codegen::generate_source(&self.signal_db, config),
            )
        });

        Ok(GeneratedFiles {
            header_name: config.header_file_name(),
            header,
            source,
        })
    }

    /// Build a runtime store holding every loaded signal at its init value
    pub fn build_store(&self) -> Result<SignalStore> {
        SignalStore::from_database(&self.signal_db)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

// Re-export DatabaseStats for public API
pub use crate::signals::DatabaseStats;
