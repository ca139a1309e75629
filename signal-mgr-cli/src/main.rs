//! Signal Manager CLI Application
//!
//! This is the command-line interface for the signal manager.
//! It uses the signal-mgr library and adds:
//! - Batch generation of C accessors for several projects in parallel
//! - Validation and statistics reports
//! - Lookup table (CSV) export and import

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use signal_mgr::signals::{lookup_table, project, SignalDatabase};
use signal_mgr::{Generator, GeneratorConfig};
use std::path::{Path, PathBuf};

mod config;
mod report;

/// Signal Manager - Validate signal databases and generate C accessors
#[derive(Parser, Debug)]
#[command(name = "signal-mgr-cli")]
#[command(about = "Generate typed C signal accessors from signal-manager projects", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (signal-mgr.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate C header and source for one or more projects
    Generate {
        /// Project files (JSON); taken from the config file when omitted
        projects: Vec<PathBuf>,

        /// Lookup tables (CSV) to merge into every project
        #[arg(long, value_name = "FILE")]
        table: Vec<PathBuf>,

        /// Output directory (default: next to each project)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Base name of the generated files (default: project file name)
        #[arg(long)]
        stem: Option<String>,

        /// Put a doc banner above the include guard
        #[arg(long)]
        banner: bool,

        /// Emit a SignalId_t enum
        #[arg(long)]
        signal_ids: bool,

        /// Declare Notify_<Name>() hooks and call them after changes
        #[arg(long)]
        notify_hooks: bool,

        /// Only generate the header
        #[arg(long)]
        header_only: bool,
    },

    /// Validate projects and list every issue found
    Validate {
        /// Project files (JSON); taken from the config file when omitted
        projects: Vec<PathBuf>,
    },

    /// Show statistics of a project
    Stats {
        project: PathBuf,
    },

    /// Export the lookup table of a project as CSV (with _Version and _Config companions)
    ExportTable {
        project: PathBuf,
        output: PathBuf,
    },

    /// Import a CSV lookup table and save it as a project
    ImportTable {
        table: PathBuf,
        output: PathBuf,

        /// Existing project to import into (provides cores and metadata)
        #[arg(long, value_name = "FILE")]
        base: Option<PathBuf>,

        /// Editor name recorded in the saved project
        #[arg(long)]
        editor: Option<String>,
    },
}

/// What to generate for one project
struct GenerateJob {
    project: PathBuf,
    tables: Vec<PathBuf>,
    output_dir: PathBuf,
    config: GeneratorConfig,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Signal Manager CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using signal-mgr library v{}", signal_mgr::VERSION);

    match args.command {
        Some(Command::Generate {
            projects,
            table,
            output,
            stem,
            banner,
            signal_ids,
            notify_hooks,
            header_only,
        }) => {
            let app_config = args
                .config
                .as_deref()
                .map(config::load_config)
                .transpose()?;

            let (projects, tables, output, mut generator_config) = match app_config {
                Some(cfg) => (
                    if projects.is_empty() { cfg.input.projects } else { projects },
                    if table.is_empty() { cfg.input.lookup_tables } else { table },
                    output.or(cfg.output.dir),
                    cfg.generator,
                ),
                None => (projects, table, output, GeneratorConfig::new()),
            };
            if projects.is_empty() {
                bail!("No project files given (pass them as arguments or via --config)");
            }

            if banner {
                generator_config.emit_banner = true;
            }
            if signal_ids {
                generator_config.emit_signal_ids = true;
            }
            if notify_hooks {
                generator_config.emit_notify_hooks = true;
            }
            if header_only {
                generator_config.emit_source = false;
            }

            let jobs = plan_jobs(&projects, &tables, output.as_deref(), stem, &generator_config);
            generate_mode(jobs)
        }
        Some(Command::Validate { projects }) => {
            let projects = if projects.is_empty() {
                match &args.config {
                    Some(path) => config::load_config(path)?.input.projects,
                    None => bail!("No project files given (pass them as arguments or via --config)"),
                }
            } else {
                projects
            };
            validate_mode(&projects)
        }
        Some(Command::Stats { project }) => {
            let db = project::load_project(&project)
                .with_context(|| format!("Failed to load project {:?}", project))?;
            report::print_stats(&project, &db.stats());
            Ok(())
        }
        Some(Command::ExportTable { project, output }) => {
            let db = project::load_project(&project)
                .with_context(|| format!("Failed to load project {:?}", project))?;
            lookup_table::export_table(&db, &output)
                .with_context(|| format!("Failed to write lookup table {:?}", output))?;
            println!("✓ Exported {} signals to {:?}", db.stats().num_signals, output);
            Ok(())
        }
        Some(Command::ImportTable {
            table,
            output,
            base,
            editor,
        }) => import_mode(&table, &output, base.as_deref(), editor),
        None => {
            // No arguments - show help
            println!("Signal Manager - No command specified");
            println!("\nQuick Start:");
            println!("  signal-mgr-cli validate Test3.json");
            println!("  signal-mgr-cli generate Test3.json --output generated/");
            println!("\nFor batch generation:");
            println!("  signal-mgr-cli --config signal-mgr.toml generate");
            println!("\nUse --help for more options");
            Ok(())
        }
    }
}

/// Build one generation job per project
///
/// With several projects the file stem always follows the project file name,
/// so the outputs do not overwrite each other.
fn plan_jobs(
    projects: &[PathBuf],
    tables: &[PathBuf],
    output: Option<&Path>,
    stem: Option<String>,
    base_config: &GeneratorConfig,
) -> Vec<GenerateJob> {
    let explicit_stem = if projects.len() == 1 { stem } else { None };

    projects
        .iter()
        .map(|project| {
            let mut config = base_config.clone();
            config.file_stem = match &explicit_stem {
                Some(stem) => stem.clone(),
                None => project
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| base_config.file_stem.clone()),
            };
            let output_dir = match output {
                Some(dir) => dir.to_path_buf(),
                None => project
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
            };
            GenerateJob {
                project: project.clone(),
                tables: tables.to_vec(),
                output_dir,
                config,
            }
        })
        .collect()
}

/// Generate all jobs in parallel, then report in input order
fn generate_mode(jobs: Vec<GenerateJob>) -> Result<()> {
    let results: Vec<Result<Vec<PathBuf>>> = jobs.par_iter().map(run_job).collect();

    let mut failed = 0;
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(files) => report::print_generated(&job.project, &files),
            Err(e) => {
                failed += 1;
                println!("✗ {:?}", job.project);
                eprintln!("Error: {:#}", e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} project(s) failed", failed, jobs.len());
    }
    Ok(())
}

fn run_job(job: &GenerateJob) -> Result<Vec<PathBuf>> {
    let mut generator = Generator::new();
    generator
        .add_project(&job.project)
        .with_context(|| format!("Failed to load project {:?}", job.project))?;
    for table in &job.tables {
        generator
            .add_lookup_table(table)
            .with_context(|| format!("Failed to import lookup table {:?}", table))?;
    }

    let files = match generator.generate(&job.config) {
        Ok(files) => files,
        Err(signal_mgr::SignalError::Validation(issues)) => {
            report::print_validation(&job.project, &issues);
            bail!("{} validation issue(s)", issues.len());
        }
        Err(e) => return Err(e.into()),
    };

    files
        .write_to(&job.output_dir)
        .with_context(|| format!("Failed to write generated files to {:?}", job.output_dir))
}

fn validate_mode(projects: &[PathBuf]) -> Result<()> {
    let results: Vec<Result<SignalDatabase>> = projects
        .par_iter()
        .map(|path| {
            project::load_project(path).with_context(|| format!("Failed to load project {:?}", path))
        })
        .collect();

    let mut clean = true;
    for (path, result) in projects.iter().zip(results) {
        match result {
            Ok(db) => clean &= report::print_validation(path, &db.validate()),
            Err(e) => {
                clean = false;
                println!("✗ {:?}", path);
                eprintln!("Error: {:#}", e);
            }
        }
    }

    if !clean {
        bail!("Validation failed");
    }
    Ok(())
}

fn import_mode(table: &Path, output: &Path, base: Option<&Path>, editor: Option<String>) -> Result<()> {
    let mut db = match base {
        Some(path) => project::load_project(path)
            .with_context(|| format!("Failed to load base project {:?}", path))?,
        None => SignalDatabase::new(),
    };

    let summary = lookup_table::import_table(&mut db, table)
        .with_context(|| format!("Failed to import lookup table {:?}", table))?;
    for name in &summary.skipped {
        log::warn!("Skipped aggregate signal '{}'", name);
    }
    lookup_table::import_metadata(&mut db, table)
        .with_context(|| format!("Failed to import metadata of {:?}", table))?;

    if let Some(editor) = editor {
        db.metadata.editor = editor;
    }
    db.metadata.ensure_defaults(chrono_today());

    project::save_project(&db, output)
        .with_context(|| format!("Failed to save project {:?}", output))?;
    println!(
        "✓ Imported {} signals into {:?} ({} skipped)",
        summary.imported,
        output,
        summary.skipped.len()
    );
    Ok(())
}

fn chrono_today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_single_project_uses_stem() {
        let jobs = plan_jobs(
            &[PathBuf::from("cfg/Body.json")],
            &[],
            None,
            Some("Test3".to_string()),
            &GeneratorConfig::new(),
        );
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].config.file_stem, "Test3");
        assert_eq!(jobs[0].output_dir, PathBuf::from("cfg"));
    }

    #[test]
    fn test_plan_many_projects_use_file_names() {
        let jobs = plan_jobs(
            &[PathBuf::from("a/Body.json"), PathBuf::from("b/Chassis.json")],
            &[PathBuf::from("extra.csv")],
            Some(Path::new("out")),
            Some("Ignored".to_string()),
            &GeneratorConfig::new().with_signal_ids(true),
        );
        let stems: Vec<_> = jobs.iter().map(|j| j.config.file_stem.as_str()).collect();
        assert_eq!(stems, vec!["Body", "Chassis"]);
        assert!(jobs.iter().all(|j| j.output_dir == Path::new("out")));
        assert!(jobs.iter().all(|j| j.config.emit_signal_ids));
        assert_eq!(jobs[1].tables, vec![PathBuf::from("extra.csv")]);
    }

    #[test]
    fn test_args_parse_generate() {
        let args = Args::parse_from([
            "signal-mgr-cli",
            "-vv",
            "generate",
            "Test3.json",
            "--stem",
            "Test3",
            "--header-only",
            "--notify-hooks",
        ]);
        assert_eq!(args.verbose, 2);
        match args.command {
            Some(Command::Generate {
                projects,
                stem,
                header_only,
                notify_hooks,
                ..
            }) => {
                assert_eq!(projects, vec![PathBuf::from("Test3.json")]);
                assert_eq!(stem.as_deref(), Some("Test3"));
                assert!(header_only);
                assert!(notify_hooks);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_import_and_generate_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("signals.csv");
        std::fs::write(
            &table,
            "Data_Type,DataType,Notifiers,InitValue,description\n\
             Speed,UINT16,Yes,100,Vehicle speed\n\
             Gear,INT8,No,ZeroMemory,Selected gear\n",
        )
        .unwrap();

        let project_path = dir.path().join("Vehicle.json");
        import_mode(&table, &project_path, None, Some("Tester".to_string())).unwrap();
        assert!(import_mode(&table, &dir.path().join("x.json"), None, None).is_err());

        let jobs = plan_jobs(&[project_path], &[], None, None, &GeneratorConfig::new());
        generate_mode(jobs).unwrap();

        let header = std::fs::read_to_string(dir.path().join("Vehicle.h")).unwrap();
        assert!(header.contains("#define SPEED_INIT_VALUE 100u\n"));
        assert!(header.contains("void Set_Gear(const sint8* value);\n"));
        assert!(dir.path().join("Vehicle.c").exists());
    }

    #[test]
    fn test_export_then_import_keeps_cores() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = SignalDatabase::new();
        db.metadata.editor = "Tester".to_string();
        db.add_core("SocA", "Core0", Default::default());
        db.add_core("SocA", "Core1", Default::default());
        db.add_signal(
            signal_mgr::SignalDefinition::new(
                "Speed",
                signal_mgr::SignalType::Primitive(signal_mgr::DataType::UInt16),
            )
            .with_source("SocA.Core0")
            .add_destination("SocA.Core1"),
        )
        .unwrap();

        let table = dir.path().join("signals.csv");
        lookup_table::export_table(&db, &table).unwrap();

        let project_path = dir.path().join("Imported.json");
        import_mode(&table, &project_path, None, None).unwrap();

        let imported = project::load_project(&project_path).unwrap();
        assert_eq!(imported.available_cores(), vec!["SocA.Core0", "SocA.Core1"]);
        assert_eq!(imported.metadata.editor, "Tester");
        let speed = imported.get_signal("Speed").unwrap();
        assert_eq!(speed.destinations, vec!["SocA.Core1"]);
        assert!(imported.validate().is_empty());
    }
}
