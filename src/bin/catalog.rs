//! Schema Catalog CLI
//!
//! Regenerates the catalog manifest from the schema sources, detects drift
//! between sources and the committed manifest, and inspects the catalog.
//!
//! Usage:
//!   schema-catalog generate
//!   schema-catalog check --format json
//!   schema-catalog verify TrustScore eee676387e5fc49d

use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use originvault_schemas::check::{check_drift, drift_exit_code, verify_exit_code, EXIT_OK};
use originvault_schemas::embedded::load_embedded;
use originvault_schemas::{collect_sources, CatalogConfig, DriftReport, Manifest, SchemaRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-catalog")]
#[command(about = "Generate, check and inspect the OriginVault schema catalog")]
#[command(version)]
struct Cli {
    /// Config file (defaults: catalog.toml, .catalog.toml, config/catalog.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the manifest from the schema sources
    Generate {
        /// Schema source directory
        #[arg(short, long)]
        schemas_dir: Option<PathBuf>,
        /// Manifest output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the manifest instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Detect drift between the schema sources and the committed manifest
    Check {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Fail on any changes (not just breaking)
        #[arg(long)]
        strict: bool,
        /// Show per-property changes
        #[arg(long)]
        verbose: bool,
    },

    /// List registered schemas with their hashes
    List {
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        #[command(flatten)]
        source: Source,
    },

    /// Print a schema document
    Show {
        name: String,
        #[command(flatten)]
        source: Source,
    },

    /// Print the content hash of a schema
    Hash {
        name: String,
        #[command(flatten)]
        source: Source,
    },

    /// Print the metadata record of a schema
    Metadata {
        name: String,
        #[command(flatten)]
        source: Source,
    },

    /// Check a hash against the catalog (exit 0 if valid, 1 otherwise)
    Verify {
        name: String,
        hash: String,
        #[command(flatten)]
        source: Source,
    },

    /// Write the effective configuration to a file
    InitConfig {
        #[arg(default_value = "catalog.toml")]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct Source {
    /// Read schemas and manifest from the configured directories instead of the embedded copy
    #[arg(long)]
    from_disk: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = CatalogConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Generate { schemas_dir, output, dry_run } => {
            let schemas_dir = schemas_dir.unwrap_or_else(|| config.schemas_dir());
            let output = output.unwrap_or_else(|| config.manifest_path());

            let sources = collect_sources(&schemas_dir)
                .with_context(|| format!("collecting schemas from {}", schemas_dir.display()))?;
            let manifest = Manifest::generate(&sources, &config.generate_options());
            let content = manifest.to_json(config.generation.output_format)?;

            if dry_run {
                print!("{}", content);
                return Ok(0);
            }

            let unchanged = fs::read_to_string(&output).map(|old| old == content).unwrap_or(false);
            if unchanged {
                eprintln!("✅ {} is up to date ({} schemas)", output.display(), manifest.len());
            } else {
                manifest.write(&output, config.generation.output_format)?;
                eprintln!("📦 Wrote {} ({} schemas)", output.display(), manifest.len());
            }
            Ok(0)
        }

        Commands::Check { format, strict, verbose } => {
            let strict = strict || config.drift.strict;
            let manifest_path = config.manifest_path();
            let schemas_dir = config.schemas_dir();

            // documents whose hashes no longer match are dropped from the baseline
            let embedded = load_embedded().ok();
            let report = check_drift(&config, embedded.as_ref()).with_context(|| {
                format!(
                    "checking {} against {}",
                    schemas_dir.display(),
                    manifest_path.display()
                )
            })?;

            match format {
                Format::Json => {
                    let output = serde_json::json!({
                        "checked_at": chrono::Utc::now().to_rfc3339(),
                        "manifest": manifest_path,
                        "report": report,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                Format::Text => print_text_report(&report, verbose),
            }

            let code = drift_exit_code(&report, strict);
            if report.has_breaking_changes {
                eprintln!("\n❌ BREAKING DRIFT - regenerate the manifest and review");
            } else if report.has_any_changes && strict {
                eprintln!("\n⚠️  Drift detected (strict mode) - run `schema-catalog generate`");
            } else if report.has_any_changes {
                eprintln!("\n⚠️  Non-breaking drift detected - run `schema-catalog generate`");
            } else {
                eprintln!("\n✅ No drift detected - manifest is in sync");
            }
            Ok(code)
        }

        Commands::List { format, source } => {
            let registry = open_registry(&config, &source)?;
            match format {
                Format::Json => {
                    println!("{}", serde_json::to_string_pretty(registry.metadata_index())?);
                }
                Format::Text => {
                    let width = registry.names().map(str::len).max().unwrap_or(0);
                    for meta in registry.metadata_index().values() {
                        println!("{:width$}  {}  {}", meta.name, meta.hash, meta.id, width = width);
                    }
                }
            }
            Ok(0)
        }

        Commands::Show { name, source } => {
            let registry = open_registry(&config, &source)?;
            if !known(&registry, &name) {
                return Ok(1);
            }
            println!("{}", serde_json::to_string_pretty(registry.schema(&name)?)?);
            Ok(0)
        }

        Commands::Hash { name, source } => {
            let registry = open_registry(&config, &source)?;
            if !known(&registry, &name) {
                return Ok(1);
            }
            println!("{}", registry.hash(&name)?);
            Ok(0)
        }

        Commands::Metadata { name, source } => {
            let registry = open_registry(&config, &source)?;
            if !known(&registry, &name) {
                return Ok(1);
            }
            println!("{}", serde_json::to_string_pretty(registry.metadata(&name)?)?);
            Ok(0)
        }

        Commands::Verify { name, hash, source } => {
            let registry = open_registry(&config, &source)?;
            let code = verify_exit_code(&registry, &name, &hash);
            if code == EXIT_OK {
                println!("✅ {} matches {}", hash, name);
            } else {
                println!("❌ {} does not match {}", hash, name);
            }
            Ok(code)
        }

        Commands::InitConfig { output } => {
            config.save(&output)?;
            eprintln!("✅ Configuration written to {}", output.display());
            Ok(0)
        }
    }
}

fn open_registry(
    config: &CatalogConfig,
    source: &Source,
) -> anyhow::Result<Cow<'static, SchemaRegistry>> {
    if source.from_disk {
        let registry = SchemaRegistry::load_dir(config.schemas_dir(), config.manifest_path())
            .context("loading catalog from disk")?;
        Ok(Cow::Owned(registry))
    } else {
        Ok(Cow::Borrowed(originvault_schemas::catalog()))
    }
}

fn known(registry: &SchemaRegistry, name: &str) -> bool {
    if registry.contains(name) {
        return true;
    }
    eprintln!("❌ Schema not found: {}", name);
    let suggestions = registry.suggest(name, 3);
    if !suggestions.is_empty() {
        eprintln!("   Did you mean: {}?", suggestions.join(", "));
    }
    false
}

/// Print human-readable report
fn print_text_report(report: &DriftReport, verbose: bool) {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                     SCHEMA DRIFT REPORT                           ");
    println!("═══════════════════════════════════════════════════════════════════\n");

    if !report.added.is_empty() {
        println!("📗 NEW SCHEMAS ({}):", report.added.len());
        for name in &report.added {
            println!("   + {}", name);
        }
        println!();
    }

    if !report.removed.is_empty() {
        println!("📕 REMOVED SCHEMAS ({}) [BREAKING]:", report.removed.len());
        for name in &report.removed {
            println!("   - {}", name);
        }
        println!();
    }

    if !report.changed.is_empty() {
        let breaking_count = report.breaking_count();
        let non_breaking_count = report.changed.len() - breaking_count;

        if breaking_count > 0 {
            println!("🔴 BREAKING CHANGES ({}):", breaking_count);
            for change in report.changed.iter().filter(|c| c.is_breaking) {
                println!(
                    "   ⚠️  {} ({} -> {})",
                    change.name, change.committed_hash, change.current_hash
                );
                if verbose {
                    for c in &change.changes {
                        println!("      - {}", c);
                    }
                }
            }
            println!();
        }

        if non_breaking_count > 0 {
            println!("🟡 NON-BREAKING CHANGES ({}):", non_breaking_count);
            for change in report.changed.iter().filter(|c| !c.is_breaking) {
                println!(
                    "   📝 {} ({} -> {})",
                    change.name, change.committed_hash, change.current_hash
                );
                if verbose {
                    for c in &change.changes {
                        println!("      - {}", c);
                    }
                }
            }
            println!();
        }
    }

    println!("📊 SUMMARY:");
    println!("   Unchanged: {}", report.unchanged);
    println!("   Added:     {}", report.added.len());
    println!(
        "   Removed:   {} {}",
        report.removed.len(),
        if !report.removed.is_empty() { "[BREAKING]" } else { "" }
    );
    println!("   Changed:   {}", report.changed.len());

    let breaking_count = report.breaking_count();
    if breaking_count > 0 {
        println!("   Breaking:  {} [BREAKING]", breaking_count);
    }

    println!("\n   Total schemas compared: {}", report.total());
}
