use std::path::{Path, PathBuf};

use clap::Parser;

use rowmap_engine::codegen::{self, GenOptions};
use rowmap_engine::MappingError;

#[derive(Parser)]
#[command(name = "rowmap-gen", about = "Generate row mapping structs from table metadata")]
struct Cli {
    /// Path to the schema file (.toml or .json).
    #[arg(long, env = "ROWMAP_SCHEMA")]
    schema: PathBuf,

    /// Suffix appended to every struct name (e.g. "TO").
    #[arg(long, default_value = "")]
    suffix: String,

    /// Write one file per table into this directory instead of stdout.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Only generate these tables (repeatable).
    #[arg(long = "table")]
    tables: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        tracing::error!(error = %e, "generation failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), MappingError> {
    tracing::info!(schema = %cli.schema.display(), "loading schema");
    let schema = codegen::load_schema(&cli.schema)?;

    let options = GenOptions {
        suffix: cli.suffix.clone(),
    };
    let files = codegen::generate_tables(&schema, &options, &cli.tables)?;
    if files.is_empty() {
        tracing::warn!(schema = %cli.schema.display(), "schema contains no tables");
        return Ok(());
    }

    match &cli.out_dir {
        Some(dir) => write_files(dir, &files),
        None => {
            for file in &files {
                println!("{}", file.source);
            }
            Ok(())
        }
    }
}

fn write_files(dir: &Path, files: &[codegen::GeneratedFile]) -> Result<(), MappingError> {
    std::fs::create_dir_all(dir)?;
    for file in files {
        let path = dir.join(&file.file_name);
        std::fs::write(&path, &file.source)
            .map_err(|e| MappingError::Config(format!("{}: {e}", path.display())))?;
        tracing::info!(
            table = %file.table,
            struct_name = %file.struct_name,
            path = %path.display(),
            "wrote result struct"
        );
    }
    Ok(())
}
