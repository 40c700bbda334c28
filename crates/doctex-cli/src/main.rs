//! Command-line front door for `doctex-convert`: a single `convert`
//! subcommand for local/manual use and smoke testing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "doctex", about = "Convert a .docx document to LaTeX", version)]
struct Cli {
    /// Overrides the `DOCTEX_LOG` environment variable for this run.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a `.docx` container into a LaTeX document and its assets.
    Convert {
        /// Path to the input `.docx` container.
        input: PathBuf,

        /// Path to the LaTeX template text.
        #[arg(long, value_name = "PATH")]
        template: PathBuf,

        /// Directory the `.tex` file and asset files are written into.
        #[arg(long, value_name = "PATH")]
        out_dir: PathBuf,
    },
}

fn init_logging(cli_override: Option<&str>) {
    let filter = cli_override
        .map(ToOwned::to_owned)
        .or_else(|| std::env::var("DOCTEX_LOG").ok())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Convert { input, template, out_dir } => convert_command(&input, &template, &out_dir),
    }
}

fn convert_command(input: &PathBuf, template_path: &PathBuf, out_dir: &PathBuf) -> Result<()> {
    let docx_bytes =
        fs::read(input).with_context(|| format!("failed to read input file: {}", input.display()))?;
    let template_text = fs::read_to_string(template_path)
        .with_context(|| format!("failed to read template: {}", template_path.display()))?;

    let converted = doctex_convert::convert_document(&docx_bytes, &template_text)
        .with_context(|| format!("failed to convert {}", input.display()))?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "output".to_string());
    let tex_path = out_dir.join(format!("{stem}.tex"));
    fs::write(&tex_path, &converted.latex)
        .with_context(|| format!("failed to write {}", tex_path.display()))?;

    for asset in &converted.assets {
        let asset_path = out_dir.join(&asset.filename);
        fs::write(&asset_path, &asset.bytes)
            .with_context(|| format!("failed to write asset {}", asset_path.display()))?;
    }

    println!("wrote {} ({} asset(s))", tex_path.display(), converted.assets.len());
    Ok(())
}
