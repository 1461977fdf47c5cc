//! Command-line interface for veridoc
//!
//! Loads a resolved declaration tree (JSON, produced by the language
//! resolver) and renders the static documentation set into the output
//! directory.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use veridoc_core::{DeclTree, DocConfig, DocGenerator, FileRefMode};

#[derive(Parser)]
#[command(
    name = "veridoc",
    version,
    about = "Generate HTML documentation from a resolved declaration tree"
)]
struct Cli {
    /// Path to the resolved declaration tree (JSON)
    tree: PathBuf,

    /// Output directory for generated documentation
    #[arg(short, long, default_value = "./docs")]
    output: PathBuf,

    /// How to display "from file" annotations: name, none, absolute, or relative=PREFIX
    #[arg(long, default_value = "name")]
    file_ref: String,

    /// Display last-modified timestamps for source files
    #[arg(long)]
    modtime: bool,

    /// Program display name used in page titles and headers
    #[arg(long)]
    program_name: Option<String>,

    /// Announce each file as it is written
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.tree)
        .with_context(|| format!("failed to read '{}'", cli.tree.display()))?;
    let tree = DeclTree::from_json(&text)
        .with_context(|| format!("failed to parse declaration tree '{}'", cli.tree.display()))?;

    let config = DocConfig {
        output_dir: cli.output.clone(),
        file_ref: FileRefMode::parse(&cli.file_ref),
        show_modify_time: cli.modtime,
        program_name: cli.program_name.clone(),
    };

    // Backstop: an engine panic surfaces as a generation error here rather
    // than taking the process down.
    let generator = DocGenerator::new(&tree, &config);
    let summary = match panic::catch_unwind(AssertUnwindSafe(|| generator.run())) {
        Ok(result) => result.map_err(|e| anyhow!(e).context("documentation generation failed"))?,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            return Err(anyhow!(
                "unexpected error while generating documentation: {message}"
            ));
        }
    };

    for warning in &summary.warnings {
        eprintln!("Warning: {warning}");
    }
    if cli.verbose {
        for file in &summary.files {
            println!("Writing {}", file.display());
        }
    }
    println!(
        "Documented {} index entries across {} files in {}",
        summary.index_entries,
        summary.files.len(),
        cli.output.display()
    );
    Ok(())
}
