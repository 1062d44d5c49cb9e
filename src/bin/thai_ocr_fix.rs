//! Thai OCR post-processing from the command line.
//!
//! ```bash
//! thai-ocr-fix fix output/*.md --markdown --out-dir corrected
//! thai-ocr-fix phrases page_001.txt --document-id 42
//! thai-ocr-fix aggregate phrases.json --review-only
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use thai_ocr_fix::phrases::extract_from_text_blocks;
use thai_ocr_fix::{PhraseInstanceRecord, ServiceConfig, aggregate_phrases_with};

#[derive(Parser)]
#[command(name = "thai-ocr-fix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Correct Thai OCR output and build phrase review queues", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "THAI_OCR_FIX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post-process OCR text or markdown files
    Fix {
        files: Vec<PathBuf>,

        /// Directory for corrected files
        #[arg(long, default_value = "corrected")]
        out_dir: PathBuf,

        /// Treat input as markdown (enables spell check)
        #[arg(long)]
        markdown: bool,
    },
    /// Print the Thai phrases of a text file as JSON lines
    Phrases {
        file: PathBuf,

        #[arg(long, default_value_t = 0)]
        document_id: i64,
    },
    /// Group stored phrase instances (a JSON list) into a review queue
    Aggregate {
        input: PathBuf,

        /// Only groups that need correction
        #[arg(long)]
        review_only: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("thai_ocr_fix=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig, Box<dyn std::error::Error + Send + Sync>> {
    match path {
        Some(path) => Ok(ServiceConfig::load_from_file(path)?),
        None => Ok(ServiceConfig::default()),
    }
}

/// `input` re-rooted under `out_dir`, keeping its directories so inputs
/// with the same file name do not collide. Root, `.` and `..` are dropped.
fn output_path(out_dir: &Path, input: &Path) -> PathBuf {
    input
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .fold(out_dir.to_path_buf(), |path, part| path.join(part))
}

/// Pair every input with its output, rejecting two inputs that land on the same file.
fn plan_outputs(
    files: &[PathBuf],
    out_dir: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>, Box<dyn std::error::Error + Send + Sync>> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(files.len());
    for input in files {
        let output = output_path(out_dir, input);
        if output == out_dir {
            return Err(format!("no file name in input {}", input.display()).into());
        }
        if !seen.insert(output.clone()) {
            return Err(format!("{} would overwrite another input's output {}", input.display(), output.display()).into());
        }
        jobs.push((input.clone(), output));
    }
    Ok(jobs)
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fix {
            files,
            out_dir,
            markdown,
        } => {
            let jobs = plan_outputs(&files, &out_dir)?;
            let pipeline = config.build_pipeline()?;
            let outcomes: Vec<_> = jobs
                .par_iter()
                .map(|(input, output)| (input, pipeline.postprocess_file(input, output, markdown)))
                .collect();

            let mut modified = 0;
            let mut corrections = 0;
            let mut failed = 0;
            for (input, outcome) in outcomes {
                match outcome {
                    Ok((was_modified, made, negatives, _bytes)) => {
                        modified += usize::from(was_modified);
                        corrections += made + negatives;
                    }
                    Err(e) => {
                        warn!(file = %input.display(), error = %e, "file skipped");
                        failed += 1;
                    }
                }
            }
            info!(files = files.len(), modified, corrections, failed, "post-processing finished");
        }
        Commands::Phrases { file, document_id } => {
            let content = fs::read_to_string(&file)?;
            let blocks: Vec<&str> = content.split("\n\n").collect();
            for phrase in extract_from_text_blocks(document_id, &blocks) {
                println!("{}", serde_json::to_string(&phrase)?);
            }
        }
        Commands::Aggregate { input, review_only } => {
            let content = fs::read_to_string(&input)?;
            let instances: Vec<PhraseInstanceRecord> = serde_json::from_str(&content)?;
            let dictionary = config.build_dictionary()?;
            let mut aggregation = aggregate_phrases_with(&instances, &dictionary, &config.review.thresholds());
            if review_only {
                aggregation.groups.retain(|g| g.needs_correction);
            }
            println!("{}", serde_json::to_string_pretty(&aggregation)?);
        }
    }

    Ok(())
}
