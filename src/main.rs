extern crate env_logger;
#[macro_use]
extern crate log;

use std::io::Write;

use anyhow::{Context, Result};

mod cli;
mod format;
mod lines;
mod split;

use cli::{Cli, SplitRequest, ValidationError};
use format::SequenceFormat;
use split::{ChunkPlan, WrittenChunk};

/// Sets up logging to stderr. Only warnings and errors are shown unless `verbose` is set;
/// `RUST_LOG` takes precedence over both.
fn init_logger(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

/// Runs the whole split for a validated request: the input is sniffed, its records are
/// counted, and only then are the chunks written.
///
/// # Errors
///
/// Fails if the input is not FASTA, or on any I/O error while reading the input or writing a
/// chunk.
fn run(request: &SplitRequest) -> Result<Vec<WrittenChunk>> {
    let input = &request.input;

    let detected = format::detect_path(input)
        .with_context(|| format!("Unable to read {}", input.display()))?;
    info!("Detected {detected} format for {}", input.display());

    if detected != SequenceFormat::Fasta {
        return Err(ValidationError::NotFasta {
            path: input.clone(),
            detected,
        }
        .into());
    }

    let records = split::count_records_path(input)
        .with_context(|| format!("Unable to count records in {}", input.display()))?;
    let file_size = std::fs::metadata(input)
        .with_context(|| format!("Unable to read metadata of {}", input.display()))?
        .len();

    let plan = ChunkPlan::new(request.split_by, records, file_size);
    info!(
        "Found {records} records in {file_size} bytes, writing up to {} records into each of {} chunks",
        plan.records_per_chunk,
        plan.expected_chunks(records)
    );

    let written = split::split_path(input, request.outdir.as_deref(), &plan)
        .with_context(|| format!("Unable to write chunks of {}", input.display()))?;

    for chunk in written.iter() {
        info!("Wrote {} records to {}", chunk.records, chunk.path.display());
    }

    Ok(written)
}

fn try_main() -> Result<()> {
    let cli = Cli::parse_args()?;
    init_logger(cli.verbose);

    info!("fastasplit v{}", cli::VERSION);

    let request = SplitRequest::try_from(&cli)?;
    let written = run(&request)?;

    info!("Completed successfully, {} chunks written.", written.len());
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        // written directly, so a quiet or missing logger cannot swallow it
        eprintln!("ERROR: {}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| eprintln!("  because: {}", cause));

        std::process::exit(1);
    }
}
