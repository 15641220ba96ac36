use std::fs;
use std::path::PathBuf;

use clap::Parser;
use dbdreader::{
    decompressed_output_name,
    io_utils::{dbd_cli_error, extension_error, io_cli_error},
    CompressedFileCache,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Decompress LZ4 compressed glider files next to themselves: data files
/// (.dcd, .ecd, ...) become .dbd, .ebd, ..., logs (.mcg, .ncg) become
/// .mlg, .nlg and cache files (.ccc) become .cac.
#[derive(Parser)]
struct Args {
    /// Compressed input files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Rewrite siblings that already exist
    #[arg(long)]
    force: bool,
    /// Print a JSON report on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    input: PathBuf,
    output: PathBuf,
    bytes: u64,
    reused: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let cache = CompressedFileCache::default();
    let mut reports = Vec::with_capacity(args.inputs.len());

    for input in args.inputs {
        let Some(output) = decompressed_output_name(&input) else {
            return Err(extension_error(&input).into());
        };
        let reused = !args.force && output.is_file();
        if !reused {
            cache
                .materialize(&input)
                .map_err(|e| dbd_cli_error("decompressing", e))?;
        }
        let bytes = fs::metadata(&output)
            .map_err(|e| io_cli_error("reading output file", &output, e))?
            .len();
        if !args.json {
            let note = if reused { " (existing)" } else { "" };
            eprintln!("{} -> {}{note}", input.display(), output.display());
        }
        reports.push(Report {
            input,
            output,
            bytes,
            reused,
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}
