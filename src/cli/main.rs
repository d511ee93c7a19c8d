use anyhow::Result;
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use exif_meta::config::Config;
use exif_meta::fields::{FieldDefinition, FieldResolver};
use exif_meta::pipeline;
use exif_meta::projector::{ExifProjector, ExtractionTarget, SanitizedTagTree};

#[derive(Parser, Debug)]
#[command(
    name = "exif-meta",
    version,
    about = "Extract sanitized EXIF/IPTC metadata and GPS coordinates from JPEG and TIFF images"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Dump every section and tag instead of the configured fields
    #[arg(long)]
    dump: bool,

    /// Output configured fields as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let config = Config::load(cli.config.as_deref())?;
    let projector = ExifProjector::with_default_reader(config.sanitizer())?;

    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }
    log::info!("Found {} image(s) to process", images.len());

    // Handle --dump
    if cli.dump {
        let mut dumps: BTreeMap<String, SanitizedTagTree> = BTreeMap::new();
        for image_path in &images {
            match projector.dump(image_path) {
                Ok(tree) => {
                    dumps.insert(image_path.display().to_string(), tree);
                }
                Err(e) => log::error!("Failed to read {}: {e}", image_path.display()),
            }
        }
        print_json(&dumps, config.output.pretty_json)?;
        return Ok(());
    }

    let resolver = FieldResolver::new();
    let (fields_csv, labels_csv) = config.resolver_input();
    let fields = match resolver.resolve(fields_csv, labels_csv) {
        Ok(fields) => fields,
        Err(e) => anyhow::bail!("{e}. Set \"meta_fields\" in your config.json or use --dump."),
    };

    let mut results: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let total = images.len();
    let mut failed = 0;

    for (i, image_path) in images.iter().enumerate() {
        log::debug!("[{}/{}] Processing: {}", i + 1, total, image_path.display());

        let mut store: BTreeMap<String, String> = BTreeMap::new();
        let target = ExtractionTarget::file(image_path.as_path());
        if let Err(e) = projector.extract_and_merge(&target, &fields, &mut store) {
            log::error!("Failed to read {}: {e}", image_path.display());
            failed += 1;
            continue;
        }

        if !cli.json {
            print_fields(image_path, &fields, &store);
        }
        results.insert(image_path.display().to_string(), store);
    }

    if cli.json {
        print_json(&results, config.output.pretty_json)?;
    }

    log::info!(
        "Done: {} succeeded, {failed} failed out of {total} images",
        total - failed
    );

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print the configured fields of one file, in configuration order, under their labels.
fn print_fields(path: &Path, fields: &[FieldDefinition], values: &BTreeMap<String, String>) {
    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    let mut printed = false;
    for field in fields {
        if let Some(value) = values.get(&field.key) {
            print_row(&field.label, value);
            printed = true;
        }
    }

    if !printed {
        println!("  {DIM}(no configured metadata found){RESET}");
    }
    println!();
}

/// Print a single row in the metadata display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
