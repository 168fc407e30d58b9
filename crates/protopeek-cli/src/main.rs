//! protopeek - Decode Protocol Buffer payloads against a simple schema
//!
//! This tool extracts message definitions from `.proto` text and decodes
//! binary wire-format payloads into JSON using one of those messages.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use protopeek_core::schema::{walk, StatsWriter};
use protopeek_core::{decode, extract_file, DecodedMessage, Error, Message, RenderConfig, Schema};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Decode Protocol Buffer payloads against a simple .proto schema
#[derive(Parser, Debug)]
#[command(name = "protopeek")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the messages defined in a schema file
    Messages {
        /// Path to the schema text
        schema: PathBuf,
    },

    /// Print a schema file in normalized form
    Schema {
        /// Path to the schema text
        schema: PathBuf,

        /// Spaces per indentation level
        #[arg(long, default_value = "2")]
        indent: usize,

        /// Print fields in field-number order
        #[arg(long)]
        sort_fields: bool,
    },

    /// Decode payload files as one message of a schema
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Path to the schema text
    #[arg(short, long, env = "PROTOPEEK_SCHEMA")]
    schema: PathBuf,

    /// Name of the message to decode payloads as
    #[arg(short, long)]
    message: String,

    #[command(flatten)]
    input: InputMode,

    /// Output directory for decoded .json files (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing files without prompting
    #[arg(long)]
    force: bool,

    /// Emit single-line JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single payload file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of payload files to process
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Tracks decoded payloads for deduplication
#[derive(Default)]
struct PayloadRegistry {
    /// Maps content hash -> first path with that content
    seen: HashMap<blake3::Hash, PathBuf>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    decoded: usize,
    duplicates_skipped: usize,
    failed: usize,
    written: usize,
}

impl PayloadRegistry {
    fn new() -> Self {
        Self::default()
    }

    fn content_hash(content: &[u8]) -> blake3::Hash {
        blake3::hash(content)
    }

    /// Short form of a hash for log lines (first 8 hex chars)
    fn short_hash(hash: &blake3::Hash) -> String {
        hash.to_hex()[..8].to_string()
    }

    /// Register a payload; returns the earlier path if the content was seen
    fn register(&mut self, path: &Path, content_hash: blake3::Hash) -> Option<&Path> {
        if self.seen.contains_key(&content_hash) {
            self.stats.duplicates_skipped += 1;
            return self.seen.get(&content_hash).map(PathBuf::as_path);
        }

        self.seen.insert(content_hash, path.to_path_buf());
        None
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} decoded, {} duplicates skipped, {} failed, {} written",
            self.stats.decoded,
            self.stats.duplicates_skipped,
            self.stats.failed,
            self.stats.written
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Messages { schema } => list_messages(&schema),
        Command::Schema {
            schema,
            indent,
            sort_fields,
        } => print_schema(&schema, indent, sort_fields),
        Command::Decode(args) => run_decode(&args),
    }
}

/// Read and extract a schema file
fn load_schema(path: &Path) -> Result<Schema> {
    let schema = extract_file(path)
        .with_context(|| format!("Failed to load schema: {}", path.display()))?;

    if schema.is_empty() {
        warn!("No messages found in {}", path.display());
    }
    Ok(schema)
}

fn list_messages(path: &Path) -> Result<()> {
    let schema = load_schema(path)?;

    let mut stats = StatsWriter::default();
    walk(&schema, &mut stats)?;

    if !schema.package.is_empty() {
        println!("package {}", schema.package);
    }
    for message in &schema.messages {
        println!("{} ({} fields)", message.name, message.fields.len());
    }

    info!(
        "{} messages, {} fields ({} repeated, {} optional, {} nested)",
        stats.message_count,
        stats.field_count,
        stats.repeated_count,
        stats.optional_count,
        stats.named_type_count
    );
    Ok(())
}

fn print_schema(path: &Path, indent: usize, sort_fields: bool) -> Result<()> {
    let schema = load_schema(path)?;
    let config = RenderConfig::new()
        .indent_str(" ".repeat(indent))
        .sort_fields(sort_fields);

    print!("{}", schema.render_with(&config));
    Ok(())
}

/// Find the requested message or list what is available
fn select_message<'a>(schema: &'a Schema, name: &str) -> Result<&'a Message> {
    match schema.message(name) {
        Some(message) => Ok(message),
        None => {
            let available: Vec<_> = schema.message_names().collect();
            bail!(
                "{} (available: {})",
                Error::message_not_found(name),
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            )
        }
    }
}

fn run_decode(args: &DecodeArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    let message = select_message(&schema, &args.message)?;
    debug!(
        "Decoding as {} ({} fields)",
        message.name,
        message.fields.len()
    );

    if let Some(ref file) = args.input.file {
        process_single_file(args, message, file)
    } else if let Some(ref directory) = args.input.directory {
        process_directory(args, message, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Decode a single payload file
fn process_single_file(args: &DecodeArgs, message: &Message, file: &Path) -> Result<()> {
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let data =
        fs::read(file).with_context(|| format!("Failed to read payload: {}", file.display()))?;
    let decoded = decode(&data, message)
        .with_context(|| format!("Failed to decode {} as {}", file.display(), message.name))?;

    let json = to_json(&decoded, args.compact)?;
    match args.output {
        Some(ref output_dir) => {
            let name = file.file_name().map(Path::new).unwrap_or(file);
            let output_path = output_dir.join(json_file_name(name));
            write_output(&output_path, &json, args.force)?;
            println!("Wrote {}", output_path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Decode every payload in a directory tree
fn process_directory(args: &DecodeArgs, message: &Message, directory: &Path) -> Result<()> {
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());
    let mut registry = PayloadRegistry::new();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || is_hidden(path) {
            continue;
        }

        let relative = path.strip_prefix(directory).unwrap_or(path);
        if let Err(e) = process_payload(args, message, path, relative, &mut registry) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
            registry.stats.failed += 1;
        }
    }

    registry.print_summary();
    Ok(())
}

fn process_payload(
    args: &DecodeArgs,
    message: &Message,
    path: &Path,
    relative: &Path,
    registry: &mut PayloadRegistry,
) -> Result<()> {
    trace!("Reading {}", path.display());
    let data =
        fs::read(path).with_context(|| format!("Failed to read payload: {}", path.display()))?;

    let content_hash = PayloadRegistry::content_hash(&data);
    if let Some(first) = registry.register(path, content_hash) {
        debug!(
            "Skipping duplicate: {} (same content as {}, hash: {})",
            path.display(),
            first.display(),
            PayloadRegistry::short_hash(&content_hash)
        );
        return Ok(());
    }

    let decoded = decode(&data, message).context("decode failed")?;
    registry.stats.decoded += 1;

    match args.output {
        Some(ref output_dir) => {
            let output_path = output_dir.join(json_file_name(relative));
            write_output(&output_path, &to_json(&decoded, args.compact)?, args.force)?;
            println!("Wrote {}", output_path.display());
            registry.stats.written += 1;
        }
        None => {
            let line = serde_json::json!({
                "path": relative.display().to_string(),
                "fields": decoded,
            });
            println!("{}", line);
        }
    }

    Ok(())
}

fn to_json(decoded: &DecodedMessage, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(decoded)?
    } else {
        serde_json::to_string_pretty(decoded)?
    };
    Ok(json)
}

/// Append `.json` to the payload's file name, keeping its directory.
///
/// The original extension stays so `a.bin` and `a.dat` map to distinct files.
fn json_file_name(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Write a decoded payload to disk
fn write_output(output_path: &Path, content: &str, force: bool) -> Result<()> {
    // Create parent directories
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Check if file exists
    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}
