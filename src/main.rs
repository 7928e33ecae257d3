use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod config;
mod defaults;
mod error;
mod filters;
mod format;
mod mcp;
mod pandoc;
mod request;
mod tools;

use config::Config;

#[derive(Parser)]
#[command(name = "mcp-pandoc")]
#[command(
    version,
    about = "Document conversion through pandoc, as MCP tools and CLI utilities"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to the pandoc executable
    #[arg(long, global = true, env = "PANDOC_BIN")]
    pandoc: Option<PathBuf>,
    /// Per-user filter directory (default: ~/.pandoc/filters)
    #[arg(long, global = true, env = "PANDOC_USER_FILTER_DIR")]
    user_filter_dir: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Clone)]
struct ConversionArgs {
    /// Output file; its extension selects the output format
    #[arg(long)]
    output_file: String,
    /// Reference DOCX for styling (docx output only)
    #[arg(long)]
    reference_doc: Option<String>,
    /// Filter to apply, may be repeated
    #[arg(long = "filter")]
    filters: Vec<String>,
    /// Defaults YAML file
    #[arg(long)]
    defaults_file: Option<String>,
    /// Output JSON structuredContent
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct CreateFileArgs {
    /// Text content to convert
    #[arg(long)]
    content: String,
    /// Format of the content
    #[arg(long)]
    input_format: String,
    #[command(flatten)]
    conversion: ConversionArgs,
}

#[derive(Args, Clone)]
struct ConvertFileArgs {
    /// Existing file to convert
    #[arg(long)]
    input_file: String,
    /// Input format override (default: inferred from extension)
    #[arg(long)]
    input_format: Option<String>,
    #[command(flatten)]
    conversion: ConversionArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP stdio server
    Serve {
        /// Serve MCP over stdio (NDJSON)
        #[arg(long)]
        stdio: bool,
    },
    /// Create a document from text content
    CreateFile(CreateFileArgs),
    /// Convert an existing document
    ConvertFile(ConvertFileArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::resolve(cli.pandoc, cli.user_filter_dir);

    match cli.command {
        Commands::Serve { stdio } => {
            if stdio {
                run_stdio_server(&config)
            } else {
                anyhow::bail!("only --stdio transport is supported")
            }
        }
        Commands::CreateFile(args) => run_create_file(args, &config),
        Commands::ConvertFile(args) => run_convert_file(args, &config),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run_create_file(args: CreateFileArgs, config: &Config) -> Result<()> {
    let mut map = build_conversion_args(&args.conversion);
    map.insert("content".to_string(), json!(args.content));
    map.insert("input_format".to_string(), json!(args.input_format));
    let result = tools::create_file::call(&Value::Object(map), config);
    print_tool_result(result, args.conversion.json)
}

fn run_convert_file(args: ConvertFileArgs, config: &Config) -> Result<()> {
    let mut map = build_conversion_args(&args.conversion);
    map.insert("input_file".to_string(), json!(args.input_file));
    if let Some(input_format) = args.input_format {
        map.insert("input_format".to_string(), json!(input_format));
    }
    let result = tools::convert_file::call(&Value::Object(map), config);
    print_tool_result(result, args.conversion.json)
}

fn build_conversion_args(conversion: &ConversionArgs) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("output_file".to_string(), json!(conversion.output_file));
    if let Some(reference_doc) = &conversion.reference_doc {
        map.insert("reference_doc".to_string(), json!(reference_doc));
    }
    if !conversion.filters.is_empty() {
        map.insert("filters".to_string(), json!(conversion.filters));
    }
    if let Some(defaults_file) = &conversion.defaults_file {
        map.insert("defaults_file".to_string(), json!(defaults_file));
    }
    map
}

fn print_tool_result(result: Value, json_output: bool) -> Result<()> {
    let is_error = result
        .get("isError")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);

    if is_error {
        let message = result
            .get("content")
            .and_then(|value| value.as_array())
            .and_then(|arr| arr.first())
            .and_then(|value| value.get("text"))
            .and_then(|value| value.as_str())
            .unwrap_or("tool error");
        eprintln!("{message}");
        if let Some(diagnostics) = result
            .get("structuredContent")
            .and_then(|value| value.get("error"))
            .and_then(|value| value.get("diagnostics"))
            .and_then(|value| value.as_str())
        {
            eprint!("{diagnostics}");
        }
        process::exit(1);
    }

    if json_output {
        let structured = result
            .get("structuredContent")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let output = serde_json::to_string_pretty(&structured)?;
        println!("{output}");
        return Ok(());
    }

    let text = result
        .get("content")
        .and_then(|value| value.as_array())
        .and_then(|arr| arr.first())
        .and_then(|value| value.get("text"))
        .and_then(|value| value.as_str())
        .unwrap_or("");
    println!("{text}");
    Ok(())
}

fn run_stdio_server(config: &Config) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = stdin.lock().lines();
    let mut writer = io::BufWriter::new(stdout.lock());

    for line in reader {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unparsable message");
                continue;
            }
        };

        let Some(response) = dispatch(&request, config) else {
            continue;
        };
        let serialized =
            serde_json::to_string(&response).context("failed to serialize response")?;
        writeln!(writer, "{serialized}").context("failed to write response")?;
        writer.flush().context("failed to flush response")?;
    }

    Ok(())
}

/// Answers one JSON-RPC message. Notifications (no `id`) get no reply.
fn dispatch(request: &Value, config: &Config) -> Option<Value> {
    let method = request.get("method").and_then(|value| value.as_str());
    let Some(id) = request.get("id").cloned() else {
        tracing::debug!(method, "notification");
        return None;
    };

    let result = match method {
        Some("initialize") => json!({
            "protocolVersion": mcp::contracts::PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
        Some("tools/list") => json!({ "tools": mcp::tool_definitions() }),
        Some("tools/call") => handle_tool_call(request, config),
        Some("ping") => json!({}),
        method => {
            let method = method.unwrap_or("(missing)");
            tracing::debug!(method, "unknown method");
            return Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": mcp::contracts::METHOD_NOT_FOUND,
                    "message": format!("method not found: {method}")
                }
            }));
        }
    };

    Some(json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    }))
}

fn handle_tool_call(request: &Value, config: &Config) -> Value {
    let params = request.get("params");
    let Some(params) = params.and_then(|value| value.as_object()) else {
        return tools::error_result(mcp::errors::INVALID_INPUT, "params must be an object", None);
    };

    let name = params.get("name").and_then(|value| value.as_str());
    let Some(name) = name else {
        return tools::error_result(
            mcp::errors::INVALID_INPUT,
            "params.name must be a string",
            None,
        );
    };

    let args = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    tracing::debug!(tool = name, "tool call");
    match name {
        mcp::contracts::TOOL_CREATE_FILE => tools::create_file::call(&args, config),
        mcp::contracts::TOOL_CONVERT_FILE => tools::convert_file::call(&args, config),
        _ => tools::error_result(
            mcp::errors::INVALID_INPUT,
            format!("tool not implemented: {name}"),
            Some(name),
        ),
    }
}
