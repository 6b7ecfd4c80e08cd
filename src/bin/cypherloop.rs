//! Cypherloop CLI: ask questions of a graph through a language model.
//!
//! Usage:
//!   cypherloop ask <question> --completion-cmd <cmd> --store-cmd <cmd> --schema <file>
//!   cypherloop canonicalize [query]
//!   cypherloop extract-ids [file] [--field name]

use clap::{Parser, Subcommand};
use cypherloop::query::DEFAULT_ID_FIELD;
use cypherloop::{
    canonicalize, extract_ids, CancellationToken, CommandCompletion, CommandStore,
    PipelineConfig, QueryPipeline, QueryResult,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "cypherloop",
    version,
    about = "Self-correcting natural-language questions over a graph database"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log pipeline steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question by querying the graph
    Ask {
        /// The question to answer
        question: String,
        /// Completion command; reads the prompt on stdin, prints the completion
        #[arg(long)]
        completion_cmd: String,
        /// Query command; reads Cypher on stdin, prints JSON rows
        #[arg(long)]
        store_cmd: String,
        /// File holding the graph schema description
        #[arg(long)]
        schema: PathBuf,
        /// Pipeline config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the answer and identifiers as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rewrite deprecated id(...) calls to elementId(...)
    Canonicalize {
        /// Query text; read from stdin when omitted
        query: Option<String>,
    },
    /// List identifier values found in a JSON query result
    ExtractIds {
        /// JSON result file; read from stdin when omitted
        file: Option<PathBuf>,
        /// Identifier field name
        #[arg(long, default_value = DEFAULT_ID_FIELD)]
        field: String,
    },
}

/// Get the default config path (~/.config/cypherloop/config.yaml)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cypherloop").join("config.yaml"))
}

fn load_config(explicit: Option<PathBuf>) -> Result<PipelineConfig, String> {
    let path = match explicit {
        Some(path) => path,
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(PipelineConfig::default()),
        },
    };
    PipelineConfig::load(&path).map_err(|e| format!("failed to load {}: {}", path.display(), e))
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e)),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("cannot read stdin: {}", e))?;
            Ok(text)
        }
    }
}

fn cmd_ask(
    question: &str,
    completion_cmd: &str,
    store_cmd: &str,
    schema: &Path,
    config: Option<PathBuf>,
    json: bool,
) -> i32 {
    let config = match load_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let schema = match read_input(Some(schema)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let Some(completion) = CommandCompletion::from_command_line(completion_cmd) else {
        eprintln!("Error: --completion-cmd is empty");
        return 1;
    };
    let Some(store) = CommandStore::from_command_line(store_cmd, schema) else {
        eprintln!("Error: --store-cmd is empty");
        return 1;
    };

    let built = QueryPipeline::with_config(Arc::new(completion), Arc::new(store), config);
    let pipeline = match built {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    let run = rt.block_on(pipeline.run(question, &CancellationToken::new()));

    if json {
        match serde_json::to_string_pretty(&run.answer) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        println!("{}", run.answer.answer);
        if !run.answer.identifiers.is_empty() {
            println!();
            for id in &run.answer.identifiers {
                println!("  {}", id);
            }
        }
    }
    0
}

fn cmd_canonicalize(query: Option<String>) -> i32 {
    let text = match query {
        Some(q) => q,
        None => match read_input(None) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
    };
    println!("{}", canonicalize(text.trim_end()));
    0
}

fn cmd_extract_ids(file: Option<&Path>, field: &str) -> i32 {
    let text = match read_input(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let result: QueryResult = match serde_json::from_str(&text) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: invalid JSON result: {}", e);
            return 1;
        }
    };
    for id in extract_ids(Some(&result), field) {
        println!("{}", id);
    }
    0
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let code = match cli.command {
        Commands::Ask {
            question,
            completion_cmd,
            store_cmd,
            schema,
            config,
            json,
        } => cmd_ask(&question, &completion_cmd, &store_cmd, &schema, config, json),
        Commands::Canonicalize { query } => cmd_canonicalize(query),
        Commands::ExtractIds { file, field } => cmd_extract_ids(file.as_deref(), &field),
    };
    std::process::exit(code);
}
