use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use ragprep::core::{config, logging};
use ragprep::rag::{Chunk, IngestPipeline, PromptBuilder, RawDocument};

#[derive(Debug, Parser)]
#[command(name = "ragprep", version, about = "Prepare text for retrieval-augmented generation")]
struct Cli {
    /// Config file (defaults to $RAGPREP_CONFIG_PATH, then ./ragprep.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the normalized form of a text
    Normalize {
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Normalize and chunk a JSON array of documents ({text|content, metadata})
    Chunk {
        input: Option<PathBuf>,
    },
    /// Assemble a prompt from a JSON array of {content, metadata} records
    Prompt {
        #[arg(long, short)]
        query: String,
        input: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref()).context("Failed to load config")?;
    logging::init(&config.logging);

    match cli.command {
        Command::Normalize { input } => {
            let text = read_input(input.as_ref())?;
            let pipeline = IngestPipeline::new(&config)?;
            println!("{}", pipeline.normalizer().normalize(&text));
        }
        Command::Chunk { input } => {
            let raw = read_input(input.as_ref())?;
            let documents: Vec<RawDocument> =
                serde_json::from_str(&raw).context("Expected a JSON array of documents")?;
            let pipeline = IngestPipeline::new(&config)?;
            let chunks = pipeline.prepare(&documents);
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        }
        Command::Prompt { query, input } => {
            let raw = read_input(input.as_ref())?;
            let records: Vec<Chunk> =
                serde_json::from_str(&raw).context("Expected a JSON array of records")?;
            let builder = PromptBuilder::new(config.prompt);
            println!("{}", builder.build_prompt(&query, &records));
        }
    }

    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}
