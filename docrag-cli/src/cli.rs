use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use docrag::ChunkingStrategy;
use docrag::ollama::{DEFAULT_BASE_URL, DEFAULT_EMBED_MODEL, DEFAULT_LLM_MODEL};

#[derive(Parser, Debug)]
#[command(name = "docrag")]
#[command(about = "Ask questions about a text or PDF document, answered in Japanese by a local LLM", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Document to query (.txt or .pdf). Prompts for one from the data directory when omitted
    pub document: Option<PathBuf>,

    /// LLM model served by Ollama
    #[arg(long = "llm_model", default_value = DEFAULT_LLM_MODEL)]
    pub llm_model: String,

    /// Rebuild the index even if a saved one exists
    #[arg(long = "rebuild_index")]
    pub rebuild_index: bool,

    /// Run the sample questions instead of the interactive prompt
    #[arg(long = "no_interactive")]
    pub no_interactive: bool,

    /// Directory listed when no document is given
    #[arg(long = "data_dir", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding saved indexes
    #[arg(long = "models_dir", default_value = "models")]
    pub models_dir: PathBuf,

    /// Number of chunks retrieved per question
    #[arg(long = "top_k", default_value = "3")]
    pub top_k: usize,

    /// Chunk size in characters
    #[arg(long = "chunk_size", default_value = "1000")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long = "chunk_overlap", default_value = "200")]
    pub chunk_overlap: usize,

    /// Chunking strategy
    #[arg(long, value_enum, default_value_t = Chunking::Fixed)]
    pub chunking: Chunking,

    /// Embedding backend
    #[arg(long, value_enum, default_value_t = Embedder::Ollama)]
    pub embedder: Embedder,

    /// Embedding model served by Ollama
    #[arg(long = "embed_model", default_value = DEFAULT_EMBED_MODEL)]
    pub embed_model: String,

    /// Ollama server address
    #[arg(long = "ollama_url", env = "OLLAMA_HOST", default_value = DEFAULT_BASE_URL)]
    pub ollama_url: String,

    /// Per-request timeout for Ollama calls, in seconds
    #[arg(long = "timeout_secs", default_value = "120")]
    pub timeout_secs: u64,

    /// Keep a freshly built index in memory only
    #[arg(long = "no_save_index")]
    pub no_save_index: bool,

    /// Send a one-line prompt to the LLM, report latency, and exit
    #[arg(long = "check_llm")]
    pub check_llm: bool,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Chunking {
    /// Fixed character windows
    Fixed,
    /// Paragraph, line, sentence, then word boundaries
    Recursive,
}

impl From<Chunking> for ChunkingStrategy {
    fn from(chunking: Chunking) -> Self {
        match chunking {
            Chunking::Fixed => ChunkingStrategy::Fixed,
            Chunking::Recursive => ChunkingStrategy::Recursive,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Embedder {
    /// Ollama embedding model
    Ollama,
    /// Offline hashed character n-grams
    Hash,
}
