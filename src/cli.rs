use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "prodsense",
    about = "Identify products from extracted text and answer questions about them"
)]
pub struct Cli {
    /// Override the data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Match extracted text against the product catalog
    Recognize(RecognizeArgs),
    /// Answer a question about a specific product
    Answer(AnswerArgs),
    /// Retrieve raw documentation chunks for a query
    Query(QueryArgs),
    /// Rebuild the vector index from the documents directory
    Rebuild,
    /// Show catalog, index, and configuration status
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Recognize --

#[derive(Debug, Parser)]
pub struct RecognizeArgs {
    /// Extracted text to match (reads stdin when omitted)
    pub text: Option<String>,

    /// Read the extracted text from a file instead
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Also answer this question about the best-matching product
    #[arg(long)]
    pub ask: Option<String>,

    /// Number of candidates to return (defaults to the configured top-k)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Answer from a documentation excerpt without calling the LLM
    #[arg(long)]
    pub no_llm: bool,
}

// -- Answer --

#[derive(Debug, Parser)]
pub struct AnswerArgs {
    /// Product identifier from the catalog
    pub product_id: String,

    /// Natural-language question about the product
    pub question: String,

    /// Number of context chunks to retrieve
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Answer from a documentation excerpt without calling the LLM
    #[arg(long)]
    pub no_llm: bool,
}

// -- Query --

#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// The retrieval query
    pub query: String,

    /// Restrict results to one product
    #[arg(short = 'p', long)]
    pub product: Option<String>,

    /// Number of chunks to return (defaults to the configured top-k)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "prodsense",
            &mut std::io::stdout(),
        );
    }
}
