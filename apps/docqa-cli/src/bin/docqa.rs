use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use docqa_cli::app::{build_pipeline, init_tracing, Backends};
use docqa_core::config::{expand_path, Config};
use docqa_core::data_processor::DataProcessor;
use docqa_core::types::{AskRequest, ChatMessage, PipelineEvent};

#[derive(Parser)]
#[command(name = "docqa", version, about = "Hybrid search and streamed answers over ingested documents")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk every .txt file under a directory and add it to both indexes
    Ingest {
        /// Directory of extracted text; defaults to data.raw_txt_dir
        dir: Option<PathBuf>,
        #[arg(short, long)]
        session: String,
    },
    /// Ask a question against one session's documents
    Ask {
        #[arg(short, long)]
        session: String,
        #[arg(required = true)]
        question: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    match cli.command {
        Command::Ingest { dir, session } => {
            let dir = dir.unwrap_or_else(|| expand_path(&settings.data.raw_txt_dir));
            let chunks = DataProcessor::new().process_directory(&dir, &session)?;
            if chunks.is_empty() {
                eprintln!("No .txt files found under {}", dir.display());
                return Ok(());
            }
            let backends = Backends::open(&settings).await?;
            let written = backends.indexer().index(&chunks).await?;
            println!("Ingested {} chunks from {} into session '{}'", written, dir.display(), session);
        }
        Command::Ask { session, question } => {
            let pipeline = build_pipeline(&settings).await?;
            let request = AskRequest::new(session, vec![ChatMessage::user(question.join(" "))]);
            let mut rx = pipeline.spawn(request);
            let mut failed = false;
            let mut stdout = std::io::stdout();
            while let Some(event) = rx.recv().await {
                match event {
                    PipelineEvent::Progress { message } => eprintln!("… {message}"),
                    PipelineEvent::Queries { queries } => {
                        for q in queries { eprintln!("  • {q}"); }
                    }
                    PipelineEvent::Content { chunk } => {
                        print!("{chunk}");
                        stdout.flush()?;
                    }
                    PipelineEvent::Error { error } => {
                        eprintln!("\nError: {error}");
                        failed = true;
                    }
                }
            }
            println!();
            if failed { std::process::exit(1); }
        }
    }
    Ok(())
}
