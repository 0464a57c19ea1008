//! AstroIntel Entry Point
//!
//! Answers space biology questions from the command line. Logs go to
//! stderr so stdout carries answers only.

use astrointel_cli::{Answer, Assistant, CliResult, Hit, Settings};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "astrointel")]
#[command(about = "Space biology question answering over a semantic knowledge base")]
#[command(version)]
struct Args {
    #[command(flatten)]
    settings: Settings,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a single question
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List the best matching passages with scores
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum passages to list
        #[arg(long, short, default_value_t = 3)]
        limit: usize,
    },
    /// Print the knowledge base
    Passages,
    /// Delete and rebuild the vector cache
    RebuildCache,
    /// Answer questions read line by line from stdin
    Interactive,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "astrointel=info,astrointel_retrieval=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args) -> CliResult<()> {
    let json = args.json;
    match args.command {
        Command::Ask { question } => {
            let assistant = Assistant::new(args.settings.bootstrap().await?);
            let answer = assistant.ask(&question.join(" ")).await?;
            print_answer(&answer, json)?;
        }
        Command::Search { query, limit } => {
            let assistant = Assistant::new(args.settings.bootstrap().await?);
            let hits = assistant.search(&query.join(" "), limit).await?;
            print_hits(&hits, json)?;
        }
        Command::Passages => {
            let kb = args.settings.load_knowledge_base()?;
            if json {
                println!("{}", serde_json::to_string_pretty(kb.passages())?);
            } else {
                for passage in kb.passages() {
                    println!("[{}] {}", passage.id, passage.text);
                }
            }
        }
        Command::RebuildCache => {
            args.settings.clear_cache()?;
            let retriever = args.settings.bootstrap().await?;
            println!(
                "Rebuilt {} vectors ({}d) at {}",
                retriever.cache().len(),
                retriever.cache().dimension(),
                args.settings.cache_path.display()
            );
        }
        Command::Interactive => {
            let assistant = Assistant::new(args.settings.bootstrap().await?);
            tracing::info!("Ready. Ask a question, or send EOF to quit.");

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                match assistant.ask(&line).await {
                    Ok(answer) => print_answer(&answer, json)?,
                    Err(e) => tracing::error!("{}", e),
                }
            }
        }
    }
    Ok(())
}

fn print_answer(answer: &Answer, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string(answer)?);
    } else {
        println!("{}", answer.text());
    }
    Ok(())
}

fn print_hits(hits: &[Hit], json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No passages above the threshold.");
    }
    for hit in hits {
        println!("[{}] {:.3}  {}", hit.passage_id, hit.score, hit.text);
    }
    Ok(())
}
