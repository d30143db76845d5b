use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use vidquery::safety::GateDecision;
use vidquery::telegram::{run_polling, TelegramClient};
use vidquery::{AppConfig, Pipeline, SafetyGate};

#[derive(Parser)]
#[command(name = "vidquery")]
#[command(about = "Answers video-metrics questions with a single number")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the Telegram bot (long polling)
    Bot,

    /// Answer one question and print the reply
    Ask {
        /// The question in natural language
        question: String,
    },

    /// Show the safety gate decision for a statement
    CheckSql {
        sql: String,

        /// Also run the parser-based checks
        #[arg(long)]
        strict: bool,
    },
}

// Questions are interleaved on one thread; only their I/O overlaps.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    vidquery::observability::init_tracing();

    let args = Args::parse();

    match args.command {
        Command::CheckSql { sql, strict } => {
            match SafetyGate::with_strict(strict).inspect(&sql) {
                GateDecision::Accepted(accepted) => println!("accepted: {}", accepted),
                GateDecision::Rejected(reason) => println!("rejected: {}", reason),
            }
        }
        Command::Ask { question } => {
            let config = AppConfig::from_env().context("loading configuration")?;
            let pipeline = Pipeline::connect(&config).await.context("starting pipeline")?;
            println!("{}", pipeline.answer(&question).await);
        }
        Command::Bot => {
            let config = AppConfig::from_env().context("loading configuration")?;
            let token = config.require_bot_token()?.to_string();
            let pipeline = Arc::new(Pipeline::connect(&config).await.context("starting pipeline")?);
            let client = TelegramClient::new(&token)?;
            info!("bot started, make sure the inference endpoint is running");
            run_polling(client, pipeline).await?;
        }
    }

    Ok(())
}
