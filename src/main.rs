use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use judge_runner::{
    config::RunnerConfig,
    core::{
        cancel::cancellation,
        domain::{LanguageId, TestCase, TestCaseId},
        pipeline::batch::BatchRunner,
        traits::{judge::JudgeClient, sleeper::TokioSleeper},
    },
    http::client::HttpJudgeClient,
    stubs::judge::JudgeStub,
};

#[derive(Parser, Debug)]
#[command(name = "judge-runner", about = "Run code against test inputs on a remote judge")]
struct Cli {
    /// Use an in-process judge that echoes stdin back
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the code once against a single input
    Run {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, short, default_value = "1 2 3")]
        input: String,
    },
    /// Run the code against every given test case
    Batch {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long = "case", short, required = true)]
        cases: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Language key (`cpp`, `python`, ...) or numeric judge id
    #[arg(long, short)]
    language: String,
    #[arg(long, short)]
    source: PathBuf,
}

#[tokio::main]
#[tracing::instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    let config = RunnerConfig::from_env()?;

    let client: Arc<dyn JudgeClient> = if cli.offline {
        Arc::new(JudgeStub::echo(Duration::from_millis(100)))
    } else {
        Arc::new(HttpJudgeClient::new(&config)?)
    };
    let runner = BatchRunner::new(client, Arc::new(TokioSleeper), &config);

    let (canceller, cancellation) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, abandoning submission");
            canceller.cancel();
        }
    });

    match cli.command {
        Command::Run { source, input } => {
            let (code, language_id) = load_source(&config, &source).await?;

            let run = runner
                .run_single(&code, language_id, &input, cancellation)
                .await;
            println!("{}", run.status);
            if !run.output.is_empty() {
                println!("{}", run.output);
            }
        }
        Command::Batch { source, cases } => {
            let (code, language_id) = load_source(&config, &source).await?;
            let test_cases = cases
                .iter()
                .enumerate()
                .map(|(idx, input)| TestCase::new(idx as TestCaseId + 1, input))
                .collect();

            let (mut updates, handle) =
                runner.run_streaming(code, language_id, test_cases, cancellation);
            while let Some(update) = updates.next().await {
                match update.test_case {
                    Some(id) => println!("[{}] {}", id, update.status),
                    None => println!("{}", update.status),
                }
            }

            let outcome = handle.await??;
            for id in outcome.results.keys().sorted() {
                let result = &outcome.results[id];
                println!("Test case {}: {}", id, result.category());
                println!("{}", result.output());
            }
        }
    }

    Ok(())
}

/// Numeric ids go to the runner untouched so it can reject unknown ones;
/// keys are looked up in the language table.
async fn load_source(
    config: &RunnerConfig,
    args: &SourceArgs,
) -> Result<(String, LanguageId), Box<dyn std::error::Error>> {
    let code = tokio::fs::read_to_string(&args.source).await?;
    let language_id = match args.language.parse::<u32>() {
        Ok(id) => LanguageId(id),
        Err(_) => config
            .languages
            .by_key(&args.language)
            .map(|lang| lang.id)
            .ok_or_else(|| format!("unknown language {}", args.language))?,
    };
    Ok((code, language_id))
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
