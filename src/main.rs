use anyhow::Result;
use clap::{Parser, Subcommand};
use loqa_recognizer::{
    Config, RecognitionListener, RecognitionResult, Session, SessionId, SimulatedEngine,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loqa-recognizer", about = "Drive a recognition session against the simulated engine")]
struct Cli {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/loqa-recognizer")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize a single utterance
    Recognize,
    /// Run continuous recognition for a while
    Continuous {
        #[arg(long, default_value_t = 3)]
        seconds: u64,
    },
    /// Run keyword recognition for a while
    Keyword {
        keyword: String,
        #[arg(long, default_value_t = 3)]
        seconds: u64,
    },
}

/// Prints every session event to stdout
struct ConsoleListener;

impl RecognitionListener for ConsoleListener {
    fn on_session_started(&self, session_id: &SessionId) {
        println!("[{}] session started", session_id);
    }

    fn on_session_stopped(&self, session_id: &SessionId) {
        println!("[{}] session stopped", session_id);
    }

    fn on_result(&self, session_id: &SessionId, result: &RecognitionResult) {
        println!(
            "[{}] {:?}: {}",
            session_id,
            result.reason,
            result.text.as_deref().unwrap_or("<no match>")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Loaded config: {}", cfg.service.name);

    let engine = Arc::new(SimulatedEngine::new(cfg.engine));
    let session = Session::new(cfg.session, engine);
    let listener = Arc::new(ConsoleListener);
    session.add_listener(&listener);

    match cli.command {
        Command::Recognize => {
            let result = session.recognize_async().join().await?;
            println!("Final result: {}", serde_json::to_string_pretty(&result)?);
        }
        Command::Continuous { seconds } => {
            session.start_continuous_recognition_async().join().await?;
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            session.stop_continuous_recognition_async().join().await?;
        }
        Command::Keyword { keyword, seconds } => {
            session.start_keyword_recognition_async(keyword).join().await?;
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            session.stop_keyword_recognition_async().join().await?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.stats())?);

    Ok(())
}
