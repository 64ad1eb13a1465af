use chrono::Utc;
use futures::StreamExt;
use imagegen::{
    logger, FeedOrder, FirestoreConfig, FirestoreFeed, GeneratedImage, GeneratorConfig,
    ImageClient, ImageFeed, MemoryFeed, SubmissionHandler, SubmitOutcome,
};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

const USAGE: &str = "usage: imagegen [--history | --watch] [prompt...]";

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    if let Err(e) = logger::init_with_config(logger::LoggerConfig::from_env()) {
        eprintln!("{}", e);
    }

    if dotenv_loaded {
        log::info!(".env file loaded");
    } else {
        log::warn!("No .env file found, using system environment variables");
    }

    let mut args: Vec<String> = env::args().skip(1).collect();
    let watch = take_flag(&mut args, "--watch");
    let history = take_flag(&mut args, "--history") || watch;
    if args.is_empty() && !history {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    }

    let generator_config = GeneratorConfig::from_env();
    let firestore_config = FirestoreConfig::from_env();
    logger::log_config_info(&generator_config, &firestore_config);

    let memory = MemoryFeed::new();
    let history_feed: Arc<dyn ImageFeed> = if firestore_config.is_configured() {
        log::info!(
            "Reading history from Firestore collection '{}'",
            firestore_config.collection
        );
        match FirestoreFeed::new(firestore_config) {
            Ok(feed) => Arc::new(feed),
            Err(e) => {
                log::error!("Failed to set up history feed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        log::info!("No Firestore project configured, history is kept in memory");
        Arc::new(memory.clone())
    };

    let mut status = ExitCode::SUCCESS;

    if !args.is_empty() {
        let prompt = args.join(" ");
        let handler = SubmissionHandler::new(ImageClient::new(generator_config));

        match handler.submit(&prompt).await {
            SubmitOutcome::Completed { image_url } => {
                println!("{}", image_url);
                memory.push(GeneratedImage::new(image_url, prompt, Utc::now()));
            }
            SubmitOutcome::Failed { error } => {
                eprintln!("Generation failed: {}", error);
                status = ExitCode::FAILURE;
            }
            SubmitOutcome::Busy => {
                eprintln!("A generation is already in progress");
                status = ExitCode::FAILURE;
            }
        }
    }

    if history {
        if let Err(e) = print_history(history_feed.as_ref(), watch).await {
            log::error!("Failed to read history: {}", e);
            status = ExitCode::FAILURE;
        }
    }

    status
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}

async fn print_history(feed: &dyn ImageFeed, follow: bool) -> imagegen::Result<()> {
    let mut snapshots = feed.subscribe(FeedOrder::newest_first())?;

    while let Some(snapshot) = snapshots.next().await {
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) if follow => {
                log::warn!("History update failed: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        println!("--- {} generated images ---", snapshot.len());
        for image in &snapshot {
            println!(
                "{}  {}  {}",
                image.timestamp.format("%Y-%m-%d %H:%M:%S"),
                image.image,
                image.prompt
            );
        }

        if !follow {
            break;
        }
    }
    Ok(())
}
