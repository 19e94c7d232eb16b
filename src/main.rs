use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;

use grabbot::cli::{Cli, Commands};
use grabbot::core::{config, init_logger, log_startup_configuration};
use grabbot::download::{DeliveryPipeline, DownloadOrchestrator, YtDlpEngine};
use grabbot::storage::SessionStore;
use grabbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, Router, TeloxideTransport};

/// Restarts of a panicked dispatcher before giving up
const MAX_DISPATCHER_RETRIES: u32 = 5;

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, missing token, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from handler tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env first, LOG_FILE_PATH may come from it
    let _ = dotenv();
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { cookies }) => run_bot(cookies).await,
        Some(Commands::CheckConfig) => check_config(),
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(None).await
        }
    }
}

/// Validates configuration without contacting Telegram
fn check_config() -> Result<()> {
    config::bot_token()?;
    log_startup_configuration();
    log::info!("Configuration OK");
    Ok(())
}

async fn run_bot(cookies: Option<String>) -> Result<()> {
    // A missing token is fatal before any update is read
    let token = config::bot_token()?;
    log_startup_configuration();

    fs_err::tokio::create_dir_all(config::DOWNLOAD_FOLDER.as_str()).await?;

    let bot = create_bot(&token)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let mut orchestrator = DownloadOrchestrator::from_config(Arc::new(YtDlpEngine::default()));
    if let Some(path) = cookies {
        log::info!("Using cookies file from command line: {}", path);
        orchestrator = orchestrator.with_cookies_file(shellexpand::tilde(&path).into_owned());
    }

    let transport = Arc::new(TeloxideTransport::new(bot.clone()));
    let router = Router::new(
        Arc::new(SessionStore::new()),
        Arc::new(orchestrator),
        DeliveryPipeline::from_config(transport.clone()),
        transport,
    );
    let deps = HandlerDeps::new(Arc::new(router));

    log::info!("Starting bot with long polling");
    let mut retry_count = 0;
    loop {
        let bot_clone = bot.clone();
        let handler = schema(deps.clone());

        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler)
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() && retry_count < MAX_DISPATCHER_RETRIES => {
                retry_count += 1;
                log::error!(
                    "Dispatcher panicked: {}; restarting (attempt {}/{})",
                    join_err,
                    retry_count,
                    MAX_DISPATCHER_RETRIES
                );
                tokio::time::sleep(Duration::from_secs(2u64.pow(retry_count))).await;
            }
            Err(join_err) => {
                log::error!("Dispatcher stopped: {}", join_err);
                break;
            }
        }
    }

    Ok(())
}
