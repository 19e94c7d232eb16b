use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "grabbot")]
#[command(author, version, about = "Telegram bot that downloads videos at a chosen quality", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling
    Run {
        /// Cookies file for yt-dlp, overrides YTDL_COOKIES_FILE
        #[arg(short, long)]
        cookies: Option<String>,
    },

    /// Validate configuration and exit
    CheckConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
