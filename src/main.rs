use channel_admin::bot::TelegramBot;
use channel_admin::config::AppConfig;
use clap::Parser;
use log::info;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "channel-admin")]
#[command(about = "A Telegram bot that sells posts in a channel for energy")]
struct Args {
    /// seconds between Crypto Pay invoice status checks
    #[arg(long, default_value_t = 30)]
    payment_poll_secs: u64,

    /// seconds between publishing approved posts to the channel
    #[arg(long, default_value_t = 60)]
    publish_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // load .env file if it exists
    if let Err(e) = dotenvy::dotenv() {
        match e {
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            _ => {
                eprintln!("warning: failed to load .env file: {}", e);
            }
        }
    }

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;

    info!("Starting bot...");

    let bot = TelegramBot::new(
        config,
        Duration::from_secs(args.payment_poll_secs.max(1)),
        Duration::from_secs(args.publish_interval_secs.max(1)),
    )
    .await?;
    bot.run().await;

    Ok(())
}
