use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tgbridge")]
#[command(about = "Relay Telegram chats to OpenCode sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the bot with getUpdates long polling. Needs BOT_TOKEN.
    Poll {
        /// Config file path (default: TGBRIDGE_CONFIG_PATH or ~/.tgbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the bot behind a webhook. Needs BOT_TOKEN and WEBHOOK_URL; WEBHOOK_SECRET is checked when set.
    Webhook {
        /// Config file path (default: TGBRIDGE_CONFIG_PATH or ~/.tgbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Listen port (default from PORT, config, or 8443)
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to load .env: {}", e);
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("tgbridge {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Poll { config }) => {
            if let Err(e) = run_poll(config).await {
                log::error!("polling failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Webhook { config, port }) => {
            if let Err(e) = run_webhook(config, port).await {
                log::error!("webhook failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_poll(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let config = bridge::config::load_config(config_path)?;
    bridge::runtime::run_polling(config).await
}

async fn run_webhook(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = bridge::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    bridge::gateway::run_webhook(config).await
}
