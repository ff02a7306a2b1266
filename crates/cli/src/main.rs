use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "llamagram")]
#[command(about = "Telegram bot backed by a local Ollama model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: LLAMAGRAM_CONFIG_PATH or ~/.llamagram/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the bot: poll Telegram for updates and answer them. Press Enter (or Ctrl+C) to stop.
    Run {
        /// Config file path (default: LLAMAGRAM_CONFIG_PATH or ~/.llamagram/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// List models available on the configured Ollama host.
    Models {
        /// Config file path (default: LLAMAGRAM_CONFIG_PATH or ~/.llamagram/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Send one prompt to the configured model and print the reply.
    Ask {
        /// Prompt text.
        prompt: String,

        /// Config file path (default: LLAMAGRAM_CONFIG_PATH or ~/.llamagram/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
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

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("llamagram {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config),
        Some(Commands::Run { config }) => run_bot(config).await,
        Some(Commands::Models { config }) => run_models(config).await,
        Some(Commands::Ask { prompt, config }) => run_ask(config, prompt).await,
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_bot(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, path) = lib::config::load_config(config_path)?;
    log::info!(
        "starting bot (config {}, model {} at {})",
        path.display(),
        config.ollama.model,
        config.ollama.base_url
    );
    lib::bot::run_bot(config).await
}

async fn run_models(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let client = lib::llm::OllamaClient::new(Some(config.ollama.base_url));
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("no models found at {}", client.base_url());
    }
    for m in models {
        let marker = if m.name == config.ollama.model { "*" } else { " " };
        match m.size {
            Some(bytes) => println!("{} {} ({:.1} GB)", marker, m.name, bytes as f64 / 1e9),
            None => println!("{} {}", marker, m.name),
        }
    }
    Ok(())
}

async fn run_ask(config_path: Option<PathBuf>, prompt: String) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let client = lib::llm::OllamaClient::new(Some(config.ollama.base_url.clone()));
    let generator = lib::generation::Generator::new(Arc::new(client), config.ollama.model.clone())
        .with_timeout(config.ollama.request_timeout());
    let reply = generator.generate(&prompt).await?;
    println!("{}", reply.trim());
    Ok(())
}
