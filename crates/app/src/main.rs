mod commands;
mod intake;
mod logging;
mod render;
mod settings;

use clap::{Parser, Subcommand};
use intake::IntakeArgs;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tradelens_core::analysis::entity::InvestmentKind;

#[derive(Parser)]
#[command(name = "tradelens")]
#[command(about = "AI-assisted trade analysis from chart screenshots", version)]
#[command(
    after_help = "Examples:\n  tradelens key set AIza...\n  tradelens analyze --kind future --capital 1000 --holding \"2 hours\" \\\n    --chart 5m.png --chart 15m.png --chart 1h.png --chart 4h.png --chart 6h.png \\\n    --interface order.png --document notes.txt\n"
)]
struct Cli {
    /// Configuration file (default: ./tradelens.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Analyse 5 charts and an order screen and print a trade recommendation.
    Analyze {
        /// future | stocks
        #[arg(long, default_value = "future")]
        kind: InvestmentKind,
        /// Available capital in USD.
        #[arg(long, default_value = "1000")]
        capital: Decimal,
        /// Expected holding time, e.g. "1 hour".
        #[arg(long)]
        holding: Option<String>,
        /// Chart images in order: 5m, 15m, 1h, 4h, 6h.
        #[arg(long = "chart", required = true)]
        charts: Vec<PathBuf>,
        /// Screenshot of the order interface.
        #[arg(long)]
        interface: PathBuf,
        /// Optional text document with extra context.
        #[arg(long)]
        document: Option<PathBuf>,
        /// Print the raw result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Manage the stored API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    Set { key: String },
    Show,
    Clear,
}

/// # Summary
/// 程序入口与依赖组装根。
///
/// # Logic
/// 1. 解析命令行。
/// 2. 读取 `.env` 与配置，初始化日志后补报 `.env` 的警告。
/// 3. 分发到具体命令，任何错误都以状态码 1 退出。
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let dotenv_warning = settings::load_dotenv();
    let config = match settings::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init_logging(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(message) = dotenv_warning {
        warn!("{}", message);
    }
    info!("tradelens starting, model {}", config.model.model);


    let result = match cli.command {
        CliCommand::Analyze {
            kind,
            capital,
            holding,
            charts,
            interface,
            document,
            json,
        } => {
            let args = IntakeArgs {
                kind,
                capital,
                holding,
                charts,
                interface,
                document,
            };
            commands::analyze(&config, args, json).await
        }
        CliCommand::Key { action } => match action {
            KeyAction::Set { key } => commands::key_set(&config, &key).await,
            KeyAction::Show => commands::key_show(&config).await,
            KeyAction::Clear => commands::key_clear(&config).await,
        },
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
