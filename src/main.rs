mod ai;
mod cli;
mod companion;
mod config;
mod humor;
mod logging;
mod shell;
mod storage;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use ai::{CompanionAI, GenerationService};
use companion::{CompanionController, CycleTimings, TokioPacer};
use config::VibeConfig;
use shell::Shell;
use storage::{MemoryPreferences, PreferenceStore, Preferences};

/// Vibe Coder の AI 伙伴
#[derive(Debug, Parser)]
#[command(name = "vibe", version, about)]
struct Args {
    /// 設定ファイルのパス（省略時は ~/.config/vibe-companion/config.toml）
    #[arg(long)]
    config: Option<PathBuf>,

    /// API キーがあっても生成サービスに接続しない
    #[arg(long)]
    offline: bool,

    /// 起動直後にデモを再生する
    #[arg(long)]
    demo: bool,
}

/// データディレクトリを決める。設定の上書きが優先。
fn resolve_data_dir(config: &VibeConfig) -> PathBuf {
    if let Some(dir) = &config.storage.data_dir {
        return dir.clone();
    }
    match Preferences::data_dir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("Failed to determine data directory: {e}");
            PathBuf::from(".vibe-companion")
        }
    }
}

fn open_store(data_dir: &std::path::Path) -> Arc<dyn PreferenceStore> {
    match Preferences::open_at(data_dir) {
        Ok(store) => {
            info!(path = %data_dir.display(), "Preference store initialized successfully");
            Arc::new(store)
        }
        Err(e) => {
            warn!("Failed to open preference store: {e:#}");
            eprintln!("vibe: warning: preferences will not be saved: {e:#}");
            Arc::new(MemoryPreferences::default())
        }
    }
}

fn build_client(config: &VibeConfig, offline: bool) -> CompanionAI {
    if offline {
        info!("Offline mode requested");
        return CompanionAI::offline(&config.ai);
    }
    match CompanionAI::new(&config.ai) {
        Ok(ai) => {
            info!("AI client initialized successfully");
            ai
        }
        Err(e) => {
            warn!("AI disabled: {e}");
            eprintln!("vibe: warning: AI disabled: {e}");
            CompanionAI::offline(&config.ai)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env ファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // _guard は main 終了まで保持する必要がある
    let _guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("vibe: warning: failed to initialize logging: {e:#}");
            None
        }
    };
    info!("vibe started");

    let config = match &args.config {
        Some(path) => VibeConfig::load_from(path),
        None => VibeConfig::load(),
    };

    let data_dir = resolve_data_dir(&config);
    let store = open_store(&data_dir);

    let ai = build_client(&config, args.offline);
    let online = ai.is_online();
    let service: Arc<dyn GenerationService> = Arc::new(ai);

    let controller = CompanionController::new(
        Arc::clone(&service),
        Arc::clone(&store),
        Arc::new(TokioPacer),
        CycleTimings::from(&config.companion),
        config.companion.mentions.clone(),
    );

    let mut shell = match Shell::new(controller, service, store, data_dir, online) {
        Ok(shell) => shell,
        Err(e) => {
            warn!("Failed to start shell: {e:#}");
            eprintln!("vibe: error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = shell.run(args.demo).await;
    info!(exit_code = code, "vibe shutting down");
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
