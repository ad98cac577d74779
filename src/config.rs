//! 設定ファイル管理
//!
//! `~/.config/vibe-companion/config.toml` から TOML 形式の設定を読み込む。
//! ファイルが存在しない場合はテンプレートを生成し、デフォルト値を使用する。
//!
//! # 設定ファイル例
//!
//! ```toml
//! [ai]
//! api_key_env = "GEMINI_API_KEY"
//! code_model = "gemini-2.5-flash"
//!
//! [companion]
//! mentions = ["@companion", "@AI伙伴"]
//! thinking_ms = 1500
//!
//! [storage]
//! data_dir = "/tmp/vibe"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// Vibe Companion の設定全体
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VibeConfig {
    pub ai: AiConfig,
    pub companion: CompanionConfig,
    pub storage: StorageConfig,
}

/// AI 関連の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// OpenAI 互換エンドポイントのベース URL
    pub base_url: String,
    /// API キーを読む環境変数名
    pub api_key_env: String,
    pub code_model: String,
    pub companion_model: String,
    pub humor_model: String,
    pub wallpaper_model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            code_model: "gemini-2.5-flash".to_string(),
            companion_model: "gemini-2.5-flash".to_string(),
            humor_model: "gemini-2.5-flash".to_string(),
            wallpaper_model: "imagen-3.0-generate-002".to_string(),
        }
    }
}

/// AI 伙伴の振る舞い
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// 伙伴宛てとみなす先頭トークン
    pub mentions: Vec<String>,
    /// Thinking で待つ時間（デモでも同じ値を使う）
    pub thinking_ms: u64,
    /// Happy から Idle に戻るまでの時間
    pub happy_ms: u64,
    /// デモの Working で待つ時間
    pub demo_working_ms: u64,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            mentions: vec!["@companion".to_string(), "@AI伙伴".to_string()],
            thinking_ms: 1500,
            happy_ms: 2000,
            demo_working_ms: 2500,
        }
    }
}

/// 保存先の設定
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// 省略時はプラットフォーム標準のデータディレクトリ
    pub data_dir: Option<PathBuf>,
}

impl VibeConfig {
    /// 既定のパスから設定を読み込む。
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            Self::create_default_config(&path);
            return Self::default();
        }
        Self::load_from(&path)
    }

    /// 指定パスから設定を読み込む。
    ///
    /// 読み込み・パースに失敗した場合は警告を表示してデフォルト値を返す。
    pub fn load_from(path: &Path) -> Self {
        debug!(path = %path.display(), "Loading config file");

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<VibeConfig>(&content) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        code_model = %config.ai.code_model,
                        mentions = config.companion.mentions.len(),
                        thinking_ms = config.companion.thinking_ms,
                        happy_ms = config.companion.happy_ms,
                        "Config loaded successfully"
                    );
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    eprintln!("vibe: warning: failed to parse config file: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file");
                eprintln!("vibe: warning: failed to read config file: {e}");
                Self::default()
            }
        }
    }

    /// 設定ファイルのパスを返す。
    ///
    /// `$HOME` が取得できない場合は `./.config/vibe-companion/config.toml` にフォールバックする。
    pub fn config_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".config/vibe-companion/config.toml")
    }

    /// 設定ファイルが存在しない場合にテンプレートから生成する。
    /// 失敗しても警告だけで起動は継続する。
    fn create_default_config(path: &Path) {
        const TEMPLATE: &str = r#"# Vibe Companion configuration

[ai]
# base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
# api_key_env = "GEMINI_API_KEY"
# code_model = "gemini-2.5-flash"
# companion_model = "gemini-2.5-flash"
# humor_model = "gemini-2.5-flash"
# wallpaper_model = "imagen-3.0-generate-002"

[companion]
# mentions = ["@companion", "@AI伙伴"]
# thinking_ms = 1500
# happy_ms = 2000
# demo_working_ms = 2500

[storage]
# data_dir = "/path/to/data"
"#;

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create config directory");
                eprintln!("vibe: warning: failed to create config directory: {e}");
                return;
            }
        }

        match std::fs::write(path, TEMPLATE) {
            Ok(()) => info!(path = %path.display(), "Created default config file"),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to create default config file");
                eprintln!("vibe: warning: failed to create config file: {e}");
            }
        }
    }
}
