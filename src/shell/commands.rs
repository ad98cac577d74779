//! スラッシュコマンドの定義と解析
//!
//! `/` で始まる行を `shell_words` でトークンに分割し、clap の derive で解析する。

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ai::{ReplyStyle, WorkplaceScenario, WorkplaceTone};
use crate::cli::prompt::ActiveTab;
use crate::humor::{PhraseCategory, PhraseFilter};

/// 補完と `/help` に使うコマンド一覧
pub const SLASH_COMMANDS: &[(&str, &str)] = &[
    ("/help", "显示命令列表"),
    ("/demo", "播放演示"),
    ("/code", "查看当前生成的代码"),
    ("/preview", "把生成的页面写入 HTML 文件"),
    ("/tab", "切换视图：code | preview | humor"),
    ("/wallpaper", "生成壁纸，--clear 移除"),
    ("/avatar", "设置伙伴头像，--clear 恢复默认"),
    ("/reply", "智能回复"),
    ("/work", "职场回复"),
    ("/quote", "每日语录：new | fav | favs | history | share"),
    ("/phrases", "话术库：搜索、use <id>、fav <id>"),
    ("/exit", "退出"),
];

#[derive(Debug, Parser)]
#[command(
    name = "/",
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true
)]
pub struct SlashLine {
    #[command(subcommand)]
    pub command: SlashCommand,
}

#[derive(Debug, PartialEq, Subcommand)]
pub enum SlashCommand {
    Help,
    Demo,
    Code,
    Preview {
        /// 書き出し先（省略時はデータディレクトリの preview.html）
        path: Option<PathBuf>,
    },
    Tab {
        #[arg(value_enum)]
        tab: ActiveTab,
    },
    Wallpaper {
        #[arg(long, conflicts_with = "prompt")]
        clear: bool,
        #[arg(trailing_var_arg = true, required_unless_present = "clear")]
        prompt: Vec<String>,
    },
    Avatar {
        #[arg(long, conflicts_with = "path")]
        clear: bool,
        /// 省略時は現在のアバターを表示する
        path: Option<PathBuf>,
    },
    Reply {
        #[arg(long, value_enum, default_value_t)]
        style: ReplyStyle,
        #[arg(long)]
        context: Option<String>,
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    Work {
        #[arg(long, value_enum, default_value_t)]
        scenario: WorkplaceScenario,
        #[arg(long, value_enum, default_value_t)]
        tone: WorkplaceTone,
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    Quote {
        #[command(subcommand)]
        action: Option<QuoteAction>,
    },
    #[command(args_conflicts_with_subcommands = true)]
    Phrases {
        #[command(subcommand)]
        action: Option<PhraseAction>,
        #[command(flatten)]
        search: PhraseSearch,
    },
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, PartialEq, Subcommand)]
pub enum QuoteAction {
    /// 新しい語録を生成する
    New,
    /// お気に入りを切り替える（省略時は今日の語録）。
    Fav { id: Option<String> },
    /// お気に入りの語録の一覧
    #[command(alias = "favorites")]
    Favs,
    History,
    Share,
}

#[derive(Debug, PartialEq, Subcommand)]
pub enum PhraseAction {
    Use { id: String },
    Fav { id: String },
}

#[derive(Debug, Default, PartialEq, Args)]
pub struct PhraseSearch {
    #[arg(long, value_enum)]
    pub category: Option<PhraseCategory>,
    #[arg(long)]
    pub tag: Option<String>,
    pub query: Vec<String>,
}

impl PhraseSearch {
    pub fn to_filter(&self) -> PhraseFilter {
        PhraseFilter {
            category: self.category,
            tag: self.tag.clone(),
            query: (!self.query.is_empty()).then(|| self.query.join(" ")),
        }
    }
}

/// 行がスラッシュコマンドかどうか
pub fn is_slash_command(line: &str) -> bool {
    line.trim_start().starts_with('/')
}

/// `/` で始まる 1 行を解析する。エラーはそのままユーザーに見せられる文字列。
pub fn parse(line: &str) -> Result<SlashCommand, String> {
    let body = line.trim_start().trim_start_matches('/');
    let words = shell_words::split(body).map_err(|e| format!("无法解析命令：{e}"))?;
    if words.is_empty() {
        return Err("请输入命令，例如 /help".to_string());
    }
    SlashLine::try_parse_from(words)
        .map(|line| line.command)
        .map_err(|e| e.render().to_string())
}
