use std::borrow::Cow;

use chrono::Local;
use clap::ValueEnum;
use reedline::{Color, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};
use tokio::sync::watch;

use super::color::{cyan, dim, green, paint, white, yellow};
use crate::companion::Snapshot;

/// 生成物をどのビューで見るか
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ActiveTab {
    /// コードをそのまま表示
    Code,
    /// HTML ファイルに書き出す
    #[default]
    Preview,
    /// 情商助手
    Humor,
}

impl ActiveTab {
    pub fn label(self) -> &'static str {
        match self {
            ActiveTab::Code => "代码",
            ActiveTab::Preview => "预览",
            ActiveTab::Humor => "情商助手",
        }
    }
}

/// Vibe のカスタムプロンプト。
///
/// ```text
/// (･ω･) vibe [预览] 💬 4 🎭 🖼
/// ❯
/// ```
///
/// 顔文字は伙伴の現在の状態に追従する。
pub struct VibePrompt {
    snapshots: watch::Receiver<Snapshot>,
    tab: ActiveTab,
}

impl VibePrompt {
    pub fn new(snapshots: watch::Receiver<Snapshot>) -> Self {
        Self {
            snapshots,
            tab: ActiveTab::default(),
        }
    }

    pub fn tab(&self) -> ActiveTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: ActiveTab) {
        self.tab = tab;
    }
}

impl Prompt for VibePrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let snapshot = self.snapshots.borrow();
        let display = snapshot.state.display();

        let mut line = format!(
            "{} {} {}",
            paint(display.color, display.face),
            cyan("vibe"),
            yellow(&format!("[{}]", self.tab.label()))
        );
        if !snapshot.messages.is_empty() {
            line.push_str(&dim(&format!(" 💬 {}", snapshot.messages.len())));
        }
        if snapshot.custom_avatar {
            line.push_str(" 🎭");
        }
        if snapshot.wallpaper.is_some() {
            line.push_str(" 🖼");
        }
        line.push('\n');
        Cow::Owned(line)
    }

    fn get_prompt_color(&self) -> Color {
        Color::White
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        let now = Local::now().format("%H:%M:%S").to_string();
        Cow::Owned(white(&now))
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Owned(green("\u{276f} "))
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(" :: ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "(failed) ",
        };
        Cow::Owned(format!("{prefix}(search: '{}') ", history_search.term))
    }
}
