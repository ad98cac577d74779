//! reedline エディタの構築
//!
//! ハイライター、補完、キーバインディング、履歴、オートサジェストを設定した
//! reedline エディタを構築する。

use std::path::PathBuf;

use anyhow::{Context, Result};
use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, ColumnarMenu, DefaultHinter, Emacs, FileBackedHistory, KeyCode,
    KeyModifiers, MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu,
};

use crate::cli::completer::VibeCompleter;
use crate::cli::highlighter::VibeHighlighter;

/// 入力履歴の保持件数
const HISTORY_CAPACITY: usize = 1000;

/// `history_path` は入力履歴ファイルへのパス。
pub fn build_editor(mentions: &[String], history_path: PathBuf) -> Result<Reedline> {
    let completer = Box::new(VibeCompleter::new(mentions.to_vec()));
    let completion_menu = Box::new(ColumnarMenu::default().with_name("completion_menu"));

    let history = Box::new(
        FileBackedHistory::with_file(HISTORY_CAPACITY, history_path.clone()).with_context(
            || format!("failed to open history file: {}", history_path.display()),
        )?,
    );

    // Fish ライクなオートサジェスト（履歴からグレーテキストで候補を表示）
    let hinter = Box::new(
        DefaultHinter::default()
            .with_style(Style::new().fg(Color::DarkGray))
            .with_min_chars(2),
    );

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );

    Ok(Reedline::create()
        .with_history(history)
        .with_hinter(hinter)
        .with_highlighter(Box::new(VibeHighlighter::new(mentions.to_vec())))
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_edit_mode(Box::new(Emacs::new(keybindings))))
}
