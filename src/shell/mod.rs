//! Shell モジュール — REPL ループとシェル状態管理
//!
//! `Shell` 構造体にすべての表示側の状態を集約し、
//! 入力ハンドリングとスラッシュコマンドの実行をサブモジュールに分離する。
//! 伙伴の状態そのものは `CompanionController` が持ち、ここではスナップショットを読むだけ。

pub mod commands;
mod dispatch;
mod editor;
mod input;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use reedline::{Reedline, Signal};
use tracing::{info, warn};

use crate::ai::GenerationService;
use crate::cli::prompt::VibePrompt;
use crate::companion::CompanionController;
use crate::humor::{today, PhraseLibrary, QuoteBook};
use crate::storage::PreferenceStore;

/// REPL の状態を管理する構造体。
pub struct Shell {
    editor: Reedline,
    prompt: VibePrompt,
    controller: CompanionController,
    service: Arc<dyn GenerationService>,
    quotes: QuoteBook,
    phrases: PhraseLibrary,
    /// `/preview` の既定の書き出し先や入力履歴を置くディレクトリ
    data_dir: PathBuf,
    online: bool,
}

impl Shell {
    /// 新しい Shell インスタンスを作成する。
    pub fn new(
        controller: CompanionController,
        service: Arc<dyn GenerationService>,
        store: Arc<dyn PreferenceStore>,
        data_dir: PathBuf,
        online: bool,
    ) -> Result<Self> {
        let editor = editor::build_editor(controller.mentions(), data_dir.join("history.txt"))?;
        let prompt = VibePrompt::new(controller.subscribe());

        let quotes = QuoteBook::load(Arc::clone(&store), &today());
        let phrases = PhraseLibrary::load(store);

        Ok(Self {
            editor,
            prompt,
            controller,
            service,
            quotes,
            phrases,
            data_dir,
            online,
        })
    }

    /// REPL ループを実行する。
    ///
    /// Ctrl-D または `/exit` で終了する。
    ///
    /// 戻り値: 終了コード。REPL 内部エラーのときだけ `1`。
    pub async fn run(&mut self, start_with_demo: bool) -> i32 {
        crate::cli::banner::print_welcome(self.online);

        if start_with_demo {
            self.play_demo().await;
        }

        let mut repl_error = false;

        loop {
            match self.editor.read_line(&self.prompt) {
                Ok(Signal::Success(line)) => {
                    if !self.handle_input(&line).await {
                        break;
                    }
                }
                Ok(Signal::CtrlC) => {
                    info!("Ctrl-C received, clearing line");
                    println!();
                }
                Ok(Signal::CtrlD) => {
                    info!("Ctrl-D received, exiting");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "REPL error, exiting");
                    eprintln!("vibe: error: {e}");
                    repl_error = true;
                    break;
                }
            }
        }

        crate::cli::banner::print_goodbye();

        i32::from(repl_error)
    }
}
