//! 入力ハンドリング
//!
//! スラッシュコマンドとチャット入力を振り分け、チャットは伙伴のサイクルとして実行する。

use tracing::{debug, info, warn};

use crate::cli::color::{dim, red};
use crate::cli::companion::{
    companion_notice, companion_talk, print_happy, render_message, CycleSpinner,
};
use crate::cli::prompt::ActiveTab;
use crate::companion::{CompanionState, TriggerKind, TriggerOutcome};

use super::commands;
use super::Shell;

impl Shell {
    /// ユーザー入力を処理する。
    ///
    /// 戻り値: `true` = REPL ループ続行、`false` = 終了
    pub(super) async fn handle_input(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }

        debug!(input = %line, "User input received");

        if commands::is_slash_command(line) {
            return match commands::parse(line) {
                Ok(command) => self.run_command(command).await,
                Err(message) => {
                    debug!(input = %line, "Invalid slash command");
                    println!("{}", red(message.trim_end()));
                    true
                }
            };
        }

        self.chat(line).await;
        true
    }

    /// チャット入力を 1 サイクル実行し、結果を表示する。
    async fn chat(&mut self, text: &str) {
        // 前のサイクルの Happy → Idle を待ってから投げる
        self.controller.wait_idle().await;

        let spinner = CycleSpinner::start(self.controller.subscribe());
        let outcome = self.controller.submit(text).await;
        spinner.finish();

        self.show_outcome(outcome);
    }

    /// 台本どおりのデモを再生する。終わったらプレビュータブに切り替える。
    pub(super) async fn play_demo(&mut self) {
        self.controller.wait_idle().await;

        let spinner = CycleSpinner::start(self.controller.subscribe());
        let outcome = self.controller.start_demo().await;
        spinner.finish();

        if matches!(outcome, TriggerOutcome::Completed { .. }) {
            // デモはログを空にしてから始まるので、ログ全体がデモの会話になる
            for message in self.controller.snapshot().messages.iter() {
                render_message(message);
            }
            self.prompt.set_tab(ActiveTab::Preview);
            self.show_artifact();
            print_happy();
        } else {
            self.show_outcome(outcome);
        }
    }

    fn show_outcome(&self, outcome: TriggerOutcome) {
        match outcome {
            TriggerOutcome::Completed { kind, reply } => {
                info!(kind = ?kind, "Cycle completed");
                render_message(&reply);
                if kind != TriggerKind::Directed {
                    self.show_artifact();
                }
                print_happy();
            }
            TriggerOutcome::Rejected => {
                companion_talk(CompanionState::Working, "我还在忙上一件事，稍等一下哦~");
            }
            TriggerOutcome::Ignored => {}
        }
    }

    /// 現在のタブに応じて生成物を見せる。
    pub(super) fn show_artifact(&self) {
        let Some(artifact) = self.controller.snapshot().artifact else {
            return;
        };

        match self.prompt.tab() {
            ActiveTab::Code => {
                println!();
                println!("{artifact}");
                println!();
            }
            ActiveTab::Preview => {
                let path = self.default_preview_path();
                match self.write_preview(&artifact, &path) {
                    Ok(()) => companion_notice(&format!("预览已更新：{}", path.display())),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to write preview");
                        println!("{}", red(&format!("预览写入失败：{e:#}")));
                    }
                }
            }
            ActiveTab::Humor => {
                println!("{}", dim("页面已生成，输入 /code 查看或 /tab preview 预览。"));
            }
        }
    }
}
