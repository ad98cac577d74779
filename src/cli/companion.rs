use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::color::{bold_cyan, cyan, dim, green, paint, white, yellow};
use crate::ai::ReplySuggestions;
use crate::companion::{Author, CompanionState, Message, Snapshot};

/// 伙伴が発話するときに使う共通関数。
/// 先頭に状態の顔文字を付与し、白色テキストで表示する。
pub fn companion_talk(state: CompanionState, message: &str) {
    let display = state.display();
    println!("{} {}", paint(display.color, display.face), white(message));
}

/// コマンドの結果など、伙伴の台詞ではないお知らせ。
pub fn companion_notice(message: &str) {
    println!("👉 {message}");
}

/// 状態の顔文字とキャプションを 1 行にまとめる。
pub fn state_line(state: CompanionState) -> String {
    let display = state.display();
    format!(
        "{} {}",
        paint(display.color, display.face),
        paint(display.color, display.caption)
    )
}

/// 伙伴のサイクルを伴わない処理（リプライ生成など）のスピナー。
/// 呼び出し元で `finish_and_clear()` を呼んでスピナーを停止すること。
pub fn task_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("🤖 {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// サイクル中に表示するスピナー。
/// 状態が変わるたびにメッセージを差し替える。
pub struct CycleSpinner {
    bar: ProgressBar,
    follower: JoinHandle<()>,
}

impl CycleSpinner {
    /// スピナーを開始し、スナップショットの変化を追いかけるタスクを起動する。
    pub fn start(mut snapshots: watch::Receiver<Snapshot>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(state_line(snapshots.borrow().state));
        bar.enable_steady_tick(Duration::from_millis(80));

        let follower = {
            let bar = bar.clone();
            tokio::spawn(async move {
                while snapshots.changed().await.is_ok() {
                    let state = snapshots.borrow_and_update().state;
                    bar.set_message(state_line(state));
                }
            })
        };

        Self { bar, follower }
    }

    /// スピナーを止めて行を消す。
    pub fn finish(self) {
        self.follower.abort();
        self.bar.finish_and_clear();
    }
}

/// 会話ログの 1 件を表示する。
pub fn render_message(message: &Message) {
    match message.author {
        Author::User => println!("{} {}", bold_cyan("🧑 你 ❯"), message.content),
        Author::Bot => println!("{} {}", yellow("🤖"), white(&message.content)),
        Author::Companion => companion_talk(CompanionState::Happy, &message.content),
    }
}

/// リプライ候補を番号付きで表示する。
pub fn print_suggestions(suggestions: &ReplySuggestions) {
    for (i, response) in suggestions.responses.iter().enumerate() {
        println!("  {} {}", cyan(&format!("{}.", i + 1)), white(response));
    }
    if suggestions.success {
        println!(
            "  {}",
            dim(&format!("置信度 {:.0}%", suggestions.confidence * 100.0))
        );
    } else {
        println!("  {}", dim("(离线或生成失败，显示的是备用回复)"));
    }
}

/// Happy に入ったときの完了行。
pub fn print_happy() {
    let display = CompanionState::Happy.display();
    println!("{} {}", paint(display.color, display.face), green(display.caption));
}
