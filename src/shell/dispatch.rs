//! スラッシュコマンドの実行

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::ai::{ReplySuggestions, SmartReplyRequest, WorkplaceReplyRequest};
use crate::cli::color::{bold_cyan, cyan, dim, green, red, white, yellow};
use crate::cli::companion::{companion_notice, companion_talk, print_suggestions, task_spinner};
use crate::cli::humor::{print_phrase, print_quote, print_quote_line};
use crate::cli::prompt::ActiveTab;
use crate::companion::avatar::{data_url_from_file, describe};
use crate::companion::{CompanionState, WallpaperOutcome};
use crate::humor::{share_text, PhraseLibrary};

use super::commands::{PhraseAction, PhraseSearch, QuoteAction, SlashCommand, SLASH_COMMANDS};
use super::Shell;

impl Shell {
    /// スラッシュコマンドを実行する。
    ///
    /// 戻り値: `true` = REPL ループ続行、`false` = 終了
    pub(super) async fn run_command(&mut self, command: SlashCommand) -> bool {
        debug!(command = ?command, "Running slash command");

        match command {
            SlashCommand::Help => print_help(),
            SlashCommand::Demo => self.play_demo().await,
            SlashCommand::Code => match self.controller.snapshot().artifact {
                Some(code) => println!("\n{code}\n"),
                None => companion_talk(CompanionState::Idle, "还没有生成任何代码哦。"),
            },
            SlashCommand::Preview { path } => self.preview(path),
            SlashCommand::Tab { tab } => self.switch_tab(tab).await,
            SlashCommand::Wallpaper { clear: true, .. } => {
                self.controller.remove_wallpaper().await;
                companion_notice("壁纸已移除。");
            }
            SlashCommand::Wallpaper { prompt, .. } => self.wallpaper(&prompt.join(" ")).await,
            SlashCommand::Avatar { clear: true, .. } => {
                self.controller.clear_avatar().await;
                companion_notice("已恢复默认头像。");
            }
            SlashCommand::Avatar {
                path: Some(path), ..
            } => self.avatar(&path).await,
            SlashCommand::Avatar { path: None, .. } => self.show_avatar(),
            SlashCommand::Reply {
                style,
                context,
                text,
            } => {
                let request = SmartReplyRequest {
                    input: text.join(" "),
                    context,
                    style,
                };
                let spinner = task_spinner(&format!("正在想{}的回复...", style.label()));
                let suggestions = self.service.generate_smart_reply(&request).await;
                spinner.finish_and_clear();
                print_replies(style.label(), &suggestions);
            }
            SlashCommand::Work {
                scenario,
                tone,
                text,
            } => {
                let request = WorkplaceReplyRequest {
                    input: text.join(" "),
                    scenario,
                    tone,
                };
                let spinner = task_spinner(&format!("正在斟酌{}...", scenario.label()));
                let suggestions = self.service.generate_workplace_reply(&request).await;
                spinner.finish_and_clear();
                print_replies(&format!("{} · {}", scenario.label(), tone.label()), &suggestions);
            }
            SlashCommand::Quote { action } => self.quote(action).await,
            SlashCommand::Phrases { action, search } => self.phrases(action, &search),
            SlashCommand::Exit => {
                info!("Exit command received");
                return false;
            }
        }
        true
    }

    pub(super) fn default_preview_path(&self) -> PathBuf {
        self.data_dir.join("preview.html")
    }

    pub(super) fn write_preview(&self, artifact: &str, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, artifact)
            .with_context(|| format!("failed to write preview: {}", path.display()))?;
        debug!(path = %path.display(), bytes = artifact.len(), "Preview written");
        Ok(())
    }

    fn preview(&self, path: Option<PathBuf>) {
        let Some(artifact) = self.controller.snapshot().artifact else {
            companion_talk(CompanionState::Idle, "还没有可以预览的页面哦。");
            return;
        };
        let path = path.unwrap_or_else(|| self.default_preview_path());
        match self.write_preview(&artifact, &path) {
            Ok(()) => companion_notice(&format!("预览已写入：{}", path.display())),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write preview");
                println!("{}", red(&format!("预览写入失败：{e:#}")));
            }
        }
    }

    async fn switch_tab(&mut self, tab: ActiveTab) {
        self.prompt.set_tab(tab);
        companion_notice(&format!("已切换到「{}」", tab.label()));

        match tab {
            ActiveTab::Humor => {
                let quote = self.quotes.ensure_today(self.service.as_ref()).await;
                print_quote(&quote, self.quotes.is_favorite(&quote.id));
                println!("{}", dim("试试 /reply、/work、/quote 或 /phrases。"));
            }
            ActiveTab::Code | ActiveTab::Preview => self.show_artifact(),
        }
    }

    async fn wallpaper(&self, prompt: &str) {
        let spinner = task_spinner("正在绘制壁纸...");
        let outcome = self.controller.generate_wallpaper(prompt).await;
        spinner.finish_and_clear();

        match outcome {
            WallpaperOutcome::Generated => {
                companion_talk(CompanionState::Happy, "壁纸已生成并保存啦！");
            }
            WallpaperOutcome::Failed(message) => {
                println!("{}", red(&format!("抱歉，壁纸生成失败了：{message}")));
            }
            WallpaperOutcome::Busy => {
                companion_talk(CompanionState::Working, "上一张壁纸还在画，稍等一下~");
            }
            WallpaperOutcome::Ignored => {
                println!("{}", dim("用法：/wallpaper <描述> 或 /wallpaper --clear"));
            }
        }
    }

    async fn avatar(&self, path: &Path) {
        match data_url_from_file(path) {
            Ok(image) => {
                self.controller.set_avatar(image).await;
                companion_talk(CompanionState::Happy, "新头像好看吗？");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load avatar");
                println!("{}", red(&format!("无法使用这个图片：{e:#}")));
            }
        }
    }

    fn show_avatar(&self) {
        let snapshot = self.controller.snapshot();
        let (mime, bytes) = describe(&snapshot.avatar);
        let kind = if snapshot.custom_avatar {
            "自定义头像"
        } else {
            "默认头像"
        };
        companion_notice(&format!(
            "当前使用{kind}（{}，约 {} KB）",
            mime.unwrap_or("未知格式"),
            bytes.div_ceil(1024)
        ));
        if !snapshot.custom_avatar {
            println!("{}", dim("用 /avatar <图片文件> 换一个吧。"));
        }
    }

    async fn quote(&mut self, action: Option<QuoteAction>) {
        match action {
            None => {
                let quote = self.quotes.ensure_today(self.service.as_ref()).await;
                print_quote(&quote, self.quotes.is_favorite(&quote.id));
            }
            Some(QuoteAction::New) => {
                let spinner = task_spinner("正在想新的语录...");
                let quote = self.quotes.refresh(self.service.as_ref()).await;
                spinner.finish_and_clear();
                print_quote(&quote, self.quotes.is_favorite(&quote.id));
            }
            Some(QuoteAction::Fav { id }) => {
                let id = match id {
                    Some(id) => id,
                    None => self.quotes.ensure_today(self.service.as_ref()).await.id,
                };
                if self.quotes.toggle_favorite(&id) {
                    companion_notice(&format!("已收藏语录 {id}"));
                } else {
                    companion_notice(&format!("已取消收藏语录 {id}"));
                }
            }
            Some(QuoteAction::Favs) => {
                let favorites = self.quotes.favorite_quotes();
                if favorites.is_empty() {
                    companion_talk(CompanionState::Idle, "还没有收藏的语录。");
                }
                for quote in favorites {
                    print_quote_line(quote, true);
                }
            }
            Some(QuoteAction::History) => {
                if self.quotes.history().is_empty() {
                    companion_talk(CompanionState::Idle, "还没有历史语录。");
                }
                for quote in self.quotes.history() {
                    print_quote_line(quote, self.quotes.is_favorite(&quote.id));
                }
            }
            Some(QuoteAction::Share) => {
                let quote = self.quotes.ensure_today(self.service.as_ref()).await;
                println!("\n{}\n", white(&share_text(&quote)));
            }
        }
    }

    fn phrases(&mut self, action: Option<PhraseAction>, search: &PhraseSearch) {
        match action {
            None => list_phrases(&self.phrases, search),
            Some(PhraseAction::Use { id }) => match self.phrases.record_use(&id) {
                Some(phrase) => {
                    println!("\n{}\n", white(phrase.content));
                    println!("{}", dim(&format!("已使用 {} 次", self.phrases.usage(&id))));
                }
                None => println!("{}", red(&format!("没有编号为 {id} 的话术"))),
            },
            Some(PhraseAction::Fav { id }) => match self.phrases.toggle_favorite(&id) {
                Some(true) => companion_notice(&format!("已收藏话术 {id}")),
                Some(false) => companion_notice(&format!("已取消收藏话术 {id}")),
                None => println!("{}", red(&format!("没有编号为 {id} 的话术"))),
            },
        }
    }
}

fn print_help() {
    println!();
    for (name, description) in SLASH_COMMANDS {
        println!("  {} {}", bold_cyan(&format!("{name:<12}")), white(description));
    }
    println!();
    println!(
        "  {}",
        dim("直接输入描述即可生成页面；以 @companion 或 @AI伙伴 开头可以和伙伴聊天。")
    );
    println!();
}

fn print_replies(label: &str, suggestions: &ReplySuggestions) {
    println!("{}", yellow(&format!("💬 {label}")));
    print_suggestions(suggestions);
}

fn list_phrases(library: &PhraseLibrary, search: &PhraseSearch) {
    let filter = search.to_filter();
    let found = library.filter(&filter);

    if found.is_empty() {
        companion_talk(CompanionState::Idle, "没有找到匹配的话术。");
    } else {
        for phrase in &found {
            print_phrase(phrase, library.usage(phrase.id), library.is_favorite(phrase.id));
        }
        println!("{}", dim(&format!("共 {} 条", found.len())));
    }

    let most_used = library.most_used(3);
    if !most_used.is_empty() {
        let top: Vec<String> = most_used
            .iter()
            .map(|(p, n)| format!("[{}]×{n}", p.id))
            .collect();
        println!("{} {}", green("常用："), cyan(&top.join(" ")));
    }
    if search.category.is_none() && search.tag.is_none() && search.query.is_empty() {
        println!("{} {}", green("标签："), dim(&library.all_tags().join(" ")));
    }
}
