//! 入力補完 — Tab キーでスラッシュコマンド・メンション・引数を補完
//!
//! - 先頭トークン: `/` で始まればスラッシュコマンド、`@` で始まればメンション
//! - それ以降: 直前のフラグやサブコマンドに応じた候補、またはファイルパス

use std::env;
use std::fs;

use clap::ValueEnum;
use reedline::{Completer, Span, Suggestion};

use crate::ai::{ReplyStyle, WorkplaceScenario, WorkplaceTone};
use crate::cli::prompt::ActiveTab;
use crate::humor::PhraseCategory;
use crate::shell::commands::SLASH_COMMANDS;

pub struct VibeCompleter {
    mentions: Vec<String>,
}

/// `ValueEnum` の候補名一覧
fn value_names<T: ValueEnum>() -> Vec<String> {
    T::value_variants()
        .iter()
        .filter_map(|v| v.to_possible_value())
        .map(|v| v.get_name().to_string())
        .collect()
}

fn suggestion(value: String, description: Option<String>, span: Span) -> Suggestion {
    Suggestion {
        value,
        description,
        style: None,
        extra: None,
        span,
        append_whitespace: true,
        match_indices: None,
    }
}

impl VibeCompleter {
    pub fn new(mentions: Vec<String>) -> Self {
        Self { mentions }
    }

    // ========== 補完ロジック ==========

    fn complete_first(&self, partial: &str, span: Span) -> Vec<Suggestion> {
        if partial.starts_with('/') {
            SLASH_COMMANDS
                .iter()
                .filter(|(name, _)| name.starts_with(partial))
                .map(|(name, description)| {
                    suggestion(name.to_string(), Some(description.to_string()), span)
                })
                .collect()
        } else if partial.starts_with('@') {
            self.mentions
                .iter()
                .filter(|m| m.starts_with(partial))
                .map(|m| suggestion(m.clone(), None, span))
                .collect()
        } else {
            vec![]
        }
    }

    /// コマンドと直前のトークンから決まる固定の候補
    fn argument_values(command: &str, previous: &str) -> Option<Vec<String>> {
        match previous {
            "--style" => return Some(value_names::<ReplyStyle>()),
            "--scenario" => return Some(value_names::<WorkplaceScenario>()),
            "--tone" => return Some(value_names::<WorkplaceTone>()),
            "--category" => return Some(value_names::<PhraseCategory>()),
            _ => {}
        }

        if previous != command {
            return None;
        }
        let values = match command {
            "/tab" => value_names::<ActiveTab>(),
            "/quote" => ["new", "fav", "favs", "history", "share"].map(String::from).to_vec(),
            "/phrases" => ["use", "fav", "--category", "--tag"].map(String::from).to_vec(),
            "/reply" => ["--style", "--context"].map(String::from).to_vec(),
            "/work" => ["--scenario", "--tone"].map(String::from).to_vec(),
            _ => return None,
        };
        Some(values)
    }

    /// ファイル / ディレクトリパス補完
    fn complete_path(&self, partial: &str, span: Span) -> Vec<Suggestion> {
        let (search_dir, prefix) = Self::split_path_prefix(partial);

        let entries = match fs::read_dir(&search_dir) {
            Ok(e) => e,
            Err(_) => return vec![],
        };

        let mut suggestions: Vec<Suggestion> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();

                if !name.starts_with(&prefix) {
                    return None;
                }
                // ドットファイルは入力が `.` で始まるときのみ表示
                if name.starts_with('.') && !prefix.starts_with('.') {
                    return None;
                }

                let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);

                let value = if let Some(idx) = partial.rfind('/') {
                    let dir_part = &partial[..=idx];
                    if is_dir {
                        format!("{dir_part}{name}/")
                    } else {
                        format!("{dir_part}{name}")
                    }
                } else if is_dir {
                    format!("{name}/")
                } else {
                    name
                };

                Some(Suggestion {
                    append_whitespace: !is_dir,
                    ..suggestion(value, None, span)
                })
            })
            .collect();

        suggestions.sort_by(|a, b| a.value.cmp(&b.value));
        suggestions
    }

    // ========== ヘルパー ==========

    /// 部分パス文字列を「検索ディレクトリ」と「ファイル名プレフィックス」に分割する。
    ///
    /// 例:
    /// - `"src/ma"` → (`"src/"`, `"ma"`)
    /// - `"file"` → (`"."`, `"file"`)
    /// - `"~/do"` → (`"$HOME/"`, `"do"`)
    fn split_path_prefix(partial: &str) -> (String, String) {
        if let Some(idx) = partial.rfind('/') {
            let dir_part = &partial[..=idx];
            let file_part = &partial[idx + 1..];

            let expanded = match (dir_part.strip_prefix('~'), env::var_os("HOME")) {
                (Some(rest), Some(home)) if rest.starts_with('/') => {
                    format!("{}{rest}", home.to_string_lossy())
                }
                _ => dir_part.to_string(),
            };

            (expanded, file_part.to_string())
        } else {
            (".".to_string(), partial.to_string())
        }
    }

    /// カーソルより前の文字列から、補完対象トークンの開始位置を返す。
    fn token_start(line: &str, pos: usize) -> usize {
        let before = &line[..pos];
        before.rfind(' ').map(|i| i + 1).unwrap_or(0)
    }
}

impl Completer for VibeCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let start = Self::token_start(line, pos);
        let partial = &line[start..pos];
        let span = Span::new(start, pos);

        let mut before = line[..start].split_whitespace();
        let Some(command) = before.next() else {
            return self.complete_first(partial, span);
        };
        let previous = before.last().unwrap_or(command);

        if let Some(values) = Self::argument_values(command, previous) {
            return values
                .into_iter()
                .filter(|v| v.starts_with(partial))
                .map(|v| suggestion(v, None, span))
                .collect();
        }

        match command {
            "/avatar" | "/wallpaper" if partial.starts_with('-') => {
                vec![suggestion("--clear".to_string(), None, span)]
            }
            "/avatar" | "/preview" => self.complete_path(partial, span),
            _ => vec![],
        }
    }
}
