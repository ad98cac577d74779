use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

/// Vibe 用のハイライター
///
/// - スラッシュコマンド (`/reply` など): Magenta + Bold
/// - オプションフラグ (`--style`): Blue
/// - 文字列リテラル (`"..."`, `'...'`): Yellow
/// - 閉じられていないクオート: Red (警告)
/// - コマンドの引数: White
/// - 先頭のメンション (`@companion`): Cyan + Bold、残りはプレーン
///
/// 普通のチャット入力にはハイライトを適用しない。
pub struct VibeHighlighter {
    mentions: Vec<String>,
}

impl VibeHighlighter {
    pub fn new(mentions: Vec<String>) -> Self {
        Self { mentions }
    }

    fn highlight_mention(&self, line: &str) -> Option<StyledText> {
        let body = line.trim_start();
        let lead = &line[..line.len() - body.len()];
        let mention = self.mentions.iter().find(|m| body.starts_with(m.as_str()))?;

        let mut styled = StyledText::new();
        if !lead.is_empty() {
            styled.push((Style::default(), lead.to_string()));
        }
        styled.push((Style::new().fg(Color::Cyan).bold(), mention.clone()));
        let rest = &body[mention.len()..];
        if !rest.is_empty() {
            styled.push((Style::default(), rest.to_string()));
        }
        Some(styled)
    }
}

impl Highlighter for VibeHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        if !line.trim_start().starts_with('/') {
            return self.highlight_mention(line).unwrap_or_else(|| {
                let mut styled = StyledText::new();
                styled.push((Style::default(), line.to_string()));
                styled
            });
        }

        let mut styled = StyledText::new();
        let mut current_word = String::new();
        let mut is_command = true;
        let mut in_quote = None;

        for c in line.chars() {
            if let Some(quote) = in_quote {
                current_word.push(c);
                if c == quote {
                    styled.push((Style::new().fg(Color::Yellow), current_word.clone()));
                    current_word.clear();
                    in_quote = None;
                }
            } else if c == '"' || c == '\'' {
                if !current_word.is_empty() {
                    style_word(&mut styled, &current_word, &mut is_command);
                    current_word.clear();
                }
                current_word.push(c);
                in_quote = Some(c);
            } else if c.is_whitespace() {
                if !current_word.is_empty() {
                    style_word(&mut styled, &current_word, &mut is_command);
                    current_word.clear();
                }
                styled.push((Style::default(), c.to_string()));
            } else {
                current_word.push(c);
            }
        }

        if !current_word.is_empty() {
            if in_quote.is_some() {
                styled.push((Style::new().fg(Color::Red).bold(), current_word));
            } else {
                style_word(&mut styled, &current_word, &mut is_command);
            }
        }

        styled
    }
}

/// 単語の種類に応じてスタイルを適用して StyledText に追加するヘルパー
fn style_word(styled: &mut StyledText, word: &str, is_command: &mut bool) {
    let style = if *is_command {
        *is_command = false;
        Style::new().fg(Color::Magenta).bold()
    } else if word.starts_with('-') {
        Style::new().fg(Color::Blue)
    } else {
        Style::new().fg(Color::LightGray)
    };

    styled.push((style, word.to_string()));
}
