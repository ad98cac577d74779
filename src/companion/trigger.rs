//! 入力行をトリガーに分類する

/// 受け付けたトリガーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// コード生成
    Plain,
    /// 伙伴宛てのおしゃべり
    Directed,
    /// 台本どおりのデモ
    Demo,
}

/// チャット入力の解釈結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput<'a> {
    /// サービスに渡すプロンプトはトリム済みの入力
    Plain(&'a str),
    /// メンションを取り除いてトリムした残り（空のこともある）
    Directed(&'a str),
}

/// 入力を分類する。空白だけの入力は `None`。
pub fn parse_chat<'a>(text: &'a str, mentions: &[String]) -> Option<ChatInput<'a>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    for mention in mentions.iter().filter(|m| !m.is_empty()) {
        if let Some(rest) = trimmed.strip_prefix(mention.as_str()) {
            return Some(ChatInput::Directed(rest.trim()));
        }
    }

    Some(ChatInput::Plain(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentions() -> Vec<String> {
        vec!["@companion".to_string(), "@AI伙伴".to_string()]
    }

    #[test]
    fn whitespace_only_is_ignored() {
        assert_eq!(parse_chat("", &mentions()), None);
        assert_eq!(parse_chat("   \t\n", &mentions()), None);
    }

    #[test]
    fn plain_text_is_code_generation() {
        assert_eq!(
            parse_chat("  写一个计数器 ", &mentions()),
            Some(ChatInput::Plain("写一个计数器"))
        );
    }

    #[test]
    fn mention_prefix_is_stripped() {
        assert_eq!(
            parse_chat("@companion 你好", &mentions()),
            Some(ChatInput::Directed("你好"))
        );
        assert_eq!(
            parse_chat("  @AI伙伴   今天天气怎么样 ", &mentions()),
            Some(ChatInput::Directed("今天天气怎么样"))
        );
    }

    #[test]
    fn bare_mention_is_an_empty_directed_prompt() {
        assert_eq!(
            parse_chat("@companion", &mentions()),
            Some(ChatInput::Directed(""))
        );
    }

    #[test]
    fn mention_must_be_a_prefix() {
        assert_eq!(
            parse_chat("hello @companion", &mentions()),
            Some(ChatInput::Plain("hello @companion"))
        );
    }

    #[test]
    fn empty_mention_list_means_everything_is_plain() {
        assert_eq!(
            parse_chat("@companion hi", &[]),
            Some(ChatInput::Plain("@companion hi"))
        );
    }
}
