//! 伙伴の状態とセッション中の会話ログ

use std::sync::Arc;

use nu_ansi_term::Color;

/// 伙伴のライフサイクル状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompanionState {
    #[default]
    Idle,
    Thinking,
    Working,
    Happy,
}

/// 状態ごとの表示情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateDisplay {
    pub caption: &'static str,
    pub face: &'static str,
    pub color: Color,
}

impl CompanionState {
    #[cfg(test)]
    pub const ALL: [CompanionState; 4] = [
        CompanionState::Idle,
        CompanionState::Thinking,
        CompanionState::Working,
        CompanionState::Happy,
    ];

    pub fn display(self) -> StateDisplay {
        match self {
            CompanionState::Idle => StateDisplay {
                caption: "等待指令中...",
                face: "(･ω･)",
                color: Color::DarkGray,
            },
            CompanionState::Thinking => StateDisplay {
                caption: "脑筋转转转...",
                face: "(・_・?)",
                color: Color::Cyan,
            },
            CompanionState::Working => StateDisplay {
                caption: "代码精灵正在变身！✨",
                face: "(ง •̀_•́)ง",
                color: Color::Yellow,
            },
            CompanionState::Happy => StateDisplay {
                caption: "锵锵~ 完成！🎉",
                face: "(ﾉ◕ヮ◕)ﾉ*:･ﾟ✧",
                color: Color::Green,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompanionState::Idle => "idle",
            CompanionState::Thinking => "thinking",
            CompanionState::Working => "working",
            CompanionState::Happy => "happy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Bot,
    Companion,
}

/// 会話ログの 1 件。作成後は変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub author: Author,
    pub content: String,
    /// 作成時点の伙伴アバターの参照
    pub avatar: Arc<str>,
}

impl Message {
    pub fn new(author: Author, content: impl Into<String>, avatar: Arc<str>) -> Self {
        Self {
            author,
            content: content.into(),
            avatar,
        }
    }
}

/// 追記専用の会話ログ
///
/// 中身は `Arc` で共有し、スナップショットが参照している間に追記されたときだけ複製する。
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Arc<Vec<Message>>,
}

impl ConversationLog {
    pub fn push(&mut self, message: Message) {
        Arc::make_mut(&mut self.messages).push(message);
    }

    /// スナップショット用の共有参照
    pub fn shared(&self) -> Arc<Vec<Message>> {
        Arc::clone(&self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// デモ開始時にのみ使う。
    pub(crate) fn reset(&mut self) {
        self.messages = Arc::default();
    }
}

/// 表示側に公開する読み取り専用のコピー
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: CompanionState,
    pub busy: bool,
    pub messages: Arc<Vec<Message>>,
    /// 最後に生成された HTML ドキュメント
    pub artifact: Option<Arc<str>>,
    /// 現在有効なアバター（カスタムまたは既定）
    pub avatar: Arc<str>,
    pub custom_avatar: bool,
    pub wallpaper: Option<Arc<str>>,
}

impl Snapshot {
    /// 新しいトリガーを受け付けられるか
    pub fn is_settled(&self) -> bool {
        self.state == CompanionState::Idle && !self.busy
    }
}
