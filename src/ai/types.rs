//! AI モジュールの公開型定義

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// コード生成の結果
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationResult {
    /// ユーザー向けの短い説明
    pub explanation: String,
    /// 単体で動く HTML ドキュメント全体
    pub code: String,
}

/// 高情商リプライの口調
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReplyStyle {
    #[default]
    Humorous,
    Witty,
    Diplomatic,
}

impl ReplyStyle {
    pub fn label(self) -> &'static str {
        match self {
            ReplyStyle::Humorous => "幽默风趣",
            ReplyStyle::Witty => "机智巧妙",
            ReplyStyle::Diplomatic => "外交得体",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SmartReplyRequest {
    pub input: String,
    pub context: Option<String>,
    pub style: ReplyStyle,
}

/// 職場リプライの場面
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum WorkplaceScenario {
    #[default]
    Meeting,
    Deadline,
    Feedback,
    Request,
}

impl WorkplaceScenario {
    pub fn label(self) -> &'static str {
        match self {
            WorkplaceScenario::Meeting => "会议场景",
            WorkplaceScenario::Deadline => "截止日期压力",
            WorkplaceScenario::Feedback => "接受反馈",
            WorkplaceScenario::Request => "处理请求",
        }
    }
}

/// 職場リプライのトーン
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum WorkplaceTone {
    #[default]
    Diplomatic,
    Humorous,
    Professional,
}

impl WorkplaceTone {
    pub fn label(self) -> &'static str {
        match self {
            WorkplaceTone::Diplomatic => "外交得体",
            WorkplaceTone::Humorous => "幽默化解",
            WorkplaceTone::Professional => "专业严谨",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkplaceReplyRequest {
    pub input: String,
    pub scenario: WorkplaceScenario,
    pub tone: WorkplaceTone,
}

/// リプライ候補。`success == false` はフォールバックであることを示す。
#[derive(Debug, Clone, PartialEq)]
pub struct ReplySuggestions {
    pub success: bool,
    pub responses: Vec<String>,
    /// 0.0..=1.0
    pub confidence: f64,
}

/// 毎日の語録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuote {
    /// 生成時刻のエポックミリ秒
    pub id: String,
    pub content: String,
    pub category: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

/// モデルが返すリプライ JSON
#[derive(Debug, Deserialize)]
pub(crate) struct RepliesPayload {
    pub responses: Vec<String>,
    pub confidence: f64,
}

/// モデルが返す語録 JSON
#[derive(Debug, Deserialize)]
pub(crate) struct QuotePayload {
    pub content: String,
    pub category: String,
}
