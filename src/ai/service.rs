use anyhow::Result;
use async_trait::async_trait;

use super::types::{
    DailyQuote, GenerationResult, ReplySuggestions, SmartReplyRequest, WorkplaceReplyRequest,
};

/// 生成 AI サービスの契約。
///
/// 壁紙以外の操作は失敗しない。外部呼び出しの失敗は実装側でフォールバック値に変換する。
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_code(&self, prompt: &str) -> GenerationResult;

    async fn chat_with_companion(&self, prompt: &str) -> String;

    /// 画像の参照（data URL または URL）を返す。
    async fn generate_wallpaper(&self, prompt: &str) -> Result<String>;

    async fn generate_smart_reply(&self, request: &SmartReplyRequest) -> ReplySuggestions;

    async fn generate_workplace_reply(&self, request: &WorkplaceReplyRequest) -> ReplySuggestions;

    async fn generate_daily_quote(&self) -> DailyQuote;
}
