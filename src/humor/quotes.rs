//! 毎日の語録
//!
//! 今日の語録・履歴・お気に入りを保持し、変更のたびにストアへ書き戻す。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::ai::{DailyQuote, GenerationService};
use crate::storage::{keys, load_json, save_json, PreferenceStore};

/// 履歴に残す最大件数
pub const HISTORY_LIMIT: usize = 30;

/// 語録の日付の基準になる今日（UTC の `YYYY-MM-DD`）
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// 共有用のテキスト
pub fn share_text(quote: &DailyQuote) -> String {
    format!("{}\n\n— 来自情商助手的每日语录", quote.content)
}

pub struct QuoteBook {
    store: Arc<dyn PreferenceStore>,
    current: Option<DailyQuote>,
    history: Vec<DailyQuote>,
    favorites: Vec<String>,
}

impl QuoteBook {
    /// ストアから読み込む。保存済みの語録が `today` のものでなければ破棄する。
    pub fn load(store: Arc<dyn PreferenceStore>, today: &str) -> Self {
        let current = load_json::<DailyQuote>(store.as_ref(), keys::DAILY_QUOTE)
            .filter(|quote| quote.date == today);
        let history: Vec<DailyQuote> =
            load_json(store.as_ref(), keys::QUOTE_HISTORY).unwrap_or_default();
        let favorites: Vec<String> =
            load_json(store.as_ref(), keys::QUOTE_FAVORITES).unwrap_or_default();

        debug!(
            has_today = current.is_some(),
            history = history.len(),
            favorites = favorites.len(),
            "Quote book loaded"
        );

        Self {
            store,
            current,
            history,
            favorites,
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&DailyQuote> {
        self.current.as_ref()
    }

    /// 新しい順
    pub fn history(&self) -> &[DailyQuote] {
        &self.history
    }

    /// 今日の語録がまだなければ生成する。
    pub async fn ensure_today(&mut self, service: &dyn GenerationService) -> DailyQuote {
        if let Some(quote) = &self.current {
            return quote.clone();
        }
        self.refresh(service).await
    }

    /// 常に新しい語録を生成する。
    pub async fn refresh(&mut self, service: &dyn GenerationService) -> DailyQuote {
        let quote = service.generate_daily_quote().await;
        self.accept(quote.clone());
        quote
    }

    /// 語録を今日のものとして採用し、履歴の先頭に入れる。同じ日付の古いものは置き換える。
    pub fn accept(&mut self, quote: DailyQuote) {
        self.history.retain(|q| q.date != quote.date);
        self.history.insert(0, quote.clone());
        self.history.truncate(HISTORY_LIMIT);

        info!(id = %quote.id, date = %quote.date, history = self.history.len(), "Daily quote updated");

        save_json(self.store.as_ref(), keys::DAILY_QUOTE, &quote);
        save_json(self.store.as_ref(), keys::QUOTE_HISTORY, &self.history);
        self.current = Some(quote);
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|f| f == id)
    }

    /// お気に入りを切り替え、切り替え後に登録されているかを返す。
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let now_favorite = if self.is_favorite(id) {
            self.favorites.retain(|f| f != id);
            false
        } else {
            self.favorites.push(id.to_string());
            true
        };
        save_json(self.store.as_ref(), keys::QUOTE_FAVORITES, &self.favorites);
        now_favorite
    }

    /// お気に入り登録された語録（履歴に残っているもののみ）
    pub fn favorite_quotes(&self) -> Vec<&DailyQuote> {
        self.history
            .iter()
            .filter(|q| self.is_favorite(&q.id))
            .collect()
    }
}
