//! 話術ライブラリ

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::debug;

use crate::storage::{keys, load_json, save_json, PreferenceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhraseCategory {
    /// 赞美型
    Praise,
    /// 打圆场
    Smooth,
    /// 自黑型
    SelfDeprecating,
    /// 委婉拒绝
    Decline,
    /// 幽默化解
    Defuse,
}

impl PhraseCategory {
    pub fn label(self) -> &'static str {
        match self {
            PhraseCategory::Praise => "赞美型",
            PhraseCategory::Smooth => "打圆场",
            PhraseCategory::SelfDeprecating => "自黑型",
            PhraseCategory::Decline => "委婉拒绝",
            PhraseCategory::Defuse => "幽默化解",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub id: &'static str,
    pub category: PhraseCategory,
    pub content: &'static str,
    pub tags: &'static [&'static str],
}

const BUILTIN_PHRASES: [Phrase; 8] = [
    Phrase {
        id: "1",
        category: PhraseCategory::Praise,
        content: "你说得比KPI还动听。",
        tags: &["职场", "赞美"],
    },
    Phrase {
        id: "2",
        category: PhraseCategory::Smooth,
        content: "哈哈，这话题我们下次喝茶时再聊。",
        tags: &["社交", "转移话题"],
    },
    Phrase {
        id: "3",
        category: PhraseCategory::SelfDeprecating,
        content: "别说了，我的bug比你的发量还多。",
        tags: &["程序员", "自嘲"],
    },
    Phrase {
        id: "4",
        category: PhraseCategory::Praise,
        content: "您这想法，比我的代码还优雅。",
        tags: &["技术", "赞美"],
    },
    Phrase {
        id: "5",
        category: PhraseCategory::Smooth,
        content: "这个问题很有深度，值得我们深入探讨。",
        tags: &["会议", "缓解"],
    },
    Phrase {
        id: "6",
        category: PhraseCategory::Decline,
        content: "这个想法很棒，不过我们先把手头的事情搞定吧。",
        tags: &["拒绝", "委婉"],
    },
    Phrase {
        id: "7",
        category: PhraseCategory::Defuse,
        content: "没事，我们都是在学习的路上，只是有人走得快，有人走得慢。",
        tags: &["安慰", "幽默"],
    },
    Phrase {
        id: "8",
        category: PhraseCategory::SelfDeprecating,
        content: "我这人就是这样，智商不够，情商来凑。",
        tags: &["自嘲", "谦虚"],
    },
];

/// 絞り込み条件。指定されたものはすべて AND で効く。
#[derive(Debug, Clone, Default)]
pub struct PhraseFilter {
    pub category: Option<PhraseCategory>,
    pub tag: Option<String>,
    /// 内容・分類・タグに対する大文字小文字を区別しない部分一致
    pub query: Option<String>,
}

impl PhraseFilter {
    pub fn matches(&self, phrase: &Phrase) -> bool {
        if self.category.is_some_and(|c| c != phrase.category) {
            return false;
        }

        if let Some(tag) = self.tag.as_deref().filter(|t| !t.is_empty()) {
            if !phrase.tags.contains(&tag) {
                return false;
            }
        }

        // 空文字列だけが「検索なし」。空白もそのまま部分一致させる
        match self.query.as_deref().filter(|q| !q.is_empty()) {
            None => true,
            Some(query) => {
                let query = query.to_lowercase();
                phrase.content.to_lowercase().contains(&query)
                    || phrase.category.label().to_lowercase().contains(&query)
                    || phrase
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
            }
        }
    }
}

pub struct PhraseLibrary {
    store: Arc<dyn PreferenceStore>,
    phrases: Vec<Phrase>,
    usage: BTreeMap<String, u32>,
    favorites: Vec<String>,
}

impl PhraseLibrary {
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let usage: BTreeMap<String, u32> =
            load_json(store.as_ref(), keys::PHRASE_USAGE).unwrap_or_default();
        let favorites: Vec<String> =
            load_json(store.as_ref(), keys::PHRASE_FAVORITES).unwrap_or_default();

        debug!(
            used = usage.values().filter(|&&n| n > 0).count(),
            favorites = favorites.len(),
            "Phrase library loaded"
        );

        Self {
            store,
            phrases: BUILTIN_PHRASES.to_vec(),
            usage,
            favorites,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Phrase> {
        self.phrases.iter().find(|p| p.id == id)
    }

    pub fn filter(&self, filter: &PhraseFilter) -> Vec<&Phrase> {
        self.phrases.iter().filter(|p| filter.matches(p)).collect()
    }

    pub fn usage(&self, id: &str) -> u32 {
        self.usage.get(id).copied().unwrap_or(0)
    }

    /// 使用回数を 1 増やす。未知の id なら `None`。
    pub fn record_use(&mut self, id: &str) -> Option<Phrase> {
        let phrase = self.get(id)?.clone();
        *self.usage.entry(id.to_string()).or_insert(0) += 1;
        save_json(self.store.as_ref(), keys::PHRASE_USAGE, &self.usage);
        Some(phrase)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|f| f == id)
    }

    /// 切り替え後にお気に入りかどうか。未知の id なら `None`。
    pub fn toggle_favorite(&mut self, id: &str) -> Option<bool> {
        self.get(id)?;
        let now_favorite = if self.is_favorite(id) {
            self.favorites.retain(|f| f != id);
            false
        } else {
            self.favorites.push(id.to_string());
            true
        };
        save_json(self.store.as_ref(), keys::PHRASE_FAVORITES, &self.favorites);
        Some(now_favorite)
    }

    /// 全タグ（初出順、重複なし）
    pub fn all_tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = Vec::new();
        for tag in self.phrases.iter().flat_map(|p| p.tags.iter().copied()) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// よく使う話術（使用回数の多い順に最大 `limit` 件、未使用は除く）
    pub fn most_used(&self, limit: usize) -> Vec<(&Phrase, u32)> {
        let mut used: Vec<(&Phrase, u32)> = self
            .phrases
            .iter()
            .map(|p| (p, self.usage(p.id)))
            .filter(|(_, n)| *n > 0)
            .collect();
        used.sort_by(|a, b| b.1.cmp(&a.1));
        used.truncate(limit);
        used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryPreferences;

    fn library() -> (Arc<MemoryPreferences>, PhraseLibrary) {
        let store = Arc::new(MemoryPreferences::default());
        let library = PhraseLibrary::load(store.clone());
        (store, library)
    }

    fn ids(phrases: Vec<&Phrase>) -> Vec<&'static str> {
        phrases.into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn builtin_library_has_eight_phrases() {
        let (_, library) = library();
        let all = ids(library.filter(&PhraseFilter::default()));
        assert_eq!(all, vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
    }

    #[test]
    fn filters_combine_with_and() {
        let (_, library) = library();

        let praise = PhraseFilter {
            category: Some(PhraseCategory::Praise),
            ..PhraseFilter::default()
        };
        assert_eq!(ids(library.filter(&praise)), vec!["1", "4"]);

        let self_mock = PhraseFilter {
            tag: Some("自嘲".to_string()),
            ..PhraseFilter::default()
        };
        assert_eq!(ids(library.filter(&self_mock)), vec!["3", "8"]);

        let combined = PhraseFilter {
            category: Some(PhraseCategory::SelfDeprecating),
            tag: Some("谦虚".to_string()),
            query: Some("情商".to_string()),
        };
        assert_eq!(ids(library.filter(&combined)), vec!["8"]);

        let nothing = PhraseFilter {
            category: Some(PhraseCategory::Praise),
            tag: Some("自嘲".to_string()),
            query: None,
        };
        assert!(library.filter(&nothing).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_content_category_and_tags() {
        let (_, library) = library();

        let by_content = PhraseFilter {
            query: Some("kpi".to_string()),
            ..PhraseFilter::default()
        };
        assert_eq!(ids(library.filter(&by_content)), vec!["1"]);

        let by_category = PhraseFilter {
            query: Some("打圆场".to_string()),
            ..PhraseFilter::default()
        };
        assert_eq!(ids(library.filter(&by_category)), vec!["2", "5"]);

        let by_tag = PhraseFilter {
            query: Some("程序员".to_string()),
            ..PhraseFilter::default()
        };
        assert_eq!(ids(library.filter(&by_tag)), vec!["3"]);

        let empty = PhraseFilter {
            query: Some(String::new()),
            ..PhraseFilter::default()
        };
        assert_eq!(library.filter(&empty).len(), 8);

        let blank = PhraseFilter {
            query: Some("  ".to_string()),
            ..PhraseFilter::default()
        };
        assert!(library.filter(&blank).is_empty());
    }

    #[test]
    fn usage_counts_persist() {
        let (store, mut library) = library();
        library.record_use("3");
        library.record_use("3");
        library.record_use("5");
        assert!(library.record_use("99").is_none());

        let reloaded = PhraseLibrary::load(store);
        assert_eq!(reloaded.usage("3"), 2);
        assert_eq!(reloaded.usage("5"), 1);
        assert_eq!(reloaded.usage("1"), 0);

        let top: Vec<(&str, u32)> = reloaded
            .most_used(3)
            .into_iter()
            .map(|(p, n)| (p.id, n))
            .collect();
        assert_eq!(top, vec![("3", 2), ("5", 1)]);
    }

    #[test]
    fn favorites_toggle_and_persist() {
        let (store, mut library) = library();
        assert_eq!(library.toggle_favorite("2"), Some(true));
        assert_eq!(library.toggle_favorite("6"), Some(true));
        assert_eq!(library.toggle_favorite("2"), Some(false));
        assert_eq!(library.toggle_favorite("nope"), None);

        let reloaded = PhraseLibrary::load(store);
        assert!(reloaded.is_favorite("6"));
        assert!(!reloaded.is_favorite("2"));
    }

    #[test]
    fn all_tags_keep_first_seen_order() {
        let (_, library) = library();
        let tags = library.all_tags();
        assert_eq!(&tags[..4], &["职场", "赞美", "社交", "转移话题"]);
        assert_eq!(tags.iter().filter(|t| **t == "赞美").count(), 1);
        assert_eq!(tags.len(), 14);
    }
}
