//! 情商助手
//!
//! 毎日の語録と話術ライブラリ。リプライ生成そのものは `ai` モジュールが担う。

mod phrases;
mod quotes;

pub use phrases::{Phrase, PhraseCategory, PhraseFilter, PhraseLibrary};
pub use quotes::{share_text, today, QuoteBook};
