//! 情商助手の表示

use super::color::{bold_yellow, cyan, dim, white, yellow};
use crate::ai::DailyQuote;
use crate::humor::Phrase;

fn star(favorite: bool) -> &'static str {
    if favorite {
        "★"
    } else {
        "☆"
    }
}

pub fn print_quote(quote: &DailyQuote, favorite: bool) {
    println!(
        "{} {} {}",
        bold_yellow("💡 每日语录"),
        dim(&format!("{} · {}", quote.date, quote.category)),
        yellow(star(favorite))
    );
    println!("   {}", white(&quote.content));
    println!("   {}", dim(&format!("id: {}", quote.id)));
}

/// 履歴の 1 行表示
pub fn print_quote_line(quote: &DailyQuote, favorite: bool) {
    println!(
        "  {} {} {}",
        yellow(star(favorite)),
        dim(&quote.date),
        white(&quote.content)
    );
}

pub fn print_phrase(phrase: &Phrase, usage: u32, favorite: bool) {
    let tags: Vec<String> = phrase.tags.iter().map(|t| format!("#{t}")).collect();
    println!(
        "  {} {} {} {}",
        cyan(&format!("[{}]", phrase.id)),
        yellow(star(favorite)),
        dim(phrase.category.label()),
        white(phrase.content)
    );
    let mut meta = tags.join(" ");
    if usage > 0 {
        meta.push_str(&format!("  已使用 {usage} 次"));
    }
    println!("      {}", dim(&meta));
}
