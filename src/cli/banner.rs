use chrono::{Local, Timelike};
use rand::Rng;

use super::color::{bold_magenta, cyan, white, yellow};
use super::companion::companion_talk;
use crate::companion::CompanionState;

/// 時間帯に応じた挨拶を返す。
///  - 5〜11時:  "早上好"
///  - 12〜17時: "下午好"
///  - 18〜4時:  "晚上好"
fn time_greeting() -> &'static str {
    match Local::now().hour() {
        5..=11 => "早上好",
        12..=17 => "下午好",
        _ => "晚上好",
    }
}

/// 起動時の Welcome バナーを表示する。
pub fn print_welcome(online: bool) {
    let version = env!("CARGO_PKG_VERSION");
    let greeting = time_greeting();

    let art_lines: &[&str] = &[
        r#" __      __ _  _                 _____            _         "#,
        r#" \ \    / /(_)| |               / ____|          | |        "#,
        r#"  \ \  / /  _ | |__    ___     | |      ___    __| |  ___   "#,
        r#"   \ \/ /  | || '_ \  / _ \    | |     / _ \  / _` | / _ \  "#,
        r#"    \  /   | || |_) ||  __/    | |____| (_) || (_| ||  __/  "#,
        r#"     \/    |_||_.__/  \___|     \_____|\___/  \__,_| \___|  "#,
    ];

    let separator = "=============================================================";
    let version_line = format!(
        "     {}  ::  {} {}",
        bold_magenta("VIBE CODER"),
        white("AI 伙伴"),
        yellow(&format!("v{version}"))
    );

    println!();
    for line in art_lines {
        println!("{}", white(line));
    }
    println!("{}", cyan(separator));
    println!("{version_line}");
    println!("{}", cyan(separator));
    println!();
    companion_talk(
        CompanionState::Idle,
        &format!("{greeting}！描述你想要的页面，我来写代码。输入 /help 查看命令。"),
    );
    if !online {
        companion_talk(
            CompanionState::Idle,
            "现在是离线模式，回复都是备用内容哦。设置 GEMINI_API_KEY 后就能连上啦。",
        );
    }
    println!();
}

/// 終了時の Farewell メッセージを表示する。
pub fn print_goodbye() {
    let greeting = time_greeting();

    let messages: &[&str] = &[
        "今天也写了不少好东西，下次见！",
        &format!("{greeting}，记得喝水休息哦~"),
        "代码精灵下线啦，随时召唤我！",
        "拜拜~ 别忘了保存你的页面。",
    ];

    let idx = rand::rng().random_range(0..messages.len());

    println!();
    companion_talk(CompanionState::Happy, messages[idx]);
    println!();
}
