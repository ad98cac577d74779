//! プロンプトとフォールバック文言

use super::types::{SmartReplyRequest, WorkplaceReplyRequest};

pub const CODE_FALLBACK_EXPLANATION: &str =
    "抱歉，生成代码时遇到了一个错误。请检查您的提示或稍后再试。";
pub const COMPANION_FALLBACK: &str = "哎呀，我好像短路了... 😅 请稍后再试吧！";
pub const SMART_REPLY_FALLBACK: &str = "哎呀，我的大脑短路了，让我缓缓... 😅";
pub const WORKPLACE_REPLY_FALLBACK: &str = "让我想想怎么优雅地回应这个问题... 🤔";
pub const QUOTE_FALLBACK_CONTENT: &str = "今天的智慧：保持幽默感，是高情商的最佳体现。😊";
pub const QUOTE_FALLBACK_CATEGORY: &str = "生活智慧";

pub const WALLPAPER_ERROR: &str = "Failed to generate wallpaper. Please try again.";
pub const WALLPAPER_NO_IMAGE: &str = "API did not return an image.";

pub const COMPANION_SYSTEM_PROMPT: &str = "You are a friendly, cheerful, and helpful AI companion named 'Vibe Coder AI Companion'. \
Your personality is lively and you love using emojis. \
Your goal is to provide encouragement and answer non-coding questions to make the user's programming session more enjoyable. \
You are speaking Chinese. Keep your responses concise and brief, preferably within 1-2 sentences. \
回复要简洁明了，最好控制在1-2句话内。";

/// コード生成失敗時に成果物として出す HTML
pub fn error_document(error: &str) -> String {
    format!("<html><body><h1>Error</h1><p>{error}</p></body></html>")
}

pub fn code_prompt(prompt: &str) -> String {
    format!(
        r#"You are an expert web developer creating a single-file web application.
The user wants to build: "{prompt}".
Your task is to generate a single, complete, and runnable HTML file. This file must not require any external files or build steps.

Requirements:
1. It must be a complete HTML document, starting with <!DOCTYPE html>.
2. It MUST include CDN links for React 18, ReactDOM 18, Babel Standalone, and Tailwind CSS v3.
3. All JavaScript code, including the React component, must be inside a single <script type="text/babel"> tag.
4. The React component should be rendered into a div with id="root".
5. The HTML body should have a dark background (e.g., bg-gray-800) and light text for good visibility.

Respond with a JSON object that strictly adheres to the provided schema. Do not include any markdown formatting around the JSON object."#
    )
}

pub fn wallpaper_prompt(theme: &str) -> String {
    format!(
        "Create a beautiful, abstract, dark-themed wallpaper suitable for a developer's desktop, \
inspired by the theme: \"{theme}\". The wallpaper should be visually pleasing but not distracting."
    )
}

pub fn smart_reply_prompt(request: &SmartReplyRequest) -> String {
    let context = request
        .context
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("场景背景：{c}\n"))
        .unwrap_or_default();

    format!(
        r#"你是一个高情商的回应助手。用户遇到了这样的话语："{input}"
{context}
请生成2-3个{style}的高情商回应，要求：
1. 既能化解尴尬，又能展现幽默感
2. 语言自然，不做作
3. 适合中文语境
4. 每个回应控制在30字以内

请以JSON格式返回，包含responses数组和confidence分数。"#,
        input = request.input,
        style = request.style.label(),
    )
}

pub fn workplace_reply_prompt(request: &WorkplaceReplyRequest) -> String {
    format!(
        r#"你是一个职场沟通专家。在{scenario}中，遇到了这样的情况："{input}"

请生成2-3个{tone}的职场回应，要求：
1. 既委婉又不失幽默感
2. 符合职场礼仪和文化
3. 能够有效化解潜在冲突
4. 每个回应控制在50字以内

请以JSON格式返回，包含responses数组和confidence分数。"#,
        scenario = request.scenario.label(),
        input = request.input,
        tone = request.tone.label(),
    )
}

pub const DAILY_QUOTE_PROMPT: &str = r#"生成一条今日的高情商幽默语录，要求：
1. 既有哲理又有幽默感
2. 适合在社交场合分享
3. 语言简洁有力，控制在50字以内
4. 体现高情商的沟通智慧

请以JSON格式返回，包含content(内容)、category(分类)。"#;
