//! 構造化出力用の JSON スキーマ

use serde_json::{json, Value};

pub fn generation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "explanation": {
                "type": "string",
                "description": "A brief, user-friendly description in Chinese of the component you built."
            },
            "code": {
                "type": "string",
                "description": "The full HTML content as a string, including <!DOCTYPE html> and all required CDN script tags."
            }
        },
        "required": ["explanation", "code"]
    })
}

pub fn replies_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "responses": {
                "type": "array",
                "items": { "type": "string" },
                "description": description
            },
            "confidence": {
                "type": "number",
                "description": "AI生成的置信度分数(0-1)"
            }
        },
        "required": ["responses", "confidence"]
    })
}

pub fn quote_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "content": { "type": "string", "description": "语录内容" },
            "category": { "type": "string", "description": "语录分类" }
        },
        "required": ["content", "category"]
    })
}
