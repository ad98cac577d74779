//! Gemini クライアント
//!
//! Gemini の OpenAI 互換エンドポイントに async-openai で接続する。
//! API キーがなければオフラインのクライアントになり、すべての操作がフォールバックを返す。

use std::sync::OnceLock;

use anyhow::{anyhow, bail, Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, CreateImageRequest,
        Image, ImageModel, ImageResponseFormat, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::prompts;
use super::schema;
use super::service::GenerationService;
use super::types::{
    DailyQuote, GenerationResult, QuotePayload, RepliesPayload, ReplySuggestions,
    SmartReplyRequest, WorkplaceReplyRequest,
};
use crate::config::AiConfig;

/// 構造化出力の指定
struct JsonSchemaSpec<'a> {
    name: &'a str,
    schema: Value,
}

/// Vibe Coder AI クライアント
pub struct CompanionAI {
    client: Option<Client<OpenAIConfig>>,
    config: AiConfig,
}

impl CompanionAI {
    /// 設定で指定された環境変数から API キーを読み取って初期化する。
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!(
                "{} is not set. AI features are disabled.",
                config.api_key_env
            )
        })?;

        if api_key.trim().is_empty() || api_key == "your_gemini_api_key" {
            bail!(
                "{} is not configured. Please set a valid API key in .env",
                config.api_key_env
            );
        }

        let openai = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.base_url);

        info!(base_url = %config.base_url, "AI client initialized");

        Ok(Self {
            client: Some(Client::with_config(openai)),
            config: config.clone(),
        })
    }

    /// API を呼ばないクライアント。
    pub fn offline(config: &AiConfig) -> Self {
        info!("AI client running offline, every operation returns its fallback");
        Self {
            client: None,
            config: config.clone(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&Client<OpenAIConfig>> {
        self.client
            .as_ref()
            .context("AI client is offline (no API key configured)")
    }

    /// チャット補完を 1 回呼び出し、本文テキストを返す。
    async fn complete(
        &self,
        model: &str,
        system: Option<&str>,
        user: String,
        json_schema: Option<JsonSchemaSpec<'_>>,
    ) -> Result<String> {
        let client = self.client()?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.to_string()),
                    name: None,
                },
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(user),
                name: None,
            },
        ));

        let response_format = json_schema.map(|spec| ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: spec.name.to_string(),
                schema: Some(spec.schema),
                strict: None,
            },
        });

        debug!(
            model,
            message_count = messages.len(),
            structured = response_format.is_some(),
            "Sending chat completion request"
        );

        let request = CreateChatCompletionRequest {
            model: model.to_string(),
            messages,
            response_format,
            ..Default::default()
        };

        let response = client
            .chat()
            .create(request)
            .await
            .context("chat completion request failed")?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .context("model returned an empty response")?;

        debug!(model, response_length = text.len(), "Chat completion received");
        Ok(text)
    }

    async fn complete_json<T: DeserializeOwned>(
        &self,
        model: &str,
        user: String,
        name: &str,
        schema: Value,
    ) -> Result<T> {
        let raw = self
            .complete(model, None, user, Some(JsonSchemaSpec { name, schema }))
            .await?;
        parse_json_payload(&raw)
    }

    async fn try_generate_code(&self, prompt: &str) -> Result<GenerationResult> {
        self.complete_json(
            &self.config.code_model,
            prompts::code_prompt(prompt),
            "generation_result",
            schema::generation_schema(),
        )
        .await
    }

    async fn try_generate_wallpaper(&self, prompt: &str) -> Result<String> {
        let client = self.client()?;

        let request = CreateImageRequest {
            prompt: prompts::wallpaper_prompt(prompt),
            model: Some(ImageModel::Other(self.config.wallpaper_model.clone())),
            n: Some(1),
            response_format: Some(ImageResponseFormat::B64Json),
            ..Default::default()
        };

        debug!(model = %self.config.wallpaper_model, "Sending image generation request");

        let response = client
            .images()
            .create(request)
            .await
            .context("image generation request failed")?;

        for image in &response.data {
            match image.as_ref() {
                Image::B64Json { b64_json, .. } if !b64_json.is_empty() => {
                    return Ok(format!("data:image/png;base64,{}", b64_json.as_str()));
                }
                Image::Url { url, .. } if !url.is_empty() => return Ok(url.clone()),
                _ => {}
            }
        }

        Err(anyhow!(prompts::WALLPAPER_NO_IMAGE))
    }

    async fn try_replies(&self, prompt: String, description: &str) -> Result<ReplySuggestions> {
        let payload: RepliesPayload = self
            .complete_json(
                &self.config.humor_model,
                prompt,
                "reply_suggestions",
                schema::replies_schema(description),
            )
            .await?;
        suggestions_from_payload(payload)
    }

    async fn try_daily_quote(&self) -> Result<QuotePayload> {
        self.complete_json(
            &self.config.humor_model,
            prompts::DAILY_QUOTE_PROMPT.to_string(),
            "daily_quote",
            schema::quote_schema(),
        )
        .await
    }
}

#[async_trait]
impl GenerationService for CompanionAI {
    async fn generate_code(&self, prompt: &str) -> GenerationResult {
        match self.try_generate_code(prompt).await {
            Ok(result) => {
                info!(code_length = result.code.len(), "Code generated");
                result
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Code generation failed, using fallback");
                GenerationResult {
                    explanation: prompts::CODE_FALLBACK_EXPLANATION.to_string(),
                    code: prompts::error_document(&format!("{e:#}")),
                }
            }
        }
    }

    async fn chat_with_companion(&self, prompt: &str) -> String {
        let result = self
            .complete(
                &self.config.companion_model,
                Some(prompts::COMPANION_SYSTEM_PROMPT),
                prompt.to_string(),
                None,
            )
            .await;

        match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Companion chat failed, using fallback");
                prompts::COMPANION_FALLBACK.to_string()
            }
        }
    }

    async fn generate_wallpaper(&self, prompt: &str) -> Result<String> {
        self.try_generate_wallpaper(prompt).await.map_err(|e| {
            warn!(error = %format!("{e:#}"), "Wallpaper generation failed");
            e.context(prompts::WALLPAPER_ERROR)
        })
    }

    async fn generate_smart_reply(&self, request: &SmartReplyRequest) -> ReplySuggestions {
        match self
            .try_replies(prompts::smart_reply_prompt(request), "2-3个高情商幽默回应")
            .await
        {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Smart reply failed, using fallback");
                fallback_suggestions(prompts::SMART_REPLY_FALLBACK)
            }
        }
    }

    async fn generate_workplace_reply(&self, request: &WorkplaceReplyRequest) -> ReplySuggestions {
        match self
            .try_replies(prompts::workplace_reply_prompt(request), "2-3个职场委婉回应")
            .await
        {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Workplace reply failed, using fallback");
                fallback_suggestions(prompts::WORKPLACE_REPLY_FALLBACK)
            }
        }
    }

    async fn generate_daily_quote(&self) -> DailyQuote {
        let now = Utc::now();
        match self.try_daily_quote().await {
            Ok(payload) => stamp_quote(payload.content, payload.category, now),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Daily quote failed, using fallback");
                stamp_quote(
                    prompts::QUOTE_FALLBACK_CONTENT.to_string(),
                    prompts::QUOTE_FALLBACK_CATEGORY.to_string(),
                    now,
                )
            }
        }
    }
}

static CODE_FENCE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn code_fence() -> Result<&'static Regex> {
    CODE_FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$"))
        .as_ref()
        .map_err(|e| anyhow!("invalid code fence pattern: {e}"))
}

/// モデル出力から JSON を取り出してデシリアライズする。
/// 前後の markdown コードフェンスは取り除く。
pub(crate) fn parse_json_payload<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let fence = code_fence()?;

    let body = match fence.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    };

    serde_json::from_str(body).with_context(|| {
        let preview: String = body.chars().take(120).collect();
        format!("model returned malformed JSON: {preview}")
    })
}

fn suggestions_from_payload(payload: RepliesPayload) -> Result<ReplySuggestions> {
    let responses: Vec<String> = payload
        .responses
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();

    if responses.is_empty() {
        bail!("model returned no responses");
    }

    let confidence = if payload.confidence.is_finite() {
        payload.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(ReplySuggestions {
        success: true,
        responses,
        confidence,
    })
}

fn fallback_suggestions(text: &str) -> ReplySuggestions {
    ReplySuggestions {
        success: false,
        responses: vec![text.to_string()],
        confidence: 0.0,
    }
}

/// 生成時刻から語録の id と日付を決める。
pub(crate) fn stamp_quote(content: String, category: String, now: DateTime<Utc>) -> DailyQuote {
    DailyQuote {
        id: now.timestamp_millis().to_string(),
        content,
        category,
        date: now.format("%Y-%m-%d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serial_test::serial;

    fn offline() -> CompanionAI {
        CompanionAI::offline(&AiConfig::default())
    }

    #[test]
    fn parse_plain_json() {
        let result: GenerationResult =
            parse_json_payload(r#"{"explanation":"计数器","code":"<!DOCTYPE html>"}"#).unwrap();
        assert_eq!(result.explanation, "计数器");
        assert_eq!(result.code, "<!DOCTYPE html>");
    }

    #[test]
    fn parse_fenced_json() {
        let raw = "```json\n{\"content\":\"笑一笑\",\"category\":\"幽默\"}\n```";
        let payload: QuotePayload = parse_json_payload(raw).unwrap();
        assert_eq!(payload.content, "笑一笑");
        assert_eq!(payload.category, "幽默");

        let bare_fence = "```\n{\"content\":\"a\",\"category\":\"b\"}\n```\n";
        let payload: QuotePayload = parse_json_payload(bare_fence).unwrap();
        assert_eq!(payload.content, "a");
    }

    #[test]
    fn code_fence_pattern_is_compiled_once() {
        let first = code_fence().unwrap();
        let second = code_fence().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(first.is_match("```json\n{}\n```"));
    }

    #[test]
    fn parse_malformed_json_is_an_error() {
        assert!(parse_json_payload::<GenerationResult>("not json at all").is_err());
        assert!(parse_json_payload::<GenerationResult>(r#"{"explanation":"x"}"#).is_err());
    }

    #[test]
    fn confidence_is_clamped() {
        let high = suggestions_from_payload(RepliesPayload {
            responses: vec!["好".into()],
            confidence: 1.7,
        })
        .unwrap();
        assert_eq!(high.confidence, 1.0);
        assert!(high.success);

        let low = suggestions_from_payload(RepliesPayload {
            responses: vec!["好".into()],
            confidence: -0.2,
        })
        .unwrap();
        assert_eq!(low.confidence, 0.0);

        let nan = suggestions_from_payload(RepliesPayload {
            responses: vec!["好".into()],
            confidence: f64::NAN,
        })
        .unwrap();
        assert_eq!(nan.confidence, 0.0);
    }

    #[test]
    fn empty_responses_are_rejected() {
        let result = suggestions_from_payload(RepliesPayload {
            responses: vec!["  ".into()],
            confidence: 0.9,
        });
        assert!(result.is_err());
    }

    #[test]
    fn stamp_quote_uses_epoch_millis_and_utc_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        let quote = stamp_quote("c".into(), "k".into(), now);
        assert_eq!(quote.id, now.timestamp_millis().to_string());
        assert_eq!(quote.date, "2024-03-09");
    }

    #[tokio::test]
    async fn offline_code_generation_falls_back() {
        let result = offline().generate_code("写一个计数器").await;
        assert_eq!(result.explanation, prompts::CODE_FALLBACK_EXPLANATION);
        assert!(result.code.starts_with("<html><body><h1>Error</h1><p>"));
        assert!(result.code.ends_with("</p></body></html>"));
    }

    #[tokio::test]
    async fn offline_chat_falls_back() {
        assert_eq!(
            offline().chat_with_companion("你好").await,
            prompts::COMPANION_FALLBACK
        );
    }

    #[tokio::test]
    async fn offline_wallpaper_is_an_error() {
        let err = offline().generate_wallpaper("星空").await.unwrap_err();
        assert_eq!(err.to_string(), prompts::WALLPAPER_ERROR);
    }

    #[tokio::test]
    async fn offline_humor_operations_fall_back() {
        let ai = offline();

        let smart = ai.generate_smart_reply(&SmartReplyRequest::default()).await;
        assert!(!smart.success);
        assert_eq!(smart.responses, vec![prompts::SMART_REPLY_FALLBACK.to_string()]);
        assert_eq!(smart.confidence, 0.0);

        let work = ai
            .generate_workplace_reply(&WorkplaceReplyRequest::default())
            .await;
        assert!(!work.success);
        assert_eq!(work.responses, vec![prompts::WORKPLACE_REPLY_FALLBACK.to_string()]);

        let quote = ai.generate_daily_quote().await;
        assert_eq!(quote.content, prompts::QUOTE_FALLBACK_CONTENT);
        assert_eq!(quote.category, prompts::QUOTE_FALLBACK_CATEGORY);
        assert_eq!(quote.date.len(), 10);
    }

    #[test]
    #[serial]
    fn new_fails_without_api_key() {
        let config = AiConfig {
            api_key_env: "VIBE_TEST_MISSING_KEY".to_string(),
            ..AiConfig::default()
        };
        std::env::remove_var("VIBE_TEST_MISSING_KEY");
        assert!(CompanionAI::new(&config).is_err());

        std::env::set_var("VIBE_TEST_MISSING_KEY", "   ");
        assert!(CompanionAI::new(&config).is_err());
        std::env::remove_var("VIBE_TEST_MISSING_KEY");
    }

    #[test]
    #[serial]
    fn new_succeeds_with_api_key() {
        let config = AiConfig {
            api_key_env: "VIBE_TEST_PRESENT_KEY".to_string(),
            ..AiConfig::default()
        };
        std::env::set_var("VIBE_TEST_PRESENT_KEY", "test-key");
        let ai = CompanionAI::new(&config).unwrap();
        assert!(ai.is_online());
        std::env::remove_var("VIBE_TEST_PRESENT_KEY");
    }
}
