pub mod client;
mod prompts;
mod schema;
mod service;
pub mod types;

pub use client::CompanionAI;
pub use service::GenerationService;
pub use types::{
    DailyQuote, ReplyStyle, ReplySuggestions, SmartReplyRequest, WorkplaceReplyRequest,
    WorkplaceScenario, WorkplaceTone,
};
