//! AI 伙伴
//!
//! 伙伴の状態・会話ログ・生成物をセッション単位で管理する。

pub mod avatar;
mod controller;
pub mod demo;
mod pacer;
mod state;
mod trigger;

pub use controller::{CompanionController, TriggerOutcome, WallpaperOutcome};
pub use pacer::{CycleTimings, TokioPacer};
pub use state::{Author, CompanionState, Message, Snapshot};
pub use trigger::TriggerKind;
