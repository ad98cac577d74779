//! 伙伴のライフサイクル制御
//!
//! 1 回のトリガーごとに `Idle → Thinking → (Working) → Happy → Idle` を進め、
//! 会話ログへの追記と生成サービスの呼び出しを決まった順序で行う。
//!
//! 状態はすべて `Session` に集約し、`tokio::sync::Mutex` で直列化する。
//! 表示側は `watch` チャネル経由で `Snapshot` を読むだけで、状態を直接触らない。
//! ロックは遅延や外部呼び出しの間は保持しない。
//!
//! サイクルは厳密に 1 本だけ走る。受理からIdleに戻るまでのトリガーは拒否する。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::avatar::default_avatar;
use super::demo::{DEMO_DOCUMENT, DEMO_EXPLANATION, DEMO_PROMPT};
use super::pacer::{CycleTimings, Pacer};
use super::state::{Author, CompanionState, ConversationLog, Message, Snapshot};
use super::trigger::{parse_chat, ChatInput, TriggerKind};
use crate::ai::GenerationService;
use crate::storage::{keys, PreferenceStore};

/// トリガーの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// サイクルが Happy まで進んだ。`reply` は最後に追記されたメッセージ。
    Completed { kind: TriggerKind, reply: Message },
    /// 別のサイクルが進行中のため何もしなかった
    Rejected,
    /// 空白だけの入力
    Ignored,
}

/// 壁紙生成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WallpaperOutcome {
    Generated,
    /// エラーメッセージは会話ログにも追記済み
    Failed(String),
    /// 別の壁紙を生成中
    Busy,
    Ignored,
}

struct Session {
    state: CompanionState,
    busy: bool,
    /// 受理したサイクルごとに 1 つ進む
    cycle: u64,
    log: ConversationLog,
    artifact: Option<Arc<str>>,
    custom_avatar: Option<Arc<str>>,
    wallpaper: Option<Arc<str>>,
    wallpaper_pending: bool,
}

impl Session {
    fn accepting(&self) -> bool {
        self.state == CompanionState::Idle && !self.busy
    }
}

struct Inner {
    session: Mutex<Session>,
    snapshots: watch::Sender<Snapshot>,
    service: Arc<dyn GenerationService>,
    store: Arc<dyn PreferenceStore>,
    pacer: Arc<dyn Pacer>,
    timings: CycleTimings,
    mentions: Vec<String>,
    default_avatar: Arc<str>,
}

impl Inner {
    fn avatar(&self, session: &Session) -> Arc<str> {
        session
            .custom_avatar
            .clone()
            .unwrap_or_else(|| self.default_avatar.clone())
    }

    fn publish(&self, session: &Session) {
        self.snapshots.send_replace(Snapshot {
            state: session.state,
            busy: session.busy,
            messages: session.log.shared(),
            artifact: session.artifact.clone(),
            avatar: self.avatar(session),
            custom_avatar: session.custom_avatar.is_some(),
            wallpaper: session.wallpaper.clone(),
        });
    }
}

/// 伙伴のライフサイクルコントローラ。クローンは同じセッションを共有する。
#[derive(Clone)]
pub struct CompanionController {
    inner: Arc<Inner>,
}

impl CompanionController {
    pub fn new(
        service: Arc<dyn GenerationService>,
        store: Arc<dyn PreferenceStore>,
        pacer: Arc<dyn Pacer>,
        timings: CycleTimings,
        mentions: Vec<String>,
    ) -> Self {
        let custom_avatar = store.get(keys::COMPANION_IMAGE).map(Arc::from);
        let wallpaper = store.get(keys::WALLPAPER).map(Arc::from);

        debug!(
            custom_avatar = custom_avatar.is_some(),
            wallpaper = wallpaper.is_some(),
            "Restored companion preferences"
        );

        let session = Session {
            state: CompanionState::Idle,
            busy: false,
            cycle: 0,
            log: ConversationLog::default(),
            artifact: None,
            custom_avatar,
            wallpaper,
            wallpaper_pending: false,
        };

        let default_avatar: Arc<str> = Arc::from(default_avatar());
        let (snapshots, _) = watch::channel(Snapshot {
            state: session.state,
            busy: session.busy,
            messages: session.log.shared(),
            artifact: None,
            avatar: session
                .custom_avatar
                .clone()
                .unwrap_or_else(|| default_avatar.clone()),
            custom_avatar: session.custom_avatar.is_some(),
            wallpaper: session.wallpaper.clone(),
        });

        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(session),
                snapshots,
                service,
                store,
                pacer,
                timings,
                mentions,
                default_avatar,
            }),
        }
    }

    /// 最新のスナップショット
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Idle かつ busy でない状態になるまで待つ。
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        // 送信側は self が保持しているので閉じることはない
        let _ = rx.wait_for(Snapshot::is_settled).await;
    }

    pub fn mentions(&self) -> &[String] {
        &self.inner.mentions
    }

    /// チャット入力を処理する。メンション付きなら伙伴との会話、それ以外はコード生成。
    pub async fn submit(&self, text: &str) -> TriggerOutcome {
        match parse_chat(text, &self.inner.mentions) {
            None => {
                debug!("Ignoring blank chat input");
                TriggerOutcome::Ignored
            }
            Some(ChatInput::Plain(_)) => self.run_plain(text).await,
            Some(ChatInput::Directed(prompt)) => self.run_directed(text, prompt).await,
        }
    }

    /// 台本どおりのデモを再生する。外部呼び出しはしない。
    pub async fn start_demo(&self) -> TriggerOutcome {
        let Some(cycle) = self.accept(TriggerKind::Demo, DEMO_PROMPT).await else {
            return TriggerOutcome::Rejected;
        };

        self.inner.pacer.pause(self.inner.timings.demo_thinking).await;
        self.advance(cycle, CompanionState::Working).await;
        self.inner.pacer.pause(self.inner.timings.demo_working).await;

        let reply = self
            .finish(cycle, Author::Bot, DEMO_EXPLANATION.to_string(), Some(DEMO_DOCUMENT))
            .await;
        TriggerOutcome::Completed {
            kind: TriggerKind::Demo,
            reply,
        }
    }

    async fn run_plain(&self, text: &str) -> TriggerOutcome {
        let Some(cycle) = self.accept(TriggerKind::Plain, text).await else {
            return TriggerOutcome::Rejected;
        };

        self.inner.pacer.pause(self.inner.timings.thinking).await;
        self.advance(cycle, CompanionState::Working).await;

        let result = self.inner.service.generate_code(text).await;

        let reply = self
            .finish(cycle, Author::Bot, result.explanation, Some(result.code.as_str()))
            .await;
        TriggerOutcome::Completed {
            kind: TriggerKind::Plain,
            reply,
        }
    }

    async fn run_directed(&self, text: &str, prompt: &str) -> TriggerOutcome {
        let Some(cycle) = self.accept(TriggerKind::Directed, text).await else {
            return TriggerOutcome::Rejected;
        };

        let answer = self.inner.service.chat_with_companion(prompt).await;

        let reply = self.finish(cycle, Author::Companion, answer, None).await;
        TriggerOutcome::Completed {
            kind: TriggerKind::Directed,
            reply,
        }
    }

    /// トリガーを受理してユーザーメッセージを追記し、Thinking に入る。
    /// 進行中のサイクルがあれば `None`。
    async fn accept(&self, kind: TriggerKind, user_text: &str) -> Option<u64> {
        let mut session = self.inner.session.lock().await;

        if !session.accepting() {
            debug!(
                ?kind,
                state = session.state.as_str(),
                busy = session.busy,
                "Trigger rejected, a cycle is still in flight"
            );
            return None;
        }

        if kind == TriggerKind::Demo {
            session.log.reset();
            session.artifact = None;
        }

        let avatar = self.inner.avatar(&session);
        session
            .log
            .push(Message::new(Author::User, user_text, avatar));
        session.busy = true;
        session.state = CompanionState::Thinking;
        session.cycle += 1;
        let cycle = session.cycle;

        info!(cycle, ?kind, log_len = session.log.len(), "Trigger accepted");
        self.inner.publish(&session);
        Some(cycle)
    }

    async fn advance(&self, cycle: u64, next: CompanionState) {
        let mut session = self.inner.session.lock().await;
        if session.cycle != cycle {
            warn!(cycle, current = session.cycle, "Stale cycle tried to advance state");
            return;
        }
        debug!(
            cycle,
            from = session.state.as_str(),
            to = next.as_str(),
            "Companion state transition"
        );
        session.state = next;
        self.inner.publish(&session);
    }

    /// 応答を追記して Happy に入り、一定時間後の Idle 復帰を予約する。
    async fn finish(
        &self,
        cycle: u64,
        author: Author,
        content: String,
        artifact: Option<&str>,
    ) -> Message {
        let reply = {
            let mut session = self.inner.session.lock().await;
            let message = Message::new(author, content, self.inner.avatar(&session));
            session.log.push(message.clone());
            if let Some(code) = artifact {
                session.artifact = Some(Arc::from(code));
            }
            debug!(
                cycle,
                from = session.state.as_str(),
                to = CompanionState::Happy.as_str(),
                "Companion state transition"
            );
            session.state = CompanionState::Happy;
            session.busy = false;
            self.inner.publish(&session);
            message
        };

        self.schedule_reset(cycle, self.inner.timings.happy);
        reply
    }

    fn schedule_reset(&self, cycle: u64, after: Duration) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.pacer.pause(after).await;

            let mut session = inner.session.lock().await;
            if session.cycle != cycle || session.state != CompanionState::Happy {
                debug!(cycle, current = session.cycle, "Skipping stale idle reset");
                return;
            }
            session.state = CompanionState::Idle;
            debug!(cycle, "Companion back to idle");
            inner.publish(&session);
        });
    }

    /// 壁紙を生成して保存する。伙伴の状態には影響しない。
    pub async fn generate_wallpaper(&self, prompt: &str) -> WallpaperOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            debug!("Ignoring blank wallpaper prompt");
            return WallpaperOutcome::Ignored;
        }

        {
            let mut session = self.inner.session.lock().await;
            if session.wallpaper_pending {
                debug!("Wallpaper generation already in flight");
                return WallpaperOutcome::Busy;
            }
            session.wallpaper_pending = true;
        }

        let result = self.inner.service.generate_wallpaper(prompt).await;

        let mut session = self.inner.session.lock().await;
        session.wallpaper_pending = false;

        let outcome = match result {
            Ok(image) => {
                info!(bytes = image.len(), "Wallpaper generated");
                self.inner.store.set(keys::WALLPAPER, &image);
                session.wallpaper = Some(Arc::from(image));
                WallpaperOutcome::Generated
            }
            Err(e) => {
                let avatar = self.inner.avatar(&session);
                session.log.push(Message::new(
                    Author::Bot,
                    format!("抱歉，壁纸生成失败了：{e}"),
                    avatar,
                ));
                WallpaperOutcome::Failed(e.to_string())
            }
        };
        self.inner.publish(&session);
        outcome
    }

    pub async fn remove_wallpaper(&self) {
        self.inner.store.remove(keys::WALLPAPER);
        let mut session = self.inner.session.lock().await;
        session.wallpaper = None;
        self.inner.publish(&session);
    }

    /// カスタムアバターを設定する。以降に作られるメッセージがこれを参照する。
    pub async fn set_avatar(&self, image: String) {
        self.inner.store.set(keys::COMPANION_IMAGE, &image);
        let mut session = self.inner.session.lock().await;
        session.custom_avatar = Some(Arc::from(image));
        self.inner.publish(&session);
    }

    pub async fn clear_avatar(&self) {
        self.inner.store.remove(keys::COMPANION_IMAGE);
        let mut session = self.inner.session.lock().await;
        session.custom_avatar = None;
        self.inner.publish(&session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::GenerationResult;
    use crate::ai::{
        CompanionAI, DailyQuote, ReplySuggestions, SmartReplyRequest, WorkplaceReplyRequest,
    };
    use crate::config::AiConfig;
    use crate::storage::MemoryPreferences;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    /// 呼び出しを記録し、呼び出し時点の伙伴の状態も控えておくサービス
    #[derive(Default)]
    struct ScriptedService {
        wallpaper_fails: bool,
        gated: bool,
        entered: Notify,
        release: Notify,
        prompts: StdMutex<Vec<String>>,
        observed: StdMutex<Vec<CompanionState>>,
        observer: StdMutex<Option<watch::Receiver<Snapshot>>>,
    }

    impl ScriptedService {
        async fn record(&self, prompt: &str) {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(rx) = self.observer.lock().unwrap().as_ref() {
                self.observed.lock().unwrap().push(rx.borrow().state);
            }
            if self.gated {
                self.entered.notify_one();
                self.release.notified().await;
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        fn observed(&self) -> Vec<CompanionState> {
            self.observed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedService {
        async fn generate_code(&self, prompt: &str) -> GenerationResult {
            self.record(prompt).await;
            GenerationResult {
                explanation: format!("这是{prompt}"),
                code: "<!DOCTYPE html><html></html>".to_string(),
            }
        }

        async fn chat_with_companion(&self, prompt: &str) -> String {
            self.record(prompt).await;
            "你好呀！😊".to_string()
        }

        async fn generate_wallpaper(&self, prompt: &str) -> Result<String> {
            self.record(prompt).await;
            if self.wallpaper_fails {
                Err(anyhow!("Failed to generate wallpaper. Please try again."))
            } else {
                Ok("data:image/png;base64,AAAA".to_string())
            }
        }

        async fn generate_smart_reply(&self, _request: &SmartReplyRequest) -> ReplySuggestions {
            unreachable!("not used by the controller")
        }

        async fn generate_workplace_reply(
            &self,
            _request: &WorkplaceReplyRequest,
        ) -> ReplySuggestions {
            unreachable!("not used by the controller")
        }

        async fn generate_daily_quote(&self) -> DailyQuote {
            unreachable!("not used by the controller")
        }
    }

    /// 待たずに進むが、要求された遅延とその時点の状態を記録する。
    /// `hold` に一致する遅延だけは `release` されるまで止まる。
    #[derive(Default)]
    struct RecordingPacer {
        hold: Option<Duration>,
        release: Notify,
        pauses: StdMutex<Vec<(Duration, CompanionState)>>,
        observer: StdMutex<Option<watch::Receiver<Snapshot>>>,
    }

    impl RecordingPacer {
        fn holding(duration: Duration) -> Self {
            Self {
                hold: Some(duration),
                ..Self::default()
            }
        }

        fn pauses(&self) -> Vec<(Duration, CompanionState)> {
            self.pauses.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Pacer for RecordingPacer {
        async fn pause(&self, duration: Duration) {
            let state = self
                .observer
                .lock()
                .unwrap()
                .as_ref()
                .map(|rx| rx.borrow().state)
                .unwrap_or_default();
            self.pauses.lock().unwrap().push((duration, state));
            if self.hold == Some(duration) {
                self.release.notified().await;
            }
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn mentions() -> Vec<String> {
        vec!["@companion".to_string(), "@AI伙伴".to_string()]
    }

    fn controller_with(
        service: Arc<ScriptedService>,
        pacer: Arc<RecordingPacer>,
        store: Arc<MemoryPreferences>,
    ) -> CompanionController {
        let controller = CompanionController::new(
            service.clone(),
            store,
            pacer.clone(),
            CycleTimings::default(),
            mentions(),
        );
        *service.observer.lock().unwrap() = Some(controller.subscribe());
        *pacer.observer.lock().unwrap() = Some(controller.subscribe());
        controller
    }

    fn controller(service: Arc<ScriptedService>, pacer: Arc<RecordingPacer>) -> CompanionController {
        controller_with(service, pacer, Arc::new(MemoryPreferences::default()))
    }

    fn contents(snapshot: &Snapshot) -> Vec<(Author, String)> {
        snapshot
            .messages
            .iter()
            .map(|m| (m.author, m.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn plain_chat_goes_through_working_and_back_to_idle() {
        let service = Arc::new(ScriptedService::default());
        let pacer = Arc::new(RecordingPacer::default());
        let controller = controller(service.clone(), pacer.clone());

        let outcome = controller.submit("写一个计数器").await;
        let TriggerOutcome::Completed { kind, reply } = outcome else {
            panic!("expected the cycle to complete, got {outcome:?}");
        };
        assert_eq!(kind, TriggerKind::Plain);
        assert_eq!(reply.author, Author::Bot);

        controller.wait_idle().await;
        let snapshot = controller.snapshot();

        assert_eq!(
            contents(&snapshot),
            vec![
                (Author::User, "写一个计数器".to_string()),
                (Author::Bot, "这是写一个计数器".to_string()),
            ]
        );
        assert_eq!(
            snapshot.artifact.as_deref(),
            Some("<!DOCTYPE html><html></html>")
        );
        assert_eq!(snapshot.state, CompanionState::Idle);
        assert!(!snapshot.busy);

        assert_eq!(service.prompts(), vec!["写一个计数器".to_string()]);
        assert_eq!(service.observed(), vec![CompanionState::Working]);
        assert_eq!(
            pacer.pauses(),
            vec![
                (ms(1500), CompanionState::Thinking),
                (ms(2000), CompanionState::Happy),
            ]
        );
    }

    #[tokio::test]
    async fn directed_chat_skips_working() {
        let service = Arc::new(ScriptedService::default());
        let pacer = Arc::new(RecordingPacer::default());
        let controller = controller(service.clone(), pacer.clone());

        let outcome = controller.submit("@companion 你好").await;
        assert!(matches!(
            outcome,
            TriggerOutcome::Completed {
                kind: TriggerKind::Directed,
                ..
            }
        ));

        controller.wait_idle().await;
        let snapshot = controller.snapshot();

        assert_eq!(
            contents(&snapshot),
            vec![
                (Author::User, "@companion 你好".to_string()),
                (Author::Companion, "你好呀！😊".to_string()),
            ]
        );
        assert!(snapshot.artifact.is_none());
        assert_eq!(service.prompts(), vec!["你好".to_string()]);
        assert_eq!(service.observed(), vec![CompanionState::Thinking]);
        assert_eq!(pacer.pauses(), vec![(ms(2000), CompanionState::Happy)]);
    }

    #[tokio::test]
    async fn bare_mention_sends_an_empty_prompt() {
        let service = Arc::new(ScriptedService::default());
        let controller = controller(service.clone(), Arc::new(RecordingPacer::default()));

        controller.submit("@AI伙伴").await;
        assert_eq!(service.prompts(), vec![String::new()]);
    }

    #[tokio::test]
    async fn log_grows_by_two_messages_per_cycle() {
        let service = Arc::new(ScriptedService::default());
        let controller = controller(service, Arc::new(RecordingPacer::default()));

        for i in 0..3 {
            controller.submit(&format!("第{i}个页面")).await;
            controller.wait_idle().await;
        }

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 6);
        for (i, pair) in snapshot.messages.chunks(2).enumerate() {
            assert_eq!(pair[0].author, Author::User);
            assert_eq!(pair[0].content, format!("第{i}个页面"));
            assert_eq!(pair[1].author, Author::Bot);
        }
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let service = Arc::new(ScriptedService::default());
        let controller = controller(service.clone(), Arc::new(RecordingPacer::default()));

        assert_eq!(controller.submit("   ").await, TriggerOutcome::Ignored);
        assert!(controller.snapshot().messages.is_empty());
        assert!(service.prompts().is_empty());
        assert_eq!(controller.snapshot().state, CompanionState::Idle);
    }

    #[tokio::test]
    async fn triggers_are_rejected_while_a_cycle_is_in_flight() {
        let service = Arc::new(ScriptedService {
            gated: true,
            ..ScriptedService::default()
        });
        let controller = controller(service.clone(), Arc::new(RecordingPacer::default()));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("写一个计数器").await }
        });
        service.entered.notified().await;

        assert_eq!(controller.submit("再来一个").await, TriggerOutcome::Rejected);
        assert_eq!(
            controller.submit("@companion 在吗").await,
            TriggerOutcome::Rejected
        );
        assert_eq!(controller.start_demo().await, TriggerOutcome::Rejected);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.state, CompanionState::Working);
        assert!(snapshot.busy);

        service.release.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            TriggerOutcome::Completed { .. }
        ));
        assert_eq!(service.prompts(), vec!["写一个计数器".to_string()]);
    }

    #[tokio::test]
    async fn triggers_are_rejected_until_happy_resets() {
        let service = Arc::new(ScriptedService::default());
        let pacer = Arc::new(RecordingPacer::holding(ms(2000)));
        let controller = controller(service.clone(), pacer.clone());

        controller.submit("写一个计数器").await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, CompanionState::Happy);
        assert!(!snapshot.busy);

        assert_eq!(controller.submit("再来一个").await, TriggerOutcome::Rejected);
        assert_eq!(controller.snapshot().messages.len(), 2);

        pacer.release.notify_one();
        controller.wait_idle().await;
        // 状態だけの遷移ではログを複製しない
        assert!(Arc::ptr_eq(
            &snapshot.messages,
            &controller.snapshot().messages
        ));
        assert!(matches!(
            controller.submit("再来一个").await,
            TriggerOutcome::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn triggers_are_rejected_during_the_thinking_pause() {
        let service = Arc::new(ScriptedService::default());
        let pacer = Arc::new(RecordingPacer::holding(ms(1500)));
        let controller = controller(service.clone(), pacer.clone());

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("写一个计数器").await }
        });

        let mut rx = controller.subscribe();
        rx.wait_for(|s| s.state == CompanionState::Thinking)
            .await
            .unwrap();

        assert_eq!(controller.submit("再来一个").await, TriggerOutcome::Rejected);
        assert_eq!(
            controller.submit("@companion 在吗").await,
            TriggerOutcome::Rejected
        );
        assert_eq!(controller.start_demo().await, TriggerOutcome::Rejected);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, CompanionState::Thinking);
        assert_eq!(snapshot.messages.len(), 1);
        assert!(service.prompts().is_empty());

        pacer.release.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            TriggerOutcome::Completed {
                kind: TriggerKind::Plain,
                ..
            }
        ));
        controller.wait_idle().await;
        assert_eq!(controller.snapshot().messages.len(), 2);
        assert_eq!(service.prompts(), vec!["写一个计数器".to_string()]);
    }

    #[tokio::test]
    async fn demo_plays_the_script_without_calling_the_service() {
        let service = Arc::new(ScriptedService::default());
        let pacer = Arc::new(RecordingPacer::holding(ms(2500)));
        let controller = controller(service.clone(), pacer.clone());

        controller.submit("写一个计数器").await;
        controller.wait_idle().await;

        let demo = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start_demo().await }
        });

        let mut rx = controller.subscribe();
        rx.wait_for(|s| s.state == CompanionState::Working)
            .await
            .unwrap();
        assert_eq!(controller.start_demo().await, TriggerOutcome::Rejected);

        pacer.release.notify_one();
        assert!(matches!(
            demo.await.unwrap(),
            TriggerOutcome::Completed {
                kind: TriggerKind::Demo,
                ..
            }
        ));
        controller.wait_idle().await;

        let snapshot = controller.snapshot();
        assert_eq!(
            contents(&snapshot),
            vec![
                (Author::User, DEMO_PROMPT.to_string()),
                (Author::Bot, DEMO_EXPLANATION.to_string()),
            ]
        );
        assert_eq!(snapshot.artifact.as_deref(), Some(DEMO_DOCUMENT));
        assert_eq!(service.prompts(), vec!["写一个计数器".to_string()]);

        let demo_pauses: Vec<_> = pacer.pauses().into_iter().skip(2).collect();
        assert_eq!(
            demo_pauses,
            vec![
                (ms(1500), CompanionState::Thinking),
                (ms(2500), CompanionState::Working),
                (ms(2000), CompanionState::Happy),
            ]
        );
    }

    #[tokio::test]
    async fn failed_generation_still_reaches_idle() {
        let controller = CompanionController::new(
            Arc::new(CompanionAI::offline(&AiConfig::default())),
            Arc::new(MemoryPreferences::default()),
            Arc::new(RecordingPacer::default()),
            CycleTimings::default(),
            mentions(),
        );

        controller.submit("写一个计数器").await;
        controller.wait_idle().await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[1].author, Author::Bot);
        assert!(snapshot
            .artifact
            .as_deref()
            .is_some_and(|code| code.starts_with("<html><body><h1>Error</h1>")));

        controller.submit("@companion 你好").await;
        controller.wait_idle().await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 4);
        assert_eq!(
            snapshot.messages[3].content,
            "哎呀，我好像短路了... 😅 请稍后再试吧！"
        );
    }

    #[tokio::test]
    async fn wallpaper_success_is_persisted() {
        let store = Arc::new(MemoryPreferences::default());
        let service = Arc::new(ScriptedService::default());
        let controller =
            controller_with(service.clone(), Arc::new(RecordingPacer::default()), store.clone());

        assert_eq!(
            controller.generate_wallpaper("  ").await,
            WallpaperOutcome::Ignored
        );
        assert_eq!(
            controller.generate_wallpaper("赛博朋克").await,
            WallpaperOutcome::Generated
        );
        assert_eq!(
            store.get(keys::WALLPAPER).as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert!(controller.snapshot().wallpaper.is_some());
        assert_eq!(service.observed(), vec![CompanionState::Idle]);

        controller.remove_wallpaper().await;
        assert!(store.get(keys::WALLPAPER).is_none());
        assert!(controller.snapshot().wallpaper.is_none());
    }

    #[tokio::test]
    async fn wallpaper_failure_is_reported_in_the_log() {
        let service = Arc::new(ScriptedService {
            wallpaper_fails: true,
            ..ScriptedService::default()
        });
        let controller = controller(service, Arc::new(RecordingPacer::default()));

        let outcome = controller.generate_wallpaper("星空").await;
        assert!(matches!(outcome, WallpaperOutcome::Failed(_)));

        let snapshot = controller.snapshot();
        assert_eq!(
            contents(&snapshot),
            vec![(
                Author::Bot,
                "抱歉，壁纸生成失败了：Failed to generate wallpaper. Please try again.".to_string()
            )]
        );
        assert_eq!(snapshot.state, CompanionState::Idle);
        assert!(snapshot.wallpaper.is_none());
    }

    #[tokio::test]
    async fn messages_carry_the_current_avatar() {
        let store = Arc::new(MemoryPreferences::default());
        let service = Arc::new(ScriptedService::default());
        let controller =
            controller_with(service, Arc::new(RecordingPacer::default()), store.clone());

        let default = controller.snapshot().avatar.clone();
        assert!(default.starts_with("data:image/svg+xml;base64,"));
        assert!(!controller.snapshot().custom_avatar);

        controller.submit("@companion 早").await;
        controller.wait_idle().await;

        controller
            .set_avatar("data:image/png;base64,CUSTOM".to_string())
            .await;
        assert_eq!(
            store.get(keys::COMPANION_IMAGE).as_deref(),
            Some("data:image/png;base64,CUSTOM")
        );

        controller.submit("@companion 午").await;
        controller.wait_idle().await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages[0].avatar, default);
        assert_eq!(&*snapshot.messages[2].avatar, "data:image/png;base64,CUSTOM");
        assert_eq!(&*snapshot.messages[3].avatar, "data:image/png;base64,CUSTOM");

        controller.clear_avatar().await;
        assert!(store.get(keys::COMPANION_IMAGE).is_none());
        assert_eq!(controller.snapshot().avatar, default);
    }

    #[tokio::test]
    async fn stored_preferences_are_restored() {
        let store = Arc::new(MemoryPreferences::default());
        store.set(keys::COMPANION_IMAGE, "data:image/png;base64,ME");
        store.set(keys::WALLPAPER, "data:image/png;base64,SKY");

        let controller = controller_with(
            Arc::new(ScriptedService::default()),
            Arc::new(RecordingPacer::default()),
            store,
        );
        let snapshot = controller.snapshot();
        assert_eq!(&*snapshot.avatar, "data:image/png;base64,ME");
        assert!(snapshot.custom_avatar);
        assert_eq!(snapshot.wallpaper.as_deref(), Some("data:image/png;base64,SKY"));
    }
}
