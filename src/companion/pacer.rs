use std::time::Duration;

use async_trait::async_trait;

use crate::config::CompanionConfig;

/// 「待ってから進む」遅延の抽象。テストでは即時に解決する実装を差し込む。
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// tokio のタイマーで待つ実装
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// サイクル内の各遅延
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimings {
    pub thinking: Duration,
    pub happy: Duration,
    pub demo_thinking: Duration,
    pub demo_working: Duration,
}

impl Default for CycleTimings {
    fn default() -> Self {
        Self {
            thinking: Duration::from_millis(1500),
            happy: Duration::from_millis(2000),
            demo_thinking: Duration::from_millis(1500),
            demo_working: Duration::from_millis(2500),
        }
    }
}

impl From<&CompanionConfig> for CycleTimings {
    fn from(config: &CompanionConfig) -> Self {
        Self {
            thinking: Duration::from_millis(config.thinking_ms),
            happy: Duration::from_millis(config.happy_ms),
            demo_thinking: Duration::from_millis(config.thinking_ms),
            demo_working: Duration::from_millis(config.demo_working_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_default_config() {
        assert_eq!(
            CycleTimings::from(&CompanionConfig::default()),
            CycleTimings::default()
        );
    }

    #[tokio::test]
    async fn tokio_pacer_waits_the_full_duration() {
        let start = tokio::time::Instant::now();
        TokioPacer.pause(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
