//! ログ初期化モジュール
//!
//! `tracing` + `tracing-subscriber` でデバッグログを外部ファイルに出力する。
//! REPL の画面を汚さないよう、ログは端末には出さない。
//! ログファイルは `var/logs/` ディレクトリにローカル時刻基準で日次ローテーションされる。

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_PREFIX: &str = "vibe.log";

/// ログ行のタイムスタンプをローカル時刻で出力するタイマー
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// ローカル日付で日次ローテーションするファイルアペンダー。
///
/// 書き込みのたびに日付を確認し、変わっていれば新しいファイルを開く。
/// `tracing_appender::non_blocking` と組み合わせて使用する。
struct DailyAppender {
    dir: PathBuf,
    prefix: String,
    current_date: NaiveDate,
    file: File,
}

impl DailyAppender {
    fn new(dir: PathBuf, prefix: &str) -> std::io::Result<Self> {
        let today = Local::now().date_naive();
        let file = Self::open_log_file(&dir, prefix, today)?;
        Ok(Self {
            dir,
            prefix: prefix.to_string(),
            current_date: today,
            file,
        })
    }

    fn file_name(prefix: &str, date: NaiveDate) -> String {
        format!("{}.{}", prefix, date.format("%Y-%m-%d"))
    }

    fn open_log_file(dir: &Path, prefix: &str, date: NaiveDate) -> std::io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(Self::file_name(prefix, date)))
    }
}

impl Write for DailyAppender {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let today = Local::now().date_naive();
        if today != self.current_date {
            self.file = Self::open_log_file(&self.dir, &self.prefix, today)?;
            self.current_date = today;
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

/// ログの出力先ディレクトリを決定する。
///
/// 優先順: `VIBE_LOG_DIR` → `CARGO_MANIFEST_DIR/var/logs`（開発時）→ `./var/logs`
fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("VIBE_LOG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        return PathBuf::from(manifest_dir).join("var").join("logs");
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("var")
        .join("logs")
}

/// ログシステムを初期化する。
///
/// - ログレベルは `VIBE_LOG` 環境変数で制御（デフォルト: `debug`）
/// - 出力先は `var/logs/vibe.log.YYYY-MM-DD`
///
/// 返される `WorkerGuard` は `main()` で保持し続けること（ドロップするとログ出力が停止する）。
pub fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = log_dir();

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = DailyAppender::new(log_dir.clone(), LOG_PREFIX)
        .with_context(|| format!("failed to create log file in {}", log_dir.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_env("VIBE_LOG").unwrap_or_else(|_| EnvFilter::new("debug"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_timer(LocalTimer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_file(true)
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn file_name_carries_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            DailyAppender::file_name(LOG_PREFIX, date),
            "vibe.log.2025-01-31"
        );
    }

    #[test]
    fn appender_writes_into_todays_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut appender = DailyAppender::new(tmp.path().to_path_buf(), LOG_PREFIX).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let expected = tmp
            .path()
            .join(DailyAppender::file_name(LOG_PREFIX, Local::now().date_naive()));
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "hello\n");
    }

    #[test]
    #[serial]
    fn log_dir_prefers_explicit_override() {
        std::env::set_var("VIBE_LOG_DIR", "/tmp/vibe-logs-test");
        assert_eq!(log_dir(), PathBuf::from("/tmp/vibe-logs-test"));
        std::env::remove_var("VIBE_LOG_DIR");
        assert!(log_dir().ends_with("var/logs"));
    }
}
