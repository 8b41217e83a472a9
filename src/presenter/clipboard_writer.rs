//! # 剪贴板写入模块
//!
//! ## 设计思路
//!
//! 将与操作系统剪贴板交互的逻辑独立出来，便于隔离平台不稳定因素。
//! 使用阻塞线程执行写入，避免阻塞 async 运行时。
//!
//! ## 实现思路
//!
//! 剪贴板可能被其他进程短暂占用，写入失败时按指数退避重试，
//! 总等待时间受 `clipboard_retry_max_total_ms` 限制。
//! 这里的重试只属于展示层；取色流水线本身从不重试。

use std::time::{Duration, Instant};

use super::{ColorFormat, copy_text};
use crate::error::PaletteError;
use crate::palette::{PaletteConfig, PaletteEntry};

/// 剪贴板重试策略。
#[derive(Debug, Clone, Copy)]
pub struct ClipboardRetryPolicy {
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub max_total_ms: u64,
}

impl From<&PaletteConfig> for ClipboardRetryPolicy {
    fn from(config: &PaletteConfig) -> Self {
        Self {
            retries: config.clipboard_retries,
            retry_delay_ms: config.clipboard_retry_delay,
            max_total_ms: config.clipboard_retry_max_total_ms,
        }
    }
}

fn compute_backoff_delay(base_delay_ms: u64, attempt: u32) -> u64 {
    base_delay_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(8))
}

fn would_exceed_retry_budget(elapsed_ms: u64, wait_ms: u64, budget_ms: u64) -> bool {
    elapsed_ms.saturating_add(wait_ms) > budget_ms
}

/// 文本剪贴板写入器。
#[derive(Debug, Clone)]
pub struct ClipboardWriter {
    policy: ClipboardRetryPolicy,
}

impl ClipboardWriter {
    pub fn new(policy: ClipboardRetryPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &PaletteConfig) -> Self {
        Self::new(ClipboardRetryPolicy::from(config))
    }

    /// 复制整个调色板（逐行一个颜色值）。
    pub async fn copy_colors(
        &self,
        palette: &[PaletteEntry],
        format: ColorFormat,
    ) -> Result<(), PaletteError> {
        self.copy_value(copy_text(palette, format)).await
    }

    /// 复制单个颜色值。
    pub async fn copy_value(&self, text: String) -> Result<(), PaletteError> {
        log::debug!("📋 准备复制到剪贴板 - {} 字符", text.chars().count());

        let policy = self.policy;
        tokio::task::spawn_blocking(move || {
            Self::write_text_with_retry(&text, policy, |value| {
                let mut clipboard = arboard::Clipboard::new()
                    .map_err(|e| format!("无法打开剪贴板：{}", e))?;
                clipboard
                    .set_text(value.to_string())
                    .map_err(|e| format!("复制失败：{}", e))
            })
        })
        .await
        .map_err(|e| PaletteError::Clipboard(format!("线程执行失败：{}", e)))?
    }

    /// 在阻塞线程中执行写入 + 重试。
    fn write_text_with_retry<W>(
        text: &str,
        policy: ClipboardRetryPolicy,
        mut write: W,
    ) -> Result<(), PaletteError>
    where
        W: FnMut(&str) -> Result<(), String>,
    {
        let retry_count = policy.retries.max(1);
        let started = Instant::now();
        let mut last_error = None;

        for attempt in 1..=retry_count {
            if attempt > 1 {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let wait_ms = compute_backoff_delay(policy.retry_delay_ms.max(1), attempt - 1);

                if would_exceed_retry_budget(elapsed_ms, wait_ms, policy.max_total_ms) {
                    log::warn!(
                        "⏱️ 跳过第 {} 次重试：等待 {}ms 会超过预算 {}ms",
                        attempt,
                        wait_ms,
                        policy.max_total_ms
                    );
                    break;
                }

                log::debug!("🔄 重试 {}/{}，等待 {}ms", attempt, retry_count, wait_ms);
                std::thread::sleep(Duration::from_millis(wait_ms));
            }

            match write(text) {
                Ok(()) => {
                    log::info!("✅ 复制成功 (尝试 {})", attempt);
                    return Ok(());
                }
                Err(message) => {
                    log::warn!("❌ 尝试 {} 失败: {}", attempt, message);
                    last_error = Some(message);
                }
            }
        }

        Err(PaletteError::Clipboard(
            last_error.unwrap_or_else(|| "未知错误".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(retries: u32) -> ClipboardRetryPolicy {
        ClipboardRetryPolicy {
            retries,
            retry_delay_ms: 1,
            max_total_ms: 1_000,
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(compute_backoff_delay(100, 1), 100);
        assert_eq!(compute_backoff_delay(100, 3), 400);
        assert_eq!(compute_backoff_delay(100, 40), 100 * 256);
    }

    #[test]
    fn retry_budget_checker_works() {
        assert!(would_exceed_retry_budget(1700, 120, 1800));
        assert!(!would_exceed_retry_budget(1600, 120, 1800));
        assert!(!would_exceed_retry_budget(0, 0, 1800));
    }

    #[test]
    fn succeeds_after_transient_failure() {
        let mut calls = 0;
        let result = ClipboardWriter::write_text_with_retry("#f00000", policy(3), |text| {
            calls += 1;
            assert_eq!(text, "#f00000");
            if calls < 2 { Err("busy".to_string()) } else { Ok(()) }
        });

        assert!(result.is_ok());
        assert_eq!(calls, 2);
    }

    #[test]
    fn reports_last_error_when_attempts_run_out() {
        let mut calls = 0;
        let result = ClipboardWriter::write_text_with_retry("x", policy(2), |_| {
            calls += 1;
            Err(format!("failure {}", calls))
        });

        match result {
            Err(PaletteError::Clipboard(message)) => assert_eq!(message, "failure 2"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn zero_retries_still_attempts_once() {
        let mut calls = 0;
        let _ = ClipboardWriter::write_text_with_retry("x", policy(0), |_| {
            calls += 1;
            Err("nope".to_string())
        });

        assert_eq!(calls, 1);
    }
}
