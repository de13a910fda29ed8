// ==========================================
// 记录仪确认分析系统 - 性能统计
// ==========================================
// PerfGuard: 作用域结束时以 target "perf" 输出耗时与处理采样数
// ==========================================

use std::time::Instant;

/// 性能统计 Guard：记录 elapsed_ms + 处理的采样数
///
/// 使用方式：
/// ```ignore
/// let mut perf = logger_qualification::perf::PerfGuard::new("parse").with_file("DL-221.csv");
/// // do work...
/// perf.record_samples(parsed.sample_count());
/// ```
pub struct PerfGuard {
    op: &'static str,
    file: Option<String>,
    start: Instant,
    samples: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            file: None,
            start: Instant::now(),
            samples: 0,
        }
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.file = Some(file.to_string());
        self
    }

    pub fn record_samples(&mut self, count: usize) {
        self.samples = self.samples.saturating_add(count as u64);
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;

        tracing::info!(
            target: "perf",
            op = self.op,
            file = self.file.as_deref().unwrap_or("-"),
            elapsed_ms,
            samples = self.samples,
            "done"
        );
    }
}
