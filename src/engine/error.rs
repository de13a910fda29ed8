// ==========================================
// 记录仪确认分析系统 - 运行级错误类型
// ==========================================
// 单台记录仪的失败进入报告槽位; 只有以下情况让整次运行失败
// ==========================================

use crate::config::ConfigError;
use crate::domain::report::LoggerFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    // ===== 报告无法生成 =====
    #[error("没有可分析的记录仪 (失败 {} 台)", failures.len())]
    NoAnalyzableLoggers { failures: Vec<LoggerFailure> },

    #[error("试验时间窗非法: 结束 {end} 早于开始 {start}")]
    InvalidTestWindow { start: String, end: String },

    // ===== 运行控制 =====
    #[error("分析已取消")]
    Cancelled,

    // ===== 外部协作方 =====
    #[error("验收准则查询失败: {0}")]
    CriteriaLookup(String),

    #[error("分析任务异常退出: {0}")]
    TaskJoin(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type RunResult<T> = Result<T, AnalysisError>;
