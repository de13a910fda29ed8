// ==========================================
// 记录仪确认分析系统 - 单文件/单记录仪错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播策略: 单文件/单记录仪致命错误被捕获为报告槽位,不中断整批分析
// ==========================================

use crate::domain::report::FailureKind;
use thiserror::Error;

/// 单文件管道错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoggerError {
    // ===== 格式识别 =====
    #[error("无法识别的文件格式: {file_name}")]
    UnrecognizedFormat { file_name: String },

    // ===== 解析错误 =====
    // 可恢复: 解析器内部跳过并计数,不会从 parse() 返回
    #[error("畸形记录 (行 {row}): {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("文件被截断: 存在表头但没有数据行 ({0})")]
    TruncatedFile(String),

    #[error("文本解码失败: {0}")]
    EncodingError(String),

    #[error("Excel 解析失败: {0}")]
    SpreadsheetError(String),

    // ===== 记录仪级错误 =====
    #[error("过滤后没有任何有效采样: {logger_name}")]
    EmptySeries { logger_name: String },

    #[error("试验时间窗内没有采样: {logger_name}")]
    NoSamplesInPeriod { logger_name: String },

    #[error("未配置验收准则 (区域 {zone_number}, 测量层 {measurement_level})")]
    CriteriaNotConfigured {
        zone_number: String,
        measurement_level: String,
    },

    // ===== 运行控制 =====
    #[error("分析已取消")]
    Cancelled,
}

impl LoggerError {
    /// 映射为报告中的失败类别
    ///
    /// # 返回
    /// - Some(FailureKind): 记录仪级致命错误
    /// - None: 可恢复错误或运行控制信号（不进入报告槽位）
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            LoggerError::UnrecognizedFormat { .. } => Some(FailureKind::UnrecognizedFormat),
            LoggerError::TruncatedFile(_) => Some(FailureKind::TruncatedFile),
            LoggerError::EncodingError(_) => Some(FailureKind::EncodingError),
            LoggerError::SpreadsheetError(_) => Some(FailureKind::SpreadsheetError),
            LoggerError::EmptySeries { .. } => Some(FailureKind::EmptySeries),
            LoggerError::NoSamplesInPeriod { .. } => Some(FailureKind::NoSamplesInPeriod),
            LoggerError::CriteriaNotConfigured { .. } => Some(FailureKind::CriteriaNotConfigured),
            LoggerError::MalformedRecord { .. } | LoggerError::Cancelled => None,
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for LoggerError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Utf8 { .. } => LoggerError::EncodingError(err.to_string()),
            _ => LoggerError::MalformedRecord {
                row: err.position().map(|p| p.line() as usize).unwrap_or(0),
                reason: err.to_string(),
            },
        }
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for LoggerError {
    fn from(err: calamine::Error) -> Self {
        LoggerError::SpreadsheetError(err.to_string())
    }
}

/// Result 类型别名
pub type LoggerResult<T> = Result<T, LoggerError>;
