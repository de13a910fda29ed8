// ==========================================
// 记录仪确认分析系统 - 核心库
// ==========================================
// 职责: 环境记录仪导出文件 → 标准化序列 → 按区域/测量层聚合
//       → 验收评估 → 确认报告数据 (ReportData)
// 边界: 不含 HTTP / 持久化 / 文档渲染,由外部协作方完成
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "ru");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 采样/序列/准则/报告
pub mod domain;

// 导入层 - 格式探测/解析/标准化
pub mod importer;

// 引擎层 - 聚合/评估/并发运行/报告组装
pub mod engine;

// 配置层 - 分析参数与验收准则来源
pub mod config;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DeviceType, FormatTag, ReportOutcome, ZoneNumber};

// 领域实体
pub use domain::{
    AcceptanceCriteria, AnalysisResult, Anomaly, DeviceIdentity, FailureKind, LoggerFailure,
    LoggerMetadata, MeasurementSeries, Placement, RawSample, ReportData, ReportHeader,
    TestingPeriod,
};

// 导入
pub use importer::{detect, normalize, parser_for, LogParser, LoggerError, LoggerResult, ParsedLog};

// 引擎
pub use engine::{
    AnalysisError, AnalysisPipeline, CancelToken, LoggerUpload, ReportAssembler, ReportRunner,
    RunResult,
};

// 配置
pub use config::{AcceptanceCriteriaSource, AnalysisConfig, CriteriaTable};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "记录仪确认分析系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
