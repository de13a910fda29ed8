// ==========================================
// 记录仪确认分析系统 - 领域模型层
// ==========================================
// 职责: 定义采样、序列、准则、分析结果与报告的数据契约
// 红线: 不含解析逻辑,不含统计/评估逻辑
// ==========================================

pub mod criteria;
pub mod report;
pub mod sample;
pub mod types;

// 重导出核心类型
pub use criteria::AcceptanceCriteria;
pub use report::{
    AnalysisResult, Anomaly, FailureKind, LoggerFailure, LoggerOutcome, ReportData, ReportHeader,
    SkippedRow, TemperatureExtreme,
};
pub use sample::{
    DeviceIdentity, LoggerMetadata, MeasurementSeries, Placement, RawSample, TestingPeriod,
};
pub use types::{DeviceType, FormatTag, ReportOutcome, ZoneNumber};
