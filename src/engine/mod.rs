// ==========================================
// 记录仪确认分析系统 - 引擎层
// ==========================================
// 职责: 聚合 / 验收评估 / 单文件管道 / 并发运行 / 报告组装
// 红线: 准则显式传入评估器; 单台记录仪失败不中断整批
// ==========================================

pub mod acceptance;
pub mod aggregator;
pub mod cancel;
pub mod error;
pub mod pipeline;
pub mod report_assembler;
pub mod runner;

// 重导出核心引擎
pub use acceptance::{evaluate, Evaluation};
pub use aggregator::{Aggregate, Aggregator, Statistics};
pub use cancel::CancelToken;
pub use error::{AnalysisError, RunResult};
pub use pipeline::{AnalysisPipeline, LoggerUpload};
pub use report_assembler::ReportAssembler;
pub use runner::ReportRunner;
