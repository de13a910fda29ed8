// ==========================================
// 记录仪确认分析系统 - 配置层
// ==========================================
// 职责: 分析参数（默认值 → 配置文件 → 环境变量）+ 验收准则来源
// ==========================================

pub mod analysis_config;
pub mod criteria_source;

// 重导出
pub use analysis_config::{config_keys, default_config_path, AnalysisConfig, ConfigError};
pub use criteria_source::{
    AcceptanceCriteriaSource, CriteriaEntry, CriteriaSourceError, CriteriaTable,
};
