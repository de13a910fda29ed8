// ==========================================
// 记录仪确认分析系统 - 分析结果与报告模型
// ==========================================
// 职责: AnalysisResult / LoggerFailure / ReportHeader / ReportData
// 红线: 所有异常（跳过行、缺湿度、空序列）必须可在最终输出中枚举
// ==========================================

use crate::domain::criteria::AcceptanceCriteria;
use crate::domain::types::{FormatTag, ReportOutcome, ZoneNumber};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// SkippedRow - 被跳过的畸形行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_number: usize, // 原始文件行号（二进制格式为记录序号）
    pub reason: String,    // 跳过原因
}

// ==========================================
// Anomaly - 可枚举的分析异常
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Anomaly {
    // 畸形行（跳过并计数）
    SkippedRows { count: usize, rows: Vec<SkippedRow> },
    // 温度超出物理范围（传感器伪值,已剔除）
    TemperatureOutOfRange { count: usize },
    // 湿度超出物理范围（湿度读数已剔除,温度保留）
    HumidityOutOfRange { count: usize },
    // 试验时间窗外的采样（保留在序列中,不参与统计）
    SamplesOutsidePeriod { count: usize },
    // 配置了湿度限值但该记录仪无湿度数据
    MissingHumidity,
    // 外部记录仪无验收准则,未评估
    CriteriaNotApplied,
}

// ==========================================
// FailureKind - 记录仪级致命错误类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    UnrecognizedFormat,
    TruncatedFile,
    EncodingError,
    SpreadsheetError,
    EmptySeries,
    NoSamplesInPeriod,
    CriteriaNotConfigured,
}

// ==========================================
// AnalysisResult - 单台记录仪的分析结果
// ==========================================
// 由 聚合 + 评估 产生,不可变,供报告组装使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub zone_number: ZoneNumber,
    pub zone_label: String, // 展示用区域名（外部记录仪为本地化"外部"标签）
    pub measurement_level: String,
    pub logger_name: String,
    pub serial_number: Option<String>,
    pub file_name: String,
    pub format: FormatTag,

    // 温度统计（按配置小数位取整后展示）
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_temp: f64,

    // 湿度统计（无湿度数据时为 None,不是 0）
    pub min_humidity: Option<f64>,
    pub max_humidity: Option<f64>,
    pub avg_humidity: Option<f64>,

    pub meets_limits: bool,       // 是否满足验收准则
    pub is_external: bool,        // 是否为外部记录仪
    pub incomplete: bool,         // 湿度准则不适用（缺湿度数据）
    pub sample_count: usize,      // 参与统计的采样数
    pub criteria: Option<AcceptanceCriteria>, // 实际应用的准则
    pub anomalies: Vec<Anomaly>,
}

// ==========================================
// LoggerFailure - 无法分析的记录仪槽位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerFailure {
    pub zone_number: ZoneNumber,
    pub zone_label: String,
    pub measurement_level: String,
    pub logger_name: String,
    pub serial_number: Option<String>,
    pub file_name: String,
    pub is_external: bool,
    pub kind: FailureKind,
    pub message: String,
    pub anomalies: Vec<Anomaly>,
}

/// 单文件管道的结果: 成功的分析结果或被捕获的失败
pub type LoggerOutcome = Result<AnalysisResult, LoggerFailure>;

// ==========================================
// ReportHeader - 报告表头（调用方提供）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    #[serde(default)]
    pub report_no: Option<String>,
    #[serde(default)]
    pub report_date: Option<NaiveDate>,
    pub name_of_object: String,
    #[serde(default)]
    pub name_of_air_conditioning_system: Option<String>,
    pub name_of_test: String,
    pub date_time_of_test_start: NaiveDateTime,
    pub date_time_of_test_completion: NaiveDateTime,
    #[serde(default)]
    pub acceptance_criteria: Option<String>, // 缺省时由实际应用的准则生成
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub test_date: Option<NaiveDate>,
}

// ==========================================
// TemperatureExtreme - 温度极值及其位置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureExtreme {
    pub value: f64,
    pub zone_number: ZoneNumber,
    pub measurement_level: String,
    pub logger_name: String,
}

// ==========================================
// ReportData - 最终报告数据
// ==========================================
// 每次分析运行只生成一次; 由外部协作方持久化/渲染
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub header: ReportHeader,
    pub duration_minutes: i64,
    pub duration_text: String,
    pub acceptance_criteria: String,
    pub result: ReportOutcome,
    pub result_text: String,
    pub min_temperature: Option<TemperatureExtreme>,
    pub max_temperature: Option<TemperatureExtreme>,
    pub conclusions: String,
    pub results: Vec<AnalysisResult>,
    pub failures: Vec<LoggerFailure>,
}

impl ReportData {
    /// 枚举全部异常: (文件名, 异常)
    pub fn anomalies(&self) -> Vec<(&str, &Anomaly)> {
        let from_results = self
            .results
            .iter()
            .flat_map(|r| r.anomalies.iter().map(move |a| (r.file_name.as_str(), a)));
        let from_failures = self
            .failures
            .iter()
            .flat_map(|f| f.anomalies.iter().map(move |a| (f.file_name.as_str(), a)));
        from_results.chain(from_failures).collect()
    }

    /// 被跳过的畸形行总数
    pub fn skipped_row_count(&self) -> usize {
        self.anomalies()
            .into_iter()
            .map(|(_, a)| match a {
                Anomaly::SkippedRows { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }
}
