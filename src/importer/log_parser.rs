// ==========================================
// 记录仪确认分析系统 - 解析器 Trait 与解析结果
// ==========================================
// 职责: 定义 parse(bytes) 能力 + 统一的跳过/计数规则
// 红线: 畸形行跳过并计数,不中断整个文件;物理范围外的值计为异常,不算解析失败
// ==========================================

use crate::domain::report::{Anomaly, SkippedRow};
use crate::domain::sample::{DeviceIdentity, RawSample};
use crate::domain::types::FormatTag;
use crate::importer::error::{LoggerError, LoggerResult};
use crate::importer::value_parser::PhysicalLimits;

// ==========================================
// LogParser Trait
// ==========================================
// 用途: 每种厂商格式一个实现
// 实现者: CsvLogParser, ExcelLogParser, TestoBinaryParser, TestoTextParser
pub trait LogParser: Send + Sync {
    /// 本解析器处理的格式
    fn format(&self) -> FormatTag;

    /// 解析原始字节
    ///
    /// # 参数
    /// - bytes: 单个文件的原始字节
    /// - limits: 传感器物理范围
    ///
    /// # 返回
    /// - Ok(ParsedLog): 文件顺序的有效采样 + 跳过行 + 异常计数
    /// - Err: TruncatedFile / EncodingError / SpreadsheetError（该文件致命）
    fn parse(&self, bytes: &[u8], limits: &PhysicalLimits) -> LoggerResult<ParsedLog>;
}

// ==========================================
// ParsedLog - 解析结果
// ==========================================
// 采样保持文件顺序,不假设有序;可反复遍历
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub format: FormatTag,
    pub device: Option<DeviceIdentity>,
    samples: Vec<RawSample>,
    pub skipped_rows: Vec<SkippedRow>,
    pub temperature_out_of_range: usize,
    pub humidity_out_of_range: usize,
}

impl ParsedLog {
    /// 有效采样（文件顺序）
    pub fn samples(&self) -> std::slice::Iter<'_, RawSample> {
        self.samples.iter()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_rows.len()
    }

    pub fn into_samples(self) -> Vec<RawSample> {
        self.samples
    }

    /// 解析阶段产生的异常
    pub fn anomalies(&self) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        if !self.skipped_rows.is_empty() {
            anomalies.push(Anomaly::SkippedRows {
                count: self.skipped_rows.len(),
                rows: self.skipped_rows.clone(),
            });
        }
        if self.temperature_out_of_range > 0 {
            anomalies.push(Anomaly::TemperatureOutOfRange {
                count: self.temperature_out_of_range,
            });
        }
        if self.humidity_out_of_range > 0 {
            anomalies.push(Anomaly::HumidityOutOfRange {
                count: self.humidity_out_of_range,
            });
        }
        anomalies
    }
}

// ==========================================
// ParsedLogBuilder - 解析器共用的累积器
// ==========================================
pub struct ParsedLogBuilder {
    format: FormatTag,
    limits: PhysicalLimits,
    samples: Vec<RawSample>,
    skipped_rows: Vec<SkippedRow>,
    temperature_out_of_range: usize,
    humidity_out_of_range: usize,
    data_rows: usize,
}

impl ParsedLogBuilder {
    pub fn new(format: FormatTag, limits: PhysicalLimits) -> Self {
        Self {
            format,
            limits,
            samples: Vec::new(),
            skipped_rows: Vec::new(),
            temperature_out_of_range: 0,
            humidity_out_of_range: 0,
            data_rows: 0,
        }
    }

    /// 写入一条候选采样（应用物理范围规则）
    pub fn push_sample(&mut self, sample: RawSample) {
        self.data_rows += 1;

        if !self.limits.temperature_in_range(sample.temperature) {
            self.temperature_out_of_range += 1;
            return;
        }

        let humidity = match sample.humidity {
            Some(h) if !self.limits.humidity_in_range(h) => {
                self.humidity_out_of_range += 1;
                None
            }
            other => other,
        };

        self.samples.push(RawSample { humidity, ..sample });
    }

    /// 记录一条畸形行（跳过并计数）
    pub fn skip_row(&mut self, row_number: usize, reason: impl Into<String>) {
        self.data_rows += 1;
        let reason = reason.into();
        tracing::debug!(format = %self.format, row = row_number, reason = %reason, "跳过畸形行");
        self.skipped_rows.push(SkippedRow { row_number, reason });
    }

    /// 完成构建
    ///
    /// # 返回
    /// - Err(TruncatedFile): 有表头但没有任何数据行
    pub fn finish(
        self,
        device: Option<DeviceIdentity>,
        file_context: &str,
    ) -> LoggerResult<ParsedLog> {
        if self.data_rows == 0 {
            return Err(LoggerError::TruncatedFile(file_context.to_string()));
        }

        Ok(ParsedLog {
            format: self.format,
            device: device.filter(|d| !d.is_empty()),
            samples: self.samples,
            skipped_rows: self.skipped_rows,
            temperature_out_of_range: self.temperature_out_of_range,
            humidity_out_of_range: self.humidity_out_of_range,
        })
    }
}
