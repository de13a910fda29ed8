// ==========================================
// 记录仪确认分析系统 - 单文件分析管道
// ==========================================
// 流程（严格顺序）: 格式探测 → 格式解析 → 标准化 → 聚合 → 验收评估
// 错误策略:
//   - 单文件致命错误 → LoggerFailure 槽位（携带已收集的异常）
//   - Cancelled     → 向上传播,整批丢弃
// ==========================================

use crate::config::AnalysisConfig;
use crate::domain::criteria::AcceptanceCriteria;
use crate::domain::report::{AnalysisResult, Anomaly, FailureKind, LoggerFailure, LoggerOutcome};
use crate::domain::sample::{LoggerMetadata, TestingPeriod};
use crate::engine::acceptance::{evaluate, Evaluation};
use crate::engine::aggregator::Aggregator;
use crate::engine::cancel::CancelToken;
use crate::i18n::t_in;
use crate::importer::error::{LoggerError, LoggerResult};
use crate::importer::format_detector::{detect, parser_for};
use crate::importer::normalizer::{logger_name_for, normalize};
use crate::importer::value_parser::round_to;
use crate::perf::PerfGuard;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// LoggerUpload - 单个上传文件
// ==========================================
#[derive(Debug, Clone)]
pub struct LoggerUpload {
    pub metadata: LoggerMetadata,
    pub bytes: Vec<u8>,
}

impl LoggerUpload {
    pub fn new(metadata: LoggerMetadata, bytes: Vec<u8>) -> Self {
        Self { metadata, bytes }
    }

    pub fn file_name(&self) -> &str {
        &self.metadata.file_name
    }
}

// 失败槽位需要的上下文（随阶段推进逐步补全）
#[derive(Debug, Default)]
struct SlotContext {
    serial_number: Option<String>,
    anomalies: Vec<Anomaly>,
}

// ==========================================
// AnalysisPipeline
// ==========================================
#[derive(Clone)]
pub struct AnalysisPipeline {
    config: Arc<AnalysisConfig>,
    cancel: CancelToken,
}

impl AnalysisPipeline {
    pub fn new(config: Arc<AnalysisConfig>, cancel: CancelToken) -> Self {
        Self { config, cancel }
    }

    /// 运行单文件管道
    ///
    /// # 返回
    /// - Ok(Ok(result)): 分析成功
    /// - Ok(Err(failure)): 该记录仪无法分析（不影响其他记录仪）
    /// - Err(Cancelled): 运行已取消
    #[instrument(skip_all, fields(file = %upload.file_name()))]
    pub fn run_file(
        &self,
        upload: &LoggerUpload,
        period: &TestingPeriod,
        criteria: Option<AcceptanceCriteria>,
    ) -> LoggerResult<LoggerOutcome> {
        let mut ctx = SlotContext {
            serial_number: upload
                .metadata
                .device
                .as_ref()
                .and_then(|d| d.serial_number.clone()),
            anomalies: Vec::new(),
        };

        match self.analyze(upload, period, criteria, &mut ctx) {
            Ok(result) => Ok(Ok(result)),
            Err(err) => match err.failure_kind() {
                Some(kind) => {
                    warn!(error = %err, kind = ?kind, "记录仪无法分析");
                    Ok(Err(self.failure_slot(upload, ctx, kind, err)))
                }
                // Cancelled（以及不会逃出解析器的 MalformedRecord）
                None => Err(err),
            },
        }
    }

    fn analyze(
        &self,
        upload: &LoggerUpload,
        period: &TestingPeriod,
        criteria: Option<AcceptanceCriteria>,
        ctx: &mut SlotContext,
    ) -> LoggerResult<AnalysisResult> {
        let metadata = &upload.metadata;
        self.check_cancelled()?;

        // 1. 格式探测
        let format = detect(&upload.bytes, &metadata.file_name)?;
        debug!(format = %format, "格式识别完成");

        // 2. 格式解析
        let parsed = {
            let mut perf = PerfGuard::new("parse").with_file(&metadata.file_name);
            let parsed = parser_for(format).parse(&upload.bytes, &self.config.physical_limits())?;
            perf.record_samples(parsed.sample_count());
            parsed
        };
        ctx.anomalies.extend(parsed.anomalies());
        if ctx.serial_number.is_none() {
            ctx.serial_number = parsed.device.as_ref().and_then(|d| d.serial_number.clone());
        }
        info!(
            format = %format,
            samples = parsed.sample_count(),
            skipped = parsed.skipped_count(),
            "解析完成"
        );
        self.check_cancelled()?;

        // 3. 标准化
        let series = normalize(parsed, metadata, self.config.external_zone_code)?;
        ctx.serial_number = series.device().serial_number.clone();
        self.check_cancelled()?;

        // 4. 聚合
        let aggregate = {
            let mut perf = PerfGuard::new("aggregate").with_file(&metadata.file_name);
            perf.record_samples(series.len());
            Aggregator::new(self.cancel.clone(), self.config.cancel_check_batch)
                .aggregate(&series, period)?
        };
        if aggregate.excluded_count > 0 {
            ctx.anomalies.push(Anomaly::SamplesOutsidePeriod {
                count: aggregate.excluded_count,
            });
        }

        // 5. 验收评估
        let placement = series.placement();
        let evaluation = match (&criteria, placement.is_external) {
            (Some(criteria), _) => evaluate(&aggregate, criteria),
            (None, true) => {
                ctx.anomalies.push(Anomaly::CriteriaNotApplied);
                Evaluation {
                    meets_limits: true,
                    incomplete: false,
                }
            }
            (None, false) => {
                return Err(LoggerError::CriteriaNotConfigured {
                    zone_number: placement.zone_number.to_string(),
                    measurement_level: placement.measurement_level.clone(),
                })
            }
        };
        if evaluation.incomplete {
            ctx.anomalies.push(Anomaly::MissingHumidity);
        }

        let decimals = self.config.display_decimals;
        let round = |v: f64| round_to(v, decimals);

        info!(
            samples = aggregate.sample_count,
            meets_limits = evaluation.meets_limits,
            incomplete = evaluation.incomplete,
            "记录仪分析完成"
        );

        Ok(AnalysisResult {
            zone_number: placement.zone_number.clone(),
            zone_label: self.zone_label(placement.is_external, &placement.zone_number.to_string()),
            measurement_level: placement.measurement_level.clone(),
            logger_name: series.logger_name().to_string(),
            serial_number: series.device().serial_number.clone(),
            file_name: series.file_name().to_string(),
            format,
            min_temp: round(aggregate.temperature.min),
            max_temp: round(aggregate.temperature.max),
            avg_temp: round(aggregate.temperature.avg),
            min_humidity: aggregate.humidity.map(|h| round(h.min)),
            max_humidity: aggregate.humidity.map(|h| round(h.max)),
            avg_humidity: aggregate.humidity.map(|h| round(h.avg)),
            meets_limits: evaluation.meets_limits,
            is_external: placement.is_external,
            incomplete: evaluation.incomplete,
            sample_count: aggregate.sample_count,
            criteria,
            anomalies: std::mem::take(&mut ctx.anomalies),
        })
    }

    fn check_cancelled(&self) -> LoggerResult<()> {
        if self.cancel.is_cancelled() {
            Err(LoggerError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn zone_label(&self, is_external: bool, zone: &str) -> String {
        if is_external {
            t_in("report.external_zone", &self.config.locale)
        } else {
            zone.to_string()
        }
    }

    fn failure_slot(
        &self,
        upload: &LoggerUpload,
        ctx: SlotContext,
        kind: FailureKind,
        err: LoggerError,
    ) -> LoggerFailure {
        let metadata = &upload.metadata;
        let placement = metadata
            .placement
            .clone()
            .with_external_code(self.config.external_zone_code);

        LoggerFailure {
            zone_label: self.zone_label(placement.is_external, &placement.zone_number.to_string()),
            zone_number: placement.zone_number,
            measurement_level: placement.measurement_level,
            logger_name: logger_name_for(metadata),
            serial_number: ctx.serial_number,
            file_name: metadata.file_name.clone(),
            is_external: placement.is_external,
            kind,
            message: err.to_string(),
            anomalies: ctx.anomalies,
        }
    }
}
