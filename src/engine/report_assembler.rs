// ==========================================
// 记录仪确认分析系统 - 报告组装器
// ==========================================
// 职责: 全部记录仪结果的唯一汇合点 → ReportData
// 总结论:
//   - 任一记录仪失败（空序列 / 窗内无采样 / 其他） → Indeterminate
//   - 全部满足准则                                   → Pass
//   - 否则                                           → Fail
// 红线: 输出只依赖输入,不读取当前时间,同一输入序列化结果逐字节一致
// ==========================================

use crate::config::AnalysisConfig;
use crate::domain::criteria::AcceptanceCriteria;
use crate::domain::report::{
    AnalysisResult, LoggerFailure, LoggerOutcome, ReportData, ReportHeader, TemperatureExtreme,
};
use crate::domain::types::ReportOutcome;
use crate::engine::error::{AnalysisError, RunResult};
use crate::i18n::{count_with_unit, t_in, t_in_with_args};
use chrono::NaiveDateTime;

// ==========================================
// ReportAssembler
// ==========================================
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    locale: String,
    decimals: u32,
}

impl ReportAssembler {
    pub fn new(locale: impl Into<String>, decimals: u32) -> Self {
        Self {
            locale: locale.into(),
            decimals,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.locale.clone(), config.display_decimals)
    }

    /// 组装报告
    ///
    /// # 参数
    /// - header: 调用方提供的表头
    /// - outcomes: 按上传顺序排列的单文件结果
    ///
    /// # 返回
    /// - Err(InvalidTestWindow): 完成时间早于开始时间
    /// - Err(NoAnalyzableLoggers): 没有任何成功的分析结果
    pub fn assemble(
        &self,
        header: ReportHeader,
        outcomes: Vec<LoggerOutcome>,
    ) -> RunResult<ReportData> {
        let start = header.date_time_of_test_start;
        let completion = header.date_time_of_test_completion;
        if completion < start {
            return Err(AnalysisError::InvalidTestWindow {
                start: start.to_string(),
                end: completion.to_string(),
            });
        }

        let (results, failures): (Vec<AnalysisResult>, Vec<LoggerFailure>) = {
            let mut results = Vec::new();
            let mut failures = Vec::new();
            for outcome in outcomes {
                match outcome {
                    Ok(result) => results.push(result),
                    Err(failure) => failures.push(failure),
                }
            }
            (results, failures)
        };

        if results.is_empty() {
            return Err(AnalysisError::NoAnalyzableLoggers { failures });
        }

        let result = overall_outcome(&results, &failures);
        let duration_minutes = duration_minutes(start, completion);
        let duration_text = self.duration_text(duration_minutes);
        let min_temperature = min_extreme(&results);
        let max_temperature = max_extreme(&results);

        let acceptance_criteria = header
            .acceptance_criteria
            .clone()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| self.criteria_text(&results));

        let conclusions = self.conclusions(
            start,
            completion,
            &duration_text,
            min_temperature.as_ref(),
            max_temperature.as_ref(),
            result,
            failures.len(),
        );

        tracing::info!(
            result = %result,
            analyzed = results.len(),
            failed = failures.len(),
            duration_minutes,
            "报告组装完成"
        );

        Ok(ReportData {
            header,
            duration_minutes,
            duration_text,
            acceptance_criteria,
            result,
            result_text: self.result_text(result),
            min_temperature,
            max_temperature,
            conclusions,
            results,
            failures,
        })
    }

    fn result_text(&self, outcome: ReportOutcome) -> String {
        let key = match outcome {
            ReportOutcome::Pass => "report.result.pass",
            ReportOutcome::Fail => "report.result.fail",
            ReportOutcome::Indeterminate => "report.result.indeterminate",
        };
        t_in(key, &self.locale)
    }

    /// "2 часа 5 минут" / "45 минут"
    pub fn duration_text(&self, minutes: i64) -> String {
        let minutes = minutes.max(0) as u64;
        let hours = minutes / 60;
        let rest = minutes % 60;

        if hours == 0 {
            return count_with_unit("duration.minutes", minutes, &self.locale);
        }
        let hours_text = count_with_unit("duration.hours", hours, &self.locale);
        if rest == 0 {
            hours_text
        } else {
            format!(
                "{} {}",
                hours_text,
                count_with_unit("duration.minutes", rest, &self.locale)
            )
        }
    }

    /// 由实际应用的准则生成文本（去重,按首次出现顺序）
    fn criteria_text(&self, results: &[AnalysisResult]) -> String {
        let mut distinct: Vec<AcceptanceCriteria> = Vec::new();
        for criteria in results.iter().filter_map(|r| r.criteria) {
            if !distinct.contains(&criteria) {
                distinct.push(criteria);
            }
        }

        if distinct.is_empty() {
            return t_in("report.criteria.not_set", &self.locale);
        }

        distinct
            .iter()
            .map(|c| self.render_criteria(c))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn render_criteria(&self, criteria: &AcceptanceCriteria) -> String {
        let min = criteria.temp_min.to_string();
        let max = criteria.temp_max.to_string();
        let mut text = t_in_with_args(
            "report.criteria.temperature",
            &self.locale,
            &[("min", &min), ("max", &max)],
        );

        let humidity = match (criteria.humidity_min, criteria.humidity_max) {
            (Some(lo), Some(hi)) => Some(t_in_with_args(
                "report.criteria.humidity_range",
                &self.locale,
                &[("min", &lo.to_string()), ("max", &hi.to_string())],
            )),
            (Some(lo), None) => Some(t_in_with_args(
                "report.criteria.humidity_min",
                &self.locale,
                &[("min", &lo.to_string())],
            )),
            (None, Some(hi)) => Some(t_in_with_args(
                "report.criteria.humidity_max",
                &self.locale,
                &[("max", &hi.to_string())],
            )),
            (None, None) => None,
        };
        if let Some(humidity) = humidity {
            text.push_str(", ");
            text.push_str(&humidity);
        }
        text
    }

    #[allow(clippy::too_many_arguments)]
    fn conclusions(
        &self,
        start: NaiveDateTime,
        completion: NaiveDateTime,
        duration_text: &str,
        min: Option<&TemperatureExtreme>,
        max: Option<&TemperatureExtreme>,
        outcome: ReportOutcome,
        failed: usize,
    ) -> String {
        let datetime_format = t_in("report.datetime_format", &self.locale);
        let format_ts = |ts: NaiveDateTime| ts.format(&datetime_format).to_string();

        let mut lines = vec![
            t_in_with_args(
                "report.conclusions.start",
                &self.locale,
                &[("value", &format_ts(start))],
            ),
            t_in_with_args(
                "report.conclusions.completion",
                &self.locale,
                &[("value", &format_ts(completion))],
            ),
            t_in_with_args(
                "report.conclusions.duration",
                &self.locale,
                &[("value", duration_text)],
            ),
        ];

        match (min, max) {
            (Some(min), Some(max)) => {
                lines.push(self.extreme_line("report.conclusions.min", min));
                lines.push(self.extreme_line("report.conclusions.max", max));
            }
            _ => lines.push(t_in("report.conclusions.insufficient_data", &self.locale)),
        }

        lines.push(match outcome {
            ReportOutcome::Pass => t_in("report.conclusions.conformity.pass", &self.locale),
            ReportOutcome::Fail => t_in("report.conclusions.conformity.fail", &self.locale),
            ReportOutcome::Indeterminate => t_in_with_args(
                "report.conclusions.conformity.indeterminate",
                &self.locale,
                &[("count", &count_with_unit("loggers", failed as u64, &self.locale))],
            ),
        });

        lines.join("\n")
    }

    /// 按语言的小数分隔符输出: ru "2,5" / en "2.5"
    fn format_decimal(&self, value: f64) -> String {
        let text = format!("{:.*}", self.decimals as usize, value);
        let separator = t_in("report.decimal_separator", &self.locale);
        if separator == "." {
            text
        } else {
            text.replace('.', &separator)
        }
    }

    fn extreme_line(&self, key: &str, extreme: &TemperatureExtreme) -> String {
        let value = self.format_decimal(extreme.value);
        let zone = extreme.zone_number.to_string();
        t_in_with_args(
            key,
            &self.locale,
            &[
                ("value", &value),
                ("zone", &zone),
                ("level", &extreme.measurement_level),
            ],
        )
    }
}

/// 总结论
pub fn overall_outcome(results: &[AnalysisResult], failures: &[LoggerFailure]) -> ReportOutcome {
    if !failures.is_empty() {
        ReportOutcome::Indeterminate
    } else if results.iter().all(|r| r.meets_limits) {
        ReportOutcome::Pass
    } else {
        ReportOutcome::Fail
    }
}

/// 试验时长（分钟,四舍五入）
pub fn duration_minutes(start: NaiveDateTime, completion: NaiveDateTime) -> i64 {
    let seconds = (completion - start).num_seconds();
    (seconds as f64 / 60.0).round() as i64
}

fn extreme_of(result: &AnalysisResult, value: f64) -> TemperatureExtreme {
    TemperatureExtreme {
        value,
        zone_number: result.zone_number.clone(),
        measurement_level: result.measurement_level.clone(),
        logger_name: result.logger_name.clone(),
    }
}

/// 非外部记录仪中的最低温度（并列取先出现者）
fn min_extreme(results: &[AnalysisResult]) -> Option<TemperatureExtreme> {
    let mut best: Option<&AnalysisResult> = None;
    for result in results.iter().filter(|r| !r.is_external) {
        if best.map_or(true, |b| result.min_temp < b.min_temp) {
            best = Some(result);
        }
    }
    best.map(|r| extreme_of(r, r.min_temp))
}

/// 非外部记录仪中的最高温度（并列取先出现者）
fn max_extreme(results: &[AnalysisResult]) -> Option<TemperatureExtreme> {
    let mut best: Option<&AnalysisResult> = None;
    for result in results.iter().filter(|r| !r.is_external) {
        if best.map_or(true, |b| result.max_temp > b.max_temp) {
            best = Some(result);
        }
    }
    best.map(|r| extreme_of(r, r.max_temp))
}
