// ==========================================
// 记录仪确认分析系统 - 聚合器
// ==========================================
// 职责: 试验时间窗（闭区间）过滤 + 温湿度 min/max/avg
// 红线:
//   1. 时间窗外的采样不参与统计,但不从序列中删除
//   2. 湿度统计仅在窗内至少一条采样带湿度时存在,否则为 None（不是 0）
//   3. min <= avg <= max 恒成立
// ==========================================

use crate::domain::sample::{MeasurementSeries, TestingPeriod};
use crate::engine::cancel::CancelToken;
use crate::importer::error::{LoggerError, LoggerResult};
use chrono::NaiveDateTime;
use serde::Serialize;

// ==========================================
// 统计量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

// 增量均值: mean += (x - mean) / k,常量序列的均值与该常量逐位相等
#[derive(Debug, Default)]
struct RunningStats {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
}

impl RunningStats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.mean += (value - self.mean) / self.count as f64;
    }

    fn finish(&self) -> Option<Statistics> {
        (self.count > 0).then(|| Statistics {
            min: self.min,
            max: self.max,
            avg: self.mean.clamp(self.min, self.max),
        })
    }
}

// ==========================================
// Aggregate - 单台记录仪的窗内聚合
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub sample_count: usize,          // 窗内采样数
    pub humidity_sample_count: usize, // 窗内带湿度的采样数
    pub excluded_count: usize,        // 窗外采样数
    pub first_timestamp: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
    pub temperature: Statistics,
    pub humidity: Option<Statistics>,
}

// ==========================================
// Aggregator
// ==========================================
pub struct Aggregator {
    cancel: CancelToken,
    batch_size: usize,
}

impl Aggregator {
    pub fn new(cancel: CancelToken, batch_size: usize) -> Self {
        Self {
            cancel,
            batch_size: batch_size.max(1),
        }
    }

    /// 聚合单个序列
    ///
    /// # 返回
    /// - Err(NoSamplesInPeriod): 窗内没有采样
    /// - Err(Cancelled): 批边界检查到取消
    pub fn aggregate(
        &self,
        series: &MeasurementSeries,
        period: &TestingPeriod,
    ) -> LoggerResult<Aggregate> {
        let mut temperature = RunningStats::default();
        let mut humidity = RunningStats::default();
        let mut excluded_count = 0;
        let mut first_timestamp = None;
        let mut last_timestamp = None;

        for batch in series.samples().chunks(self.batch_size) {
            if self.cancel.is_cancelled() {
                return Err(LoggerError::Cancelled);
            }

            for sample in batch {
                if !period.contains(sample.timestamp) {
                    excluded_count += 1;
                    continue;
                }

                // 序列已按时间排序
                first_timestamp.get_or_insert(sample.timestamp);
                last_timestamp = Some(sample.timestamp);

                temperature.push(sample.temperature);
                if let Some(h) = sample.humidity {
                    humidity.push(h);
                }
            }
        }

        let (Some(temperature_stats), Some(first), Some(last)) =
            (temperature.finish(), first_timestamp, last_timestamp)
        else {
            return Err(LoggerError::NoSamplesInPeriod {
                logger_name: series.logger_name().to_string(),
            });
        };

        Ok(Aggregate {
            sample_count: temperature.count,
            humidity_sample_count: humidity.count,
            excluded_count,
            first_timestamp: first,
            last_timestamp: last,
            temperature: temperature_stats,
            humidity: humidity.finish(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::{DeviceIdentity, Placement, RawSample};
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn series(samples: Vec<RawSample>) -> MeasurementSeries {
        MeasurementSeries::from_samples(
            "DL-221",
            "DL-221.csv",
            DeviceIdentity::default(),
            Placement::new(1, "верх", false),
            samples,
        )
    }

    #[test]
    fn test_aggregate_window_filter() {
        let series = series(vec![
            RawSample::new(ts(7, 59), 100.0, Some(90.0)), // 窗外
            RawSample::new(ts(8, 0), 2.0, Some(40.0)),
            RawSample::new(ts(12, 0), 4.0, None),
            RawSample::new(ts(18, 0), 6.0, Some(50.0)),
            RawSample::new(ts(18, 1), -50.0, None), // 窗外
        ]);
        let period = TestingPeriod::new(ts(8, 0), ts(18, 0));

        let aggregate = Aggregator::new(CancelToken::new(), 2)
            .aggregate(&series, &period)
            .unwrap();

        assert_eq!(aggregate.sample_count, 3);
        assert_eq!(aggregate.excluded_count, 2);
        assert_eq!(aggregate.humidity_sample_count, 2);
        assert_eq!(aggregate.temperature.min, 2.0);
        assert_eq!(aggregate.temperature.max, 6.0);
        assert_eq!(aggregate.temperature.avg, 4.0);
        assert_eq!(aggregate.humidity.unwrap().avg, 45.0);
        assert_eq!(aggregate.first_timestamp, ts(8, 0));
        assert_eq!(aggregate.last_timestamp, ts(18, 0));
    }

    #[test]
    fn test_constant_series_exact_stats() {
        let samples = (0..37)
            .map(|i| RawSample::new(ts(10, i), 4.7, Some(33.3)))
            .collect();
        let period = TestingPeriod::new(ts(0, 0), ts(23, 0));

        let aggregate = Aggregator::new(CancelToken::new(), 512)
            .aggregate(&series(samples), &period)
            .unwrap();

        assert_eq!(aggregate.temperature.min, 4.7);
        assert_eq!(aggregate.temperature.avg, 4.7);
        assert_eq!(aggregate.temperature.max, 4.7);
        assert_eq!(aggregate.humidity.unwrap().avg, 33.3);
    }

    #[test]
    fn test_no_humidity_is_none() {
        let series = series(vec![RawSample::new(ts(10, 0), 4.0, None)]);
        let period = TestingPeriod::new(ts(0, 0), ts(23, 0));
        let aggregate = Aggregator::new(CancelToken::new(), 512)
            .aggregate(&series, &period)
            .unwrap();
        assert!(aggregate.humidity.is_none());
    }

    #[test]
    fn test_empty_window() {
        let series = series(vec![RawSample::new(ts(10, 0), 4.0, None)]);
        let period = TestingPeriod::new(ts(11, 0), ts(12, 0));
        let result = Aggregator::new(CancelToken::new(), 512).aggregate(&series, &period);
        assert_eq!(
            result.unwrap_err(),
            LoggerError::NoSamplesInPeriod {
                logger_name: "DL-221".to_string()
            }
        );
    }

    #[test]
    fn test_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let series = series(vec![RawSample::new(ts(10, 0), 4.0, None)]);
        let period = TestingPeriod::new(ts(0, 0), ts(23, 0));
        let result = Aggregator::new(token, 512).aggregate(&series, &period);
        assert_eq!(result.unwrap_err(), LoggerError::Cancelled);
    }
}
