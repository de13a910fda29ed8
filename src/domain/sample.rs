// ==========================================
// 记录仪确认分析系统 - 采样与序列模型
// ==========================================
// 职责: RawSample / DeviceIdentity / Placement / TestingPeriod / MeasurementSeries
// 红线: 可缺失字段一律用 Option,禁止用空字符串或 0 代替"缺失"
// ==========================================

use crate::domain::types::{DeviceType, ZoneNumber};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// RawSample - 单条仪表读数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: NaiveDateTime, // 记录仪本地时间
    pub temperature: f64,         // 温度 (°C)
    pub humidity: Option<f64>,    // 相对湿度 (%RH)，单通道设备为 None
}

impl RawSample {
    pub fn new(timestamp: NaiveDateTime, temperature: f64, humidity: Option<f64>) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
        }
    }
}

// ==========================================
// DeviceIdentity - 物理记录仪身份
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub serial_number: Option<String>,  // 序列号
    pub model: Option<String>,          // 型号 (如 DL-221 / testo 174H)
    pub device_type: Option<DeviceType>, // 通道类型
}

impl DeviceIdentity {
    pub fn is_empty(&self) -> bool {
        self.serial_number.is_none() && self.model.is_none() && self.device_type.is_none()
    }

    /// 逐字段合并: self 的非空字段优先, 缺失字段回落到 fallback
    pub fn or(self, fallback: &DeviceIdentity) -> DeviceIdentity {
        DeviceIdentity {
            serial_number: self.serial_number.or_else(|| fallback.serial_number.clone()),
            model: self.model.or_else(|| fallback.model.clone()),
            device_type: self.device_type.or(fallback.device_type),
        }
    }
}

// ==========================================
// Placement - 记录仪在确认对象中的布点
// ==========================================
// 由调用方提供,从不从文件内容推断
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub zone_number: ZoneNumber,    // 区域编号
    pub measurement_level: String,  // 测量层 (如 "верх" / "низ")
    #[serde(default)]
    pub is_external: bool,          // 是否为外部（环境）记录仪
}

impl Placement {
    pub fn new(
        zone_number: impl Into<ZoneNumber>,
        measurement_level: impl Into<String>,
        is_external: bool,
    ) -> Self {
        Self {
            zone_number: zone_number.into(),
            measurement_level: measurement_level.into(),
            is_external,
        }
    }

    /// 外部区域编码（如 999）同样视为外部记录仪
    pub fn with_external_code(mut self, external_zone_code: u32) -> Self {
        if self.zone_number.is_code(external_zone_code) {
            self.is_external = true;
        }
        self
    }
}

// ==========================================
// TestingPeriod - 确认试验时间窗（闭区间）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestingPeriod {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

impl TestingPeriod {
    pub fn new(start_date: NaiveDateTime, end_date: NaiveDateTime) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// 闭区间判定: start <= ts <= end
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start_date <= timestamp && timestamp <= self.end_date
    }

    pub fn is_valid(&self) -> bool {
        self.start_date <= self.end_date
    }
}

// ==========================================
// LoggerMetadata - 上传文件随附的带外元数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerMetadata {
    pub file_name: String,                // 上传文件名
    pub placement: Placement,             // 布点
    #[serde(default)]
    pub device: Option<DeviceIdentity>,   // 调用方提供的设备信息（优先于文件内容）
    #[serde(default)]
    pub logger_name: Option<String>,      // 记录仪名称（缺省取文件名前 6 个字符）
}

impl LoggerMetadata {
    pub fn new(file_name: impl Into<String>, placement: Placement) -> Self {
        Self {
            file_name: file_name.into(),
            placement,
            device: None,
            logger_name: None,
        }
    }

    pub fn with_device(mut self, device: DeviceIdentity) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_logger_name(mut self, logger_name: impl Into<String>) -> Self {
        self.logger_name = Some(logger_name.into());
        self
    }
}

// ==========================================
// MeasurementSeries - 标准化后的测量序列
// ==========================================
// 不变量: samples 按 timestamp 非递减排列（稳定排序,同时间戳保持文件原始顺序）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSeries {
    logger_name: String,
    file_name: String,
    device: DeviceIdentity,
    placement: Placement,
    samples: Vec<RawSample>,
}

impl MeasurementSeries {
    /// 构造序列（内部完成稳定排序,保证不变量）
    pub fn from_samples(
        logger_name: impl Into<String>,
        file_name: impl Into<String>,
        device: DeviceIdentity,
        placement: Placement,
        mut samples: Vec<RawSample>,
    ) -> Self {
        // Vec::sort_by_key 为稳定排序
        samples.sort_by_key(|s| s.timestamp);
        Self {
            logger_name: logger_name.into(),
            file_name: file_name.into(),
            device,
            placement,
            samples,
        }
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_series_sorted_and_stable() {
        let samples = vec![
            RawSample::new(ts(10, 20), 5.0, None),
            RawSample::new(ts(10, 0), 1.0, None),
            RawSample::new(ts(10, 10), 2.0, None),
            RawSample::new(ts(10, 0), 3.0, None), // 与第 2 条时间戳相同
        ];

        let series = MeasurementSeries::from_samples(
            "DL-221",
            "DL-221.csv",
            DeviceIdentity::default(),
            Placement::new(1, "верх", false),
            samples,
        );

        let temps: Vec<f64> = series.samples().iter().map(|s| s.temperature).collect();
        assert_eq!(temps, vec![1.0, 3.0, 2.0, 5.0]);
    }

    #[test]
    fn test_testing_period_inclusive() {
        let period = TestingPeriod::new(ts(8, 0), ts(18, 0));
        assert!(period.contains(ts(8, 0)));
        assert!(period.contains(ts(18, 0)));
        assert!(!period.contains(ts(18, 1)));
        assert!(period.is_valid());
    }

    #[test]
    fn test_device_identity_merge() {
        let caller = DeviceIdentity {
            serial_number: Some("83401350".to_string()),
            model: None,
            device_type: None,
        };
        let from_file = DeviceIdentity {
            serial_number: Some("00000000".to_string()),
            model: Some("testo 174H".to_string()),
            device_type: Some(DeviceType::DualChannel),
        };

        let merged = caller.or(&from_file);
        assert_eq!(merged.serial_number.as_deref(), Some("83401350"));
        assert_eq!(merged.model.as_deref(), Some("testo 174H"));
        assert_eq!(merged.device_type, Some(DeviceType::DualChannel));
    }

    #[test]
    fn test_placement_external_code() {
        let placement = Placement::new(999, "-", false).with_external_code(999);
        assert!(placement.is_external);

        let internal = Placement::new(1, "верх", false).with_external_code(999);
        assert!(!internal.is_external);

        let from_json: Placement =
            serde_json::from_str(r#"{"zone_number": "999", "measurement_level": "улица"}"#)
                .unwrap();
        assert!(from_json.with_external_code(999).is_external);
    }
}
