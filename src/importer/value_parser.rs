// ==========================================
// 记录仪确认分析系统 - 数值/时间清洗器
// ==========================================
// 职责: 小数解析（兼容 "." 与 ","）/ 时间戳解析 / Excel 序列日期换算 / 物理范围校验
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// 单位后缀（地区导出常把单位写进单元格）
const UNIT_SUFFIXES: [&str; 7] = ["°C", "°С", "%RH", "%rh", "%ОВ", "%", "C"];

// 日期时间格式（按优先级）
const DATETIME_FORMATS: [&str; 9] = [
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 3] = ["%d.%m.%Y", "%Y-%m-%d", "%m/%d/%Y"];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

// Excel 1900 日期系统: 序列号 1 = 1900-01-01, 以 1899-12-30 为基准可吸收 1900 闰年缺陷
const EXCEL_MAX_SERIAL: f64 = 2_958_466.0;

/// 解析小数（TRIM + 去单位 + "," → "."）
///
/// # 返回
/// - Some(f64): 有限数值
/// - None: 空值或无法解析
pub fn parse_decimal(value: &str) -> Option<f64> {
    let mut cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();

    for suffix in UNIT_SUFFIXES {
        if let Some(stripped) = cleaned.strip_suffix(suffix) {
            cleaned = stripped.to_string();
            break;
        }
    }

    if cleaned.is_empty() {
        return None;
    }

    let normalized = cleaned.replacen(',', ".", 1);
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 解析时间戳（含纯日期,纯日期取 00:00:00）
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }

    parse_date(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// 解析日期
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// 解析一天内的时间
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
}

/// Excel 序列日期 → NaiveDateTime（四舍五入到秒）
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial <= 0.0 || serial >= EXCEL_MAX_SERIAL {
        return None;
    }

    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let total_seconds = (serial * 86_400.0).round() as i64;
    base.checked_add_signed(Duration::seconds(total_seconds))
}

/// Excel 时间小数（0.5 = 12:00）→ NaiveTime
pub fn excel_fraction_to_time(fraction: f64) -> Option<NaiveTime> {
    if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
        return None;
    }
    let seconds = (fraction * 86_400.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds.min(86_399), 0)
}

/// 四舍五入到指定小数位
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// ==========================================
// PhysicalLimits - 传感器物理范围
// ==========================================
// 超出范围视为传感器伪值: 剔除并计为异常,不算解析失败
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalLimits {
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
}

impl Default for PhysicalLimits {
    fn default() -> Self {
        Self {
            temperature_min: -80.0,
            temperature_max: 150.0,
            humidity_min: 0.0,
            humidity_max: 100.0,
        }
    }
}

impl PhysicalLimits {
    pub fn temperature_in_range(&self, value: f64) -> bool {
        value >= self.temperature_min && value <= self.temperature_max
    }

    pub fn humidity_in_range(&self, value: f64) -> bool {
        value >= self.humidity_min && value <= self.humidity_max
    }
}
