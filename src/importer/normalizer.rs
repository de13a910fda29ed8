// ==========================================
// 记录仪确认分析系统 - 标准化器
// ==========================================
// 职责: ParsedLog + 带外元数据 → MeasurementSeries
// 规则:
//   1. 设备信息逐字段合并: 调用方 > 文件内容 > 文件名（DL-<型号>_<序列号>_YYYY_MM_DD_HH_MM_SS）
//   2. 记录仪名称缺省取文件名主干前 6 个字符
//   3. 采样稳定排序（由 MeasurementSeries 保证）
//   4. 没有有效采样 → EmptySeries
// ==========================================

use crate::domain::sample::{DeviceIdentity, LoggerMetadata, MeasurementSeries};
use crate::importer::error::{LoggerError, LoggerResult};
use crate::importer::log_parser::ParsedLog;
use std::path::Path;

const LOGGER_NAME_CHARS: usize = 6;

const DL_PREFIX: &str = "DL-";

/// 标准化单个解析结果
///
/// # 参数
/// - parsed: 解析器输出
/// - metadata: 调用方提供的布点/设备/名称
/// - external_zone_code: 视为外部记录仪的区域编码
pub fn normalize(
    parsed: ParsedLog,
    metadata: &LoggerMetadata,
    external_zone_code: u32,
) -> LoggerResult<MeasurementSeries> {
    let logger_name = logger_name_for(metadata);

    if parsed.sample_count() == 0 {
        return Err(LoggerError::EmptySeries { logger_name });
    }

    let from_file = parsed.device.clone().unwrap_or_default();
    let from_name = device_from_file_name(&metadata.file_name).unwrap_or_default();
    let device = metadata
        .device
        .clone()
        .unwrap_or_default()
        .or(&from_file)
        .or(&from_name);

    let placement = metadata
        .placement
        .clone()
        .with_external_code(external_zone_code);

    Ok(MeasurementSeries::from_samples(
        logger_name,
        metadata.file_name.clone(),
        device,
        placement,
        parsed.into_samples(),
    ))
}

/// 记录仪名称: 调用方指定,否则取文件名主干前 6 个字符
pub fn logger_name_for(metadata: &LoggerMetadata) -> String {
    if let Some(name) = metadata.logger_name.as_deref().map(str::trim) {
        if !name.is_empty() {
            return name.to_string();
        }
    }

    file_stem(&metadata.file_name)
        .chars()
        .take(LOGGER_NAME_CHARS)
        .collect()
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// 从 DL 系列导出文件名中提取型号与序列号
pub fn device_from_file_name(file_name: &str) -> Option<DeviceIdentity> {
    let stem = file_stem(file_name);
    if !stem.starts_with(DL_PREFIX) {
        return None;
    }

    let parts: Vec<&str> = stem.split('_').collect();
    // 型号 + 序列号 + 6 段时间
    if parts.len() != 8 || !parts[2..].iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    if parts[1].is_empty() {
        return None;
    }

    Some(DeviceIdentity {
        serial_number: Some(parts[1].to_string()),
        model: Some(parts[0].to_string()),
        device_type: None,
    })
}
