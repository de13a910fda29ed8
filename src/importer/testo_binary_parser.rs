// ==========================================
// 记录仪确认分析系统 - Testo 174H/174T 二进制解析器
// ==========================================
// 布局:
//   [0x0000, 0x0C00)  头部区域（型号标记 "174H"/"174T" + SerialNumber）
//   [0x0C00, EOF)     数据区域（定长记录,小端序）
//     174T: u32 unix 秒 + f32 温度                 = 8 字节
//     174H: u32 unix 秒 + f32 温度 + f32 湿度      = 12 字节
// 规则: 全零记录为填充,忽略;零时间戳带数据 / 温度 NaN / 尾部残缺记录 → 畸形记录
// ==========================================

use crate::domain::sample::{DeviceIdentity, RawSample};
use crate::domain::types::{DeviceType, FormatTag};
use crate::importer::error::{LoggerError, LoggerResult};
use crate::importer::log_parser::{LogParser, ParsedLog, ParsedLogBuilder};
use crate::importer::value_parser::PhysicalLimits;
use chrono::{DateTime, NaiveDateTime};

pub const DATA_OFFSET: usize = 0x0C00;

const SERIAL_MARKER: &[u8] = b"SerialNumber";

const MAX_SERIAL_LEN: usize = 32;

// ==========================================
// TestoBinaryParser
// ==========================================
pub struct TestoBinaryParser {
    format: FormatTag,
}

impl TestoBinaryParser {
    pub fn model_174h() -> Self {
        Self {
            format: FormatTag::Testo174H,
        }
    }

    pub fn model_174t() -> Self {
        Self {
            format: FormatTag::Testo174T,
        }
    }

    fn has_humidity(&self) -> bool {
        self.format == FormatTag::Testo174H
    }

    fn record_size(&self) -> usize {
        if self.has_humidity() {
            12
        } else {
            8
        }
    }

    fn device_identity(&self, header: &[u8]) -> DeviceIdentity {
        let (model, device_type) = if self.has_humidity() {
            ("testo 174H", DeviceType::DualChannel)
        } else {
            ("testo 174T", DeviceType::SingleChannel)
        };
        DeviceIdentity {
            serial_number: read_serial_number(header),
            model: Some(model.to_string()),
            device_type: Some(device_type),
        }
    }
}

impl LogParser for TestoBinaryParser {
    fn format(&self) -> FormatTag {
        self.format
    }

    fn parse(&self, bytes: &[u8], limits: &PhysicalLimits) -> LoggerResult<ParsedLog> {
        if bytes.len() <= DATA_OFFSET {
            return Err(LoggerError::TruncatedFile(format!(
                "{} 数据区域为空 (文件长度 {} 字节)",
                self.format,
                bytes.len()
            )));
        }

        let (header, data) = bytes.split_at(DATA_OFFSET);
        let record_size = self.record_size();
        let mut builder = ParsedLogBuilder::new(self.format, *limits);

        let mut chunks = data.chunks_exact(record_size);
        for (idx, record) in chunks.by_ref().enumerate() {
            let record_number = idx + 1;
            if record.iter().all(|b| *b == 0) {
                continue;
            }
            match self.decode_record(record) {
                Ok(sample) => builder.push_sample(sample),
                Err(reason) => builder.skip_row(record_number, reason),
            }
        }

        let remainder = chunks.remainder();
        if !remainder.is_empty() && remainder.iter().any(|b| *b != 0) {
            let record_number = data.len() / record_size + 1;
            builder.skip_row(
                record_number,
                format!("尾部残缺记录 ({} 字节)", remainder.len()),
            );
        }

        builder.finish(
            Some(self.device_identity(header)),
            "数据区域只有填充记录",
        )
    }
}

impl TestoBinaryParser {
    /// 解码单条定长记录
    fn decode_record(&self, record: &[u8]) -> Result<RawSample, String> {
        let seconds = read_u32(record, 0);
        if seconds == 0 {
            return Err("时间戳为零".to_string());
        }
        let timestamp = unix_to_naive(seconds).ok_or_else(|| format!("时间戳越界: {}", seconds))?;

        let temperature = read_f32(record, 4);
        if !temperature.is_finite() {
            return Err("温度为 NaN".to_string());
        }

        // 湿度 NaN 视为该采样无湿度读数
        let humidity = if self.has_humidity() {
            Some(read_f32(record, 8)).filter(|h| h.is_finite())
        } else {
            None
        };

        Ok(RawSample::new(timestamp, temperature, humidity))
    }
}

fn read_u32(record: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&record[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

fn read_f32(record: &[u8], offset: usize) -> f64 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&record[offset..offset + 4]);
    // f32 → f64 后按 0.01 精度修正,避免 4.8f32 显示为 4.800000190734863
    let value = f32::from_le_bytes(buf) as f64;
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        value
    }
}

fn unix_to_naive(seconds: u32) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(i64::from(seconds), 0).map(|dt| dt.naive_utc())
}

/// 头部区域中的 SerialNumber 字段
fn read_serial_number(header: &[u8]) -> Option<String> {
    let start = header
        .windows(SERIAL_MARKER.len())
        .position(|w| w == SERIAL_MARKER)?
        + SERIAL_MARKER.len()
        + 1;

    let value: Vec<u8> = header
        .get(start..)?
        .iter()
        .take_while(|b| !matches!(b, 0 | b'\r' | b'\n'))
        .take(MAX_SERIAL_LEN)
        .copied()
        .collect();

    let serial = String::from_utf8_lossy(&value).trim().to_string();
    if serial.is_empty() {
        None
    } else {
        Some(serial)
    }
}
