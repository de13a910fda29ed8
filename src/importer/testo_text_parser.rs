// ==========================================
// 记录仪确认分析系统 - Testo 文本表格解析器
// ==========================================
// 数据行: <id> <DD.MM.YYYY> <HH:MM:SS> <温度> [<湿度>]（空白分隔）
// 第一条数据行之前的行视为文件头,仅用于提取序列号
// ==========================================

use crate::domain::sample::{DeviceIdentity, RawSample};
use crate::domain::types::FormatTag;
use crate::importer::csv_parser::decode_text;
use crate::importer::error::LoggerResult;
use crate::importer::log_parser::{LogParser, ParsedLog, ParsedLogBuilder};
use crate::importer::table_layout::HEADER_SCAN_ROWS;
use crate::importer::value_parser::{parse_decimal, PhysicalLimits};
use chrono::{NaiveDate, NaiveTime};

const SERIAL_LABELS: [&str; 3] = ["serial number", "серийный номер", "s/n"];

#[derive(Debug, PartialEq)]
enum TextLine {
    Blank,
    Header,
    Sample(RawSample),
    Malformed(String),
}

fn classify_line(line: &str) -> TextLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return TextLine::Blank;
    }
    if tokens.len() < 3 || !tokens[0].chars().all(|c| c.is_ascii_digit()) {
        return TextLine::Header;
    }

    let date = NaiveDate::parse_from_str(tokens[1], "%d.%m.%Y").ok();
    let time = NaiveTime::parse_from_str(tokens[2], "%H:%M:%S").ok();
    // 序号开头的行一律视为数据行,时间戳坏了也要计入跳过
    let Some(timestamp) = date.zip(time).map(|(d, t)| d.and_time(t)) else {
        return TextLine::Malformed("时间戳无法解析".to_string());
    };

    let Some(temperature) = tokens.get(3).and_then(|t| parse_decimal(t)) else {
        return TextLine::Malformed("温度缺失或无法解析".to_string());
    };

    let humidity = match tokens.get(4) {
        None => None,
        Some(token) => match parse_decimal(token) {
            Some(h) => Some(h),
            None => return TextLine::Malformed("湿度无法解析".to_string()),
        },
    };

    TextLine::Sample(RawSample::new(timestamp, temperature, humidity))
}

/// 文本是否为 Testo 表格导出（前若干行内出现数据行）
pub fn looks_like_testo_table(text: &str) -> bool {
    text.lines()
        .take(HEADER_SCAN_ROWS * 2)
        .any(|line| matches!(classify_line(line), TextLine::Sample(_)))
}

fn serial_from_header(line: &str) -> Option<String> {
    let lower = line.to_lowercase();
    SERIAL_LABELS.iter().find_map(|label| {
        let pos = lower.find(label)?;
        // ASCII/西里尔字母小写后字节偏移不变; 偏移落在字符中间时 get 返回 None
        let rest = line.get(pos + label.len()..)?;
        let value = rest
            .trim_start_matches(|c: char| c == ':' || c == '=' || c.is_whitespace())
            .split_whitespace()
            .next()?;
        Some(value.to_string())
    })
}

// ==========================================
// TestoTextParser
// ==========================================
pub struct TestoTextParser;

impl LogParser for TestoTextParser {
    fn format(&self) -> FormatTag {
        FormatTag::TestoTextTable
    }

    fn parse(&self, bytes: &[u8], limits: &PhysicalLimits) -> LoggerResult<ParsedLog> {
        let text = decode_text(bytes)?;
        let mut builder = ParsedLogBuilder::new(FormatTag::TestoTextTable, *limits);
        let mut device = DeviceIdentity::default();
        let mut in_data = false;

        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            match classify_line(line) {
                TextLine::Blank => {}
                TextLine::Header if !in_data => {
                    if device.serial_number.is_none() {
                        device.serial_number = serial_from_header(line);
                    }
                }
                TextLine::Header => builder.skip_row(line_number, "无法识别的数据行"),
                TextLine::Sample(sample) => {
                    in_data = true;
                    builder.push_sample(sample);
                }
                TextLine::Malformed(reason) => {
                    in_data = true;
                    builder.skip_row(line_number, reason);
                }
            }
        }

        builder.finish(Some(device), "文本表格没有数据行")
    }
}
