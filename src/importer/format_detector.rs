// ==========================================
// 记录仪确认分析系统 - 格式探测器
// ==========================================
// 职责: 依据结构签名（而非扩展名）判定文件格式
// 顺序: 表格魔数 → Testo 二进制 → UTF-8 文本（分隔符表格 / Testo 文本表格）
// 扩展名仅用于区分 EncodingError 与 UnrecognizedFormat
// ==========================================

use crate::domain::types::FormatTag;
use crate::importer::csv_parser::{self, CsvLogParser};
use crate::importer::error::{LoggerError, LoggerResult};
use crate::importer::excel_parser::ExcelLogParser;
use crate::importer::log_parser::LogParser;
use crate::importer::testo_binary_parser::{TestoBinaryParser, DATA_OFFSET};
use crate::importer::testo_text_parser::{self, TestoTextParser};
use std::path::Path;

const XLSX_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const TEXT_EXTENSIONS: [&str; 3] = ["csv", "txt", "tsv"];

/// 探测文件格式
///
/// # 参数
/// - bytes: 文件原始字节
/// - file_name_hint: 上传文件名（仅用于错误分类与日志）
///
/// # 返回
/// - Ok(FormatTag): 识别出的格式
/// - Err(UnrecognizedFormat / EncodingError)
pub fn detect(bytes: &[u8], file_name_hint: &str) -> LoggerResult<FormatTag> {
    if bytes.starts_with(XLSX_MAGIC) {
        return Ok(FormatTag::Xlsx);
    }
    if bytes.starts_with(XLS_MAGIC) {
        return Ok(FormatTag::Xls);
    }

    if let Some(tag) = detect_testo_binary(bytes) {
        return Ok(tag);
    }

    let unrecognized = || LoggerError::UnrecognizedFormat {
        file_name: file_name_hint.to_string(),
    };

    let text = match csv_parser::decode_text(bytes) {
        Ok(text) => text,
        Err(err) if has_text_extension(file_name_hint) => return Err(err),
        Err(_) => return Err(unrecognized()),
    };

    if csv_parser::sniff_layout(text).is_some() {
        return Ok(FormatTag::DelimitedText);
    }
    if testo_text_parser::looks_like_testo_table(text) {
        return Ok(FormatTag::TestoTextTable);
    }

    Err(unrecognized())
}

/// Testo 二进制: 头部区域含 NUL 字节且含型号标记
fn detect_testo_binary(bytes: &[u8]) -> Option<FormatTag> {
    let header = &bytes[..bytes.len().min(DATA_OFFSET)];
    if !header.contains(&0) {
        return None;
    }

    let contains = |marker: &[u8]| header.windows(marker.len()).any(|w| w == marker);
    if contains(b"174H") {
        Some(FormatTag::Testo174H)
    } else if contains(b"174T") {
        Some(FormatTag::Testo174T)
    } else {
        None
    }
}

fn has_text_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

// ==========================================
// 解析器注册表
// ==========================================
/// 格式标记 → 解析器
pub fn parser_for(tag: FormatTag) -> Box<dyn LogParser> {
    match tag {
        FormatTag::Xlsx => Box::new(ExcelLogParser::xlsx()),
        FormatTag::Xls => Box::new(ExcelLogParser::xls()),
        FormatTag::Testo174H => Box::new(TestoBinaryParser::model_174h()),
        FormatTag::Testo174T => Box::new(TestoBinaryParser::model_174t()),
        FormatTag::DelimitedText => Box::new(CsvLogParser),
        FormatTag::TestoTextTable => Box::new(TestoTextParser),
    }
}
