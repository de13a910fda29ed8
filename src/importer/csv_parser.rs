// ==========================================
// 记录仪确认分析系统 - 分隔符文本解析器
// ==========================================
// 支持: ";" / TAB / "," 分隔的 CSV/TXT 导出（UTF-8,可带 BOM）
// 分隔符: 按 ";" → TAB → "," 依次尝试,取第一个能识别出列布局的
// ==========================================

use crate::domain::types::FormatTag;
use crate::importer::error::{LoggerError, LoggerResult};
use crate::importer::log_parser::{LogParser, ParsedLog, ParsedLogBuilder};
use crate::importer::table_layout::{
    extract_device_info, find_layout, read_data_rows, Cell, ColumnLayout,
};
use crate::importer::value_parser::PhysicalLimits;
use csv::ReaderBuilder;

const CANDIDATE_DELIMITERS: [u8; 3] = [b';', b'\t', b','];

const UTF8_BOM: &str = "\u{feff}";

/// 解码 UTF-8 文本（去 BOM）
pub fn decode_text(bytes: &[u8]) -> LoggerResult<&str> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| LoggerError::EncodingError(format!("非 UTF-8 文本: {}", e)))?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}

/// 按指定分隔符读取全部行
///
/// # 返回
/// - (行号, 单元格) 列表,行号从 1 开始（与文本行号一致）
pub fn read_delimited(text: &str, delimiter: u8) -> LoggerResult<Vec<(usize, Vec<Cell>)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // 信息行与数据行列数不一致
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(rows.len() + 1);
                rows.push((line, record.iter().map(Cell::text).collect()));
            }
            Err(err) => match LoggerError::from(err) {
                LoggerError::MalformedRecord { row, reason } => {
                    // 无法切分的行保留为单格文本,由布局阶段判为畸形
                    tracing::debug!(row, reason = %reason, "CSV 记录切分失败");
                    rows.push((row, vec![Cell::text(&reason)]));
                }
                fatal => return Err(fatal),
            },
        }
    }
    Ok(rows)
}

/// 嗅探分隔符与列布局
///
/// # 返回
/// - Some((分隔符, 布局, 行)): 第一个能识别出表头的分隔符
/// - None: 三种分隔符都找不到表头
pub fn sniff_layout(text: &str) -> Option<(u8, ColumnLayout, Vec<(usize, Vec<Cell>)>)> {
    CANDIDATE_DELIMITERS.iter().find_map(|&delimiter| {
        let rows = read_delimited(text, delimiter).ok()?;
        let cells: Vec<Vec<Cell>> = rows.iter().map(|(_, row)| row.clone()).collect();
        let layout = find_layout(&cells)?;
        Some((delimiter, layout, rows))
    })
}

// ==========================================
// CsvLogParser
// ==========================================
pub struct CsvLogParser;

impl LogParser for CsvLogParser {
    fn format(&self) -> FormatTag {
        FormatTag::DelimitedText
    }

    fn parse(&self, bytes: &[u8], limits: &PhysicalLimits) -> LoggerResult<ParsedLog> {
        let text = decode_text(bytes)?;

        let Some((delimiter, layout, rows)) = sniff_layout(text) else {
            // 探测阶段已确认表头,此处找不到表头说明文件内容不完整
            return Err(LoggerError::TruncatedFile("未找到表头行".to_string()));
        };

        tracing::debug!(
            delimiter = %(delimiter as char).escape_default(),
            header_row = layout.header_row,
            "CSV 列布局识别完成"
        );

        let rows_above: Vec<Vec<Cell>> = rows
            .iter()
            .take(layout.header_row)
            .map(|(_, row)| row.clone())
            .collect();
        let device = extract_device_info(&rows_above);

        let mut builder = ParsedLogBuilder::new(FormatTag::DelimitedText, *limits);
        read_data_rows(&layout, &rows, &mut builder);
        builder.finish(device, "CSV 表头之后没有数据行")
    }
}
