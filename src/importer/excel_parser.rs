// ==========================================
// 记录仪确认分析系统 - Excel 解析器
// ==========================================
// 支持: XLSX / XLS（读取第一个工作表）
// 工具: calamine（内存 Cursor 读取,不落盘）
// ==========================================

use crate::domain::types::FormatTag;
use crate::importer::error::{LoggerError, LoggerResult};
use crate::importer::log_parser::{LogParser, ParsedLog, ParsedLogBuilder};
use crate::importer::table_layout::{extract_device_info, find_layout, read_data_rows, Cell};
use crate::importer::value_parser::PhysicalLimits;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use std::io::Cursor;

// ==========================================
// ExcelLogParser
// ==========================================
pub struct ExcelLogParser {
    format: FormatTag,
}

impl ExcelLogParser {
    pub fn xlsx() -> Self {
        Self {
            format: FormatTag::Xlsx,
        }
    }

    pub fn xls() -> Self {
        Self {
            format: FormatTag::Xls,
        }
    }
}

impl LogParser for ExcelLogParser {
    fn format(&self) -> FormatTag {
        self.format
    }

    fn parse(&self, bytes: &[u8], limits: &PhysicalLimits) -> LoggerResult<ParsedLog> {
        let range = match self.format {
            FormatTag::Xls => first_sheet::<Xls<_>>(bytes)?,
            _ => first_sheet::<Xlsx<_>>(bytes)?,
        };

        // 行号: 工作表绝对行号（1 起）
        let start_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        let rows: Vec<(usize, Vec<Cell>)> = range
            .rows()
            .enumerate()
            .map(|(idx, row)| (start_row + idx + 1, row.iter().map(to_cell).collect()))
            .collect();

        let cells: Vec<Vec<Cell>> = rows.iter().map(|(_, row)| row.clone()).collect();
        let Some(layout) = find_layout(&cells) else {
            return Err(LoggerError::TruncatedFile(
                "工作表中未找到表头行".to_string(),
            ));
        };

        let device = extract_device_info(&cells[..layout.header_row]);

        let mut builder = ParsedLogBuilder::new(self.format, *limits);
        read_data_rows(&layout, &rows, &mut builder);
        builder.finish(device, "工作表表头之后没有数据行")
    }
}

/// 打开工作簿并读取第一个工作表
fn first_sheet<R>(bytes: &[u8]) -> LoggerResult<Range<Data>>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: Into<calamine::Error>,
{
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = R::new(cursor).map_err(|e| LoggerError::from(e.into()))?;

    match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(LoggerError::from(e.into())),
        None => Err(LoggerError::SpreadsheetError(
            "工作簿中没有工作表".to_string(),
        )),
    }
}

/// calamine 单元格 → 统一单元格
fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        // 日期单元格保留序列号,由布局阶段按列语义换算
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
    }
}
