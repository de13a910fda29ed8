// ==========================================
// 记录仪确认分析系统 - 表格列布局识别
// ==========================================
// 职责: 表格类格式（XLSX / XLS / 分隔符文本）共用的
//       表头识别 + 设备信息提取 + 行 → 采样转换
// 说明: 表头行 = 第一行同时出现 时间列（或 日期列）与 温度列 的行
// ==========================================

use crate::domain::sample::{DeviceIdentity, RawSample};
use crate::importer::log_parser::ParsedLogBuilder;
use crate::importer::value_parser::{
    excel_fraction_to_time, excel_serial_to_datetime, parse_date, parse_decimal,
    parse_time_of_day, parse_timestamp,
};
use chrono::{NaiveDateTime, NaiveTime};

// 表头最多在前 N 行内出现
pub const HEADER_SCAN_ROWS: usize = 64;

static EMPTY_CELL: Cell = Cell::Empty;

// ==========================================
// Cell - 统一单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// 文本单元格（空白 → Empty）
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn display(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::DateTime(ts) => Some(ts.to_string()),
        }
    }

    fn to_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(ts) => Some(*ts),
            Cell::Number(serial) => excel_serial_to_datetime(*serial),
            Cell::Text(s) => parse_timestamp(s),
            Cell::Empty => None,
        }
    }

    fn to_time_of_day(&self) -> Option<NaiveTime> {
        match self {
            Cell::DateTime(ts) => Some(ts.time()),
            Cell::Number(fraction) => excel_fraction_to_time(fraction.fract()),
            Cell::Text(s) => parse_time_of_day(s),
            Cell::Empty => None,
        }
    }

    fn to_decimal(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => parse_decimal(s),
            _ => None,
        }
    }
}

// ==========================================
// 列布局
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampColumns {
    Combined(usize),                      // 单列 日期/时间
    Split { date: usize, time: usize },   // 日期列 + 时间列
    DateOnly(usize),                      // 仅日期
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub header_row: usize,        // 表头所在行（0 起）
    pub id: Option<usize>,
    pub timestamp: TimestampColumns,
    pub temperature: usize,
    pub humidity: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    Id,
    DateTime,
    Date,
    Time,
    Temperature,
    Humidity,
}

/// 表头文本分类（小写匹配,俄文/英文导出）
fn classify_header(text: &str) -> Option<HeaderKind> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if lower == "id" || lower == "№" || lower == "no" || lower == "n" {
        return Some(HeaderKind::Id);
    }

    let has_date = lower.contains("дата") || lower.contains("date");
    let has_time = lower.contains("время") || lower.contains("time");
    if (has_date && has_time) || lower.contains("timestamp") {
        return Some(HeaderKind::DateTime);
    }

    if lower.contains("влажность")
        || lower.contains("humidity")
        || lower.contains("rh")
        || lower.contains('%')
    {
        return Some(HeaderKind::Humidity);
    }

    if lower.contains("температура")
        || lower.contains("temp")
        || lower.contains("°c")
        || lower.contains("°с")
        || lower.contains("t°")
    {
        return Some(HeaderKind::Temperature);
    }

    if has_date {
        return Some(HeaderKind::Date);
    }
    if has_time {
        return Some(HeaderKind::Time);
    }

    None
}

/// 尝试将一行识别为表头
fn layout_from_header(row_index: usize, row: &[Cell]) -> Option<ColumnLayout> {
    let mut id = None;
    let mut datetime = None;
    let mut date = None;
    let mut time = None;
    let mut temperature = None;
    let mut humidity = None;

    for (col, cell) in row.iter().enumerate() {
        let Some(text) = cell.as_text() else {
            continue;
        };
        // 同类列取第一列
        match classify_header(text) {
            Some(HeaderKind::Id) => id = id.or(Some(col)),
            Some(HeaderKind::DateTime) => datetime = datetime.or(Some(col)),
            Some(HeaderKind::Date) => date = date.or(Some(col)),
            Some(HeaderKind::Time) => time = time.or(Some(col)),
            Some(HeaderKind::Temperature) => temperature = temperature.or(Some(col)),
            Some(HeaderKind::Humidity) => humidity = humidity.or(Some(col)),
            None => {}
        }
    }

    let timestamp = match (datetime, date, time) {
        (Some(col), _, _) => TimestampColumns::Combined(col),
        (None, Some(date), Some(time)) => TimestampColumns::Split { date, time },
        (None, Some(date), None) => TimestampColumns::DateOnly(date),
        (None, None, Some(col)) => TimestampColumns::Combined(col),
        (None, None, None) => return None,
    };

    Some(ColumnLayout {
        header_row: row_index,
        id,
        timestamp,
        temperature: temperature?,
        humidity,
    })
}

/// 在前 HEADER_SCAN_ROWS 行内查找列布局
pub fn find_layout(rows: &[Vec<Cell>]) -> Option<ColumnLayout> {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .enumerate()
        .find_map(|(idx, row)| layout_from_header(idx, row))
}

/// 从表头上方的信息行中提取设备信息（"标签 | 值" 两列结构）
pub fn extract_device_info(rows_above_header: &[Vec<Cell>]) -> Option<DeviceIdentity> {
    let mut device = DeviceIdentity::default();

    for row in rows_above_header {
        for (col, cell) in row.iter().enumerate() {
            let Some(label) = cell.as_text() else {
                continue;
            };
            let Some(value) = row.get(col + 1).and_then(Cell::display) else {
                continue;
            };
            let label = label.to_lowercase();

            if label.contains("серийный номер")
                || label.contains("serial number")
                || label.contains("serialnumber")
            {
                device.serial_number = device.serial_number.or(Some(value));
            } else if label.contains("название прибора")
                || label.contains("модель")
                || label.contains("model")
                || label.contains("device name")
            {
                device.model = device.model.or(Some(value));
            }
        }
    }

    if device.is_empty() {
        None
    } else {
        Some(device)
    }
}

/// 数据行转换结果
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Blank,                 // 空行（不计入数据行）
    Sample(RawSample),
    Malformed(String),     // 畸形行原因
}

/// 将一行数据转换为采样
pub fn read_row(layout: &ColumnLayout, row: &[Cell]) -> RowOutcome {
    let cell = |col: usize| row.get(col).unwrap_or(&EMPTY_CELL);

    if row.iter().all(Cell::is_empty) {
        return RowOutcome::Blank;
    }
    // id 列为空视为空行
    if let Some(id_col) = layout.id {
        if cell(id_col).is_empty() {
            return RowOutcome::Blank;
        }
    }

    let timestamp = match layout.timestamp {
        TimestampColumns::Combined(col) | TimestampColumns::DateOnly(col) => {
            cell(col).to_timestamp()
        }
        TimestampColumns::Split { date, time } => {
            let date_part = match cell(date) {
                Cell::Text(s) => parse_date(s),
                other => other.to_timestamp().map(|ts| ts.date()),
            };
            date_part.zip(cell(time).to_time_of_day()).map(|(d, t)| d.and_time(t))
        }
    };
    let Some(timestamp) = timestamp else {
        return RowOutcome::Malformed("日期/时间无法解析".to_string());
    };

    let Some(temperature) = cell(layout.temperature).to_decimal() else {
        return RowOutcome::Malformed("温度缺失或无法解析".to_string());
    };

    let humidity = match layout.humidity.map(cell) {
        None | Some(Cell::Empty) => None,
        Some(value) => match value.to_decimal() {
            Some(h) => Some(h),
            None => return RowOutcome::Malformed("湿度无法解析".to_string()),
        },
    };

    RowOutcome::Sample(RawSample::new(timestamp, temperature, humidity))
}

/// 读取表头之后的全部数据行并写入构建器
///
/// # 参数
/// - rows: (原始行号, 单元格) 列表,须包含表头所在行
pub fn read_data_rows(
    layout: &ColumnLayout,
    rows: &[(usize, Vec<Cell>)],
    builder: &mut ParsedLogBuilder,
) {
    for (row_number, row) in rows.iter().skip(layout.header_row + 1) {
        match read_row(layout, row) {
            RowOutcome::Blank => {}
            RowOutcome::Sample(sample) => builder.push_sample(sample),
            RowOutcome::Malformed(reason) => builder.skip_row(*row_number, reason),
        }
    }
}
