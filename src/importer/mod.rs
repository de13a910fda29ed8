// ==========================================
// 记录仪确认分析系统 - 导入层
// ==========================================
// 职责: 原始导出文件 → 格式探测 → 解析 → 标准化序列
// 支持: XLSX / XLS / 分隔符文本 / Testo 174H·174T 二进制 / Testo 文本表格
// ==========================================

// 模块声明
pub mod csv_parser;
pub mod error;
pub mod excel_parser;
pub mod format_detector;
pub mod log_parser;
pub mod normalizer;
pub mod table_layout;
pub mod testo_binary_parser;
pub mod testo_text_parser;
pub mod value_parser;

// 重导出核心类型
pub use csv_parser::CsvLogParser;
pub use error::{LoggerError, LoggerResult};
pub use excel_parser::ExcelLogParser;
pub use format_detector::{detect, parser_for};
pub use log_parser::{LogParser, ParsedLog, ParsedLogBuilder};
pub use normalizer::normalize;
pub use testo_binary_parser::TestoBinaryParser;
pub use testo_text_parser::TestoTextParser;
pub use value_parser::PhysicalLimits;
