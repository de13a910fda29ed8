// ==========================================
// 记录仪确认分析系统 - 领域类型定义
// ==========================================
// 职责: 文件格式标签 / 设备类型 / 区域编号 / 报告总结论
// ==========================================

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ==========================================
// 文件格式标签 (Format Tag)
// ==========================================
// 红线: 新增格式 = 新增枚举值 + 新增解析器,禁止在共享逻辑中按字符串分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatTag {
    Xlsx,           // Excel 2007+ 工作簿
    Xls,            // Excel 97-2003 工作簿 (OLE2)
    Testo174H,      // Testo 174H 二进制 (温度 + 湿度)
    Testo174T,      // Testo 174T 二进制 (仅温度)
    DelimitedText,  // 分隔符文本 (CSV / TSV)
    TestoTextTable, // Testo 文本表格导出
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Xlsx => write!(f, "XLSX"),
            FormatTag::Xls => write!(f, "XLS"),
            FormatTag::Testo174H => write!(f, "TESTO_174H"),
            FormatTag::Testo174T => write!(f, "TESTO_174T"),
            FormatTag::DelimitedText => write!(f, "DELIMITED_TEXT"),
            FormatTag::TestoTextTable => write!(f, "TESTO_TEXT_TABLE"),
        }
    }
}

// ==========================================
// 设备类型 (Device Type)
// ==========================================
// 通道数决定是否带湿度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    SingleChannel, // 单通道: 温度
    DualChannel,   // 双通道: 温度 + 湿度
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::SingleChannel => write!(f, "SINGLE_CHANNEL"),
            DeviceType::DualChannel => write!(f, "DUAL_CHANNEL"),
        }
    }
}

// ==========================================
// 区域编号 (Zone Number)
// ==========================================
// 上游既可能给数字,也可能给名称
// 反序列化时数字字符串（"1"）归一为 Numeric,与 From<&str> 一致
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum ZoneNumber {
    Numeric(u32),
    Named(String),
}

// 线上表示: 数字或任意字符串
#[derive(Deserialize)]
#[serde(untagged)]
enum ZoneNumberRepr {
    Numeric(u32),
    Text(String),
}

impl From<ZoneNumberRepr> for ZoneNumber {
    fn from(repr: ZoneNumberRepr) -> Self {
        match repr {
            ZoneNumberRepr::Numeric(n) => ZoneNumber::Numeric(n),
            ZoneNumberRepr::Text(text) => ZoneNumber::from(text.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for ZoneNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        ZoneNumberRepr::deserialize(deserializer).map(ZoneNumber::from)
    }
}

impl ZoneNumber {
    /// 按编码匹配（仅数字区域）
    pub fn is_code(&self, code: u32) -> bool {
        matches!(self, ZoneNumber::Numeric(n) if *n == code)
    }
}

impl From<u32> for ZoneNumber {
    fn from(value: u32) -> Self {
        ZoneNumber::Numeric(value)
    }
}

impl From<&str> for ZoneNumber {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<u32>() {
            Ok(n) => ZoneNumber::Numeric(n),
            Err(_) => ZoneNumber::Named(trimmed.to_string()),
        }
    }
}

impl fmt::Display for ZoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneNumber::Numeric(n) => write!(f, "{}", n),
            ZoneNumber::Named(name) => write!(f, "{}", name),
        }
    }
}

// ==========================================
// 报告总结论 (Report Outcome)
// ==========================================
// 红线: Indeterminate 与 Fail 是两种结论,不得互相折算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportOutcome {
    Pass,          // 全部记录仪满足验收准则
    Fail,          // 至少一台记录仪超限
    Indeterminate, // 至少一台记录仪无法分析
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportOutcome::Pass => write!(f, "PASS"),
            ReportOutcome::Fail => write!(f, "FAIL"),
            ReportOutcome::Indeterminate => write!(f, "INDETERMINATE"),
        }
    }
}
