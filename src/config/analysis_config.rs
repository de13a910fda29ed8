// ==========================================
// 记录仪确认分析系统 - 分析配置
// ==========================================
// 职责: 配置加载、覆写、校验
// 分层: 默认值 → JSON 配置文件 → 环境变量 (LOGGER_QUAL_*)
// ==========================================

use crate::importer::value_parser::PhysicalLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// 环境变量前缀
pub const ENV_PREFIX: &str = "LOGGER_QUAL_";

// 默认配置文件位置: <config_dir>/logger-qualification/config.json
const CONFIG_DIR_NAME: &str = "logger-qualification";
const CONFIG_FILE_NAME: &str = "config.json";

// ==========================================
// 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误 ({path}): {message}")]
    Parse { path: String, message: String },

    #[error("配置项取值非法: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("配置校验失败: {0}")]
    Validation(String),
}

// ==========================================
// AnalysisConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub physical_limits: PhysicalLimits, // 传感器物理范围
    pub display_decimals: u32,           // 报告展示小数位
    pub max_parallel_files: usize,       // 并行解析文件数上限
    pub cancel_check_batch: usize,       // 取消检查的采样批大小
    pub external_zone_code: u32,         // 外部记录仪区域编码
    pub locale: String,                  // 报告语言
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            physical_limits: PhysicalLimits::default(),
            display_decimals: 1,
            max_parallel_files: 4,
            cancel_check_batch: 512,
            external_zone_code: 999,
            locale: "ru".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// 按分层规则加载配置
    ///
    /// # 参数
    /// - explicit_path: 显式配置文件路径（必须存在）；None 时尝试默认位置（可不存在）
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit_path {
            Some(path) => Self::from_json_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_json_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(env_var_name(key)).ok())?;
        config.validate()?;

        tracing::debug!(config = ?config, "分析配置加载完成");
        Ok(config)
    }

    /// 从 JSON 文件读取（缺省字段取默认值）
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// 应用键值覆写
    ///
    /// # 参数
    /// - lookup: 按 config_keys 中的键取值（环境变量或测试桩）
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in config_keys::ALL {
            let Some(raw) = lookup(key) else {
                continue;
            };
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }

            match key {
                config_keys::TEMPERATURE_MIN => {
                    self.physical_limits.temperature_min = parse_value(key, value)?
                }
                config_keys::TEMPERATURE_MAX => {
                    self.physical_limits.temperature_max = parse_value(key, value)?
                }
                config_keys::HUMIDITY_MIN => {
                    self.physical_limits.humidity_min = parse_value(key, value)?
                }
                config_keys::HUMIDITY_MAX => {
                    self.physical_limits.humidity_max = parse_value(key, value)?
                }
                config_keys::DISPLAY_DECIMALS => self.display_decimals = parse_value(key, value)?,
                config_keys::MAX_PARALLEL_FILES => {
                    self.max_parallel_files = parse_value(key, value)?
                }
                config_keys::CANCEL_CHECK_BATCH => {
                    self.cancel_check_batch = parse_value(key, value)?
                }
                config_keys::EXTERNAL_ZONE_CODE => {
                    self.external_zone_code = parse_value(key, value)?
                }
                config_keys::LOCALE => self.locale = value.to_string(),
                _ => {}
            }
            tracing::debug!(key, value, "配置项已覆写");
        }
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.physical_limits;
        if limits.temperature_min >= limits.temperature_max {
            return Err(ConfigError::Validation(format!(
                "温度物理范围倒置: [{}, {}]",
                limits.temperature_min, limits.temperature_max
            )));
        }
        if limits.humidity_min >= limits.humidity_max {
            return Err(ConfigError::Validation(format!(
                "湿度物理范围倒置: [{}, {}]",
                limits.humidity_min, limits.humidity_max
            )));
        }
        if self.max_parallel_files == 0 {
            return Err(ConfigError::Validation(
                "max_parallel_files 必须大于 0".to_string(),
            ));
        }
        if self.cancel_check_batch == 0 {
            return Err(ConfigError::Validation(
                "cancel_check_batch 必须大于 0".to_string(),
            ));
        }
        if self.display_decimals > 6 {
            return Err(ConfigError::Validation(format!(
                "display_decimals 超出范围: {}",
                self.display_decimals
            )));
        }
        if self.locale.trim().is_empty() {
            return Err(ConfigError::Validation("locale 不能为空".to_string()));
        }
        Ok(())
    }

    pub fn physical_limits(&self) -> PhysicalLimits {
        self.physical_limits
    }
}

/// 默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// 配置键 → 环境变量名
pub fn env_var_name(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.to_uppercase())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 物理范围
    pub const TEMPERATURE_MIN: &str = "temperature_min";
    pub const TEMPERATURE_MAX: &str = "temperature_max";
    pub const HUMIDITY_MIN: &str = "humidity_min";
    pub const HUMIDITY_MAX: &str = "humidity_max";

    // 展示
    pub const DISPLAY_DECIMALS: &str = "display_decimals";
    pub const LOCALE: &str = "locale";

    // 并发与取消
    pub const MAX_PARALLEL_FILES: &str = "max_parallel_files";
    pub const CANCEL_CHECK_BATCH: &str = "cancel_check_batch";

    // 布点
    pub const EXTERNAL_ZONE_CODE: &str = "external_zone_code";

    pub const ALL: [&str; 9] = [
        TEMPERATURE_MIN,
        TEMPERATURE_MAX,
        HUMIDITY_MIN,
        HUMIDITY_MAX,
        DISPLAY_DECIMALS,
        LOCALE,
        MAX_PARALLEL_FILES,
        CANCEL_CHECK_BATCH,
        EXTERNAL_ZONE_CODE,
    ];
}
