// ==========================================
// 记录仪确认分析系统 - 验收准则
// ==========================================
// 职责: 温湿度上下限（闭区间）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// AcceptanceCriteria - 验收准则
// ==========================================
// 按 区域/测量层 由外部配置,显式传入评估器
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceCriteria {
    pub temp_min: f64,              // 温度下限 (°C, 含)
    pub temp_max: f64,              // 温度上限 (°C, 含)
    #[serde(default)]
    pub humidity_min: Option<f64>,  // 湿度下限 (%RH, 含)
    #[serde(default)]
    pub humidity_max: Option<f64>,  // 湿度上限 (%RH, 含)
}

impl AcceptanceCriteria {
    pub fn temperature(temp_min: f64, temp_max: f64) -> Self {
        Self {
            temp_min,
            temp_max,
            humidity_min: None,
            humidity_max: None,
        }
    }

    pub fn with_humidity(mut self, humidity_min: f64, humidity_max: f64) -> Self {
        self.humidity_min = Some(humidity_min);
        self.humidity_max = Some(humidity_max);
        self
    }

    /// 是否配置了任一湿度限值
    pub fn has_humidity_limits(&self) -> bool {
        self.humidity_min.is_some() || self.humidity_max.is_some()
    }
}
