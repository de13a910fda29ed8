// ==========================================
// 记录仪确认分析系统 - 验收评估器
// ==========================================
// 规则:
//   1. 限值为闭区间: 恰好等于上/下限视为满足
//   2. 配置了湿度限值但无湿度数据 → 湿度准则不适用,标记 incomplete,不判为不满足
//   3. 仅配置单侧湿度限值时只检查该侧
// 评估使用未取整的聚合值
// ==========================================

use crate::domain::criteria::AcceptanceCriteria;
use crate::engine::aggregator::Aggregate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub meets_limits: bool,
    pub incomplete: bool,
}

/// 评估聚合结果
pub fn evaluate(aggregate: &Aggregate, criteria: &AcceptanceCriteria) -> Evaluation {
    let temperature_ok = aggregate.temperature.min >= criteria.temp_min
        && aggregate.temperature.max <= criteria.temp_max;

    if !criteria.has_humidity_limits() {
        return Evaluation {
            meets_limits: temperature_ok,
            incomplete: false,
        };
    }

    match &aggregate.humidity {
        None => Evaluation {
            meets_limits: temperature_ok,
            incomplete: true,
        },
        Some(humidity) => {
            let lower_ok = criteria.humidity_min.map_or(true, |min| humidity.min >= min);
            let upper_ok = criteria.humidity_max.map_or(true, |max| humidity.max <= max);
            Evaluation {
                meets_limits: temperature_ok && lower_ok && upper_ok,
                incomplete: false,
            }
        }
    }
}
