// ==========================================
// 记录仪确认分析系统 - 验收准则来源
// ==========================================
// 职责: 按 区域/测量层 查找验收准则
// 说明: 准则存储属于外部协作方（数据库/接口）,核心只依赖本 Trait
// ==========================================

use crate::domain::criteria::AcceptanceCriteria;
use crate::domain::sample::Placement;
use crate::domain::types::ZoneNumber;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// 准则来源错误（由实现方决定具体类型）
pub type CriteriaSourceError = Box<dyn Error + Send + Sync>;

// ==========================================
// AcceptanceCriteriaSource Trait
// ==========================================
#[async_trait]
pub trait AcceptanceCriteriaSource: Send + Sync {
    /// 查找某布点适用的验收准则
    ///
    /// # 返回
    /// - Ok(Some): 已配置
    /// - Ok(None): 未配置（由管道决定是否为失败）
    /// - Err: 来源不可用（整次运行失败）
    async fn lookup(
        &self,
        placement: &Placement,
    ) -> Result<Option<AcceptanceCriteria>, CriteriaSourceError>;
}

// ==========================================
// CriteriaTable - 内存准则表
// ==========================================
// 匹配规则: 区域 + 测量层 > 仅区域 > 仅测量层 > 缺省准则; 同级取先出现者
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaTable {
    #[serde(default)]
    pub entries: Vec<CriteriaEntry>,
    #[serde(default)]
    pub default: Option<AcceptanceCriteria>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaEntry {
    #[serde(default)]
    pub zone_number: Option<ZoneNumber>, // None = 任意区域
    #[serde(default)]
    pub measurement_level: Option<String>, // None = 任意测量层
    pub criteria: AcceptanceCriteria,
}

impl CriteriaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, criteria: AcceptanceCriteria) -> Self {
        self.default = Some(criteria);
        self
    }

    pub fn insert(
        mut self,
        zone_number: Option<ZoneNumber>,
        measurement_level: Option<&str>,
        criteria: AcceptanceCriteria,
    ) -> Self {
        self.entries.push(CriteriaEntry {
            zone_number,
            measurement_level: measurement_level.map(|l| l.trim().to_string()),
            criteria,
        });
        self
    }

    /// 同步查找（最具体匹配）
    pub fn resolve(&self, placement: &Placement) -> Option<AcceptanceCriteria> {
        let level = placement.measurement_level.trim();

        let mut best: Option<(u8, &CriteriaEntry)> = None;
        for entry in &self.entries {
            let zone_score = match &entry.zone_number {
                Some(zone) if *zone == placement.zone_number => 2,
                Some(_) => continue,
                None => 0,
            };
            let level_score = match entry.measurement_level.as_deref() {
                Some(l) if l.to_lowercase() == level.to_lowercase() => 1,
                Some(_) => continue,
                None => 0,
            };
            let score = zone_score + level_score;
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, entry));
            }
        }

        best.map(|(_, entry)| entry.criteria).or(self.default)
    }
}

#[async_trait]
impl AcceptanceCriteriaSource for CriteriaTable {
    async fn lookup(
        &self,
        placement: &Placement,
    ) -> Result<Option<AcceptanceCriteria>, CriteriaSourceError> {
        Ok(self.resolve(placement))
    }
}
