// ==========================================
// 记录仪确认分析系统 - 报告运行器
// ==========================================
// 职责: 一个试验时间窗内的全部文件 → ReportData
// 并发: 每个文件一个 spawn_blocking 任务,Semaphore 限制并行数,
//       join_all 作为屏障汇合（保持上传顺序）
// 取消: 任一阶段检查到取消 → 丢弃全部中间结果,返回 Cancelled
// ==========================================

use crate::config::{AcceptanceCriteriaSource, AnalysisConfig};
use crate::domain::criteria::AcceptanceCriteria;
use crate::domain::report::{LoggerOutcome, ReportData, ReportHeader};
use crate::domain::sample::TestingPeriod;
use crate::engine::cancel::CancelToken;
use crate::engine::error::{AnalysisError, RunResult};
use crate::engine::pipeline::{AnalysisPipeline, LoggerUpload};
use crate::engine::report_assembler::ReportAssembler;
use crate::importer::error::LoggerError;
use crate::perf::PerfGuard;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument};
use uuid::Uuid;

// ==========================================
// ReportRunner
// ==========================================
pub struct ReportRunner<S>
where
    S: AcceptanceCriteriaSource,
{
    config: Arc<AnalysisConfig>,
    criteria_source: S,
}

impl<S> ReportRunner<S>
where
    S: AcceptanceCriteriaSource,
{
    pub fn new(config: AnalysisConfig, criteria_source: S) -> Self {
        Self {
            config: Arc::new(config),
            criteria_source,
        }
    }

    /// 分析一批上传文件并生成报告
    ///
    /// # 参数
    /// - uploads: 同一试验时间窗的全部文件（输出顺序与此一致）
    /// - period: 试验时间窗（闭区间）
    /// - header: 报告表头
    /// - cancel: 协作式取消令牌
    ///
    /// # 返回
    /// - Ok(ReportData): 至少一台记录仪分析成功
    /// - Err(AnalysisError): 取消 / 无可分析记录仪 / 准则来源不可用 / 时间窗非法
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), files = uploads.len()))]
    pub async fn run(
        &self,
        uploads: Vec<LoggerUpload>,
        period: TestingPeriod,
        header: ReportHeader,
        cancel: CancelToken,
    ) -> RunResult<ReportData> {
        let _perf = PerfGuard::new("report_run");

        if !period.is_valid() {
            return Err(AnalysisError::InvalidTestWindow {
                start: period.start_date.to_string(),
                end: period.end_date.to_string(),
            });
        }

        // 1. 查询验收准则（外部协作方,异步）
        let mut jobs: Vec<(LoggerUpload, Option<AcceptanceCriteria>)> =
            Vec::with_capacity(uploads.len());
        for upload in uploads {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            let placement = upload
                .metadata
                .placement
                .clone()
                .with_external_code(self.config.external_zone_code);
            let criteria = self
                .criteria_source
                .lookup(&placement)
                .await
                .map_err(|e| AnalysisError::CriteriaLookup(e.to_string()))?;
            jobs.push((upload, criteria));
        }

        // 2. 扇出: 每个文件一个阻塞任务
        let pipeline = AnalysisPipeline::new(Arc::clone(&self.config), cancel.clone());
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_files));

        info!(
            files = jobs.len(),
            max_parallel = self.config.max_parallel_files,
            "开始并行分析"
        );

        let tasks = jobs.into_iter().map(|(upload, criteria)| {
            let pipeline = pipeline.clone();
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AnalysisError::TaskJoin(e.to_string()))?;
                tokio::task::spawn_blocking(move || pipeline.run_file(&upload, &period, criteria))
                    .await
                    .map_err(|e| AnalysisError::TaskJoin(e.to_string()))
            }
        });

        // 3. 扇入屏障
        let joined = join_all(tasks).await;

        let mut outcomes: Vec<LoggerOutcome> = Vec::with_capacity(joined.len());
        for result in joined {
            match result {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(LoggerError::Cancelled)) => return Err(AnalysisError::Cancelled),
                Ok(Err(err)) => {
                    error!(error = %err, "单文件管道返回未归类错误");
                    return Err(AnalysisError::TaskJoin(err.to_string()));
                }
                Err(err) => {
                    error!(error = %err, "分析任务异常退出");
                    return Err(err);
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        // 4. 汇合点: 报告组装
        ReportAssembler::from_config(&self.config).assemble(header, outcomes)
    }
}
