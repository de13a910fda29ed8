// ==========================================
// 记录仪确认分析系统 - 命令行入口
// ==========================================
// 用法: logger-report <manifest.json> [--config <config.json>] [--json-logs]
// 输入: 清单文件（表头 / 试验时间窗 / 验收准则 / 文件列表）
// 输出: 报告 JSON 写 stdout,日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use logger_qualification::{
    logging, AnalysisConfig, CancelToken, CriteriaTable, DeviceIdentity, LoggerMetadata,
    LoggerUpload, Placement, ReportHeader, ReportRunner, TestingPeriod,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ==========================================
// 清单文件
// ==========================================
#[derive(Debug, Deserialize)]
struct Manifest {
    header: ReportHeader,
    #[serde(default)]
    period: Option<TestingPeriod>, // 缺省取表头中的开始/完成时间
    #[serde(default)]
    criteria: CriteriaTable,
    files: Vec<ManifestFile>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    path: PathBuf,
    placement: Placement,
    #[serde(default)]
    device: Option<DeviceIdentity>,
    #[serde(default)]
    logger_name: Option<String>,
}

struct CliArgs {
    manifest: PathBuf,
    config: Option<PathBuf>,
    json_logs: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut manifest = None;
    let mut config = None;
    let mut json_logs = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config 需要文件路径")?;
                config = Some(PathBuf::from(path));
            }
            "--json-logs" => json_logs = true,
            other if manifest.is_none() => manifest = Some(PathBuf::from(other)),
            other => bail!("无法识别的参数: {}", other),
        }
    }

    let Some(manifest) = manifest else {
        bail!("用法: logger-report <manifest.json> [--config <config.json>] [--json-logs]");
    };
    Ok(CliArgs {
        manifest,
        config,
        json_logs,
    })
}

async fn load_uploads(base_dir: &Path, files: Vec<ManifestFile>) -> Result<Vec<LoggerUpload>> {
    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        let path = if file.path.is_absolute() {
            file.path.clone()
        } else {
            base_dir.join(&file.path)
        };
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("读取记录仪文件失败: {}", path.display()))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let mut metadata = LoggerMetadata::new(file_name, file.placement);
        metadata.device = file.device;
        metadata.logger_name = file.logger_name;
        uploads.push(LoggerUpload::new(metadata, bytes));
    }
    Ok(uploads)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    if args.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!(
        app = logger_qualification::APP_NAME,
        version = logger_qualification::VERSION,
        "启动"
    );

    let config = AnalysisConfig::load(args.config.as_deref()).context("加载分析配置失败")?;

    let manifest_text = tokio::fs::read_to_string(&args.manifest)
        .await
        .with_context(|| format!("读取清单失败: {}", args.manifest.display()))?;
    let manifest: Manifest = serde_json::from_str(&manifest_text).context("清单格式错误")?;

    let base_dir = args
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let period = manifest.period.unwrap_or_else(|| {
        TestingPeriod::new(
            manifest.header.date_time_of_test_start,
            manifest.header.date_time_of_test_completion,
        )
    });
    let uploads = load_uploads(&base_dir, manifest.files).await?;

    // Ctrl-C → 协作式取消
    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("收到中断信号,取消分析");
            signal_token.cancel();
        }
    });

    let runner = ReportRunner::new(config, manifest.criteria);
    let report = runner
        .run(uploads, period, manifest.header, cancel)
        .await
        .context("生成报告失败")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
