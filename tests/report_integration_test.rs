// ==========================================
// 报告运行器集成测试
// ==========================================
// 覆盖: 多格式并行分析 → 评估 → 报告组装 → 异常枚举 → 取消
// ==========================================


use logger_qualification::domain::report::SkippedRow;
use logger_qualification::{
    logging, AnalysisConfig, AnalysisError, Anomaly, CancelToken, CriteriaTable, FailureKind,
    FormatTag, LoggerMetadata, LoggerUpload, Placement, ReportOutcome, ReportRunner, ZoneNumber,
};
use test_helpers::*;

fn runner(table: CriteriaTable) -> ReportRunner<CriteriaTable> {
    ReportRunner::new(AnalysisConfig::default(), table)
}

// ==========================================
// 正常路径
// ==========================================

#[tokio::test]
async fn test_mixed_formats_keep_upload_order() {
    logging::init_test();

    let start = ts(0, 10, 0);
    let uploads = vec![
        upload(
            "DL-221.csv",
            1,
            "0,5",
            dl_csv("83401350", &series_every_10_min(start, &[4.8, 5.0, 5.2], Some(55.0))),
        ),
        upload(
            "testo_174h.vi2",
            2,
            "1,5",
            testo_binary(
                "174H",
                "45012345",
                &[(start, 4.5, Some(50.0)), (ts(0, 10, 10), 4.7, Some(51.0))],
            ),
        ),
        upload(
            "testo_export.txt",
            3,
            "2,5",
            testo_text("45099999", &series_every_10_min(start, &[6.0, 6.5], Some(48.0))),
        ),
    ];

    let report = runner(cold_chain_table())
        .run(
            uploads,
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.result, ReportOutcome::Pass);
    assert!(report.failures.is_empty());

    let zones: Vec<ZoneNumber> = report.results.iter().map(|r| r.zone_number.clone()).collect();
    assert_eq!(zones, vec![ZoneNumber::from(1), ZoneNumber::from(2), ZoneNumber::from(3)]);

    let formats: Vec<FormatTag> = report.results.iter().map(|r| r.format).collect();
    assert_eq!(
        formats,
        vec![FormatTag::DelimitedText, FormatTag::Testo174H, FormatTag::TestoTextTable]
    );

    assert_eq!(report.results[0].serial_number.as_deref(), Some("83401350"));
    assert_eq!(report.results[1].serial_number.as_deref(), Some("45012345"));
    assert_eq!(report.results[1].sample_count, 2);
    assert_eq!(report.results[2].max_temp, 6.5);

    // 报告级极值
    let min = report.min_temperature.as_ref().unwrap();
    assert_eq!(min.value, 4.5);
    assert_eq!(min.zone_number, ZoneNumber::from(2));
    let max = report.max_temperature.as_ref().unwrap();
    assert_eq!(max.value, 6.5);
    assert_eq!(max.measurement_level, "2,5");

    assert_eq!(report.duration_minutes, 600);
    assert_eq!(report.duration_text, "10 часов");
    assert_eq!(report.result_text, "Соответствует");
    assert!(report
        .conclusions
        .starts_with("Начало испытания: 02.06.2025 08:00\n"));
    assert!(report
        .conclusions
        .contains("Зафиксированное минимальное значение: 4,5°C в зоне измерения 2 на высоте 1,5 м."));
}

#[tokio::test]
async fn test_limits_are_inclusive() {
    logging::init_test();

    let samples = series_every_10_min(ts(0, 10, 0), &[2.0, 5.0, 8.0], None);
    let report = runner(cold_chain_table())
        .run(
            vec![upload("DL-221.csv", 1, "верх", dl_csv("1", &samples))],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.min_temp, 2.0);
    assert_eq!(result.max_temp, 8.0);
    assert!(result.meets_limits);
    assert_eq!(report.result, ReportOutcome::Pass);
}

#[tokio::test]
async fn test_excursion_fails_report() {
    logging::init_test();

    let ok = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0], None);
    let hot = series_every_10_min(ts(0, 10, 0), &[5.0, 8.1, 6.0], None);
    let report = runner(cold_chain_table())
        .run(
            vec![
                upload("DL-221.csv", 1, "верх", dl_csv("1", &ok)),
                upload("DL-222.csv", 2, "верх", dl_csv("2", &hot)),
            ],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    assert!(report.results[0].meets_limits);
    assert!(!report.results[1].meets_limits);
    assert_eq!(report.result, ReportOutcome::Fail);
    assert_eq!(report.result_text, "Не соответствует");
}

#[tokio::test]
async fn test_constant_series_statistics() {
    logging::init_test();

    let samples = series_every_10_min(ts(0, 9, 0), &[5.0; 6], Some(45.0));
    let report = runner(cold_chain_table())
        .run(
            vec![upload("DL-221.csv", 1, "верх", dl_csv("1", &samples))],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.sample_count, 6);
    assert_eq!(result.min_temp, 5.0);
    assert_eq!(result.avg_temp, 5.0);
    assert_eq!(result.max_temp, 5.0);
    assert_eq!(result.min_humidity, Some(45.0));
    assert_eq!(result.avg_humidity, Some(45.0));
    assert_eq!(result.max_humidity, Some(45.0));
}

// ==========================================
// 可枚举异常
// ==========================================

#[tokio::test]
async fn test_malformed_row_is_skipped_and_reported() {
    logging::init_test();

    let mut lines = vec!["Дата/время;Температура".to_string()];
    for i in 0..10u32 {
        let temperature = if i == 6 {
            "ошибка".to_string()
        } else {
            format!("{},0", 3 + i % 4)
        };
        lines.push(format!("02.06.2025 10:{:02}:00;{}", i * 5, temperature));
    }
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

    let report = runner(cold_chain_table())
        .run(
            vec![upload("DL-221.csv", 1, "верх", csv_from_lines(&refs))],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.results[0].sample_count, 9);
    assert_eq!(report.skipped_row_count(), 1);

    let skipped: Vec<&SkippedRow> = report
        .anomalies()
        .into_iter()
        .filter_map(|(_, a)| match a {
            Anomaly::SkippedRows { rows, .. } => Some(rows),
            _ => None,
        })
        .flatten()
        .collect();
    // 表头占第 1 行,第 7 条数据位于第 8 行
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].row_number, 8);
}

#[tokio::test]
async fn test_missing_humidity_is_incomplete_not_failed() {
    logging::init_test();

    let samples = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0, 6.0], None);
    let report = runner(humidity_table())
        .run(
            vec![upload("DL-221.csv", 1, "верх", dl_csv("1", &samples))],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    let result = &report.results[0];
    assert!(result.incomplete);
    assert!(result.meets_limits);
    assert_eq!(result.avg_humidity, None);
    assert!(result.anomalies.contains(&Anomaly::MissingHumidity));
    assert_eq!(report.result, ReportOutcome::Pass);
}

// 布点与准则来自上游 JSON,区域编号可能是字符串
fn json_upload(file_name: &str, placement_json: &str, bytes: Vec<u8>) -> LoggerUpload {
    let placement: Placement = serde_json::from_str(placement_json).unwrap();
    LoggerUpload::new(LoggerMetadata::new(file_name, placement), bytes)
}

#[tokio::test]
async fn test_same_zone_with_and_without_humidity() {
    logging::init_test();

    let table: CriteriaTable = serde_json::from_str(
        r#"{"entries": [{"zone_number": 1, "measurement_level": "верх",
            "criteria": {"temp_min": 2, "temp_max": 8, "humidity_min": 30, "humidity_max": 60}}]}"#,
    )
    .unwrap();
    let placement = r#"{"zone_number": "1", "measurement_level": "верх"}"#;

    let temperature_only = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0, 6.0], None);
    let humid = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0, 6.0], Some(65.0));

    let report = runner(table)
        .run(
            vec![
                json_upload("DL-221.csv", placement, dl_csv("1", &temperature_only)),
                json_upload("DL-222.csv", placement, dl_csv("2", &humid)),
            ],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.results.len(), 2);

    let dry = &report.results[0];
    assert_eq!(dry.zone_number, ZoneNumber::from(1));
    assert!(dry.incomplete);
    assert!(dry.meets_limits);
    assert!(dry.anomalies.contains(&Anomaly::MissingHumidity));

    // 湿度 65 %RH 超出 30..60
    let wet = &report.results[1];
    assert!(!wet.incomplete);
    assert_eq!(wet.max_humidity, Some(65.0));
    assert!(!wet.meets_limits);

    assert_eq!(report.result, ReportOutcome::Fail);
}

#[tokio::test]
async fn test_string_external_zone_is_not_evaluated() {
    logging::init_test();

    let table = CriteriaTable::new().insert(Some(ZoneNumber::from(1)), None, cold_chain_criteria());
    let inside = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0], None);
    let outdoor = series_every_10_min(ts(0, 10, 0), &[24.0, 26.0], None);

    let report = runner(table)
        .run(
            vec![
                json_upload(
                    "DL-221.csv",
                    r#"{"zone_number": "1", "measurement_level": "верх"}"#,
                    dl_csv("1", &inside),
                ),
                json_upload(
                    "DL-999.csv",
                    r#"{"zone_number": "999", "measurement_level": "улица"}"#,
                    dl_csv("9", &outdoor),
                ),
            ],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    assert!(report.failures.is_empty());
    assert!(report.results[1].is_external);
    assert!(report.results[1].anomalies.contains(&Anomaly::CriteriaNotApplied));
    assert_eq!(report.result, ReportOutcome::Pass);
}

#[tokio::test]
async fn test_logger_outside_period_is_indeterminate() {
    logging::init_test();

    let inside = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0], None);
    let next_day = series_every_10_min(ts(1, 10, 0), &[4.0, 5.0], None);
    let report = runner(cold_chain_table())
        .run(
            vec![
                upload("DL-221.csv", 1, "верх", dl_csv("1", &inside)),
                upload("DL-222.csv", 2, "верх", dl_csv("2", &next_day)),
            ],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].meets_limits);

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.kind, FailureKind::NoSamplesInPeriod);
    assert_eq!(failure.zone_number, ZoneNumber::from(2));
    assert_eq!(failure.serial_number.as_deref(), Some("2"));

    assert_eq!(report.result, ReportOutcome::Indeterminate);
    assert!(report.conclusions.ends_with("данные 1 логгера не проанализированы."));
}

#[tokio::test]
async fn test_samples_outside_period_are_counted() {
    logging::init_test();

    let mut samples = series_every_10_min(ts(0, 7, 40), &[20.0, 20.0], None);
    samples.extend(series_every_10_min(ts(0, 8, 0), &[4.0, 5.0], None));
    let report = runner(cold_chain_table())
        .run(
            vec![upload("DL-221.csv", 1, "верх", dl_csv("1", &samples))],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.sample_count, 2);
    assert_eq!(result.max_temp, 5.0);
    assert!(result
        .anomalies
        .contains(&Anomaly::SamplesOutsidePeriod { count: 2 }));
}

#[tokio::test]
async fn test_external_logger_excluded_from_extremes() {
    logging::init_test();

    let table = CriteriaTable::new()
        .insert(Some(ZoneNumber::from(1)), None, cold_chain_criteria());
    let inside = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0], None);
    let outdoor = series_every_10_min(ts(0, 10, 0), &[24.0, 26.0], Some(60.0));

    let report = runner(table)
        .run(
            vec![
                upload("DL-221.csv", 1, "верх", dl_csv("1", &inside)),
                upload("DL-999.csv", 999, "улица", dl_csv("9", &outdoor)),
            ],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    let external = &report.results[1];
    assert!(external.is_external);
    assert_eq!(external.zone_label, "Внешний");
    assert!(external.anomalies.contains(&Anomaly::CriteriaNotApplied));

    assert_eq!(report.max_temperature.as_ref().unwrap().value, 5.0);
    assert_eq!(report.result, ReportOutcome::Pass);
}

#[tokio::test]
async fn test_internal_logger_without_criteria_fails_slot() {
    logging::init_test();

    let table = CriteriaTable::new()
        .insert(Some(ZoneNumber::from(1)), None, cold_chain_criteria());
    let samples = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0], None);

    let report = runner(table)
        .run(
            vec![
                upload("DL-221.csv", 1, "верх", dl_csv("1", &samples)),
                upload("DL-222.csv", 2, "верх", dl_csv("2", &samples)),
            ],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::CriteriaNotConfigured);
    assert_eq!(report.result, ReportOutcome::Indeterminate);
}

// ==========================================
// 运行级错误
// ==========================================

#[tokio::test]
async fn test_all_loggers_failed() {
    logging::init_test();

    let uploads = vec![
        upload("blob_a.bin", 1, "верх", vec![0xFF, 0xFE, 0x00, 0x13]),
        upload("DL-221.csv", 2, "верх", csv_from_lines(&["Дата/время;Температура", ""])),
    ];

    let err = runner(cold_chain_table())
        .run(
            uploads,
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        AnalysisError::NoAnalyzableLoggers { failures } => {
            let kinds: Vec<FailureKind> = failures.iter().map(|f| f.kind).collect();
            assert_eq!(
                kinds,
                vec![FailureKind::UnrecognizedFormat, FailureKind::TruncatedFile]
            );
        }
        other => panic!("意外错误: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_run_returns_no_report() {
    logging::init_test();

    let cancel = CancelToken::new();
    cancel.cancel();

    let samples = series_every_10_min(ts(0, 10, 0), &[4.0, 5.0], None);
    let err = runner(cold_chain_table())
        .run(
            vec![upload("DL-221.csv", 1, "верх", dl_csv("1", &samples))],
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Cancelled));
}

#[tokio::test]
async fn test_inverted_window_rejected() {
    logging::init_test();

    let samples = series_every_10_min(ts(0, 10, 0), &[4.0], None);
    let err = runner(cold_chain_table())
        .run(
            vec![upload("DL-221.csv", 1, "верх", dl_csv("1", &samples))],
            logger_qualification::TestingPeriod::new(ts(0, 18, 0), ts(0, 8, 0)),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::InvalidTestWindow { .. }));
}

// ==========================================
// 确定性
// ==========================================

#[tokio::test]
async fn test_report_is_reproducible() {
    logging::init_test();

    let build_uploads = || {
        vec![
            upload(
                "DL-221.csv",
                1,
                "верх",
                dl_csv("1", &series_every_10_min(ts(0, 10, 0), &[4.1, 4.9, 5.3], Some(40.0))),
            ),
            upload(
                "testo_174t.vi2",
                2,
                "низ",
                testo_binary("174T", "7", &[(ts(0, 11, 0), 3.3, None), (ts(0, 11, 10), 3.9, None)]),
            ),
            upload("broken.bin", 3, "низ", vec![0xFF, 0xFF]),
        ]
    };

    let runner = ReportRunner::new(
        AnalysisConfig {
            max_parallel_files: 2,
            ..AnalysisConfig::default()
        },
        humidity_table(),
    );

    let first = runner
        .run(
            build_uploads(),
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();
    let second = runner
        .run(
            build_uploads(),
            work_day_period(),
            header(ts(0, 8, 0), ts(0, 18, 0)),
            CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
