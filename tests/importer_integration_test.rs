// ==========================================
// 导入层集成测试
// ==========================================
// 覆盖: 格式探测 → 解析器注册表 → 标准化
// ==========================================


use logger_qualification::importer::PhysicalLimits;
use logger_qualification::{
    detect, logging, normalize, parser_for, DeviceIdentity, DeviceType, FormatTag, LoggerError,
    LoggerMetadata, Placement,
};
use test_helpers::*;

fn parse(file_name: &str, bytes: &[u8]) -> logger_qualification::LoggerResult<logger_qualification::ParsedLog> {
    let format = detect(bytes, file_name)?;
    parser_for(format).parse(bytes, &PhysicalLimits::default())
}

#[test]
fn test_dl_export_round_through_registry() {
    logging::init_test();

    let samples = series_every_10_min(ts(0, 15, 45), &[4.8, 4.9, 5.1, 5.0], Some(55.1));
    let bytes = dl_csv("83401350", &samples);

    assert_eq!(detect(&bytes, "DL-221.csv").unwrap(), FormatTag::DelimitedText);

    let parsed = parse("DL-221.csv", &bytes).unwrap();
    assert_eq!(parsed.sample_count(), 4);
    assert_eq!(parsed.skipped_count(), 0);

    let device = parsed.device.clone().unwrap();
    assert_eq!(device.model.as_deref(), Some("DL-221"));
    assert_eq!(device.serial_number.as_deref(), Some("83401350"));

    // 解析结果可重复遍历
    let first: Vec<f64> = parsed.samples().map(|s| s.temperature).collect();
    let second: Vec<f64> = parsed.samples().map(|s| s.temperature).collect();
    assert_eq!(first, second);
}

#[test]
fn test_ten_rows_with_one_malformed() {
    logging::init_test();

    let mut lines = vec!["id;Дата/время;Температура[°C]".to_string()];
    for i in 1..=10u32 {
        let timestamp = if i == 7 {
            "31.31.2025 99:00:00".to_string()
        } else {
            format!("02.06.2025 11:{:02}:00", i)
        };
        lines.push(format!("{};{};4,{}", i, timestamp, i % 10));
    }
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

    let parsed = parse("export.csv", &csv_from_lines(&refs)).unwrap();
    assert_eq!(parsed.sample_count(), 9);
    assert_eq!(parsed.skipped_count(), 1);
    assert_eq!(parsed.skipped_rows[0].row_number, 8);
}

#[test]
fn test_testo_binary_models() {
    logging::init_test();

    let with_humidity = testo_binary(
        "174H",
        "45012345",
        &[(ts(0, 10, 0), 4.8, Some(55.1)), (ts(0, 10, 10), 5.1, Some(54.9))],
    );
    let parsed = parse("logger.vi2", &with_humidity).unwrap();
    assert_eq!(parsed.format, FormatTag::Testo174H);
    assert_eq!(parsed.sample_count(), 2);
    let humidities: Vec<Option<f64>> = parsed.samples().map(|s| s.humidity).collect();
    assert_eq!(humidities, vec![Some(55.1), Some(54.9)]);
    let device = parsed.device.clone().unwrap();
    assert_eq!(device.device_type, Some(DeviceType::DualChannel));
    assert_eq!(device.serial_number.as_deref(), Some("45012345"));

    let temperature_only = testo_binary("174T", "1", &[(ts(0, 10, 0), 3.25, None)]);
    let parsed = parse("logger.vi2", &temperature_only).unwrap();
    assert_eq!(parsed.format, FormatTag::Testo174T);
    let sample = parsed.samples().next().unwrap();
    assert_eq!(sample.temperature, 3.25);
    assert_eq!(sample.humidity, None);
    assert_eq!(sample.timestamp, ts(0, 10, 0));
}

#[test]
fn test_testo_text_export() {
    logging::init_test();

    let bytes = testo_text(
        "45099999",
        &series_every_10_min(ts(0, 9, 0), &[6.0, 6.5, 7.0], Some(48.0)),
    );
    assert_eq!(detect(&bytes, "export.txt").unwrap(), FormatTag::TestoTextTable);

    let parsed = parse("export.txt", &bytes).unwrap();
    assert_eq!(parsed.sample_count(), 3);
    assert_eq!(
        parsed.device.as_ref().and_then(|d| d.serial_number.as_deref()),
        Some("45099999")
    );
}

#[test]
fn test_detection_failures_are_deterministic() {
    logging::init_test();

    // 非 UTF-8 + 文本扩展名 → 编码错误
    let cp1251 = [0xC4u8, 0xE0, 0xF2, 0xE0, b';', b'1', b'\n'];
    for _ in 0..3 {
        assert!(matches!(
            detect(&cp1251, "export.csv"),
            Err(LoggerError::EncodingError(_))
        ));
        assert!(matches!(
            detect(&cp1251, "export.dat"),
            Err(LoggerError::UnrecognizedFormat { .. })
        ));
    }

    let prose = "Протокол испытаний\nбез табличных данных\n".as_bytes();
    assert!(matches!(
        detect(prose, "notes.txt"),
        Err(LoggerError::UnrecognizedFormat { .. })
    ));
}

#[test]
fn test_normalize_prefers_caller_device() {
    logging::init_test();

    let bytes = dl_csv("83401350", &series_every_10_min(ts(0, 10, 0), &[4.0, 5.0], None));
    let parsed = parse("DL-221.csv", &bytes).unwrap();

    let metadata = LoggerMetadata::new("DL-221.csv", Placement::new(999, "улица", false))
        .with_device(DeviceIdentity {
            serial_number: Some("CALLER-1".to_string()),
            model: None,
            device_type: None,
        })
        .with_logger_name("Логгер 7");

    let series = normalize(parsed, &metadata, 999).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.logger_name(), "Логгер 7");
    assert_eq!(series.device().serial_number.as_deref(), Some("CALLER-1"));
    assert_eq!(series.device().model.as_deref(), Some("DL-221"));
    assert!(series.placement().is_external);
}
