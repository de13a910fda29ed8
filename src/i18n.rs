// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持俄文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// 报告渲染一律显式传入 locale,不依赖全局当前语言
// ==========================================

/// 翻译消息（指定语言）
pub fn t_in(key: &str, locale: &str) -> String {
    rust_i18n::t!(key, locale = locale).to_string()
}

/// 翻译消息（指定语言,带参数）
///
/// # 示例
/// ```no_run
/// use logger_qualification::i18n::t_in_with_args;
/// let msg = t_in_with_args("report.conclusions.start", "ru", &[("value", "02.06.2025 10:00")]);
/// ```
pub fn t_in_with_args(key: &str, locale: &str, args: &[(&str, &str)]) -> String {
    let mut result = t_in(key, locale);
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 复数形式类别
///
/// - ru: one（1, 21, 101…）/ few（2-4, 22-24…）/ many（其余,含 11-14）
/// - 其他语言: one / other
pub fn plural_category(locale: &str, n: u64) -> &'static str {
    if locale.starts_with("ru") {
        let (mod10, mod100) = (n % 10, n % 100);
        if mod10 == 1 && mod100 != 11 {
            "one"
        } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
            "few"
        } else {
            "many"
        }
    } else if n == 1 {
        "one"
    } else {
        "other"
    }
}

/// 带数量的单位词: "5 часов" / "1 hour"
pub fn count_with_unit(key_prefix: &str, n: u64, locale: &str) -> String {
    let key = format!("{}.{}", key_prefix, plural_category(locale, n));
    format!("{} {}", n, t_in(&key, locale))
}
