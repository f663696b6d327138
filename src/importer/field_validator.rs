// ==========================================
// 创伤急救数据导入系统 - 字段校验原语
// ==========================================
// 各表流水线共用的严格校验与宽松清洗函数
// 原语只返回 Result<T, String>（纯消息），行号/字段归属由流水线补齐
// ==========================================

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

fn re_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").unwrap())
}

fn re_strict_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

fn re_cjk() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[一-龥]").unwrap())
}

fn re_number_fragment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(\.\d+)?").unwrap())
}

// ==========================================
// 空值与文本
// ==========================================

/// 视同空白的占位文本: ""、无、(空)、(跳过)
pub fn is_effectively_blank(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t == "无" || t == "(空)" || t == "(跳过)"
}

/// 清洗自由文本: 占位空白返回 None
pub fn clean_text(s: &str) -> Option<String> {
    if is_effectively_blank(s) {
        None
    } else {
        Some(s.trim().to_string())
    }
}

pub fn contains_cjk(s: &str) -> bool {
    re_cjk().is_match(s)
}

// ==========================================
// 严格校验（不可挽回的格式错误产生校验错误）
// ==========================================

/// 患者ID: 非空正整数
pub fn validate_patient_id(raw: &str) -> Result<i64, String> {
    let t = raw.trim();
    let id = t.parse::<i64>().ok().filter(|v| *v > 0);
    id.ok_or_else(|| "患者ID无效或为空".to_string())
}

/// 年龄: 非空、无中文、纯数字整数、0-120
pub fn validate_age(raw: &str) -> Result<i64, String> {
    let t = raw.trim();
    if t.is_empty() {
        return Err("年龄不能为空".to_string());
    }
    if contains_cjk(t) {
        return Err(format!("年龄包含非法字符: {}", t));
    }
    if !re_digits().is_match(t) {
        if t.contains('.') {
            return Err(format!("年龄不能为小数: {}", t));
        }
        return Err(format!("年龄格式不正确: {}（应为整数）", t));
    }
    let age: i64 = t
        .parse()
        .map_err(|_| format!("年龄格式不正确: {}（应为整数）", t))?;
    if !(0..=120).contains(&age) {
        return Err(format!("年龄超出合理范围: {}（应在0-120之间）", age));
    }
    Ok(age)
}

/// 性别: 只能为 男/女
pub fn validate_gender(raw: &str) -> Result<String, String> {
    let t = raw.trim();
    match t {
        "男" | "女" => Ok(t.to_string()),
        _ => Err(format!("性别格式不正确: {}（只能为'男'或'女'）", t)),
    }
}

/// 是/否 字段
pub fn validate_yes_no(raw: &str) -> Result<String, String> {
    let t = raw.trim();
    match t {
        "是" | "否" => Ok(t.to_string()),
        _ => Err(format!("格式不正确: {}（只能为'是'或'否'）", t)),
    }
}

/// 严格日期: yyyy-MM-dd（斜杠等变体一律拒绝）
pub fn validate_strict_date(raw: &str) -> Result<NaiveDate, String> {
    let t = raw.trim();
    if !re_strict_date().is_match(t) {
        return Err(format!("日期格式不正确: {}（应为yyyy-MM-dd格式）", t));
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .map_err(|_| format!("日期不存在: {}", t))
}

/// 严格 4 位时间 HHMM（"930" 拒绝，"0930" 接受）
pub fn validate_strict_time(raw: &str) -> Result<String, String> {
    let t = raw.trim();
    if t.len() != 4 || !re_digits().is_match(t) {
        return Err(format!("时间格式不正确: {}（应为4位数字HHMM格式）", t));
    }
    let hour: u32 = t[0..2].parse().map_err(|_| format!("时间格式不正确: {}", t))?;
    let minute: u32 = t[2..4].parse().map_err(|_| format!("时间格式不正确: {}", t))?;
    if hour >= 24 {
        return Err(format!("时间小时超出范围: {}（小时应小于24）", t));
    }
    if minute >= 60 {
        return Err(format!("时间分钟超出范围: {}（分钟应小于60）", t));
    }
    Ok(t.to_string())
}

/// DECIMAL(5,2) 数值: 无中文、两位小数折算后有效数字不超过5位
///
/// 范围检查由调用方完成（错误文案随字段不同）。
pub fn validate_decimal_5_2(raw: &str) -> Result<f64, String> {
    let t = raw.trim();
    if contains_cjk(t) {
        return Err(format!("数值包含非法字符: {}", t));
    }
    let v: f64 = t
        .parse()
        .map_err(|_| format!("数值格式不正确: {}", t))?;
    // DECIMAL(5,2): 折算到两位小数后的有效数字位数
    let unscaled = (v.abs() * 100.0).round() as i64;
    if unscaled.to_string().len() > 5 {
        return Err(format!("数值精度超出范围: {}（整数位+小数位不能超过5位）", t));
    }
    Ok(v)
}

/// 0-4 整数分量（RTS 评分）
pub fn validate_component_score(raw: &str) -> Result<i64, String> {
    let t = raw.trim();
    let v: i64 = t
        .parse()
        .map_err(|_| format!("评分格式不正确: {}（应为整数）", t))?;
    if !(0..=4).contains(&v) {
        return Err(format!("评分超出范围: {}（应在0-4之间）", v));
    }
    Ok(v)
}

// ==========================================
// 宽松清洗（生命体征类字段，脏值退化为默认值）
// ==========================================

/// 宽松整数: 优先整体解析，失败则提取首段数字，再失败取 0
pub fn clean_int(raw: &str) -> i64 {
    let t = raw.trim();
    if is_effectively_blank(t) {
        return 0;
    }
    if let Ok(v) = t.parse::<i64>() {
        return v;
    }
    if let Ok(v) = t.parse::<f64>() {
        return v.round() as i64;
    }
    re_number_fragment()
        .find(t)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|v| v.round() as i64)
        .unwrap_or(0)
}

/// 宽松浮点: 同 clean_int
pub fn clean_float(raw: &str) -> f64 {
    let t = raw.trim();
    if is_effectively_blank(t) {
        return 0.0;
    }
    if let Ok(v) = t.parse::<f64>() {
        return v;
    }
    re_number_fragment()
        .find(t)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// 体温清洗: '@'视为小数点，多段取最后一段，仅接受 30.0-45.0，否则 0.0
pub fn clean_temperature(raw: &str) -> f64 {
    let t = raw.trim().replace('@', ".");
    if is_effectively_blank(&t) {
        return 0.0;
    }
    let last_segment = t
        .split(['，', ','])
        .filter(|s| !s.trim().is_empty())
        .last()
        .unwrap_or("");
    let v = re_number_fragment()
        .find(last_segment)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);
    if (30.0..=45.0).contains(&v) {
        v
    } else {
        0.0
    }
}

/// 宽松是/否 -> bool: 含"是"为真，含"否"/"无"为假，兼容 y/n
pub fn clean_yes_no_bool(raw: &str) -> Option<bool> {
    let t = raw.trim();
    if t.is_empty() || t == "(空)" || t == "(跳过)" {
        return None;
    }
    if t.contains('是') {
        return Some(true);
    }
    if t.contains('否') || t.contains('无') {
        return Some(false);
    }
    let lower = t.to_lowercase();
    if lower.starts_with('y') {
        return Some(true);
    }
    if lower.starts_with('n') {
        return Some(false);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_markers() {
        assert!(is_effectively_blank(""));
        assert!(is_effectively_blank(" 无 "));
        assert!(is_effectively_blank("(空)"));
        assert!(is_effectively_blank("(跳过)"));
        assert!(!is_effectively_blank("0"));
    }

    #[test]
    fn test_patient_id() {
        assert_eq!(validate_patient_id("12"), Ok(12));
        assert!(validate_patient_id("0").is_err());
        assert!(validate_patient_id("").is_err());
        assert!(validate_patient_id("abc").is_err());
    }

    #[test]
    fn test_age_rules() {
        assert_eq!(validate_age("35"), Ok(35));
        assert!(validate_age("").is_err());
        assert!(validate_age("三十五").unwrap_err().contains("非法字符"));
        assert!(validate_age("35.5").unwrap_err().contains("小数"));
        assert!(validate_age("150").unwrap_err().contains("0-120"));
    }

    #[test]
    fn test_gender() {
        assert_eq!(validate_gender("男"), Ok("男".to_string()));
        assert!(validate_gender("M").unwrap_err().contains("只能为'男'或'女'"));
    }

    #[test]
    fn test_strict_date_rejects_slashes() {
        assert!(validate_strict_date("2024-03-15").is_ok());
        assert!(validate_strict_date("2024/03/15").is_err());
        assert!(validate_strict_date("2024-3-15").is_err());
        assert!(validate_strict_date("2024-02-30").is_err());
    }

    #[test]
    fn test_strict_time_four_digits() {
        assert_eq!(validate_strict_time("0930"), Ok("0930".to_string()));
        assert!(validate_strict_time("930").is_err());
        assert!(validate_strict_time("2460").is_err());
        assert!(validate_strict_time("2500").is_err());
        assert_eq!(validate_strict_time("2359"), Ok("2359".to_string()));
    }

    #[test]
    fn test_decimal_5_2_precision() {
        assert_eq!(validate_decimal_5_2("170.5"), Ok(170.5));
        // 1234.5 折算后 123450，超出 5 位有效数字
        assert!(validate_decimal_5_2("1234.5").is_err());
        assert!(validate_decimal_5_2("一百七").is_err());
    }

    #[test]
    fn test_clean_int_fallback() {
        assert_eq!(clean_int("72"), 72);
        assert_eq!(clean_int("72次/分"), 72);
        assert_eq!(clean_int("无"), 0);
        assert_eq!(clean_int("脏数据"), 0);
    }

    #[test]
    fn test_clean_temperature() {
        assert_eq!(clean_temperature("36@5"), 36.5);
        assert_eq!(clean_temperature("35.0，36.8"), 36.8);
        assert_eq!(clean_temperature("98.6"), 0.0); // 华氏度视为脏值
        assert_eq!(clean_temperature("无"), 0.0);
    }

    #[test]
    fn test_clean_yes_no_bool() {
        assert_eq!(clean_yes_no_bool("是"), Some(true));
        assert_eq!(clean_yes_no_bool("否"), Some(false));
        assert_eq!(clean_yes_no_bool("无"), Some(false));
        assert_eq!(clean_yes_no_bool("(空)"), None);
    }
}
