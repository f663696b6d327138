// ==========================================
// 创伤急救数据导入系统 - 干预时间规范化
// ==========================================
// 源表时间记号统一解析为 HHMM 字符串:
//   无 / (跳过)            -> None
//   有:〖0958〗            -> Some("0958")
//   有，开始时间:〖0910〗   -> Some("0910")（呼吸机专用）
//   是:〖0002〗 / 否       -> Some("0002") / None
//   裸 4 位数字            -> Some
// 跨零点事件重编码: 事件时间 < 接诊时间 则存为 2400+HHMM（如 2500）
// ==========================================

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::importer::field_validator::validate_strict_date;

fn re_has_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"有:〖(\d{4})〗").unwrap())
}

fn re_yes_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"是:〖(\d{4})〗").unwrap())
}

fn re_yes_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"是:〖(\d+)〗").unwrap())
}

fn re_ventilator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"有，开始时间:〖(\d{4})〗").unwrap())
}

fn re_four_digit() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}$").unwrap())
}

fn re_month_day_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{2}-\d{1,2})\s+(\d{4})").unwrap())
}

/// HHMM 范围检查（00-23 时, 00-59 分）
fn check_time_range(time: &str, field: &str) -> Result<(), String> {
    let hour: u32 = time[0..2].parse().unwrap_or(99);
    let minute: u32 = time[2..4].parse().unwrap_or(99);
    if hour >= 24 || minute >= 60 {
        return Err(format!(
            "{}时间超出范围: {}（小时必须在00-23之间，分钟必须在00-59之间）",
            field, time
        ));
    }
    Ok(())
}

/// 解析"无 / 有:〖HHMM〗"记号
///
/// "有:"后无数字视作"无"，不记错误。
pub fn parse_has_time(raw: &str, field: &str) -> Result<Option<String>, String> {
    let t = raw.trim();
    if t.is_empty() || t == "无" {
        return Ok(None);
    }
    if t.starts_with("有:") && !re_has_time().is_match(t) {
        return Ok(None);
    }
    if let Some(caps) = re_has_time().captures(t) {
        let time = caps[1].to_string();
        check_time_range(&time, field)?;
        return Ok(Some(time));
    }
    Err(format!(
        "{}格式不正确: {}（正常格式：无、有:〖0958〗，括号内必须是4位数字）",
        field, t
    ))
}

/// 解析呼吸机记号"无 / 有，开始时间:〖HHMM〗"
pub fn parse_ventilator(raw: &str) -> Result<Option<String>, String> {
    let t = raw.trim();
    if t.is_empty() || t == "无" {
        return Ok(None);
    }
    if let Some(caps) = re_ventilator().captures(t) {
        let time = caps[1].to_string();
        check_time_range(&time, "呼吸机")?;
        return Ok(Some(time));
    }
    Err(format!(
        "呼吸机格式不正确: {}（正常格式：无、有，开始时间:〖xxxx〗，括号内必须是4位数字）",
        t
    ))
}

/// 解析"是:〖HHMM〗 / 否"记号
///
/// 采血与 CT 两列: 裸"是:"视作"否"，不记错误。
pub fn parse_yes_no_time(raw: &str, field: &str) -> Result<Option<String>, String> {
    let t = raw.trim();
    if t.is_empty() || t == "否" {
        return Ok(None);
    }

    // 括号内位数检查先行（错误信息需报出实际位数）
    if t.contains("是:〖") && t.contains('〗') {
        if let Some(caps) = re_yes_digits().captures(t) {
            let digits = &caps[1];
            if digits.len() != 4 {
                return Err(format!(
                    "{}格式不正确: {}（括号内必须是4位数字，例如 是:〖0002〗，当前为{}位数字）",
                    field,
                    t,
                    digits.len()
                ));
            }
        }
    }

    if (field.contains("采血") || field.contains("CT")) && t == "是:" {
        return Ok(None);
    }

    if let Some(caps) = re_yes_time().captures(t) {
        let time = caps[1].to_string();
        check_time_range(&time, field)?;
        return Ok(Some(time));
    }

    Err(format!(
        "{}格式不正确: {}（正常格式：是:〖0002〗、否，括号内必须是4位数字）",
        field, t
    ))
}

/// 解析"HHMM / (跳过)"记号
pub fn parse_skippable_time(raw: &str, field: &str) -> Result<Option<String>, String> {
    let t = raw.trim();
    if t.is_empty() || t == "(跳过)" {
        return Ok(None);
    }
    if !re_four_digit().is_match(t) {
        return Err(format!(
            "{}格式不正确: {}（必须是4位数字，例如 1600）或(跳过)",
            field, t
        ));
    }
    check_time_range(t, field)?;
    Ok(Some(t.to_string()))
}

/// 解析死亡日期（yyyy-MM-dd / (跳过) / 空）
pub fn parse_death_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    let t = raw.trim();
    if t.is_empty() || t == "(跳过)" {
        return Ok(None);
    }
    validate_strict_date(t)
        .map(Some)
        .map_err(|_| {
            format!(
                "死亡日期格式不正确: {}（必须是 YYYY-MM-DD 格式，例如 2024-10-29）或(跳过)",
                t
            )
        })
}

/// 跨零点重编码
///
/// 事件时间数值上早于接诊时间时，视为次日事件，重编码为 2400+HHMM。
/// 2330 接诊 + 0100 事件 -> "2500"
pub fn apply_cross_day_offset(admission_time: &str, event_time: &str) -> String {
    if admission_time.len() != 4 || event_time.len() != 4 {
        return event_time.to_string();
    }
    let (admission, event) = match (admission_time.parse::<i32>(), event_time.parse::<i32>()) {
        (Ok(a), Ok(e)) => (a, e),
        _ => return event_time.to_string(),
    };
    if event < admission {
        format!("{:04}", 2400 + event)
    } else {
        event_time.to_string()
    }
}

/// 解析离开抢救室时间（"MM-D[D] HHMM" 或裸 "HHMM"）
///
/// 裸 HHMM: 晚于等于接诊时间算当日，否则算次日。
/// MM-DD: 年份取自接诊日期，落在接诊日期之前则顺延一年。
/// 无法识别的文本不记错误，返回 (None, None)。
pub fn parse_leave_room_time(
    raw: &str,
    admission_date: Option<NaiveDate>,
    admission_time: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<String>), String> {
    let t = raw.trim();
    if t.is_empty() {
        return Ok((None, None));
    }

    if let Some(caps) = re_month_day_time().captures(t) {
        let month_day = &caps[1];
        let time = caps[2].to_string();
        check_time_range(&time, "离开抢救室")?;

        // MM-D 补零为 MM-0D
        let parts: Vec<&str> = month_day.split('-').collect();
        let normalized = if parts[1].len() == 1 {
            format!("{}-0{}", parts[0], parts[1])
        } else {
            month_day.to_string()
        };

        let year = admission_date
            .map(|d| d.year())
            .unwrap_or_else(|| chrono::Local::now().date_naive().year());
        let candidate = format!("{}-{}", year, normalized);
        match NaiveDate::parse_from_str(&candidate, "%Y-%m-%d") {
            Ok(mut leave_date) => {
                if let Some(ad) = admission_date {
                    if leave_date < ad {
                        leave_date = leave_date
                            .with_year(leave_date.year() + 1)
                            .unwrap_or(leave_date);
                    }
                }
                return Ok((Some(leave_date), Some(time)));
            }
            Err(_) => {
                return Err(format!("离开抢救室日期格式不正确: {}", month_day));
            }
        }
    }

    if re_four_digit().is_match(t) {
        check_time_range(t, "离开抢救室")?;
        let leave_time = t.to_string();
        if let (Some(ad), Some(at)) = (admission_date, admission_time) {
            let same_day = t >= at; // HHMM 字符串比较即时间先后
            let leave_date = if same_day { ad } else { ad.succ_opt().unwrap_or(ad) };
            return Ok((Some(leave_date), Some(leave_time)));
        }
        return Ok((admission_date, Some(leave_time)));
    }

    // 无法识别的格式不记录
    Ok((None, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_time_tokens() {
        assert_eq!(parse_has_time("无", "外周"), Ok(None));
        assert_eq!(parse_has_time("", "外周"), Ok(None));
        assert_eq!(parse_has_time("有:〖0958〗", "外周"), Ok(Some("0958".to_string())));
        // "有:"无数字视作无
        assert_eq!(parse_has_time("有:", "外周"), Ok(None));
        assert!(parse_has_time("0958", "外周").is_err());
        assert!(parse_has_time("有:〖2561〗", "外周").unwrap_err().contains("超出范围"));
    }

    #[test]
    fn test_ventilator_token() {
        assert_eq!(
            parse_ventilator("有，开始时间:〖0910〗"),
            Ok(Some("0910".to_string()))
        );
        assert_eq!(parse_ventilator("无"), Ok(None));
        assert!(parse_ventilator("有:〖0910〗").is_err());
    }

    #[test]
    fn test_yes_no_time_tokens() {
        assert_eq!(parse_yes_no_time("否", "止血带"), Ok(None));
        assert_eq!(
            parse_yes_no_time("是:〖0002〗", "止血带"),
            Ok(Some("0002".to_string()))
        );
        // 位数不对时报出实际位数
        let err = parse_yes_no_time("是:〖02〗", "止血带").unwrap_err();
        assert!(err.contains("当前为2位数字"));
        // 采血/CT 的裸"是:"视作否
        assert_eq!(parse_yes_no_time("是:", "采血"), Ok(None));
        assert_eq!(parse_yes_no_time("是:", "CT"), Ok(None));
        assert!(parse_yes_no_time("是:", "止血带").is_err());
    }

    #[test]
    fn test_skippable_time() {
        assert_eq!(parse_skippable_time("(跳过)", "死亡时间"), Ok(None));
        assert_eq!(
            parse_skippable_time("1600", "死亡时间"),
            Ok(Some("1600".to_string()))
        );
        assert!(parse_skippable_time("930", "死亡时间").is_err());
    }

    #[test]
    fn test_cross_day_offset() {
        // 2330 接诊 + 0100 事件 -> 2500
        assert_eq!(apply_cross_day_offset("2330", "0100"), "2500");
        assert_eq!(apply_cross_day_offset("0900", "1030"), "1030");
        assert_eq!(apply_cross_day_offset("2330", "2330"), "2330");
        assert_eq!(apply_cross_day_offset("2330", "0000"), "2400");
    }

    #[test]
    fn test_leave_room_bare_time() {
        let ad = NaiveDate::from_ymd_opt(2024, 10, 29).unwrap();
        // 晚于接诊时间: 当日
        assert_eq!(
            parse_leave_room_time("2200", Some(ad), Some("0930")),
            Ok((Some(ad), Some("2200".to_string())))
        );
        // 早于接诊时间: 次日
        assert_eq!(
            parse_leave_room_time("0100", Some(ad), Some("0930")),
            Ok((
                Some(NaiveDate::from_ymd_opt(2024, 10, 30).unwrap()),
                Some("0100".to_string())
            ))
        );
    }

    #[test]
    fn test_leave_room_month_day() {
        let ad = NaiveDate::from_ymd_opt(2024, 10, 29).unwrap();
        // MM-D 补零；落在接诊日期之前顺延一年
        assert_eq!(
            parse_leave_room_time("11-2 0830", Some(ad), Some("0930")),
            Ok((
                Some(NaiveDate::from_ymd_opt(2024, 11, 2).unwrap()),
                Some("0830".to_string())
            ))
        );
        assert_eq!(
            parse_leave_room_time("01-05 0830", Some(ad), Some("0930")),
            Ok((
                Some(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()),
                Some("0830".to_string())
            ))
        );
    }

    #[test]
    fn test_leave_room_garbage_silent() {
        // 无法识别的文本不记错误
        assert_eq!(parse_leave_room_time("待定", None, None), Ok((None, None)));
    }
}
