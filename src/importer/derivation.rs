// ==========================================
// 创伤急救数据导入系统 - 字段派生服务
// ==========================================
// 职责: 受伤记录的季节/时段/受伤原因/经纬度派生
// 红线: 派生只在校验通过后执行，失败降级为 None，不阻断落库
// ==========================================

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::domain::records::InjuryRecord;
use crate::domain::types::{InjuryCause, Season, TimePeriod};

// ==========================================
// 地理编码接口（尽力而为）
// ==========================================
// 外部服务由调用方注入; 查询失败只降级，不产生校验错误
pub trait Geocoder {
    /// 地址 -> (经度, 纬度)
    fn lookup(&self, address: &str) -> Option<(f64, f64)>;
}

/// 缺省实现: 不做任何地理编码
pub struct NoopGeocoder;

impl Geocoder for NoopGeocoder {
    fn lookup(&self, _address: &str) -> Option<(f64, f64)> {
        None
    }
}

// ==========================================
// 派生服务
// ==========================================
pub struct DerivationService;

impl DerivationService {
    /// 由接诊日期派生季节
    pub fn derive_season(&self, admission_date: Option<NaiveDate>) -> Option<Season> {
        admission_date.and_then(|d| Season::from_month(d.month()))
    }

    /// 由接诊时间（HHMM）派生时段
    pub fn derive_time_period(&self, admission_time: Option<&str>) -> Option<TimePeriod> {
        let time = admission_time?;
        if time.len() != 4 {
            return None;
        }
        let hour: u32 = time[0..2].parse().ok()?;
        TimePeriod::from_hour(hour)
    }

    /// 受伤原因归类; "其他"类保留原文为明细
    pub fn derive_injury_cause(
        &self,
        cause_text: Option<&str>,
    ) -> (Option<InjuryCause>, Option<String>) {
        match cause_text {
            Some(text) if !text.trim().is_empty() => {
                let cause = InjuryCause::classify(text);
                let detail = if cause == InjuryCause::Other {
                    Some(text.trim().to_string())
                } else {
                    None
                };
                (Some(cause), detail)
            }
            _ => (None, None),
        }
    }

    /// 批量补齐受伤记录的派生字段（含尽力而为的地理编码）
    pub fn enrich_injury_records(&self, records: &mut [InjuryRecord], geocoder: &dyn Geocoder) {
        for record in records.iter_mut() {
            record.season = self.derive_season(record.admission_date);
            record.time_period = self.derive_time_period(record.admission_time.as_deref());

            let (category, detail) =
                self.derive_injury_cause(record.injury_cause_detail.as_deref());
            if record.injury_cause_category.is_none() {
                record.injury_cause_category = category;
                record.injury_cause_detail = detail;
            }

            if let Some(location) = record.injury_location_desc.as_deref() {
                match geocoder.lookup(location) {
                    Some((lng, lat)) => {
                        record.longitude = Some(lng);
                        record.latitude = Some(lat);
                    }
                    None => {
                        warn!(patient_id = record.patient_id, location = %location, "地理编码未命中，经纬度置空");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_season_and_period() {
        let svc = DerivationService;
        let date = NaiveDate::from_ymd_opt(2024, 7, 15);
        assert_eq!(svc.derive_season(date), Some(Season::Summer));
        // "0930" 落入早高峰
        assert_eq!(
            svc.derive_time_period(Some("0930")),
            Some(TimePeriod::MorningPeak)
        );
        assert_eq!(svc.derive_time_period(Some("930")), None);
    }

    #[test]
    fn test_derive_injury_cause_other_keeps_text() {
        let svc = DerivationService;
        let (cause, detail) = svc.derive_injury_cause(Some("刀刺伤"));
        assert_eq!(cause, Some(InjuryCause::Other));
        assert_eq!(detail, Some("刀刺伤".to_string()));

        let (cause, detail) = svc.derive_injury_cause(Some("交通伤（汽车）"));
        assert_eq!(cause, Some(InjuryCause::Traffic));
        assert_eq!(detail, None);
    }
}
