// ==========================================
// 受伤记录表扫描
// ==========================================
// 接诊日期/时间严格校验（yyyy-MM-dd、4位HHMM）
// 季节/时段/受伤原因分类由 DerivationService 在扫描后补齐
// ==========================================

use std::collections::HashSet;

use crate::domain::records::InjuryRecord;
use crate::domain::report::ValidationError;
use crate::importer::field_validator::{
    clean_text, is_effectively_blank, validate_strict_date, validate_strict_time,
};
use crate::importer::file_parser::Sheet;
use crate::importer::tables::{
    check_patient_exists, check_required, read_child_patient_id, TableScan,
};

pub const TABLE_NAME: &str = "injury_record";
pub const TABLE_LABEL: &str = "受伤记录";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const ADMISSION_DATE: &str = "接诊日期：";
    pub const ADMISSION_TIME: &str = "接诊时间：";
    pub const ARRIVAL_METHOD: &str = "来院方式";
    pub const INJURY_LOCATION: &str =
        "(2)    创伤发生地：___（小区名，工厂名，商场名。如果是交通事故填写XX路上靠近XX路，或者XX路和XX路交叉口）";
    pub const STATION_NAME: &str = "(1)120分站站点名称：___";
    pub const INJURY_CAUSE: &str = "受伤原因:";

    pub const REQUIRED: &[&str] = &[PATIENT_ID, ADMISSION_DATE, ADMISSION_TIME];
}

pub fn scan(sheet: &Sheet, known_patients: &HashSet<i64>) -> TableScan<InjuryRecord> {
    if let Some(failed) = check_required(sheet, columns::REQUIRED) {
        return failed;
    }

    let id_col = sheet.column(columns::PATIENT_ID);
    let date_col = sheet.column(columns::ADMISSION_DATE);
    let time_col = sheet.column(columns::ADMISSION_TIME);
    let arrival_col = sheet.column(columns::ARRIVAL_METHOD);
    let location_col = sheet.column(columns::INJURY_LOCATION);
    let station_col = sheet.column(columns::STATION_NAME);
    let cause_col = sheet.column(columns::INJURY_CAUSE);

    let mut scan = TableScan::empty();

    for row in &sheet.rows {
        let Some(patient_id) = read_child_patient_id(row, id_col) else {
            continue;
        };

        let raw_date = date_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_time = time_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_arrival = arrival_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_location = location_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_station = station_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_cause = cause_col.map(|c| row.cell(c)).unwrap_or("");

        if is_effectively_blank(raw_date)
            && is_effectively_blank(raw_time)
            && is_effectively_blank(raw_arrival)
            && is_effectively_blank(raw_location)
            && is_effectively_blank(raw_cause)
        {
            continue;
        }

        if !check_patient_exists(patient_id, row.row_number, known_patients, &mut scan.errors) {
            continue;
        }

        let before = scan.errors.len();

        let admission_date = parse_optional(
            raw_date,
            columns::ADMISSION_DATE,
            row.row_number,
            patient_id,
            &mut scan.errors,
            validate_strict_date,
        );
        let admission_time = parse_optional(
            raw_time,
            columns::ADMISSION_TIME,
            row.row_number,
            patient_id,
            &mut scan.errors,
            validate_strict_time,
        );

        if scan.errors.len() > before {
            continue;
        }

        scan.records.push(InjuryRecord {
            patient_id,
            admission_date: admission_date.flatten(),
            season: None,
            admission_time: admission_time.flatten(),
            time_period: None,
            arrival_method: clean_text(raw_arrival),
            injury_location_desc: clean_text(raw_location),
            longitude: None,
            latitude: None,
            station_name: clean_text(raw_station),
            injury_cause_category: None,
            injury_cause_detail: clean_text(raw_cause),
        });
    }

    scan
}

/// 可空字段: 空白返回 Some(None)，格式错误记一条错误并返回 None
fn parse_optional<T>(
    raw: &str,
    field: &str,
    row_number: usize,
    patient_id: i64,
    errors: &mut Vec<ValidationError>,
    validate: impl Fn(&str) -> Result<T, String>,
) -> Option<Option<T>> {
    if is_effectively_blank(raw) {
        return Some(None);
    }
    match validate(raw) {
        Ok(v) => Some(Some(v)),
        Err(message) => {
            errors.push(ValidationError::new(
                row_number,
                patient_id,
                field,
                raw,
                format!("接诊{}", message),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::CsvParser;
    use chrono::NaiveDate;
    use std::io::Write;

    fn sheet_from(content: &str) -> Sheet {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(f, "{}", content).unwrap();
        CsvParser.parse(f.path()).unwrap()
    }

    fn header() -> String {
        format!(
            "序号,接诊日期：,接诊时间：,来院方式,{},(1)120分站站点名称：___,受伤原因:",
            "\"(2)    创伤发生地：___（小区名，工厂名，商场名。如果是交通事故填写XX路上靠近XX路，或者XX路和XX路交叉口）\""
        )
    }

    #[test]
    fn test_scan_valid_row() {
        let sheet = sheet_from(&format!(
            "{}\n2,2024-03-15,0930,120,某小区,长宁分站,车祸撞击\n",
            header()
        ));
        let scan = scan(&sheet, &HashSet::from([2]));

        assert!(scan.errors.is_empty());
        let r = &scan.records[0];
        assert_eq!(
            r.admission_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );
        assert_eq!(r.admission_time.as_deref(), Some("0930"));
        assert_eq!(r.injury_cause_detail.as_deref(), Some("车祸撞击"));
        // 派生字段留给后置补齐
        assert!(r.season.is_none());
        assert!(r.time_period.is_none());
    }

    #[test]
    fn test_slash_date_rejected() {
        let sheet = sheet_from(&format!(
            "{}\n2,2024/03/15,0930,120,某小区,,车祸\n",
            header()
        ));
        let scan = scan(&sheet, &HashSet::from([2]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("应为yyyy-MM-dd格式"));
        assert!(scan.records.is_empty());
    }

    #[test]
    fn test_three_digit_time_rejected() {
        let sheet = sheet_from(&format!("{}\n2,2024-03-15,930,120,,,\n", header()));
        let scan = scan(&sheet, &HashSet::from([2]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("4位数字HHMM"));
    }

    #[test]
    fn test_blank_row_skipped() {
        let sheet = sheet_from(&format!("{}\n2,,,,,,\n", header()));
        let scan = scan(&sheet, &HashSet::from([2]));

        assert!(scan.errors.is_empty());
        assert!(scan.records.is_empty());
    }
}
