// ==========================================
// 干预时间表扫描
// ==========================================
// 事件时间三套文法: 有:〖HHMM〗、是:〖HHMM〗、HHMM/(跳过)
// 接诊后跨零点的事件时间重编码为 2400+HHMM（2330 接诊、0100 事件 -> 2500）
// 死亡时间与离室时间保留真实时刻，不参与重编码
// ==========================================

use std::collections::HashSet;

use crate::domain::records::InterventionTime;
use crate::domain::report::ValidationError;
use crate::importer::field_validator::{
    clean_text, is_effectively_blank, validate_strict_date, validate_strict_time,
};
use crate::importer::file_parser::{Sheet, SheetRow};
use crate::importer::tables::{check_required, read_child_patient_id, TableScan};
use crate::importer::time_normalizer::{
    apply_cross_day_offset, parse_death_date, parse_has_time, parse_leave_room_time,
    parse_skippable_time, parse_ventilator, parse_yes_no_time,
};

pub const TABLE_NAME: &str = "intervention_time";
pub const TABLE_LABEL: &str = "干预时间";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const ADMISSION_DATE: &str = "接诊日期：";
    pub const ADMISSION_TIME: &str = "接诊时间：";
    pub const PERIPHERAL: &str = "外周:";
    pub const IV_LINE: &str = "深静脉:";
    pub const CENTRAL_ACCESS: &str = "骨通道:";
    pub const NASAL_PIPE: &str = "鼻导管:";
    pub const FACE_MASK: &str = "面罩:";
    pub const ENDOTRACHEAL_TUBE: &str = "气管插管:";
    pub const VENTILATOR: &str = "呼吸机:";
    pub const CPR: &str = "心肺复苏:";
    pub const CPR_START: &str = "开始时间：";
    pub const CPR_END: &str = "结束时间：";
    pub const ULTRASOUND: &str = "B超：";
    pub const CT: &str = "CT:";
    pub const TOURNIQUET: &str = "止血带:";
    pub const BLOOD_DRAW: &str = "采血:";
    pub const CATHETER: &str = "导尿:";
    pub const GASTRIC_TUBE: &str = "胃管：";
    pub const TRANSFUSION: &str = "输血:";
    pub const TRANSFUSION_START: &str = "输血开始：";
    pub const TRANSFUSION_END: &str = "输血结束：";
    pub const LEAVE_ROOM: &str = "离开抢救室时间：";
    pub const DESTINATION: &str = "病人去向:";
    pub const DEATH: &str = "死亡:";
    pub const DEATH_DATE: &str = "死亡日期：";
    pub const DEATH_TIME: &str = "死亡时间：";

    pub const REQUIRED: &[&str] = &[PATIENT_ID, ADMISSION_DATE, ADMISSION_TIME];
}

struct RowCtx<'a> {
    sheet: &'a Sheet,
    row: &'a SheetRow,
    patient_id: i64,
    admission_time: String,
    errors: &'a mut Vec<ValidationError>,
}

impl<'a> RowCtx<'a> {
    fn cell(&self, name: &str) -> &str {
        self.sheet
            .column(name)
            .map(|c| self.row.cell(c))
            .unwrap_or("")
    }

    fn record_error(&mut self, field: &str, value: &str, message: String) {
        self.errors.push(ValidationError::new(
            self.row.row_number,
            self.patient_id,
            field,
            value,
            message,
        ));
    }

    /// 解析一个事件时间并做跨零点重编码
    fn event_time(
        &mut self,
        field: &str,
        parse: impl Fn(&str, &str) -> Result<Option<String>, String>,
    ) -> Option<String> {
        let raw = self.cell(field).to_string();
        match parse(&raw, field) {
            Ok(Some(t)) => Some(apply_cross_day_offset(&self.admission_time, &t)),
            Ok(None) => None,
            Err(message) => {
                self.record_error(field, &raw, message);
                None
            }
        }
    }
}

pub fn scan(sheet: &Sheet, known_patients: &HashSet<i64>) -> TableScan<InterventionTime> {
    if let Some(failed) = check_required(sheet, columns::REQUIRED) {
        return failed;
    }

    let id_col = sheet.column(columns::PATIENT_ID);
    let mut scan = TableScan::empty();

    for row in &sheet.rows {
        let Some(patient_id) = read_child_patient_id(row, id_col) else {
            continue;
        };

        if !known_patients.contains(&patient_id) {
            scan.errors.push(ValidationError::new(
                row.row_number,
                patient_id,
                columns::PATIENT_ID,
                "",
                format!(
                    "患者ID {} 在患者基本信息表中不存在，请先导入患者基本信息",
                    patient_id
                ),
            ));
            continue;
        }

        let before = scan.errors.len();

        // 接诊日期/时间为本表锚点，缺失或非法直接报错
        let raw_date = sheet
            .column(columns::ADMISSION_DATE)
            .map(|c| row.cell(c))
            .unwrap_or("")
            .to_string();
        let raw_time = sheet
            .column(columns::ADMISSION_TIME)
            .map(|c| row.cell(c))
            .unwrap_or("")
            .to_string();

        if is_effectively_blank(&raw_date) && is_effectively_blank(&raw_time) {
            continue;
        }

        let admission_date = match validate_strict_date(&raw_date) {
            Ok(d) => Some(d),
            Err(message) => {
                scan.errors.push(ValidationError::new(
                    row.row_number,
                    patient_id,
                    columns::ADMISSION_DATE,
                    raw_date.as_str(),
                    format!("接诊{}", message),
                ));
                None
            }
        };
        let admission_time = match validate_strict_time(&raw_time) {
            Ok(t) => Some(t),
            Err(message) => {
                scan.errors.push(ValidationError::new(
                    row.row_number,
                    patient_id,
                    columns::ADMISSION_TIME,
                    raw_time.as_str(),
                    format!("接诊{}", message),
                ));
                None
            }
        };
        let (Some(admission_date), Some(admission_time)) = (admission_date, admission_time)
        else {
            continue;
        };

        let mut ctx = RowCtx {
            sheet,
            row,
            patient_id,
            admission_time: admission_time.clone(),
            errors: &mut scan.errors,
        };

        // "无 / 有:〖HHMM〗" 文法
        let peripheral = ctx.event_time(columns::PERIPHERAL, parse_has_time);
        let iv_line = ctx.event_time(columns::IV_LINE, parse_has_time);
        let central_access = ctx.event_time(columns::CENTRAL_ACCESS, parse_has_time);
        let nasal_pipe = ctx.event_time(columns::NASAL_PIPE, parse_has_time);
        let face_mask = ctx.event_time(columns::FACE_MASK, parse_has_time);
        let endotracheal_tube = ctx.event_time(columns::ENDOTRACHEAL_TUBE, parse_has_time);
        let ventilator = ctx.event_time(columns::VENTILATOR, |raw, _| parse_ventilator(raw));

        // 心肺复苏: 是/否 + 独立起止时间
        let raw_cpr = ctx.cell(columns::CPR).to_string();
        let cpr = clean_text(&raw_cpr);
        let cpr_start_time = ctx.event_time(columns::CPR_START, parse_skippable_time);
        let cpr_end_time = ctx.event_time(columns::CPR_END, parse_skippable_time);

        // "否 / 是:〖HHMM〗" 文法
        let ultrasound = ctx.event_time(columns::ULTRASOUND, parse_yes_no_time);
        let ct = ctx.event_time(columns::CT, parse_yes_no_time);
        let tourniquet = ctx.event_time(columns::TOURNIQUET, parse_yes_no_time);
        let blood_draw = ctx.event_time(columns::BLOOD_DRAW, parse_yes_no_time);
        let catheter = ctx.event_time(columns::CATHETER, parse_yes_no_time);
        let gastric_tube = ctx.event_time(columns::GASTRIC_TUBE, parse_yes_no_time);

        // 输血: 是/否 + 独立起止时间
        let raw_transfusion = ctx.cell(columns::TRANSFUSION).to_string();
        let transfusion = clean_text(&raw_transfusion);
        let transfusion_start = ctx.event_time(columns::TRANSFUSION_START, parse_skippable_time);
        let transfusion_end = ctx.event_time(columns::TRANSFUSION_END, parse_skippable_time);

        // 离室时间: 真实日期+时刻，不做重编码
        let raw_leave = ctx.cell(columns::LEAVE_ROOM).to_string();
        let (leave_room_date, leave_room_time) =
            match parse_leave_room_time(&raw_leave, Some(admission_date), Some(admission_time.as_str()))
            {
                Ok(pair) => pair,
                Err(message) => {
                    ctx.record_error(columns::LEAVE_ROOM, &raw_leave, message);
                    (None, None)
                }
            };

        let patient_destination = clean_text(ctx.cell(columns::DESTINATION));
        let death = clean_text(ctx.cell(columns::DEATH));

        // 死亡日期/时间: 真实时刻，不做重编码
        let raw_death_date = ctx.cell(columns::DEATH_DATE).to_string();
        let death_date = match parse_death_date(&raw_death_date) {
            Ok(d) => d,
            Err(message) => {
                ctx.record_error(columns::DEATH_DATE, &raw_death_date, message);
                None
            }
        };
        let raw_death_time = ctx.cell(columns::DEATH_TIME).to_string();
        let death_time = match parse_skippable_time(&raw_death_time, columns::DEATH_TIME) {
            Ok(t) => t,
            Err(message) => {
                ctx.record_error(columns::DEATH_TIME, &raw_death_time, message);
                None
            }
        };

        if scan.errors.len() > before {
            continue;
        }

        scan.records.push(InterventionTime {
            patient_id,
            admission_date,
            admission_time,
            peripheral,
            iv_line,
            central_access,
            nasal_pipe,
            face_mask,
            endotracheal_tube,
            ventilator,
            cpr,
            cpr_start_time,
            cpr_end_time,
            ultrasound,
            ct,
            tourniquet,
            blood_draw,
            catheter,
            gastric_tube,
            transfusion,
            transfusion_start,
            transfusion_end,
            leave_room_date,
            leave_room_time,
            patient_destination,
            death,
            death_date,
            death_time,
        });
    }

    scan
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
        [
            "序号", "接诊日期：", "接诊时间：", "外周:", "深静脉:", "骨通道:", "鼻导管:",
            "面罩:", "气管插管:", "呼吸机:", "心肺复苏:", "开始时间：", "结束时间：", "B超：",
            "CT:", "止血带:", "采血:", "导尿:", "胃管：", "输血:", "输血开始：", "输血结束：",
            "离开抢救室时间：", "病人去向:", "死亡:", "死亡日期：", "死亡时间：",
        ]
        .join(",")
    }

    fn row(fields: &[(&str, &str)]) -> String {
        let names = header();
        let names: Vec<&str> = names.split(',').collect();
        names
            .iter()
            .map(|n| {
                fields
                    .iter()
                    .find(|(k, _)| k == n)
                    .map(|(_, v)| *v)
                    .unwrap_or("")
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_cross_midnight_reencoding() {
        let line = row(&[
            ("序号", "1"),
            ("接诊日期：", "2024-03-15"),
            ("接诊时间：", "2330"),
            ("外周:", "有:〖0100〗"),
            ("死亡:", "是"),
            ("死亡时间：", "0130"),
        ]);
        let sheet = sheet_from(&format!("{}\n{}\n", header(), line));
        let scan = scan(&sheet, &HashSet::from([1]));

        assert!(scan.errors.is_empty(), "{:?}", scan.errors);
        let r = &scan.records[0];
        assert_eq!(r.peripheral.as_deref(), Some("2500"));
        // 死亡时间保留真实时刻
        assert_eq!(r.death_time.as_deref(), Some("0130"));
    }

    #[test]
    fn test_same_day_event_untouched() {
        let line = row(&[
            ("序号", "1"),
            ("接诊日期：", "2024-03-15"),
            ("接诊时间：", "0930"),
            ("B超：", "是:〖1015〗"),
            ("CT:", "是:"),
        ]);
        let sheet = sheet_from(&format!("{}\n{}\n", header(), line));
        let scan = scan(&sheet, &HashSet::from([1]));

        assert!(scan.errors.is_empty(), "{:?}", scan.errors);
        let r = &scan.records[0];
        assert_eq!(r.ultrasound.as_deref(), Some("1015"));
        // CT 允许裸"是:"，按无时间处理
        assert_eq!(r.ct, None);
    }

    #[test]
    fn test_bad_token_format_is_error() {
        let line = row(&[
            ("序号", "1"),
            ("接诊日期：", "2024-03-15"),
            ("接诊时间：", "0930"),
            ("外周:", "有:〖95〗"),
        ]);
        let sheet = sheet_from(&format!("{}\n{}\n", header(), line));
        let scan = scan(&sheet, &HashSet::from([1]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.records.is_empty());
    }

    #[test]
    fn test_unknown_patient_has_import_hint() {
        let line = row(&[
            ("序号", "9"),
            ("接诊日期：", "2024-03-15"),
            ("接诊时间：", "0930"),
        ]);
        let sheet = sheet_from(&format!("{}\n{}\n", header(), line));
        let scan = scan(&sheet, &HashSet::from([1]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("请先导入患者基本信息"));
    }

    #[test]
    fn test_leave_room_month_day_format() {
        let line = row(&[
            ("序号", "1"),
            ("接诊日期：", "2024-03-15"),
            ("接诊时间：", "2330"),
            ("离开抢救室时间：", "03-16 0200"),
        ]);
        let sheet = sheet_from(&format!("{}\n{}\n", header(), line));
        let scan = scan(&sheet, &HashSet::from([1]));

        assert!(scan.errors.is_empty(), "{:?}", scan.errors);
        let r = &scan.records[0];
        assert_eq!(
            r.leave_room_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap())
        );
        assert_eq!(r.leave_room_time.as_deref(), Some("0200"));
    }
}
