// ==========================================
// 患者入室信息表扫描
// ==========================================
// 生命体征类字段走宽松清洗，脏值退化而非报错
// 体温支持 '@' 代替小数点、多段取末段，超出 30-45℃ 视为脏值
// ==========================================

use std::collections::HashSet;

use crate::domain::records::AdmissionVitals;
use crate::importer::field_validator::{
    clean_float, clean_int, clean_temperature, clean_text, clean_yes_no_bool,
    is_effectively_blank,
};
use crate::importer::file_parser::Sheet;
use crate::importer::tables::{
    check_patient_exists, check_required, read_child_patient_id, TableScan,
};

pub const TABLE_NAME: &str = "admission_vitals";
pub const TABLE_LABEL: &str = "患者入室信息";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const SYSTOLIC_BP: &str = "(1)血压：___";
    pub const DIASTOLIC_BP: &str = "(2)/___mmHg";
    pub const HEART_RATE: &str = "脉搏心率：              bpm";
    pub const RESPIRATORY_RATE: &str = "呼吸频率：                   次/分";
    pub const MEDICAL_HISTORY: &str = "既往病史：";
    pub const TEMPERATURE: &str = "入室体温：             ℃";
    pub const OXYGEN_SATURATION: &str = "指脉氧：                       %";
    pub const CONSCIOUSNESS: &str = "精神意识:";
    pub const SKIN: &str = "皮肤:";
    pub const DRUNK: &str = "醉酒:";
    pub const PUPIL: &str = "瞳孔:";
    pub const LIGHT_REFLEX: &str = "对光反射:";

    pub const REQUIRED: &[&str] = &[PATIENT_ID];
}

fn lenient_int(raw: &str) -> Option<i64> {
    if is_effectively_blank(raw) {
        None
    } else {
        Some(clean_int(raw))
    }
}

pub fn scan(sheet: &Sheet, known_patients: &HashSet<i64>) -> TableScan<AdmissionVitals> {
    if let Some(failed) = check_required(sheet, columns::REQUIRED) {
        return failed;
    }

    let id_col = sheet.column(columns::PATIENT_ID);
    let cell = |row: &crate::importer::file_parser::SheetRow, name: &str| -> String {
        sheet
            .column(name)
            .map(|c| row.cell(c).to_string())
            .unwrap_or_default()
    };

    let mut scan = TableScan::empty();

    for row in &sheet.rows {
        let Some(patient_id) = read_child_patient_id(row, id_col) else {
            continue;
        };

        let raw_sbp = cell(row, columns::SYSTOLIC_BP);
        let raw_dbp = cell(row, columns::DIASTOLIC_BP);
        let raw_hr = cell(row, columns::HEART_RATE);
        let raw_rr = cell(row, columns::RESPIRATORY_RATE);
        let raw_history = cell(row, columns::MEDICAL_HISTORY);
        let raw_temp = cell(row, columns::TEMPERATURE);
        let raw_spo2 = cell(row, columns::OXYGEN_SATURATION);
        let raw_consciousness = cell(row, columns::CONSCIOUSNESS);
        let raw_skin = cell(row, columns::SKIN);
        let raw_drunk = cell(row, columns::DRUNK);
        let raw_pupil = cell(row, columns::PUPIL);
        let raw_reflex = cell(row, columns::LIGHT_REFLEX);

        let all_blank = [
            &raw_sbp, &raw_dbp, &raw_hr, &raw_rr, &raw_history, &raw_temp, &raw_spo2,
            &raw_consciousness, &raw_skin, &raw_drunk, &raw_pupil, &raw_reflex,
        ]
        .iter()
        .all(|s| is_effectively_blank(s));
        if all_blank {
            continue;
        }

        if !check_patient_exists(patient_id, row.row_number, known_patients, &mut scan.errors) {
            continue;
        }

        let temperature = if is_effectively_blank(&raw_temp) {
            None
        } else {
            let t = clean_temperature(&raw_temp);
            (t > 0.0).then_some(t)
        };
        let oxygen_saturation = if is_effectively_blank(&raw_spo2) {
            None
        } else {
            Some(clean_float(&raw_spo2))
        };

        scan.records.push(AdmissionVitals {
            patient_id,
            systolic_bp: lenient_int(&raw_sbp),
            diastolic_bp: lenient_int(&raw_dbp),
            heart_rate: lenient_int(&raw_hr),
            respiratory_rate: lenient_int(&raw_rr),
            medical_history: clean_text(&raw_history),
            temperature,
            oxygen_saturation,
            consciousness: clean_text(&raw_consciousness),
            skin: clean_text(&raw_skin),
            drunk: clean_yes_no_bool(&raw_drunk),
            pupil: clean_text(&raw_pupil),
            light_reflex: clean_text(&raw_reflex),
        });
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::CsvParser;
    use std::io::Write;

    fn sheet_from(content: &str) -> Sheet {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(f, "{}", content).unwrap();
        CsvParser.parse(f.path()).unwrap()
    }

    fn header() -> String {
        [
            "序号",
            "(1)血压：___",
            "(2)/___mmHg",
            "脉搏心率：              bpm",
            "呼吸频率：                   次/分",
            "既往病史：",
            "入室体温：             ℃",
            "指脉氧：                       %",
            "精神意识:",
            "皮肤:",
            "醉酒:",
            "瞳孔:",
            "对光反射:",
        ]
        .join(",")
    }

    #[test]
    fn test_lenient_cleaning() {
        let sheet = sheet_from(&format!(
            "{}\n4,120,80,72次/分,18,高血压,36@5,98,清醒,正常,否,等大,灵敏\n",
            header()
        ));
        let scan = scan(&sheet, &HashSet::from([4]));

        assert!(scan.errors.is_empty());
        let v = &scan.records[0];
        assert_eq!(v.systolic_bp, Some(120));
        assert_eq!(v.heart_rate, Some(72));
        assert_eq!(v.temperature, Some(36.5));
        assert_eq!(v.drunk, Some(false));
    }

    #[test]
    fn test_dirty_temperature_dropped() {
        let sheet = sheet_from(&format!(
            "{}\n4,120,80,72,18,,98.6,98,,,,,\n",
            header()
        ));
        let scan = scan(&sheet, &HashSet::from([4]));

        // 98.6 超出 30-45 范围，清洗为脏值
        assert_eq!(scan.records[0].temperature, None);
    }

    #[test]
    fn test_unknown_patient_rejected() {
        let sheet = sheet_from(&format!("{}\n6,120,80,72,18,,,,,,,,\n", header()));
        let scan = scan(&sheet, &HashSet::from([4]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.records.is_empty());
    }
}
