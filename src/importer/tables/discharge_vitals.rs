// ==========================================
// 患者离室信息表扫描
// ==========================================
// 离室生命体征与补液量/出血量，均走宽松清洗
// ==========================================

use std::collections::HashSet;

use crate::domain::records::DischargeVitals;
use crate::importer::field_validator::{
    clean_float, clean_int, clean_temperature, is_effectively_blank,
};
use crate::importer::file_parser::Sheet;
use crate::importer::tables::{
    check_patient_exists, check_required, read_child_patient_id, TableScan,
};

pub const TABLE_NAME: &str = "discharge_vitals";
pub const TABLE_LABEL: &str = "患者离室信息";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const TEMPERATURE: &str = "(1)离开抢救室生命体征：体温：___";
    pub const RESPIRATORY_RATE: &str = "(2)℃呼吸：___";
    pub const HEART_RATE: &str = "(3)次/分心率：___";
    pub const SYSTOLIC_BP: &str = "(4)bpm血压：___";
    pub const DIASTOLIC_BP: &str = "(5)/___";
    pub const OXYGEN_SATURATION: &str = "(6)mmHg指脉氧：___%";
    pub const TOTAL_FLUID: &str = "(1)总补液量：___";
    pub const SALINE: &str = "(2)ml         其中:  生理盐水：___";
    pub const BALANCED: &str = "(3)ml               平衡液：___";
    pub const COLLOID: &str = "(4)ml               人工胶体：___";
    pub const OTHER_FLUID: &str = "(5)ml     其他：___";
    pub const URINE: &str = "(1)尿量：___";
    pub const DRAINAGE: &str = "(2)ml    其他引流量：___";
    pub const BLOOD_LOSS: &str = "(3)ml出血量：___ml";

    pub const REQUIRED: &[&str] = &[PATIENT_ID];
}

fn lenient_int(raw: &str) -> Option<i64> {
    if is_effectively_blank(raw) {
        None
    } else {
        Some(clean_int(raw))
    }
}

fn lenient_float(raw: &str) -> Option<f64> {
    if is_effectively_blank(raw) {
        None
    } else {
        Some(clean_float(raw))
    }
}

pub fn scan(sheet: &Sheet, known_patients: &HashSet<i64>) -> TableScan<DischargeVitals> {
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

        let raw_temp = cell(row, columns::TEMPERATURE);
        let raw_rr = cell(row, columns::RESPIRATORY_RATE);
        let raw_hr = cell(row, columns::HEART_RATE);
        let raw_sbp = cell(row, columns::SYSTOLIC_BP);
        let raw_dbp = cell(row, columns::DIASTOLIC_BP);
        let raw_spo2 = cell(row, columns::OXYGEN_SATURATION);
        let raw_total = cell(row, columns::TOTAL_FLUID);
        let raw_saline = cell(row, columns::SALINE);
        let raw_balanced = cell(row, columns::BALANCED);
        let raw_colloid = cell(row, columns::COLLOID);
        let raw_other = cell(row, columns::OTHER_FLUID);
        let raw_urine = cell(row, columns::URINE);
        let raw_drainage = cell(row, columns::DRAINAGE);
        let raw_blood = cell(row, columns::BLOOD_LOSS);

        let all_blank = [
            &raw_temp, &raw_rr, &raw_hr, &raw_sbp, &raw_dbp, &raw_spo2, &raw_total,
            &raw_saline, &raw_balanced, &raw_colloid, &raw_other, &raw_urine, &raw_drainage,
            &raw_blood,
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

        scan.records.push(DischargeVitals {
            patient_id,
            temperature,
            respiratory_rate: lenient_int(&raw_rr),
            heart_rate: lenient_int(&raw_hr),
            systolic_bp: lenient_int(&raw_sbp),
            diastolic_bp: lenient_int(&raw_dbp),
            oxygen_saturation: lenient_float(&raw_spo2),
            total_fluid_volume: lenient_float(&raw_total),
            saline_solution: lenient_float(&raw_saline),
            balanced_solution: lenient_float(&raw_balanced),
            artificial_colloid: lenient_float(&raw_colloid),
            other_fluid: lenient_float(&raw_other),
            urine_output: lenient_float(&raw_urine),
            other_drainage: lenient_float(&raw_drainage),
            blood_loss: lenient_float(&raw_blood),
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
            "(1)离开抢救室生命体征：体温：___",
            "(2)℃呼吸：___",
            "(3)次/分心率：___",
            "(4)bpm血压：___",
            "(5)/___",
            "(6)mmHg指脉氧：___%",
            "(1)总补液量：___",
            "(2)ml         其中:  生理盐水：___",
            "(3)ml               平衡液：___",
            "(4)ml               人工胶体：___",
            "(5)ml     其他：___",
            "(1)尿量：___",
            "(2)ml    其他引流量：___",
            "(3)ml出血量：___ml",
        ]
        .join(",")
    }

    #[test]
    fn test_scan_fluids_and_vitals() {
        let sheet = sheet_from(&format!(
            "{}\n8,36.8,18,80,118,76,99,1500,500,500,0,500,400,0,200\n",
            header()
        ));
        let scan = scan(&sheet, &HashSet::from([8]));

        assert!(scan.errors.is_empty());
        let v = &scan.records[0];
        assert_eq!(v.temperature, Some(36.8));
        assert_eq!(v.total_fluid_volume, Some(1500.0));
        assert_eq!(v.blood_loss, Some(200.0));
    }

    #[test]
    fn test_blank_row_skipped() {
        let sheet = sheet_from(&format!("{}\n8,,,,,,,,,,,,,,\n", header()));
        let scan = scan(&sheet, &HashSet::from([8]));

        assert!(scan.errors.is_empty());
        assert!(scan.records.is_empty());
    }
}
