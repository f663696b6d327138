// ==========================================
// 干预补充数据表扫描
// ==========================================
// 氧浓度/血制品用量走宽松清洗，除颤等标志位按 是/否 归一
// ==========================================

use std::collections::HashSet;

use crate::domain::records::InterventionExtra;
use crate::importer::field_validator::{
    clean_float, clean_text, clean_yes_no_bool, is_effectively_blank,
};
use crate::importer::file_parser::Sheet;
use crate::importer::tables::{
    check_patient_exists, check_required, read_child_patient_id, TableScan,
};

pub const TABLE_NAME: &str = "intervention_extra";
pub const TABLE_LABEL: &str = "干预补充数据";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const OXYGEN_CONCENTRATION: &str = "(1)氧浓度：___ %   （最低）";
    pub const DEFIBRILLATION: &str = "除颤:";
    pub const LIMB_AMPUTATION: &str = "肢体离断:";
    pub const TRANSFUSION_REACTION: &str = "输血反应:";
    pub const SUSPENDED_RED: &str = "(1)悬红：___";
    pub const PLASMA: &str = "(2) U       血浆：___";
    pub const PLATELETS: &str = "(3)ml血小板：___";
    pub const CRYOPRECIPITATE: &str = "(4)U      冷沉淀：___";
    pub const OTHER_TRANSFUSION: &str = "(5)U其他：___";
    pub const THERAPEUTIC_OPERATION: &str = "治疗性操作：";
    pub const CONSULTATION_DEPT: &str = "会诊科室：";
    pub const ADMINISTRATIVE_DEPT: &str = "行政科室：";

    pub const REQUIRED: &[&str] = &[PATIENT_ID];
}

fn lenient_float(raw: &str) -> Option<f64> {
    if is_effectively_blank(raw) {
        None
    } else {
        Some(clean_float(raw))
    }
}

pub fn scan(sheet: &Sheet, known_patients: &HashSet<i64>) -> TableScan<InterventionExtra> {
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

        let raw_oxygen = cell(row, columns::OXYGEN_CONCENTRATION);
        let raw_defib = cell(row, columns::DEFIBRILLATION);
        let raw_amputation = cell(row, columns::LIMB_AMPUTATION);
        let raw_reaction = cell(row, columns::TRANSFUSION_REACTION);
        let raw_red = cell(row, columns::SUSPENDED_RED);
        let raw_plasma = cell(row, columns::PLASMA);
        let raw_platelets = cell(row, columns::PLATELETS);
        let raw_cryo = cell(row, columns::CRYOPRECIPITATE);
        let raw_other = cell(row, columns::OTHER_TRANSFUSION);
        let raw_operation = cell(row, columns::THERAPEUTIC_OPERATION);
        let raw_consult = cell(row, columns::CONSULTATION_DEPT);
        let raw_admin = cell(row, columns::ADMINISTRATIVE_DEPT);

        let all_blank = [
            &raw_oxygen, &raw_defib, &raw_amputation, &raw_reaction, &raw_red, &raw_plasma,
            &raw_platelets, &raw_cryo, &raw_other, &raw_operation, &raw_consult, &raw_admin,
        ]
        .iter()
        .all(|s| is_effectively_blank(s));
        if all_blank {
            continue;
        }

        if !check_patient_exists(patient_id, row.row_number, known_patients, &mut scan.errors) {
            continue;
        }

        scan.records.push(InterventionExtra {
            patient_id,
            oxygen_concentration: lenient_float(&raw_oxygen),
            defibrillation: clean_yes_no_bool(&raw_defib),
            limb_amputation: clean_yes_no_bool(&raw_amputation),
            transfusion_reaction: clean_yes_no_bool(&raw_reaction),
            suspended_red_units: lenient_float(&raw_red),
            plasma_units: lenient_float(&raw_plasma),
            platelets_amount: lenient_float(&raw_platelets),
            cryoprecipitate_units: lenient_float(&raw_cryo),
            other_transfusion: clean_text(&raw_other),
            therapeutic_operation: clean_text(&raw_operation),
            consultation_dept: clean_text(&raw_consult),
            administrative_dept: clean_text(&raw_admin),
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
            "\"(1)氧浓度：___ %   （最低）\"",
            "除颤:",
            "肢体离断:",
            "输血反应:",
            "(1)悬红：___",
            "(2) U       血浆：___",
            "(3)ml血小板：___",
            "(4)U      冷沉淀：___",
            "(5)U其他：___",
            "治疗性操作：",
            "会诊科室：",
            "行政科室：",
        ]
        .join(",")
    }

    #[test]
    fn test_scan_units_and_flags() {
        let sheet = sheet_from(&format!(
            "{}\n2,60,是,否,无,4,400,1,10,,清创缝合,骨科,医务处\n",
            header()
        ));
        let scan = scan(&sheet, &HashSet::from([2]));

        assert!(scan.errors.is_empty());
        let e = &scan.records[0];
        assert_eq!(e.oxygen_concentration, Some(60.0));
        assert_eq!(e.defibrillation, Some(true));
        assert_eq!(e.transfusion_reaction, Some(false));
        assert_eq!(e.suspended_red_units, Some(4.0));
        assert_eq!(e.consultation_dept.as_deref(), Some("骨科"));
    }

    #[test]
    fn test_blank_row_skipped() {
        let sheet = sheet_from(&format!("{}\n2,,,,,,,,,,,,\n", header()));
        let scan = scan(&sheet, &HashSet::from([2]));

        assert!(scan.errors.is_empty());
        assert!(scan.records.is_empty());
    }
}
