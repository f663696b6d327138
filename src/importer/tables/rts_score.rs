// ==========================================
// RTS评分表扫描
// ==========================================
// 三个分量均为 0-4 的整数，非空时严格校验
// 总分为三分量之和，任一分量缺失时不计算
// ==========================================

use std::collections::HashSet;

use crate::domain::records::RtsScore;
use crate::domain::report::ValidationError;
use crate::importer::field_validator::{is_effectively_blank, validate_component_score};
use crate::importer::file_parser::Sheet;
use crate::importer::tables::{
    check_patient_exists, check_required, read_child_patient_id, TableScan,
};

pub const TABLE_NAME: &str = "rts_score";
pub const TABLE_LABEL: &str = "RTS评分";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const GCS: &str = "RTS评分—GCS";
    pub const SBP: &str = "收缩压";
    pub const RR: &str = "呼吸频率";

    pub const REQUIRED: &[&str] = &[PATIENT_ID];
}

pub fn scan(sheet: &Sheet, known_patients: &HashSet<i64>) -> TableScan<RtsScore> {
    if let Some(failed) = check_required(sheet, columns::REQUIRED) {
        return failed;
    }

    let id_col = sheet.column(columns::PATIENT_ID);
    let gcs_col = sheet.column(columns::GCS);
    let sbp_col = sheet.column(columns::SBP);
    let rr_col = sheet.column(columns::RR);

    let mut scan = TableScan::empty();

    for row in &sheet.rows {
        let Some(patient_id) = read_child_patient_id(row, id_col) else {
            continue;
        };

        let raw_gcs = gcs_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_sbp = sbp_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_rr = rr_col.map(|c| row.cell(c)).unwrap_or("");

        if is_effectively_blank(raw_gcs)
            && is_effectively_blank(raw_sbp)
            && is_effectively_blank(raw_rr)
        {
            continue;
        }

        if !check_patient_exists(patient_id, row.row_number, known_patients, &mut scan.errors) {
            continue;
        }

        let before = scan.errors.len();

        let gcs = parse_component(raw_gcs, columns::GCS, row.row_number, patient_id, &mut scan.errors);
        let sbp = parse_component(raw_sbp, columns::SBP, row.row_number, patient_id, &mut scan.errors);
        let rr = parse_component(raw_rr, columns::RR, row.row_number, patient_id, &mut scan.errors);

        if scan.errors.len() > before {
            continue;
        }

        let total = match (gcs, sbp, rr) {
            (Some(g), Some(s), Some(r)) => Some(g + s + r),
            _ => None,
        };

        scan.records.push(RtsScore {
            patient_id,
            gcs_score: gcs,
            sbp_score: sbp,
            rr_score: rr,
            total_score: total,
        });
    }

    scan
}

fn parse_component(
    raw: &str,
    field: &str,
    row_number: usize,
    patient_id: i64,
    errors: &mut Vec<ValidationError>,
) -> Option<i64> {
    if is_effectively_blank(raw) {
        return None;
    }
    match validate_component_score(raw) {
        Ok(v) => Some(v),
        Err(message) => {
            errors.push(ValidationError::new(
                row_number,
                patient_id,
                field,
                raw,
                format!("{}{}", field, message),
            ));
            None
        }
    }
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

    const HEADER: &str = "序号,RTS评分—GCS,收缩压,呼吸频率";

    #[test]
    fn test_total_is_component_sum() {
        let sheet = sheet_from(&format!("{}\n3,4,3,4\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([3]));

        assert!(scan.errors.is_empty());
        assert_eq!(scan.records[0].total_score, Some(11));
    }

    #[test]
    fn test_component_out_of_range() {
        let sheet = sheet_from(&format!("{}\n3,5,3,4\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([3]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("应在0-4之间"));
        assert!(scan.records.is_empty());
    }

    #[test]
    fn test_partial_components_no_total() {
        let sheet = sheet_from(&format!("{}\n3,4,,4\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([3]));

        assert!(scan.errors.is_empty());
        let r = &scan.records[0];
        assert_eq!(r.gcs_score, Some(4));
        assert_eq!(r.sbp_score, None);
        assert_eq!(r.total_score, None);
    }

    #[test]
    fn test_unknown_patient_rejected() {
        let sheet = sheet_from(&format!("{}\n7,4,3,4\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([3]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.records.is_empty());
    }
}
