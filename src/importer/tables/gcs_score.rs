// ==========================================
// GCS评分表扫描
// ==========================================
// 睁眼/言语/动作为中文文本，按固定映射表折算分值，未知文本计 0
// 总分列为空时由三分量求和，意识水平由总分推导
// ==========================================

use std::collections::HashSet;

use crate::domain::records::GcsScore;
use crate::importer::field_validator::{clean_int, clean_text, is_effectively_blank};
use crate::importer::file_parser::Sheet;
use crate::importer::tables::{
    check_patient_exists, check_required, read_child_patient_id, TableScan,
};

pub const TABLE_NAME: &str = "gcs_score";
pub const TABLE_LABEL: &str = "GCS评分";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const EYE: &str = "GCS评分：睁眼";
    pub const VERBAL: &str = "GCS评分：言语";
    pub const MOTOR: &str = "GCS评分：动作";
    pub const TOTAL: &str = "GCS总分：";

    pub const REQUIRED: &[&str] = &[PATIENT_ID];
}

fn eye_score(text: &str) -> i64 {
    match text.trim() {
        "自动睁眼" => 4,
        "呼唤睁眼" => 3,
        "刺痛睁眼" => 2,
        "无反应" => 1,
        "肿胀不能睁眼" => 0,
        _ => 0,
    }
}

fn verbal_score(text: &str) -> i64 {
    match text.trim() {
        "回答正确" => 5,
        "回答错误" => 4,
        "言语不清" => 3,
        "只能发音" => 2,
        "无反应" => 1,
        "气管插管或切开" => 0,
        "平素言语障碍" => 0,
        _ => 0,
    }
}

fn motor_score(text: &str) -> i64 {
    match text.trim() {
        "遵嘱" => 6,
        "定位" => 5,
        "逃避" => 4,
        "屈曲" => 3,
        "过伸" => 2,
        "无反应" => 1,
        "瘫痪" => 0,
        _ => 0,
    }
}

/// 总分 -> 意识水平
pub fn consciousness_level(total: i64) -> &'static str {
    match total {
        15 => "意识清楚",
        12..=14 => "轻度意识障碍",
        9..=11 => "中度意识障碍",
        3..=8 => "昏迷",
        _ => "无法评估",
    }
}

pub fn scan(sheet: &Sheet, known_patients: &HashSet<i64>) -> TableScan<GcsScore> {
    if let Some(failed) = check_required(sheet, columns::REQUIRED) {
        return failed;
    }

    let id_col = sheet.column(columns::PATIENT_ID);
    let eye_col = sheet.column(columns::EYE);
    let verbal_col = sheet.column(columns::VERBAL);
    let motor_col = sheet.column(columns::MOTOR);
    let total_col = sheet.column(columns::TOTAL);

    let mut scan = TableScan::empty();

    for row in &sheet.rows {
        let Some(patient_id) = read_child_patient_id(row, id_col) else {
            continue;
        };

        let raw_eye = eye_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_verbal = verbal_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_motor = motor_col.map(|c| row.cell(c)).unwrap_or("");
        let raw_total = total_col.map(|c| row.cell(c)).unwrap_or("");

        // 四列全空视为本表无数据
        if is_effectively_blank(raw_eye)
            && is_effectively_blank(raw_verbal)
            && is_effectively_blank(raw_motor)
            && is_effectively_blank(raw_total)
        {
            continue;
        }

        if !check_patient_exists(patient_id, row.row_number, known_patients, &mut scan.errors) {
            continue;
        }

        let eye = eye_score(raw_eye);
        let verbal = verbal_score(raw_verbal);
        let motor = motor_score(raw_motor);
        let total = if is_effectively_blank(raw_total) {
            eye + verbal + motor
        } else {
            clean_int(raw_total)
        };

        scan.records.push(GcsScore {
            patient_id,
            eye_opening: Some(eye),
            verbal_response: Some(verbal),
            motor_response: Some(motor),
            total_score: Some(total),
            eye_description: clean_text(raw_eye),
            verbal_description: clean_text(raw_verbal),
            motor_description: clean_text(raw_motor),
            consciousness_level: Some(consciousness_level(total).to_string()),
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

    const HEADER: &str = "序号,GCS评分：睁眼,GCS评分：言语,GCS评分：动作,GCS总分：";

    #[test]
    fn test_text_mapping_and_total_sum() {
        let sheet = sheet_from(&format!("{}\n5,自动睁眼,回答正确,遵嘱,\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([5]));

        assert!(scan.errors.is_empty());
        let g = &scan.records[0];
        assert_eq!(g.eye_opening, Some(4));
        assert_eq!(g.verbal_response, Some(5));
        assert_eq!(g.motor_response, Some(6));
        assert_eq!(g.total_score, Some(15));
        assert_eq!(g.consciousness_level.as_deref(), Some("意识清楚"));
    }

    #[test]
    fn test_unknown_text_maps_to_zero() {
        let sheet = sheet_from(&format!("{}\n5,看不懂,回答错误,屈曲,\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([5]));

        let g = &scan.records[0];
        assert_eq!(g.eye_opening, Some(0));
        assert_eq!(g.total_score, Some(7));
        assert_eq!(g.consciousness_level.as_deref(), Some("昏迷"));
    }

    #[test]
    fn test_total_column_wins_over_sum() {
        let sheet = sheet_from(&format!("{}\n5,呼唤睁眼,言语不清,定位,13\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([5]));

        assert_eq!(scan.records[0].total_score, Some(13));
        assert_eq!(
            scan.records[0].consciousness_level.as_deref(),
            Some("轻度意识障碍")
        );
    }

    #[test]
    fn test_missing_patient_is_error() {
        let sheet = sheet_from(&format!("{}\n9,自动睁眼,回答正确,遵嘱,\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([5]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("在患者基本信息表中不存在"));
        assert!(scan.records.is_empty());
    }

    #[test]
    fn test_invalid_patient_id_skips_silently() {
        let sheet = sheet_from(&format!("{}\n,自动睁眼,回答正确,遵嘱,\n", HEADER));
        let scan = scan(&sheet, &HashSet::new());

        assert!(scan.errors.is_empty());
        assert!(scan.records.is_empty());
    }

    #[test]
    fn test_all_blank_row_skipped() {
        let sheet = sheet_from(&format!("{}\n5,,,,\n", HEADER));
        let scan = scan(&sheet, &HashSet::from([5]));

        assert!(scan.errors.is_empty());
        assert!(scan.records.is_empty());
    }
}
