// ==========================================
// 患者基本信息表扫描
// ==========================================
// 主表: 其余八张表的患者ID均以此为准
// Excel 内部患者ID重复视为错误; 与库内重复走更新（对账阶段处理）
// ==========================================

use std::collections::HashSet;

use crate::domain::records::Patient;
use crate::domain::report::ValidationError;
use crate::importer::field_validator::{
    clean_text, validate_age, validate_decimal_5_2, validate_gender, validate_patient_id,
    validate_yes_no,
};
use crate::importer::file_parser::Sheet;
use crate::importer::tables::{check_required, TableScan};

pub const TABLE_NAME: &str = "patient";
pub const TABLE_LABEL: &str = "患者基本信息";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const GENDER: &str = "患者性别：";
    pub const AGE: &str = "年龄：";
    pub const IS_GREEN_CHANNEL: &str = "是否绿色通道";
    pub const HEIGHT: &str = "(1)身高：___";
    pub const WEIGHT: &str = "(2)cm    体重：___kg";
    pub const NAME: &str = "姓名";

    pub const REQUIRED: &[&str] = &[
        PATIENT_ID,
        GENDER,
        AGE,
        IS_GREEN_CHANNEL,
        HEIGHT,
        WEIGHT,
    ];
}

pub fn scan(sheet: &Sheet) -> TableScan<Patient> {
    if let Some(failed) = check_required(sheet, columns::REQUIRED) {
        return failed;
    }

    let id_col = sheet.column(columns::PATIENT_ID);
    let gender_col = sheet.column(columns::GENDER);
    let age_col = sheet.column(columns::AGE);
    let green_col = sheet.column(columns::IS_GREEN_CHANNEL);
    let height_col = sheet.column(columns::HEIGHT);
    let weight_col = sheet.column(columns::WEIGHT);
    let name_col = sheet.column(columns::NAME);

    let mut scan = TableScan::empty();
    let mut seen_ids: HashSet<i64> = HashSet::new();

    for row in &sheet.rows {
        let row_number = row.row_number;
        let before = scan.errors.len();

        // 1. 患者ID
        let raw_id = id_col.map(|c| row.cell(c)).unwrap_or("");
        let patient_id = match validate_patient_id(raw_id) {
            Ok(id) => id,
            Err(message) => {
                scan.errors.push(ValidationError::new(
                    row_number, 0, columns::PATIENT_ID, raw_id, message,
                ));
                continue;
            }
        };

        // Excel 内部重复
        if !seen_ids.insert(patient_id) {
            scan.errors.push(ValidationError::new(
                row_number,
                patient_id,
                columns::PATIENT_ID,
                raw_id,
                format!("患者序号冲突: 患者ID {} 在Excel中重复", patient_id),
            ));
        }

        // 2. 性别
        let raw_gender = gender_col.map(|c| row.cell(c)).unwrap_or("");
        let gender = match validate_gender(raw_gender) {
            Ok(g) => Some(g),
            Err(message) => {
                scan.errors.push(ValidationError::new(
                    row_number, patient_id, columns::GENDER, raw_gender, message,
                ));
                None
            }
        };

        // 3. 年龄
        let raw_age = age_col.map(|c| row.cell(c)).unwrap_or("");
        let age = match validate_age(raw_age) {
            Ok(a) => Some(a),
            Err(message) => {
                scan.errors.push(ValidationError::new(
                    row_number, patient_id, "年龄", raw_age, message,
                ));
                None
            }
        };

        // 4. 是否绿色通道（空缺默认"否"）
        let raw_green = green_col.map(|c| row.cell(c)).unwrap_or("");
        let is_green_channel = if raw_green.trim().is_empty() {
            Some(false)
        } else {
            match validate_yes_no(raw_green) {
                Ok(v) => Some(v == "是"),
                Err(message) => {
                    scan.errors.push(ValidationError::new(
                        row_number,
                        patient_id,
                        columns::IS_GREEN_CHANNEL,
                        raw_green,
                        format!("是否绿色通道{}", message),
                    ));
                    None
                }
            }
        };

        // 5. 身高（空缺允许）
        let height = parse_body_metric(
            height_col.map(|c| row.cell(c)).unwrap_or(""),
            "身高",
            30.0,
            250.0,
            row_number,
            patient_id,
            &mut scan.errors,
        );

        // 6. 体重（空缺允许）
        let weight = parse_body_metric(
            weight_col.map(|c| row.cell(c)).unwrap_or(""),
            "体重",
            1.0,
            500.0,
            row_number,
            patient_id,
            &mut scan.errors,
        );

        if scan.errors.len() > before {
            continue;
        }

        scan.records.push(Patient {
            patient_id,
            name: name_col.and_then(|c| clean_text(row.cell(c))),
            gender: gender.unwrap_or_default(),
            age: age.unwrap_or_default(),
            is_green_channel: is_green_channel.unwrap_or(false),
            height: height.flatten(),
            weight: weight.flatten(),
        });
    }

    scan
}

/// 身高/体重: 可空, DECIMAL(5,2), 字段相关取值范围
fn parse_body_metric(
    raw: &str,
    field: &str,
    min: f64,
    max: f64,
    row_number: usize,
    patient_id: i64,
    errors: &mut Vec<ValidationError>,
) -> Option<Option<f64>> {
    let t = raw.trim();
    if t.is_empty() || t == "无" || t == "(空)" {
        return Some(None);
    }
    match validate_decimal_5_2(t) {
        Ok(v) => {
            if v < min || v > max {
                errors.push(ValidationError::new(
                    row_number,
                    patient_id,
                    field,
                    raw,
                    format!("{}超出合理范围: {}（应在{}-{}之间）", field, t, min, max),
                ));
                None
            } else {
                Some(Some(v))
            }
        }
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

    const HEADER: &str = "序号,患者性别：,年龄：       ,是否绿色通道,(1)身高：___,(2)cm    体重：___kg,姓名";

    #[test]
    fn test_scan_valid_row() {
        let sheet = sheet_from(&format!("{}\n1,男,35,是,175.5,70,张三\n", HEADER));
        let scan = scan(&sheet);

        assert!(scan.errors.is_empty());
        assert_eq!(scan.records.len(), 1);
        let p = &scan.records[0];
        assert_eq!(p.patient_id, 1);
        assert_eq!(p.gender, "男");
        assert!(p.is_green_channel);
        assert_eq!(p.height, Some(175.5));
        assert_eq!(p.name, Some("张三".to_string()));
    }

    #[test]
    fn test_scan_missing_required_column() {
        let sheet = sheet_from("序号,年龄：       \n1,35\n");
        let scan = scan(&sheet);

        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].row, 0);
        assert!(scan.errors[0].message.starts_with("缺少必需的列: "));
    }

    #[test]
    fn test_scan_accumulates_multiple_errors() {
        let sheet = sheet_from(&format!("{}\n1,M,一百,是,175,70,\n", HEADER));
        let scan = scan(&sheet);

        // 性别 + 年龄两条错误，行不入暂存
        assert_eq!(scan.errors.len(), 2);
        assert!(scan.records.is_empty());
    }

    #[test]
    fn test_scan_duplicate_in_file() {
        let sheet = sheet_from(&format!("{}\n1,男,35,否,,,\n1,女,40,否,,,\n", HEADER));
        let scan = scan(&sheet);

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("在Excel中重复"));
        assert_eq!(scan.records.len(), 1);
    }

    #[test]
    fn test_scan_height_out_of_range() {
        let sheet = sheet_from(&format!("{}\n1,男,35,否,300,70,\n", HEADER));
        let scan = scan(&sheet);

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("身高超出合理范围"));
    }

    #[test]
    fn test_scan_invalid_patient_id_is_error() {
        let sheet = sheet_from(&format!("{}\n0,男,35,否,,,\n", HEADER));
        let scan = scan(&sheet);

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("患者ID无效或为空"));
    }
}
