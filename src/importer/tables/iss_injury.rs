// ==========================================
// ISS数据表扫描
// ==========================================
// 六个解剖区域各一列分值（"3" 或 "1┋3┋4"），分隔符归一为 '|'
// 非零分值逐码在表头中寻找详细伤情列并解码，解码失败的行不入暂存
// ==========================================

use std::collections::HashSet;

use crate::domain::records::IssInjury;
use crate::domain::report::ValidationError;
use crate::domain::types::BodyRegion;
use crate::importer::field_validator::{clean_int, is_effectively_blank};
use crate::importer::file_parser::Sheet;
use crate::importer::severity_decoder::decode_region;
use crate::importer::tables::{
    check_patient_exists, check_required, read_child_patient_id, TableScan,
};

pub const TABLE_NAME: &str = "iss_injury";
pub const TABLE_LABEL: &str = "ISS数据";

pub mod columns {
    pub const PATIENT_ID: &str = "序号";
    pub const HEAD_NECK: &str = "ISS评分矩阵—头颈部";
    pub const FACE: &str = "面部";
    pub const CHEST: &str = "胸部";
    pub const ABDOMEN: &str = "腹部";
    pub const LIMBS: &str = "四肢";
    pub const SURFACE: &str = "体表";
    pub const ISS_TOTAL: &str = "ISS评分：";

    pub const REQUIRED: &[&str] = &[PATIENT_ID];
}

fn region_column(region: BodyRegion) -> &'static str {
    match region {
        BodyRegion::HeadNeck => columns::HEAD_NECK,
        BodyRegion::Face => columns::FACE,
        BodyRegion::Chest => columns::CHEST,
        BodyRegion::Abdomen => columns::ABDOMEN,
        BodyRegion::Limbs => columns::LIMBS,
        BodyRegion::Surface => columns::SURFACE,
    }
}

/// 分值串归一: 空白类记号折算为 "0"，'┋' 归一为 '|'，其余必须是数字段
pub fn normalize_score(raw: &str, region: BodyRegion) -> Result<String, String> {
    let t = raw.trim();
    if t.is_empty() || t == "无" || t == "(空)" || t == "0" {
        return Ok("0".to_string());
    }
    let unified = t.replace('┋', "|");
    let valid = unified
        .split('|')
        .all(|part| !part.trim().is_empty() && part.trim().chars().all(|c| c.is_ascii_digit()));
    if !valid {
        return Err(format!(
            "{}分值格式不正确: {}（必须是单个数字、多个数字（如\"1┋3┋4\"或\"1|3|4\"）、\"无\"、\"(空)\"或空字符串）",
            region.label(),
            t
        ));
    }
    Ok(unified
        .split('|')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("|"))
}

pub fn scan(sheet: &Sheet, known_patients: &HashSet<i64>) -> TableScan<IssInjury> {
    if let Some(failed) = check_required(sheet, columns::REQUIRED) {
        return failed;
    }

    let id_col = sheet.column(columns::PATIENT_ID);
    let total_col = sheet.column(columns::ISS_TOTAL);

    let mut scan = TableScan::empty();

    for row in &sheet.rows {
        let Some(patient_id) = read_child_patient_id(row, id_col) else {
            continue;
        };

        let raw_total = total_col.map(|c| row.cell(c)).unwrap_or("");
        let region_raw: Vec<&str> = BodyRegion::ALL
            .iter()
            .map(|r| {
                sheet
                    .column(region_column(*r))
                    .map(|c| row.cell(c))
                    .unwrap_or("")
            })
            .collect();

        if is_effectively_blank(raw_total) && region_raw.iter().all(|s| is_effectively_blank(s)) {
            continue;
        }

        if !check_patient_exists(patient_id, row.row_number, known_patients, &mut scan.errors) {
            continue;
        }

        let before = scan.errors.len();

        // 区域分值归一 + 详细伤情解码
        let mut scores: Vec<Option<String>> = Vec::with_capacity(BodyRegion::ALL.len());
        let mut details: Vec<Option<String>> = Vec::with_capacity(BodyRegion::ALL.len());
        for (region, raw) in BodyRegion::ALL.iter().zip(&region_raw) {
            let normalized = match normalize_score(raw, *region) {
                Ok(s) => s,
                Err(message) => {
                    scan.errors.push(ValidationError::new(
                        row.row_number,
                        patient_id,
                        region_column(*region),
                        *raw,
                        message,
                    ));
                    scores.push(None);
                    details.push(None);
                    continue;
                }
            };
            let (decoded, decode_errors) =
                decode_region(sheet, row, *region, &normalized, patient_id);
            scan.errors.extend(decode_errors);
            scores.push((normalized != "0").then_some(normalized));
            details.push(decoded);
        }

        if scan.errors.len() > before {
            continue;
        }

        let iss_score = if is_effectively_blank(raw_total) {
            None
        } else {
            Some(clean_int(raw_total))
        };
        let has_details = details.iter().any(Option::is_some);

        let mut details = details.into_iter();
        let mut scores = scores.into_iter();
        scan.records.push(IssInjury {
            patient_id,
            head_neck: scores.next().flatten(),
            head_neck_details: details.next().flatten(),
            face: scores.next().flatten(),
            face_details: details.next().flatten(),
            chest: scores.next().flatten(),
            chest_details: details.next().flatten(),
            abdomen: scores.next().flatten(),
            abdomen_details: details.next().flatten(),
            limbs: scores.next().flatten(),
            limbs_details: details.next().flatten(),
            surface: scores.next().flatten(),
            surface_details: details.next().flatten(),
            iss_score,
            has_details,
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

    #[test]
    fn test_normalize_score_variants() {
        assert_eq!(normalize_score("", BodyRegion::Chest), Ok("0".to_string()));
        assert_eq!(normalize_score("无", BodyRegion::Chest), Ok("0".to_string()));
        assert_eq!(
            normalize_score("1┋3┋4", BodyRegion::Chest),
            Ok("1|3|4".to_string())
        );
        assert_eq!(
            normalize_score("3", BodyRegion::Chest),
            Ok("3".to_string())
        );
        assert!(normalize_score("3|a", BodyRegion::Chest).is_err());
        assert!(normalize_score("中度", BodyRegion::Chest)
            .unwrap_err()
            .contains("分值格式不正确"));
    }

    #[test]
    fn test_scan_decodes_details_from_headers() {
        // 胸部分值 1，对应详细伤情列有勾选
        let header = "序号,ISS评分矩阵—头颈部,面部,胸部,腹部,四肢,体表,ISS评分：,胸部损伤—①单个肋骨骨折";
        let sheet = sheet_from(&format!("{}\n3,,,1,,,,1,√\n", header));
        let scan = scan(&sheet, &HashSet::from([3]));

        assert!(scan.errors.is_empty(), "{:?}", scan.errors);
        let r = &scan.records[0];
        assert_eq!(r.chest.as_deref(), Some("1"));
        assert_eq!(r.chest_details.as_deref(), Some("1分（①单个肋骨骨折）"));
        assert_eq!(r.iss_score, Some(1));
        assert!(r.has_details);
    }

    #[test]
    fn test_zero_score_stored_as_none() {
        let header = "序号,ISS评分矩阵—头颈部,面部,胸部,腹部,四肢,体表,ISS评分：";
        let sheet = sheet_from(&format!("{}\n3,0,无,,,,,4\n", header));
        let scan = scan(&sheet, &HashSet::from([3]));

        assert!(scan.errors.is_empty());
        let r = &scan.records[0];
        assert_eq!(r.head_neck, None);
        assert_eq!(r.face, None);
        assert!(!r.has_details);
    }

    #[test]
    fn test_decode_error_blocks_staging() {
        // 胸部分值 3 但没有任何胸部损伤列
        let header = "序号,ISS评分矩阵—头颈部,面部,胸部,腹部,四肢,体表,ISS评分：";
        let sheet = sheet_from(&format!("{}\n3,,,3,,,,9\n", header));
        let scan = scan(&sheet, &HashSet::from([3]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0]
            .message
            .contains("在Excel中找不到对应的详细伤情列"));
        assert!(scan.records.is_empty());
    }

    #[test]
    fn test_bad_score_format_is_error() {
        let header = "序号,ISS评分矩阵—头颈部,面部,胸部,腹部,四肢,体表,ISS评分：";
        let sheet = sheet_from(&format!("{}\n3,,,中度,,,,\n", header));
        let scan = scan(&sheet, &HashSet::from([3]));

        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].message.contains("分值格式不正确"));
    }
}
