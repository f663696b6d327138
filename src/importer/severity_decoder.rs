// ==========================================
// 创伤急救数据导入系统 - ISS 详细伤情解码
// ==========================================
// 区域分值 -> 映射表列名片段 -> 命中列 -> 伤情描述
// 描述取自命中列的表头（去区域前缀），单元格仅作"有伤情"标记
// 输出: 分值降序，"N分（描述1，描述2）"，多分值以"，"连接
// ==========================================

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::domain::report::ValidationError;
use crate::domain::types::BodyRegion;
use crate::importer::file_parser::{Sheet, SheetRow};
use crate::importer::score_mapping::{column_fragments, extract_description};

/// 解码单元格视作空白的取值
fn is_detail_blank(value: &str) -> bool {
    let t = value.trim();
    t.is_empty() || t == "(空)" || t == "无"
}

/// 规范化分值串中的分值列表（只取数字段）
pub fn score_list(score_str: &str) -> Vec<u8> {
    if score_str == "0" {
        return Vec::new();
    }
    score_str
        .split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|part| part.parse::<u8>().ok())
        .collect()
}

/// 解码一个区域的详细伤情
///
/// 返回格式化的伤情文本（无伤情为 None）与新增校验错误。
/// 产生任何错误的行不应入库（非零分值必须有伤情依据）。
pub fn decode_region(
    sheet: &Sheet,
    row: &SheetRow,
    region: BodyRegion,
    score_str: &str,
    patient_id: i64,
) -> (Option<String>, Vec<ValidationError>) {
    let mut errors = Vec::new();
    let codes = score_list(score_str);
    if codes.is_empty() {
        return (None, errors);
    }

    let field = format!("{}详细伤情", region.label());
    // 分值 -> 伤情描述（BTreeMap 便于降序输出）
    let mut groups: BTreeMap<u8, Vec<String>> = BTreeMap::new();
    // 分值 -> 是否命中任何列
    let mut found_any: BTreeMap<u8, bool> = BTreeMap::new();

    for &code in &codes {
        let fragments = match column_fragments(region, code) {
            Some(f) => f,
            None => {
                errors.push(ValidationError::new(
                    row.row_number,
                    patient_id,
                    field.clone(),
                    format!("分值{}", code),
                    format!("{}分值{}在映射表中不存在", region.label(), code),
                ));
                continue;
            }
        };

        let mut seen_cols: HashSet<usize> = HashSet::new();
        for fragment in fragments {
            for col in sheet.columns_containing(fragment) {
                if !seen_cols.insert(col) {
                    continue;
                }
                let value = row.cell(col);
                if !is_detail_blank(value) {
                    let description = extract_description(&sheet.headers[col]);
                    groups.entry(code).or_default().push(description);
                }
            }
        }
        found_any.insert(code, !seen_cols.is_empty());
    }

    // 非零分值必须有依据: 未命中列或命中列全空均为错误
    for &code in &codes {
        let fragments = match column_fragments(region, code) {
            Some(f) => f,
            None => continue, // 已在上面报过映射缺失
        };
        if !found_any.get(&code).copied().unwrap_or(false) {
            let expected: Vec<&str> = fragments.iter().take(3).copied().collect();
            errors.push(ValidationError::new(
                row.row_number,
                patient_id,
                field.clone(),
                format!("分值{}", code),
                format!(
                    "{}分值{}在Excel中找不到对应的详细伤情列（期望列名包含：{}等）",
                    region.label(),
                    code,
                    expected.join("、")
                ),
            ));
        } else if groups.get(&code).map(|v| v.is_empty()).unwrap_or(true) {
            errors.push(ValidationError::new(
                row.row_number,
                patient_id,
                field.clone(),
                format!("分值{}", code),
                format!("{}分值{}对应的详细伤情列为空", region.label(), code),
            ));
        }
    }

    // 分值从高到低格式化
    let formatted: Vec<String> = groups
        .iter()
        .rev()
        .filter(|(_, items)| !items.is_empty())
        .map(|(code, items)| format!("{}分（{}）", code, items.join("，")))
        .collect();

    let details = if formatted.is_empty() {
        None
    } else {
        Some(formatted.join("，"))
    };
    (details, errors)
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
    fn test_score_list() {
        assert_eq!(score_list("0"), Vec::<u8>::new());
        assert_eq!(score_list("3"), vec![3]);
        assert_eq!(score_list("1|3|4"), vec![1, 3, 4]);
        assert_eq!(score_list("abc"), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_formats_descending() {
        let sheet = sheet_from(
            "序号,头颈部损伤—①头部外伤后，头痛头晕,③颅底骨折\n1,有,有\n",
        );
        let row = &sheet.rows[0];
        let (details, errors) =
            decode_region(&sheet, row, BodyRegion::HeadNeck, "1|3", 1);

        assert!(errors.is_empty());
        let details = details.unwrap();
        // 分值降序: 3分组先于1分组
        assert!(details.starts_with("3分（"));
        assert!(details.contains("1分（①头部外伤后，头痛头晕）"));
    }

    #[test]
    fn test_decode_mapping_missing() {
        let sheet = sheet_from("序号,面部损伤—①角膜擦伤\n1,有\n");
        let row = &sheet.rows[0];
        // 面部映射只覆盖 1-4
        let (details, errors) = decode_region(&sheet, row, BodyRegion::Face, "5", 1);

        assert!(details.is_none());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("面部分值5在映射表中不存在"));
    }

    #[test]
    fn test_decode_no_matching_column() {
        let sheet = sheet_from("序号,其他列\n1,x\n");
        let row = &sheet.rows[0];
        let (details, errors) = decode_region(&sheet, row, BodyRegion::Chest, "4", 1);

        assert!(details.is_none());
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("胸部分值4在Excel中找不到对应的详细伤情列"));
        assert!(errors[0].message.contains("期望列名包含："));
        assert!(errors[0].message.ends_with("等）"));
    }

    #[test]
    fn test_decode_columns_all_blank() {
        let sheet = sheet_from("序号,胸部损伤—①单个肋骨骨折,②胸椎扭伤\n1,(空),无\n");
        let row = &sheet.rows[0];
        let (details, errors) = decode_region(&sheet, row, BodyRegion::Chest, "1", 1);

        assert!(details.is_none());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("胸部分值1对应的详细伤情列为空"));
    }

    #[test]
    fn test_decode_zero_score_silent() {
        let sheet = sheet_from("序号\n1\n");
        let row = &sheet.rows[0];
        let (details, errors) = decode_region(&sheet, row, BodyRegion::Abdomen, "0", 1);

        assert!(details.is_none());
        assert!(errors.is_empty());
    }
}
