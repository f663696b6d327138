// ==========================================
// 创伤急救数据导入系统 - 九表扫描流水线
// ==========================================
// 每张表一个模块: 列名常量 + 行扫描 + 错误累积
// 统一约定:
// - 缺必需列 -> 单条系统性错误（field: Excel列）
// - 子表患者ID非法 -> 静默跳过该行
// - 产生过错误的行不进入暂存记录
// ==========================================

pub mod admission_vitals;
pub mod discharge_vitals;
pub mod gcs_score;
pub mod injury_record;
pub mod intervention_extra;
pub mod intervention_time;
pub mod iss_injury;
pub mod patient;
pub mod rts_score;

use std::collections::HashSet;

use crate::domain::report::ValidationError;
use crate::importer::file_parser::{Sheet, SheetRow};

/// 单表扫描产物: 暂存记录 + 累积错误
#[derive(Debug)]
pub struct TableScan<T> {
    pub records: Vec<T>,
    pub errors: Vec<ValidationError>,
}

impl<T> TableScan<T> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// 缺列时的单错误结果
    pub fn missing_columns(missing: &[String]) -> Self {
        Self {
            records: Vec::new(),
            errors: vec![ValidationError::systemic(
                "Excel列",
                format!("缺少必需的列: {}", missing.join(", ")),
            )],
        }
    }
}

/// 必需列检查，缺列返回 Some(错误结果)
pub fn check_required<T>(sheet: &Sheet, required: &[&str]) -> Option<TableScan<T>> {
    let missing = sheet.missing_columns(required);
    if missing.is_empty() {
        None
    } else {
        Some(TableScan::missing_columns(&missing))
    }
}

/// 子表读患者ID: 非法或 <=0 返回 None（该行静默跳过）
pub fn read_child_patient_id(row: &SheetRow, col: Option<usize>) -> Option<i64> {
    let raw = row.cell(col?);
    let id = raw.trim().parse::<i64>().ok()?;
    (id > 0).then_some(id)
}

/// 子表患者存在性检查（库内已有 + 本批患者表暂存）
pub fn check_patient_exists(
    patient_id: i64,
    row_number: usize,
    known_patients: &HashSet<i64>,
    errors: &mut Vec<ValidationError>,
) -> bool {
    if known_patients.contains(&patient_id) {
        return true;
    }
    errors.push(ValidationError::new(
        row_number,
        patient_id,
        "序号",
        patient_id.to_string(),
        format!("患者序号 {} 在患者基本信息表中不存在", patient_id),
    ));
    false
}
