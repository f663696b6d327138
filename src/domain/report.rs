// ==========================================
// 创伤急救数据导入系统 - 导入报告 DTO
// ==========================================
// 批次状态机: Parsing -> Validating -> (Committed | RolledBack)
// 报告为前端/调用方可序列化结构
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// ValidationError - 单条校验错误
// ==========================================
// 系统性错误（缺文件/缺列等）row=0, patient_id=0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,         // Excel 行号（表头为第1行，首条数据为第2行）
    pub patient_id: i64,    // 出错行的患者ID（未知时为 0）
    pub field: String,      // 出错字段（列名）
    pub value: String,      // 原始单元格文本
    pub message: String,    // 中文错误信息，带 [表标签] 前缀
}

impl ValidationError {
    pub fn new(
        row: usize,
        patient_id: i64,
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            patient_id,
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// 系统性错误（文件/表头级别，不归属任何数据行）
    pub fn systemic(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(0, 0, field, "", message)
    }
}

// ==========================================
// ValidationResult - 单表校验结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,      // 校验流程是否执行完成
    pub valid: bool,        // 是否零错误
    pub error_count: usize,
    pub errors: Vec<ValidationError>,
    pub message: String,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>, message: impl Into<String>) -> Self {
        let error_count = errors.len();
        Self {
            success: true,
            valid: error_count == 0,
            error_count,
            errors,
            message: message.into(),
        }
    }
}

// ==========================================
// ImportStatus / ImportOutcome - 单表落库结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Partial,
    Failed,
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStatus::Success => write!(f, "success"),
            ImportStatus::Partial => write!(f, "partial"),
            ImportStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub success: bool,
    pub success_count: usize,
    pub insert_count: usize,
    pub update_count: usize,
    pub failed_count: usize,
    pub status: ImportStatus,
    pub message: String,
}

impl ImportOutcome {
    /// 批次整体回滚时每张表的占位结果
    pub fn rolled_back(staged: usize) -> Self {
        Self {
            success: false,
            success_count: 0,
            insert_count: 0,
            update_count: 0,
            failed_count: staged,
            status: ImportStatus::Failed,
            message: "批次存在校验错误，本表未落库".to_string(),
        }
    }
}

// ==========================================
// TableReport - 单表报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table_name: String,   // 英文表名（如 gcs_score）
    pub table_label: String,  // 中文标签（如 GCS评分）
    pub validation: ValidationResult,
    pub import: ImportOutcome,
    pub success: bool,
    pub valid: bool,
    pub error_count: usize,
}

// ==========================================
// BatchState / ImportBatch - 批次状态机
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Parsing,
    Validating,
    Committing,
    Committed,
    RolledBack,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Parsing => write!(f, "PARSING"),
            BatchState::Validating => write!(f, "VALIDATING"),
            BatchState::Committing => write!(f, "COMMITTING"),
            BatchState::Committed => write!(f, "COMMITTED"),
            BatchState::RolledBack => write!(f, "ROLLED_BACK"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: Uuid,
    pub file_path: String,
    pub state: BatchState,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl ImportBatch {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            file_path: file_path.into(),
            state: BatchState::Parsing,
            started_at: chrono::Utc::now(),
        }
    }
}

// ==========================================
// BatchReport - 批次总报告
// ==========================================
// 九表全部落库或全部不落库（I-ATOM）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub success: bool,
    pub all_valid: bool,
    pub total_error_count: usize,
    pub all_errors: Vec<ValidationError>,
    pub tables: Vec<TableReport>,
    pub message: String,
    pub elapsed_ms: u64,
}
